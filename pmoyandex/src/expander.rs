//! Développement des collections en séquences de pistes
//!
//! Transformation pure, sans I/O : l'ordre du catalogue est conservé, aucun
//! filtrage n'est fait au-delà de la limite demandée.

use crate::models::{CollectionMetadata, ContentKind, TrackReference};
use std::iter::Take;
use std::vec::IntoIter;

/// Aplatis les volumes d'un album : ordre des volumes, puis ordre interne
pub fn flatten_volumes(volumes: Vec<Vec<TrackReference>>) -> Vec<TrackReference> {
    volumes.into_iter().flatten().collect()
}

/// Séquence finie, paresseuse et non redémarrable de pistes à traiter
#[derive(Debug)]
pub struct TrackQueue {
    kind: ContentKind,
    discovered: usize,
    inner: Take<IntoIter<TrackReference>>,
}

impl TrackQueue {
    /// Type de la collection d'origine
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Nombre de pistes listées par le catalogue, avant la limite
    pub fn discovered(&self) -> usize {
        self.discovered
    }
}

impl Iterator for TrackQueue {
    type Item = TrackReference;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for TrackQueue {}

/// Produit la séquence des pistes d'une collection, limitée à `limit` entrées
pub fn expand(collection: CollectionMetadata, limit: Option<usize>) -> TrackQueue {
    let discovered = collection.track_refs.len();
    let limit = limit.unwrap_or(discovered);

    TrackQueue {
        kind: collection.kind,
        discovered,
        inner: collection.track_refs.into_iter().take(limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(prefix: &str, count: usize) -> Vec<TrackReference> {
        (1..=count)
            .map(|i| TrackReference::new(format!("{}{}", prefix, i), format!("Track {}", i)))
            .collect()
    }

    fn collection(kind: ContentKind, count: usize) -> CollectionMetadata {
        CollectionMetadata {
            kind,
            id: "1".into(),
            title: "Collection".into(),
            track_refs: refs("t", count),
        }
    }

    #[test]
    fn test_flatten_preserves_order() {
        let flat = flatten_volumes(vec![refs("a", 2), vec![], refs("b", 3)]);
        let ids: Vec<_> = flat.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "b1", "b2", "b3"]);
    }

    #[test]
    fn test_expand_without_limit() {
        let queue = expand(collection(ContentKind::Playlist, 4), None);
        assert_eq!(queue.kind(), ContentKind::Playlist);
        assert_eq!(queue.discovered(), 4);
        assert_eq!(queue.len(), 4);
        let ids: Vec<_> = queue.map(|t| t.id).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn test_expand_caps_artist_tracks() {
        let queue = expand(collection(ContentKind::Artist, 25), Some(10));
        assert_eq!(queue.discovered(), 25);
        assert_eq!(queue.len(), 10);
        let ids: Vec<_> = queue.map(|t| t.id).collect();
        assert_eq!(ids.first().map(String::as_str), Some("t1"));
        assert_eq!(ids.last().map(String::as_str), Some("t10"));
    }

    #[test]
    fn test_limit_larger_than_collection() {
        let queue = expand(collection(ContentKind::Artist, 3), Some(10));
        assert_eq!(queue.len(), 3);
    }
}
