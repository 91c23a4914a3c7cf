//! Classification des liens du catalogue
//!
//! Formats reconnus :
//! - `https://music.yandex.ru/track/12345`
//! - `https://music.yandex.ru/album/12345`
//! - `https://music.yandex.ru/album/12345/track/67890` (la piste l'emporte)
//! - `https://music.yandex.ru/artist/12345`
//! - `https://music.yandex.ru/users/<login>/playlists/12345`

use crate::models::ContentKind;
use tracing::debug;
use url::Url;

/// Marqueur qu'un message doit contenir pour être traité
pub const LINK_MARKER: &str = "music.yandex";

/// Extrait le premier lien du catalogue d'un message libre
pub fn extract_link(text: &str) -> Option<&str> {
    text.split_whitespace()
        .find(|token| token.contains(LINK_MARKER))
        .map(|token| {
            token.trim_matches(|c: char| {
                matches!(
                    c,
                    '<' | '>' | '(' | ')' | '"' | '\'' | ',' | '.' | '!' | '?' | ';'
                )
            })
        })
}

/// Classifie un lien en `(type, identifiant)`
///
/// Renvoie `(None, None)` pour tout lien non reconnu ; la validation finale
/// est faite par [`crate::models::ContentReference::from_parts`].
pub fn classify(link: &str) -> (Option<ContentKind>, Option<String>) {
    let Some(url) = parse(link) else {
        debug!("Unparsable link: {}", link);
        return (None, None);
    };

    let on_catalog = url
        .host_str()
        .is_some_and(|host| host.trim_start_matches("www.").starts_with(LINK_MARKER));
    if !on_catalog {
        debug!("Link outside of the catalog: {}", link);
        return (None, None);
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        // Une piste citée dans le chemin d'un album désigne la piste
        ["album", _, "track", id, ..] | ["track", id, ..] => {
            (Some(ContentKind::Track), Some((*id).to_string()))
        }
        ["album", _, "track"] => (Some(ContentKind::Track), None),
        ["album", id, ..] => (Some(ContentKind::Album), Some((*id).to_string())),
        ["artist", id, ..] => (Some(ContentKind::Artist), Some((*id).to_string())),
        ["users", _, "playlists", id, ..] => (Some(ContentKind::Playlist), Some((*id).to_string())),
        ["users", _, "playlists"] => (Some(ContentKind::Playlist), None),
        [kind @ ("album" | "artist" | "track")] => (kind.parse().ok(), None),
        _ => (None, None),
    }
}

fn parse(link: &str) -> Option<Url> {
    Url::parse(link)
        .or_else(|_| Url::parse(&format!("https://{}", link)))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> (Option<ContentKind>, Option<String>) {
        (Some(ContentKind::Track), Some(id.to_string()))
    }

    #[test]
    fn test_classify_track_inside_album() {
        assert_eq!(
            classify("https://music.yandex.ru/album/1/track/2"),
            track("2")
        );
    }

    #[test]
    fn test_classify_direct_links() {
        assert_eq!(classify("https://music.yandex.ru/track/42"), track("42"));
        assert_eq!(
            classify("https://music.yandex.ru/album/7?utm_source=share"),
            (Some(ContentKind::Album), Some("7".to_string()))
        );
        assert_eq!(
            classify("https://music.yandex.com/artist/3/tracks"),
            (Some(ContentKind::Artist), Some("3".to_string()))
        );
        assert_eq!(
            classify("https://music.yandex.ru/users/someone/playlists/1000"),
            (Some(ContentKind::Playlist), Some("1000".to_string()))
        );
        // Un login « track » ne fait pas du lien une piste
        assert_eq!(
            classify("https://music.yandex.ru/users/track/playlists/1000"),
            (Some(ContentKind::Playlist), Some("1000".to_string()))
        );
        assert_eq!(
            classify("https://music.yandex.ru/artist/track"),
            (Some(ContentKind::Artist), Some("track".to_string()))
        );
    }

    #[test]
    fn test_classify_without_scheme() {
        assert_eq!(classify("music.yandex.ru/track/5"), track("5"));
    }

    #[test]
    fn test_classify_missing_id() {
        assert_eq!(
            classify("https://music.yandex.ru/album/"),
            (Some(ContentKind::Album), None)
        );
        assert_eq!(
            classify("https://music.yandex.ru/users/someone/playlists"),
            (Some(ContentKind::Playlist), None)
        );
        assert_eq!(
            classify("https://music.yandex.ru/album/1/track/"),
            (Some(ContentKind::Track), None)
        );
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("https://music.yandex.ru/"), (None, None));
        assert_eq!(classify("https://music.yandex.ru/genre/rock"), (None, None));
        assert_eq!(classify("https://example.com/track/1"), (None, None));
        assert_eq!(classify("not a link at all"), (None, None));
    }

    #[test]
    fn test_extract_link() {
        assert_eq!(
            extract_link("listen to this: https://music.yandex.ru/track/1 !"),
            Some("https://music.yandex.ru/track/1")
        );
        assert_eq!(
            extract_link("(https://music.yandex.ru/album/2)"),
            Some("https://music.yandex.ru/album/2")
        );
        assert_eq!(
            extract_link("check https://music.yandex.ru/track/1."),
            Some("https://music.yandex.ru/track/1")
        );
        assert_eq!(
            extract_link("wow https://music.yandex.ru/album/3!"),
            Some("https://music.yandex.ru/album/3")
        );
        assert_eq!(
            extract_link("is it https://music.yandex.ru/artist/4?; thanks"),
            Some("https://music.yandex.ru/artist/4")
        );
        assert_eq!(extract_link("hello there"), None);
    }
}
