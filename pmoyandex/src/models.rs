//! Structures de données manipulées par le pipeline

use crate::error::{Result, YandexError};
use crate::naming;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Nom utilisé quand le catalogue ne fournit aucun artiste
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Désérialiseur flexible pour les IDs qui peuvent être des strings ou des integers
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::custom("ID must be a string or number")),
    }
}

/// Type de contenu désigné par un lien
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Track,
    Album,
    Artist,
    Playlist,
}

impl ContentKind {
    /// Forme minuscule utilisée dans les liens et les messages d'erreur
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Track => "track",
            ContentKind::Album => "album",
            ContentKind::Artist => "artist",
            ContentKind::Playlist => "playlist",
        }
    }

    /// Forme capitalisée pour les messages utilisateur
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Track => "Track",
            ContentKind::Album => "Album",
            ContentKind::Artist => "Artist",
            ContentKind::Playlist => "Playlist",
        }
    }

    /// Vrai pour les contenus qui se développent en plusieurs pistes
    pub fn is_collection(&self) -> bool {
        !matches!(self, ContentKind::Track)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = YandexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "track" => Ok(ContentKind::Track),
            "album" => Ok(ContentKind::Album),
            "artist" => Ok(ContentKind::Artist),
            "playlist" => Ok(ContentKind::Playlist),
            other => Err(YandexError::InvalidReference(format!(
                "unsupported content type '{}'",
                other
            ))),
        }
    }
}

/// Référence classifiée vers un contenu du catalogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentReference {
    kind: ContentKind,
    id: String,
}

impl ContentReference {
    /// Construit une référence valide
    pub fn new(kind: ContentKind, id: impl Into<String>) -> Result<Self> {
        Self::from_parts(Some(kind), Some(id.into()))
    }

    /// Construit une référence depuis le résultat brut d'une classification
    ///
    /// Un type ou un identifiant absent (ou vide) est rejeté avant d'entrer
    /// dans le pipeline.
    pub fn from_parts(kind: Option<ContentKind>, id: Option<String>) -> Result<Self> {
        let kind = kind.ok_or_else(|| {
            YandexError::InvalidReference("missing content type".to_string())
        })?;
        let id = id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| YandexError::InvalidReference(format!("missing {} id", kind)))?;
        Ok(Self { kind, id })
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ContentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Métadonnées complètes d'une piste
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Identifiant de la piste
    pub id: String,
    /// Titre de la piste
    pub title: String,
    /// Artistes, dans l'ordre du catalogue
    pub artist_names: Vec<String>,
}

impl TrackMetadata {
    /// Premier artiste listé
    pub fn primary_artist(&self) -> &str {
        self.artist_names
            .first()
            .map(String::as_str)
            .unwrap_or(UNKNOWN_ARTIST)
    }

    /// Nom affiché : `"{artiste} - {titre}"`
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.primary_artist(), self.title)
    }

    /// Nom de fichier assaini pour le stockage local
    pub fn file_name(&self) -> String {
        naming::track_file_name(self.primary_artist(), &self.title)
    }
}

/// Pointeur léger vers une piste d'une collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackReference {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

impl TrackReference {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Métadonnées d'un album, d'un artiste ou d'une playlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionMetadata {
    pub kind: ContentKind,
    pub id: String,
    pub title: String,
    /// Pistes dans l'ordre du catalogue
    pub track_refs: Vec<TrackReference>,
}

/// Fichier audio local d'une piste, le temps de sa remise
///
/// L'artefact appartient exclusivement à l'étape qui l'a créé. `release`
/// supprime le fichier ; si l'artefact est abandonné sur un autre chemin de
/// sortie, `Drop` fait la même suppression.
#[derive(Debug)]
pub struct DownloadArtifact {
    track_id: String,
    local_path: PathBuf,
    released: bool,
}

impl DownloadArtifact {
    pub fn new(track_id: impl Into<String>, local_path: PathBuf) -> Self {
        Self {
            track_id: track_id.into(),
            local_path,
            released: false,
        }
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Supprime le fichier local (au mieux)
    pub fn release(mut self) {
        self.released = true;
        crate::downloader::cleanup(&self.local_path);
    }
}

impl Drop for DownloadArtifact {
    fn drop(&mut self) {
        if !self.released {
            tracing::debug!(
                "Releasing artifact for track {} on early exit",
                self.track_id
            );
            crate::downloader::cleanup(&self.local_path);
        }
    }
}

/// Compteur de succès/échecs d'une collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub succeeded: usize,
    pub failed: usize,
}

impl OutcomeTally {
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Nombre de pistes tentées
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_round_trip() {
        for kind in [
            ContentKind::Track,
            ContentKind::Album,
            ContentKind::Artist,
            ContentKind::Playlist,
        ] {
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), kind);
        }
        assert!("podcast".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_reference_rejects_missing_parts() {
        assert!(matches!(
            ContentReference::from_parts(None, Some("1".into())),
            Err(YandexError::InvalidReference(_))
        ));
        assert!(matches!(
            ContentReference::from_parts(Some(ContentKind::Album), None),
            Err(YandexError::InvalidReference(_))
        ));
        assert!(matches!(
            ContentReference::from_parts(Some(ContentKind::Album), Some("  ".into())),
            Err(YandexError::InvalidReference(_))
        ));

        let reference = ContentReference::new(ContentKind::Playlist, "1003").unwrap();
        assert_eq!(reference.kind(), ContentKind::Playlist);
        assert_eq!(reference.id(), "1003");
    }

    #[test]
    fn test_track_metadata_names() {
        let track = TrackMetadata {
            id: "1".into(),
            title: "Blue in Green".into(),
            artist_names: vec!["Miles Davis".into(), "Bill Evans".into()],
        };
        assert_eq!(track.primary_artist(), "Miles Davis");
        assert_eq!(track.display_name(), "Miles Davis - Blue in Green");
        assert_eq!(track.file_name(), "Miles Davis - Blue in Green.mp3");

        let anonymous = TrackMetadata {
            id: "2".into(),
            title: "Untitled".into(),
            artist_names: vec![],
        };
        assert_eq!(anonymous.primary_artist(), UNKNOWN_ARTIST);
    }

    #[test]
    fn test_track_reference_accepts_numeric_id() {
        let reference: TrackReference =
            serde_json::from_str(r#"{"id": 12345, "title": "So What"}"#).unwrap();
        assert_eq!(reference.id, "12345");
        assert_eq!(reference.title, "So What");
    }

    #[test]
    fn test_artifact_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        std::fs::write(&path, b"data").unwrap();

        {
            let artifact = DownloadArtifact::new("1", path.clone());
            assert_eq!(artifact.local_path(), path.as_path());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_artifact_release_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        std::fs::write(&path, b"data").unwrap();

        DownloadArtifact::new("1", path.clone()).release();
        assert!(!path.exists());
    }

    #[test]
    fn test_tally() {
        let mut tally = OutcomeTally::default();
        tally.record_success();
        tally.record_success();
        tally.record_failure();
        assert_eq!(tally.succeeded, 2);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.attempted(), 3);
    }
}
