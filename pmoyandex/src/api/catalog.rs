//! Module d'accès au catalogue (pistes, albums, artistes, playlists)
//!
//! Chaque méthode correspond à UN appel distant. Une réponse sans le champ
//! racine attendu, ou un 404, signifie que la ressource n'existe pas.

use super::YandexApi;
use crate::error::{Result, YandexError};
use crate::expander::flatten_volumes;
use crate::models::*;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Réponse de l'endpoint /handlers/track/{id}
#[derive(Debug, Deserialize)]
struct TrackEnvelope {
    #[serde(default)]
    track: Option<TrackResponse>,
}

/// Piste complète
#[derive(Debug, Deserialize)]
struct TrackResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artists: Vec<ArtistResponse>,
}

/// Artiste d'une piste
#[derive(Debug, Deserialize)]
struct ArtistResponse {
    name: String,
}

/// Réponse de l'endpoint /handlers/album/{id}
#[derive(Debug, Deserialize)]
struct AlbumResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    volumes: Option<Vec<Vec<TrackReference>>>,
}

/// Réponse de l'endpoint /handlers/artist/{id}/tracks
#[derive(Debug, Deserialize)]
struct ArtistTracksResponse {
    #[serde(default)]
    tracks: Option<Vec<TrackReference>>,
}

/// Réponse de l'endpoint /handlers/playlist/{id}
#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    tracks: Option<Vec<TrackReference>>,
}

/// Réponse de la première étape de résolution (descripteur de qualité)
#[derive(Debug, Deserialize)]
struct DownloadInfoResponse {
    #[serde(default, rename = "downloadInfo")]
    download_info: Option<Value>,
}

/// Réponse de la seconde étape de résolution (URL temporaire)
#[derive(Debug, Deserialize)]
struct DownloadUrlResponse {
    #[serde(default, rename = "downloadInfoUrl")]
    download_info_url: Option<String>,
}

/// Convertit un 404 en absence typée
fn not_found_on_404(err: YandexError, kind: ContentKind, id: &str) -> YandexError {
    if err.is_not_found() {
        YandexError::NotFound {
            kind,
            id: id.to_string(),
        }
    } else {
        err
    }
}

fn not_found(kind: ContentKind, id: &str) -> YandexError {
    YandexError::NotFound {
        kind,
        id: id.to_string(),
    }
}

impl YandexApi {
    /// Récupère les détails d'une piste
    pub async fn get_track(&self, track_id: &str) -> Result<TrackMetadata> {
        debug!("Fetching track {}", track_id);
        let endpoint = format!("/v2.1/handlers/track/{}", track_id);
        let response: TrackEnvelope = self
            .get(&endpoint, &[])
            .await
            .map_err(|e| not_found_on_404(e, ContentKind::Track, track_id))?;

        let track = response
            .track
            .ok_or_else(|| not_found(ContentKind::Track, track_id))?;

        Ok(Self::parse_track(track_id, track))
    }

    /// Récupère un album et ses pistes, volumes aplatis dans l'ordre
    pub async fn get_album(&self, album_id: &str) -> Result<CollectionMetadata> {
        debug!("Fetching album {}", album_id);
        let endpoint = format!("/v2.1/handlers/album/{}", album_id);
        let response: AlbumResponse = self
            .get(&endpoint, &[])
            .await
            .map_err(|e| not_found_on_404(e, ContentKind::Album, album_id))?;

        let volumes = response
            .volumes
            .ok_or_else(|| not_found(ContentKind::Album, album_id))?;

        let track_refs = flatten_volumes(volumes);
        debug!("Album {} has {} tracks", album_id, track_refs.len());

        Ok(CollectionMetadata {
            kind: ContentKind::Album,
            id: album_id.to_string(),
            title: response.title.unwrap_or_default(),
            track_refs,
        })
    }

    /// Récupère la liste des pistes d'un artiste, dans l'ordre du catalogue
    pub async fn get_artist_tracks(&self, artist_id: &str) -> Result<CollectionMetadata> {
        debug!("Fetching tracks for artist {}", artist_id);
        let endpoint = format!("/v2.1/handlers/artist/{}/tracks", artist_id);
        let response: ArtistTracksResponse = self
            .get(&endpoint, &[])
            .await
            .map_err(|e| not_found_on_404(e, ContentKind::Artist, artist_id))?;

        let track_refs = response
            .tracks
            .ok_or_else(|| not_found(ContentKind::Artist, artist_id))?;

        Ok(CollectionMetadata {
            kind: ContentKind::Artist,
            id: artist_id.to_string(),
            title: String::new(),
            track_refs,
        })
    }

    /// Récupère une playlist et ses pistes
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<CollectionMetadata> {
        debug!("Fetching playlist {}", playlist_id);
        let endpoint = format!("/v2.1/handlers/playlist/{}", playlist_id);
        let response: PlaylistResponse = self
            .get(&endpoint, &[])
            .await
            .map_err(|e| not_found_on_404(e, ContentKind::Playlist, playlist_id))?;

        let track_refs = response
            .tracks
            .ok_or_else(|| not_found(ContentKind::Playlist, playlist_id))?;

        Ok(CollectionMetadata {
            kind: ContentKind::Playlist,
            id: playlist_id.to_string(),
            title: response.title.unwrap_or_default(),
            track_refs,
        })
    }

    /// Étape 1 : vérifie qu'un descripteur existe pour la qualité demandée
    pub async fn check_download_info(&self, track_id: &str) -> Result<()> {
        debug!(
            "Checking download info for track {} (hq={})",
            track_id, self.high_quality
        );
        let endpoint = format!("/v2.1/handlers/track/{}/download-info/m", track_id);
        let hq = if self.high_quality { "1" } else { "0" };
        let response: DownloadInfoResponse =
            self.get(&endpoint, &[("hq", hq)]).await.map_err(|e| {
                if e.is_not_found() {
                    YandexError::DownloadUnavailable(format!(
                        "download info not found for track {}",
                        track_id
                    ))
                } else {
                    e
                }
            })?;

        match response.download_info {
            Some(info) if !info.is_null() => Ok(()),
            _ => Err(YandexError::DownloadUnavailable(format!(
                "download info not available for track {}",
                track_id
            ))),
        }
    }

    /// Étape 2 : récupère l'URL de téléchargement temporaire
    pub async fn get_download_url(&self, track_id: &str) -> Result<Url> {
        debug!("Fetching download URL for track {}", track_id);
        let endpoint = format!("/v2.1/handlers/track/{}/download-info", track_id);
        let response: DownloadUrlResponse = self.get(&endpoint, &[]).await.map_err(|e| {
            if e.is_not_found() {
                YandexError::DownloadUnavailable(format!(
                    "download URL not found for track {}",
                    track_id
                ))
            } else {
                e
            }
        })?;

        let raw = response
            .download_info_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                YandexError::DownloadUnavailable(format!(
                    "download URL not available for track {}",
                    track_id
                ))
            })?;

        Url::parse(raw.trim()).map_err(|e| {
            YandexError::DownloadUnavailable(format!(
                "invalid download URL for track {}: {}",
                track_id, e
            ))
        })
    }

    fn parse_track(track_id: &str, response: TrackResponse) -> TrackMetadata {
        TrackMetadata {
            id: track_id.to_string(),
            title: response.title.unwrap_or_default(),
            artist_names: response.artists.into_iter().map(|a| a.name).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_envelope_without_track() {
        let envelope: TrackEnvelope = serde_json::from_str(r#"{"error": "not found"}"#).unwrap();
        assert!(envelope.track.is_none());
    }

    #[test]
    fn test_parse_track() {
        let envelope: TrackEnvelope = serde_json::from_str(
            r#"{"track": {"id": 2, "title": "So What", "artists": [{"name": "Miles Davis"}, {"name": "John Coltrane"}]}}"#,
        )
        .unwrap();
        let track = YandexApi::parse_track("2", envelope.track.unwrap());
        assert_eq!(track.title, "So What");
        assert_eq!(track.artist_names, vec!["Miles Davis", "John Coltrane"]);
    }

    #[test]
    fn test_album_volumes() {
        let album: AlbumResponse = serde_json::from_str(
            r#"{"title": "Kind of Blue", "volumes": [[{"id": 1, "title": "So What"}], [{"id": "2", "title": "Freddie Freeloader"}]]}"#,
        )
        .unwrap();
        let volumes = album.volumes.unwrap();
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[1][0].id, "2");
    }

    #[test]
    fn test_download_url_field_name() {
        let response: DownloadUrlResponse =
            serde_json::from_str(r#"{"downloadInfoUrl": "https://cdn.example/track.mp3"}"#)
                .unwrap();
        assert_eq!(
            response.download_info_url.as_deref(),
            Some("https://cdn.example/track.mp3")
        );
    }
}
