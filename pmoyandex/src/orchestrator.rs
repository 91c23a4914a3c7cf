//! Orchestration d'une requête de téléchargement
//!
//! Une requête suit la machine d'états [`RequestState`] :
//!
//! ```text
//! Classifying -> Resolving -> (Expanding) -> ProcessingTracks -> Summarizing -> Done
//!      |             |
//!      +-------------+--> Failed
//! ```
//!
//! Les pistes d'une collection sont traitées strictement l'une après
//! l'autre. L'échec d'une piste est notifié puis compté, sans interrompre la
//! collection ; l'échec d'une piste seule devient l'erreur de la requête.

use crate::client::YandexClient;
use crate::config_ext::YandexConfigExt;
use crate::delivery::Delivery;
use crate::downloader::Downloader;
use crate::error::{Result, YandexError};
use crate::expander::{self, TrackQueue};
use crate::link;
use crate::models::*;
use pmoconfig::Config;
use tracing::{debug, info, warn};

/// Nombre maximal de pistes traitées pour un artiste
pub const DEFAULT_ARTIST_TRACK_LIMIT: usize = 10;

/// États d'une requête
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Classifying,
    Resolving,
    Expanding,
    ProcessingTracks,
    Summarizing,
    Done,
    Failed,
}

impl RequestState {
    fn advance(self, next: RequestState, reference: &str) -> RequestState {
        debug!("Request {}: {:?} -> {:?}", reference, self, next);
        next
    }
}

/// Résultat d'une requête menée à terme
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Piste seule livrée
    Track { track: TrackMetadata },
    /// Collection parcourue (avec éventuels échecs partiels)
    Collection {
        kind: ContentKind,
        title: String,
        tally: OutcomeTally,
    },
}

/// Pilote le pipeline complet d'une requête
#[derive(Debug, Clone)]
pub struct Orchestrator {
    client: YandexClient,
    downloader: Downloader,
    artist_track_limit: usize,
}

impl Orchestrator {
    pub fn new(client: YandexClient, downloader: Downloader) -> Self {
        Self {
            client,
            downloader,
            artist_track_limit: DEFAULT_ARTIST_TRACK_LIMIT,
        }
    }

    /// Construit le client, le téléchargeur et la limite depuis la configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = YandexClient::from_config(config)?;
        let downloader = Downloader::new(config.get_downloads_dir()?)?;

        Ok(Self::new(client, downloader).with_artist_track_limit(config.get_artist_track_limit()))
    }

    pub fn with_artist_track_limit(mut self, limit: usize) -> Self {
        self.artist_track_limit = limit;
        self
    }

    pub fn artist_track_limit(&self) -> usize {
        self.artist_track_limit
    }

    /// Classifie un lien puis traite la référence obtenue
    ///
    /// Un lien sans type ou sans identifiant est rejeté avec
    /// [`YandexError::InvalidReference`] avant tout appel distant.
    pub async fn handle_link(&self, link: &str, delivery: &dyn Delivery) -> Result<RequestOutcome> {
        let state = RequestState::Classifying;
        let (kind, id) = link::classify(link);

        match ContentReference::from_parts(kind, id) {
            Ok(reference) => self.handle(&reference, delivery).await,
            Err(e) => {
                state.advance(RequestState::Failed, link);
                Err(e)
            }
        }
    }

    /// Traite une référence déjà classifiée
    pub async fn handle(
        &self,
        reference: &ContentReference,
        delivery: &dyn Delivery,
    ) -> Result<RequestOutcome> {
        info!("Handling {}", reference);
        let label = reference.to_string();
        let state = RequestState::Classifying.advance(RequestState::Resolving, &label);

        if !reference.kind().is_collection() {
            return match self.process_track(reference.id(), delivery).await {
                Ok(track) => {
                    state.advance(RequestState::Done, &label);
                    Ok(RequestOutcome::Track { track })
                }
                Err(e) => {
                    state.advance(RequestState::Failed, &label);
                    Err(YandexError::RequestFailed {
                        kind: ContentKind::Track,
                        source: Box::new(e),
                    })
                }
            };
        }

        let collection = match self.client.fetch_collection(reference).await {
            Ok(collection) => collection,
            Err(e) => {
                state.advance(RequestState::Failed, &label);
                return Err(YandexError::RequestFailed {
                    kind: reference.kind(),
                    source: Box::new(e),
                });
            }
        };

        delivery.notify(&start_message(&collection)).await;

        let state = state.advance(RequestState::Expanding, &label);
        let kind = collection.kind;
        let title = collection.title.clone();
        let limit = (kind == ContentKind::Artist).then_some(self.artist_track_limit);
        let queue = expander::expand(collection, limit);
        debug!(
            "{} lists {} tracks, {} will be processed",
            label,
            queue.discovered(),
            queue.len()
        );

        let state = state.advance(RequestState::ProcessingTracks, &label);
        let tally = self.process_queue(queue, delivery).await;

        let state = state.advance(RequestState::Summarizing, &label);
        delivery.notify(&summary_message(kind, &tally)).await;
        info!(
            "{} finished: {} succeeded, {} failed",
            label, tally.succeeded, tally.failed
        );
        state.advance(RequestState::Done, &label);

        Ok(RequestOutcome::Collection { kind, title, tally })
    }

    async fn process_queue(&self, queue: TrackQueue, delivery: &dyn Delivery) -> OutcomeTally {
        let mut tally = OutcomeTally::default();

        for track_ref in queue {
            match self.process_track(&track_ref.id, delivery).await {
                Ok(_) => tally.record_success(),
                Err(e) => {
                    warn!("Track {} failed: {}", track_ref.id, e);
                    tally.record_failure();
                    let name = if track_ref.title.is_empty() {
                        track_ref.id.as_str()
                    } else {
                        track_ref.title.as_str()
                    };
                    delivery
                        .notify(&format!("Failed to process track {}: {}", name, e))
                        .await;
                }
            }
        }

        tally
    }

    /// Pipeline d'une piste : métadonnées, URL, téléchargement, remise, nettoyage
    ///
    /// Le fichier téléchargé est supprimé que la remise réussisse ou non.
    pub async fn process_track(
        &self,
        track_id: &str,
        delivery: &dyn Delivery,
    ) -> Result<TrackMetadata> {
        delivery.notify("Getting track info...").await;
        let track = self.client.fetch_track(track_id).await?;
        delivery.notify(&format!("Found track: {}", track.title)).await;

        delivery.notify("Getting download URL...").await;
        let url = self.client.resolve_download_location(track_id).await?;

        let file_name = track.file_name();

        delivery.notify("Downloading track...").await;
        let path = self.downloader.download(&url, &file_name).await?;
        let artifact = DownloadArtifact::new(track_id, path);

        delivery.notify("Sending track...").await;
        let delivered = delivery.deliver_audio(artifact.local_path(), &track).await;
        artifact.release();
        delivered?;

        delivery.notify("Done!").await;
        info!("Delivered {}", track.display_name());
        Ok(track)
    }
}

fn start_message(collection: &CollectionMetadata) -> String {
    match collection.kind {
        ContentKind::Album => format!("Processing album: {}", collection.title),
        ContentKind::Playlist => format!("Processing playlist: {}", collection.title),
        ContentKind::Artist => "Processing artist's popular tracks...".to_string(),
        ContentKind::Track => format!("Processing track: {}", collection.title),
    }
}

fn summary_message(kind: ContentKind, tally: &OutcomeTally) -> String {
    let subject = match kind {
        ContentKind::Artist => "Artist's top tracks",
        other => other.label(),
    };
    format!(
        "{} download completed!\nSuccessful: {}\nFailed: {}",
        subject, tally.succeeded, tally.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_message() {
        let tally = OutcomeTally {
            succeeded: 3,
            failed: 1,
        };
        assert_eq!(
            summary_message(ContentKind::Album, &tally),
            "Album download completed!\nSuccessful: 3\nFailed: 1"
        );
        assert_eq!(
            summary_message(ContentKind::Artist, &tally),
            "Artist's top tracks download completed!\nSuccessful: 3\nFailed: 1"
        );
        assert_eq!(
            summary_message(ContentKind::Playlist, &OutcomeTally::default()),
            "Playlist download completed!\nSuccessful: 0\nFailed: 0"
        );
    }

    #[test]
    fn test_start_message() {
        let mut collection = CollectionMetadata {
            kind: ContentKind::Album,
            id: "1".into(),
            title: "Kind of Blue".into(),
            track_refs: vec![],
        };
        assert_eq!(start_message(&collection), "Processing album: Kind of Blue");

        collection.kind = ContentKind::Artist;
        collection.title.clear();
        assert_eq!(
            start_message(&collection),
            "Processing artist's popular tracks..."
        );
    }

    #[test]
    fn test_default_artist_limit() {
        let client = YandexClient::new().unwrap();
        let downloader = Downloader::new("/tmp/pmobot-test").unwrap();
        let orchestrator = Orchestrator::new(client, downloader);
        assert_eq!(orchestrator.artist_track_limit(), 10);
        assert_eq!(
            orchestrator.with_artist_track_limit(3).artist_track_limit(),
            3
        );
    }
}
