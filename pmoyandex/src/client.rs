//! Client principal du catalogue
//!
//! Ce module fournit le résolveur de haut niveau : chaque lecture passe par
//! le [`RpcClient`] et les échecs de transport sont enveloppés dans une
//! [`YandexError::Resolution`] qui porte l'erreur de la dernière tentative.

use crate::api::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT, YandexApi};
use crate::config_ext::YandexConfigExt;
use crate::error::Result;
use crate::models::*;
use crate::retry::{RetryPolicy, RpcClient};
use pmoconfig::Config;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Résolveur du catalogue avec nouvelles tentatives
#[derive(Debug, Clone)]
pub struct YandexClient {
    /// API bas-niveau
    api: YandexApi,
    /// Politique de nouvelles tentatives
    rpc: RpcClient,
}

impl YandexClient {
    /// Crée un client avec les réglages par défaut
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Crée un builder pour configurer le client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Crée un client depuis un objet Config
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::builder()
            .base_url(config.get_catalog_base_url())
            .timeout(config.get_catalog_timeout())
            .high_quality(config.get_catalog_high_quality())
            .retry_policy(config.get_retry_policy())
            .build()?;

        info!("Catalog client ready for {}", client.api.base_url());
        Ok(client)
    }

    /// Retourne l'API bas-niveau
    pub fn api(&self) -> &YandexApi {
        &self.api
    }

    /// Retourne la politique de nouvelles tentatives
    pub fn retry_policy(&self) -> &RetryPolicy {
        self.rpc.policy()
    }

    // ============ Lectures ============

    /// Récupère les métadonnées d'une piste
    pub async fn fetch_track(&self, track_id: &str) -> Result<TrackMetadata> {
        let track = self
            .rpc
            .call(|| self.api.get_track(track_id))
            .await
            .map_err(|e| e.into_resolution("track info"))?;

        debug!("Resolved track {}: {}", track_id, track.display_name());
        Ok(track)
    }

    /// Récupère un album, pistes aplaties dans l'ordre des volumes
    pub async fn fetch_album(&self, album_id: &str) -> Result<CollectionMetadata> {
        self.rpc
            .call(|| self.api.get_album(album_id))
            .await
            .map_err(|e| e.into_resolution("album info"))
    }

    /// Récupère toutes les pistes d'un artiste, sans limite
    pub async fn fetch_artist(&self, artist_id: &str) -> Result<CollectionMetadata> {
        self.rpc
            .call(|| self.api.get_artist_tracks(artist_id))
            .await
            .map_err(|e| e.into_resolution("artist info"))
    }

    /// Récupère une playlist dans son ordre
    pub async fn fetch_playlist(&self, playlist_id: &str) -> Result<CollectionMetadata> {
        self.rpc
            .call(|| self.api.get_playlist(playlist_id))
            .await
            .map_err(|e| e.into_resolution("playlist info"))
    }

    /// Récupère une collection selon son type
    pub async fn fetch_collection(&self, reference: &ContentReference) -> Result<CollectionMetadata> {
        match reference.kind() {
            ContentKind::Album => self.fetch_album(reference.id()).await,
            ContentKind::Artist => self.fetch_artist(reference.id()).await,
            ContentKind::Playlist => self.fetch_playlist(reference.id()).await,
            ContentKind::Track => Err(crate::error::YandexError::InvalidReference(format!(
                "{} is not a collection",
                reference
            ))),
        }
    }

    /// Résout l'URL de téléchargement temporaire d'une piste
    ///
    /// Protocole en deux appels, chacun avec ses propres tentatives : le
    /// premier confirme qu'un descripteur existe pour la qualité demandée, le
    /// second renvoie l'URL.
    pub async fn resolve_download_location(&self, track_id: &str) -> Result<Url> {
        self.rpc
            .call(|| self.api.check_download_info(track_id))
            .await
            .map_err(|e| e.into_resolution("download URL"))?;

        let url = self
            .rpc
            .call(|| self.api.get_download_url(track_id))
            .await
            .map_err(|e| e.into_resolution("download URL"))?;

        debug!("Resolved download location for track {}", track_id);
        Ok(url)
    }
}

/// Builder pour configurer un YandexClient
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    high_quality: bool,
    retry_policy: RetryPolicy,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            high_quality: true,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl ClientBuilder {
    /// Définit l'URL de base de l'API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Définit le timeout par appel
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Définit le User-Agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Demande (ou non) la qualité haute
    pub fn high_quality(mut self, high_quality: bool) -> Self {
        self.high_quality = high_quality;
        self
    }

    /// Définit la politique de nouvelles tentatives
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Construit le client
    pub fn build(self) -> Result<YandexClient> {
        let api = YandexApi::with_settings(
            self.base_url,
            self.timeout,
            &self.user_agent,
            self.high_quality,
        )?;

        Ok(YandexClient {
            api,
            rpc: RpcClient::new(self.retry_policy),
        })
    }
}
