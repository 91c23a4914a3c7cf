//! Gestion des erreurs pour le pipeline de téléchargement

use crate::models::ContentKind;
use std::path::PathBuf;
use thiserror::Error;

/// Type Result personnalisé pour pmoyandex
pub type Result<T> = std::result::Result<T, YandexError>;

/// Erreurs possibles lors de la résolution et du téléchargement d'un contenu
#[derive(Error, Debug)]
pub enum YandexError {
    /// Lien mal formé ou non classifiable
    #[error("Invalid content reference: {0}")]
    InvalidReference(String),

    /// Le catalogue confirme l'absence de la ressource
    #[error("{} {id} not found", kind.label())]
    NotFound { kind: ContentKind, id: String },

    /// Échec de résolution des métadonnées (transport ou parsing)
    #[error("Failed to get {entity}: {source}")]
    Resolution {
        entity: String,
        #[source]
        source: Box<YandexError>,
    },

    /// Aucun descripteur ou URL de téléchargement exploitable
    #[error("Download unavailable: {0}")]
    DownloadUnavailable(String),

    /// Échec du flux de téléchargement ou de l'écriture locale
    #[error("Failed to download track to {}: {source}", file.display())]
    Download {
        file: PathBuf,
        #[source]
        source: Box<YandexError>,
    },

    /// Échec de la remise du fichier au transport de chat
    #[error("Failed to deliver audio: {0}")]
    Delivery(String),

    /// Échec d'une requête complète (piste seule ou collection)
    #[error("Failed to handle {kind}: {source}")]
    RequestFailed {
        kind: ContentKind,
        #[source]
        source: Box<YandexError>,
    },

    /// Erreur HTTP
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Erreur d'entrée/sortie locale
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL invalide
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Réponse HTTP non-2xx du catalogue
    #[error("Catalog API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl YandexError {
    /// Crée une erreur depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
        }
    }

    /// Indique si un nouvel essai a une chance d'aboutir
    ///
    /// Les absences confirmées et les erreurs client (4xx hors 408/429) sont
    /// permanentes ; tout le reste (transport, timeout, 5xx, corps invalide,
    /// descripteur manquant) est transitoire.
    pub fn is_transient(&self) -> bool {
        match self {
            YandexError::InvalidReference(_) | YandexError::NotFound { .. } => false,
            YandexError::ApiError { code, .. } => {
                !(400..500).contains(code) || *code == 408 || *code == 429
            }
            YandexError::Resolution { source, .. }
            | YandexError::Download { source, .. }
            | YandexError::RequestFailed { source, .. } => source.is_transient(),
            _ => true,
        }
    }

    /// Vérifie si l'erreur signale une ressource absente du catalogue
    pub fn is_not_found(&self) -> bool {
        match self {
            YandexError::NotFound { .. } => true,
            YandexError::ApiError { code: 404, .. } => true,
            YandexError::RequestFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Enveloppe une erreur de transport dans une `Resolution`
    ///
    /// Les erreurs déjà typées pour l'appelant (absence, descripteur
    /// indisponible) sont conservées telles quelles.
    pub(crate) fn into_resolution(self, entity: impl Into<String>) -> Self {
        match self {
            YandexError::NotFound { .. }
            | YandexError::DownloadUnavailable(_)
            | YandexError::InvalidReference(_) => self,
            other => YandexError::Resolution {
                entity: entity.into(),
                source: Box::new(other),
            },
        }
    }
}
