//! Traitement des messages de chat entrants
//!
//! Dernier rempart du pipeline : aucune erreur ne sort d'ici, elle est
//! journalisée puis rapportée à l'utilisateur.

use crate::delivery::Delivery;
use crate::error::YandexError;
use crate::link;
use crate::orchestrator::{Orchestrator, RequestOutcome};
use std::sync::Arc;
use tracing::{error, info};

pub const START_COMMAND: &str = "/start";

pub const WELCOME_MESSAGE: &str = "Welcome! Send me a Yandex Music link to a track, album, artist, or playlist, and I'll download it for you.";

pub const PROCESSING_MESSAGE: &str = "Processing your request...";

pub const INVALID_LINK_MESSAGE: &str =
    "Invalid Yandex Music URL. Please send a valid link to a track, album, artist, or playlist.";

/// Issue du traitement d'un message
#[derive(Debug)]
pub enum MessageOutcome {
    /// Message sans lien du catalogue, ignoré silencieusement
    Ignored,
    /// Commande `/start`
    Welcomed,
    /// Lien non reconnu
    InvalidLink,
    /// Requête menée à terme
    Completed(RequestOutcome),
    /// Requête en échec, l'erreur a été rapportée
    Failed(YandexError),
}

/// Point d'entrée du transport de chat
#[derive(Debug, Clone)]
pub struct MessageHandler {
    orchestrator: Arc<Orchestrator>,
}

impl MessageHandler {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Traite un message texte d'une session de chat
    pub async fn handle_message(&self, text: &str, delivery: &dyn Delivery) -> MessageOutcome {
        let text = text.trim();

        if text.starts_with(START_COMMAND) {
            delivery.notify(WELCOME_MESSAGE).await;
            return MessageOutcome::Welcomed;
        }

        let Some(link) = link::extract_link(text) else {
            return MessageOutcome::Ignored;
        };

        delivery.notify(PROCESSING_MESSAGE).await;

        match self.orchestrator.handle_link(link, delivery).await {
            Ok(outcome) => MessageOutcome::Completed(outcome),
            Err(YandexError::InvalidReference(reason)) => {
                info!("Rejected link {}: {}", link, reason);
                delivery.notify(INVALID_LINK_MESSAGE).await;
                MessageOutcome::InvalidLink
            }
            Err(e) => {
                error!("Request for {} failed: {}", link, e);
                delivery.notify(&failure_message(&e)).await;
                MessageOutcome::Failed(e)
            }
        }
    }
}

/// Message d'échec présenté à l'utilisateur
fn failure_message(err: &YandexError) -> String {
    match err {
        YandexError::RequestFailed { kind, source } if source.is_not_found() => format!(
            "Sorry, an error occurred: {} not found. Please check if the link is correct.",
            kind.label()
        ),
        other => format!("Sorry, an error occurred: {}", other),
    }
}
