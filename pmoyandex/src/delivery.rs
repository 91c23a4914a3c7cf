//! Frontière avec le transport de chat

use crate::error::Result;
use crate::models::TrackMetadata;
use async_trait::async_trait;
use std::path::Path;

/// Collaborateur qui reçoit la progression et les fichiers d'une requête
///
/// Le pipeline attend chaque appel avant de continuer ; les erreurs de
/// `notify` ne sont pas remontées.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Envoie un message texte à la session de chat
    async fn notify(&self, text: &str);

    /// Remet le fichier audio au transport
    ///
    /// Le fichier est supprimé par le pipeline dès le retour de cet appel :
    /// le transport doit l'avoir lu ou copié avant de rendre la main.
    async fn deliver_audio(&self, path: &Path, track: &TrackMetadata) -> Result<()>;
}
