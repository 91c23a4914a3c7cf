//! Transport de chat sur la console
//!
//! Les messages sont lus sur l'entrée standard, les notifications écrites
//! sur la sortie standard, et les fichiers livrés copiés dans la boîte
//! d'envoi.

use async_trait::async_trait;
use pmoyandex::{Delivery, TrackMetadata, YandexError};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ConsoleDelivery {
    session: u64,
    outbox_dir: PathBuf,
}

impl ConsoleDelivery {
    pub fn new(session: u64, outbox_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            outbox_dir: outbox_dir.into(),
        }
    }

    pub fn outbox_dir(&self) -> &Path {
        &self.outbox_dir
    }
}

#[async_trait]
impl Delivery for ConsoleDelivery {
    async fn notify(&self, text: &str) {
        println!("[#{}] {}", self.session, text);
    }

    async fn deliver_audio(&self, path: &Path, track: &TrackMetadata) -> pmoyandex::Result<()> {
        let file_name = path
            .file_name()
            .ok_or_else(|| YandexError::Delivery(format!("{} has no file name", path.display())))?;
        let target = self.outbox_dir.join(file_name);

        tokio::fs::create_dir_all(&self.outbox_dir).await?;
        tokio::fs::copy(path, &target).await.map_err(|e| {
            YandexError::Delivery(format!("failed to copy {}: {}", path.display(), e))
        })?;

        info!("Session {} received {}", self.session, track.display_name());
        println!("[#{}] <audio> {}", self.session, target.display());
        Ok(())
    }
}
