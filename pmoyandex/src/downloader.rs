//! Téléchargement en streaming des pistes vers le stockage local

use crate::error::{Result, YandexError};
use futures::StreamExt;
use reqwest::Client;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

/// Copie le flux audio d'une URL dans le répertoire de téléchargement
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    downloads_dir: PathBuf,
}

impl Downloader {
    /// Crée un téléchargeur avec son propre client HTTP
    pub fn new(downloads_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_client(Client::builder().build()?, downloads_dir))
    }

    /// Crée un téléchargeur partageant un client HTTP existant
    pub fn with_client(client: Client, downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            downloads_dir: downloads_dir.into(),
        }
    }

    /// Répertoire racine des téléchargements
    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    /// Télécharge `url` dans `downloads_dir/file_name`
    ///
    /// Ne rend la main qu'une fois toutes les données écrites et synchronisées.
    /// En cas d'échec après la création du fichier, le fichier partiel est
    /// supprimé ; un échec antérieur ne touche à aucun fichier existant.
    pub async fn download(&self, url: &Url, file_name: &str) -> Result<PathBuf> {
        let path = self.downloads_dir.join(file_name);

        match self.stream_to_file(url, &path).await {
            Ok(bytes) => {
                info!("Downloaded {} bytes to {}", bytes, path.display());
                Ok(path)
            }
            Err(e) => Err(YandexError::Download {
                file: path,
                source: Box::new(e),
            }),
        }
    }

    async fn stream_to_file(&self, url: &Url, path: &Path) -> Result<u64> {
        tokio::fs::create_dir_all(&self.downloads_dir).await?;

        debug!("Starting download: {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(YandexError::from_status_code(
                status.as_u16(),
                format!("download request failed: HTTP {}", status),
            ));
        }

        let file = tokio::fs::File::create(path).await?;

        // À partir d'ici le fichier nous appartient
        let written = write_body(file, response).await;
        if written.is_err() {
            cleanup(path);
        }
        written
    }

    /// Supprime un fichier téléchargé (voir [`cleanup`])
    pub fn cleanup(&self, path: &Path) {
        cleanup(path);
    }
}

async fn write_body(mut file: tokio::fs::File, response: reqwest::Response) -> Result<u64> {
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok(written)
}

/// Suppression au mieux d'un fichier local
///
/// Un chemin absent est ignoré ; toute autre erreur est journalisée mais
/// jamais propagée. Reste synchrone car appelée depuis `Drop` de
/// [`crate::models::DownloadArtifact`].
pub fn cleanup(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to cleanup file {}: {}", path.display(), e),
    }
}
