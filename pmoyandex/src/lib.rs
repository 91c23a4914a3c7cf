//! # pmoyandex - Pipeline de téléchargement du catalogue Yandex Music
//!
//! Cette crate transforme un lien vers le catalogue (piste, album, artiste ou
//! playlist) en fichiers audio locaux remis à une session de chat.
//!
//! ## Vue d'ensemble
//!
//! - Client RPC avec nouvelles tentatives et délai linéaire
//! - Résolution des métadonnées et de l'URL de téléchargement temporaire
//! - Téléchargement en streaming vers le répertoire local
//! - Développement des collections (volumes d'album, limite par artiste)
//! - Orchestration par requête avec décompte succès/échecs
//! - Nettoyage des fichiers garanti sur tous les chemins de sortie
//!
//! ## Architecture
//!
//! ```text
//! pmoyandex/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── client.rs           # Résolveur avec nouvelles tentatives
//! │   ├── retry.rs            # Politique et client RPC
//! │   ├── api/
//! │   │   ├── mod.rs          # Requêtes HTTP bas-niveau
//! │   │   └── catalog.rs      # Endpoints du catalogue
//! │   ├── downloader.rs       # Téléchargement et nettoyage
//! │   ├── expander.rs         # Collections -> séquences de pistes
//! │   ├── orchestrator.rs     # Machine d'états d'une requête
//! │   ├── handler.rs          # Messages de chat entrants
//! │   ├── link.rs             # Classification des liens
//! │   ├── delivery.rs         # Frontière avec le transport de chat
//! │   ├── naming.rs           # Noms de fichiers
//! │   ├── models.rs           # Structures de données
//! │   ├── config_ext.rs       # Extension de pmoconfig
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmoconfig::Config;
//! use pmoyandex::{Delivery, MessageHandler, Orchestrator, TrackMetadata};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct Stdout;
//!
//! #[async_trait::async_trait]
//! impl Delivery for Stdout {
//!     async fn notify(&self, text: &str) {
//!         println!("{}", text);
//!     }
//!
//!     async fn deliver_audio(&self, path: &Path, track: &TrackMetadata) -> pmoyandex::Result<()> {
//!         println!("{} -> {}", track.display_name(), path.display());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_config("")?;
//!     let handler = MessageHandler::new(Arc::new(Orchestrator::from_config(&config)?));
//!
//!     handler
//!         .handle_message("https://music.yandex.ru/album/1/track/2", &Stdout)
//!         .await;
//!     Ok(())
//! }
//! ```
//!
//! ## Gestion des erreurs
//!
//! Toutes les opérations renvoient [`Result<T>`] avec [`YandexError`]. Les
//! erreurs d'une piste dans une collection sont notifiées et comptées ;
//! seules les erreurs de niveau requête remontent jusqu'au
//! [`MessageHandler`], qui les rapporte à l'utilisateur.

pub mod api;
pub mod client;
pub mod config_ext;
pub mod delivery;
pub mod downloader;
pub mod error;
pub mod expander;
pub mod handler;
pub mod link;
pub mod models;
pub mod naming;
pub mod orchestrator;
pub mod retry;

pub use client::{ClientBuilder, YandexClient};
pub use config_ext::YandexConfigExt;
pub use delivery::Delivery;
pub use downloader::Downloader;
pub use error::{Result, YandexError};
pub use expander::TrackQueue;
pub use handler::{MessageHandler, MessageOutcome};
pub use models::{
    CollectionMetadata, ContentKind, ContentReference, DownloadArtifact, OutcomeTally,
    TrackMetadata, TrackReference,
};
pub use orchestrator::{Orchestrator, RequestOutcome, RequestState};
pub use retry::{RetryPolicy, RpcClient};
