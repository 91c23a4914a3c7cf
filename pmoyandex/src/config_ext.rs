//! Extension pour intégrer la configuration du catalogue dans pmoconfig
//!
//! Ce module fournit le trait `YandexConfigExt` qui ajoute à
//! `pmoconfig::Config` les réglages du résolveur, du téléchargeur et de
//! l'orchestrateur.

use crate::api::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::orchestrator::DEFAULT_ARTIST_TRACK_LIMIT;
use crate::retry::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::{Number, Value};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DOWNLOADS_DIR: &str = "downloads";

/// Trait d'extension pour lire les réglages du catalogue dans pmoconfig
///
/// Les getters ne renvoient jamais d'erreur pour une valeur absente ou mal
/// typée : la valeur par défaut est utilisée.
///
/// # Exemple
///
/// ```rust,ignore
/// use pmoconfig::Config;
/// use pmoyandex::YandexConfigExt;
///
/// let config = Config::load_config("")?;
/// let policy = config.get_retry_policy();
/// println!("{} attempts", policy.max_attempts);
/// ```
pub trait YandexConfigExt {
    /// URL de base de l'API (`catalog.base_url`)
    fn get_catalog_base_url(&self) -> String;

    /// Timeout par appel (`catalog.timeout_secs`)
    fn get_catalog_timeout(&self) -> Duration;

    /// Qualité haute demandée à la résolution (`catalog.high_quality`)
    fn get_catalog_high_quality(&self) -> bool;

    /// Politique de nouvelles tentatives (`catalog.retry.*`)
    fn get_retry_policy(&self) -> RetryPolicy;

    /// Répertoire des téléchargements, créé si besoin (`downloads.directory`)
    ///
    /// Un chemin relatif est résolu par rapport au répertoire de configuration.
    fn get_downloads_dir(&self) -> Result<PathBuf>;

    /// Nombre maximal de pistes pour un artiste (`downloads.artist_track_limit`)
    fn get_artist_track_limit(&self) -> usize;

    /// Définit la limite de pistes par artiste
    fn set_artist_track_limit(&self, limit: usize) -> Result<()>;
}

fn get_u64(config: &Config, path: &[&str]) -> Option<u64> {
    match config.get_value(path) {
        Ok(Value::Number(n)) => n.as_u64(),
        Ok(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

impl YandexConfigExt for Config {
    fn get_catalog_base_url(&self) -> String {
        match self.get_value(&["catalog", "base_url"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => DEFAULT_API_BASE_URL.to_string(),
        }
    }

    fn get_catalog_timeout(&self) -> Duration {
        let secs = get_u64(self, &["catalog", "timeout_secs"])
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    fn get_catalog_high_quality(&self) -> bool {
        match self.get_value(&["catalog", "high_quality"]) {
            Ok(Value::Bool(b)) => b,
            _ => true,
        }
    }

    fn get_retry_policy(&self) -> RetryPolicy {
        let max_attempts = get_u64(self, &["catalog", "retry", "max_attempts"])
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let base_delay_ms =
            get_u64(self, &["catalog", "retry", "base_delay_ms"]).unwrap_or(DEFAULT_BASE_DELAY_MS);

        RetryPolicy::new(max_attempts, Duration::from_millis(base_delay_ms))
    }

    fn get_downloads_dir(&self) -> Result<PathBuf> {
        let dir = self.get_managed_dir(&["downloads", "directory"], DEFAULT_DOWNLOADS_DIR)?;
        Ok(PathBuf::from(dir))
    }

    fn get_artist_track_limit(&self) -> usize {
        get_u64(self, &["downloads", "artist_track_limit"])
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_ARTIST_TRACK_LIMIT)
    }

    fn set_artist_track_limit(&self, limit: usize) -> Result<()> {
        self.set_value(
            &["downloads", "artist_track_limit"],
            Value::Number(Number::from(limit)),
        )
    }
}
