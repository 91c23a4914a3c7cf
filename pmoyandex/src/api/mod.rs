//! Couche d'accès à l'API REST du catalogue
//!
//! Ce module fournit une interface bas-niveau : une requête GET, un jeu
//! d'en-têtes fixe, un timeout par appel et le décodage JSON de la réponse.
//! Les nouvelles tentatives sont gérées plus haut, par [`crate::retry`].

pub mod catalog;

use crate::error::{Result, YandexError};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// URL de base de l'API du catalogue
pub const DEFAULT_API_BASE_URL: &str = "https://music.yandex.ru/api";

/// Timeout par appel (secondes)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// User-Agent de navigateur attendu par le catalogue
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Client API bas-niveau pour communiquer avec le catalogue
#[derive(Debug, Clone)]
pub struct YandexApi {
    /// Client HTTP
    client: Client,
    /// URL de base, sans `/` final
    base_url: String,
    /// Demande la qualité haute lors de la résolution des téléchargements
    high_quality: bool,
}

impl YandexApi {
    /// Crée une nouvelle instance de l'API avec les réglages par défaut
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_settings(
            base_url,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            DEFAULT_USER_AGENT,
            true,
        )
    }

    /// Crée une instance avec timeout, User-Agent et qualité explicites
    pub fn with_settings(
        base_url: impl Into<String>,
        timeout: Duration,
        user_agent: &str,
        high_quality: bool,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            high_quality,
        })
    }

    /// Retourne l'URL de base
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Indique si la qualité haute est demandée
    pub fn high_quality(&self) -> bool {
        self.high_quality
    }

    /// Effectue une requête GET à l'API
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        debug!("GET {} with {} params", url, params.len());

        let response = self.client.get(&url).query(params).send().await?;
        self.handle_response(response).await
    }

    /// Traite la réponse HTTP
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();

        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("API error ({}): {}", status.as_u16(), error_text);
            return Err(YandexError::from_status_code(status.as_u16(), error_text));
        }

        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            YandexError::JsonParse(e)
        })
    }
}
