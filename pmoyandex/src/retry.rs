//! Client RPC avec nouvelles tentatives
//!
//! Chaque appel distant du catalogue passe par [`RpcClient::call`], qui
//! relance l'opération avec un délai croissant linéairement
//! (`base_delay * numéro_de_tentative`) jusqu'à `max_attempts` tentatives au
//! total. Les erreurs permanentes (ressource absente, requête refusée) ne sont
//! pas relancées.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Nombre total de tentatives par défaut
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Délai de base entre deux tentatives (ms)
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Politique de nouvelles tentatives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Nombre total de tentatives (0 est traité comme 1)
    pub max_attempts: u32,
    /// Délai multiplié par le numéro de la tentative échouée
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Délai à attendre après l'échec de la tentative `attempt` (à partir de 1)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Exécute des appels distants sous une [`RetryPolicy`]
#[derive(Debug, Clone, Default)]
pub struct RpcClient {
    policy: RetryPolicy,
}

impl RpcClient {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Exécute `operation` jusqu'au premier succès
    ///
    /// Si toutes les tentatives échouent, l'erreur de la DERNIÈRE tentative
    /// est renvoyée telle quelle.
    pub async fn call<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max = self.policy.attempts();
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Call succeeded on attempt {}/{}", attempt, max);
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_transient() => {
                    debug!("Permanent failure on attempt {}/{}: {}", attempt, max, e);
                    return Err(e);
                }
                Err(e) if attempt >= max => {
                    warn!("Giving up after {} attempts: {}", max, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "Attempt {}/{} failed: {} (retrying in {:?})",
                        attempt, max, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::YandexError;
    use crate::models::ContentKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_client(max_attempts: u32) -> RpcClient {
        RpcClient::new(RetryPolicy::new(max_attempts, Duration::from_millis(1)))
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = fast_client(3)
            .call(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, YandexError>(42)
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = fast_client(3)
            .call(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(YandexError::from_status_code(503, format!("attempt {}", n)))
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_surfaces_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_client(3)
            .call(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(YandexError::from_status_code(500, format!("attempt {}", n)))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(YandexError::ApiError { message, .. }) => assert_eq!(message, "attempt 3"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_permanent_error_short_circuits() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_client(3)
            .call(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(YandexError::NotFound {
                    kind: ContentKind::Track,
                    id: "1".into(),
                })
            })
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_once() {
        let calls = AtomicU32::new(0);
        let _: Result<()> = fast_client(0)
            .call(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(YandexError::from_status_code(500, "boom"))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
