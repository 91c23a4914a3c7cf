//! Initialisation du logging

use pmoconfig::Config;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installe le subscriber `fmt`
///
/// `RUST_LOG` a priorité ; sinon le niveau vient de `host.logger.min_level`.
pub fn init_logging(config: &Config) {
    let level = config
        .get_log_min_level()
        .unwrap_or_else(|_| "INFO".to_string())
        .to_lowercase();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true),
        )
        .init();
}
