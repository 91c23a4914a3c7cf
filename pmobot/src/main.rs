//! pmobot : télécharge les liens Yandex Music reçus par le chat
//!
//! Usage : `pmobot [CONFIG_DIR]`. Chaque ligne lue sur l'entrée standard est
//! traitée comme un message de chat, dans sa propre tâche.

mod console;
mod logs;

use console::ConsoleDelivery;
use pmoconfig::Config;
use pmoyandex::{MessageHandler, Orchestrator};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variables d'environnement (.env) avant la configuration
    dotenvy::dotenv().ok();

    let config_dir = std::env::args().nth(1).unwrap_or_default();
    let config = Config::load_config(&config_dir)?;
    logs::init_logging(&config);
    info!("Configuration loaded from {}", config.get_config_dir());

    if let Err(e) = config.get_bot_token() {
        error!("{}", e);
        std::process::exit(1);
    }
    info!("Bot token loaded");

    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
    let handler = MessageHandler::new(orchestrator);
    let outbox_dir = config.get_outbox_dir()?;

    info!("Bot is starting...");
    info!("Send a Yandex Music link on stdin, Ctrl+C to stop");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tasks = JoinSet::new();
    let mut session: u64 = 0;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // Fin de l'entrée : on laisse finir les requêtes en cours
                    while tasks.join_next().await.is_some() {}
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                session += 1;
                let handler = handler.clone();
                let delivery = ConsoleDelivery::new(session, outbox_dir.clone());
                tasks.spawn(async move {
                    handler.handle_message(&line, &delivery).await;
                });
            }
            Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = result {
                    error!("Message task failed: {}", e);
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
