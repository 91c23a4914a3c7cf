//! Outil CLI pour chiffrer/déchiffrer le jeton du bot
//!
//! Usage:
//!   cargo run --example encrypt_token -- encrypt "123456:ABC..."
//!   cargo run --example encrypt_token -- decrypt "encrypted:ABC123..."
//!   cargo run --example encrypt_token -- save "123456:ABC..." [CONFIG_DIR]

use anyhow::Result;
use pmoconfig::encryption::{decrypt_secret, encrypt_secret, is_encrypted};
use pmoconfig::Config;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match (args.get(1).map(String::as_str), args.get(2)) {
        (Some("encrypt"), Some(token)) => {
            let encrypted = encrypt_secret(token)?;
            println!("Encrypted: {}", encrypted);
            println!("\nAdd this to your config.yaml:");
            println!("bot:\n  token: \"{}\"", encrypted);
        }

        (Some("decrypt"), Some(encrypted)) => {
            if !is_encrypted(encrypted) {
                eprintln!("Error: Value does not start with 'encrypted:'");
                return Ok(());
            }

            match decrypt_secret(encrypted) {
                Ok(token) => println!("Decrypted: {}", token),
                Err(e) => {
                    eprintln!("Error: Failed to decrypt token");
                    eprintln!("This value was probably encrypted on a different machine.");
                    eprintln!("Details: {}", e);
                }
            }
        }

        (Some("save"), Some(token)) => {
            let dir = args.get(3).map(String::as_str).unwrap_or("");
            let config = Config::load_config(dir)?;
            config.set_bot_token(token)?;
            println!(
                "Encrypted token saved to {}/config.yaml",
                config.get_config_dir()
            );
        }

        _ => print_usage(),
    }

    Ok(())
}

fn print_usage() {
    println!("Usage:");
    println!("  cargo run --example encrypt_token -- encrypt <token>");
    println!("  cargo run --example encrypt_token -- decrypt <encrypted>");
    println!("  cargo run --example encrypt_token -- save <token> [config_dir]");
}
