//! Chiffrement des secrets de la configuration (jeton du bot)
//!
//! La clé AES-256 est dérivée de l'identifiant matériel de la machine : un
//! fichier de configuration contenant `encrypted:...` n'est lisible que sur
//! la machine qui l'a produit.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use base64::Engine;
use sha2::{Digest, Sha256};

/// Préfixe des valeurs chiffrées
pub const ENCRYPTED_PREFIX: &str = "encrypted:";

const KEY_SALT: &[u8] = b"pmobot-config-encryption-v1";
const NONCE_SALT: &[u8] = b"pmobot-nonce-v1";
const NONCE_LEN: usize = 12;

/// Récupère l'identifiant matériel de la machine
///
/// Linux : `/etc/machine-id` puis `/var/lib/dbus/machine-id`.
/// macOS : `ioreg -d2 -c IOPlatformExpertDevice`.
/// Windows : `wmic csproduct get UUID`.
fn get_machine_uuid() -> Result<String> {
    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("ioreg")
            .args(["-d2", "-c", "IOPlatformExpertDevice"])
            .output()?;

        let output_str = String::from_utf8_lossy(&output.stdout);
        output_str
            .lines()
            .find(|line| line.contains("IOPlatformUUID"))
            .and_then(|line| line.split('"').nth(3))
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Failed to extract IOPlatformUUID from ioreg"))
    }

    #[cfg(target_os = "linux")]
    {
        ["/etc/machine-id", "/var/lib/dbus/machine-id"]
            .iter()
            .filter_map(|p| std::fs::read_to_string(p).ok())
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Failed to read machine-id"))
    }

    #[cfg(target_os = "windows")]
    {
        let output = std::process::Command::new("wmic")
            .args(["csproduct", "get", "UUID"])
            .output()?;

        let output_str = String::from_utf8_lossy(&output.stdout);
        output_str
            .lines()
            .nth(1)
            .map(|uuid| uuid.trim().to_string())
            .ok_or_else(|| anyhow!("Failed to extract UUID from wmic"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        Err(anyhow!("Unsupported platform for machine UUID extraction"))
    }
}

fn derive_key() -> Result<[u8; 32]> {
    let machine_uuid = get_machine_uuid()?;

    let mut hasher = Sha256::new();
    hasher.update(machine_uuid.as_bytes());
    hasher.update(KEY_SALT);

    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    Ok(key)
}

fn cipher() -> Result<Aes256Gcm> {
    let key = derive_key()?;
    Aes256Gcm::new_from_slice(&key).map_err(|e| anyhow!("Failed to create cipher: {}", e))
}

/// Chiffre un secret avec la clé de la machine
///
/// Résultat au format `encrypted:BASE64(nonce || ciphertext)`. Le nonce est
/// dérivé du secret : chiffrer deux fois la même valeur donne la même
/// chaîne, le fichier de configuration n'est donc pas réécrit inutilement.
pub fn encrypt_secret(secret: &str) -> Result<String> {
    let cipher = cipher()?;

    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(NONCE_SALT);
    let nonce_hash = hasher.finalize();
    let nonce_bytes = &nonce_hash[..NONCE_LEN];

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(nonce_bytes), secret.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(format!(
        "{}{}",
        ENCRYPTED_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(&combined)
    ))
}

/// Déchiffre une valeur `encrypted:...`
pub fn decrypt_secret(encrypted: &str) -> Result<String> {
    let base64_data = encrypted
        .strip_prefix(ENCRYPTED_PREFIX)
        .ok_or_else(|| anyhow!("Invalid encrypted value format (missing prefix)"))?;

    let combined = base64::engine::general_purpose::STANDARD
        .decode(base64_data)
        .map_err(|e| anyhow!("Invalid base64: {}", e))?;

    if combined.len() < NONCE_LEN {
        return Err(anyhow!("Invalid ciphertext (too short)"));
    }
    let (nonce, ciphertext) = combined.split_at(NONCE_LEN);

    let plaintext = cipher()?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| anyhow!("Decryption failed (wrong machine or corrupted data): {}", e))?;

    String::from_utf8(plaintext).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
}

/// Vérifie si une valeur est chiffrée
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_PREFIX)
}

/// Renvoie le secret en clair, qu'il soit stocké chiffré ou non
pub fn get_secret(value: &str) -> Result<String> {
    if is_encrypted(value) {
        decrypt_secret(value)
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_key_available() -> bool {
        get_machine_uuid().is_ok()
    }

    #[test]
    fn test_encrypt_decrypt() {
        if !machine_key_available() {
            return;
        }
        let token = "123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11";

        let encrypted = encrypt_secret(token).unwrap();
        assert!(encrypted.starts_with(ENCRYPTED_PREFIX));
        assert_ne!(encrypted, token);
        assert_eq!(decrypt_secret(&encrypted).unwrap(), token);

        // Chiffrement déterministe
        assert_eq!(encrypt_secret(token).unwrap(), encrypted);
    }

    #[test]
    fn test_is_encrypted() {
        assert!(is_encrypted("encrypted:SGVsbG8="));
        assert!(!is_encrypted("plaintext"));
        assert!(!is_encrypted(""));
    }

    #[test]
    fn test_get_secret_plaintext() {
        assert_eq!(get_secret("plaintext").unwrap(), "plaintext");
    }

    #[test]
    fn test_decrypt_rejects_malformed_values() {
        assert!(decrypt_secret("no-prefix").is_err());
        assert!(decrypt_secret("encrypted:!!!not-base64!!!").is_err());
        assert!(decrypt_secret("encrypted:AAAA").is_err());
    }
}
