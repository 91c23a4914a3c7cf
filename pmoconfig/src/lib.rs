//! # pmobot Configuration Module
//!
//! This module provides configuration management for pmobot, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::Config;
//!
//! let config = Config::load_config("")?;
//!
//! let token = config.get_bot_token()?;
//! let outbox = config.get_outbox_dir()?;
//!
//! config.set_log_min_level("DEBUG".to_string())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Mutex, MutexGuard},
};
use tracing::{debug, info};

// Module de chiffrement des secrets
pub mod encryption;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmobot.yaml");

const ENV_CONFIG_DIR: &str = "PMOBOT_CONFIG";
const ENV_PREFIX: &str = "PMOBOT_CONFIG__";
const CONFIG_DIR_NAME: &str = ".pmobot";

/// Variable d'environnement acceptée pour le jeton du bot
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";

// Default values for configuration
const DEFAULT_OUTBOX_DIR: &str = "outbox";
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";

/// Configuration manager for pmobot
///
/// The YAML tree lives behind a mutex; every setter writes the whole tree
/// back to `config.yaml`. Environment overrides sit in a separate layer that
/// is consulted first by the getters and never saved.
///
/// # Examples
///
/// ```no_run
/// use pmoconfig::Config;
///
/// let config = Config::load_config("")?;
/// println!("Log level: {}", config.get_log_min_level()?);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
    overrides: Value,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        // 1. Try provided directory
        if !directory.is_empty() {
            return directory.to_string();
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return env_path;
        }

        // 3. Try current directory
        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        // Default fallback
        CONFIG_DIR_NAME.to_string()
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!(
                "Config path {} is not a directory",
                path.display()
            ));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMOBOT_CONFIG` environment variable
    /// 3. `.pmobot` in the current directory
    /// 4. `.pmobot` in the user's home directory
    ///
    /// The directory is created if it doesn't exist, and validated for read/write permissions.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Saves the merged configuration
    /// 5. Collects environment variable overrides (kept in memory only)
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir=%config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut config_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file=%path, "Loaded config file");
                let external_value: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut config_value, &Self::lower_keys_value(external_value));
            }
            Err(_) => {
                info!(config_file=%path, "Config file not found, using default embedded config");
            }
        }

        let mut overrides = Value::Mapping(Mapping::new());
        Self::apply_env_overrides(&mut overrides);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(Self::lower_keys_value(config_value)),
            overrides,
        };
        config.save()?;

        Ok(config)
    }

    /// Répertoire de configuration effectivement utilisé
    pub fn get_config_dir(&self) -> &str {
        &self.config_dir
    }

    fn lock(&self) -> Result<MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.lock()?)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["catalog", "timeout_secs"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.lock()?;
            Self::set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        if path.is_empty() {
            *data = value;
            return Ok(());
        }
        if let Value::Mapping(map) = data {
            let key_value = Value::String(path[0].to_lowercase());
            if path.len() == 1 {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, &path[1..], value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist in either the file layer
    /// or the environment layer.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock()?;
        let stored = Self::get_value_internal(&data, path);

        match (stored, Self::get_value_internal(&self.overrides, path)) {
            (Ok(mut value), Ok(over)) => {
                merge_yaml(&mut value, &over);
                Ok(value)
            }
            (Err(_), Ok(over)) => Ok(over),
            (stored, Err(_)) => stored,
        }
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                match map.get(&Value::String(key.to_lowercase())) {
                    Some(next) => current = next,
                    None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
                }
            } else {
                return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides(config: &mut Value) {
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                debug!(variable=%key, "Applying environment override");
                let _ = Self::set_value_internal(config, &key_path, Self::convert_env_value(&value));
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => {
                let mut new_map = Mapping::new();
                for (k, v) in map {
                    let key = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    new_map.insert(key, Self::lower_keys_value(v));
                }
                Value::Mapping(new_map)
            }
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    /// Résout un chemin relatif ou absolu et crée le répertoire si nécessaire
    fn resolve_and_create_dir(&self, dir_path: &str) -> Result<String> {
        let path = Path::new(dir_path);

        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            Path::new(&self.config_dir).join(path)
        };

        if !absolute_path.exists() {
            fs::create_dir_all(&absolute_path)?;
            info!(directory=%absolute_path.display(), "Created managed directory");
        }

        Ok(absolute_path.to_string_lossy().to_string())
    }

    /// Récupère un répertoire géré par la configuration
    ///
    /// Le répertoire peut être absolu ou relatif au répertoire de
    /// configuration. Il est créé s'il n'existe pas.
    ///
    /// # Exemple
    ///
    /// ```no_run
    /// use pmoconfig::Config;
    ///
    /// let config = Config::load_config("")?;
    /// let downloads = config.get_managed_dir(&["downloads", "directory"], "downloads")?;
    /// println!("Downloads directory: {}", downloads);
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn get_managed_dir(&self, path: &[&str], default: &str) -> Result<String> {
        let dir_path = match self.get_value(path) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s,
            _ => {
                self.set_managed_dir(path, default.to_string())?;
                default.to_string()
            }
        };
        self.resolve_and_create_dir(&dir_path)
    }

    /// Définit un répertoire géré par la configuration
    pub fn set_managed_dir(&self, path: &[&str], directory: String) -> Result<()> {
        self.set_value(path, Value::String(directory))
    }

    /// Récupère le jeton du bot
    ///
    /// Ordre : `bot.token` (déchiffré si préfixé par `encrypted:`), puis la
    /// variable d'environnement `BOT_TOKEN`. L'absence des deux est une
    /// erreur.
    pub fn get_bot_token(&self) -> Result<String> {
        if let Ok(Value::String(token)) = self.get_value(&["bot", "token"]) {
            let token = token.trim();
            if !token.is_empty() {
                return encryption::get_secret(token);
            }
        }

        match env::var(ENV_BOT_TOKEN) {
            Ok(token) if !token.trim().is_empty() => encryption::get_secret(token.trim()),
            _ => Err(anyhow!(
                "Bot token not found, set bot.token in config.yaml or {} in the environment",
                ENV_BOT_TOKEN
            )),
        }
    }

    /// Enregistre le jeton du bot, chiffré avec la clé de la machine
    pub fn set_bot_token(&self, token: &str) -> Result<()> {
        let encrypted = encryption::encrypt_secret(token)?;
        self.set_value(&["bot", "token"], Value::String(encrypted))
    }

    /// Répertoire où le transport console dépose les fichiers livrés
    pub fn get_outbox_dir(&self) -> Result<String> {
        self.get_managed_dir(&["bot", "outbox_dir"], DEFAULT_OUTBOX_DIR)
    }

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default values.
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}
