//! Daemon configuration.
//!
//! Precedence, lowest first: built-in defaults, `config.toml` in the data
//! directory, a `.env` file in the working directory, process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strand_bootstrap::http::hub::DEFAULT_HUB_HOST;
use strand_bootstrap::BootstrapSettings;
use strand_crypto::argon2id::KdfParams;
use strand_types::KeyInfo;
use zeroize::Zeroizing;

/// Environment keys.
pub mod env {
    pub const STORAGE_NETWORK_HOST: &str = "STORAGE_NETWORK_HOST";
    pub const STORAGE_NETWORK_TOKEN: &str = "STORAGE_NETWORK_TOKEN";
    pub const LOCAL_DAEMON_HOST: &str = "LOCAL_DAEMON_HOST";
    pub const DB_API_KEY: &str = "DB_API_KEY";
    pub const DB_API_SECRET: &str = "DB_API_SECRET";
    pub const DB_HUB_HOST: &str = "DB_HUB_HOST";
    pub const CREDENTIAL_PASSPHRASE: &str = "CREDENTIAL_PASSPHRASE";
    pub const DATA_DIR: &str = "STRAND_DATA_DIR";
    pub const LOG_LEVEL: &str = "STRAND_LOG_LEVEL";
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub storage_network: StorageNetworkConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub daemon: LocalDaemonConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageNetworkConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_hub_host")]
    pub hub_host: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalDaemonConfig {
    /// The daemon listens on 9998 unless configured otherwise.
    #[serde(default = "default_daemon_host")]
    pub host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Seals the wallet mnemonic. Prefer the environment over the file.
    #[serde(default)]
    pub passphrase: String,
    /// Argon2id memory cost in KiB.
    #[serde(default = "default_kdf_m_cost")]
    pub kdf_m_cost: u32,
    #[serde(default = "default_kdf_t_cost")]
    pub kdf_t_cost: u32,
    #[serde(default = "default_kdf_p_cost")]
    pub kdf_p_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Empty = stderr.
    #[serde(default)]
    pub log_file: String,
}

fn default_hub_host() -> String {
    DEFAULT_HUB_HOST.to_string()
}

fn default_daemon_host() -> String {
    strand_bootstrap::connectors::DEFAULT_DAEMON_HOST.to_string()
}

fn default_kdf_m_cost() -> u32 {
    KdfParams::default().m_cost
}

fn default_kdf_t_cost() -> u32 {
    KdfParams::default().t_cost
}

fn default_kdf_p_cost() -> u32 {
    KdfParams::default().p_cost
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            hub_host: default_hub_host(),
            api_key: String::new(),
            api_secret: String::new(),
        }
    }
}

impl Default for LocalDaemonConfig {
    fn default() -> Self {
        Self {
            host: default_daemon_host(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            passphrase: String::new(),
            kdf_m_cost: default_kdf_m_cost(),
            kdf_t_cost: default_kdf_t_cost(),
            kdf_p_cost: default_kdf_p_cost(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            log_level: default_log_level(),
            log_file: String::new(),
        }
    }
}

impl DaemonConfig {
    /// Load from the data directory, `.env` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(&config_path(&vars), &vars)
    }

    /// Load `path` (if it exists), then apply overrides from `vars`.
    pub fn load_from(path: &Path, vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.apply_env(vars);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, vars: &HashMap<String, String>) {
        let overrides: [(&str, &mut String); 9] = [
            (env::STORAGE_NETWORK_HOST, &mut self.storage_network.host),
            (env::STORAGE_NETWORK_TOKEN, &mut self.storage_network.token),
            (env::LOCAL_DAEMON_HOST, &mut self.daemon.host),
            (env::DB_API_KEY, &mut self.database.api_key),
            (env::DB_API_SECRET, &mut self.database.api_secret),
            (env::DB_HUB_HOST, &mut self.database.hub_host),
            (env::CREDENTIAL_PASSPHRASE, &mut self.credentials.passphrase),
            (env::DATA_DIR, &mut self.advanced.data_dir),
            (env::LOG_LEVEL, &mut self.advanced.log_level),
        ];
        for (key, slot) in overrides {
            if let Some(value) = vars.get(key).filter(|v| !v.is_empty()) {
                *slot = value.clone();
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            (env::STORAGE_NETWORK_HOST, &self.storage_network.host),
            (env::STORAGE_NETWORK_TOKEN, &self.storage_network.token),
            (env::DB_API_KEY, &self.database.api_key),
            (env::DB_API_SECRET, &self.database.api_secret),
            (env::CREDENTIAL_PASSPHRASE, &self.credentials.passphrase),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(key, _)| *key)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        if self.advanced.data_dir.is_empty() {
            default_data_dir()
        } else {
            PathBuf::from(&self.advanced.data_dir)
        }
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        (!self.advanced.log_file.is_empty()).then(|| PathBuf::from(&self.advanced.log_file))
    }

    pub fn kdf(&self) -> KdfParams {
        KdfParams {
            m_cost: self.credentials.kdf_m_cost,
            t_cost: self.credentials.kdf_t_cost,
            p_cost: self.credentials.kdf_p_cost,
        }
    }

    pub fn bootstrap_settings(&self) -> BootstrapSettings {
        BootstrapSettings {
            storage_network_host: self.storage_network.host.clone(),
            storage_network_token: self.storage_network.token.clone(),
            daemon_host: self.daemon.host.clone(),
            db_keys: KeyInfo::user(&self.database.api_key, &self.database.api_secret),
            credential_passphrase: Zeroizing::new(self.credentials.passphrase.clone()),
            kdf: self.kdf(),
        }
    }
}

fn config_path(vars: &HashMap<String, String>) -> PathBuf {
    match vars.get(env::DATA_DIR).filter(|d| !d.is_empty()) {
        Some(dir) => PathBuf::from(dir).join("config.toml"),
        None => default_data_dir().join("config.toml"),
    }
}

/// Platform-specific default data directory.
fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        home_subdir("Library/Application Support/Strand")
    }
    #[cfg(target_os = "windows")]
    {
        home_subdir("Strand")
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        home_subdir(".strand")
    }
}

fn home_subdir(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| std::env::temp_dir().join("strand"))
}
