//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$LEADSIFT_CONFIG` (environment variable)
//! 2. `~/.config/leadsift/config.toml` (Linux)
//!    `~/Library/Application Support/leadsift/config.toml` (macOS)
//!    `%APPDATA%\leadsift\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Mailbox settings can then be overridden with `LEADSIFT_EMAIL_*` variables,
//! which is the usual way to supply the password.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// IMAP inbox to pull leads from.
    pub mailbox: MailboxConfig,
    /// Lead store location.
    pub store: StoreConfig,
    /// Export defaults.
    pub export: ExportConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override the data directory (lead store and log file).
    pub data_dir: Option<PathBuf>,
    /// `strftime` format for dates in lead tables.
    pub date_format: String,
}

/// IMAP inbox settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Prefer `LEADSIFT_EMAIL_PASSWORD` over storing this in the file.
    pub password: Option<String>,
    /// Plain-text IMAP is refused; kept so a config can state it explicitly.
    pub use_tls: bool,
    /// Folder opened read-only.
    pub folder: String,
    /// Only messages received in the last N days are fetched.
    pub since_days: u32,
    /// Keep at most the N most recent matching messages.
    pub limit: usize,
    /// Bound on TCP connect + TLS handshake + login.
    pub connect_timeout_secs: u64,
}

/// Lead store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Explicit path to the JSON store (default: `<data_dir>/leads.json`).
    pub path: Option<PathBuf>,
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default export format: "csv" or "json".
    pub default_format: String,
    /// CSV field separator character.
    pub csv_separator: char,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            data_dir: None,
            date_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            host: "imap.gmail.com".to_string(),
            port: 993,
            user: String::new(),
            password: None,
            use_tls: true,
            folder: "INBOX".to_string(),
            since_days: 30,
            limit: 100,
            connect_timeout_secs: 3,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: "csv".to_string(),
            csv_separator: ',',
        }
    }
}

// ── Environment overrides ───────────────────────────────────────

impl MailboxConfig {
    /// Apply `LEADSIFT_EMAIL_{HOST,PORT,USER,PASSWORD,TLS}` on top of the file values.
    ///
    /// `lookup` abstracts `std::env::var` so the mapping can be tested.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("LEADSIFT_EMAIL_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("LEADSIFT_EMAIL_PORT") {
            match port.trim().parse() {
                Ok(p) => self.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid LEADSIFT_EMAIL_PORT"),
            }
        }
        if let Some(user) = lookup("LEADSIFT_EMAIL_USER") {
            self.user = user;
        }
        if let Some(password) = lookup("LEADSIFT_EMAIL_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(tls) = lookup("LEADSIFT_EMAIL_TLS") {
            self.use_tls = matches!(tls.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations, then apply env overrides.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    let mut config = load_config_file().unwrap_or_default();
    config.mailbox.apply_env(|key| std::env::var(key).ok());
    config
}

fn load_config_file() -> Option<Config> {
    let path = config_file_path()?;
    if !path.exists() {
        return None;
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), "Loaded config");
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config, using defaults"
                );
                None
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read config file, using defaults"
            );
            None
        }
    }
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("LEADSIFT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("leadsift").join("config.toml"))
}

/// Directory for the lead store and the log file.
pub fn data_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.data_dir {
        return dir.clone();
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("leadsift")
}

/// Path of the JSON lead store.
pub fn store_path(config: &Config) -> PathBuf {
    config
        .store
        .path
        .clone()
        .unwrap_or_else(|| data_dir(config).join("leads.json"))
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    data_dir(config).join("leadsift.log")
}
