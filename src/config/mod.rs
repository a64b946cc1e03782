//! Client configuration.
//!
//! Values come from, in increasing priority: built-in defaults, `BG3_*`
//! environment variables, then whatever the caller sets through the builder
//! (the binary maps its command-line flags onto it).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::{TranslateError, DEFAULT_TICK_INTERVAL};
use crate::translate::TranslationTable;

/// Server address, `host[:port]`.
pub const ENV_SERVER: &str = "BG3_AP_SERVER";
/// Slot name.
pub const ENV_SLOT: &str = "BG3_AP_SLOT";
/// Room password.
pub const ENV_PASSWORD: &str = "BG3_AP_PASSWORD";
/// Script Extender directory holding the bridge files.
pub const ENV_BRIDGE_DIR: &str = "BG3_BRIDGE_DIR";
/// Tick interval in milliseconds.
pub const ENV_TICK_MS: &str = "BG3_TICK_MS";
/// Path of a JSON translation table replacing the built-in one.
pub const ENV_TABLE: &str = "BG3_AP_TABLE";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The bridge directory does not exist.
    #[error(
        "Script Extender folder not found at {}: make sure Script Extender is installed and the game has run at least once",
        .0.display()
    )]
    MissingBridgeDirectory(PathBuf),

    /// A server was given without a slot to connect as.
    #[error("a slot name is required to connect to {0}")]
    MissingSlotName(String),

    /// The tick interval is zero or not a number.
    #[error("invalid tick interval `{0}`: expected a positive number of milliseconds")]
    InvalidTickInterval(String),

    /// The translation table could not be loaded.
    #[error(transparent)]
    Table(#[from] TranslateError),
}

/// Everything the client needs to run.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Server address; `None` waits for an operator `/connect`.
    pub server: Option<String>,
    /// Slot name.
    pub slot_name: String,
    /// Room password.
    pub password: Option<String>,
    /// Directory holding `ap_in.json` and `ap_out.json`.
    pub bridge_dir: PathBuf,
    /// Reconciler tick interval.
    pub tick_interval: Duration,
    /// JSON translation table, built-in table when `None`.
    pub table_path: Option<PathBuf>,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("server", &self.server)
            .field("slot_name", &self.slot_name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("bridge_dir", &self.bridge_dir)
            .field("tick_interval", &self.tick_interval)
            .field("table_path", &self.table_path)
            .finish()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server: None,
            slot_name: String::new(),
            password: None,
            bridge_dir: default_bridge_dir().unwrap_or_default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            table_path: None,
        }
    }
}

impl BridgeConfig {
    /// Start a builder from defaults.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::new()
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(server) = get(ENV_SERVER) {
            config.server = Some(server);
        }
        if let Some(slot) = get(ENV_SLOT) {
            config.slot_name = slot;
        }
        config.password = get(ENV_PASSWORD);
        if let Some(dir) = get(ENV_BRIDGE_DIR) {
            config.bridge_dir = PathBuf::from(dir);
        }
        if let Some(ms) = get(ENV_TICK_MS) {
            config.tick_interval = parse_tick_ms(&ms)?;
        }
        if let Some(path) = get(ENV_TABLE) {
            config.table_path = Some(PathBuf::from(path));
        }
        Ok(config)
    }

    /// Check the configuration can run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bridge_dir.is_dir() {
            return Err(ConfigError::MissingBridgeDirectory(self.bridge_dir.clone()));
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::InvalidTickInterval("0".into()));
        }
        if let Some(server) = &self.server {
            if self.slot_name.trim().is_empty() {
                return Err(ConfigError::MissingSlotName(server.clone()));
            }
        }
        Ok(())
    }

    /// The configured translation table, or the built-in one.
    pub fn load_table(&self) -> Result<TranslationTable, ConfigError> {
        match &self.table_path {
            Some(path) => Ok(TranslationTable::from_json_file(path)?),
            None => Ok(TranslationTable::bg3()),
        }
    }

    /// Session settings derived from this configuration.
    #[cfg(feature = "session")]
    #[cfg_attr(docsrs, doc(cfg(feature = "session")))]
    pub fn session_config(&self) -> crate::session::SessionConfig {
        crate::session::SessionConfigBuilder::new()
            .server(self.server.clone().unwrap_or_default())
            .slot_name(self.slot_name.clone())
            .password(self.password.clone())
            .connect_on_start(self.server.is_some())
            .build()
    }
}

/// Builder for [`BridgeConfig`].
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    config: BridgeConfig,
}

impl BridgeConfigBuilder {
    /// Start from defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. one read from the environment.
    pub fn from_config(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Set the server address.
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.config.server = Some(server.into());
        self
    }

    /// Set the slot name.
    pub fn slot_name(mut self, name: impl Into<String>) -> Self {
        self.config.slot_name = name.into();
        self
    }

    /// Set the room password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Set the bridge directory.
    pub fn bridge_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.bridge_dir = dir.into();
        self
    }

    /// Set the tick interval.
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = interval;
        self
    }

    /// Load the translation table from a JSON file.
    pub fn table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.table_path = Some(path.into());
        self
    }

    /// Finish. Call [`BridgeConfig::validate`] before use.
    pub fn build(self) -> BridgeConfig {
        self.config
    }
}

/// Default Script Extender directory of the game.
pub fn default_bridge_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| {
        dir.join("Larian Studios")
            .join("Baldur's Gate 3")
            .join("Script Extender")
    })
}

fn parse_tick_ms(value: &str) -> Result<Duration, ConfigError> {
    match value.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidTickInterval(value.to_string())),
    }
}
