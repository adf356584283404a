use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::{Result, TellmyError};
use crate::network::{DEFAULT_PROBE_TIMEOUT, NetworkMode};
use crate::storage::retention::DEFAULT_MAX_AGE_DAYS;
use crate::storage::{OpenOptions, RetentionPolicy};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Defaults, then the config file, then `TELLMY_*` environment overrides.
    ///
    /// An explicit path (or `TELLMY_CONFIG`) replaces the global file
    /// `<config_dir>/tellmy/config.toml`.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("TELLMY_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                TellmyError::MissingConfig(format!("config file {} not found", path.display()))
            })?;
            config.merge_patch(patch);
        } else if let Some(global) = Self::load_global()? {
            config.merge_patch(global);
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tellmy/config.toml"))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match Self::global_path() {
            Some(path) => Self::load_patch(&path),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| TellmyError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw).map_err(|err| {
            TellmyError::Config(format!("parse config {}: {err}", path.display()))
        })?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.store {
            self.store.merge(patch);
        }
        if let Some(patch) = patch.api {
            self.api.merge(patch);
        }
        if let Some(patch) = patch.network {
            self.network.merge(patch);
        }
        if let Some(patch) = patch.sync {
            self.sync.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup("TELLMY_DB_PATH") {
            self.store.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = parse_var::<u32>(&lookup, "TELLMY_CACHE_MAX_AGE_DAYS")? {
            self.store.cache_max_age_days = value;
        }
        if let Some(value) = lookup("TELLMY_API_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = parse_var::<u64>(&lookup, "TELLMY_API_TIMEOUT_SECS")? {
            self.api.timeout_secs = value;
        }
        if let Some(value) = lookup("TELLMY_NETWORK_MODE") {
            self.network.mode = value.parse()?;
        }
        if let Some(value) = parse_var::<u32>(&lookup, "TELLMY_SYNC_MAX_RETRIES")? {
            self.sync.max_retries = Some(value);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file; defaults to `<data_dir>/tellmy/tellmy.db`.
    pub db_path: Option<PathBuf>,
    pub cache_max_age_days: u32,
    pub cleanup_on_startup: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            cache_max_age_days: DEFAULT_MAX_AGE_DAYS,
            cleanup_on_startup: true,
        }
    }
}

impl StoreConfig {
    fn merge(&mut self, patch: StorePatch) {
        if let Some(value) = patch.db_path {
            self.db_path = Some(value);
        }
        if let Some(value) = patch.cache_max_age_days {
            self.cache_max_age_days = value;
        }
        if let Some(value) = patch.cleanup_on_startup {
            self.cleanup_on_startup = value;
        }
    }

    /// Resolved database location.
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("tellmy/tellmy.db"))
            .ok_or_else(|| {
                TellmyError::MissingConfig(
                    "no data directory; set store.db_path or TELLMY_DB_PATH".to_string(),
                )
            })
    }

    #[must_use]
    pub const fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::days(self.cache_max_age_days)
    }

    #[must_use]
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            retention: self.cleanup_on_startup.then(|| self.retention()),
            ..OpenOptions::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl ApiConfig {
    fn merge(&mut self, patch: ApiPatch) {
        if let Some(value) = patch.base_url {
            self.base_url = value;
        }
        if let Some(value) = patch.timeout_secs {
            self.timeout_secs = value;
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub mode: NetworkMode,
    pub probe_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mode: NetworkMode::Auto,
            probe_timeout_ms: u64::try_from(DEFAULT_PROBE_TIMEOUT.as_millis()).unwrap_or(2000),
        }
    }
}

impl NetworkConfig {
    fn merge(&mut self, patch: NetworkPatch) {
        if let Some(value) = patch.mode {
            self.mode = value;
        }
        if let Some(value) = patch.probe_timeout_ms {
            self.probe_timeout_ms = value;
        }
    }

    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Stop replaying an item once it has failed this many times. Unset means no cap.
    pub max_retries: Option<u32>,
}

impl SyncConfig {
    fn merge(&mut self, patch: SyncPatch) {
        if let Some(value) = patch.max_retries {
            self.max_retries = Some(value);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub store: Option<StorePatch>,
    pub api: Option<ApiPatch>,
    pub network: Option<NetworkPatch>,
    pub sync: Option<SyncPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StorePatch {
    pub db_path: Option<PathBuf>,
    pub cache_max_age_days: Option<u32>,
    pub cleanup_on_startup: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApiPatch {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NetworkPatch {
    pub mode: Option<NetworkMode>,
    pub probe_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SyncPatch {
    pub max_retries: Option<u32>,
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| TellmyError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}
