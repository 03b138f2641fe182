//! Configuration loading and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use credtrack_core::aggregate::CreditCaps;
use credtrack_core::engine::{EngineConfig, DEFAULT_BATCH_SIZE};
use credtrack_core::terms::FullYearPolicy;
use credtrack_core::traits::CreditStore;

use crate::fixture::load_fixture;
use crate::memory::MemoryStore;
use crate::rest::RestStore;

/// Where credit records are read from.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    Memory {
        fixture: PathBuf,
    },
    Rest {
        base_url: String,
        api_key: String,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Memory { fixture } => f
                .debug_struct("Memory")
                .field("fixture", fixture)
                .finish(),
            StoreConfig::Rest {
                base_url,
                api_key: _,
                timeout_secs,
            } => f
                .debug_struct("Rest")
                .field("base_url", base_url)
                .field("api_key", &"***")
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

/// Top-level credtrack configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredtrackConfig {
    /// The record store; required by every command that reads credits.
    #[serde(default)]
    pub store: Option<StoreConfig>,
    /// Students processed concurrently per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Deadline for each store query in milliseconds.
    #[serde(default)]
    pub query_timeout_ms: Option<u64>,
    /// Deadline for each batch in milliseconds.
    #[serde(default)]
    pub batch_timeout_ms: Option<u64>,
    #[serde(default)]
    pub full_year_policy: FullYearPolicy,
    /// Directory `bulk` writes its JSON report to when `--output` is not given.
    /// Unset means no report unless asked for.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub caps: CreditCaps,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for CredtrackConfig {
    fn default() -> Self {
        Self {
            store: None,
            batch_size: default_batch_size(),
            query_timeout_ms: None,
            batch_timeout_ms: None,
            full_year_policy: FullYearPolicy::default(),
            output_dir: None,
            caps: CreditCaps::default(),
        }
    }
}

impl CredtrackConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            batch_size: self.batch_size,
            caps: self.caps,
            query_timeout: self.query_timeout_ms.map(Duration::from_millis),
            batch_timeout: self.batch_timeout_ms.map(Duration::from_millis),
            full_year: self.full_year_policy,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::Memory { fixture } => StoreConfig::Memory {
            fixture: PathBuf::from(resolve_env_vars(&fixture.to_string_lossy())),
        },
        StoreConfig::Rest {
            base_url,
            api_key,
            timeout_secs,
        } => StoreConfig::Rest {
            base_url: resolve_env_vars(base_url),
            api_key: resolve_env_vars(api_key),
            timeout_secs: *timeout_secs,
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `credtrack.toml` in the current directory
/// 2. `~/.config/credtrack/config.toml`
///
/// Environment variable override: `CREDTRACK_API_KEY` replaces the REST store key.
pub fn load_config() -> Result<CredtrackConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<CredtrackConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("credtrack.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CredtrackConfig::default(),
    };

    if let Ok(key) = std::env::var("CREDTRACK_API_KEY") {
        if let Some(StoreConfig::Rest { api_key, .. }) = config.store.as_mut() {
            *api_key = key;
        }
    }

    config.store = config.store.as_ref().map(resolve_store_config);

    // Paths in the file are relative to the config file, not the working directory.
    if let Some(dir) = config_path.as_deref().and_then(Path::parent) {
        if let Some(StoreConfig::Memory { fixture }) = config.store.as_mut() {
            relative_to(dir, fixture);
        }
        if let Some(output_dir) = config.output_dir.as_mut() {
            relative_to(dir, output_dir);
        }
    }

    Ok(config)
}

fn relative_to(dir: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = dir.join(&*path);
    }
}

/// Parse and validate a configuration document.
pub fn parse_config(content: &str) -> Result<CredtrackConfig> {
    let config: CredtrackConfig = toml::from_str(content)?;
    anyhow::ensure!(config.batch_size >= 1, "batch_size must be at least 1");
    anyhow::ensure!(
        config.query_timeout_ms != Some(0),
        "query_timeout_ms must be greater than 0"
    );
    anyhow::ensure!(
        config.batch_timeout_ms != Some(0),
        "batch_timeout_ms must be greater than 0"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("credtrack"))
}

/// Create a store instance from its configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn CreditStore>> {
    match config {
        StoreConfig::Memory { fixture } => {
            let fixture = load_fixture(fixture)?;
            Ok(Arc::new(MemoryStore::new(fixture)))
        }
        StoreConfig::Rest {
            base_url,
            api_key,
            timeout_secs,
        } => {
            let store = match timeout_secs {
                Some(secs) => {
                    RestStore::with_timeout(base_url, api_key, Duration::from_secs(*secs))?
                }
                None => RestStore::new(base_url, api_key)?,
            };
            Ok(Arc::new(store))
        }
    }
}
