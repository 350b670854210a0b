use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::bridge::Snapshotter;
use crate::graph::{GraphFlattener, MAX_DEPTH_LIMIT};
use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Environment variable that overrides `inspector_url`.
pub const URL_ENV: &str = "INSPECTOR_BRIDGE_URL";

pub const DEFAULT_INSPECTOR_URL: &str = "ws://127.0.0.1:9229/bridge";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Inspector URL must use ws:// or wss://, got {0:?}")]
    InvalidUrl(String),

    #[error("{setting} = {depth} exceeds the limit of {limit}")]
    DepthTooLarge {
        setting: &'static str,
        depth: usize,
        limit: usize,
    },
}

/// Bridge configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// WebSocket endpoint of the inspector
    pub inspector_url: String,
    /// Flattening of event payloads
    pub events: FlattenSettings,
    /// Flattening of component snapshots and store state
    pub snapshot: SnapshotSettings,
    pub transport: TransportSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlattenSettings {
    pub max_depth: usize,
    pub excluded_keys: Vec<String>,
}

impl FlattenSettings {
    pub fn flattener(&self) -> GraphFlattener {
        GraphFlattener::new(self.max_depth, self.excluded_keys.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSettings {
    pub flatten: FlattenSettings,
    pub max_component_depth: usize,
}

impl SnapshotSettings {
    pub fn snapshotter(&self) -> Snapshotter {
        Snapshotter::new(self.flatten.flattener(), self.max_component_depth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    pub reconnect_delay: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            inspector_url: DEFAULT_INSPECTOR_URL.to_string(),
            events: FlattenSettings {
                max_depth: 20,
                excluded_keys: keys(&["_isVue", "state", "_vm", "$store"]),
            },
            snapshot: SnapshotSettings {
                flatten: FlattenSettings {
                    max_depth: 10,
                    excluded_keys: keys(&["_isVue", "_vm", "$store", "$parent", "$root"]),
                },
                max_component_depth: 32,
            },
            transport: TransportSettings {
                reconnect_delay: Duration::from_millis(2000),
            },
        }
    }
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlFlattenConfig {
    pub max_depth: Option<usize>,
    pub excluded_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlSnapshotConfig {
    pub max_depth: Option<usize>,
    pub excluded_keys: Option<Vec<String>>,
    pub max_component_depth: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlTransportConfig {
    pub reconnect_delay_ms: Option<u64>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlBridgeConfig {
    pub inspector_url: Option<String>,
    pub events: Option<TomlFlattenConfig>,
    pub snapshot: Option<TomlSnapshotConfig>,
    pub transport: Option<TomlTransportConfig>,
}

impl TomlFlattenConfig {
    fn merge_into(self, settings: &mut FlattenSettings) {
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }
        if let Some(excluded_keys) = self.excluded_keys {
            settings.excluded_keys = excluded_keys;
        }
    }
}

impl BridgeConfig {
    /// Load `~/.inspector-bridge/config.toml`, merging with defaults.
    ///
    /// A missing file is created from the bundled example. An unreadable or
    /// invalid file is logged and the defaults are used.
    pub fn load() -> Self {
        let config_file = config_path();

        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        let config = match Self::load_from(&config_file) {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(
                    path = %config_file.display(),
                    error = %error,
                    "Ignoring config file"
                );
                Self::default()
            }
        };
        config.with_env_override(std::env::var(URL_ENV).ok())
    }

    /// Load a specific file. Missing files yield the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let toml_config: TomlBridgeConfig = toml::from_str(contents)?;
        let mut config = Self::default();

        if let Some(url) = toml_config.inspector_url {
            config.inspector_url = url;
        }

        if let Some(events) = toml_config.events {
            events.merge_into(&mut config.events);
        }

        if let Some(snapshot) = toml_config.snapshot {
            TomlFlattenConfig {
                max_depth: snapshot.max_depth,
                excluded_keys: snapshot.excluded_keys,
            }
            .merge_into(&mut config.snapshot.flatten);
            if let Some(depth) = snapshot.max_component_depth {
                config.snapshot.max_component_depth = depth;
            }
        }

        if let Some(transport) = toml_config.transport {
            if let Some(delay) = transport.reconnect_delay_ms {
                config.transport.reconnect_delay = Duration::from_millis(delay);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Replace the URL with `value` when it is set, non-empty and a WebSocket
    /// URL. Anything else is logged and the current URL kept.
    pub fn with_env_override(mut self, value: Option<String>) -> Self {
        let Some(url) = value.filter(|url| !url.trim().is_empty()) else {
            return self;
        };
        if let Err(error) = check_url(&url) {
            tracing::warn!(
                var = URL_ENV,
                error = %error,
                kept = %self.inspector_url,
                "Ignoring inspector URL from environment"
            );
            return self;
        }
        tracing::debug!(url = %url, "Inspector URL overridden from environment");
        self.inspector_url = url;
        self
    }

    pub fn with_inspector_url(mut self, url: impl Into<String>) -> Self {
        self.inspector_url = url.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url(&self.inspector_url)?;
        check_depth("events.max_depth", self.events.max_depth)?;
        check_depth("snapshot.max_depth", self.snapshot.flatten.max_depth)?;
        check_depth(
            "snapshot.max_component_depth",
            self.snapshot.max_component_depth,
        )
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    tracing::warn!(error = %e, "Failed to create config directory");
                    return;
                }
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(error = %e, "Failed to write default config");
        }
    }
}

fn check_url(url: &str) -> Result<(), ConfigError> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl(url.to_string()))
    }
}

fn check_depth(setting: &'static str, depth: usize) -> Result<(), ConfigError> {
    if depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::DepthTooLarge {
            setting,
            depth,
            limit: MAX_DEPTH_LIMIT,
        });
    }
    Ok(())
}
