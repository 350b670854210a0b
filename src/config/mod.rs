mod settings;

pub use settings::{
    BridgeConfig, ConfigError, FlattenSettings, SnapshotSettings, TomlBridgeConfig,
    TransportSettings, DEFAULT_INSPECTOR_URL, EXAMPLE_CONFIG, URL_ENV,
};
