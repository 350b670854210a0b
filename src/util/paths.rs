//! Where the bridge keeps its config and logs.
//!
//! Everything lives under one data directory, `~/.inspector-bridge` unless
//! `--data-dir` picks another one at startup.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const APP_DIR: &str = ".inspector-bridge";
const LOG_FILE: &str = "inspector-bridge.log";
const CONFIG_FILE: &str = "config.toml";

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Pin the data directory for the rest of the process. Only the first call
/// wins; later ones are logged and ignored.
pub fn init_data_dir(custom_path: Option<PathBuf>) {
    let requested = custom_path.unwrap_or_else(default_data_dir);
    let active = DATA_DIR.get_or_init(|| requested.clone());
    if *active != requested {
        tracing::debug!(
            requested = %requested.display(),
            active = %active.display(),
            "Data directory already set"
        );
    }
}

fn default_data_dir() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(APP_DIR),
        None => PathBuf::from(APP_DIR),
    }
}

pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

pub fn logs_dir() -> PathBuf {
    Layout::new(data_dir()).logs
}

pub fn log_file_path() -> PathBuf {
    Layout::new(data_dir()).log_file
}

pub fn config_path() -> PathBuf {
    Layout::new(data_dir()).config
}

/// File locations relative to a data directory.
#[derive(Debug)]
struct Layout {
    logs: PathBuf,
    log_file: PathBuf,
    config: PathBuf,
}

impl Layout {
    fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let logs = base.join("logs");
        Self {
            log_file: logs.join(LOG_FILE),
            logs,
            config: base.join(CONFIG_FILE),
        }
    }
}
