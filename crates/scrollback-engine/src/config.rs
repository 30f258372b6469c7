//! Engine tuning parameters, loadable from `scrollback/engine.toml`.
//!
//! Every numeric constant in here is a tuning choice, not a correctness
//! requirement; the defaults reproduce the behavior the engine was built
//! around (200-record pages, 60-record initial window, 5-entry pagination
//! margin, mention acknowledgments flushed faster than view counters).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CONFIG_FILENAME: &str = "engine.toml";
const CONFIG_DIR: &str = "scrollback";

fn default_page_size() -> usize {
    200
}
fn default_initial_count() -> usize {
    60
}
fn default_pagination_margin() -> usize {
    5
}
fn default_group_interval_secs() -> u64 {
    600
}
fn default_view_debounce_ms() -> u64 {
    1000
}
fn default_mention_debounce_ms() -> u64 {
    200
}
fn default_max_batch() -> usize {
    100
}

/// Engine tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Tuning {
    /// Records requested per pagination step.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Records requested for the opening window.
    #[serde(default = "default_initial_count")]
    pub initial_count: usize,

    /// Pagination fires when the loaded range comes within this many
    /// entries of a window edge that has more data beyond it.
    #[serde(default = "default_pagination_margin")]
    pub pagination_margin: usize,

    /// Adjacent same-sender records within this many seconds merge into one
    /// group entry.
    #[serde(default = "default_group_interval_secs")]
    pub group_interval_secs: u64,

    /// Quiet period before flushing view-count acknowledgments.
    #[serde(default = "default_view_debounce_ms")]
    pub view_debounce_ms: u64,

    /// Quiet period before flushing mention-seen acknowledgments.
    #[serde(default = "default_mention_debounce_ms")]
    pub mention_debounce_ms: u64,

    /// Batch size that forces an immediate flush.
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            initial_count: default_initial_count(),
            pagination_margin: default_pagination_margin(),
            group_interval_secs: default_group_interval_secs(),
            view_debounce_ms: default_view_debounce_ms(),
            mention_debounce_ms: default_mention_debounce_ms(),
            max_batch: default_max_batch(),
        }
    }
}

impl Tuning {
    pub fn group_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.group_interval_secs as i64)
    }

    pub fn view_debounce(&self) -> Duration {
        Duration::from_millis(self.view_debounce_ms)
    }

    pub fn mention_debounce(&self) -> Duration {
        Duration::from_millis(self.mention_debounce_ms)
    }
}

/// Default config path: `<config dir>/scrollback/engine.toml`.
pub fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(CONFIG_DIR).join(CONFIG_FILENAME)
}

/// Load tuning from a config file.
///
/// Returns defaults if the file doesn't exist or can't be parsed.
pub fn load_tuning(path: &Path) -> Tuning {
    if !path.exists() {
        debug!("No tuning file at {:?}, using defaults", path);
        return Tuning::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(tuning) => {
                debug!("Loaded tuning from {:?}", path);
                tuning
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                Tuning::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            Tuning::default()
        }
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────
