//! Engine-facing view state: display settings and load-state reporting.

use serde::{Deserialize, Serialize};

/// How the host presents the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    /// Conversation bubbles: grouped, with unread/info markers, displayed
    /// newest-at-bottom.
    Bubbles,
    /// Flat list (e.g. shared-media or search results).
    Plain { search: bool, reversed: bool },
}

/// Latest display settings, fed to the engine through a broadcast cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub mode: ViewMode,
    /// Disable structural animations (reduced motion).
    pub animations: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            mode: ViewMode::Bubbles,
            animations: true,
        }
    }
}

impl DisplaySettings {
    /// Whether display order is inverted relative to logical order.
    pub fn reversed(&self) -> bool {
        matches!(
            self.mode,
            ViewMode::Bubbles | ViewMode::Plain { reversed: true, .. }
        )
    }
}

/// Coarse load state published for the host chrome (loading affordance,
/// empty placeholder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadState {
    Loading,
    Empty,
    Ready,
}

/// Fine-grained history state mirroring what has actually been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryState {
    Loading,
    Loaded { is_empty: bool },
}
