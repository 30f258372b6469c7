//! Window locations: requests for where in the log the window should sit.

use serde::{Deserialize, Serialize};

use crate::types::RecordKey;

/// An anchor within the log, possibly outside the fetched data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorKey {
    /// Before the oldest record.
    LowerBound,
    /// After the newest record.
    UpperBound,
    Key(RecordKey),
}

/// Where the anchored entry should land in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScrollPosition {
    /// Pin to the viewport top with the given offset.
    Top(f32),
    /// Pin to the viewport bottom with the given offset.
    Bottom(f32),
    Center,
}

/// A window request descriptor. Exactly one location is current at a time;
/// setting a new one supersedes and cancels the in-flight fetch for the
/// previous one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WindowLocation {
    /// Open at the newest data (or at the unread boundary when one exists).
    Initial { count: usize },
    /// Open centered on a specific record (e.g. a search result).
    InitialSearch { anchor: RecordKey, count: usize },
    /// Slide the window toward `index`, keeping `anchor` as the stable
    /// reference point. Used for pagination.
    Navigation {
        index: AnchorKey,
        anchor: AnchorKey,
        count: usize,
    },
    /// Animated scroll from `source` to `target`.
    Scroll {
        target: AnchorKey,
        anchor: AnchorKey,
        source: AnchorKey,
        position: ScrollPosition,
        animated: bool,
    },
}

impl WindowLocation {
    pub fn count(&self) -> Option<usize> {
        match self {
            WindowLocation::Initial { count }
            | WindowLocation::InitialSearch { count, .. }
            | WindowLocation::Navigation { count, .. } => Some(*count),
            WindowLocation::Scroll { .. } => None,
        }
    }
}
