//! Transition values: the diff result applied to the rendering surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entry::RenderableEntry;
use crate::location::{AnchorKey, ScrollPosition};
use crate::types::RecordKey;
use crate::window::InitialPayload;

/// Animation hint attached to structural operations. Tells the surface which
/// side of the scroll anchor an operation came from; carries no correctness
/// obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionHint {
    Up,
    Down,
}

/// Direction a hole was filled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillDirection {
    Earlier,
    Later,
    Around,
}

/// Why a transition was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionReason {
    Initial { fade_in: bool },
    InteractiveChanges,
    Reload,
    HoleChanges {
        filled: BTreeMap<RecordKey, FillDirection>,
        removed: BTreeMap<RecordKey, FillDirection>,
    },
}

/// How the surface should stage the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplyOptions {
    pub animated: bool,
    /// Apply within the current layout pass, no async hop.
    pub synchronous: bool,
    /// Fade the whole list in after applying (cold initial load).
    pub fade_in: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertEntry {
    /// Position in the new sequence, list order.
    pub index: usize,
    /// Position the entry occupied in the previous sequence, if it moved.
    pub previous_index: Option<usize>,
    pub entry: RenderableEntry,
    pub direction: Option<DirectionHint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub index: usize,
    pub previous_index: usize,
    pub entry: RenderableEntry,
    pub direction: Option<DirectionHint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollTo {
    /// List-order index of the target entry in the new sequence.
    pub index: usize,
    pub position: ScrollPosition,
    pub animated: bool,
    pub direction: Option<DirectionHint>,
}

/// A single-use structural update: applying `deletions` (descending) against
/// the previous sequence, then `insertions` (ascending), then `updates` in
/// place reconstructs the new sequence exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub deletions: Vec<usize>,
    pub insertions: Vec<InsertEntry>,
    pub updates: Vec<UpdateEntry>,
    pub options: ApplyOptions,
    pub scroll_to: Option<ScrollTo>,
    /// List-order sub-range whose absolute positions are unchanged by this
    /// transition; the surface may skip re-measuring it. Conservative:
    /// `None` is always valid.
    pub stationary_range: Option<(usize, usize)>,
    /// Anchor the transition scrolled to, echoed to the scrolled-to cell.
    pub scrolled_to: Option<AnchorKey>,
    /// One-shot auxiliary payload riding on the first transition.
    pub first: Option<InitialPayload>,
    pub reason: TransitionReason,
}

impl Transition {
    /// True when the transition carries no structural or content change.
    pub fn is_noop(&self) -> bool {
        self.deletions.is_empty()
            && self.insertions.is_empty()
            && self.updates.is_empty()
            && self.scroll_to.is_none()
    }
}

// ─────────────────────────────────────────────────────────
// Displayed Ranges
// ─────────────────────────────────────────────────────────

/// Inclusive index range over displayed entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub first: usize,
    pub last: usize,
}

impl IndexRange {
    pub fn new(first: usize, last: usize) -> Self {
        Self { first, last }
    }

    pub fn len(&self) -> usize {
        self.last.saturating_sub(self.first) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }
}

/// What the rendering surface currently shows: the fully laid-out (loaded)
/// range and the visible sub-range, both in display order. Recomputed by the
/// surface on every layout pass; derived, never owned, by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayedRange {
    pub visible: Option<IndexRange>,
    pub loaded: Option<IndexRange>,
}
