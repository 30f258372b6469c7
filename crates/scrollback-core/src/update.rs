//! Fetch-stream protocol between the window fetch service and the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::location::{AnchorKey, ScrollPosition};
use crate::transition::{DirectionHint, FillDirection};
use crate::types::RecordKey;
use crate::window::{InitialPayload, WindowSnapshot};

/// Classification of a snapshot emitted by the fetch service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateKind {
    /// First snapshot for a location. `fade_in` when the store had to load
    /// cold and the surface should fade the list in.
    Initial { fade_in: bool },
    /// First snapshot, anchored at the unread boundary.
    InitialUnread,
    /// Incremental change to a live window.
    Generic,
    /// The visible range was re-read in place.
    VisibleRefresh,
    /// One or more holes were filled. Keys map to the direction the fill
    /// approached from.
    HoleFilled {
        filled: BTreeMap<RecordKey, FillDirection>,
        removed: BTreeMap<RecordKey, FillDirection>,
    },
}

/// Scroll destination resolved by the fetch service from the requested
/// location against the actual window contents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResolvedScroll {
    /// Scroll to the unread marker.
    Unread { key: RecordKey },
    /// Restore a previously saved position.
    PositionRestoration { key: RecordKey, offset: f32 },
    Key {
        anchor: AnchorKey,
        position: ScrollPosition,
        direction: DirectionHint,
        animated: bool,
    },
}

/// One element of the fetch stream for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WindowUpdate {
    /// The store is still assembling the window. May carry whatever
    /// auxiliary data is already known.
    Loading { initial: Option<InitialPayload> },
    Snapshot {
        window: WindowSnapshot,
        kind: UpdateKind,
        scroll: Option<ResolvedScroll>,
        /// The scroll the location originally asked for, kept so the engine
        /// can re-apply it when a placeholder window is replaced.
        original_scroll: Option<ResolvedScroll>,
        initial: InitialPayload,
    },
}
