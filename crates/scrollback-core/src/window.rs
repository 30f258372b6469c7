//! Window snapshots: the bounded slice of the log a fetch produces.

use serde::{Deserialize, Serialize};

use crate::types::{LogRecord, PeerKind, RecordKey};

// ─────────────────────────────────────────────────────────
// Holes
// ─────────────────────────────────────────────────────────

/// A contiguous range of keys known to exist in the log but not yet fetched.
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub from: RecordKey,
    pub to: RecordKey,
}

impl KeyRange {
    pub fn new(from: RecordKey, to: RecordKey) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, key: RecordKey) -> bool {
        self.from <= key && key <= self.to
    }

    pub fn overlaps(&self, other: &KeyRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }
}

/// One element of a window: either a fetched record or a hole marker that
/// occupies exactly the unfetched range it replaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WindowItem {
    Record(LogRecord),
    Hole(KeyRange),
}

impl WindowItem {
    /// Ordering position of the item within the window. Holes sort at their
    /// lower boundary.
    pub fn position(&self) -> RecordKey {
        match self {
            WindowItem::Record(record) => record.key,
            WindowItem::Hole(range) => range.from,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Auxiliary Window Data
// ─────────────────────────────────────────────────────────

/// Cached peer payload delivered alongside a window (e.g. the long-form
/// peer description shown at the start of the history).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CachedPeerPayload {
    pub about: Option<String>,
}

/// Peer facts needed to derive per-render-pass associated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub kind: PeerKind,
    pub is_contact: bool,
}

impl Default for PeerInfo {
    fn default() -> Self {
        Self {
            kind: PeerKind::User,
            is_contact: false,
        }
    }
}

/// Read-state counters captured with a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadStateSummary {
    pub unread_count: u32,
    pub total_unread: u32,
    pub muted: bool,
}

/// Auxiliary data attached to every window snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowAux {
    pub peer: PeerInfo,
    pub cached_payload: Option<CachedPeerPayload>,
    /// Newest record carrying an input-keyboard affordance, if any.
    pub keyboard_record: Option<LogRecord>,
    pub read_state: Option<ReadStateSummary>,
}

/// One-shot payload published before the first transition is applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InitialPayload {
    pub cached_payload: Option<CachedPeerPayload>,
    pub keyboard_record: Option<LogRecord>,
    pub read_state: Option<ReadStateSummary>,
}

impl InitialPayload {
    pub fn from_aux(aux: &WindowAux) -> Self {
        Self {
            cached_payload: aux.cached_payload.clone(),
            keyboard_record: aux.keyboard_record.clone(),
            read_state: aux.read_state,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────

/// The result of one window fetch: an ordered slice of the log plus
/// boundary markers and auxiliary data. Superseded wholesale by the next
/// snapshot; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    /// Records and hole markers in strict composite-key order.
    pub items: Vec<WindowItem>,
    /// Key of the newest record before the window, if earlier data exists.
    pub earlier: Option<RecordKey>,
    /// Key of the oldest record after the window, if later data exists.
    pub later: Option<RecordKey>,
    /// High-water mark of acknowledged reads at snapshot time. Drives the
    /// unread-marker position; frozen across paginations by the fetch hint.
    pub max_read_key: Option<RecordKey>,
    pub aux: WindowAux,
}

impl WindowSnapshot {
    pub fn is_empty(&self) -> bool {
        !self
            .items
            .iter()
            .any(|item| matches!(item, WindowItem::Record(_)))
    }

    pub fn first_record(&self) -> Option<&LogRecord> {
        self.items.iter().find_map(|item| match item {
            WindowItem::Record(record) => Some(record),
            WindowItem::Hole(_) => None,
        })
    }

    pub fn last_record(&self) -> Option<&LogRecord> {
        self.items.iter().rev().find_map(|item| match item {
            WindowItem::Record(record) => Some(record),
            WindowItem::Hole(_) => None,
        })
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Namespace;

    fn key(seq: u64) -> RecordKey {
        RecordKey::new(seq, Namespace::REMOTE, seq)
    }

    #[test]
    fn test_key_range_contains_is_inclusive() {
        let range = KeyRange::new(key(5), key(10));
        assert!(range.contains(key(5)));
        assert!(range.contains(key(10)));
        assert!(!range.contains(key(4)));
        assert!(!range.contains(key(11)));
    }

    #[test]
    fn test_key_range_overlap() {
        let a = KeyRange::new(key(5), key(10));
        let b = KeyRange::new(key(10), key(20));
        let c = KeyRange::new(key(11), key(20));
        assert!(a.overlaps(&b), "shared boundary counts as overlap");
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_snapshot_with_only_holes_is_empty() {
        let snapshot = WindowSnapshot {
            items: vec![WindowItem::Hole(KeyRange::new(key(1), key(9)))],
            earlier: None,
            later: None,
            max_read_key: None,
            aux: WindowAux::default(),
        };
        assert!(snapshot.is_empty());
        assert!(snapshot.first_record().is_none());
    }
}
