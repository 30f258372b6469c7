//! Renderable entries: the projected, ordered content of a window.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{LogRecord, RecordKey};
use crate::window::KeyRange;

// ─────────────────────────────────────────────────────────
// Selection
// ─────────────────────────────────────────────────────────

/// Selection presentation state of a message entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// No selection session is active.
    Inactive,
    /// A selection session is active; the entry renders a checkbox.
    Selectable { selected: bool },
}

// ─────────────────────────────────────────────────────────
// Entry Payloads
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub record: LogRecord,
    pub read: bool,
    pub selection: Selection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub record: LogRecord,
    pub read: bool,
    pub selection: Selection,
}

/// A merged run of adjacent same-sender records. Always at least two
/// members; a run of one stays a plain [`MessageEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    members: Vec<GroupMember>,
}

impl GroupEntry {
    /// Build a group from its members, oldest first. An empty or singleton
    /// member list is a programming-contract violation.
    pub fn new(members: Vec<GroupMember>) -> Result<Self> {
        if members.len() < 2 {
            return Err(Error::contract(format!(
                "group entry requires at least two members, got {}",
                members.len()
            )));
        }
        Ok(Self { members })
    }

    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }

    pub fn lead(&self) -> &LogRecord {
        &self.members[0].record
    }

    pub fn newest(&self) -> &LogRecord {
        &self.members[self.members.len() - 1].record
    }

    /// Identity of the group: the shared grouping key when the members carry
    /// one, otherwise the lead record's key. Keeps the group matchable in a
    /// diff while members are appended to its newest edge.
    pub fn identity(&self) -> GroupIdentity {
        match self.lead().group_key {
            Some(shared) => GroupIdentity::Shared(shared),
            None => GroupIdentity::Lead(self.lead().key),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoleEntry {
    pub range: KeyRange,
}

// ─────────────────────────────────────────────────────────
// RenderableEntry
// ─────────────────────────────────────────────────────────

/// One renderable element of the projected window. Closed sum type:
/// projection and diffing match exhaustively over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderableEntry {
    Message(MessageEntry),
    Group(GroupEntry),
    Hole(HoleEntry),
    /// Synthetic marker separating read from unread records; carries the key
    /// of the first unread record.
    UnreadMarker { key: RecordKey },
    /// Peer description shown at the very start of the history.
    ChatInfo { text: String },
    /// Placeholder for a log with no records at all.
    EmptyInfo,
    /// Search entry point pinned at the newest edge.
    SearchAffordance,
}

/// Group identity, stable across appends to the group's newest edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupIdentity {
    Shared(u64),
    Lead(RecordKey),
}

/// Diff identity of an entry. Entries with equal identity are matched in
/// place (update); identity changes force delete+insert. Singleton markers
/// use fixed sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryId {
    Message(RecordKey),
    Group(GroupIdentity),
    Hole(RecordKey),
    UnreadMarker,
    ChatInfo,
    EmptyInfo,
    SearchAffordance,
}

/// Tie-break rank for entries sharing a record key. The unread marker sits
/// immediately before the record it announces.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EntryTie {
    Info = 0,
    Hole = 1,
    Marker = 2,
    Record = 3,
    Affordance = 4,
}

/// Total ordering position of an entry within a projection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntryKey {
    pub key: RecordKey,
    pub tie: EntryTie,
}

impl RenderableEntry {
    pub fn id(&self) -> EntryId {
        match self {
            RenderableEntry::Message(entry) => EntryId::Message(entry.record.key),
            RenderableEntry::Group(entry) => EntryId::Group(entry.identity()),
            RenderableEntry::Hole(entry) => EntryId::Hole(entry.range.from),
            RenderableEntry::UnreadMarker { .. } => EntryId::UnreadMarker,
            RenderableEntry::ChatInfo { .. } => EntryId::ChatInfo,
            RenderableEntry::EmptyInfo => EntryId::EmptyInfo,
            RenderableEntry::SearchAffordance => EntryId::SearchAffordance,
        }
    }

    pub fn sort_key(&self) -> EntryKey {
        match self {
            RenderableEntry::Message(entry) => EntryKey {
                key: entry.record.key,
                tie: EntryTie::Record,
            },
            RenderableEntry::Group(entry) => EntryKey {
                key: entry.newest().key,
                tie: EntryTie::Record,
            },
            RenderableEntry::Hole(entry) => EntryKey {
                key: entry.range.from,
                tie: EntryTie::Hole,
            },
            RenderableEntry::UnreadMarker { key } => EntryKey {
                key: *key,
                tie: EntryTie::Marker,
            },
            RenderableEntry::ChatInfo { .. } | RenderableEntry::EmptyInfo => EntryKey {
                key: RecordKey::MIN,
                tie: EntryTie::Info,
            },
            RenderableEntry::SearchAffordance => EntryKey {
                key: RecordKey::MAX,
                tie: EntryTie::Affordance,
            },
        }
    }

    /// Newest underlying record, if the entry carries records.
    pub fn newest_record(&self) -> Option<&LogRecord> {
        match self {
            RenderableEntry::Message(entry) => Some(&entry.record),
            RenderableEntry::Group(entry) => Some(entry.newest()),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Namespace, RecordTags, SenderId};
    use chrono::{TimeZone, Utc};

    fn record(seq: u64, group_key: Option<u64>) -> LogRecord {
        LogRecord {
            key: RecordKey::new(seq, Namespace::REMOTE, seq),
            sender: SenderId(1),
            direction: Direction::Incoming,
            group_key,
            tags: RecordTags::default(),
            attributes: Vec::new(),
            at: Utc.timestamp_opt(seq as i64, 0).unwrap(),
            body: format!("m{seq}"),
        }
    }

    fn member(seq: u64, group_key: Option<u64>) -> GroupMember {
        GroupMember {
            record: record(seq, group_key),
            read: true,
            selection: Selection::Inactive,
        }
    }

    #[test]
    fn test_group_rejects_fewer_than_two_members() {
        assert!(GroupEntry::new(Vec::new()).is_err());
        assert!(GroupEntry::new(vec![member(1, None)]).is_err());
        assert!(GroupEntry::new(vec![member(1, None), member(2, None)]).is_ok());
    }

    #[test]
    fn test_group_identity_stable_across_appends() {
        let before = GroupEntry::new(vec![member(1, Some(7)), member(2, Some(7))]).unwrap();
        let after = GroupEntry::new(vec![
            member(1, Some(7)),
            member(2, Some(7)),
            member(3, Some(7)),
        ])
        .unwrap();
        assert_eq!(before.identity(), after.identity());
        assert_ne!(
            before.sort_key(),
            after.sort_key(),
            "sort key follows the newest member"
        );
    }

    #[test]
    fn test_unread_marker_sorts_before_its_record() {
        let marker = RenderableEntry::UnreadMarker {
            key: RecordKey::new(5, Namespace::REMOTE, 5),
        };
        let message = RenderableEntry::Message(MessageEntry {
            record: record(5, None),
            read: false,
            selection: Selection::Inactive,
        });
        assert!(marker.sort_key() < message.sort_key());
    }

    #[test]
    fn test_sentinel_entries_bound_the_order() {
        let info = RenderableEntry::ChatInfo {
            text: "about".into(),
        };
        let search = RenderableEntry::SearchAffordance;
        let message = RenderableEntry::Message(MessageEntry {
            record: record(1, None),
            read: true,
            selection: Selection::Inactive,
        });
        assert!(info.sort_key() < message.sort_key());
        assert!(message.sort_key() < search.sort_key());
    }
}
