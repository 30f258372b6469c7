//! Record identity, ordering keys, and record content types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────
// Identity & Ordering
// ─────────────────────────────────────────────────────────

/// A key namespace within the log.
///
/// Records from different namespaces interleave in one ordered log but keep
/// independent read cursors. Only remote-namespace records participate in
/// view counting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Namespace(pub u16);

impl Namespace {
    /// Records synchronized with a remote log.
    pub const REMOTE: Namespace = Namespace(0);
    /// Records that exist only locally (pending sends, service notices).
    pub const LOCAL: Namespace = Namespace(1);
}

/// Stable identifier of a record, unique within its namespace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RecordId {
    pub namespace: Namespace,
    pub local: u64,
}

impl RecordId {
    pub fn new(namespace: Namespace, local: u64) -> Self {
        Self { namespace, local }
    }
}

/// Composite ordering key of a record: `(seq, namespace, local)`.
///
/// `seq` is the log position (timestamp-or-sequence); the id breaks ties so
/// the total order is strict. Field order matters: the derived `Ord` must
/// compare `seq` first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RecordKey {
    pub seq: u64,
    pub id: RecordId,
}

impl RecordKey {
    pub fn new(seq: u64, namespace: Namespace, local: u64) -> Self {
        Self {
            seq,
            id: RecordId::new(namespace, local),
        }
    }

    /// Smallest possible key, used as the lower ordering sentinel.
    pub const MIN: RecordKey = RecordKey {
        seq: 0,
        id: RecordId {
            namespace: Namespace(0),
            local: 0,
        },
    };

    /// Largest possible key, used as the upper ordering sentinel.
    pub const MAX: RecordKey = RecordKey {
        seq: u64::MAX,
        id: RecordId {
            namespace: Namespace(u16::MAX),
            local: u64::MAX,
        },
    };
}

/// Author of a record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SenderId(pub u64);

// ─────────────────────────────────────────────────────────
// Record Content
// ─────────────────────────────────────────────────────────

/// Whether a record was received or authored locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// Content tags carried by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordTags {
    /// The record contains a mention of the local user that has not been
    /// seen yet.
    pub unseen_mention: bool,
    /// The record offers a contextual input-keyboard affordance; the newest
    /// such record rides along as auxiliary window data.
    pub offers_keyboard: bool,
}

/// Per-record attributes that affect visibility side effects and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    /// The record carries a view counter that must be refreshed when the
    /// record becomes visible (remote namespace only).
    ViewCount(u32),
    /// A consumable mention. `pending` means the mention is not yet
    /// acknowledged server-side and must not be consumed locally.
    Mention { pending: bool },
    /// Consumable content (e.g. one-time media). While unconsumed, a mention
    /// on the same record is not reported as seen.
    Content { consumed: bool },
}

/// An immutable conversation record.
///
/// Owned by the log collaborator; the engine only ever holds snapshot
/// references for the duration of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub key: RecordKey,
    pub sender: SenderId,
    pub direction: Direction,
    /// Records sharing a grouping key always merge into one group entry.
    pub group_key: Option<u64>,
    pub tags: RecordTags,
    pub attributes: Vec<Attribute>,
    pub at: DateTime<Utc>,
    pub body: String,
}

impl LogRecord {
    pub fn is_incoming(&self) -> bool {
        self.direction == Direction::Incoming
    }

    /// Whether the record is eligible for view counting: it must carry a
    /// view counter and live in the remote namespace.
    pub fn wants_view_count(&self) -> bool {
        self.key.id.namespace == Namespace::REMOTE
            && self
                .attributes
                .iter()
                .any(|a| matches!(a, Attribute::ViewCount(_)))
    }

    /// Whether the record carries a mention that should be reported as seen
    /// once visible: tagged unseen, mention attribute not pending, and no
    /// unconsumed content attribute.
    pub fn has_reportable_mention(&self) -> bool {
        if !self.tags.unseen_mention {
            return false;
        }
        let mut unconsumed_mention = false;
        let mut unconsumed_content = false;
        for attribute in &self.attributes {
            match attribute {
                Attribute::Mention { pending: false } => unconsumed_mention = true,
                Attribute::Content { consumed: false } => unconsumed_content = true,
                _ => {}
            }
        }
        unconsumed_mention && !unconsumed_content
    }
}

/// Peer classification of the conversation behind the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerKind {
    User,
    Secret,
    Group,
    Channel { broadcast: bool },
}

/// Network class the device is currently on. Feeds associated-data
/// extraction (e.g. automatic media download policy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkClass {
    Wifi,
    Cellular,
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(seq: u64, direction: Direction) -> LogRecord {
        LogRecord {
            key: RecordKey::new(seq, Namespace::REMOTE, seq),
            sender: SenderId(1),
            direction,
            group_key: None,
            tags: RecordTags::default(),
            attributes: Vec::new(),
            at: Utc.timestamp_opt(seq as i64, 0).unwrap(),
            body: String::new(),
        }
    }

    #[test]
    fn test_record_key_orders_by_seq_first() {
        let a = RecordKey::new(1, Namespace::LOCAL, 99);
        let b = RecordKey::new(2, Namespace::REMOTE, 1);
        assert!(a < b, "seq dominates namespace and local id");
    }

    #[test]
    fn test_record_key_ties_break_on_namespace_then_local() {
        let a = RecordKey::new(5, Namespace::REMOTE, 7);
        let b = RecordKey::new(5, Namespace::LOCAL, 1);
        let c = RecordKey::new(5, Namespace::REMOTE, 8);
        assert!(a < b, "remote namespace sorts before local at equal seq");
        assert!(a < c);
    }

    #[test]
    fn test_sentinels_bound_all_keys() {
        let k = RecordKey::new(u64::MAX, Namespace::REMOTE, 3);
        assert!(RecordKey::MIN < k);
        assert!(k < RecordKey::MAX);
    }

    #[test]
    fn test_view_count_requires_remote_namespace() {
        let mut r = record(1, Direction::Incoming);
        r.attributes.push(Attribute::ViewCount(10));
        assert!(r.wants_view_count());

        r.key = RecordKey::new(1, Namespace::LOCAL, 1);
        assert!(!r.wants_view_count(), "local records never report views");
    }

    #[test]
    fn test_reportable_mention_predicate() {
        let mut r = record(1, Direction::Incoming);
        assert!(!r.has_reportable_mention(), "untagged record");

        r.tags.unseen_mention = true;
        assert!(!r.has_reportable_mention(), "tag without attribute");

        r.attributes.push(Attribute::Mention { pending: true });
        assert!(!r.has_reportable_mention(), "pending mention");

        r.attributes = vec![Attribute::Mention { pending: false }];
        assert!(r.has_reportable_mention());

        r.attributes.push(Attribute::Content { consumed: false });
        assert!(
            !r.has_reportable_mention(),
            "unconsumed content suppresses the mention report"
        );

        r.attributes = vec![
            Attribute::Mention { pending: false },
            Attribute::Content { consumed: true },
        ];
        assert!(r.has_reportable_mention());
    }
}
