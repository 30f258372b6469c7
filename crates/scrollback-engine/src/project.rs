//! Entry filter/projector: raw window snapshot in, ordered renderable
//! entries out.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use tracing::warn;

use scrollback_core::{
    GroupEntry, GroupMember, HoleEntry, LogRecord, MessageEntry, RecordId, RecordKey,
    RenderableEntry, Selection, WindowItem, WindowSnapshot,
};

use crate::assoc::AssocData;
use crate::state::{DisplaySettings, ViewMode};

// ─────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────

/// Projection switches, derived from the display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectOptions {
    pub include_unread_marker: bool,
    pub include_empty_info: bool,
    pub include_chat_info: bool,
    pub include_search_affordance: bool,
    pub group_adjacent: bool,
    /// Display order is inverted relative to logical order. A presentation
    /// transform only: the projected sequence keeps logical order.
    pub reverse: bool,
    pub group_interval: Duration,
}

impl ProjectOptions {
    pub fn for_mode(
        settings: &DisplaySettings,
        has_namespace_filter: bool,
        group_interval: Duration,
    ) -> Self {
        match settings.mode {
            ViewMode::Bubbles => Self {
                include_unread_marker: true,
                include_empty_info: !has_namespace_filter,
                include_chat_info: true,
                include_search_affordance: false,
                group_adjacent: true,
                reverse: settings.reversed(),
                group_interval,
            },
            ViewMode::Plain { search, .. } => Self {
                include_unread_marker: false,
                include_empty_info: false,
                include_chat_info: false,
                include_search_affordance: search && has_namespace_filter,
                group_adjacent: false,
                reverse: settings.reversed(),
                group_interval,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────
// Projection
// ─────────────────────────────────────────────────────────

/// One projected window: the unit the diff engine compares. Immutable per
/// reconciliation pass; the delivery side only ever sees it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Projection {
    pub entries: Arc<Vec<RenderableEntry>>,
    pub snapshot: Arc<WindowSnapshot>,
    pub assoc: AssocData,
    pub reverse: bool,
}

/// Project a window snapshot into its renderable entry sequence.
///
/// The walk is a single pass in composite-key order. Out-of-order items are
/// a store defect; they are dropped with a warning rather than corrupting
/// the diff (a stale-but-consistent view beats a crash).
pub fn project(
    snapshot: &WindowSnapshot,
    options: &ProjectOptions,
    selection: Option<&HashSet<RecordId>>,
) -> Vec<RenderableEntry> {
    let mut entries: Vec<RenderableEntry> = Vec::new();

    if options.include_chat_info && snapshot.earlier.is_none() {
        if let Some(about) = snapshot
            .aux
            .cached_payload
            .as_ref()
            .and_then(|payload| payload.about.clone())
        {
            entries.push(RenderableEntry::ChatInfo { text: about });
        }
    }

    let max_read = snapshot.max_read_key;
    let mut marker_emitted = false;
    let mut pending: Vec<GroupMember> = Vec::new();
    let mut last_position: Option<RecordKey> = None;

    for item in &snapshot.items {
        let position = item.position();
        if last_position.is_some_and(|previous| position <= previous) {
            warn!(?position, "dropping out-of-order window item");
            continue;
        }

        match item {
            WindowItem::Hole(range) => {
                flush_group(&mut entries, &mut pending);
                last_position = Some(range.to);
                entries.push(RenderableEntry::Hole(HoleEntry { range: *range }));
            }
            WindowItem::Record(record) => {
                last_position = Some(record.key);

                if options.include_unread_marker && !marker_emitted {
                    if let Some(boundary) = max_read {
                        if record.key > boundary && record.is_incoming() {
                            flush_group(&mut entries, &mut pending);
                            marker_emitted = true;
                            entries.push(RenderableEntry::UnreadMarker { key: record.key });
                        }
                    }
                }

                let read = match record.direction {
                    scrollback_core::Direction::Outgoing => true,
                    scrollback_core::Direction::Incoming => {
                        max_read.is_some_and(|boundary| record.key <= boundary)
                    }
                };
                let selection_state = selection
                    .map(|set| Selection::Selectable {
                        selected: set.contains(&record.key.id),
                    })
                    .unwrap_or(Selection::Inactive);
                let member = GroupMember {
                    record: record.clone(),
                    read,
                    selection: selection_state,
                };

                if options.group_adjacent {
                    if let Some(previous) = pending.last() {
                        if !can_group(&previous.record, record, options.group_interval) {
                            flush_group(&mut entries, &mut pending);
                        }
                    }
                    pending.push(member);
                } else {
                    entries.push(RenderableEntry::Message(MessageEntry {
                        record: member.record,
                        read: member.read,
                        selection: member.selection,
                    }));
                }
            }
        }
    }
    flush_group(&mut entries, &mut pending);

    if options.include_empty_info && entries.is_empty() {
        entries.push(RenderableEntry::EmptyInfo);
    }

    if options.include_search_affordance {
        entries.push(RenderableEntry::SearchAffordance);
    }

    entries
}

/// Whether `next` extends the run ending in `previous`: same sender and
/// direction, and either a shared grouping key or timestamps within the
/// grouping interval.
fn can_group(previous: &LogRecord, next: &LogRecord, interval: Duration) -> bool {
    if previous.sender != next.sender || previous.direction != next.direction {
        return false;
    }
    if let (Some(a), Some(b)) = (previous.group_key, next.group_key) {
        return a == b;
    }
    next.at.signed_duration_since(previous.at) <= interval
}

/// Drain the pending run into an entry: one member stays a message, two or
/// more become a group. A malformed run is a programming defect in this
/// module and fails fast.
fn flush_group(entries: &mut Vec<RenderableEntry>, pending: &mut Vec<GroupMember>) {
    match pending.len() {
        0 => {}
        1 => {
            if let Some(member) = pending.pop() {
                entries.push(RenderableEntry::Message(MessageEntry {
                    record: member.record,
                    read: member.read,
                    selection: member.selection,
                }));
            }
        }
        _ => {
            let group = GroupEntry::new(std::mem::take(pending))
                .expect("grouping produced a malformed run");
            entries.push(RenderableEntry::Group(group));
        }
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use scrollback_core::{
        CachedPeerPayload, Direction, KeyRange, Namespace, NetworkClass, RecordTags, SenderId,
        WindowAux,
    };

    use crate::assoc::DownloadPeerClass;

    fn key(seq: u64) -> RecordKey {
        RecordKey::new(seq, Namespace::REMOTE, seq)
    }

    fn record(seq: u64, sender: u64, direction: Direction) -> LogRecord {
        LogRecord {
            key: key(seq),
            sender: SenderId(sender),
            direction,
            group_key: None,
            tags: RecordTags::default(),
            attributes: Vec::new(),
            at: Utc.timestamp_opt(seq as i64 * 10, 0).unwrap(),
            body: format!("m{seq}"),
        }
    }

    fn snapshot(items: Vec<WindowItem>) -> WindowSnapshot {
        WindowSnapshot {
            items,
            earlier: None,
            later: None,
            max_read_key: None,
            aux: WindowAux::default(),
        }
    }

    fn bubble_options() -> ProjectOptions {
        ProjectOptions::for_mode(
            &DisplaySettings::default(),
            false,
            Duration::seconds(600),
        )
    }

    #[allow(dead_code)]
    fn assoc() -> AssocData {
        AssocData {
            download_class: DownloadPeerClass::Contact,
            network: NetworkClass::Wifi,
        }
    }

    #[test]
    fn test_three_same_sender_records_group_and_a_fourth_sender_splits() {
        let items = vec![
            WindowItem::Record(record(1, 1, Direction::Incoming)),
            WindowItem::Record(record(2, 1, Direction::Incoming)),
            WindowItem::Record(record(3, 1, Direction::Incoming)),
            WindowItem::Record(record(4, 2, Direction::Incoming)),
        ];
        let entries = project(&snapshot(items), &bubble_options(), None);
        assert_eq!(entries.len(), 2);
        match &entries[0] {
            RenderableEntry::Group(group) => {
                let seqs: Vec<u64> = group
                    .members()
                    .iter()
                    .map(|member| member.record.key.seq)
                    .collect();
                assert_eq!(seqs, vec![1, 2, 3], "members keep original order");
            }
            other => panic!("expected group, got {other:?}"),
        }
        assert!(matches!(&entries[1], RenderableEntry::Message(m) if m.record.key == key(4)));
    }

    #[test]
    fn test_records_outside_the_time_window_do_not_group() {
        let mut late = record(2, 1, Direction::Incoming);
        late.at = Utc.timestamp_opt(10_000, 0).unwrap();
        let items = vec![
            WindowItem::Record(record(1, 1, Direction::Incoming)),
            WindowItem::Record(late),
        ];
        let entries = project(&snapshot(items), &bubble_options(), None);
        assert_eq!(entries.len(), 2);
        assert!(entries
            .iter()
            .all(|entry| matches!(entry, RenderableEntry::Message(_))));
    }

    #[test]
    fn test_shared_group_key_merges_regardless_of_time() {
        let mut a = record(1, 1, Direction::Incoming);
        a.group_key = Some(9);
        let mut b = record(2, 1, Direction::Incoming);
        b.group_key = Some(9);
        b.at = Utc.timestamp_opt(99_999, 0).unwrap();
        let items = vec![WindowItem::Record(a), WindowItem::Record(b)];
        let entries = project(&snapshot(items), &bubble_options(), None);
        assert_eq!(entries.len(), 1);
        assert!(matches!(&entries[0], RenderableEntry::Group(_)));
    }

    #[test]
    fn test_unread_marker_lands_before_first_unread_incoming() {
        let items = vec![
            WindowItem::Record(record(1, 1, Direction::Incoming)),
            WindowItem::Record(record(2, 2, Direction::Incoming)),
            WindowItem::Record(record(3, 1, Direction::Incoming)),
        ];
        let mut snapshot = snapshot(items);
        snapshot.max_read_key = Some(key(1));
        let entries = project(&snapshot, &bubble_options(), None);

        let marker_at = entries
            .iter()
            .position(|entry| matches!(entry, RenderableEntry::UnreadMarker { .. }))
            .expect("marker present");
        assert_eq!(marker_at, 1);
        assert!(matches!(
            &entries[marker_at],
            RenderableEntry::UnreadMarker { key: k } if *k == key(2)
        ));
    }

    #[test]
    fn test_no_marker_when_everything_is_read() {
        let items = vec![
            WindowItem::Record(record(1, 1, Direction::Incoming)),
            WindowItem::Record(record(2, 1, Direction::Outgoing)),
        ];
        let mut snapshot = snapshot(items);
        snapshot.max_read_key = Some(key(5));
        let entries = project(&snapshot, &bubble_options(), None);
        assert!(!entries
            .iter()
            .any(|entry| matches!(entry, RenderableEntry::UnreadMarker { .. })));
    }

    #[test]
    fn test_hole_items_project_to_hole_entries() {
        let items = vec![
            WindowItem::Record(record(1, 1, Direction::Incoming)),
            WindowItem::Hole(KeyRange::new(key(2), key(8))),
            WindowItem::Record(record(9, 2, Direction::Incoming)),
        ];
        let entries = project(&snapshot(items), &bubble_options(), None);
        assert_eq!(entries.len(), 3);
        assert!(matches!(&entries[1], RenderableEntry::Hole(hole) if hole.range.from == key(2)));
    }

    #[test]
    fn test_out_of_order_items_are_dropped_not_fatal() {
        let items = vec![
            WindowItem::Record(record(5, 1, Direction::Incoming)),
            WindowItem::Record(record(3, 2, Direction::Incoming)),
            WindowItem::Record(record(7, 3, Direction::Incoming)),
        ];
        let entries = project(&snapshot(items), &bubble_options(), None);
        let seqs: Vec<u64> = entries
            .iter()
            .filter_map(|entry| entry.newest_record().map(|record| record.key.seq))
            .collect();
        assert_eq!(seqs, vec![5, 7], "the regressing record is dropped");
    }

    #[test]
    fn test_empty_snapshot_projects_empty_info() {
        let entries = project(&snapshot(Vec::new()), &bubble_options(), None);
        assert_eq!(entries, vec![RenderableEntry::EmptyInfo]);
    }

    #[test]
    fn test_chat_info_suppresses_empty_info() {
        let mut snapshot = snapshot(Vec::new());
        snapshot.aux.cached_payload = Some(CachedPeerPayload {
            about: Some("greetings".into()),
        });
        let entries = project(&snapshot, &bubble_options(), None);
        assert_eq!(entries.len(), 1);
        assert!(matches!(&entries[0], RenderableEntry::ChatInfo { text } if text == "greetings"));
    }

    #[test]
    fn test_chat_info_requires_the_earliest_edge() {
        let mut snapshot = snapshot(vec![WindowItem::Record(record(5, 1, Direction::Incoming))]);
        snapshot.earlier = Some(key(4));
        snapshot.aux.cached_payload = Some(CachedPeerPayload {
            about: Some("greetings".into()),
        });
        let entries = project(&snapshot, &bubble_options(), None);
        assert!(!entries
            .iter()
            .any(|entry| matches!(entry, RenderableEntry::ChatInfo { .. })));
    }

    #[test]
    fn test_search_affordance_appended_in_plain_search_mode() {
        let settings = DisplaySettings {
            mode: ViewMode::Plain {
                search: true,
                reversed: false,
            },
            animations: true,
        };
        let options = ProjectOptions::for_mode(&settings, true, Duration::seconds(600));
        let items = vec![WindowItem::Record(record(1, 1, Direction::Incoming))];
        let entries = project(&snapshot(items), &options, None);
        assert!(matches!(
            entries.last(),
            Some(RenderableEntry::SearchAffordance)
        ));
        assert!(
            !options.group_adjacent,
            "plain mode never groups records"
        );
    }

    #[test]
    fn test_selection_marks_matching_records() {
        let items = vec![
            WindowItem::Record(record(1, 1, Direction::Incoming)),
            WindowItem::Record(record(2, 2, Direction::Incoming)),
        ];
        let selected: HashSet<RecordId> = [key(2).id].into_iter().collect();
        let entries = project(&snapshot(items), &bubble_options(), Some(&selected));
        let selections: Vec<Selection> = entries
            .iter()
            .filter_map(|entry| match entry {
                RenderableEntry::Message(message) => Some(message.selection),
                _ => None,
            })
            .collect();
        assert_eq!(
            selections,
            vec![
                Selection::Selectable { selected: false },
                Selection::Selectable { selected: true },
            ]
        );
    }

    #[test]
    fn test_projection_keeps_logical_order_when_reversed() {
        let settings = DisplaySettings::default();
        let options = ProjectOptions::for_mode(&settings, false, Duration::seconds(600));
        assert!(options.reverse, "bubbles display newest-at-bottom");

        let items = vec![
            WindowItem::Record(record(1, 1, Direction::Incoming)),
            WindowItem::Record(record(2, 2, Direction::Incoming)),
        ];
        let entries = project(&snapshot(items), &options, None);
        let seqs: Vec<u64> = entries
            .iter()
            .filter_map(|entry| entry.newest_record().map(|record| record.key.seq))
            .collect();
        assert_eq!(seqs, vec![1, 2], "reversal never touches logical order");
    }
}
