//! Read/visibility tracker: one pass over the visible range.
//!
//! Derives, from what is actually on screen, (a) the records whose view
//! counters need refreshing, (b) the mentions to mark seen, (c) the read
//! and last-seen high-water keys, and (d) pagination requests when the
//! loaded range nears a window edge with more data beyond it.

use scrollback_core::{
    AnchorKey, DisplayedRange, LogRecord, RecordId, RecordKey, RenderableEntry, WindowLocation,
};

/// Inputs the scan needs besides the displayed range.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityContext<'a> {
    pub entries: &'a [RenderableEntry],
    /// Display order is inverted relative to logical order.
    pub reverse: bool,
    pub earlier: Option<RecordKey>,
    pub later: Option<RecordKey>,
    pub margin: usize,
    pub page_size: usize,
}

/// Everything one visibility update implies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityOutcome {
    pub view_ids: Vec<RecordId>,
    pub mention_ids: Vec<RecordId>,
    /// Greatest key among incoming records in the read range; feeds the
    /// read cursor behind the may-advance gate.
    pub max_incoming: Option<RecordKey>,
    /// Greatest key among all records in the read range; reported
    /// regardless of direction or gate (last-seen tracking).
    pub max_overall: Option<RecordKey>,
    /// Zero, one, or two pagination requests. Emitted oldest-direction
    /// first; last-request-wins at the pipeline favors the newest edge.
    pub pagination: Vec<WindowLocation>,
}

/// Scan the displayed range against the projected entries.
pub fn scan_visible(ctx: &VisibilityContext, displayed: &DisplayedRange) -> VisibilityOutcome {
    let mut outcome = VisibilityOutcome::default();
    let len = ctx.entries.len();
    if len == 0 {
        return outcome;
    }

    let clamp = |index: usize| index.min(len - 1);
    let to_logical = |display: usize| {
        if ctx.reverse {
            len - 1 - clamp(display)
        } else {
            clamp(display)
        }
    };

    if let Some(visible) = displayed.visible {
        let a = to_logical(visible.first);
        let b = to_logical(visible.last);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        for entry in &ctx.entries[lo..=hi] {
            match entry {
                RenderableEntry::Message(message) => {
                    collect_effects(&message.record, &mut outcome);
                }
                RenderableEntry::Group(group) => {
                    for member in group.members() {
                        collect_effects(&member.record, &mut outcome);
                    }
                }
                _ => {}
            }
        }

        // Read range: everything from the oldest loaded entry through the
        // newest visible one. Walk newest-first and stop at the first
        // incoming record.
        for entry in ctx.entries[0..=hi].iter().rev() {
            let Some(record) = entry.newest_record() else {
                continue;
            };
            if outcome.max_overall.is_none() {
                outcome.max_overall = Some(record.key);
            }
            if record.is_incoming() {
                outcome.max_incoming = Some(record.key);
                break;
            }
        }
    }

    if let Some(loaded) = displayed.loaded {
        let a = to_logical(loaded.first);
        let b = to_logical(loaded.last);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        if lo < ctx.margin && ctx.earlier.is_some() {
            if let Some(anchor) = oldest_anchor(ctx.entries) {
                outcome.pagination.push(WindowLocation::Navigation {
                    index: AnchorKey::Key(anchor),
                    anchor: AnchorKey::Key(anchor),
                    count: ctx.page_size,
                });
            }
        }
        if len - 1 - hi < ctx.margin && ctx.later.is_some() {
            if let Some(anchor) = newest_anchor(ctx.entries) {
                outcome.pagination.push(WindowLocation::Navigation {
                    index: AnchorKey::Key(anchor),
                    anchor: AnchorKey::Key(anchor),
                    count: ctx.page_size,
                });
            }
        }
    }

    outcome
}

fn collect_effects(record: &LogRecord, outcome: &mut VisibilityOutcome) {
    if record.wants_view_count() {
        outcome.view_ids.push(record.key.id);
    }
    if record.has_reportable_mention() {
        outcome.mention_ids.push(record.key.id);
    }
}

/// Key of an entry that can anchor a window request. Synthetic markers and
/// sentinels cannot.
fn anchorable_key(entry: &RenderableEntry) -> Option<RecordKey> {
    match entry {
        RenderableEntry::Message(message) => Some(message.record.key),
        RenderableEntry::Group(group) => Some(group.newest().key),
        RenderableEntry::Hole(hole) => Some(hole.range.from),
        _ => None,
    }
}

fn oldest_anchor(entries: &[RenderableEntry]) -> Option<RecordKey> {
    entries.iter().find_map(anchorable_key)
}

fn newest_anchor(entries: &[RenderableEntry]) -> Option<RecordKey> {
    entries.iter().rev().find_map(anchorable_key)
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use scrollback_core::{
        Attribute, Direction, IndexRange, MessageEntry, Namespace, RecordTags, Selection,
        SenderId,
    };

    fn key(seq: u64) -> RecordKey {
        RecordKey::new(seq, Namespace::REMOTE, seq)
    }

    fn record(seq: u64, direction: Direction) -> LogRecord {
        LogRecord {
            key: key(seq),
            sender: SenderId(1),
            direction,
            group_key: None,
            tags: RecordTags::default(),
            attributes: Vec::new(),
            at: Utc.timestamp_opt(seq as i64, 0).unwrap(),
            body: format!("m{seq}"),
        }
    }

    fn message(seq: u64, direction: Direction) -> RenderableEntry {
        RenderableEntry::Message(MessageEntry {
            record: record(seq, direction),
            read: false,
            selection: Selection::Inactive,
        })
    }

    fn messages(count: u64) -> Vec<RenderableEntry> {
        (1..=count)
            .map(|seq| message(seq, Direction::Incoming))
            .collect()
    }

    fn ctx<'a>(
        entries: &'a [RenderableEntry],
        earlier: Option<RecordKey>,
        later: Option<RecordKey>,
    ) -> VisibilityContext<'a> {
        VisibilityContext {
            entries,
            reverse: false,
            earlier,
            later,
            margin: 5,
            page_size: 200,
        }
    }

    fn displayed(visible: (usize, usize), loaded: (usize, usize)) -> DisplayedRange {
        DisplayedRange {
            visible: Some(IndexRange::new(visible.0, visible.1)),
            loaded: Some(IndexRange::new(loaded.0, loaded.1)),
        }
    }

    #[test]
    fn test_read_maxima_split_incoming_from_overall() {
        let entries = vec![
            message(1, Direction::Incoming),
            message(2, Direction::Incoming),
            message(3, Direction::Outgoing),
        ];
        let outcome = scan_visible(&ctx(&entries, None, None), &displayed((0, 2), (0, 2)));
        assert_eq!(outcome.max_incoming, Some(key(2)), "max incoming in range");
        assert_eq!(outcome.max_overall, Some(key(3)), "overall ignores direction");
    }

    #[test]
    fn test_read_range_extends_below_the_visible_window() {
        let entries = messages(10);
        let outcome = scan_visible(&ctx(&entries, None, None), &displayed((4, 6), (0, 9)));
        assert_eq!(
            outcome.max_incoming,
            Some(key(7)),
            "read scan covers everything up to the newest visible entry"
        );
    }

    #[test]
    fn test_later_pagination_fires_near_the_newest_edge() {
        let entries = messages(200);
        let outcome = scan_visible(
            &ctx(&entries, None, Some(key(900))),
            &displayed((190, 197), (0, 197)),
        );
        assert_eq!(outcome.pagination.len(), 1);
        match outcome.pagination[0] {
            WindowLocation::Navigation { anchor, count, .. } => {
                assert_eq!(anchor, AnchorKey::Key(key(200)), "anchored at the newest entry");
                assert_eq!(count, 200);
            }
            other => panic!("expected navigation, got {other:?}"),
        }
    }

    #[test]
    fn test_no_earlier_request_without_an_earlier_boundary() {
        let entries = messages(200);
        let outcome = scan_visible(
            &ctx(&entries, None, None),
            &displayed((4, 60), (4, 60)),
        );
        assert!(outcome.pagination.is_empty());
    }

    #[test]
    fn test_earlier_pagination_fires_near_the_oldest_edge() {
        let entries = messages(200);
        let outcome = scan_visible(
            &ctx(&entries, Some(key(0)), None),
            &displayed((2, 30), (2, 30)),
        );
        assert_eq!(outcome.pagination.len(), 1);
        match outcome.pagination[0] {
            WindowLocation::Navigation { anchor, .. } => {
                assert_eq!(anchor, AnchorKey::Key(key(1)), "anchored at the oldest entry");
            }
            other => panic!("expected navigation, got {other:?}"),
        }
    }

    #[test]
    fn test_both_margins_breached_emits_both_requests_newest_last() {
        let entries = messages(6);
        let outcome = scan_visible(
            &ctx(&entries, Some(key(0)), Some(key(100))),
            &displayed((0, 5), (0, 5)),
        );
        assert_eq!(outcome.pagination.len(), 2);
        assert!(matches!(
            outcome.pagination[1],
            WindowLocation::Navigation { anchor: AnchorKey::Key(k), .. } if k == key(6)
        ));
    }

    #[test]
    fn test_reverse_mapping_translates_display_indices() {
        let entries = vec![
            message(1, Direction::Incoming),
            message(2, Direction::Incoming),
            message(3, Direction::Incoming),
        ];
        let mut context = ctx(&entries, None, None);
        context.reverse = true;
        // Display index 0 is the newest entry when reversed; visible (0, 0)
        // therefore covers only m3.
        let outcome = scan_visible(
            &context,
            &DisplayedRange {
                visible: Some(IndexRange::new(0, 0)),
                loaded: None,
            },
        );
        assert_eq!(outcome.max_incoming, Some(key(3)));
        assert_eq!(outcome.view_ids, Vec::<RecordId>::new());
    }

    #[test]
    fn test_effect_collection_uses_the_record_predicates() {
        let mut viewed = record(1, Direction::Incoming);
        viewed.attributes.push(Attribute::ViewCount(5));
        let mut mentioned = record(2, Direction::Incoming);
        mentioned.tags.unseen_mention = true;
        mentioned.attributes.push(Attribute::Mention { pending: false });
        let mut pending = record(3, Direction::Incoming);
        pending.tags.unseen_mention = true;
        pending.attributes.push(Attribute::Mention { pending: true });

        let entries: Vec<RenderableEntry> = [viewed, mentioned, pending]
            .into_iter()
            .map(|record| {
                RenderableEntry::Message(MessageEntry {
                    record,
                    read: false,
                    selection: Selection::Inactive,
                })
            })
            .collect();

        let outcome = scan_visible(&ctx(&entries, None, None), &displayed((0, 2), (0, 2)));
        assert_eq!(outcome.view_ids, vec![key(1).id]);
        assert_eq!(
            outcome.mention_ids,
            vec![key(2).id],
            "pending mentions stay unreported"
        );
    }

    #[test]
    fn test_effects_only_cover_the_visible_subrange() {
        let mut viewed = record(1, Direction::Incoming);
        viewed.attributes.push(Attribute::ViewCount(5));
        let mut entries = vec![RenderableEntry::Message(MessageEntry {
            record: viewed,
            read: false,
            selection: Selection::Inactive,
        })];
        entries.extend(messages(5).into_iter().map(|entry| match entry {
            RenderableEntry::Message(mut message) => {
                message.record.key = RecordKey::new(
                    message.record.key.seq + 10,
                    Namespace::REMOTE,
                    message.record.key.id.local + 10,
                );
                RenderableEntry::Message(message)
            }
            other => other,
        }));

        let outcome = scan_visible(&ctx(&entries, None, None), &displayed((2, 4), (0, 5)));
        assert!(
            outcome.view_ids.is_empty(),
            "records below the visible window are not acknowledged"
        );
    }
}
