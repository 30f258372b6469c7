//! Diff engine: minimal insert/update/delete transition between two
//! projections.
//!
//! Entries are matched by identity ([`EntryId`]), not value equality, so a
//! changed record becomes an update at its previous position while identity
//! changes force delete+insert. Both sequences are key-ordered, which keeps
//! the matching walk linear; identity lookups handle entries whose sort key
//! moved (a group growing at its newest edge).

use std::collections::{HashMap, HashSet};

use scrollback_core::{
    AnchorKey, ApplyOptions, DirectionHint, EntryId, EntryKey, EntryTie, Error, InsertEntry,
    RecordKey, RenderableEntry, ResolvedScroll, Result, ScrollPosition, ScrollTo, Transition,
    TransitionReason, UpdateEntry,
};

use crate::project::Projection;

/// Compute the transition that moves the rendering surface from `previous`
/// to `next`.
///
/// With no previous projection, or an `Initial` reason, the transition
/// inserts everything; the fade-in flag picks between a fade and a
/// synchronous first layout. The `first` payload slot is left empty for the
/// pipeline to fill.
pub fn prepared_transition(
    previous: Option<&Projection>,
    next: &Projection,
    reason: TransitionReason,
    scroll: Option<ResolvedScroll>,
) -> Result<Transition> {
    let next_entries: &[RenderableEntry] = &next.entries;

    let mut next_pos: HashMap<EntryId, usize> = HashMap::with_capacity(next_entries.len());
    for (index, entry) in next_entries.iter().enumerate() {
        if next_pos.insert(entry.id(), index).is_some() {
            return Err(Error::contract(format!(
                "identity collision in projection: {:?}",
                entry.id()
            )));
        }
    }

    let previous = match previous {
        Some(previous) if !matches!(reason, TransitionReason::Initial { .. }) => previous,
        _ => {
            let fade_in = matches!(reason, TransitionReason::Initial { fade_in: true });
            let (scroll_to, scrolled_to) = resolve_scroll(next_entries, scroll);
            return Ok(Transition {
                deletions: Vec::new(),
                insertions: next_entries
                    .iter()
                    .enumerate()
                    .map(|(index, entry)| InsertEntry {
                        index,
                        previous_index: None,
                        entry: entry.clone(),
                        direction: None,
                    })
                    .collect(),
                updates: Vec::new(),
                options: ApplyOptions {
                    animated: false,
                    synchronous: !fade_in,
                    fade_in,
                },
                scroll_to,
                stationary_range: None,
                scrolled_to,
                first: None,
                reason,
            });
        }
    };
    let prev_entries: &[RenderableEntry] = &previous.entries;

    let mut prev_pos: HashMap<EntryId, usize> = HashMap::with_capacity(prev_entries.len());
    for (index, entry) in prev_entries.iter().enumerate() {
        prev_pos.insert(entry.id(), index);
    }

    // Holes adjacent to a filled direction go first, deterministically,
    // before generic matching sees them.
    let forced: HashSet<usize> = match &reason {
        TransitionReason::HoleChanges { removed, .. } => prev_entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match entry {
                RenderableEntry::Hole(hole) if removed.contains_key(&hole.range.from) => {
                    Some(index)
                }
                _ => None,
            })
            .collect(),
        _ => HashSet::new(),
    };

    let hint = direction_hint_fn(&scroll, prev_entries);

    let mut deletions: Vec<usize> = Vec::new();
    let mut insertions: Vec<InsertEntry> = Vec::new();
    let mut updates: Vec<UpdateEntry> = Vec::new();

    let (mut i, mut j) = (0usize, 0usize);
    while i < prev_entries.len() || j < next_entries.len() {
        if i < prev_entries.len() && forced.contains(&i) {
            deletions.push(i);
            i += 1;
            continue;
        }
        match (prev_entries.get(i), next_entries.get(j)) {
            (Some(p), Some(n)) => {
                let pid = p.id();
                let nid = n.id();
                if pid == nid {
                    if p != n {
                        updates.push(UpdateEntry {
                            index: j,
                            previous_index: i,
                            entry: n.clone(),
                            direction: hint(n.sort_key()),
                        });
                    }
                    i += 1;
                    j += 1;
                } else if !next_pos.contains_key(&pid) {
                    deletions.push(i);
                    i += 1;
                } else if !prev_pos.contains_key(&nid) {
                    insertions.push(InsertEntry {
                        index: j,
                        previous_index: None,
                        entry: n.clone(),
                        direction: hint(n.sort_key()),
                    });
                    j += 1;
                } else if p.sort_key() <= n.sort_key() {
                    // Both persist but their relative order moved. Retire
                    // the previous occurrence; it re-enters as an insert
                    // carrying its old position when the walk reaches it.
                    deletions.push(i);
                    i += 1;
                } else {
                    insertions.push(InsertEntry {
                        index: j,
                        previous_index: prev_pos.get(&nid).copied(),
                        entry: n.clone(),
                        direction: hint(n.sort_key()),
                    });
                    j += 1;
                }
            }
            (Some(_), None) => {
                deletions.push(i);
                i += 1;
            }
            (None, Some(n)) => {
                let moved_from = prev_pos.get(&n.id()).copied();
                insertions.push(InsertEntry {
                    index: j,
                    previous_index: moved_from,
                    entry: n.clone(),
                    direction: hint(n.sort_key()),
                });
                j += 1;
            }
            (None, None) => break,
        }
    }

    let has_ops = !deletions.is_empty() || !insertions.is_empty() || !updates.is_empty();
    let stationary_range = stationary_prefix(prev_entries, next_entries, has_ops);

    let (scroll_to, scrolled_to) = resolve_scroll(next_entries, scroll);

    let options = match &reason {
        TransitionReason::Initial { .. } => unreachable!("handled above"),
        TransitionReason::InteractiveChanges => ApplyOptions {
            animated: true,
            synchronous: false,
            fade_in: false,
        },
        TransitionReason::Reload | TransitionReason::HoleChanges { .. } => ApplyOptions::default(),
    };

    Ok(Transition {
        deletions,
        insertions,
        updates,
        options,
        scroll_to,
        stationary_range,
        scrolled_to,
        first: None,
        reason,
    })
}

/// Longest pairwise-identical prefix whose absolute positions this
/// transition provably leaves alone. Conservative: anything short of full
/// certainty reports `None`.
fn stationary_prefix(
    prev_entries: &[RenderableEntry],
    next_entries: &[RenderableEntry],
    has_ops: bool,
) -> Option<(usize, usize)> {
    if !has_ops {
        return None;
    }
    let stable = prev_entries
        .iter()
        .zip(next_entries.iter())
        .take_while(|(p, n)| p == n)
        .count();
    (stable > 0).then(|| (0, stable - 1))
}

/// Direction hints come from the side nearest the resolved scroll anchor;
/// without one, from the previous window's key span (appends animate from
/// below, prepends from above).
fn direction_hint_fn(
    scroll: &Option<ResolvedScroll>,
    prev_entries: &[RenderableEntry],
) -> impl Fn(EntryKey) -> Option<DirectionHint> {
    let anchor: Option<RecordKey> = match scroll {
        Some(ResolvedScroll::Unread { key }) => Some(*key),
        Some(ResolvedScroll::PositionRestoration { key, .. }) => Some(*key),
        Some(ResolvedScroll::Key { anchor, .. }) => Some(match anchor {
            AnchorKey::LowerBound => RecordKey::MIN,
            AnchorKey::UpperBound => RecordKey::MAX,
            AnchorKey::Key(key) => *key,
        }),
        None => None,
    };
    let span = match (prev_entries.first(), prev_entries.last()) {
        (Some(first), Some(last)) => Some((first.sort_key(), last.sort_key())),
        _ => None,
    };
    move |entry_key: EntryKey| {
        if let Some(anchor) = anchor {
            return Some(if entry_key.key >= anchor {
                DirectionHint::Down
            } else {
                DirectionHint::Up
            });
        }
        let (first, last) = span?;
        if entry_key > last {
            Some(DirectionHint::Down)
        } else if entry_key < first {
            Some(DirectionHint::Up)
        } else {
            None
        }
    }
}

/// Map a resolved scroll onto the new entry sequence.
fn resolve_scroll(
    entries: &[RenderableEntry],
    scroll: Option<ResolvedScroll>,
) -> (Option<ScrollTo>, Option<AnchorKey>) {
    let Some(scroll) = scroll else {
        return (None, None);
    };
    if entries.is_empty() {
        return (None, None);
    }
    let last = entries.len() - 1;
    match scroll {
        ResolvedScroll::Unread { key } => {
            let marker = EntryKey {
                key,
                tie: EntryTie::Marker,
            };
            let index = entries
                .partition_point(|entry| entry.sort_key() < marker)
                .min(last);
            (
                Some(ScrollTo {
                    index,
                    position: ScrollPosition::Top(0.0),
                    animated: false,
                    direction: Some(DirectionHint::Down),
                }),
                None,
            )
        }
        ResolvedScroll::PositionRestoration { key, offset } => {
            let index = entries
                .partition_point(|entry| entry.sort_key().key < key)
                .min(last);
            (
                Some(ScrollTo {
                    index,
                    position: ScrollPosition::Top(offset),
                    animated: false,
                    direction: None,
                }),
                None,
            )
        }
        ResolvedScroll::Key {
            anchor,
            position,
            direction,
            animated,
        } => {
            let index = match anchor {
                AnchorKey::LowerBound => 0,
                AnchorKey::UpperBound => last,
                AnchorKey::Key(key) => entries
                    .partition_point(|entry| entry.sort_key().key < key)
                    .min(last),
            };
            (
                Some(ScrollTo {
                    index,
                    position,
                    animated,
                    direction: Some(direction),
                }),
                Some(anchor),
            )
        }
    }
}

/// Replay a transition against the sequence it was computed from. Applies
/// deletions descending, insertions ascending, then in-place updates --
/// exactly the surface's application contract. Used by tests and by
/// bookkeeping surfaces.
pub fn apply_to(previous: &[RenderableEntry], transition: &Transition) -> Vec<RenderableEntry> {
    let mut result: Vec<RenderableEntry> = previous.to_vec();

    let mut deletions = transition.deletions.clone();
    deletions.sort_unstable();
    for index in deletions.iter().rev() {
        result.remove(*index);
    }

    let mut insertions: Vec<&InsertEntry> = transition.insertions.iter().collect();
    insertions.sort_by_key(|insert| insert.index);
    for insert in insertions {
        result.insert(insert.index, insert.entry.clone());
    }

    for update in &transition.updates {
        result[update.index] = update.entry.clone();
    }

    result
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────
