//! In-memory reference implementation of the log collaborators.
//!
//! `MemoryStore` keeps the full record log in a `BTreeMap`, tracks known
//! hole ranges explicitly, and pushes a fresh window snapshot to every live
//! fetch stream on each mutation. It backs the headless driver and the
//! integration tests; a persistent store would implement the same traits.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use scrollback_core::{
    AnchorKey, CachedPeerPayload, DirectionHint, FillDirection, InitialPayload, KeyRange,
    LogRecord, Namespace, PeerInfo, ReadStateSummary, RecordId, RecordKey, ResolvedScroll,
    ScrollPosition, UpdateKind, WindowAux, WindowItem, WindowLocation, WindowSnapshot,
    WindowUpdate,
};

use crate::service::{EffectSink, ReadStateService, WindowFetchService};

/// Default window size used for locations that do not carry a count.
const DEFAULT_PAGE_SIZE: usize = 200;

// ─────────────────────────────────────────────────────────
// Change Broadcasting
// ─────────────────────────────────────────────────────────

/// Mutation classification pushed to live fetch streams.
#[derive(Debug, Clone)]
enum Change {
    Generic,
    VisibleRefresh,
    HoleFilled {
        filled: BTreeMap<RecordKey, FillDirection>,
        removed: BTreeMap<RecordKey, FillDirection>,
    },
}

impl Change {
    fn into_kind(self) -> UpdateKind {
        match self {
            Change::Generic => UpdateKind::Generic,
            Change::VisibleRefresh => UpdateKind::VisibleRefresh,
            Change::HoleFilled { filled, removed } => UpdateKind::HoleFilled { filled, removed },
        }
    }
}

// ─────────────────────────────────────────────────────────
// Store State
// ─────────────────────────────────────────────────────────

struct StoreInner {
    records: BTreeMap<RecordKey, LogRecord>,
    holes: Vec<KeyRange>,
    read_cursors: HashMap<Namespace, RecordKey>,
    peer: PeerInfo,
    cached_payload: Option<CachedPeerPayload>,
    subscribers: Vec<mpsc::UnboundedSender<Change>>,
    /// Records this viewer already counted a view for; a view is counted
    /// once per record.
    viewed: std::collections::HashSet<RecordId>,
}

impl StoreInner {
    fn notify(&mut self, change: Change) {
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }

    fn max_read(&self) -> Option<RecordKey> {
        self.read_cursors.get(&Namespace::REMOTE).copied()
    }

    /// First incoming record past the read boundary. Without a boundary
    /// nothing counts as unread.
    fn first_unread(&self, boundary: Option<RecordKey>) -> Option<RecordKey> {
        let boundary = boundary?;
        self.records
            .values()
            .filter(|record| record.is_incoming())
            .find(|record| record.key > boundary)
            .map(|record| record.key)
    }

    fn unread_count(&self, boundary: Option<RecordKey>) -> u32 {
        let Some(boundary) = boundary else {
            return 0;
        };
        self.records
            .values()
            .filter(|record| record.is_incoming())
            .filter(|record| record.key > boundary)
            .count() as u32
    }

    fn aux(&self, boundary: Option<RecordKey>) -> WindowAux {
        let keyboard_record = self
            .records
            .values()
            .rev()
            .find(|record| record.tags.offers_keyboard)
            .cloned();
        let unread = self.unread_count(boundary);
        WindowAux {
            peer: self.peer,
            cached_payload: self.cached_payload.clone(),
            keyboard_record,
            read_state: Some(ReadStateSummary {
                unread_count: unread,
                total_unread: unread,
                muted: false,
            }),
        }
    }

    /// All records and holes merged in composite-key order, optionally
    /// restricted to one namespace.
    fn merged_items(&self, namespace_filter: Option<Namespace>) -> Vec<WindowItem> {
        let mut items: Vec<WindowItem> = self
            .records
            .values()
            .filter(|record| {
                namespace_filter.is_none_or(|namespace| record.key.id.namespace == namespace)
            })
            .cloned()
            .map(WindowItem::Record)
            .collect();
        items.extend(self.holes.iter().copied().map(WindowItem::Hole));
        items.sort_by_key(WindowItem::position);
        items
    }
}

// ─────────────────────────────────────────────────────────
// Window Slicing
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum SliceAnchor {
    Earliest,
    Latest,
    Around(RecordKey),
}

impl SliceAnchor {
    fn for_anchor_key(anchor: AnchorKey) -> Self {
        match anchor {
            AnchorKey::LowerBound => SliceAnchor::Earliest,
            AnchorKey::UpperBound => SliceAnchor::Latest,
            AnchorKey::Key(key) => SliceAnchor::Around(key),
        }
    }
}

/// Cut a `count`-item window out of the merged item list around the anchor.
/// Returns the window plus the boundary keys of the nearest items outside
/// it, when any exist.
fn slice_window(
    items: &[WindowItem],
    anchor: SliceAnchor,
    count: usize,
) -> (Vec<WindowItem>, Option<RecordKey>, Option<RecordKey>) {
    let len = items.len();
    let count = count.max(1);
    let (start, end) = match anchor {
        SliceAnchor::Earliest => (0, count.min(len)),
        SliceAnchor::Latest => (len.saturating_sub(count), len),
        SliceAnchor::Around(key) => {
            let pivot = items.partition_point(|item| item.position() < key);
            let start = pivot.saturating_sub(count / 2);
            let end = (start + count).min(len);
            (end.saturating_sub(count), end)
        }
    };
    let earlier = (start > 0).then(|| items[start - 1].position());
    let later = (end < len).then(|| items[end].position());
    (items[start..end].to_vec(), earlier, later)
}

// ─────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────

/// In-memory log store. Cheap to clone; all clones share the same log.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
    /// Emit a `Loading` update before the first snapshot, as a cold
    /// persistent store would.
    cold_start: bool,
    page_size: usize,
}

impl MemoryStore {
    pub fn new(peer: PeerInfo) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                records: BTreeMap::new(),
                holes: Vec::new(),
                read_cursors: HashMap::new(),
                peer,
                cached_payload: None,
                subscribers: Vec::new(),
                viewed: std::collections::HashSet::new(),
            })),
            cold_start: false,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_cold_start(mut self, cold_start: bool) -> Self {
        self.cold_start = cold_start;
        self
    }

    pub fn with_cached_payload(self, payload: CachedPeerPayload) -> Self {
        self.inner.lock().unwrap().cached_payload = Some(payload);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    // ─────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────

    /// Append a record to the log. Duplicate keys replace the previous
    /// record (an edit arriving as a re-insert).
    pub fn append(&self, record: LogRecord) {
        let mut inner = self.inner.lock().unwrap();
        if inner.records.insert(record.key, record).is_some() {
            debug!("append replaced an existing record");
        }
        inner.notify(Change::Generic);
    }

    pub fn append_all(&self, records: impl IntoIterator<Item = LogRecord>) {
        let mut inner = self.inner.lock().unwrap();
        for record in records {
            inner.records.insert(record.key, record);
        }
        inner.notify(Change::Generic);
    }

    /// Mutate a record in place (edit, attribute change).
    pub fn update_record(&self, key: RecordKey, mutate: impl FnOnce(&mut LogRecord)) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(record) = inner.records.get_mut(&key) {
            mutate(record);
            inner.notify(Change::Generic);
        }
    }

    pub fn remove(&self, key: RecordKey) {
        let mut inner = self.inner.lock().unwrap();
        if inner.records.remove(&key).is_some() {
            inner.notify(Change::Generic);
        }
    }

    /// Register a known-but-unfetched range. Ranges overlapping fetched
    /// records are rejected rather than corrupting the order.
    pub fn set_hole(&self, range: KeyRange) {
        let mut inner = self.inner.lock().unwrap();
        let collides = inner
            .records
            .range(range.from..=range.to)
            .next()
            .is_some();
        if collides {
            warn!("rejecting hole overlapping fetched records");
            return;
        }
        inner.holes.push(range);
        inner.holes.sort_by_key(|hole| hole.from);
        inner.notify(Change::Generic);
    }

    /// Replace a hole (or the part of it covered by `range`) with fetched
    /// records, notifying streams with the fill directions.
    pub fn fill_hole(
        &self,
        range: KeyRange,
        records: Vec<LogRecord>,
        direction: FillDirection,
    ) {
        let mut inner = self.inner.lock().unwrap();
        let mut removed = BTreeMap::new();
        inner.holes.retain(|hole| {
            if hole.overlaps(&range) {
                removed.insert(hole.from, direction);
                false
            } else {
                true
            }
        });
        let mut filled = BTreeMap::new();
        for record in records {
            if !range.contains(record.key) {
                warn!("dropping fill record outside the hole range");
                continue;
            }
            filled.insert(record.key, direction);
            inner.records.insert(record.key, record);
        }
        inner.notify(Change::HoleFilled { filled, removed });
    }

    /// Re-emit the current window to all streams (visible-range re-read).
    pub fn refresh_visible(&self) {
        self.inner.lock().unwrap().notify(Change::VisibleRefresh);
    }

    pub fn set_read_cursor(&self, namespace: Namespace, key: RecordKey) {
        let mut inner = self.inner.lock().unwrap();
        inner.read_cursors.insert(namespace, key);
    }

    pub fn read_cursor(&self, namespace: Namespace) -> Option<RecordKey> {
        self.inner.lock().unwrap().read_cursors.get(&namespace).copied()
    }

    pub fn record(&self, key: RecordKey) -> Option<LogRecord> {
        self.inner.lock().unwrap().records.get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ─────────────────────────────────────────────────────
    // Snapshot Assembly
    // ─────────────────────────────────────────────────────

    fn build_snapshot(
        &self,
        anchor: SliceAnchor,
        count: usize,
        namespace_filter: Option<Namespace>,
        frozen_read: Option<RecordKey>,
    ) -> WindowSnapshot {
        let inner = self.inner.lock().unwrap();
        let items = inner.merged_items(namespace_filter);
        let (window_items, earlier, later) = slice_window(&items, anchor, count);
        WindowSnapshot {
            items: window_items,
            earlier,
            later,
            max_read_key: frozen_read,
            aux: inner.aux(frozen_read),
        }
    }

    fn initial_payload(&self, frozen_read: Option<RecordKey>) -> InitialPayload {
        let inner = self.inner.lock().unwrap();
        InitialPayload::from_aux(&inner.aux(frozen_read))
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<Change> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().subscribers.push(tx);
        rx
    }

    /// Resolve a location into slice anchor, first-update kind, and scroll.
    fn resolve_location(
        &self,
        location: WindowLocation,
        frozen_read: Option<RecordKey>,
    ) -> (SliceAnchor, usize, UpdateKind, Option<ResolvedScroll>) {
        match location {
            WindowLocation::Initial { count } => {
                let first_unread = self.inner.lock().unwrap().first_unread(frozen_read);
                match first_unread {
                    Some(key) => (
                        SliceAnchor::Around(key),
                        count,
                        UpdateKind::InitialUnread,
                        Some(ResolvedScroll::Unread { key }),
                    ),
                    None => (
                        SliceAnchor::Latest,
                        count,
                        UpdateKind::Initial {
                            fade_in: self.cold_start,
                        },
                        None,
                    ),
                }
            }
            WindowLocation::InitialSearch { anchor, count } => (
                SliceAnchor::Around(anchor),
                count,
                UpdateKind::Initial { fade_in: true },
                Some(ResolvedScroll::Key {
                    anchor: AnchorKey::Key(anchor),
                    position: ScrollPosition::Center,
                    direction: DirectionHint::Down,
                    animated: false,
                }),
            ),
            WindowLocation::Navigation { index, count, .. } => (
                SliceAnchor::for_anchor_key(index),
                count,
                UpdateKind::Generic,
                None,
            ),
            WindowLocation::Scroll {
                target,
                source,
                position,
                animated,
                ..
            } => {
                let direction = match (target, source) {
                    (AnchorKey::Key(t), AnchorKey::Key(s)) if t < s => DirectionHint::Up,
                    (AnchorKey::LowerBound, _) => DirectionHint::Up,
                    _ => DirectionHint::Down,
                };
                (
                    SliceAnchor::for_anchor_key(target),
                    self.page_size,
                    UpdateKind::Generic,
                    Some(ResolvedScroll::Key {
                        anchor: target,
                        position,
                        direction,
                        animated,
                    }),
                )
            }
        }
    }
}

impl WindowFetchService for MemoryStore {
    async fn fetch(
        &self,
        location: WindowLocation,
        fixed_max_read: Option<RecordKey>,
        namespace_filter: Option<Namespace>,
        token: CancellationToken,
    ) -> mpsc::Receiver<WindowUpdate> {
        let (tx, rx) = mpsc::channel(16);

        // Freeze the read boundary for the lifetime of this fetch so the
        // unread marker does not jump while the window is live.
        let frozen_read =
            fixed_max_read.or_else(|| self.inner.lock().unwrap().max_read());

        let mut changes = self.subscribe();
        let store = self.clone();
        let cold_start = self.cold_start;

        tokio::spawn(async move {
            if cold_start {
                let initial = store.initial_payload(frozen_read);
                if tx
                    .send(WindowUpdate::Loading {
                        initial: Some(initial),
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }

            let (anchor, count, first_kind, scroll) =
                store.resolve_location(location, frozen_read);
            let original_scroll = scroll;

            let window = store.build_snapshot(anchor, count, namespace_filter, frozen_read);
            let initial = InitialPayload::from_aux(&window.aux);
            let first = WindowUpdate::Snapshot {
                window,
                kind: first_kind,
                scroll,
                original_scroll,
                initial,
            };
            if tx.send(first).await.is_err() {
                return;
            }

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    change = changes.recv() => {
                        let Some(change) = change else { break };
                        let window = store.build_snapshot(
                            anchor,
                            count,
                            namespace_filter,
                            frozen_read,
                        );
                        let initial = InitialPayload::from_aux(&window.aux);
                        let update = WindowUpdate::Snapshot {
                            window,
                            kind: change.into_kind(),
                            scroll: None,
                            original_scroll,
                            initial,
                        };
                        if tx.send(update).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        rx
    }
}

impl ReadStateService for MemoryStore {
    fn advance_read_cursor(&self, namespace: Namespace, key: RecordKey) {
        let mut inner = self.inner.lock().unwrap();
        let current = inner.read_cursors.get(&namespace).copied();
        if current.is_none_or(|cursor| key > cursor) {
            inner.read_cursors.insert(namespace, key);
            debug!(?namespace, ?key, "read cursor advanced");
            inner.notify(Change::Generic);
        }
    }
}

impl EffectSink for MemoryStore {
    fn notify_viewed(&self, ids: Vec<RecordId>) {
        let mut inner = self.inner.lock().unwrap();
        let mut touched = false;
        let fresh: Vec<RecordId> = ids
            .into_iter()
            .filter(|id| inner.viewed.insert(*id))
            .collect();
        let keys: Vec<RecordKey> = inner
            .records
            .values()
            .filter(|record| fresh.contains(&record.key.id))
            .map(|record| record.key)
            .collect();
        for key in keys {
            if let Some(record) = inner.records.get_mut(&key) {
                for attribute in &mut record.attributes {
                    if let scrollback_core::Attribute::ViewCount(count) = attribute {
                        *count += 1;
                        touched = true;
                    }
                }
            }
        }
        if touched {
            inner.notify(Change::Generic);
        }
    }

    fn notify_mentions_seen(&self, ids: Vec<RecordId>) {
        let mut inner = self.inner.lock().unwrap();
        let mut touched = false;
        let keys: Vec<RecordKey> = inner
            .records
            .values()
            .filter(|record| ids.contains(&record.key.id))
            .map(|record| record.key)
            .collect();
        for key in keys {
            if let Some(record) = inner.records.get_mut(&key) {
                if record.tags.unseen_mention {
                    record.tags.unseen_mention = false;
                    touched = true;
                }
            }
        }
        if touched {
            inner.notify(Change::Generic);
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
    use scrollback_core::{Attribute, Direction, RecordTags, SenderId};

    fn record(seq: u64, direction: Direction) -> LogRecord {
        LogRecord {
            key: RecordKey::new(seq, Namespace::REMOTE, seq),
            sender: SenderId(1),
            direction,
            group_key: None,
            tags: RecordTags::default(),
            attributes: Vec::new(),
            at: Utc.timestamp_opt(seq as i64, 0).unwrap(),
            body: format!("m{seq}"),
        }
    }

    fn key(seq: u64) -> RecordKey {
        RecordKey::new(seq, Namespace::REMOTE, seq)
    }

    fn store_with(seqs: std::ops::Range<u64>) -> MemoryStore {
        let store = MemoryStore::new(PeerInfo::default());
        store.append_all(seqs.map(|seq| record(seq, Direction::Incoming)));
        store
    }

    #[test]
    fn test_slice_latest_takes_the_newest_records() {
        let store = store_with(1..21);
        let snapshot = store.build_snapshot(SliceAnchor::Latest, 5, None, None);
        assert_eq!(snapshot.items.len(), 5);
        assert_eq!(snapshot.first_record().unwrap().key, key(16));
        assert_eq!(snapshot.earlier, Some(key(15)));
        assert_eq!(snapshot.later, None);
    }

    #[test]
    fn test_slice_around_centers_on_the_anchor() {
        let store = store_with(1..21);
        let snapshot = store.build_snapshot(SliceAnchor::Around(key(10)), 5, None, None);
        let keys: Vec<u64> = snapshot
            .items
            .iter()
            .map(|item| item.position().seq)
            .collect();
        assert_eq!(keys, vec![8, 9, 10, 11, 12]);
        assert_eq!(snapshot.earlier, Some(key(7)));
        assert_eq!(snapshot.later, Some(key(13)));
    }

    #[test]
    fn test_slice_earliest_starts_at_the_oldest_record() {
        let store = store_with(1..21);
        let snapshot = store.build_snapshot(SliceAnchor::Earliest, 5, None, None);
        assert_eq!(snapshot.first_record().unwrap().key, key(1));
        assert_eq!(snapshot.earlier, None);
        assert_eq!(snapshot.later, Some(key(6)));
    }

    #[test]
    fn test_hole_rejected_when_overlapping_records() {
        let store = store_with(1..10);
        store.set_hole(KeyRange::new(key(3), key(5)));
        let snapshot = store.build_snapshot(SliceAnchor::Latest, 50, None, None);
        assert!(
            snapshot
                .items
                .iter()
                .all(|item| matches!(item, WindowItem::Record(_))),
            "colliding hole must not be registered"
        );
    }

    #[tokio::test]
    async fn test_fetch_emits_initial_snapshot_then_changes() {
        let store = store_with(1..6);
        let token = CancellationToken::new();
        let mut rx = store
            .fetch(WindowLocation::Initial { count: 10 }, None, None, token)
            .await;

        let first = rx.recv().await.expect("initial snapshot");
        match first {
            WindowUpdate::Snapshot { window, kind, .. } => {
                assert_eq!(window.items.len(), 5);
                assert_eq!(kind, UpdateKind::Initial { fade_in: false });
            }
            other => panic!("expected snapshot, got {other:?}"),
        }

        store.append(record(6, Direction::Incoming));
        let second = rx.recv().await.expect("change snapshot");
        match second {
            WindowUpdate::Snapshot { window, kind, .. } => {
                assert_eq!(kind, UpdateKind::Generic);
                assert_eq!(window.last_record().unwrap().key, key(6));
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_initial_anchors_at_first_unread() {
        let store = store_with(1..201);
        store.set_read_cursor(Namespace::REMOTE, key(100));
        let token = CancellationToken::new();
        let mut rx = store
            .fetch(WindowLocation::Initial { count: 20 }, None, None, token)
            .await;

        let first = rx.recv().await.expect("initial snapshot");
        match first {
            WindowUpdate::Snapshot {
                kind,
                scroll,
                window,
                ..
            } => {
                assert_eq!(kind, UpdateKind::InitialUnread);
                assert_eq!(scroll, Some(ResolvedScroll::Unread { key: key(101) }));
                assert_eq!(window.max_read_key, Some(key(100)));
                assert!(window
                    .items
                    .iter()
                    .any(|item| item.position() == key(101)));
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_cancellation_ends_the_stream() {
        let store = store_with(1..6);
        let token = CancellationToken::new();
        let mut rx = store
            .fetch(WindowLocation::Initial { count: 10 }, None, None, token.clone())
            .await;
        let _ = rx.recv().await.expect("initial snapshot");

        token.cancel();
        // Drain: stream must terminate without further snapshots even if
        // the log keeps changing.
        store.append(record(6, Direction::Incoming));
        while let Some(update) = rx.recv().await {
            // A change raced the cancellation; there must be no more after.
            let _ = update;
        }
    }

    #[tokio::test]
    async fn test_fill_hole_emits_hole_filled_kind() {
        let store = store_with(10..15);
        store.set_hole(KeyRange::new(key(1), key(9)));
        let token = CancellationToken::new();
        let mut rx = store
            .fetch(WindowLocation::Initial { count: 50 }, None, None, token)
            .await;
        let _ = rx.recv().await.expect("initial snapshot");

        store.fill_hole(
            KeyRange::new(key(1), key(9)),
            (1..10).map(|seq| record(seq, Direction::Incoming)).collect(),
            FillDirection::Earlier,
        );

        let update = rx.recv().await.expect("hole fill snapshot");
        match update {
            WindowUpdate::Snapshot { kind, window, .. } => {
                match kind {
                    UpdateKind::HoleFilled { filled, removed } => {
                        assert_eq!(removed.len(), 1);
                        assert_eq!(filled.len(), 9);
                    }
                    other => panic!("expected HoleFilled, got {other:?}"),
                }
                assert!(window
                    .items
                    .iter()
                    .all(|item| matches!(item, WindowItem::Record(_))));
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_read_cursor_is_idempotent_for_stale_keys() {
        let store = store_with(1..10);
        store.advance_read_cursor(Namespace::REMOTE, key(5));
        store.advance_read_cursor(Namespace::REMOTE, key(3));
        assert_eq!(store.read_cursor(Namespace::REMOTE), Some(key(5)));
        store.advance_read_cursor(Namespace::REMOTE, key(7));
        assert_eq!(store.read_cursor(Namespace::REMOTE), Some(key(7)));
    }

    #[test]
    fn test_notify_viewed_bumps_view_counters() {
        let store = MemoryStore::new(PeerInfo::default());
        let mut viewed = record(1, Direction::Incoming);
        viewed.attributes.push(Attribute::ViewCount(41));
        store.append(viewed);

        store.notify_viewed(vec![key(1).id]);
        let after = store.record(key(1)).unwrap();
        assert!(after
            .attributes
            .contains(&Attribute::ViewCount(42)));

        store.notify_viewed(vec![key(1).id]);
        let again = store.record(key(1)).unwrap();
        assert!(
            again.attributes.contains(&Attribute::ViewCount(42)),
            "a view is counted once per record"
        );
    }

    #[test]
    fn test_notify_mentions_seen_clears_the_tag() {
        let store = MemoryStore::new(PeerInfo::default());
        let mut mentioned = record(1, Direction::Incoming);
        mentioned.tags.unseen_mention = true;
        mentioned.attributes.push(Attribute::Mention { pending: false });
        store.append(mentioned);

        store.notify_mentions_seen(vec![key(1).id]);
        let after = store.record(key(1)).unwrap();
        assert!(!after.tags.unseen_mention);
    }
}
