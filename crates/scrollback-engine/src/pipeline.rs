//! Reconciliation pipeline: the serialized single-worker engine.
//!
//! One spawned task owns the whole fetch → project → diff → apply chain.
//! It merges four independent input signals (window location, display
//! settings, selection state, network class) plus the live fetch stream of
//! the current location, computes one transition per combined update, and
//! applies transitions strictly one at a time. Replacing the location
//! cancels the superseded fetch through the cancellation handle; a late
//! result from a superseded fetch is never applied.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use scrollback_core::{
    AnchorKey, CachedPeerPayload, DirectionHint, DisplayedRange, Error, InitialPayload,
    LogRecord, Namespace, NetworkClass, RecordId, RecordKey, RenderableEntry, ResolvedScroll,
    ScrollPosition, Transition, TransitionReason, UpdateKind, WindowLocation, WindowSnapshot,
    WindowUpdate,
};
use scrollback_store::{EffectSink, ReadStateService, WindowFetchService};

use crate::assoc::extract_associated_data;
use crate::batch::BatchCollector;
use crate::cancel::CancelHandle;
use crate::cell::{DistinctCell, ValueCell};
use crate::config::Tuning;
use crate::cursors::ReadCursors;
use crate::diff::prepared_transition;
use crate::project::{project, ProjectOptions, Projection};
use crate::state::{DisplaySettings, HistoryState, LoadState};
use crate::surface::RenderSurface;

// ─────────────────────────────────────────────────────────
// Location Requests
// ─────────────────────────────────────────────────────────

/// A location paired with the cancellation token guarding its fetch.
/// Equality considers the location only, so the distinct cell dedups
/// repeated requests for the same place.
#[derive(Clone)]
struct LocationRequest {
    location: WindowLocation,
    token: CancellationToken,
}

impl PartialEq for LocationRequest {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
    }
}

/// Shared location entry point: replaces the cancellation token (cancelling
/// the superseded fetch synchronously) before publishing the new request.
#[derive(Clone)]
struct LocationSetter {
    cell: DistinctCell<LocationRequest>,
    cancel: Arc<CancelHandle>,
}

impl LocationSetter {
    fn set(&self, location: WindowLocation) -> bool {
        if self.cancel.is_disposed() {
            return false;
        }
        if self.cell.get().map(|request| request.location) == Some(location) {
            return false;
        }
        let token = CancellationToken::new();
        self.cancel.replace(token.clone());
        self.cell.set(LocationRequest { location, token })
    }
}

// ─────────────────────────────────────────────────────────
// Output Cells
// ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct EngineOutputs {
    load_state: DistinctCell<LoadState>,
    history_state: DistinctCell<HistoryState>,
    initial_data: ValueCell<InitialPayload>,
    cached_peer: DistinctCell<Option<CachedPeerPayload>>,
    keyboard_record: DistinctCell<Option<LogRecord>>,
    scrolled_to: ValueCell<AnchorKey>,
    max_visible_key: DistinctCell<RecordKey>,
}

impl EngineOutputs {
    fn new() -> Self {
        Self {
            load_state: DistinctCell::new(),
            history_state: DistinctCell::new(),
            initial_data: ValueCell::new(),
            cached_peer: DistinctCell::new(),
            keyboard_record: DistinctCell::new(),
            scrolled_to: ValueCell::new(),
            max_visible_key: DistinctCell::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Engine Options
// ─────────────────────────────────────────────────────────

/// Construction-time configuration of a [`HistoryEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub tuning: Tuning,
    pub settings: DisplaySettings,
    pub network: NetworkClass,
    /// Restrict the window to one key namespace.
    pub namespace_filter: Option<Namespace>,
    /// Open centered on this record instead of at the newest data.
    pub start_at: Option<RecordKey>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tuning: Tuning::default(),
            settings: DisplaySettings::default(),
            network: NetworkClass::Wifi,
            namespace_filter: None,
            start_at: None,
        }
    }
}

// ─────────────────────────────────────────────────────────
// HistoryEngine
// ─────────────────────────────────────────────────────────

/// Host-side handle to the reconciliation pipeline.
///
/// Everything the host can do (supersede the location, feed settings,
/// selection, network and focus changes, report scroll positions) goes
/// through this handle; everything the engine produces comes back through
/// its broadcast cells or the [`RenderSurface`].
pub struct HistoryEngine {
    location: LocationSetter,
    settings: ValueCell<DisplaySettings>,
    selection: ValueCell<Option<HashSet<RecordId>>>,
    network: DistinctCell<NetworkClass>,
    can_read: ValueCell<bool>,
    visible_tx: mpsc::UnboundedSender<DisplayedRange>,
    outputs: EngineOutputs,
    applied: Arc<Mutex<Option<Arc<Projection>>>>,
    view_batch: BatchCollector<RecordId>,
    mention_batch: BatchCollector<RecordId>,
    shutdown: watch::Sender<bool>,
}

impl HistoryEngine {
    /// Spawn the worker task and open the initial window.
    pub fn spawn<S, R>(
        service: S,
        surface: R,
        read_service: Arc<dyn ReadStateService>,
        effects: Arc<dyn EffectSink>,
        options: EngineOptions,
    ) -> Self
    where
        S: WindowFetchService + Send + 'static,
        R: RenderSurface + Send + 'static,
    {
        let tuning = options.tuning.clone();

        let view_batch = {
            let sink = effects.clone();
            BatchCollector::new(tuning.view_debounce(), tuning.max_batch, move |ids| {
                sink.notify_viewed(ids)
            })
        };
        let mention_batch = {
            let sink = effects.clone();
            BatchCollector::new(tuning.mention_debounce(), tuning.max_batch, move |ids| {
                sink.notify_mentions_seen(ids)
            })
        };

        let location = LocationSetter {
            cell: DistinctCell::new(),
            cancel: Arc::new(CancelHandle::new()),
        };
        let settings = ValueCell::with_value(options.settings);
        let selection: ValueCell<Option<HashSet<RecordId>>> = ValueCell::with_value(None);
        let network = DistinctCell::with_value(options.network);
        let can_read = ValueCell::with_value(false);
        let outputs = EngineOutputs::new();
        let applied: Arc<Mutex<Option<Arc<Projection>>>> = Arc::new(Mutex::new(None));
        let (visible_tx, visible_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = Worker {
            service,
            surface,
            read_service,
            view_batch: view_batch.clone(),
            mention_batch: mention_batch.clone(),
            outputs: outputs.clone(),
            location: location.clone(),
            applied: applied.clone(),
            tuning: tuning.clone(),
            namespace_filter: options.namespace_filter,
            settings: options.settings,
            selection: None,
            network: options.network,
            can_read: false,
            previous: None,
            latest: None,
            in_flight: false,
            did_set_initial: false,
            fixed_max_read: None,
            token: CancellationToken::new(),
            cursors: ReadCursors::new(),
            pending_read: None,
        };

        let location_rx = location.cell.subscribe();
        let settings_rx = settings.subscribe();
        let selection_rx = selection.subscribe();
        let network_rx = network.subscribe();
        let can_read_rx = can_read.subscribe();

        tokio::spawn(worker.run(
            location_rx,
            settings_rx,
            selection_rx,
            network_rx,
            can_read_rx,
            visible_rx,
            shutdown_rx,
        ));

        let engine = Self {
            location,
            settings,
            selection,
            network,
            can_read,
            visible_tx,
            outputs,
            applied,
            view_batch,
            mention_batch,
            shutdown: shutdown_tx,
        };

        let initial = match options.start_at {
            Some(anchor) => WindowLocation::InitialSearch {
                anchor,
                count: tuning.initial_count,
            },
            None => WindowLocation::Initial {
                count: tuning.initial_count,
            },
        };
        engine.set_location(initial);
        engine
    }

    // ─────────────────────────────────────────────────────
    // Inputs
    // ─────────────────────────────────────────────────────

    /// Supersede the current window location. Cancels the in-flight fetch
    /// for the previous location before the new request is published.
    pub fn set_location(&self, location: WindowLocation) -> bool {
        self.location.set(location)
    }

    pub fn set_display_settings(&self, settings: DisplaySettings) {
        self.settings.set(settings);
    }

    pub fn set_selection(&self, selection: Option<HashSet<RecordId>>) {
        self.selection.set(selection);
    }

    pub fn set_network_class(&self, network: NetworkClass) {
        self.network.set(network);
    }

    /// Gate for read-state advancement: scroll-at-rest and focus conditions
    /// decided by the host.
    pub fn set_can_read(&self, can_read: bool) {
        self.can_read.set(can_read);
    }

    /// Report a layout pass that changed the displayed range without a
    /// structural transition (a plain scroll).
    pub fn displayed_range_changed(&self, displayed: DisplayedRange) {
        let _ = self.visible_tx.send(displayed);
    }

    // ─────────────────────────────────────────────────────
    // Scroll Commands
    // ─────────────────────────────────────────────────────

    pub fn scroll_to_start_of_history(&self) {
        self.set_location(WindowLocation::Scroll {
            target: AnchorKey::LowerBound,
            anchor: AnchorKey::LowerBound,
            source: AnchorKey::UpperBound,
            position: ScrollPosition::Bottom(0.0),
            animated: true,
        });
    }

    pub fn scroll_to_end_of_history(&self) {
        self.set_location(WindowLocation::Scroll {
            target: AnchorKey::UpperBound,
            anchor: AnchorKey::UpperBound,
            source: AnchorKey::LowerBound,
            position: ScrollPosition::Top(0.0),
            animated: true,
        });
    }

    pub fn scroll_to_key(&self, from: RecordKey, to: RecordKey, animated: bool) {
        self.set_location(WindowLocation::Scroll {
            target: AnchorKey::Key(to),
            anchor: AnchorKey::Key(to),
            source: AnchorKey::Key(from),
            position: ScrollPosition::Center,
            animated,
        });
    }

    // ─────────────────────────────────────────────────────
    // Outputs
    // ─────────────────────────────────────────────────────

    /// The projection backing what the surface currently shows. Opaque
    /// bookkeeping snapshot: read-only, never a handle into worker state.
    pub fn applied_projection(&self) -> Option<Arc<Projection>> {
        self.applied.lock().unwrap().clone()
    }

    /// Key of the newest record in the displayed range, for persisting the
    /// scroll position across a close/reopen. `None` when the newest entry
    /// is at the newest edge of the log (reopening lands there anyway).
    pub fn anchor_scroll_state(&self, displayed: &DisplayedRange) -> Option<RecordKey> {
        let projection = self.applied_projection()?;
        let visible = displayed.visible?;
        let len = projection.entries.len();
        if len == 0 {
            return None;
        }
        let clamp = |index: usize| index.min(len - 1);
        let (a, b) = if projection.reverse {
            (len - 1 - clamp(visible.last), len - 1 - clamp(visible.first))
        } else {
            (clamp(visible.first), clamp(visible.last))
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        if hi == len - 1 && projection.snapshot.later.is_none() {
            return None;
        }
        projection.entries[lo..=hi]
            .iter()
            .rev()
            .find_map(|entry| entry.newest_record().map(|record| record.key))
    }

    pub fn subscribe_load_state(&self) -> mpsc::UnboundedReceiver<LoadState> {
        self.outputs.load_state.subscribe()
    }

    pub fn subscribe_history_state(&self) -> mpsc::UnboundedReceiver<HistoryState> {
        self.outputs.history_state.subscribe()
    }

    /// One-shot initial auxiliary payload; delivered exactly once per
    /// engine instance, before or with the first applied transition.
    pub fn subscribe_initial_data(&self) -> mpsc::UnboundedReceiver<InitialPayload> {
        self.outputs.initial_data.subscribe()
    }

    pub fn subscribe_cached_peer(&self) -> mpsc::UnboundedReceiver<Option<CachedPeerPayload>> {
        self.outputs.cached_peer.subscribe()
    }

    pub fn subscribe_keyboard_record(&self) -> mpsc::UnboundedReceiver<Option<LogRecord>> {
        self.outputs.keyboard_record.subscribe()
    }

    pub fn subscribe_scrolled_to(&self) -> mpsc::UnboundedReceiver<AnchorKey> {
        self.outputs.scrolled_to.subscribe()
    }

    /// Greatest key that has been on screen, independent of direction and
    /// of the read gate.
    pub fn subscribe_max_visible_key(&self) -> mpsc::UnboundedReceiver<RecordKey> {
        self.outputs.max_visible_key.subscribe()
    }

    // ─────────────────────────────────────────────────────
    // Teardown
    // ─────────────────────────────────────────────────────

    /// Cancel the in-flight fetch, stop both effect collectors, then stop
    /// the worker. All handles are inert afterwards; no callback fires
    /// after this returns.
    pub fn dispose(&self) {
        self.location.cancel.dispose();
        self.view_batch.dispose();
        self.mention_batch.dispose();
        let _ = self.shutdown.send(true);
    }
}

impl Drop for HistoryEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ─────────────────────────────────────────────────────────
// Worker
// ─────────────────────────────────────────────────────────

/// Last snapshot seen for the current location, kept so settings, selection
/// and network changes can re-project without a new fetch.
#[derive(Clone)]
struct LatestSnapshot {
    window: WindowSnapshot,
    kind: UpdateKind,
    scroll: Option<ResolvedScroll>,
    original_scroll: Option<ResolvedScroll>,
    initial: InitialPayload,
}

struct Worker<S, R> {
    service: S,
    surface: R,
    read_service: Arc<dyn ReadStateService>,
    view_batch: BatchCollector<RecordId>,
    mention_batch: BatchCollector<RecordId>,
    outputs: EngineOutputs,
    location: LocationSetter,
    applied: Arc<Mutex<Option<Arc<Projection>>>>,
    tuning: Tuning,
    namespace_filter: Option<Namespace>,

    settings: DisplaySettings,
    selection: Option<HashSet<RecordId>>,
    network: NetworkClass,
    can_read: bool,

    /// Worker-owned previous projection; the delivery side never sees a
    /// mutable handle to it.
    previous: Option<Arc<Projection>>,
    latest: Option<LatestSnapshot>,
    /// Explicit transition-in-flight guard: a second enqueue before the
    /// surface reports back is a programming defect.
    in_flight: bool,
    did_set_initial: bool,
    /// Read boundary frozen at the first snapshot so the unread marker
    /// stays put across paginations.
    fixed_max_read: Option<RecordKey>,
    /// Token of the location whose fetch stream is current.
    token: CancellationToken,
    cursors: ReadCursors,
    pending_read: Option<RecordKey>,
}

impl<S, R> Worker<S, R>
where
    S: WindowFetchService + Send + 'static,
    R: RenderSurface + Send + 'static,
{
    #[allow(clippy::too_many_arguments)]
    async fn run(
        mut self,
        mut location_rx: mpsc::UnboundedReceiver<LocationRequest>,
        mut settings_rx: mpsc::UnboundedReceiver<DisplaySettings>,
        mut selection_rx: mpsc::UnboundedReceiver<Option<HashSet<RecordId>>>,
        mut network_rx: mpsc::UnboundedReceiver<NetworkClass>,
        mut can_read_rx: mpsc::UnboundedReceiver<bool>,
        mut visible_rx: mpsc::UnboundedReceiver<DisplayedRange>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut fetch_rx: Option<mpsc::Receiver<WindowUpdate>> = None;
        loop {
            tokio::select! {
                biased;
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                Some(request) = location_rx.recv() => {
                    debug!(location = ?request.location, "superseding window location");
                    self.token = request.token.clone();
                    let stream = self
                        .service
                        .fetch(
                            request.location,
                            self.fixed_max_read,
                            self.namespace_filter,
                            request.token,
                        )
                        .await;
                    fetch_rx = Some(stream);
                }
                Some(settings) = settings_rx.recv() => {
                    self.settings = settings;
                    self.reprocess().await;
                }
                Some(selection) = selection_rx.recv() => {
                    self.selection = selection;
                    self.reprocess().await;
                }
                Some(network) = network_rx.recv() => {
                    self.network = network;
                    self.reprocess().await;
                }
                Some(can_read) = can_read_rx.recv() => {
                    self.can_read = can_read;
                    if can_read {
                        self.flush_pending_read();
                    }
                }
                Some(displayed) = visible_rx.recv() => {
                    self.track_visibility(displayed);
                }
                update = recv_fetch(&mut fetch_rx), if fetch_rx.is_some() => {
                    match update {
                        Some(update) => self.process_update(update).await,
                        // Stream ended without a superseding location: the
                        // pipeline parks in its current state (Loading if
                        // nothing ever arrived). No retry here.
                        None => fetch_rx = None,
                    }
                }
            }
        }
    }

    async fn process_update(&mut self, update: WindowUpdate) {
        match update {
            WindowUpdate::Loading { initial } => {
                if let Some(initial) = initial {
                    self.publish_initial_once(initial);
                }
                self.outputs.cached_peer.set(None);
                self.outputs.load_state.set(LoadState::Loading);
                self.outputs.history_state.set(HistoryState::Loading);
            }
            WindowUpdate::Snapshot {
                window,
                kind,
                scroll,
                original_scroll,
                initial,
            } => {
                self.latest = Some(LatestSnapshot {
                    window,
                    kind,
                    scroll,
                    original_scroll,
                    initial,
                });
                self.reprocess().await;
            }
        }
    }

    /// Re-extract associated data, re-project, diff against the previous
    /// projection, and apply. Runs for every new snapshot and for every
    /// settings/selection/network change against the latest snapshot.
    async fn reprocess(&mut self) {
        let Some(latest) = self.latest.clone() else {
            return;
        };
        if self.token.is_cancelled() {
            return;
        }

        if self.fixed_max_read.is_none() {
            self.fixed_max_read = latest.window.max_read_key;
        }

        let assoc = extract_associated_data(&latest.window.aux.peer, self.network);
        let options = ProjectOptions::for_mode(
            &self.settings,
            self.namespace_filter.is_some(),
            self.tuning.group_interval(),
        );
        let entries = project(&latest.window, &options, self.selection.as_ref());
        let projection = Arc::new(Projection {
            entries: Arc::new(entries),
            snapshot: Arc::new(latest.window.clone()),
            assoc,
            reverse: options.reverse,
        });
        let previous = self.previous.replace(projection.clone());

        let mut scroll = latest.scroll;

        // A placeholder window consisting of a single hole scrolled to the
        // upper bound: once real data replaces it, re-apply that scroll so
        // the viewport lands where the request intended.
        if scroll.is_none() {
            if let (
                Some(ResolvedScroll::Key {
                    anchor: AnchorKey::UpperBound,
                    position,
                    ..
                }),
                Some(prev),
            ) = (latest.original_scroll, previous.as_ref())
            {
                if prev.entries.len() == 1
                    && matches!(prev.entries[0], RenderableEntry::Hole(_))
                {
                    scroll = Some(ResolvedScroll::Key {
                        anchor: AnchorKey::UpperBound,
                        position,
                        direction: DirectionHint::Down,
                        animated: false,
                    });
                }
            }
        }

        let reason = match previous.as_ref() {
            // Same underlying window: only presentation inputs changed.
            Some(prev) if prev.snapshot.items == projection.snapshot.items => {
                scroll = None;
                TransitionReason::InteractiveChanges
            }
            _ => match latest.kind.clone() {
                UpdateKind::Initial { fade_in } => TransitionReason::Initial { fade_in },
                UpdateKind::InitialUnread => TransitionReason::Initial { fade_in: false },
                UpdateKind::Generic => TransitionReason::InteractiveChanges,
                UpdateKind::VisibleRefresh => TransitionReason::Reload,
                UpdateKind::HoleFilled { filled, removed } => {
                    TransitionReason::HoleChanges { filled, removed }
                }
            },
        };

        let mut transition =
            match prepared_transition(previous.as_deref(), &projection, reason, scroll) {
                Ok(transition) => transition,
                Err(error) if error.is_fatal() => panic!("{error}"),
                Err(error) => {
                    warn!("skipping transition: {error}");
                    return;
                }
            };
        if !self.settings.animations {
            transition.options.animated = false;
        }
        if !self.did_set_initial {
            transition.first = Some(latest.initial.clone());
        }

        self.apply_transition(transition, projection).await;
    }

    async fn apply_transition(&mut self, transition: Transition, projection: Arc<Projection>) {
        if self.in_flight {
            // Serialization invariant: fail fast, never reorder or overlap.
            panic!(
                "{}",
                Error::contract("transition enqueued while another is unapplied")
            );
        }
        // A location superseded this one after the transition was computed:
        // drop the late result entirely.
        if self.token.is_cancelled() {
            return;
        }
        self.in_flight = true;

        let first = transition.first.clone();
        let scrolled_to = transition.scrolled_to;
        let cached = projection.snapshot.aux.cached_payload.clone();
        let keyboard = projection.snapshot.aux.keyboard_record.clone();

        let displayed = self.surface.apply(transition).await;
        self.in_flight = false;

        *self.applied.lock().unwrap() = Some(projection.clone());

        if let Some(first) = first {
            self.publish_initial_once(first);
        }
        self.outputs.cached_peer.set(cached);
        self.outputs.keyboard_record.set(keyboard);

        let load_state = if projection.entries.is_empty() {
            LoadState::Empty
        } else {
            LoadState::Ready
        };
        self.outputs.load_state.set(load_state);
        self.outputs.history_state.set(HistoryState::Loaded {
            is_empty: projection.snapshot.is_empty(),
        });

        if let Some(anchor) = scrolled_to {
            self.outputs.scrolled_to.set(anchor);
        }

        self.track_visibility(displayed);
    }

    fn track_visibility(&mut self, displayed: DisplayedRange) {
        let Some(projection) = self.previous.clone() else {
            return;
        };
        let context = crate::visibility::VisibilityContext {
            entries: &projection.entries,
            reverse: projection.reverse,
            earlier: projection.snapshot.earlier,
            later: projection.snapshot.later,
            margin: self.tuning.pagination_margin,
            page_size: self.tuning.page_size,
        };
        let outcome = crate::visibility::scan_visible(&context, &displayed);

        if !outcome.view_ids.is_empty() {
            self.view_batch.add(outcome.view_ids);
        }
        if !outcome.mention_ids.is_empty() {
            self.mention_batch.add(outcome.mention_ids);
        }
        if let Some(max) = outcome.max_overall {
            self.outputs.max_visible_key.set(max);
        }
        if let Some(max) = outcome.max_incoming {
            self.pending_read = Some(match self.pending_read {
                Some(current) if current >= max => current,
                _ => max,
            });
            self.flush_pending_read();
        }
        for location in outcome.pagination {
            self.location.set(location);
        }
    }

    /// Advance the read cursor for the pending visible maximum, if the gate
    /// allows it. Coalesced: only a strict advance reaches the collaborator.
    fn flush_pending_read(&mut self) {
        if !self.can_read {
            return;
        }
        if let Some(key) = self.pending_read.take() {
            if self.cursors.advance(key) {
                self.read_service.advance_read_cursor(key.id.namespace, key);
            }
        }
    }

    fn publish_initial_once(&mut self, payload: InitialPayload) {
        if self.did_set_initial {
            return;
        }
        self.did_set_initial = true;
        self.outputs.initial_data.set(payload);
    }
}

async fn recv_fetch(rx: &mut Option<mpsc::Receiver<WindowUpdate>>) -> Option<WindowUpdate> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
