//! Headless simulation - NDJSON event output for the reconciliation engine.
//!
//! Seeds an in-memory store with a scripted conversation, runs the engine
//! against a bookkeeping render surface, and emits one JSON event per
//! applied transition. Enables reliable parsing in test scripts and gives
//! the engine a full end-to-end exercise without a UI.
//!
//! # Example Output
//!
//! ```json
//! {"event":"transition","reason":"initial","insertions":61,"deletions":0,"updates":0,"entries":61,"timestamp":1704700001000}
//! {"event":"read_cursor","namespace":0,"seq":248,"timestamp":1704700002000}
//! ```

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde::Serialize;
use tracing::info;

use scrollback_core::{
    Attribute, CachedPeerPayload, Direction, DisplayedRange, IndexRange, LogRecord, Namespace,
    PeerInfo, PeerKind, RecordKey, RecordTags, RenderableEntry, SenderId, Transition,
    TransitionReason,
};
use scrollback_engine::{apply_to, EngineOptions, HistoryEngine, RenderSurface, Tuning};
use scrollback_store::MemoryStore;

/// Events emitted by the headless simulation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    /// A transition was applied to the surface
    Transition {
        reason: String,
        insertions: usize,
        deletions: usize,
        updates: usize,
        entries: usize,
        timestamp: i64,
    },

    /// The read cursor advanced
    ReadCursor {
        namespace: u16,
        seq: u64,
        timestamp: i64,
    },

    /// The simulation finished
    Finished {
        applied_transitions: usize,
        final_entries: usize,
        timestamp: i64,
    },
}

/// Emit an event as one NDJSON line on stdout.
fn emit(event: &SimEvent) {
    match serde_json::to_string(event) {
        Ok(line) => {
            let mut stdout = io::stdout();
            let _ = writeln!(stdout, "{line}");
            let _ = stdout.flush();
        }
        Err(e) => tracing::error!("failed to serialize sim event: {}", e),
    }
}

fn reason_label(reason: &TransitionReason) -> &'static str {
    match reason {
        TransitionReason::Initial { fade_in: true } => "initial_fade_in",
        TransitionReason::Initial { fade_in: false } => "initial",
        TransitionReason::InteractiveChanges => "interactive",
        TransitionReason::Reload => "reload",
        TransitionReason::HoleChanges { .. } => "hole_changes",
    }
}

// ─────────────────────────────────────────────────────────
// Render Surface
// ─────────────────────────────────────────────────────────

/// Bookkeeping surface: replays transitions onto an entry list, emits one
/// event per apply, and reports a bottom-anchored viewport.
struct SimSurface {
    entries: Vec<RenderableEntry>,
    viewport: usize,
    applied: Arc<AtomicUsize>,
}

impl SimSurface {
    fn new(viewport: usize, applied: Arc<AtomicUsize>) -> Self {
        Self {
            entries: Vec::new(),
            viewport,
            applied,
        }
    }
}

impl RenderSurface for SimSurface {
    async fn apply(&mut self, transition: Transition) -> DisplayedRange {
        self.entries = apply_to(&self.entries, &transition);
        self.applied.fetch_add(1, Ordering::Relaxed);
        emit(&SimEvent::Transition {
            reason: reason_label(&transition.reason).to_string(),
            insertions: transition.insertions.len(),
            deletions: transition.deletions.len(),
            updates: transition.updates.len(),
            entries: self.entries.len(),
            timestamp: Utc::now().timestamp_millis(),
        });

        let len = self.entries.len();
        if len == 0 {
            return DisplayedRange::default();
        }
        // Display order is reversed: index 0 is the newest entry, pinned to
        // the bottom of the viewport.
        let last = self.viewport.min(len) - 1;
        DisplayedRange {
            visible: Some(IndexRange::new(0, last)),
            loaded: Some(IndexRange::new(0, len - 1)),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Scripted Conversation
// ─────────────────────────────────────────────────────────

fn seed_record(seq: u64, incoming: bool) -> LogRecord {
    let direction = if incoming {
        Direction::Incoming
    } else {
        Direction::Outgoing
    };
    let mut attributes = Vec::new();
    if incoming && seq % 10 == 0 {
        attributes.push(Attribute::ViewCount(seq as u32));
    }
    let mut tags = RecordTags::default();
    if incoming && seq % 97 == 0 {
        tags.unseen_mention = true;
        attributes.push(Attribute::Mention { pending: false });
    }
    LogRecord {
        key: RecordKey::new(seq, Namespace::REMOTE, seq),
        sender: SenderId(if incoming { 2 } else { 1 }),
        direction,
        group_key: None,
        tags,
        attributes,
        at: Utc.timestamp_opt(1_700_000_000 + seq as i64 * 30, 0).unwrap(),
        body: format!("message {seq}"),
    }
}

fn seed_store(records: u64, unread: u64) -> MemoryStore {
    let store = MemoryStore::new(PeerInfo {
        kind: PeerKind::User,
        is_contact: true,
    })
    .with_cached_payload(CachedPeerPayload {
        about: Some("Scripted conversation".into()),
    });

    store.append_all((1..=records).map(|seq| seed_record(seq, seq % 3 != 0)));
    let boundary = records.saturating_sub(unread);
    store.set_read_cursor(
        Namespace::REMOTE,
        RecordKey::new(boundary, Namespace::REMOTE, boundary),
    );
    store
}

// ─────────────────────────────────────────────────────────
// Runner
// ─────────────────────────────────────────────────────────

/// Run the scripted simulation: open the window, receive live appends, an
/// edit, and a scroll to the start of history, then report and shut down.
pub async fn run(records: u64, unread: u64, tuning: Tuning) -> scrollback_core::Result<()> {
    let store = seed_store(records, unread);
    let applied_count = Arc::new(AtomicUsize::new(0));
    let surface = SimSurface::new(20, applied_count.clone());

    let engine = HistoryEngine::spawn(
        store.clone(),
        surface,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        EngineOptions {
            tuning,
            ..EngineOptions::default()
        },
    );

    let mut initial_data = engine.subscribe_initial_data();
    let mut load_state = engine.subscribe_load_state();

    tokio::time::sleep(Duration::from_millis(100)).await;

    if let Ok(payload) = initial_data.try_recv() {
        info!(
            unread = payload.read_state.map(|state| state.unread_count),
            "initial payload published"
        );
    }

    // Live appends: two incoming records and one outgoing reply.
    for seq in records + 1..=records + 3 {
        store.append(seed_record(seq, seq % 3 != 0));
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    // The viewport is at rest and focused: reads may advance now.
    engine.set_can_read(true);
    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Some(cursor) = store.read_cursor(Namespace::REMOTE) {
        emit(&SimEvent::ReadCursor {
            namespace: cursor.id.namespace.0,
            seq: cursor.seq,
            timestamp: Utc::now().timestamp_millis(),
        });
    }

    // An edit arrives for a record already on screen.
    let edited = RecordKey::new(records, Namespace::REMOTE, records);
    store.update_record(edited, |record| {
        record.body.push_str(" (edited)");
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Jump to the start of history; pagination walks the window back.
    engine.scroll_to_start_of_history();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let final_entries = engine
        .applied_projection()
        .map(|projection| projection.entries.len())
        .unwrap_or(0);
    let mut last_state = None;
    while let Ok(state) = load_state.try_recv() {
        last_state = Some(state);
    }
    info!(?last_state, "simulation winding down");

    emit(&SimEvent::Finished {
        applied_transitions: applied_count.load(Ordering::Relaxed),
        final_entries,
        timestamp: Utc::now().timestamp_millis(),
    });

    engine.dispose();
    Ok(())
}
