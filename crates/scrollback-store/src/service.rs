//! Collaborator contracts consumed by the reconciliation engine.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use scrollback_core::{Namespace, RecordId, RecordKey, WindowLocation, WindowUpdate};

/// Window fetch service: turns a location descriptor into a live stream of
/// window updates.
///
/// The stream stays open for as long as the location is current; the store
/// pushes a fresh snapshot on every relevant log change. Cancelling the
/// token ends the stream; the engine cancels it whenever a new location
/// supersedes the old one. A stream that ends without ever producing a
/// snapshot leaves the engine in its loading state; retries, if any, are
/// the store's business.
#[trait_variant::make(WindowFetchService: Send)]
pub trait LocalWindowFetchService {
    /// Start a fetch for `location`.
    ///
    /// `fixed_max_read` freezes the read boundary used for unread-marker
    /// placement across paginations, so the marker does not jump while the
    /// conversation is open. `namespace_filter` restricts the window to one
    /// key namespace.
    async fn fetch(
        &self,
        location: WindowLocation,
        fixed_max_read: Option<RecordKey>,
        namespace_filter: Option<Namespace>,
        token: CancellationToken,
    ) -> mpsc::Receiver<WindowUpdate>;
}

/// Read-state collaborator. `advance_read_cursor` is fire-and-forget and
/// idempotent for keys at or below the current cursor.
pub trait ReadStateService: Send + Sync {
    fn advance_read_cursor(&self, namespace: Namespace, key: RecordKey);
}

/// Batched side-effect targets for visibility-driven acknowledgments.
pub trait EffectSink: Send + Sync {
    /// Refresh view counters for records that became visible.
    fn notify_viewed(&self, ids: Vec<RecordId>);

    /// Consume mentions that were seen on screen.
    fn notify_mentions_seen(&self, ids: Vec<RecordId>);
}
