//! Debounced batched effect collector.
//!
//! Accumulates item identifiers and flushes them as one downstream call
//! after a debounce interval, or immediately once a size threshold is hit.
//! Every `add` restarts the debounce timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Handle to a collector worker task. Cloneable; all clones feed the same
/// buffer. After `dispose()` further adds are silently dropped.
pub struct BatchCollector<T> {
    feed: mpsc::UnboundedSender<Vec<T>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl<T> Clone for BatchCollector<T> {
    fn clone(&self) -> Self {
        Self {
            feed: self.feed.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<T> BatchCollector<T>
where
    T: PartialEq + Send + 'static,
{
    /// Spawn the collector worker. `flush` is invoked with the drained
    /// buffer after `debounce` of quiet time, or as soon as the buffer
    /// reaches `max_batch` items.
    pub fn new(
        debounce: Duration,
        max_batch: usize,
        mut flush: impl FnMut(Vec<T>) + Send + 'static,
    ) -> Self {
        let (feed, mut rx) = mpsc::unbounded_channel::<Vec<T>>();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let max_batch = max_batch.max(1);

        tokio::spawn(async move {
            let mut buffer: Vec<T> = Vec::new();
            loop {
                tokio::select! {
                    items = rx.recv() => {
                        let Some(items) = items else { break };
                        for item in items {
                            if !buffer.contains(&item) {
                                buffer.push(item);
                            }
                        }
                        if buffer.len() >= max_batch {
                            flush(std::mem::take(&mut buffer));
                        }
                    }
                    // Recreated on every loop turn, so each received add
                    // restarts the quiet period.
                    _ = tokio::time::sleep(debounce), if !buffer.is_empty() => {
                        flush(std::mem::take(&mut buffer));
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            debug!("batch collector disposed, dropping {} buffered items", buffer.len());
                            break;
                        }
                    }
                }
            }
        });

        Self {
            feed,
            shutdown: Arc::new(shutdown_tx),
        }
    }

    /// Queue identifiers for the next flush. Duplicates already buffered
    /// are dropped.
    pub fn add(&self, items: Vec<T>) {
        if items.is_empty() {
            return;
        }
        let _ = self.feed.send(items);
    }

    /// Stop the worker without a trailing flush. Buffered items are
    /// discarded; subsequent adds are no-ops.
    pub fn dispose(&self) {
        let _ = self.shutdown.send(true);
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────
