//! Broadcast state cells.
//!
//! Single-slot value holders with a registered-observer list. A subscriber
//! receives the current value immediately (when one exists) and every
//! subsequent `set`. [`DistinctCell`] additionally suppresses consecutive
//! duplicate values.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

struct CellInner<T> {
    value: Option<T>,
    observers: Vec<mpsc::UnboundedSender<T>>,
}

impl<T: Clone> CellInner<T> {
    fn push(&mut self, value: T) {
        self.value = Some(value.clone());
        self.observers
            .retain(|observer| observer.send(value.clone()).is_ok());
    }

    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(value) = &self.value {
            // Delivery of the current value can only fail if the receiver is
            // already gone, in which case registering is pointless too.
            if tx.send(value.clone()).is_err() {
                return rx;
            }
        }
        self.observers.push(tx);
        rx
    }
}

/// Single-slot broadcast cell: retains the latest value, delivers it to new
/// subscribers, and pushes every later update to all of them.
pub struct ValueCell<T> {
    inner: Arc<Mutex<CellInner<T>>>,
}

impl<T> Clone for ValueCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> Default for ValueCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ValueCell<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CellInner {
                value: None,
                observers: Vec::new(),
            })),
        }
    }

    pub fn with_value(value: T) -> Self {
        let cell = Self::new();
        cell.set(value);
        cell
    }

    pub fn set(&self, value: T) {
        self.inner.lock().unwrap().push(value);
    }

    pub fn get(&self) -> Option<T> {
        self.inner.lock().unwrap().value.clone()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        self.inner.lock().unwrap().subscribe()
    }
}

/// [`ValueCell`] variant that drops a `set` equal to the currently held
/// value, so observers never see consecutive duplicates.
pub struct DistinctCell<T> {
    inner: Arc<Mutex<CellInner<T>>>,
}

impl<T> Clone for DistinctCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + PartialEq> Default for DistinctCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq> DistinctCell<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CellInner {
                value: None,
                observers: Vec::new(),
            })),
        }
    }

    pub fn with_value(value: T) -> Self {
        let cell = Self::new();
        cell.set(value);
        cell
    }

    /// Set the value unless it equals the current one. Returns whether the
    /// update was delivered.
    pub fn set(&self, value: T) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.value.as_ref() == Some(&value) {
            return false;
        }
        inner.push(value);
        true
    }

    pub fn get(&self) -> Option<T> {
        self.inner.lock().unwrap().value.clone()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<T> {
        self.inner.lock().unwrap().subscribe()
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_receives_current_value_immediately() {
        let cell = ValueCell::with_value(7);
        let mut rx = cell.subscribe();
        assert_eq!(rx.try_recv(), Ok(7));
    }

    #[test]
    fn test_subscriber_receives_subsequent_updates() {
        let cell = ValueCell::new();
        let mut rx = cell.subscribe();
        assert!(rx.try_recv().is_err(), "no value yet");

        cell.set(1);
        cell.set(2);
        assert_eq!(rx.try_recv(), Ok(1));
        assert_eq!(rx.try_recv(), Ok(2));
    }

    #[test]
    fn test_all_subscribers_see_every_set() {
        let cell = ValueCell::with_value(0);
        let mut a = cell.subscribe();
        let mut b = cell.subscribe();
        cell.set(1);
        assert_eq!(a.try_recv(), Ok(0));
        assert_eq!(a.try_recv(), Ok(1));
        assert_eq!(b.try_recv(), Ok(0));
        assert_eq!(b.try_recv(), Ok(1));
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let cell = ValueCell::with_value(0);
        let rx = cell.subscribe();
        drop(rx);
        cell.set(1);
        let mut live = cell.subscribe();
        assert_eq!(live.try_recv(), Ok(1));
    }

    #[test]
    fn test_distinct_cell_suppresses_duplicates() {
        let cell = DistinctCell::new();
        let mut rx = cell.subscribe();
        assert!(cell.set(5));
        assert!(!cell.set(5), "duplicate must be dropped");
        assert!(cell.set(6));
        assert_eq!(rx.try_recv(), Ok(5));
        assert_eq!(rx.try_recv(), Ok(6));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_distinct_cell_allows_reverting_values() {
        let cell = DistinctCell::new();
        let mut rx = cell.subscribe();
        cell.set(1);
        cell.set(2);
        cell.set(1);
        assert_eq!(rx.try_recv(), Ok(1));
        assert_eq!(rx.try_recv(), Ok(2));
        assert_eq!(rx.try_recv(), Ok(1), "only consecutive duplicates dedup");
    }
}
