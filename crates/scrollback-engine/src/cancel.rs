//! Replaceable single-slot cancellation handle.

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

enum Slot {
    Active(Option<CancellationToken>),
    Disposed,
}

/// Holds at most one [`CancellationToken`]. Storing a new token cancels
/// whatever was previously held; disposing cancels the current token and
/// leaves the handle inert, so any token stored afterwards is cancelled on
/// arrival.
pub struct CancelHandle {
    slot: Mutex<Slot>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Active(None)),
        }
    }

    /// Store `token`, cancelling the previously held token first. On a
    /// disposed handle the incoming token is cancelled immediately.
    pub fn replace(&self, token: CancellationToken) {
        let mut slot = self.slot.lock().unwrap();
        match &mut *slot {
            Slot::Active(current) => {
                if let Some(previous) = current.take() {
                    previous.cancel();
                }
                *current = Some(token);
            }
            Slot::Disposed => token.cancel(),
        }
    }

    /// Cancel and drop the current token without storing a new one.
    pub fn clear(&self) {
        if let Slot::Active(current) = &mut *self.slot.lock().unwrap() {
            if let Some(previous) = current.take() {
                previous.cancel();
            }
        }
    }

    /// Cancel the current token and make the handle permanently inert.
    pub fn dispose(&self) {
        let mut slot = self.slot.lock().unwrap();
        if let Slot::Active(current) = &mut *slot {
            if let Some(previous) = current.take() {
                previous.cancel();
            }
        }
        *slot = Slot::Disposed;
    }

    pub fn is_disposed(&self) -> bool {
        matches!(&*self.slot.lock().unwrap(), Slot::Disposed)
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_cancels_the_previous_token() {
        let handle = CancelHandle::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();

        handle.replace(first.clone());
        assert!(!first.is_cancelled());

        handle.replace(second.clone());
        assert!(first.is_cancelled(), "replaced token must be cancelled");
        assert!(!second.is_cancelled());
    }

    #[test]
    fn test_clear_cancels_without_replacement() {
        let handle = CancelHandle::new();
        let token = CancellationToken::new();
        handle.replace(token.clone());
        handle.clear();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_dispose_makes_the_handle_inert() {
        let handle = CancelHandle::new();
        let held = CancellationToken::new();
        handle.replace(held.clone());

        handle.dispose();
        assert!(held.is_cancelled());
        assert!(handle.is_disposed());

        let late = CancellationToken::new();
        handle.replace(late.clone());
        assert!(
            late.is_cancelled(),
            "tokens stored after dispose are cancelled on arrival"
        );
    }
}
