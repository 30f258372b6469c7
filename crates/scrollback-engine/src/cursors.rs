//! Per-namespace monotonic read cursors.

use std::collections::HashMap;

use scrollback_core::{Namespace, RecordKey};

/// High-water marks of acknowledged reads, one per key namespace.
///
/// `advance` is compare-and-advance: it succeeds only for keys strictly
/// greater than the namespace's current cursor, which coalesces the rapid
/// visible-range churn a scroll produces into one downstream mutation per
/// actual advance.
#[derive(Debug, Default)]
pub struct ReadCursors {
    by_namespace: HashMap<Namespace, RecordKey>,
}

impl ReadCursors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to advance the cursor for `key`'s namespace. Returns whether the
    /// cursor moved; callers propagate the mutation downstream only then.
    pub fn advance(&mut self, key: RecordKey) -> bool {
        let namespace = key.id.namespace;
        match self.by_namespace.get(&namespace) {
            Some(current) if *current >= key => false,
            _ => {
                self.by_namespace.insert(namespace, key);
                true
            }
        }
    }

    pub fn get(&self, namespace: Namespace) -> Option<RecordKey> {
        self.by_namespace.get(&namespace).copied()
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn key(seq: u64) -> RecordKey {
        RecordKey::new(seq, Namespace::REMOTE, seq)
    }

    #[test]
    fn test_cursor_equals_max_of_all_advances() {
        let mut cursors = ReadCursors::new();
        let sequence = [3u64, 1, 7, 7, 2, 9, 4];
        for seq in sequence {
            cursors.advance(key(seq));
        }
        assert_eq!(cursors.get(Namespace::REMOTE), Some(key(9)));
    }

    #[test]
    fn test_stale_and_equal_keys_do_not_move_the_cursor() {
        let mut cursors = ReadCursors::new();
        assert!(cursors.advance(key(5)));
        assert!(!cursors.advance(key(5)), "equal key is a no-op");
        assert!(!cursors.advance(key(4)), "stale key is a no-op");
        assert!(cursors.advance(key(6)));
    }

    #[test]
    fn test_namespaces_advance_independently() {
        let mut cursors = ReadCursors::new();
        let remote = RecordKey::new(10, Namespace::REMOTE, 10);
        let local = RecordKey::new(3, Namespace::LOCAL, 3);
        assert!(cursors.advance(remote));
        assert!(cursors.advance(local));
        assert_eq!(cursors.get(Namespace::REMOTE), Some(remote));
        assert_eq!(cursors.get(Namespace::LOCAL), Some(local));
    }
}
