//! Cooperative cancellation and progress reporting for long-running sorts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ir::TableRef;

/// A cancellation flag polled between node visits.
///
/// Clones share the same flag, so a UI or signal-handler thread can hold one
/// clone and cancel a sort running on another thread. The sort itself stays
/// single-threaded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Receives "table N of M" notifications as tables are placed in the order.
pub trait ProgressListener {
    fn table_processed(&mut self, current: usize, total: usize, table: &TableRef);
}

/// Listener that discards progress events.
pub struct NullProgress;

impl ProgressListener for NullProgress {
    fn table_processed(&mut self, _current: usize, _total: usize, _table: &TableRef) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_visible_through_clone() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancel_from_other_thread() {
        let token = CancelToken::new();
        let clone = token.clone();
        std::thread::spawn(move || clone.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
