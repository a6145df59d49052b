use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Signed accumulator. Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicI64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by `n`.
    pub fn inc(&self, n: i64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Decrement by `n`.
    pub fn dec(&self, n: i64) {
        self.value.fetch_sub(n, Ordering::Relaxed);
    }

    /// Reset to zero.
    pub fn clear(&self) {
        self.value.store(0, Ordering::Relaxed);
    }

    pub fn count(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// True when both handles point at the same underlying counter.
    pub fn same_as(&self, other: &Counter) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}
