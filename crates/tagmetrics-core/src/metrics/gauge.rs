use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Last-set instantaneous value.
#[derive(Debug, Clone, Default)]
pub struct Gauge {
    value: Arc<AtomicI64>,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, v: i64) {
        self.value.store(v, Ordering::Relaxed);
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn same_as(&self, other: &Gauge) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}
