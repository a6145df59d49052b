use std::fmt;
use std::time::{Duration, Instant};

use super::{Histogram, HistogramSnapshot, Meter, MeterSnapshot};

/// Durations (recorded in nanoseconds) plus the rate at which they occur.
#[derive(Clone, Default)]
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer").field("count", &self.count()).finish()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, d: Duration) {
        let nanos = i64::try_from(d.as_nanos()).unwrap_or(i64::MAX);
        self.histogram.update(nanos);
        self.meter.mark(1);
    }

    pub fn update_since(&self, start: Instant) {
        self.update(start.elapsed());
    }

    /// Run `f` and record how long it took.
    pub fn time<R>(&self, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = f();
        self.update_since(start);
        out
    }

    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    pub fn snapshot(&self) -> (HistogramSnapshot, MeterSnapshot) {
        (self.histogram.snapshot(), self.meter.snapshot())
    }

    pub fn same_as(&self, other: &Timer) -> bool {
        self.histogram.same_as(&other.histogram)
    }
}
