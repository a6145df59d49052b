use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Moving averages advance in fixed 5 second steps.
const TICK: Duration = Duration::from_secs(5);

/// Exponentially weighted moving average of an event rate.
#[derive(Debug)]
struct Ewma {
    alpha: f64,
    rate: f64,
    uncounted: u64,
    init: bool,
}

impl Ewma {
    fn over_minutes(minutes: f64) -> Self {
        Self {
            alpha: 1.0 - (-TICK.as_secs_f64() / 60.0 / minutes).exp(),
            rate: 0.0,
            uncounted: 0,
            init: false,
        }
    }

    fn tick(&mut self) {
        let instant = self.uncounted as f64 / TICK.as_secs_f64();
        self.uncounted = 0;
        if self.init {
            self.rate += self.alpha * (instant - self.rate);
        } else {
            self.rate = instant;
            self.init = true;
        }
    }
}

#[derive(Debug)]
struct Windows {
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
    last_tick: Instant,
}

impl Windows {
    /// Apply every tick that elapsed since the last access.
    fn catch_up(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = (elapsed.as_nanos() / TICK.as_nanos()) as u32;
        for _ in 0..ticks {
            self.m1.tick();
            self.m5.tick();
            self.m15.tick();
        }
        self.last_tick += TICK * ticks;
    }
}

struct MeterInner {
    count: AtomicU64,
    start: Instant,
    windows: Mutex<Windows>,
}

/// Point-in-time view of a [`Meter`]. Rates are events per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterSnapshot {
    pub count: u64,
    pub rate1: f64,
    pub rate5: f64,
    pub rate15: f64,
    pub rate_mean: f64,
}

/// Event rate over 1, 5 and 15 minute windows plus the mean since creation.
#[derive(Clone)]
pub struct Meter {
    inner: Arc<MeterInner>,
}

impl Default for Meter {
    fn default() -> Self {
        let now = Instant::now();
        Self {
            inner: Arc::new(MeterInner {
                count: AtomicU64::new(0),
                start: now,
                windows: Mutex::new(Windows {
                    m1: Ewma::over_minutes(1.0),
                    m5: Ewma::over_minutes(5.0),
                    m15: Ewma::over_minutes(15.0),
                    last_tick: now,
                }),
            }),
        }
    }
}

impl fmt::Debug for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Meter").field("count", &self.count()).finish()
    }
}

impl Meter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `n` events.
    pub fn mark(&self, n: u64) {
        self.mark_at(n, Instant::now());
    }

    /// Record `n` events as of `now`. Ticks due before `now` are applied
    /// first, so the events land in the window that contains `now`.
    pub fn mark_at(&self, n: u64, now: Instant) {
        self.inner.count.fetch_add(n, Ordering::Relaxed);
        let mut w = self.inner.windows.lock();
        w.catch_up(now);
        w.m1.uncounted += n;
        w.m5.uncounted += n;
        w.m15.uncounted += n;
    }

    pub fn count(&self) -> u64 {
        self.inner.count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        self.snapshot_at(Instant::now())
    }

    /// Rates as of `now`. Instants earlier than the last applied tick leave
    /// the moving averages unchanged.
    pub fn snapshot_at(&self, now: Instant) -> MeterSnapshot {
        let (rate1, rate5, rate15) = {
            let mut w = self.inner.windows.lock();
            w.catch_up(now);
            (w.m1.rate, w.m5.rate, w.m15.rate)
        };
        let count = self.count();
        let elapsed = now.saturating_duration_since(self.inner.start).as_secs_f64();
        let rate_mean = if elapsed > 0.0 { count as f64 / elapsed } else { 0.0 };
        MeterSnapshot { count, rate1, rate5, rate15, rate_mean }
    }

    pub fn same_as(&self, other: &Meter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
