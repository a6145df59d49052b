//! Metric instruments.
//!
//! Every instrument is a cheap-to-clone handle around shared state, so the
//! registry and the schema field that receives it during binding observe the
//! same values. Updates are lock-free atomics for counters and gauges; sampled
//! instruments (meter, histogram, timer) take a short `parking_lot` lock.
//!
//! Snapshot keys are stable per kind and mirror what downstream consumers of
//! the JSON snapshot expect:
//!
//! | kind      | keys |
//! |-----------|------|
//! | counter   | `count` |
//! | gauge     | `value` |
//! | meter     | `count`, `1m.rate`, `5m.rate`, `15m.rate`, `mean.rate` |
//! | histogram | `count`, `min`, `max`, `mean`, `stddev`, `median`, `75%`, `95%`, `99%`, `99.9%` |
//! | timer     | histogram keys (nanoseconds) plus meter rate keys |

mod counter;
mod gauge;
mod histogram;
mod meter;
mod timer;

use serde_json::{Map, Value};

pub use counter::Counter;
pub use gauge::Gauge;
pub use histogram::{Histogram, HistogramSnapshot, SAMPLE_SIZE};
pub use meter::{Meter, MeterSnapshot};
pub use timer::Timer;

/// The five instrument kinds a schema field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Meter,
    Histogram,
    Timer,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Meter => "meter",
            MetricKind::Histogram => "histogram",
            MetricKind::Timer => "timer",
        }
    }
}

/// A registered instrument of any kind.
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Counter),
    Gauge(Gauge),
    Meter(Meter),
    Histogram(Histogram),
    Timer(Timer),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Meter(_) => MetricKind::Meter,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Timer(_) => MetricKind::Timer,
        }
    }

    /// Current readable state as a `stat -> number` JSON object.
    pub fn stats(&self) -> Map<String, Value> {
        let mut out = Map::new();
        match self {
            Metric::Counter(c) => {
                out.insert("count".into(), c.count().into());
            }
            Metric::Gauge(g) => {
                out.insert("value".into(), g.value().into());
            }
            Metric::Meter(m) => write_meter(&m.snapshot(), &mut out),
            Metric::Histogram(h) => write_histogram(&h.snapshot(), &mut out),
            Metric::Timer(t) => {
                let (hist, meter) = t.snapshot();
                write_histogram(&hist, &mut out);
                write_rates(&meter, &mut out);
            }
        }
        out
    }
}

fn write_meter(s: &MeterSnapshot, out: &mut Map<String, Value>) {
    out.insert("count".into(), s.count.into());
    write_rates(s, out);
}

fn write_rates(s: &MeterSnapshot, out: &mut Map<String, Value>) {
    out.insert("1m.rate".into(), s.rate1.into());
    out.insert("5m.rate".into(), s.rate5.into());
    out.insert("15m.rate".into(), s.rate15.into());
    out.insert("mean.rate".into(), s.rate_mean.into());
}

fn write_histogram(s: &HistogramSnapshot, out: &mut Map<String, Value>) {
    out.insert("count".into(), s.count.into());
    out.insert("min".into(), s.min.into());
    out.insert("max".into(), s.max.into());
    out.insert("mean".into(), s.mean.into());
    out.insert("stddev".into(), s.stddev.into());
    out.insert("median".into(), s.median.into());
    out.insert("75%".into(), s.p75.into());
    out.insert("95%".into(), s.p95.into());
    out.insert("99%".into(), s.p99.into());
    out.insert("99.9%".into(), s.p999.into());
}

macro_rules! impl_from_instrument {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Metric {
                fn from(m: $ty) -> Self {
                    Metric::$ty(m)
                }
            }
        )*
    };
}

impl_from_instrument!(Counter, Gauge, Meter, Histogram, Timer);
