use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;

/// Reservoir size of the uniform sample backing every histogram.
pub const SAMPLE_SIZE: usize = 1028;

/// Uniform reservoir (Vitter's Algorithm R).
#[derive(Debug, Default)]
struct UniformSample {
    count: u64,
    values: Vec<i64>,
}

impl UniformSample {
    fn update(&mut self, v: i64) {
        self.count += 1;
        if self.values.len() < SAMPLE_SIZE {
            self.values.push(v);
            return;
        }
        let r = rand::thread_rng().gen_range(0..self.count);
        if (r as usize) < SAMPLE_SIZE {
            self.values[r as usize] = v;
        }
    }
}

/// Point-in-time distribution statistics of a [`Histogram`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub stddev: f64,
    pub median: f64,
    pub p75: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
}

/// Distribution of sampled values.
#[derive(Clone, Default)]
pub struct Histogram {
    sample: Arc<Mutex<UniformSample>>,
}

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Histogram").field("count", &self.count()).finish()
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, v: i64) {
        self.sample.lock().update(v);
    }

    /// Total number of updates, not just the ones still held in the reservoir.
    pub fn count(&self) -> u64 {
        self.sample.lock().count
    }

    /// Clear all samples.
    pub fn clear(&self) {
        let mut s = self.sample.lock();
        s.count = 0;
        s.values.clear();
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        let (count, mut values) = {
            let s = self.sample.lock();
            (s.count, s.values.clone())
        };
        if values.is_empty() {
            return HistogramSnapshot { count, ..HistogramSnapshot::default() };
        }
        values.sort_unstable();

        let n = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        HistogramSnapshot {
            count,
            min: values[0],
            max: values[values.len() - 1],
            mean,
            stddev: variance.sqrt(),
            median: percentile(&values, 0.5),
            p75: percentile(&values, 0.75),
            p95: percentile(&values, 0.95),
            p99: percentile(&values, 0.99),
            p999: percentile(&values, 0.999),
        }
    }

    pub fn same_as(&self, other: &Histogram) -> bool {
        Arc::ptr_eq(&self.sample, &other.sample)
    }
}

/// Linear interpolation at position `p * (n + 1)` over sorted values.
fn percentile(sorted: &[i64], p: f64) -> f64 {
    let len = sorted.len();
    let pos = p * (len as f64 + 1.0);
    if pos < 1.0 {
        sorted[0] as f64
    } else if pos >= len as f64 {
        sorted[len - 1] as f64
    } else {
        let idx = pos as usize;
        let lower = sorted[idx - 1] as f64;
        let upper = sorted[idx] as f64;
        lower + (pos - pos.floor()) * (upper - lower)
    }
}
