//! Process-runtime statistics.
//!
//! Two independently sampled classes:
//! - [`StatsKind::Cpu`]: CPU usage and run time. Cheap.
//! - [`StatsKind::Memory`]: resident and virtual sizes in bytes.
//!
//! Values come from `sysinfo`. On platforms it does not support no gauges are
//! registered and only the `*.read` timer advances, so capture cadence stays
//! observable everywhere.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use sysinfo::{Pid, System};

use crate::registry::Registry;

const CPU_USAGE: &str = "runtime.cpu.usage_pct_x100";
const CPU_RUN_TIME: &str = "runtime.cpu.run_time_secs";
const MEM_RSS: &str = "runtime.mem.rss_bytes";
const MEM_VIRTUAL: &str = "runtime.mem.virtual_bytes";

/// The two classes of runtime statistics sampled on their own cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsKind {
    Cpu,
    Memory,
}

impl StatsKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatsKind::Cpu => "cpu",
            StatsKind::Memory => "mem",
        }
    }

    /// Name of the timer recording each capture of this kind.
    pub fn read_timer(self) -> &'static str {
        match self {
            StatsKind::Cpu => "runtime.cpu.read",
            StatsKind::Memory => "runtime.mem.read",
        }
    }

    /// Gauge names fed by a capture of this kind.
    pub fn gauges(self) -> &'static [&'static str] {
        match self {
            StatsKind::Cpu => &[CPU_USAGE, CPU_RUN_TIME],
            StatsKind::Memory => &[MEM_RSS, MEM_VIRTUAL],
        }
    }

    fn readings(self, s: &ProcessSample) -> [(&'static str, i64); 2] {
        match self {
            // percent of one core, two decimals kept
            StatsKind::Cpu => [
                (CPU_USAGE, (f64::from(s.cpu_usage) * 100.0).round() as i64),
                (CPU_RUN_TIME, clamp(s.run_time)),
            ],
            StatsKind::Memory => [(MEM_RSS, clamp(s.memory)), (MEM_VIRTUAL, clamp(s.virtual_memory))],
        }
    }
}

/// Whether process statistics can be read on this platform.
pub fn is_supported() -> bool {
    sysinfo::IS_SUPPORTED_SYSTEM
}

#[derive(Debug, Clone, Copy)]
struct ProcessSample {
    cpu_usage: f32,
    run_time: u64,
    memory: u64,
    virtual_memory: u64,
}

/// Stateful reader for the current process.
///
/// `sysinfo` computes CPU usage from the delta between two refreshes, so the
/// same `System` is kept across captures.
pub(crate) struct ProcessReader {
    system: Mutex<System>,
    pid: Option<Pid>,
    cpu_warned: AtomicBool,
    mem_warned: AtomicBool,
}

impl Default for ProcessReader {
    fn default() -> Self {
        Self {
            system: Mutex::new(System::new()),
            pid: sysinfo::get_current_pid().ok(),
            cpu_warned: AtomicBool::new(false),
            mem_warned: AtomicBool::new(false),
        }
    }
}

impl fmt::Debug for ProcessReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessReader").field("pid", &self.pid).finish()
    }
}

impl ProcessReader {
    fn sample(&self) -> Option<ProcessSample> {
        if !is_supported() {
            return None;
        }
        let pid = self.pid?;
        let mut sys = self.system.lock();
        if !sys.refresh_process(pid) {
            return None;
        }
        sys.process(pid).map(|p| ProcessSample {
            cpu_usage: p.cpu_usage(),
            run_time: p.run_time(),
            memory: p.memory(),
            virtual_memory: p.virtual_memory(),
        })
    }

    fn warned(&self, kind: StatsKind) -> &AtomicBool {
        match kind {
            StatsKind::Cpu => &self.cpu_warned,
            StatsKind::Memory => &self.mem_warned,
        }
    }
}

pub(crate) fn register(registry: &Registry) {
    for kind in [StatsKind::Cpu, StatsKind::Memory] {
        registry.get_or_register_timer(kind.read_timer());
        if is_supported() {
            for name in kind.gauges() {
                registry.get_or_register_gauge(name);
            }
        }
    }
}

pub(crate) fn capture(registry: &Registry, reader: &ProcessReader, kind: StatsKind) {
    let start = Instant::now();

    match reader.sample() {
        Some(sample) => {
            for (name, value) in kind.readings(&sample) {
                registry.get_or_register_gauge(name).update(value);
            }
        }
        None => {
            if !reader.warned(kind).swap(true, Ordering::Relaxed) {
                tracing::warn!(kind = kind.as_str(), pid = ?reader.pid, "process stats unavailable");
            }
        }
    }

    registry.get_or_register_timer(kind.read_timer()).update_since(start);
    tracing::debug!(kind = kind.as_str(), "runtime stats captured");
}

fn clamp(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
