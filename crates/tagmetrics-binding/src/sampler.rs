//! Background sampling loop.
//!
//! Three independent cadences share one task: CPU stats, memory stats and
//! flush. Each has its own interval whose first tick lands one period after
//! start, so a slow flush never starves stat sampling and vice versa.
//!
//! Stop handshake: the owner fires `stop_rx` and then awaits the task's
//! `JoinHandle`. The task flushes one final time before returning, so the
//! owner never observes completion before that flush.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tagmetrics_core::{Registry, StatsKind};
use tokio::sync::oneshot;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Caller-supplied flush callback.
pub type FlushFn = Arc<dyn Fn() + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Cadence {
    pub flush: Duration,
    pub cpu: Duration,
    pub mem: Duration,
}

fn ticker(start: Instant, period: Duration) -> Interval {
    let mut tick = time::interval_at(start + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tick
}

/// Invoke the callback. A panic is logged and swallowed so the next cadence
/// still runs.
fn flush_once(flush: &FlushFn) {
    if panic::catch_unwind(AssertUnwindSafe(|| (flush.as_ref())())).is_err() {
        tracing::warn!("metrics flush callback panicked");
    }
}

pub(crate) async fn run(
    registry: Arc<Registry>,
    flush: FlushFn,
    cadence: Cadence,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let start = Instant::now();
    let mut flush_tick = ticker(start, cadence.flush);
    let mut cpu_tick = ticker(start, cadence.cpu);
    let mut mem_tick = ticker(start, cadence.mem);

    loop {
        tokio::select! {
            biased;

            // stop requested, or the owning handle was dropped
            _ = &mut stop_rx => {
                flush_once(&flush);
                tracing::debug!("final metrics flush done");
                break;
            }

            _ = cpu_tick.tick() => registry.capture_runtime_stats(StatsKind::Cpu),

            _ = mem_tick.tick() => registry.capture_runtime_stats(StatsKind::Memory),

            _ = flush_tick.tick() => {
                tracing::debug!("metrics flush");
                flush_once(&flush);
            }
        }
    }
}
