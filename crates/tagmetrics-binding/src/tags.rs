//! `MetricTags`: binds a schema on construction and owns the sampling loop.
//!
//! Lifecycle is `Idle -> Running -> Stopped`; `Stopped` is terminal.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tagmetrics_core::error::{Error, Result};
use tagmetrics_core::Registry;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::binder::{bind_with_policy, BindReport, DuplicatePolicy};
use crate::config::{duration_ms, TagsConfig};
use crate::sampler::{self, Cadence, FlushFn};
use crate::schema::MetricSchema;

/// How often CPU stats are sampled unless overridden. Each sample refreshes
/// the process entry, cheap but not free.
pub const DEFAULT_STATS_CPU_INTERVAL: Duration = Duration::from_secs(60);
/// How often memory stats are sampled unless overridden.
pub const DEFAULT_STATS_MEM_INTERVAL: Duration = Duration::from_secs(5 * 60);

enum LoopState {
    Idle,
    Running {
        stop_tx: oneshot::Sender<()>,
        task: JoinHandle<()>,
    },
    Stopped,
}

pub struct MetricTags {
    registry: Arc<Registry>,
    flush: FlushFn,
    flush_interval: Duration,
    separator: String,
    report: BindReport,
    state: LoopState,
    /// CPU stats sampling interval. Set before [`MetricTags::start`].
    pub stats_cpu_interval: Duration,
    /// Memory stats sampling interval. Set before [`MetricTags::start`].
    pub stats_mem_interval: Duration,
}

impl MetricTags {
    /// Bind `schema` into `registry` (last write wins on name collisions) and
    /// return an idle handle. `flush` runs every `flush_interval` once started.
    pub fn new<S, F>(
        schema: &mut S,
        flush: F,
        flush_interval: Duration,
        registry: Arc<Registry>,
        separator: &str,
    ) -> Self
    where
        S: MetricSchema,
        F: Fn() + Send + Sync + 'static,
    {
        Self::bind_new(schema, Arc::new(flush), flush_interval, registry, separator, DuplicatePolicy::Overwrite)
    }

    /// Like [`MetricTags::new`], with separator, intervals and collision policy
    /// taken from a validated config.
    pub fn from_config<S, F>(schema: &mut S, flush: F, cfg: &TagsConfig, registry: Arc<Registry>) -> Self
    where
        S: MetricSchema,
        F: Fn() + Send + Sync + 'static,
    {
        let mut tags = Self::bind_new(
            schema,
            Arc::new(flush),
            cfg.flush_interval(),
            registry,
            &cfg.separator,
            cfg.duplicate_policy,
        );
        tags.stats_cpu_interval = cfg.stats.cpu_interval();
        tags.stats_mem_interval = cfg.stats.mem_interval();
        tags
    }

    fn bind_new<S: MetricSchema>(
        schema: &mut S,
        flush: FlushFn,
        flush_interval: Duration,
        registry: Arc<Registry>,
        separator: &str,
        policy: DuplicatePolicy,
    ) -> Self {
        let report = bind_with_policy(schema, "", separator, &registry, policy);
        Self {
            registry,
            flush,
            flush_interval,
            separator: separator.to_string(),
            report,
            state: LoopState::Idle,
            stats_cpu_interval: DEFAULT_STATS_CPU_INTERVAL,
            stats_mem_interval: DEFAULT_STATS_MEM_INTERVAL,
        }
    }

    /// Register the runtime stats instruments and spawn the sampling loop on
    /// the current tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if !matches!(self.state, LoopState::Idle) {
            return Err(Error::AlreadyStarted);
        }
        let cadence = Cadence {
            flush: self.flush_interval,
            cpu: self.stats_cpu_interval,
            mem: self.stats_mem_interval,
        };
        if cadence.flush.is_zero() || cadence.cpu.is_zero() || cadence.mem.is_zero() {
            return Err(Error::Config("sampling intervals must be non-zero".into()));
        }
        let rt = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Internal(format!("no tokio runtime: {e}")))?;

        self.registry.register_runtime_stats();

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = rt.spawn(sampler::run(
            Arc::clone(&self.registry),
            Arc::clone(&self.flush),
            cadence,
            stop_rx,
        ));
        self.state = LoopState::Running { stop_tx, task };

        tracing::info!(
            flush_ms = duration_ms(cadence.flush),
            cpu_ms = duration_ms(cadence.cpu),
            mem_ms = duration_ms(cadence.mem),
            "metrics sampling loop started"
        );
        Ok(())
    }

    /// Signal the loop to stop and wait until its final flush has completed.
    ///
    /// There is no timeout: a flush callback that never returns makes this
    /// never return either.
    pub async fn stop(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, LoopState::Stopped) {
            LoopState::Running { stop_tx, task } => {
                let _ = stop_tx.send(());
                if let Err(e) = task.await {
                    tracing::warn!(error = %e, "metrics sampling loop ended abnormally");
                }
                tracing::info!("metrics sampling loop stopped");
                Ok(())
            }
            other => {
                self.state = other;
                Err(Error::NotRunning)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    /// JSON snapshot of every instrument in the registry.
    pub fn snapshot(&self) -> Bytes {
        self.registry.snapshot()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn bind_report(&self) -> &BindReport {
        &self.report
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }
}
