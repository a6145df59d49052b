//! tagmetrics binding library.
//!
//! Binds a caller-owned metrics struct to named instruments in a
//! [`Registry`], deriving every name from the struct's shape, and runs the
//! background loop that samples runtime stats and calls the flush callback.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tagmetrics_binding::{metric_schema, Counter, MetricTags, Registry};
//!
//! metric_schema! {
//!     #[derive(Default)]
//!     pub struct Smtp {
//!         pub sent: Counter,
//!     }
//! }
//!
//! # async fn demo() -> tagmetrics_binding::Result<()> {
//! let registry = Arc::new(Registry::new());
//! let mut metrics = Smtp::default();
//! let reg = Arc::clone(&registry);
//! let mut tags = MetricTags::new(
//!     &mut metrics,
//!     move || { let _ = reg.snapshot(); },
//!     Duration::from_secs(10),
//!     Arc::clone(&registry),
//!     ".",
//! );
//! tags.start()?;
//! metrics.sent.inc(1);
//! tags.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod config;
pub mod schema;
pub mod tags;

mod sampler;

pub use binder::{bind, bind_with_policy, BindReport, DuplicatePolicy};
pub use config::TagsConfig;
pub use sampler::FlushFn;
pub use schema::{FieldName, FieldVisitor, MetricField, MetricSchema, RecordMap, Slot};
pub use tags::{MetricTags, DEFAULT_STATS_CPU_INTERVAL, DEFAULT_STATS_MEM_INTERVAL};

pub use tagmetrics_core::{
    Counter, Error, Gauge, Histogram, Meter, Metric, MetricKind, Registry, Result, StatsKind, Timer,
};
