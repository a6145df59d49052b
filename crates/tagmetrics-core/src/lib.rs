//! tagmetrics core: instruments, the name-keyed registry, runtime statistics
//! capture and snapshot serialization.
//!
//! This crate is the collaborator the binder and the sampling loop talk to. It
//! intentionally carries no async runtime dependency so instruments can be
//! updated from any thread or executor.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Instruments are updated on application hot paths and must never bring the
//! host process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metrics;
pub mod registry;
pub mod runtime;

/// Shared result type.
pub use error::{Error, Result};
pub use metrics::{Counter, Gauge, Histogram, Meter, Metric, MetricKind, Timer};
pub use registry::Registry;
pub use runtime::StatsKind;
