//! Top-level facade crate for tagmetrics.
//!
//! Re-exports the core registry/instruments and the binding library so users
//! can depend on a single crate.

pub mod core {
    pub use tagmetrics_core::*;
}

pub mod binding {
    pub use tagmetrics_binding::*;
}

pub use tagmetrics_binding::{
    bind, metric_schema, BindReport, Counter, DuplicatePolicy, Error, Gauge, Histogram, Meter,
    MetricSchema, MetricTags, Registry, Result, StatsKind, TagsConfig, Timer,
};
