//! Process-wide, name-keyed store of instruments.
//!
//! Backed by `DashMap` so registration (binder), runtime capture (sampling
//! loop) and snapshot reads (flush callbacks) can run concurrently.
//!
//! Collision policy: [`Registry::register`] overwrites (last write wins, with a
//! warning), [`Registry::try_register`] rejects. Callers pick explicitly.

use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::metrics::{Gauge, Metric, Timer};
use crate::runtime::{self, ProcessReader, StatsKind};

static DEFAULT_REGISTRY: OnceLock<Arc<Registry>> = OnceLock::new();

#[derive(Debug, Default)]
pub struct Registry {
    metrics: DashMap<String, Metric>,
    process: ProcessReader,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide default registry, created on first use.
    ///
    /// Everything in tagmetrics takes a registry explicitly; this is only a
    /// convenience for hosts that want a single shared instance.
    pub fn shared_default() -> Arc<Registry> {
        Arc::clone(DEFAULT_REGISTRY.get_or_init(|| Arc::new(Registry::new())))
    }

    /// Bind `metric` under `name`, replacing any previous binding.
    /// Returns the replaced metric, if any.
    pub fn register(&self, name: impl Into<String>, metric: impl Into<Metric>) -> Option<Metric> {
        let name = name.into();
        let prev = self.metrics.insert(name.clone(), metric.into());
        if let Some(p) = &prev {
            tracing::warn!(metric = %name, previous_kind = p.kind().as_str(), "metric name re-registered, previous instrument replaced");
        }
        prev
    }

    /// Bind `metric` under `name` unless the name is already taken.
    pub fn try_register(&self, name: impl Into<String>, metric: impl Into<Metric>) -> Result<()> {
        match self.metrics.entry(name.into()) {
            Entry::Occupied(e) => Err(Error::DuplicateMetric(e.key().clone())),
            Entry::Vacant(v) => {
                v.insert(metric.into());
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Metric> {
        self.metrics.get(name).map(|r| r.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    pub fn unregister(&self, name: &str) -> Option<Metric> {
        self.metrics.remove(name).map(|(_, m)| m)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.metrics.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Existing gauge under `name`, or a freshly registered one.
    ///
    /// If `name` holds another kind, a detached gauge is returned and the
    /// existing binding is left alone.
    pub fn get_or_register_gauge(&self, name: &str) -> Gauge {
        match self.metrics.entry(name.to_string()) {
            Entry::Occupied(e) => match e.get() {
                Metric::Gauge(g) => g.clone(),
                other => {
                    tracing::warn!(metric = %name, kind = other.kind().as_str(), "expected a gauge");
                    Gauge::new()
                }
            },
            Entry::Vacant(v) => {
                let g = Gauge::new();
                v.insert(Metric::Gauge(g.clone()));
                g
            }
        }
    }

    /// Existing timer under `name`, or a freshly registered one.
    pub fn get_or_register_timer(&self, name: &str) -> Timer {
        match self.metrics.entry(name.to_string()) {
            Entry::Occupied(e) => match e.get() {
                Metric::Timer(t) => t.clone(),
                other => {
                    tracing::warn!(metric = %name, kind = other.kind().as_str(), "expected a timer");
                    Timer::new()
                }
            },
            Entry::Vacant(v) => {
                let t = Timer::new();
                v.insert(Metric::Timer(t.clone()));
                t
            }
        }
    }

    /// Register the instruments fed by [`Registry::capture_runtime_stats`].
    pub fn register_runtime_stats(&self) {
        runtime::register(self);
    }

    /// Sample one class of process-runtime statistics into the registry.
    pub fn capture_runtime_stats(&self, kind: StatsKind) {
        runtime::capture(self, &self.process, kind);
    }

    /// Every instrument's readable state keyed by name (keys sorted).
    pub fn snapshot_value(&self) -> Value {
        let mut out = Map::new();
        for r in self.metrics.iter() {
            out.insert(r.key().clone(), Value::Object(r.value().stats()));
        }
        Value::Object(out)
    }

    /// JSON serialization of [`Registry::snapshot_value`].
    pub fn snapshot(&self) -> Bytes {
        match serde_json::to_vec(&self.snapshot_value()) {
            Ok(buf) => Bytes::from(buf),
            Err(e) => {
                tracing::warn!(error = %e, "metrics snapshot serialization failed");
                Bytes::new()
            }
        }
    }
}
