//! Name-path binder.
//!
//! Walks a schema once, derives a separator-joined name for every instrument
//! leaf, installs a fresh instrument into the field and registers it.
//!
//! Example: a `Timer` field `latency` inside a record `smtp` inside a record
//! `messages` is registered as `messages.smtp.latency` with separator `"."`.
//! A `HashMap<String, Box<Handler>>` field `handlers` holding key `"login"`
//! yields `handlers.login.<leaf>` for each leaf of that entry.
//!
//! Binding is static: map entries inserted later keep their detached default
//! instruments and never show up in the registry.

use serde::Deserialize;
use tagmetrics_core::{Counter, Gauge, Histogram, Meter, Metric, Registry, Timer};

use crate::schema::{FieldName, FieldVisitor, MetricSchema, Slot};

/// What to do when a derived name is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Last write wins.
    #[default]
    Overwrite,
    /// First registration is kept; the later field still gets a live, but
    /// unregistered, instrument.
    Reject,
}

/// Outcome of one binding pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindReport {
    /// Names registered by this pass, in visit order.
    pub registered: Vec<String>,
    /// Names that were already bound when this pass reached them.
    pub collisions: Vec<String>,
}

/// Bind `schema` into `registry` with the default [`DuplicatePolicy`].
pub fn bind(
    schema: &mut dyn MetricSchema,
    prefix: &str,
    separator: &str,
    registry: &Registry,
) -> BindReport {
    bind_with_policy(schema, prefix, separator, registry, DuplicatePolicy::default())
}

pub fn bind_with_policy(
    schema: &mut dyn MetricSchema,
    prefix: &str,
    separator: &str,
    registry: &Registry,
    policy: DuplicatePolicy,
) -> BindReport {
    let mut report = BindReport::default();
    let mut walker = PathWalker {
        prefix: prefix.to_string(),
        separator,
        registry,
        policy,
        report: &mut report,
    };
    schema.visit_fields(&mut walker);
    tracing::debug!(
        registered = report.registered.len(),
        collisions = report.collisions.len(),
        "metrics schema bound"
    );
    report
}

struct PathWalker<'a> {
    prefix: String,
    separator: &'a str,
    registry: &'a Registry,
    policy: DuplicatePolicy,
    report: &'a mut BindReport,
}

impl PathWalker<'_> {
    fn descend(&mut self, prefix: String, record: &mut dyn MetricSchema) {
        let mut child = PathWalker {
            prefix,
            separator: self.separator,
            registry: self.registry,
            policy: self.policy,
            report: &mut *self.report,
        };
        record.visit_fields(&mut child);
    }

    fn install(&mut self, name: String, metric: Metric) {
        tracing::trace!(metric = %name, kind = metric.kind().as_str(), "binding instrument");
        match self.policy {
            DuplicatePolicy::Overwrite => {
                if self.registry.register(name.clone(), metric).is_some() {
                    self.report.collisions.push(name.clone());
                }
                self.report.registered.push(name);
            }
            DuplicatePolicy::Reject => match self.registry.try_register(name.clone(), metric) {
                Ok(()) => self.report.registered.push(name),
                Err(e) => {
                    tracing::warn!(metric = %name, error = %e, "metric name collision, keeping first registration");
                    self.report.collisions.push(name);
                }
            },
        }
    }
}

impl FieldVisitor for PathWalker<'_> {
    fn visit(&mut self, field: FieldName, slot: Slot<'_>) {
        let segment = field.segment();
        let name = if self.prefix.is_empty() {
            segment.into_owned()
        } else {
            format!("{}{}{}", self.prefix, self.separator, segment)
        };

        match slot {
            Slot::Record(record) => self.descend(name, record),
            Slot::Keyed(map) => {
                map.for_each_record(&mut |key, record| {
                    let prefix = format!("{}{}{}", name, self.separator, key);
                    self.descend(prefix, record);
                });
            }
            Slot::Counter(c) => {
                *c = Counter::new();
                self.install(name, Metric::Counter(c.clone()));
            }
            Slot::Gauge(g) => {
                *g = Gauge::new();
                self.install(name, Metric::Gauge(g.clone()));
            }
            Slot::Meter(m) => {
                *m = Meter::new();
                self.install(name, Metric::Meter(m.clone()));
            }
            Slot::Histogram(h) => {
                *h = Histogram::new();
                self.install(name, Metric::Histogram(h.clone()));
            }
            Slot::Timer(t) => {
                *t = Timer::new();
                self.install(name, Metric::Timer(t.clone()));
            }
            Slot::Ignored => {
                tracing::trace!(field = field.ident, path = %name, "skipping non-metric field");
            }
        }
    }
}
