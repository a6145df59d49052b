//! Registry collision policy and JSON snapshots.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tagmetrics_core::{Counter, Gauge, Metric, Registry, Timer};

fn parse(reg: &Registry) -> Value {
    serde_json::from_slice(&reg.snapshot()).expect("snapshot must be valid json")
}

#[test]
fn register_overwrites_and_returns_previous() {
    let reg = Registry::new();
    let first = Counter::new();
    let second = Counter::new();
    assert!(reg.register("requests", first.clone()).is_none());

    let prev = reg.register("requests", second.clone()).expect("previous binding");
    match prev {
        Metric::Counter(c) => assert!(c.same_as(&first)),
        other => panic!("unexpected {other:?}"),
    }
    match reg.get("requests").unwrap() {
        Metric::Counter(c) => assert!(c.same_as(&second)),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(reg.len(), 1);
}

#[test]
fn try_register_rejects_duplicates() {
    let reg = Registry::new();
    reg.try_register("latency", Timer::new()).unwrap();
    let err = reg.try_register("latency", Counter::new()).expect_err("must reject");
    assert_eq!(err.code(), "DUPLICATE_METRIC");
    assert!(matches!(reg.get("latency"), Some(Metric::Timer(_))));
}

#[test]
fn names_are_sorted_and_unregister_removes() {
    let reg = Registry::new();
    reg.register("b", Counter::new());
    reg.register("a", Gauge::new());
    reg.register("c", Counter::new());
    assert_eq!(reg.names(), vec!["a", "b", "c"]);

    assert!(reg.unregister("b").is_some());
    assert!(!reg.contains("b"));
    assert_eq!(reg.len(), 2);
}

#[test]
fn get_or_register_reuses_existing_gauge() {
    let reg = Registry::new();
    let g = reg.get_or_register_gauge("queue.depth");
    g.update(7);
    assert_eq!(reg.get_or_register_gauge("queue.depth").value(), 7);

    reg.register("busy", Counter::new());
    let detached = reg.get_or_register_gauge("busy");
    detached.update(1);
    assert!(matches!(reg.get("busy"), Some(Metric::Counter(_))));
}

#[test]
fn snapshot_reflects_updates() {
    let reg = Registry::new();
    let c = Counter::new();
    let t = Timer::new();
    reg.register("hits", c.clone());
    reg.register("latency", t.clone());

    c.inc(1);
    c.inc(2);
    t.update(Duration::from_millis(1));

    let j = parse(&reg);
    assert_eq!(j["hits"]["count"].as_i64(), Some(3));
    assert_eq!(j["latency"]["count"].as_u64(), Some(1));
    assert_eq!(j["latency"]["max"].as_i64(), Some(1_000_000));
}

#[test]
fn empty_registry_snapshot_is_empty_object() {
    let reg = Registry::new();
    assert!(reg.is_empty());
    assert_eq!(parse(&reg), serde_json::json!({}));
}

#[test]
fn shared_default_is_a_single_instance() {
    let a = Registry::shared_default();
    let b = Registry::shared_default();
    assert!(Arc::ptr_eq(&a, &b));
}
