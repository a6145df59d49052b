//! Sampling loop cadence and stop handshake, on paused tokio time.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tagmetrics_binding::{metric_schema, Counter, Metric, MetricTags, Registry, StatsKind};

metric_schema! {
    #[derive(Default)]
    struct Small {
        hits: Counter,
    }
}

fn counting_tags(flush_interval: Duration) -> (MetricTags, Arc<AtomicUsize>, Arc<Registry>) {
    let registry = Arc::new(Registry::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let mut schema = Small::default();
    let tags = MetricTags::new(
        &mut schema,
        move || {
            seen.fetch_add(1, Ordering::SeqCst);
        },
        flush_interval,
        Arc::clone(&registry),
        ".",
    );
    (tags, calls, registry)
}

fn reads(registry: &Registry, kind: StatsKind) -> u64 {
    match registry.get(kind.read_timer()) {
        Some(Metric::Timer(t)) => t.count(),
        other => panic!("missing read timer: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn flush_runs_after_one_interval() {
    let (mut tags, calls, _) = counting_tags(Duration::from_millis(100));
    tags.start().unwrap();
    assert!(tags.is_running());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(calls.load(Ordering::SeqCst) >= 1);

    tags.stop().await.unwrap();
    assert!(!tags.is_running());
}

#[tokio::test(start_paused = true)]
async fn stop_flushes_exactly_once_more() {
    let (mut tags, calls, _) = counting_tags(Duration::from_secs(3600));
    tags.start().unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tags.stop().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_a_running_handle_flushes_once() {
    let (mut tags, calls, _) = counting_tags(Duration::from_secs(3600));
    tags.start().unwrap();
    drop(tags);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(7200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn runtime_stat_cadences_are_independent() {
    let (mut tags, _, registry) = counting_tags(Duration::from_millis(100));
    tags.stats_cpu_interval = Duration::from_millis(10);
    tags.stats_mem_interval = Duration::from_secs(1);
    tags.start().unwrap();

    tokio::time::sleep(Duration::from_millis(2050)).await;
    tags.stop().await.unwrap();

    let cpu = reads(&registry, StatsKind::Cpu);
    let mem = reads(&registry, StatsKind::Memory);
    assert!(cpu >= 150, "cpu reads: {cpu}");
    assert!((1..=3).contains(&mem), "mem reads: {mem}");
}

#[tokio::test(start_paused = true)]
async fn slow_flush_does_not_starve_sampling() {
    let (mut tags, calls, registry) = counting_tags(Duration::from_secs(3600));
    tags.stats_cpu_interval = Duration::from_millis(50);
    tags.stats_mem_interval = Duration::from_millis(50);
    tags.start().unwrap();

    tokio::time::sleep(Duration::from_millis(520)).await;
    assert!(reads(&registry, StatsKind::Cpu) >= 5);
    assert!(reads(&registry, StatsKind::Memory) >= 5);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    tags.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn lifecycle_misuse_is_reported() {
    let (mut tags, calls, _) = counting_tags(Duration::from_secs(1));

    let err = tags.stop().await.expect_err("not started");
    assert_eq!(err.code(), "NOT_RUNNING");

    tags.start().unwrap();
    let err = tags.start().expect_err("already running");
    assert_eq!(err.code(), "ALREADY_STARTED");

    tags.stop().await.unwrap();
    let err = tags.stop().await.expect_err("already stopped");
    assert_eq!(err.code(), "NOT_RUNNING");
    let err = tags.start().expect_err("stopped is terminal");
    assert_eq!(err.code(), "ALREADY_STARTED");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_rejected() {
    let (mut tags, _, _) = counting_tags(Duration::from_secs(1));
    tags.stats_mem_interval = Duration::ZERO;
    let err = tags.start().expect_err("zero interval");
    assert_eq!(err.code(), "CONFIG");
    assert!(!tags.is_running());
}

#[tokio::test(start_paused = true)]
async fn panicking_flush_does_not_halt_the_loop() {
    let registry = Arc::new(Registry::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let mut schema = Small::default();
    let mut tags = MetricTags::new(
        &mut schema,
        move || {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("backend unavailable");
            }
        },
        Duration::from_millis(100),
        registry,
        ".",
    );
    tags.start().unwrap();

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(calls.load(Ordering::SeqCst) >= 3);

    tags.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn start_registers_runtime_stats() {
    let (mut tags, _, registry) = counting_tags(Duration::from_secs(1));
    assert!(!registry.contains("runtime.cpu.read"));
    tags.start().unwrap();
    assert!(registry.contains("runtime.cpu.read"));
    assert!(registry.contains("runtime.mem.read"));
    assert_eq!(registry.contains("runtime.mem.rss_bytes"), tagmetrics_core::runtime::is_supported());
    assert!(registry.contains("hits"));
    tags.stop().await.unwrap();
}

#[test]
fn start_outside_a_runtime_fails() {
    let (mut tags, _, _) = counting_tags(Duration::from_secs(1));
    let err = tags.start().expect_err("no runtime");
    assert_eq!(err.code(), "INTERNAL");
}
