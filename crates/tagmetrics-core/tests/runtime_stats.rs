//! Runtime statistics registration and capture.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tagmetrics_core::runtime::is_supported;
use tagmetrics_core::{Metric, Registry, StatsKind};

fn read_count(reg: &Registry, kind: StatsKind) -> u64 {
    match reg.get(kind.read_timer()) {
        Some(Metric::Timer(t)) => t.count(),
        other => panic!("missing read timer: {other:?}"),
    }
}

fn gauge(reg: &Registry, name: &str) -> i64 {
    match reg.get(name) {
        Some(Metric::Gauge(g)) => g.value(),
        other => panic!("missing gauge {name}: {other:?}"),
    }
}

#[test]
fn capture_kinds_advance_independently() {
    let reg = Registry::new();
    reg.register_runtime_stats();
    assert_eq!(read_count(&reg, StatsKind::Cpu), 0);

    reg.capture_runtime_stats(StatsKind::Cpu);
    reg.capture_runtime_stats(StatsKind::Cpu);
    reg.capture_runtime_stats(StatsKind::Memory);

    assert_eq!(read_count(&reg, StatsKind::Cpu), 2);
    assert_eq!(read_count(&reg, StatsKind::Memory), 1);

    let j: serde_json::Value = serde_json::from_slice(&reg.snapshot()).unwrap();
    assert!(j.get("runtime.cpu.read").is_some());
    assert!(j.get("runtime.mem.read").is_some());
}

#[test]
fn gauges_are_registered_only_where_readable() {
    let reg = Registry::new();
    reg.register_runtime_stats();
    for kind in [StatsKind::Cpu, StatsKind::Memory] {
        for name in kind.gauges() {
            assert_eq!(reg.contains(name), is_supported(), "{name}");
        }
    }
}

#[test]
fn memory_capture_reports_process_sizes() {
    if !is_supported() {
        return;
    }
    let reg = Registry::new();
    reg.capture_runtime_stats(StatsKind::Memory);

    let rss = gauge(&reg, "runtime.mem.rss_bytes");
    let virt = gauge(&reg, "runtime.mem.virtual_bytes");
    assert!(rss > 0, "rss={rss}");
    assert!(virt >= rss, "virtual={virt} rss={rss}");
}

#[test]
fn cpu_capture_fills_its_gauges_only() {
    if !is_supported() {
        return;
    }
    let reg = Registry::new();
    reg.capture_runtime_stats(StatsKind::Cpu);
    reg.capture_runtime_stats(StatsKind::Cpu);

    assert!(gauge(&reg, "runtime.cpu.usage_pct_x100") >= 0);
    assert!(gauge(&reg, "runtime.cpu.run_time_secs") >= 0);
    assert!(!reg.contains("runtime.mem.rss_bytes"));
}
