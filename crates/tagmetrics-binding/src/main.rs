//! tagmetrics demo host.
//!
//! Binds a small service schema, simulates traffic, and logs the JSON
//! snapshot on every flush until Ctrl-C. Config is read from the path in
//! `TAGMETRICS_CONFIG` when set, defaults otherwise.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use tagmetrics_binding::{
    config, metric_schema, Counter, Gauge, Histogram, Meter, MetricTags, Registry, TagsConfig,
    Timer,
};

metric_schema! {
    #[derive(Default)]
    struct HandlerMetrics {
        calls: Counter,
        latency: Timer,
    }
}

metric_schema! {
    #[derive(Default)]
    struct HttpMetrics {
        requests: Meter => "requests",
        in_flight: Gauge => "in_flight",
        body_bytes: Histogram => "body_bytes",
    }
}

metric_schema! {
    #[derive(Default)]
    struct ServiceMetrics {
        http: HttpMetrics,
        handlers: HashMap<String, Box<HandlerMetrics>>,
        errors: Counter,
        instance: String,
    }
}

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cfg = match std::env::var("TAGMETRICS_CONFIG") {
        Ok(path) => config::load_from_file(&path).expect("config load failed"),
        Err(_) => TagsConfig::default(),
    };

    let mut metrics = ServiceMetrics {
        instance: "demo-1".into(),
        ..ServiceMetrics::default()
    };
    for route in ["index", "login"] {
        metrics.handlers.insert(route.to_string(), Box::default());
    }

    let registry = Arc::new(Registry::new());
    let reg = Arc::clone(&registry);
    let flush = move || {
        let snapshot = reg.snapshot();
        tracing::info!(bytes = snapshot.len(), snapshot = %String::from_utf8_lossy(&snapshot), "metrics flush");
    };

    let mut tags = MetricTags::from_config(&mut metrics, flush, &cfg, Arc::clone(&registry));
    tracing::info!(instance = %metrics.instance, instruments = tags.bind_report().registered.len(), "schema bound");
    tags.start().expect("sampling loop start failed");

    let metrics = Arc::new(metrics);
    let traffic = {
        let metrics = Arc::clone(&metrics);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_millis(50));
            let mut n: i64 = 0;
            loop {
                tick.tick().await;
                n += 1;
                let route = if n % 3 == 0 { "login" } else { "index" };
                metrics.http.requests.mark(1);
                metrics.http.in_flight.update(n % 7);
                metrics.http.body_bytes.update(128 + (n % 11) * 64);
                if let Some(h) = metrics.handlers.get(route) {
                    h.calls.inc(1);
                    h.latency.update(Duration::from_micros(200 + (n % 5) as u64 * 100));
                }
                if n % 17 == 0 {
                    metrics.errors.inc(1);
                }
            }
        })
    };

    let _ = tokio::signal::ctrl_c().await;
    traffic.abort();
    tags.stop().await.expect("sampling loop stop failed");
}
