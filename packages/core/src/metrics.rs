//! Prometheus metrics for the warning center.
//!
//! [`AppMetrics`] owns every registered metric and the [`Registry`] they
//! belong to. It is built once at startup, shared through `Arc`, and fed by
//! the HTTP layer: the services themselves never touch it.
//!
//! Exposed at `GET /metrics` in Prometheus text format.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};

pub struct AppMetrics {
    /// Warning events that produced at least one user row.
    pub warn_events_total: Counter,
    /// User rows written by fan-out.
    pub warn_rows_total: Counter,
    /// `save` calls that ended as a no-op.
    pub warn_noop_total: Counter,
    /// `save` calls that failed, including partial fan-outs.
    pub warn_failures_total: Counter,
    /// HTTP request count, labelled by method, path, and status code.
    pub http_requests_total: CounterVec,
    /// HTTP request latency histogram in seconds.
    pub http_request_duration: Histogram,
    pub registry: Registry,
}

impl AppMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let warn_events_total = Counter::with_opts(Opts::new(
            "mq_warn_events_total",
            "Warning events fanned out to users",
        ))?;

        let warn_rows_total = Counter::with_opts(Opts::new(
            "mq_warn_rows_total",
            "Per-user warning rows written",
        ))?;

        let warn_noop_total = Counter::with_opts(Opts::new(
            "mq_warn_noop_total",
            "Warning saves with no content or no recipients",
        ))?;

        let warn_failures_total = Counter::with_opts(Opts::new(
            "mq_warn_failures_total",
            "Warning saves that failed",
        ))?;

        let http_requests_total = CounterVec::new(
            Opts::new(
                "mq_warn_http_requests_total",
                "HTTP requests by method, path, and status",
            ),
            &["method", "path", "status"],
        )?;

        let http_request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "mq_warn_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(warn_events_total.clone()))?;
        registry.register(Box::new(warn_rows_total.clone()))?;
        registry.register(Box::new(warn_noop_total.clone()))?;
        registry.register(Box::new(warn_failures_total.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            warn_events_total,
            warn_rows_total,
            warn_noop_total,
            warn_failures_total,
            http_requests_total,
            http_request_duration,
            registry,
        })
    }

    /// Render all metrics as Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}

/// Middleware recording request count and latency per matched route.
pub async fn track_http(
    State(metrics): State<Arc<AppMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(request).await;

    metrics
        .http_request_duration
        .observe(started.elapsed().as_secs_f64());
    metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), path.as_str(), response.status().as_str()])
        .inc();

    response
}
