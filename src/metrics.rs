use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, TextEncoder,
};

fn register<C: prometheus::core::Collector + Clone + 'static>(collector: C, name: &str) -> C {
    if let Err(e) = prometheus::default_registry().register(Box::new(collector.clone())) {
        tracing::warn!(metric = name, error = %e, "metric registration failed");
    }
    collector
}

pub static RELAY_SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new(
        "pair_relay_sessions_active",
        "Relay sessions currently registered",
    )
    .expect("valid metric definition");
    register(gauge, "pair_relay_sessions_active")
});

pub static MESSAGES_PERSISTED: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "pair_relay_messages_persisted_total",
        "Inbound messages durably stored",
    )
    .expect("valid metric definition");
    register(counter, "pair_relay_messages_persisted_total")
});

pub static MESSAGES_FORWARDED: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "pair_relay_messages_forwarded_total",
        "Messages handed to a live counterpart conduit",
    )
    .expect("valid metric definition");
    register(counter, "pair_relay_messages_forwarded_total")
});

pub static FORWARD_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "pair_relay_forward_dropped_total",
            "Persisted messages that skipped live delivery",
        ),
        &["reason"],
    )
    .expect("valid metric definition");
    register(counter, "pair_relay_forward_dropped_total")
});

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "pair_relay_http_requests_total",
            "Total HTTP requests handled by pair-relay-service",
        ),
        &["method", "path", "status"],
    )
    .expect("valid metric definition");
    register(counter, "pair_relay_http_requests_total")
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "pair_relay_http_request_duration_seconds",
            "HTTP request latencies for pair-relay-service",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
        ]),
        &["method", "path", "status"],
    )
    .expect("valid metric definition");
    register(histogram, "pair_relay_http_request_duration_seconds")
});

pub async fn track_http_metrics(req: Request<Body>, next: Next) -> Response {
    let method = req.method().as_str().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path, &status])
        .observe(start.elapsed().as_secs_f64());

    response
}

pub async fn metrics_handler() -> Response {
    // Touch the relay collectors so they show up before the first session.
    Lazy::force(&RELAY_SESSIONS_ACTIVE);
    Lazy::force(&MESSAGES_PERSISTED);
    Lazy::force(&MESSAGES_FORWARDED);
    Lazy::force(&FORWARD_DROPPED);

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&prometheus::gather(), &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
    }

    (
        [(axum::http::header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}
