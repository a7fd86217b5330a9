// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics module
//!
//! Provides global metrics using the default Prometheus registry via macros and
//! an Axum-compatible metrics handler.

use std::sync::LazyLock;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder, register_histogram_vec,
    register_int_counter, register_int_counter_vec,
};

/// Total number of API requests received, labeled by route and status class.
pub static REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "poap_gallery_requests_total",
        "Total number of API requests, labeled by route and status class",
        &["route", "status"]
    )
    .expect("Failed to create poap_gallery_requests_total counter vec")
});

/// Histogram for gallery operation durations in seconds.
pub static OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "poap_gallery_operation_duration",
        "Gallery operation durations in seconds",
        &["operation", "result"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to create operation duration histogram")
});

/// Histogram for upstream requests spent assembling one index page.
pub static PAGINATION_ITERATIONS: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "poap_gallery_pagination_iterations",
        "Upstream requests per assembled index page",
        &["source"],
        vec![1.0, 2.0, 3.0, 5.0, 8.0, 10.0]
    )
    .expect("Failed to create pagination iterations histogram")
});

/// CSV exports by final enrichment status
pub static ENRICHMENT_OUTCOMES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "poap_gallery_enrichment_outcomes_total",
        "CSV exports by final enrichment status",
        &["status"]
    )
    .expect("Failed to create enrichment outcomes counter vec")
});

/// Activity feeds served with at least one failed chain
pub static PARTIAL_ACTIVITY: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "poap_gallery_partial_activity_total",
        "Activity feeds served with at least one failed chain"
    )
    .expect("Failed to create partial activity counter")
});

/// Increment the requests counter
///
/// # Arguments
/// * `route` - Matched route template
/// * `status` - Response status code
pub fn inc_requests(route: &str, status: StatusCode) {
    let class = match status.as_u16() {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    };
    REQUESTS.with_label_values(&[route, class]).inc();
}

/// Observe the duration of a gallery operation
///
/// # Arguments
/// * `operation` - Operation name
/// * `result` - `ok` or `error`
/// * `duration_secs` - The duration of the operation in seconds
pub fn observe_operation_duration(operation: &str, result: &str, duration_secs: f64) {
    OPERATION_DURATION
        .with_label_values(&[operation, result])
        .observe(duration_secs);
}

/// Record how many upstream requests one index page took
pub fn observe_pagination_iterations(source: &str, iterations: u32) {
    PAGINATION_ITERATIONS
        .with_label_values(&[source])
        .observe(f64::from(iterations));
}

/// Count a finished CSV export
pub fn record_enrichment_outcome(status: &str) {
    ENRICHMENT_OUTCOMES.with_label_values(&[status]).inc();
}

/// Count an activity feed with failed sources
pub fn inc_partial_activity() {
    PARTIAL_ACTIVITY.inc();
}

/// Axum handler that exports metrics in Prometheus text format
pub async fn metrics_handler() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    if let Err(error) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response();
    }

    match String::from_utf8(buffer) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            body,
        )
            .into_response(),
        Err(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_counted_by_status_class() {
        let before = REQUESTS.with_label_values(&["/v1/events", "4xx"]).get();
        inc_requests("/v1/events", StatusCode::NOT_FOUND);
        inc_requests("/v1/events", StatusCode::BAD_REQUEST);
        assert_eq!(
            REQUESTS.with_label_values(&["/v1/events", "4xx"]).get(),
            before + 2
        );
    }

    #[tokio::test]
    async fn handler_exports_registered_metrics() {
        inc_partial_activity();
        let response = metrics_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
