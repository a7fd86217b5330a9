// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Middleware module for HTTP request processing

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::metrics;

/// Route label for requests that matched no route
const UNMATCHED_ROUTE: &str = "unmatched";

/// Count every request by route template and status class
///
/// The route template (`/v1/events/{id}`) is used rather than the raw path so
/// the label set stays bounded.
pub async fn request_metrics_middleware(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| UNMATCHED_ROUTE.to_string(), |path| path.as_str().to_string());
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis();
    metrics::inc_requests(&route, status);
    if status.is_server_error() {
        warn!(%route, %status, elapsed_ms, "request failed");
    } else {
        debug!(%route, %status, elapsed_ms, "request served");
    }
    response
}
