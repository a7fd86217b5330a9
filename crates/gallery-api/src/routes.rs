// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration and handlers for the gallery server.

pub mod handlers;

use axum::{Router, middleware, routing::get};
use handlers::{
    activity_handler, event_csv_handler, event_handler, event_tokens_handler, events_handler,
    health_handler, owner_links_handler, site_config_handler, top_events_handler,
};

use crate::{
    metrics::metrics_handler,
    middleware::request_metrics_middleware,
    openapi::{openapi_spec, swagger_ui},
    state::ServerState,
};

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    // Monitoring endpoints are not counted
    let ops_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let docs_routes = Router::new()
        .route("/api-doc/openapi.json", get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let api_routes = Router::new()
        .route("/events", get(events_handler))
        .route("/events/{id}", get(event_handler))
        .route("/events/{id}/tokens", get(event_tokens_handler))
        .route("/events/{id}/csv", get(event_csv_handler))
        .route("/activity", get(activity_handler))
        .route("/top-events", get(top_events_handler))
        .route("/site-config", get(site_config_handler))
        .route("/owners/{address}/links", get(owner_links_handler))
        .layer(middleware::from_fn(request_metrics_middleware));

    let v1 = Router::new().nest("/v1", api_routes);

    Router::new()
        .merge(ops_routes)
        .merge(docs_routes)
        .merge(v1)
}
