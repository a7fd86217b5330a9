// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! Every handler is a thin shell over one `Gallery` operation: parse the
//! request, call the operation, record timing, serialize.

use std::{future::Future, time::Instant};

use alloy_primitives::Address;
use api_client::{Event, EventFilter, EventTokens, HealthStatus, Transfer};
use axum::{
    Json,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use gallery_core::{
    EventPage, GalleryError, HighlightedEvent, PageCursor, PartnerLink, SourceFailure,
    partner_links,
};
use serde::{Deserialize, Serialize};
use shared_types::{OrderBy, OrderDirection, OrderType};
use tracing::{debug, error, warn};
use utoipa::{IntoParams, ToSchema};

use crate::{
    config::AnalyticsSettings,
    error::ServerError,
    extractors::{PathExtractor, QueryExtractor},
    metrics,
    state::{HealthCheck, ServerState},
};

/// Response header carrying the enrichment status of a CSV export
pub const ENRICHMENT_STATUS_HEADER: HeaderName = HeaderName::from_static("x-enrichment-status");
/// Response header carrying the download label of a CSV export
pub const DOWNLOAD_LABEL_HEADER: HeaderName = HeaderName::from_static("x-download-label");

/// Run one gallery operation and record its duration
async fn timed<T, F>(operation: &'static str, fut: F) -> Result<T, ServerError>
where
    F: Future<Output = Result<T, GalleryError>>,
{
    let start = Instant::now();
    let result = fut.await;
    let elapsed = start.elapsed().as_secs_f64();
    match &result {
        Ok(_) => metrics::observe_operation_duration(operation, "ok", elapsed),
        Err(err) => {
            metrics::observe_operation_duration(operation, "error", elapsed);
            if matches!(
                err,
                GalleryError::Upstream(_) | GalleryError::Merge(_)
            ) {
                error!(operation, error = %err, "gallery operation failed");
            } else {
                debug!(operation, error = %err, "request rejected");
            }
        }
    }
    result.map_err(ServerError::from)
}

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the service version and environment together with the health of every backend (POAP API, compass, chain subgraphs, ENS). Unconfigured backends are reported as disabled.",
    responses(
        (status = 200, description = "Service is healthy or degraded", body = HealthCheck),
        (status = 503, description = "At least one backend is down", body = HealthCheck)
    )
)]
pub async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    let health = state.health_check().await;
    let status = if matches!(health.status, HealthStatus::Down { .. }) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(health))
}

/// Event listing query
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventsQuery {
    /// Free-text name search
    pub name: Option<String>,
    /// Ordering field: `id`, `token_count`, `transfer_count`, `start_date`, `city`
    pub order: Option<String>,
    /// `asc` or `desc` (default)
    pub direction: Option<OrderDirection>,
    /// Only private events (`true`) or only public ones (`false`)
    pub private: Option<bool>,
    /// Cursor offset returned by the previous page
    #[serde(default)]
    pub offset: u64,
    /// Cursor page returned by the previous page
    #[serde(default)]
    pub page: u64,
    /// Cursor total returned by the previous page
    #[serde(default)]
    pub total: u64,
}

impl EventsQuery {
    /// Listing filter described by this query
    ///
    /// # Errors
    ///
    /// Rejects unknown order types
    pub fn filter(&self) -> Result<EventFilter, ServerError> {
        let mut filter = EventFilter {
            private_events: self.private,
            ..EventFilter::default()
        };
        if let Some(name) = &self.name {
            filter = filter.with_name(name.as_str());
        }
        if self.order.is_some() || self.direction.is_some() {
            let order_type = match &self.order {
                Some(order) => order.parse::<OrderType>().map_err(ServerError::Validation)?,
                None => OrderBy::default().order_type,
            };
            filter = filter.with_order(OrderBy::new(
                order_type,
                self.direction.unwrap_or_default(),
            ));
        }
        Ok(filter)
    }

    /// Cursor to resume from
    pub const fn cursor(&self) -> PageCursor {
        PageCursor {
            offset: self.offset,
            page: self.page,
            total: self.total,
        }
    }
}

/// One page of the event index
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventsResponse {
    /// Events on this page
    pub events: Vec<Event>,
    /// Cursor after this page
    pub cursor: PageCursor,
    /// Cursor to request the following page with
    pub next: PageCursor,
    /// Whether the source reported more events beyond this page
    pub has_more: bool,
}

/// Event index page
///
/// # Errors
///
/// Returns `ServerError` for an unknown ordering or a failed backend read.
#[utoipa::path(
    get,
    path = "/v1/events",
    tag = "events",
    summary = "List events",
    description = "Returns one page of events, filled from as many backend requests as needed. Pass the returned `next` cursor fields back as `offset`, `page` and `total` to load the following page.",
    params(EventsQuery),
    responses(
        (status = 200, description = "Page assembled", body = EventsResponse),
        (status = 400, description = "Invalid ordering or cursor", body = String),
        (status = 502, description = "Backend failure", body = String)
    )
)]
pub async fn events_handler(
    State(state): State<ServerState>,
    QueryExtractor(query): QueryExtractor<EventsQuery>,
) -> Result<Json<EventsResponse>, ServerError> {
    let filter = query.filter()?;
    debug!(?filter, offset = query.offset, page = query.page, "event index requested");

    let page = timed("index_page", state.gallery().index_page(&filter, query.cursor())).await?;
    metrics::observe_pagination_iterations(
        if filter.is_blockchain_ordered() {
            "blockchain"
        } else {
            "events"
        },
        page.iterations,
    );

    Ok(Json(EventsResponse {
        has_more: page.cursor.offset < page.cursor.total,
        next: page.cursor.next_page(),
        cursor: page.cursor,
        events: page.items,
    }))
}

/// Event details with the first token slice
///
/// # Errors
///
/// Returns `ServerError::NotFound` for an unknown event.
#[utoipa::path(
    get,
    path = "/v1/events/{id}",
    tag = "events",
    summary = "Event page",
    description = "Returns the event with token and transfer counters taken from its token listing, plus the first slice of tokens sorted by id.",
    params(("id" = u64, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event found", body = EventPage),
        (status = 404, description = "Unknown event", body = String),
        (status = 502, description = "Backend failure", body = String)
    )
)]
pub async fn event_handler(
    State(state): State<ServerState>,
    PathExtractor(id): PathExtractor<u64>,
) -> Result<Json<EventPage>, ServerError> {
    timed("event_page", state.gallery().event_page(id))
        .await
        .map(Json)
}

/// Token slice query
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TokensQuery {
    /// Slice size, 1 to 1000
    #[serde(default = "default_token_limit")]
    pub limit: u64,
    /// Tokens to skip
    #[serde(default)]
    pub offset: u64,
}

const fn default_token_limit() -> u64 {
    gallery_core::tokens::TOKEN_PAGE_SIZE
}

/// Event token slice
///
/// # Errors
///
/// Returns `ServerError::Validation` for a limit outside 1..=1000.
#[utoipa::path(
    get,
    path = "/v1/events/{id}/tokens",
    tag = "events",
    summary = "Event tokens",
    description = "Returns one slice of an event's tokens, deduplicated and sorted ascending by id.",
    params(("id" = u64, Path, description = "Event id"), TokensQuery),
    responses(
        (status = 200, description = "Token slice", body = EventTokens),
        (status = 400, description = "Invalid limit", body = String),
        (status = 502, description = "Backend failure", body = String)
    )
)]
pub async fn event_tokens_handler(
    State(state): State<ServerState>,
    PathExtractor(id): PathExtractor<u64>,
    QueryExtractor(query): QueryExtractor<TokensQuery>,
) -> Result<Json<EventTokens>, ServerError> {
    timed(
        "event_tokens",
        state.gallery().event_tokens(id, query.limit, query.offset),
    )
    .await
    .map(Json)
}

/// Token holders as CSV
///
/// # Errors
///
/// Returns `ServerError` when the event is unknown or a token page fails.
#[utoipa::path(
    get,
    path = "/v1/events/{id}/csv",
    tag = "events",
    summary = "Export holders as CSV",
    description = "Collects every token of the event, resolves owner ENS names when a resolver is configured, and returns the holders as CSV. `x-enrichment-status` reports whether names were resolved; a failed resolution still yields the CSV without names.",
    params(("id" = u64, Path, description = "Event id")),
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv", body = String),
        (status = 404, description = "Unknown event", body = String),
        (status = 502, description = "Backend failure", body = String)
    )
)]
pub async fn event_csv_handler(
    State(state): State<ServerState>,
    PathExtractor(id): PathExtractor<u64>,
) -> Result<Response, ServerError> {
    let export = timed("export_csv", state.gallery().export_csv(id, None)).await?;
    metrics::record_enrichment_outcome(export.status.as_str());
    if !export.status.is_enriched() && state.gallery().has_resolver() {
        warn!(event_id = id, status = export.status.as_str(), "CSV exported without names");
    }

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        export.filename.replace(['"', '\\'], "")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment; filename=\"export.csv\""));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
            (
                ENRICHMENT_STATUS_HEADER,
                HeaderValue::from_static(export.status.as_str()),
            ),
            (DOWNLOAD_LABEL_HEADER, HeaderValue::from_static(export.label)),
        ],
        export.body,
    )
        .into_response())
}

/// Activity feed query
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityQuery {
    /// Transfers to return, at most 1000; defaults to the configured activity limit
    pub limit: Option<u64>,
}

/// Merged activity feed
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    /// Transfers, newest first
    pub transfers: Vec<Transfer>,
    /// Whether a chain failed and the feed holds only the other one
    pub partial: bool,
    /// Chains that failed
    pub failed_sources: Vec<SourceFailure>,
}

/// Latest transfers across chains
///
/// # Errors
///
/// Returns `ServerError::Upstream` when every chain source fails.
#[utoipa::path(
    get,
    path = "/v1/activity",
    tag = "activity",
    summary = "Recent transfers",
    description = "Returns the latest transfers from the mainnet and gnosis subgraphs merged newest first. If one chain fails the feed is served from the other with `partial` set.",
    params(ActivityQuery),
    responses(
        (status = 200, description = "Activity feed", body = ActivityResponse),
        (status = 400, description = "Invalid limit", body = String),
        (status = 502, description = "Every source failed", body = String)
    )
)]
pub async fn activity_handler(
    State(state): State<ServerState>,
    QueryExtractor(query): QueryExtractor<ActivityQuery>,
) -> Result<Json<ActivityResponse>, ServerError> {
    let activity = timed("activity", state.gallery().activity(query.limit)).await?;
    let partial = activity.is_partial();
    if partial {
        metrics::inc_partial_activity();
    }
    Ok(Json(ActivityResponse {
        transfers: activity.transfers,
        partial,
        failed_sources: activity.failures,
    }))
}

/// Highlighted events
///
/// # Errors
///
/// Returns `ServerError::Upstream` when the backend read fails.
#[utoipa::path(
    get,
    path = "/v1/top-events",
    tag = "events",
    summary = "Highlighted events",
    description = "Returns the most recent, upcoming and most claimed events with their headings. Missing slots are omitted.",
    responses(
        (status = 200, description = "Highlighted events", body = Vec<HighlightedEvent>),
        (status = 502, description = "Backend failure", body = String)
    )
)]
pub async fn top_events_handler(
    State(state): State<ServerState>,
) -> Result<Json<Vec<HighlightedEvent>>, ServerError> {
    timed("top_events", state.gallery().top_events())
        .await
        .map(Json)
}

/// Settings the presentation layer needs
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// POAP app URL
    pub app_url: String,
    /// Family site URL
    pub family_url: String,
    /// Events per index page
    pub page_limit: u64,
    /// Transfers in the activity feed
    pub activity_limit: u64,
    /// Whether CSV exports carry ENS names
    pub ens_enabled: bool,
    /// Analytics settings
    pub analytics: AnalyticsSettings,
}

/// Presentation settings
#[utoipa::path(
    get,
    path = "/v1/site-config",
    tag = "site",
    summary = "Site configuration",
    description = "Returns the URLs, limits and analytics settings the gallery front end is configured with.",
    responses((status = 200, description = "Site configuration", body = SiteConfig))
)]
pub async fn site_config_handler(State(state): State<ServerState>) -> Json<SiteConfig> {
    let gallery = &state.config().gallery;
    Json(SiteConfig {
        app_url: gallery.app_url.clone(),
        family_url: gallery.family_url.clone(),
        page_limit: gallery.page_limit,
        activity_limit: state.gallery().activity_limit(),
        ens_enabled: state.gallery().has_resolver(),
        analytics: state.config().analytics.clone(),
    })
}

/// Collection links for one owner
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerLinks {
    /// Owner address
    #[schema(value_type = String)]
    pub address: Address,
    /// Collection page in the POAP app
    pub scan: String,
    /// Collection pages on partner sites
    pub partners: Vec<PartnerLink>,
}

/// Owner collection links
#[utoipa::path(
    get,
    path = "/v1/owners/{address}/links",
    tag = "site",
    summary = "Owner collection links",
    description = "Returns the owner's collection page in the POAP app and on partner sites.",
    params(("address" = String, Path, description = "Owner address, 0x-prefixed hex")),
    responses(
        (status = 200, description = "Links", body = OwnerLinks),
        (status = 400, description = "Malformed address", body = String)
    )
)]
pub async fn owner_links_handler(
    State(state): State<ServerState>,
    PathExtractor(address): PathExtractor<Address>,
) -> Json<OwnerLinks> {
    Json(OwnerLinks {
        address,
        scan: state.gallery().links().scan(address),
        partners: partner_links(address),
    })
}
