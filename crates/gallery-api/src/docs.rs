// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` document definition

use api_client::{Account, Event, EventTokens, HealthStatus, SourceHealth, Token, Transfer};
use gallery_core::{
    EnrichmentStatus, EventPage, HighlightedEvent, PageCursor, PartnerLink, SourceFailure,
};
use shared_types::{ActivityType, Chain, OrderDirection, OrderType};
use utoipa::OpenApi;

use crate::{
    config::{AnalyticsSettings, Environment},
    routes::handlers::{self, ActivityResponse, EventsResponse, OwnerLinks, SiteConfig},
    state::HealthCheck,
};

/// `OpenAPI` document of the gallery service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "POAP Gallery API",
        description = "Event index, event pages, holder exports and cross-chain activity for the POAP gallery."
    ),
    paths(
        handlers::health_handler,
        handlers::events_handler,
        handlers::event_handler,
        handlers::event_tokens_handler,
        handlers::event_csv_handler,
        handlers::activity_handler,
        handlers::top_events_handler,
        handlers::site_config_handler,
        handlers::owner_links_handler,
    ),
    components(schemas(
        HealthCheck,
        HealthStatus,
        SourceHealth,
        Environment,
        EventsResponse,
        PageCursor,
        Event,
        EventPage,
        EventTokens,
        Token,
        Account,
        Transfer,
        ActivityResponse,
        SourceFailure,
        HighlightedEvent,
        SiteConfig,
        AnalyticsSettings,
        OwnerLinks,
        PartnerLink,
        EnrichmentStatus,
        Chain,
        ActivityType,
        OrderType,
        OrderDirection,
    )),
    tags(
        (name = "health", description = "Service and backend health"),
        (name = "events", description = "Event index, event pages and holder exports"),
        (name = "activity", description = "Cross-chain transfer feed"),
        (name = "site", description = "Presentation settings and links"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/v1/events",
            "/v1/events/{id}",
            "/v1/events/{id}/tokens",
            "/v1/events/{id}/csv",
            "/v1/activity",
            "/v1/top-events",
            "/v1/site-config",
            "/v1/owners/{address}/links",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
