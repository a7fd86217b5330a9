// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Event listing backend chosen at startup

use api_client::{ApiClient, ApiError, Event, EventFilter, EventSource, HealthStatus, Page};

use crate::{compass::CompassClient, poap_api::PoapApiClient};

/// Event listing served by either the REST API or the compass indexer
#[derive(Debug)]
pub enum EventBackend {
    /// `/paginated-events` and `/blockchain-events`
    Rest(PoapApiClient),
    /// `drops` and `search_drops` queries
    Compass(CompassClient),
}

impl ApiClient for EventBackend {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        match self {
            Self::Rest(client) => client.health_check().await,
            Self::Compass(client) => client.health_check().await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Rest(client) => client.name(),
            Self::Compass(client) => client.name(),
        }
    }
}

impl EventSource for EventBackend {
    async fn fetch_events(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Event>, ApiError> {
        match self {
            Self::Rest(client) => client.fetch_events(filter, offset, limit).await,
            Self::Compass(client) => client.fetch_events(filter, offset, limit).await,
        }
    }
}

impl From<PoapApiClient> for EventBackend {
    fn from(client: PoapApiClient) -> Self {
        Self::Rest(client)
    }
}

impl From<CompassClient> for EventBackend {
    fn from(client: CompassClient) -> Self {
        Self::Compass(client)
    }
}
