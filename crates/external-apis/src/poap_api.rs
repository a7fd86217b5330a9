// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! POAP REST API integration
//!
//! This module implements [`EventSource`] and [`EventCatalog`] for the POAP REST
//! API. Every call is a single `GET` authenticated with the `X-API-Key` header.
//! Query parameters without a value are left out of the URL entirely.

use std::time::{Duration, Instant};

use api_client::{
    ApiClient, ApiError, Event, EventCatalog, EventFilter, EventSource, EventTokens, HealthStatus,
    Page, TopEvents, Transfer,
};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Deserialize, de::DeserializeOwned};
use shared_types::OrderBy;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::non_empty_string::NonEmptyString;

// POAP API constants
const DEFAULT_POAP_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_POAP_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;
const DEFAULT_RATE_LIMIT_BACKOFF_SECONDS: u64 = 3;
const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");
const HEALTH_CHECK_PATH: &str = "/health-check";

/// A query parameter; `None` values are skipped when building the URL
pub type QueryParam<'a> = (&'a str, Option<String>);

/// Configuration for the POAP REST API client
/// This type is always valid by construction.
#[derive(Debug, Clone)]
pub struct PoapApiConfig {
    /// Base URL, endpoint paths are appended verbatim
    pub base_url: NonEmptyString,
    /// Static API key sent as `X-API-Key`
    pub api_key: NonEmptyString,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Health check timeout in seconds
    pub health_check_timeout_seconds: u64,
}

impl PoapApiConfig {
    /// Create a new `PoapApiConfig` with validation and default timeouts
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, String> {
        Ok(Self {
            base_url: NonEmptyString::new(base_url)?,
            api_key: NonEmptyString::new(api_key)?,
            timeout_seconds: DEFAULT_POAP_TIMEOUT_SECONDS,
            health_check_timeout_seconds: DEFAULT_POAP_HEALTH_CHECK_TIMEOUT_SECONDS,
        })
    }

    /// Override the request and health check timeouts
    #[must_use]
    pub fn with_timeouts(mut self, timeout_seconds: u64, health_check_timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self.health_check_timeout_seconds = health_check_timeout_seconds;
        self
    }
}

/// POAP REST API client implementation
#[derive(Debug, Clone)]
pub struct PoapApiClient {
    client: Client,
    config: PoapApiConfig,
}

/// Errors specific to the POAP REST API client
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum PoapApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL could not be built
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    /// A header value could not be encoded
    #[error("Invalid header value: {0}")]
    Header(String),

    /// API returned an error response
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Requested record does not exist
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Authentication failed
    #[error("Authentication failed")]
    Unauthorized,

    /// Timeout error
    #[error("Request timeout")]
    Timeout { seconds: u64 },
}

impl From<PoapApiError> for ApiError {
    fn from(value: PoapApiError) -> Self {
        match value {
            PoapApiError::Http(error) if error.is_decode() => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            PoapApiError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            PoapApiError::Url(error) => ApiError::Configuration {
                message: error.to_string(),
            },
            PoapApiError::Header(message) => ApiError::Configuration { message },
            PoapApiError::ApiError { status, message } => ApiError::Status { status, message },
            PoapApiError::NotFound { path } => ApiError::Status {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: format!("{path} not found"),
            },
            PoapApiError::RateLimited => ApiError::RateLimitExceeded {
                retry_after_seconds: DEFAULT_RATE_LIMIT_BACKOFF_SECONDS,
            },
            PoapApiError::Unauthorized => ApiError::Authentication {
                message: value.to_string(),
            },
            PoapApiError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

/// `/activity` answers either with a bare list or a wrapped one
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ActivityResponse {
    List(Vec<Transfer>),
    Wrapped {
        #[serde(alias = "items")]
        transfers: Vec<Transfer>,
    },
}

impl ActivityResponse {
    fn into_transfers(self) -> Vec<Transfer> {
        match self {
            Self::List(transfers) | Self::Wrapped { transfers } => transfers,
        }
    }
}

/// Merge caller headers with the credential header
///
/// Caller headers are applied first, the `X-API-Key` header always wins.
pub fn build_headers(api_key: &str, extra: Option<&HeaderMap>) -> Result<HeaderMap, PoapApiError> {
    let mut headers = extra.cloned().unwrap_or_default();
    let key = HeaderValue::from_str(api_key).map_err(|e| PoapApiError::Header(e.to_string()))?;
    headers.insert(API_KEY_HEADER, key);
    headers
        .entry(ACCEPT)
        .or_insert(HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Append `path` to `base_url` and add every parameter that has a value
pub fn build_url(base_url: &str, path: &str, params: &[QueryParam<'_>]) -> Result<Url, PoapApiError> {
    let mut url = Url::parse(&format!("{}{path}", base_url.trim().trim_end_matches('/')))?;
    let present: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(key, value)| value.as_deref().map(|value| (*key, value)))
        .collect();
    if !present.is_empty() {
        url.query_pairs_mut().extend_pairs(present);
    }
    Ok(url)
}

fn sort_params(order_by: Option<OrderBy>) -> [QueryParam<'static>; 2] {
    [
        (
            "sort_field",
            order_by.map(|order| order.order_type.value().to_string()),
        ),
        ("sort_dir", order_by.map(|order| order.order.value().to_string())),
    ]
}

impl PoapApiClient {
    /// Create a new POAP REST API client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the base URL is invalid
    pub fn new(config: PoapApiConfig) -> Result<Self, PoapApiError> {
        Url::parse(config.base_url.as_str().trim())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("poap-gallery/0.1.0")
            .build()
            .map_err(PoapApiError::Http)?;

        Ok(Self { client, config })
    }

    /// Perform one authenticated `GET` and decode the JSON body
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, timeout or a non-2xx status
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[QueryParam<'_>],
        headers: Option<&HeaderMap>,
    ) -> Result<T, PoapApiError> {
        let url = build_url(self.config.base_url.as_str(), path, params)?;
        let headers = build_headers(self.config.api_key.as_str(), headers)?;

        debug!(%url, "fetching from POAP API");

        let request = self.client.get(url).headers(headers);
        let response = timeout(
            Duration::from_secs(self.config.timeout_seconds),
            request.send(),
        )
        .await
        .map_err(|_| PoapApiError::Timeout {
            seconds: self.config.timeout_seconds,
        })?
        .map_err(PoapApiError::Http)?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            StatusCode::NOT_FOUND => {
                debug!(path, "POAP API record not found");
                Err(PoapApiError::NotFound {
                    path: path.to_string(),
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PoapApiError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(PoapApiError::RateLimited),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                warn!("POAP API error: {} - {}", status.as_u16(), error_text);
                Err(PoapApiError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                })
            }
        }
    }

    /// `GET /paginated-events`
    pub async fn paginated_events(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Event>, PoapApiError> {
        let event_ids = (!filter.event_ids.is_empty()).then(|| {
            filter
                .event_ids
                .iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(",")
        });
        let mut params = vec![
            ("name", filter.name.clone()),
            ("event_ids", event_ids),
            ("limit", Some(limit.to_string())),
            ("offset", Some(offset.to_string())),
            (
                "private_event",
                filter.private_events.map(|private| private.to_string()),
            ),
            ("with_power", Some("true".to_string())),
        ];
        params.extend(sort_params(filter.order_by));

        self.fetch("/paginated-events", &params, None).await
    }

    /// `GET /blockchain-events`; ignores name and id filters
    pub async fn blockchain_events(
        &self,
        order_by: Option<OrderBy>,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Event>, PoapApiError> {
        let mut params = vec![
            ("limit", Some(limit.to_string())),
            ("offset", Some(offset.to_string())),
        ];
        params.extend(sort_params(order_by));

        self.fetch("/blockchain-events", &params, None).await
    }

    /// `GET /events/id/{id}`
    pub async fn get_event(&self, id: u64) -> Result<Option<Event>, PoapApiError> {
        match self.fetch(&format!("/events/id/{id}"), &[], None).await {
            Ok(event) => Ok(Some(event)),
            Err(PoapApiError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `GET /event/{id}/poaps`
    pub async fn get_event_tokens(
        &self,
        id: u64,
        limit: u64,
        offset: u64,
    ) -> Result<EventTokens, PoapApiError> {
        let params = [
            ("limit", Some(limit.to_string())),
            ("offset", Some(offset.to_string())),
        ];
        let mut tokens: EventTokens = self
            .fetch(&format!("/event/{id}/poaps"), &params, None)
            .await?;
        for token in &mut tokens.tokens {
            token.event_id.get_or_insert(id);
        }
        Ok(tokens)
    }

    /// `GET /activity`
    pub async fn get_last_transfers(&self, limit: u64) -> Result<Vec<Transfer>, PoapApiError> {
        let response: ActivityResponse = self
            .fetch("/activity", &[("limit", Some(limit.to_string()))], None)
            .await?;
        Ok(response.into_transfers())
    }

    /// `GET /top-3-events`
    pub async fn get_top_events(&self) -> Result<TopEvents, PoapApiError> {
        self.fetch("/top-3-events", &[], None).await
    }
}

impl ApiClient for PoapApiClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let url = build_url(self.config.base_url.as_str(), HEALTH_CHECK_PATH, &[])?;
        let headers = build_headers(self.config.api_key.as_str(), None)?;

        debug!(%url, "performing health check on POAP API");

        let start_time = Instant::now();
        let response = timeout(
            Duration::from_secs(self.config.health_check_timeout_seconds),
            self.client.get(url).headers(headers).send(),
        )
        .await
        .map_err(|_| PoapApiError::Timeout {
            seconds: self.config.health_check_timeout_seconds,
        })?
        .map_err(PoapApiError::Http)?;

        let status = HealthStatus::from_status_code(response.status().as_u16());
        if status == HealthStatus::Up {
            info!(
                "POAP API health check passed in {:?}",
                start_time.elapsed()
            );
        } else {
            warn!(reason = status.description(), "POAP API health check failed");
        }
        Ok(status)
    }

    fn name(&self) -> &'static str {
        "poap-api"
    }
}

impl EventSource for PoapApiClient {
    async fn fetch_events(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Event>, ApiError> {
        let page = if filter.is_blockchain_ordered() {
            self.blockchain_events(filter.order_by, offset, limit).await
        } else {
            self.paginated_events(filter, offset, limit).await
        };
        page.map_err(|e| {
            error!(offset, limit, "Failed to fetch events from POAP API: {}", e);
            e.into()
        })
    }
}

impl EventCatalog for PoapApiClient {
    async fn event(&self, id: u64) -> Result<Option<Event>, ApiError> {
        Ok(self.get_event(id).await?)
    }

    async fn event_tokens(&self, id: u64, limit: u64, offset: u64) -> Result<EventTokens, ApiError> {
        Ok(self.get_event_tokens(id, limit, offset).await?)
    }

    async fn last_transfers(&self, limit: u64) -> Result<Vec<Transfer>, ApiError> {
        Ok(self.get_last_transfers(limit).await?)
    }

    async fn top_events(&self) -> Result<TopEvents, ApiError> {
        Ok(self.get_top_events().await?)
    }
}
