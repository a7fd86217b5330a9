// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Minimal GraphQL-over-HTTP transport
//!
//! Both the compass indexer and the per-chain subgraphs take a `POST` with a
//! `{query, variables}` body and answer `{data, errors}`.

use std::time::{Duration, Instant};

use api_client::{ApiError, HealthStatus};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

use crate::non_empty_string::NonEmptyString;

const DEFAULT_GRAPHQL_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_GRAPHQL_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;
const HEALTH_CHECK_QUERY: &str = "query HealthCheck { __typename }";

/// Errors raised by the GraphQL transport
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum GraphQlError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint URL is not valid
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    /// Endpoint answered with a non-2xx status
    #[error("GraphQL endpoint error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The query was rejected
    #[error("GraphQL query failed: {}", .messages.join("; "))]
    Query { messages: Vec<String> },

    /// Neither data nor errors were returned
    #[error("GraphQL response carried no data")]
    MissingData,

    /// Timeout error
    #[error("Request timeout")]
    Timeout { seconds: u64 },
}

impl From<GraphQlError> for ApiError {
    fn from(value: GraphQlError) -> Self {
        match value {
            GraphQlError::Http(error) if error.is_decode() => ApiError::InvalidResponse {
                message: error.to_string(),
            },
            GraphQlError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            GraphQlError::Url(error) => ApiError::Configuration {
                message: error.to_string(),
            },
            GraphQlError::Status { status, .. }
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                ApiError::Authentication {
                    message: value.to_string(),
                }
            }
            GraphQlError::Status { status, message } => ApiError::Status { status, message },
            GraphQlError::Query { .. } | GraphQlError::MissingData => ApiError::InvalidResponse {
                message: value.to_string(),
            },
            GraphQlError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

/// A GraphQL endpoint plus the HTTP client used to reach it
#[derive(Debug, Clone)]
pub struct GraphQlEndpoint {
    client: Client,
    url: Url,
    timeout_seconds: u64,
    health_check_timeout_seconds: u64,
}

impl GraphQlEndpoint {
    /// Create an endpoint with default timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built
    pub fn new(url: &NonEmptyString) -> Result<Self, GraphQlError> {
        Self::with_timeouts(
            url,
            DEFAULT_GRAPHQL_TIMEOUT_SECONDS,
            DEFAULT_GRAPHQL_HEALTH_CHECK_TIMEOUT_SECONDS,
        )
    }

    /// Create an endpoint with explicit timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built
    pub fn with_timeouts(
        url: &NonEmptyString,
        timeout_seconds: u64,
        health_check_timeout_seconds: u64,
    ) -> Result<Self, GraphQlError> {
        let url = Url::parse(url.as_str().trim())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent("poap-gallery/0.1.0")
            .build()?;
        Ok(Self {
            client,
            url,
            timeout_seconds,
            health_check_timeout_seconds,
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Run `query` with `variables` and decode the `data` member
    ///
    /// A response carrying `errors` fails even when partial data is present.
    pub async fn query<V, T>(&self, query: &str, variables: V) -> Result<T, GraphQlError>
    where
        V: Serialize + Send,
        T: DeserializeOwned,
    {
        self.post(query, variables, self.timeout_seconds).await
    }

    async fn post<V, T>(&self, query: &str, variables: V, seconds: u64) -> Result<T, GraphQlError>
    where
        V: Serialize + Send,
        T: DeserializeOwned,
    {
        debug!(url = %self.url, "sending GraphQL query");

        let request = self
            .client
            .post(self.url.clone())
            .json(&GraphQlRequest { query, variables });

        let response = timeout(Duration::from_secs(seconds), request.send())
            .await
            .map_err(|_| GraphQlError::Timeout { seconds })?
            .map_err(GraphQlError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!("GraphQL endpoint error: {} - {}", status.as_u16(), message);
            return Err(GraphQlError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: GraphQlResponse<T> = response.json().await?;
        if !body.errors.is_empty() {
            return Err(GraphQlError::Query {
                messages: body.errors.into_iter().map(|e| e.message).collect(),
            });
        }
        body.data.ok_or(GraphQlError::MissingData)
    }

    /// Probe the endpoint with a `__typename` query
    pub async fn probe(&self, name: &str) -> Result<HealthStatus, GraphQlError> {
        let start_time = Instant::now();
        let result: Result<serde_json::Value, _> = self
            .post(
                HEALTH_CHECK_QUERY,
                serde_json::json!({}),
                self.health_check_timeout_seconds,
            )
            .await;

        match result {
            Ok(_) => {
                debug!(
                    "{} health check passed in {:?}",
                    name,
                    start_time.elapsed()
                );
                Ok(HealthStatus::Up)
            }
            Err(GraphQlError::Status { status, .. }) => {
                warn!(status, "{} health check failed", name);
                Ok(HealthStatus::from_status_code(status))
            }
            Err(GraphQlError::Query { messages }) => Ok(HealthStatus::Degraded {
                reason: messages.join("; "),
            }),
            Err(e) => Err(e),
        }
    }
}
