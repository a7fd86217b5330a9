// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Source traits and normalized types for POAP data backends
//!
//! This crate defines the seams between the gallery's aggregation logic and the
//! concrete backends (the POAP REST API, the compass GraphQL indexer, per-chain
//! subgraphs and the ENS reverse-records contract).
//!
//! # Core Abstractions
//!
//! - **`ApiClient` Trait**: health checks and naming shared by every backend client
//! - **Source Traits**: [`EventSource`], [`EventCatalog`], [`ActivitySource`] and
//!   [`NameResolver`], one per kind of read the gallery performs
//! - **Error Handling**: a single [`ApiError`] every client converts into
//! - **Data Types**: normalized drops, tokens, accounts and transfers
//!
//! Every operation performs exactly one upstream read. Retrying, paging and
//! merging are left to the caller.

use alloy_primitives::Address;
use shared_types::Chain;
use thiserror::Error;

pub mod health;
pub mod types;

pub use health::*;
pub use types::*;

/// Common interface for all backend clients
pub trait ApiClient: Send + Sync {
    /// Check the health of this backend
    ///
    /// # Errors
    ///
    /// Returns an error if the health probe could not be sent at all
    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, ApiError>> + Send;

    /// Get the name/identifier of this client
    fn name(&self) -> &'static str;
}

/// A backend that can list events page by page
pub trait EventSource: ApiClient {
    /// Fetch one page of events matching `filter`
    ///
    /// The backend may apply filtering after paging, so fewer than `limit`
    /// items can come back even when more exist.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-2xx response
    fn fetch_events(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> impl Future<Output = Result<Page<Event>, ApiError>> + Send;
}

/// By-ID lookups and listings served by the POAP REST API
pub trait EventCatalog: ApiClient {
    /// Get a single event; `Ok(None)` when the event does not exist
    fn event(&self, id: u64) -> impl Future<Output = Result<Option<Event>, ApiError>> + Send;

    /// Get a slice of the tokens minted for an event
    fn event_tokens(
        &self,
        id: u64,
        limit: u64,
        offset: u64,
    ) -> impl Future<Output = Result<EventTokens, ApiError>> + Send;

    /// Get the most recent transfers across all chains
    fn last_transfers(
        &self,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<Transfer>, ApiError>> + Send;

    /// Get the highlighted events (most recent, upcoming, most claimed)
    fn top_events(&self) -> impl Future<Output = Result<TopEvents, ApiError>> + Send;
}

/// A single-chain indexer of token transfers
pub trait ActivitySource: ApiClient {
    /// Chain this source indexes; every returned record carries this tag
    fn chain(&self) -> Chain;

    /// Get the most recent transfers, newest first
    fn recent_transfers(
        &self,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<Transfer>, ApiError>> + Send;
}

/// Reverse name resolution for chain addresses
pub trait NameResolver: ApiClient {
    /// Largest number of addresses a single call accepts
    fn max_batch_size(&self) -> usize {
        1200
    }

    /// Resolve display names for `addresses`
    ///
    /// The result is positionally aligned with the input. Addresses without a
    /// name resolve to an empty string.
    fn resolve_names(
        &self,
        addresses: &[Address],
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;
}

/// Common errors surfaced by backend clients
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ApiError {
    /// Request could not be sent or the connection failed
    #[error("HTTP request failed: {message}")]
    Http { message: String },

    /// Backend answered with a non-2xx status
    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_seconds} seconds")]
    RateLimitExceeded { retry_after_seconds: u64 },

    /// Authentication failed
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Invalid response format
    #[error("Invalid response format: {message}")]
    InvalidResponse { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Network timeout
    #[error("Request timeout after {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    /// Client independent error
    #[error(transparent)]
    Custom { error: anyhow::Error },
}

impl ApiError {
    /// Whether the failure happened on the wire (connection, status, timeout)
    ///
    /// These are the failures a caller may offer to retry.
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            Self::Http { .. }
                | Self::Status { .. }
                | Self::RateLimitExceeded { .. }
                | Self::Timeout { .. }
        )
    }
}
