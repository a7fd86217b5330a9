// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the gallery server,
//! including configuration, the gallery over its backends, and coordinated
//! cancellation.

use std::sync::Arc;

use api_client::{HealthStatus, SourceHealth, overall_status};
use external_apis::{EnsResolver, EventBackend, PoapApiClient, SubgraphClient};
use gallery_core::Gallery;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::config::{Environment, ServerConfig};

/// The gallery over the live backends
pub type AppGallery = Gallery<EventBackend, PoapApiClient, SubgraphClient, EnsResolver>;

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    /// Gallery operations
    gallery: Arc<AppGallery>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `gallery` - Gallery over the configured backends
    /// * `cancellation_token` - Token for coordinated cancellation
    pub fn new(
        config: ServerConfig,
        gallery: Arc<AppGallery>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            gallery,
            cancellation_token,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Gallery operations
    pub fn gallery(&self) -> &AppGallery {
        &self.gallery
    }

    /// Probe every backend and summarize
    pub async fn health_check(&self) -> HealthCheck {
        let sources = self.gallery.health().await;
        HealthCheck {
            status: overall_status(&sources),
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            sources,
        }
    }
}

/// Health check status
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheck {
    /// Worst status across all configured backends
    #[serde(flatten)]
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Status of individual backends
    pub sources: Vec<SourceHealth>,
}
