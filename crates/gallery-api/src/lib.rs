// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! POAP Gallery Server Implementation
//!
//! This crate provides the HTTP server for the POAP gallery, built with Axum. It
//! exposes the operations of [`gallery_core::Gallery`] as a JSON API for the
//! presentation layer.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and HTTP response handling with proper status codes
//! - [`state`]: Shared application state management with cancellation token support
//! - [`server`]: Backend wiring, server lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`extractors`]: Query and path extractors with JSON rejections
//! - [`middleware`]: Per-route request metrics
//! - [`metrics`]: Prometheus metrics and the exposition handler
//! - [`openapi`]: `OpenAPI` specification and Swagger UI endpoints for API documentation
//!
//! # Key Features
//!
//! - **Optional Backends**: compass, chain subgraphs and ENS are switched on by configuration
//! - **Partial Results**: the activity feed survives a single failed chain
//! - **Graceful Shutdown**: Coordinated termination using `CancellationToken`
//! - **Health Monitoring**: Concurrent health checks across every backend

pub mod config;
pub mod docs;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use state::{AppGallery, HealthCheck, ServerState};
