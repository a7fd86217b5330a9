// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Backend integrations for the POAP gallery
//!
//! This crate implements the source traits from `api-client` for every backend
//! the gallery reads from.
//!
//! # Clients
//!
//! - [`poap_api::PoapApiClient`]: POAP REST API (events, tokens, activity, top events)
//! - [`compass::CompassClient`]: compass GraphQL indexer (drops with search and stats ordering)
//! - [`subgraph::SubgraphClient`]: one per chain, recent transfers
//! - [`ens::EnsResolver`]: ENS reverse records over JSON-RPC
//!
//! [`backend::EventBackend`] picks the REST API or compass as the event listing.
//!
//! All GraphQL traffic goes through [`graphql::GraphQlEndpoint`]. Configuration
//! values are validated with [`non_empty_string::NonEmptyString`].
//!
//! Clients never retry; a failed read surfaces as an error to the caller.

pub mod backend;
pub mod compass;
pub mod ens;
pub mod graphql;
pub mod non_empty_string;
pub mod poap_api;
pub mod subgraph;

pub use backend::EventBackend;
pub use compass::CompassClient;
pub use ens::{ENS_CHUNK_SIZE, EnsConfig, EnsError, EnsResolver};
pub use graphql::{GraphQlEndpoint, GraphQlError};
pub use non_empty_string::NonEmptyString;
pub use poap_api::{PoapApiClient, PoapApiConfig, PoapApiError};
pub use subgraph::SubgraphClient;
