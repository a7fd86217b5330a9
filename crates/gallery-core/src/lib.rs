// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Aggregation logic of the POAP gallery
//!
//! Everything here is written against the source traits in `api_client`, so
//! the same code runs over the live backends and over test fakes.
//!
//! - [`pagination`]: fills listing pages from sources that return short pages
//! - [`merge`]: concurrent dual-chain activity merge with partial results
//! - [`enrichment`]: chunked owner name resolution with observable progress
//! - [`export`]: CSV rendering of token holders
//! - [`view`]: listing state guarded by [`epoch`] against stale responses
//! - [`gallery`]: the operations the HTTP surface exposes

pub mod enrichment;
pub mod epoch;
pub mod error;
pub mod export;
pub mod format;
pub mod gallery;
pub mod merge;
pub mod pagination;
pub mod tokens;
pub mod view;

pub use enrichment::{Enrichment, EnrichmentPipeline, EnrichmentStatus, ResolvedName};
pub use epoch::{EpochTicket, RequestEpoch};
pub use error::GalleryError;
pub use export::{CSV_HEADER, CsvExport, render_csv};
pub use format::{GalleryLinks, PartnerLink, partner_links};
pub use gallery::{EventPage, Gallery, HighlightedEvent};
pub use merge::{ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT, MergeError, MergedActivity, SourceFailure};
pub use pagination::{
    AggregatedPage, MAX_ITERATIONS, OffsetAdvance, PAGE_LIMIT, PageAggregator, PageCursor,
};
pub use view::{FetchStatus, IndexRequest, IndexView};
