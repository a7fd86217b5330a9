// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Gallery operations over a fixed set of backends

use std::time::Instant;

use api_client::{
    ActivitySource, ApiClient, Event, EventCatalog, EventFilter, EventSource, EventTokens,
    HealthStatus, NameResolver, SourceHealth, Token,
};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::{
    enrichment::{EnrichmentPipeline, EnrichmentStatus},
    error::GalleryError,
    export::{CsvExport, render_csv},
    format::GalleryLinks,
    merge::{ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT, MergedActivity, merge_activity, merge_sorted},
    pagination::{AggregatedPage, EventPages, PageAggregator, PageCursor},
    tokens::{TOKEN_PAGE_SIZE, complete_event_tokens, normalize_tokens},
};

/// Largest token slice a caller may request at once
pub const MAX_TOKEN_SLICE: u64 = 1000;

/// An event with the first slice of its tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    /// Event with counters taken from the token listing
    pub event: Event,
    /// First token slice, ascending by id
    pub tokens: Vec<Token>,
    /// Event page on the family site
    pub family_url: String,
}

/// A highlighted event with its heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HighlightedEvent {
    /// Heading shown above the card
    pub heading: &'static str,
    /// The event
    pub event: Event,
}

/// Read-side operations of the gallery
///
/// `E` lists events, `C` serves by-id lookups and listings, `A` indexes one
/// chain's transfers and `R` resolves owner names. Activity sources and the
/// resolver are optional.
#[derive(Debug)]
pub struct Gallery<E, C, A, R> {
    events: E,
    catalog: C,
    mainnet: Option<A>,
    xdai: Option<A>,
    resolver: Option<R>,
    aggregator: PageAggregator,
    activity_limit: u64,
    links: GalleryLinks,
}

impl<E, C, A, R> Gallery<E, C, A, R>
where
    E: EventSource,
    C: EventCatalog,
    A: ActivitySource,
    R: NameResolver,
{
    /// Gallery reading events from `events` and details from `catalog`
    pub fn new(events: E, catalog: C, links: GalleryLinks) -> Self {
        Self {
            events,
            catalog,
            mainnet: None,
            xdai: None,
            resolver: None,
            aggregator: PageAggregator::default(),
            activity_limit: ACTIVITY_LIMIT,
            links,
        }
    }

    /// Set the per-chain activity sources
    #[must_use]
    pub fn with_activity(mut self, mainnet: Option<A>, xdai: Option<A>) -> Self {
        self.mainnet = mainnet;
        self.xdai = xdai;
        self
    }

    /// Set the owner name resolver
    #[must_use]
    pub fn with_resolver(mut self, resolver: Option<R>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the listing page aggregator
    #[must_use]
    pub fn with_aggregator(mut self, aggregator: PageAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Set the default activity feed length
    #[must_use]
    pub fn with_activity_limit(mut self, limit: u64) -> Self {
        self.activity_limit = limit;
        self
    }

    /// Link builder for this gallery
    pub const fn links(&self) -> &GalleryLinks {
        &self.links
    }

    /// Default activity feed length
    pub const fn activity_limit(&self) -> u64 {
        self.activity_limit
    }

    /// Whether owner names can be resolved
    pub const fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// One full listing page starting at `cursor`
    ///
    /// # Errors
    ///
    /// Fails when any underlying page request fails
    pub async fn index_page(
        &self,
        filter: &EventFilter,
        cursor: PageCursor,
    ) -> Result<AggregatedPage<Event>, GalleryError> {
        let pages = EventPages::new(&self.events, filter);
        let page = self.aggregator.aggregate(&pages, cursor).await?;
        info!(
            source = self.events.name(),
            count = page.items.len(),
            iterations = page.iterations,
            offset = page.cursor.offset,
            "index page assembled"
        );
        Ok(page)
    }

    /// Event details with the first token slice
    ///
    /// The event and its tokens are fetched concurrently. The event's
    /// counters are replaced by the ones reported with the token listing.
    ///
    /// # Errors
    ///
    /// [`GalleryError::EventNotFound`] for an unknown id, upstream errors otherwise
    pub async fn event_page(&self, id: u64) -> Result<EventPage, GalleryError> {
        let (event, listing) = tokio::join!(
            self.catalog.event(id),
            self.catalog.event_tokens(id, TOKEN_PAGE_SIZE, 0)
        );
        // an unknown event usually fails its token listing too
        let event = event?.ok_or(GalleryError::EventNotFound { id })?;
        let listing = listing?;

        Ok(EventPage {
            event: Event {
                token_count: listing.total,
                transfer_count: listing.transfer_count,
                ..event
            },
            tokens: normalize_tokens(listing.tokens),
            family_url: self.links.family_event(id),
        })
    }

    /// One slice of an event's tokens, ascending by id
    ///
    /// # Errors
    ///
    /// Rejects a zero or oversized `limit`; upstream errors otherwise
    pub async fn event_tokens(
        &self,
        id: u64,
        limit: u64,
        offset: u64,
    ) -> Result<EventTokens, GalleryError> {
        if limit == 0 || limit > MAX_TOKEN_SLICE {
            return Err(GalleryError::invalid(format!(
                "limit must be between 1 and {MAX_TOKEN_SLICE}"
            )));
        }
        let listing = self.catalog.event_tokens(id, limit, offset).await?;
        Ok(EventTokens {
            tokens: normalize_tokens(listing.tokens),
            ..listing
        })
    }

    /// Highlighted events with their headings; missing slots are skipped
    ///
    /// # Errors
    ///
    /// Fails when the upstream call fails
    pub async fn top_events(&self) -> Result<Vec<HighlightedEvent>, GalleryError> {
        let top = self.catalog.top_events().await?;
        Ok([
            ("Most Recent", top.most_recent),
            ("Upcoming Event", top.upcoming),
            ("Most Claimed Token", top.most_claimed),
        ]
        .into_iter()
        .filter_map(|(heading, event)| event.map(|event| HighlightedEvent { heading, event }))
        .collect())
    }

    /// Latest transfers across both chains, newest first
    ///
    /// Without any chain source configured the catalog's own activity
    /// listing is used instead.
    ///
    /// # Errors
    ///
    /// Rejects a zero or oversized `limit`; fails when every source fails
    pub async fn activity(&self, limit: Option<u64>) -> Result<MergedActivity, GalleryError> {
        let limit = limit.unwrap_or(self.activity_limit);
        if limit == 0 || limit > MAX_ACTIVITY_LIMIT {
            return Err(GalleryError::invalid(format!(
                "limit must be between 1 and {MAX_ACTIVITY_LIMIT}"
            )));
        }

        if self.mainnet.is_none() && self.xdai.is_none() {
            debug!("no chain sources configured, using catalog activity");
            // labels are recomputed from the endpoints and chain
            let transfers = self
                .catalog
                .last_transfers(limit)
                .await?
                .into_iter()
                .map(|transfer| {
                    let chain = transfer.chain;
                    transfer.tagged(chain)
                })
                .collect();
            return Ok(MergedActivity {
                transfers: merge_sorted(
                    transfers,
                    Vec::new(),
                    usize::try_from(limit).unwrap_or(usize::MAX),
                ),
                failures: Vec::new(),
            });
        }

        Ok(merge_activity(self.mainnet.as_ref(), self.xdai.as_ref(), limit).await?)
    }

    /// Every token holder of an event as CSV, with owner names when available
    ///
    /// Enrichment failure does not fail the export; the result is labelled as
    /// being without names instead. Progress is published to `progress`.
    ///
    /// # Errors
    ///
    /// [`GalleryError::EventNotFound`] for an unknown id; any failed token
    /// page fails the export
    pub async fn export_csv(
        &self,
        id: u64,
        progress: Option<watch::Sender<EnrichmentStatus>>,
    ) -> Result<CsvExport, GalleryError> {
        let page = self.event_page(id).await?;
        let tokens =
            complete_event_tokens(&self.catalog, id, page.event.token_count, page.tokens).await?;

        let mut pipeline = EnrichmentPipeline::new(self.resolver.as_ref());
        if let Some(progress) = progress {
            pipeline = pipeline.with_progress(progress);
        }
        let enrichment = pipeline.enrich(&tokens).await;

        let export = render_csv(&page.event.name, &enrichment.tokens, enrichment.status);
        info!(
            event_id = id,
            rows = export.rows,
            power = export.power,
            status = export.status.as_str(),
            "CSV export rendered"
        );
        Ok(export)
    }

    /// Probe every backend concurrently
    ///
    /// Unconfigured backends are reported as disabled. A backend serving more
    /// than one role is reported once.
    pub async fn health(&self) -> Vec<SourceHealth> {
        let (events, catalog, mainnet, xdai, resolver) = tokio::join!(
            probe(Some(&self.events), "events"),
            probe(Some(&self.catalog), "catalog"),
            probe(self.mainnet.as_ref(), "mainnet-subgraph"),
            probe(self.xdai.as_ref(), "xdai-subgraph"),
            probe(self.resolver.as_ref(), "ens"),
        );
        let mut reports = vec![events, catalog, mainnet, xdai, resolver];
        reports.dedup_by(|a, b| a.source == b.source);
        reports
    }
}

async fn probe<T: ApiClient>(client: Option<&T>, fallback_name: &'static str) -> SourceHealth {
    let Some(client) = client else {
        return SourceHealth::disabled(fallback_name);
    };
    let start = Instant::now();
    let status = client
        .health_check()
        .await
        .unwrap_or_else(|error| HealthStatus::Down {
            reason: error.to_string(),
        });
    SourceHealth::new(client.name(), status, start.elapsed())
}
