// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Page-filling aggregation over sources that may return short pages
//!
//! Some listings filter after paging, so a request for `n` items can come back
//! with fewer even though more exist. [`PageAggregator`] keeps asking until the
//! page is full, the source runs dry, or the iteration ceiling is reached.
//!
//! The cursor is an explicit value: it goes in with the call and the advanced
//! cursor comes back with the result.

use api_client::{ApiError, Event, EventFilter, EventSource, Page};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

/// Items per logical page
pub const PAGE_LIMIT: u64 = 20;

/// Upper bound on source calls per logical page
pub const MAX_ITERATIONS: u32 = 10;

/// A source of numbered pages
pub trait PageSource: Send + Sync {
    /// Item type of the collection
    type Item: Send;

    /// Fetch `limit` items starting at `offset`
    fn fetch_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> impl Future<Output = Result<Page<Self::Item>, ApiError>> + Send;
}

/// Event listing bound to a fixed filter
#[derive(Debug)]
pub struct EventPages<'a, S> {
    source: &'a S,
    filter: &'a EventFilter,
}

impl<'a, S: EventSource> EventPages<'a, S> {
    /// Page through `source` with `filter`
    pub fn new(source: &'a S, filter: &'a EventFilter) -> Self {
        Self { source, filter }
    }
}

impl<S: EventSource> PageSource for EventPages<'_, S> {
    type Item = Event;

    fn fetch_page(
        &self,
        offset: u64,
        limit: u64,
    ) -> impl Future<Output = Result<Page<Event>, ApiError>> + Send {
        self.source.fetch_events(self.filter, offset, limit)
    }
}

/// Position in a paginated listing, owned by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageCursor {
    /// Offset of the next item to request from the source
    pub offset: u64,
    /// Logical page number, zero for the first page
    pub page: u64,
    /// Collection size last reported by the source
    pub total: u64,
}

impl PageCursor {
    /// Cursor for the following logical page
    #[must_use]
    pub const fn next_page(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }

    /// Whether this cursor points at the first page
    pub const fn is_first_page(&self) -> bool {
        self.page == 0
    }
}

/// How the source offset moves after a non-empty response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OffsetAdvance {
    /// Advance by the number of items kept from the response
    #[default]
    Received,
    /// Advance by the batch size that was requested
    ///
    /// For sources that filter after paging: the filtered-out rows were still
    /// consumed at the source, so the next request must skip them too.
    RequestedBatch,
}

/// One assembled logical page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedPage<T> {
    /// Collected items, never more than the limit
    pub items: Vec<T>,
    /// Cursor after this page
    pub cursor: PageCursor,
    /// Number of source calls made
    pub iterations: u32,
}

/// Fills logical pages from a [`PageSource`]
#[derive(Debug, Clone, Copy)]
pub struct PageAggregator {
    limit: u64,
    max_iterations: u32,
    advance: OffsetAdvance,
}

impl Default for PageAggregator {
    fn default() -> Self {
        Self::new(PAGE_LIMIT)
    }
}

impl PageAggregator {
    /// Aggregator producing `limit` items per page
    pub const fn new(limit: u64) -> Self {
        Self {
            limit,
            max_iterations: MAX_ITERATIONS,
            advance: OffsetAdvance::Received,
        }
    }

    /// Change the offset policy
    #[must_use]
    pub const fn with_advance(mut self, advance: OffsetAdvance) -> Self {
        self.advance = advance;
        self
    }

    /// Change the iteration ceiling
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Items per page
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Assemble one logical page starting at `cursor`
    ///
    /// Stops when the page is full, a call returns no items, the source
    /// reports a total of zero, or the iteration ceiling is hit. Partial pages
    /// are returned as they are. A failed call fails the whole page.
    pub async fn aggregate<S: PageSource>(
        &self,
        source: &S,
        cursor: PageCursor,
    ) -> Result<AggregatedPage<S::Item>, ApiError> {
        let mut items: Vec<S::Item> = Vec::new();
        let mut offset = cursor.offset;
        let mut total = cursor.total;
        let mut iterations = 0;

        while (items.len() as u64) < self.limit && iterations < self.max_iterations {
            let batch = self.limit - items.len() as u64;
            let page = source.fetch_page(offset, batch).await?;
            iterations += 1;

            let received = page.items.len() as u64;
            debug!(offset, batch, received, total = page.total, "fetched page batch");

            if received == 0 {
                break;
            }

            let kept = received.min(batch);
            items.extend(page.items.into_iter().take(usize::try_from(kept).unwrap_or(usize::MAX)));
            offset += match self.advance {
                OffsetAdvance::Received => kept,
                OffsetAdvance::RequestedBatch => batch,
            };

            if page.total == 0 {
                break;
            }
            total = page.total;
        }

        Ok(AggregatedPage {
            items,
            cursor: PageCursor {
                offset,
                page: cursor.page,
                total,
            },
            iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Scripted source returning a fixed batch size per call
    #[derive(Debug)]
    struct Scripted {
        batches: Mutex<Vec<u64>>,
        total: u64,
        calls: Mutex<Vec<(u64, u64)>>,
    }

    impl Scripted {
        fn new(batches: &[u64], total: u64) -> Self {
            let mut batches = batches.to_vec();
            batches.reverse();
            Self {
                batches: Mutex::new(batches),
                total,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(u64, u64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PageSource for Scripted {
        type Item = u64;

        async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Page<u64>, ApiError> {
            self.calls.lock().unwrap().push((offset, limit));
            let size = self.batches.lock().unwrap().pop().unwrap_or(0);
            Ok(Page {
                items: (offset..offset + size).collect(),
                total: self.total,
            })
        }
    }

    /// Source that always fills whatever is requested
    #[derive(Debug)]
    struct Full;

    impl PageSource for Full {
        type Item = u64;

        async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Page<u64>, ApiError> {
            Ok(Page {
                items: (offset..offset + limit).collect(),
                total: 1_000,
            })
        }
    }

    /// Source that always returns a short page
    #[derive(Debug)]
    struct Trickle;

    impl PageSource for Trickle {
        type Item = u64;

        async fn fetch_page(&self, offset: u64, _limit: u64) -> Result<Page<u64>, ApiError> {
            Ok(Page {
                items: vec![offset],
                total: 1_000,
            })
        }
    }

    #[tokio::test]
    async fn full_source_needs_one_iteration() {
        let page = PageAggregator::default()
            .aggregate(&Full, PageCursor::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.iterations, 1);
        assert_eq!(page.cursor.offset, 20);
        assert_eq!(page.cursor.total, 1_000);
    }

    #[tokio::test]
    async fn empty_source_stops_after_one_iteration() {
        let source = Scripted::new(&[], 0);
        let page = PageAggregator::default()
            .aggregate(&source, PageCursor::default())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.iterations, 1);
        assert_eq!(page.cursor.offset, 0);
    }

    #[tokio::test]
    async fn short_batches_are_topped_up() {
        let source = Scripted::new(&[12, 8], 500);
        let page = PageAggregator::default()
            .aggregate(&source, PageCursor::default())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 20);
        assert_eq!(page.cursor.offset, 20);
        assert_eq!(source.calls(), vec![(0, 20), (12, 8)]);
        assert_eq!(page.items, (0..20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn requested_batch_policy_skips_consumed_rows() {
        let source = Scripted::new(&[12, 8], 500);
        let page = PageAggregator::default()
            .with_advance(OffsetAdvance::RequestedBatch)
            .aggregate(&source, PageCursor::default())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 20);
        assert_eq!(source.calls(), vec![(0, 20), (20, 8)]);
        assert_eq!(page.cursor.offset, 28);
    }

    #[tokio::test]
    async fn iteration_ceiling_bounds_short_sources() {
        let page = PageAggregator::default()
            .aggregate(&Trickle, PageCursor::default())
            .await
            .unwrap();
        assert_eq!(page.iterations, MAX_ITERATIONS);
        assert_eq!(page.items.len(), 10);
        assert!(page.items.len() as u64 <= PAGE_LIMIT);
    }

    #[tokio::test]
    async fn zero_total_stops_the_loop() {
        let source = Scripted::new(&[5, 5, 5], 0);
        let page = PageAggregator::default()
            .aggregate(&source, PageCursor::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.iterations, 1);
        assert_eq!(page.cursor.total, 0);
    }

    #[tokio::test]
    async fn oversized_response_is_truncated() {
        let source = Scripted::new(&[30], 100);
        let page = PageAggregator::new(20)
            .aggregate(&source, PageCursor::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.cursor.offset, 20);
    }

    #[tokio::test]
    async fn zero_limit_makes_no_calls() {
        let source = Scripted::new(&[5], 10);
        let page = PageAggregator::new(0)
            .aggregate(&source, PageCursor::default())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.iterations, 0);
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn cursor_round_trips_page_and_offset() {
        let source = Scripted::new(&[20], 60);
        let start = PageCursor {
            offset: 20,
            page: 1,
            total: 60,
        };
        let page = PageAggregator::default()
            .aggregate(&source, start)
            .await
            .unwrap();
        assert_eq!(source.calls(), vec![(20, 20)]);
        assert_eq!(page.cursor.offset, 40);
        assert_eq!(page.cursor.page, 1);
        assert_eq!(page.cursor.next_page().page, 2);
    }

    #[tokio::test]
    async fn source_error_fails_the_page() {
        #[derive(Debug)]
        struct Broken;

        impl PageSource for Broken {
            type Item = u64;

            async fn fetch_page(&self, _offset: u64, _limit: u64) -> Result<Page<u64>, ApiError> {
                Err(ApiError::Status {
                    status: 500,
                    message: "boom".to_string(),
                })
            }
        }

        let result = PageAggregator::default()
            .aggregate(&Broken, PageCursor::default())
            .await;
        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
    }
}
