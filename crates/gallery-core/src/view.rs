// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Index listing state for a presentation layer
//!
//! The view hands out an [`IndexRequest`] per fetch and only accepts the
//! result stamped with the latest epoch. Late answers to superseded requests
//! are dropped.

use api_client::{Event, EventFilter};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    epoch::{EpochTicket, RequestEpoch},
    pagination::{AggregatedPage, PageCursor},
};

/// Loading state of the listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// First page in flight
    Loading,
    /// A further page in flight
    LoadingMore,
    /// Last request succeeded
    Succeeded,
    /// Last request failed
    Failed,
}

/// A fetch the caller should perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRequest {
    /// Stamp to hand back with the result
    pub ticket: EpochTicket,
    /// Filter to query with
    pub filter: EventFilter,
    /// Cursor to aggregate from
    pub cursor: PageCursor,
}

/// Event listing with paging and stale-result protection
#[derive(Debug, Default)]
pub struct IndexView {
    epoch: RequestEpoch,
    filter: EventFilter,
    cursor: PageCursor,
    events: Vec<Event>,
    status: FetchStatus,
    error: Option<String>,
}

impl IndexView {
    /// Empty view with the default filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Events loaded so far
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Current loading state
    pub const fn status(&self) -> FetchStatus {
        self.status
    }

    /// Cursor after the last applied page
    pub const fn cursor(&self) -> PageCursor {
        self.cursor
    }

    /// Active filter
    pub const fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Error text of the last failed request
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the source reported more events than are loaded
    pub fn has_more(&self) -> bool {
        (self.events.len() as u64) < self.cursor.total
    }

    /// Replace the filter and request the first page
    pub fn set_filter(&mut self, filter: EventFilter) -> IndexRequest {
        self.filter = filter;
        self.cursor = PageCursor::default();
        self.request(FetchStatus::Loading)
    }

    /// Request the first page again with the current filter
    pub fn reload(&mut self) -> IndexRequest {
        self.cursor = PageCursor::default();
        self.request(FetchStatus::Loading)
    }

    /// Request the page after the last applied one
    pub fn load_more(&mut self) -> IndexRequest {
        let mut request = self.request(FetchStatus::LoadingMore);
        request.cursor = self.cursor.next_page();
        request
    }

    fn request(&mut self, status: FetchStatus) -> IndexRequest {
        self.status = status;
        IndexRequest {
            ticket: self.epoch.advance(),
            filter: self.filter.clone(),
            cursor: self.cursor,
        }
    }

    /// Apply the result of the request stamped `ticket`
    ///
    /// Returns `false` and leaves the view untouched when a newer request has
    /// been issued since. A first page replaces the listing; later pages
    /// append to it.
    pub fn apply<E: ToString>(
        &mut self,
        ticket: EpochTicket,
        result: Result<AggregatedPage<Event>, E>,
    ) -> bool {
        if !self.epoch.is_current(ticket) {
            debug!(ticket = ticket.value(), "discarding superseded listing result");
            return false;
        }

        match result {
            Ok(page) => {
                if page.cursor.is_first_page() {
                    self.events = page.items;
                } else {
                    self.events.extend(page.items);
                }
                self.cursor = page.cursor;
                self.status = FetchStatus::Succeeded;
                self.error = None;
            }
            Err(error) => {
                self.status = FetchStatus::Failed;
                self.error = Some(error.to_string());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: u64) -> Event {
        serde_json::from_value(serde_json::json!({ "id": id, "name": format!("Event {id}") }))
            .unwrap()
    }

    fn page(ids: std::ops::Range<u64>, cursor: PageCursor) -> AggregatedPage<Event> {
        AggregatedPage {
            items: ids.map(event).collect(),
            cursor,
            iterations: 1,
        }
    }

    #[test]
    fn first_page_replaces_and_later_pages_append() {
        let mut view = IndexView::new();

        let first = view.set_filter(EventFilter::default().with_name("devcon"));
        assert_eq!(view.status(), FetchStatus::Loading);
        assert_eq!(first.cursor, PageCursor::default());
        let cursor = PageCursor {
            offset: 20,
            page: 0,
            total: 45,
        };
        assert!(view.apply::<String>(first.ticket, Ok(page(0..20, cursor))));
        assert_eq!(view.events().len(), 20);
        assert!(view.has_more());

        let more = view.load_more();
        assert_eq!(view.status(), FetchStatus::LoadingMore);
        assert_eq!(more.cursor.page, 1);
        assert_eq!(more.cursor.offset, 20);
        let cursor = PageCursor {
            offset: 40,
            page: 1,
            total: 45,
        };
        assert!(view.apply::<String>(more.ticket, Ok(page(20..40, cursor))));
        assert_eq!(view.events().len(), 40);
        assert_eq!(view.status(), FetchStatus::Succeeded);

        let reset = view.set_filter(EventFilter::default());
        assert_eq!(reset.cursor, PageCursor::default());
        assert!(view.apply::<String>(reset.ticket, Ok(page(100..103, PageCursor::default()))));
        assert_eq!(view.events().len(), 3);
    }

    #[test]
    fn superseded_results_are_discarded() {
        let mut view = IndexView::new();
        let stale = view.set_filter(EventFilter::default().with_name("old"));
        let fresh = view.set_filter(EventFilter::default().with_name("new"));

        assert!(!view.apply::<String>(stale.ticket, Ok(page(0..5, PageCursor::default()))));
        assert!(view.events().is_empty());
        assert_eq!(view.status(), FetchStatus::Loading);

        assert!(view.apply::<String>(fresh.ticket, Ok(page(0..2, PageCursor::default()))));
        assert_eq!(view.events().len(), 2);
        assert_eq!(view.filter().name.as_deref(), Some("new"));
    }

    #[test]
    fn failure_keeps_loaded_events() {
        let mut view = IndexView::new();
        let first = view.reload();
        view.apply::<String>(first.ticket, Ok(page(0..20, PageCursor::default())));

        let more = view.load_more();
        assert!(view.apply(more.ticket, Err("backend returned status 502")));
        assert_eq!(view.status(), FetchStatus::Failed);
        assert_eq!(view.error(), Some("backend returned status 502"));
        assert_eq!(view.events().len(), 20);
    }
}
