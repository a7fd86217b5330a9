// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Compass GraphQL indexer integration
//!
//! Compass serves drops (events) with per-chain statistics. A page of drops and
//! the matching aggregate count are two separate queries; they are sent
//! concurrently and combined into one [`Page`].

use api_client::{ApiClient, ApiError, Event, EventFilter, EventSource, HealthStatus, Page};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use shared_types::{OrderBy, OrderType};
use tracing::{debug, error};

use crate::{
    graphql::{GraphQlEndpoint, GraphQlError},
    non_empty_string::NonEmptyString,
};

const DROP_FIELDS: &str = "
    id
    fancy_id
    name
    description
    city
    country
    image_url
    start_date
    end_date
    virtual
    stats_by_chain_aggregate {
      aggregate {
        sum {
          transfer_count
          poap_count
        }
      }
    }";

const PAGINATED_DROPS_QUERY: &str = "query PaginatedDrops($limit: Int!, $offset: Int!, $orderBy: [drops_order_by!], $where: drops_bool_exp) {
  drops(limit: $limit, offset: $offset, order_by: $orderBy, where: $where) {";

const SEARCH_PAGINATED_DROPS_QUERY: &str = "query SearchPaginatedDrops($limit: Int!, $offset: Int!, $orderBy: [drops_order_by!], $where: drops_bool_exp, $search: String = \"\") {
  search_drops(limit: $limit, offset: $offset, order_by: $orderBy, where: $where, args: {search: $search}) {";

const DROPS_COUNT_QUERY: &str = "query PaginatedCountDrops($where: drops_bool_exp) {
  drops_aggregate(where: $where) { aggregate { count } }
}";

const SEARCH_DROPS_COUNT_QUERY: &str = "query SearchPaginatedCountDrops($where: drops_bool_exp, $search: String = \"\") {
  search_drops_aggregate(where: $where, args: {search: $search}) { aggregate { count } }
}";

/// Compass GraphQL client
#[derive(Debug, Clone)]
pub struct CompassClient {
    endpoint: GraphQlEndpoint,
}

#[derive(Debug, Deserialize)]
struct DropsData {
    #[serde(alias = "search_drops")]
    drops: Vec<DropRow>,
}

#[derive(Debug, Deserialize)]
struct DropRow {
    id: u64,
    fancy_id: Option<String>,
    name: String,
    description: Option<String>,
    city: Option<String>,
    country: Option<String>,
    image_url: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(rename = "virtual")]
    virtual_event: Option<bool>,
    #[serde(default)]
    stats_by_chain_aggregate: Option<StatsAggregate>,
}

#[derive(Debug, Default, Deserialize)]
struct StatsAggregate {
    aggregate: Option<StatsSum>,
}

#[derive(Debug, Default, Deserialize)]
struct StatsSum {
    sum: Option<StatsCounters>,
}

#[derive(Debug, Default, Deserialize)]
struct StatsCounters {
    transfer_count: Option<u64>,
    poap_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CountData {
    #[serde(alias = "search_drops_aggregate")]
    drops_aggregate: AggregateCount,
}

#[derive(Debug, Deserialize)]
struct AggregateCount {
    aggregate: Count,
}

#[derive(Debug, Deserialize)]
struct Count {
    count: u64,
}

impl From<DropRow> for Event {
    fn from(row: DropRow) -> Self {
        let counters = row
            .stats_by_chain_aggregate
            .and_then(|stats| stats.aggregate)
            .and_then(|aggregate| aggregate.sum)
            .unwrap_or_default();

        Self {
            id: row.id,
            fancy_id: row.fancy_id,
            name: row.name,
            description: row.description,
            city: row.city,
            country: row.country,
            virtual_event: row.virtual_event,
            start_date: row.start_date,
            end_date: row.end_date,
            image_url: row.image_url,
            token_count: counters.poap_count.unwrap_or_default(),
            transfer_count: counters.transfer_count.unwrap_or_default(),
        }
    }
}

/// Build the `order_by` argument for a drops query
///
/// Counter orderings sort on the per-chain statistics sum, id orderings are a
/// single object, anything else falls back to id descending as a tie-breaker.
pub fn order_by_clause(order_by: Option<OrderBy>) -> Value {
    let Some(order_by) = order_by else {
        return json!({});
    };
    let key = order_by.order_type.value();
    let dir = order_by.order.value();

    match order_by.order_type {
        OrderType::TokenCount | OrderType::TransferCount => json!([
            { "stats_by_chain_aggregate": { "sum": { key: dir } } },
            { "id": "desc" }
        ]),
        OrderType::Id => json!({ key: dir }),
        OrderType::Date | OrderType::City => json!([{ key: dir }, { "id": "desc" }]),
    }
}

/// Build the `where` argument for a drops query
pub fn where_clause(filter: &EventFilter) -> Value {
    let mut clause = Map::new();
    if let Some(private) = filter.private_events {
        clause.insert("private".to_string(), json!({ "_eq": private }));
    }
    if !filter.event_ids.is_empty() {
        clause.insert("id".to_string(), json!({ "_in": filter.event_ids }));
    }
    Value::Object(clause)
}

impl CompassClient {
    /// Create a new compass client
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built
    pub fn new(url: &NonEmptyString, timeout_seconds: u64) -> Result<Self, GraphQlError> {
        Ok(Self {
            endpoint: GraphQlEndpoint::with_timeouts(url, timeout_seconds, 5)?,
        })
    }

    /// Fetch one page of drops and the matching total
    pub async fn drops(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Event>, GraphQlError> {
        let order_by = order_by_clause(filter.order_by);
        let where_ = where_clause(filter);

        let (page_query, count_query, variables, count_variables) = match &filter.name {
            Some(search) => (
                format!("{SEARCH_PAGINATED_DROPS_QUERY}{DROP_FIELDS}\n  }}\n}}"),
                SEARCH_DROPS_COUNT_QUERY,
                json!({
                    "limit": limit,
                    "offset": offset,
                    "orderBy": order_by,
                    "where": where_,
                    "search": search,
                }),
                json!({ "where": where_, "search": search }),
            ),
            None => (
                format!("{PAGINATED_DROPS_QUERY}{DROP_FIELDS}\n  }}\n}}"),
                DROPS_COUNT_QUERY,
                json!({
                    "limit": limit,
                    "offset": offset,
                    "orderBy": order_by,
                    "where": where_,
                }),
                json!({ "where": where_ }),
            ),
        };

        debug!(offset, limit, search = filter.name.is_some(), "querying compass drops");

        let (drops, count) = tokio::try_join!(
            self.endpoint.query::<_, DropsData>(&page_query, variables),
            self.endpoint.query::<_, CountData>(count_query, count_variables),
        )?;

        Ok(Page {
            items: drops.drops.into_iter().map(Event::from).collect(),
            total: count.drops_aggregate.aggregate.count,
        })
    }
}

impl ApiClient for CompassClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        Ok(self.endpoint.probe(self.name()).await?)
    }

    fn name(&self) -> &'static str {
        "compass"
    }
}

impl EventSource for CompassClient {
    async fn fetch_events(
        &self,
        filter: &EventFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Page<Event>, ApiError> {
        self.drops(filter, offset, limit).await.map_err(|e| {
            error!(offset, limit, "Failed to fetch drops from compass: {}", e);
            e.into()
        })
    }
}
