// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Per-chain POAP subgraph integration
//!
//! One [`SubgraphClient`] indexes one chain. Records are tagged with that chain
//! and classified on the way out.

use alloy_primitives::Address;
use api_client::{ActivitySource, ApiClient, ApiError, HealthStatus, Transfer};
use serde::Deserialize;
use serde_json::json;
use shared_types::Chain;
use tracing::{debug, error};

use crate::{
    graphql::{GraphQlEndpoint, GraphQlError},
    non_empty_string::NonEmptyString,
};

const RECENT_TRANSFERS_QUERY: &str = "query RecentTransfers($limit: Int!) {
  transfers(first: $limit, orderBy: timestamp, orderDirection: desc) {
    id
    timestamp
    from { id }
    to { id }
    token {
      id
      transferCount
      event { id }
    }
  }
}";

/// Subgraph client for a single chain
#[derive(Debug, Clone)]
pub struct SubgraphClient {
    chain: Chain,
    endpoint: GraphQlEndpoint,
}

#[derive(Debug, Deserialize)]
struct TransfersData {
    transfers: Vec<TransferRow>,
}

#[derive(Debug, Deserialize)]
struct TransferRow {
    timestamp: String,
    from: EntityRef<Address>,
    to: EntityRef<Address>,
    token: TokenRow,
}

#[derive(Debug, Deserialize)]
struct EntityRef<T> {
    id: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenRow {
    id: String,
    #[serde(default)]
    transfer_count: Option<String>,
    #[serde(default)]
    event: Option<EntityRef<String>>,
}

impl TransferRow {
    fn into_transfer(self, chain: Chain) -> Result<Transfer, GraphQlError> {
        let invalid = |field: &str, value: &str| GraphQlError::Query {
            messages: vec![format!("invalid {field} in transfer record: {value}")],
        };

        let token_id = self
            .token
            .id
            .parse()
            .map_err(|_| invalid("token id", &self.token.id))?;
        let timestamp = self
            .timestamp
            .parse()
            .map_err(|_| invalid("timestamp", &self.timestamp))?;

        let mut transfer = Transfer::new(token_id, self.from.id, self.to.id, timestamp, chain);
        transfer.event_id = self
            .token
            .event
            .and_then(|event| event.id.parse().ok());
        transfer.transfer_count = self
            .token
            .transfer_count
            .and_then(|count| count.parse().ok())
            .unwrap_or_default();
        Ok(transfer)
    }
}

impl SubgraphClient {
    /// Create a client for `chain` served at `url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built
    pub fn new(chain: Chain, url: &NonEmptyString, timeout_seconds: u64) -> Result<Self, GraphQlError> {
        Ok(Self {
            chain,
            endpoint: GraphQlEndpoint::with_timeouts(url, timeout_seconds, 5)?,
        })
    }

    /// Fetch the `limit` most recent transfers on this chain
    pub async fn transfers(&self, limit: u64) -> Result<Vec<Transfer>, GraphQlError> {
        debug!(chain = %self.chain, limit, "querying subgraph transfers");

        let data: TransfersData = self
            .endpoint
            .query(RECENT_TRANSFERS_QUERY, json!({ "limit": limit }))
            .await?;

        data.transfers
            .into_iter()
            .map(|row| row.into_transfer(self.chain))
            .collect()
    }
}

impl ApiClient for SubgraphClient {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        Ok(self.endpoint.probe(self.name()).await?)
    }

    fn name(&self) -> &'static str {
        match self.chain {
            Chain::Mainnet => "mainnet-subgraph",
            Chain::Xdai => "xdai-subgraph",
        }
    }
}

impl ActivitySource for SubgraphClient {
    fn chain(&self) -> Chain {
        self.chain
    }

    async fn recent_transfers(&self, limit: u64) -> Result<Vec<Transfer>, ApiError> {
        self.transfers(limit).await.map_err(|e| {
            error!(chain = %self.chain, "Failed to fetch transfers from subgraph: {}", e);
            e.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use shared_types::ActivityType;

    use super::*;

    fn row(from: &str, to: &str) -> TransferRow {
        serde_json::from_value(json!({
            "id": "0xabc-1",
            "timestamp": "1666094400",
            "from": { "id": from },
            "to": { "id": to },
            "token": { "id": "4021", "transferCount": "3", "event": { "id": "88" } }
        }))
        .unwrap()
    }

    #[test]
    fn mint_on_xdai_is_claim() {
        let transfer = row(
            "0x0000000000000000000000000000000000000000",
            "0x1111111111111111111111111111111111111111",
        )
        .into_transfer(Chain::Xdai)
        .unwrap();

        assert_eq!(transfer.activity_type, ActivityType::Claim);
        assert_eq!(transfer.chain, Chain::Xdai);
        assert_eq!(transfer.token_id, 4021);
        assert_eq!(transfer.event_id, Some(88));
        assert_eq!(transfer.transfer_count, 3);
        assert_eq!(transfer.timestamp, 1_666_094_400);
    }

    #[test]
    fn mint_on_mainnet_is_migration() {
        let transfer = row(
            "0x0000000000000000000000000000000000000000",
            "0x1111111111111111111111111111111111111111",
        )
        .into_transfer(Chain::Mainnet)
        .unwrap();
        assert_eq!(transfer.activity_type, ActivityType::Migration);
    }

    #[test]
    fn invalid_timestamp_is_rejected() {
        let mut bad = row(
            "0x1111111111111111111111111111111111111111",
            "0x2222222222222222222222222222222222222222",
        );
        bad.timestamp = "yesterday".to_string();
        assert!(matches!(
            bad.into_transfer(Chain::Xdai),
            Err(GraphQlError::Query { .. })
        ));
    }
}
