// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Normalized gallery data types
//!
//! Backends disagree on casing and on whether counters are numbers or
//! strings. These types accept both on input and always serialize camelCase.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use shared_types::{ActivityType, Chain, OrderBy};
use utoipa::ToSchema;

/// An event (drop) and its read-only counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Event identifier
    #[serde(deserialize_with = "lenient::number")]
    pub id: u64,
    /// URL slug
    #[serde(default, alias = "fancy_id")]
    pub fancy_id: Option<String>,
    /// Display name
    pub name: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub description: Option<String>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub city: Option<String>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub country: Option<String>,
    /// Online-only event
    #[serde(default, rename = "virtual")]
    pub virtual_event: Option<bool>,
    /// Start date as reported by the backend
    #[serde(default, alias = "start_date")]
    pub start_date: Option<String>,
    /// End date as reported by the backend
    #[serde(default, alias = "end_date")]
    pub end_date: Option<String>,
    /// Artwork
    #[serde(default, alias = "image_url")]
    pub image_url: Option<String>,
    /// Number of minted tokens
    #[serde(default, alias = "token_count", deserialize_with = "lenient::number")]
    pub token_count: u64,
    /// Number of token transfers
    #[serde(
        default,
        alias = "transfer_count",
        deserialize_with = "lenient::number"
    )]
    pub transfer_count: u64,
}

/// An account holding tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Chain address
    #[schema(value_type = String)]
    pub id: Address,
    /// Tokens currently held ("power")
    #[serde(default, alias = "tokens_owned", deserialize_with = "lenient::number")]
    pub tokens_owned: u64,
    /// Tokens ever minted to this account
    #[serde(default, alias = "tokens_minted", deserialize_with = "lenient::number")]
    pub tokens_minted: u64,
    /// Reverse-resolved display name, filled in by enrichment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ens: Option<String>,
}

/// A token minted for an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Token identifier
    #[serde(deserialize_with = "lenient::number")]
    pub id: u64,
    /// Current owner
    pub owner: Account,
    /// Mint timestamp as reported by the backend
    #[serde(default)]
    pub created: Option<String>,
    /// Number of transfers of this token
    #[serde(
        default,
        alias = "transfer_count",
        deserialize_with = "lenient::number"
    )]
    pub transfer_count: u64,
    /// Parent event
    #[serde(default, alias = "event_id")]
    pub event_id: Option<u64>,
}

/// One ownership change of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    /// Token identifier
    #[serde(alias = "token_id", deserialize_with = "lenient::number")]
    pub token_id: u64,
    /// Parent event
    #[serde(default, alias = "event_id")]
    pub event_id: Option<u64>,
    /// Parent event artwork
    #[serde(default, alias = "event_image")]
    pub event_image: Option<String>,
    /// Previous owner
    #[schema(value_type = String)]
    pub from: Address,
    /// New owner
    #[schema(value_type = String)]
    pub to: Address,
    /// Number of transfers of this token
    #[serde(
        default,
        alias = "transfer_count",
        deserialize_with = "lenient::number"
    )]
    pub transfer_count: u64,
    /// Unix timestamp in seconds
    #[serde(deserialize_with = "lenient::timestamp")]
    pub timestamp: i64,
    /// Classification of the change
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Chain the record was indexed on
    pub chain: Chain,
}

impl Transfer {
    /// Build a transfer record, deriving its classification from the endpoints
    pub fn new(token_id: u64, from: Address, to: Address, timestamp: i64, chain: Chain) -> Self {
        Self {
            token_id,
            event_id: None,
            event_image: None,
            from,
            to,
            transfer_count: 0,
            timestamp,
            activity_type: ActivityType::classify(&from, &to, chain),
            chain,
        }
    }

    /// Re-tag this record with the chain it was fetched from
    ///
    /// The classification is recomputed because it depends on the chain.
    #[must_use]
    pub fn tagged(self, chain: Chain) -> Self {
        Self {
            activity_type: ActivityType::classify(&self.from, &self.to, chain),
            chain,
            ..self
        }
    }
}

/// One page of a paginated collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    /// Items in this page
    #[serde(default)]
    pub items: Vec<T>,
    /// Total size of the collection as reported by the backend
    #[serde(default, deserialize_with = "lenient::number")]
    pub total: u64,
}

impl<T> Page<T> {
    /// A page with no items and no total
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// A slice of an event's tokens plus the event-wide counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventTokens {
    /// Tokens in this slice
    #[serde(default)]
    pub tokens: Vec<Token>,
    /// Total tokens minted for the event
    #[serde(default, deserialize_with = "lenient::number")]
    pub total: u64,
    /// Total transfers across the event's tokens
    #[serde(
        default,
        alias = "transfer_count",
        deserialize_with = "lenient::number"
    )]
    pub transfer_count: u64,
}

/// The three highlighted events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopEvents {
    #[serde(default)]
    #[allow(missing_docs)]
    pub most_recent: Option<Event>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub upcoming: Option<Event>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub most_claimed: Option<Event>,
}

/// Filters for an event listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Free-text name search
    pub name: Option<String>,
    /// Restrict to these event ids
    pub event_ids: Vec<u64>,
    /// Requested ordering
    pub order_by: Option<OrderBy>,
    /// Include (or only show) private events
    pub private_events: Option<bool>,
}

impl EventFilter {
    /// Filter by name; blank names are treated as no filter
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = (!name.trim().is_empty()).then_some(name);
        self
    }

    /// Set the ordering
    #[must_use]
    pub fn with_order(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// Whether the listing must come from the blockchain-ordered endpoint
    pub fn is_blockchain_ordered(&self) -> bool {
        self.order_by.is_some_and(|order| order.is_blockchain())
    }
}

/// Deserializers tolerant of numbers sent as strings or nulls
mod lenient {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Unsigned(u64),
        Signed(i64),
        Float(f64),
        Text(String),
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(super) fn number<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(0),
            Some(Raw::Unsigned(value)) => Ok(value),
            Some(Raw::Signed(value)) => u64::try_from(value).map_err(D::Error::custom),
            Some(Raw::Float(value)) if value >= 0.0 && value.fract() == 0.0 => Ok(value as u64),
            Some(Raw::Float(value)) => Err(D::Error::custom(format!("not a count: {value}"))),
            Some(Raw::Text(text)) if text.trim().is_empty() => Ok(0),
            Some(Raw::Text(text)) => text.trim().parse().map_err(D::Error::custom),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(super) fn timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Unsigned(value) => i64::try_from(value).map_err(D::Error::custom),
            Raw::Signed(value) => Ok(value),
            Raw::Float(value) => Ok(value as i64),
            Raw::Text(text) => text.trim().parse().map_err(D::Error::custom),
        }
    }
}
