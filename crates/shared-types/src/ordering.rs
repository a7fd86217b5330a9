// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Ordering options for event listings

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Field an event listing can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Event identifier
    Id,
    /// Number of minted tokens ("Supply")
    TokenCount,
    /// Number of token transfers
    TransferCount,
    /// Event start date
    #[serde(rename = "start_date")]
    Date,
    /// Event city
    City,
}

impl OrderType {
    /// Query value sent to the backends
    pub const fn value(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::TokenCount => "token_count",
            Self::TransferCount => "transfer_count",
            Self::Date => "start_date",
            Self::City => "city",
        }
    }

    /// Display name
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::TokenCount => "Supply",
            Self::TransferCount => "Transfers",
            Self::Date => "Date",
            Self::City => "City",
        }
    }

    /// Whether the ordering relies on on-chain counters rather than event fields
    pub const fn is_blockchain(self) -> bool {
        matches!(self, Self::TokenCount | Self::TransferCount)
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "token_count" => Ok(Self::TokenCount),
            "transfer_count" => Ok(Self::TransferCount),
            "start_date" | "date" => Ok(Self::Date),
            "city" => Ok(Self::City),
            other => Err(format!("unknown order type: {other}")),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Ascending
    Asc,
    /// Descending
    #[default]
    Desc,
}

impl OrderDirection {
    /// Query value sent to the backends
    pub const fn value(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// A complete ordering: field plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct OrderBy {
    /// Field to sort by
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Direction
    pub order: OrderDirection,
}

impl OrderBy {
    /// Create a new ordering
    pub const fn new(order_type: OrderType, order: OrderDirection) -> Self {
        Self { order_type, order }
    }

    /// Whether this ordering must be served by the blockchain-backed listing
    pub const fn is_blockchain(&self) -> bool {
        self.order_type.is_blockchain()
    }
}

impl Default for OrderBy {
    fn default() -> Self {
        Self::new(OrderType::Id, OrderDirection::Desc)
    }
}
