// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Activity classification for token ownership changes

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::Chain;

/// Kind of ownership change recorded for a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityType {
    /// Token minted on the sidechain
    Claim,
    /// Token moved between two regular accounts
    Transfer,
    /// Token bridged onto the primary chain
    Migration,
    /// Token sent to the zero address
    Burn,
}

impl ActivityType {
    /// Classify a transfer from its endpoints and the chain it was indexed on
    ///
    /// A mint (`from` is the zero address) is a claim on the sidechain and a
    /// migration on the primary chain. The mint check runs before the burn
    /// check, so a degenerate zero-to-zero record is never a burn.
    pub fn classify(from: &Address, to: &Address, chain: Chain) -> Self {
        if from.is_zero() {
            if chain.is_sidechain() {
                Self::Claim
            } else {
                Self::Migration
            }
        } else if to.is_zero() {
            Self::Burn
        } else {
            Self::Transfer
        }
    }

    /// Upper-case label used by the presentation layer
    pub const fn label(self) -> &'static str {
        match self {
            Self::Claim => "CLAIM",
            Self::Transfer => "TRANSFER",
            Self::Migration => "MIGRATION",
            Self::Burn => "BURN",
        }
    }
}
