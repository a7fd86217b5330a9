// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Dual-chain activity merge
//!
//! The primary (mainnet) and secondary (xdai) feeds are fetched concurrently,
//! tagged with their chain, interleaved newest first and cut to the limit.
//! A failing source degrades the result to the other source's records.

use api_client::{ActivitySource, ApiClient, ApiError, Transfer};
use serde::Serialize;
use shared_types::Chain;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

/// Records shown in the activity feed
pub const ACTIVITY_LIMIT: u64 = 15;

/// Largest feed a caller may request; subgraphs cap `first` at 1000
pub const MAX_ACTIVITY_LIMIT: u64 = 1000;

/// A merge source that could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceFailure {
    /// Chain the source indexes
    pub chain: Chain,
    /// Client name
    pub source: String,
    /// Error text
    pub message: String,
}

/// Result of a merge where at least one source answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MergedActivity {
    /// Transfers, newest first
    pub transfers: Vec<Transfer>,
    /// Sources that failed; empty for a complete merge
    pub failures: Vec<SourceFailure>,
}

impl MergedActivity {
    /// Whether one of the sources failed
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Errors from the activity merge
#[derive(Debug, Error)]
pub enum MergeError {
    /// No activity source is configured
    #[error("No activity source configured")]
    NoSources,

    /// Every configured source failed
    #[error("All activity sources failed: {}", .failures.iter().map(|f| f.message.as_str()).collect::<Vec<_>>().join("; "))]
    AllSourcesFailed {
        /// One entry per failed source
        failures: Vec<SourceFailure>,
    },
}

/// Interleave two feeds newest first and keep at most `limit` records
///
/// The sort is stable and `primary` goes first, so on equal timestamps
/// primary records precede secondary ones.
pub fn merge_sorted(primary: Vec<Transfer>, secondary: Vec<Transfer>, limit: usize) -> Vec<Transfer> {
    let mut merged = primary;
    merged.extend(secondary);
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.truncate(limit);
    merged
}

async fn read_source<S: ActivitySource>(
    source: Option<&S>,
    limit: u64,
) -> Option<Result<Vec<Transfer>, SourceFailure>> {
    let source = source?;
    let chain = source.chain();
    let result = source
        .recent_transfers(limit)
        .await
        .map(|transfers| {
            transfers
                .into_iter()
                .map(|transfer| transfer.tagged(chain))
                .collect()
        })
        .map_err(|error: ApiError| {
            warn!(source = source.name(), %error, "activity source failed");
            SourceFailure {
                chain,
                source: source.name().to_string(),
                message: error.to_string(),
            }
        });
    Some(result)
}

/// Fetch both feeds concurrently and merge them
///
/// A source passed as `None` is not configured and does not count as a
/// failure. Each record is tagged with the chain of the source it came from.
///
/// # Errors
///
/// [`MergeError::NoSources`] when both sources are `None`,
/// [`MergeError::AllSourcesFailed`] when every configured source failed.
pub async fn merge_activity<P, S>(
    primary: Option<&P>,
    secondary: Option<&S>,
    limit: u64,
) -> Result<MergedActivity, MergeError>
where
    P: ActivitySource,
    S: ActivitySource,
{
    if primary.is_none() && secondary.is_none() {
        return Err(MergeError::NoSources);
    }

    let (primary, secondary) = tokio::join!(
        read_source(primary, limit),
        read_source(secondary, limit)
    );

    let mut failures = Vec::new();
    let mut answered = 0;
    let mut split = |result: Option<Result<Vec<Transfer>, SourceFailure>>| match result {
        Some(Ok(transfers)) => {
            answered += 1;
            transfers
        }
        Some(Err(failure)) => {
            failures.push(failure);
            Vec::new()
        }
        None => Vec::new(),
    };
    let primary = split(primary);
    let secondary = split(secondary);

    if answered == 0 {
        return Err(MergeError::AllSourcesFailed { failures });
    }

    let transfers = merge_sorted(
        primary,
        secondary,
        usize::try_from(limit).unwrap_or(usize::MAX),
    );
    debug!(
        count = transfers.len(),
        failed = failures.len(),
        "merged activity feed"
    );
    Ok(MergedActivity {
        transfers,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::Address;
    use api_client::HealthStatus;
    use shared_types::ActivityType;

    use super::*;

    #[derive(Debug)]
    struct FakeFeed {
        chain: Chain,
        result: Result<Vec<Transfer>, u16>,
    }

    impl FakeFeed {
        fn ok(chain: Chain, timestamps: &[i64]) -> Self {
            let transfers = timestamps
                .iter()
                .enumerate()
                .map(|(i, ts)| {
                    Transfer::new(
                        i as u64,
                        Address::repeat_byte(0x11),
                        Address::repeat_byte(0x22),
                        *ts,
                        // deliberately wrong so the merge has to retag
                        Chain::Mainnet,
                    )
                })
                .collect();
            Self {
                chain,
                result: Ok(transfers),
            }
        }

        fn failing(chain: Chain, status: u16) -> Self {
            Self {
                chain,
                result: Err(status),
            }
        }
    }

    impl ApiClient for FakeFeed {
        async fn health_check(&self) -> Result<HealthStatus, ApiError> {
            Ok(HealthStatus::Up)
        }

        fn name(&self) -> &'static str {
            match self.chain {
                Chain::Mainnet => "mainnet-fake",
                Chain::Xdai => "xdai-fake",
            }
        }
    }

    impl ActivitySource for FakeFeed {
        fn chain(&self) -> Chain {
            self.chain
        }

        async fn recent_transfers(&self, _limit: u64) -> Result<Vec<Transfer>, ApiError> {
            self.result.clone().map_err(|status| ApiError::Status {
                status,
                message: "unavailable".to_string(),
            })
        }
    }

    fn timestamps(transfers: &[Transfer]) -> Vec<i64> {
        transfers.iter().map(|t| t.timestamp).collect()
    }

    #[test]
    fn empty_primary_keeps_secondary_sorted() {
        let t1 = Transfer::new(1, Address::ZERO, Address::repeat_byte(1), 100, Chain::Xdai);
        let t2 = Transfer::new(2, Address::ZERO, Address::repeat_byte(1), 200, Chain::Xdai);
        let merged = merge_sorted(Vec::new(), vec![t1, t2], 15);
        assert_eq!(timestamps(&merged), vec![200, 100]);
    }

    #[test]
    fn result_does_not_depend_on_input_order() {
        let t1 = Transfer::new(1, Address::repeat_byte(3), Address::repeat_byte(1), 100, Chain::Xdai);
        let t2 = Transfer::new(2, Address::repeat_byte(3), Address::repeat_byte(1), 200, Chain::Xdai);

        let expected = vec![t2.clone(), t1.clone()];
        assert_eq!(merge_sorted(vec![t1.clone(), t2.clone()], Vec::new(), 15), expected);
        assert_eq!(merge_sorted(Vec::new(), vec![t2.clone(), t1.clone()], 15), expected);
        assert_eq!(merge_sorted(vec![t1], vec![t2], 15), expected);
    }

    #[test]
    fn ties_keep_primary_first() {
        let a = Transfer::new(1, Address::ZERO, Address::repeat_byte(1), 50, Chain::Mainnet);
        let b = Transfer::new(2, Address::ZERO, Address::repeat_byte(1), 50, Chain::Xdai);
        let merged = merge_sorted(vec![a], vec![b], 15);
        assert_eq!(merged[0].chain, Chain::Mainnet);
        assert_eq!(merged[1].chain, Chain::Xdai);
    }

    #[tokio::test]
    async fn both_sources_interleave_and_truncate() {
        let mainnet = FakeFeed::ok(Chain::Mainnet, &[90, 70, 50, 30]);
        let xdai = FakeFeed::ok(Chain::Xdai, &[80, 60, 40]);

        let merged = merge_activity(Some(&mainnet), Some(&xdai), 5).await.unwrap();

        assert!(!merged.is_partial());
        assert_eq!(timestamps(&merged.transfers), vec![90, 80, 70, 60, 50]);
        assert_eq!(merged.transfers[1].chain, Chain::Xdai);
        assert_eq!(merged.transfers[0].chain, Chain::Mainnet);
    }

    #[tokio::test]
    async fn records_are_reclassified_for_their_chain() {
        let xdai = FakeFeed {
            chain: Chain::Xdai,
            result: Ok(vec![Transfer::new(
                1,
                Address::ZERO,
                Address::repeat_byte(1),
                10,
                Chain::Mainnet,
            )]),
        };
        let merged = merge_activity(None::<&FakeFeed>, Some(&xdai), 15)
            .await
            .unwrap();
        assert_eq!(merged.transfers[0].chain, Chain::Xdai);
        assert_eq!(merged.transfers[0].activity_type, ActivityType::Claim);
    }

    #[tokio::test]
    async fn one_failure_is_partial() {
        let mainnet = FakeFeed::failing(Chain::Mainnet, 503);
        let xdai = FakeFeed::ok(Chain::Xdai, &[3, 2, 1]);

        let merged = merge_activity(Some(&mainnet), Some(&xdai), 15)
            .await
            .unwrap();

        assert!(merged.is_partial());
        assert_eq!(merged.failures.len(), 1);
        assert_eq!(merged.failures[0].chain, Chain::Mainnet);
        assert_eq!(merged.failures[0].source, "mainnet-fake");
        assert_eq!(timestamps(&merged.transfers), vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn both_failing_is_an_error() {
        let mainnet = FakeFeed::failing(Chain::Mainnet, 503);
        let xdai = FakeFeed::failing(Chain::Xdai, 500);

        match merge_activity(Some(&mainnet), Some(&xdai), 15).await {
            Err(MergeError::AllSourcesFailed { failures }) => assert_eq!(failures.len(), 2),
            other => panic!("Expected AllSourcesFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_sources_is_an_error() {
        let result = merge_activity(None::<&FakeFeed>, None::<&FakeFeed>, 15).await;
        assert!(matches!(result, Err(MergeError::NoSources)));
    }

    #[tokio::test]
    async fn missing_source_is_not_a_failure() {
        let mainnet = FakeFeed::ok(Chain::Mainnet, &[5]);
        let merged = merge_activity(Some(&mainnet), None::<&FakeFeed>, 15)
            .await
            .unwrap();
        assert!(!merged.is_partial());
        assert_eq!(merged.transfers.len(), 1);
    }
}
