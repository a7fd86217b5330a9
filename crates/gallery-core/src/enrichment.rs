// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Owner name enrichment for token listings
//!
//! Owner addresses are resolved in chunks, one chunk at a time, and the
//! results are stitched back in input order. The input tokens are never
//! modified; the enriched listing is built from scratch.

use alloy_primitives::Address;
use api_client::{Account, ApiError, NameResolver, Token};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// Largest address chunk sent to the resolver
pub const ENRICHMENT_CHUNK_SIZE: usize = 1200;

/// Progress of an enrichment run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// Nothing to enrich
    #[default]
    NoData,
    /// A chunk other than the last is being resolved
    Downloading,
    /// The last chunk is being resolved
    DownloadingLastChunk,
    /// Every chunk resolved
    Ready,
    /// No resolver configured; names are left empty
    ReadyWithoutEnrichment,
    /// Resolution failed; names are left empty
    Failed,
}

impl EnrichmentStatus {
    /// Stable identifier, used in response headers
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::Downloading => "downloading",
            Self::DownloadingLastChunk => "downloading_last_chunk",
            Self::Ready => "ready",
            Self::ReadyWithoutEnrichment => "ready_without_enrichment",
            Self::Failed => "failed",
        }
    }

    /// Whether resolution is still running
    pub const fn is_downloading(self) -> bool {
        matches!(self, Self::Downloading | Self::DownloadingLastChunk)
    }

    /// Whether the output carries resolved names
    pub const fn is_enriched(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Outcome of resolving one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedName {
    /// The address has a name
    Name(String),
    /// No name, or the lookup did not happen
    Empty,
}

impl ResolvedName {
    fn from_lookup(name: String) -> Self {
        if name.trim().is_empty() {
            Self::Empty
        } else {
            Self::Name(name)
        }
    }

    /// The name, if any
    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Name(name) => Some(name),
            Self::Empty => None,
        }
    }

    /// Whether this is the empty marker
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Enriched listing and the status it finished with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    /// Tokens in input order with `owner.ens` filled from the resolved names
    pub tokens: Vec<Token>,
    /// Final status
    pub status: EnrichmentStatus,
}

/// Resolves owner names for token listings
#[derive(Debug)]
pub struct EnrichmentPipeline<'a, R> {
    resolver: Option<&'a R>,
    chunk_size: usize,
    progress: Option<watch::Sender<EnrichmentStatus>>,
}

impl<'a, R: NameResolver> EnrichmentPipeline<'a, R> {
    /// Pipeline over `resolver`; `None` produces listings without names
    pub fn new(resolver: Option<&'a R>) -> Self {
        let chunk_size = resolver
            .map_or(ENRICHMENT_CHUNK_SIZE, |r| r.max_batch_size().min(ENRICHMENT_CHUNK_SIZE))
            .max(1);
        Self {
            resolver,
            chunk_size,
            progress: None,
        }
    }

    /// Publish status transitions to `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: watch::Sender<EnrichmentStatus>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Addresses per resolver call
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn publish(&self, status: EnrichmentStatus) {
        if let Some(progress) = &self.progress {
            progress.send_replace(status);
        }
    }

    async fn resolve(&self, resolver: &R, addresses: &[Address]) -> Result<Vec<ResolvedName>, ApiError> {
        let chunks = addresses.chunks(self.chunk_size);
        let last = chunks.len().saturating_sub(1);
        let mut names = Vec::with_capacity(addresses.len());

        for (index, chunk) in chunks.enumerate() {
            self.publish(if index == last {
                EnrichmentStatus::DownloadingLastChunk
            } else {
                EnrichmentStatus::Downloading
            });
            debug!(chunk = index, size = chunk.len(), "resolving owner names");

            let resolved = resolver.resolve_names(chunk).await?;
            if resolved.len() != chunk.len() {
                return Err(ApiError::InvalidResponse {
                    message: format!(
                        "resolver returned {} names for {} addresses",
                        resolved.len(),
                        chunk.len()
                    ),
                });
            }
            names.extend(resolved.into_iter().map(ResolvedName::from_lookup));
        }
        Ok(names)
    }

    /// Enrich `tokens` with their owners' names
    ///
    /// Never fails: a resolver error or a resolver that finds no name at all
    /// ends in [`EnrichmentStatus::Failed`] with every name left empty.
    pub async fn enrich(&self, tokens: &[Token]) -> Enrichment {
        if tokens.is_empty() {
            self.publish(EnrichmentStatus::NoData);
            return Enrichment {
                tokens: Vec::new(),
                status: EnrichmentStatus::NoData,
            };
        }

        let Some(resolver) = self.resolver else {
            self.publish(EnrichmentStatus::ReadyWithoutEnrichment);
            return Enrichment {
                tokens: build(tokens, None),
                status: EnrichmentStatus::ReadyWithoutEnrichment,
            };
        };

        let addresses: Vec<Address> = tokens.iter().map(|token| token.owner.id).collect();
        let (names, status) = match self.resolve(resolver, &addresses).await {
            Ok(names) if names.iter().all(ResolvedName::is_empty) => {
                warn!(count = tokens.len(), "resolver found no names for any owner");
                (None, EnrichmentStatus::Failed)
            }
            Ok(names) => (Some(names), EnrichmentStatus::Ready),
            Err(error) => {
                warn!(source = resolver.name(), %error, "owner name resolution failed");
                (None, EnrichmentStatus::Failed)
            }
        };

        self.publish(status);
        info!(count = tokens.len(), status = status.as_str(), "enrichment finished");
        Enrichment {
            tokens: build(tokens, names),
            status,
        }
    }
}

fn build(tokens: &[Token], names: Option<Vec<ResolvedName>>) -> Vec<Token> {
    let mut names = names.into_iter().flatten();
    tokens
        .iter()
        .map(|token| Token {
            id: token.id,
            owner: Account {
                id: token.owner.id,
                tokens_owned: token.owner.tokens_owned,
                tokens_minted: token.owner.tokens_minted,
                ens: names.next().and_then(ResolvedName::into_option),
            },
            created: token.created.clone(),
            transfer_count: token.transfer_count,
            event_id: token.event_id,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use api_client::{ApiClient, HealthStatus};

    use super::*;

    #[derive(Debug, Default)]
    struct FakeResolver {
        names: Vec<&'static str>,
        batch: usize,
        fail: bool,
        calls: Mutex<Vec<usize>>,
    }

    impl ApiClient for FakeResolver {
        async fn health_check(&self) -> Result<HealthStatus, ApiError> {
            Ok(HealthStatus::Up)
        }

        fn name(&self) -> &'static str {
            "fake-resolver"
        }
    }

    impl NameResolver for FakeResolver {
        fn max_batch_size(&self) -> usize {
            if self.batch == 0 { 1200 } else { self.batch }
        }

        async fn resolve_names(&self, addresses: &[Address]) -> Result<Vec<String>, ApiError> {
            let start = {
                let mut calls = self.calls.lock().unwrap();
                let start = calls.iter().sum::<usize>();
                calls.push(addresses.len());
                start
            };
            if self.fail {
                return Err(ApiError::Http {
                    message: "connection refused".to_string(),
                });
            }
            Ok((start..start + addresses.len())
                .map(|i| self.names.get(i).copied().unwrap_or("").to_string())
                .collect())
        }
    }

    fn token(id: u64, owner: u8) -> Token {
        Token {
            id,
            owner: Account {
                id: Address::repeat_byte(owner),
                tokens_owned: u64::from(owner),
                tokens_minted: 1,
                ens: None,
            },
            created: Some("2022-10-18T12:00:00Z".to_string()),
            transfer_count: 0,
            event_id: Some(42),
        }
    }

    #[tokio::test]
    async fn names_stay_aligned_with_owners() {
        let resolver = FakeResolver {
            names: vec!["alice.eth", "", "carol.eth"],
            ..Default::default()
        };
        let input = vec![token(1, 1), token(2, 2), token(3, 3)];

        let enrichment = EnrichmentPipeline::new(Some(&resolver)).enrich(&input).await;

        assert_eq!(enrichment.status, EnrichmentStatus::Ready);
        assert_eq!(enrichment.tokens.len(), 3);
        assert_eq!(enrichment.tokens[0].owner.ens.as_deref(), Some("alice.eth"));
        assert_eq!(enrichment.tokens[1].owner.ens, None);
        assert_eq!(enrichment.tokens[2].owner.ens.as_deref(), Some("carol.eth"));
        // input untouched
        assert!(input.iter().all(|token| token.owner.ens.is_none()));
    }

    #[tokio::test]
    async fn chunks_are_resolved_in_order() {
        let resolver = FakeResolver {
            names: vec!["a", "b", "c", "d", "e"],
            batch: 2,
            ..Default::default()
        };
        let input: Vec<Token> = (1..=5).map(|i| token(i, i as u8)).collect();
        let (tx, rx) = watch::channel(EnrichmentStatus::NoData);

        let pipeline = EnrichmentPipeline::new(Some(&resolver)).with_progress(tx);
        assert_eq!(pipeline.chunk_size(), 2);
        let enrichment = pipeline.enrich(&input).await;

        assert_eq!(*resolver.calls.lock().unwrap(), vec![2, 2, 1]);
        let names: Vec<_> = enrichment
            .tokens
            .iter()
            .map(|token| token.owner.ens.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(*rx.borrow(), EnrichmentStatus::Ready);
    }

    #[tokio::test]
    async fn resolver_error_fails_with_empty_names() {
        let resolver = FakeResolver {
            fail: true,
            ..Default::default()
        };
        let enrichment = EnrichmentPipeline::new(Some(&resolver))
            .enrich(&[token(1, 1), token(2, 2)])
            .await;
        assert_eq!(enrichment.status, EnrichmentStatus::Failed);
        assert_eq!(enrichment.tokens.len(), 2);
        assert!(enrichment.tokens.iter().all(|token| token.owner.ens.is_none()));
    }

    #[tokio::test]
    async fn no_names_at_all_is_a_failure() {
        let resolver = FakeResolver::default();
        let enrichment = EnrichmentPipeline::new(Some(&resolver))
            .enrich(&[token(1, 1)])
            .await;
        assert_eq!(enrichment.status, EnrichmentStatus::Failed);
    }

    #[tokio::test]
    async fn missing_resolver_skips_enrichment() {
        let enrichment = EnrichmentPipeline::<FakeResolver>::new(None)
            .enrich(&[token(7, 1)])
            .await;
        assert_eq!(enrichment.status, EnrichmentStatus::ReadyWithoutEnrichment);
        assert_eq!(enrichment.tokens[0].id, 7);
        assert!(!enrichment.status.is_enriched());
    }

    #[tokio::test]
    async fn empty_input_has_no_data() {
        let resolver = FakeResolver::default();
        let enrichment = EnrichmentPipeline::new(Some(&resolver)).enrich(&[]).await;
        assert_eq!(enrichment.status, EnrichmentStatus::NoData);
        assert!(resolver.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn status_identifiers() {
        assert_eq!(EnrichmentStatus::DownloadingLastChunk.as_str(), "downloading_last_chunk");
        assert!(EnrichmentStatus::Downloading.is_downloading());
        assert!(!EnrichmentStatus::Failed.is_downloading());
    }
}
