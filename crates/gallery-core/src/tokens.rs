// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Token listings for a single event

use std::collections::HashSet;

use api_client::{ApiError, EventCatalog, Token};
use futures::future::try_join_all;
use tracing::{debug, info};

/// Tokens per listing request
pub const TOKEN_PAGE_SIZE: u64 = 100;

/// Listing requests in flight at once
pub const TOKEN_BATCH_SIZE: u64 = 5;

/// Drop repeated ids and sort ascending by id
///
/// The first occurrence of an id wins.
pub fn normalize_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut seen = HashSet::with_capacity(tokens.len());
    let mut tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|token| seen.insert(token.id))
        .collect();
    tokens.sort_by_key(|token| token.id);
    tokens
}

/// Number of listing pages needed for `token_count` tokens
pub const fn page_count(token_count: u64) -> u64 {
    token_count.div_ceil(TOKEN_PAGE_SIZE)
}

/// Read every token minted for `event_id`
///
/// Pages are requested in concurrent batches. Any failed page fails the whole
/// collection so that an export is never silently incomplete.
///
/// # Errors
///
/// Returns the first error reported by a page request
pub async fn collect_event_tokens<C: EventCatalog>(
    catalog: &C,
    event_id: u64,
    token_count: u64,
) -> Result<Vec<Token>, ApiError> {
    read_pages(catalog, event_id, token_count, 0, Vec::new()).await
}

/// Like [`collect_event_tokens`] when the first page is already in hand
///
/// `first_page` must be the listing at offset 0 with [`TOKEN_PAGE_SIZE`]
/// tokens; only the pages after it are requested.
///
/// # Errors
///
/// Returns the first error reported by a page request
pub async fn complete_event_tokens<C: EventCatalog>(
    catalog: &C,
    event_id: u64,
    token_count: u64,
    first_page: Vec<Token>,
) -> Result<Vec<Token>, ApiError> {
    read_pages(catalog, event_id, token_count, 1, first_page).await
}

async fn read_pages<C: EventCatalog>(
    catalog: &C,
    event_id: u64,
    token_count: u64,
    mut page: u64,
    mut tokens: Vec<Token>,
) -> Result<Vec<Token>, ApiError> {
    let pages = page_count(token_count);

    while page < pages {
        let batch = TOKEN_BATCH_SIZE.min(pages - page);
        debug!(event_id, first_page = page, batch, "fetching token pages");

        let responses = try_join_all((page..page + batch).map(|index| {
            catalog.event_tokens(event_id, TOKEN_PAGE_SIZE, index * TOKEN_PAGE_SIZE)
        }))
        .await?;
        tokens.extend(responses.into_iter().flat_map(|response| response.tokens));
        page += batch;
    }

    let tokens = normalize_tokens(tokens);
    info!(event_id, pages, count = tokens.len(), "collected event tokens");
    Ok(tokens)
}
