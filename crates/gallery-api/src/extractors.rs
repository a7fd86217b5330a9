// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Custom extractors for improved error handling
//!
//! Axum's own query and path rejections answer with plain text. These wrappers
//! turn them into the JSON error body every other failure uses.

use axum::{
    extract::{FromRequestParts, Path, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ServerError;

mod error_hints {
    pub const QUERY: &str = "check parameter names and that numeric parameters are non-negative integers";
    pub const PATH: &str = "event ids are non-negative integers";
}

/// Query string extractor rejecting with [`ServerError::Validation`]
#[derive(Debug)]
pub struct QueryExtractor<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryExtractor<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ServerError::Validation(format!(
                "{}: {}",
                rejection.body_text(),
                error_hints::QUERY
            ))),
        }
    }
}

/// Path parameter extractor rejecting with [`ServerError::Validation`]
#[derive(Debug)]
pub struct PathExtractor<T>(pub T);

impl<T, S> FromRequestParts<S> for PathExtractor<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(ServerError::Validation(format!(
                "{}: {}",
                rejection.body_text(),
                error_hints::PATH
            ))),
        }
    }
}
