// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

use api_client::ApiError;
use thiserror::Error;

use crate::merge::MergeError;

/// Errors surfaced by gallery operations
#[derive(Debug, Error)]
pub enum GalleryError {
    /// A backend read failed
    #[error(transparent)]
    Upstream(#[from] ApiError),

    /// The event does not exist
    #[error("Event {id} not found")]
    EventNotFound {
        /// Requested event id
        id: u64,
    },

    /// Parameters were rejected before any backend call
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// What was wrong
        message: String,
    },

    /// The activity feed could not be assembled
    #[error(transparent)]
    Merge(#[from] MergeError),
}

impl GalleryError {
    /// Shorthand for [`GalleryError::InvalidRequest`]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Whether repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(error) => error.is_network_failure(),
            Self::Merge(MergeError::AllSourcesFailed { .. }) => true,
            Self::Merge(MergeError::NoSources)
            | Self::EventNotFound { .. }
            | Self::InvalidRequest { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(GalleryError::from(ApiError::Timeout { timeout_seconds: 3 }).is_retryable());
        assert!(
            GalleryError::from(MergeError::AllSourcesFailed {
                failures: Vec::new()
            })
            .is_retryable()
        );
        assert!(!GalleryError::EventNotFound { id: 1 }.is_retryable());
        assert!(!GalleryError::invalid("bad order").is_retryable());
        assert!(!GalleryError::from(MergeError::NoSources).is_retryable());
    }
}
