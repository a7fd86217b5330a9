// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! Server and request errors, and their mapping onto HTTP responses.

use std::net::SocketAddr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gallery_core::GalleryError;
use thiserror::Error;

/// Error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// A backend client could not be built
    #[error("Dependency error: {message}")]
    Dependency {
        /// Error message
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// A backend failed while serving the request
    #[error("Upstream error: {message}")]
    Upstream {
        /// Error message
        message: String,
        /// Whether the same request may succeed later
        retryable: bool,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl From<GalleryError> for ServerError {
    fn from(error: GalleryError) -> Self {
        match error {
            GalleryError::EventNotFound { .. } => Self::NotFound(error.to_string()),
            GalleryError::InvalidRequest { message } => Self::Validation(message),
            GalleryError::Upstream(_) | GalleryError::Merge(_) => Self::Upstream {
                retryable: error.is_retryable(),
                message: error.to_string(),
            },
        }
    }
}

impl ServerError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Dependency { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut json_body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16()
        });
        if let Self::Upstream { retryable, .. } = &self {
            json_body["retryable"] = serde_json::Value::Bool(*retryable);
        }

        (status, Json(json_body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use api_client::ApiError;
    use gallery_core::MergeError;

    use super::*;

    #[test]
    fn gallery_errors_map_to_status_codes() {
        let not_found = ServerError::from(GalleryError::EventNotFound { id: 9 });
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.to_string(), "Event 9 not found");

        let invalid = ServerError::from(GalleryError::invalid("limit must be positive"));
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let upstream = ServerError::from(GalleryError::from(ApiError::Timeout {
            timeout_seconds: 5,
        }));
        assert!(matches!(
            upstream,
            ServerError::Upstream {
                retryable: true,
                ..
            }
        ));
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);

        let merged = ServerError::from(GalleryError::from(MergeError::NoSources));
        assert!(matches!(
            merged,
            ServerError::Upstream {
                retryable: false,
                ..
            }
        ));
    }

    #[test]
    fn response_carries_status() {
        let response = ServerError::Validation("bad order".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ServerError::Dependency {
            message: "ens".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
