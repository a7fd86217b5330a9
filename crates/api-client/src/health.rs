// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health reporting for backend clients

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health status of a backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Backend answered normally
    Up,
    /// Backend answered but something is off (rate limits, 5xx on the probe)
    Degraded { reason: String },
    /// Backend unreachable or rejecting our credentials
    Down { reason: String },
    /// Backend not configured; the dependent feature is switched off
    Disabled,
}

impl HealthStatus {
    /// Map the status code of a probe request to a health status
    pub fn from_status_code(code: u16) -> Self {
        match code {
            200..=299 => Self::Up,
            401 | 403 => Self::Down {
                reason: "Authentication failed".to_string(),
            },
            429 => Self::Degraded {
                reason: "Rate limited".to_string(),
            },
            other => Self::Degraded {
                reason: format!("Backend returned status {other}"),
            },
        }
    }

    /// Check if this health status indicates the backend can serve reads
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Up | Self::Degraded { .. })
    }

    /// Check if this health status indicates the backend is completely down
    pub fn is_down(&self) -> bool {
        matches!(self, Self::Down { .. })
    }

    /// Get a human-readable description of the status
    pub fn description(&self) -> &str {
        match self {
            Self::Up => "Backend is healthy",
            Self::Disabled => "Backend is not configured",
            Self::Degraded { reason } | Self::Down { reason } => reason,
        }
    }

    fn severity(&self) -> u8 {
        match self {
            Self::Up | Self::Disabled => 0,
            Self::Degraded { .. } => 1,
            Self::Down { .. } => 2,
        }
    }
}

/// Health of a single named backend, as reported by `/health`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceHealth {
    /// Client name
    pub source: String,
    /// Probe outcome
    #[serde(flatten)]
    pub status: HealthStatus,
    /// How long the probe took
    pub response_time_ms: u64,
    /// When the probe ran
    pub checked_at: DateTime<Utc>,
}

impl SourceHealth {
    /// Record a probe outcome
    pub fn new(source: impl Into<String>, status: HealthStatus, elapsed: Duration) -> Self {
        Self {
            source: source.into(),
            status,
            response_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            checked_at: Utc::now(),
        }
    }

    /// Report for a backend that is not configured
    pub fn disabled(source: impl Into<String>) -> Self {
        Self::new(source, HealthStatus::Disabled, Duration::ZERO)
    }
}

/// Combine per-backend reports into one overall status
///
/// The overall status is the worst individual one. A disabled backend does
/// not degrade the overall status.
pub fn overall_status(reports: &[SourceHealth]) -> HealthStatus {
    reports
        .iter()
        .map(|report| &report.status)
        .max_by_key(|status| status.severity())
        .filter(|status| status.severity() > 0)
        .cloned()
        .unwrap_or(HealthStatus::Up)
}
