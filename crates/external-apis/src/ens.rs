// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! ENS reverse resolution through the `ReverseRecords` contract
//!
//! `getNames(address[])` returns one name per input address, empty when the
//! address has no verified reverse record. The call is issued as a raw
//! `eth_call` over JSON-RPC.

use std::time::{Duration, Instant};

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolCall, sol};
use api_client::{ApiClient, ApiError, HealthStatus, NameResolver};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::non_empty_string::NonEmptyString;

const DEFAULT_ENS_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_ENS_HEALTH_CHECK_TIMEOUT_SECONDS: u64 = 5;

/// Largest address list sent in one `getNames` call
pub const ENS_CHUNK_SIZE: usize = 1200;

sol! {
    /// Reverse records lookup
    function getNames(address[] addresses) external view returns (string[] r);
}

/// Configuration for the ENS resolver
/// This type is always valid by construction.
#[derive(Debug, Clone)]
pub struct EnsConfig {
    /// JSON-RPC provider URL
    pub rpc_url: NonEmptyString,
    /// `ReverseRecords` contract address
    pub contract: Address,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl EnsConfig {
    /// Create a new `EnsConfig` with validation
    pub fn new(rpc_url: impl Into<String>, contract: &str) -> Result<Self, String> {
        let contract: Address = contract
            .trim()
            .parse()
            .map_err(|e| format!("invalid contract address: {e}"))?;
        if contract.is_zero() {
            return Err("contract address cannot be zero".to_string());
        }
        Ok(Self {
            rpc_url: NonEmptyString::new(rpc_url)?,
            contract,
            timeout_seconds: DEFAULT_ENS_TIMEOUT_SECONDS,
        })
    }
}

/// Errors specific to the ENS resolver
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum EnsError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// RPC URL is not valid
    #[error("Invalid RPC URL: {0}")]
    Url(#[from] url::ParseError),

    /// Node returned a JSON-RPC error
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Return data could not be decoded
    #[error("Failed to decode getNames result: {0}")]
    Decode(#[from] alloy_sol_types::Error),

    /// Return data was not valid hex
    #[error("Invalid hex in RPC result: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),

    /// Node returned a different number of names than requested
    #[error("Expected {expected} names, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// More addresses than one call may carry
    #[error("Batch of {size} addresses exceeds the per-call limit")]
    BatchTooLarge { size: usize },

    /// Timeout error
    #[error("Request timeout")]
    Timeout { seconds: u64 },
}

impl From<EnsError> for ApiError {
    fn from(value: EnsError) -> Self {
        match value {
            EnsError::Http(error) => ApiError::Http {
                message: error.to_string(),
            },
            EnsError::Url(error) => ApiError::Configuration {
                message: error.to_string(),
            },
            EnsError::Rpc { .. } | EnsError::BatchTooLarge { .. } => ApiError::Custom {
                error: anyhow::Error::msg(value.to_string()),
            },
            EnsError::Decode(_) | EnsError::Hex(_) | EnsError::LengthMismatch { .. } => {
                ApiError::InvalidResponse {
                    message: value.to_string(),
                }
            }
            EnsError::Timeout { seconds } => ApiError::Timeout {
                timeout_seconds: seconds,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// ENS reverse resolver
#[derive(Debug)]
pub struct EnsResolver {
    client: Client,
    rpc_url: Url,
    config: EnsConfig,
}

impl EnsResolver {
    /// Create a new resolver
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC URL is invalid or the HTTP client cannot be built
    pub fn new(config: EnsConfig) -> Result<Self, EnsError> {
        let rpc_url = Url::parse(config.rpc_url.as_str().trim())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("poap-gallery/0.1.0")
            .build()?;
        Ok(Self {
            client,
            rpc_url,
            config,
        })
    }

    async fn rpc(
        &self,
        method: &str,
        params: serde_json::Value,
        seconds: u64,
    ) -> Result<String, EnsError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = timeout(
            Duration::from_secs(seconds),
            self.client.post(self.rpc_url.clone()).json(&body).send(),
        )
        .await
        .map_err(|_| EnsError::Timeout { seconds })?
        .map_err(EnsError::Http)?
        .error_for_status()?;

        let response: RpcResponse = response.json().await?;
        if let Some(error) = response.error {
            return Err(EnsError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or_default())
    }

    /// Call `getNames` for a single chunk of at most [`ENS_CHUNK_SIZE`] addresses
    pub async fn get_names(&self, addresses: &[Address]) -> Result<Vec<String>, EnsError> {
        if addresses.len() > ENS_CHUNK_SIZE {
            return Err(EnsError::BatchTooLarge {
                size: addresses.len(),
            });
        }
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let call = getNamesCall {
            addresses: addresses.to_vec(),
        };
        let data = Bytes::from(call.abi_encode());

        debug!(count = addresses.len(), contract = %self.config.contract, "resolving ENS names");

        let output = self
            .rpc(
                "eth_call",
                json!([{ "to": self.config.contract, "data": data }, "latest"]),
                self.config.timeout_seconds,
            )
            .await?;
        let output: Bytes = output.parse()?;
        let names = getNamesCall::abi_decode_returns(&output)?;

        if names.len() != addresses.len() {
            return Err(EnsError::LengthMismatch {
                expected: addresses.len(),
                actual: names.len(),
            });
        }
        Ok(names)
    }
}

impl ApiClient for EnsResolver {
    async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        let start_time = Instant::now();
        match self
            .rpc(
                "eth_blockNumber",
                json!([]),
                DEFAULT_ENS_HEALTH_CHECK_TIMEOUT_SECONDS,
            )
            .await
        {
            Ok(_) => {
                info!("ENS RPC health check passed in {:?}", start_time.elapsed());
                Ok(HealthStatus::Up)
            }
            Err(EnsError::Http(error)) if error.status().is_some() => {
                let code = error.status().map_or(500, |status| status.as_u16());
                warn!(code, "ENS RPC health check failed");
                Ok(HealthStatus::from_status_code(code))
            }
            Err(EnsError::Rpc { message, .. }) => Ok(HealthStatus::Degraded { reason: message }),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "ens"
    }
}

impl NameResolver for EnsResolver {
    fn max_batch_size(&self) -> usize {
        ENS_CHUNK_SIZE
    }

    async fn resolve_names(&self, addresses: &[Address]) -> Result<Vec<String>, ApiError> {
        Ok(self.get_names(addresses).await?)
    }
}
