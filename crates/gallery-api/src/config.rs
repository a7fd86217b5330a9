// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! Configuration is layered with the `config` crate: built-in defaults, then
//! `config.json`, then `config.{environment}.json`, then `GALLERY_`-prefixed
//! environment variables using `__` between nested keys
//! (`GALLERY_POAP_API__API_KEY`).
//!
//! Only the POAP REST API is mandatory. Every other backend is optional and
//! its absence switches the dependent feature off.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Result, anyhow, ensure};
use config::{Config, ConfigError, Environment as ConfigEnv, File};
use external_apis::NonEmptyString;
use gallery_core::{ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT, PAGE_LIMIT, format::DEFAULT_FAMILY_URL};
use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::ToSchema;

use crate::error::{ServerError, ServerResult};

const ENV_PREFIX: &str = "GALLERY";
const DEFAULT_POAP_API_URL: &str = "https://api.poap.tech";
const DEFAULT_APP_URL: &str = "https://app.poap.xyz";
const DEFAULT_ANALYTICS_HOST: &str = "poapxyz.matomo.cloud";
/// `ReverseRecords` on mainnet
pub const DEFAULT_ENS_CONTRACT: &str = "0x3671aE578E63FdF66ad4F3E12CC0c0d71Ac7510C";

/// A validated server port that ensures the value is appropriate for the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerPort {
    port: u16,
    environment: Environment,
}

impl ServerPort {
    /// Create a new `ServerPort`, ensuring it's valid for the given environment
    ///
    /// # Errors
    ///
    /// Returns an error if the port is 0 in non-testing environments
    pub fn new(port: u16, environment: Environment) -> Result<Self> {
        if port == 0 && environment != Environment::Testing {
            return Err(anyhow!("port cannot be 0 in non-testing environments"));
        }
        Ok(Self { port, environment })
    }

    /// Default development port
    pub const fn default_development() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
        }
    }

    /// Port 0, letting the OS choose
    pub const fn testing() -> Self {
        Self {
            port: 0,
            environment: Environment::Testing,
        }
    }

    /// Get the port value
    pub fn value(&self) -> u16 {
        self.port
    }
}

impl<'de> Deserialize<'de> for ServerPort {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let port = u16::deserialize(deserializer)?;
        // revalidated in `load` once the environment is known
        Ok(Self {
            port,
            environment: Environment::Development,
        })
    }
}

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(seconds <= 300, "timeout cannot exceed 300");
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// 30 seconds
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(30))
    }

    /// 5 seconds
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }

    /// Whole seconds, as the backend clients take them
    pub fn as_secs(&self) -> u64 {
        self.0.as_secs()
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}

/// POAP REST API access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoapApiSettings {
    /// Base URL
    pub base_url: NonEmptyString,
    /// Value of the `X-API-Key` header
    #[serde(skip_serializing)]
    pub api_key: NonEmptyString,
    /// Per-request timeout
    #[serde(default)]
    pub timeout_seconds: TimeoutSeconds,
}

/// Per-chain transfer subgraphs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubgraphSettings {
    /// Mainnet subgraph URL
    #[serde(default)]
    pub mainnet: Option<NonEmptyString>,
    /// Gnosis chain subgraph URL
    #[serde(default)]
    pub xdai: Option<NonEmptyString>,
}

/// ENS reverse resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsSettings {
    /// JSON-RPC provider; without it exports carry no names
    #[serde(default)]
    pub rpc_url: Option<NonEmptyString>,
    /// `ReverseRecords` contract address
    #[serde(default = "default_ens_contract")]
    pub contract: String,
}

impl Default for EnsSettings {
    fn default() -> Self {
        Self {
            rpc_url: None,
            contract: default_ens_contract(),
        }
    }
}

fn default_ens_contract() -> String {
    DEFAULT_ENS_CONTRACT.to_string()
}

/// Gallery presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GallerySettings {
    /// POAP app, target of token and collection links
    pub app_url: String,
    /// POAP family site
    pub family_url: String,
    /// Events per index page
    pub page_limit: u64,
    /// Transfers in the activity feed
    pub activity_limit: u64,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            app_url: DEFAULT_APP_URL.to_string(),
            family_url: DEFAULT_FAMILY_URL.to_string(),
            page_limit: PAGE_LIMIT,
            activity_limit: ACTIVITY_LIMIT,
        }
    }
}

/// Page analytics settings handed to the front end
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct AnalyticsSettings {
    /// Site id; analytics are off without one
    #[serde(default)]
    pub site_id: Option<String>,
    /// Tracker host
    pub host: String,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            site_id: None,
            host: DEFAULT_ANALYTICS_HOST.to_string(),
        }
    }
}

/// Server configuration for different environments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    pub host: IpAddr,
    /// Server port (validated for environment compatibility)
    pub port: ServerPort,
    /// Request timeout in seconds (validated range: 1-300)
    pub timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// POAP REST API
    pub poap_api: PoapApiSettings,
    /// Compass GraphQL indexer; REST listing is used without it
    #[serde(default)]
    pub compass_url: Option<NonEmptyString>,
    /// Timeout for GraphQL and RPC backends
    #[serde(default)]
    pub backend_timeout_seconds: TimeoutSeconds,
    /// Chain subgraphs
    #[serde(default)]
    pub subgraphs: SubgraphSettings,
    /// ENS resolution
    #[serde(default)]
    pub ens: EnsSettings,
    /// Presentation settings
    #[serde(default)]
    pub gallery: GallerySettings,
    /// Analytics settings
    #[serde(default)]
    pub analytics: AnalyticsSettings,
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Environment variables with `GALLERY_` prefix
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config_builder = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3000)?
            .set_default("timeout_seconds", 30)?
            .set_default("environment", "development")?
            .set_default("poap_api.base_url", DEFAULT_POAP_API_URL)?
            .set_default("gallery.app_url", DEFAULT_APP_URL)?
            .set_default("gallery.family_url", DEFAULT_FAMILY_URL)?
            .set_default("gallery.page_limit", PAGE_LIMIT)?
            .set_default("gallery.activity_limit", ACTIVITY_LIMIT)?
            .set_default("analytics.host", DEFAULT_ANALYTICS_HOST)?
            .add_source(File::with_name("config.json").required(false))
            .add_source(
                File::with_name(&format!("config.{}.json", env_var.to_lowercase())).required(false),
            )
            .add_source(
                ConfigEnv::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var.to_lowercase())?;
        }

        let config = config_builder.build()?;
        let mut server_config: Self = config.try_deserialize()?;

        server_config.port = ServerPort::new(server_config.port.value(), server_config.environment)
            .map_err(|e| ConfigError::Message(format!("invalid port configuration: {e}")))?;
        server_config
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(server_config)
    }

    /// Reject settings that would make the gallery unusable
    ///
    /// # Errors
    ///
    /// Returns an error for zero page limits and out of range activity limits
    pub fn validate(&self) -> Result<()> {
        ensure!(self.gallery.page_limit > 0, "gallery.page_limit must be positive");
        ensure!(
            (1..=MAX_ACTIVITY_LIMIT).contains(&self.gallery.activity_limit),
            "gallery.activity_limit must be between 1 and {MAX_ACTIVITY_LIMIT}"
        );
        Ok(())
    }

    /// Configuration for tests against a POAP API served at `poap_api_url`
    ///
    /// # Errors
    ///
    /// Returns an error if `poap_api_url` is blank
    pub fn for_testing(poap_api_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: ServerPort::testing(),
            timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            poap_api: PoapApiSettings {
                base_url: NonEmptyString::new(poap_api_url).map_err(|e| anyhow!(e))?,
                api_key: NonEmptyString::new("test-api-key").map_err(|e| anyhow!(e))?,
                timeout_seconds: TimeoutSeconds::testing(),
            },
            compass_url: None,
            backend_timeout_seconds: TimeoutSeconds::testing(),
            subgraphs: SubgraphSettings::default(),
            ens: EnsSettings::default(),
            gallery: GallerySettings::default(),
            analytics: AnalyticsSettings::default(),
        })
    }

    /// Get socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port.value())
    }
}
