// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::time::Duration;

use crate::batcher::DEFAULT_CHUNK_SIZE;

/// Application name reported when none is configured. This is the one field
/// that keeps a string fallback; every other unresolved field stays absent.
pub const DEFAULT_APP_NAME: &str = "cloudflare-workers";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur when working with the forwarder configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("log-ingestion endpoint is not configured")]
    MissingEndpoint,

    #[error("API key is not configured")]
    MissingApiKey,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for the tail-event forwarder
#[derive(Debug, Clone)]
pub struct Config {
    /// Log-ingestion endpoint URL the records are POSTed to
    pub endpoint: Option<String>,
    /// Bearer token for the ingestion endpoint
    pub api_key: Option<String>,
    /// Application name stamped on every record
    pub app_name: Option<String>,
    /// Fallback subsystem name used when an event has no producer identity
    pub subsystem: Option<String>,
    /// How many owning events go into one delivery chunk
    pub chunk_size: usize,
    /// Per-request timeout for deliveries
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            app_name: None,
            subsystem: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env::var("TAIL_FORWARDER_ENDPOINT").ok();
        let api_key = env::var("TAIL_FORWARDER_API_KEY").ok();
        let app_name = env::var("TAIL_FORWARDER_APP_NAME").ok();
        let subsystem = env::var("TAIL_FORWARDER_SUBSYSTEM").ok();
        let chunk_size = env::var("TAIL_FORWARDER_CHUNK_SIZE")
            .ok()
            .and_then(|size| size.parse::<usize>().ok())
            .unwrap_or(DEFAULT_CHUNK_SIZE);

        let config = Self {
            endpoint,
            api_key,
            app_name,
            subsystem,
            chunk_size,
            timeout: DEFAULT_TIMEOUT,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = match &self.endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint,
            _ => return Err(ConfigError::MissingEndpoint),
        };
        if url::Url::parse(endpoint).is_err() {
            return Err(ConfigError::InvalidConfig(format!(
                "endpoint '{endpoint}' is not a valid URL"
            )));
        }

        match &self.api_key {
            Some(api_key) if !api_key.trim().is_empty() => {}
            _ => return Err(ConfigError::MissingApiKey),
        }

        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "chunk size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Application name to stamp on records, falling back to the default
    pub fn application_name(&self) -> String {
        self.app_name
            .clone()
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string())
    }
}
