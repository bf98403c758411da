// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;

use crate::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS,
    MAX_REINGEST_ATTEMPTS, MAX_RESPONSE_SIZE_BYTES,
};
use crate::error::ConfigError;
use crate::reingest::RetryStrategy;
use crate::transformer::OutputFormat;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration of the processor and its destination client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Built-in transformer applied to every log entry
    pub output_format: OutputFormat,
    /// Ceiling on the accounted size of all `Ok` records of one response
    pub size_ceiling_bytes: usize,
    /// Attempts per reingestion chunk before the invocation fails
    pub max_reingest_attempts: u32,
    /// Base of the exponential backoff between attempts; 0 retries immediately
    pub retry_base_delay_ms: u64,
    /// Cap of the exponential backoff
    pub retry_max_delay_ms: u64,
    /// Overrides the regional Firehose/Kinesis endpoint
    pub endpoint_url: Option<String>,
    /// Timeout of a single batched-put request, in seconds
    pub request_timeout_secs: u64,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            output_format: OutputFormat::Message,
            size_ceiling_bytes: MAX_RESPONSE_SIZE_BYTES,
            max_reingest_attempts: MAX_REINGEST_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            endpoint_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            https_proxy: None,
        }
    }
}

impl ProcessorConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let log_level = env::var("PROCESSOR_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or(defaults.log_level);
        let output_format = match env::var("PROCESSOR_OUTPUT_FORMAT") {
            Ok(val) => val.parse().map_err(ConfigError::InvalidConfig)?,
            Err(_) => defaults.output_format,
        };
        let size_ceiling_bytes =
            parse_var("PROCESSOR_SIZE_CEILING_BYTES").unwrap_or(defaults.size_ceiling_bytes);
        let max_reingest_attempts = parse_var("PROCESSOR_MAX_REINGEST_ATTEMPTS")
            .unwrap_or(defaults.max_reingest_attempts);
        let retry_base_delay_ms =
            parse_var("PROCESSOR_RETRY_BASE_DELAY_MS").unwrap_or(defaults.retry_base_delay_ms);
        let retry_max_delay_ms =
            parse_var("PROCESSOR_RETRY_MAX_DELAY_MS").unwrap_or(defaults.retry_max_delay_ms);
        let endpoint_url = env::var("PROCESSOR_ENDPOINT_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let request_timeout_secs = parse_var("PROCESSOR_REQUEST_TIMEOUT_SECS")
            .unwrap_or(defaults.request_timeout_secs);
        let https_proxy = env::var("PROCESSOR_PROXY_HTTPS")
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();

        let config = Self {
            log_level,
            output_format,
            size_ceiling_bytes,
            max_reingest_attempts,
            retry_base_delay_ms,
            retry_max_delay_ms,
            endpoint_url,
            request_timeout_secs,
            https_proxy,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_ceiling_bytes == 0 {
            return Err(ConfigError::InvalidConfig(
                "PROCESSOR_SIZE_CEILING_BYTES must be greater than 0".to_string(),
            ));
        }

        if self.max_reingest_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "PROCESSOR_MAX_REINGEST_ATTEMPTS must be greater than 0".to_string(),
            ));
        }

        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err(ConfigError::InvalidConfig(format!(
                "PROCESSOR_RETRY_MAX_DELAY_MS ({}) is lower than PROCESSOR_RETRY_BASE_DELAY_MS ({})",
                self.retry_max_delay_ms, self.retry_base_delay_ms
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "PROCESSOR_REQUEST_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    #[must_use]
    pub fn retry_strategy(&self) -> RetryStrategy {
        if self.retry_base_delay_ms == 0 {
            RetryStrategy::Immediate
        } else {
            RetryStrategy::ExponentialBackoff {
                base_delay_ms: self.retry_base_delay_ms,
                max_delay_ms: self.retry_max_delay_ms,
            }
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|val| val.trim().parse::<T>().ok())
}
