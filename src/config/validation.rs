//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (attempts > 0, min interval ≤ max interval)
//! - Check endpoint URLs and log level
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SdkConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use url::Url;

use crate::config::schema::SdkConfig;
use crate::observability::logging::LOG_LEVELS;

/// A single semantic violation, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &SdkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bridge_protocols.is_empty() {
        errors.push(ValidationError::new(
            "bridge_protocols",
            "at least one bridge protocol is required",
        ));
    }

    if config.chains.is_empty() {
        errors.push(ValidationError::new("chains", "at least one chain is required"));
    }

    if !LOG_LEVELS.contains(&config.log_level.as_str()) {
        errors.push(ValidationError::new(
            "log_level",
            format!("unknown level '{}'", config.log_level),
        ));
    }

    for (chain, urls) in &config.endpoints {
        for raw in urls {
            match Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "ws" | "wss" | "http" | "https") => {}
                Ok(url) => errors.push(ValidationError::new(
                    format!("endpoints.{}", chain),
                    format!("unsupported scheme '{}' in {}", url.scheme(), raw),
                )),
                Err(e) => errors.push(ValidationError::new(
                    format!("endpoints.{}", chain),
                    format!("invalid url {}: {}", raw, e),
                )),
            }
        }
    }

    let polling = &config.polling;
    if polling.max_attempts == 0 {
        errors.push(ValidationError::new("polling.max_attempts", "must be greater than 0"));
    }
    if polling.min_interval_ms > polling.max_interval_ms {
        errors.push(ValidationError::new(
            "polling.min_interval_ms",
            "must not exceed polling.max_interval_ms",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
