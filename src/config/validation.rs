//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use super::types::BackendKind;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bridge.name is required")]
    MissingBridgeName,
    #[error("linking.code_rate_limit_secs must be greater than zero")]
    ZeroRateLimit,
    #[error("linking.code_expiry_secs ({expiry}) must exceed code_rate_limit_secs ({rate_limit})")]
    ExpiryShorterThanRateLimit { expiry: u64, rate_limit: u64 },
    #[error("linking.code_length must be between 4 and 12, got {0}")]
    InvalidCodeLength(usize),
    #[error("database.path is required for the sqlite backend")]
    MissingDatabasePath,
    #[error("commands.link_aliases contains an invalid label: {0:?}")]
    InvalidAlias(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bridge.name.trim().is_empty() {
        errors.push(ValidationError::MissingBridgeName);
    }

    let linking = &config.linking;
    if linking.code_rate_limit_secs == 0 {
        errors.push(ValidationError::ZeroRateLimit);
    }
    if linking.code_expiry_secs <= linking.code_rate_limit_secs {
        errors.push(ValidationError::ExpiryShorterThanRateLimit {
            expiry: linking.code_expiry_secs,
            rate_limit: linking.code_rate_limit_secs,
        });
    }
    if !(4..=12).contains(&linking.code_length) {
        errors.push(ValidationError::InvalidCodeLength(linking.code_length));
    }

    if config.database.backend == BackendKind::Sqlite {
        let path = config.database.path.trim();
        // missing parent directories are created when the database opens
        if path.is_empty() {
            errors.push(ValidationError::MissingDatabasePath);
        }
    }

    for alias in &config.commands.link_aliases {
        if alias.is_empty() || alias.chars().any(char::is_whitespace) {
            errors.push(ValidationError::InvalidAlias(alias.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
