//! Linking flow configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{
    default_code_expiry_secs, default_code_length, default_code_rate_limit_secs,
    default_mirror_cache_ttl_secs,
};

/// Linking configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkingConfig {
    /// Seconds a player must wait between linking attempts (default: 5).
    #[serde(default = "default_code_rate_limit_secs")]
    pub code_rate_limit_secs: u64,
    /// Seconds an issued linking code stays redeemable (default: 300).
    #[serde(default = "default_code_expiry_secs")]
    pub code_expiry_secs: u64,
    /// Number of digits in a linking code (default: 6).
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Optional web page shown alongside the code.
    #[serde(default)]
    pub link_url: Option<String>,
    /// Serve links read-only; self-service linking is then unavailable.
    #[serde(default)]
    pub read_only: bool,
    /// Seconds a read-only provider trusts a cached link before asking the
    /// backend again (default: 60).
    #[serde(default = "default_mirror_cache_ttl_secs")]
    pub mirror_cache_ttl_secs: u64,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            code_rate_limit_secs: default_code_rate_limit_secs(),
            code_expiry_secs: default_code_expiry_secs(),
            code_length: default_code_length(),
            link_url: None,
            read_only: false,
            mirror_cache_ttl_secs: default_mirror_cache_ttl_secs(),
        }
    }
}

impl LinkingConfig {
    /// Cooldown window for the linking rate limiter.
    pub fn code_rate_limit(&self) -> Duration {
        Duration::from_secs(self.code_rate_limit_secs)
    }

    pub fn code_expiry(&self) -> Duration {
        Duration::from_secs(self.code_expiry_secs)
    }

    pub fn mirror_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.mirror_cache_ttl_secs)
    }
}
