//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Bridge Defaults
// =============================================================================

pub fn default_bridge_name() -> String {
    "linkbridge".to_string()
}

pub fn default_metrics_port() -> u16 {
    9090
}

// =============================================================================
// Database Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "linkbridge.db".to_string()
}

// =============================================================================
// Linking Defaults
// =============================================================================

/// Cooldown between linking-code requests from the same player.
pub fn default_code_rate_limit_secs() -> u64 {
    5
}

/// Lifetime of an issued linking code.
pub fn default_code_expiry_secs() -> u64 {
    300
}

pub fn default_code_length() -> usize {
    6
}

/// How long a read-only provider caches a link it observed.
pub fn default_mirror_cache_ttl_secs() -> u64 {
    60
}

// =============================================================================
// Command Defaults
// =============================================================================

pub fn default_link_aliases() -> Vec<String> {
    vec!["discord".to_string()]
}
