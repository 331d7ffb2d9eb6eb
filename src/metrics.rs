//! Prometheus metrics collection for linkbridge.
//!
//! Metrics are registered once by [`init`]. Until then every `record_*`
//! helper is a no-op, so library users and tests that never call `init`
//! pay nothing.
//!
//! - `bridge_command_total{command,surface}` - Commands dispatched per surface
//! - `bridge_command_duration_seconds{command}` - Command latency histogram
//! - `bridge_command_errors_total{command,error}` - Command errors by kind
//! - `bridge_link_flow_total{outcome}` - Linking flow terminal outcomes

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Links persisted by a store.
pub static LINKS_CREATED: OnceLock<IntCounter> = OnceLock::new();

/// `create_link` calls refused because either side was already taken.
pub static LINK_CONFLICTS: OnceLock<IntCounter> = OnceLock::new();

/// Linking attempts refused by the cooldown window.
pub static RATE_LIMITED: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Command metrics
// ========================================================================

/// Commands dispatched, by command name and invoking surface.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Command processing latency by command name.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Command errors by command name and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Linking flow results by terminal state.
pub static LINK_FLOW: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(LINKS_CREATED, IntCounter::new("bridge_links_created_total", "Links created"));
    register!(LINK_CONFLICTS, IntCounter::new("bridge_link_conflicts_total", "Link creations refused by conflict"));
    register!(RATE_LIMITED, IntCounter::new("bridge_rate_limited_total", "Linking attempts inside the cooldown window"));

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("bridge_command_total", "Commands dispatched"), &["command", "surface"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("bridge_command_duration_seconds", "Command latency by name")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("bridge_command_errors_total", "Command errors by kind"), &["command", "error"]));
    register!(LINK_FLOW, IntCounterVec::new(Opts::new("bridge_link_flow_total", "Linking flow outcomes"), &["outcome"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

fn get_counter(metric: &OnceLock<IntCounter>) -> Option<&IntCounter> {
    metric.get()
}

fn get_counter_vec(metric: &OnceLock<IntCounterVec>) -> Option<&IntCounterVec> {
    metric.get()
}

fn get_histogram_vec(metric: &OnceLock<HistogramVec>) -> Option<&HistogramVec> {
    metric.get()
}

/// Record a dispatched command and its surface.
#[inline]
pub fn record_dispatch(command: &str, surface: &str) {
    if let Some(c) = get_counter_vec(&COMMAND_COUNTER) {
        c.with_label_values(&[command, surface]).inc();
    }
}

/// Record command latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(h) = get_histogram_vec(&COMMAND_LATENCY) {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a command error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = get_counter_vec(&COMMAND_ERRORS) {
        c.with_label_values(&[command, error]).inc();
    }
}

/// Record the state a linking flow ended in.
#[inline]
pub fn record_link_flow(outcome: &str) {
    if let Some(c) = get_counter_vec(&LINK_FLOW) {
        c.with_label_values(&[outcome]).inc();
    }
}

#[inline]
pub fn record_link_created() {
    if let Some(c) = get_counter(&LINKS_CREATED) {
        c.inc();
    }
}

#[inline]
pub fn record_link_conflict() {
    if let Some(c) = get_counter(&LINK_CONFLICTS) {
        c.inc();
    }
}

#[inline]
pub fn record_rate_limited() {
    if let Some(c) = get_counter(&RATE_LIMITED) {
        c.inc();
    }
}
