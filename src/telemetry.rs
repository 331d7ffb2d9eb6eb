//! Telemetry utilities for command timing and tracing spans.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, debug_span, info_span};

    /// Span for one command dispatch.
    pub fn command(name: &str, surface: &str, invoker: &str) -> Span {
        debug_span!("bridge.command", command = %name, surface = %surface, invoker = %invoker)
    }

    /// Span for a linking flow run.
    pub fn link_flow(player: &uuid::Uuid) -> Span {
        info_span!("bridge.link_flow", player = %player)
    }
}
