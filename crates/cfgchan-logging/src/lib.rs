//! ---
//! cc_section: "03-logging"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Structured logging adapters and sinks."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
#![warn(missing_docs)]

use tracing::Level;

pub mod macros;
mod sinks;

pub use sinks::{env_filter, init, init_service, LogFormat, LoggingConfig, LOG_ENV};

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct LogContext<'a> {
    /// Organization identifier owning the channel.
    pub org: Option<u64>,
    /// Channel label associated with the log event.
    pub channel: Option<&'a str>,
    /// Channel-relative item path, when the event concerns a single item.
    pub item: Option<&'a str>,
}

impl<'a> LogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an organization identifier.
    pub fn with_org(mut self, org: u64) -> Self {
        self.org = Some(org);
        self
    }

    /// Attach a channel label.
    pub fn with_channel(mut self, channel: &'a str) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Attach an item path.
    pub fn with_item(mut self, item: &'a str) -> Self {
        self.item = Some(item);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation failed or was aborted.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized system event with a success/fault outcome.
pub fn log_system_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let default_ctx = LogContext::default();
    let ctx = context.unwrap_or(&default_ctx);
    // `tracing::event!` needs a constant level per call site.
    match outcome {
        SystemEventOutcome::Success => tracing::event!(
            Level::INFO,
            event,
            outcome = outcome.as_str(),
            org = ctx.org.unwrap_or_default(),
            channel = ctx.channel.unwrap_or(""),
            item = ctx.item.unwrap_or(""),
            message = %message
        ),
        SystemEventOutcome::Fault => tracing::event!(
            Level::ERROR,
            event,
            outcome = outcome.as_str(),
            org = ctx.org.unwrap_or_default(),
            channel = ctx.channel.unwrap_or(""),
            item = ctx.item.unwrap_or(""),
            message = %message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_emit_without_panic() {
        init();
        let ctx = LogContext::new().with_org(42).with_channel("web-config");
        chan_info!(context = ctx.clone(), "channel rendered");
        chan_debug!("debug message");
        chan_debug!(context = ctx.with_item("etc/app.conf"), "item {} written", 1);
    }

    #[test]
    fn init_does_not_panic() {
        init();
        init();
    }

    #[test]
    fn system_event_helper_emits() {
        init();
        let ctx = LogContext::new().with_org(7).with_channel("base");
        log_system_event(
            Some(&ctx),
            "test.event",
            "system event helper executed",
            SystemEventOutcome::Success,
        );
        log_system_event(
            None,
            "test.event",
            "system event helper fault",
            SystemEventOutcome::Fault,
        );
    }
}
