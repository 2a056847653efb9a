//! ---
//! cc_section: "03-logging"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Structured logging adapters and sinks."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
/// Emit an informational log enriched with channel context.
#[macro_export]
macro_rules! chan_info {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::INFO,
            org = ctx.org.unwrap_or_default(),
            channel = ctx.channel.unwrap_or(""),
            item = ctx.item.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::INFO,
            org = ctx.org.unwrap_or_default(),
            channel = ctx.channel.unwrap_or(""),
            item = ctx.item.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit a debug log enriched with channel context.
#[macro_export]
macro_rules! chan_debug {
    (context = $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            tracing::Level::DEBUG,
            org = ctx.org.unwrap_or_default(),
            channel = ctx.channel.unwrap_or(""),
            item = ctx.item.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
    ($($arg:tt)+) => {{
        let ctx = &$crate::LogContext::default();
        tracing::event!(
            tracing::Level::DEBUG,
            org = ctx.org.unwrap_or_default(),
            channel = ctx.channel.unwrap_or(""),
            item = ctx.item.unwrap_or(""),
            message = %format_args!($($arg)+)
        );
    }};
}
