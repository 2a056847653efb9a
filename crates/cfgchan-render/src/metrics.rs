//! ---
//! cc_section: "04-channel-rendering"
//! cc_subsection: "module"
//! cc_type: "source"
//! cc_scope: "code"
//! cc_description: "Channel rendering engine and state manifest writer."
//! cc_version: "v0.0.0-prealpha"
//! cc_owner: "tbd"
//! ---
use std::sync::Arc;

use prometheus::{self, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use crate::Result;

/// Metrics published by the channel renderer.
#[derive(Clone)]
pub struct RenderMetrics {
    renders: IntCounterVec,
    render_failures: IntCounterVec,
    items_rendered: IntCounterVec,
    render_duration: HistogramVec,
    #[allow(dead_code)]
    registry: Arc<Registry>,
}

impl RenderMetrics {
    /// Register all renderer metrics with the provided registry.
    pub fn new(registry: Arc<Registry>) -> Result<Self> {
        let renders = IntCounterVec::new(
            Opts::new(
                "cfgchan_renders_total",
                "Total number of channel renders that completed successfully",
            ),
            &["org"],
        )?;
        registry.register(Box::new(renders.clone()))?;

        let render_failures = IntCounterVec::new(
            Opts::new(
                "cfgchan_render_failures_total",
                "Total number of channel renders that failed",
            ),
            &["org"],
        )?;
        registry.register(Box::new(render_failures.clone()))?;

        let items_rendered = IntCounterVec::new(
            Opts::new(
                "cfgchan_items_rendered_total",
                "Total number of configuration items written to state manifests",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(items_rendered.clone()))?;

        let histogram_opts = HistogramOpts::new(
            "cfgchan_render_duration_seconds",
            "Duration of a single channel render",
        )
        .buckets(prometheus::exponential_buckets(0.0005, 2.0, 12)?);
        let render_duration = HistogramVec::new(histogram_opts, &["org"])?;
        registry.register(Box::new(render_duration.clone()))?;

        Ok(Self {
            renders,
            render_failures,
            items_rendered,
            render_duration,
            registry,
        })
    }

    /// Record a completed render and how long it took.
    pub fn record_render(&self, org: u64, seconds: f64) {
        let org = org.to_string();
        self.renders.with_label_values(&[&org]).inc();
        self.render_duration
            .with_label_values(&[&org])
            .observe(seconds);
    }

    /// Record a failed render.
    pub fn record_failure(&self, org: u64) {
        self.render_failures
            .with_label_values(&[&org.to_string()])
            .inc();
    }

    /// Count one rendered item of the given kind (`file`, `dir`, `symlink`).
    pub fn record_item(&self, kind: &str) {
        self.items_rendered.with_label_values(&[kind]).inc();
    }
}

impl std::fmt::Debug for RenderMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderMetrics").finish_non_exhaustive()
    }
}
