//! Latency indicator
//!
//! Renders the smoothed average with a fixed label on the probe cadence.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

use crate::metrics::LatencyMonitor;

/// Fixed label the indicator renders with
pub const LATENCY_LABEL: &str = "LATENCY";

/// Placeholder shown before the first sample arrives
pub const NO_DATA: &str = "--";

/// Display-only precision rule: averages at or below 10 ms keep two decimals,
/// larger ones round to whole milliseconds
pub fn format_latency_value(average_ms: f64) -> String {
    if average_ms <= 10.0 {
        format!("{:.2}", average_ms)
    } else {
        format!("{}", average_ms.round() as i64)
    }
}

/// Render the indicator line, e.g. `LATENCY: 42ms`
pub fn render_indicator(average_ms: Option<f64>) -> String {
    match average_ms {
        Some(average) => format!("{}: {}ms", LATENCY_LABEL, format_latency_value(average)),
        None => format!("{}: {}", LATENCY_LABEL, NO_DATA),
    }
}

/// Periodically re-renders the smoothed latency
///
/// On sustained probe failure the rendered value simply goes stale; there is
/// no separate offline state.
pub struct LatencyIndicator {
    monitor: Arc<LatencyMonitor>,
    refresh: Duration,
}

impl LatencyIndicator {
    pub fn new(monitor: Arc<LatencyMonitor>, refresh: Duration) -> Self {
        Self { monitor, refresh }
    }

    /// Run for the lifetime of the process
    pub async fn run(self) {
        let mut ticker = interval(self.refresh);

        loop {
            ticker.tick().await;
            info!(target: "indicator", "{}", render_indicator(self.monitor.average_ms()));
        }
    }
}
