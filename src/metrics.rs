use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use utoipa::ToSchema;

use crate::estimator::RollingWindow;

/// Round-trip time tracker backed by an HDR Histogram
///
/// HDR Histograms provide accurate percentile calculations with minimal memory.
pub struct LatencyTracker {
    /// Probe round-trip time in microseconds
    rtt_us: Histogram<u64>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        // Configure histogram: 1us to 60 seconds, 3 significant figures
        Self {
            rtt_us: Histogram::new_with_bounds(1, 60_000_000, 3).unwrap(),
        }
    }

    /// Record one completed round-trip
    #[inline]
    pub fn record(&mut self, rtt: Duration) {
        let micros = (rtt.as_micros() as u64).max(1);
        let _ = self.rtt_us.record(micros);
    }

    /// Get round-trip statistics for the session
    pub fn stats(&self) -> RttStats {
        RttStats {
            p50_ms: self.rtt_us.value_at_percentile(50.0) as f64 / 1000.0,
            p95_ms: self.rtt_us.value_at_percentile(95.0) as f64 / 1000.0,
            p99_ms: self.rtt_us.value_at_percentile(99.0) as f64 / 1000.0,
            min_ms: self.rtt_us.min() as f64 / 1000.0,
            max_ms: self.rtt_us.max() as f64 / 1000.0,
            mean_ms: self.rtt_us.mean() / 1000.0,
            sample_count: self.rtt_us.len(),
        }
    }

    /// Reset the histogram
    pub fn reset(&mut self) {
        self.rtt_us.clear();
    }
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Session round-trip percentiles in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RttStats {
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub sample_count: u64,
}

/// Shared latency aggregate
///
/// The prober is the only writer of samples; the indicator and the stats
/// endpoint read concurrently. The rolling window drives the displayed
/// average, the histogram keeps whole-session percentiles.
pub struct LatencyMonitor {
    window: Mutex<RollingWindow>,
    tracker: Mutex<LatencyTracker>,

    /// Probes sent since startup
    probes_sent: AtomicU64,

    /// Probes acknowledged since startup
    acks_received: AtomicU64,

    /// Probes discarded without invalidating the connection
    probe_failures: AtomicU64,

    /// Reconnect attempts scheduled since startup
    reconnects: AtomicU64,
}

impl LatencyMonitor {
    pub fn new() -> Self {
        Self::with_window(RollingWindow::default())
    }

    /// Build a monitor around a window of custom capacity
    pub fn with_window(window: RollingWindow) -> Self {
        Self {
            window: Mutex::new(window),
            tracker: Mutex::new(LatencyTracker::new()),
            probes_sent: AtomicU64::new(0),
            acks_received: AtomicU64::new(0),
            probe_failures: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
        }
    }

    /// Record one completed round-trip into the window and the histogram
    pub fn record_sample(&self, rtt: Duration) {
        let sample_ms = rtt.as_secs_f64() * 1000.0;

        self.window.lock().record(sample_ms);
        self.tracker.lock().record(rtt);
        self.acks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_probe_sent(&self) {
        self.probes_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_probe_failure(&self) {
        self.probe_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Smoothed average over the rolling window, `None` before the first sample
    pub fn average_ms(&self) -> Option<f64> {
        self.window.lock().average()
    }

    /// Most recent sample, `None` before the first sample
    pub fn last_ms(&self) -> Option<f64> {
        self.window.lock().last()
    }

    /// Point-in-time view of the aggregate
    pub fn snapshot(&self) -> MonitorSnapshot {
        let window = self.window.lock();

        MonitorSnapshot {
            average_ms: window.average(),
            last_ms: window.last(),
            window_len: window.len(),
            probes_sent: self.probes_sent.load(Ordering::Relaxed),
            acks_received: self.acks_received.load(Ordering::Relaxed),
            probe_failures: self.probe_failures.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            rtt: self.tracker.lock().stats(),
        }
    }
}

impl Default for LatencyMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of the monitor state
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonitorSnapshot {
    /// Smoothed round-trip average in milliseconds, absent before the first sample
    pub average_ms: Option<f64>,
    pub last_ms: Option<f64>,
    pub window_len: usize,
    pub probes_sent: u64,
    pub acks_received: u64,
    pub probe_failures: u64,
    pub reconnects: u64,
    pub rtt: RttStats,
}
