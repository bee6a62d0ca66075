use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::metrics::{MonitorSnapshot, RttStats};

/// Prober statistics exposed by the stats endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Smoothed round-trip average in milliseconds, absent before the first sample
    pub average_ms: Option<f64>,

    /// Most recent sample in milliseconds
    pub last_ms: Option<f64>,

    /// Samples currently in the smoothing window
    pub window_len: usize,

    pub probes_sent: u64,
    pub acks_received: u64,
    pub probe_failures: u64,
    pub reconnects: u64,

    /// Whole-session round-trip percentiles
    pub rtt: RttStats,

    /// Milliseconds since the server started
    pub uptime_ms: u64,
}

impl StatsResponse {
    pub fn new(snapshot: MonitorSnapshot, started_at: DateTime<Utc>) -> Self {
        Self {
            average_ms: snapshot.average_ms,
            last_ms: snapshot.last_ms,
            window_len: snapshot.window_len,
            probes_sent: snapshot.probes_sent,
            acks_received: snapshot.acks_received,
            probe_failures: snapshot.probe_failures,
            reconnects: snapshot.reconnects,
            rtt: snapshot.rtt,
            uptime_ms: (Utc::now() - started_at).num_milliseconds().max(0) as u64,
        }
    }
}
