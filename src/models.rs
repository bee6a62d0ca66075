use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON payload served by the ping endpoint and echoed over the WebSocket.
///
/// Field names are camelCase on the wire because the browser client reads
/// them directly.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    /// Server wall-clock time when the response was generated
    pub server_time: DateTime<Utc>,

    /// The same instant as unix milliseconds, for easy client-side math
    pub timestamp: i64,

    /// Milliseconds since the server started
    pub uptime: u64,
}

impl PingResponse {
    /// Build a response stamped with the current time
    pub fn now(started_at: DateTime<Utc>) -> Self {
        let now = Utc::now();

        Self {
            server_time: now,
            timestamp: now.timestamp_millis(),
            uptime: (now - started_at).num_milliseconds().max(0) as u64,
        }
    }
}

/// Client-to-server probe message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeRequest {
    Ping,
}
