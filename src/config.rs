use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Address the HTTP/WebSocket server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Prober settings
    #[serde(default)]
    pub probe: ProberConfig,
}

/// Prober configuration
///
/// Injectable so tests can run against ephemeral endpoints with short delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProberConfig {
    /// Probe target: `ws://`/`wss://` for the message transport,
    /// `http://`/`https://` for GET polling
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Milliseconds between probes
    #[serde(default = "default_probe_interval")]
    pub probe_interval_ms: u64,

    /// Milliseconds to wait before a reconnect attempt
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
}

impl MonitorConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| default_bind_addr());

        let endpoint = std::env::var("PROBE_ENDPOINT")
            .unwrap_or_else(|_| format!("ws://{}/ws", bind_addr));

        let probe_interval_ms = std::env::var("PROBE_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(default_probe_interval);

        let reconnect_delay_ms = std::env::var("RECONNECT_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or_else(default_reconnect_delay);

        Self {
            bind_addr,
            probe: ProberConfig {
                endpoint,
                probe_interval_ms,
                reconnect_delay_ms,
            },
        }
    }
}

impl ProberConfig {
    /// Probe cadence as a `Duration`
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Reconnect back-off as a `Duration`
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            probe: ProberConfig::default(),
        }
    }
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            probe_interval_ms: default_probe_interval(),
            reconnect_delay_ms: default_reconnect_delay(),
        }
    }
}

// Default value functions for serde
fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_endpoint() -> String {
    "ws://127.0.0.1:3000/ws".to_string()
}

fn default_probe_interval() -> u64 {
    1000
}

fn default_reconnect_delay() -> u64 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.probe.endpoint, "ws://127.0.0.1:3000/ws");
        assert_eq!(config.probe.probe_interval_ms, 1000);
        assert_eq!(config.probe.reconnect_delay_ms, 3000);
    }

    #[test]
    fn test_duration_accessors() {
        let config = ProberConfig::default();
        assert_eq!(config.probe_interval(), Duration::from_millis(1000));
        assert_eq!(config.reconnect_delay(), Duration::from_millis(3000));
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: ProberConfig =
            serde_json::from_str(r#"{"endpoint": "http://localhost:9000/api/ping"}"#).unwrap();

        assert_eq!(config.endpoint, "http://localhost:9000/api/ping");
        assert_eq!(config.probe_interval_ms, 1000);
        assert_eq!(config.reconnect_delay_ms, 3000);
    }
}
