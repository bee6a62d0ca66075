// Library Crate Root
// lib.rs

// pub mod xxx declares xxx module exists in the same crate
// lib.rs is the public API contract for your library crate when other crates using it
// main.rs (if you have it) also imports through lib.rs like an external crate
pub mod api;
pub mod config;
pub mod display;
pub mod estimator;
pub mod metrics;
pub mod models;
pub mod prober;
pub mod testing;
pub mod transport;
pub mod websocket;

// pub use = re-export at crate root
pub use api::{create_router, AppState};
pub use config::{MonitorConfig, ProberConfig};
pub use display::LatencyIndicator;
pub use estimator::{RollingWindow, HISTORY_CAPACITY};
pub use metrics::{LatencyMonitor, MonitorSnapshot, RttStats};
pub use models::{PingResponse, ProbeRequest};
pub use prober::{ConnectionState, ProbeStateMachine, Prober};
pub use transport::{transport_for, HttpTransport, ProbeError, ProbeTransport, WsTransport};
