//! Test doubles for exercising the prober without a network

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::transport::{ProbeError, ProbeTransport};

/// Scripted outcome for one mock round-trip
#[derive(Debug, Clone)]
pub enum MockRoundtrip {
    /// Acknowledge after the given simulated delay
    Ack(Duration),

    /// Fail this probe only, keeping the connection
    Discard,

    /// Drop the connection
    Lose,
}

/// Transport whose connect and round-trip outcomes are scripted up front
///
/// When the script runs out, further round-trips drop the connection, so a
/// prober driven past the script simply cycles through reconnects.
#[derive(Debug)]
pub struct MockTransport {
    refuse_connections: bool,
    script: VecDeque<MockRoundtrip>,
    connect_attempts: Arc<AtomicU64>,
}

impl MockTransport {
    /// A transport that refuses every connection attempt
    pub fn always_failing() -> Self {
        Self {
            refuse_connections: true,
            script: VecDeque::new(),
            connect_attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A transport that connects successfully and plays back `outcomes`
    pub fn with_script(outcomes: Vec<MockRoundtrip>) -> Self {
        Self {
            refuse_connections: false,
            script: outcomes.into(),
            connect_attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counter handle that stays valid after the transport moves into a prober
    pub fn connect_attempts(&self) -> Arc<AtomicU64> {
        self.connect_attempts.clone()
    }
}

#[async_trait]
impl ProbeTransport for MockTransport {
    async fn connect(&mut self) -> Result<(), ProbeError> {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);

        if self.refuse_connections {
            Err(ProbeError::Connect("mock refused".to_string()))
        } else {
            Ok(())
        }
    }

    async fn roundtrip(&mut self) -> Result<Duration, ProbeError> {
        match self.script.pop_front() {
            Some(MockRoundtrip::Ack(rtt)) => {
                tokio::time::sleep(rtt).await;
                Ok(rtt)
            }
            Some(MockRoundtrip::Discard) => {
                Err(ProbeError::MalformedResponse("mock discard".to_string()))
            }
            Some(MockRoundtrip::Lose) | None => {
                Err(ProbeError::ConnectionLost("mock script exhausted".to_string()))
            }
        }
    }

    fn endpoint(&self) -> &str {
        "mock://probe"
    }
}
