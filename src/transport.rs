//! Probe transports
//!
//! A probe is one outbound round-trip request: either a `{"type":"ping"}`
//! text frame over a persistent WebSocket, answered by whatever the server
//! sends back, or a GET against the HTTP ping endpoint returning a
//! `PingResponse` body. Both sit behind the same trait so the prober can be
//! driven by a scripted transport in tests.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::models::{PingResponse, ProbeRequest};

/// Errors raised at the transport boundary
///
/// Nothing here escapes the prober: every variant is converted into a state
/// machine event, and callers observe only an absent sample.
///
/// # Error Categories
///
/// - **Connection-fatal**: `Connect`, `ConnectionLost`, `NotConnected` —
///   invalidate the link and schedule a reconnect
/// - **Probe-local**: `MalformedResponse`, `UnexpectedStatus` — discard the
///   single probe and keep the connection
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Could not establish the connection
    #[error("connection failed: {0}")]
    Connect(String),

    /// An established connection dropped or errored mid-session
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// A probe was issued without a live connection
    #[error("transport not connected")]
    NotConnected,

    /// A response arrived but could not be decoded
    #[error("malformed probe response: {0}")]
    MalformedResponse(String),

    /// The HTTP probe returned a non-success status
    #[error("unexpected status: {0}")]
    UnexpectedStatus(u16),

    /// The endpoint scheme maps to no known transport
    #[error("unsupported endpoint scheme: {0}")]
    UnsupportedScheme(String),
}

impl ProbeError {
    /// Returns true if the error invalidates the connection
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            ProbeError::Connect(_)
                | ProbeError::ConnectionLost(_)
                | ProbeError::NotConnected
                | ProbeError::UnsupportedScheme(_)
        )
    }
}

/// A link capable of round-trip probes
#[async_trait]
pub trait ProbeTransport: Send + std::fmt::Debug {
    /// Establish the underlying link. The prober never calls this while a
    /// previous attempt is still in flight.
    async fn connect(&mut self) -> Result<(), ProbeError>;

    /// Send one probe and await its acknowledgement, returning the elapsed
    /// time. At most one round-trip is in flight at a time.
    async fn roundtrip(&mut self) -> Result<Duration, ProbeError>;

    /// Probe target, for logging
    fn endpoint(&self) -> &str;
}

/// Pick a transport from the endpoint scheme
pub fn transport_for(endpoint: &str) -> Result<Box<dyn ProbeTransport>, ProbeError> {
    if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
        Ok(Box::new(WsTransport::new(endpoint)))
    } else if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(Box::new(HttpTransport::new(endpoint)))
    } else {
        Err(ProbeError::UnsupportedScheme(endpoint.to_string()))
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Message-based probe over a persistent WebSocket connection
#[derive(Debug)]
pub struct WsTransport {
    endpoint: String,
    stream: Option<WsStream>,
}

impl WsTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            stream: None,
        }
    }
}

#[async_trait]
impl ProbeTransport for WsTransport {
    async fn connect(&mut self) -> Result<(), ProbeError> {
        let (stream, _) = connect_async(self.endpoint.as_str())
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;

        debug!("WebSocket transport connected to {}", self.endpoint);
        self.stream = Some(stream);
        Ok(())
    }

    async fn roundtrip(&mut self) -> Result<Duration, ProbeError> {
        // Taken out for the duration of the round-trip; put back only on
        // success so a failed probe leaves the transport disconnected
        let mut stream = self.stream.take().ok_or(ProbeError::NotConnected)?;

        let probe = serde_json::to_string(&ProbeRequest::Ping)
            .map_err(|e| ProbeError::MalformedResponse(e.to_string()))?;

        let sent_at = Instant::now();
        stream
            .send(Message::Text(probe))
            .await
            .map_err(|e| ProbeError::ConnectionLost(e.to_string()))?;

        // Any server message acknowledges the probe
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(_))) | Some(Ok(Message::Binary(_))) => {
                    let elapsed = sent_at.elapsed();
                    self.stream = Some(stream);
                    return Ok(elapsed);
                }
                Some(Ok(Message::Ping(payload))) => {
                    // Keep the connection alive while waiting
                    stream
                        .send(Message::Pong(payload))
                        .await
                        .map_err(|e| ProbeError::ConnectionLost(e.to_string()))?;
                }
                Some(Ok(Message::Close(_))) | None => {
                    return Err(ProbeError::ConnectionLost(
                        "server closed the connection".to_string(),
                    ));
                }
                Some(Err(e)) => {
                    return Err(ProbeError::ConnectionLost(e.to_string()));
                }
                Some(Ok(_)) => {} // pong frames are not acknowledgements
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Request/response probe against the HTTP ping endpoint
///
/// The link is per-request, so `connect` is trivially successful and all
/// failures surface per round-trip.
#[derive(Debug)]
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ProbeTransport for HttpTransport {
    async fn connect(&mut self) -> Result<(), ProbeError> {
        Ok(())
    }

    async fn roundtrip(&mut self) -> Result<Duration, ProbeError> {
        let sent_at = Instant::now();

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| ProbeError::ConnectionLost(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::UnexpectedStatus(status.as_u16()));
        }

        response
            .json::<PingResponse>()
            .await
            .map_err(|e| ProbeError::MalformedResponse(e.to_string()))?;

        Ok(sent_at.elapsed())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(ProbeError::Connect("refused".to_string()).is_connection_fatal());
        assert!(ProbeError::ConnectionLost("reset".to_string()).is_connection_fatal());
        assert!(ProbeError::NotConnected.is_connection_fatal());

        assert!(!ProbeError::MalformedResponse("bad json".to_string()).is_connection_fatal());
        assert!(!ProbeError::UnexpectedStatus(503).is_connection_fatal());
    }

    #[test]
    fn test_transport_selection() {
        assert_eq!(
            transport_for("ws://localhost:3000/ws").unwrap().endpoint(),
            "ws://localhost:3000/ws"
        );
        assert_eq!(
            transport_for("https://example.com/api/ping").unwrap().endpoint(),
            "https://example.com/api/ping"
        );

        let err = transport_for("ftp://example.com").unwrap_err();
        assert!(matches!(err, ProbeError::UnsupportedScheme(_)));
    }

    #[tokio::test]
    async fn test_ws_roundtrip_requires_connection() {
        let mut transport = WsTransport::new("ws://127.0.0.1:1/ws");
        let err = transport.roundtrip().await.unwrap_err();
        assert!(matches!(err, ProbeError::NotConnected));
    }
}
