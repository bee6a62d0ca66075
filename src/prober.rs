//! Latency prober
//!
//! Owns the connection lifecycle and the probe cadence. The lifecycle is an
//! explicit state machine over a closed set of events, so every transition
//! can be unit tested without a network; the async driver around it only
//! translates transport outcomes into events and executes the resulting
//! actions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::ProberConfig;
use crate::metrics::LatencyMonitor;
use crate::transport::ProbeTransport;

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Events driving the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeEvent {
    /// A connection attempt was requested
    ConnectRequested,

    /// The transport established its link
    ConnectionOpened,

    /// The link failed to establish, errored, or closed
    ConnectionLost,

    /// The probe cadence fired
    ProbeTick,

    /// A probe was discarded without invalidating the connection
    ProbeFailed,

    /// A probe acknowledgement arrived
    AckReceived { rtt: Duration },
}

/// Effects the driver executes in response to a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeAction {
    OpenConnection,
    SendProbe,
    RecordSample(Duration),
    ScheduleReconnect,
}

/// Pure transition function over (state, event)
#[derive(Debug, Default)]
pub struct ProbeStateMachine {
    state: ConnectionState,
}

impl ProbeStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Apply one event, returning the action the driver must execute
    pub fn handle(&mut self, event: ProbeEvent) -> Option<ProbeAction> {
        use ConnectionState::*;
        use ProbeEvent::*;

        match (self.state, event) {
            (Disconnected, ConnectRequested) => {
                self.state = Connecting;
                Some(ProbeAction::OpenConnection)
            }
            // At most one live connection attempt per prober
            (Connecting | Connected, ConnectRequested) => None,

            (Connecting, ConnectionOpened) => {
                self.state = Connected;
                None
            }

            (Connecting | Connected, ConnectionLost) => {
                self.state = Disconnected;
                Some(ProbeAction::ScheduleReconnect)
            }
            (Disconnected, ConnectionLost) => None,

            // Probing is a no-op unless connected
            (Connected, ProbeTick) => Some(ProbeAction::SendProbe),

            (Connected, AckReceived { rtt }) => Some(ProbeAction::RecordSample(rtt)),

            // A failed probe costs its sample, nothing else
            (Connected, ProbeFailed) => None,

            // Late acks, stray ticks and stray opens are dropped
            _ => None,
        }
    }
}

/// Component owning the connection and the probe cadence
///
/// Records completed round-trips into the shared [`LatencyMonitor`]. All
/// connection errors are absorbed into the reconnect cycle; nothing is ever
/// surfaced to callers except an absent sample.
pub struct Prober {
    transport: Box<dyn ProbeTransport>,
    machine: ProbeStateMachine,
    monitor: Arc<LatencyMonitor>,
    config: ProberConfig,
}

impl Prober {
    pub fn new(
        transport: Box<dyn ProbeTransport>,
        monitor: Arc<LatencyMonitor>,
        config: ProberConfig,
    ) -> Self {
        Self {
            transport,
            machine: ProbeStateMachine::new(),
            monitor,
            config,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.machine.state()
    }

    /// Drive the prober for the lifetime of the process
    ///
    /// Never returns: reconnection uses a fixed delay with no retry cap, and
    /// each cycle allocates nothing beyond the action queue entries.
    pub async fn run(mut self) {
        info!("🛰️  Prober started against {}", self.transport.endpoint());

        let mut queue: VecDeque<ProbeAction> = VecDeque::new();
        self.dispatch(ProbeEvent::ConnectRequested, &mut queue);

        let mut cadence = self.new_cadence();

        loop {
            while let Some(action) = queue.pop_front() {
                match action {
                    ProbeAction::OpenConnection => match self.transport.connect().await {
                        Ok(()) => {
                            info!("Connected to {}", self.transport.endpoint());
                            self.dispatch(ProbeEvent::ConnectionOpened, &mut queue);
                            // Fresh cadence so the first probe fires immediately
                            cadence = self.new_cadence();
                        }
                        Err(e) => {
                            warn!("Connection attempt failed: {}", e);
                            self.dispatch(ProbeEvent::ConnectionLost, &mut queue);
                        }
                    },

                    ProbeAction::ScheduleReconnect => {
                        self.monitor.mark_reconnect();
                        debug!("Reconnecting in {:?}", self.config.reconnect_delay());
                        sleep(self.config.reconnect_delay()).await;
                        self.dispatch(ProbeEvent::ConnectRequested, &mut queue);
                    }

                    ProbeAction::SendProbe => {
                        self.monitor.mark_probe_sent();
                        match self.transport.roundtrip().await {
                            Ok(rtt) => {
                                self.dispatch(ProbeEvent::AckReceived { rtt }, &mut queue);
                            }
                            Err(e) if e.is_connection_fatal() => {
                                warn!("Probe failed, connection lost: {}", e);
                                self.dispatch(ProbeEvent::ConnectionLost, &mut queue);
                            }
                            Err(e) => {
                                debug!("Probe discarded: {}", e);
                                self.monitor.mark_probe_failure();
                                self.dispatch(ProbeEvent::ProbeFailed, &mut queue);
                            }
                        }
                    }

                    ProbeAction::RecordSample(rtt) => {
                        debug!("Sample recorded: {:.2} ms", rtt.as_secs_f64() * 1000.0);
                        self.monitor.record_sample(rtt);
                    }
                }
            }

            // Queue drained: when connected the only pending work is the next
            // tick. Any other state here means the machine had nothing
            // scheduled, so kick the connect cycle again after the back-off
            // rather than spin.
            if self.machine.state() == ConnectionState::Connected {
                cadence.tick().await;
                self.dispatch(ProbeEvent::ProbeTick, &mut queue);
            } else {
                sleep(self.config.reconnect_delay()).await;
                self.dispatch(ProbeEvent::ConnectRequested, &mut queue);
            }
        }
    }

    fn dispatch(&mut self, event: ProbeEvent, queue: &mut VecDeque<ProbeAction>) {
        if let Some(action) = self.machine.handle(event) {
            queue.push_back(action);
        }
    }

    fn new_cadence(&self) -> Interval {
        let mut cadence = interval(self.config.probe_interval());
        // A round-trip longer than the interval delays the next probe instead
        // of bursting, keeping at most one probe outstanding
        cadence.set_missed_tick_behavior(MissedTickBehavior::Delay);
        cadence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockRoundtrip, MockTransport};

    fn test_config() -> ProberConfig {
        ProberConfig {
            endpoint: "mock://probe".to_string(),
            probe_interval_ms: 1000,
            reconnect_delay_ms: 3000,
        }
    }

    #[test]
    fn test_initial_state_is_disconnected() {
        let machine = ProbeStateMachine::new();
        assert_eq!(machine.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_connect_request_opens_connection() {
        let mut machine = ProbeStateMachine::new();

        let action = machine.handle(ProbeEvent::ConnectRequested);
        assert_eq!(action, Some(ProbeAction::OpenConnection));
        assert_eq!(machine.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_connect_request_is_idempotent() {
        let mut machine = ProbeStateMachine::new();

        machine.handle(ProbeEvent::ConnectRequested);
        // A second request while the first attempt is in flight does nothing
        assert_eq!(machine.handle(ProbeEvent::ConnectRequested), None);
        assert_eq!(machine.state(), ConnectionState::Connecting);

        machine.handle(ProbeEvent::ConnectionOpened);
        assert_eq!(machine.state(), ConnectionState::Connected);

        // Nor does one while connected
        assert_eq!(machine.handle(ProbeEvent::ConnectRequested), None);
        assert_eq!(machine.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_connection_loss_schedules_reconnect() {
        let mut machine = ProbeStateMachine::new();

        machine.handle(ProbeEvent::ConnectRequested);
        assert_eq!(
            machine.handle(ProbeEvent::ConnectionLost),
            Some(ProbeAction::ScheduleReconnect)
        );
        assert_eq!(machine.state(), ConnectionState::Disconnected);

        // Loss while already disconnected is absorbed
        assert_eq!(machine.handle(ProbeEvent::ConnectionLost), None);
    }

    #[test]
    fn test_probe_tick_is_noop_unless_connected() {
        let mut machine = ProbeStateMachine::new();

        assert_eq!(machine.handle(ProbeEvent::ProbeTick), None);

        machine.handle(ProbeEvent::ConnectRequested);
        assert_eq!(machine.handle(ProbeEvent::ProbeTick), None);

        machine.handle(ProbeEvent::ConnectionOpened);
        assert_eq!(
            machine.handle(ProbeEvent::ProbeTick),
            Some(ProbeAction::SendProbe)
        );
    }

    #[test]
    fn test_ack_records_sample_only_when_connected() {
        let mut machine = ProbeStateMachine::new();
        let rtt = Duration::from_millis(42);

        // A late ack after disconnect is dropped
        assert_eq!(machine.handle(ProbeEvent::AckReceived { rtt }), None);

        machine.handle(ProbeEvent::ConnectRequested);
        machine.handle(ProbeEvent::ConnectionOpened);
        assert_eq!(
            machine.handle(ProbeEvent::AckReceived { rtt }),
            Some(ProbeAction::RecordSample(rtt))
        );
    }

    #[test]
    fn test_probe_failure_keeps_connection() {
        let mut machine = ProbeStateMachine::new();

        machine.handle(ProbeEvent::ConnectRequested);
        machine.handle(ProbeEvent::ConnectionOpened);

        assert_eq!(machine.handle(ProbeEvent::ProbeFailed), None);
        assert_eq!(machine.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_cadence_on_persistent_failure() {
        let transport = MockTransport::always_failing();
        let attempts = transport.connect_attempts();

        let monitor = Arc::new(LatencyMonitor::new());
        let prober = Prober::new(Box::new(transport), monitor.clone(), test_config());
        let handle = tokio::spawn(prober.run());

        // Attempts land at t=0 and then every ~3000 ms
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        handle.abort();

        let made = attempts.load(std::sync::atomic::Ordering::Relaxed);
        assert!(
            (3..=5).contains(&made),
            "expected roughly one attempt per 3000 ms, got {}",
            made
        );
        assert!(monitor.snapshot().reconnects >= 3);
        assert_eq!(monitor.average_ms(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_roundtrip_yields_sample() {
        let transport = MockTransport::with_script(vec![MockRoundtrip::Ack(
            Duration::from_millis(42),
        )]);

        let monitor = Arc::new(LatencyMonitor::new());
        let prober = Prober::new(Box::new(transport), monitor.clone(), test_config());
        let handle = tokio::spawn(prober.run());

        tokio::time::sleep(Duration::from_millis(500)).await;
        handle.abort();

        assert_eq!(monitor.last_ms(), Some(42.0));
        assert_eq!(monitor.average_ms(), Some(42.0));

        let snapshot = monitor.snapshot();
        assert!(snapshot.probes_sent >= 1);
        assert_eq!(snapshot.acks_received, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discarded_probe_keeps_probing() {
        let transport = MockTransport::with_script(vec![
            MockRoundtrip::Discard,
            MockRoundtrip::Ack(Duration::from_millis(10)),
        ]);

        let monitor = Arc::new(LatencyMonitor::new());
        let prober = Prober::new(Box::new(transport), monitor.clone(), test_config());
        let handle = tokio::spawn(prober.run());

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        handle.abort();

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.probe_failures, 1);
        assert_eq!(snapshot.acks_received, 1);
        assert_eq!(monitor.average_ms(), Some(10.0));
        // The discarded probe never invalidated the connection
        assert_eq!(snapshot.reconnects, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_loss_mid_session_reconnects() {
        let transport = MockTransport::with_script(vec![
            MockRoundtrip::Ack(Duration::from_millis(5)),
            MockRoundtrip::Lose,
            MockRoundtrip::Ack(Duration::from_millis(15)),
        ]);

        let monitor = Arc::new(LatencyMonitor::new());
        let prober = Prober::new(Box::new(transport), monitor.clone(), test_config());
        let handle = tokio::spawn(prober.run());

        // First ack at ~0ms, loss at ~1000ms, reconnect at ~4000ms, second ack there
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        handle.abort();

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.acks_received, 2);
        assert!(snapshot.reconnects >= 1);
        assert_eq!(monitor.average_ms(), Some(10.0));
    }
}
