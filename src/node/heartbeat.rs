use crate::node::context::Timings;
use crate::node::events::{PeerLost, PeerLostPublisher};
use crate::node::node_api::HeartbeatError;
use crate::node::peer_client::PeerRpcError;
use crate::node::peers::{Liveness, PeerLink, PeerTable};
use crate::node::timers::{self, Clock, RealClock, StopCheck};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// HeartbeatMonitor runs two tasks per link. The probe loop proves we're alive to the peer; the
/// deadline loop decides the peer is dead when it stops proving the same to us. One missed
/// deadline is fatal.
#[derive(Clone)]
pub(crate) struct HeartbeatMonitor<C: Clock = RealClock> {
    logger: slog::Logger,
    self_address: String,
    peers: Arc<PeerTable>,
    events: PeerLostPublisher,
    shutdown: StopCheck,
    probe_interval: Duration,
    probe_timeout: Duration,
    heartbeat_deadline: Duration,
    clock: C,
}

impl<C: Clock> HeartbeatMonitor<C> {
    pub(crate) fn new(
        logger: slog::Logger,
        self_address: String,
        peers: Arc<PeerTable>,
        events: PeerLostPublisher,
        shutdown: StopCheck,
        timings: &Timings,
        clock: C,
    ) -> Self {
        HeartbeatMonitor {
            logger,
            self_address,
            peers,
            events,
            shutdown,
            probe_interval: timings.probe_interval,
            probe_timeout: timings.probe_timeout,
            heartbeat_deadline: timings.heartbeat_deadline,
            clock,
        }
    }

    pub(crate) fn start_monitoring(&self, link: Arc<PeerLink>) {
        let liveness_rx = match link.take_liveness_receiver() {
            Some(rx) => rx,
            None => {
                slog::warn!(self.logger, "Link {:?} is already monitored", link);
                return;
            }
        };

        tokio::spawn(self.clone().run_probe_loop(link.clone()));
        tokio::spawn(self.clone().run_deadline_loop(link, liveness_rx));
    }

    /// Inbound heartbeat from `sender_address`.
    pub(crate) fn record_heartbeat(&self, sender_address: &str) -> Result<(), HeartbeatError> {
        match self.peers.find_by_address(sender_address) {
            Some(link) => {
                link.heartbeat_received();
                Ok(())
            }
            None => Err(HeartbeatError::Disconnected(sender_address.to_string())),
        }
    }

    async fn run_probe_loop(mut self, link: Arc<PeerLink>) {
        let closed = link.closed_check();

        loop {
            if closed.should_stop() || self.shutdown.should_stop() {
                return;
            }

            let next_probe = self.clock.now() + self.probe_interval;
            let probe = timers::timeout(
                &self.clock,
                self.probe_timeout,
                link.rpc().heartbeat(self.self_address.clone()),
            )
            .await;

            let failure = match probe {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e),
                Err(timed_out) => Some(PeerRpcError::from(timed_out)),
            };
            if let Some(e) = failure {
                if !closed.should_stop() {
                    slog::warn!(self.logger, "Heartbeat to {:?} failed: {}", link.id(), e);
                    link.force_die();
                }
                return;
            }

            self.clock.sleep_until(next_probe).await;
        }
    }

    async fn run_deadline_loop(self, link: Arc<PeerLink>, mut liveness_rx: mpsc::Receiver<Liveness>) {
        loop {
            match timers::timeout(&self.clock, self.heartbeat_deadline, liveness_rx.recv()).await {
                Ok(Some(Liveness::HeartbeatReceived)) => {}
                Ok(Some(Liveness::ForceDie)) => {
                    slog::debug!(self.logger, "Link {:?} was told to die", link.id());
                    break;
                }
                Ok(None) => break,
                Err(_) => {
                    slog::warn!(
                        self.logger,
                        "No heartbeat from {:?} within {:?}",
                        link.id(),
                        self.heartbeat_deadline
                    );
                    break;
                }
            }
        }

        self.peers.remove(link.id(), &link);
        link.close();

        if self.shutdown.should_stop() {
            return;
        }
        self.events.publish(PeerLost {
            id: link.id().clone(),
            address: link.address().to_string(),
            superseded: link.is_superseded(),
        });
    }
}
