use crate::node::peers::PeerId;
use crate::node::role::{FollowerRole, Role, RoleSnapshot};
use crate::node::Node;
use tokio::sync::mpsc;

/// Published exactly once per link, when its receiver loop gives up on the peer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PeerLost {
    pub(crate) id: PeerId,
    pub(crate) address: String,
    /// The link was replaced by a newer one on purpose; nothing to react to.
    pub(crate) superseded: bool,
}

pub(crate) fn peer_lost_channel() -> (PeerLostPublisher, PeerLostStream) {
    let (tx, rx) = mpsc::unbounded_channel();

    (PeerLostPublisher { tx }, PeerLostStream { rx })
}

#[derive(Clone)]
pub(crate) struct PeerLostPublisher {
    tx: mpsc::UnboundedSender<PeerLost>,
}

impl PeerLostPublisher {
    pub(crate) fn publish(&self, event: PeerLost) {
        let _ = self.tx.send(event);
    }
}

pub(crate) struct PeerLostStream {
    rx: mpsc::UnboundedReceiver<PeerLost>,
}

impl PeerLostStream {
    pub(crate) async fn recv(&mut self) -> Option<PeerLost> {
        self.rx.recv().await
    }
}

/// Consumes `PeerLost` events for the life of the node and reacts based on the current role.
pub(crate) async fn dispatch_peer_lost(node: Node, mut stream: PeerLostStream) {
    let logger = node.context().logger.clone();

    while let Some(event) = stream.recv().await {
        if node.context().shutdown.should_stop() {
            break;
        }
        handle_peer_lost(&node, event);
    }

    slog::info!(logger, "PeerLost dispatcher has exited");
}

fn handle_peer_lost(node: &Node, event: PeerLost) {
    let ctx = node.context();

    if event.superseded {
        slog::debug!(ctx.logger, "Ignoring loss of superseded link {:?}", event.id);
        return;
    }

    match (&event.id, ctx.role_snapshot()) {
        (PeerId::Leader, RoleSnapshot::Follower(leader_address)) if leader_address == event.address => {
            slog::warn!(ctx.logger, "Lost leader {}", event.address);
            ctx.membership.clear_leader();
            ctx.set_role(Role::Follower(FollowerRole::leaderless()));
            if !node.election().start() {
                slog::info!(ctx.logger, "Election already in progress");
            }
        }
        (PeerId::Address(address), RoleSnapshot::Leader) => {
            slog::warn!(ctx.logger, "Lost follower {}", address);
            let membership = node.membership();
            let address = address.clone();
            tokio::spawn(async move { membership.handle_follower_lost(&address).await });
        }
        (_, role) => {
            slog::debug!(ctx.logger, "Ignoring {:?} while {:?}", event, role);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::context::Timings;
    use crate::node::heartbeat::HeartbeatMonitor;
    use crate::node::peers::PeerLink;
    use crate::node::test_utils::{self, PeerCall, TestNode};
    use crate::node::timers;
    use crate::node::{FollowMeInput, FollowerEntry, FollowerId};
    use tokio::time::Duration;

    fn entry(address: &str, id: u64) -> FollowerEntry {
        FollowerEntry {
            address: address.into(),
            id: FollowerId::new(id),
        }
    }

    #[tokio::test]
    async fn superseded_leader_loss_is_ignored() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        let node = test_node.node.clone();
        node.context().set_role(Role::Follower(FollowerRole::following("10.0.0.1:7000".into())));

        handle_peer_lost(
            &node,
            PeerLost {
                id: PeerId::Leader,
                address: "10.0.0.1:7000".into(),
                superseded: true,
            },
        );

        assert_eq!(
            node.context().role_snapshot(),
            RoleSnapshot::Follower("10.0.0.1:7000".into())
        );
        assert!(!node.context().election.in_progress());
    }

    #[tokio::test]
    async fn leader_loss_on_follower_starts_election() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        let node = test_node.node.clone();
        test_node.connector.peer("10.0.0.1:7000");
        test_node.connector.peer("10.0.0.3:7000");
        node.membership()
            .follow_leader(FollowMeInput {
                leader_address: "10.0.0.1:7000".into(),
                followers: vec![entry("10.0.0.2:7000", 1), entry("10.0.0.3:7000", 2)],
                assigned_id: FollowerId::new(1),
            })
            .await
            .unwrap();

        handle_peer_lost(
            &node,
            PeerLost {
                id: PeerId::Leader,
                address: "10.0.0.1:7000".into(),
                superseded: false,
            },
        );
        assert!(node.context().election.in_progress());

        // We hold the lowest ID; the other follower soliciting us completes the election.
        node.election().handle_follow("10.0.0.3:7000".into());
        let mut listener = node.context().role_listener();
        tokio::time::timeout(Duration::from_secs(5), async {
            while listener.current() != RoleSnapshot::Leader {
                listener.next().await;
            }
        })
        .await
        .expect("Expected promotion to leader");
    }

    #[tokio::test]
    async fn silent_leader_starts_exactly_one_election() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        let node = test_node.node.clone();
        let ctx = node.context().clone();
        let old_leader = test_node.connector.peer("10.0.0.1:7000");
        let other = test_node.connector.peer("10.0.0.3:7000");
        ctx.membership.replace_from_leader(&FollowMeInput {
            leader_address: "10.0.0.1:7000".into(),
            followers: vec![entry("10.0.0.2:7000", 1), entry("10.0.0.3:7000", 2)],
            assigned_id: FollowerId::new(1),
        });
        ctx.set_role(Role::Follower(FollowerRole::following("10.0.0.1:7000".into())));

        // Leader link watched on a mock clock, its loss going through the real dispatcher.
        let (publisher, stream) = peer_lost_channel();
        let (clock, mut controller) = timers::mocked_clock();
        let timings = Timings {
            probe_interval: Duration::from_millis(100),
            probe_timeout: Duration::from_millis(100),
            heartbeat_deadline: Duration::from_millis(400),
            ..ctx.timings.clone()
        };
        let monitor = HeartbeatMonitor::new(
            ctx.logger.clone(),
            ctx.self_address.clone(),
            ctx.peers.clone(),
            publisher,
            ctx.shutdown.clone(),
            &timings,
            clock,
        );
        let link = PeerLink::new(PeerId::Leader, "10.0.0.1:7000".into(), old_leader);
        ctx.peers.add(link.clone()).unwrap();
        tokio::spawn(dispatch_peer_lost(node.clone(), stream));
        monitor.start_monitoring(link.clone());

        // The old leader never heartbeats us. Run well past the deadline, poking the dead link too.
        for _ in 0..100 {
            tokio::task::yield_now().await;
            controller.advance(Duration::from_millis(10));
        }
        link.force_die();

        test_utils::wait_until(|| ctx.election.in_progress()).await;
        assert!(!node.election().start(), "Election must already be running");
        assert_eq!(ctx.role_snapshot(), RoleSnapshot::FollowerNoLeader);

        node.election().handle_follow("10.0.0.3:7000".into());
        test_utils::wait_until(|| !ctx.election.in_progress()).await;
        assert_eq!(ctx.role_snapshot(), RoleSnapshot::Leader);
        // Won as candidate without ever nominating anyone.
        assert!(!other.calls().iter().any(|call| matches!(call, PeerCall::Follow(_))));
    }

    #[tokio::test]
    async fn stale_leader_address_is_ignored() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        let node = test_node.node.clone();
        node.context().set_role(Role::Follower(FollowerRole::following("10.0.0.5:7000".into())));

        handle_peer_lost(
            &node,
            PeerLost {
                id: PeerId::Leader,
                address: "10.0.0.1:7000".into(),
                superseded: false,
            },
        );

        assert!(!node.context().election.in_progress());
    }
}
