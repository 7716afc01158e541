use crate::node::context::{NodeContext, NodeContextConfig};
use crate::node::election::ElectionCoordinator;
use crate::node::events::{self, PeerLostStream};
use crate::node::membership::MembershipManager;
use crate::node::node_api::FollowerEntry;
use crate::node::replication::ReplicationCoordinator;
use crate::node::timers::{self, Clock, RealClock};
use std::sync::Arc;
use tokio::time::Duration;

/// Node is a cheap handle to one cluster node. The RPC server and the public API both drive the
/// node through it.
#[derive(Clone)]
pub(crate) struct Node {
    ctx: Arc<NodeContext>,
}

impl Node {
    /// The returned stream must be handed to `start_background_tasks` once the node is reachable.
    pub(crate) fn new(config: NodeContextConfig) -> (Self, PeerLostStream) {
        let (ctx, peer_lost_stream) = NodeContext::new(config);

        (Node { ctx }, peer_lost_stream)
    }

    pub(crate) fn context(&self) -> &Arc<NodeContext> {
        &self.ctx
    }

    pub(crate) fn membership(&self) -> MembershipManager {
        MembershipManager::new(self.ctx.clone())
    }

    pub(crate) fn election(&self) -> ElectionCoordinator {
        ElectionCoordinator::new(self.ctx.clone())
    }

    pub(crate) fn replication(&self) -> ReplicationCoordinator {
        ReplicationCoordinator::new(self.ctx.clone())
    }

    /// The registry picked us to lead `follower_addresses`.
    pub(crate) async fn lead(&self, follower_addresses: Vec<String>) -> Vec<FollowerEntry> {
        self.membership().become_leader(follower_addresses).await
    }

    pub(crate) fn start_background_tasks(&self, peer_lost_stream: PeerLostStream) {
        tokio::spawn(events::dispatch_peer_lost(self.clone(), peer_lost_stream));
        tokio::spawn(run_registry_heartbeat(self.ctx.clone(), RealClock));
    }
}

/// Pings the registry at half the registry's heartbeat interval until shutdown. Failures are only
/// logged.
async fn run_registry_heartbeat<C: Clock>(ctx: Arc<NodeContext>, mut clock: C) {
    while !ctx.shutdown.should_stop() {
        let interval = ctx.settings().heartbeat_interval;
        match timers::timeout(&clock, interval, ctx.registry.heartbeat(&ctx.self_address)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => slog::warn!(ctx.logger, "Registry heartbeat failed: {}", e),
            Err(e) => slog::warn!(ctx.logger, "Registry heartbeat failed: {}", e),
        }

        clock.sleep(std::cmp::max(interval / 2, Duration::from_millis(1))).await;
    }

    slog::info!(ctx.logger, "Registry heartbeat loop has exited");
}
