use crate::api::event_bus::EventListener;
use crate::api::replicated_log::TopicLog;
use crate::api::types::ClusterMember;
use crate::node::{Node, Stopper};
use crate::server::RpcServerShutdownHandle;

/// ClusterNode is a running cluster node. Dropping it (or calling `shutdown()`) stops the RPC
/// server and every background task.
pub struct ClusterNode {
    pub topic_log: TopicLog,
    pub event_listener: EventListener,
    pub(crate) node: Node,
    pub(crate) server_shutdown: RpcServerShutdownHandle,
    pub(crate) node_shutdown: Stopper,
}

impl ClusterNode {
    /// The address peers and clients reach this node at.
    pub fn address(&self) -> &str {
        &self.node.context().self_address
    }

    /// Make this node leader of `follower_addresses`. This is what the registry's `Lead` RPC does;
    /// returns the followers that actually joined.
    pub async fn lead(&self, follower_addresses: Vec<String>) -> Vec<ClusterMember> {
        self.node
            .lead(follower_addresses)
            .await
            .into_iter()
            .map(ClusterMember::from)
            .collect()
    }

    /// This node's copy of the follower table, lowest ID first.
    pub fn members(&self) -> Vec<ClusterMember> {
        self.node
            .context()
            .membership
            .snapshot()
            .into_iter()
            .map(ClusterMember::from)
            .collect()
    }

    pub fn shutdown(self) {
        slog::info!(self.node.context().logger, "Shutting down");
        let ClusterNode {
            server_shutdown,
            node_shutdown,
            ..
        } = self;
        drop(node_shutdown);
        server_shutdown.shutdown();
    }
}
