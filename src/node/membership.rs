use crate::node::context::NodeContext;
use crate::node::node_api::{FollowMeError, FollowMeInput, FollowMeOutput, FollowerEntry, FollowerId, MembershipError};
use crate::node::peer_client::{PeerRpc, PeerRpcError};
use crate::node::peers::{AlreadyPresent, PeerId, PeerLink};
use crate::node::replication::ReplicationCoordinator;
use crate::node::role::{FollowerRole, LeaderRole, Role};
use crate::node::timers::{self, Clock, RealClock, StopCheck};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// MembershipRecord is this node's copy of the follower table. On the leader it is authoritative;
/// on followers it is whatever the leader last told us and it drives elections.
pub(crate) struct MembershipRecord {
    state: RwLock<RecordState>,
}

struct RecordState {
    followers: HashMap<String, FollowerId>,
    // Never reused. Kept above every ID this node has seen so a promoted follower doesn't hand
    // out IDs the old leader already did.
    next_id: u64,
    my_id: Option<FollowerId>,
    leader_address: Option<String>,
}

impl RecordState {
    fn observe_id(&mut self, id: FollowerId) {
        if id.as_u64() >= self.next_id {
            self.next_id = id.as_u64() + 1;
        }
    }
}

impl MembershipRecord {
    pub(crate) fn new() -> Self {
        MembershipRecord {
            state: RwLock::new(RecordState {
                followers: HashMap::new(),
                next_id: 1,
                my_id: None,
                leader_address: None,
            }),
        }
    }

    /// Empty the table for a fresh leadership. The ID counter survives.
    pub(crate) fn reset_for_leadership(&self) {
        let mut state = self.state.write();
        state.followers.clear();
        state.my_id = None;
        state.leader_address = None;
    }

    pub(crate) fn assign_next_id(&self, address: &str) -> Result<FollowerId, MembershipError> {
        let mut state = self.state.write();
        if state.followers.contains_key(address) {
            return Err(MembershipError::AlreadyKnown(address.to_string()));
        }

        let id = FollowerId::new(state.next_id);
        state.next_id += 1;
        state.followers.insert(address.to_string(), id);

        Ok(id)
    }

    pub(crate) fn insert(&self, entry: FollowerEntry) -> Result<(), MembershipError> {
        let mut state = self.state.write();
        if state.followers.contains_key(&entry.address) {
            return Err(MembershipError::AlreadyKnown(entry.address));
        }

        state.observe_id(entry.id);
        state.followers.insert(entry.address, entry.id);

        Ok(())
    }

    pub(crate) fn remove(&self, address: &str) -> Result<FollowerEntry, MembershipError> {
        self.state
            .write()
            .followers
            .remove(address)
            .map(|id| FollowerEntry {
                address: address.to_string(),
                id,
            })
            .ok_or_else(|| MembershipError::NotKnown(address.to_string()))
    }

    pub(crate) fn replace_from_leader(&self, input: &FollowMeInput) {
        let mut state = self.state.write();

        state.followers = input
            .followers
            .iter()
            .map(|entry| (entry.address.clone(), entry.id))
            .collect();
        for entry in input.followers.iter() {
            state.observe_id(entry.id);
        }
        state.observe_id(input.assigned_id);
        state.my_id = Some(input.assigned_id);
        state.leader_address = Some(input.leader_address.clone());
    }

    /// Remove and return the entry with the lowest ID. Equal IDs (which only a buggy leader would
    /// hand out) go to the lexicographically smallest address.
    pub(crate) fn take_lowest(&self) -> Option<FollowerEntry> {
        let mut state = self.state.write();

        let (address, id) = state
            .followers
            .iter()
            .min_by(|(a_address, a_id), (b_address, b_id)| a_id.cmp(b_id).then_with(|| a_address.cmp(b_address)))
            .map(|(address, id)| (address.clone(), *id))?;
        state.followers.remove(&address);

        Some(FollowerEntry { address, id })
    }

    pub(crate) fn snapshot(&self) -> Vec<FollowerEntry> {
        let mut entries: Vec<FollowerEntry> = self
            .state
            .read()
            .followers
            .iter()
            .map(|(address, id)| FollowerEntry {
                address: address.clone(),
                id: *id,
            })
            .collect();
        entries.sort_by_key(|entry| entry.id);

        entries
    }

    pub(crate) fn contains(&self, address: &str) -> bool {
        self.state.read().followers.contains_key(address)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.state.read().followers.len()
    }

    pub(crate) fn my_id(&self) -> Option<FollowerId> {
        self.state.read().my_id
    }

    pub(crate) fn leader_address(&self) -> Option<String> {
        self.state.read().leader_address.clone()
    }

    pub(crate) fn clear_leader(&self) {
        self.state.write().leader_address = None;
    }
}

/// MembershipManager moves this node between roles and keeps every follower's table in step with
/// the leader's.
#[derive(Clone)]
pub(crate) struct MembershipManager {
    ctx: Arc<NodeContext>,
}

#[derive(Clone, Debug)]
enum FanOut {
    Add(FollowerEntry),
    Remove(FollowerEntry),
}

impl MembershipManager {
    pub(crate) fn new(ctx: Arc<NodeContext>) -> Self {
        MembershipManager { ctx }
    }

    /// Take over as leader of `candidates`. Candidates that can't be reached are skipped. Returns
    /// the followers that joined.
    pub(crate) async fn become_leader(&self, candidates: Vec<String>) -> Vec<FollowerEntry> {
        let ctx = &self.ctx;
        slog::info!(ctx.logger, "Becoming leader of {:?}", candidates);

        self.retire_all_links();
        ctx.membership.reset_for_leadership();

        let (capacity_stopper, capacity_check) = timers::stop_signal();
        ctx.set_role(Role::Leader(LeaderRole::new(capacity_stopper)));

        let mut joined = Vec::with_capacity(candidates.len());
        for address in candidates {
            if address == ctx.self_address || ctx.membership.contains(&address) {
                continue;
            }
            match self.add_follower(address).await {
                Ok(entry) => joined.push(entry),
                Err(e) => slog::warn!(ctx.logger, "Skipping candidate: {}", e),
            }
        }

        tokio::spawn(self.clone().watch_capacity(capacity_check));

        joined
    }

    /// Late join of one follower (leader only). Everyone already following is told about it.
    pub(crate) async fn add_follower(&self, address: String) -> Result<FollowerEntry, MembershipError> {
        let ctx = &self.ctx;
        if !ctx.is_leader() {
            return Err(MembershipError::NotLeader);
        }
        if ctx.membership.contains(&address) {
            return Err(MembershipError::AlreadyKnown(address));
        }

        let rpc = self
            .dial(&address)
            .await
            .map_err(|source| MembershipError::JoinFailed {
                address: address.clone(),
                source,
            })?;

        let id = ctx.membership.assign_next_id(&address)?;
        let entry = FollowerEntry {
            address: address.clone(),
            id,
        };

        // The link has to be in the table before the follower starts heartbeating us.
        let peer_id = PeerId::Address(address.clone());
        let link = PeerLink::new(peer_id.clone(), address.clone(), rpc);
        if let Err(AlreadyPresent(_)) = ctx.peers.add(link.clone()) {
            let _ = ctx.membership.remove(&address);
            return Err(MembershipError::AlreadyKnown(address));
        }

        let input = FollowMeInput {
            leader_address: ctx.self_address.clone(),
            followers: ctx.membership.snapshot(),
            assigned_id: id,
        };
        let reply = timers::timeout(&RealClock, ctx.timings.rpc_timeout, link.rpc().follow_me(input)).await;
        let follower_latest = match reply {
            Ok(Ok(latest)) => latest,
            Ok(Err(source)) => return Err(self.abandon_join(address, &peer_id, &link, source)),
            Err(timed_out) => return Err(self.abandon_join(address, &peer_id, &link, timed_out.into())),
        };

        slog::info!(ctx.logger, "{} joined as follower {:?}", address, id);
        ctx.heartbeat.start_monitoring(link);
        self.fan_out(FanOut::Add(entry.clone()));

        if let Some(follower_latest) = follower_latest {
            ReplicationCoordinator::new(ctx.clone()).catch_up(follower_latest).await;
        }

        Ok(entry)
    }

    /// Leader told us to follow it.
    pub(crate) async fn follow_leader(&self, input: FollowMeInput) -> Result<FollowMeOutput, FollowMeError> {
        let ctx = &self.ctx;
        if input.leader_address == ctx.self_address {
            return Err(FollowMeError::SelfFollow);
        }

        let rpc = self
            .dial(&input.leader_address)
            .await
            .map_err(|source| FollowMeError::LeaderUnreachable {
                address: input.leader_address.clone(),
                source,
            })?;

        ctx.membership.replace_from_leader(&input);
        self.retire_all_links();

        let link = PeerLink::new(PeerId::Leader, input.leader_address.clone(), rpc);
        while ctx.peers.add(link.clone()).is_err() {
            // Lost a race with a concurrent FollowMe. Last one wins.
            if let Some(existing) = ctx.peers.get(&PeerId::Leader) {
                if ctx.peers.remove(&PeerId::Leader, &existing) {
                    existing.supersede();
                }
            }
        }
        ctx.heartbeat.start_monitoring(link);

        slog::info!(
            ctx.logger,
            "Following {} as follower {:?}",
            input.leader_address,
            input.assigned_id
        );
        ctx.set_role(Role::Follower(FollowerRole::following(input.leader_address)));
        ctx.election.clear_pending();
        ctx.election.wake();

        Ok(FollowMeOutput {
            latest_version: ctx.log.latest_version(),
        })
    }

    pub(crate) fn modify_follower_list(&self, entry: FollowerEntry, is_add: bool) -> Result<(), MembershipError> {
        if is_add {
            self.ctx.membership.insert(entry)
        } else {
            self.ctx.membership.remove(&entry.address).map(|_| ())
        }
    }

    pub(crate) async fn handle_follower_lost(&self, address: &str) {
        let ctx = &self.ctx;
        if !ctx.is_leader() {
            return;
        }

        match ctx.membership.remove(address) {
            Ok(entry) => {
                slog::info!(ctx.logger, "Removed follower {} ({:?})", address, entry.id);
                self.fan_out(FanOut::Remove(entry));
            }
            Err(e) => slog::debug!(ctx.logger, "{}", e),
        }
    }

    fn abandon_join(
        &self,
        address: String,
        peer_id: &PeerId,
        link: &Arc<PeerLink>,
        source: PeerRpcError,
    ) -> MembershipError {
        let _ = self.ctx.membership.remove(&address);
        self.ctx.peers.remove(peer_id, link);
        link.close();
        MembershipError::JoinFailed { address, source }
    }

    /// Supersede and evict every link, so their `PeerLost` events are ignored.
    fn retire_all_links(&self) {
        for link in self.ctx.peers.links() {
            if self.ctx.peers.remove(link.id(), &link) {
                link.supersede();
            }
        }
    }

    async fn dial(&self, address: &str) -> Result<Arc<dyn PeerRpc>, PeerRpcError> {
        timers::timeout(&RealClock, self.ctx.timings.rpc_timeout, self.ctx.connector.dial(address)).await?
    }

    /// Best effort, no acks awaited.
    fn fan_out(&self, change: FanOut) {
        let (subject, links) = match &change {
            FanOut::Add(entry) | FanOut::Remove(entry) => (entry.address.clone(), self.ctx.peers.links()),
        };

        for link in links {
            if link.address() == subject {
                continue;
            }

            let logger = self.ctx.logger.clone();
            let rpc_timeout = self.ctx.timings.rpc_timeout;
            let change = change.clone();
            tokio::spawn(async move {
                let reply = match change.clone() {
                    FanOut::Add(entry) => timers::timeout(&RealClock, rpc_timeout, link.rpc().add_follower(entry)).await,
                    FanOut::Remove(entry) => {
                        timers::timeout(&RealClock, rpc_timeout, link.rpc().remove_follower(entry)).await
                    }
                };
                match reply {
                    Ok(Ok(())) | Ok(Err(PeerRpcError::AlreadyKnown(_))) | Ok(Err(PeerRpcError::NotKnown(_))) => {}
                    Ok(Err(e)) => slog::warn!(logger, "{:?} to {} failed: {}", change, link.address(), e),
                    Err(e) => slog::warn!(logger, "{:?} to {} failed: {}", change, link.address(), e),
                }
            });
        }
    }

    /// While leader, top the cluster up with idle nodes from the registry.
    async fn watch_capacity(self, stop: StopCheck) {
        let ctx = &self.ctx;
        let mut clock = RealClock;

        loop {
            clock.sleep(ctx.timings.membership_check_interval).await;
            if stop.should_stop() || ctx.shutdown.should_stop() {
                return;
            }

            let min_cluster_size = ctx.settings().min_cluster_size;
            let live_followers = ctx.peers.len();
            if live_followers >= min_cluster_size {
                continue;
            }

            slog::info!(
                ctx.logger,
                "{} live followers, want {}. Asking registry for an idle node.",
                live_followers,
                min_cluster_size
            );
            match timers::timeout(&clock, ctx.timings.rpc_timeout, ctx.registry.request_idle_node()).await {
                Ok(Ok(Some(address))) => {
                    if let Err(e) = self.add_follower(address).await {
                        slog::warn!(ctx.logger, "Failed to add idle node: {}", e);
                    }
                }
                Ok(Ok(None)) => slog::debug!(ctx.logger, "Registry has no idle nodes"),
                Ok(Err(e)) => slog::warn!(ctx.logger, "Idle node request failed: {}", e),
                Err(e) => slog::warn!(ctx.logger, "Idle node request failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitlog::{LogEntry, Version};
    use crate::node::role::RoleSnapshot;
    use crate::node::test_utils::{self, PeerCall, TestNode};
    use bytes::Bytes;

    fn entry(address: &str, id: u64) -> FollowerEntry {
        FollowerEntry {
            address: address.into(),
            id: FollowerId::new(id),
        }
    }

    #[test]
    fn ids_are_monotonic_across_leaderships() {
        let record = MembershipRecord::new();
        assert_eq!(record.assign_next_id("a:1").unwrap(), FollowerId::new(1));
        assert_eq!(record.assign_next_id("b:1").unwrap(), FollowerId::new(2));
        record.remove("b:1").unwrap();

        record.reset_for_leadership();

        assert_eq!(record.assign_next_id("c:1").unwrap(), FollowerId::new(3));
    }

    #[test]
    fn ids_stay_above_everything_a_leader_told_us() {
        let record = MembershipRecord::new();
        record.replace_from_leader(&FollowMeInput {
            leader_address: "l:1".into(),
            followers: vec![entry("a:1", 4), entry("b:1", 9)],
            assigned_id: FollowerId::new(4),
        });

        record.reset_for_leadership();

        assert_eq!(record.assign_next_id("c:1").unwrap(), FollowerId::new(10));
    }

    #[test]
    fn modify_list_is_idempotent_with_errors() {
        let record = MembershipRecord::new();

        record.insert(entry("a:1", 3)).unwrap();
        assert!(matches!(
            record.insert(entry("a:1", 3)),
            Err(MembershipError::AlreadyKnown(_))
        ));
        record.remove("a:1").unwrap();
        assert!(matches!(record.remove("a:1"), Err(MembershipError::NotKnown(_))));
    }

    #[test]
    fn take_lowest_breaks_ties_by_address() {
        let record = MembershipRecord::new();
        record.insert(entry("b:1", 2)).unwrap();
        record.insert(entry("c:1", 5)).unwrap();
        record.insert(entry("a:1", 2)).unwrap();

        assert_eq!(record.take_lowest(), Some(entry("a:1", 2)));
        assert_eq!(record.take_lowest(), Some(entry("b:1", 2)));
        assert_eq!(record.take_lowest(), Some(entry("c:1", 5)));
        assert_eq!(record.take_lowest(), None);
    }

    #[tokio::test]
    async fn become_leader_skips_unreachable_candidates() {
        let test_node = TestNode::new("10.0.0.1:7000").await;
        let b = test_node.connector.peer("10.0.0.2:7000");
        let c = test_node.connector.peer("10.0.0.3:7000");
        test_node.connector.peer("10.0.0.4:7000").set_unreachable(true);

        let joined = test_node
            .node
            .membership()
            .become_leader(vec![
                "10.0.0.1:7000".into(),
                "10.0.0.2:7000".into(),
                "10.0.0.3:7000".into(),
                "10.0.0.4:7000".into(),
            ])
            .await;

        let ctx = test_node.node.context();
        assert_eq!(joined, vec![entry("10.0.0.2:7000", 1), entry("10.0.0.3:7000", 2)]);
        assert_eq!(ctx.role_snapshot(), RoleSnapshot::Leader);
        assert_eq!(ctx.peers.len(), 2);
        assert_eq!(ctx.membership.len(), 2);
        assert!(!ctx.membership.contains("10.0.0.4:7000"));

        assert!(b.calls().contains(&PeerCall::FollowMe {
            leader_address: "10.0.0.1:7000".into(),
            assigned_id: FollowerId::new(1),
        }));
        // The earlier follower learns about the later one.
        test_utils::wait_until(|| b.calls().contains(&PeerCall::AddFollower(entry("10.0.0.3:7000", 2)))).await;
        assert!(!c.calls().contains(&PeerCall::AddFollower(entry("10.0.0.3:7000", 2))));
    }

    #[tokio::test]
    async fn add_follower_requires_leadership() {
        let test_node = TestNode::new("10.0.0.1:7000").await;
        test_node.connector.peer("10.0.0.2:7000");

        let result = test_node.node.membership().add_follower("10.0.0.2:7000".into()).await;

        assert!(matches!(result, Err(MembershipError::NotLeader)));
    }

    #[tokio::test]
    async fn rejected_follow_me_leaves_no_trace() {
        let test_node = TestNode::new("10.0.0.1:7000").await;
        test_node.connector.peer("10.0.0.2:7000").set_rejecting(true);
        let membership = test_node.node.membership();
        membership.become_leader(vec![]).await;

        let result = membership.add_follower("10.0.0.2:7000".into()).await;

        assert!(matches!(result, Err(MembershipError::JoinFailed { .. })));
        let ctx = test_node.node.context();
        assert_eq!(ctx.peers.len(), 0);
        assert!(!ctx.membership.contains("10.0.0.2:7000"));
    }

    #[tokio::test]
    async fn follow_leader_reports_latest_held_version() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        test_node.connector.peer("10.0.0.1:7000");
        let ctx = test_node.node.context();
        ctx.log
            .append(LogEntry {
                topic: "gps".into(),
                version: Version::new(4).unwrap(),
                payload: Bytes::from("d"),
            })
            .unwrap();

        let output = test_node
            .node
            .membership()
            .follow_leader(FollowMeInput {
                leader_address: "10.0.0.1:7000".into(),
                followers: vec![entry("10.0.0.2:7000", 1)],
                assigned_id: FollowerId::new(1),
            })
            .await
            .unwrap();

        assert_eq!(output.latest_version, Version::new(4));
    }

    #[tokio::test]
    async fn follow_leader_supersedes_previous_leader_link() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        test_node.connector.peer("10.0.0.1:7000");
        test_node.connector.peer("10.0.0.5:7000");
        let membership = test_node.node.membership();
        let ctx = test_node.node.context();

        membership
            .follow_leader(FollowMeInput {
                leader_address: "10.0.0.1:7000".into(),
                followers: vec![entry("10.0.0.2:7000", 1), entry("10.0.0.3:7000", 2)],
                assigned_id: FollowerId::new(1),
            })
            .await
            .unwrap();
        let old_link = ctx.peers.get(&PeerId::Leader).unwrap();

        membership
            .follow_leader(FollowMeInput {
                leader_address: "10.0.0.5:7000".into(),
                followers: vec![entry("10.0.0.2:7000", 3)],
                assigned_id: FollowerId::new(3),
            })
            .await
            .unwrap();

        assert!(old_link.is_superseded());
        assert_eq!(ctx.peers.get(&PeerId::Leader).unwrap().address(), "10.0.0.5:7000");
        assert_eq!(ctx.role_snapshot(), RoleSnapshot::Follower("10.0.0.5:7000".into()));
        assert_eq!(ctx.membership.my_id(), Some(FollowerId::new(3)));
        assert_eq!(ctx.membership.snapshot(), vec![entry("10.0.0.2:7000", 3)]);
        assert_eq!(ctx.membership.leader_address(), Some("10.0.0.5:7000".into()));
    }

    #[tokio::test]
    async fn follower_lost_is_removed_and_fanned_out() {
        let test_node = TestNode::new("10.0.0.1:7000").await;
        let b = test_node.connector.peer("10.0.0.2:7000");
        test_node.connector.peer("10.0.0.3:7000");
        let membership = test_node.node.membership();
        membership
            .become_leader(vec!["10.0.0.2:7000".into(), "10.0.0.3:7000".into()])
            .await;

        membership.handle_follower_lost("10.0.0.3:7000").await;

        assert!(!test_node.node.context().membership.contains("10.0.0.3:7000"));
        test_utils::wait_until(|| b.calls().contains(&PeerCall::RemoveFollower(entry("10.0.0.3:7000", 2)))).await;
    }

    #[tokio::test]
    async fn capacity_watcher_pulls_idle_nodes() {
        let test_node = TestNode::new("10.0.0.1:7000").await;
        test_node.connector.peer("10.0.0.7:7000");
        test_node.registry.push_idle_node("10.0.0.7:7000");
        let membership = test_node.node.membership();

        membership.become_leader(vec![]).await;

        let ctx = test_node.node.context();
        test_utils::wait_until(|| ctx.membership.contains("10.0.0.7:7000")).await;
        assert_eq!(ctx.peers.len(), 1);
    }
}
