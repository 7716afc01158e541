use crate::node::context::NodeContext;
use crate::node::membership::MembershipManager;
use crate::node::node_api::FollowerEntry;
use crate::node::role::RoleSnapshot;
use crate::node::timers::{self, RealClock};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Election bookkeeping shared between the election task and inbound `Follow` requests.
#[derive(Default)]
pub(crate) struct ElectionSlot {
    state: Mutex<ElectionState>,
    wakeup: Notify,
}

#[derive(Default)]
struct ElectionState {
    in_progress: bool,
    // Open only while this node is the candidate.
    window: Option<Vec<String>>,
    // Solicitations that arrived before we knew we'd be the candidate.
    pending: Vec<String>,
}

impl ElectionSlot {
    #[cfg(test)]
    pub(crate) fn in_progress(&self) -> bool {
        self.state.lock().in_progress
    }

    pub(crate) fn wake(&self) {
        self.wakeup.notify_one();
    }

    /// Solicitations only count toward the next election, not one a leader has already settled.
    pub(crate) fn clear_pending(&self) {
        self.state.lock().pending.clear();
    }
}

#[derive(Debug, Eq, PartialEq)]
enum Outcome {
    Promoted,
    FollowingOther,
    Exhausted,
    Abandoned,
}

#[derive(Debug, Eq, PartialEq)]
enum Round {
    Done(Outcome),
    Next,
}

/// Bully-style election: the surviving follower with the lowest ID becomes leader. Every follower
/// runs the same scan over its copy of the follower table, so they converge on the same candidate
/// without talking to each other first.
#[derive(Clone)]
pub(crate) struct ElectionCoordinator {
    ctx: Arc<NodeContext>,
}

impl ElectionCoordinator {
    pub(crate) fn new(ctx: Arc<NodeContext>) -> Self {
        ElectionCoordinator { ctx }
    }

    /// Starts an election unless one is already running. Returns true if this call started it.
    pub(crate) fn start(&self) -> bool {
        {
            let mut state = self.ctx.election.state.lock();
            if state.in_progress {
                return false;
            }
            state.in_progress = true;
        }

        tokio::spawn(self.clone().run());
        true
    }

    /// Inbound `Follow(candidate_address)`: some follower thinks we should lead.
    pub(crate) fn handle_follow(&self, candidate_address: String) {
        let ctx = &self.ctx;

        if ctx.is_leader() {
            slog::info!(ctx.logger, "{} asked to follow us while leader; late-joining it", candidate_address);
            let membership = MembershipManager::new(ctx.clone());
            let logger = ctx.logger.clone();
            tokio::spawn(async move {
                if let Err(e) = membership.add_follower(candidate_address).await {
                    slog::warn!(logger, "Late join failed: {}", e);
                }
            });
            return;
        }

        let mut state = ctx.election.state.lock();
        match &mut state.window {
            Some(collected) => {
                if !collected.contains(&candidate_address) {
                    collected.push(candidate_address);
                }
                drop(state);
                ctx.election.wake();
            }
            None => {
                if !state.pending.contains(&candidate_address) {
                    state.pending.push(candidate_address);
                }
            }
        }
    }

    async fn run(self) {
        let ctx = &self.ctx;
        slog::info!(ctx.logger, "Starting election");

        let outcome = loop {
            if ctx.shutdown.should_stop() {
                break Outcome::Abandoned;
            }

            let scanned = match ctx.membership.take_lowest() {
                Some(entry) => entry,
                None => break Outcome::Exhausted,
            };
            let round = if Some(scanned.id) == ctx.membership.my_id() {
                self.run_candidacy().await
            } else {
                self.nominate(&scanned).await
            };
            if let Round::Done(outcome) = round {
                break outcome;
            }
        };

        {
            let mut state = ctx.election.state.lock();
            state.in_progress = false;
            state.window = None;
            state.pending.clear();
        }

        match outcome {
            Outcome::Exhausted => slog::error!(
                ctx.logger,
                "Election exhausted the follower table without a leader. Waiting for the registry."
            ),
            outcome => slog::info!(ctx.logger, "Election finished: {:?}", outcome),
        }
    }

    async fn run_candidacy(&self) -> Round {
        let ctx = &self.ctx;

        let remaining: Vec<String> = ctx
            .membership
            .snapshot()
            .into_iter()
            .map(|entry| entry.address)
            .filter(|address| address != &ctx.self_address)
            .collect();
        if remaining.is_empty() {
            // Leading nobody would split the cluster if a lower ID is still alive somewhere.
            slog::info!(ctx.logger, "I'm the candidate but nobody is left to follow me");
            return Round::Next;
        }
        let required = ctx.settings().min_cluster_size.min(remaining.len());
        let deadline = Instant::now() + ctx.timings.election_window;
        slog::info!(
            ctx.logger,
            "I'm the candidate. Waiting for {} of {:?}",
            required,
            remaining
        );

        {
            let mut state = ctx.election.state.lock();
            let seeded = std::mem::take(&mut state.pending);
            state.window = Some(seeded);
        }

        let collected = loop {
            {
                let mut state = ctx.election.state.lock();
                let collected_count = state.window.as_ref().map(Vec::len).unwrap_or(0);
                if collected_count >= required {
                    break state.window.take().unwrap_or_default();
                }
            }
            if let RoleSnapshot::Follower(leader_address) = ctx.role_snapshot() {
                slog::info!(ctx.logger, "{} became leader first", leader_address);
                ctx.election.state.lock().window = None;
                return Round::Done(Outcome::FollowingOther);
            }

            let time_left = deadline.saturating_duration_since(Instant::now());
            if timers::timeout(&RealClock, time_left, ctx.election.wakeup.notified())
                .await
                .is_err()
            {
                slog::info!(ctx.logger, "Candidate window expired");
                ctx.election.state.lock().window = None;
                return Round::Next;
            }
        };

        let membership = MembershipManager::new(ctx.clone());
        membership.become_leader(collected).await;

        // Bring in anyone from the old table who didn't solicit us in time.
        for address in remaining {
            if ctx.membership.contains(&address) {
                continue;
            }
            if let Err(e) = membership.add_follower(address).await {
                slog::info!(ctx.logger, "Old follower didn't rejoin: {}", e);
            }
        }

        Round::Done(Outcome::Promoted)
    }

    async fn nominate(&self, scanned: &FollowerEntry) -> Round {
        let ctx = &self.ctx;
        slog::info!(ctx.logger, "Nominating {} ({:?})", scanned.address, scanned.id);

        let rpc = match timers::timeout(&RealClock, ctx.timings.rpc_timeout, ctx.connector.dial(&scanned.address)).await {
            Ok(Ok(rpc)) => rpc,
            Ok(Err(e)) => {
                slog::info!(ctx.logger, "Can't reach {}: {}", scanned.address, e);
                return Round::Next;
            }
            Err(e) => {
                slog::info!(ctx.logger, "Can't reach {}: {}", scanned.address, e);
                return Round::Next;
            }
        };

        match timers::timeout(&RealClock, ctx.timings.rpc_timeout, rpc.follow(ctx.self_address.clone())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                slog::info!(ctx.logger, "{} refused nomination: {}", scanned.address, e);
                return Round::Next;
            }
            Err(e) => {
                slog::info!(ctx.logger, "{} refused nomination: {}", scanned.address, e);
                return Round::Next;
            }
        }

        let mut role_listener = ctx.role_listener();
        match timers::timeout(&RealClock, ctx.timings.election_window, role_listener.wait_for_leader()).await {
            Ok(Some(leader_address)) => {
                slog::info!(ctx.logger, "Now following {}", leader_address);
                Round::Done(Outcome::FollowingOther)
            }
            Ok(None) => Round::Done(Outcome::Abandoned),
            Err(_) => {
                slog::info!(ctx.logger, "{} accepted but never sent FollowMe", scanned.address);
                Round::Next
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::node_api::{FollowMeInput, FollowerId};
    use crate::node::role::{FollowerRole, Role};
    use crate::node::test_utils::{self, PeerCall, TestNode};
    use tokio::time::Duration;

    fn entry(address: &str, id: u64) -> FollowerEntry {
        FollowerEntry {
            address: address.into(),
            id: FollowerId::new(id),
        }
    }

    async fn follower_of_dead_leader(self_address: &str, followers: Vec<FollowerEntry>, my_id: u64) -> TestNode {
        let test_node = TestNode::new(self_address).await;
        test_node.connector.peer("10.0.0.1:7000");
        test_node
            .node
            .membership()
            .follow_leader(FollowMeInput {
                leader_address: "10.0.0.1:7000".into(),
                followers,
                assigned_id: FollowerId::new(my_id),
            })
            .await
            .unwrap();

        // What the PeerLost dispatcher does before starting an election.
        let ctx = test_node.node.context();
        ctx.membership.clear_leader();
        ctx.set_role(Role::Follower(FollowerRole::leaderless()));
        test_node
    }

    async fn wait_for_election_end(test_node: &TestNode) {
        let ctx = test_node.node.context();
        test_utils::wait_until(|| !ctx.election.in_progress()).await;
    }

    #[tokio::test]
    async fn lowest_id_waits_for_solicitations_then_leads() {
        let test_node = follower_of_dead_leader(
            "10.0.0.2:7000",
            vec![entry("10.0.0.2:7000", 1), entry("10.0.0.3:7000", 2), entry("10.0.0.4:7000", 3)],
            1,
        )
        .await;
        let c = test_node.connector.peer("10.0.0.3:7000");
        let d = test_node.connector.peer("10.0.0.4:7000");
        let election = test_node.node.election();

        // One solicitation arrives before we notice the leader is gone.
        election.handle_follow("10.0.0.3:7000".into());
        assert!(election.start());
        assert!(!election.start(), "Second election must not start");
        tokio::time::sleep(Duration::from_millis(20)).await;
        election.handle_follow("10.0.0.4:7000".into());

        wait_for_election_end(&test_node).await;

        let ctx = test_node.node.context();
        assert_eq!(ctx.role_snapshot(), RoleSnapshot::Leader);
        assert!(ctx.membership.contains("10.0.0.3:7000"));
        assert!(ctx.membership.contains("10.0.0.4:7000"));
        assert!(c.calls().iter().any(|call| matches!(call, PeerCall::FollowMe { .. })));
        assert!(d.calls().iter().any(|call| matches!(call, PeerCall::FollowMe { .. })));
    }

    #[tokio::test]
    async fn candidate_late_joins_silent_followers_after_threshold() {
        let test_node = follower_of_dead_leader(
            "10.0.0.2:7000",
            vec![entry("10.0.0.2:7000", 1), entry("10.0.0.3:7000", 2), entry("10.0.0.4:7000", 3)],
            1,
        )
        .await;
        test_node.node.context().apply_settings(crate::registry::ClusterSettings {
            min_cluster_size: 1,
            ..crate::registry::ClusterSettings::default()
        });
        test_node.connector.peer("10.0.0.3:7000");
        test_node.connector.peer("10.0.0.4:7000");
        let election = test_node.node.election();

        election.handle_follow("10.0.0.3:7000".into());
        election.start();
        wait_for_election_end(&test_node).await;

        let ctx = test_node.node.context();
        assert_eq!(ctx.role_snapshot(), RoleSnapshot::Leader);
        assert!(ctx.membership.contains("10.0.0.4:7000"), "Silent follower should be late-joined");
    }

    #[tokio::test]
    async fn candidate_window_expiry_moves_on_to_next_lowest() {
        let test_node = follower_of_dead_leader(
            "10.0.0.2:7000",
            vec![entry("10.0.0.2:7000", 1), entry("10.0.0.3:7000", 2)],
            1,
        )
        .await;
        let next = test_node.connector.peer("10.0.0.3:7000");
        let election = test_node.node.election();

        // Nobody solicits us, so the window expires and we nominate 10.0.0.3 instead.
        election.start();
        test_utils::wait_until(|| next.calls().contains(&PeerCall::Follow("10.0.0.2:7000".into()))).await;

        // 10.0.0.3 wins and sends FollowMe.
        test_node
            .node
            .membership()
            .follow_leader(FollowMeInput {
                leader_address: "10.0.0.3:7000".into(),
                followers: vec![entry("10.0.0.2:7000", 4)],
                assigned_id: FollowerId::new(4),
            })
            .await
            .unwrap();
        wait_for_election_end(&test_node).await;

        assert_eq!(
            test_node.node.context().role_snapshot(),
            RoleSnapshot::Follower("10.0.0.3:7000".into())
        );
    }

    #[tokio::test]
    async fn last_candidate_with_nobody_left_stays_leaderless() {
        let test_node = follower_of_dead_leader(
            "10.0.0.9:7000",
            vec![entry("10.0.0.3:7000", 1), entry("10.0.0.4:7000", 2), entry("10.0.0.9:7000", 3)],
            3,
        )
        .await;
        test_node.connector.peer("10.0.0.3:7000").set_unreachable(true);
        test_node.connector.peer("10.0.0.4:7000").set_rejecting(true);
        let election = test_node.node.election();

        // Both lower IDs fail fast. We're last, and leading an empty cluster isn't allowed.
        election.start();
        wait_for_election_end(&test_node).await;

        assert_eq!(
            test_node.node.context().role_snapshot(),
            RoleSnapshot::FollowerNoLeader
        );
    }

    #[tokio::test]
    async fn silent_nominee_does_not_leave_us_leading_alone() {
        // 10.0.0.3 is alive and still following the real leader: it acks Follow but never sends
        // FollowMe.
        let test_node = follower_of_dead_leader(
            "10.0.0.9:7000",
            vec![entry("10.0.0.3:7000", 1), entry("10.0.0.9:7000", 2)],
            2,
        )
        .await;
        let nominee = test_node.connector.peer("10.0.0.3:7000");

        test_node.node.election().start();
        wait_for_election_end(&test_node).await;

        assert!(nominee.calls().contains(&PeerCall::Follow("10.0.0.9:7000".into())));
        let ctx = test_node.node.context();
        assert_eq!(ctx.role_snapshot(), RoleSnapshot::FollowerNoLeader);
        assert_eq!(ctx.settings().min_cluster_size, 2);
    }

    #[tokio::test]
    async fn exhausted_table_leaves_node_leaderless() {
        let test_node = follower_of_dead_leader("10.0.0.9:7000", vec![entry("10.0.0.3:7000", 1)], 5).await;
        test_node.connector.peer("10.0.0.3:7000").set_unreachable(true);

        test_node.node.election().start();
        wait_for_election_end(&test_node).await;

        assert_eq!(
            test_node.node.context().role_snapshot(),
            RoleSnapshot::FollowerNoLeader
        );
    }

    #[tokio::test]
    async fn new_leader_discards_stale_solicitations() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        test_node.connector.peer("10.0.0.1:7000");
        let election = test_node.node.election();
        election.handle_follow("10.0.0.3:7000".into());

        test_node
            .node
            .membership()
            .follow_leader(FollowMeInput {
                leader_address: "10.0.0.1:7000".into(),
                followers: vec![entry("10.0.0.2:7000", 1)],
                assigned_id: FollowerId::new(1),
            })
            .await
            .unwrap();

        assert!(test_node.node.context().election.state.lock().pending.is_empty());
    }

    #[tokio::test]
    async fn follow_while_idle_is_remembered() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        let election = test_node.node.election();

        election.handle_follow("10.0.0.3:7000".into());
        election.handle_follow("10.0.0.3:7000".into());

        assert_eq!(
            test_node.node.context().election.state.lock().pending,
            vec!["10.0.0.3:7000".to_string()]
        );
    }
}
