use crate::commitlog::{LogEntry, Version};
use crate::node::context::NodeContext;
use crate::node::node_api::{
    ConfirmWriteError, MissingVersionsError, ReadError, ReadInput, ReadOutput, WriteError, WriteInput, WriteOutput,
};
use crate::node::timers::{self, RealClock};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Decides a write as soon as the outcome is certain, without waiting on stragglers.
#[derive(Debug)]
pub(crate) struct QuorumCounter {
    required: usize,
    max_failures: usize,
    acks: usize,
    failures: usize,
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum QuorumVerdict {
    Reached,
    Failed,
}

impl QuorumCounter {
    /// Majority of followers. The leader's own copy doesn't count.
    pub(crate) fn new(followers: usize) -> Self {
        let required = followers / 2 + 1;
        QuorumCounter {
            required,
            max_failures: followers.saturating_sub(required),
            acks: 0,
            failures: 0,
        }
    }

    pub(crate) fn record(&mut self, confirmed: bool) -> Option<QuorumVerdict> {
        if confirmed {
            self.acks += 1;
        } else {
            self.failures += 1;
        }

        if self.acks >= self.required {
            Some(QuorumVerdict::Reached)
        } else if self.failures > self.max_failures {
            Some(QuorumVerdict::Failed)
        } else {
            None
        }
    }
}

#[derive(Clone)]
pub(crate) struct ReplicationCoordinator {
    ctx: Arc<NodeContext>,
}

impl ReplicationCoordinator {
    pub(crate) fn new(ctx: Arc<NodeContext>) -> Self {
        ReplicationCoordinator { ctx }
    }

    /// Leader only. Writes are serialized; each one gets the next version and is committed only
    /// once a quorum of followers confirms it.
    pub(crate) async fn write(&self, input: WriteInput) -> Result<WriteOutput, WriteError> {
        let ctx = &self.ctx;
        let write_lock = ctx.leader_write_lock().ok_or_else(|| self.not_leader())?;
        ctx.log.check_topic(&input.topic)?;

        let sequence = write_lock.lock().await;
        if !ctx.is_leader() {
            return Err(self.not_leader());
        }

        let version = sequence.next_version(ctx.log.latest_version());
        let entry = LogEntry {
            topic: input.topic,
            version,
            payload: input.payload,
        };

        let links = ctx.peers.links();
        let mut counter = QuorumCounter::new(links.len());
        if links.is_empty() {
            slog::warn!(ctx.logger, "No followers to confirm version {}", version);
            return Err(WriteError::InsufficientReplicas {
                acks: 0,
                required: counter.required,
            });
        }

        let (tx, mut rx) = mpsc::channel(links.len());
        for link in links {
            let tx = tx.clone();
            let entry = entry.clone();
            let leader_address = ctx.self_address.clone();
            let write_timeout = ctx.timings.write_timeout;
            let logger = ctx.logger.clone();
            tokio::spawn(async move {
                let reply = timers::timeout(&RealClock, write_timeout, link.rpc().confirm_write(entry, leader_address)).await;
                let confirmed = match reply {
                    Ok(Ok(())) => true,
                    Ok(Err(e)) => {
                        slog::warn!(logger, "{} rejected write: {}", link.address(), e);
                        false
                    }
                    Err(e) => {
                        slog::warn!(logger, "{} didn't confirm write: {}", link.address(), e);
                        false
                    }
                };
                // Receiver is gone once the write is decided.
                let _ = tx.send(confirmed).await;
            });
        }
        drop(tx);

        let verdict = loop {
            match rx.recv().await {
                Some(confirmed) => {
                    if let Some(verdict) = counter.record(confirmed) {
                        break verdict;
                    }
                }
                None => break QuorumVerdict::Failed,
            }
        };

        match verdict {
            QuorumVerdict::Reached => {
                ctx.log.append(entry)?;
                slog::info!(ctx.logger, "Committed version {} ({} acks)", version, counter.acks);
                Ok(WriteOutput { version })
            }
            QuorumVerdict::Failed => {
                slog::warn!(
                    ctx.logger,
                    "Version {} failed: {} of {} confirmations",
                    version,
                    counter.acks,
                    counter.required
                );
                Err(WriteError::InsufficientReplicas {
                    acks: counter.acks,
                    required: counter.required,
                })
            }
        }
    }

    /// Called when a follower joins holding `follower_latest`. Versions up to it are never handed
    /// out again, and any this node lacks are pulled from the followers.
    pub(crate) async fn catch_up(&self, follower_latest: Version) {
        let ctx = &self.ctx;
        let write_lock = match ctx.leader_write_lock() {
            Some(write_lock) => write_lock,
            None => return,
        };

        let mut sequence = write_lock.lock().await;
        sequence.observe(follower_latest);
        if ctx.log.missing_up_to(follower_latest).is_empty() {
            return;
        }

        slog::info!(ctx.logger, "Catching up to version {} before taking writes", follower_latest);
        if let Err(e) = self.missing_versions(follower_latest).await {
            slog::warn!(ctx.logger, "Catch-up incomplete: {}", e);
        }
    }

    /// Follower side of a write. Stored as-is; topic mismatch is the only refusal.
    pub(crate) fn confirm_write(&self, entry: LogEntry, leader_address: &str) -> Result<(), ConfirmWriteError> {
        slog::debug!(
            self.ctx.logger,
            "Confirming version {} from {}",
            entry.version,
            leader_address
        );
        self.ctx.log.append(entry).map_err(ConfirmWriteError::from)
    }

    /// The topic's writes in version order up to the first gap. One repair attempt is made when a
    /// gap is found.
    pub(crate) async fn read(&self, input: ReadInput) -> Result<ReadOutput, ReadError> {
        let ctx = &self.ctx;
        ctx.log.check_topic(&input.topic)?;

        let prefix = ctx.log.confirmed_prefix();
        if prefix.complete {
            return Ok(ReadOutput {
                payloads: prefix.payloads,
                incomplete: false,
            });
        }

        if let Some(latest) = ctx.log.latest_version() {
            if let Err(e) = self.missing_versions(latest).await {
                slog::warn!(ctx.logger, "Read repair incomplete: {}", e);
            }
        }

        let prefix = ctx.log.confirmed_prefix();
        Ok(ReadOutput {
            payloads: prefix.payloads,
            incomplete: !prefix.complete,
        })
    }

    /// Fill holes in `[1, up_to]` from whichever peers have them.
    pub(crate) async fn missing_versions(&self, up_to: Version) -> Result<(), MissingVersionsError> {
        let ctx = &self.ctx;
        let mut missing: BTreeSet<Version> = ctx.log.missing_up_to(up_to).into_iter().collect();

        for link in ctx.peers.links() {
            if missing.is_empty() {
                break;
            }

            let request = missing.iter().copied().collect();
            let entries = match timers::timeout(&RealClock, ctx.timings.rpc_timeout, link.rpc().missing_versions(request)).await
            {
                Ok(Ok(entries)) => entries,
                Ok(Err(e)) => {
                    slog::warn!(ctx.logger, "{} couldn't supply missing versions: {}", link.address(), e);
                    continue;
                }
                Err(e) => {
                    slog::warn!(ctx.logger, "{} couldn't supply missing versions: {}", link.address(), e);
                    continue;
                }
            };

            for entry in entries {
                let version = entry.version;
                if !missing.contains(&version) {
                    continue;
                }
                match ctx.log.append(entry) {
                    Ok(()) => {
                        missing.remove(&version);
                    }
                    Err(e) => slog::warn!(ctx.logger, "Failed to store repaired version {}: {}", version, e),
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingVersionsError::IncompleteData(missing.into_iter().collect()))
        }
    }

    /// Serve a peer's gap repair.
    pub(crate) fn entries_for(&self, versions: &[Version]) -> Vec<LogEntry> {
        self.ctx.log.entries_for(versions)
    }

    fn not_leader(&self) -> WriteError {
        WriteError::NotLeader {
            leader_address: self.ctx.membership.leader_address(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::test_utils::{PeerCall, TestNode, WriteBehavior};
    use bytes::Bytes;

    fn write_input(payload: &'static str) -> WriteInput {
        WriteInput {
            topic: "gps".into(),
            payload: Bytes::from(payload),
        }
    }

    fn log_entry(version: u64, payload: &'static str) -> LogEntry {
        LogEntry {
            topic: "gps".into(),
            version: Version::new(version).unwrap(),
            payload: Bytes::from(payload),
        }
    }

    async fn leader_with_followers(followers: &[&str]) -> TestNode {
        let test_node = TestNode::new("10.0.0.1:7000").await;
        for follower in followers {
            test_node.connector.peer(follower);
        }
        test_node
            .node
            .membership()
            .become_leader(followers.iter().map(|f| f.to_string()).collect())
            .await;
        test_node
    }

    #[test]
    fn quorum_counter_decides_early() {
        // Four followers: three acks needed, two failures is one too many.
        let mut counter = QuorumCounter::new(4);
        assert_eq!(counter.record(true), None);
        assert_eq!(counter.record(false), None);
        assert_eq!(counter.record(true), None);
        assert_eq!(counter.record(true), Some(QuorumVerdict::Reached));

        let mut counter = QuorumCounter::new(4);
        assert_eq!(counter.record(false), None);
        assert_eq!(counter.record(false), Some(QuorumVerdict::Failed));
    }

    #[test]
    fn quorum_of_two_followers_needs_both() {
        let mut counter = QuorumCounter::new(2);
        assert_eq!(counter.record(true), None);
        assert_eq!(counter.record(true), Some(QuorumVerdict::Reached));

        let mut counter = QuorumCounter::new(2);
        assert_eq!(counter.record(true), None);
        assert_eq!(counter.record(false), Some(QuorumVerdict::Failed));
    }

    #[tokio::test]
    async fn write_commits_with_quorum_and_versions_increase() {
        let test_node = leader_with_followers(&["10.0.0.2:7000", "10.0.0.3:7000"]).await;
        let replication = test_node.node.replication();

        let first = replication.write(write_input("a")).await.unwrap();
        let second = replication.write(write_input("b")).await.unwrap();

        assert_eq!(first.version, Version::first());
        assert_eq!(second.version, Version::new(2).unwrap());
        let prefix = test_node.node.context().log.confirmed_prefix();
        assert_eq!(prefix.payloads, vec![Bytes::from("a"), Bytes::from("b")]);
        assert!(test_node
            .connector
            .peer("10.0.0.2:7000")
            .calls()
            .contains(&PeerCall::ConfirmWrite(Version::new(2).unwrap())));
    }

    #[tokio::test]
    async fn new_leader_pulls_committed_versions_before_writing() {
        let test_node = TestNode::new("10.0.0.1:7000").await;
        let ahead = test_node.connector.peer("10.0.0.2:7000");
        ahead.store(vec![log_entry(1, "committed")]);
        test_node.connector.peer("10.0.0.3:7000");

        test_node
            .node
            .membership()
            .become_leader(vec!["10.0.0.2:7000".into(), "10.0.0.3:7000".into()])
            .await;
        let output = test_node.node.replication().write(write_input("new")).await.unwrap();

        assert_eq!(output.version, Version::new(2).unwrap());
        assert_eq!(ahead.stored(Version::first()).unwrap().payload, Bytes::from("committed"));
        let prefix = test_node.node.context().log.confirmed_prefix();
        assert_eq!(prefix.payloads, vec![Bytes::from("committed"), Bytes::from("new")]);
    }

    #[tokio::test]
    async fn unrepairable_follower_versions_are_still_skipped() {
        let test_node = TestNode::new("10.0.0.1:7000").await;
        // Only version 3 survives anywhere; 1 and 2 are gone.
        test_node.connector.peer("10.0.0.2:7000").store(vec![log_entry(3, "c")]);
        test_node.connector.peer("10.0.0.3:7000");

        test_node
            .node
            .membership()
            .become_leader(vec!["10.0.0.2:7000".into(), "10.0.0.3:7000".into()])
            .await;
        let output = test_node.node.replication().write(write_input("d")).await.unwrap();

        assert_eq!(output.version, Version::new(4).unwrap());
    }

    #[tokio::test]
    async fn write_without_quorum_is_rejected_and_version_not_consumed() {
        let test_node = leader_with_followers(&["10.0.0.2:7000", "10.0.0.3:7000"]).await;
        test_node
            .connector
            .peer("10.0.0.3:7000")
            .set_write_behavior(WriteBehavior::Fail);
        let replication = test_node.node.replication();

        let result = replication.write(write_input("a")).await;

        assert!(matches!(
            result,
            Err(WriteError::InsufficientReplicas { acks: 1, required: 2 })
        ));
        assert_eq!(test_node.node.context().log.latest_version(), None);

        test_node
            .connector
            .peer("10.0.0.3:7000")
            .set_write_behavior(WriteBehavior::Confirm);
        let output = replication.write(write_input("a")).await.unwrap();
        assert_eq!(output.version, Version::first());
    }

    #[tokio::test]
    async fn hung_follower_counts_as_failure_after_write_timeout() {
        let test_node = leader_with_followers(&["10.0.0.2:7000", "10.0.0.3:7000", "10.0.0.4:7000"]).await;
        test_node
            .connector
            .peer("10.0.0.4:7000")
            .set_write_behavior(WriteBehavior::Hang);

        // Three followers need two acks, so the hung one doesn't matter.
        let output = test_node.node.replication().write(write_input("a")).await.unwrap();

        assert_eq!(output.version, Version::first());
    }

    #[tokio::test]
    async fn write_with_no_followers_fails_immediately() {
        let test_node = leader_with_followers(&[]).await;

        let result = test_node.node.replication().write(write_input("a")).await;

        assert!(matches!(
            result,
            Err(WriteError::InsufficientReplicas { acks: 0, .. })
        ));
    }

    #[tokio::test]
    async fn write_on_follower_is_not_leader() {
        let test_node = TestNode::new("10.0.0.2:7000").await;

        let result = test_node.node.replication().write(write_input("a")).await;

        assert!(matches!(result, Err(WriteError::NotLeader { leader_address: None })));
    }

    #[tokio::test]
    async fn write_for_other_topic_is_refused() {
        let test_node = leader_with_followers(&["10.0.0.2:7000"]).await;
        let replication = test_node.node.replication();
        replication.write(write_input("a")).await.unwrap();

        let result = replication
            .write(WriteInput {
                topic: "weather".into(),
                payload: Bytes::from("x"),
            })
            .await;

        assert!(matches!(result, Err(WriteError::TopicMismatch(_))));
    }

    #[tokio::test]
    async fn read_repairs_gap_from_peers() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        let leader = test_node.connector.peer("10.0.0.1:7000");
        leader.store(vec![log_entry(2, "b")]);
        test_node
            .node
            .membership()
            .follow_leader(crate::node::FollowMeInput {
                leader_address: "10.0.0.1:7000".into(),
                followers: vec![],
                assigned_id: crate::node::FollowerId::new(1),
            })
            .await
            .unwrap();
        let replication = test_node.node.replication();
        replication.confirm_write(log_entry(1, "a"), "10.0.0.1:7000").unwrap();
        replication.confirm_write(log_entry(3, "c"), "10.0.0.1:7000").unwrap();

        let output = replication.read(ReadInput { topic: "gps".into() }).await.unwrap();

        assert!(!output.incomplete);
        assert_eq!(
            output.payloads,
            vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]
        );
        assert!(leader
            .calls()
            .contains(&PeerCall::MissingVersions(vec![Version::new(2).unwrap()])));
    }

    #[tokio::test]
    async fn read_flags_unrepairable_gap() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        let replication = test_node.node.replication();
        replication.confirm_write(log_entry(1, "a"), "10.0.0.1:7000").unwrap();
        replication.confirm_write(log_entry(3, "c"), "10.0.0.1:7000").unwrap();

        let output = replication.read(ReadInput { topic: "gps".into() }).await.unwrap();

        assert!(output.incomplete);
        assert_eq!(output.payloads, vec![Bytes::from("a")]);
        assert!(matches!(
            replication.missing_versions(Version::new(3).unwrap()).await,
            Err(MissingVersionsError::IncompleteData(_))
        ));
    }

    #[tokio::test]
    async fn confirm_write_refuses_other_topic() {
        let test_node = TestNode::new("10.0.0.2:7000").await;
        let replication = test_node.node.replication();
        replication.confirm_write(log_entry(1, "a"), "10.0.0.1:7000").unwrap();

        let result = replication.confirm_write(
            LogEntry {
                topic: "weather".into(),
                version: Version::first(),
                payload: Bytes::from("x"),
            },
            "10.0.0.1:7000",
        );

        assert!(matches!(result, Err(ConfirmWriteError::TopicMismatch(_))));
    }
}
