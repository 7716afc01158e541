use crate::commitlog::Version;
use crate::node::timers::Stopper;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

pub(crate) enum Role {
    Leader(LeaderRole),
    Follower(FollowerRole),
}

pub(crate) struct LeaderRole {
    write_lock: Arc<Mutex<WriteSequence>>,
    // Dropped with the role, which stops the capacity watcher of this leadership.
    _capacity_watcher: Stopper,
}

pub(crate) struct FollowerRole {
    leader_address: Option<String>,
}

impl LeaderRole {
    pub(crate) fn new(capacity_watcher: Stopper) -> Self {
        LeaderRole {
            write_lock: Arc::new(Mutex::new(WriteSequence::default())),
            _capacity_watcher: capacity_watcher,
        }
    }

    pub(crate) fn write_lock(&self) -> Arc<Mutex<WriteSequence>> {
        self.write_lock.clone()
    }
}

/// Version allocation for one leadership. Lives behind the leader's write lock, so catching up
/// with followers and handing out versions never interleave.
#[derive(Debug, Default)]
pub(crate) struct WriteSequence {
    // Highest version any follower reported holding.
    highest_reported: Option<Version>,
}

impl WriteSequence {
    pub(crate) fn observe(&mut self, reported: Version) {
        if Some(reported) > self.highest_reported {
            self.highest_reported = Some(reported);
        }
    }

    /// Above both the local log and anything a follower holds.
    pub(crate) fn next_version(&self, local_latest: Option<Version>) -> Version {
        match local_latest.max(self.highest_reported) {
            Some(latest) => latest.next(),
            None => Version::first(),
        }
    }
}

impl FollowerRole {
    pub(crate) fn following(leader_address: String) -> Self {
        FollowerRole {
            leader_address: Some(leader_address),
        }
    }

    pub(crate) fn leaderless() -> Self {
        FollowerRole { leader_address: None }
    }
}

impl Role {
    pub(crate) fn snapshot(&self) -> RoleSnapshot {
        match self {
            Role::Leader(_) => RoleSnapshot::Leader,
            Role::Follower(FollowerRole {
                leader_address: Some(leader_address),
            }) => RoleSnapshot::Follower(leader_address.clone()),
            Role::Follower(FollowerRole { leader_address: None }) => RoleSnapshot::FollowerNoLeader,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum RoleSnapshot {
    Leader,
    Follower(String),
    FollowerNoLeader,
}

pub(super) fn new_role_notifier(initial_state: RoleSnapshot) -> (RoleChangeNotifier, RoleChangeListener) {
    let (snd, rcv) = watch::channel(initial_state);

    (RoleChangeNotifier { snd }, RoleChangeListener { rcv })
}

pub(super) struct RoleChangeNotifier {
    snd: watch::Sender<RoleSnapshot>,
}

impl RoleChangeNotifier {
    pub(super) fn notify_new_state(&self, new_state: RoleSnapshot) {
        let _ = self.snd.send(new_state);
    }
}

/// Like the underlying watch channel, intermediate states are clobbered if the listener falls behind.
#[derive(Clone)]
pub(crate) struct RoleChangeListener {
    rcv: watch::Receiver<RoleSnapshot>,
}

impl RoleChangeListener {
    pub(crate) async fn next(&mut self) -> Option<RoleSnapshot> {
        match self.rcv.changed().await {
            Ok(_) => Some(self.rcv.borrow().clone()),
            Err(_) => None,
        }
    }

    pub(crate) fn current(&self) -> RoleSnapshot {
        self.rcv.borrow().clone()
    }

    /// Resolves once this node follows some leader, immediately if it already does.
    pub(crate) async fn wait_for_leader(&mut self) -> Option<String> {
        loop {
            if let RoleSnapshot::Follower(leader_address) = self.current() {
                return Some(leader_address);
            }
            self.next().await?;
        }
    }
}
