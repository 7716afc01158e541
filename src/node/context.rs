use crate::commitlog::ReplicatedLog;
use crate::node::election::ElectionSlot;
use crate::node::events::{self, PeerLostStream};
use crate::node::heartbeat::HeartbeatMonitor;
use crate::node::membership::MembershipRecord;
use crate::node::peer_client::PeerConnector;
use crate::node::peers::PeerTable;
use crate::node::role::{
    self, FollowerRole, Role, RoleChangeListener, RoleChangeNotifier, RoleSnapshot, WriteSequence,
};
use crate::node::timers::{RealClock, StopCheck};
use crate::registry::{ClusterSettings, Registry};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct Timings {
    pub(crate) probe_interval: Duration,
    pub(crate) probe_timeout: Duration,
    pub(crate) heartbeat_deadline: Duration,
    pub(crate) election_window: Duration,
    pub(crate) write_timeout: Duration,
    pub(crate) rpc_timeout: Duration,
    pub(crate) membership_check_interval: Duration,
}

pub(crate) struct NodeContextConfig {
    pub(crate) logger: slog::Logger,
    pub(crate) self_address: String,
    pub(crate) timings: Timings,
    pub(crate) log: ReplicatedLog,
    pub(crate) connector: Arc<dyn PeerConnector>,
    pub(crate) registry: Arc<dyn Registry>,
    pub(crate) shutdown: StopCheck,
}

/// NodeContext is everything a node's components share. It is built once per node and handed to
/// each component explicitly.
pub(crate) struct NodeContext {
    pub(crate) logger: slog::Logger,
    pub(crate) self_address: String,
    pub(crate) timings: Timings,
    pub(crate) peers: Arc<PeerTable>,
    pub(crate) membership: MembershipRecord,
    pub(crate) log: ReplicatedLog,
    pub(crate) connector: Arc<dyn PeerConnector>,
    pub(crate) registry: Arc<dyn Registry>,
    pub(crate) heartbeat: HeartbeatMonitor,
    pub(crate) election: ElectionSlot,
    pub(crate) shutdown: StopCheck,
    settings: RwLock<ClusterSettings>,
    role: RwLock<Role>,
    role_notifier: RoleChangeNotifier,
    role_listener: RoleChangeListener,
}

impl NodeContext {
    pub(crate) fn new(config: NodeContextConfig) -> (Arc<Self>, PeerLostStream) {
        let peers = Arc::new(PeerTable::new());
        let (peer_lost_publisher, peer_lost_stream) = events::peer_lost_channel();
        let heartbeat = HeartbeatMonitor::new(
            config.logger.clone(),
            config.self_address.clone(),
            peers.clone(),
            peer_lost_publisher,
            config.shutdown.clone(),
            &config.timings,
            RealClock,
        );

        // Every node starts out as a leaderless follower until the registry or a leader says otherwise.
        let initial_role = Role::Follower(FollowerRole::leaderless());
        let (role_notifier, role_listener) = role::new_role_notifier(initial_role.snapshot());

        let context = NodeContext {
            logger: config.logger,
            self_address: config.self_address,
            timings: config.timings,
            peers,
            membership: MembershipRecord::new(),
            log: config.log,
            connector: config.connector,
            registry: config.registry,
            heartbeat,
            election: ElectionSlot::default(),
            shutdown: config.shutdown,
            settings: RwLock::new(ClusterSettings::default()),
            role: RwLock::new(initial_role),
            role_notifier,
            role_listener,
        };

        (Arc::new(context), peer_lost_stream)
    }

    pub(crate) fn settings(&self) -> ClusterSettings {
        *self.settings.read()
    }

    pub(crate) fn apply_settings(&self, settings: ClusterSettings) {
        slog::info!(self.logger, "Cluster settings: {:?}", settings);
        *self.settings.write() = settings;
    }

    pub(crate) fn set_role(&self, new_role: Role) {
        let snapshot = new_role.snapshot();
        let old_role = std::mem::replace(&mut *self.role.write(), new_role);
        drop(old_role);

        slog::info!(self.logger, "Role is now {:?}", snapshot);
        self.role_notifier.notify_new_state(snapshot);
    }

    pub(crate) fn role_snapshot(&self) -> RoleSnapshot {
        self.role.read().snapshot()
    }

    pub(crate) fn role_listener(&self) -> RoleChangeListener {
        self.role_listener.clone()
    }

    pub(crate) fn is_leader(&self) -> bool {
        matches!(*self.role.read(), Role::Leader(_))
    }

    /// `None` unless this node is currently leader.
    pub(crate) fn leader_write_lock(&self) -> Option<Arc<Mutex<WriteSequence>>> {
        match &*self.role.read() {
            Role::Leader(leader_role) => Some(leader_role.write_lock()),
            Role::Follower(_) => None,
        }
    }
}
