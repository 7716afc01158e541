use crate::commitlog::{LogEntry, ReplicatedLog, Version};
use crate::node::context::{NodeContextConfig, Timings};
use crate::node::events::PeerLostStream;
use crate::node::node_api::{FollowMeInput, FollowerEntry, FollowerId};
use crate::node::peer_client::{PeerConnector, PeerRpc, PeerRpcError};
use crate::node::timers::{self, Stopper};
use crate::node::Node;
use crate::registry::{ClusterSettings, Registry, RegistryError};
use parking_lot::Mutex;
use slog::Drain;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::time::Duration;

pub(crate) fn test_logger() -> slog::Logger {
    let decorator = slog_term::PlainSyncDecorator::new(std::io::stdout());
    let drain = slog_term::FullFormat::new(decorator).build().fuse();

    slog::Logger::root(drain, slog::o!())
}

/// Short enough for tests, with heartbeat deadlines long enough that they never fire by accident.
pub(crate) fn fast_timings() -> Timings {
    Timings {
        probe_interval: Duration::from_secs(1),
        probe_timeout: Duration::from_millis(500),
        heartbeat_deadline: Duration::from_secs(5),
        election_window: Duration::from_millis(300),
        write_timeout: Duration::from_millis(200),
        rpc_timeout: Duration::from_millis(200),
        membership_check_interval: Duration::from_millis(50),
    }
}

pub(crate) async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Condition never held");
}

// ------- Fake peer --------

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum PeerCall {
    FollowMe {
        leader_address: String,
        assigned_id: FollowerId,
    },
    AddFollower(FollowerEntry),
    RemoveFollower(FollowerEntry),
    Follow(String),
    ConfirmWrite(Version),
    MissingVersions(Vec<Version>),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum WriteBehavior {
    Confirm,
    Fail,
    Hang,
}

/// In-memory stand-in for a remote node. Records what it was asked and answers per its knobs.
pub(crate) struct FakePeer {
    address: String,
    state: Mutex<FakePeerState>,
}

struct FakePeerState {
    calls: Vec<PeerCall>,
    heartbeats: usize,
    unreachable: bool,
    rejecting: bool,
    write_behavior: WriteBehavior,
    stored: BTreeMap<Version, LogEntry>,
}

impl FakePeer {
    pub(crate) fn new(address: &str) -> Arc<Self> {
        Arc::new(FakePeer {
            address: address.to_string(),
            state: Mutex::new(FakePeerState {
                calls: Vec::new(),
                heartbeats: 0,
                unreachable: false,
                rejecting: false,
                write_behavior: WriteBehavior::Confirm,
                stored: BTreeMap::new(),
            }),
        })
    }

    pub(crate) fn calls(&self) -> Vec<PeerCall> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn heartbeats(&self) -> usize {
        self.state.lock().heartbeats
    }

    pub(crate) fn is_unreachable(&self) -> bool {
        self.state.lock().unreachable
    }

    pub(crate) fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    pub(crate) fn set_rejecting(&self, rejecting: bool) {
        self.state.lock().rejecting = rejecting;
    }

    pub(crate) fn set_write_behavior(&self, write_behavior: WriteBehavior) {
        self.state.lock().write_behavior = write_behavior;
    }

    /// Entries this peer can hand out for gap repair.
    pub(crate) fn store(&self, entries: Vec<LogEntry>) {
        let mut state = self.state.lock();
        for entry in entries {
            state.stored.insert(entry.version, entry);
        }
    }

    pub(crate) fn stored(&self, version: Version) -> Option<LogEntry> {
        self.state.lock().stored.get(&version).cloned()
    }

    /// Records the call, then fails it if the peer is unreachable or rejecting.
    fn answer(&self, call: Option<PeerCall>, can_reject: bool) -> Result<(), PeerRpcError> {
        let mut state = self.state.lock();
        if state.unreachable {
            return Err(PeerRpcError::Transport(format!("{} is unreachable", self.address)));
        }
        if let Some(call) = call {
            state.calls.push(call);
        }
        if can_reject && state.rejecting {
            return Err(PeerRpcError::Rejected(format!("{} is rejecting", self.address)));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl PeerRpc for FakePeer {
    async fn follow_me(&self, input: FollowMeInput) -> Result<Option<Version>, PeerRpcError> {
        self.answer(
            Some(PeerCall::FollowMe {
                leader_address: input.leader_address,
                assigned_id: input.assigned_id,
            }),
            true,
        )?;

        Ok(self.state.lock().stored.keys().next_back().copied())
    }

    async fn add_follower(&self, entry: FollowerEntry) -> Result<(), PeerRpcError> {
        self.answer(Some(PeerCall::AddFollower(entry)), false)
    }

    async fn remove_follower(&self, entry: FollowerEntry) -> Result<(), PeerRpcError> {
        self.answer(Some(PeerCall::RemoveFollower(entry)), false)
    }

    async fn follow(&self, candidate_address: String) -> Result<(), PeerRpcError> {
        self.answer(Some(PeerCall::Follow(candidate_address)), true)
    }

    async fn heartbeat(&self, _sender_address: String) -> Result<(), PeerRpcError> {
        self.answer(None, false)?;
        self.state.lock().heartbeats += 1;
        Ok(())
    }

    async fn confirm_write(&self, entry: LogEntry, _leader_address: String) -> Result<(), PeerRpcError> {
        self.answer(Some(PeerCall::ConfirmWrite(entry.version)), true)?;

        let write_behavior = self.state.lock().write_behavior;
        match write_behavior {
            WriteBehavior::Confirm => {
                self.state.lock().stored.insert(entry.version, entry);
                Ok(())
            }
            WriteBehavior::Fail => Err(PeerRpcError::ServerFault("Disk full".into())),
            WriteBehavior::Hang => std::future::pending().await,
        }
    }

    async fn missing_versions(&self, versions: Vec<Version>) -> Result<Vec<LogEntry>, PeerRpcError> {
        self.answer(Some(PeerCall::MissingVersions(versions.clone())), false)?;

        let state = self.state.lock();
        Ok(versions
            .iter()
            .filter_map(|version| state.stored.get(version).cloned())
            .collect())
    }
}

/// Dials `FakePeer`s. Unknown or unreachable addresses fail to connect.
#[derive(Default)]
pub(crate) struct FakeConnector {
    peers: Mutex<HashMap<String, Arc<FakePeer>>>,
}

impl FakeConnector {
    /// The peer at `address`, created on first use.
    pub(crate) fn peer(&self, address: &str) -> Arc<FakePeer> {
        self.peers
            .lock()
            .entry(address.to_string())
            .or_insert_with(|| FakePeer::new(address))
            .clone()
    }
}

#[async_trait::async_trait]
impl PeerConnector for FakeConnector {
    async fn dial(&self, address: &str) -> Result<Arc<dyn PeerRpc>, PeerRpcError> {
        let peer = self.peers.lock().get(address).cloned();
        match peer {
            Some(peer) if !peer.is_unreachable() => Ok(peer),
            _ => Err(PeerRpcError::Unreachable(address.to_string())),
        }
    }
}

// ------- Fake registry --------

pub(crate) struct FakeRegistry {
    settings: ClusterSettings,
    idle_nodes: Mutex<VecDeque<String>>,
    heartbeats: AtomicUsize,
}

impl FakeRegistry {
    pub(crate) fn new() -> Self {
        FakeRegistry {
            settings: ClusterSettings {
                min_cluster_size: 2,
                heartbeat_interval: Duration::from_millis(100),
            },
            idle_nodes: Mutex::new(VecDeque::new()),
            heartbeats: AtomicUsize::new(0),
        }
    }

    pub(crate) fn push_idle_node(&self, address: &str) {
        self.idle_nodes.lock().push_back(address.to_string());
    }

    pub(crate) fn heartbeats(&self) -> usize {
        self.heartbeats.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl Registry for FakeRegistry {
    async fn register(&self, _address: &str) -> Result<ClusterSettings, RegistryError> {
        Ok(self.settings)
    }

    async fn heartbeat(&self, _address: &str) -> Result<(), RegistryError> {
        self.heartbeats.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn request_idle_node(&self) -> Result<Option<String>, RegistryError> {
        Ok(self.idle_nodes.lock().pop_front())
    }
}

// ------- Test node --------

/// A node wired to fakes. The `PeerLost` stream is held but not dispatched, so tests drive the
/// dispatcher by hand.
pub(crate) struct TestNode {
    pub(crate) node: Node,
    pub(crate) connector: Arc<FakeConnector>,
    pub(crate) registry: Arc<FakeRegistry>,
    _events: PeerLostStream,
    _shutdown: Stopper,
    _dir: TempDir,
}

impl TestNode {
    pub(crate) async fn new(self_address: &str) -> Self {
        let logger = test_logger().new(slog::o!("Node" => self_address.to_string()));
        let dir = tempfile::tempdir().unwrap();
        let log = ReplicatedLog::open(logger.clone(), dir.path()).unwrap();
        let connector = Arc::new(FakeConnector::default());
        let registry = Arc::new(FakeRegistry::new());
        let (stopper, shutdown) = timers::stop_signal();

        let (node, events) = Node::new(NodeContextConfig {
            logger,
            self_address: self_address.to_string(),
            timings: fast_timings(),
            log,
            connector: connector.clone(),
            registry: registry.clone(),
            shutdown,
        });
        node.context().apply_settings(ClusterSettings {
            min_cluster_size: 2,
            heartbeat_interval: Duration::from_millis(100),
        });

        TestNode {
            node,
            connector,
            registry,
            _events: events,
            _shutdown: stopper,
            _dir: dir,
        }
    }
}
