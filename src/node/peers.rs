use crate::node::peer_client::PeerRpc;
use crate::node::timers::{self, StopCheck, Stopper};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

const LIVENESS_CHANNEL_CAPACITY: usize = 8;

/// A follower only ever links to its leader, and knows it as `Leader`. A leader links to each of
/// its followers by address.
#[derive(Clone, Hash, Eq, PartialEq)]
pub(crate) enum PeerId {
    Leader,
    Address(String),
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerId::Leader => write!(f, "leader"),
            PeerId::Address(address) => write!(f, "{}", address),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Liveness {
    HeartbeatReceived,
    ForceDie,
}

/// PeerLink is one connection to a peer plus the plumbing its heartbeat tasks share.
pub(crate) struct PeerLink {
    id: PeerId,
    address: String,
    rpc: Arc<dyn PeerRpc>,
    liveness_tx: mpsc::Sender<Liveness>,
    liveness_rx: Mutex<Option<mpsc::Receiver<Liveness>>>,
    closer: Mutex<Option<Stopper>>,
    closed: StopCheck,
    superseded: AtomicBool,
}

impl PeerLink {
    pub(crate) fn new(id: PeerId, address: String, rpc: Arc<dyn PeerRpc>) -> Arc<Self> {
        let (liveness_tx, liveness_rx) = mpsc::channel(LIVENESS_CHANNEL_CAPACITY);
        let (closer, closed) = timers::stop_signal();

        Arc::new(PeerLink {
            id,
            address,
            rpc,
            liveness_tx,
            liveness_rx: Mutex::new(Some(liveness_rx)),
            closer: Mutex::new(Some(closer)),
            closed,
            superseded: AtomicBool::new(false),
        })
    }

    pub(crate) fn id(&self) -> &PeerId {
        &self.id
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn rpc(&self) -> &dyn PeerRpc {
        self.rpc.as_ref()
    }

    pub(crate) fn heartbeat_received(&self) {
        // A full channel already holds proof of life.
        let _ = self.liveness_tx.try_send(Liveness::HeartbeatReceived);
    }

    pub(crate) fn force_die(&self) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.liveness_tx.try_send(Liveness::ForceDie) {
            let liveness_tx = self.liveness_tx.clone();
            tokio::spawn(async move {
                let _ = liveness_tx.send(Liveness::ForceDie).await;
            });
        }
    }

    /// Mark this link as replaced by a newer one and kill it. Its `PeerLost` will be ignored.
    pub(crate) fn supersede(&self) {
        self.superseded.store(true, Ordering::Release);
        self.force_die();
    }

    pub(crate) fn is_superseded(&self) -> bool {
        self.superseded.load(Ordering::Acquire)
    }

    /// Stops the probe loop. Idempotent.
    pub(crate) fn close(&self) {
        self.closer.lock().take();
    }

    pub(crate) fn closed_check(&self) -> StopCheck {
        self.closed.clone()
    }

    /// The receiving half can only be taken once, by the one receiver loop of this link.
    pub(crate) fn take_liveness_receiver(&self) -> Option<mpsc::Receiver<Liveness>> {
        self.liveness_rx.lock().take()
    }
}

impl fmt::Debug for PeerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerLink")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("superseded", &self.is_superseded())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Peer {0:?} already has a link")]
pub(crate) struct AlreadyPresent(pub(crate) PeerId);

/// PeerTable holds every live link this node has. Lock scope is the map operation; no I/O
/// happens under the lock.
#[derive(Default)]
pub(crate) struct PeerTable {
    links: RwLock<HashMap<PeerId, Arc<PeerLink>>>,
}

impl PeerTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, link: Arc<PeerLink>) -> Result<(), AlreadyPresent> {
        let mut links = self.links.write();
        if links.contains_key(link.id()) {
            return Err(AlreadyPresent(link.id().clone()));
        }
        links.insert(link.id().clone(), link);

        Ok(())
    }

    pub(crate) fn get(&self, id: &PeerId) -> Option<Arc<PeerLink>> {
        self.links.read().get(id).cloned()
    }

    /// Removes `id` only while it still maps to this exact `link`. Returns true if removed.
    pub(crate) fn remove(&self, id: &PeerId, link: &Arc<PeerLink>) -> bool {
        let mut links = self.links.write();
        match links.get(id) {
            Some(current) if Arc::ptr_eq(current, link) => {
                links.remove(id);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn find_by_address(&self, address: &str) -> Option<Arc<PeerLink>> {
        self.links
            .read()
            .values()
            .find(|link| link.address() == address)
            .cloned()
    }

    pub(crate) fn links(&self) -> Vec<Arc<PeerLink>> {
        self.links.read().values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.links.read().len()
    }
}
