use crate::commitlog::{AppendError, StorageError, TopicMismatch, Version};
use crate::node::peer_client::PeerRpcError;
use bytes::Bytes;
use std::fmt;

/// FollowerId is handed out by a leader when a node joins its cluster. Lower IDs joined earlier
/// and win elections.
#[derive(Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub(crate) struct FollowerId(u64);

impl FollowerId {
    pub(crate) fn new(id: u64) -> Self {
        FollowerId(id)
    }

    pub(crate) fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for FollowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct FollowerEntry {
    pub(crate) address: String,
    pub(crate) id: FollowerId,
}

#[derive(Clone, Debug)]
pub(crate) struct FollowMeInput {
    pub(crate) leader_address: String,
    pub(crate) followers: Vec<FollowerEntry>,
    pub(crate) assigned_id: FollowerId,
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) struct FollowMeOutput {
    /// Highest version this follower holds, so a new leader never reissues it.
    pub(crate) latest_version: Option<Version>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum MembershipError {
    #[error("Follower {0} is already in the follower table")]
    AlreadyKnown(String),
    #[error("Follower {0} is not in the follower table")]
    NotKnown(String),
    #[error("Only a leader can do that")]
    NotLeader,
    #[error("Failed to bring {address} into the cluster: {source}")]
    JoinFailed { address: String, source: PeerRpcError },
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum FollowMeError {
    #[error("Can't follow myself")]
    SelfFollow,
    #[error("Failed to reach new leader {address}: {source}")]
    LeaderUnreachable { address: String, source: PeerRpcError },
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum HeartbeatError {
    #[error("No link to heartbeat sender {0}")]
    Disconnected(String),
}

#[derive(Debug)]
pub(crate) struct WriteInput {
    pub(crate) topic: String,
    pub(crate) payload: Bytes,
}

#[derive(Debug)]
pub(crate) struct WriteOutput {
    pub(crate) version: Version,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum WriteError {
    #[error("Only {acks} of {required} required followers confirmed the write")]
    InsufficientReplicas { acks: usize, required: usize },
    #[error("I'm not leader")]
    NotLeader { leader_address: Option<String> },
    #[error(transparent)]
    TopicMismatch(#[from] TopicMismatch),
    #[error("Failed to persist committed write: {0}")]
    LocalIo(StorageError),
}

impl From<AppendError> for WriteError {
    fn from(e: AppendError) -> Self {
        match e {
            AppendError::TopicMismatch { served, requested } => WriteError::TopicMismatch(TopicMismatch { served, requested }),
            AppendError::Storage(e) => WriteError::LocalIo(e),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfirmWriteError {
    #[error(transparent)]
    TopicMismatch(TopicMismatch),
    #[error("Failed to persist write: {0}")]
    LocalIo(StorageError),
}

impl From<AppendError> for ConfirmWriteError {
    fn from(e: AppendError) -> Self {
        match e {
            AppendError::TopicMismatch { served, requested } => {
                ConfirmWriteError::TopicMismatch(TopicMismatch { served, requested })
            }
            AppendError::Storage(e) => ConfirmWriteError::LocalIo(e),
        }
    }
}

#[derive(Debug)]
pub(crate) struct ReadInput {
    pub(crate) topic: String,
}

#[derive(Debug)]
pub(crate) struct ReadOutput {
    pub(crate) payloads: Vec<Bytes>,
    /// Set when this node knows of versions past a gap it could not fill.
    pub(crate) incomplete: bool,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ReadError {
    #[error(transparent)]
    TopicMismatch(#[from] TopicMismatch),
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum MissingVersionsError {
    #[error("No peer could supply versions {0:?}")]
    IncompleteData(Vec<Version>),
}
