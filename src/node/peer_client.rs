use crate::commitlog::{LogEntry, Version};
use crate::grpc::grpc_peer_client::GrpcPeerClient;
use crate::grpc::{
    proto_ack, proto_ack_error, proto_confirm_write_error, proto_confirm_write_result, proto_follow_me_result, ProtoAck,
    ProtoAckError, ProtoConfirmWriteReq, ProtoConfirmWriteResult, ProtoFollowMeReq, ProtoFollowMeResult, ProtoFollowReq,
    ProtoFollowerEntry, ProtoHeartbeatReq, ProtoLogEntry, ProtoMissingVersionsReq,
};
use crate::node::node_api::{FollowMeInput, FollowerEntry};
use crate::node::timers::TimedOut;
use bytes::Bytes;
use std::sync::Arc;
use tonic::transport::{Channel, Endpoint};
use tonic::{Response, Status};

/// PeerRpc is everything one node can ask of another.
#[async_trait::async_trait]
pub(crate) trait PeerRpc: Send + Sync {
    /// Returns the highest version the new follower already holds.
    async fn follow_me(&self, input: FollowMeInput) -> Result<Option<Version>, PeerRpcError>;
    async fn add_follower(&self, entry: FollowerEntry) -> Result<(), PeerRpcError>;
    async fn remove_follower(&self, entry: FollowerEntry) -> Result<(), PeerRpcError>;
    async fn follow(&self, candidate_address: String) -> Result<(), PeerRpcError>;
    async fn heartbeat(&self, sender_address: String) -> Result<(), PeerRpcError>;
    async fn confirm_write(&self, entry: LogEntry, leader_address: String) -> Result<(), PeerRpcError>;
    async fn missing_versions(&self, versions: Vec<Version>) -> Result<Vec<LogEntry>, PeerRpcError>;
}

/// PeerConnector opens an RPC handle to a peer by its advertised address.
#[async_trait::async_trait]
pub(crate) trait PeerConnector: Send + Sync {
    async fn dial(&self, address: &str) -> Result<Arc<dyn PeerRpc>, PeerRpcError>;
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum PeerRpcError {
    #[error("Invalid peer address '{0}'")]
    InvalidAddress(String),
    #[error("Failed to connect: {0}")]
    Unreachable(String),
    #[error("Peer doesn't recognize us: {0}")]
    Disconnected(String),
    #[error("Peer already knows {0}")]
    AlreadyKnown(String),
    #[error("Peer doesn't know {0}")]
    NotKnown(String),
    #[error("Peer rejected request: {0}")]
    Rejected(String),
    #[error("Peer serves topic '{served}', not '{requested}'")]
    TopicMismatch { served: String, requested: String },
    #[error("Explicit server fault: {0}")]
    ServerFault(String),
    #[error("Un-modeled RPC failure: {0}")]
    Transport(String),
    #[error("Malformed reply: {0}")]
    Malformed(&'static str),
    #[error(transparent)]
    TimedOut(#[from] TimedOut),
}

pub(crate) struct GrpcPeerConnector {
    logger: slog::Logger,
}

impl GrpcPeerConnector {
    pub(crate) fn new(logger: slog::Logger) -> Self {
        GrpcPeerConnector { logger }
    }
}

#[async_trait::async_trait]
impl PeerConnector for GrpcPeerConnector {
    async fn dial(&self, address: &str) -> Result<Arc<dyn PeerRpc>, PeerRpcError> {
        let url = format!("http://{}", address);
        slog::debug!(self.logger, "Connecting to {} ...", url);

        let endpoint = Endpoint::from_shared(url).map_err(|_| PeerRpcError::InvalidAddress(address.to_string()))?;
        let channel = endpoint
            .connect()
            .await
            .map_err(|e| PeerRpcError::Unreachable(e.to_string()))?;

        Ok(Arc::new(GrpcPeerRpc {
            logger: self.logger.new(slog::o!("Peer" => address.to_string())),
            client: GrpcPeerClient::new(channel),
        }))
    }
}

pub(crate) struct GrpcPeerRpc {
    logger: slog::Logger,
    client: GrpcPeerClient<Channel>,
}

impl GrpcPeerRpc {
    fn convert_ack(rpc_reply: Result<Response<ProtoAck>, Status>) -> Result<(), PeerRpcError> {
        match rpc_reply {
            Ok(rpc_result) => match rpc_result.into_inner().result {
                Some(proto_ack::Result::Ok(_)) => Ok(()),
                Some(proto_ack::Result::Err(err)) => Err(Self::convert_ack_error(err)),
                None => Err(PeerRpcError::Malformed("Ack Result")),
            },
            Err(rpc_status) => Err(Self::convert_status(rpc_status)),
        }
    }

    fn convert_ack_error(err: ProtoAckError) -> PeerRpcError {
        match err.err {
            Some(proto_ack_error::Err::Disconnected(payload)) => PeerRpcError::Disconnected(payload.message),
            Some(proto_ack_error::Err::AlreadyKnown(payload)) => PeerRpcError::AlreadyKnown(payload.address),
            Some(proto_ack_error::Err::NotKnown(payload)) => PeerRpcError::NotKnown(payload.address),
            Some(proto_ack_error::Err::Rejected(payload)) => PeerRpcError::Rejected(payload.reason),
            Some(proto_ack_error::Err::ServerFault(payload)) => PeerRpcError::ServerFault(payload.message),
            None => PeerRpcError::Malformed("Ack Err"),
        }
    }

    fn convert_follow_me(
        rpc_reply: Result<Response<ProtoFollowMeResult>, Status>,
    ) -> Result<Option<Version>, PeerRpcError> {
        match rpc_reply {
            Ok(rpc_result) => match rpc_result.into_inner().result {
                // 0 means an empty log, which `Version::new` maps to None.
                Some(proto_follow_me_result::Result::Ok(payload)) => Ok(Version::new(payload.latest_version)),
                Some(proto_follow_me_result::Result::Err(err)) => Err(Self::convert_ack_error(err)),
                None => Err(PeerRpcError::Malformed("FollowMe Result")),
            },
            Err(rpc_status) => Err(Self::convert_status(rpc_status)),
        }
    }

    fn convert_confirm_write(rpc_reply: Result<Response<ProtoConfirmWriteResult>, Status>) -> Result<(), PeerRpcError> {
        match rpc_reply {
            Ok(rpc_result) => match rpc_result.into_inner().result {
                Some(proto_confirm_write_result::Result::Ok(payload)) => match payload.confirmed {
                    true => Ok(()),
                    false => Err(PeerRpcError::Rejected("Write not confirmed".into())),
                },
                Some(proto_confirm_write_result::Result::Err(err)) => match err.err {
                    Some(proto_confirm_write_error::Err::TopicMismatch(payload)) => Err(PeerRpcError::TopicMismatch {
                        served: payload.served_topic,
                        requested: payload.requested_topic,
                    }),
                    Some(proto_confirm_write_error::Err::ServerFault(payload)) => {
                        Err(PeerRpcError::ServerFault(payload.message))
                    }
                    None => Err(PeerRpcError::Malformed("ConfirmWrite Err")),
                },
                None => Err(PeerRpcError::Malformed("ConfirmWrite Result")),
            },
            Err(rpc_status) => Err(Self::convert_status(rpc_status)),
        }
    }

    fn convert_status(rpc_status: Status) -> PeerRpcError {
        PeerRpcError::Transport(format!("{:?}: {}", rpc_status.code(), rpc_status.message()))
    }
}

#[async_trait::async_trait]
impl PeerRpc for GrpcPeerRpc {
    async fn follow_me(&self, input: FollowMeInput) -> Result<Option<Version>, PeerRpcError> {
        let rpc_request = ProtoFollowMeReq {
            leader_address: input.leader_address,
            followers: input.followers.into_iter().map(ProtoFollowerEntry::from).collect(),
            assigned_id: input.assigned_id.as_u64(),
        };

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let rpc_reply = self.client.clone().follow_me(rpc_request).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        Self::convert_follow_me(rpc_reply)
    }

    async fn add_follower(&self, entry: FollowerEntry) -> Result<(), PeerRpcError> {
        let rpc_request = ProtoFollowerEntry::from(entry);

        slog::debug!(self.logger, "ClientWire - AddFollower {:?}", rpc_request);
        let rpc_reply = self.client.clone().add_follower(rpc_request).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        Self::convert_ack(rpc_reply)
    }

    async fn remove_follower(&self, entry: FollowerEntry) -> Result<(), PeerRpcError> {
        let rpc_request = ProtoFollowerEntry::from(entry);

        slog::debug!(self.logger, "ClientWire - RemoveFollower {:?}", rpc_request);
        let rpc_reply = self.client.clone().remove_follower(rpc_request).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        Self::convert_ack(rpc_reply)
    }

    async fn follow(&self, candidate_address: String) -> Result<(), PeerRpcError> {
        let rpc_request = ProtoFollowReq { candidate_address };

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let rpc_reply = self.client.clone().follow(rpc_request).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        Self::convert_ack(rpc_reply)
    }

    async fn heartbeat(&self, sender_address: String) -> Result<(), PeerRpcError> {
        // Heartbeats are too chatty for wire logging.
        let rpc_reply = self
            .client
            .clone()
            .heartbeat(ProtoHeartbeatReq { sender_address })
            .await;

        Self::convert_ack(rpc_reply)
    }

    async fn confirm_write(&self, entry: LogEntry, leader_address: String) -> Result<(), PeerRpcError> {
        let rpc_request = ProtoConfirmWriteReq {
            entry: Some(ProtoLogEntry::from(entry)),
            leader_address,
        };

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let rpc_reply = self.client.clone().confirm_write(rpc_request).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        Self::convert_confirm_write(rpc_reply)
    }

    async fn missing_versions(&self, versions: Vec<Version>) -> Result<Vec<LogEntry>, PeerRpcError> {
        let rpc_request = ProtoMissingVersionsReq {
            versions: versions.iter().map(Version::as_u64).collect(),
        };

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let rpc_reply = self.client.clone().get_missing_versions(rpc_request).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        let proto_entries = rpc_reply.map_err(Self::convert_status)?.into_inner().entries;
        let mut entries = Vec::with_capacity(proto_entries.len());
        for proto_entry in proto_entries {
            entries.push(LogEntry::try_from_proto(proto_entry).ok_or(PeerRpcError::Malformed("Log entry version 0"))?);
        }

        Ok(entries)
    }
}

// ------- Conversions --------

impl From<FollowerEntry> for ProtoFollowerEntry {
    fn from(entry: FollowerEntry) -> Self {
        ProtoFollowerEntry {
            address: entry.address,
            follower_id: entry.id.as_u64(),
        }
    }
}

impl From<LogEntry> for ProtoLogEntry {
    fn from(entry: LogEntry) -> Self {
        ProtoLogEntry {
            topic: entry.topic,
            version: entry.version.as_u64(),
            payload: entry.payload.to_vec(),
        }
    }
}

impl LogEntry {
    /// `None` if the wire entry carries version 0.
    pub(crate) fn try_from_proto(proto_entry: ProtoLogEntry) -> Option<Self> {
        Some(LogEntry {
            version: Version::new(proto_entry.version)?,
            topic: proto_entry.topic,
            payload: Bytes::from(proto_entry.payload),
        })
    }
}
