use crate::commitlog::{LogEntry, TopicMismatch, Version};
use crate::grpc::grpc_cluster_server::{GrpcCluster, GrpcClusterServer};
use crate::grpc::grpc_peer_server::{GrpcPeer, GrpcPeerServer};
use crate::grpc::{
    proto_ack, proto_ack_error, proto_confirm_write_error, proto_confirm_write_result, proto_follow_me_result,
    proto_read_error, proto_read_result, proto_write_error, proto_write_result, ProtoAck, ProtoAckError,
    ProtoAckSuccess, ProtoAlreadyKnown, ProtoConfirmWriteError, ProtoConfirmWriteReq, ProtoConfirmWriteResult,
    ProtoConfirmWriteSuccess, ProtoDisconnected, ProtoFollowMeReq, ProtoFollowMeResult, ProtoFollowMeSuccess,
    ProtoFollowReq, ProtoFollowerEntry,
    ProtoHeartbeatReq, ProtoInsufficientReplicas, ProtoLeadReq, ProtoLogEntry, ProtoMissingVersionsReq,
    ProtoMissingVersionsResult, ProtoNotKnown, ProtoNotLeader, ProtoReadError, ProtoReadReq, ProtoReadResult,
    ProtoReadSuccess, ProtoRejected, ProtoServerFault, ProtoTopicMismatch, ProtoWriteError, ProtoWriteReq,
    ProtoWriteResult, ProtoWriteSuccess,
};
use crate::node::{
    ConfirmWriteError, FollowMeError, FollowMeInput, FollowMeOutput, FollowerEntry, FollowerId, HeartbeatError,
    MembershipError, Node, ReadError, ReadInput, ReadOutput, WriteError, WriteInput, WriteOutput,
};
use crate::server::RpcServerShutdownSignal;
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

/// RpcServer serves both the peer-to-peer interface and the client-facing cluster interface.
#[derive(Clone)]
pub(crate) struct RpcServer {
    logger: slog::Logger,
    node: Node,
}

impl RpcServer {
    pub(crate) fn new(logger: slog::Logger, node: Node) -> Self {
        RpcServer { logger, node }
    }

    /// Serves on an already bound listener, so peers can connect as soon as the caller has it.
    pub(crate) async fn run(self, listener: TcpListener, shutdown_signal: RpcServerShutdownSignal) {
        let logger = self.logger.clone();
        slog::info!(logger, "Listening on '{:?}'", listener.local_addr());

        let result = Server::builder()
            .add_service(GrpcPeerServer::new(self.clone()))
            .add_service(GrpcClusterServer::new(self))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown_signal)
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
    }

    // ------- Membership --------

    async fn handle_lead(&self, rpc_request: ProtoLeadReq) -> Result<ProtoAck, Status> {
        self.node.lead(rpc_request.follower_addresses).await;
        Ok(Self::ack_ok())
    }

    async fn handle_follow_me(&self, rpc_request: ProtoFollowMeReq) -> Result<ProtoFollowMeResult, Status> {
        let app_input = Self::convert_follow_me_input(rpc_request)?;
        let app_result = self.node.membership().follow_leader(app_input).await;
        Ok(Self::convert_follow_me_result(app_result))
    }

    fn convert_follow_me_result(app_result: Result<FollowMeOutput, FollowMeError>) -> ProtoFollowMeResult {
        match app_result {
            Ok(app_output) => ProtoFollowMeResult {
                result: Some(proto_follow_me_result::Result::Ok(ProtoFollowMeSuccess {
                    latest_version: app_output.latest_version.map(|v| v.as_u64()).unwrap_or(0),
                })),
            },
            Err(e @ FollowMeError::SelfFollow) | Err(e @ FollowMeError::LeaderUnreachable { .. }) => ProtoFollowMeResult {
                result: Some(proto_follow_me_result::Result::Err(ProtoAckError {
                    err: Some(proto_ack_error::Err::Rejected(ProtoRejected { reason: e.to_string() })),
                })),
            },
        }
    }

    fn convert_follow_me_input(rpc_request: ProtoFollowMeReq) -> Result<FollowMeInput, Status> {
        let mut followers = Vec::with_capacity(rpc_request.followers.len());
        for proto_entry in rpc_request.followers {
            followers.push(Self::convert_follower_entry(proto_entry)?);
        }

        Ok(FollowMeInput {
            leader_address: rpc_request.leader_address,
            followers,
            assigned_id: Self::convert_follower_id(rpc_request.assigned_id)?,
        })
    }

    fn convert_follower_entry(proto_entry: ProtoFollowerEntry) -> Result<FollowerEntry, Status> {
        Ok(FollowerEntry {
            id: Self::convert_follower_id(proto_entry.follower_id)?,
            address: proto_entry.address,
        })
    }

    fn convert_follower_id(id: u64) -> Result<FollowerId, Status> {
        match id {
            0 => Err(Status::invalid_argument("Follower ID 0")),
            id => Ok(FollowerId::new(id)),
        }
    }

    fn handle_modify_follower_list(&self, rpc_request: ProtoFollowerEntry, is_add: bool) -> Result<ProtoAck, Status> {
        let entry = Self::convert_follower_entry(rpc_request)?;
        let app_result = self.node.membership().modify_follower_list(entry, is_add);
        Ok(Self::convert_membership_result(app_result))
    }

    fn convert_membership_result(app_result: Result<(), MembershipError>) -> ProtoAck {
        match app_result {
            Ok(()) => Self::ack_ok(),
            Err(MembershipError::AlreadyKnown(address)) => {
                Self::ack_err(proto_ack_error::Err::AlreadyKnown(ProtoAlreadyKnown { address }))
            }
            Err(MembershipError::NotKnown(address)) => {
                Self::ack_err(proto_ack_error::Err::NotKnown(ProtoNotKnown { address }))
            }
            Err(e @ MembershipError::NotLeader) | Err(e @ MembershipError::JoinFailed { .. }) => {
                Self::ack_err(proto_ack_error::Err::ServerFault(ProtoServerFault { message: e.to_string() }))
            }
        }
    }

    fn handle_follow(&self, rpc_request: ProtoFollowReq) -> Result<ProtoAck, Status> {
        self.node.election().handle_follow(rpc_request.candidate_address);
        Ok(Self::ack_ok())
    }

    fn handle_heartbeat(&self, rpc_request: ProtoHeartbeatReq) -> Result<ProtoAck, Status> {
        let app_result = self
            .node
            .context()
            .heartbeat
            .record_heartbeat(&rpc_request.sender_address);
        let rpc_reply = match app_result {
            Ok(()) => Self::ack_ok(),
            Err(e @ HeartbeatError::Disconnected(_)) => {
                Self::ack_err(proto_ack_error::Err::Disconnected(ProtoDisconnected { message: e.to_string() }))
            }
        };
        Ok(rpc_reply)
    }

    fn ack_ok() -> ProtoAck {
        ProtoAck {
            result: Some(proto_ack::Result::Ok(ProtoAckSuccess {
                // Empty
            })),
        }
    }

    fn ack_err(err: proto_ack_error::Err) -> ProtoAck {
        ProtoAck {
            result: Some(proto_ack::Result::Err(ProtoAckError { err: Some(err) })),
        }
    }

    // ------- Replication --------

    fn handle_confirm_write(&self, rpc_request: ProtoConfirmWriteReq) -> Result<ProtoConfirmWriteResult, Status> {
        let proto_entry = rpc_request
            .entry
            .ok_or_else(|| Status::invalid_argument("Missing log entry"))?;
        let entry = LogEntry::try_from_proto(proto_entry).ok_or_else(|| Status::invalid_argument("Version 0"))?;

        let app_result = self
            .node
            .replication()
            .confirm_write(entry, &rpc_request.leader_address);
        Ok(Self::convert_confirm_write_result(app_result))
    }

    fn convert_confirm_write_result(app_result: Result<(), ConfirmWriteError>) -> ProtoConfirmWriteResult {
        match app_result {
            Ok(()) => ProtoConfirmWriteResult {
                result: Some(proto_confirm_write_result::Result::Ok(ProtoConfirmWriteSuccess {
                    confirmed: true,
                })),
            },
            Err(ConfirmWriteError::TopicMismatch(mismatch)) => ProtoConfirmWriteResult {
                result: Some(proto_confirm_write_result::Result::Err(ProtoConfirmWriteError {
                    err: Some(proto_confirm_write_error::Err::TopicMismatch(Self::convert_topic_mismatch(
                        mismatch,
                    ))),
                })),
            },
            Err(ConfirmWriteError::LocalIo(_)) => ProtoConfirmWriteResult {
                result: Some(proto_confirm_write_result::Result::Err(ProtoConfirmWriteError {
                    err: Some(proto_confirm_write_error::Err::ServerFault(ProtoServerFault {
                        message: "Local IO failure".to_string(),
                    })),
                })),
            },
        }
    }

    fn handle_get_missing_versions(
        &self,
        rpc_request: ProtoMissingVersionsReq,
    ) -> Result<ProtoMissingVersionsResult, Status> {
        let versions: Vec<Version> = rpc_request.versions.into_iter().filter_map(Version::new).collect();
        let entries = self.node.replication().entries_for(&versions);

        Ok(ProtoMissingVersionsResult {
            entries: entries.into_iter().map(ProtoLogEntry::from).collect(),
        })
    }

    fn convert_topic_mismatch(mismatch: TopicMismatch) -> ProtoTopicMismatch {
        ProtoTopicMismatch {
            served_topic: mismatch.served,
            requested_topic: mismatch.requested,
        }
    }

    // ------- Client facing --------

    async fn handle_write(&self, rpc_request: ProtoWriteReq) -> Result<ProtoWriteResult, Status> {
        let app_input = WriteInput {
            topic: rpc_request.topic,
            payload: Bytes::from(rpc_request.payload),
        };
        let app_result = self.node.replication().write(app_input).await;
        Ok(Self::convert_write_result(app_result))
    }

    fn convert_write_result(app_result: Result<WriteOutput, WriteError>) -> ProtoWriteResult {
        let err = match app_result {
            Ok(ok) => {
                return ProtoWriteResult {
                    result: Some(proto_write_result::Result::Ok(ProtoWriteSuccess {
                        version: ok.version.as_u64(),
                    })),
                }
            }
            Err(WriteError::InsufficientReplicas { acks, required }) => {
                proto_write_error::Err::InsufficientReplicas(ProtoInsufficientReplicas {
                    acks: acks as u32,
                    required: required as u32,
                })
            }
            Err(WriteError::NotLeader { leader_address }) => proto_write_error::Err::NotLeader(ProtoNotLeader {
                leader_address: leader_address.unwrap_or_default(),
            }),
            Err(WriteError::TopicMismatch(mismatch)) => {
                proto_write_error::Err::TopicMismatch(Self::convert_topic_mismatch(mismatch))
            }
            Err(WriteError::LocalIo(_)) => proto_write_error::Err::ServerFault(ProtoServerFault {
                message: "Local IO failure".to_string(),
            }),
        };

        ProtoWriteResult {
            result: Some(proto_write_result::Result::Err(ProtoWriteError { err: Some(err) })),
        }
    }

    async fn handle_read(&self, rpc_request: ProtoReadReq) -> Result<ProtoReadResult, Status> {
        let app_input = ReadInput {
            topic: rpc_request.topic,
        };
        let app_result = self.node.replication().read(app_input).await;
        Ok(Self::convert_read_result(app_result))
    }

    fn convert_read_result(app_result: Result<ReadOutput, ReadError>) -> ProtoReadResult {
        match app_result {
            Ok(ok) => ProtoReadResult {
                result: Some(proto_read_result::Result::Ok(ProtoReadSuccess {
                    payloads: ok.payloads.into_iter().map(|payload| payload.to_vec()).collect(),
                    incomplete: ok.incomplete,
                })),
            },
            Err(ReadError::TopicMismatch(mismatch)) => ProtoReadResult {
                result: Some(proto_read_result::Result::Err(ProtoReadError {
                    err: Some(proto_read_error::Err::TopicMismatch(Self::convert_topic_mismatch(mismatch))),
                })),
            },
        }
    }
}

#[async_trait::async_trait]
impl GrpcPeer for RpcServer {
    async fn lead(&self, rpc_request_wrapped: Request<ProtoLeadReq>) -> Result<Response<ProtoAck>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_lead(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn follow_me(
        &self,
        rpc_request_wrapped: Request<ProtoFollowMeReq>,
    ) -> Result<Response<ProtoFollowMeResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_follow_me(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn add_follower(
        &self,
        rpc_request_wrapped: Request<ProtoFollowerEntry>,
    ) -> Result<Response<ProtoAck>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - AddFollower {:?}", rpc_request);
        let rpc_result = self.handle_modify_follower_list(rpc_request, true);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn remove_follower(
        &self,
        rpc_request_wrapped: Request<ProtoFollowerEntry>,
    ) -> Result<Response<ProtoAck>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - RemoveFollower {:?}", rpc_request);
        let rpc_result = self.handle_modify_follower_list(rpc_request, false);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn follow(&self, rpc_request_wrapped: Request<ProtoFollowReq>) -> Result<Response<ProtoAck>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_follow(rpc_request);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn heartbeat(&self, rpc_request_wrapped: Request<ProtoHeartbeatReq>) -> Result<Response<ProtoAck>, Status> {
        // Too chatty for wire logging.
        self.handle_heartbeat(rpc_request_wrapped.into_inner())
            .map(Response::new)
    }

    async fn confirm_write(
        &self,
        rpc_request_wrapped: Request<ProtoConfirmWriteReq>,
    ) -> Result<Response<ProtoConfirmWriteResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_confirm_write(rpc_request);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn get_missing_versions(
        &self,
        rpc_request_wrapped: Request<ProtoMissingVersionsReq>,
    ) -> Result<Response<ProtoMissingVersionsResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_get_missing_versions(rpc_request);
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }
}

#[async_trait::async_trait]
impl GrpcCluster for RpcServer {
    async fn write_to_cluster(
        &self,
        rpc_request_wrapped: Request<ProtoWriteReq>,
    ) -> Result<Response<ProtoWriteResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_write(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }

    async fn read_from_cluster(
        &self,
        rpc_request_wrapped: Request<ProtoReadReq>,
    ) -> Result<Response<ProtoReadResult>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();

        slog::debug!(self.logger, "ServerWire - {:?}", rpc_request);
        let rpc_result = self.handle_read(rpc_request).await;
        slog::debug!(self.logger, "ServerWire - {:?}", rpc_result);

        rpc_result.map(Response::new)
    }
}
