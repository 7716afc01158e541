// ------- Shared --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAck {
    #[prost(oneof = "proto_ack::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_ack::Result>,
}
/// Nested message and enum types in `ProtoAck`.
pub mod proto_ack {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoAckSuccess),
        #[prost(message, tag = "2")]
        Err(super::ProtoAckError),
    }
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAckSuccess {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAckError {
    #[prost(oneof = "proto_ack_error::Err", tags = "1, 2, 3, 4, 5")]
    pub err: ::core::option::Option<proto_ack_error::Err>,
}
/// Nested message and enum types in `ProtoAckError`.
pub mod proto_ack_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        Disconnected(super::ProtoDisconnected),
        #[prost(message, tag = "2")]
        AlreadyKnown(super::ProtoAlreadyKnown),
        #[prost(message, tag = "3")]
        NotKnown(super::ProtoNotKnown),
        #[prost(message, tag = "4")]
        Rejected(super::ProtoRejected),
        #[prost(message, tag = "5")]
        ServerFault(super::ProtoServerFault),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDisconnected {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAlreadyKnown {
    #[prost(string, tag = "1")]
    pub address: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNotKnown {
    #[prost(string, tag = "1")]
    pub address: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRejected {
    #[prost(string, tag = "1")]
    pub reason: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoServerFault {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoTopicMismatch {
    #[prost(string, tag = "1")]
    pub served_topic: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub requested_topic: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLogEntry {
    #[prost(string, tag = "1")]
    pub topic: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub version: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}
// ------- Membership --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLeadReq {
    #[prost(string, repeated, tag = "1")]
    pub follower_addresses: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFollowerEntry {
    #[prost(string, tag = "1")]
    pub address: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub follower_id: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFollowMeReq {
    #[prost(string, tag = "1")]
    pub leader_address: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "2")]
    pub followers: ::prost::alloc::vec::Vec<ProtoFollowerEntry>,
    #[prost(uint64, tag = "3")]
    pub assigned_id: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFollowMeResult {
    #[prost(oneof = "proto_follow_me_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_follow_me_result::Result>,
}
/// Nested message and enum types in `ProtoFollowMeResult`.
pub mod proto_follow_me_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoFollowMeSuccess),
        #[prost(message, tag = "2")]
        Err(super::ProtoAckError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFollowMeSuccess {
    /// 0 when the follower holds no entries.
    #[prost(uint64, tag = "1")]
    pub latest_version: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoFollowReq {
    #[prost(string, tag = "1")]
    pub candidate_address: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoHeartbeatReq {
    #[prost(string, tag = "1")]
    pub sender_address: ::prost::alloc::string::String,
}
// ------- Replication --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoConfirmWriteReq {
    #[prost(message, optional, tag = "1")]
    pub entry: ::core::option::Option<ProtoLogEntry>,
    #[prost(string, tag = "2")]
    pub leader_address: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoConfirmWriteResult {
    #[prost(oneof = "proto_confirm_write_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_confirm_write_result::Result>,
}
/// Nested message and enum types in `ProtoConfirmWriteResult`.
pub mod proto_confirm_write_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoConfirmWriteSuccess),
        #[prost(message, tag = "2")]
        Err(super::ProtoConfirmWriteError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoConfirmWriteSuccess {
    #[prost(bool, tag = "1")]
    pub confirmed: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoConfirmWriteError {
    #[prost(oneof = "proto_confirm_write_error::Err", tags = "1, 2")]
    pub err: ::core::option::Option<proto_confirm_write_error::Err>,
}
/// Nested message and enum types in `ProtoConfirmWriteError`.
pub mod proto_confirm_write_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        TopicMismatch(super::ProtoTopicMismatch),
        #[prost(message, tag = "2")]
        ServerFault(super::ProtoServerFault),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMissingVersionsReq {
    #[prost(uint64, repeated, tag = "1")]
    pub versions: ::prost::alloc::vec::Vec<u64>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMissingVersionsResult {
    #[prost(message, repeated, tag = "1")]
    pub entries: ::prost::alloc::vec::Vec<ProtoLogEntry>,
}
// ------- Client facing --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoWriteReq {
    #[prost(string, tag = "1")]
    pub topic: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoWriteResult {
    #[prost(oneof = "proto_write_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_write_result::Result>,
}
/// Nested message and enum types in `ProtoWriteResult`.
pub mod proto_write_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoWriteSuccess),
        #[prost(message, tag = "2")]
        Err(super::ProtoWriteError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoWriteSuccess {
    #[prost(uint64, tag = "1")]
    pub version: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoWriteError {
    #[prost(oneof = "proto_write_error::Err", tags = "1, 2, 3, 4")]
    pub err: ::core::option::Option<proto_write_error::Err>,
}
/// Nested message and enum types in `ProtoWriteError`.
pub mod proto_write_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        InsufficientReplicas(super::ProtoInsufficientReplicas),
        #[prost(message, tag = "2")]
        NotLeader(super::ProtoNotLeader),
        #[prost(message, tag = "3")]
        TopicMismatch(super::ProtoTopicMismatch),
        #[prost(message, tag = "4")]
        ServerFault(super::ProtoServerFault),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoInsufficientReplicas {
    #[prost(uint32, tag = "1")]
    pub acks: u32,
    #[prost(uint32, tag = "2")]
    pub required: u32,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNotLeader {
    /// Empty when this node doesn't know who the leader is.
    #[prost(string, tag = "1")]
    pub leader_address: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReadReq {
    #[prost(string, tag = "1")]
    pub topic: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReadResult {
    #[prost(oneof = "proto_read_result::Result", tags = "1, 2")]
    pub result: ::core::option::Option<proto_read_result::Result>,
}
/// Nested message and enum types in `ProtoReadResult`.
pub mod proto_read_result {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Result {
        #[prost(message, tag = "1")]
        Ok(super::ProtoReadSuccess),
        #[prost(message, tag = "2")]
        Err(super::ProtoReadError),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReadSuccess {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub payloads: ::prost::alloc::vec::Vec<::prost::alloc::vec::Vec<u8>>,
    #[prost(bool, tag = "2")]
    pub incomplete: bool,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReadError {
    #[prost(oneof = "proto_read_error::Err", tags = "1, 2")]
    pub err: ::core::option::Option<proto_read_error::Err>,
}
/// Nested message and enum types in `ProtoReadError`.
pub mod proto_read_error {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Err {
        #[prost(message, tag = "1")]
        TopicMismatch(super::ProtoTopicMismatch),
        #[prost(message, tag = "2")]
        ServerFault(super::ProtoServerFault),
    }
}
// ------- Registry --------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRegisterReq {
    #[prost(string, tag = "1")]
    pub address: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoClusterSettings {
    #[prost(uint32, tag = "1")]
    pub min_cluster_size: u32,
    #[prost(uint64, tag = "2")]
    pub heartbeat_interval_ms: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRegistryHeartbeatReq {
    #[prost(string, tag = "1")]
    pub address: ::prost::alloc::string::String,
}
/// Empty
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoEmpty {}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoIdleNode {
    #[prost(string, tag = "1")]
    pub address: ::prost::alloc::string::String,
}
#[doc = r" Generated client implementations."]
pub mod grpc_peer_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = " Node <-> node RPCs. Also used by the registry to promote a node (Lead)."]
    pub struct GrpcPeerClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcPeerClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcPeerClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        #[doc = " Registry -> node. Become leader of the provided follower addresses."]
        pub async fn lead(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoLeadReq>,
        ) -> Result<tonic::Response<super::ProtoAck>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/Lead");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Leader -> node. Follow the caller. The reply carries the follower's latest version."]
        pub async fn follow_me(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoFollowMeReq>,
        ) -> Result<tonic::Response<super::ProtoFollowMeResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/FollowMe");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Leader -> followers. Membership fan-out."]
        pub async fn add_follower(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoFollowerEntry>,
        ) -> Result<tonic::Response<super::ProtoAck>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/AddFollower");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn remove_follower(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoFollowerEntry>,
        ) -> Result<tonic::Response<super::ProtoAck>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/RemoveFollower");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Follower -> election candidate (or leader). Nomination / join request."]
        pub async fn follow(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoFollowReq>,
        ) -> Result<tonic::Response<super::ProtoAck>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/Follow");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Node -> node liveness probe."]
        pub async fn heartbeat(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoHeartbeatReq>,
        ) -> Result<tonic::Response<super::ProtoAck>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/Heartbeat");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Leader -> follower write replication."]
        pub async fn confirm_write(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoConfirmWriteReq>,
        ) -> Result<tonic::Response<super::ProtoConfirmWriteResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/ConfirmWrite");
            self.inner.unary(request.into_request(), path, codec).await
        }
        #[doc = " Node -> node gap repair."]
        pub async fn get_missing_versions(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoMissingVersionsReq>,
        ) -> Result<tonic::Response<super::ProtoMissingVersionsResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcPeer/GetMissingVersions");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcPeerClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcPeerClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcPeerClient {{ ... }}")
        }
    }
}
#[doc = r" Generated client implementations."]
pub mod grpc_cluster_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = " Client library -> node."]
    pub struct GrpcClusterClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcClusterClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcClusterClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        pub async fn write_to_cluster(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoWriteReq>,
        ) -> Result<tonic::Response<super::ProtoWriteResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcCluster/WriteToCluster");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn read_from_cluster(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoReadReq>,
        ) -> Result<tonic::Response<super::ProtoReadResult>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcCluster/ReadFromCluster");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcClusterClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcClusterClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcClusterClient {{ ... }}")
        }
    }
}
#[doc = r" Generated client implementations."]
pub mod grpc_registry_client {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = " Node -> cluster-assignment registry. We only ever act as a client of this service."]
    pub struct GrpcRegistryClient<T> {
        inner: tonic::client::Grpc<T>,
    }
    impl GrpcRegistryClient<tonic::transport::Channel> {
        #[doc = r" Attempt to create a new client by connecting to a given endpoint."]
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: std::convert::TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }
    impl<T> GrpcRegistryClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::ResponseBody: Body + HttpBody + Send + 'static,
        T::Error: Into<StdError>,
        <T::ResponseBody as HttpBody>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = tonic::client::Grpc::with_interceptor(inner, interceptor);
            Self { inner }
        }
        pub async fn register(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoRegisterReq>,
        ) -> Result<tonic::Response<super::ProtoClusterSettings>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcRegistry/Register");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn heartbeat(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoRegistryHeartbeatReq>,
        ) -> Result<tonic::Response<super::ProtoEmpty>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/cluster.GrpcRegistry/Heartbeat");
            self.inner.unary(request.into_request(), path, codec).await
        }
        pub async fn request_idle_node(
            &mut self,
            request: impl tonic::IntoRequest<super::ProtoEmpty>,
        ) -> Result<tonic::Response<super::ProtoIdleNode>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path =
                http::uri::PathAndQuery::from_static("/cluster.GrpcRegistry/RequestIdleNode");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
    impl<T: Clone> Clone for GrpcRegistryClient<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }
    impl<T> std::fmt::Debug for GrpcRegistryClient<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "GrpcRegistryClient {{ ... }}")
        }
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_peer_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcPeerServer."]
    #[async_trait]
    pub trait GrpcPeer: Send + Sync + 'static {
        #[doc = " Registry -> node. Become leader of the provided follower addresses."]
        async fn lead(
            &self,
            request: tonic::Request<super::ProtoLeadReq>,
        ) -> Result<tonic::Response<super::ProtoAck>, tonic::Status>;
        #[doc = " Leader -> node. Follow the caller. The reply carries the follower's latest version."]
        async fn follow_me(
            &self,
            request: tonic::Request<super::ProtoFollowMeReq>,
        ) -> Result<tonic::Response<super::ProtoFollowMeResult>, tonic::Status>;
        #[doc = " Leader -> followers. Membership fan-out."]
        async fn add_follower(
            &self,
            request: tonic::Request<super::ProtoFollowerEntry>,
        ) -> Result<tonic::Response<super::ProtoAck>, tonic::Status>;
        async fn remove_follower(
            &self,
            request: tonic::Request<super::ProtoFollowerEntry>,
        ) -> Result<tonic::Response<super::ProtoAck>, tonic::Status>;
        #[doc = " Follower -> election candidate (or leader). Nomination / join request."]
        async fn follow(
            &self,
            request: tonic::Request<super::ProtoFollowReq>,
        ) -> Result<tonic::Response<super::ProtoAck>, tonic::Status>;
        #[doc = " Node -> node liveness probe."]
        async fn heartbeat(
            &self,
            request: tonic::Request<super::ProtoHeartbeatReq>,
        ) -> Result<tonic::Response<super::ProtoAck>, tonic::Status>;
        #[doc = " Leader -> follower write replication."]
        async fn confirm_write(
            &self,
            request: tonic::Request<super::ProtoConfirmWriteReq>,
        ) -> Result<tonic::Response<super::ProtoConfirmWriteResult>, tonic::Status>;
        #[doc = " Node -> node gap repair."]
        async fn get_missing_versions(
            &self,
            request: tonic::Request<super::ProtoMissingVersionsReq>,
        ) -> Result<tonic::Response<super::ProtoMissingVersionsResult>, tonic::Status>;
    }
    #[doc = " Node <-> node RPCs. Also used by the registry to promote a node (Lead)."]
    #[derive(Debug)]
    pub struct GrpcPeerServer<T: GrpcPeer> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcPeer> GrpcPeerServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcPeerServer<T>
    where
        T: GrpcPeer,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/cluster.GrpcPeer/Lead" => {
                    #[allow(non_camel_case_types)]
                    struct LeadSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoLeadReq> for LeadSvc<T> {
                        type Response = super::ProtoAck;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoLeadReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).lead(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = LeadSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/FollowMe" => {
                    #[allow(non_camel_case_types)]
                    struct FollowMeSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoFollowMeReq> for FollowMeSvc<T> {
                        type Response = super::ProtoFollowMeResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoFollowMeReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).follow_me(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = FollowMeSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/AddFollower" => {
                    #[allow(non_camel_case_types)]
                    struct AddFollowerSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoFollowerEntry> for AddFollowerSvc<T> {
                        type Response = super::ProtoAck;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoFollowerEntry>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).add_follower(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = AddFollowerSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/RemoveFollower" => {
                    #[allow(non_camel_case_types)]
                    struct RemoveFollowerSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoFollowerEntry> for RemoveFollowerSvc<T> {
                        type Response = super::ProtoAck;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoFollowerEntry>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).remove_follower(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = RemoveFollowerSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/Follow" => {
                    #[allow(non_camel_case_types)]
                    struct FollowSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoFollowReq> for FollowSvc<T> {
                        type Response = super::ProtoAck;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoFollowReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).follow(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = FollowSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/Heartbeat" => {
                    #[allow(non_camel_case_types)]
                    struct HeartbeatSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoHeartbeatReq> for HeartbeatSvc<T> {
                        type Response = super::ProtoAck;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoHeartbeatReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).heartbeat(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = HeartbeatSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/ConfirmWrite" => {
                    #[allow(non_camel_case_types)]
                    struct ConfirmWriteSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoConfirmWriteReq> for ConfirmWriteSvc<T> {
                        type Response = super::ProtoConfirmWriteResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoConfirmWriteReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).confirm_write(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = ConfirmWriteSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcPeer/GetMissingVersions" => {
                    #[allow(non_camel_case_types)]
                    struct GetMissingVersionsSvc<T: GrpcPeer>(pub Arc<T>);
                    impl<T: GrpcPeer> tonic::server::UnaryService<super::ProtoMissingVersionsReq>
                        for GetMissingVersionsSvc<T>
                    {
                        type Response = super::ProtoMissingVersionsResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoMissingVersionsReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).get_missing_versions(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = GetMissingVersionsSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcPeer> Clone for GrpcPeerServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcPeer> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcPeer> tonic::transport::NamedService for GrpcPeerServer<T> {
        const NAME: &'static str = "cluster.GrpcPeer";
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_cluster_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcClusterServer."]
    #[async_trait]
    pub trait GrpcCluster: Send + Sync + 'static {
        async fn write_to_cluster(
            &self,
            request: tonic::Request<super::ProtoWriteReq>,
        ) -> Result<tonic::Response<super::ProtoWriteResult>, tonic::Status>;
        async fn read_from_cluster(
            &self,
            request: tonic::Request<super::ProtoReadReq>,
        ) -> Result<tonic::Response<super::ProtoReadResult>, tonic::Status>;
    }
    #[doc = " Client library -> node."]
    #[derive(Debug)]
    pub struct GrpcClusterServer<T: GrpcCluster> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcCluster> GrpcClusterServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcClusterServer<T>
    where
        T: GrpcCluster,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/cluster.GrpcCluster/WriteToCluster" => {
                    #[allow(non_camel_case_types)]
                    struct WriteToClusterSvc<T: GrpcCluster>(pub Arc<T>);
                    impl<T: GrpcCluster> tonic::server::UnaryService<super::ProtoWriteReq> for WriteToClusterSvc<T> {
                        type Response = super::ProtoWriteResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoWriteReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).write_to_cluster(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = WriteToClusterSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcCluster/ReadFromCluster" => {
                    #[allow(non_camel_case_types)]
                    struct ReadFromClusterSvc<T: GrpcCluster>(pub Arc<T>);
                    impl<T: GrpcCluster> tonic::server::UnaryService<super::ProtoReadReq> for ReadFromClusterSvc<T> {
                        type Response = super::ProtoReadResult;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoReadReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).read_from_cluster(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = ReadFromClusterSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcCluster> Clone for GrpcClusterServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcCluster> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcCluster> tonic::transport::NamedService for GrpcClusterServer<T> {
        const NAME: &'static str = "cluster.GrpcCluster";
    }
}
#[doc = r" Generated server implementations."]
pub mod grpc_registry_server {
    #![allow(unused_variables, dead_code, missing_docs)]
    use tonic::codegen::*;
    #[doc = "Generated trait containing gRPC methods that should be implemented for use with GrpcRegistryServer."]
    #[async_trait]
    pub trait GrpcRegistry: Send + Sync + 'static {
        async fn register(
            &self,
            request: tonic::Request<super::ProtoRegisterReq>,
        ) -> Result<tonic::Response<super::ProtoClusterSettings>, tonic::Status>;
        async fn heartbeat(
            &self,
            request: tonic::Request<super::ProtoRegistryHeartbeatReq>,
        ) -> Result<tonic::Response<super::ProtoEmpty>, tonic::Status>;
        async fn request_idle_node(
            &self,
            request: tonic::Request<super::ProtoEmpty>,
        ) -> Result<tonic::Response<super::ProtoIdleNode>, tonic::Status>;
    }
    #[doc = " Node -> cluster-assignment registry. We only ever act as a client of this service."]
    #[derive(Debug)]
    pub struct GrpcRegistryServer<T: GrpcRegistry> {
        inner: _Inner<T>,
    }
    struct _Inner<T>(Arc<T>, Option<tonic::Interceptor>);
    impl<T: GrpcRegistry> GrpcRegistryServer<T> {
        pub fn new(inner: T) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, None);
            Self { inner }
        }
        pub fn with_interceptor(inner: T, interceptor: impl Into<tonic::Interceptor>) -> Self {
            let inner = Arc::new(inner);
            let inner = _Inner(inner, Some(interceptor.into()));
            Self { inner }
        }
    }
    impl<T, B> Service<http::Request<B>> for GrpcRegistryServer<T>
    where
        T: GrpcRegistry,
        B: HttpBody + Send + Sync + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = Never;
        type Future = BoxFuture<Self::Response, Self::Error>;
        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/cluster.GrpcRegistry/Register" => {
                    #[allow(non_camel_case_types)]
                    struct RegisterSvc<T: GrpcRegistry>(pub Arc<T>);
                    impl<T: GrpcRegistry> tonic::server::UnaryService<super::ProtoRegisterReq> for RegisterSvc<T> {
                        type Response = super::ProtoClusterSettings;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoRegisterReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).register(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = RegisterSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcRegistry/Heartbeat" => {
                    #[allow(non_camel_case_types)]
                    struct HeartbeatSvc<T: GrpcRegistry>(pub Arc<T>);
                    impl<T: GrpcRegistry>
                        tonic::server::UnaryService<super::ProtoRegistryHeartbeatReq>
                        for HeartbeatSvc<T>
                    {
                        type Response = super::ProtoEmpty;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoRegistryHeartbeatReq>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).heartbeat(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = HeartbeatSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                "/cluster.GrpcRegistry/RequestIdleNode" => {
                    #[allow(non_camel_case_types)]
                    struct RequestIdleNodeSvc<T: GrpcRegistry>(pub Arc<T>);
                    impl<T: GrpcRegistry> tonic::server::UnaryService<super::ProtoEmpty> for RequestIdleNodeSvc<T> {
                        type Response = super::ProtoIdleNode;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ProtoEmpty>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            let fut = async move { (*inner).request_idle_node(request).await };
                            Box::pin(fut)
                        }
                    }
                    let inner = self.inner.clone();
                    let fut = async move {
                        let interceptor = inner.1.clone();
                        let inner = inner.0;
                        let method = RequestIdleNodeSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = if let Some(interceptor) = interceptor {
                            tonic::server::Grpc::with_interceptor(codec, interceptor)
                        } else {
                            tonic::server::Grpc::new(codec)
                        };
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    };
                    Box::pin(fut)
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::BoxBody::empty())
                        .unwrap())
                }),
            }
        }
    }
    impl<T: GrpcRegistry> Clone for GrpcRegistryServer<T> {
        fn clone(&self) -> Self {
            let inner = self.inner.clone();
            Self { inner }
        }
    }
    impl<T: GrpcRegistry> Clone for _Inner<T> {
        fn clone(&self) -> Self {
            Self(self.0.clone(), self.1.clone())
        }
    }
    impl<T: std::fmt::Debug> std::fmt::Debug for _Inner<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }
    impl<T: GrpcRegistry> tonic::transport::NamedService for GrpcRegistryServer<T> {
        const NAME: &'static str = "cluster.GrpcRegistry";
    }
}
