use crate::api::client::ClusterNode;
use crate::api::event_bus::EventListener;
use crate::api::options::ClusterOptionsValidated;
use crate::api::replicated_log::TopicLog;
use crate::commitlog::ReplicatedLog;
use crate::node::{self, GrpcPeerConnector, Node, NodeContextConfig, Timings};
use crate::registry::{ClusterSettings, Registry, RegistryError};
use crate::server::{self, RpcServer};
use crate::ClusterOptions;
use std::convert::TryFrom;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ClusterNodeConfig {
    /// Where the RPC server binds.
    pub listen_addr: SocketAddr,
    /// How peers, the registry and clients reach this node. Usually `listen_addr` unless behind NAT.
    pub advertise_address: String,
    // A directory where we can create the node's data file.
    pub data_directory: PathBuf,
    pub info_logger: slog::Logger,
    pub options: ClusterOptions,
    pub registry: Arc<dyn Registry>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClusterNodeCreationError {
    #[error("Illegal options for configuring node: {0}")]
    IllegalClientOptions(String),
    #[error("Data file initialization failure")]
    LogInitialization(io::Error),
    #[error("Failed to bind RPC server to {addr}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("Failed to register with the registry")]
    Registration(RegistryError),
}

/// Mounts the data file, starts serving peers and clients, then registers with the registry. The
/// node starts out as a follower with no leader until the registry tells it to `Lead` or a leader
/// sends it `FollowMe`.
pub async fn try_create_cluster_node(config: ClusterNodeConfig) -> Result<ClusterNode, ClusterNodeCreationError> {
    let root_logger = config
        .info_logger
        .new(slog::o!("Node" => config.advertise_address.clone()));

    let listen_addr = config.listen_addr;
    let options = ClusterOptionsValidated::try_from(config.options)
        .map_err(|e| ClusterNodeCreationError::IllegalClientOptions(e.to_string()))?;

    let log = ReplicatedLog::open(root_logger.clone(), &config.data_directory)
        .map_err(|e| ClusterNodeCreationError::LogInitialization(e.into()))?;

    // Bound here, before registering, so the registry and peers never race the server task.
    let listener = TcpListener::bind(listen_addr)
        .await
        .map_err(|source| ClusterNodeCreationError::Bind {
            addr: listen_addr,
            source,
        })?;

    let (node_shutdown, shutdown_check) = node::stop_signal();
    let (node, peer_lost_stream) = Node::new(NodeContextConfig {
        logger: root_logger.clone(),
        self_address: config.advertise_address.clone(),
        timings: Timings::from(options),
        log,
        connector: Arc::new(GrpcPeerConnector::new(root_logger.clone())),
        registry: config.registry.clone(),
        shutdown: shutdown_check,
    });

    let (server_shutdown, server_shutdown_signal) = server::shutdown_signal();
    let rpc_server = RpcServer::new(root_logger.clone(), node.clone());
    tokio::spawn(rpc_server.run(listener, server_shutdown_signal));

    let settings = config
        .registry
        .register(&config.advertise_address)
        .await
        .and_then(ClusterSettings::validate)
        .map_err(ClusterNodeCreationError::Registration)?;
    node.context().apply_settings(settings);
    node.start_background_tasks(peer_lost_stream);

    Ok(ClusterNode {
        topic_log: TopicLog::new(node.clone()),
        event_listener: EventListener::new(node.context().role_listener()),
        node,
        server_shutdown,
        node_shutdown,
    })
}
