mod api;
mod commitlog;
mod node;
mod registry;
mod server;
mod grpc {
    include!("../generated/cluster.rs");
}

pub use api::try_create_cluster_node;
pub use api::ClusterMember;
pub use api::ClusterNode;
pub use api::ClusterNodeConfig;
pub use api::ClusterNodeCreationError;
pub use api::ClusterOptions;
pub use api::Event;
pub use api::EventListener;
pub use api::FollowerEventData;
pub use api::ReadTopicError;
pub use api::ReadTopicInput;
pub use api::ReadTopicOutput;
pub use api::RoleEvent;
pub use api::TopicLog;
pub use api::WriteToTopicError;
pub use api::WriteToTopicInput;
pub use api::WriteToTopicOutput;
pub use commitlog::Version;
pub use registry::ClusterSettings;
pub use registry::GrpcRegistry;
pub use registry::Registry;
pub use registry::RegistryError;

// `crate::{root_mod}` holds no code, only `mod` and `pub use` statements. No `mod` is `pub`;
// everything public is exported through an individual `pub use`.
