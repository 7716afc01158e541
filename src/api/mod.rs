//! This mod holds the library's client-facing API.
mod client;
mod event_bus;
mod options;
mod replicated_log;
mod types;
mod wiring;

pub use client::ClusterNode;
pub use event_bus::Event;
pub use event_bus::EventListener;
pub use event_bus::FollowerEventData;
pub use event_bus::RoleEvent;
pub use options::ClusterOptions;
pub use replicated_log::ReadTopicError;
pub use replicated_log::ReadTopicInput;
pub use replicated_log::ReadTopicOutput;
pub use replicated_log::TopicLog;
pub use replicated_log::WriteToTopicError;
pub use replicated_log::WriteToTopicInput;
pub use replicated_log::WriteToTopicOutput;
pub use types::ClusterMember;
pub use wiring::try_create_cluster_node;
pub use wiring::ClusterNodeConfig;
pub use wiring::ClusterNodeCreationError;
