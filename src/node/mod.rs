mod context;
mod election;
mod events;
mod heartbeat;
mod membership;
mod node;
mod node_api;
mod peer_client;
mod peers;
mod replication;
mod role;
#[cfg(test)]
mod test_utils;
mod timers;

pub(crate) use context::NodeContextConfig;
pub(crate) use context::Timings;
pub(crate) use node::Node;
pub(crate) use node_api::ConfirmWriteError;
pub(crate) use node_api::FollowMeError;
pub(crate) use node_api::FollowMeInput;
pub(crate) use node_api::FollowMeOutput;
pub(crate) use node_api::FollowerEntry;
pub(crate) use node_api::FollowerId;
pub(crate) use node_api::HeartbeatError;
pub(crate) use node_api::MembershipError;
pub(crate) use node_api::ReadError;
pub(crate) use node_api::ReadInput;
pub(crate) use node_api::ReadOutput;
pub(crate) use node_api::WriteError;
pub(crate) use node_api::WriteInput;
pub(crate) use node_api::WriteOutput;
pub(crate) use peer_client::GrpcPeerConnector;
pub(crate) use role::RoleChangeListener;
pub(crate) use role::RoleSnapshot;
pub(crate) use timers::stop_signal;
pub(crate) use timers::Stopper;
