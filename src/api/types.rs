use crate::node::FollowerEntry;

/// A follower as the leader sees it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClusterMember {
    pub address: String,
    /// Assigned by the leader on join. The lowest surviving ID takes over if the leader dies.
    pub follower_id: u64,
}

impl From<FollowerEntry> for ClusterMember {
    fn from(entry: FollowerEntry) -> Self {
        ClusterMember {
            address: entry.address,
            follower_id: entry.id.as_u64(),
        }
    }
}
