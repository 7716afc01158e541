use crate::node::{RoleChangeListener, RoleSnapshot};

/// An event that happened, as observed by the local node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// The node changed role. Like the role channel underneath, intermediate events are clobbered
    /// into the most recent one if the application falls behind.
    Role(RoleEvent),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoleEvent {
    Leader,
    Follower(FollowerEventData),
    FollowerNoLeader,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FollowerEventData {
    pub leader_address: String,
}

pub struct EventListener {
    role_change_listener: RoleChangeListener,
}

impl EventListener {
    pub(crate) fn new(role_change_listener: RoleChangeListener) -> Self {
        EventListener { role_change_listener }
    }

    /// `next_event()` returns the next event that this node observes. `None` once the node is gone.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.role_change_listener
            .next()
            .await
            .map(|role| Event::Role(RoleEvent::from(role)))
    }

    pub fn current_role(&self) -> RoleEvent {
        RoleEvent::from(self.role_change_listener.current())
    }
}

// ------- Conversions --------

impl From<RoleSnapshot> for RoleEvent {
    fn from(role: RoleSnapshot) -> Self {
        match role {
            RoleSnapshot::Leader => RoleEvent::Leader,
            RoleSnapshot::Follower(leader_address) => RoleEvent::Follower(FollowerEventData { leader_address }),
            RoleSnapshot::FollowerNoLeader => RoleEvent::FollowerNoLeader,
        }
    }
}
