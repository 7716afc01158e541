use crate::node::Timings;
use std::convert::TryFrom;
use tokio::time::Duration;

#[derive(Clone, Default)]
pub struct ClusterOptions {
    /// How often each link sends a heartbeat to its peer.
    pub heartbeat_interval: Option<Duration>,
    pub heartbeat_timeout: Option<Duration>,
    /// How long a link waits for its peer's heartbeat before declaring the peer dead.
    pub heartbeat_deadline: Option<Duration>,
    /// How long a candidate waits for followers to solicit it, and how long a nominating follower
    /// waits for the candidate's `FollowMe`.
    pub election_window: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub rpc_timeout: Option<Duration>,
    /// How often a leader checks whether it is short of followers.
    pub membership_check_interval: Option<Duration>,
}

pub(super) struct ClusterOptionsValidated {
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub heartbeat_deadline: Duration,
    pub election_window: Duration,
    pub write_timeout: Duration,
    pub rpc_timeout: Duration,
    pub membership_check_interval: Duration,
}

impl ClusterOptionsValidated {
    fn validate(&self) -> Result<(), &'static str> {
        if self.heartbeat_interval == Duration::from_millis(0) {
            return Err("Heartbeat interval must be non-zero");
        }
        if self.heartbeat_timeout > self.heartbeat_interval {
            return Err("Heartbeat timeout must not exceed the heartbeat interval");
        }
        if self.heartbeat_deadline <= self.heartbeat_interval {
            return Err("Heartbeat deadline must be greater than the heartbeat interval");
        }
        if self.election_window == Duration::from_millis(0) {
            return Err("Election window must be non-zero");
        }
        if self.write_timeout == Duration::from_millis(0) || self.rpc_timeout == Duration::from_millis(0) {
            return Err("RPC timeouts must be non-zero");
        }
        if self.membership_check_interval == Duration::from_millis(0) {
            return Err("Membership check interval must be non-zero");
        }

        Ok(())
    }
}

impl TryFrom<ClusterOptions> for ClusterOptionsValidated {
    type Error = &'static str;

    fn try_from(options: ClusterOptions) -> Result<Self, Self::Error> {
        let values = ClusterOptionsValidated {
            heartbeat_interval: options.heartbeat_interval.unwrap_or(Duration::from_secs(2)),
            heartbeat_timeout: options.heartbeat_timeout.unwrap_or(Duration::from_secs(1)),
            heartbeat_deadline: options.heartbeat_deadline.unwrap_or(Duration::from_secs(4)),
            election_window: options.election_window.unwrap_or(Duration::from_secs(10)),
            write_timeout: options.write_timeout.unwrap_or(Duration::from_secs(10)),
            rpc_timeout: options.rpc_timeout.unwrap_or(Duration::from_secs(2)),
            membership_check_interval: options.membership_check_interval.unwrap_or(Duration::from_secs(5)),
        };

        values.validate()?;
        Ok(values)
    }
}

impl From<ClusterOptionsValidated> for Timings {
    fn from(options: ClusterOptionsValidated) -> Self {
        Timings {
            probe_interval: options.heartbeat_interval,
            probe_timeout: options.heartbeat_timeout,
            heartbeat_deadline: options.heartbeat_deadline,
            election_window: options.election_window,
            write_timeout: options.write_timeout,
            rpc_timeout: options.rpc_timeout,
            membership_check_interval: options.membership_check_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = ClusterOptionsValidated::try_from(ClusterOptions::default()).unwrap();

        assert_eq!(options.heartbeat_interval, Duration::from_secs(2));
        assert_eq!(options.heartbeat_deadline, Duration::from_secs(4));
        assert_eq!(options.election_window, Duration::from_secs(10));
    }

    #[test]
    fn deadline_must_exceed_interval() {
        let result = ClusterOptionsValidated::try_from(ClusterOptions {
            heartbeat_interval: Some(Duration::from_secs(2)),
            heartbeat_deadline: Some(Duration::from_secs(2)),
            ..ClusterOptions::default()
        });

        assert!(result.is_err());
    }

    #[test]
    fn probe_timeout_must_fit_in_interval() {
        let result = ClusterOptionsValidated::try_from(ClusterOptions {
            heartbeat_interval: Some(Duration::from_millis(100)),
            heartbeat_timeout: Some(Duration::from_millis(150)),
            heartbeat_deadline: Some(Duration::from_millis(400)),
            ..ClusterOptions::default()
        });

        assert!(result.is_err());
    }
}
