use crate::grpc::grpc_registry_client::GrpcRegistryClient;
use crate::grpc::{ProtoEmpty, ProtoRegisterReq, ProtoRegistryHeartbeatReq};
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;

/// Settings handed out by the registry when a node registers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ClusterSettings {
    /// Followers a leader tries to keep, and how many solicitations a candidate waits for.
    pub min_cluster_size: usize,
    /// Registry liveness pings go out at half this interval.
    pub heartbeat_interval: Duration,
}

impl ClusterSettings {
    /// Registry replies are only trusted once they pass this.
    pub(crate) fn validate(self) -> Result<Self, RegistryError> {
        if self.min_cluster_size == 0 {
            return Err(RegistryError::InvalidSettings("min_cluster_size must be at least 1".into()));
        }
        if self.heartbeat_interval < MIN_HEARTBEAT_INTERVAL {
            return Err(RegistryError::InvalidSettings(format!(
                "heartbeat_interval {:?} is below {:?}",
                self.heartbeat_interval, MIN_HEARTBEAT_INTERVAL
            )));
        }

        Ok(self)
    }
}

const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(10);

impl Default for ClusterSettings {
    fn default() -> Self {
        ClusterSettings {
            min_cluster_size: 2,
            heartbeat_interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid registry address '{0}'")]
    InvalidAddress(String),
    #[error("Failed to connect to registry: {0}")]
    Unreachable(String),
    #[error("Registry call failed: {0}")]
    Transport(String),
    #[error("Registry handed out unusable settings: {0}")]
    InvalidSettings(String),
}

/// Registry is the external service that assigns nodes to clusters. A node registers once on
/// startup, pings it for the rest of its life, and as leader asks it for idle nodes to late-join.
#[async_trait::async_trait]
pub trait Registry: Send + Sync + 'static {
    async fn register(&self, address: &str) -> Result<ClusterSettings, RegistryError>;

    async fn heartbeat(&self, address: &str) -> Result<(), RegistryError>;

    /// `None` when the registry has no idle node to give.
    async fn request_idle_node(&self) -> Result<Option<String>, RegistryError>;
}

pub struct GrpcRegistry {
    logger: slog::Logger,
    client: GrpcRegistryClient<Channel>,
}

impl GrpcRegistry {
    pub async fn connect(logger: slog::Logger, address: &str) -> Result<Self, RegistryError> {
        let url = format!("http://{}", address);
        slog::debug!(logger, "Connecting to registry {} ...", url);

        let endpoint = Endpoint::from_shared(url).map_err(|_| RegistryError::InvalidAddress(address.to_string()))?;
        let channel = endpoint
            .connect()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        Ok(GrpcRegistry {
            logger,
            client: GrpcRegistryClient::new(channel),
        })
    }

    fn convert_status(rpc_status: Status) -> RegistryError {
        RegistryError::Transport(format!("{:?}: {}", rpc_status.code(), rpc_status.message()))
    }
}

#[async_trait::async_trait]
impl Registry for GrpcRegistry {
    async fn register(&self, address: &str) -> Result<ClusterSettings, RegistryError> {
        let rpc_request = ProtoRegisterReq {
            address: address.to_string(),
        };

        slog::debug!(self.logger, "ClientWire - {:?}", rpc_request);
        let rpc_reply = self.client.clone().register(rpc_request).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        let settings = rpc_reply.map_err(Self::convert_status)?.into_inner();
        Ok(ClusterSettings {
            min_cluster_size: settings.min_cluster_size as usize,
            heartbeat_interval: Duration::from_millis(settings.heartbeat_interval_ms),
        })
    }

    async fn heartbeat(&self, address: &str) -> Result<(), RegistryError> {
        self.client
            .clone()
            .heartbeat(ProtoRegistryHeartbeatReq {
                address: address.to_string(),
            })
            .await
            .map_err(Self::convert_status)?;

        Ok(())
    }

    async fn request_idle_node(&self) -> Result<Option<String>, RegistryError> {
        slog::debug!(self.logger, "ClientWire - RequestIdleNode");
        let rpc_reply = self.client.clone().request_idle_node(ProtoEmpty {}).await;
        slog::debug!(self.logger, "ClientWire - {:?}", rpc_reply);

        let idle_node = rpc_reply.map_err(Self::convert_status)?.into_inner();
        if idle_node.address.is_empty() {
            Ok(None)
        } else {
            Ok(Some(idle_node.address))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(ClusterSettings::default().validate().is_ok());
    }

    #[test]
    fn zero_min_cluster_size_is_rejected() {
        let settings = ClusterSettings {
            min_cluster_size: 0,
            ..ClusterSettings::default()
        };

        assert!(matches!(settings.validate(), Err(RegistryError::InvalidSettings(_))));
    }

    #[test]
    fn tiny_heartbeat_interval_is_rejected() {
        for interval in vec![Duration::from_millis(0), Duration::from_millis(9)] {
            let settings = ClusterSettings {
                heartbeat_interval: interval,
                ..ClusterSettings::default()
            };

            assert!(matches!(settings.validate(), Err(RegistryError::InvalidSettings(_))));
        }
    }
}
