use crate::commitlog::Version;
use crate::node::{self, Node};
use bytes::Bytes;
use std::io;

/// TopicLog is the cluster's replicated topic for an external application to write to and read
/// from through this node.
pub struct TopicLog {
    node: Node,
}

impl TopicLog {
    pub(crate) fn new(node: Node) -> Self {
        TopicLog { node }
    }

    pub async fn write(&self, input: WriteToTopicInput) -> Result<WriteToTopicOutput, WriteToTopicError> {
        let node_input = node::WriteInput {
            topic: input.topic,
            payload: input.payload,
        };

        self.node
            .replication()
            .write(node_input)
            .await
            .map(|o| o.into())
            .map_err(|e| e.into())
    }

    /// Every write this node holds, in version order, up to the first gap it can't repair.
    pub async fn read(&self, input: ReadTopicInput) -> Result<ReadTopicOutput, ReadTopicError> {
        let node_input = node::ReadInput { topic: input.topic };

        self.node
            .replication()
            .read(node_input)
            .await
            .map(|o| o.into())
            .map_err(|e| e.into())
    }
}

#[derive(Debug)]
pub struct WriteToTopicInput {
    pub topic: String,
    pub payload: Bytes,
}

#[derive(Debug)]
pub struct WriteToTopicOutput {
    pub version: Version,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteToTopicError {
    #[error("Only {acks} of {required} required followers confirmed the write")]
    InsufficientReplicas { acks: usize, required: usize },

    #[error("I'm not leader, {leader_address} is")]
    LeaderRedirect { leader_address: String },

    // Can be retried once an election settles.
    #[error("Cluster has no leader right now")]
    NoLeader,

    #[error("Cluster serves topic '{served}', not '{requested}'")]
    TopicMismatch { served: String, requested: String },

    #[error("Failed to persist committed write")]
    LocalIoError(io::Error),
}

#[derive(Debug)]
pub struct ReadTopicInput {
    pub topic: String,
}

#[derive(Debug)]
pub struct ReadTopicOutput {
    pub payloads: Vec<Bytes>,
    /// This node knows of later versions past a gap no peer could fill.
    pub incomplete: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadTopicError {
    #[error("Cluster serves topic '{served}', not '{requested}'")]
    TopicMismatch { served: String, requested: String },
}

// ------- Conversions --------

impl From<node::WriteOutput> for WriteToTopicOutput {
    fn from(internal_output: node::WriteOutput) -> Self {
        WriteToTopicOutput {
            version: internal_output.version,
        }
    }
}

impl From<node::WriteError> for WriteToTopicError {
    fn from(internal_error: node::WriteError) -> Self {
        match internal_error {
            node::WriteError::InsufficientReplicas { acks, required } => {
                WriteToTopicError::InsufficientReplicas { acks, required }
            }
            node::WriteError::NotLeader {
                leader_address: Some(leader_address),
            } => WriteToTopicError::LeaderRedirect { leader_address },
            node::WriteError::NotLeader { leader_address: None } => WriteToTopicError::NoLeader,
            node::WriteError::TopicMismatch(mismatch) => WriteToTopicError::TopicMismatch {
                served: mismatch.served,
                requested: mismatch.requested,
            },
            node::WriteError::LocalIo(e) => WriteToTopicError::LocalIoError(e.into()),
        }
    }
}

impl From<node::ReadOutput> for ReadTopicOutput {
    fn from(internal_output: node::ReadOutput) -> Self {
        ReadTopicOutput {
            payloads: internal_output.payloads,
            incomplete: internal_output.incomplete,
        }
    }
}

impl From<node::ReadError> for ReadTopicError {
    fn from(internal_error: node::ReadError) -> Self {
        match internal_error {
            node::ReadError::TopicMismatch(mismatch) => ReadTopicError::TopicMismatch {
                served: mismatch.served,
                requested: mismatch.requested,
            },
        }
    }
}
