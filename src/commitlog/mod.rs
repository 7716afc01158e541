mod log;
mod storage;

pub(crate) use self::log::AppendError;
pub(crate) use self::log::LogEntry;
pub(crate) use self::log::ReplicatedLog;
pub(crate) use self::log::TopicMismatch;
pub use self::log::Version;
pub(crate) use storage::StorageError;
