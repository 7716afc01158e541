use crate::commitlog::storage::{ClusterData, DataFile, FileData, StorageError};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Version is the leader-assigned position of a write in a topic's log. The first write of a topic
/// is version 1; there is never a version 0.
#[derive(Copy, Clone, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct Version(u64);

impl Version {
    pub fn new(version: u64) -> Option<Self> {
        match version {
            0 => None,
            v => Some(Version(v)),
        }
    }

    pub fn first() -> Self {
        Version(1)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Version(self.0.saturating_add(1))
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LogEntry {
    pub(crate) topic: String,
    pub(crate) version: Version,
    pub(crate) payload: Bytes,
}

/// The longest run of versions starting at 1 with no holes.
#[derive(Debug, PartialEq)]
pub(crate) struct ConfirmedPrefix {
    pub(crate) payloads: Vec<Bytes>,
    /// False when the log holds versions past the first gap.
    pub(crate) complete: bool,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum AppendError {
    #[error("Node serves topic '{served}', refusing write for topic '{requested}'")]
    TopicMismatch { served: String, requested: String },
    #[error("Failed to persist log entry: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, thiserror::Error)]
#[error("Node serves topic '{served}', not '{requested}'")]
pub(crate) struct TopicMismatch {
    pub(crate) served: String,
    pub(crate) requested: String,
}

/// ReplicatedLog is this node's copy of its topic's writes, keyed by version and persisted to a
/// single data file. A node holds exactly one topic; the topic is fixed by the first append.
pub(crate) struct ReplicatedLog {
    logger: slog::Logger,
    storage: DataFile,
    state: RwLock<LogState>,
}

struct LogState {
    topic: Option<String>,
    entries: BTreeMap<Version, Bytes>,
}

impl ReplicatedLog {
    pub(crate) fn open(logger: slog::Logger, directory: &Path) -> Result<Self, StorageError> {
        let (storage, existing) = DataFile::mount(directory)?;

        let mut state = LogState {
            topic: None,
            entries: BTreeMap::new(),
        };
        if let Some(cluster_data) = existing {
            if !cluster_data.topic.is_empty() {
                state.topic = Some(cluster_data.topic);
            }
            for file_data in cluster_data.dataset {
                // Zero versions are rejected by `mount()`.
                if let Some(version) = Version::new(file_data.version) {
                    state.entries.insert(version, Bytes::from(file_data.data));
                }
            }
        }

        slog::info!(
            logger,
            "Opened replicated log at {:?} with {} entries for topic {:?}",
            storage.path(),
            state.entries.len(),
            state.topic
        );

        Ok(ReplicatedLog {
            logger,
            storage,
            state: RwLock::new(state),
        })
    }

    /// Store `entry` and rewrite the data file before returning. An existing entry at the same
    /// version is replaced. On persistence failure the in-memory log is left unchanged.
    pub(crate) fn append(&self, entry: LogEntry) -> Result<(), AppendError> {
        let mut state = self.state.write();

        if let Some(served) = &state.topic {
            if served != &entry.topic {
                return Err(AppendError::TopicMismatch {
                    served: served.clone(),
                    requested: entry.topic,
                });
            }
        }
        let first_write = state.topic.is_none();
        if first_write {
            state.topic = Some(entry.topic.clone());
        }
        let previous_payload = state.entries.insert(entry.version, entry.payload);

        if let Err(e) = self.storage.write(&state.to_cluster_data()) {
            slog::error!(self.logger, "Failed to persist version {}: {}", entry.version, e);
            match previous_payload {
                Some(payload) => {
                    state.entries.insert(entry.version, payload);
                }
                None => {
                    state.entries.remove(&entry.version);
                }
            }
            if first_write {
                state.topic = None;
            }
            return Err(AppendError::Storage(e));
        }

        slog::debug!(self.logger, "Appended version {}", entry.version);
        Ok(())
    }

    /// Errors if this node already serves a different topic. A node with no writes yet accepts any topic.
    pub(crate) fn check_topic(&self, topic: &str) -> Result<(), TopicMismatch> {
        match &self.state.read().topic {
            Some(served) if served != topic => Err(TopicMismatch {
                served: served.clone(),
                requested: topic.to_string(),
            }),
            _ => Ok(()),
        }
    }

    #[cfg(test)]
    pub(crate) fn topic(&self) -> Option<String> {
        self.state.read().topic.clone()
    }

    pub(crate) fn latest_version(&self) -> Option<Version> {
        self.state.read().entries.keys().next_back().copied()
    }

    pub(crate) fn confirmed_prefix(&self) -> ConfirmedPrefix {
        let state = self.state.read();

        let mut payloads = Vec::with_capacity(state.entries.len());
        let mut expected = Version::first();
        for (version, payload) in state.entries.iter() {
            if *version != expected {
                break;
            }
            payloads.push(payload.clone());
            expected = expected.next();
        }

        ConfirmedPrefix {
            complete: payloads.len() == state.entries.len(),
            payloads,
        }
    }

    /// Versions in `[1, up_to]` this node does not hold.
    pub(crate) fn missing_up_to(&self, up_to: Version) -> Vec<Version> {
        let state = self.state.read();

        (1..=up_to.as_u64())
            .filter_map(Version::new)
            .filter(|version| !state.entries.contains_key(version))
            .collect()
    }

    /// The entries this node holds among `versions`. Unknown versions are skipped.
    pub(crate) fn entries_for(&self, versions: &[Version]) -> Vec<LogEntry> {
        let state = self.state.read();
        let topic = match &state.topic {
            Some(topic) => topic.clone(),
            None => return Vec::new(),
        };

        versions
            .iter()
            .filter_map(|version| {
                state.entries.get(version).map(|payload| LogEntry {
                    topic: topic.clone(),
                    version: *version,
                    payload: payload.clone(),
                })
            })
            .collect()
    }
}

impl LogState {
    fn to_cluster_data(&self) -> ClusterData {
        ClusterData {
            topic: self.topic.clone().unwrap_or_default(),
            dataset: self
                .entries
                .iter()
                .map(|(version, payload)| FileData {
                    version: version.as_u64(),
                    data: payload.to_vec(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slog::Drain;

    fn test_logger() -> slog::Logger {
        let decorator = slog_term::PlainSyncDecorator::new(std::io::stdout());
        let drain = slog_term::FullFormat::new(decorator).build().fuse();
        slog::Logger::root(drain, slog::o!())
    }

    fn entry(topic: &str, version: u64, payload: &'static str) -> LogEntry {
        LogEntry {
            topic: topic.to_string(),
            version: Version::new(version).unwrap(),
            payload: Bytes::from(payload),
        }
    }

    #[test]
    fn out_of_order_appends_form_full_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReplicatedLog::open(test_logger(), dir.path()).unwrap();

        log.append(entry("gps", 1, "a")).unwrap();
        log.append(entry("gps", 3, "c")).unwrap();
        log.append(entry("gps", 2, "b")).unwrap();

        let prefix = log.confirmed_prefix();
        assert!(prefix.complete);
        assert_eq!(
            prefix.payloads,
            vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]
        );
        assert_eq!(log.latest_version(), Version::new(3));
    }

    #[test]
    fn gap_stops_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReplicatedLog::open(test_logger(), dir.path()).unwrap();

        log.append(entry("gps", 1, "a")).unwrap();
        log.append(entry("gps", 3, "c")).unwrap();

        let prefix = log.confirmed_prefix();
        assert!(!prefix.complete);
        assert_eq!(prefix.payloads, vec![Bytes::from("a")]);
        assert_eq!(log.missing_up_to(Version::new(3).unwrap()), vec![Version::new(2).unwrap()]);
    }

    #[test]
    fn reading_twice_returns_same_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReplicatedLog::open(test_logger(), dir.path()).unwrap();
        log.append(entry("gps", 1, "a")).unwrap();

        assert_eq!(log.confirmed_prefix(), log.confirmed_prefix());
    }

    #[test]
    fn topic_is_fixed_by_first_append() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReplicatedLog::open(test_logger(), dir.path()).unwrap();
        assert!(log.check_topic("anything").is_ok());

        log.append(entry("gps", 1, "a")).unwrap();

        match log.append(entry("weather", 2, "b")) {
            Err(AppendError::TopicMismatch { served, requested }) => {
                assert_eq!(served, "gps");
                assert_eq!(requested, "weather");
            }
            other => panic!("Expected topic mismatch, got {:?}", other),
        }
        assert!(log.check_topic("weather").is_err());
        assert_eq!(log.latest_version(), Version::new(1));
    }

    #[test]
    fn duplicate_version_replaces_payload() {
        let dir = tempfile::tempdir().unwrap();
        let log = ReplicatedLog::open(test_logger(), dir.path()).unwrap();

        log.append(entry("gps", 1, "old")).unwrap();
        log.append(entry("gps", 1, "new")).unwrap();

        assert_eq!(log.confirmed_prefix().payloads, vec![Bytes::from("new")]);
    }

    #[test]
    fn reopen_restores_entries() {
        let dir = tempfile::tempdir().unwrap();
        {
            let log = ReplicatedLog::open(test_logger(), dir.path()).unwrap();
            log.append(entry("gps", 1, "a")).unwrap();
            log.append(entry("gps", 2, "b")).unwrap();
        }

        let log = ReplicatedLog::open(test_logger(), dir.path()).unwrap();

        assert_eq!(log.topic(), Some("gps".to_string()));
        assert_eq!(log.latest_version(), Version::new(2));
        assert_eq!(
            log.entries_for(&[Version::new(2).unwrap(), Version::new(7).unwrap()]),
            vec![entry("gps", 2, "b")]
        );
    }
}
