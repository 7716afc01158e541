use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const DATA_FILE_NAME: &str = "data.json";
const TMP_FILE_NAME: &str = "data.json.tmp";

// On-disk layout. The whole dataset is rewritten on every append; there is no incremental format.
//
// {
//   "topic": "gps",
//   "dataset": [
//     { "version": 1, "data": [...] },
//     ...
//   ]
// }
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct ClusterData {
    pub(super) topic: String,
    pub(super) dataset: Vec<FileData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct FileData {
    pub(super) version: u64,
    pub(super) data: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum StorageError {
    #[error("IO failure on data file {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Data file {path:?} is not valid cluster data: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Data file {path:?} contains version 0, versions start at 1")]
    ZeroVersion { path: PathBuf },
}

impl From<StorageError> for io::Error {
    fn from(e: StorageError) -> Self {
        let kind = match &e {
            StorageError::Io { source, .. } => source.kind(),
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, e)
    }
}

/// DataFile is the single JSON file a node persists its topic dataset to.
pub(super) struct DataFile {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl DataFile {
    /// Creates the data file if this is the first time the node runs in `directory`, otherwise
    /// loads what a previous run left behind.
    pub(super) fn mount(directory: &Path) -> Result<(Self, Option<ClusterData>), StorageError> {
        let data_file = DataFile {
            path: directory.join(DATA_FILE_NAME),
            tmp_path: directory.join(TMP_FILE_NAME),
        };

        if !data_file.path.exists() {
            fs::File::create(&data_file.path).map_err(|e| data_file.io_err(e))?;
            return Ok((data_file, None));
        }

        let contents = fs::read(&data_file.path).map_err(|e| data_file.io_err(e))?;
        if contents.is_empty() {
            return Ok((data_file, None));
        }

        let cluster_data: ClusterData = serde_json::from_slice(&contents).map_err(|e| StorageError::Corrupt {
            path: data_file.path.clone(),
            source: e,
        })?;
        if cluster_data.dataset.iter().any(|file_data| file_data.version == 0) {
            return Err(StorageError::ZeroVersion {
                path: data_file.path.clone(),
            });
        }

        Ok((data_file, Some(cluster_data)))
    }

    /// Replace the file contents. Write-then-rename so a crash mid-write never leaves a torn file.
    pub(super) fn write(&self, cluster_data: &ClusterData) -> Result<(), StorageError> {
        let contents = serde_json::to_vec_pretty(cluster_data).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;

        fs::write(&self.tmp_path, contents).map_err(|e| self.io_err(e))?;
        fs::rename(&self.tmp_path, &self.path).map_err(|e| self.io_err(e))
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();

        let (data_file, existing) = DataFile::mount(dir.path()).unwrap();

        assert!(existing.is_none());
        assert!(data_file.path().exists());
    }

    #[test]
    fn mount_reads_previous_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let (data_file, _) = DataFile::mount(dir.path()).unwrap();
        data_file
            .write(&ClusterData {
                topic: "gps".into(),
                dataset: vec![FileData {
                    version: 1,
                    data: b"49.26,-123.25".to_vec(),
                }],
            })
            .unwrap();

        let (_, existing) = DataFile::mount(dir.path()).unwrap();
        let existing = existing.expect("Expected dataset from previous run");

        assert_eq!(existing.topic, "gps");
        assert_eq!(existing.dataset.len(), 1);
        assert_eq!(existing.dataset[0].version, 1);
    }

    #[test]
    fn mount_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DATA_FILE_NAME), b"not json").unwrap();

        match DataFile::mount(dir.path()) {
            Err(StorageError::Corrupt { .. }) => {}
            other => panic!("Expected corrupt data file error, got {:?}", other.map(|_| ())),
        }
    }
}
