// # File State Store
//
// JSON-file implementation of StateStore.
//
// Every mutation rewrites the whole file through a temp file and a rename,
// so a crash leaves either the old or the new state on disk. A file that
// does not parse is reported as an error; it is never replaced by empty
// state, which would make every tracked node look unmanaged.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": {
//     "/Common/node1": {
//       "node": { "name": "/Common/node1", "address": "10.0.0.5", ... },
//       "last_refreshed": "2026-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::Error;
use crate::config::{NodeConfig, StateStoreConfig};
use crate::traits::state_store::{StateRecord, StateStore, StateStoreFactory};

/// State file format version
const STATE_FILE_VERSION: &str = "1.0";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct StateFile {
    version: String,
    records: BTreeMap<String, StateRecord>,
}

/// File-backed state store
///
/// # Example
///
/// ```rust,no_run
/// use ltm_core::NodeConfig;
/// use ltm_core::state::FileStateStore;
/// use ltm_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/ltm/state.json").await?;
///
///     let node = NodeConfig::new("/Common/node1", "10.0.0.5");
///     store.set_node("/Common/node1", &node).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    // Held across the disk write so concurrent mutations serialize
    records: Mutex<BTreeMap<String, StateRecord>>,
}

impl FileStateStore {
    /// Open a state file, creating parent directories as needed
    ///
    /// A missing file is empty state.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let records = load(&path).await?;
        tracing::debug!("Loaded {} tracked node(s) from {}", records.len(), path.display());

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    async fn mutate(&self, apply: impl FnOnce(&mut BTreeMap<String, StateRecord>)) -> Result<(), Error> {
        let mut records = self.records.lock().await;
        apply(&mut records);
        save(&self.path, &records).await
    }
}

async fn load(path: &Path) -> Result<BTreeMap<String, StateRecord>, Error> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => {
            return Err(Error::state_store(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            )));
        }
    };

    let state: StateFile = serde_json::from_str(&content).map_err(|e| {
        Error::state_store(format!("State file {} is corrupt: {}", path.display(), e))
    })?;

    if state.version != STATE_FILE_VERSION {
        tracing::warn!(
            "State file version {} (expected {}), loading anyway",
            state.version,
            STATE_FILE_VERSION
        );
    }

    Ok(state.records)
}

async fn save(path: &Path, records: &BTreeMap<String, StateRecord>) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(&StateFile {
        version: STATE_FILE_VERSION.to_string(),
        records: records.clone(),
    })?;

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json).await.map_err(|e| {
        Error::state_store(format!("Failed to write {}: {}", temp_path.display(), e))
    })?;
    fs::rename(&temp_path, path).await.map_err(|e| {
        Error::state_store(format!(
            "Failed to rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        ))
    })?;

    tracing::trace!("State written to {}", path.display());
    Ok(())
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get_record(&self, id: &str) -> Result<Option<StateRecord>, Error> {
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn set_node(&self, id: &str, node: &NodeConfig) -> Result<(), Error> {
        let record = StateRecord::new(node.clone());
        self.mutate(|records| {
            records.insert(id.to_string(), record);
        })
        .await
    }

    async fn delete_record(&self, id: &str) -> Result<(), Error> {
        self.mutate(|records| {
            records.remove(id);
        })
        .await
    }

    async fn list_records(&self) -> Result<Vec<String>, Error> {
        Ok(self.records.lock().await.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Mutations are written as they happen
        Ok(())
    }
}

/// Factory for file-backed state stores
pub struct FileStateStoreFactory;

#[async_trait]
impl StateStoreFactory for FileStateStoreFactory {
    async fn create(&self, config: &StateStoreConfig) -> Result<Box<dyn StateStore>, Error> {
        match config {
            StateStoreConfig::File { path } => Ok(Box::new(FileStateStore::new(path).await?)),
            _ => Err(Error::config("Invalid config for file state store")),
        }
    }
}
