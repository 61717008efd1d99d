// Dataset snapshots: the whole relation serialized with bincode and
// replaced atomically, so a restart skips CSV ingestion.
use anyhow::{anyhow, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tropex_core::{Dataset, Item, Trait};

const SNAPSHOT_FILE: &str = "dataset.bin";
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    pub version: u32,
    pub created_at: u64,
    pub traits: Vec<Trait>,
    pub items: Vec<Item>,
}

impl DatasetSnapshot {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            traits: dataset.traits().to_vec(),
            items: dataset.items().to_vec(),
        }
    }

    /// Rebuild the indices; the snapshot is validated like any other source
    pub fn into_dataset(self) -> Result<Dataset> {
        Ok(Dataset::build(self.items, self.traits)?)
    }
}

pub struct SnapshotManager {
    path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: data_dir.join(SNAPSHOT_FILE),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the dataset, replacing any previous snapshot atomically
    pub fn save(&self, dataset: &Dataset) -> Result<()> {
        let snapshot = DatasetSnapshot::from_dataset(dataset);
        let data = bincode::serialize(&snapshot)
            .map_err(|e| anyhow!("Serialization error: {}", e))?;

        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(&data))?;
        tracing::info!("Snapshot saved to {:?} ({} bytes)", self.path, data.len());
        Ok(())
    }

    /// Load the snapshot if one has been written
    pub fn load(&self) -> Result<Option<Dataset>> {
        if !self.exists() {
            return Ok(None);
        }

        let data = std::fs::read(&self.path)?;
        let snapshot: DatasetSnapshot = bincode::deserialize(&data)
            .map_err(|e| anyhow!("Deserialization error: {}", e))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(anyhow!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version,
                SNAPSHOT_VERSION
            ));
        }
        snapshot.into_dataset().map(Some)
    }
}
