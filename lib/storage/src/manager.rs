use crate::ingest;
use crate::lmdb_storage::LmdbStorage;
use crate::snapshot::SnapshotManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tropex_core::{Dataset, Error, Result};

/// Where the dataset comes from and where it is persisted
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Trait (trope) CSV file
    pub traits_file: Option<PathBuf>,
    /// Media CSV files, parsed in parallel
    pub media_files: Vec<PathBuf>,
    /// Mirror the relation into LMDB
    pub use_lmdb: bool,
    /// Ignore persisted copies and ingest the CSV sources again
    pub rebuild: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            traits_file: None,
            media_files: Vec::new(),
            use_lmdb: true,
            rebuild: false,
        }
    }
}

/// Resolves the dataset once at startup and owns its persisted copies
pub struct StorageManager {
    dataset: Arc<Dataset>,
    data_dir: PathBuf,
    snapshots: SnapshotManager,
    lmdb: Option<LmdbStorage>,
}

impl StorageManager {
    /// Load the dataset from the snapshot, then the LMDB mirror, then the CSV
    /// sources, in that order. Freshly ingested data is persisted before
    /// returning. Fails if no source yields a dataset.
    pub fn open(config: StorageConfig) -> Result<Self> {
        let data_dir = config.data_dir.clone();
        std::fs::create_dir_all(&data_dir)?;

        let snapshots = SnapshotManager::new(&data_dir)
            .map_err(|e| Error::Storage(e.to_string()))?;

        let lmdb = if config.use_lmdb {
            Some(LmdbStorage::new(data_dir.join("lmdb"))
                .map_err(|e| Error::Storage(e.to_string()))?)
        } else {
            None
        };

        let mut manager = Self {
            dataset: Arc::new(Dataset::default()),
            data_dir,
            snapshots,
            lmdb,
        };

        if !config.rebuild {
            if let Some(dataset) = manager.load_persisted()? {
                if config.traits_file.is_some() || !config.media_files.is_empty() {
                    warn!("Persisted dataset found; CSV sources ignored (pass --rebuild to re-ingest)");
                }
                manager.dataset = Arc::new(dataset);
                return Ok(manager);
            }
        }

        let traits_file = config.traits_file.as_ref().ok_or_else(|| {
            Error::InvalidConfig("no persisted dataset and no trait file to ingest".to_string())
        })?;
        if config.media_files.is_empty() {
            warn!("No media files configured; dataset will contain traits only");
        }

        let dataset = ingest::ingest(traits_file, &config.media_files)
            .map_err(|e| match e.downcast::<Error>() {
                Ok(core) => core,
                Err(other) => Error::Storage(format!("{:#}", other)),
            })?;
        manager.dataset = Arc::new(dataset);
        manager.save()?;
        Ok(manager)
    }

    fn load_persisted(&self) -> Result<Option<Dataset>> {
        if let Some(dataset) = self.snapshots.load()
            .map_err(|e| Error::Persistence(e.to_string()))? {
            info!("Loaded dataset snapshot from {:?}", self.snapshots.path());
            return Ok(Some(dataset));
        }

        if let Some(lmdb) = &self.lmdb {
            if let Some(dataset) = lmdb.load_dataset()
                .map_err(|e| Error::Persistence(e.to_string()))? {
                info!("Loaded dataset from LMDB mirror");
                return Ok(Some(dataset));
            }
        }

        Ok(None)
    }

    /// Shared handle to the dataset; immutable for the life of the process
    #[inline]
    pub fn dataset(&self) -> Arc<Dataset> {
        self.dataset.clone()
    }

    #[inline]
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[inline]
    pub fn lmdb(&self) -> Option<&LmdbStorage> {
        self.lmdb.as_ref()
    }

    /// Write the snapshot and, if enabled, the LMDB mirror
    pub fn save(&self) -> Result<()> {
        self.snapshots.save(&self.dataset)
            .map_err(|e| Error::Storage(e.to_string()))?;
        if let Some(lmdb) = &self.lmdb {
            lmdb.save_dataset(&self.dataset)
                .map_err(|e| Error::Storage(e.to_string()))?;
            info!("LMDB mirror updated");
        }
        Ok(())
    }
}
