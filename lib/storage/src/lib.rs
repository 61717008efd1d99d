pub mod ingest;
pub mod lmdb_storage;
pub mod manager;
pub mod snapshot;

pub use ingest::{ingest, split_camel_case};
pub use lmdb_storage::LmdbStorage;
pub use manager::{StorageConfig, StorageManager};
pub use snapshot::{DatasetSnapshot, SnapshotManager};
