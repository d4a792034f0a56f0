//! Persistence collaborator for the region pager
//!
//! The pager only sees the [`RegionStore`] trait. The stores in this module
//! are reference implementations: an on-disk store with one file per region
//! and a shared in-memory store.

pub mod compression;
pub mod file_store;
pub mod memory_store;
pub mod region_serializer;

pub use compression::{CompressionLevel, CompressionType, Compressor};
pub use file_store::FileRegionStore;
pub use memory_store::MemoryRegionStore;
pub use region_serializer::{RegionFormat, RegionSerializer};

use crate::region::{Region, RegionPos};

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors that can occur during persistence operations
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Compression error: {0}")]
    CompressionError(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Corrupted data: {0}")]
    CorruptedData(String),
}

impl From<bincode::Error> for PersistenceError {
    fn from(err: bincode::Error) -> Self {
        PersistenceError::SerializationError(err.to_string())
    }
}

/// Create a corrupted data error
pub fn corrupted_data(reason: impl Into<String>) -> PersistenceError {
    PersistenceError::CorruptedData(reason.into())
}

/// Storage backend the pager loads regions from and saves them to.
///
/// `load` returns `Ok(None)` when nothing is stored for the coordinate.
/// Failures are handed to the pager's caller unchanged.
pub trait RegionStore {
    fn load(&mut self, pos: RegionPos) -> PersistenceResult<Option<Region>>;

    fn save(&mut self, region: &Region) -> PersistenceResult<()>;
}
