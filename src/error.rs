//! Error types for the region pager
//!
//! Absence is never an error: lookups, loads and saves of missing regions
//! return `None`. Everything here is a genuine failure that the caller has
//! to see.

use crate::config::ConfigError;
use crate::pager::HookEvent;
use crate::persistence::PersistenceError;
use crate::region::{RegionPos, RegionSize};

/// Result type for pager operations
pub type PagerResult<T> = Result<T, PagerError>;

/// Tile coordinate outside a region's grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("tile ({x}, {y}) is outside region bounds {width}x{height}")]
pub struct BoundsError {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum PagerError {
    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error("region size {size} is invalid, each dimension must be in 1..={max}")]
    InvalidRegionSize { size: RegionSize, max: u32 },

    #[error("region {0} is already resident")]
    AlreadyPresent(RegionPos),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("collaborator returned region {found} when {expected} was requested")]
    PositionMismatch { expected: RegionPos, found: RegionPos },

    #[error("region {pos} is {found}, pager expects {expected}")]
    SizeMismatch {
        pos: RegionPos,
        expected: RegionSize,
        found: RegionSize,
    },

    #[error("region {0} is mutably borrowed elsewhere")]
    RegionBusy(RegionPos),

    #[error("{event} hook failed for region {pos}")]
    Hook {
        event: HookEvent,
        pos: RegionPos,
        #[source]
        source: anyhow::Error,
    },

    #[error("visitor failed at region {pos}")]
    Visitor {
        pos: RegionPos,
        #[source]
        source: anyhow::Error,
    },
}
