//! Region paging engine for tile-addressed worlds.
//!
//! A [`RegionPager`] keeps a cache of resident [`Region`]s keyed by region
//! grid coordinate. Regions come from a [`RegionStore`] or are produced by a
//! [`RegionGenerator`]; lifecycle hooks fire on load, create, save and
//! unload, and eviction is driven by caller-supplied predicates.

pub mod config;
pub mod constants;
pub mod error;
pub mod generation;
pub mod pager;
pub mod persistence;
pub mod region;

pub use config::{ConfigError, PagerConfig};
pub use error::{BoundsError, PagerError, PagerResult};
pub use generation::{FlatGenerator, GeneratorConfig, GeneratorKind, NoiseGenerator, RegionGenerator};
pub use pager::{Hook, HookEvent, RegionPager};
pub use persistence::{
    FileRegionStore, MemoryRegionStore, PersistenceError, PersistenceResult, RegionStore,
};
pub use region::{Region, RegionContainer, RegionPos, RegionRef, RegionSize, TileCell, TilePos};
