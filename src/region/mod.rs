//! Regions and the container that holds the resident ones

mod container;
#[allow(clippy::module_inception)]
mod region;

pub use container::{ContainerVisit, RegionContainer, RegionRef};
pub use region::{Region, RegionPos, RegionSize, TileCell, TilePos};
