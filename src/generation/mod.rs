//! Generation collaborator for the region pager
//!
//! The pager calls [`RegionGenerator::create`] for coordinates that have no
//! stored copy. Generation is total: it always produces a region.

mod noise_generator;

pub use noise_generator::NoiseGenerator;

use serde::{Deserialize, Serialize};

use crate::constants::generation::{DEFAULT_NOISE_SCALE, DEFAULT_SEED, DEFAULT_SOLID_THRESHOLD};
use crate::region::{Region, RegionPos, RegionSize, TileCell};

/// Produces fresh regions
pub trait RegionGenerator {
    fn create(&mut self, pos: RegionPos, size: RegionSize) -> Region;
}

impl<F> RegionGenerator for F
where
    F: FnMut(RegionPos, RegionSize) -> Region,
{
    fn create(&mut self, pos: RegionPos, size: RegionSize) -> Region {
        self(pos, size)
    }
}

/// Fills every tile with the same cell
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatGenerator {
    fill: TileCell,
}

impl FlatGenerator {
    pub fn new(fill: TileCell) -> Self {
        Self { fill }
    }
}

impl RegionGenerator for FlatGenerator {
    fn create(&mut self, pos: RegionPos, size: RegionSize) -> Region {
        let mut region = Region::new(pos, size);
        if self.fill != TileCell::default() {
            region.fill(self.fill);
        }
        region
    }
}

/// Which generator a configured pager uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Flat,
    Noise,
}

/// Generator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub kind: GeneratorKind,
    pub seed: u32,
    /// Noise sampling frequency in world tiles
    pub scale: f64,
    /// Noise value in `[-1, 1]` above which a tile is solid
    pub solid_threshold: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            kind: GeneratorKind::Flat,
            seed: DEFAULT_SEED,
            scale: DEFAULT_NOISE_SCALE,
            solid_threshold: DEFAULT_SOLID_THRESHOLD,
        }
    }
}

/// Build the generator described by `config`
pub fn create_generator(config: &GeneratorConfig) -> Box<dyn RegionGenerator> {
    match config.kind {
        GeneratorKind::Flat => Box::new(FlatGenerator::default()),
        GeneratorKind::Noise => Box::new(NoiseGenerator::new(
            config.seed,
            config.scale,
            config.solid_threshold,
        )),
    }
}
