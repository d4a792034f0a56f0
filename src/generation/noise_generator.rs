use noise::{NoiseFn, Perlin};

use super::RegionGenerator;
use crate::constants::generation::NOISE_TILE_BANDS;
use crate::region::{Region, RegionPos, RegionSize, TileCell};

/// Perlin noise terrain.
///
/// Sampled in world tile space so neighbouring regions line up at their
/// shared edges.
pub struct NoiseGenerator {
    noise: Perlin,
    seed: u32,
    scale: f64,
    solid_threshold: f64,
}

impl NoiseGenerator {
    pub fn new(seed: u32, scale: f64, solid_threshold: f64) -> Self {
        Self {
            noise: Perlin::new(seed),
            seed,
            scale,
            solid_threshold,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Cell for a world tile coordinate
    pub fn sample(&self, world_x: i64, world_y: i64) -> TileCell {
        let value = self
            .noise
            .get([world_x as f64 * self.scale, world_y as f64 * self.scale])
            .clamp(-1.0, 1.0);

        // Map [-1, 1] onto [0, NOISE_TILE_BANDS)
        let band = (((value + 1.0) / 2.0) * NOISE_TILE_BANDS as f64) as i32;
        TileCell::new(band.min(NOISE_TILE_BANDS - 1), value > self.solid_threshold)
    }
}

impl std::fmt::Debug for NoiseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseGenerator")
            .field("seed", &self.seed)
            .field("scale", &self.scale)
            .field("solid_threshold", &self.solid_threshold)
            .finish()
    }
}

impl RegionGenerator for NoiseGenerator {
    fn create(&mut self, pos: RegionPos, size: RegionSize) -> Region {
        let (origin_x, origin_y) = pos.origin_world(size);
        let tiles = (0..i64::from(size.height))
            .flat_map(|ty| (0..i64::from(size.width)).map(move |tx| (tx, ty)))
            .map(|(tx, ty)| self.sample(origin_x + tx, origin_y + ty))
            .collect();

        // Tile count always matches size here
        Region::from_tiles(pos, size, tiles).unwrap_or_else(|| Region::new(pos, size))
    }
}
