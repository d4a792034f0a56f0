// Region Pager Constants
//
// Defaults and on-disk identifiers shared by the region, persistence and
// generation modules. Keep them here rather than scattered across files.

/// Region grid defaults
pub mod region {
    /// Default region width in tiles
    pub const DEFAULT_REGION_WIDTH: u32 = 16;
    /// Default region height in tiles
    pub const DEFAULT_REGION_HEIGHT: u32 = 16;

    /// Upper bound on either region dimension accepted from config or disk
    pub const MAX_REGION_DIMENSION: u32 = 1024;
}

/// Region file format identifiers
pub mod format {
    /// Magic bytes at the start of every encoded region
    pub const REGION_MAGIC: &[u8; 4] = b"RGNP";

    /// Version of the region encoding
    pub const REGION_FORMAT_VERSION: u32 = 1;

    /// Extension used for region files
    pub const REGION_FILE_EXTENSION: &str = "rgn";

    /// Prefix used for region file names: `region_<x>_<y>.rgn`
    pub const REGION_FILE_PREFIX: &str = "region";
}

/// Procedural generation defaults
pub mod generation {
    pub const DEFAULT_SEED: u32 = 12345;
    /// Noise sampling frequency in world tiles
    pub const DEFAULT_NOISE_SCALE: f64 = 0.05;
    /// Noise value above which a generated tile is solid
    pub const DEFAULT_SOLID_THRESHOLD: f64 = 0.35;
    /// Number of tile id bands the noise range is split into
    pub const NOISE_TILE_BANDS: i32 = 4;
}
