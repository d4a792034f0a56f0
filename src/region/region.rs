use serde::{Deserialize, Serialize};

use crate::constants::region::{DEFAULT_REGION_HEIGHT, DEFAULT_REGION_WIDTH, MAX_REGION_DIMENSION};
use crate::error::BoundsError;

/// Position of a region in the region grid (region coordinates, not tiles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionPos {
    pub x: i32,
    pub y: i32,
}

impl RegionPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Create a new region position offset by the given amounts, saturating
    /// at the edge of the grid
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Chebyshev distance in regions, handy for radius-based eviction predicates
    pub fn chebyshev_distance(&self, other: RegionPos) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    /// World tile coordinates of this region's (0, 0) tile, or `None` if
    /// they do not fit in `i32`
    pub fn origin_tile(&self, size: RegionSize) -> Option<TilePos> {
        let (x, y) = self.origin_world(size);
        Some(TilePos::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
    }

    /// World tile coordinates of this region's (0, 0) tile, widened so
    /// every region of the grid has one
    pub fn origin_world(&self, size: RegionSize) -> (i64, i64) {
        (
            i64::from(self.x) * i64::from(size.width),
            i64::from(self.y) * i64::from(size.height),
        )
    }
}

impl std::fmt::Display for RegionPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Dimensions of a region in tiles. Constant across every region of a pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionSize {
    pub width: u32,
    pub height: u32,
}

impl RegionSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions within `1..=MAX_REGION_DIMENSION`
    pub fn is_valid(&self) -> bool {
        (1..=MAX_REGION_DIMENSION).contains(&self.width)
            && (1..=MAX_REGION_DIMENSION).contains(&self.height)
    }

    pub fn tile_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Check whether local tile coordinates fall inside `[0, W) x [0, H)`
    pub fn contains(&self, tx: i32, ty: i32) -> bool {
        tx >= 0 && ty >= 0 && (tx as u32) < self.width && (ty as u32) < self.height
    }
}

impl Default for RegionSize {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_WIDTH, DEFAULT_REGION_HEIGHT)
    }
}

impl std::fmt::Display for RegionSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Position of a tile in the world (world tile coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Get the region this tile belongs to.
    ///
    /// `size` must be valid ([`RegionSize::is_valid`]); dimensions are at
    /// most `MAX_REGION_DIMENSION`, so the casts below cannot truncate.
    pub fn to_region_pos(&self, size: RegionSize) -> RegionPos {
        RegionPos::new(
            self.x.div_euclid(size.width as i32),
            self.y.div_euclid(size.height as i32),
        )
    }

    /// Get local position within its region. Same size requirement as
    /// [`TilePos::to_region_pos`].
    pub fn to_local_pos(&self, size: RegionSize) -> (i32, i32) {
        (
            self.x.rem_euclid(size.width as i32),
            self.y.rem_euclid(size.height as i32),
        )
    }
}

/// The smallest addressable unit of a region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCell {
    pub id: i32,
    pub solid: bool,
}

impl TileCell {
    pub fn new(id: i32, solid: bool) -> Self {
        Self { id, solid }
    }
}

/// A fixed-size grid of tiles identified by its region coordinate.
///
/// A region knows nothing about the container or pager holding it. Every
/// accessor is bounds-checked and fails with [`BoundsError`] instead of
/// clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    position: RegionPos,
    size: RegionSize,
    // Row-major: index = x + y * width
    tiles: Vec<TileCell>,
}

impl Region {
    /// Create a region with every tile set to the default cell
    pub fn new(position: RegionPos, size: RegionSize) -> Self {
        Self {
            position,
            size,
            tiles: vec![TileCell::default(); size.tile_count()],
        }
    }

    /// Build a region from decoded row-major tiles. Returns `None` if the
    /// tile count does not match the dimensions.
    pub fn from_tiles(position: RegionPos, size: RegionSize, tiles: Vec<TileCell>) -> Option<Self> {
        if tiles.len() != size.tile_count() {
            return None;
        }
        Some(Self { position, size, tiles })
    }

    pub fn position(&self) -> RegionPos {
        self.position
    }

    pub fn x(&self) -> i32 {
        self.position.x
    }

    pub fn y(&self) -> i32 {
        self.position.y
    }

    pub fn size(&self) -> RegionSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> &[TileCell] {
        &self.tiles
    }

    /// Get the cell at local position
    pub fn get_tile(&self, tx: i32, ty: i32) -> Result<TileCell, BoundsError> {
        let index = self.index(tx, ty)?;
        Ok(self.tiles[index])
    }

    /// Set the tile id at local position, returning the previous id
    pub fn set_tile(&mut self, tx: i32, ty: i32, id: i32) -> Result<i32, BoundsError> {
        let index = self.index(tx, ty)?;
        Ok(std::mem::replace(&mut self.tiles[index].id, id))
    }

    pub fn get_solid(&self, tx: i32, ty: i32) -> Result<bool, BoundsError> {
        let index = self.index(tx, ty)?;
        Ok(self.tiles[index].solid)
    }

    /// Set the solid flag at local position, returning the previous flag
    pub fn set_solid(&mut self, tx: i32, ty: i32, solid: bool) -> Result<bool, BoundsError> {
        let index = self.index(tx, ty)?;
        Ok(std::mem::replace(&mut self.tiles[index].solid, solid))
    }

    /// Replace a whole cell, returning the previous one
    pub fn set_cell(&mut self, tx: i32, ty: i32, cell: TileCell) -> Result<TileCell, BoundsError> {
        let index = self.index(tx, ty)?;
        Ok(std::mem::replace(&mut self.tiles[index], cell))
    }

    pub fn fill(&mut self, cell: TileCell) {
        self.tiles.fill(cell);
    }

    fn index(&self, tx: i32, ty: i32) -> Result<usize, BoundsError> {
        if !self.size.contains(tx, ty) {
            return Err(BoundsError {
                x: tx,
                y: ty,
                width: self.size.width,
                height: self.size.height,
            });
        }
        Ok(tx as usize + ty as usize * self.size.width as usize)
    }
}
