use serde::{Deserialize, Serialize};

use crate::constants::format::{REGION_FORMAT_VERSION, REGION_MAGIC};
use crate::constants::region::MAX_REGION_DIMENSION;
use crate::persistence::{corrupted_data, PersistenceError, PersistenceResult};
use crate::region::{Region, RegionPos, RegionSize, TileCell};

/// Bytes per encoded tile: little-endian i32 id followed by a solid byte
const CELL_BYTES: usize = 5;

/// Region body encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionFormat {
    /// Every tile written in row-major order
    Raw,
    /// Run-length encoded, good for mostly uniform regions
    Rle,
}

impl RegionFormat {
    fn tag(self) -> u8 {
        match self {
            RegionFormat::Raw => 0,
            RegionFormat::Rle => 1,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(RegionFormat::Raw),
            1 => Some(RegionFormat::Rle),
            _ => None,
        }
    }
}

/// Header for serialized regions
#[derive(Debug, Serialize, Deserialize)]
struct RegionHeader {
    magic: [u8; 4],
    version: u32,
    format: u8,
    position: RegionPos,
    width: u32,
    height: u32,
    tile_count: u32,
    checksum: u32,
}

impl RegionHeader {
    fn empty() -> Self {
        Self {
            magic: [0; 4],
            version: 0,
            format: 0,
            position: RegionPos::new(0, 0),
            width: 0,
            height: 0,
            tile_count: 0,
            checksum: 0,
        }
    }
}

/// Serializes and deserializes regions
#[derive(Debug, Clone, Copy)]
pub struct RegionSerializer {
    format: RegionFormat,
}

impl Default for RegionSerializer {
    fn default() -> Self {
        Self::new(RegionFormat::Rle)
    }
}

impl RegionSerializer {
    pub fn new(format: RegionFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> RegionFormat {
        self.format
    }

    /// Serialize a region to bytes
    pub fn serialize(&self, region: &Region) -> PersistenceResult<Vec<u8>> {
        let header_size = Self::header_size()?;
        let mut buffer = vec![0u8; header_size];

        match self.format {
            RegionFormat::Raw => write_raw(region, &mut buffer),
            RegionFormat::Rle => write_rle(region, &mut buffer),
        }

        let header = RegionHeader {
            magic: *REGION_MAGIC,
            version: REGION_FORMAT_VERSION,
            format: self.format.tag(),
            position: region.position(),
            width: region.width(),
            height: region.height(),
            tile_count: region.tiles().len() as u32,
            checksum: calculate_checksum(&buffer[header_size..]),
        };

        let header_bytes = bincode::serialize(&header)?;
        buffer[..header_size].copy_from_slice(&header_bytes);

        Ok(buffer)
    }

    /// Deserialize a region from bytes. The body format is read from the
    /// header, so any serializer can decode any supported format.
    pub fn deserialize(&self, data: &[u8]) -> PersistenceResult<Region> {
        let header_size = Self::header_size()?;
        if data.len() < header_size {
            return Err(corrupted_data("Data too small to contain a region header"));
        }

        let header: RegionHeader = bincode::deserialize(&data[..header_size])
            .map_err(|e| PersistenceError::DeserializationError(e.to_string()))?;

        if header.magic != *REGION_MAGIC {
            return Err(corrupted_data("Invalid region magic"));
        }

        if header.version != REGION_FORMAT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: REGION_FORMAT_VERSION,
                found: header.version,
            });
        }

        if header.width == 0
            || header.height == 0
            || header.width > MAX_REGION_DIMENSION
            || header.height > MAX_REGION_DIMENSION
        {
            return Err(corrupted_data(format!(
                "Invalid region dimensions {}x{}",
                header.width, header.height
            )));
        }

        let size = RegionSize::new(header.width, header.height);
        if header.tile_count as usize != size.tile_count() {
            return Err(corrupted_data(format!(
                "Tile count {} does not match dimensions {}",
                header.tile_count, size
            )));
        }

        let body = &data[header_size..];
        if calculate_checksum(body) != header.checksum {
            return Err(corrupted_data("Checksum mismatch"));
        }

        let tiles = match RegionFormat::from_tag(header.format) {
            Some(RegionFormat::Raw) => read_raw(body, size.tile_count())?,
            Some(RegionFormat::Rle) => read_rle(body, size.tile_count())?,
            None => {
                return Err(PersistenceError::DeserializationError(format!(
                    "Unknown region format {}",
                    header.format
                )))
            }
        };

        Region::from_tiles(header.position, size, tiles)
            .ok_or_else(|| corrupted_data("Decoded tile count does not match dimensions"))
    }

    fn header_size() -> PersistenceResult<usize> {
        Ok(bincode::serialized_size(&RegionHeader::empty())? as usize)
    }
}

fn write_cell(buffer: &mut Vec<u8>, cell: TileCell) {
    buffer.extend_from_slice(&cell.id.to_le_bytes());
    buffer.push(cell.solid as u8);
}

fn write_raw(region: &Region, buffer: &mut Vec<u8>) {
    buffer.reserve(region.tiles().len() * CELL_BYTES);
    for cell in region.tiles() {
        write_cell(buffer, *cell);
    }
}

fn write_rle(region: &Region, buffer: &mut Vec<u8>) {
    let mut runs: Vec<(TileCell, u32)> = Vec::new();
    for cell in region.tiles() {
        match runs.last_mut() {
            Some((current, length)) if current == cell && *length < u32::MAX => *length += 1,
            _ => runs.push((*cell, 1)),
        }
    }

    buffer.extend_from_slice(&(runs.len() as u32).to_le_bytes());
    for (cell, length) in runs {
        write_cell(buffer, cell);
        buffer.extend_from_slice(&length.to_le_bytes());
    }
}

fn read_u32(data: &[u8], cursor: usize) -> Option<u32> {
    let bytes = data.get(cursor..cursor + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_cell(data: &[u8], cursor: usize) -> Option<TileCell> {
    let bytes = data.get(cursor..cursor + CELL_BYTES)?;
    let id = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    Some(TileCell::new(id, bytes[4] != 0))
}

fn read_raw(body: &[u8], tile_count: usize) -> PersistenceResult<Vec<TileCell>> {
    if body.len() != tile_count * CELL_BYTES {
        return Err(corrupted_data(format!(
            "Raw body is {} bytes, expected {}",
            body.len(),
            tile_count * CELL_BYTES
        )));
    }

    (0..tile_count)
        .map(|i| read_cell(body, i * CELL_BYTES).ok_or_else(|| corrupted_data("Truncated tile data")))
        .collect()
}

fn read_rle(body: &[u8], tile_count: usize) -> PersistenceResult<Vec<TileCell>> {
    let run_count = read_u32(body, 0).ok_or_else(|| corrupted_data("Missing run count"))? as usize;
    let mut cursor = 4;
    let mut tiles = Vec::with_capacity(tile_count);

    for _ in 0..run_count {
        let cell = read_cell(body, cursor).ok_or_else(|| corrupted_data("Incomplete run data"))?;
        let length = read_u32(body, cursor + CELL_BYTES)
            .ok_or_else(|| corrupted_data("Incomplete run data"))? as usize;
        cursor += CELL_BYTES + 4;

        if tiles.len() + length > tile_count {
            return Err(corrupted_data("Too many tiles"));
        }
        tiles.extend(std::iter::repeat(cell).take(length));
    }

    if tiles.len() != tile_count {
        return Err(corrupted_data(format!(
            "Run data covers {} tiles, expected {}",
            tiles.len(),
            tile_count
        )));
    }

    Ok(tiles)
}

/// Calculate CRC32 checksum
fn calculate_checksum(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
