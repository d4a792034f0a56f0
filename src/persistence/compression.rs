use std::io::{Read, Write};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression as FlateCompression;
use serde::{Deserialize, Serialize};

use crate::persistence::{corrupted_data, PersistenceError, PersistenceResult};

/// Compression algorithms supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    /// No compression
    None,
    /// Gzip compression (good compression, moderate speed)
    Gzip,
    /// Zlib compression (faster than gzip)
    Zlib,
}

impl CompressionType {
    fn tag(self) -> u8 {
        match self {
            CompressionType::None => 0,
            CompressionType::Gzip => 1,
            CompressionType::Zlib => 2,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Gzip),
            2 => Some(CompressionType::Zlib),
            _ => None,
        }
    }
}

/// Compression level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Fast,
    Default,
    Best,
}

impl CompressionLevel {
    fn to_flate2(self) -> FlateCompression {
        match self {
            CompressionLevel::Fast => FlateCompression::fast(),
            CompressionLevel::Default => FlateCompression::default(),
            CompressionLevel::Best => FlateCompression::best(),
        }
    }
}

/// Compresses region payloads.
///
/// Framed output starts with one tag byte naming the algorithm, so a store
/// can still read files written under a different compression setting.
#[derive(Debug, Clone, Copy)]
pub struct Compressor {
    compression_type: CompressionType,
    compression_level: CompressionLevel,
}

impl Compressor {
    pub fn new(compression_type: CompressionType, compression_level: CompressionLevel) -> Self {
        Self {
            compression_type,
            compression_level,
        }
    }

    pub fn compression_type(&self) -> CompressionType {
        self.compression_type
    }

    /// Compress data and prefix it with the algorithm tag
    pub fn compress_framed(&self, data: &[u8]) -> PersistenceResult<Vec<u8>> {
        let body = self.compress(data)?;
        let mut framed = Vec::with_capacity(body.len() + 1);
        framed.push(self.compression_type.tag());
        framed.extend_from_slice(&body);
        Ok(framed)
    }

    /// Decompress data written by [`Compressor::compress_framed`] with any
    /// compression setting
    pub fn decompress_framed(&self, data: &[u8]) -> PersistenceResult<Vec<u8>> {
        let (&tag, body) = data
            .split_first()
            .ok_or_else(|| corrupted_data("Empty compressed payload"))?;
        let compression_type = CompressionType::from_tag(tag)
            .ok_or_else(|| corrupted_data(format!("Unknown compression tag {}", tag)))?;
        Compressor::new(compression_type, self.compression_level).decompress(body)
    }

    /// Compress data
    pub fn compress(&self, data: &[u8]) -> PersistenceResult<Vec<u8>> {
        match self.compression_type {
            CompressionType::None => Ok(data.to_vec()),
            CompressionType::Gzip => self.compress_gzip(data),
            CompressionType::Zlib => self.compress_zlib(data),
        }
    }

    /// Decompress data
    pub fn decompress(&self, data: &[u8]) -> PersistenceResult<Vec<u8>> {
        match self.compression_type {
            CompressionType::None => Ok(data.to_vec()),
            CompressionType::Gzip => decompress_with(GzDecoder::new(data), "Gzip"),
            CompressionType::Zlib => decompress_with(ZlibDecoder::new(data), "Zlib"),
        }
    }

    fn compress_gzip(&self, data: &[u8]) -> PersistenceResult<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.compression_level.to_flate2());
        encoder.write_all(data).map_err(|e| {
            PersistenceError::CompressionError(format!("Gzip compression failed: {}", e))
        })?;
        encoder.finish().map_err(|e| {
            PersistenceError::CompressionError(format!("Gzip finalization failed: {}", e))
        })
    }

    fn compress_zlib(&self, data: &[u8]) -> PersistenceResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.compression_level.to_flate2());
        encoder.write_all(data).map_err(|e| {
            PersistenceError::CompressionError(format!("Zlib compression failed: {}", e))
        })?;
        encoder.finish().map_err(|e| {
            PersistenceError::CompressionError(format!("Zlib finalization failed: {}", e))
        })
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(CompressionType::Zlib, CompressionLevel::Default)
    }
}

fn decompress_with(mut decoder: impl Read, name: &str) -> PersistenceResult<Vec<u8>> {
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed).map_err(|e| {
        PersistenceError::CompressionError(format!("{} decompression failed: {}", name, e))
    })?;
    Ok(decompressed)
}
