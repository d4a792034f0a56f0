//! Pager configuration, loadable from TOML
//!
//! ```toml
//! region_width = 16
//! region_height = 16
//! save_dir = "saves/regions"
//! compression = "zlib"
//! compression_level = "default"
//! format = "rle"
//!
//! [generator]
//! kind = "noise"
//! seed = 12345
//! scale = 0.05
//! solid_threshold = 0.35
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::region::{DEFAULT_REGION_HEIGHT, DEFAULT_REGION_WIDTH, MAX_REGION_DIMENSION};
use crate::generation::GeneratorConfig;
use crate::persistence::{CompressionLevel, CompressionType, RegionFormat};
use crate::region::RegionSize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Region pager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagerConfig {
    pub region_width: u32,
    pub region_height: u32,
    /// Directory holding one file per saved region
    pub save_dir: PathBuf,
    pub compression: CompressionType,
    pub compression_level: CompressionLevel,
    pub format: RegionFormat,
    pub generator: GeneratorConfig,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            region_width: DEFAULT_REGION_WIDTH,
            region_height: DEFAULT_REGION_HEIGHT,
            save_dir: PathBuf::from("saves/regions"),
            compression: CompressionType::Zlib,
            compression_level: CompressionLevel::Default,
            format: RegionFormat::Rle,
            generator: GeneratorConfig::default(),
        }
    }
}

impl PagerConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: PagerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("[PagerConfig::load] Read config from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn region_size(&self) -> RegionSize {
        RegionSize::new(self.region_width, self.region_height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("region_width", self.region_width),
            ("region_height", self.region_height),
        ] {
            if value == 0 || value > MAX_REGION_DIMENSION {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{} is outside 1..={}", value, MAX_REGION_DIMENSION),
                });
            }
        }

        if !(-1.0..=1.0).contains(&self.generator.solid_threshold) {
            return Err(ConfigError::Invalid {
                field: "generator.solid_threshold",
                reason: format!("{} is outside -1.0..=1.0", self.generator.solid_threshold),
            });
        }

        if !(self.generator.scale > 0.0 && self.generator.scale.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "generator.scale",
                reason: format!("{} must be a positive number", self.generator.scale),
            });
        }

        Ok(())
    }
}
