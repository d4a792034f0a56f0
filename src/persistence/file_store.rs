use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::format::{REGION_FILE_EXTENSION, REGION_FILE_PREFIX};
use crate::persistence::{
    corrupted_data, Compressor, PersistenceResult, RegionSerializer, RegionStore,
};
use crate::region::{Region, RegionPos};

/// On-disk region store: one file per region inside a save directory
#[derive(Debug)]
pub struct FileRegionStore {
    save_dir: PathBuf,
    serializer: RegionSerializer,
    compressor: Compressor,
}

impl FileRegionStore {
    /// Open a store rooted at `save_dir`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(
        save_dir: P,
        serializer: RegionSerializer,
        compressor: Compressor,
    ) -> PersistenceResult<Self> {
        let save_dir = save_dir.as_ref().to_path_buf();
        fs::create_dir_all(&save_dir)?;
        log::debug!("[FileRegionStore::new] Region store at {}", save_dir.display());

        Ok(Self {
            save_dir,
            serializer,
            compressor,
        })
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Path of the file holding the region at `pos`
    pub fn region_path(&self, pos: RegionPos) -> PathBuf {
        self.save_dir.join(format!(
            "{}_{}_{}.{}",
            REGION_FILE_PREFIX, pos.x, pos.y, REGION_FILE_EXTENSION
        ))
    }

    /// Remove the stored copy of a region, if any
    pub fn delete(&mut self, pos: RegionPos) -> PersistenceResult<bool> {
        let path = self.region_path(pos);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> PersistenceResult<()> {
        let temp_path = path.with_extension(format!("{}.tmp", REGION_FILE_EXTENSION));
        fs::write(&temp_path, data)?;
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

impl RegionStore for FileRegionStore {
    fn load(&mut self, pos: RegionPos) -> PersistenceResult<Option<Region>> {
        let path = self.region_path(pos);
        if !path.exists() {
            log::trace!("[FileRegionStore::load] No file for region {}", pos);
            return Ok(None);
        }

        let framed = fs::read(&path)?;
        let data = self.compressor.decompress_framed(&framed)?;
        let region = self.serializer.deserialize(&data)?;

        if region.position() != pos {
            return Err(corrupted_data(format!(
                "{} holds region {}",
                path.display(),
                region.position()
            )));
        }

        log::debug!("[FileRegionStore::load] Loaded region {} ({} bytes)", pos, framed.len());
        Ok(Some(region))
    }

    fn save(&mut self, region: &Region) -> PersistenceResult<()> {
        let path = self.region_path(region.position());
        let data = self.serializer.serialize(region)?;
        let framed = self.compressor.compress_framed(&data)?;
        self.write_atomic(&path, &framed)?;

        log::debug!(
            "[FileRegionStore::save] Saved region {} ({} bytes)",
            region.position(),
            framed.len()
        );
        Ok(())
    }
}
