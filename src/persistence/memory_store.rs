use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::persistence::{PersistenceResult, RegionSerializer, RegionStore};
use crate::region::{Region, RegionPos};

#[derive(Debug, Default)]
struct MemoryStoreState {
    regions: FxHashMap<RegionPos, Vec<u8>>,
    load_calls: usize,
    save_calls: usize,
}

/// In-memory region store.
///
/// Regions are kept encoded, exactly as they would be on disk. Clones share
/// the same storage, so a caller can hand one clone to a pager and keep
/// another to inspect what was saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegionStore {
    state: Rc<RefCell<MemoryStoreState>>,
    serializer: RegionSerializer,
}

impl MemoryRegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, pos: RegionPos) -> bool {
        self.state.borrow().regions.contains_key(&pos)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().regions.is_empty()
    }

    /// Number of `load` calls made against this store
    pub fn load_calls(&self) -> usize {
        self.state.borrow().load_calls
    }

    /// Number of `save` calls made against this store
    pub fn save_calls(&self) -> usize {
        self.state.borrow().save_calls
    }

    /// Decode the stored copy of a region without counting it as a load
    pub fn peek(&self, pos: RegionPos) -> PersistenceResult<Option<Region>> {
        let state = self.state.borrow();
        state
            .regions
            .get(&pos)
            .map(|data| self.serializer.deserialize(data))
            .transpose()
    }
}

impl RegionStore for MemoryRegionStore {
    fn load(&mut self, pos: RegionPos) -> PersistenceResult<Option<Region>> {
        self.state.borrow_mut().load_calls += 1;
        self.peek(pos)
    }

    fn save(&mut self, region: &Region) -> PersistenceResult<()> {
        let data = self.serializer.serialize(region)?;
        let mut state = self.state.borrow_mut();
        state.save_calls += 1;
        state.regions.insert(region.position(), data);
        Ok(())
    }
}
