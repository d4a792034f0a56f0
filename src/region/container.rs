//! Ownership store for resident regions

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::{Region, RegionPos};
use crate::error::{PagerError, PagerResult};

/// Shared handle to a resident region.
///
/// The container owns the canonical handle. Clones given to callers stay
/// valid after eviction but no longer refer to a resident region.
pub type RegionRef = Rc<RefCell<Region>>;

/// What a container visitor wants done with the entry it just saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerVisit {
    Keep,
    Remove,
}

/// Coordinate to region map. At most one region per coordinate.
///
/// The container never creates or destroys regions on its own; the pager
/// decides when entries come and go.
#[derive(Debug, Default)]
pub struct RegionContainer {
    regions: FxHashMap<RegionPos, RegionRef>,
}

impl RegionContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a resident region
    pub fn get(&self, pos: RegionPos) -> Option<RegionRef> {
        self.regions.get(&pos).cloned()
    }

    pub fn contains(&self, pos: RegionPos) -> bool {
        self.regions.contains_key(&pos)
    }

    /// Insert a region under its own coordinate.
    ///
    /// Fails with [`PagerError::AlreadyPresent`] if the coordinate is taken;
    /// the existing entry is left untouched.
    pub fn insert(&mut self, region: Region) -> PagerResult<RegionRef> {
        let pos = region.position();
        if self.regions.contains_key(&pos) {
            return Err(PagerError::AlreadyPresent(pos));
        }
        let handle = Rc::new(RefCell::new(region));
        self.regions.insert(pos, Rc::clone(&handle));
        Ok(handle)
    }

    /// Detach a region, handing ownership back to the caller
    pub fn remove(&mut self, pos: RegionPos) -> Option<RegionRef> {
        self.regions.remove(&pos)
    }

    /// Visit every resident region. Returning [`ContainerVisit::Remove`]
    /// drops the current entry without disturbing the rest of the walk.
    pub fn for_each<F>(&mut self, mut visitor: F)
    where
        F: FnMut(&RegionRef) -> ContainerVisit,
    {
        self.regions
            .retain(|_, handle| visitor(handle) == ContainerVisit::Keep);
    }

    /// Coordinate-ordered copy of the current entries.
    ///
    /// Bulk pager walks iterate this instead of the live map so callbacks
    /// can insert or remove other entries mid-walk.
    pub fn snapshot(&self) -> Vec<(RegionPos, RegionRef)> {
        let mut entries: Vec<_> = self
            .regions
            .iter()
            .map(|(pos, handle)| (*pos, Rc::clone(handle)))
            .collect();
        entries.sort_unstable_by_key(|(pos, _)| *pos);
        entries
    }

    pub fn positions(&self) -> Vec<RegionPos> {
        let mut positions: Vec<_> = self.regions.keys().copied().collect();
        positions.sort_unstable();
        positions
    }

    /// Check whether `handle` is the entry currently resident at `pos`
    pub fn holds(&self, pos: RegionPos, handle: &RegionRef) -> bool {
        self.regions
            .get(&pos)
            .map_or(false, |resident| Rc::ptr_eq(resident, handle))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
