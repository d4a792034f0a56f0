//! Region pager - orchestrates residency of regions
//!
//! The pager checks its container first, then the store, then (for
//! `create_region`) the generator. Every successful transition fires its
//! lifecycle hook exactly once. Bulk walks (`for_each`, `unload_if`) iterate
//! a snapshot of the container, so hooks and visitors may call back into
//! the pager and insert or evict other regions mid-walk.
//!
//! Loading or creating a region that is already resident returns the
//! resident handle without touching a collaborator or firing a hook.
//!
//! While a hook or `for_each` visitor runs for a region, that region is
//! pinned: it stays resident for the duration and nested `unload_if` walks
//! (including `unload_region`/`unload_handle`) skip it. A hook evicting its
//! own region is therefore a no-op. Other regions may be evicted freely.

pub mod hooks;

pub use hooks::{Hook, HookEvent, HookRegistry};

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::config::PagerConfig;
use crate::constants::region::MAX_REGION_DIMENSION;
use crate::error::{PagerError, PagerResult};
use crate::generation::{create_generator, RegionGenerator};
use crate::persistence::{Compressor, FileRegionStore, RegionSerializer, RegionStore};
use crate::region::{Region, RegionContainer, RegionPos, RegionRef, RegionSize, TileCell, TilePos};

pub struct RegionPager {
    container: RegionContainer,
    hooks: HookRegistry,
    store: Box<dyn RegionStore>,
    generator: Box<dyn RegionGenerator>,
    region_size: RegionSize,
    /// Regions whose hook or visitor is currently running
    pinned: FxHashSet<RegionPos>,
}

impl std::fmt::Debug for RegionPager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionPager")
            .field("container", &self.container)
            .field("hooks", &self.hooks)
            .field("store", &"<RegionStore>")
            .field("generator", &"<RegionGenerator>")
            .field("region_size", &self.region_size)
            .field("pinned", &self.pinned)
            .finish()
    }
}

impl RegionPager {
    /// Create a pager whose regions are all `region_size` tiles.
    ///
    /// Fails with [`PagerError::InvalidRegionSize`] unless both dimensions
    /// are in `1..=MAX_REGION_DIMENSION`.
    pub fn new(
        region_size: RegionSize,
        store: Box<dyn RegionStore>,
        generator: Box<dyn RegionGenerator>,
    ) -> PagerResult<Self> {
        if !region_size.is_valid() {
            return Err(PagerError::InvalidRegionSize {
                size: region_size,
                max: MAX_REGION_DIMENSION,
            });
        }

        Ok(Self {
            container: RegionContainer::new(),
            hooks: HookRegistry::new(),
            store,
            generator,
            region_size,
            pinned: FxHashSet::default(),
        })
    }

    /// Build a pager backed by a [`FileRegionStore`] and the configured generator
    pub fn from_config(config: &PagerConfig) -> PagerResult<Self> {
        config.validate()?;

        let store = FileRegionStore::new(
            &config.save_dir,
            RegionSerializer::new(config.format),
            Compressor::new(config.compression, config.compression_level),
        )?;

        log::info!(
            "[RegionPager::from_config] {} regions, saves in {}, {:?} generator",
            config.region_size(),
            config.save_dir.display(),
            config.generator.kind
        );

        Self::new(
            config.region_size(),
            Box::new(store),
            create_generator(&config.generator),
        )
    }

    pub fn region_size(&self) -> RegionSize {
        self.region_size
    }

    /// Number of resident regions
    pub fn container_size(&self) -> usize {
        self.container.len()
    }

    pub fn is_resident(&self, pos: RegionPos) -> bool {
        self.container.contains(pos)
    }

    pub fn resident_positions(&self) -> Vec<RegionPos> {
        self.container.positions()
    }

    /// Look up a resident region. Never touches a collaborator or fires a hook.
    pub fn get_region(&self, pos: RegionPos) -> Option<RegionRef> {
        self.container.get(pos)
    }

    /// Make the region at `pos` resident from the store.
    ///
    /// Returns `Ok(None)` when the store has nothing for `pos`.
    pub fn load_region(&mut self, pos: RegionPos) -> PagerResult<Option<RegionRef>> {
        if let Some(resident) = self.container.get(pos) {
            log::trace!("[RegionPager::load_region] Region {} already resident", pos);
            return Ok(Some(resident));
        }

        let Some(region) = self.store.load(pos)? else {
            log::trace!("[RegionPager::load_region] No stored copy of region {}", pos);
            return Ok(None);
        };
        self.validate(pos, &region)?;

        let handle = self.container.insert(region)?;
        log::debug!("[RegionPager::load_region] Loaded region {}", pos);

        self.fire(HookEvent::Load, pos, &handle)?;
        Ok(Some(handle))
    }

    /// Generate a new region at `pos` and make it resident
    pub fn create_region(&mut self, pos: RegionPos) -> PagerResult<RegionRef> {
        if let Some(resident) = self.container.get(pos) {
            log::trace!("[RegionPager::create_region] Region {} already resident", pos);
            return Ok(resident);
        }

        let region = self.generator.create(pos, self.region_size);
        self.validate(pos, &region)?;

        let handle = self.container.insert(region)?;
        log::debug!("[RegionPager::create_region] Created region {}", pos);

        self.fire(HookEvent::Create, pos, &handle)?;
        Ok(handle)
    }

    /// Write a resident region to the store. The region stays resident.
    ///
    /// Saving an absent coordinate is a no-op returning `Ok(None)`.
    pub fn save_region(&mut self, pos: RegionPos) -> PagerResult<Option<RegionRef>> {
        let Some(handle) = self.container.get(pos) else {
            log::trace!("[RegionPager::save_region] Region {} not resident, nothing to save", pos);
            return Ok(None);
        };

        {
            let region = handle
                .try_borrow()
                .map_err(|_| PagerError::RegionBusy(pos))?;
            self.store.save(&region)?;
        }
        log::debug!("[RegionPager::save_region] Saved region {}", pos);

        self.fire(HookEvent::Save, pos, &handle)?;
        Ok(Some(handle))
    }

    /// Save every resident region, firing the save hook for each.
    /// Returns how many were saved.
    pub fn save_all(&mut self) -> PagerResult<usize> {
        let mut saved = 0;
        for pos in self.container.positions() {
            if self.save_region(pos)?.is_some() {
                saved += 1;
            }
        }
        log::info!("[RegionPager::save_all] Saved {} regions", saved);
        Ok(saved)
    }

    /// Evict every resident region matching `predicate`.
    ///
    /// The predicate runs once per region resident when the call starts,
    /// before any hook fires; pinned regions are left out. Each match gets
    /// its unload hook fired while still resident, then is removed. Regions
    /// added by hooks during the walk are not visited.
    ///
    /// Returns the number of matched regions that left the pager during the
    /// call, including matches a hook evicted through a nested call. On a
    /// hook failure, regions already evicted stay evicted and the failing
    /// one stays resident.
    pub fn unload_if<P>(&mut self, mut predicate: P) -> PagerResult<usize>
    where
        P: FnMut(&Region) -> bool,
    {
        let mut matched = Vec::new();
        for (pos, handle) in self.container.snapshot() {
            if self.pinned.contains(&pos) {
                continue;
            }
            let is_match = {
                let region = handle
                    .try_borrow()
                    .map_err(|_| PagerError::RegionBusy(pos))?;
                predicate(&region)
            };
            if is_match {
                matched.push((pos, handle));
            }
        }

        let mut evicted = 0;
        for (pos, handle) in matched {
            // Evicted (or replaced) by an earlier hook in this walk
            if !self.container.holds(pos, &handle) {
                evicted += 1;
                continue;
            }
            if self.pinned.contains(&pos) {
                continue;
            }

            if let Err(e) = self.fire(HookEvent::Unload, pos, &handle) {
                log::warn!(
                    "[RegionPager::unload_if] Aborted after evicting {} regions: {}",
                    evicted,
                    e
                );
                return Err(e);
            }

            self.container.remove(pos);
            evicted += 1;
            log::debug!("[RegionPager::unload_if] Unloaded region {}", pos);
        }

        Ok(evicted)
    }

    /// Evict the region at `pos`. Returns whether it was resident.
    pub fn unload_region(&mut self, pos: RegionPos) -> PagerResult<bool> {
        Ok(self.unload_if(|region| region.position() == pos)? > 0)
    }

    /// Evict the region behind `handle`, matched by identity rather than
    /// coordinate. Returns whether it was resident.
    pub fn unload_handle(&mut self, handle: &RegionRef) -> PagerResult<bool> {
        let target = handle.as_ptr() as *const Region;
        Ok(self.unload_if(|region| std::ptr::eq(region, target))? > 0)
    }

    /// Run `visitor` over every resident region in coordinate order.
    ///
    /// No hooks fire. The visited region is pinned while its visitor runs,
    /// so the visitor cannot evict it. A visitor error stops the walk and is
    /// returned; regions already visited keep whatever the visitor did to
    /// them.
    pub fn for_each<V>(&mut self, mut visitor: V) -> PagerResult<()>
    where
        V: FnMut(&mut RegionPager, &RegionRef) -> anyhow::Result<()>,
    {
        for (pos, handle) in self.container.snapshot() {
            if !self.container.holds(pos, &handle) {
                continue;
            }
            let pinned_here = self.pinned.insert(pos);
            let visited = visitor(self, &handle);
            if pinned_here {
                self.pinned.remove(&pos);
            }
            visited.map_err(|source| {
                log::warn!("[RegionPager::for_each] Visitor failed at region {}: {:#}", pos, source);
                PagerError::Visitor { pos, source }
            })?;
        }
        Ok(())
    }

    /// Cell at a world tile coordinate, or `None` if its region is not resident
    pub fn get_tile(&self, tile_x: i32, tile_y: i32) -> PagerResult<Option<TileCell>> {
        let (pos, local_x, local_y) = self.locate(tile_x, tile_y);
        let Some(handle) = self.container.get(pos) else {
            return Ok(None);
        };
        let region = handle.try_borrow().map_err(|_| PagerError::RegionBusy(pos))?;
        Ok(Some(region.get_tile(local_x, local_y)?))
    }

    /// Set the tile id at a world tile coordinate. Returns the previous id,
    /// or `None` (and changes nothing) if the region is not resident.
    pub fn set_tile(&self, tile_x: i32, tile_y: i32, id: i32) -> PagerResult<Option<i32>> {
        let (pos, local_x, local_y) = self.locate(tile_x, tile_y);
        let Some(handle) = self.container.get(pos) else {
            return Ok(None);
        };
        let mut region = handle
            .try_borrow_mut()
            .map_err(|_| PagerError::RegionBusy(pos))?;
        Ok(Some(region.set_tile(local_x, local_y, id)?))
    }

    pub fn get_solid(&self, tile_x: i32, tile_y: i32) -> PagerResult<Option<bool>> {
        Ok(self.get_tile(tile_x, tile_y)?.map(|cell| cell.solid))
    }

    /// Set the solid flag at a world tile coordinate. Same residency rules
    /// as [`RegionPager::set_tile`].
    pub fn set_solid(&self, tile_x: i32, tile_y: i32, solid: bool) -> PagerResult<Option<bool>> {
        let (pos, local_x, local_y) = self.locate(tile_x, tile_y);
        let Some(handle) = self.container.get(pos) else {
            return Ok(None);
        };
        let mut region = handle
            .try_borrow_mut()
            .map_err(|_| PagerError::RegionBusy(pos))?;
        Ok(Some(region.set_solid(local_x, local_y, solid)?))
    }

    pub fn set_on_load<F>(&mut self, hook: F)
    where
        F: Fn(&mut RegionPager, &RegionRef) -> anyhow::Result<()> + 'static,
    {
        self.set_hook(HookEvent::Load, Rc::new(hook));
    }

    pub fn set_on_save<F>(&mut self, hook: F)
    where
        F: Fn(&mut RegionPager, &RegionRef) -> anyhow::Result<()> + 'static,
    {
        self.set_hook(HookEvent::Save, Rc::new(hook));
    }

    pub fn set_on_create<F>(&mut self, hook: F)
    where
        F: Fn(&mut RegionPager, &RegionRef) -> anyhow::Result<()> + 'static,
    {
        self.set_hook(HookEvent::Create, Rc::new(hook));
    }

    pub fn set_on_unload<F>(&mut self, hook: F)
    where
        F: Fn(&mut RegionPager, &RegionRef) -> anyhow::Result<()> + 'static,
    {
        self.set_hook(HookEvent::Unload, Rc::new(hook));
    }

    /// Install a hook, releasing the previous one for the same event.
    /// Returns whether a previous hook was released.
    pub fn set_hook(&mut self, event: HookEvent, hook: Hook) -> bool {
        let released = self.hooks.set(event, hook);
        log::trace!("[RegionPager::set_hook] {} set (replaced: {})", event, released);
        released
    }

    pub fn clear_hook(&mut self, event: HookEvent) -> bool {
        self.hooks.clear(event)
    }

    pub fn hook(&self, event: HookEvent) -> Option<&Hook> {
        self.hooks.get(event)
    }

    pub fn on_load(&self) -> Option<&Hook> {
        self.hooks.get(HookEvent::Load)
    }

    pub fn on_save(&self) -> Option<&Hook> {
        self.hooks.get(HookEvent::Save)
    }

    pub fn on_create(&self) -> Option<&Hook> {
        self.hooks.get(HookEvent::Create)
    }

    pub fn on_unload(&self) -> Option<&Hook> {
        self.hooks.get(HookEvent::Unload)
    }

    /// Split a world tile into region and local coordinates. `region_size`
    /// was checked against `MAX_REGION_DIMENSION` in `new`, so the `i32`
    /// casts in [`TilePos`] are lossless and never divide by zero.
    fn locate(&self, tile_x: i32, tile_y: i32) -> (RegionPos, i32, i32) {
        let tile = TilePos::new(tile_x, tile_y);
        let (local_x, local_y) = tile.to_local_pos(self.region_size);
        (tile.to_region_pos(self.region_size), local_x, local_y)
    }

    /// Reject collaborator output that does not belong at `pos`
    fn validate(&self, pos: RegionPos, region: &Region) -> PagerResult<()> {
        if region.position() != pos {
            return Err(PagerError::PositionMismatch {
                expected: pos,
                found: region.position(),
            });
        }
        if region.size() != self.region_size {
            return Err(PagerError::SizeMismatch {
                pos,
                expected: self.region_size,
                found: region.size(),
            });
        }
        Ok(())
    }

    fn fire(&mut self, event: HookEvent, pos: RegionPos, region: &RegionRef) -> PagerResult<()> {
        // Clone the handle so the hook may replace its own slot while running
        let Some(hook) = self.hooks.get(event).cloned() else {
            return Ok(());
        };

        log::trace!("[RegionPager::fire] {} for region {}", event, pos);
        let pinned_here = self.pinned.insert(pos);
        let fired = hook(self, region);
        if pinned_here {
            self.pinned.remove(&pos);
        }
        fired.map_err(|source| {
            log::warn!("[RegionPager::fire] {} hook failed for region {}: {:#}", event, pos, source);
            PagerError::Hook { event, pos, source }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::FlatGenerator;
    use crate::persistence::MemoryRegionStore;
    use std::cell::{Cell, RefCell};

    fn test_pager() -> (RegionPager, MemoryRegionStore) {
        let store = MemoryRegionStore::new();
        let pager = RegionPager::new(
            RegionSize::new(16, 16),
            Box::new(store.clone()),
            Box::new(FlatGenerator::default()),
        )
        .expect("valid region size");
        (pager, store)
    }

    fn event_log(pager: &mut RegionPager) -> Rc<RefCell<Vec<(HookEvent, RegionPos)>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        for event in HookEvent::ALL {
            let events = Rc::clone(&events);
            pager.set_hook(
                event,
                Rc::new(move |_pager: &mut RegionPager, region: &RegionRef| -> anyhow::Result<()> {
                    events.borrow_mut().push((event, region.borrow().position()));
                    Ok(())
                }),
            );
        }
        events
    }

    #[test]
    fn test_scenario_create_edit_unload() {
        let (mut pager, _store) = test_pager();
        let events = event_log(&mut pager);

        let region = pager.create_region(RegionPos::new(2, 3)).expect("create");
        assert!(region.borrow().tiles().iter().all(|cell| *cell == TileCell::new(0, false)));

        region.borrow_mut().set_tile(5, 5, 7).expect("in bounds");
        assert_eq!(region.borrow().get_tile(5, 5).expect("in bounds").id, 7);

        let evicted = pager
            .unload_if(|region| region.x() == 2 && region.y() == 3)
            .expect("unload");
        assert_eq!(evicted, 1);
        assert!(pager.get_region(RegionPos::new(2, 3)).is_none());

        let unloads = events
            .borrow()
            .iter()
            .filter(|(event, _)| *event == HookEvent::Unload)
            .count();
        assert_eq!(unloads, 1);
    }

    #[test]
    fn test_get_region_has_no_side_effects() {
        let (mut pager, store) = test_pager();
        let events = event_log(&mut pager);

        assert!(pager.get_region(RegionPos::new(0, 0)).is_none());
        assert_eq!(store.load_calls(), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_load_missing_region_returns_none_without_hook() {
        let (mut pager, store) = test_pager();
        let events = event_log(&mut pager);

        assert!(pager.load_region(RegionPos::new(1, 1)).expect("load").is_none());
        assert_eq!(store.load_calls(), 1);
        assert!(events.borrow().is_empty());
        assert_eq!(pager.container_size(), 0);
    }

    #[test]
    fn test_double_load_and_create_are_idempotent() {
        let (mut pager, mut store) = test_pager();
        store
            .save(&Region::new(RegionPos::new(4, 4), RegionSize::new(16, 16)))
            .expect("seed store");
        let events = event_log(&mut pager);

        let first = pager.load_region(RegionPos::new(4, 4)).expect("load").expect("stored");
        let second = pager.load_region(RegionPos::new(4, 4)).expect("load").expect("resident");
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(store.load_calls(), 1);

        // Create on a resident coordinate returns the loaded region untouched
        let created = pager.create_region(RegionPos::new(4, 4)).expect("create");
        assert!(Rc::ptr_eq(&first, &created));

        assert_eq!(*events.borrow(), vec![(HookEvent::Load, RegionPos::new(4, 4))]);
        assert_eq!(pager.container_size(), 1);
    }

    #[test]
    fn test_save_absent_region_is_noop() {
        let (mut pager, store) = test_pager();
        let events = event_log(&mut pager);

        assert!(pager.save_region(RegionPos::new(9, 9)).expect("save").is_none());
        assert_eq!(store.save_calls(), 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_save_keeps_region_resident() {
        let (mut pager, store) = test_pager();
        let events = event_log(&mut pager);

        let region = pager.create_region(RegionPos::new(0, 1)).expect("create");
        region.borrow_mut().set_tile(1, 1, 3).expect("in bounds");

        let saved = pager.save_region(RegionPos::new(0, 1)).expect("save").expect("resident");
        assert!(Rc::ptr_eq(&saved, &region));
        assert!(pager.is_resident(RegionPos::new(0, 1)));
        assert_eq!(store.save_calls(), 1);

        let stored = store.peek(RegionPos::new(0, 1)).expect("decode").expect("stored");
        assert_eq!(stored.get_tile(1, 1).expect("in bounds").id, 3);

        assert_eq!(
            *events.borrow(),
            vec![
                (HookEvent::Create, RegionPos::new(0, 1)),
                (HookEvent::Save, RegionPos::new(0, 1)),
            ]
        );
    }

    #[test]
    fn test_unload_if_evicts_exact_matches() {
        let (mut pager, _store) = test_pager();
        for x in -2..=2 {
            for y in -2..=2 {
                pager.create_region(RegionPos::new(x, y)).expect("create");
            }
        }
        let events = event_log(&mut pager);

        let mut evaluated = Vec::new();
        let evicted = pager
            .unload_if(|region| {
                evaluated.push(region.position());
                region.position().chebyshev_distance(RegionPos::new(0, 0)) > 1
            })
            .expect("unload");

        assert_eq!(evaluated.len(), 25);
        assert_eq!(evicted, 16);
        assert_eq!(pager.container_size(), 9);
        assert_eq!(events.borrow().len(), 16);
        assert!(events.borrow().iter().all(|(event, pos)| {
            *event == HookEvent::Unload && pos.chebyshev_distance(RegionPos::new(0, 0)) == 2
        }));
    }

    #[test]
    fn test_unload_hook_sees_resident_region_and_can_save_it() {
        let (mut pager, store) = test_pager();
        pager.create_region(RegionPos::new(1, 0)).expect("create");

        pager.set_on_unload(|pager, region| {
            let pos = region.borrow().position();
            assert!(pager.is_resident(pos));
            pager.save_region(pos)?;
            Ok(())
        });

        assert!(pager.unload_region(RegionPos::new(1, 0)).expect("unload"));
        assert!(store.contains(RegionPos::new(1, 0)));
        assert!(!pager.is_resident(RegionPos::new(1, 0)));
    }

    #[test]
    fn test_unload_hook_cannot_evict_its_own_region_twice() {
        let (mut pager, _store) = test_pager();
        pager.create_region(RegionPos::new(0, 0)).expect("create");
        pager.create_region(RegionPos::new(5, 5)).expect("create");

        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        pager.set_on_unload(move |pager, _region| {
            counter.set(counter.get() + 1);
            // Nested eviction of everything: skips the region being unloaded
            pager.unload_if(|_| true)?;
            Ok(())
        });

        let evicted = pager.unload_region(RegionPos::new(0, 0)).expect("unload");
        assert!(evicted);
        // Outer unload of (0,0) plus nested unload of (5,5)
        assert_eq!(fired.get(), 2);
        assert_eq!(pager.container_size(), 0);
    }

    #[test]
    fn test_regions_created_during_unload_are_not_visited() {
        let (mut pager, _store) = test_pager();
        pager.create_region(RegionPos::new(0, 0)).expect("create");
        pager.create_region(RegionPos::new(1, 0)).expect("create");

        pager.set_on_unload(|pager, region| {
            let pos = region.borrow().position();
            pager.create_region(pos.offset(10, 10))?;
            Ok(())
        });

        let evicted = pager.unload_if(|_| true).expect("unload");
        assert_eq!(evicted, 2);
        assert_eq!(
            pager.resident_positions(),
            vec![RegionPos::new(10, 10), RegionPos::new(11, 10)]
        );
    }

    #[test]
    fn test_unload_hook_failure_keeps_completed_work() {
        let (mut pager, _store) = test_pager();
        for x in 0..3 {
            pager.create_region(RegionPos::new(x, 0)).expect("create");
        }

        pager.set_on_unload(|_pager, region| {
            if region.borrow().x() == 1 {
                anyhow::bail!("refusing to unload");
            }
            Ok(())
        });

        let err = pager.unload_if(|_| true).expect_err("hook failure propagates");
        assert!(matches!(
            err,
            PagerError::Hook { event: HookEvent::Unload, pos, .. } if pos == RegionPos::new(1, 0)
        ));
        assert_eq!(
            pager.resident_positions(),
            vec![RegionPos::new(1, 0), RegionPos::new(2, 0)]
        );
    }

    #[test]
    fn test_unload_handle_matches_identity() {
        let (mut pager, _store) = test_pager();
        let keep = pager.create_region(RegionPos::new(0, 0)).expect("create");
        let evict = pager.create_region(RegionPos::new(0, 1)).expect("create");

        assert!(pager.unload_handle(&evict).expect("unload"));
        assert!(!pager.unload_handle(&evict).expect("second unload"));
        assert!(pager.is_resident(keep.borrow().position()));
        assert_eq!(pager.container_size(), 1);
    }

    #[test]
    fn test_for_each_failure_stops_walk() {
        let (mut pager, _store) = test_pager();
        for x in 0..4 {
            pager.create_region(RegionPos::new(x, 0)).expect("create");
        }

        let err = pager
            .for_each(|_pager, region| {
                let mut region = region.borrow_mut();
                if region.x() == 2 {
                    anyhow::bail!("visitor gave up");
                }
                region.set_tile(0, 0, 1)?;
                Ok(())
            })
            .expect_err("visitor failure propagates");
        assert!(matches!(err, PagerError::Visitor { pos, .. } if pos == RegionPos::new(2, 0)));

        let ids: Vec<_> = (0..4)
            .map(|x| pager.get_tile(x * 16, 0).expect("get").expect("resident").id)
            .collect();
        assert_eq!(ids, vec![1, 1, 0, 0]);
        assert_eq!(pager.container_size(), 4);
    }

    #[test]
    fn test_for_each_skips_regions_evicted_mid_walk() {
        let (mut pager, _store) = test_pager();
        for x in 0..3 {
            pager.create_region(RegionPos::new(x, 0)).expect("create");
        }

        let mut visited = Vec::new();
        pager
            .for_each(|pager, region| {
                let pos = region.borrow().position();
                visited.push(pos);
                if pos.x == 0 {
                    pager.unload_region(RegionPos::new(2, 0))?;
                }
                Ok(())
            })
            .expect("walk");

        assert_eq!(visited, vec![RegionPos::new(0, 0), RegionPos::new(1, 0)]);
    }

    #[test]
    fn test_world_tile_accessors_do_not_autoload() {
        let (mut pager, store) = test_pager();

        assert!(pager.get_tile(20, 5).expect("get").is_none());
        assert!(pager.set_tile(20, 5, 4).expect("set").is_none());
        assert_eq!(store.load_calls(), 0);
        assert_eq!(pager.container_size(), 0);

        // World tile (20, 5) lives in region (1, 0) at local (4, 5)
        let region = pager.create_region(RegionPos::new(1, 0)).expect("create");
        assert_eq!(pager.set_tile(20, 5, 4).expect("set"), Some(0));
        assert_eq!(pager.set_solid(20, 5, true).expect("set"), Some(false));
        assert_eq!(region.borrow().get_tile(4, 5).expect("in bounds"), TileCell::new(4, true));
        assert_eq!(pager.get_solid(20, 5).expect("get"), Some(true));

        // Negative world tiles map into negative regions
        pager.create_region(RegionPos::new(-1, -1)).expect("create");
        pager.set_tile(-1, -1, 8).expect("set");
        let corner = pager.get_region(RegionPos::new(-1, -1)).expect("resident");
        assert_eq!(corner.borrow().get_tile(15, 15).expect("in bounds").id, 8);
    }

    #[test]
    fn test_busy_region_is_reported() {
        let (mut pager, _store) = test_pager();
        let region = pager.create_region(RegionPos::new(0, 0)).expect("create");

        let _guard = region.borrow_mut();
        assert!(matches!(
            pager.save_region(RegionPos::new(0, 0)),
            Err(PagerError::RegionBusy(_))
        ));
        assert!(matches!(pager.get_tile(0, 0), Err(PagerError::RegionBusy(_))));
    }

    #[test]
    fn test_mismatched_generator_output_is_rejected() {
        let mut pager = RegionPager::new(
            RegionSize::new(16, 16),
            Box::new(MemoryRegionStore::new()),
            Box::new(|pos: RegionPos, _size: RegionSize| Region::new(pos, RegionSize::new(8, 8))),
        )
        .expect("valid region size");

        let err = pager.create_region(RegionPos::new(0, 0)).expect_err("size mismatch");
        assert!(matches!(err, PagerError::SizeMismatch { .. }));
        assert_eq!(pager.container_size(), 0);
    }

    #[test]
    fn test_hook_replacement_releases_previous() {
        let (mut pager, _store) = test_pager();
        let first = Rc::new(());
        let second = Rc::new(());

        let held = Rc::clone(&first);
        pager.set_on_save(move |_pager, _region| {
            let _held = &held;
            Ok(())
        });
        assert_eq!(Rc::strong_count(&first), 2);

        let held = Rc::clone(&second);
        pager.set_on_save(move |_pager, _region| {
            let _held = &held;
            Ok(())
        });
        assert_eq!(Rc::strong_count(&first), 1);
        assert_eq!(Rc::strong_count(&second), 2);
        assert!(pager.on_save().is_some());
        assert!(pager.on_load().is_none());

        assert!(pager.clear_hook(HookEvent::Save));
        assert_eq!(Rc::strong_count(&second), 1);
    }

    /// Install `event` hook that tries to evict its own region and records
    /// whether the eviction reported success
    fn self_evicting_hook(pager: &mut RegionPager, event: HookEvent) -> Rc<Cell<Option<bool>>> {
        let outcome = Rc::new(Cell::new(None));
        let seen = Rc::clone(&outcome);
        pager.set_hook(
            event,
            Rc::new(move |pager: &mut RegionPager, region: &RegionRef| -> anyhow::Result<()> {
                let pos = region.borrow().position();
                seen.set(Some(pager.unload_region(pos)?));
                assert!(pager.is_resident(pos));
                Ok(())
            }),
        );
        outcome
    }

    #[test]
    fn test_create_hook_cannot_evict_its_own_region() {
        let (mut pager, _store) = test_pager();
        let outcome = self_evicting_hook(&mut pager, HookEvent::Create);

        let region = pager.create_region(RegionPos::new(3, 3)).expect("create");
        assert_eq!(outcome.get(), Some(false));
        let resident = pager.get_region(RegionPos::new(3, 3)).expect("still resident");
        assert!(Rc::ptr_eq(&resident, &region));
    }

    #[test]
    fn test_load_hook_cannot_evict_its_own_region() {
        let (mut pager, mut store) = test_pager();
        store
            .save(&Region::new(RegionPos::new(-2, 1), RegionSize::new(16, 16)))
            .expect("seed store");
        let outcome = self_evicting_hook(&mut pager, HookEvent::Load);

        let region = pager.load_region(RegionPos::new(-2, 1)).expect("load").expect("stored");
        assert_eq!(outcome.get(), Some(false));
        let resident = pager.get_region(RegionPos::new(-2, 1)).expect("still resident");
        assert!(Rc::ptr_eq(&resident, &region));
    }

    #[test]
    fn test_save_hook_cannot_evict_its_own_region() {
        let (mut pager, store) = test_pager();
        pager.create_region(RegionPos::new(0, 0)).expect("create");
        let outcome = self_evicting_hook(&mut pager, HookEvent::Save);

        assert!(pager.save_region(RegionPos::new(0, 0)).expect("save").is_some());
        assert_eq!(outcome.get(), Some(false));
        assert!(pager.is_resident(RegionPos::new(0, 0)));
        assert!(store.contains(RegionPos::new(0, 0)));
    }

    #[test]
    fn test_visitor_cannot_evict_its_own_region() {
        let (mut pager, _store) = test_pager();
        for x in 0..3 {
            pager.create_region(RegionPos::new(x, 0)).expect("create");
        }

        let mut outcomes = Vec::new();
        pager
            .for_each(|pager, region| {
                let pos = region.borrow().position();
                outcomes.push(pager.unload_region(pos)?);
                Ok(())
            })
            .expect("walk");

        assert_eq!(outcomes, vec![false, false, false]);
        assert_eq!(pager.container_size(), 3);
    }

    #[test]
    fn test_create_hook_may_evict_other_regions() {
        let (mut pager, _store) = test_pager();
        pager.create_region(RegionPos::new(0, 0)).expect("create");

        pager.set_on_create(|pager, _region| {
            pager.unload_if(|_| true)?;
            Ok(())
        });
        pager.create_region(RegionPos::new(1, 0)).expect("create");

        assert_eq!(pager.resident_positions(), vec![RegionPos::new(1, 0)]);
    }

    #[test]
    fn test_unload_if_counts_matches_evicted_by_nested_calls() {
        let (mut pager, _store) = test_pager();
        for x in 0..3 {
            pager.create_region(RegionPos::new(x, 0)).expect("create");
        }

        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        pager.set_on_unload(move |pager, region| {
            counter.set(counter.get() + 1);
            if region.borrow().position() == RegionPos::new(0, 0) {
                pager.unload_region(RegionPos::new(2, 0))?;
            }
            Ok(())
        });

        let evicted = pager.unload_if(|_| true).expect("unload");
        assert_eq!(evicted, 3);
        assert_eq!(fired.get(), 3);
        assert_eq!(pager.container_size(), 0);
    }

    #[test]
    fn test_unload_if_ignores_nested_evictions_outside_its_matches() {
        let (mut pager, _store) = test_pager();
        pager.create_region(RegionPos::new(0, 0)).expect("create");
        pager.create_region(RegionPos::new(1, 0)).expect("create");

        pager.set_on_unload(|pager, region| {
            if region.borrow().x() == 0 {
                pager.unload_region(RegionPos::new(1, 0))?;
            }
            Ok(())
        });

        let evicted = pager.unload_if(|region| region.x() == 0).expect("unload");
        assert_eq!(evicted, 1);
        assert_eq!(pager.container_size(), 0);
    }

    #[test]
    fn test_create_hook_failure_keeps_region_resident() {
        let (mut pager, _store) = test_pager();
        pager.set_on_create(|_pager, _region| anyhow::bail!("create hook failed"));

        let err = pager.create_region(RegionPos::new(1, 2)).expect_err("hook failure propagates");
        assert!(matches!(
            err,
            PagerError::Hook { event: HookEvent::Create, pos, .. } if pos == RegionPos::new(1, 2)
        ));
        assert!(pager.is_resident(RegionPos::new(1, 2)));
    }

    #[test]
    fn test_load_hook_failure_keeps_region_resident() {
        let (mut pager, mut store) = test_pager();
        store
            .save(&Region::new(RegionPos::new(1, 2), RegionSize::new(16, 16)))
            .expect("seed store");
        pager.set_on_load(|_pager, _region| anyhow::bail!("load hook failed"));

        let err = pager.load_region(RegionPos::new(1, 2)).expect_err("hook failure propagates");
        assert!(matches!(
            err,
            PagerError::Hook { event: HookEvent::Load, pos, .. } if pos == RegionPos::new(1, 2)
        ));
        assert!(pager.is_resident(RegionPos::new(1, 2)));
        assert_eq!(store.load_calls(), 1);
    }

    #[test]
    fn test_save_hook_failure_keeps_region_saved() {
        let (mut pager, store) = test_pager();
        let region = pager.create_region(RegionPos::new(1, 2)).expect("create");
        region.borrow_mut().set_tile(2, 2, 6).expect("in bounds");
        pager.set_on_save(|_pager, _region| anyhow::bail!("save hook failed"));

        let err = pager.save_region(RegionPos::new(1, 2)).expect_err("hook failure propagates");
        assert!(matches!(
            err,
            PagerError::Hook { event: HookEvent::Save, pos, .. } if pos == RegionPos::new(1, 2)
        ));
        assert!(pager.is_resident(RegionPos::new(1, 2)));
        let stored = store.peek(RegionPos::new(1, 2)).expect("decode").expect("stored");
        assert_eq!(stored.get_tile(2, 2).expect("in bounds").id, 6);
    }

    #[test]
    fn test_invalid_region_size_is_rejected() {
        for size in [
            RegionSize::new(0, 0),
            RegionSize::new(16, 0),
            RegionSize::new(MAX_REGION_DIMENSION + 1, 16),
            RegionSize::new(u32::MAX, 16),
        ] {
            let result = RegionPager::new(
                size,
                Box::new(MemoryRegionStore::new()),
                Box::new(FlatGenerator::default()),
            );
            assert!(matches!(
                result,
                Err(PagerError::InvalidRegionSize { size: rejected, .. }) if rejected == size
            ));
        }
    }

    #[test]
    fn test_far_region_can_be_created() {
        let mut pager = RegionPager::new(
            RegionSize::new(16, 16),
            Box::new(MemoryRegionStore::new()),
            Box::new(crate::generation::NoiseGenerator::new(1, 0.05, 0.35)),
        )
        .expect("valid region size");

        let pos = RegionPos::new(i32::MAX / 8, i32::MIN);
        let region = pager.create_region(pos).expect("create");
        assert_eq!(region.borrow().position(), pos);
        assert!(pager.is_resident(pos));
    }
}
