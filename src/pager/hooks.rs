//! Lifecycle hook registry
//!
//! One slot per lifecycle event. Setting a slot drops whatever callback was
//! there before, so at most one callback per event is ever alive in the
//! registry.

use std::rc::Rc;

use super::RegionPager;
use crate::region::RegionRef;

/// Callback fired on a region lifecycle transition.
///
/// Hooks get the pager back and may call into it. Returning an error aborts
/// the operation that fired the hook.
pub type Hook = Rc<dyn Fn(&mut RegionPager, &RegionRef) -> anyhow::Result<()>>;

/// Region lifecycle events that can carry a hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    Load,
    Save,
    Create,
    Unload,
}

impl HookEvent {
    pub const ALL: [HookEvent; 4] = [
        HookEvent::Load,
        HookEvent::Save,
        HookEvent::Create,
        HookEvent::Unload,
    ];
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HookEvent::Load => "onLoad",
            HookEvent::Save => "onSave",
            HookEvent::Create => "onCreate",
            HookEvent::Unload => "onUnload",
        };
        f.write_str(name)
    }
}

#[derive(Default)]
pub struct HookRegistry {
    on_load: Option<Hook>,
    on_save: Option<Hook>,
    on_create: Option<Hook>,
    on_unload: Option<Hook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `hook` for `event`, releasing the previous one first.
    /// Returns whether a previous hook was released.
    pub fn set(&mut self, event: HookEvent, hook: Hook) -> bool {
        let slot = self.slot_mut(event);
        let released = slot.take().is_some();
        *slot = Some(hook);
        released
    }

    /// Release the hook for `event`. Returns whether one was held.
    pub fn clear(&mut self, event: HookEvent) -> bool {
        self.slot_mut(event).take().is_some()
    }

    pub fn get(&self, event: HookEvent) -> Option<&Hook> {
        match event {
            HookEvent::Load => self.on_load.as_ref(),
            HookEvent::Save => self.on_save.as_ref(),
            HookEvent::Create => self.on_create.as_ref(),
            HookEvent::Unload => self.on_unload.as_ref(),
        }
    }

    pub fn is_set(&self, event: HookEvent) -> bool {
        self.get(event).is_some()
    }

    fn slot_mut(&mut self, event: HookEvent) -> &mut Option<Hook> {
        match event {
            HookEvent::Load => &mut self.on_load,
            HookEvent::Save => &mut self.on_save,
            HookEvent::Create => &mut self.on_create,
            HookEvent::Unload => &mut self.on_unload,
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("on_load", &self.on_load.is_some())
            .field("on_save", &self.on_save.is_some())
            .field("on_create", &self.on_create.is_some())
            .field("on_unload", &self.on_unload.is_some())
            .finish()
    }
}
