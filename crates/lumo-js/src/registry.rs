//! The script value registry: GC-rooted storage for script values held
//! by native code.
//!
//! Timers, listeners, and image callbacks identify script functions with
//! plain [`ScriptHandle`] ids; the JsValues themselves live here, in
//! GC-traced slots, so Boa keeps them alive exactly as long as some
//! native registry still references them. Releasing a handle drops the
//! slot and lets the engine collect the function.

use boa_engine::JsValue;
use boa_gc::{Finalize, Trace};
use lumo_common::handle::{HandleAllocator, ScriptHandle};

/// Handle → JsValue slot table. Owned by the runtime, traced by the GC.
#[derive(Default, Trace, Finalize)]
pub struct ScriptValueRegistry {
    #[unsafe_ignore_trace]
    alloc: HandleAllocator,
    slots: Vec<(u64, JsValue)>,
}

impl ScriptValueRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value and hand back its handle.
    pub fn register(&mut self, value: JsValue) -> ScriptHandle {
        let handle = self.alloc.allocate();
        self.slots.push((handle.raw(), value));
        handle
    }

    /// Look up a value by handle.
    #[must_use]
    pub fn get(&self, handle: ScriptHandle) -> Option<JsValue> {
        self.slots
            .iter()
            .find(|(raw, _)| *raw == handle.raw())
            .map(|(_, value)| value.clone())
    }

    /// Drop a slot, returning its value. Idempotent.
    pub fn release(&mut self, handle: ScriptHandle) -> Option<JsValue> {
        let index = self
            .slots
            .iter()
            .position(|(raw, _)| *raw == handle.raw())?;
        Some(self.slots.swap_remove(index).1)
    }

    /// Number of live slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slots are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
