//! The per-tick animation-frame callback queue.

use lumo_common::handle::ScriptHandle;

/// Identifies one pending animation-frame request. Monotonic per queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

impl FrameId {
    /// The raw id handed back to the script.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Rebuild an id from the script-side number.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// The animation-frame registry, owned by the host loop.
///
/// Entries are not persistent: each tick the whole queue is swapped out,
/// invoked in registration order, and discarded. Callbacks registered
/// while a batch runs land in the *next* batch — the standard
/// requestAnimationFrame contract.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    entries: Vec<(FrameId, ScriptHandle)>,
}

impl FrameQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for the next tick.
    pub fn request(&mut self, callback: ScriptHandle) -> FrameId {
        self.next_id += 1;
        let id = FrameId(self.next_id);
        self.entries.push((id, callback));
        id
    }

    /// Cancel a pending request before it fires. Returns the released
    /// handle; `None` for unknown or already-fired ids.
    pub fn cancel(&mut self, id: FrameId) -> Option<ScriptHandle> {
        let index = self.entries.iter().position(|(fid, _)| *fid == id)?;
        Some(self.entries.remove(index).1)
    }

    /// Atomically take the current batch, leaving the queue empty for
    /// registrations made during invocation.
    pub fn take(&mut self) -> Vec<(FrameId, ScriptHandle)> {
        std::mem::take(&mut self.entries)
    }

    /// Whether any callbacks are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
