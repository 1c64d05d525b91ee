//! Opaque handles to script-side values held by native code.
//!
//! Timers, event listeners, and image callbacks all hold on to script
//! functions without knowing anything about the engine. A [`ScriptHandle`]
//! names one such value; the engine layer owns the actual slot table and
//! keeps the referenced values alive for as long as a handle is out.
//!
//! Handles are allocated from a monotonic counter scoped to one
//! [`HandleAllocator`], so they are unique for the lifetime of the host.

/// An opaque reference to a script-defined value (usually a function),
/// invocable from native code via the engine layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptHandle(u64);

impl ScriptHandle {
    /// The raw id, for diagnostics only.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Monotonic allocator for [`ScriptHandle`]s.
///
/// Each registry that hands out ids owns its own allocator; ids never
/// repeat within one allocator.
#[derive(Debug, Default)]
pub struct HandleAllocator {
    next: u64,
}

impl HandleAllocator {
    /// Create an allocator starting at id 1 (0 is never handed out, so a
    /// zeroed field can't be mistaken for a live handle).
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate the next handle.
    pub fn allocate(&mut self) -> ScriptHandle {
        self.next += 1;
        ScriptHandle(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_increasing() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();
        assert!(a < b && b < c);
        assert_ne!(a, b);
        assert!(a.raw() > 0);
    }
}
