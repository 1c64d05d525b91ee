//! Timer and animation-frame scheduling.
//!
//! Both registries are plain owned state driven by the host loop's clock;
//! nothing here knows about the scripting engine. Entries carry
//! [`ScriptHandle`]s, and every removal hands the released handles back so
//! the engine layer can drop its side of the registry.
//!
//! Ids are monotonic counters scoped to each queue, so they are unique
//! for the host's lifetime.

pub mod frames;
pub mod timers;

pub use frames::{FrameId, FrameQueue};
pub use timers::{FiredTimer, TimerId, TimerQueue};
