//! One-shot and repeating timers.

use lumo_common::handle::ScriptHandle;
use std::time::{Duration, Instant};

/// Identifies one registered timer. Monotonic per queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
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

#[derive(Debug)]
struct TimerEntry {
    id: TimerId,
    due: Instant,
    interval: Option<Duration>,
    callback: ScriptHandle,
    args: Vec<ScriptHandle>,
}

/// A timer that became due, ready for invocation.
#[derive(Debug)]
pub struct FiredTimer {
    /// The timer's id.
    pub id: TimerId,
    /// The callback to invoke.
    pub callback: ScriptHandle,
    /// Extra arguments forwarded to the callback.
    pub args: Vec<ScriptHandle>,
    /// Whether the entry stays registered (intervals) or was removed
    /// before this invocation (one-shots).
    pub repeating: bool,
}

/// The timer registry, owned by the host loop.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    entries: Vec<TimerEntry>,
}

impl TimerQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }

    /// Register a one-shot timer.
    ///
    /// A zero delay makes the entry due immediately — it fires on the
    /// next host-loop iteration, never synchronously in the registering
    /// call stack.
    pub fn set_timeout(
        &mut self,
        callback: ScriptHandle,
        args: Vec<ScriptHandle>,
        delay: Duration,
        now: Instant,
    ) -> TimerId {
        let id = self.next_id();
        self.entries.push(TimerEntry {
            id,
            due: now + delay,
            interval: None,
            callback,
            args,
        });
        id
    }

    /// Register a repeating timer.
    pub fn set_interval(
        &mut self,
        callback: ScriptHandle,
        args: Vec<ScriptHandle>,
        interval: Duration,
        now: Instant,
    ) -> TimerId {
        let id = self.next_id();
        self.entries.push(TimerEntry {
            id,
            due: now + interval,
            interval: Some(interval),
            callback,
            args,
        });
        id
    }

    /// Cancel a timer. Idempotent: unknown or already-fired ids are a
    /// no-op. Returns the handles the entry held, for release.
    pub fn clear(&mut self, id: TimerId) -> Vec<ScriptHandle> {
        let Some(index) = self.entries.iter().position(|e| e.id == id) else {
            return Vec::new();
        };
        let entry = self.entries.swap_remove(index);
        let mut released = entry.args;
        released.push(entry.callback);
        released
    }

    /// Collect every timer due at `now`, in non-decreasing due-time order
    /// (ties break by id, which is registration order).
    ///
    /// One-shot entries are removed from the registry *before* the caller
    /// invokes them; repeating entries are rescheduled to `now + interval`
    /// with no burst catch-up.
    pub fn fire_due(&mut self, now: Instant) -> Vec<FiredTimer> {
        let mut fired: Vec<(Instant, FiredTimer)> = Vec::new();
        let mut index = 0;
        while index < self.entries.len() {
            if self.entries[index].due > now {
                index += 1;
                continue;
            }
            if let Some(interval) = self.entries[index].interval {
                let entry = &mut self.entries[index];
                let was_due = entry.due;
                entry.due = now + interval;
                fired.push((
                    was_due,
                    FiredTimer {
                        id: entry.id,
                        callback: entry.callback,
                        args: entry.args.clone(),
                        repeating: true,
                    },
                ));
                index += 1;
            } else {
                let entry = self.entries.remove(index);
                fired.push((
                    entry.due,
                    FiredTimer {
                        id: entry.id,
                        callback: entry.callback,
                        args: entry.args,
                        repeating: false,
                    },
                ));
            }
        }
        fired.sort_by_key(|(due, f)| (*due, f.id));
        fired.into_iter().map(|(_, f)| f).collect()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no timers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
