//! The native host state the script-facing globals operate on.
//!
//! One [`HostState`] aggregates the element tree, the window, both
//! scheduler queues, the network bridge, and the bundle — everything the
//! bindings mutate and the host loop drives. It lives in an
//! `Rc<RefCell<…>>` shared between the runtime's closures and the loop;
//! the single-thread invariant makes that sound.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use lumo_common::bundle::BundleResources;
use lumo_dom::window::{Location, Window};
use lumo_dom::{Dom, NodeId};
use lumo_net::{Completion, NetBridge, Transport};
use lumo_sched::{FrameQueue, TimerQueue};

/// Shared, mutable host state.
pub struct HostState {
    /// The element tree.
    pub dom: Dom,
    /// Window state (dimensions, hash, window listeners).
    pub window: Window,
    /// Static location fields.
    pub location: Location,
    /// The timer registry.
    pub timers: TimerQueue,
    /// The animation-frame registry.
    pub frames: FrameQueue,
    /// Background fetch spawner.
    pub net: NetBridge,
    /// Bundled resources.
    pub bundle: BundleResources,
    /// The canvas the host loop publishes frames for, once one is
    /// appended to the body.
    pub attached_canvas: Option<NodeId>,
    /// In-flight image loads: fetch token → image element.
    pub pending_images: Vec<(u64, NodeId)>,
    /// Reference point for animation timestamps.
    pub epoch: Instant,
}

impl HostState {
    /// Assemble host state for a display of `width × height`, returning
    /// the completion receiver the host loop will drain.
    pub fn new(
        width: u32,
        height: u32,
        bundle: BundleResources,
        transport: Arc<dyn Transport>,
    ) -> (Rc<RefCell<Self>>, Receiver<Completion>) {
        let (net, receiver) = NetBridge::new(transport);
        let state = Self {
            dom: Dom::new(),
            window: Window::new(width, height),
            location: Location::default(),
            timers: TimerQueue::new(),
            frames: FrameQueue::new(),
            net,
            bundle,
            attached_canvas: None,
            pending_images: Vec::new(),
            epoch: Instant::now(),
        };
        (Rc::new(RefCell::new(state)), receiver)
    }

    /// Milliseconds since host start, the timestamp handed to
    /// animation-frame callbacks.
    #[must_use]
    pub fn now_millis(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}
