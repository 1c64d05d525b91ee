//! The Lumo host loop.
//!
//! A [`Host`] owns the script runtime and drives all time: each ~17 ms
//! tick drains the marshaling queue (background completions re-entering
//! the script context), fires due timers, flushes the animation-frame
//! batch, and — when the attached canvas reports itself dirty — extracts
//! a snapshot and publishes it to the [`FrameSink`].
//!
//! Everything script-visible happens on the thread that calls
//! [`Host::tick`]; ticks never overlap, so a long callback delays the
//! next tick rather than interleaving with it.

pub mod frame;

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use boa_engine::JsValue;

use lumo_common::bundle::BundleResources;
use lumo_js::host::HostState;
use lumo_js::ScriptRuntime;
use lumo_net::{Completion, HttpTransport, Transport};

pub use frame::{DiscardSink, Frame, FrameSink};

/// Host configuration: display size reported to scripts, tick cadence,
/// and the bundle root.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// `window.innerWidth` and published frame target.
    pub display_width: u32,
    /// `window.innerHeight`.
    pub display_height: u32,
    /// Tick interval for [`Host::run`]/[`Host::run_for`].
    pub tick_interval: Duration,
    /// Root directory of the application bundle.
    pub bundle_dir: std::path::PathBuf,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            display_width: 1920,
            display_height: 1080,
            tick_interval: Duration::from_millis(17),
            bundle_dir: std::path::PathBuf::from("."),
        }
    }
}

/// The host: script runtime, completion receiver, and frame sink.
pub struct Host {
    runtime: ScriptRuntime,
    completions: Receiver<Completion>,
    sink: Box<dyn FrameSink>,
    tick_interval: Duration,
}

impl Host {
    /// A host over the production HTTP transport.
    pub fn new(config: HostConfig, sink: impl FrameSink + 'static) -> Self {
        Self::with_transport(config, sink, Arc::new(HttpTransport))
    }

    /// A host over a caller-supplied transport (tests use mocks).
    pub fn with_transport(
        config: HostConfig,
        sink: impl FrameSink + 'static,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let bundle = BundleResources::new(config.bundle_dir);
        let (state, completions) = HostState::new(
            config.display_width,
            config.display_height,
            bundle,
            transport,
        );
        Self {
            runtime: ScriptRuntime::new(state),
            completions,
            sink: Box::new(sink),
            tick_interval: config.tick_interval,
        }
    }

    /// The script runtime, for embedding and tests.
    pub fn runtime(&mut self) -> &mut ScriptRuntime {
        &mut self.runtime
    }

    /// Load and evaluate the application's entry script from the bundle.
    ///
    /// Script exceptions are logged and contained; only a missing bundle
    /// file is an error.
    ///
    /// # Errors
    ///
    /// When the bundle resource cannot be read.
    pub fn load_entry_script(&mut self, url: &str) -> anyhow::Result<()> {
        let source = {
            let state = self.runtime.host();
            let source = state
                .borrow()
                .bundle
                .read_to_string(url)
                .with_context(|| format!("failed to load entry script '{url}'"))?;
            source
        };
        self.runtime.execute_logged(url, &source);
        Ok(())
    }

    /// Deliver an input/focus event into the scripting environment.
    pub fn deliver_event(&mut self, event: &str) {
        self.runtime.deliver_window_event(event);
    }

    /// One host tick: completions, timers, animation frames, frame
    /// publication.
    pub fn tick(&mut self) {
        let now = Instant::now();

        // Background completions re-enter the script context here and
        // nowhere else.
        while let Ok(completion) = self.completions.try_recv() {
            self.runtime.dispatch_completion(completion);
        }

        // Due timers, one-shots already removed from the registry.
        let fired = self.runtime.host().borrow_mut().timers.fire_due(now);
        for timer in fired {
            self.runtime.invoke_with_handles(timer.callback, &timer.args);
            if !timer.repeating {
                let mut released = timer.args;
                released.push(timer.callback);
                self.runtime.release_handles(released);
            }
        }

        // The animation-frame batch swaps out before any invocation, so
        // re-registrations land in the next tick.
        let batch = self.runtime.host().borrow_mut().frames.take();
        if !batch.is_empty() {
            let timestamp = self.runtime.host().borrow().now_millis();
            for (_, callback) in &batch {
                self.runtime
                    .invoke_callback(*callback, &[JsValue::from(timestamp)]);
            }
            self.runtime
                .release_handles(batch.into_iter().map(|(_, callback)| callback));
        }

        self.publish_frame();
    }

    /// Snapshot and publish the attached canvas when (and only when) it
    /// is dirty.
    fn publish_frame(&mut self) {
        let snapshot = {
            let state = self.runtime.host();
            let state = state.borrow();
            let context = state
                .attached_canvas
                .and_then(|canvas| state.dom.existing_canvas_context(canvas));
            context.and_then(|context| {
                let mut context = context.borrow_mut();
                if context.is_dirty() {
                    context.snapshot()
                } else {
                    None
                }
            })
        };
        if let Some(image) = snapshot {
            self.sink.publish(Frame { image });
        }
    }

    /// Drive a fixed number of ticks at the configured cadence.
    pub fn run_for(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick();
            std::thread::sleep(self.tick_interval);
        }
    }

    /// Drive ticks until the process exits.
    pub fn run(&mut self) {
        loop {
            self.tick();
            std::thread::sleep(self.tick_interval);
        }
    }
}
