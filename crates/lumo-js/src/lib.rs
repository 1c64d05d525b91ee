//! JavaScript engine integration for the Lumo script host.
//!
//! Uses [Boa](https://boajs.dev/) as the JavaScript engine.
//!
//! The runtime owns the Boa context plus two kinds of shared state:
//!
//! - [`HostState`] — plain native state (tree, window, schedulers,
//!   network bridge) behind an `Rc<RefCell<…>>`. Closures borrow it
//!   briefly and always release it before running script code, because
//!   script code re-enters other closures.
//! - [`JsShared`] — GC-traced state (the script value registry, wrapper
//!   caches, pending XHR objects). Everything holding a `JsValue` lives
//!   here so Boa's collector can see it.
//!
//! Script-facing objects are built with explicit property tables
//! (functions + accessors) at construction; there is no reflection
//! bridging. Script exceptions are caught at every invocation boundary,
//! logged, and never halt the engine.

pub mod host;
pub mod registry;

mod globals;

use std::cell::RefCell;
use std::rc::Rc;

use boa_engine::{Context, JsError, JsObject, JsResult, JsValue, Source};
use boa_gc::{Finalize, Gc, GcRefCell, Trace};

use lumo_common::handle::ScriptHandle;
use lumo_net::images::decode_image;
use lumo_net::{Completion, FetchOutcome};

pub use host::HostState;
pub use registry::ScriptValueRegistry;

/// GC-traced state shared between the runtime and its native closures.
#[derive(Trace, Finalize)]
pub struct JsShared {
    /// Script values held by native registries (timers, listeners).
    pub values: GcRefCell<ScriptValueRegistry>,
    /// Element wrapper cache: node id → wrapper, so scripts observe one
    /// identity per element.
    pub elements: GcRefCell<Vec<(u64, JsObject)>>,
    /// Canvas context wrapper cache: canvas node id → context wrapper.
    pub contexts: GcRefCell<Vec<(u64, JsObject)>>,
    /// In-flight XHR fetches: fetch token → request wrapper.
    pub pending_xhr: GcRefCell<Vec<(u64, JsObject)>>,
}

impl JsShared {
    fn new() -> Self {
        Self {
            values: GcRefCell::new(ScriptValueRegistry::new()),
            elements: GcRefCell::new(Vec::new()),
            contexts: GcRefCell::new(Vec::new()),
            pending_xhr: GcRefCell::new(Vec::new()),
        }
    }
}

/// What every native closure captures: the plain host state and the
/// traced shared state.
#[derive(Clone, Trace, Finalize)]
pub struct HostCaptures {
    /// Native host state; never borrowed across a script invocation.
    #[unsafe_ignore_trace]
    pub host: Rc<RefCell<HostState>>,
    /// GC-traced shared state.
    pub shared: Gc<JsShared>,
}

/// Script-level shims evaluated once at runtime construction: the bits
/// of the environment that are cheaper to express in JavaScript than to
/// bind natively.
const PRELUDE: &str = r"
XMLHttpRequest.UNSENT = 0;
XMLHttpRequest.OPENED = 1;
XMLHttpRequest.HEADERS_RECEIVED = 2;
XMLHttpRequest.LOADING = 3;
XMLHttpRequest.DONE = 4;
let navigator = { userAgent: 'Lumo (Boa)' };
class ImageData {
    constructor(data, w, h) {
        if (typeof data === 'number') {
            this.data = new Uint8ClampedArray(4);
            this.width = data;
            this.height = w;
        } else {
            this.data = data;
            this.width = w;
            this.height = h ? h : data.length / (w * 4);
        }
    }
}
class FontFace {
    constructor(family, url, desc) {
        this.family = family;
        this.url = url;
        this.desc = desc;
    }
    load() { return Promise.resolve(this); }
}
document.fonts = {
    add: (font) => {},
    check: (font, extra) => true,
    load: (font, extra) => Promise.resolve(true),
};
";

/// The JavaScript runtime for one hosted application.
///
/// Owns the Boa context; all script execution — the entry script, timer
/// and animation callbacks, XHR completions — funnels through it on the
/// host thread.
pub struct ScriptRuntime {
    context: Context,
    captures: HostCaptures,
}

impl ScriptRuntime {
    /// Create a runtime over the given host state, with every global
    /// (console, window, document, XMLHttpRequest, Image) registered and
    /// the prelude evaluated.
    #[must_use]
    pub fn new(host: Rc<RefCell<HostState>>) -> Self {
        let mut context = Context::default();
        let captures = HostCaptures {
            host,
            shared: Gc::new(JsShared::new()),
        };
        globals::register_globals(&mut context, &captures);
        if let Err(err) = context.eval(Source::from_bytes(PRELUDE)) {
            // The prelude is static; failing to evaluate it is a bug,
            // but the host keeps running without the shims.
            log_exception("prelude", &err);
        }
        Self { context, captures }
    }

    /// The shared host state.
    #[must_use]
    pub fn host(&self) -> Rc<RefCell<HostState>> {
        Rc::clone(&self.captures.host)
    }

    /// Execute JavaScript source, returning the completion value.
    ///
    /// # Errors
    ///
    /// Returns the `JsError` for syntax errors or uncaught exceptions.
    pub fn execute(&mut self, source: &str) -> JsResult<JsValue> {
        self.context.eval(Source::from_bytes(source))
    }

    /// Execute JavaScript source; exceptions are logged and contained,
    /// matching the process-wide exception handler contract.
    pub fn execute_logged(&mut self, label: &str, source: &str) {
        if let Err(err) = self.context.eval(Source::from_bytes(source)) {
            log_exception(label, &err);
        }
    }

    /// Invoke a registered callback with already-materialized arguments.
    pub fn invoke_callback(&mut self, handle: ScriptHandle, args: &[JsValue]) {
        let value = self.captures.shared.values.borrow().get(handle);
        if let Some(value) = value {
            call_value(&value, &JsValue::undefined(), args, &mut self.context);
        }
    }

    /// Invoke a registered callback, resolving argument handles first
    /// (missing slots become `undefined`).
    pub fn invoke_with_handles(&mut self, handle: ScriptHandle, args: &[ScriptHandle]) {
        let resolved: Vec<JsValue> = {
            let registry = self.captures.shared.values.borrow();
            args.iter()
                .map(|arg| registry.get(*arg).unwrap_or_default())
                .collect()
        };
        self.invoke_callback(handle, &resolved);
    }

    /// Release registry slots for handles native code no longer holds.
    pub fn release_handles<I: IntoIterator<Item = ScriptHandle>>(&mut self, handles: I) {
        let mut registry = self.captures.shared.values.borrow_mut();
        for handle in handles {
            registry.release(handle);
        }
    }

    /// Invoke the window listener for an input/focus event, if one is
    /// registered.
    pub fn deliver_window_event(&mut self, event: &str) {
        let handle = self.captures.host.borrow().window.listener(event);
        if let Some(handle) = handle {
            self.invoke_callback(handle, &[]);
        }
    }

    /// Apply one marshaled background completion on the script thread:
    /// route it to the owning XHR object or image element and dispatch
    /// the resulting callbacks in order.
    pub fn dispatch_completion(&mut self, completion: Completion) {
        let token = completion.token.raw();

        let xhr = {
            let mut pending = self.captures.shared.pending_xhr.borrow_mut();
            pending
                .iter()
                .position(|(t, _)| *t == token)
                .map(|index| pending.swap_remove(index).1)
        };
        if let Some(object) = xhr {
            let request = object
                .downcast_ref::<globals::xhr::XhrData>()
                .map(|data| data.request());
            if let Some(request) = request {
                let events = request.borrow_mut().complete(completion.outcome);
                globals::xhr::sync_object(&object, &request.borrow(), &mut self.context);
                globals::xhr::dispatch_events(&object, &events, &mut self.context);
            }
            return;
        }

        let image = {
            let mut host = self.captures.host.borrow_mut();
            host.pending_images
                .iter()
                .position(|(t, _)| *t == token)
                .map(|index| host.pending_images.swap_remove(index).1)
        };
        if let Some(node) = image {
            let result = match completion.outcome {
                // Cancelled loads are suppressed, not errors.
                FetchOutcome::Aborted => return,
                FetchOutcome::Failed(_) => Err(()),
                FetchOutcome::Response(response) => {
                    if response.status == 200 {
                        let url = self
                            .captures
                            .host
                            .borrow()
                            .dom
                            .image(node)
                            .and_then(|data| data.src.clone())
                            .unwrap_or_default();
                        decode_image(&response.body, &url).map_err(|_| ())
                    } else {
                        Err(())
                    }
                }
            };
            globals::image::finish_load(&self.captures, node, result, &mut self.context);
        }
    }
}

/// Log an uncaught script exception; execution continues for subsequent
/// independent callbacks.
pub(crate) fn log_exception(label: &str, err: &JsError) {
    eprintln!("[lumo js] uncaught exception in {label}: {err}");
}

/// Call a script value if it is callable, containing any exception.
pub(crate) fn call_value(value: &JsValue, this: &JsValue, args: &[JsValue], ctx: &mut Context) {
    if let Some(function) = value.as_callable()
        && let Err(err) = function.call(this, args, ctx)
    {
        log_exception("callback", &err);
    }
}

/// Call `object[name]` as a method if the property is callable.
pub(crate) fn call_property(object: &JsObject, name: &str, args: &[JsValue], ctx: &mut Context) {
    match object.get(boa_engine::JsString::from(name), ctx) {
        Ok(value) => call_value(&value, &JsValue::from(object.clone()), args, ctx),
        Err(err) => log_exception(name, &err),
    }
}
