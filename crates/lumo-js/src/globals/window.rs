//! The `window` global: display dimensions, the location object, the
//! timer/animation-frame surface, window event listeners, and the live
//! `hash` accessor pair.
//!
//! The timer and animation-frame functions are also registered as bare
//! globals so scripts can call `setTimeout(...)` without the `window.`
//! prefix.

use std::time::{Duration, Instant};

use boa_engine::object::ObjectInitializer;
use boa_engine::object::builtins::JsFunction;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsObject, JsResult, JsValue, js_string};

use lumo_sched::{FrameId, TimerId};

use crate::HostCaptures;
use crate::call_value;
use crate::globals::{arg, function, number_arg, string_arg};

/// Build the shared location object (used by both `window.location` and
/// `document.location`).
pub(crate) fn build_location(context: &mut Context, captures: &HostCaptures) -> JsObject {
    let fields = captures.host.borrow().location.clone();
    let hash_get = function(context, captures, location_hash_get, "get hash", 0);
    let hash_set = function(context, captures, location_hash_set, "set hash", 1);
    let noop = function(context, captures, location_noop, "assign", 1);
    let to_string = function(context, captures, location_to_string, "toString", 0);

    let text = |s: &str| boa_engine::JsString::from(s);
    ObjectInitializer::new(context)
        .property(
            js_string!("ancestorOrigins"),
            text(fields.ancestor_origins),
            Attribute::all(),
        )
        .property(js_string!("href"), text(fields.href), Attribute::all())
        .property(js_string!("protocol"), text(fields.protocol), Attribute::all())
        .property(js_string!("host"), text(fields.host), Attribute::all())
        .property(js_string!("hostname"), text(fields.hostname), Attribute::all())
        .property(js_string!("port"), text(fields.port), Attribute::all())
        .property(js_string!("pathname"), text(fields.pathname), Attribute::all())
        .property(js_string!("search"), text(fields.search), Attribute::all())
        .property(js_string!("origin"), text(fields.origin), Attribute::all())
        .accessor(
            js_string!("hash"),
            Some(hash_get),
            Some(hash_set),
            Attribute::all(),
        )
        .property(js_string!("assign"), noop.clone(), Attribute::all())
        .property(js_string!("reload"), noop.clone(), Attribute::all())
        .property(js_string!("replace"), noop, Attribute::all())
        .property(js_string!("toString"), to_string, Attribute::all())
        .build()
}

/// Register the window global and the bare timer/frame globals.
pub(crate) fn register(context: &mut Context, captures: &HostCaptures, location: &JsObject) {
    let (inner_width, inner_height) = {
        let host = captures.host.borrow();
        (host.window.inner_width(), host.window.inner_height())
    };

    let bare: Vec<(&str, JsFunction)> = vec![
        (
            "requestAnimationFrame",
            function(context, captures, request_animation_frame, "requestAnimationFrame", 1),
        ),
        (
            "cancelAnimationFrame",
            function(context, captures, cancel_animation_frame, "cancelAnimationFrame", 1),
        ),
        ("setTimeout", function(context, captures, set_timeout, "setTimeout", 2)),
        ("clearTimeout", function(context, captures, clear_timer, "clearTimeout", 1)),
        ("setInterval", function(context, captures, set_interval, "setInterval", 2)),
        ("clearInterval", function(context, captures, clear_timer, "clearInterval", 1)),
        (
            "addEventListener",
            function(context, captures, add_event_listener, "addEventListener", 2),
        ),
        (
            "removeEventListener",
            function(context, captures, remove_event_listener, "removeEventListener", 2),
        ),
    ];
    let set_hash = function(context, captures, window_set_hash, "setHash", 1);
    let get_hash = function(context, captures, window_get_hash, "getHash", 0);

    let mut init = ObjectInitializer::new(context);
    init.property(js_string!("location"), location.clone(), Attribute::all())
        .property(
            js_string!("innerWidth"),
            JsValue::from(f64::from(inner_width)),
            Attribute::all(),
        )
        .property(
            js_string!("innerHeight"),
            JsValue::from(f64::from(inner_height)),
            Attribute::all(),
        )
        .property(js_string!("setHash"), set_hash, Attribute::all())
        .property(js_string!("getHash"), get_hash, Attribute::all());
    for (name, func) in &bare {
        init.property(boa_engine::JsString::from(*name), func.clone(), Attribute::all());
    }
    let window = init.build();

    context
        .register_global_property(js_string!("window"), window, Attribute::all())
        .expect("window global should not already exist");
    for (name, func) in bare {
        context
            .register_global_property(boa_engine::JsString::from(name), func, Attribute::all())
            .expect("timer global should not already exist");
    }
}

// ---- timers ----

fn set_timeout(
    _this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    schedule_timer(args, captures, context, false)
}

fn set_interval(
    _this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    schedule_timer(args, captures, context, true)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn schedule_timer(
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
    repeating: bool,
) -> JsResult<JsValue> {
    let delay = Duration::from_millis(number_arg(&arg(args, 1), context).max(0.0) as u64);
    let (callback, extra) = {
        let mut registry = captures.shared.values.borrow_mut();
        let callback = registry.register(arg(args, 0));
        // The two extra arguments forwarded to the callback.
        let extra = vec![registry.register(arg(args, 2)), registry.register(arg(args, 3))];
        (callback, extra)
    };
    let id = {
        let mut host = captures.host.borrow_mut();
        if repeating {
            host.timers.set_interval(callback, extra, delay, Instant::now())
        } else {
            host.timers.set_timeout(callback, extra, delay, Instant::now())
        }
    };
    Ok(JsValue::from(id.raw() as f64))
}

/// `clearTimeout` and `clearInterval` share one implementation; both are
/// idempotent cancels.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clear_timer(
    _this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let raw = number_arg(&arg(args, 0), context).max(0.0) as u64;
    let released = captures
        .host
        .borrow_mut()
        .timers
        .clear(TimerId::from_raw(raw));
    let mut registry = captures.shared.values.borrow_mut();
    for handle in released {
        registry.release(handle);
    }
    Ok(JsValue::undefined())
}

// ---- animation frames ----

#[allow(clippy::cast_precision_loss)]
fn request_animation_frame(
    _this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let callback = captures.shared.values.borrow_mut().register(arg(args, 0));
    let id = captures.host.borrow_mut().frames.request(callback);
    Ok(JsValue::from(id.raw() as f64))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cancel_animation_frame(
    _this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let raw = number_arg(&arg(args, 0), context).max(0.0) as u64;
    let released = captures
        .host
        .borrow_mut()
        .frames
        .cancel(FrameId::from_raw(raw));
    if let Some(handle) = released {
        captures.shared.values.borrow_mut().release(handle);
    }
    Ok(JsValue::undefined())
}

// ---- listeners ----

fn add_event_listener(
    _this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let event = string_arg(&arg(args, 0), context);
    let handle = captures.shared.values.borrow_mut().register(arg(args, 1));
    let replaced = captures.host.borrow_mut().window.set_listener(&event, handle);
    if let Some(old) = replaced {
        captures.shared.values.borrow_mut().release(old);
    }
    Ok(JsValue::undefined())
}

fn remove_event_listener(
    _this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let event = string_arg(&arg(args, 0), context);
    let removed = captures.host.borrow_mut().window.remove_listener(&event);
    if let Some(handle) = removed {
        captures.shared.values.borrow_mut().release(handle);
    }
    Ok(JsValue::undefined())
}

// ---- hash ----

fn window_set_hash(
    _this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let hash = string_arg(&arg(args, 0), context);
    let listener = captures.host.borrow_mut().window.set_hash(&hash);
    if let Some(handle) = listener {
        // The host borrow is released; the listener may re-enter freely.
        let value = captures.shared.values.borrow().get(handle);
        if let Some(value) = value {
            call_value(&value, &JsValue::undefined(), &[], context);
        }
    }
    Ok(JsValue::undefined())
}

fn window_get_hash(
    _this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let hash = captures.host.borrow().window.hash().to_string();
    Ok(JsValue::from(boa_engine::JsString::from(hash)))
}

fn location_hash_get(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    window_get_hash(this, args, captures, context)
}

fn location_hash_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    window_set_hash(this, args, captures, context)
}

fn location_noop(
    _this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    Ok(JsValue::undefined())
}

fn location_to_string(
    _this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    Ok(JsValue::from(js_string!("")))
}
