//! Script-facing global objects.
//!
//! Every object the hosted application sees — `console`, `window`,
//! `document`, element wrappers, the canvas context, `XMLHttpRequest`,
//! `Image` — is assembled here from an explicit table of functions and
//! accessors. Native state rides along as object data
//! ([`boa_engine::JsData`]) or inside the shared captures; nothing is
//! exposed by reflection.

pub(crate) mod canvas;
pub(crate) mod console;
pub(crate) mod document;
pub(crate) mod element;
pub(crate) mod image;
pub(crate) mod window;
pub(crate) mod xhr;

use boa_engine::object::FunctionObjectBuilder;
use boa_engine::object::builtins::JsFunction;
use boa_engine::{Context, JsResult, JsString, JsValue, NativeFunction};

use crate::HostCaptures;

/// The uniform shape of a captures-carrying native implementation.
pub(crate) type NativeImpl =
    fn(&JsValue, &[JsValue], &HostCaptures, &mut Context) -> JsResult<JsValue>;

/// Register every global on a fresh context. Called once per runtime.
pub(crate) fn register_globals(context: &mut Context, captures: &HostCaptures) {
    console::register(context);
    let location = window::build_location(context, captures);
    window::register(context, captures, &location);
    document::register(context, captures, &location);
    xhr::register(context, captures);
    image::register(context, captures);
}

/// Build a named function object around a captures-carrying
/// implementation.
pub(crate) fn function(
    context: &mut Context,
    captures: &HostCaptures,
    body: NativeImpl,
    name: &str,
    length: usize,
) -> JsFunction {
    FunctionObjectBuilder::new(
        context.realm(),
        NativeFunction::from_copy_closure_with_captures(body, captures.clone()),
    )
    .name(JsString::from(name))
    .length(length)
    .build()
}

/// Argument as a Rust string; non-convertible values become empty.
pub(crate) fn string_arg(value: &JsValue, context: &mut Context) -> String {
    value
        .to_string(context)
        .map(|s| s.to_std_string_escaped())
        .unwrap_or_default()
}

/// Argument as a finite f64; anything else becomes 0.
pub(crate) fn number_arg(value: &JsValue, context: &mut Context) -> f64 {
    let number = value.to_number(context).unwrap_or(0.0);
    if number.is_finite() { number } else { 0.0 }
}

/// Argument as an f32 coordinate.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn f32_arg(value: &JsValue, context: &mut Context) -> f32 {
    number_arg(value, context) as f32
}

/// Argument as a non-negative integer (dimensions, ids).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn u32_arg(value: &JsValue, context: &mut Context) -> u32 {
    number_arg(value, context).max(0.0) as u32
}

/// The `i`-th argument or `undefined`.
pub(crate) fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or_default()
}
