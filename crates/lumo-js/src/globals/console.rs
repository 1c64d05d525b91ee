//! The `console` global: `log`, `warn`, `error`, and `time`, all
//! forwarding to host logging.

use boa_engine::{
    Context, JsResult, JsValue, NativeFunction, js_string, object::ObjectInitializer,
    property::Attribute,
};

/// Register the console object on the context.
pub(crate) fn register(context: &mut Context) {
    let console = ObjectInitializer::new(context)
        .function(
            NativeFunction::from_copy_closure(console_log),
            js_string!("log"),
            0,
        )
        .function(
            NativeFunction::from_copy_closure(console_warn),
            js_string!("warn"),
            0,
        )
        .function(
            NativeFunction::from_copy_closure(console_error),
            js_string!("error"),
            0,
        )
        .function(
            NativeFunction::from_copy_closure(console_time),
            js_string!("time"),
            0,
        )
        .build();

    context
        .register_global_property(js_string!("console"), console, Attribute::all())
        .expect("console global should not already exist");
}

fn console_log(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    println!("[js] {}", join_args(args, context)?);
    Ok(JsValue::undefined())
}

fn console_warn(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    println!("[js warn] {}", join_args(args, context)?);
    Ok(JsValue::undefined())
}

fn console_error(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    eprintln!("[js error] {}", join_args(args, context)?);
    Ok(JsValue::undefined())
}

fn console_time(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    println!("[js] time {}", join_args(args, context)?);
    Ok(JsValue::undefined())
}

/// Convert each argument to a string and join with spaces.
fn join_args(args: &[JsValue], context: &mut Context) -> JsResult<String> {
    let strings: Result<Vec<String>, _> = args
        .iter()
        .map(|value| value.to_string(context).map(|s| s.to_std_string_escaped()))
        .collect();
    Ok(strings?.join(" "))
}
