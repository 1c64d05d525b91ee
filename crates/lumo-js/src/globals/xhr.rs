//! The `XMLHttpRequest` constructor and request wrappers.
//!
//! Each wrapper carries an [`XhrRequest`] state machine as native data.
//! State transitions come back as ordered event lists; this module syncs
//! the script-visible fields (`readyState`, `status`, `responseText`,
//! `response`) onto the wrapper and then calls the `on*` handler
//! properties in exactly that order. Handlers are plain properties the
//! script assigns; they are read at dispatch time.

use std::cell::RefCell;
use std::rc::Rc;

use boa_engine::object::builtins::JsArrayBuffer;
use boa_engine::object::{FunctionObjectBuilder, ObjectInitializer};
use boa_engine::property::Attribute;
use boa_engine::{
    Context, JsData, JsObject, JsResult, JsString, JsValue, NativeFunction, js_string,
};
use boa_gc::{Finalize, Trace};

use lumo_common::bundle::is_bundle_url;
use lumo_common::warning::warn_once;
use lumo_net::{ResponseBody, TransportRequest, XhrEvent, XhrRequest};

use crate::HostCaptures;
use crate::globals::{NativeImpl, arg, function, string_arg};
use crate::{call_property, log_exception};

/// Native data behind a request wrapper.
#[derive(Trace, Finalize, JsData)]
pub(crate) struct XhrData {
    #[unsafe_ignore_trace]
    inner: Rc<RefCell<XhrRequest>>,
}

impl XhrData {
    /// The underlying state machine.
    pub(crate) fn request(&self) -> Rc<RefCell<XhrRequest>> {
        Rc::clone(&self.inner)
    }
}

fn this_request(this: &JsValue) -> Option<Rc<RefCell<XhrRequest>>> {
    this.as_object()?
        .downcast_ref::<XhrData>()
        .map(|data| data.request())
}

/// Register the `XMLHttpRequest` constructor. The readyState constants
/// (0–4) are attached by the prelude, mirroring how the environment has
/// always set them up.
pub(crate) fn register(context: &mut Context, captures: &HostCaptures) {
    let constructor = FunctionObjectBuilder::new(
        context.realm(),
        NativeFunction::from_copy_closure_with_captures(construct as NativeImpl, captures.clone()),
    )
    .name(js_string!("XMLHttpRequest"))
    .length(0)
    .constructor(true)
    .build();

    context
        .register_global_property(js_string!("XMLHttpRequest"), constructor, Attribute::all())
        .expect("XMLHttpRequest global should not already exist");
}

fn construct(
    _this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let response_type_get = function(context, captures, response_type_get_impl, "get responseType", 0);
    let response_type_set = function(context, captures, response_type_set_impl, "set responseType", 1);

    let nf = |body: NativeImpl| {
        NativeFunction::from_copy_closure_with_captures(body, captures.clone())
    };
    let data = XhrData {
        inner: Rc::new(RefCell::new(XhrRequest::new())),
    };
    let request = data.request();
    let object = ObjectInitializer::with_native_data(data, context)
        .function(nf(xhr_open), js_string!("open"), 2)
        .function(nf(xhr_send), js_string!("send"), 1)
        .function(nf(xhr_set_request_header), js_string!("setRequestHeader"), 2)
        .function(nf(xhr_get_response_header), js_string!("getResponseHeader"), 1)
        .function(
            nf(xhr_get_all_response_headers),
            js_string!("getAllResponseHeaders"),
            0,
        )
        .accessor(
            js_string!("responseType"),
            Some(response_type_get),
            Some(response_type_set),
            Attribute::all(),
        )
        .build();

    sync_object(&object, &request.borrow(), context);
    Ok(JsValue::from(object))
}

fn response_type_get_impl(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let name = this_request(this).map_or("", |request| {
        match request.borrow().response_type() {
            lumo_net::ResponseType::Text => "text",
            lumo_net::ResponseType::Json => "json",
            lumo_net::ResponseType::ArrayBuffer => "arraybuffer",
        }
    });
    Ok(JsValue::from(JsString::from(name)))
}

fn response_type_set_impl(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let value = string_arg(&arg(args, 0), context);
    if let Some(request) = this_request(this) {
        request.borrow_mut().set_response_type(&value);
    }
    Ok(JsValue::undefined())
}

fn xhr_open(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let method = string_arg(&arg(args, 0), context);
    let url = string_arg(&arg(args, 1), context);
    // async/user/password are accepted and ignored; every request is
    // asynchronous from the script's point of view.
    let Some(object) = this.as_object().cloned() else {
        return Ok(JsValue::undefined());
    };
    let Some(request) = this_request(this) else {
        return Ok(JsValue::undefined());
    };
    let events = request.borrow_mut().open(&method, &url);
    sync_object(&object, &request.borrow(), context);
    dispatch_events(&object, &events, context);
    Ok(JsValue::undefined())
}

fn xhr_set_request_header(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let name = string_arg(&arg(args, 0), context);
    let value = string_arg(&arg(args, 1), context);
    if let Some(request) = this_request(this) {
        request.borrow_mut().set_request_header(&name, &value);
    }
    Ok(JsValue::undefined())
}

fn xhr_send(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let Some(object) = this.as_object().cloned() else {
        return Ok(JsValue::undefined());
    };
    let Some(request) = this_request(this) else {
        return Ok(JsValue::undefined());
    };
    let url = request.borrow().url().to_string();

    if is_bundle_url(&url) {
        // Bundled resources complete synchronously.
        let text = captures.host.borrow().bundle.read_to_string(&url);
        let events = match text {
            Ok(text) => request.borrow_mut().complete_bundled(text),
            Err(err) => {
                warn_once("net", &format!("bundled request failed: {err}"));
                request.borrow_mut().fail_bundled()
            }
        };
        sync_object(&object, &request.borrow(), context);
        dispatch_events(&object, &events, context);
        return Ok(JsValue::undefined());
    }

    // Loading state (and its readystatechange) precede departure.
    let events = request.borrow_mut().begin_send();
    sync_object(&object, &request.borrow(), context);
    dispatch_events(&object, &events, context);

    let body_value = arg(args, 0);
    let body = if body_value.is_string() {
        Some(string_arg(&body_value, context).into_bytes())
    } else {
        None
    };
    let transport_request = {
        let request = request.borrow();
        TransportRequest {
            method: request.method().to_string(),
            url,
            headers: request.request_headers().to_vec(),
            body,
        }
    };
    let token = captures.host.borrow_mut().net.fetch(transport_request);
    captures
        .shared
        .pending_xhr
        .borrow_mut()
        .push((token.raw(), object));
    Ok(JsValue::undefined())
}

fn xhr_get_response_header(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let name = string_arg(&arg(args, 0), context);
    let value = this_request(this).and_then(|request| request.borrow().get_response_header(&name));
    Ok(value.map_or(JsValue::null(), |v| JsValue::from(JsString::from(v))))
}

fn xhr_get_all_response_headers(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let value = this_request(this).and_then(|request| request.borrow().get_all_response_headers());
    Ok(value.map_or(JsValue::null(), |v| JsValue::from(JsString::from(v))))
}

/// Mirror the state machine's script-visible fields onto the wrapper.
pub(crate) fn sync_object(object: &JsObject, request: &XhrRequest, context: &mut Context) {
    let set = |object: &JsObject, key: &str, value: JsValue, context: &mut Context| {
        if let Err(err) = object.set(JsString::from(key), value, false, context) {
            log_exception("xhr state sync", &err);
        }
    };
    set(
        object,
        "readyState",
        JsValue::from(i32::from(request.ready_state().code())),
        context,
    );
    set(object, "status", JsValue::from(i32::from(request.status())), context);
    set(
        object,
        "statusText",
        JsValue::from(JsString::from(request.status_text())),
        context,
    );
    set(
        object,
        "responseText",
        request
            .response_text()
            .map_or(JsValue::null(), |text| JsValue::from(JsString::from(text))),
        context,
    );
    let response = match request.response() {
        None => JsValue::null(),
        Some(ResponseBody::Text(text)) => JsValue::from(JsString::from(text.as_str())),
        Some(ResponseBody::Json(value)) => {
            JsValue::from_json(value, context).unwrap_or(JsValue::null())
        }
        Some(ResponseBody::Bytes(bytes)) => JsArrayBuffer::from_byte_block(bytes.clone(), context)
            .map_or(JsValue::null(), JsValue::from),
    };
    set(object, "response", response, context);
}

/// Invoke the wrapper's handler properties for an ordered event list.
pub(crate) fn dispatch_events(object: &JsObject, events: &[XhrEvent], context: &mut Context) {
    for event in events {
        let name = match event {
            XhrEvent::ReadyStateChange => "onreadystatechange",
            XhrEvent::Load => "onload",
            XhrEvent::LoadEnd => "onloadend",
            XhrEvent::Error => "onerror",
        };
        call_property(object, name, &[], context);
    }
}
