//! Element wrappers: one JS object per arena node, built from an
//! explicit per-subtype property table and cached so scripts observe a
//! single identity per element.

use boa_engine::object::ObjectInitializer;
use boa_engine::object::builtins::{JsArray, JsFunction};
use boa_engine::property::Attribute;
use boa_engine::{
    Context, JsData, JsObject, JsResult, JsString, JsValue, NativeFunction, Source, js_string,
};
use boa_gc::{Finalize, Trace};

use lumo_common::bundle::is_bundle_url;
use lumo_common::warning::warn_once;
use lumo_dom::{AppendEffect, ElementKind, NodeId};

use crate::globals::{NativeImpl, arg, canvas, f32_arg, function, image, string_arg, u32_arg};
use crate::{HostCaptures, call_property, log_exception};

/// Native data carried by every element wrapper.
#[derive(Trace, Finalize, JsData)]
pub(crate) struct ElementData {
    /// The wrapped arena node.
    #[unsafe_ignore_trace]
    pub(crate) node: NodeId,
}

/// Native data carried by a style element's `sheet` object.
#[derive(Trace, Finalize, JsData)]
pub(crate) struct SheetData {
    #[unsafe_ignore_trace]
    node: NodeId,
}

/// The wrapped node behind `this`, when `this` is an element wrapper.
pub(crate) fn this_node(this: &JsValue) -> Option<NodeId> {
    this.as_object()?
        .downcast_ref::<ElementData>()
        .map(|data| data.node)
}

#[derive(Clone, Copy)]
enum Kind {
    Generic,
    Document,
    Script,
    Style,
    Input,
    Image,
    Video,
    Canvas,
}

/// Get or build the wrapper for `node`.
#[allow(clippy::too_many_lines)]
pub(crate) fn wrapper(context: &mut Context, captures: &HostCaptures, node: NodeId) -> JsObject {
    let raw = node.0 as u64;
    let cached = captures
        .shared
        .elements
        .borrow()
        .iter()
        .find(|(id, _)| *id == raw)
        .map(|(_, object)| object.clone());
    if let Some(object) = cached {
        return object;
    }

    let (kind, tag) = {
        let host = captures.host.borrow();
        let kind = match host.dom.get(node).map(|n| &n.kind) {
            Some(ElementKind::Document) => Kind::Document,
            Some(ElementKind::Script(_)) => Kind::Script,
            Some(ElementKind::Style(_)) => Kind::Style,
            Some(ElementKind::Input(_)) => Kind::Input,
            Some(ElementKind::Image(_)) => Kind::Image,
            Some(ElementKind::Video(_)) => Kind::Video,
            Some(ElementKind::Canvas(_)) => Kind::Canvas,
            _ => Kind::Generic,
        };
        let tag = host.dom.get(node).map_or("", |n| n.kind.tag());
        (kind, tag)
    };

    // Accessor functions are built up front; the initializer below holds
    // the exclusive context borrow.
    let id_get = function(context, captures, element_id_get, "get id", 0);
    let id_set = function(context, captures, element_id_set, "set id", 1);
    let kind_accessors = build_kind_accessors(context, captures, &kind);
    let sheet = match kind {
        Kind::Style => {
            let insert = NativeFunction::from_copy_closure_with_captures(
                sheet_insert_rule as NativeImpl,
                captures.clone(),
            );
            Some(
                ObjectInitializer::with_native_data(SheetData { node }, context)
                    .function(insert, js_string!("insertRule"), 1)
                    .build(),
            )
        }
        _ => None,
    };
    let video_style = match kind {
        Kind::Video => Some(ObjectInitializer::new(context).build()),
        _ => None,
    };

    let nf = |body: NativeImpl| {
        NativeFunction::from_copy_closure_with_captures(body, captures.clone())
    };

    let mut init = ObjectInitializer::with_native_data(ElementData { node }, context);
    init.property(js_string!("tag"), JsString::from(tag), Attribute::all())
        .accessor(js_string!("id"), Some(id_get), Some(id_set), Attribute::all())
        .function(nf(element_append_child), js_string!("appendChild"), 1)
        .function(nf(element_get_by_id), js_string!("getElementById"), 1)
        .function(nf(element_get_by_tag), js_string!("getElementsByTagName"), 1)
        .function(nf(element_add_listener), js_string!("addEventListener"), 2)
        .function(nf(element_remove_listener), js_string!("removeEventListener"), 2)
        .function(nf(element_remove), js_string!("remove"), 0);

    match &kind {
        Kind::Document => {
            init.function(nf(document_create_element), js_string!("createElement"), 1);
        }
        Kind::Script => {
            let [src_get, src_set] = take2(&kind_accessors, 0);
            init.accessor(js_string!("src"), Some(src_get), Some(src_set), Attribute::all());
        }
        Kind::Style => {
            if let Some(sheet) = sheet {
                init.property(js_string!("sheet"), sheet, Attribute::all());
            }
        }
        Kind::Input => {
            let [type_get, type_set] = take2(&kind_accessors, 0);
            let [value_get, value_set] = take2(&kind_accessors, 2);
            init.accessor(js_string!("type"), Some(type_get), Some(type_set), Attribute::all())
                .accessor(
                    js_string!("value"),
                    Some(value_get),
                    Some(value_set),
                    Attribute::all(),
                )
                .function(nf(input_check_validity), js_string!("checkValidity"), 0);
        }
        Kind::Image => {
            let [src_get, src_set] = take2(&kind_accessors, 0);
            let [w_get, w_set] = take2(&kind_accessors, 2);
            let [h_get, h_set] = take2(&kind_accessors, 4);
            init.accessor(js_string!("src"), Some(src_get), Some(src_set), Attribute::all())
                .accessor(js_string!("width"), Some(w_get), Some(w_set), Attribute::all())
                .accessor(js_string!("height"), Some(h_get), Some(h_set), Attribute::all())
                .function(nf(image_remove_attribute), js_string!("removeAttribute"), 1);
        }
        Kind::Video => {
            let [w_get, w_set] = take2(&kind_accessors, 0);
            let [h_get, h_set] = take2(&kind_accessors, 2);
            let [t_get, t_set] = take2(&kind_accessors, 4);
            let [m_get, m_set] = take2(&kind_accessors, 6);
            init.accessor(js_string!("width"), Some(w_get), Some(w_set), Attribute::all())
                .accessor(js_string!("height"), Some(h_get), Some(h_set), Attribute::all())
                .accessor(
                    js_string!("currentTime"),
                    Some(t_get),
                    Some(t_set),
                    Attribute::all(),
                )
                .accessor(js_string!("muted"), Some(m_get), Some(m_set), Attribute::all())
                .function(nf(video_set_attribute), js_string!("setAttribute"), 2)
                .function(nf(video_get_attribute), js_string!("getAttribute"), 1)
                .function(nf(video_remove_attribute), js_string!("removeAttribute"), 1)
                .function(nf(video_load), js_string!("load"), 0)
                .function(nf(video_play), js_string!("play"), 0)
                .function(nf(video_pause), js_string!("pause"), 0);
            if let Some(style) = video_style {
                init.property(js_string!("style"), style, Attribute::all());
            }
        }
        Kind::Canvas => {
            let [w_get, w_set] = take2(&kind_accessors, 0);
            let [h_get, h_set] = take2(&kind_accessors, 2);
            init.accessor(js_string!("width"), Some(w_get), Some(w_set), Attribute::all())
                .accessor(js_string!("height"), Some(h_get), Some(h_set), Attribute::all())
                .function(nf(canvas_get_context), js_string!("getContext"), 2);
        }
        Kind::Generic => {}
    }

    let object = init.build();
    captures
        .shared
        .elements
        .borrow_mut()
        .push((raw, object.clone()));
    object
}

/// Build the flat accessor list for a subtype (getter/setter pairs in a
/// fixed order consumed by [`wrapper`]).
fn build_kind_accessors(
    context: &mut Context,
    captures: &HostCaptures,
    kind: &Kind,
) -> Vec<JsFunction> {
    let f = |context: &mut Context, body: NativeImpl, name: &str, length: usize| {
        function(context, captures, body, name, length)
    };
    match kind {
        Kind::Script => vec![
            f(context, script_src_get, "get src", 0),
            f(context, script_src_set, "set src", 1),
        ],
        Kind::Input => vec![
            f(context, input_type_get, "get type", 0),
            f(context, input_type_set, "set type", 1),
            f(context, input_value_get, "get value", 0),
            f(context, input_value_set, "set value", 1),
        ],
        Kind::Image => vec![
            f(context, image_src_get, "get src", 0),
            f(context, image_src_set, "set src", 1),
            f(context, image_width_get, "get width", 0),
            f(context, image_width_set, "set width", 1),
            f(context, image_height_get, "get height", 0),
            f(context, image_height_set, "set height", 1),
        ],
        Kind::Video => vec![
            f(context, video_width_get, "get width", 0),
            f(context, video_width_set, "set width", 1),
            f(context, video_height_get, "get height", 0),
            f(context, video_height_set, "set height", 1),
            f(context, video_time_get, "get currentTime", 0),
            f(context, video_time_set, "set currentTime", 1),
            f(context, video_muted_get, "get muted", 0),
            f(context, video_muted_set, "set muted", 1),
        ],
        Kind::Canvas => vec![
            f(context, canvas_width_get, "get width", 0),
            f(context, canvas_width_set, "set width", 1),
            f(context, canvas_height_get, "get height", 0),
            f(context, canvas_height_set, "set height", 1),
        ],
        _ => Vec::new(),
    }
}

fn take2(accessors: &[JsFunction], start: usize) -> [JsFunction; 2] {
    [accessors[start].clone(), accessors[start + 1].clone()]
}

// ---- common element surface ----

fn element_id_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let id = this_node(this)
        .and_then(|node| captures.host.borrow().dom.get(node).map(|n| n.id.clone()))
        .unwrap_or_default();
    Ok(JsValue::from(JsString::from(id)))
}

fn element_id_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let id = string_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this)
        && let Some(entry) = captures.host.borrow_mut().dom.get_mut(node)
    {
        entry.id = id;
    }
    Ok(JsValue::undefined())
}

fn element_append_child(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let Some(parent) = this_node(this) else {
        return Ok(JsValue::undefined());
    };
    let Some(child) = this_node(&arg(args, 0)) else {
        return Ok(JsValue::undefined());
    };

    let effect = captures.host.borrow_mut().dom.append_child(parent, child);
    match effect {
        AppendEffect::None => {}
        AppendEffect::CanvasAttached(canvas) => {
            captures.host.borrow_mut().attached_canvas = Some(canvas);
        }
        AppendEffect::LoadScript(script) => load_script(captures, script, context),
    }
    Ok(JsValue::undefined())
}

/// Synchronously load and evaluate a `<script>` element's bundled
/// source, then fire its `onload`.
fn load_script(captures: &HostCaptures, node: NodeId, context: &mut Context) {
    let src = captures
        .host
        .borrow()
        .dom
        .script(node)
        .and_then(|data| data.src.clone());
    let Some(src) = src else {
        return;
    };
    if src.is_empty() {
        return;
    }
    if !is_bundle_url(&src) {
        warn_once("dom", &format!("script src '{src}' is not bundle-relative; not loaded"));
        return;
    }

    let code = captures.host.borrow().bundle.read_to_string(&src);
    match code {
        Ok(code) => {
            if let Err(err) = context.eval(Source::from_bytes(code.as_bytes())) {
                log_exception(&src, &err);
            }
            let object = wrapper(context, captures, node);
            call_property(&object, "onload", &[], context);
        }
        Err(err) => warn_once("dom", &format!("failed to load script: {err}")),
    }
}

fn element_get_by_id(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let id = string_arg(&arg(args, 0), context);
    let found = this_node(this)
        .and_then(|node| captures.host.borrow().dom.get_element_by_id(node, &id));
    match found {
        Some(node) => Ok(JsValue::from(wrapper(context, captures, node))),
        None => Ok(JsValue::null()),
    }
}

fn element_get_by_tag(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let tag = string_arg(&arg(args, 0), context);
    let nodes = this_node(this).map_or_else(Vec::new, |node| {
        captures.host.borrow().dom.get_elements_by_tag_name(node, &tag)
    });
    let wrappers: Vec<JsValue> = nodes
        .into_iter()
        .map(|node| JsValue::from(wrapper(context, captures, node)))
        .collect();
    Ok(JsValue::from(JsArray::from_iter(wrappers, context)))
}

fn element_add_listener(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let event = string_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this) {
        let handle = captures.shared.values.borrow_mut().register(arg(args, 1));
        let replaced = captures
            .host
            .borrow_mut()
            .dom
            .set_listener(node, &event, handle);
        if let Some(old) = replaced {
            captures.shared.values.borrow_mut().release(old);
        }
    }
    Ok(JsValue::undefined())
}

fn element_remove_listener(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let event = string_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this) {
        let removed = captures.host.borrow_mut().dom.remove_listener(node, &event);
        if let Some(handle) = removed {
            captures.shared.values.borrow_mut().release(handle);
        }
    }
    Ok(JsValue::undefined())
}

fn element_remove(
    _this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    Ok(JsValue::undefined())
}

// ---- document ----

fn document_create_element(
    _this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let tag = string_arg(&arg(args, 0), context);
    let node = captures.host.borrow_mut().dom.create_element(&tag);
    Ok(JsValue::from(wrapper(context, captures, node)))
}

// ---- script ----

fn script_src_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let src = this_node(this)
        .and_then(|node| captures.host.borrow().dom.script(node).and_then(|d| d.src.clone()));
    Ok(src.map_or(JsValue::null(), |s| JsValue::from(JsString::from(s))))
}

fn script_src_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let src = string_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.script_mut(node)
    {
        data.src = Some(src);
    }
    Ok(JsValue::undefined())
}

// ---- style ----

fn sheet_insert_rule(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let rule = string_arg(&arg(args, 0), context);
    let node = this
        .as_object()
        .and_then(|o| o.downcast_ref::<SheetData>().map(|d| d.node));
    if let Some(node) = node
        && let Some(data) = captures.host.borrow_mut().dom.style_mut(node)
    {
        data.rules.push(rule);
    }
    Ok(JsValue::undefined())
}

// ---- input ----

fn input_type_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let value = this_node(this).and_then(|node| {
        match &captures.host.borrow().dom.get(node)?.kind {
            ElementKind::Input(data) => data.input_type.clone(),
            _ => None,
        }
    });
    Ok(value.map_or(JsValue::null(), |s| JsValue::from(JsString::from(s))))
}

fn input_type_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let value = string_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.input_mut(node)
    {
        data.input_type = Some(value);
    }
    Ok(JsValue::undefined())
}

fn input_value_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let value = this_node(this).and_then(|node| {
        match &captures.host.borrow().dom.get(node)?.kind {
            ElementKind::Input(data) => data.value.clone(),
            _ => None,
        }
    });
    Ok(value.map_or(JsValue::null(), |s| JsValue::from(JsString::from(s))))
}

fn input_value_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let value = string_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.input_mut(node)
    {
        data.value = Some(value);
    }
    Ok(JsValue::undefined())
}

fn input_check_validity(
    _this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    Ok(JsValue::from(true))
}

// ---- image ----

fn image_src_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let src = this_node(this)
        .and_then(|node| captures.host.borrow().dom.image(node).and_then(|d| d.src.clone()));
    Ok(src.map_or(JsValue::null(), |s| JsValue::from(JsString::from(s))))
}

fn image_src_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let src = string_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this)
        && !src.is_empty()
    {
        image::set_src(captures, node, &src, context);
    }
    Ok(JsValue::undefined())
}

fn image_width_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let width = this_node(this)
        .and_then(|node| captures.host.borrow().dom.image(node).map(|d| d.width))
        .unwrap_or(0);
    Ok(JsValue::from(f64::from(width)))
}

fn image_width_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let width = u32_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.image_mut(node)
    {
        data.width = width;
    }
    Ok(JsValue::undefined())
}

fn image_height_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let height = this_node(this)
        .and_then(|node| captures.host.borrow().dom.image(node).map(|d| d.height))
        .unwrap_or(0);
    Ok(JsValue::from(f64::from(height)))
}

fn image_height_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let height = u32_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.image_mut(node)
    {
        data.height = height;
    }
    Ok(JsValue::undefined())
}

fn image_remove_attribute(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let name = string_arg(&arg(args, 0), context);
    if name == "src"
        && let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.image_mut(node)
    {
        data.src = None;
        data.bitmap = None;
    }
    Ok(JsValue::undefined())
}

// ---- video ----

fn video_width_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let width = this_node(this)
        .and_then(|node| match &captures.host.borrow().dom.get(node)?.kind {
            ElementKind::Video(data) => Some(data.width),
            _ => None,
        })
        .unwrap_or(0);
    Ok(JsValue::from(f64::from(width)))
}

fn video_width_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let width = u32_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.video_mut(node)
    {
        data.width = width;
    }
    Ok(JsValue::undefined())
}

fn video_height_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let height = this_node(this)
        .and_then(|node| match &captures.host.borrow().dom.get(node)?.kind {
            ElementKind::Video(data) => Some(data.height),
            _ => None,
        })
        .unwrap_or(0);
    Ok(JsValue::from(f64::from(height)))
}

fn video_height_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let height = u32_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.video_mut(node)
    {
        data.height = height;
    }
    Ok(JsValue::undefined())
}

fn video_time_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let time = this_node(this)
        .and_then(|node| match &captures.host.borrow().dom.get(node)?.kind {
            ElementKind::Video(data) => Some(data.current_time),
            _ => None,
        })
        .unwrap_or(0.0);
    Ok(JsValue::from(time))
}

fn video_time_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let time = f64::from(f32_arg(&arg(args, 0), context));
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.video_mut(node)
    {
        data.current_time = time;
    }
    Ok(JsValue::undefined())
}

fn video_muted_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let muted = this_node(this)
        .and_then(|node| match &captures.host.borrow().dom.get(node)?.kind {
            ElementKind::Video(data) => Some(data.muted),
            _ => None,
        })
        .unwrap_or(false);
    Ok(JsValue::from(muted))
}

fn video_muted_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let muted = arg(args, 0).to_boolean();
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.video_mut(node)
    {
        data.muted = muted;
    }
    Ok(JsValue::undefined())
}

fn video_set_attribute(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let name = string_arg(&arg(args, 0), context);
    let value = string_arg(&arg(args, 1), context);
    if let Some(node) = this_node(this) {
        let mut host = captures.host.borrow_mut();
        match name.as_str() {
            "id" => {
                if let Some(entry) = host.dom.get_mut(node) {
                    entry.id = value;
                }
            }
            "src" => {
                if let Some(data) = host.dom.video_mut(node) {
                    data.src = value;
                }
            }
            _ => {}
        }
    }
    Ok(JsValue::undefined())
}

fn video_get_attribute(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let name = string_arg(&arg(args, 0), context);
    if name == "src" {
        let src = this_node(this).and_then(|node| {
            match &captures.host.borrow().dom.get(node)?.kind {
                ElementKind::Video(data) => Some(data.src.clone()),
                _ => None,
            }
        });
        if let Some(src) = src {
            return Ok(JsValue::from(JsString::from(src)));
        }
    }
    Ok(JsValue::null())
}

fn video_remove_attribute(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let name = string_arg(&arg(args, 0), context);
    if name == "src"
        && let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.video_mut(node)
    {
        data.src.clear();
    }
    Ok(JsValue::undefined())
}

fn video_load(
    _this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    Ok(JsValue::undefined())
}

fn video_play(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.video_mut(node)
    {
        data.playing = true;
    }
    Ok(JsValue::undefined())
}

fn video_pause(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    if let Some(node) = this_node(this)
        && let Some(data) = captures.host.borrow_mut().dom.video_mut(node)
    {
        data.playing = false;
    }
    Ok(JsValue::undefined())
}

// ---- canvas element ----

fn canvas_width_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let width = this_node(this)
        .and_then(|node| captures.host.borrow().dom.canvas(node).map(|d| d.width))
        .unwrap_or(0);
    Ok(JsValue::from(f64::from(width)))
}

fn canvas_width_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let width = u32_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this) {
        resize_canvas(captures, node, Some(width), None);
    }
    Ok(JsValue::undefined())
}

fn canvas_height_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let height = this_node(this)
        .and_then(|node| captures.host.borrow().dom.canvas(node).map(|d| d.height))
        .unwrap_or(0);
    Ok(JsValue::from(f64::from(height)))
}

fn canvas_height_set(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let height = u32_arg(&arg(args, 0), context);
    if let Some(node) = this_node(this) {
        resize_canvas(captures, node, None, Some(height));
    }
    Ok(JsValue::undefined())
}

/// Backing-store reallocation failure is fatal: there is no degraded
/// mode for a canvas that cannot hold pixels.
fn resize_canvas(captures: &HostCaptures, node: NodeId, width: Option<u32>, height: Option<u32>) {
    if let Err(err) = captures
        .host
        .borrow_mut()
        .dom
        .set_canvas_size(node, width, height)
    {
        panic!("fatal: canvas backing store reallocation failed: {err}");
    }
}

fn canvas_get_context(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let Some(node) = this_node(this) else {
        return Ok(JsValue::null());
    };
    // The type string is accepted but only a 2-D context materializes.
    let _requested = string_arg(&arg(args, 0), context);
    canvas::get_context(captures, node, context)
}
