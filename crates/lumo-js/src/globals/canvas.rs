//! The 2-D rendering context wrapper and gradient objects.
//!
//! The wrapper's property table is the canvas API subset boundary: the
//! painted operations forward into [`lumo_canvas::Context2d`], the
//! accepted-but-unsupported ones log once and do nothing.

use std::cell::RefCell;
use std::rc::Rc;

use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsData, JsResult, JsString, JsValue, NativeFunction, js_string};
use boa_gc::{Finalize, GcRefCell, Trace};

use lumo_canvas::{Context2d, DrawSource, FillRule, Gradient, Rect, unsupported};
use lumo_dom::{ElementKind, NodeId};

use crate::HostCaptures;
use crate::globals::{NativeImpl, arg, element, f32_arg, function, number_arg, string_arg, u32_arg};

/// Operations accepted by the context but deliberately not painted.
const UNSUPPORTED_OPS: &[&str] = &[
    "arc",
    "bezierCurveTo",
    "quadraticCurveTo",
    "ellipse",
    "rotate",
    "scale",
    "transform",
    "stroke",
    "strokeRect",
    "strokeText",
    "setLineDash",
    "getLineDash",
    "getTransform",
    "getContextAttributes",
    "getImageData",
    "createImageData",
    "createPattern",
    "createRadialGradient",
    "createConicGradient",
    "isPointInPath",
    "isPointInStroke",
    "drawFocusIfNeeded",
];

/// Native data behind a context wrapper.
#[derive(Trace, Finalize, JsData)]
pub(crate) struct ContextData {
    /// The drawing context, owned by the canvas element.
    #[unsafe_ignore_trace]
    ctx: Rc<RefCell<Context2d>>,
    /// Non-owning back-reference to the owning canvas.
    #[unsafe_ignore_trace]
    canvas: NodeId,
    /// The raw `fillStyle` value as last assigned, for the getter.
    fill_style: GcRefCell<JsValue>,
    /// The raw `strokeStyle` value as last assigned.
    stroke_style: GcRefCell<JsValue>,
}

/// Native data behind a `CanvasGradient` object.
#[derive(Trace, Finalize, JsData)]
pub(crate) struct GradientData {
    #[unsafe_ignore_trace]
    gradient: Rc<RefCell<Gradient>>,
}

fn this_ctx(this: &JsValue) -> Option<Rc<RefCell<Context2d>>> {
    this.as_object()?
        .downcast_ref::<ContextData>()
        .map(|data| Rc::clone(&data.ctx))
}

/// Get (or build and cache) the context wrapper for a canvas element.
///
/// # Panics
///
/// Backing-store allocation failure is fatal; there is no valid context
/// without a bitmap.
#[allow(clippy::too_many_lines)]
pub(crate) fn get_context(
    captures: &HostCaptures,
    node: NodeId,
    context: &mut Context,
) -> JsResult<JsValue> {
    let raw = node.0 as u64;
    let cached = captures
        .shared
        .contexts
        .borrow()
        .iter()
        .find(|(id, _)| *id == raw)
        .map(|(_, object)| object.clone());
    if let Some(object) = cached {
        return Ok(JsValue::from(object));
    }

    let ctx = match captures.host.borrow_mut().dom.canvas_context(node) {
        Ok(Some(ctx)) => ctx,
        Ok(None) => return Ok(JsValue::null()),
        Err(err) => panic!("fatal: canvas backing store allocation failed: {err}"),
    };

    let f = |context: &mut Context, body: NativeImpl, name: &str, length: usize| {
        function(context, captures, body, name, length)
    };
    let canvas_get = f(context, ctx_canvas_get, "get canvas", 0);
    let fill_get = f(context, fill_style_get, "get fillStyle", 0);
    let fill_set = f(context, fill_style_set, "set fillStyle", 1);
    let stroke_get = f(context, stroke_style_get, "get strokeStyle", 0);
    let stroke_set = f(context, stroke_style_set, "set strokeStyle", 1);
    let font_get = f(context, font_get_impl, "get font", 0);
    let font_set = f(context, font_set_impl, "set font", 1);
    let alpha_get = f(context, alpha_get_impl, "get globalAlpha", 0);
    let alpha_set = f(context, alpha_set_impl, "set globalAlpha", 1);
    let comp_get = f(context, composite_get_impl, "get globalCompositeOperation", 0);
    let comp_set = f(context, composite_set_impl, "set globalCompositeOperation", 1);
    let sblur_get = f(context, shadow_blur_get, "get shadowBlur", 0);
    let sblur_set = f(context, shadow_blur_set, "set shadowBlur", 1);
    let scolor_get = f(context, shadow_color_get, "get shadowColor", 0);
    let scolor_set = f(context, shadow_color_set, "set shadowColor", 1);
    let sx_get = f(context, shadow_x_get, "get shadowOffsetX", 0);
    let sx_set = f(context, shadow_x_set, "set shadowOffsetX", 1);
    let sy_get = f(context, shadow_y_get, "get shadowOffsetY", 0);
    let sy_set = f(context, shadow_y_set, "set shadowOffsetY", 1);

    let nf = |body: NativeImpl| {
        NativeFunction::from_copy_closure_with_captures(body, captures.clone())
    };

    let data = ContextData {
        ctx,
        canvas: node,
        fill_style: GcRefCell::new(JsValue::undefined()),
        stroke_style: GcRefCell::new(JsValue::undefined()),
    };
    let mut init = ObjectInitializer::with_native_data(data, context);
    init.accessor(js_string!("canvas"), Some(canvas_get), None, Attribute::all())
        .accessor(js_string!("fillStyle"), Some(fill_get), Some(fill_set), Attribute::all())
        .accessor(
            js_string!("strokeStyle"),
            Some(stroke_get),
            Some(stroke_set),
            Attribute::all(),
        )
        .accessor(js_string!("font"), Some(font_get), Some(font_set), Attribute::all())
        .accessor(
            js_string!("globalAlpha"),
            Some(alpha_get),
            Some(alpha_set),
            Attribute::all(),
        )
        .accessor(
            js_string!("globalCompositeOperation"),
            Some(comp_get),
            Some(comp_set),
            Attribute::all(),
        )
        .accessor(
            js_string!("shadowBlur"),
            Some(sblur_get),
            Some(sblur_set),
            Attribute::all(),
        )
        .accessor(
            js_string!("shadowColor"),
            Some(scolor_get),
            Some(scolor_set),
            Attribute::all(),
        )
        .accessor(
            js_string!("shadowOffsetX"),
            Some(sx_get),
            Some(sx_set),
            Attribute::all(),
        )
        .accessor(
            js_string!("shadowOffsetY"),
            Some(sy_get),
            Some(sy_set),
            Attribute::all(),
        )
        .function(nf(begin_path), js_string!("beginPath"), 0)
        .function(nf(close_path), js_string!("closePath"), 0)
        .function(nf(move_to), js_string!("moveTo"), 2)
        .function(nf(line_to), js_string!("lineTo"), 2)
        .function(nf(arc_to), js_string!("arcTo"), 5)
        .function(nf(rect_op), js_string!("rect"), 4)
        .function(nf(fill_op), js_string!("fill"), 0)
        .function(nf(clip_op), js_string!("clip"), 0)
        .function(nf(fill_rect), js_string!("fillRect"), 4)
        .function(nf(clear_rect), js_string!("clearRect"), 4)
        .function(nf(fill_text), js_string!("fillText"), 3)
        .function(nf(measure_text), js_string!("measureText"), 1)
        .function(nf(translate_op), js_string!("translate"), 2)
        .function(nf(set_transform), js_string!("setTransform"), 6)
        .function(nf(save_op), js_string!("save"), 0)
        .function(nf(restore_op), js_string!("restore"), 0)
        .function(nf(create_linear_gradient), js_string!("createLinearGradient"), 4)
        .function(nf(draw_image), js_string!("drawImage"), 9)
        .function(nf(put_image_data), js_string!("putImageData"), 3);
    for name in UNSUPPORTED_OPS {
        let noop = NativeFunction::from_copy_closure(
            move |_this: &JsValue, _args: &[JsValue], _ctx: &mut Context| {
                unsupported(name);
                Ok(JsValue::undefined())
            },
        );
        init.function(noop, JsString::from(*name), 0);
    }
    let object = init.build();

    captures
        .shared
        .contexts
        .borrow_mut()
        .push((raw, object.clone()));
    Ok(JsValue::from(object))
}

// ---- accessors ----

fn ctx_canvas_get(
    this: &JsValue,
    _args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let node = this
        .as_object()
        .and_then(|o| o.downcast_ref::<ContextData>().map(|d| d.canvas));
    match node {
        Some(node) => Ok(JsValue::from(element::wrapper(context, captures, node))),
        None => Ok(JsValue::null()),
    }
}

fn fill_style_get(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let value = this
        .as_object()
        .and_then(|o| o.downcast_ref::<ContextData>().map(|d| d.fill_style.borrow().clone()));
    Ok(value.unwrap_or_default())
}

fn fill_style_set(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    apply_style(this, &arg(args, 0), context, true);
    Ok(JsValue::undefined())
}

fn stroke_style_get(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let value = this.as_object().and_then(|o| {
        o.downcast_ref::<ContextData>()
            .map(|d| d.stroke_style.borrow().clone())
    });
    Ok(value.unwrap_or_default())
}

fn stroke_style_set(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    apply_style(this, &arg(args, 0), context, false);
    Ok(JsValue::undefined())
}

/// Shared fill/stroke style application: strings go through the color
/// grammar, gradient objects attach by handle, everything else is
/// ignored by the engine (and logged there).
fn apply_style(this: &JsValue, value: &JsValue, context: &mut Context, fill: bool) {
    let css = if value.is_string() {
        Some(string_arg(value, context))
    } else {
        None
    };
    let gradient = value
        .as_object()
        .and_then(|o| o.downcast_ref::<GradientData>().map(|d| Rc::clone(&d.gradient)));

    let Some(object) = this.as_object() else {
        return;
    };
    let Some(data) = object.downcast_ref::<ContextData>() else {
        return;
    };
    if let Some(css) = css {
        let mut ctx = data.ctx.borrow_mut();
        if fill {
            ctx.set_fill_css(&css);
        } else {
            ctx.set_stroke_css(&css);
        }
    } else if let Some(gradient) = gradient {
        let mut ctx = data.ctx.borrow_mut();
        if fill {
            ctx.set_fill_gradient(gradient);
        } else {
            ctx.set_stroke_gradient(gradient);
        }
    }
    let slot = if fill { &data.fill_style } else { &data.stroke_style };
    *slot.borrow_mut() = value.clone();
}

fn font_get_impl(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let px = this_ctx(this).map_or(0.0, |ctx| ctx.borrow().font_px());
    Ok(JsValue::from(JsString::from(format!("{px}px"))))
}

fn font_set_impl(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let font = string_arg(&arg(args, 0), context);
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().set_font(&font);
    }
    Ok(JsValue::undefined())
}

fn alpha_get_impl(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let alpha = this_ctx(this).map_or(1.0, |ctx| ctx.borrow().global_alpha());
    Ok(JsValue::from(f64::from(alpha)))
}

fn alpha_set_impl(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let alpha = f32_arg(&arg(args, 0), context);
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().set_global_alpha(alpha);
    }
    Ok(JsValue::undefined())
}

fn composite_get_impl(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let op = this_ctx(this).map_or_else(
        || "source-over".to_string(),
        |ctx| ctx.borrow().composite_op().to_string(),
    );
    Ok(JsValue::from(JsString::from(op)))
}

fn composite_set_impl(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let op = string_arg(&arg(args, 0), context);
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().set_composite_op(&op);
    }
    Ok(JsValue::undefined())
}

fn shadow_blur_get(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let blur = this_ctx(this).map_or(0.0, |ctx| ctx.borrow().shadow().blur);
    Ok(JsValue::from(f64::from(blur)))
}

fn shadow_blur_set(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let blur = f32_arg(&arg(args, 0), context);
    if let Some(ctx) = this_ctx(this) {
        let mut ctx = ctx.borrow_mut();
        let shadow = ctx.shadow();
        ctx.set_shadow_geometry(shadow.offset_x, shadow.offset_y, blur);
    }
    Ok(JsValue::undefined())
}

fn shadow_color_get(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let color = this_ctx(this).map_or_else(String::new, |ctx| {
        let c = ctx.borrow().shadow().color;
        format!("rgba({},{},{},{})", c.r, c.g, c.b, f32::from(c.a) / 255.0)
    });
    Ok(JsValue::from(JsString::from(color)))
}

fn shadow_color_set(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let css = string_arg(&arg(args, 0), context);
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().set_shadow_color(&css);
    }
    Ok(JsValue::undefined())
}

fn shadow_x_get(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let x = this_ctx(this).map_or(0.0, |ctx| ctx.borrow().shadow().offset_x);
    Ok(JsValue::from(f64::from(x)))
}

fn shadow_x_set(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let x = f32_arg(&arg(args, 0), context);
    if let Some(ctx) = this_ctx(this) {
        let mut ctx = ctx.borrow_mut();
        let shadow = ctx.shadow();
        ctx.set_shadow_geometry(x, shadow.offset_y, shadow.blur);
    }
    Ok(JsValue::undefined())
}

fn shadow_y_get(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    let y = this_ctx(this).map_or(0.0, |ctx| ctx.borrow().shadow().offset_y);
    Ok(JsValue::from(f64::from(y)))
}

fn shadow_y_set(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let y = f32_arg(&arg(args, 0), context);
    if let Some(ctx) = this_ctx(this) {
        let mut ctx = ctx.borrow_mut();
        let shadow = ctx.shadow();
        ctx.set_shadow_geometry(shadow.offset_x, y, shadow.blur);
    }
    Ok(JsValue::undefined())
}

// ---- path & paint methods ----

fn begin_path(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().begin_path();
    }
    Ok(JsValue::undefined())
}

fn close_path(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().close_path();
    }
    Ok(JsValue::undefined())
}

fn move_to(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let (x, y) = (f32_arg(&arg(args, 0), context), f32_arg(&arg(args, 1), context));
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().move_to(x, y);
    }
    Ok(JsValue::undefined())
}

fn line_to(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let (x, y) = (f32_arg(&arg(args, 0), context), f32_arg(&arg(args, 1), context));
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().line_to(x, y);
    }
    Ok(JsValue::undefined())
}

fn arc_to(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let n: Vec<f32> = (0..5).map(|i| f32_arg(&arg(args, i), context)).collect();
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().arc_to(n[0], n[1], n[2], n[3], n[4]);
    }
    Ok(JsValue::undefined())
}

fn rect_op(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let n: Vec<f32> = (0..4).map(|i| f32_arg(&arg(args, i), context)).collect();
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().rect(n[0], n[1], n[2], n[3]);
    }
    Ok(JsValue::undefined())
}

fn fill_op(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let rule = if arg(args, 0).is_string() {
        Some(string_arg(&arg(args, 0), context))
    } else {
        None
    };
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().fill(FillRule::from_rule(rule.as_deref()));
    }
    Ok(JsValue::undefined())
}

fn clip_op(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().clip();
    }
    Ok(JsValue::undefined())
}

fn fill_rect(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let n: Vec<f32> = (0..4).map(|i| f32_arg(&arg(args, i), context)).collect();
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().fill_rect(n[0], n[1], n[2], n[3]);
    }
    Ok(JsValue::undefined())
}

fn clear_rect(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let n: Vec<f32> = (0..4).map(|i| f32_arg(&arg(args, i), context)).collect();
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().clear_rect(n[0], n[1], n[2], n[3]);
    }
    Ok(JsValue::undefined())
}

fn fill_text(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let text = string_arg(&arg(args, 0), context);
    let (x, y) = (f32_arg(&arg(args, 1), context), f32_arg(&arg(args, 2), context));
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().fill_text(&text, x, y);
    }
    Ok(JsValue::undefined())
}

fn measure_text(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let text = string_arg(&arg(args, 0), context);
    let metrics = this_ctx(this).map_or(
        lumo_canvas::TextMetrics {
            width: 0.0,
            height: 0.0,
        },
        |ctx| ctx.borrow().measure_text(&text),
    );
    let object = ObjectInitializer::new(context)
        .property(
            js_string!("width"),
            JsValue::from(f64::from(metrics.width)),
            Attribute::all(),
        )
        .property(
            js_string!("height"),
            JsValue::from(f64::from(metrics.height)),
            Attribute::all(),
        )
        .build();
    Ok(JsValue::from(object))
}

fn translate_op(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let (x, y) = (f32_arg(&arg(args, 0), context), f32_arg(&arg(args, 1), context));
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().translate(x, y);
    }
    Ok(JsValue::undefined())
}

fn set_transform(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let n: Vec<f32> = (0..6).map(|i| f32_arg(&arg(args, i), context)).collect();
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().set_transform(n[0], n[1], n[2], n[3], n[4], n[5]);
    }
    Ok(JsValue::undefined())
}

fn save_op(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().save();
    }
    Ok(JsValue::undefined())
}

fn restore_op(
    this: &JsValue,
    _args: &[JsValue],
    _captures: &HostCaptures,
    _context: &mut Context,
) -> JsResult<JsValue> {
    if let Some(ctx) = this_ctx(this) {
        ctx.borrow_mut().restore();
    }
    Ok(JsValue::undefined())
}

// ---- gradients ----

fn create_linear_gradient(
    _this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let n: Vec<f32> = (0..4).map(|i| f32_arg(&arg(args, i), context)).collect();
    let gradient = Rc::new(RefCell::new(Gradient::linear(n[0], n[1], n[2], n[3])));
    let object = ObjectInitializer::with_native_data(GradientData { gradient }, context)
        .function(
            NativeFunction::from_copy_closure(gradient_add_color_stop),
            js_string!("addColorStop"),
            2,
        )
        .build();
    Ok(JsValue::from(object))
}

fn gradient_add_color_stop(
    this: &JsValue,
    args: &[JsValue],
    context: &mut Context,
) -> JsResult<JsValue> {
    let offset = f32_arg(&arg(args, 0), context);
    let color = string_arg(&arg(args, 1), context);
    if let Some(data) = this.as_object().and_then(|o| o.downcast_ref::<GradientData>()) {
        data.gradient.borrow_mut().add_color_stop(offset, &color);
    }
    Ok(JsValue::undefined())
}

// ---- images ----

/// Resolve a `drawImage` source once at the call boundary.
///
/// `None` means "skip silently" (a canvas with no context yet, or an
/// image that never finished decoding); `Unsupported` means the value is
/// not a drawable element at all.
fn resolve_source(value: &JsValue, captures: &HostCaptures) -> Option<DrawSource> {
    let Some(node) = element::this_node(value) else {
        return Some(DrawSource::Unsupported);
    };
    let host = captures.host.borrow();
    match host.dom.get(node).map(|n| &n.kind) {
        Some(ElementKind::Canvas(data)) => data
            .context
            .as_ref()
            .map(|ctx| DrawSource::Canvas(ctx.borrow().bitmap().clone())),
        Some(ElementKind::Image(data)) => {
            data.bitmap.as_ref().map(|img| DrawSource::Image(img.clone()))
        }
        _ => Some(DrawSource::Unsupported),
    }
}

fn draw_image(
    this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let Some(ctx) = this_ctx(this) else {
        return Ok(JsValue::undefined());
    };
    let Some(source) = resolve_source(&arg(args, 0), captures) else {
        return Ok(JsValue::undefined());
    };
    let n: Vec<f32> = (1..args.len())
        .map(|i| f32_arg(&arg(args, i), context))
        .collect();

    let (src_rect, dest) = match n.len() {
        len if len >= 8 => (
            Some(Rect::new(n[0], n[1], n[2], n[3])),
            Rect::new(n[4], n[5], n[6], n[7]),
        ),
        len if len >= 4 => (None, Rect::new(n[0], n[1], n[2], n[3])),
        len if len >= 2 => {
            let (w, h) = match &source {
                DrawSource::Canvas(bitmap) => (bitmap.width(), bitmap.height()),
                DrawSource::Image(image) => (image.width(), image.height()),
                DrawSource::Unsupported => (0, 0),
            };
            let natural = Rect::new(n[0], n[1], w as f32, h as f32);
            (None, natural)
        }
        _ => return Ok(JsValue::undefined()),
    };

    ctx.borrow_mut().draw_image(&source, src_rect, dest);
    Ok(JsValue::undefined())
}

#[allow(clippy::cast_possible_truncation)]
fn put_image_data(
    this: &JsValue,
    args: &[JsValue],
    _captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let Some(ctx) = this_ctx(this) else {
        return Ok(JsValue::undefined());
    };
    let Some(image_data) = arg(args, 0).as_object().cloned() else {
        return Ok(JsValue::undefined());
    };

    let width = u32_arg(&image_data.get(js_string!("width"), context)?, context);
    let height = u32_arg(&image_data.get(js_string!("height"), context)?, context);
    let Some(pixels) = image_data
        .get(js_string!("data"), context)?
        .as_object()
        .cloned()
    else {
        return Ok(JsValue::undefined());
    };

    let expected = (width as usize) * (height as usize) * 4;
    let length = u32_arg(&pixels.get(js_string!("length"), context)?, context) as usize;
    let mut bytes = Vec::with_capacity(expected.min(length));
    for index in 0..length.min(expected) {
        let value = pixels.get(index as u32, context)?;
        bytes.push(number_arg(&value, context).clamp(0.0, 255.0) as u8);
    }

    let dx = number_arg(&arg(args, 1), context) as i32;
    let dy = number_arg(&arg(args, 2), context) as i32;
    ctx.borrow_mut().put_image_data(&bytes, width, height, dx, dy);
    Ok(JsValue::undefined())
}
