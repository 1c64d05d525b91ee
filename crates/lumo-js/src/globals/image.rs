//! The `Image` constructor and image loading.
//!
//! `Image.src` assignment triggers a load: bundled and `data:` sources
//! decode synchronously, network sources go through the bridge and come
//! back as marshaled completions. Success populates width/height from
//! the decoded bitmap and fires `onload`; any failure fires `onerror`
//! with no arguments.

use boa_engine::object::FunctionObjectBuilder;
use boa_engine::property::Attribute;
use boa_engine::{Context, JsResult, JsValue, NativeFunction, js_string};

use lumo_common::bundle::is_bundle_url;
use lumo_common::image::LoadedImage;
use lumo_dom::NodeId;
use lumo_net::TransportRequest;
use lumo_net::images::{decode_data_url, decode_image};

use crate::HostCaptures;
use crate::call_property;
use crate::globals::{NativeImpl, arg, element, u32_arg};

/// Register the `Image` constructor.
pub(crate) fn register(context: &mut Context, captures: &HostCaptures) {
    let constructor = FunctionObjectBuilder::new(
        context.realm(),
        NativeFunction::from_copy_closure_with_captures(construct as NativeImpl, captures.clone()),
    )
    .name(js_string!("Image"))
    .length(2)
    .constructor(true)
    .build();

    context
        .register_global_property(js_string!("Image"), constructor, Attribute::all())
        .expect("Image global should not already exist");
}

fn construct(
    _this: &JsValue,
    args: &[JsValue],
    captures: &HostCaptures,
    context: &mut Context,
) -> JsResult<JsValue> {
    let width = u32_arg(&arg(args, 0), context);
    let height = u32_arg(&arg(args, 1), context);
    let node = captures.host.borrow_mut().dom.create_image(width, height);
    Ok(JsValue::from(element::wrapper(context, captures, node)))
}

/// Begin loading `url` for an image element (called from the `src`
/// accessor).
pub(crate) fn set_src(captures: &HostCaptures, node: NodeId, url: &str, context: &mut Context) {
    {
        let mut host = captures.host.borrow_mut();
        if let Some(data) = host.dom.image_mut(node) {
            data.src = Some(url.to_string());
        }
    }

    if is_bundle_url(url) {
        let bytes = captures.host.borrow().bundle.read(url);
        let result = bytes
            .map_err(|_| ())
            .and_then(|bytes| decode_image(&bytes, url).map_err(|_| ()));
        finish_load(captures, node, result, context);
    } else if url.starts_with("data:") {
        let result = decode_data_url(url)
            .and_then(|bytes| decode_image(&bytes, url))
            .map_err(|_| ());
        finish_load(captures, node, result, context);
    } else {
        let token = captures
            .host
            .borrow_mut()
            .net
            .fetch(TransportRequest::get(url));
        captures
            .host
            .borrow_mut()
            .pending_images
            .push((token.raw(), node));
    }
}

/// Apply a finished load on the script thread and fire the element's
/// `onload`/`onerror` handler.
pub(crate) fn finish_load(
    captures: &HostCaptures,
    node: NodeId,
    result: Result<LoadedImage, ()>,
    context: &mut Context,
) {
    let handler = match result {
        Ok(image) => {
            let mut host = captures.host.borrow_mut();
            if let Some(data) = host.dom.image_mut(node) {
                data.width = image.width();
                data.height = image.height();
                data.bitmap = Some(image);
            }
            "onload"
        }
        Err(()) => "onerror",
    };
    let wrapper = element::wrapper(context, captures, node);
    call_property(&wrapper, handler, &[], context);
}
