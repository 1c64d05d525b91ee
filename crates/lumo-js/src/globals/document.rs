//! The `document` global.
//!
//! The document is an element wrapper (so it shares the common element
//! surface, including the factory `createElement` and the shallow
//! lookups) with `body`, `head`, and `location` attached.

use boa_engine::property::Attribute;
use boa_engine::{Context, JsObject, js_string};

use crate::HostCaptures;
use crate::globals::element;

/// Register the document global on the context.
pub(crate) fn register(context: &mut Context, captures: &HostCaptures, location: &JsObject) {
    let (document_node, body_node, head_node) = {
        let host = captures.host.borrow();
        (host.dom.document(), host.dom.body(), host.dom.head())
    };

    let document = element::wrapper(context, captures, document_node);
    let body = element::wrapper(context, captures, body_node);
    let head = element::wrapper(context, captures, head_node);

    document
        .set(js_string!("body"), body, false, context)
        .expect("document.body should be assignable");
    document
        .set(js_string!("head"), head, false, context)
        .expect("document.head should be assignable");
    document
        .set(js_string!("location"), location.clone(), false, context)
        .expect("document.location should be assignable");

    context
        .register_global_property(js_string!("document"), document, Attribute::all())
        .expect("document global should not already exist");
}
