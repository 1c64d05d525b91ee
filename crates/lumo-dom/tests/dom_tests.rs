//! Tests for the element arena: factory dispatch, shallow lookup,
//! append side effects, listeners, and canvas plumbing.

use lumo_common::handle::HandleAllocator;
use lumo_dom::{AppendEffect, Dom, ElementKind};

// ========== factory ==========

#[test]
fn create_element_dispatches_on_tag() {
    let mut dom = Dom::new();
    let script = dom.create_element("script");
    let style = dom.create_element("style");
    let input = dom.create_element("input");
    let canvas = dom.create_element("canvas");
    let image = dom.create_element("image");
    let video = dom.create_element("video");
    let div = dom.create_element("div");

    assert_eq!(dom.get(script).unwrap().kind.tag(), "script");
    assert_eq!(dom.get(style).unwrap().kind.tag(), "style");
    assert_eq!(dom.get(input).unwrap().kind.tag(), "input");
    assert_eq!(dom.get(canvas).unwrap().kind.tag(), "canvas");
    assert_eq!(dom.get(image).unwrap().kind.tag(), "image");
    assert_eq!(dom.get(video).unwrap().kind.tag(), "video");
    assert!(matches!(dom.get(div).unwrap().kind, ElementKind::Generic));
}

// ========== shallow lookup ==========

#[test]
fn get_element_by_id_misses_grandchildren() {
    let mut dom = Dom::new();
    let parent = dom.create_element("div");
    let child = dom.create_element("div");
    let grandchild = dom.create_element("div");

    dom.get_mut(child).unwrap().id = "child".to_string();
    dom.get_mut(grandchild).unwrap().id = "deep".to_string();
    dom.append_child(parent, child);
    dom.append_child(child, grandchild);

    assert_eq!(dom.get_element_by_id(parent, "child"), Some(child));
    assert_eq!(
        dom.get_element_by_id(parent, "deep"),
        None,
        "lookup must not recurse into grandchildren"
    );
    assert_eq!(dom.get_element_by_id(child, "deep"), Some(grandchild));
}

#[test]
fn get_elements_by_tag_name_is_shallow_and_ordered() {
    let mut dom = Dom::new();
    let parent = dom.create_element("div");
    let a = dom.create_element("video");
    let b = dom.create_element("canvas");
    let c = dom.create_element("video");
    let nested = dom.create_element("video");
    dom.append_child(parent, a);
    dom.append_child(parent, b);
    dom.append_child(parent, c);
    dom.append_child(a, nested);

    assert_eq!(dom.get_elements_by_tag_name(parent, "video"), vec![a, c]);
}

// ========== append side effects ==========

#[test]
fn body_append_reports_script_and_canvas_effects() {
    let mut dom = Dom::new();
    let body = dom.body();
    let script = dom.create_element("script");
    let canvas = dom.create_element("canvas");
    let div = dom.create_element("div");

    assert_eq!(
        dom.append_child(body, script),
        AppendEffect::LoadScript(script)
    );
    assert_eq!(
        dom.append_child(body, canvas),
        AppendEffect::CanvasAttached(canvas)
    );
    assert_eq!(dom.append_child(body, div), AppendEffect::None);
    assert_eq!(dom.get(body).unwrap().children.len(), 3);
}

#[test]
fn generic_append_has_no_side_effects() {
    let mut dom = Dom::new();
    let parent = dom.create_element("div");
    let script = dom.create_element("script");
    assert_eq!(dom.append_child(parent, script), AppendEffect::None);
}

#[test]
fn head_behaves_like_body_for_appends() {
    let mut dom = Dom::new();
    let head = dom.head();
    let script = dom.create_element("script");
    assert_eq!(
        dom.append_child(head, script),
        AppendEffect::LoadScript(script)
    );
}

// ========== listeners ==========

#[test]
fn later_listener_registration_overwrites() {
    let mut dom = Dom::new();
    let mut handles = HandleAllocator::new();
    let node = dom.create_element("div");

    let first = handles.allocate();
    let second = handles.allocate();
    assert_eq!(dom.set_listener(node, "press", first), None);
    assert_eq!(dom.set_listener(node, "press", second), Some(first));
    assert_eq!(dom.listener(node, "press"), Some(second));
    assert_eq!(dom.remove_listener(node, "press"), Some(second));
    assert_eq!(dom.listener(node, "press"), None);
}

// ========== canvas plumbing ==========

#[test]
fn canvas_context_is_created_once_and_reused() {
    let mut dom = Dom::new();
    let canvas = dom.create_element("canvas");
    dom.set_canvas_size(canvas, Some(8), Some(6)).unwrap();

    let first = dom.canvas_context(canvas).unwrap().unwrap();
    let second = dom.canvas_context(canvas).unwrap().unwrap();
    assert!(std::rc::Rc::ptr_eq(&first, &second));
    assert_eq!(first.borrow().width(), 8);
    assert_eq!(first.borrow().height(), 6);
}

#[test]
fn canvas_resize_reallocates_live_context() {
    let mut dom = Dom::new();
    let canvas = dom.create_element("canvas");
    dom.set_canvas_size(canvas, Some(4), Some(4)).unwrap();
    let context = dom.canvas_context(canvas).unwrap().unwrap();
    context.borrow_mut().set_fill_css("red");
    context.borrow_mut().fill_rect(0.0, 0.0, 4.0, 4.0);

    dom.set_canvas_size(canvas, Some(9), None).unwrap();
    assert_eq!(context.borrow().width(), 9);
    assert_eq!(context.borrow().bitmap().get_pixel(0, 0).0, [0, 0, 0, 0]);
}

#[test]
fn zero_canvas_dimension_coerces_in_the_context() {
    let mut dom = Dom::new();
    let canvas = dom.create_element("canvas");
    dom.set_canvas_size(canvas, Some(0), Some(7)).unwrap();
    let context = dom.canvas_context(canvas).unwrap().unwrap();
    assert_eq!(context.borrow().width(), 1);
    assert_eq!(context.borrow().height(), 7);
    // The element itself keeps the raw attribute value.
    assert_eq!(dom.canvas(canvas).unwrap().width, 0);
}

#[test]
fn non_canvas_nodes_have_no_context() {
    let mut dom = Dom::new();
    let div = dom.create_element("div");
    assert!(dom.canvas_context(div).unwrap().is_none());
}
