//! Tests for gradient stop bookkeeping and sampling.

use lumo_canvas::context::Context2d;
use lumo_canvas::gradient::Gradient;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn stops_stay_in_call_order_without_sorting() {
    let mut g = Gradient::linear(0.0, 0.0, 1.0, 0.0);
    g.add_color_stop(0.2, "red");
    g.add_color_stop(0.1, "blue");

    let stops = g.stops();
    assert_eq!(stops.len(), 2);
    assert_eq!((stops[0].offset, stops[0].css.as_str()), (0.2, "red"));
    assert_eq!((stops[1].offset, stops[1].css.as_str()), (0.1, "blue"));
}

#[test]
fn sampling_interpolates_along_the_axis() {
    let mut g = Gradient::linear(0.0, 0.0, 10.0, 0.0);
    g.add_color_stop(0.0, "black");
    g.add_color_stop(1.0, "white");

    let start = g.sample(0.0, 5.0).unwrap();
    let end = g.sample(10.0, 5.0).unwrap();
    let mid = g.sample(5.0, 5.0).unwrap();
    assert_eq!(start.r, 0);
    assert_eq!(end.r, 255);
    assert!(mid.r > 100 && mid.r < 160, "midpoint ~50% gray, got {mid:?}");
}

#[test]
fn empty_gradient_samples_to_none_and_single_stop_is_flat() {
    let mut g = Gradient::linear(0.0, 0.0, 1.0, 1.0);
    assert!(g.sample(0.5, 0.5).is_none());

    g.add_color_stop(0.7, "red");
    let c = g.sample(0.0, 0.0).unwrap();
    assert_eq!((c.r, c.g, c.b), (255, 0, 0));
}

#[test]
fn gradient_fill_paints_pixels() {
    let mut c = Context2d::new(10, 1).unwrap();
    let g = Rc::new(RefCell::new(Gradient::linear(0.0, 0.0, 10.0, 0.0)));
    g.borrow_mut().add_color_stop(0.0, "white");
    g.borrow_mut().add_color_stop(1.0, "black");

    c.set_fill_gradient(g);
    c.fill_rect(0.0, 0.0, 10.0, 1.0);

    let left = c.bitmap().get_pixel(0, 0).0;
    let right = c.bitmap().get_pixel(9, 0).0;
    assert!(left[0] > 200, "left end near white, got {left:?}");
    assert!(right[0] < 60, "right end near black, got {right:?}");
}

#[test]
fn stops_added_after_style_assignment_still_apply() {
    let mut c = Context2d::new(4, 1).unwrap();
    let g = Rc::new(RefCell::new(Gradient::linear(0.0, 0.0, 4.0, 0.0)));
    c.set_fill_gradient(Rc::clone(&g));

    // The script mutates the gradient it already assigned.
    g.borrow_mut().add_color_stop(0.0, "red");
    c.fill_rect(0.0, 0.0, 4.0, 1.0);
    assert_eq!(c.bitmap().get_pixel(2, 0).0, [255, 0, 0, 255]);
}
