//! Tests for the 2-D context: dirty-flag discipline, state stack
//! symmetry, resize coercion, and pixel-level paint behavior.

use lumo_canvas::context::{Context2d, DrawSource, FillRule, Rect};
use lumo_common::image::LoadedImage;
use quickcheck_macros::quickcheck;

fn ctx(w: u32, h: u32) -> Context2d {
    Context2d::new(w, h).expect("context allocation")
}

fn pixel(c: &Context2d, x: u32, y: u32) -> [u8; 4] {
    c.bitmap().get_pixel(x, y).0
}

// ========== dirty flag ==========

#[test]
fn exactly_the_painting_calls_set_the_dirty_flag() {
    let mut c = ctx(16, 16);
    assert!(c.is_dirty(), "a fresh context publishes its first frame");
    c.snapshot().unwrap();
    assert!(!c.is_dirty());

    // Non-painting operations leave the flag clear.
    c.begin_path();
    c.move_to(1.0, 1.0);
    c.line_to(5.0, 5.0);
    c.arc_to(6.0, 5.0, 6.0, 8.0, 1.0);
    c.close_path();
    c.save();
    c.translate(2.0, 2.0);
    c.set_fill_css("red");
    c.set_global_alpha(0.5);
    c.set_composite_op("multiply");
    c.set_font("12px serif");
    c.restore();
    let _ = c.measure_text("hi");
    assert!(!c.is_dirty());

    c.fill_rect(0.0, 0.0, 4.0, 4.0);
    assert!(c.is_dirty());
    c.snapshot().unwrap();

    c.clear_rect(0.0, 0.0, 4.0, 4.0);
    assert!(c.is_dirty());
    c.snapshot().unwrap();

    c.fill_text("x", 0.0, 0.0);
    assert!(c.is_dirty(), "fillText dirties even without a system font");
    c.snapshot().unwrap();

    let src = LoadedImage::new(1, 1, vec![255, 0, 0, 255]);
    c.draw_image(
        &DrawSource::Image(src),
        None,
        Rect::new(0.0, 0.0, 1.0, 1.0),
    );
    assert!(c.is_dirty());
    c.snapshot().unwrap();

    c.put_image_data(&[1, 2, 3, 4], 1, 1, 0, 0);
    assert!(c.is_dirty());
    c.snapshot().unwrap();

    c.begin_path();
    c.rect(1.0, 1.0, 3.0, 3.0);
    c.fill(FillRule::NonZero);
    assert!(c.is_dirty());
}

// ========== save/restore ==========

#[test]
fn save_restore_round_trips_state() {
    let mut c = ctx(8, 8);
    c.set_global_alpha(0.25);
    c.translate(3.0, 4.0);
    c.set_composite_op("copy");
    c.set_font("18px serif");

    c.save();
    c.set_global_alpha(1.0);
    c.translate(10.0, 10.0);
    c.set_composite_op("multiply");
    c.set_font("99px serif");
    c.begin_path();
    c.rect(0.0, 0.0, 2.0, 2.0);
    c.clip();
    c.restore();

    assert_eq!(c.global_alpha(), 0.25);
    assert_eq!(c.translation(), (3.0, 4.0));
    assert_eq!(c.composite_op().to_string(), "copy");
    assert_eq!(c.font_px(), 18.0);

    // Clip restored too: a full-surface fill reaches the corner again.
    c.set_composite_op("source-over");
    c.set_fill_css("white");
    c.translate(-3.0, -4.0);
    c.fill_rect(0.0, 0.0, 8.0, 8.0);
    assert_eq!(pixel(&c, 7, 7), [255, 255, 255, 255]);
}

#[test]
fn restore_on_empty_stack_is_a_no_op() {
    let mut c = ctx(4, 4);
    c.set_global_alpha(0.5);
    c.restore();
    assert_eq!(c.global_alpha(), 0.5);
}

#[quickcheck]
fn balanced_save_restore_is_identity(depth: u8, alphas: Vec<u8>) -> bool {
    let depth = usize::from(depth % 8) + 1;
    let mut c = ctx(4, 4);
    c.set_global_alpha(0.75);
    c.translate(1.0, 2.0);
    c.set_font("21px serif");

    for i in 0..depth {
        c.save();
        let alpha = alphas.get(i).copied().unwrap_or(17);
        c.set_global_alpha(f32::from(alpha) / 255.0);
        c.translate(f32::from(alpha), 1.0);
        c.set_composite_op("destination-in");
    }
    for _ in 0..depth {
        c.restore();
    }

    c.global_alpha() == 0.75
        && c.translation() == (1.0, 2.0)
        && c.font_px() == 21.0
        && c.composite_op().to_string() == "source-over"
}

// ========== resize ==========

#[test]
fn zero_dimensions_coerce_to_one() {
    let c = ctx(0, 0);
    assert_eq!((c.width(), c.height()), (1, 1));

    let mut c = ctx(8, 8);
    c.resize(0, 5).unwrap();
    assert_eq!((c.width(), c.height()), (1, 5));
    c.resize(5, 0).unwrap();
    assert_eq!((c.width(), c.height()), (5, 1));

    // Draws after a degenerate resize must not crash.
    c.fill_rect(0.0, 0.0, 100.0, 100.0);
    c.fill_text("still alive", 0.0, 0.0);
}

#[test]
fn resize_destroys_pixel_content() {
    let mut c = ctx(4, 4);
    c.set_fill_css("red");
    c.fill_rect(0.0, 0.0, 4.0, 4.0);
    assert_eq!(pixel(&c, 1, 1), [255, 0, 0, 255]);

    c.resize(6, 6).unwrap();
    assert_eq!(pixel(&c, 1, 1), [0, 0, 0, 0]);
    assert!(c.is_dirty());
}

#[test]
fn resize_to_same_dimensions_keeps_content() {
    let mut c = ctx(4, 4);
    c.set_fill_css("red");
    c.fill_rect(0.0, 0.0, 4.0, 4.0);
    c.resize(4, 4).unwrap();
    assert_eq!(pixel(&c, 1, 1), [255, 0, 0, 255]);
}

#[test]
fn oversized_allocation_is_fatal() {
    assert!(Context2d::new(100_000, 100_000).is_err());
}

// ========== painting ==========

#[test]
fn fill_rect_honors_translation() {
    let mut c = ctx(8, 8);
    c.set_fill_css("white");
    c.translate(4.0, 4.0);
    c.fill_rect(0.0, 0.0, 2.0, 2.0);
    assert_eq!(pixel(&c, 5, 5), [255, 255, 255, 255]);
    assert_eq!(pixel(&c, 1, 1), [0, 0, 0, 0]);
}

#[test]
fn set_transform_overrides_translation() {
    let mut c = ctx(8, 8);
    c.translate(100.0, 100.0);
    c.set_transform(2.0, 0.0, 0.0, 2.0, 1.0, 1.0);
    c.set_fill_css("white");
    c.fill_rect(0.0, 0.0, 1.0, 1.0);
    assert_eq!(pixel(&c, 1, 1), [255, 255, 255, 255]);
}

#[test]
fn unrecognized_fill_style_keeps_the_previous_one() {
    let mut c = ctx(4, 4);
    c.set_fill_css("red");
    c.set_fill_css("hsl(1,2%,3%)");
    c.fill_rect(0.0, 0.0, 4.0, 4.0);
    assert_eq!(pixel(&c, 0, 0), [255, 0, 0, 255]);
}

#[test]
fn copy_composite_replaces_pixels() {
    let mut c = ctx(4, 4);
    c.set_fill_css("white");
    c.fill_rect(0.0, 0.0, 4.0, 4.0);

    c.set_composite_op("copy");
    c.set_fill_css("rgba(255, 0, 0, 0.5)");
    c.fill_rect(0.0, 0.0, 4.0, 4.0);
    assert_eq!(pixel(&c, 0, 0), [255, 0, 0, 128]);
}

#[test]
fn clear_rect_punches_transparency() {
    let mut c = ctx(4, 4);
    c.set_fill_css("white");
    c.fill_rect(0.0, 0.0, 4.0, 4.0);
    c.clear_rect(1.0, 1.0, 2.0, 2.0);
    assert_eq!(pixel(&c, 1, 1), [0, 0, 0, 0]);
    assert_eq!(pixel(&c, 0, 0), [255, 255, 255, 255]);
}

#[test]
fn path_fill_covers_the_polygon_interior() {
    let mut c = ctx(10, 10);
    c.set_fill_css("white");
    c.begin_path();
    c.move_to(1.0, 1.0);
    c.line_to(8.0, 1.0);
    c.line_to(8.0, 8.0);
    c.line_to(1.0, 8.0);
    c.close_path();
    c.fill(FillRule::NonZero);

    assert_eq!(pixel(&c, 4, 4), [255, 255, 255, 255]);
    assert_eq!(pixel(&c, 9, 9), [0, 0, 0, 0]);
    assert_eq!(pixel(&c, 0, 0), [0, 0, 0, 0]);
}

#[test]
fn clip_confines_subsequent_fills() {
    let mut c = ctx(10, 10);
    c.begin_path();
    c.rect(2.0, 2.0, 4.0, 4.0);
    c.clip();
    c.begin_path();
    c.set_fill_css("white");
    c.fill_rect(0.0, 0.0, 10.0, 10.0);

    assert_eq!(pixel(&c, 3, 3), [255, 255, 255, 255]);
    assert_eq!(pixel(&c, 0, 0), [0, 0, 0, 0]);
    assert_eq!(pixel(&c, 8, 8), [0, 0, 0, 0]);
}

#[test]
fn draw_image_scales_with_nearest_neighbor() {
    let mut c = ctx(4, 4);
    let src = LoadedImage::new(1, 1, vec![0, 255, 0, 255]);
    c.draw_image(
        &DrawSource::Image(src),
        None,
        Rect::new(0.0, 0.0, 4.0, 4.0),
    );
    assert_eq!(pixel(&c, 0, 0), [0, 255, 0, 255]);
    assert_eq!(pixel(&c, 3, 3), [0, 255, 0, 255]);
}

#[test]
fn draw_image_from_canvas_source() {
    let mut src = ctx(2, 2);
    src.set_fill_css("red");
    src.fill_rect(0.0, 0.0, 2.0, 2.0);

    let mut dst = ctx(4, 4);
    dst.draw_image(
        &DrawSource::Canvas(src.bitmap().clone()),
        None,
        Rect::new(1.0, 1.0, 2.0, 2.0),
    );
    assert_eq!(pixel(&dst, 1, 1), [255, 0, 0, 255]);
    assert_eq!(pixel(&dst, 0, 0), [0, 0, 0, 0]);
}

#[test]
fn draw_image_honors_source_sub_rect() {
    // Left half red, right half blue.
    let rgba = vec![
        255, 0, 0, 255, /* (0,0) */ 0, 0, 255, 255, /* (1,0) */
        255, 0, 0, 255, /* (0,1) */ 0, 0, 255, 255, /* (1,1) */
    ];
    let src = LoadedImage::new(2, 2, rgba);

    let mut c = ctx(2, 2);
    c.draw_image(
        &DrawSource::Image(src),
        Some(Rect::new(1.0, 0.0, 1.0, 2.0)),
        Rect::new(0.0, 0.0, 2.0, 2.0),
    );
    assert_eq!(pixel(&c, 0, 0), [0, 0, 255, 255]);
    assert_eq!(pixel(&c, 1, 1), [0, 0, 255, 255]);
}

#[test]
fn unsupported_draw_source_is_a_no_op_but_dirties() {
    let mut c = ctx(2, 2);
    c.snapshot().unwrap();
    c.draw_image(&DrawSource::Unsupported, None, Rect::new(0.0, 0.0, 2.0, 2.0));
    assert!(c.is_dirty());
    assert_eq!(pixel(&c, 0, 0), [0, 0, 0, 0]);
}

#[test]
fn put_image_data_writes_raw_pixels() {
    let mut c = ctx(3, 3);
    c.put_image_data(&[9, 8, 7, 6], 1, 1, 1, 1);
    assert_eq!(pixel(&c, 1, 1), [9, 8, 7, 6]);
    // Out-of-bounds destinations clip instead of crashing.
    c.put_image_data(&[1, 1, 1, 1], 1, 1, -5, 99);
}
