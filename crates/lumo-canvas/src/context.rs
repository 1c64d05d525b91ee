//! The stateful 2-D rendering context.
//!
//! A [`Context2d`] owns an RGBA backing bitmap and the drawing state the
//! script mutates through style setters and path calls. Every operation
//! that paints pixels raises the dirty flag; [`Context2d::snapshot`]
//! clears it and hands out an immutable copy of the backing store for
//! the presentation boundary.
//!
//! The painted operation subset mirrors what the hosted application
//! actually uses. Operations outside the subset (arcs, bezier curves,
//! stroking, rotation/scaling) are accepted by the scripting surface as
//! no-ops — see [`unsupported`] — and that boundary is intentional.

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use image::RgbaImage;
use lumo_common::image::LoadedImage;
use lumo_common::warning::warn_once;
use strum_macros::{Display, EnumString};

use crate::color::Color;
use crate::gradient::Gradient;
use crate::text::{self, TextMetrics};

/// Upper bound on backing-store pixels (8192 × 8192). Anything larger is
/// treated as an allocation failure rather than an attempt.
const MAX_PIXELS: u64 = 8192 * 8192;

/// Flattening segments per arc in `arcTo`.
const ARC_SEGMENTS: u32 = 16;

/// Backing-store failures. These are fatal to context creation: there is
/// no valid context without a bitmap.
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// The requested dimensions exceed the pixel budget.
    #[error("cannot allocate {width}x{height} backing store (pixel budget exceeded)")]
    BackingStore {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
}

/// What a fill or stroke style is set to.
#[derive(Clone)]
pub enum FillStyle {
    /// A solid color.
    Color(Color),
    /// A shared linear gradient (scripts keep mutating stops after
    /// assignment, so the style observes those changes).
    Gradient(Rc<RefCell<Gradient>>),
}

/// Global composite modes the engine honors. Unknown strings map to
/// source-over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum CompositeOp {
    /// Standard alpha blending (the default).
    SourceOver,
    /// Channel-wise multiply.
    Multiply,
    /// Replace destination pixels outright.
    Copy,
    /// Keep the destination, scaled by the source alpha.
    DestinationIn,
}

/// Path fill rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// Non-zero winding (the default).
    #[default]
    NonZero,
    /// Even-odd parity.
    EvenOdd,
}

impl FillRule {
    /// Interpret an optional rule string the way the script surface does:
    /// `"evenodd"` selects parity, everything else is non-zero.
    #[must_use]
    pub fn from_rule(rule: Option<&str>) -> Self {
        match rule {
            Some("evenodd") => Self::EvenOdd,
            _ => Self::NonZero,
        }
    }
}

/// Shadow attributes. Stored state only: shadows do not render in the
/// software engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    /// Horizontal offset.
    pub offset_x: f32,
    /// Vertical offset.
    pub offset_y: f32,
    /// Blur radius.
    pub blur: f32,
    /// Shadow color.
    pub color: Color,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            blur: 0.0,
            color: Color::TRANSPARENT,
        }
    }
}

/// An axis-aligned rectangle in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl Rect {
    /// A rectangle from origin and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Device-space clip bounds (inclusive min, exclusive max).
#[derive(Debug, Clone, Copy, PartialEq)]
struct ClipRect {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl ClipRect {
    fn intersect(self, other: Self) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    fn contains(self, x: f32, y: f32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// The source handed to `drawImage`, resolved once at the call boundary.
pub enum DrawSource {
    /// Another canvas' current backing bitmap.
    Canvas(RgbaImage),
    /// A decoded image resource.
    Image(LoadedImage),
    /// Anything else; a logged no-op.
    Unsupported,
}

/// The savable/restorable drawing state.
#[derive(Clone)]
struct DrawState {
    fill: FillStyle,
    stroke: FillStyle,
    /// Last solid fill color; used for text when the fill is a gradient.
    text_color: Color,
    global_alpha: f32,
    composite: CompositeOp,
    shadow: Shadow,
    font_px: f32,
    translate: (f32, f32),
    clip: Option<ClipRect>,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill: FillStyle::Color(Color::BLACK),
            stroke: FillStyle::Color(Color::BLACK),
            text_color: Color::WHITE,
            global_alpha: 1.0,
            composite: CompositeOp::SourceOver,
            shadow: Shadow::default(),
            font_px: text::DEFAULT_FONT_PX,
            translate: (0.0, 0.0),
            clip: None,
        }
    }
}

/// A stateful 2-D rendering context over a software RGBA bitmap.
pub struct Context2d {
    width: u32,
    height: u32,
    bitmap: RgbaImage,
    state: DrawState,
    stack: Vec<DrawState>,
    /// Current path as device-space subpaths.
    path: Vec<Vec<(f32, f32)>>,
    dirty: bool,
}

impl Context2d {
    /// Create a context with a `width × height` backing store.
    ///
    /// Zero dimensions are coerced to 1 so the backing store stays valid.
    /// The context starts dirty so an attached canvas publishes its first
    /// (blank) frame.
    ///
    /// # Errors
    ///
    /// [`CanvasError::BackingStore`] when the dimensions exceed the pixel
    /// budget; there is no degraded mode.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        let (width, height) = (width.max(1), height.max(1));
        let bitmap = allocate(width, height)?;
        Ok(Self {
            width,
            height,
            bitmap,
            state: DrawState::default(),
            stack: Vec::new(),
            path: Vec::new(),
            dirty: true,
        })
    }

    /// Backing-store width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Backing-store height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether pixels changed since the last snapshot.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The raw backing bitmap (read-only; used by `drawImage` when this
    /// canvas is the source).
    #[must_use]
    pub const fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    /// Reallocate the backing store for new canvas dimensions,
    /// destroying prior pixel content. Zero dimensions coerce to 1.
    ///
    /// # Errors
    ///
    /// [`CanvasError::BackingStore`] when the dimensions exceed the pixel
    /// budget.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CanvasError> {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.width && height == self.height {
            return Ok(());
        }
        self.bitmap = allocate(width, height)?;
        self.width = width;
        self.height = height;
        self.path.clear();
        self.dirty = true;
        Ok(())
    }

    /// Extract an immutable snapshot of the backing store, clearing the
    /// dirty flag.
    pub fn snapshot(&mut self) -> Option<RgbaImage> {
        self.dirty = false;
        Some(self.bitmap.clone())
    }

    // ---- state stack ----

    /// Push the current drawing state.
    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    /// Pop the drawing state; a no-op on an empty stack.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    // ---- style setters ----

    /// Set the fill style from a style string. Unrecognized encodings
    /// warn once and leave the current style unchanged.
    pub fn set_fill_css(&mut self, css: &str) {
        match Color::parse(css) {
            Some(color) => {
                self.state.fill = FillStyle::Color(color);
                self.state.text_color = color;
            }
            None => warn_once("canvas", &format!("unrecognized fillStyle '{css}'")),
        }
    }

    /// Set the fill style to a gradient handle.
    pub fn set_fill_gradient(&mut self, gradient: Rc<RefCell<Gradient>>) {
        self.state.fill = FillStyle::Gradient(gradient);
    }

    /// Set the stroke style from a style string. Stroking itself is
    /// outside the painted subset, but the state is tracked.
    pub fn set_stroke_css(&mut self, css: &str) {
        match Color::parse(css) {
            Some(color) => self.state.stroke = FillStyle::Color(color),
            None => warn_once("canvas", &format!("unrecognized strokeStyle '{css}'")),
        }
    }

    /// Set the stroke style to a gradient handle.
    pub fn set_stroke_gradient(&mut self, gradient: Rc<RefCell<Gradient>>) {
        self.state.stroke = FillStyle::Gradient(gradient);
    }

    /// Current fill style.
    #[must_use]
    pub fn fill_style(&self) -> &FillStyle {
        &self.state.fill
    }

    /// Set the global alpha multiplier, clamped to [0, 1].
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() {
            self.state.global_alpha = alpha.clamp(0.0, 1.0);
        }
    }

    /// Current global alpha.
    #[must_use]
    pub const fn global_alpha(&self) -> f32 {
        self.state.global_alpha
    }

    /// Set the composite mode from its operation string; unknown strings
    /// map to source-over.
    pub fn set_composite_op(&mut self, op: &str) {
        self.state.composite = CompositeOp::from_str(op).unwrap_or(CompositeOp::SourceOver);
    }

    /// Current composite mode.
    #[must_use]
    pub const fn composite_op(&self) -> CompositeOp {
        self.state.composite
    }

    /// Set the shadow offset/blur. Shadows are stored but never painted.
    pub fn set_shadow_geometry(&mut self, offset_x: f32, offset_y: f32, blur: f32) {
        self.state.shadow.offset_x = offset_x;
        self.state.shadow.offset_y = offset_y;
        self.state.shadow.blur = blur;
        warn_once("canvas", "shadows are stored but not rendered");
    }

    /// Set the shadow color. Unrecognized strings keep the current color.
    pub fn set_shadow_color(&mut self, css: &str) {
        if let Some(color) = Color::parse(css) {
            self.state.shadow.color = color;
        }
    }

    /// Current shadow attributes.
    #[must_use]
    pub const fn shadow(&self) -> Shadow {
        self.state.shadow
    }

    /// Set the font from a CSS-ish font string; only the `<n>px` size
    /// token is honored.
    pub fn set_font(&mut self, font: &str) {
        match text::parse_font_px(font) {
            Some(px) => self.state.font_px = px,
            None => warn_once("canvas", &format!("unparseable font '{font}'")),
        }
    }

    /// Current font size in pixels.
    #[must_use]
    pub const fn font_px(&self) -> f32 {
        self.state.font_px
    }

    // ---- transforms ----

    /// Accumulate a translation.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.state.translate.0 += dx;
        self.state.translate.1 += dy;
    }

    /// Set the absolute transform. Only the translation components `e`
    /// and `f` are honored; the linear part is ignored.
    pub fn set_transform(&mut self, _a: f32, _b: f32, _c: f32, _d: f32, e: f32, f: f32) {
        self.state.translate = (e, f);
    }

    /// Current translation.
    #[must_use]
    pub const fn translation(&self) -> (f32, f32) {
        self.state.translate
    }

    // ---- path construction ----

    /// Discard the current path.
    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    /// Close the current subpath.
    pub fn close_path(&mut self) {
        if let Some(sub) = self.path.last_mut()
            && let Some(&first) = sub.first()
            && sub.len() > 1
        {
            sub.push(first);
        }
    }

    /// Start a new subpath at `(x, y)`.
    pub fn move_to(&mut self, x: f32, y: f32) {
        let p = self.device(x, y);
        self.path.push(vec![p]);
    }

    /// Add a line to the current subpath, starting one if necessary.
    pub fn line_to(&mut self, x: f32, y: f32) {
        let p = self.device(x, y);
        match self.path.last_mut() {
            Some(sub) => sub.push(p),
            None => self.path.push(vec![p]),
        }
    }

    /// Add a closed rectangle subpath.
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (x0, y0) = self.device(x, y);
        let (x1, y1) = (x0 + w, y0 + h);
        self.path
            .push(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]);
    }

    /// Add an arc connecting the current point to `(x2, y2)` by way of
    /// the corner `(x1, y1)`, rounded with `radius`. Degenerate
    /// configurations fall back to a line to the corner.
    pub fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        let Some(&p0) = self.path.last().and_then(|sub| sub.last()) else {
            self.move_to(x1, y1);
            return;
        };
        let corner = self.device(x1, y1);
        let target = self.device(x2, y2);

        let v0 = (p0.0 - corner.0, p0.1 - corner.1);
        let v2 = (target.0 - corner.0, target.1 - corner.1);
        let l0 = v0.0.hypot(v0.1);
        let l2 = v2.0.hypot(v2.1);
        let cross = v0.0 * v2.1 - v0.1 * v2.0;
        if radius <= 0.0 || l0 < 1e-4 || l2 < 1e-4 || cross.abs() < 1e-4 {
            self.line_to_device(corner);
            return;
        }

        let cos_theta = ((v0.0 * v2.0 + v0.1 * v2.1) / (l0 * l2)).clamp(-1.0, 1.0);
        let half = cos_theta.acos() / 2.0;
        let dist = (radius / half.tan()).min(l0).min(l2);

        let u0 = (v0.0 / l0, v0.1 / l0);
        let u2 = (v2.0 / l2, v2.1 / l2);
        let t0 = (corner.0 + u0.0 * dist, corner.1 + u0.1 * dist);
        let t1 = (corner.0 + u2.0 * dist, corner.1 + u2.1 * dist);

        // Center candidates sit perpendicular to the incoming edge at t0;
        // the right one is a radius away from t1 as well.
        let perp = (-u0.1, u0.0);
        let ca = (t0.0 + perp.0 * radius, t0.1 + perp.1 * radius);
        let cb = (t0.0 - perp.0 * radius, t0.1 - perp.1 * radius);
        let err = |c: (f32, f32)| ((c.0 - t1.0).hypot(c.1 - t1.1) - radius).abs();
        let center = if err(ca) <= err(cb) { ca } else { cb };

        let a0 = (t0.1 - center.1).atan2(t0.0 - center.0);
        let a1 = (t1.1 - center.1).atan2(t1.0 - center.0);
        let mut delta = a1 - a0;
        while delta > std::f32::consts::PI {
            delta -= std::f32::consts::TAU;
        }
        while delta < -std::f32::consts::PI {
            delta += std::f32::consts::TAU;
        }

        self.line_to_device(t0);
        for i in 1..=ARC_SEGMENTS {
            #[allow(clippy::cast_precision_loss)]
            let angle = a0 + delta * (i as f32 / ARC_SEGMENTS as f32);
            self.line_to_device((
                radius.mul_add(angle.cos(), center.0),
                radius.mul_add(angle.sin(), center.1),
            ));
        }
    }

    // ---- painting ----

    /// Fill the current path with the current fill style. Sets the dirty
    /// flag.
    pub fn fill(&mut self, rule: FillRule) {
        self.dirty = true;
        let subpaths = self.path.clone();
        self.fill_polygon(&subpaths, rule);
    }

    /// Intersect the clip with the bounding box of the current path.
    ///
    /// This is a rectangular approximation of path clipping; it matches
    /// how the hosted application uses `clip` (rectangular regions).
    pub fn clip(&mut self) {
        let points = self.path.iter().flatten();
        let mut bounds: Option<ClipRect> = None;
        for &(x, y) in points {
            bounds = Some(match bounds {
                None => ClipRect {
                    x0: x,
                    y0: y,
                    x1: x,
                    y1: y,
                },
                Some(b) => ClipRect {
                    x0: b.x0.min(x),
                    y0: b.y0.min(y),
                    x1: b.x1.max(x),
                    y1: b.y1.max(y),
                },
            });
        }
        if let Some(bounds) = bounds {
            self.state.clip = Some(match self.state.clip {
                Some(clip) => clip.intersect(bounds),
                None => bounds,
            });
        }
    }

    /// Fill a rectangle with the current fill style. Sets the dirty flag.
    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.dirty = true;
        let (x0, y0) = self.device(x, y);
        let style = self.state.fill.clone();
        let alpha = self.state.global_alpha;
        let composite = self.state.composite;
        let clip = self.state.clip;
        self.paint_rect(x0, y0, w, h, &style, alpha, composite, clip);
    }

    /// Clear a rectangle to transparent black, ignoring alpha and
    /// composite state. Sets the dirty flag.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.dirty = true;
        let (x0, y0) = self.device(x, y);
        let clip = self.state.clip;
        let (x0, y0, x1, y1) = (
            x0.floor() as i64,
            y0.floor() as i64,
            (x0 + w).ceil() as i64,
            (y0 + h).ceil() as i64,
        );
        for py in y0.max(0)..y1.min(i64::from(self.height)) {
            for px in x0.max(0)..x1.min(i64::from(self.width)) {
                if clip.is_none_or(|c| c.contains(px as f32 + 0.5, py as f32 + 0.5)) {
                    self.bitmap
                        .put_pixel(px as u32, py as u32, image::Rgba([0, 0, 0, 0]));
                }
            }
        }
    }

    /// Draw text at `(x, y)` with the current font size and the fill
    /// color (the last solid fill when the style is a gradient). Sets the
    /// dirty flag even when no font is available.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss
    )]
    pub fn fill_text(&mut self, text_run: &str, x: f32, y: f32) {
        self.dirty = true;
        let Some(font) = text::system_font() else {
            return;
        };
        let (x, y) = self.device(x, y);
        let px = self.state.font_px;
        let color = self.state.text_color;
        let alpha = self.state.global_alpha;
        let composite = self.state.composite;
        let clip = self.state.clip;

        let mut cursor_x = x;
        for ch in text_run.chars() {
            if ch.is_control() {
                continue;
            }
            let (metrics, coverage) = font.rasterize(ch, px);
            let glyph_x = cursor_x as i32 + metrics.xmin;
            let glyph_y = y as i32 + (px as i32 - metrics.ymin - metrics.height as i32);
            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let cov = coverage[gy * metrics.width + gx];
                    if cov == 0 {
                        continue;
                    }
                    let dst_x = glyph_x + gx as i32;
                    let dst_y = glyph_y + gy as i32;
                    if clip.is_some_and(|c| !c.contains(dst_x as f32 + 0.5, dst_y as f32 + 0.5)) {
                        continue;
                    }
                    let src_a = (f32::from(color.a) * (f32::from(cov) / 255.0) * alpha) as u8;
                    blend_pixel(
                        &mut self.bitmap,
                        dst_x,
                        dst_y,
                        [color.r, color.g, color.b, src_a],
                        composite,
                    );
                }
            }
            cursor_x += metrics.advance_width;
        }
    }

    /// Measure a text run at the current font size.
    #[must_use]
    pub fn measure_text(&self, text_run: &str) -> TextMetrics {
        text::measure(text_run, self.state.font_px)
    }

    /// Composite a resolved draw source into `dest`, optionally cropping
    /// to `src_rect` first. Nearest-neighbor scaling. Sets the dirty flag
    /// for every variant, including `Unsupported` (which otherwise logs
    /// and does nothing).
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap,
        clippy::cast_precision_loss
    )]
    pub fn draw_image(&mut self, source: &DrawSource, src_rect: Option<Rect>, dest: Rect) {
        self.dirty = true;
        let (pixels, src_w, src_h): (&[u8], u32, u32) = match source {
            DrawSource::Canvas(bitmap) => (bitmap.as_raw(), bitmap.width(), bitmap.height()),
            DrawSource::Image(img) => (img.rgba(), img.width(), img.height()),
            DrawSource::Unsupported => {
                warn_once("canvas", "drawImage source is neither a canvas nor an image");
                return;
            }
        };
        if src_w == 0 || src_h == 0 {
            return;
        }

        let crop = src_rect.unwrap_or(Rect::new(0.0, 0.0, src_w as f32, src_h as f32));
        if crop.w <= 0.0 || crop.h <= 0.0 || dest.w <= 0.0 || dest.h <= 0.0 {
            return;
        }

        let (dx, dy) = self.device(dest.x, dest.y);
        let dest_w = dest.w as u32;
        let dest_h = dest.h as u32;
        let alpha = self.state.global_alpha;
        let composite = self.state.composite;
        let clip = self.state.clip;

        for oy in 0..dest_h {
            for ox in 0..dest_w {
                let px = dx as i32 + ox as i32;
                let py = dy as i32 + oy as i32;
                if px < 0 || py < 0 || px as u32 >= self.width || py as u32 >= self.height {
                    continue;
                }
                if clip.is_some_and(|c| !c.contains(px as f32 + 0.5, py as f32 + 0.5)) {
                    continue;
                }

                // Nearest-neighbor sample within the (cropped) source.
                let sx = (crop.x + (ox as f32 / dest.w) * crop.w) as i64;
                let sy = (crop.y + (oy as f32 / dest.h) * crop.h) as i64;
                if sx < 0 || sy < 0 || sx >= i64::from(src_w) || sy >= i64::from(src_h) {
                    continue;
                }
                let idx = ((sy as u32 * src_w + sx as u32) * 4) as usize;
                let src_a = (f32::from(pixels[idx + 3]) * alpha) as u8;
                if src_a == 0 && composite != CompositeOp::Copy {
                    continue;
                }
                blend_pixel(
                    &mut self.bitmap,
                    px,
                    py,
                    [pixels[idx], pixels[idx + 1], pixels[idx + 2], src_a],
                    composite,
                );
            }
        }
    }

    /// Blit raw RGBA pixels at `(dx, dy)`, replacing destination pixels.
    /// Transform, alpha, and composite state do not apply. Sets the dirty
    /// flag.
    #[allow(clippy::cast_sign_loss)]
    pub fn put_image_data(&mut self, pixels: &[u8], w: u32, h: u32, dx: i32, dy: i32) {
        self.dirty = true;
        for sy in 0..h {
            for sx in 0..w {
                let idx = ((sy * w + sx) * 4) as usize;
                let Some(chunk) = pixels.get(idx..idx + 4) else {
                    return;
                };
                let px = dx + sx as i32;
                let py = dy + sy as i32;
                if px < 0 || py < 0 || px as u32 >= self.width || py as u32 >= self.height {
                    continue;
                }
                self.bitmap.put_pixel(
                    px as u32,
                    py as u32,
                    image::Rgba([chunk[0], chunk[1], chunk[2], chunk[3]]),
                );
            }
        }
    }

    // ---- internals ----

    fn device(&self, x: f32, y: f32) -> (f32, f32) {
        (x + self.state.translate.0, y + self.state.translate.1)
    }

    fn line_to_device(&mut self, p: (f32, f32)) {
        match self.path.last_mut() {
            Some(sub) => sub.push(p),
            None => self.path.push(vec![p]),
        }
    }

    #[allow(
        clippy::too_many_arguments,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap
    )]
    fn paint_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        style: &FillStyle,
        alpha: f32,
        composite: CompositeOp,
        clip: Option<ClipRect>,
    ) {
        let (x0, y0, x1, y1) = (
            x.floor() as i64,
            y.floor() as i64,
            (x + w).ceil() as i64,
            (y + h).ceil() as i64,
        );
        let gradient = match style {
            FillStyle::Gradient(g) => Some(g.borrow()),
            FillStyle::Color(_) => None,
        };
        for py in y0.max(0)..y1.min(i64::from(self.height)) {
            for px in x0.max(0)..x1.min(i64::from(self.width)) {
                let (fx, fy) = (px as f32 + 0.5, py as f32 + 0.5);
                if clip.is_some_and(|c| !c.contains(fx, fy)) {
                    continue;
                }
                let color = match (&gradient, style) {
                    (Some(g), _) => match g.sample(fx, fy) {
                        Some(c) => c,
                        None => continue,
                    },
                    (None, FillStyle::Color(c)) => *c,
                    (None, FillStyle::Gradient(_)) => continue,
                };
                let src_a = (f32::from(color.a) * alpha) as u8;
                blend_pixel(
                    &mut self.bitmap,
                    px as i32,
                    py as i32,
                    [color.r, color.g, color.b, src_a],
                    composite,
                );
            }
        }
    }

    /// Scanline-fill the device-space subpaths.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap
    )]
    fn fill_polygon(&mut self, subpaths: &[Vec<(f32, f32)>], rule: FillRule) {
        // Collect edges, implicitly closing each subpath.
        let mut edges: Vec<((f32, f32), (f32, f32))> = Vec::new();
        for sub in subpaths {
            if sub.len() < 2 {
                continue;
            }
            for pair in sub.windows(2) {
                edges.push((pair[0], pair[1]));
            }
            let (first, last) = (sub[0], sub[sub.len() - 1]);
            if first != last {
                edges.push((last, first));
            }
        }
        if edges.is_empty() {
            return;
        }

        let min_y = edges
            .iter()
            .map(|e| e.0.1.min(e.1.1))
            .fold(f32::INFINITY, f32::min);
        let max_y = edges
            .iter()
            .map(|e| e.0.1.max(e.1.1))
            .fold(f32::NEG_INFINITY, f32::max);

        let style = self.state.fill.clone();
        let alpha = self.state.global_alpha;
        let composite = self.state.composite;
        let clip = self.state.clip;
        let gradient = match &style {
            FillStyle::Gradient(g) => Some(g.borrow()),
            FillStyle::Color(_) => None,
        };

        let y_start = (min_y.floor().max(0.0)) as i64;
        let y_end = (max_y.ceil().min(self.height as f32)) as i64;

        let mut crossings: Vec<(f32, i32)> = Vec::new();
        for py in y_start..y_end {
            let scan_y = py as f32 + 0.5;
            crossings.clear();
            for &((x0, y0), (x1, y1)) in &edges {
                if (y0 - y1).abs() < f32::EPSILON {
                    continue;
                }
                let (top, bottom) = (y0.min(y1), y0.max(y1));
                if scan_y < top || scan_y >= bottom {
                    continue;
                }
                let t = (scan_y - y0) / (y1 - y0);
                let x = (x1 - x0).mul_add(t, x0);
                let dir = if y1 > y0 { 1 } else { -1 };
                crossings.push((x, dir));
            }
            if crossings.is_empty() {
                continue;
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            for i in 0..crossings.len().saturating_sub(1) {
                winding += crossings[i].1;
                let inside = match rule {
                    FillRule::NonZero => winding != 0,
                    FillRule::EvenOdd => {
                        // Parity of crossings seen so far.
                        (i + 1) % 2 == 1
                    }
                };
                if !inside {
                    continue;
                }
                let span_x0 = crossings[i].0.max(0.0).floor() as i64;
                let span_x1 = crossings[i + 1].0.min(self.width as f32).ceil() as i64;
                for px in span_x0.max(0)..span_x1 {
                    let fx = px as f32 + 0.5;
                    if fx < crossings[i].0 || fx >= crossings[i + 1].0 {
                        continue;
                    }
                    if clip.is_some_and(|c| !c.contains(fx, scan_y)) {
                        continue;
                    }
                    let color = match (&gradient, &style) {
                        (Some(g), _) => match g.sample(fx, scan_y) {
                            Some(c) => c,
                            None => continue,
                        },
                        (None, FillStyle::Color(c)) => *c,
                        (None, FillStyle::Gradient(_)) => continue,
                    };
                    let src_a = (f32::from(color.a) * alpha) as u8;
                    blend_pixel(
                        &mut self.bitmap,
                        px as i32,
                        py as i32,
                        [color.r, color.g, color.b, src_a],
                        composite,
                    );
                }
            }
        }
    }
}

/// Report an accepted-but-unsupported context operation. The subset
/// boundary is deliberate; callers are told once per operation.
pub fn unsupported(op: &str) {
    warn_once("canvas", &format!("'{op}' is not supported; call ignored"));
}

fn allocate(width: u32, height: u32) -> Result<RgbaImage, CanvasError> {
    if u64::from(width) * u64::from(height) > MAX_PIXELS {
        return Err(CanvasError::BackingStore { width, height });
    }
    Ok(RgbaImage::new(width, height))
}

/// Blend one source pixel onto the bitmap under a composite mode.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn blend_pixel(bitmap: &mut RgbaImage, x: i32, y: i32, src: [u8; 4], op: CompositeOp) {
    if x < 0 || y < 0 || x as u32 >= bitmap.width() || y as u32 >= bitmap.height() {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    let dst = *bitmap.get_pixel(x, y);
    let out = match op {
        CompositeOp::Copy => image::Rgba(src),
        CompositeOp::SourceOver => source_over(src, dst.0),
        CompositeOp::Multiply => {
            let mul = |s: u8, d: u8| ((u16::from(s) * u16::from(d)) / 255) as u8;
            let mixed = [
                mul(src[0], dst.0[0]),
                mul(src[1], dst.0[1]),
                mul(src[2], dst.0[2]),
                src[3],
            ];
            source_over(mixed, dst.0)
        }
        CompositeOp::DestinationIn => {
            let a = ((u16::from(dst.0[3]) * u16::from(src[3])) / 255) as u8;
            image::Rgba([dst.0[0], dst.0[1], dst.0[2], a])
        }
    };
    bitmap.put_pixel(x, y, out);
}

/// Standard straight-alpha source-over blend.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn source_over(src: [u8; 4], dst: [u8; 4]) -> image::Rgba<u8> {
    let sa = f32::from(src[3]) / 255.0;
    if sa >= 1.0 {
        return image::Rgba(src);
    }
    let da = f32::from(dst[3]) / 255.0;
    let out_a = da.mul_add(1.0 - sa, sa);
    if out_a <= 0.0 {
        return image::Rgba([0, 0, 0, 0]);
    }
    let blend = |s: u8, d: u8| {
        let s = f32::from(s);
        let d = f32::from(d);
        (((d * da).mul_add(1.0 - sa, s * sa)) / out_a) as u8
    };
    image::Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0) as u8,
    ])
}
