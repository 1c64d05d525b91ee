//! Linear gradients for canvas fill styles.

use crate::color::Color;
use lumo_common::warning::warn_once;

/// One gradient stop: an offset along the start→end axis plus the color
/// string the script supplied.
#[derive(Debug, Clone)]
pub struct ColorStop {
    /// Offset along the gradient axis, nominally in [0, 1].
    pub offset: f32,
    /// The color string as registered.
    pub css: String,
    /// The parsed color (opaque black when the string did not parse).
    pub color: Color,
}

/// A linear gradient: an immutable start/end point pair plus stops in
/// registration order.
///
/// Stops are neither sorted nor de-duplicated; sampling walks the list in
/// call order.
#[derive(Debug, Clone)]
pub struct Gradient {
    start: (f32, f32),
    end: (f32, f32),
    stops: Vec<ColorStop>,
}

impl Gradient {
    /// A gradient between two points.
    #[must_use]
    pub const fn linear(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            start: (x0, y0),
            end: (x1, y1),
            stops: Vec::new(),
        }
    }

    /// Start point of the axis.
    #[must_use]
    pub const fn start(&self) -> (f32, f32) {
        self.start
    }

    /// End point of the axis.
    #[must_use]
    pub const fn end(&self) -> (f32, f32) {
        self.end
    }

    /// Append a stop. Stops stay in call order.
    pub fn add_color_stop(&mut self, offset: f32, css: &str) {
        let color = Color::parse(css).unwrap_or_else(|| {
            warn_once("canvas", &format!("unrecognized gradient stop color '{css}'"));
            Color::BLACK
        });
        self.stops.push(ColorStop {
            offset,
            css: css.to_string(),
            color,
        });
    }

    /// The registered stops, in call order.
    #[must_use]
    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Sample the gradient color for a point, projecting onto the
    /// start→end axis.
    ///
    /// Walks consecutive stop pairs in registration order and interpolates
    /// within the first pair whose offsets bracket the projection; points
    /// before the first stop take its color, points after every pair take
    /// the last stop's color. Returns `None` when no stops are registered.
    #[must_use]
    pub fn sample(&self, x: f32, y: f32) -> Option<Color> {
        let first = self.stops.first()?;
        if self.stops.len() == 1 {
            return Some(first.color);
        }

        let axis = (self.end.0 - self.start.0, self.end.1 - self.start.1);
        let len_sq = axis.0 * axis.0 + axis.1 * axis.1;
        let t = if len_sq <= f32::EPSILON {
            0.0
        } else {
            let rel = (x - self.start.0, y - self.start.1);
            ((rel.0 * axis.0 + rel.1 * axis.1) / len_sq).clamp(0.0, 1.0)
        };

        if t <= first.offset {
            return Some(first.color);
        }
        for pair in self.stops.windows(2) {
            let (lo, hi) = if pair[0].offset <= pair[1].offset {
                (&pair[0], &pair[1])
            } else {
                (&pair[1], &pair[0])
            };
            if t >= lo.offset && t <= hi.offset {
                let span = hi.offset - lo.offset;
                let f = if span <= f32::EPSILON {
                    1.0
                } else {
                    (t - lo.offset) / span
                };
                return Some(lerp(lo.color, hi.color, f));
            }
        }
        Some(self.stops[self.stops.len() - 1].color)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp(a: Color, b: Color, f: f32) -> Color {
    let mix = |x: u8, y: u8| f32::from(x).mul_add(1.0 - f, f32::from(y) * f) as u8;
    Color {
        r: mix(a.r, b.r),
        g: mix(a.g, b.g),
        b: mix(a.b, b.b),
        a: mix(a.a, b.a),
    }
}
