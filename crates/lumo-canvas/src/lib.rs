//! Software 2-D canvas rendering engine for the Lumo script host.
//!
//! Implements the stateful drawing context the hosted JavaScript
//! application paints into: paths, fills, gradients, text, image
//! compositing, and a dirty-flag/snapshot protocol the host loop uses to
//! publish frames.
//!
//! The painted operation subset is deliberate — see
//! [`context::unsupported`] for the boundary.

pub mod color;
pub mod context;
pub mod gradient;
pub mod text;

pub use color::Color;
pub use context::{
    CanvasError, CompositeOp, Context2d, DrawSource, FillRule, FillStyle, Rect, Shadow,
    unsupported,
};
pub use gradient::{ColorStop, Gradient};
pub use text::TextMetrics;
