//! The render output boundary.
//!
//! The host publishes at most one bitmap per tick; whatever displays it
//! (a UI shell, a PNG writer, a test) implements [`FrameSink`]. Closures
//! qualify.

use image::RgbaImage;

/// One published canvas snapshot.
pub struct Frame {
    /// The canvas pixels at snapshot time.
    pub image: RgbaImage,
}

impl Frame {
    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Receives published frames from the host loop.
pub trait FrameSink {
    /// Accept the tick's snapshot.
    fn publish(&mut self, frame: Frame);
}

impl<F: FnMut(Frame)> FrameSink for F {
    fn publish(&mut self, frame: Frame) {
        self(frame);
    }
}

/// A sink that drops every frame (headless runs that only care about
/// script side effects).
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl FrameSink for DiscardSink {
    fn publish(&mut self, _frame: Frame) {}
}
