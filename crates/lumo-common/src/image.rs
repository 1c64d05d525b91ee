//! Decoded image data shared between the network bridge and the canvas.

/// A decoded image: raw RGBA pixels plus intrinsic dimensions.
///
/// Produced by the image loading pipeline and consumed by
/// `drawImage`-style compositing.
#[derive(Clone)]
pub struct LoadedImage {
    /// Intrinsic width in pixels.
    width: u32,
    /// Intrinsic height in pixels.
    height: u32,
    /// Raw RGBA pixel data (`width * height * 4` bytes).
    rgba: Vec<u8>,
}

impl LoadedImage {
    /// Wrap decoded RGBA pixel data.
    ///
    /// `rgba` must hold `width * height * 4` bytes.
    #[must_use]
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        debug_assert_eq!(rgba.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Intrinsic width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Intrinsic height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// True when either dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw RGBA pixel data.
    #[must_use]
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}
