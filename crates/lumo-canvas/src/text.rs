//! System font loading and text measurement.
//!
//! Rasterization happens in the context's pixel loops; this module owns
//! finding a usable font and computing metrics with fontdue.

use fontdue::{Font, FontSettings};
use std::sync::LazyLock;

/// Font size used when no `font` string has been set, matching what the
/// hosted application renders at when it never configures one.
pub const DEFAULT_FONT_PX: f32 = 40.0;

/// Common system font paths to probe for a regular font.
const FONT_SEARCH_PATHS: &[&str] = &[
    // macOS
    "/System/Library/Fonts/Helvetica.ttc",
    "/System/Library/Fonts/SFNS.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

static SYSTEM_FONT: LazyLock<Option<Font>> = LazyLock::new(|| {
    for path in FONT_SEARCH_PATHS {
        if let Ok(data) = std::fs::read(path)
            && let Ok(font) = Font::from_bytes(data, FontSettings::default())
        {
            return Some(font);
        }
    }
    eprintln!("Warning: no system font found; text will not be rendered.");
    None
});

/// The probed system font, if any was found.
#[must_use]
pub fn system_font() -> Option<&'static Font> {
    SYSTEM_FONT.as_ref()
}

/// Measured extents of a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Sum of glyph advances.
    pub width: f32,
    /// Nominal line height (the font size).
    pub height: f32,
}

/// Measure `text` at `px` with the system font.
///
/// Without a font the width is zero; the height is always the font size
/// so layout-ish callers get a stable number.
#[must_use]
pub fn measure(text: &str, px: f32) -> TextMetrics {
    let width = system_font().map_or(0.0, |font| {
        text.chars()
            .filter(|ch| !ch.is_control())
            .map(|ch| font.metrics(ch, px).advance_width)
            .sum()
    });
    TextMetrics { width, height: px }
}

/// Extract the pixel size from a CSS-ish font string.
///
/// Only the `<number>px` token is honored; the family list is ignored.
/// Returns `None` when no such token is present.
#[must_use]
pub fn parse_font_px(font: &str) -> Option<f32> {
    font.split_whitespace()
        .find_map(|token| token.strip_suffix("px"))
        .and_then(|size| size.parse::<f32>().ok())
        .filter(|px| px.is_finite() && *px > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_px_token() {
        assert_eq!(parse_font_px("40px Helvetica"), Some(40.0));
        assert_eq!(parse_font_px("bold 24px 'PT Sans', sans-serif"), Some(24.0));
        assert_eq!(parse_font_px("italic small-caps serif"), None);
        assert_eq!(parse_font_px("0px serif"), None);
    }

    #[test]
    fn measure_without_glyphs_is_empty() {
        let metrics = measure("", 32.0);
        assert_eq!(metrics.width, 0.0);
        assert_eq!(metrics.height, 32.0);
    }
}
