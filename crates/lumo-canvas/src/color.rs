//! CSS-ish color parsing for fill/stroke/shadow styles.
//!
//! The supported grammar is deliberately explicit and small:
//!
//! - a fixed table of named colors,
//! - `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` hex forms,
//! - `rgb(...)` / `rgba(...)` function literals, parsed by splitting on
//!   the parenthesis and comma delimiters.
//!
//! Function-literal channels are accepted either as 0–255 integers (CSS
//! convention) or as 0–1 fractions (what a Core-Graphics-reared script
//! might emit); values above 1 are read as the 0–255 form. Anything the
//! grammar does not cover parses to `None` — callers warn once and keep
//! their current style.

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// An opaque color from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse a style string per the module grammar.
    #[must_use]
    pub fn parse(css: &str) -> Option<Self> {
        let css = css.trim();
        if let Some(hex) = css.strip_prefix('#') {
            return parse_hex(hex);
        }
        if css.starts_with("rgb(") || css.starts_with("rgba(") {
            return parse_function(css);
        }
        named(css)
    }
}

/// One of four channel values in a `rgb(...)`/`rgba(...)` literal.
///
/// Values above 1 are the 0–255 integer form; values in [0, 1] are
/// fractions of full intensity.
fn channel(raw: &str) -> Option<u8> {
    let value: f32 = raw.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let scaled = if value > 1.0 { value } else { value * 255.0 };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(scaled.min(255.0).round() as u8)
}

/// Split `rgb(...)`/`rgba(...)` on the parenthesis, then the commas.
fn parse_function(css: &str) -> Option<Color> {
    let inner = css.split_once('(')?.1.strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = match parts.get(3) {
        Some(raw) => channel(raw)?,
        None => 255,
    };
    Some(Color { r, g, b, a })
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let b = hex.as_bytes();
    let nibble = |i: usize| hex_val(b[i]);
    let wide = |i: usize| Some(hex_val(b[i])? * 16 + hex_val(b[i + 1])?);
    match b.len() {
        3 => Some(Color {
            r: nibble(0)? * 17,
            g: nibble(1)? * 17,
            b: nibble(2)? * 17,
            a: 255,
        }),
        4 => Some(Color {
            r: nibble(0)? * 17,
            g: nibble(1)? * 17,
            b: nibble(2)? * 17,
            a: nibble(3)? * 17,
        }),
        6 => Some(Color {
            r: wide(0)?,
            g: wide(2)?,
            b: wide(4)?,
            a: 255,
        }),
        8 => Some(Color {
            r: wide(0)?,
            g: wide(2)?,
            b: wide(4)?,
            a: wide(6)?,
        }),
        _ => None,
    }
}

fn named(css: &str) -> Option<Color> {
    let color = match css.to_ascii_lowercase().as_str() {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "lime" => Color::rgb(0, 255, 0),
        "blue" => Color::rgb(0, 0, 255),
        "yellow" => Color::rgb(255, 255, 0),
        "cyan" | "aqua" => Color::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Color::rgb(255, 0, 255),
        "orange" => Color::rgb(255, 165, 0),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "silver" => Color::rgb(192, 192, 192),
        "transparent" => Color::TRANSPARENT,
        _ => return None,
    };
    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_hex() {
        assert_eq!(Color::parse("white"), Some(Color::WHITE));
        assert_eq!(Color::parse(" Red "), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("#102030"), Some(Color::rgb(16, 32, 48)));
        assert_eq!(
            Color::parse("#10203040"),
            Some(Color {
                r: 16,
                g: 32,
                b: 48,
                a: 64
            })
        );
    }

    #[test]
    fn function_literals_accept_both_channel_forms() {
        assert_eq!(
            Color::parse("rgba(255, 0, 0, 1)"),
            Some(Color::rgb(255, 0, 0))
        );
        // Fractional channels scale up.
        assert_eq!(Color::parse("rgba(1, 1, 1, 1)"), Some(Color::WHITE));
        assert_eq!(
            Color::parse("rgb(0, 128, 255)"),
            Some(Color::rgb(0, 128, 255))
        );
        assert_eq!(
            Color::parse("rgba(0, 0, 0, 0.5)"),
            Some(Color {
                r: 0,
                g: 0,
                b: 0,
                a: 128
            })
        );
    }

    #[test]
    fn unrecognized_encodings_parse_to_none() {
        assert_eq!(Color::parse("hsl(120, 50%, 50%)"), None);
        assert_eq!(Color::parse("rgba(1,2)"), None);
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("chartreuse-ish"), None);
    }
}
