use serde::{Deserialize, Serialize};

/// Fallback background color used when the requested one cannot be parsed.
pub const DEFAULT_BACKGROUND_HEX: &str = "#ffffff";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Straight (non-premultiplied) 8-bit RGB color.
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// White.
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Normalized `[r, g, b]` in `0..=1`.
    pub fn to_unit(self) -> [f64; 3] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        ]
    }
}

/// Parse `#RGB` or `#RRGGBB` (case-insensitive, `#` required).
pub fn parse_hex_color(s: &str) -> Result<Rgb8, String> {
    let s = s.trim();
    let hex = s
        .strip_prefix('#')
        .ok_or_else(|| format!("hex color must start with '#': \"{s}\""))?;

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !hex.is_ascii() {
        return Err(format!("invalid hex color \"{s}\""));
    }

    match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let doubled: String = [c, c].iter().collect();
                out[i] = hex_byte(&doubled)?;
            }
            Ok(Rgb8 {
                r: out[0],
                g: out[1],
                b: out[2],
            })
        }
        6 => Ok(Rgb8 {
            r: hex_byte(&hex[0..2])?,
            g: hex_byte(&hex[2..4])?,
            b: hex_byte(&hex[4..6])?,
        }),
        _ => Err("hex color must be #RGB or #RRGGBB (case-insensitive)".to_owned()),
    }
}

/// Requested background for rendered artifacts.
///
/// Invariants: `color_hex` always parses to `rgb`, and `opacity` is finite and within `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BackgroundSpec {
    /// Normalized hex string as it will appear in SVG output.
    pub color_hex: String,
    /// Parsed color.
    pub rgb: Rgb8,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        Self::transparent()
    }
}

impl BackgroundSpec {
    /// Fully transparent white background.
    pub fn transparent() -> Self {
        Self {
            color_hex: DEFAULT_BACKGROUND_HEX.to_owned(),
            rgb: Rgb8::WHITE,
            opacity: 0.0,
        }
    }

    /// Build from raw request values. Invalid colors fall back to white and opacity is clamped.
    pub fn new(color: Option<&str>, opacity: Option<f64>) -> Self {
        let (color_hex, rgb) = match color.map(|c| (c.trim(), parse_hex_color(c))) {
            Some((raw, Ok(rgb))) => (raw.to_owned(), rgb),
            _ => (DEFAULT_BACKGROUND_HEX.to_owned(), Rgb8::WHITE),
        };
        Self {
            color_hex,
            rgb,
            opacity: clamp01(opacity.unwrap_or(0.0)),
        }
    }

    /// `true` when no background should be drawn at all.
    pub fn is_transparent(&self) -> bool {
        self.opacity <= 0.0
    }

    /// `true` when the background fully covers what is behind it.
    pub fn is_opaque(&self) -> bool {
        self.opacity >= 1.0
    }
}

/// Clamp into `[0, 1]`, mapping non-finite values to `0`.
pub fn clamp01(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}
