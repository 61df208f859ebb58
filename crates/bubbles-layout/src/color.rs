//! Sequential color schemes.

use std::fmt;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// CSS `rgba(...)` with the given opacity.
    pub fn with_alpha(self, alpha: f64) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            self.r,
            self.g,
            self.b,
            alpha.clamp(0.0, 1.0)
        )
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

const REDS: [u32; 9] = [
    0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
];

const YL_GN_BU: [u32; 9] = [
    0xffffd9, 0xedf8b1, 0xc7e9b4, 0x7fcdbb, 0x41b6c4, 0x1d91c0, 0x225ea8, 0x253494, 0x081d58,
];

fn interpolate(stops: &[u32], t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let last = stops.len() - 1;
    let pos = t * last as f64;
    let i = (pos.floor() as usize).min(last.saturating_sub(1));
    let frac = pos - i as f64;

    let a = Rgb::from_hex(stops[i]);
    let b = Rgb::from_hex(stops[(i + 1).min(last)]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
    Rgb::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}

/// White to dark red, used for bubble fill.
pub fn reds(t: f64) -> Rgb {
    interpolate(&REDS, t)
}

/// Yellow through green to blue, used for search terms.
pub fn yl_gn_bu(t: f64) -> Rgb {
    interpolate(&YL_GN_BU, t)
}

/// Color of the `i`-th of `len` search terms.
pub fn search_term_color(i: usize, len: usize) -> Rgb {
    if len == 0 {
        return yl_gn_bu(1.0);
    }
    yl_gn_bu(1.0 - i as f64 / len as f64)
}
