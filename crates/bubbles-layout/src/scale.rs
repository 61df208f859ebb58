//! Continuous scales and the alpha-to-size mappings.

use serde::{Deserialize, Serialize};

/// Radius range of a collapsed bubble.
pub const RADIUS_RANGE: (f64, f64) = (20.0, 80.0);

/// Range of the fill color parameter.
pub const COLOR_VALUE_RANGE: (f64, f64) = (0.0, 0.7);

/// Position of `t` within `[a, b]`; the midpoint for a degenerate domain.
fn normalize(a: f64, b: f64, t: f64) -> f64 {
    let span = b - a;
    if span == 0.0 || span.is_nan() {
        0.5
    } else {
        (t - a) / span
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Linear map from `domain` to `range`. Not clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, x: f64) -> f64 {
        lerp(
            self.range.0,
            self.range.1,
            normalize(self.domain.0, self.domain.1, x),
        )
    }

    pub fn invert(&self, y: f64) -> f64 {
        lerp(
            self.domain.0,
            self.domain.1,
            normalize(self.range.0, self.range.1, y),
        )
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }
}

fn signed_sqrt(x: f64) -> f64 {
    if x < 0.0 {
        -(-x).sqrt()
    } else {
        x.sqrt()
    }
}

/// Square-root map: area, not radius, grows linearly with the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SqrtScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, x: f64) -> f64 {
        let t = normalize(
            signed_sqrt(self.domain.0),
            signed_sqrt(self.domain.1),
            signed_sqrt(x),
        );
        lerp(self.range.0, self.range.1, t)
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }
}

/// Which domain the size and color scales span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRange {
    /// The data's own alpha range
    #[default]
    Relative,
    /// The fixed range `[0, 1]`
    Absolute,
}

impl ValueRange {
    pub fn from_absolute(absolute: bool) -> Self {
        if absolute {
            ValueRange::Absolute
        } else {
            ValueRange::Relative
        }
    }

    pub fn domain(self, alpha_range: (f64, f64)) -> (f64, f64) {
        match self {
            ValueRange::Relative => alpha_range,
            ValueRange::Absolute => (0.0, 1.0),
        }
    }
}

/// Alpha to radius and alpha to fill parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingScales {
    pub value_range: ValueRange,
    radius: SqrtScale,
    color_value: SqrtScale,
}

impl MappingScales {
    pub fn new(value_range: ValueRange, alpha_range: (f64, f64)) -> Self {
        let domain = value_range.domain(alpha_range);
        Self {
            value_range,
            radius: SqrtScale::new(domain, RADIUS_RANGE),
            color_value: SqrtScale::new(domain, COLOR_VALUE_RANGE),
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.radius.domain()
    }

    /// Target radius of a collapsed bubble.
    pub fn radius(&self, alpha: f64) -> f64 {
        self.radius.apply(alpha)
    }

    /// Position in the fill color scheme.
    pub fn color_value(&self, alpha: f64) -> f64 {
        self.color_value.apply(alpha)
    }
}
