//! Pan/zoom transforms and the fixed-coordinate projection.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::scale::LinearScale;

/// Scale extent of the free (simulated) layout.
pub const FREE_SCALE_EXTENT: (f64, f64) = (0.3, 1.0);

/// Scale extent of the scaled (projected) layout.
pub const SCALED_SCALE_EXTENT: (f64, f64) = (1.0, 15.0);

/// Uniform scale followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    pub fn apply_x(&self, x: f64) -> f64 {
        x * self.k + self.x
    }

    pub fn apply_y(&self, y: f64) -> f64 {
        y * self.k + self.y
    }

    pub fn apply(&self, p: (f64, f64)) -> (f64, f64) {
        (self.apply_x(p.0), self.apply_y(p.1))
    }

    pub fn invert(&self, p: (f64, f64)) -> (f64, f64) {
        ((p.0 - self.x) / self.k, (p.1 - self.y) / self.k)
    }

    /// The same transform with its scale clamped to `extent`.
    pub fn clamped(self, extent: (f64, f64)) -> Self {
        Self {
            k: self.k.clamp(extent.0, extent.1),
            ..self
        }
    }

    /// Keep the scale, translate so `p` lands on `center`.
    pub fn centered_on(self, p: (f64, f64), center: (f64, f64)) -> Self {
        Self {
            k: self.k,
            x: center.0 - p.0 * self.k,
            y: center.1 - p.1 * self.k,
        }
    }

    /// SVG `transform` attribute value.
    pub fn to_svg(&self) -> String {
        format!("translate({:.3},{:.3}) scale({:.4})", self.x, self.y, self.k)
    }
}

/// Maps precomputed 2D coordinates onto the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledProjection {
    width: f64,
    height: f64,
    x_scale: LinearScale,
    y_scale: LinearScale,
}

impl ScaledProjection {
    /// Margins shrink with the number of topics so the grid stays inside
    /// the viewport when zoomed.
    pub fn new(width: f64, height: f64, n_topics: usize) -> Result<Self, LayoutError> {
        if n_topics == 0 || width <= 0.0 || height <= 0.0 {
            return Err(LayoutError::InvalidInput(format!(
                "cannot project {} topics onto {}x{}",
                n_topics, width, height
            )));
        }
        let aspect = width / height;
        let n = (width / (2.1 * (aspect * n_topics as f64).sqrt())).floor();
        let margin = 1.1 * n;
        Ok(Self {
            width,
            height,
            x_scale: LinearScale::new((0.0, width), (margin, width - margin)),
            y_scale: LinearScale::new((height, 0.0), (height - margin, margin)),
        })
    }

    /// Unzoomed position of a coordinate pair.
    pub fn base_position(&self, coord: (f64, f64)) -> (f64, f64) {
        let (cx, cy) = (self.width * 0.5, self.height * 0.5);
        (cx + self.width * coord.0, cy - self.height * coord.1)
    }

    /// Position under a scaled-mode zoom.
    pub fn zoomed_position(&self, base: (f64, f64), zoom: &ZoomTransform) -> (f64, f64) {
        (
            zoom.apply_x(self.x_scale.apply(base.0)),
            zoom.apply_y(self.y_scale.apply(base.1)),
        )
    }

    pub fn margin(&self) -> f64 {
        self.x_scale.range().0
    }
}
