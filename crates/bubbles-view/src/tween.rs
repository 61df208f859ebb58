//! Easing curves and timed numeric interpolation.

use std::f64::consts::{PI, TAU};

const POLY_EXPONENT: i32 = 3;
const ELASTIC_AMPLITUDE: f64 = 1.0;
const ELASTIC_PERIOD: f64 = 0.3;

/// Maps normalized time `[0, 1]` to progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Cubic, starting slow
    PolyIn,
    /// Cubic, ending slow
    PolyOut,
    /// Cubic at both ends
    CubicInOut,
    /// Overshoots and settles like a plucked spring
    ElasticOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::PolyIn => t.powi(POLY_EXPONENT),
            Easing::PolyOut => 1.0 - (1.0 - t).powi(POLY_EXPONENT),
            Easing::CubicInOut => {
                let t = t * 2.0;
                if t <= 1.0 {
                    t * t * t / 2.0
                } else {
                    let t = t - 2.0;
                    (t * t * t + 2.0) / 2.0
                }
            }
            Easing::ElasticOut => elastic_out(t),
        }
    }
}

/// `2^(-10x)` rescaled so it is exactly 1 at 0 and 0 at 1.
fn tpmt(x: f64) -> f64 {
    (2f64.powf(-10.0 * x) - 0.0009765625) * 1.0009775171065494
}

fn elastic_out(t: f64) -> f64 {
    let a = ELASTIC_AMPLITUDE.max(1.0);
    let p = ELASTIC_PERIOD / TAU;
    let s = (1.0 / a).asin() * p;
    1.0 - a * tpmt(t) * ((t + s) / p).sin()
}

/// Interpolates one value over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    duration_ms: f64,
    elapsed_ms: f64,
    easing: Easing,
}

impl Tween {
    pub fn new(from: f64, to: f64, duration_ms: f64, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            elapsed_ms: 0.0,
            easing,
        }
    }

    /// Normalized elapsed time.
    pub fn progress(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).min(1.0)
        }
    }

    pub fn value(&self) -> f64 {
        self.value_at(self.easing.apply(self.progress()))
    }

    /// Interpolated value at eased progress `k`.
    pub fn value_at(&self, k: f64) -> f64 {
        self.from + (self.to - self.from) * k
    }

    /// Eased progress.
    pub fn eased(&self) -> f64 {
        self.easing.apply(self.progress())
    }

    /// Move time forward; true once the tween has run its full duration.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        self.elapsed_ms += dt_ms.max(0.0);
        self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

/// Point on a circle of radius `r` at `angle`, measured clockwise from
/// twelve o'clock.
pub fn polar(r: f64, angle: f64) -> (f64, f64) {
    (r * angle.sin(), -r * angle.cos())
}

/// Sweep of a share of the full circle.
pub fn share_angle(share: f64) -> f64 {
    2.0 * PI * share
}
