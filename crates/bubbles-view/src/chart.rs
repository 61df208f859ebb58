//! Geometry of the per-topic source chart.

use bubbles_layout::LinearScale;
use bubbles_model::SourceAggregate;

/// Opacity of a document highlighted through its source.
pub fn highlight_opacity(ratio: f64) -> f64 {
    0.9 * ratio + 0.1
}

/// One plotted venue.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePoint {
    pub name: String,
    pub weight: f64,
    pub x: f64,
    pub y: f64,
}

/// Venues spread on a point band, heights on a linear weight axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceChart {
    pub points: Vec<SourcePoint>,
    pub width: f64,
    pub height: f64,
}

impl SourceChart {
    /// Lay out `sources` inside a panel of side `panel_size`.
    pub fn new(sources: &[SourceAggregate], panel_size: f64) -> Self {
        let width = panel_size * 0.7;
        let height = panel_size * 0.5 - 25.0;
        let max = sources.iter().map(|s| s.weight).fold(0.0, f64::max);
        let y = LinearScale::new((0.0, max * 1.1), (height, 0.0));

        // Outer and inner padding of one step leave n + 1 equal gaps.
        let step = width / (sources.len() + 1) as f64;
        let points = sources
            .iter()
            .enumerate()
            .map(|(i, s)| SourcePoint {
                name: s.name.clone(),
                weight: s.weight,
                x: step * (i + 1) as f64,
                y: y.apply(s.weight),
            })
            .collect();

        Self {
            points,
            width,
            height,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
