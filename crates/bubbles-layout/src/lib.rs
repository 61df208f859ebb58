//! # bubbles-layout
//!
//! Node placement for the topic-bubble explorer.
//!
//! ## Features
//! - Square-root scales mapping alpha to radius and fill, over the data's
//!   alpha range or the absolute range `[0, 1]`
//! - Sequential color schemes for bubbles and search terms
//! - Front-chain circle packing for the initial placement
//! - A cooling force simulation: repulsion, collision on live radii,
//!   centering, and pinning while dragged
//! - Fixed-coordinate projection with its own pan/zoom model
//! - Spiral word-cloud placement

pub mod cloud;
pub mod color;
pub mod error;
pub mod force;
pub mod pack;
pub mod scale;
pub mod zoom;

pub use cloud::{CloudWord, WordCloud};
pub use color::Rgb;
pub use error::LayoutError;
pub use force::{ForceParams, SimNode, Simulation, TICK_MS};
pub use pack::{pack_around, pack_siblings, spread_from, Circle};
pub use scale::{LinearScale, MappingScales, SqrtScale, ValueRange};
pub use zoom::{ScaledProjection, ZoomTransform, FREE_SCALE_EXTENT, SCALED_SCALE_EXTENT};
