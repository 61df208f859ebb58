//! # bubbles-view
//!
//! Interaction layer of the topic-bubble explorer.
//!
//! Each topic is a node that moves between three states:
//! collapsed (a circle with its name), opened (word cloud shown) and
//! expanded (document list and source chart added). Every change of size
//! is a timed transition; interrupting one snaps it to its end state
//! before the next one starts.
//!
//! ## Features
//! - Per-node transitions on independent channels with snap-on-interrupt
//! - Conjunctive search with per-term arcs; opened nodes are never collapsed
//! - Relative/absolute value range and simulated/scaled layouts
//! - Document hover highlighting through the optional document cache
//! - SVG frames of any state, plus the loading bar
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut app = BubbleApp::new(settings, dataset, worker, LaunchParams::default());
//! app.click_node(0)?;
//! app.advance(600.0);
//! let svg = render_svg(&app)?;
//! ```

pub mod chart;
pub mod controller;
pub mod error;
pub mod node;
pub mod params;
pub mod render;
pub mod transition;
pub mod tween;

pub use chart::{SourceChart, SourcePoint};
pub use controller::{
    BubbleApp, DocumentView, GuiOptions, TopicPanel, ViewEvent, FETCH_FAILED_ALERT,
    NO_DOCUMENT_INFO,
};
pub use error::ViewError;
pub use node::{NodeGeometry, NodeState, NodeTable};
pub use params::LaunchParams;
pub use render::{render_progress, render_svg};
pub use transition::{Channel, Transition, TransitionKind, TransitionTable};
pub use tween::{Easing, Tween};
