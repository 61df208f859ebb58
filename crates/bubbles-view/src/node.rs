//! Per-node geometry and interaction state.
//!
//! Positions belong to the force simulation; everything else a node
//! carries lives here, indexed by topic id.

use std::collections::{BTreeMap, BTreeSet};

use bubbles_types::TopicId;

use crate::error::ViewError;

/// Animated geometry of one bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGeometry {
    /// Current radius
    pub r: f64,
    /// Radius the node returns to when collapsed
    pub radius: f64,
    /// Corner radius relative to `r`; 1 is a circle
    pub border_ratio: f64,
    /// Panel size while expanded or resizing
    pub panel: Option<(f64, f64)>,
    /// Height of the document viewer
    pub viewer_height: f64,
    /// Width of the focus highlight stroke
    pub focus_stroke: f64,
}

impl NodeGeometry {
    pub fn new(radius: f64) -> Self {
        Self {
            r: 0.0,
            radius,
            border_ratio: 1.0,
            panel: None,
            viewer_height: 0.0,
            focus_stroke: 0.0,
        }
    }

    /// Drawn width and height.
    pub fn size(&self) -> (f64, f64) {
        self.panel.unwrap_or((self.r * 2.0, self.r * 2.0))
    }

    pub fn corner_radius(&self) -> f64 {
        self.r * self.border_ratio
    }
}

/// Interaction flags of one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeState {
    /// Opened, or on its way to opened
    pub clicked: bool,
    /// Full panel shown
    pub expanded: bool,
    pub cloud_visible: bool,
    pub label_hidden: bool,
    pub arcs_hidden: bool,
    /// Fails the active search
    pub search_hidden: bool,
    pub doc_list_visible: bool,
    pub hovered: bool,
    pub viewer_open: bool,
    /// Document shown in the viewer
    pub last_clicked_doc: Option<usize>,
    pub hovered_doc: Option<usize>,
    /// Cloud words flagged by the search query
    pub search_words: BTreeSet<usize>,
    /// Cloud words found in the hovered document
    pub hover_words: BTreeSet<usize>,
    /// Cloud words found in the document shown in the viewer
    pub viewer_words: BTreeSet<usize>,
    /// Document rank to highlight opacity, from the source chart
    pub doc_highlights: BTreeMap<usize, f64>,
    pub hovered_source: Option<usize>,
    /// Sources whose highlight stays after the pointer leaves
    pub sticky_sources: BTreeSet<usize>,
}

/// Geometry and state for every topic, indexed by topic id.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    geometry: Vec<NodeGeometry>,
    state: Vec<NodeState>,
}

impl NodeTable {
    /// One collapsed node of radius 0 per target radius.
    pub fn new(radii: &[f64]) -> Self {
        Self {
            geometry: radii.iter().map(|&r| NodeGeometry::new(r)).collect(),
            state: vec![NodeState::default(); radii.len()],
        }
    }

    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    pub fn check(&self, topic: TopicId) -> Result<(), ViewError> {
        if topic < self.len() {
            Ok(())
        } else {
            Err(ViewError::UnknownTopic(topic))
        }
    }

    pub fn geometry(&self, topic: TopicId) -> Option<&NodeGeometry> {
        self.geometry.get(topic)
    }

    pub fn geometry_mut(&mut self, topic: TopicId) -> Option<&mut NodeGeometry> {
        self.geometry.get_mut(topic)
    }

    pub fn state(&self, topic: TopicId) -> Option<&NodeState> {
        self.state.get(topic)
    }

    pub fn state_mut(&mut self, topic: TopicId) -> Option<&mut NodeState> {
        self.state.get_mut(topic)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TopicId, &NodeGeometry, &NodeState)> {
        self.geometry
            .iter()
            .zip(&self.state)
            .enumerate()
            .map(|(i, (g, s))| (i, g, s))
    }

    /// Collision radius of every node: opened nodes keep a wider margin.
    pub fn collide_radii(&self) -> Vec<f64> {
        self.iter()
            .map(|(_, g, s)| if s.clicked { g.r * 1.2 } else { g.r + 2.0 })
            .collect()
    }

    /// Topics currently opened.
    pub fn opened(&self) -> impl Iterator<Item = TopicId> + '_ {
        self.state
            .iter()
            .enumerate()
            .filter(|(_, s)| s.clicked)
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_nodes_start_collapsed_at_zero() {
        let table = NodeTable::new(&[30.0, 50.0]);
        assert_eq!(table.len(), 2);
        let g = table.geometry(1).unwrap();
        assert_eq!(g.r, 0.0);
        assert_eq!(g.radius, 50.0);
        assert_eq!(g.size(), (0.0, 0.0));
        assert!(!table.state(0).unwrap().clicked);
        assert!(matches!(table.check(2), Err(ViewError::UnknownTopic(2))));
    }

    #[test]
    fn test_collide_radii() {
        let mut table = NodeTable::new(&[30.0, 50.0]);
        table.geometry_mut(0).unwrap().r = 30.0;
        table.geometry_mut(1).unwrap().r = 200.0;
        table.state_mut(1).unwrap().clicked = true;
        let radii = table.collide_radii();
        assert!((radii[0] - 32.0).abs() < 1e-9);
        assert!((radii[1] - 240.0).abs() < 1e-9);
        assert_eq!(table.opened().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_panel_overrides_size() {
        let mut g = NodeGeometry::new(40.0);
        g.r = 40.0;
        g.border_ratio = 0.1;
        assert_eq!(g.size(), (80.0, 80.0));
        assert!((g.corner_radius() - 4.0).abs() < 1e-9);
        g.panel = Some((920.0, 800.0));
        assert_eq!(g.size(), (920.0, 800.0));
    }
}
