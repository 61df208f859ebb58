//! Named transitions over node geometry.
//!
//! Each node has one slot per [`Channel`]. Starting a transition on an
//! occupied slot interrupts the running one: its properties snap to their
//! targets and it is reported as finished, so the caller runs the same end
//! effects it would have run on completion. Start values are read from the
//! node when the transition starts, so a new transition always continues
//! from wherever the interrupted one left off.

use std::collections::BTreeMap;

use bubbles_types::TopicId;
use tracing::trace;

use crate::node::{NodeGeometry, NodeTable};
use crate::tween::{Easing, Tween};

/// Independent animation slot of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    /// Radius and border ratio
    Geometry,
    /// Expanded panel size
    Panel,
    /// Document viewer height
    Viewer,
    /// Focus highlight stroke
    Focus,
}

/// What a transition is doing; decides its channel and end effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Initial grow-in
    Enter,
    /// Collapsed to opened
    Open,
    /// Opened to collapsed
    Close,
    /// Value-range change
    Resize,
    /// Search filter applied
    Search,
    Expand,
    Collapse,
    ViewerOpen,
    ViewerClose,
    Focus,
}

impl TransitionKind {
    pub fn channel(self) -> Channel {
        match self {
            TransitionKind::Enter
            | TransitionKind::Open
            | TransitionKind::Close
            | TransitionKind::Resize
            | TransitionKind::Search => Channel::Geometry,
            TransitionKind::Expand | TransitionKind::Collapse => Channel::Panel,
            TransitionKind::ViewerOpen | TransitionKind::ViewerClose => Channel::Viewer,
            TransitionKind::Focus => Channel::Focus,
        }
    }
}

/// Animatable property of [`NodeGeometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Radius,
    BorderRatio,
    PanelWidth,
    PanelHeight,
    ViewerHeight,
    FocusStroke,
}

impl Property {
    fn read(self, g: &NodeGeometry) -> f64 {
        match self {
            Property::Radius => g.r,
            Property::BorderRatio => g.border_ratio,
            Property::PanelWidth => g.size().0,
            Property::PanelHeight => g.size().1,
            Property::ViewerHeight => g.viewer_height,
            Property::FocusStroke => g.focus_stroke,
        }
    }

    fn write(self, g: &mut NodeGeometry, value: f64) {
        match self {
            Property::Radius => g.r = value,
            Property::BorderRatio => g.border_ratio = value,
            Property::PanelWidth => {
                let (_, h) = g.size();
                g.panel = Some((value, h));
            }
            Property::PanelHeight => {
                let (w, _) = g.size();
                g.panel = Some((w, value));
            }
            Property::ViewerHeight => g.viewer_height = value,
            Property::FocusStroke => g.focus_stroke = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PropertyTween {
    property: Property,
    from: f64,
    to: f64,
}

/// A transition description; start values are filled in when it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    kind: TransitionKind,
    duration_ms: f64,
    easing: Easing,
    targets: Vec<(Property, f64)>,
    start_values: Vec<(Property, f64)>,
}

impl Transition {
    pub fn new(kind: TransitionKind, duration_ms: f64, easing: Easing) -> Self {
        Self {
            kind,
            duration_ms,
            easing,
            targets: Vec::new(),
            start_values: Vec::new(),
        }
    }

    /// Animate `property` to `to`.
    pub fn to(mut self, property: Property, to: f64) -> Self {
        self.targets.push((property, to));
        self
    }

    /// Animate `property` from `from` instead of its current value.
    pub fn from(mut self, property: Property, from: f64) -> Self {
        self.start_values.push((property, from));
        self
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }
}

/// A transition that completed or was interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finished {
    pub topic: TopicId,
    pub kind: TransitionKind,
    pub interrupted: bool,
}

#[derive(Debug, Clone)]
struct Running {
    kind: TransitionKind,
    clock: Tween,
    properties: Vec<PropertyTween>,
}

impl Running {
    fn apply(&self, g: &mut NodeGeometry, k: f64) {
        for p in &self.properties {
            p.property.write(g, p.from + (p.to - p.from) * k);
        }
    }

    fn snap(&self, g: &mut NodeGeometry) {
        for p in &self.properties {
            p.property.write(g, p.to);
        }
    }
}

/// Running transitions keyed by node and channel.
#[derive(Debug, Clone, Default)]
pub struct TransitionTable {
    running: BTreeMap<(TopicId, Channel), Running>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `transition` on `topic`, interrupting whatever held the slot.
    pub fn start(
        &mut self,
        topic: TopicId,
        transition: Transition,
        geometry: &mut NodeGeometry,
    ) -> Option<Finished> {
        let channel = transition.kind.channel();
        let interrupted = self.running.remove(&(topic, channel)).map(|old| {
            trace!(topic, kind = ?old.kind, "Transition interrupted");
            old.snap(geometry);
            Finished {
                topic,
                kind: old.kind,
                interrupted: true,
            }
        });

        let properties = transition
            .targets
            .iter()
            .map(|&(property, to)| {
                let from = transition
                    .start_values
                    .iter()
                    .find(|(p, _)| *p == property)
                    .map(|&(_, v)| v)
                    .unwrap_or_else(|| property.read(geometry));
                PropertyTween { property, from, to }
            })
            .collect();
        let running = Running {
            kind: transition.kind,
            clock: Tween::new(0.0, 1.0, transition.duration_ms, transition.easing),
            properties,
        };
        running.apply(geometry, 0.0);
        self.running.insert((topic, channel), running);
        interrupted
    }

    /// Interrupt whatever runs on `topic`'s `channel`.
    pub fn interrupt(
        &mut self,
        topic: TopicId,
        channel: Channel,
        geometry: &mut NodeGeometry,
    ) -> Option<Finished> {
        let old = self.running.remove(&(topic, channel))?;
        old.snap(geometry);
        Some(Finished {
            topic,
            kind: old.kind,
            interrupted: true,
        })
    }

    /// Step every transition by `dt_ms`, writing eased values into `nodes`.
    pub fn advance(&mut self, dt_ms: f64, nodes: &mut NodeTable) -> Vec<Finished> {
        let mut finished = Vec::new();
        self.running.retain(|&(topic, _), running| {
            let Some(g) = nodes.geometry_mut(topic) else {
                return false;
            };
            if running.clock.advance(dt_ms) {
                running.snap(g);
                finished.push(Finished {
                    topic,
                    kind: running.kind,
                    interrupted: false,
                });
                false
            } else {
                running.apply(g, running.clock.eased());
                true
            }
        });
        finished
    }

    /// Kind of the transition on `topic`'s `channel`, if any.
    pub fn kind_on(&self, topic: TopicId, channel: Channel) -> Option<TransitionKind> {
        self.running.get(&(topic, channel)).map(|r| r.kind)
    }

    /// Whether any node is changing size.
    pub fn any_resizing(&self) -> bool {
        self.running
            .keys()
            .any(|(_, c)| matches!(c, Channel::Geometry | Channel::Panel))
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }
}
