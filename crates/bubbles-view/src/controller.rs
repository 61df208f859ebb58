//! The application state and every interaction operation.
//!
//! [`BubbleApp`] owns the loaded model, the force simulation, the node
//! table and the running transitions. Operations mutate that state
//! synchronously; anything slow (document rankings, cached documents) runs
//! on a spawned task and reports back over a channel that
//! [`BubbleApp::advance`] drains at the start of every frame.
//!
//! Operations that spawn work must be called from within a Tokio runtime.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use bubbles_layout::{
    pack_around, spread_from, ForceParams, MappingScales, ScaledProjection, SimNode, Simulation,
    ValueRange, WordCloud, ZoomTransform, FREE_SCALE_EXTENT, SCALED_SCALE_EXTENT, TICK_MS,
};
use bubbles_loader::Dataset;
use bubbles_model::{
    search, CachedDocument, DisplayField, DocumentCache, ModelError, SearchQuery, SearchResults,
    SourceAggregate, TopicDocuments, TopicModel, WordMatch,
};
use bubbles_types::{Settings, TopicId};
use bubbles_worker::WorkerHandle;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::chart::{highlight_opacity, SourceChart};
use crate::error::ViewError;
use crate::node::{NodeGeometry, NodeState, NodeTable};
use crate::params::LaunchParams;
use crate::transition::{Channel, Finished, Property, Transition, TransitionKind, TransitionTable};
use crate::tween::{Easing, Tween};

/// Alert shown when a cached document cannot be fetched.
pub const FETCH_FAILED_ALERT: &str =
    "You do not have access to this file or the file could not be found.";

/// Viewer text for a document without cached metadata.
pub const NO_DOCUMENT_INFO: &str = "No public information is available for this document.";

const ENTER_MS: f64 = 2000.0;
const OPEN_MS: f64 = 500.0;
const PANEL_MS: f64 = 200.0;
const SEARCH_MS: f64 = 1000.0;
const RESIZE_MS: f64 = 1000.0;
const SCALED_MOVE_MS: f64 = 1000.0;
const VIEWER_OPEN_MS: f64 = 200.0;
const VIEWER_CLOSE_MS: f64 = 100.0;
const FOCUS_MS: f64 = 2000.0;
const FOCUS_STROKE: f64 = 6.0;
const OPENED_BORDER_RATIO: f64 = 0.1;
/// Follow-up transitions snapped while settling a channel
const SETTLE_LIMIT: usize = 4;
/// Minimum time a reheated simulation keeps its raised alpha target
const REHEAT_HOLD_MS: f64 = 500.0;

/// Options mirrored by the settings panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuiOptions {
    /// 1-based topic number of the focus control
    pub topic: usize,
    pub absolute_range: bool,
    pub scaled: bool,
    /// Search terms joined with `+`
    pub search: String,
}

/// Notifications for whoever drives the app.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Opened(TopicId),
    Closed(TopicId),
    Expanded(TopicId),
    Collapsed(TopicId),
    /// Rankings and sources of a topic arrived
    DocumentsReady(TopicId),
    SearchApplied { query: String, matches: usize },
    /// Blocking message for the user
    Alert(String),
}

/// Ranked documents and venues of a topic.
#[derive(Debug, Clone)]
pub struct TopicPanel {
    pub documents: Arc<TopicDocuments>,
    pub sources: Arc<Vec<SourceAggregate>>,
    pub chart: SourceChart,
}

/// What the document viewer of a node shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentView {
    pub rank: usize,
    pub doi: String,
    /// Location of the raw JSON, when the cache is enabled
    pub link: Option<String>,
    pub fields: Vec<DisplayField>,
}

impl DocumentView {
    /// Nothing to show but the placeholder text.
    pub fn is_placeholder(&self) -> bool {
        self.fields.is_empty()
    }
}

type Rankings = (Arc<TopicDocuments>, Arc<Vec<SourceAggregate>>);

#[derive(Debug)]
enum Completion {
    Documents {
        topic: TopicId,
        result: Result<Rankings, ModelError>,
    },
    Document {
        topic: TopicId,
        rank: usize,
        result: Result<Arc<CachedDocument>, ModelError>,
    },
}

#[derive(Debug, Clone, Copy)]
enum TimerAction {
    Expand(TopicId),
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    due_ms: f64,
    action: TimerAction,
}

#[derive(Debug, Clone)]
struct ScaledMove {
    from: Vec<(f64, f64)>,
    to: Vec<(f64, f64)>,
    clock: Tween,
}

/// The topic-bubble explorer.
pub struct BubbleApp {
    settings: Settings,
    options: GuiOptions,
    launch: LaunchParams,
    launch_opened: bool,
    launch_expanded: bool,
    model: Arc<TopicModel>,
    worker: WorkerHandle,
    cache: Arc<DocumentCache>,
    topic_scaled: Vec<(f64, f64)>,
    scales: MappingScales,
    simulation: Simulation,
    nodes: NodeTable,
    transitions: TransitionTable,
    clouds: Vec<Option<WordCloud>>,
    search: SearchResults,
    panels: Vec<Option<TopicPanel>>,
    requested: Vec<bool>,
    viewers: Vec<Option<DocumentView>>,
    doc_matches: HashMap<(TopicId, usize), Vec<WordMatch>>,
    fetching: HashSet<(TopicId, usize)>,
    timers: Vec<Timer>,
    clock_ms: f64,
    hold_until_ms: f64,
    frame_remainder: f64,
    zoom: ZoomTransform,
    scaled_zoom: Option<ZoomTransform>,
    projection: Option<ScaledProjection>,
    scaled_positions: Vec<(f64, f64)>,
    scaled_move: Option<ScaledMove>,
    dragging: Option<TopicId>,
    order: Vec<TopicId>,
    events: Vec<ViewEvent>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl BubbleApp {
    /// Build the scene for a loaded dataset and start the entry animation.
    pub fn new(
        settings: Settings,
        dataset: Dataset,
        worker: WorkerHandle,
        launch: LaunchParams,
    ) -> Self {
        let cache = Arc::new(DocumentCache::new(dataset.json_cache_path()));
        let model = Arc::new(TopicModel::new(dataset.topics, dataset.documents));
        let scales = MappingScales::new(ValueRange::Relative, model.alpha_range());
        let radii: Vec<f64> = model.topics().iter().map(|t| scales.radius(t.alpha)).collect();
        let n = radii.len();

        let center = settings.viewport.center();
        let spread = settings.simulation.initial_spread;
        let sim_nodes = pack_around(&radii, center)
            .into_iter()
            .map(|c| {
                let (x, y) = spread_from(center, c, spread);
                SimNode::at(x, y)
            })
            .collect();
        let simulation = Simulation::new(
            sim_nodes,
            ForceParams {
                center,
                centering_strength: settings.simulation.centering_strength,
                charge_strength: settings.simulation.charge_strength,
            },
        );

        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            options: GuiOptions {
                topic: launch.topic_num.unwrap_or(1),
                absolute_range: false,
                scaled: false,
                search: String::new(),
            },
            settings,
            launch,
            launch_opened: false,
            launch_expanded: false,
            model,
            worker,
            cache,
            topic_scaled: dataset.topic_scaled,
            scales,
            simulation,
            nodes: NodeTable::new(&radii),
            transitions: TransitionTable::new(),
            clouds: vec![None; n],
            search: SearchResults::default(),
            panels: vec![None; n],
            requested: vec![false; n],
            viewers: vec![None; n],
            doc_matches: HashMap::new(),
            fetching: HashSet::new(),
            timers: Vec::new(),
            clock_ms: 0.0,
            hold_until_ms: 0.0,
            frame_remainder: 0.0,
            zoom: ZoomTransform::IDENTITY,
            scaled_zoom: None,
            projection: None,
            scaled_positions: Vec::new(),
            scaled_move: None,
            dragging: None,
            order: (0..n).collect(),
            events: Vec::new(),
            completions_tx,
            completions_rx,
        };

        for (topic, &radius) in radii.iter().enumerate() {
            let enter = Transition::new(TransitionKind::Enter, ENTER_MS, Easing::ElasticOut)
                .to(Property::Radius, radius);
            app.start(topic, enter);
        }
        info!(
            topics = n,
            documents = app.model.documents().len(),
            cache = app.cache.is_enabled(),
            "Scene created"
        );
        app
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn options(&self) -> &GuiOptions {
        &self.options
    }

    pub fn model(&self) -> &TopicModel {
        &self.model
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn geometry(&self, topic: TopicId) -> Option<&NodeGeometry> {
        self.nodes.geometry(topic)
    }

    pub fn state(&self, topic: TopicId) -> Option<&NodeState> {
        self.nodes.state(topic)
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn scales(&self) -> &MappingScales {
        &self.scales
    }

    pub fn cloud(&self, topic: TopicId) -> Option<&WordCloud> {
        self.clouds.get(topic)?.as_ref()
    }

    pub fn search_results(&self) -> &SearchResults {
        &self.search
    }

    pub fn panel(&self, topic: TopicId) -> Option<&TopicPanel> {
        self.panels.get(topic)?.as_ref()
    }

    pub fn viewer(&self, topic: TopicId) -> Option<&DocumentView> {
        self.viewers.get(topic)?.as_ref()
    }

    /// Scene transform of the free layout.
    pub fn zoom(&self) -> ZoomTransform {
        self.zoom
    }

    /// Topics from bottom to top.
    pub fn draw_order(&self) -> &[TopicId] {
        &self.order
    }

    /// Simulated milliseconds since the scene was created.
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Notifications not yet drained.
    pub fn pending_events(&self) -> &[ViewEvent] {
        &self.events
    }

    /// Drain pending notifications.
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    /// Where `topic` is drawn, in scene coordinates.
    pub fn position(&self, topic: TopicId) -> Option<(f64, f64)> {
        if !self.options.scaled {
            return self.simulation.position(topic);
        }
        let base = *self.scaled_positions.get(topic)?;
        match (self.scaled_zoom, self.projection) {
            (Some(zoom), Some(projection)) => Some(projection.zoomed_position(base, &zoom)),
            _ => Some(base),
        }
    }

    // ---- node lifecycle ----

    /// Open a collapsed node: lay out its word cloud and fetch its documents.
    pub fn click_node(&mut self, topic: TopicId) -> Result<(), ViewError> {
        self.nodes.check(topic)?;
        match self.transitions.kind_on(topic, Channel::Geometry) {
            Some(TransitionKind::Open) => return Ok(()),
            Some(_) => self.interrupt(topic, Channel::Geometry),
            None => {}
        }
        if self.state_mut(topic)?.clicked {
            return Ok(());
        }

        self.ensure_cloud(topic)?;
        self.request_documents(topic);
        self.bring_to_front(topic);
        let state = self.state_mut(topic)?;
        state.clicked = true;
        state.hovered = false;
        state.arcs_hidden = true;

        let open = Transition::new(TransitionKind::Open, OPEN_MS, Easing::PolyOut)
            .to(Property::Radius, self.settings.view.opened_radius())
            .to(Property::BorderRatio, OPENED_BORDER_RATIO);
        self.start(topic, open);
        self.reheat();
        info!(topic, "Opening node");
        Ok(())
    }

    /// Expand an opened node to its full panel, or shrink it back.
    pub fn toggle_full_view(&mut self, topic: TopicId) -> Result<(), ViewError> {
        self.nodes.check(topic)?;
        if !self.state_mut(topic)?.clicked {
            return Err(ViewError::NotOpen(topic));
        }
        if self.panel_target(topic) {
            self.collapse(topic)?;
        } else {
            self.interrupt(topic, Channel::Panel);
            let (w, h) = self.settings.view.expanded_size();
            let expand = Transition::new(TransitionKind::Expand, PANEL_MS, Easing::PolyOut)
                .to(Property::PanelWidth, w)
                .to(Property::PanelHeight, h);
            self.start(topic, expand);
            self.reheat();
            debug!(topic, "Expanding node");
        }
        Ok(())
    }

    /// Return an opened node to its collapsed size, reversing any expansion.
    pub fn close_node(&mut self, topic: TopicId) -> Result<(), ViewError> {
        self.nodes.check(topic)?;
        if !self.state_mut(topic)?.clicked
            || self.transitions.kind_on(topic, Channel::Geometry) == Some(TransitionKind::Close)
        {
            return Ok(());
        }
        if self.panel_target(topic) {
            self.collapse(topic)?;
        }
        self.interrupt(topic, Channel::Geometry);
        self.state_mut(topic)?.cloud_visible = false;

        let radius = self.geometry_of(topic)?.radius;
        let close = Transition::new(TransitionKind::Close, OPEN_MS, Easing::PolyOut)
            .to(Property::Radius, radius)
            .to(Property::BorderRatio, 1.0);
        self.start(topic, close);
        self.reheat();
        info!(topic, "Closing node");
        Ok(())
    }

    /// Pointer entering or leaving a collapsed node.
    pub fn hover_node(&mut self, topic: TopicId, on: bool) -> Result<(), ViewError> {
        let state = self.state_mut(topic)?;
        state.hovered = on && !state.clicked;
        Ok(())
    }

    fn collapse(&mut self, topic: TopicId) -> Result<(), ViewError> {
        self.close_document_viewer(topic)?;
        self.interrupt(topic, Channel::Panel);
        self.state_mut(topic)?.doc_list_visible = false;
        let r = self.geometry_of(topic)?.r;
        let collapse = Transition::new(TransitionKind::Collapse, PANEL_MS, Easing::PolyIn)
            .to(Property::PanelWidth, r * 2.0)
            .to(Property::PanelHeight, r * 2.0);
        self.start(topic, collapse);
        self.reheat();
        debug!(topic, "Collapsing node");
        Ok(())
    }

    /// Whether `topic` is expanded or on its way there.
    fn panel_target(&self, topic: TopicId) -> bool {
        match self.transitions.kind_on(topic, Channel::Panel) {
            Some(TransitionKind::Expand) => true,
            Some(TransitionKind::Collapse) => false,
            _ => self
                .nodes
                .state(topic)
                .map(|s| s.expanded)
                .unwrap_or(false),
        }
    }

    // ---- search ----

    /// Filter topics by `+`-separated terms; empty input shows every topic.
    pub fn search(&mut self, input: &str) {
        self.apply_query(SearchQuery::parse(input));
    }

    pub fn clear_search(&mut self) {
        self.apply_query(SearchQuery::default());
    }

    /// Add a cloud word to the query, or remove it if already there.
    pub fn toggle_word(&mut self, topic: TopicId, cloud_index: usize) -> Result<(), ViewError> {
        let word = self
            .cloud(topic)
            .and_then(|c| c.words.get(cloud_index))
            .map(|w| w.text.clone())
            .ok_or(ViewError::UnknownWord {
                topic,
                index: cloud_index,
            })?;
        let mut query = self.search.query().clone();
        query.toggle(&word);
        self.apply_query(query);
        Ok(())
    }

    fn apply_query(&mut self, query: SearchQuery) {
        self.search = search(self.model.topics(), &query);
        self.options.search = query.input_string();

        for topic in 0..self.nodes.len() {
            let visible = self.search.is_visible(topic);
            let alpha = self.model.topics()[topic].alpha;
            let target = if visible {
                self.scales.radius(alpha)
            } else {
                0.0
            };

            self.settle(topic, Channel::Geometry);
            let opened_radius = self.settings.view.opened_radius();
            let Some(g) = self.nodes.geometry_mut(topic) else {
                continue;
            };
            g.radius = target;
            let Some(state) = self.nodes.state_mut(topic) else {
                continue;
            };
            state.search_hidden = !visible;
            // Opened nodes keep their size whatever the query says.
            let (dst, border) = if state.clicked {
                (opened_radius, OPENED_BORDER_RATIO)
            } else {
                (target, 1.0)
            };
            self.refresh_search_words(topic);

            let resize = Transition::new(TransitionKind::Search, SEARCH_MS, Easing::ElasticOut)
                .to(Property::Radius, dst)
                .to(Property::BorderRatio, border);
            self.start(topic, resize);
        }
        self.reheat();

        let matches = self.search.match_count();
        info!(query = %self.options.search, matches, "Search applied");
        self.events.push(ViewEvent::SearchApplied {
            query: self.options.search.clone(),
            matches,
        });
    }

    fn refresh_search_words(&mut self, topic: TopicId) {
        let words: BTreeSet<usize> = match (self.search.matches(topic), self.cloud(topic)) {
            (Some(matches), Some(cloud)) => matches
                .iter()
                .filter_map(|m| cloud.position_of(m.index))
                .collect(),
            _ => BTreeSet::new(),
        };
        if let Some(state) = self.nodes.state_mut(topic) {
            state.search_words = words;
        }
    }

    // ---- layout modes ----

    /// Size bubbles against `[0, 1]` instead of the data's alpha range.
    pub fn set_absolute_range(&mut self, absolute: bool) {
        self.options.absolute_range = absolute;
        self.scales = MappingScales::new(ValueRange::from_absolute(absolute), self.model.alpha_range());

        for topic in 0..self.nodes.len() {
            let alpha = self.model.topics()[topic].alpha;
            let radius = self.scales.radius(alpha);
            self.settle(topic, Channel::Geometry);
            let clicked = self.nodes.state(topic).map(|s| s.clicked).unwrap_or(false);
            let opened_radius = self.settings.view.opened_radius();
            let Some(g) = self.nodes.geometry_mut(topic) else {
                continue;
            };
            g.radius = radius;
            let dst = if clicked {
                opened_radius
            } else if g.r == 0.0 {
                0.0
            } else {
                radius
            };
            let resize = Transition::new(TransitionKind::Resize, RESIZE_MS, Easing::ElasticOut)
                .to(Property::Radius, dst);
            self.start(topic, resize);
        }
        self.reheat();
        info!(absolute, "Value range changed");

        if !self.search.query().is_empty() {
            let query = self.search.query().clone();
            self.apply_query(query);
        }
    }

    /// Switch between the simulated layout and the precomputed coordinates.
    pub fn set_scaled(&mut self, scaled: bool) -> Result<(), ViewError> {
        if scaled == self.options.scaled {
            return Ok(());
        }
        if scaled {
            let n = self.nodes.len();
            if self.topic_scaled.len() != n {
                return Err(ViewError::ScaledUnavailable(format!(
                    "{} coordinates for {} topics",
                    self.topic_scaled.len(),
                    n
                )));
            }
            let viewport = &self.settings.viewport;
            let projection = ScaledProjection::new(viewport.width, viewport.height, n)?;
            if let Some(topic) = self.dragging {
                self.drag_end(topic)?;
            }

            let from: Vec<(f64, f64)> = (0..n)
                .filter_map(|t| self.simulation.position(t))
                .collect();
            let to: Vec<(f64, f64)> = self
                .topic_scaled
                .iter()
                .map(|&c| projection.base_position(c))
                .collect();
            self.simulation.set_collide_enabled(false);
            self.scaled_positions = from.clone();
            self.scaled_move = Some(ScaledMove {
                from,
                to,
                clock: Tween::new(0.0, 1.0, SCALED_MOVE_MS, Easing::CubicInOut),
            });
            self.projection = Some(projection);
            self.scaled_zoom = None;
        } else {
            self.scaled_move = None;
            self.scaled_zoom = None;
            self.simulation.set_collide_enabled(true);
            self.reheat();
        }
        self.options.scaled = scaled;
        info!(scaled, "Layout mode changed");
        Ok(())
    }

    /// Apply a pan/zoom, clamped to the current mode's scale extent.
    pub fn zoom_to(&mut self, transform: ZoomTransform) {
        if self.options.scaled {
            if let Some(mv) = self.scaled_move.take() {
                self.scaled_positions = mv.to;
            }
            self.scaled_zoom = Some(transform.clamped(SCALED_SCALE_EXTENT));
        } else {
            self.zoom = transform.clamped(FREE_SCALE_EXTENT);
        }
    }

    /// Center the view on the 1-based topic `topic_num` and pulse its outline.
    pub fn focus_topic(&mut self, topic_num: usize) -> Result<(), ViewError> {
        let topic = topic_num
            .checked_sub(1)
            .ok_or(ViewError::UnknownTopic(topic_num))?;
        self.nodes.check(topic)?;
        let position = self
            .position(topic)
            .ok_or(ViewError::UnknownTopic(topic))?;
        self.options.topic = topic_num;
        self.zoom = self
            .zoom
            .centered_on(position, self.settings.viewport.center());
        self.bring_to_front(topic);
        let pulse = Transition::new(TransitionKind::Focus, FOCUS_MS, Easing::CubicInOut)
            .from(Property::FocusStroke, FOCUS_STROKE)
            .to(Property::FocusStroke, 0.0);
        self.start(topic, pulse);
        debug!(topic, "Focused topic");
        Ok(())
    }

    // ---- drag ----

    pub fn drag_start(&mut self, topic: TopicId) -> Result<(), ViewError> {
        self.nodes.check(topic)?;
        if self.options.scaled {
            return Ok(());
        }
        let (x, y) = self
            .simulation
            .position(topic)
            .ok_or(ViewError::UnknownTopic(topic))?;
        self.simulation
            .reheat(self.settings.simulation.drag_alpha_target);
        self.simulation.pin(topic, x, y)?;
        self.dragging = Some(topic);
        Ok(())
    }

    /// Move a dragged node to `(x, y)` in scene coordinates.
    pub fn drag_to(&mut self, topic: TopicId, x: f64, y: f64) -> Result<(), ViewError> {
        if self.options.scaled || self.dragging != Some(topic) {
            return Ok(());
        }
        self.simulation.pin(topic, x, y)?;
        Ok(())
    }

    pub fn drag_end(&mut self, topic: TopicId) -> Result<(), ViewError> {
        if self.dragging != Some(topic) {
            return Ok(());
        }
        self.dragging = None;
        self.simulation.unpin(topic)?;
        if !self.transitions.any_resizing() {
            self.simulation.relax();
        }
        Ok(())
    }

    // ---- documents ----

    /// Pointer entering or leaving a document of the list.
    ///
    /// With the document cache enabled, entering fetches the document once
    /// and flags the cloud words found in it; leaving clears them again.
    pub fn hover_document(&mut self, topic: TopicId, rank: usize, on: bool) -> Result<(), ViewError> {
        let doi = self.document_doi(topic, rank)?;
        if !self.cache.is_enabled() {
            let state = self.state_mut(topic)?;
            state.hovered_doc = if on { Some(rank) } else { None };
            return Ok(());
        }

        if on {
            let words = self.known_matches(topic, rank);
            let state = self.state_mut(topic)?;
            state.hovered_doc = Some(rank);
            match words {
                Some(words) => state.hover_words = words,
                None => self.fetch_document(topic, rank, doi),
            }
        } else {
            let words = self.known_matches(topic, rank);
            let state = self.state_mut(topic)?;
            if state.hovered_doc == Some(rank) {
                state.hovered_doc = None;
            }
            match words {
                Some(words) => state.hover_words.retain(|w| !words.contains(w)),
                None => state.hover_words.clear(),
            }
        }
        Ok(())
    }

    /// Show a document's metadata in the expanded panel's viewer.
    ///
    /// Documents only open when the dataset names a document cache.
    pub fn open_document(&mut self, topic: TopicId, rank: usize) -> Result<(), ViewError> {
        let doi = self.document_doi(topic, rank)?;
        if !self.state_mut(topic)?.expanded {
            return Err(ViewError::NotExpanded(topic));
        }
        if !self.cache.is_enabled() {
            return Err(ViewError::CacheDisabled);
        }

        let (fields, words) = match self.cache.cached(&doi) {
            Some(doc) => (doc.display_fields(false), self.matches_for(topic, rank, &doc)),
            None => {
                self.fetch_document(topic, rank, doi.clone());
                (Vec::new(), BTreeSet::new())
            }
        };
        let link = self.cache.location(&doi);
        if let Some(slot) = self.viewers.get_mut(topic) {
            *slot = Some(DocumentView {
                rank,
                doi,
                link,
                fields,
            });
        }

        let state = self.state_mut(topic)?;
        state.last_clicked_doc = Some(rank);
        state.viewer_words = words;
        if !state.viewer_open {
            state.viewer_open = true;
            let view = &self.settings.view;
            let height = view.min_word_cloud_size * view.expanded_height_scale * 0.8;
            let open = Transition::new(TransitionKind::ViewerOpen, VIEWER_OPEN_MS, Easing::PolyOut)
                .to(Property::ViewerHeight, height);
            self.start(topic, open);
        }
        debug!(topic, rank, "Opened document viewer");
        Ok(())
    }

    pub fn close_document_viewer(&mut self, topic: TopicId) -> Result<(), ViewError> {
        let state = self.state_mut(topic)?;
        state.last_clicked_doc = None;
        state.viewer_words.clear();
        if state.viewer_open
            && self.transitions.kind_on(topic, Channel::Viewer) != Some(TransitionKind::ViewerClose)
        {
            let close =
                Transition::new(TransitionKind::ViewerClose, VIEWER_CLOSE_MS, Easing::PolyOut)
                    .to(Property::ViewerHeight, 0.0);
            self.start(topic, close);
        }
        Ok(())
    }

    /// Pointer entering or leaving a venue of the source chart.
    pub fn hover_source(&mut self, topic: TopicId, index: usize, on: bool) -> Result<(), ViewError> {
        let shares = self.source_shares(topic, index)?;
        let state = self.state_mut(topic)?;
        if on {
            state.hovered_source = Some(index);
            state.doc_highlights.extend(shares);
        } else {
            if state.hovered_source == Some(index) {
                state.hovered_source = None;
            }
            if !state.sticky_sources.contains(&index) {
                for (rank, _) in shares {
                    state.doc_highlights.remove(&rank);
                }
            }
        }
        Ok(())
    }

    /// Pin or unpin a venue's document highlight.
    pub fn toggle_source(&mut self, topic: TopicId, index: usize) -> Result<(), ViewError> {
        let shares = self.source_shares(topic, index)?;
        let state = self.state_mut(topic)?;
        if state.sticky_sources.remove(&index) {
            if state.hovered_source != Some(index) {
                for (rank, _) in shares {
                    state.doc_highlights.remove(&rank);
                }
            }
        } else {
            state.sticky_sources.insert(index);
            state.doc_highlights.extend(shares);
        }
        Ok(())
    }

    fn source_shares(&self, topic: TopicId, index: usize) -> Result<Vec<(usize, f64)>, ViewError> {
        self.nodes.check(topic)?;
        let panel = self
            .panel(topic)
            .ok_or(ViewError::DocumentsPending(topic))?;
        let source = panel
            .sources
            .get(index)
            .ok_or(ViewError::UnknownSource { topic, index })?;
        Ok(source
            .docs
            .iter()
            .map(|d| (d.index, highlight_opacity(d.ratio)))
            .collect())
    }

    fn document_doi(&self, topic: TopicId, rank: usize) -> Result<String, ViewError> {
        self.nodes.check(topic)?;
        let panel = self
            .panel(topic)
            .ok_or(ViewError::DocumentsPending(topic))?;
        let entry = panel
            .documents
            .docs
            .get(rank)
            .ok_or(ViewError::UnknownDocument { topic, rank })?;
        let doc = self
            .model
            .document(entry.doc)
            .ok_or(ModelError::DocumentNotFound(entry.doc))?;
        Ok(doc.doi.clone())
    }

    fn known_matches(&self, topic: TopicId, rank: usize) -> Option<BTreeSet<usize>> {
        self.doc_matches
            .get(&(topic, rank))
            .map(|m| m.iter().map(|w| w.cloud_index).collect())
    }

    fn matches_for(&mut self, topic: TopicId, rank: usize, doc: &CachedDocument) -> BTreeSet<usize> {
        if let Some(words) = self.known_matches(topic, rank) {
            return words;
        }
        let matches = match self.cloud(topic) {
            Some(cloud) => doc.matched_words(&cloud.texts()),
            None => Vec::new(),
        };
        let words = matches.iter().map(|w| w.cloud_index).collect();
        self.doc_matches.insert((topic, rank), matches);
        words
    }

    fn fetch_document(&mut self, topic: TopicId, rank: usize, doi: String) {
        if !self.fetching.insert((topic, rank)) {
            return;
        }
        let cache = Arc::clone(&self.cache);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = cache.fetch(&doi).await;
            let _ = tx.send(Completion::Document {
                topic,
                rank,
                result,
            });
        });
    }

    fn request_documents(&mut self, topic: TopicId) {
        let Some(requested) = self.requested.get_mut(topic) else {
            return;
        };
        if *requested {
            return;
        }
        *requested = true;

        let model = Arc::clone(&self.model);
        let worker = self.worker.clone();
        let tx = self.completions_tx.clone();
        let n = self.settings.view.top_documents;
        tokio::spawn(async move {
            let result = async {
                let documents = model.topic_documents(&worker, topic, n).await?;
                let sources = model.topic_sources(&worker, topic, n).await?;
                Ok::<_, ModelError>((documents, sources))
            }
            .await;
            let _ = tx.send(Completion::Documents { topic, result });
        });
    }

    fn apply_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Documents { topic, result } => match result {
                Ok((documents, sources)) => {
                    let chart = SourceChart::new(&sources, self.settings.view.min_word_cloud_size);
                    debug!(topic, documents = documents.len(), sources = sources.len(), "Documents ready");
                    if let Some(slot) = self.panels.get_mut(topic) {
                        *slot = Some(TopicPanel {
                            documents,
                            sources,
                            chart,
                        });
                    }
                    self.events.push(ViewEvent::DocumentsReady(topic));
                }
                Err(e) => {
                    warn!(topic, error = %e, "Failed to rank topic documents");
                    if let Some(requested) = self.requested.get_mut(topic) {
                        *requested = false;
                    }
                }
            },
            Completion::Document {
                topic,
                rank,
                result,
            } => {
                self.fetching.remove(&(topic, rank));
                match result {
                    Ok(doc) => self.document_arrived(topic, rank, &doc),
                    Err(e) => {
                        warn!(topic, rank, error = %e, "Failed to fetch cached document");
                        self.events
                            .push(ViewEvent::Alert(FETCH_FAILED_ALERT.to_string()));
                    }
                }
            }
        }
    }

    fn document_arrived(&mut self, topic: TopicId, rank: usize, doc: &CachedDocument) {
        let words = self.matches_for(topic, rank, doc);
        let Some(state) = self.nodes.state_mut(topic) else {
            return;
        };
        if state.hovered_doc == Some(rank) {
            state.hover_words = words.clone();
        }
        if state.viewer_open && state.last_clicked_doc == Some(rank) {
            state.viewer_words = words;
            if let Some(Some(view)) = self.viewers.get_mut(topic) {
                view.fields = doc.display_fields(false);
            }
        }
    }

    // ---- frame loop ----

    /// Run simulated time forward in fixed frames.
    pub fn advance(&mut self, dt_ms: f64) {
        self.frame_remainder += dt_ms.max(0.0);
        while self.frame_remainder >= TICK_MS {
            self.frame_remainder -= TICK_MS;
            self.frame(TICK_MS);
        }
    }

    fn frame(&mut self, dt_ms: f64) {
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply_completion(completion);
        }

        self.clock_ms += dt_ms;
        self.fire_timers();

        for finished in self.transitions.advance(dt_ms, &mut self.nodes) {
            self.finish(finished);
        }
        self.advance_scaled_move(dt_ms);

        if !self.transitions.any_resizing()
            && self.dragging.is_none()
            && self.clock_ms >= self.hold_until_ms
        {
            self.simulation.relax();
        }
        if let Err(e) = self.simulation.set_collide_radii(self.nodes.collide_radii()) {
            warn!(error = %e, "Collision radii out of sync");
        }
        if !self.options.scaled {
            self.simulation.step();
        }
    }

    fn fire_timers(&mut self) {
        let now = self.clock_ms;
        let (due, pending): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|t| t.due_ms <= now);
        self.timers = pending;
        for timer in due {
            match timer.action {
                TimerAction::Expand(topic) => {
                    let open = self.nodes.state(topic).map(|s| s.clicked).unwrap_or(false);
                    if open && !self.panel_target(topic) {
                        if let Err(e) = self.toggle_full_view(topic) {
                            warn!(topic, error = %e, "Launch expand failed");
                        }
                    }
                }
            }
        }
    }

    fn advance_scaled_move(&mut self, dt_ms: f64) {
        let Some(mv) = self.scaled_move.as_mut() else {
            return;
        };
        let done = mv.clock.advance(dt_ms);
        let k = mv.clock.eased();
        self.scaled_positions = mv
            .from
            .iter()
            .zip(&mv.to)
            .map(|(a, b)| (a.0 + (b.0 - a.0) * k, a.1 + (b.1 - a.1) * k))
            .collect();
        if done {
            self.scaled_move = None;
        }
    }

    /// End effects of a completed or interrupted transition.
    fn finish(&mut self, finished: Finished) {
        let topic = finished.topic;
        match finished.kind {
            TransitionKind::Enter => {
                if !self.launch_opened && self.launch.topic() == Some(topic) {
                    self.launch_opened = true;
                    if let Err(e) = self.click_node(topic) {
                        warn!(topic, error = %e, "Launch topic could not be opened");
                    }
                }
            }
            TransitionKind::Open => {
                if let Some(state) = self.nodes.state_mut(topic) {
                    state.cloud_visible = true;
                    state.label_hidden = true;
                }
                self.events.push(ViewEvent::Opened(topic));
                if self.launch.expand
                    && !self.launch_expanded
                    && self.launch.topic() == Some(topic)
                {
                    self.launch_expanded = true;
                    self.timers.push(Timer {
                        due_ms: self.clock_ms + self.settings.view.expand_delay_ms as f64,
                        action: TimerAction::Expand(topic),
                    });
                }
            }
            TransitionKind::Close => {
                if let Some(state) = self.nodes.state_mut(topic) {
                    state.clicked = false;
                    state.label_hidden = false;
                    state.arcs_hidden = false;
                }
                self.events.push(ViewEvent::Closed(topic));
            }
            TransitionKind::Expand => {
                if let Some(state) = self.nodes.state_mut(topic) {
                    state.expanded = true;
                    state.doc_list_visible = true;
                }
                self.events.push(ViewEvent::Expanded(topic));
            }
            TransitionKind::Collapse => {
                if let Some(state) = self.nodes.state_mut(topic) {
                    state.expanded = false;
                    state.doc_list_visible = false;
                }
                if let Some(g) = self.nodes.geometry_mut(topic) {
                    g.panel = None;
                }
                self.events.push(ViewEvent::Collapsed(topic));
            }
            TransitionKind::ViewerClose => {
                if let Some(state) = self.nodes.state_mut(topic) {
                    state.viewer_open = false;
                }
                if let Some(slot) = self.viewers.get_mut(topic) {
                    *slot = None;
                }
            }
            TransitionKind::Resize
            | TransitionKind::Search
            | TransitionKind::ViewerOpen
            | TransitionKind::Focus => {}
        }
    }

    // ---- helpers ----

    fn start(&mut self, topic: TopicId, transition: Transition) {
        let Some(g) = self.nodes.geometry_mut(topic) else {
            return;
        };
        if let Some(interrupted) = self.transitions.start(topic, transition, g) {
            self.finish(interrupted);
        }
    }

    fn interrupt(&mut self, topic: TopicId, channel: Channel) {
        let Some(g) = self.nodes.geometry_mut(topic) else {
            return;
        };
        if let Some(interrupted) = self.transitions.interrupt(topic, channel, g) {
            self.finish(interrupted);
        }
    }

    /// Interrupt `channel` until no transition is left on it. End effects
    /// may start a follow-up transition on the same channel (an interrupted
    /// launch entry opens its node), which is snapped as well.
    fn settle(&mut self, topic: TopicId, channel: Channel) {
        for _ in 0..SETTLE_LIMIT {
            if self.transitions.kind_on(topic, channel).is_none() {
                return;
            }
            self.interrupt(topic, channel);
        }
    }

    fn reheat(&mut self) {
        self.simulation
            .reheat(self.settings.simulation.reheat_alpha_target);
        self.hold_until_ms = self.clock_ms + REHEAT_HOLD_MS;
    }

    fn ensure_cloud(&mut self, topic: TopicId) -> Result<(), ViewError> {
        if self.cloud(topic).is_some() {
            return Ok(());
        }
        let view = &self.settings.view;
        let size = (
            view.min_word_cloud_size - 15.0,
            view.min_word_cloud_size - 50.0,
        );
        let cloud = WordCloud::layout(
            self.model.topic(topic)?,
            view.word_cloud_words,
            size,
            topic as u64,
        );
        if let Some(slot) = self.clouds.get_mut(topic) {
            *slot = Some(cloud);
        }
        self.refresh_search_words(topic);
        Ok(())
    }

    fn bring_to_front(&mut self, topic: TopicId) {
        self.order.retain(|&t| t != topic);
        self.order.push(topic);
    }

    fn state_mut(&mut self, topic: TopicId) -> Result<&mut NodeState, ViewError> {
        self.nodes
            .state_mut(topic)
            .ok_or(ViewError::UnknownTopic(topic))
    }

    fn geometry_of(&self, topic: TopicId) -> Result<&NodeGeometry, ViewError> {
        self.nodes
            .geometry(topic)
            .ok_or(ViewError::UnknownTopic(topic))
    }
}
