//! Interaction tests for the bubble explorer.
//!
//! Each test builds a three-topic scene against a real ranking worker and
//! drives it with simulated time.

use std::path::Path;
use std::time::Duration;

use bubbles_layout::{ZoomTransform, TICK_MS};
use bubbles_loader::{Dataset, DatasetConfig};
use bubbles_types::{DocTopicMatrix, Document, Settings, Topic, WeightedWord};
use bubbles_view::{
    render_svg, BubbleApp, Channel, LaunchParams, TransitionKind, ViewError, ViewEvent,
    FETCH_FAILED_ALERT, NO_DOCUMENT_INFO,
};
use bubbles_worker::WorkerHandle;
use tempfile::TempDir;

const EPS: f64 = 1e-6;

fn topics() -> Vec<Topic> {
    vec![
        Topic::new(
            0,
            0.5,
            vec![
                WeightedWord::new("science", 5.0),
                WeightedWord::new("art", 3.0),
                WeightedWord::new("policy", 2.0),
            ],
        ),
        Topic::new(
            1,
            0.3,
            vec![
                WeightedWord::new("science", 4.0),
                WeightedWord::new("finance", 1.0),
            ],
        ),
        Topic::new(
            2,
            0.2,
            vec![WeightedWord::new("art", 2.0), WeightedWord::new("music", 2.0)],
        ),
    ]
}

fn documents() -> Vec<Document> {
    [
        ["doc-a", "Alpha", "Ann", "Journal X", "1", "2", "2001-01-01", "1-10"],
        ["doc-b", "Beta", "Bob", "Journal Y", "3", "4", "2002-02-02", "11-20"],
        ["doc-c", "Gamma", "Cy", "Journal X", "5", "6", "2003-03-03", "21-30"],
    ]
    .iter()
    .map(|row| Document::from_record(row).unwrap())
    .collect()
}

fn matrix() -> DocTopicMatrix {
    DocTopicMatrix {
        i: vec![0, 1, 1, 2, 0, 2],
        p: vec![0, 2, 4, 6],
        x: vec![4.0, 2.0, 3.0, 1.0, 1.0, 5.0],
    }
}

/// Writes one JSON record per DOI into `dir`.
fn write_cache(dir: &Path) {
    for (doi, title, content) in [
        ("doc-a", "Alpha", "Science meets policy."),
        ("doc-b", "Beta", "Nothing relevant here."),
    ] {
        let record = serde_json::json!({ "title": title, "content": content });
        std::fs::write(dir.join(doi), record.to_string()).unwrap();
    }
}

async fn scene_with(
    cache: Option<&Path>,
    topic_scaled: Vec<(f64, f64)>,
    launch: LaunchParams,
) -> BubbleApp {
    let worker = WorkerHandle::spawn();
    let summary = worker.set_matrix(matrix()).await.unwrap();
    let dataset = Dataset {
        topics: topics(),
        documents: documents(),
        topic_scaled,
        config: DatasetConfig {
            json_cache_path: cache.map(|dir| format!("{}/", dir.display())),
        },
        matrix: summary,
    };
    BubbleApp::new(Settings::default(), dataset, worker, launch)
}

async fn scene(cache: Option<&Path>) -> BubbleApp {
    scene_with(
        cache,
        vec![(0.1, 0.2), (-0.2, 0.1), (0.0, -0.3)],
        LaunchParams::default(),
    )
    .await
}

/// Runs frames until `done` holds, yielding so spawned work can finish.
async fn run_until(app: &mut BubbleApp, done: impl Fn(&BubbleApp) -> bool) -> bool {
    for _ in 0..500 {
        app.advance(TICK_MS);
        if done(app) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    false
}

/// A scene past its entry animation with topic 0 opened and ranked.
async fn opened_scene(cache: Option<&Path>) -> BubbleApp {
    let mut app = scene(cache).await;
    app.advance(2100.0);
    app.click_node(0).unwrap();
    assert!(run_until(&mut app, |a| a.panel(0).is_some()).await);
    app.advance(600.0);
    app
}

#[tokio::test]
async fn test_entry_sizes_follow_alpha() {
    let mut app = scene(None).await;
    assert_eq!(app.geometry(0).unwrap().r, 0.0);
    app.advance(2100.0);

    let r: Vec<f64> = (0..3).map(|t| app.geometry(t).unwrap().r).collect();
    assert!((r[0] - 80.0).abs() < EPS);
    assert!((r[2] - 20.0).abs() < EPS);
    assert!(r[0] > r[1] && r[1] > r[2]);
    assert!(app.transitions().is_empty());
}

#[tokio::test]
async fn test_absolute_range_round_trip() {
    let mut app = scene(None).await;
    app.advance(2100.0);
    let before: Vec<f64> = (0..3).map(|t| app.geometry(t).unwrap().radius).collect();

    app.set_absolute_range(true);
    assert!(app.options().absolute_range);
    app.advance(1100.0);
    for t in 0..3 {
        let g = app.geometry(t).unwrap();
        assert_eq!(g.r, g.radius);
    }
    assert!(app.geometry(2).unwrap().radius != before[2]);

    app.set_absolute_range(false);
    app.advance(1100.0);
    for (t, &radius) in before.iter().enumerate() {
        let g = app.geometry(t).unwrap();
        assert_eq!(g.radius, radius);
        assert_eq!(g.r, radius);
    }
}

#[tokio::test]
async fn test_close_right_after_expand_ends_collapsed() {
    let mut app = scene(None).await;
    app.advance(2100.0);
    app.click_node(0).unwrap();
    app.advance(600.0);
    assert!(app.state(0).unwrap().cloud_visible);
    assert!(app.state(0).unwrap().label_hidden);

    app.toggle_full_view(0).unwrap();
    app.advance(50.0);
    assert_eq!(
        app.transitions().kind_on(0, Channel::Panel),
        Some(TransitionKind::Expand)
    );
    app.close_node(0).unwrap();
    app.advance(700.0);

    let g = app.geometry(0).unwrap();
    let s = app.state(0).unwrap();
    assert!(!s.clicked);
    assert!(!s.expanded);
    assert!(!s.cloud_visible);
    assert!(!s.doc_list_visible);
    assert!(!s.label_hidden);
    assert_eq!(g.panel, None);
    assert_eq!(g.r, g.radius);
    assert_eq!(g.border_ratio, 1.0);
    assert!(app.transitions().is_empty());

    let events = app.take_events();
    assert!(events.contains(&ViewEvent::Collapsed(0)));
    assert!(events.contains(&ViewEvent::Closed(0)));
}

#[tokio::test]
async fn test_full_view_requires_open_node() {
    let mut app = scene(None).await;
    app.advance(2100.0);
    assert!(matches!(app.toggle_full_view(1), Err(ViewError::NotOpen(1))));
    assert!(matches!(app.click_node(7), Err(ViewError::UnknownTopic(7))));
}

#[tokio::test]
async fn test_search_hides_and_keeps_open_nodes() {
    let mut app = scene(None).await;
    app.advance(2100.0);
    app.click_node(1).unwrap();
    app.advance(600.0);
    let opened = app.settings().view.opened_radius();
    let t2_radius = app.geometry(2).unwrap().radius;

    app.search("Science+ART");
    assert_eq!(app.options().search, "science+art");
    app.advance(1100.0);

    let results = app.search_results();
    assert_eq!(results.matches(0).map(|m| m.len()), Some(2));
    assert_eq!(results.match_count(), 1);
    assert!(!app.state(0).unwrap().search_hidden);
    assert!((app.geometry(0).unwrap().r - 80.0).abs() < EPS);

    // The opened topic fails the query but keeps its size.
    let s1 = app.state(1).unwrap();
    assert!(s1.clicked);
    assert!(s1.search_hidden);
    assert!(s1.cloud_visible);
    assert_eq!(app.geometry(1).unwrap().r, opened);
    assert!((app.geometry(1).unwrap().border_ratio - 0.1).abs() < EPS);

    assert_eq!(app.geometry(2).unwrap().r, 0.0);
    assert!(app.state(2).unwrap().search_hidden);

    let svg = render_svg(&app).unwrap();
    assert_eq!(svg.matches("class=\"arc\"").count(), 2);

    assert!(app.take_events().contains(&ViewEvent::SearchApplied {
        query: "science+art".to_string(),
        matches: 1,
    }));

    app.clear_search();
    app.advance(1100.0);
    assert_eq!(app.geometry(2).unwrap().r, t2_radius);
    assert!(!app.state(2).unwrap().search_hidden);
    assert_eq!(app.geometry(1).unwrap().r, opened);
    assert_eq!(app.options().search, "");
}

#[tokio::test]
async fn test_search_during_launch_entry_keeps_opened_size() {
    let mut app = scene_with(
        None,
        Vec::new(),
        LaunchParams::from_url("http://host/index.html?topicNum=2").unwrap(),
    )
    .await;
    let opened = app.settings().view.opened_radius();

    // The query arrives before the entry animation has ended.
    app.search("finance");
    app.advance(3000.0);

    let s = app.state(1).unwrap();
    assert!(s.clicked);
    assert!(s.cloud_visible);
    assert!(!s.search_hidden);
    assert_eq!(app.geometry(1).unwrap().r, opened);
    assert!((app.geometry(1).unwrap().border_ratio - 0.1).abs() < EPS);
    assert!(app.take_events().contains(&ViewEvent::Opened(1)));

    assert_eq!(app.geometry(0).unwrap().r, 0.0);
    assert_eq!(app.geometry(2).unwrap().r, 0.0);
}

#[tokio::test]
async fn test_search_during_open_keeps_opened_size() {
    let mut app = scene(None).await;
    app.advance(2100.0);
    app.click_node(0).unwrap();
    app.advance(200.0);
    assert_eq!(
        app.transitions().kind_on(0, Channel::Geometry),
        Some(TransitionKind::Open)
    );

    app.search("music");
    app.advance(1100.0);

    let s = app.state(0).unwrap();
    assert!(s.clicked);
    assert!(s.cloud_visible);
    assert!(s.search_hidden);
    assert_eq!(app.geometry(0).unwrap().r, app.settings().view.opened_radius());
    assert!(!app.state(2).unwrap().search_hidden);
}

#[tokio::test]
async fn test_absolute_range_during_launch_keeps_opened_size() {
    let mut app = scene_with(
        None,
        Vec::new(),
        LaunchParams::from_url("http://host/index.html?topicNum=2").unwrap(),
    )
    .await;
    let opened = app.settings().view.opened_radius();

    app.advance(500.0);
    app.set_absolute_range(true);
    app.advance(3000.0);

    let s = app.state(1).unwrap();
    assert!(s.clicked);
    assert!(s.cloud_visible);
    assert_eq!(app.geometry(1).unwrap().r, opened);
    let g0 = app.geometry(0).unwrap();
    assert!((g0.r - g0.radius).abs() < EPS);
}

#[tokio::test]
async fn test_absolute_range_during_expand_keeps_panel() {
    let mut app = scene_with(
        None,
        Vec::new(),
        LaunchParams::from_url("http://host/index.html?topicNum=1&expand=1").unwrap(),
    )
    .await;
    assert!(run_until(&mut app, |a| {
        a.transitions().kind_on(0, Channel::Panel) == Some(TransitionKind::Expand)
    })
    .await);

    app.set_absolute_range(true);
    app.search("art");
    app.advance(1100.0);

    let s = app.state(0).unwrap();
    assert!(s.clicked);
    assert!(s.expanded);
    assert!(s.doc_list_visible);
    let g = app.geometry(0).unwrap();
    assert_eq!(g.r, app.settings().view.opened_radius());
    assert_eq!(g.panel, Some(app.settings().view.expanded_size()));
}

#[tokio::test]
async fn test_toggle_word_updates_query() {
    let mut app = scene(None).await;
    app.advance(2100.0);
    app.click_node(0).unwrap();
    app.advance(600.0);

    let index = app
        .cloud(0)
        .unwrap()
        .words
        .iter()
        .position(|w| w.text == "science")
        .unwrap();
    app.toggle_word(0, index).unwrap();
    assert_eq!(app.options().search, "science");
    assert!(app.state(0).unwrap().search_words.contains(&index));
    assert!(app.search_results().is_visible(1));
    assert!(!app.search_results().is_visible(2));

    app.toggle_word(0, index).unwrap();
    assert_eq!(app.options().search, "");
    assert!(app.state(0).unwrap().search_words.is_empty());

    assert!(matches!(
        app.toggle_word(0, 99),
        Err(ViewError::UnknownWord { topic: 0, index: 99 })
    ));
}

#[tokio::test]
async fn test_launch_topic_opens_and_expands() {
    let mut app = scene_with(
        None,
        Vec::new(),
        LaunchParams::from_url("http://host/index.html?topicNum=2&expand=1").unwrap(),
    )
    .await;
    assert_eq!(app.options().topic, 2);

    app.advance(2600.0);
    assert!(app.state(1).unwrap().clicked);
    assert!(!app.state(1).unwrap().expanded);

    app.advance(1500.0);
    let s = app.state(1).unwrap();
    assert!(s.expanded);
    assert!(s.doc_list_visible);
    assert_eq!(
        app.geometry(1).unwrap().panel,
        Some(app.settings().view.expanded_size())
    );
    let events = app.take_events();
    assert!(events.contains(&ViewEvent::Opened(1)));
    assert!(events.contains(&ViewEvent::Expanded(1)));
    assert!(!app.state(0).unwrap().clicked);
}

#[tokio::test]
async fn test_documents_and_sources_arrive() {
    let mut app = opened_scene(None).await;
    assert!(app.take_events().contains(&ViewEvent::DocumentsReady(0)));

    let panel = app.panel(0).unwrap();
    let docs: Vec<usize> = panel.documents.docs.iter().map(|d| d.doc).collect();
    assert_eq!(docs, vec![0, 1]);
    assert_eq!(panel.sources.len(), 2);
    assert_eq!(panel.sources[0].name, "Journal X");
    assert_eq!(panel.chart.len(), 2);
}

#[tokio::test]
async fn test_document_hover_flags_cloud_words() {
    let dir = TempDir::new().unwrap();
    write_cache(dir.path());
    let mut app = opened_scene(Some(dir.path())).await;

    app.hover_document(0, 0, true).unwrap();
    assert_eq!(app.state(0).unwrap().hovered_doc, Some(0));
    assert!(run_until(&mut app, |a| !a.state(0).unwrap().hover_words.is_empty()).await);

    let cloud = app.cloud(0).unwrap();
    let flagged: Vec<&str> = app
        .state(0)
        .unwrap()
        .hover_words
        .iter()
        .map(|&i| cloud.words[i].text.as_str())
        .collect();
    assert_eq!(flagged.len(), 2);
    assert!(flagged.contains(&"science"));
    assert!(flagged.contains(&"policy"));

    app.hover_document(0, 0, false).unwrap();
    assert!(app.state(0).unwrap().hover_words.is_empty());
    assert_eq!(app.state(0).unwrap().hovered_doc, None);

    // A known document highlights without another fetch.
    app.hover_document(0, 0, true).unwrap();
    assert_eq!(app.state(0).unwrap().hover_words.len(), 2);

    // Leaving a document with no match data clears every flagged word.
    app.hover_document(0, 1, false).unwrap();
    assert!(app.state(0).unwrap().hover_words.is_empty());
}

#[tokio::test]
async fn test_missing_cached_document_raises_alert() {
    let dir = TempDir::new().unwrap();
    let mut app = opened_scene(Some(dir.path())).await;
    app.take_events();

    app.hover_document(0, 1, true).unwrap();
    let alert = ViewEvent::Alert(FETCH_FAILED_ALERT.to_string());
    assert!(run_until(&mut app, |a| a.pending_events().contains(&alert)).await);
    assert!(app.state(0).unwrap().hover_words.is_empty());
}

#[tokio::test]
async fn test_document_viewer() {
    let dir = TempDir::new().unwrap();
    write_cache(dir.path());
    let mut app = opened_scene(Some(dir.path())).await;

    assert!(matches!(
        app.open_document(0, 0),
        Err(ViewError::NotExpanded(0))
    ));
    app.toggle_full_view(0).unwrap();
    app.advance(300.0);
    assert!(app.state(0).unwrap().expanded);

    app.open_document(0, 0).unwrap();
    assert!(app.viewer(0).unwrap().is_placeholder());
    assert!(run_until(&mut app, |a| !a
        .viewer(0)
        .map(|v| v.is_placeholder())
        .unwrap_or(true))
    .await);

    let view = app.viewer(0).unwrap();
    assert_eq!(view.doi, "doc-a");
    assert_eq!(view.link, Some(format!("{}/doc-a", dir.path().display())));
    assert_eq!(app.state(0).unwrap().viewer_words.len(), 2);
    app.advance(300.0);
    let view_settings = &app.settings().view;
    let expected = view_settings.min_word_cloud_size * view_settings.expanded_height_scale * 0.8;
    assert!((app.geometry(0).unwrap().viewer_height - expected).abs() < EPS);

    app.close_document_viewer(0).unwrap();
    app.advance(200.0);
    assert!(app.viewer(0).is_none());
    assert!(!app.state(0).unwrap().viewer_open);
    assert_eq!(app.state(0).unwrap().last_clicked_doc, None);

    assert!(matches!(
        app.open_document(0, 9),
        Err(ViewError::UnknownDocument { topic: 0, rank: 9 })
    ));
}

#[tokio::test]
async fn test_disabled_cache_is_inert() {
    let mut app = opened_scene(None).await;
    assert!(!app.cache().is_enabled());

    app.hover_document(0, 0, true).unwrap();
    app.advance(200.0);
    assert_eq!(app.state(0).unwrap().hovered_doc, Some(0));
    assert!(app.state(0).unwrap().hover_words.is_empty());
    assert!(!app
        .take_events()
        .iter()
        .any(|e| matches!(e, ViewEvent::Alert(_))));

    // Document links are inert without a cache.
    app.toggle_full_view(0).unwrap();
    app.advance(300.0);
    assert!(matches!(app.open_document(0, 1), Err(ViewError::CacheDisabled)));
    app.advance(300.0);
    assert!(app.viewer(0).is_none());
    let state = app.state(0).unwrap();
    assert!(!state.viewer_open);
    assert_eq!(state.last_clicked_doc, None);
    assert!(!render_svg(&app).unwrap().contains(NO_DOCUMENT_INFO));
}

#[tokio::test]
async fn test_documents_pending_before_ranking() {
    let mut app = scene(None).await;
    app.advance(2100.0);
    assert!(matches!(
        app.hover_document(0, 0, true),
        Err(ViewError::DocumentsPending(0))
    ));
}

#[tokio::test]
async fn test_source_highlights() {
    let mut app = opened_scene(None).await;

    app.hover_source(0, 0, true).unwrap();
    let highlights = app.state(0).unwrap().doc_highlights.clone();
    assert_eq!(highlights.len(), 1);
    assert!((highlights[&0] - 1.0).abs() < EPS);

    app.hover_source(0, 0, false).unwrap();
    assert!(app.state(0).unwrap().doc_highlights.is_empty());

    app.toggle_source(0, 1).unwrap();
    app.hover_source(0, 1, true).unwrap();
    app.hover_source(0, 1, false).unwrap();
    assert!(app.state(0).unwrap().doc_highlights.contains_key(&1));

    app.toggle_source(0, 1).unwrap();
    assert!(app.state(0).unwrap().doc_highlights.is_empty());

    assert!(matches!(
        app.hover_source(0, 5, true),
        Err(ViewError::UnknownSource { topic: 0, index: 5 })
    ));
}

#[tokio::test]
async fn test_scaled_layout() {
    let mut app = scene(None).await;
    app.advance(2100.0);

    app.set_scaled(true).unwrap();
    assert!(!app.simulation().collide_enabled());
    app.advance(1100.0);
    let (x, y) = app.position(0).unwrap();
    assert!((x - 768.0).abs() < EPS);
    assert!((y - 240.0).abs() < EPS);

    // Dragging is ignored in scaled mode.
    app.drag_start(0).unwrap();
    assert!(!app.is_dragging());

    app.zoom_to(ZoomTransform::new(20.0, 0.0, 0.0));
    let zoomed = app.position(0).unwrap();
    assert!(zoomed.0 > x);

    app.set_scaled(false).unwrap();
    assert!(app.simulation().collide_enabled());
    assert_eq!(app.position(0), app.simulation().position(0));
}

#[tokio::test]
async fn test_scaled_requires_coordinates() {
    let mut app = scene_with(None, vec![(0.0, 0.0)], LaunchParams::default()).await;
    assert!(matches!(
        app.set_scaled(true),
        Err(ViewError::ScaledUnavailable(_))
    ));
    assert!(!app.options().scaled);
}

#[tokio::test]
async fn test_focus_topic_centers_view() {
    let mut app = scene(None).await;
    app.advance(2100.0);

    app.focus_topic(2).unwrap();
    assert_eq!(app.options().topic, 2);
    let center = app.settings().viewport.center();
    let on_screen = app.zoom().apply(app.position(1).unwrap());
    assert!((on_screen.0 - center.0).abs() < EPS);
    assert!((on_screen.1 - center.1).abs() < EPS);
    assert_eq!(app.geometry(1).unwrap().focus_stroke, 6.0);
    assert_eq!(app.draw_order().last(), Some(&1));

    app.advance(2100.0);
    assert_eq!(app.geometry(1).unwrap().focus_stroke, 0.0);

    assert!(app.focus_topic(0).is_err());
    assert!(matches!(app.focus_topic(4), Err(ViewError::UnknownTopic(3))));
}

#[tokio::test]
async fn test_drag_pins_node() {
    let mut app = scene(None).await;
    app.advance(2100.0);

    app.drag_start(0).unwrap();
    assert!(app.is_dragging());
    assert_eq!(
        app.simulation().alpha_target(),
        app.settings().simulation.drag_alpha_target
    );
    app.drag_to(0, 100.0, 120.0).unwrap();
    app.advance(50.0);
    assert_eq!(app.position(0), Some((100.0, 120.0)));

    app.drag_end(0).unwrap();
    assert!(!app.is_dragging());
    assert_eq!(app.simulation().node(0).unwrap().fx, None);
    app.advance(600.0);
    assert_eq!(app.simulation().alpha_target(), 0.0);
}

#[tokio::test]
async fn test_render_frames() {
    let mut app = scene(None).await;
    app.advance(2100.0);
    let svg = render_svg(&app).unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("id=\"node-0\""));
    assert!(svg.contains("Topic 1"));
    assert!(!svg.contains("class=\"cloud\""));

    app.click_node(0).unwrap();
    app.advance(600.0);
    let svg = render_svg(&app).unwrap();
    assert!(svg.contains("class=\"cloud\""));
    assert!(svg.contains("science"));
}
