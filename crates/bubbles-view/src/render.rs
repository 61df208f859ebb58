//! SVG frames of the current scene.

use std::fmt::Write;

use bubbles_layout::color::{reds, search_term_color};
use bubbles_layout::Rgb;
use bubbles_model::DisplayField;
use bubbles_types::{TopicId, ViewportSettings};

use crate::controller::{BubbleApp, DocumentView, TopicPanel, NO_DOCUMENT_INFO};
use crate::error::ViewError;
use crate::node::{NodeGeometry, NodeState};
use crate::tween::{polar, share_angle};

const PROGRESS_START: Rgb = Rgb::new(254, 234, 225);
const PROGRESS_END: Rgb = Rgb::new(217, 39, 35);
const DOC_LINE_HEIGHT: f64 = 16.0;
const FIELD_VALUE_CHARS: usize = 120;
const LEGEND_STEPS: usize = 5;

const STYLE: &str = "\
.label{font:12px sans-serif;text-anchor:middle;pointer-events:none}\
.title{font:bold 14px sans-serif;text-anchor:middle}\
.word{font-family:sans-serif;text-anchor:middle;fill:#333}\
.word.flagged{fill:#08306b;font-weight:bold}\
.doc{font:12px sans-serif}\
.doc.clicked{font-weight:bold}\
.control{font:bold 14px sans-serif;cursor:pointer}\
.field{font:11px monospace}";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max).collect();
        cut.push_str("...");
        cut
    }
}

/// SVG path of a pie slice from `start` to `end` radians.
fn arc_path(r: f64, start: f64, end: f64) -> String {
    let sweep = end - start;
    if sweep >= std::f64::consts::TAU - 1e-9 {
        // A full circle cannot be drawn as one arc command.
        let (x0, y0) = polar(r, start);
        let (x1, y1) = polar(r, start + std::f64::consts::PI);
        return format!(
            "M{x0:.2},{y0:.2}A{r:.2},{r:.2},0,1,1,{x1:.2},{y1:.2}A{r:.2},{r:.2},0,1,1,{x0:.2},{y0:.2}Z"
        );
    }
    let (x0, y0) = polar(r, start);
    let (x1, y1) = polar(r, end);
    let large = if sweep > std::f64::consts::PI { 1 } else { 0 };
    format!("M0,0L{x0:.2},{y0:.2}A{r:.2},{r:.2},0,{large},1,{x1:.2},{y1:.2}Z")
}

/// Render the scene as a standalone SVG document.
pub fn render_svg(app: &BubbleApp) -> Result<String, ViewError> {
    let viewport = &app.settings().viewport;
    let mut out = String::new();
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = viewport.width,
        h = viewport.height
    )?;
    writeln!(out, "<style>{STYLE}</style>")?;
    writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        out,
        r#"<g class="scene" transform="{}">"#,
        app.zoom().to_svg()
    )?;
    for &topic in app.draw_order() {
        write_node(&mut out, app, topic)?;
    }
    writeln!(out, "</g>")?;
    write_legend(&mut out, app)?;
    writeln!(out, "</svg>")?;
    Ok(out)
}

fn write_node(out: &mut String, app: &BubbleApp, topic: TopicId) -> Result<(), ViewError> {
    let (Some(g), Some(state), Some((x, y))) = (
        app.geometry(topic),
        app.state(topic),
        app.position(topic),
    ) else {
        return Ok(());
    };
    let alpha = app.model().topic(topic)?.alpha;
    let (w, h) = g.size();
    let corner = g.corner_radius();
    let fill = reds(app.scales().color_value(alpha));
    let (stroke, stroke_width) = if g.focus_stroke > 0.0 {
        ("black", g.focus_stroke)
    } else if state.hovered {
        ("black", 3.0)
    } else {
        ("none", 0.0)
    };

    writeln!(
        out,
        r#"<g class="node" id="node-{topic}" transform="translate({x:.2},{y:.2})">"#
    )?;
    writeln!(
        out,
        r#"<rect class="bubble" x="{:.2}" y="{:.2}" width="{w:.2}" height="{h:.2}" rx="{corner:.2}" ry="{corner:.2}" fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width:.2}"/>"#,
        -g.r, -g.r
    )?;

    if !state.arcs_hidden && !state.clicked {
        if let Some(matches) = app.search_results().matches(topic) {
            let outer = app.scales().radius(alpha);
            let mut start = 0.0;
            for (i, m) in matches.iter().enumerate() {
                let end = start + share_angle(m.share);
                writeln!(
                    out,
                    r#"<path class="arc" d="{}" fill="{}"><title>{}</title></path>"#,
                    arc_path(outer, start, end),
                    search_term_color(i, matches.len()),
                    escape(&m.word)
                )?;
                start = end;
            }
        }
    }

    let name = escape(&app.model().topic(topic)?.name);
    if !state.label_hidden && !state.search_hidden && g.r > 0.0 {
        writeln!(out, r#"<text class="label" dy="0.35em">{name}</text>"#)?;
    }

    if state.cloud_visible {
        write_cloud(out, app, topic, g, state, &name)?;
    }
    if state.doc_list_visible {
        if let Some(panel) = app.panel(topic) {
            write_documents(out, app, topic, state, panel)?;
            write_sources(out, app, panel)?;
        }
    }
    if g.viewer_height > 0.0 {
        write_viewer(out, app, g, app.viewer(topic))?;
    }
    writeln!(out, "</g>")?;
    Ok(())
}

fn write_cloud(
    out: &mut String,
    app: &BubbleApp,
    topic: TopicId,
    g: &NodeGeometry,
    state: &NodeState,
    name: &str,
) -> Result<(), ViewError> {
    let r = g.r;
    writeln!(out, r#"<g class="cloud">"#)?;
    if !state.search_hidden {
        writeln!(
            out,
            r#"<text class="title" y="{:.2}">{name}</text>"#,
            -r + 20.0
        )?;
    }
    writeln!(
        out,
        r#"<text class="control close" x="{:.2}" y="{:.2}">x</text>"#,
        r - 20.0,
        -r + 20.0
    )?;
    writeln!(
        out,
        r#"<text class="control expand" x="{:.2}" y="{:.2}">{}</text>"#,
        r - 40.0,
        -r + 20.0,
        if state.expanded { "-" } else { "+" }
    )?;

    if let Some(cloud) = app.cloud(topic) {
        let topic_weight = app.model().topic(topic)?.weight;
        for (i, word) in cloud.words.iter().enumerate() {
            let wx = word.x;
            let wy = 20.0 + word.y;
            if state.viewer_words.contains(&i) {
                writeln!(
                    out,
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="rgba(255, 100, 100, 0.7)"/>"#,
                    wx - word.width / 2.0,
                    wy - word.height / 2.0,
                    word.width,
                    word.height
                )?;
            }
            if state.hover_words.contains(&i) {
                writeln!(
                    out,
                    r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="black" stroke-dasharray="2,2"/>"#,
                    wx - word.width / 2.0,
                    wy - word.height / 2.0,
                    word.width,
                    word.height
                )?;
            }
            let class = if state.search_words.contains(&i) {
                "word flagged"
            } else {
                "word"
            };
            let weight = app
                .model()
                .topic(topic)?
                .words
                .get(word.word_index)
                .map(|w| w.weight)
                .unwrap_or(0.0);
            let percent = if topic_weight > 0.0 {
                weight / topic_weight * 100.0
            } else {
                0.0
            };
            writeln!(
                out,
                r#"<text class="{class}" x="{wx:.2}" y="{wy:.2}" dy="0.35em" font-size="{}"><title>{} ({:.2}%)</title>{}</text>"#,
                word.size,
                weight,
                percent,
                escape(&word.text)
            )?;
        }
    }
    writeln!(out, "</g>")?;
    Ok(())
}

fn write_documents(
    out: &mut String,
    app: &BubbleApp,
    topic: TopicId,
    state: &NodeState,
    panel: &TopicPanel,
) -> Result<(), ViewError> {
    let size = app.settings().view.min_word_cloud_size;
    let left = size * 0.5 + 10.0;
    let top = -size * 0.5 + 40.0;
    writeln!(
        out,
        r#"<g class="doc-list" transform="translate({left:.2},{top:.2})">"#
    )?;
    writeln!(
        out,
        r#"<text class="title" x="0" y="-15" text-anchor="start">Top {} documents</text>"#,
        panel.documents.len()
    )?;
    for rank in 0..panel.documents.len() {
        let Some(doc) = app.model().citation(topic, rank) else {
            continue;
        };
        let y = rank as f64 * DOC_LINE_HEIGHT;
        if let Some(opacity) = state.doc_highlights.get(&rank) {
            writeln!(
                out,
                r#"<rect x="-2" y="{:.2}" width="{:.2}" height="{DOC_LINE_HEIGHT}" fill="rgba(0, 200, 255, {opacity:.3})"/>"#,
                y - 12.0,
                size * (app.settings().view.expanded_width_scale - 1.0) - 22.0
            )?;
        }
        let class = if state.last_clicked_doc == Some(rank) {
            "doc clicked"
        } else {
            "doc"
        };
        writeln!(
            out,
            r#"<text class="{class}" id="{topic}-{rank}" y="{y:.2}">"{}", {}</text>"#,
            escape(&doc.title),
            escape(&doc.journal)
        )?;
    }
    writeln!(out, "</g>")?;
    Ok(())
}

fn write_sources(out: &mut String, app: &BubbleApp, panel: &TopicPanel) -> Result<(), ViewError> {
    let size = app.settings().view.min_word_cloud_size;
    let chart = &panel.chart;
    let left = -size * 0.5 + (size - chart.width) / 2.0;
    let top = size * 0.5 + 25.0;
    writeln!(
        out,
        r#"<g class="sources" transform="translate({left:.2},{top:.2})">"#
    )?;
    writeln!(
        out,
        r##"<line x1="0" y1="{h:.2}" x2="{w:.2}" y2="{h:.2}" stroke="#999"/>"##,
        h = chart.height,
        w = chart.width
    )?;
    for point in &chart.points {
        writeln!(
            out,
            r##"<line x1="{x:.2}" y1="{h:.2}" x2="{x:.2}" y2="{y:.2}" stroke="#999"/><circle cx="{x:.2}" cy="{y:.2}" r="4" fill="#cb181d"><title>{} ({:.0})</title></circle>"##,
            escape(&point.name),
            point.weight,
            x = point.x,
            y = point.y,
            h = chart.height
        )?;
    }
    writeln!(out, "</g>")?;
    Ok(())
}

fn write_viewer(
    out: &mut String,
    app: &BubbleApp,
    g: &NodeGeometry,
    view: Option<&DocumentView>,
) -> Result<(), ViewError> {
    let settings = &app.settings().view;
    let size = settings.min_word_cloud_size;
    let left = size * 0.5 + 10.0;
    let bottom = size * (settings.expanded_height_scale - 0.5) - 2.0;
    let width = size * (settings.expanded_width_scale - 1.0) - 22.0;
    let top = bottom - g.viewer_height;
    writeln!(out, r#"<g class="doc-viewer">"#)?;
    writeln!(
        out,
        r##"<rect x="{left:.2}" y="{top:.2}" width="{width:.2}" height="{:.2}" fill="#f7f7f7" stroke="#999"/>"##,
        g.viewer_height
    )?;

    let mut lines: Vec<String> = Vec::new();
    match view {
        Some(view) if !view.is_placeholder() => {
            for field in &view.fields {
                lines.push(match field {
                    DisplayField::Text { name, value } => {
                        format!("{}: {}", name, truncate(value, FIELD_VALUE_CHARS))
                    }
                    DisplayField::Features(rows) => format!("features: {} distinct tokens", rows.len()),
                    DisplayField::BagOfWords(terms) => format!("bag_of_words: {} terms", terms.len()),
                });
            }
        }
        _ => lines.push(NO_DOCUMENT_INFO.to_string()),
    }
    if let Some(link) = view.and_then(|v| v.link.as_deref()) {
        lines.push(format!("View JSON in New Window: {link}"));
    }

    for (i, line) in lines.iter().enumerate() {
        let y = top + 20.0 + i as f64 * DOC_LINE_HEIGHT;
        if y > bottom {
            break;
        }
        writeln!(
            out,
            r#"<text class="field" x="{:.2}" y="{y:.2}">{}</text>"#,
            left + 8.0,
            escape(line)
        )?;
    }
    writeln!(out, "</g>")?;
    Ok(())
}

fn write_legend(out: &mut String, app: &BubbleApp) -> Result<(), ViewError> {
    let (lo, hi) = app.scales().domain();
    writeln!(out, r#"<g class="legend" transform="translate(20,20)">"#)?;
    writeln!(out, r#"<text class="doc" y="-5">Topic alpha</text>"#)?;
    for i in 0..LEGEND_STEPS {
        let alpha = lo + (hi - lo) * i as f64 / (LEGEND_STEPS - 1) as f64;
        writeln!(
            out,
            r#"<rect x="{}" y="0" width="30" height="12" fill="{}"/><text class="doc" x="{}" y="26">{alpha:.2}</text>"#,
            i * 32,
            reds(app.scales().color_value(alpha)),
            i * 32
        )?;
    }

    let terms = app.search_results().query().terms();
    for (i, term) in terms.iter().enumerate() {
        writeln!(
            out,
            r#"<rect x="0" y="{}" width="12" height="12" fill="{}"/><text class="doc" x="18" y="{}">{}</text>"#,
            40 + i * 16,
            search_term_color(i, terms.len()),
            50 + i * 16,
            escape(term)
        )?;
    }
    writeln!(out, "</g>")?;
    Ok(())
}

/// Loading bar shown while the dataset loads.
pub fn render_progress(fraction: f64, viewport: &ViewportSettings) -> String {
    let width = (viewport.width * 0.3).max(200.0);
    let height = 20.0;
    let (cx, cy) = viewport.center();
    let x = cx - width / 2.0;
    let y = cy - height / 2.0;
    let filled = width * fraction.clamp(0.0, 1.0);
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{vw}" height="{vh}">"#,
            r#"<defs><linearGradient id="progress-gradient">"#,
            r#"<stop offset="0%" stop-color="{start}"/><stop offset="100%" stop-color="{end}"/>"#,
            r#"</linearGradient></defs>"#,
            r##"<rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height}" rx="10" fill="none" stroke="#ccc"/>"##,
            r#"<rect class="progress" x="{x:.2}" y="{y:.2}" width="{filled:.2}" height="{height}" rx="10" fill="url(#progress-gradient)"/>"#,
            r#"<text x="{cx:.2}" y="{ty:.2}" text-anchor="middle" font-family="sans-serif">Loading data...</text>"#,
            "</svg>\n"
        ),
        vw = viewport.width,
        vh = viewport.height,
        start = PROGRESS_START,
        end = PROGRESS_END,
        x = x,
        y = y,
        width = width,
        height = height,
        filled = filled,
        cx = cx,
        ty = y - 10.0
    )
}
