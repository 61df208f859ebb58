//! End-to-end load and model tests.
//!
//! Dataset files on disk -> load pipeline -> worker rankings -> model state.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use bubbles_loader::{EmbeddedData, LoadStage};
use bubbles_model::{search, SearchQuery, TopicModel};
use e2e_tests::{DatasetFixture, TestHarness};

#[tokio::test]
async fn test_full_load_from_directory() {
    let harness = TestHarness::new();
    let pipeline = harness.pipeline();
    let progress = pipeline.progress();
    let worker = bubbles_worker::WorkerHandle::spawn();

    let dataset = pipeline.run(&worker).await.unwrap();

    assert_eq!(dataset.topics.len(), 3);
    assert_eq!(dataset.documents.len(), 4);
    assert_eq!(dataset.topic_scaled.len(), 3);
    assert_eq!(dataset.matrix.n_topics, 3);
    assert_eq!(dataset.matrix.n_docs, 4);
    assert_eq!(dataset.topics[1].name, "Topic 2");
    assert_eq!(dataset.documents[3].journal, "Journal X");
    assert_eq!(
        dataset.json_cache_path(),
        Some(format!("{}/", harness.cache_dir.display()).as_str())
    );

    let last = *progress.borrow();
    assert_eq!(last.stage, LoadStage::Metadata);
    assert!(last.is_complete());
}

#[tokio::test]
async fn test_missing_config_disables_cache() {
    let harness = TestHarness::with_fixture(DatasetFixture {
        with_cache: false,
        ..DatasetFixture::default()
    });
    let (dataset, _worker) = harness.load().await;
    assert_eq!(dataset.json_cache_path(), None);
    assert_eq!(dataset.topics.len(), 3);
}

#[tokio::test]
async fn test_missing_required_file_yields_no_dataset() {
    let harness = TestHarness::new();
    std::fs::remove_file(harness.data_dir.join("meta.csv.zip")).unwrap();

    let pipeline = harness.pipeline();
    let progress = pipeline.progress();
    let worker = bubbles_worker::WorkerHandle::spawn();
    let result = pipeline.run(&worker).await;

    assert!(result.is_err());
    // The stages before the metadata completed; nothing was handed out.
    assert_eq!(progress.borrow().stage, LoadStage::DocTopics);
}

#[tokio::test]
async fn test_embedded_payload_replaces_file() {
    let harness = TestHarness::new();
    std::fs::remove_file(harness.data_dir.join("tw.json")).unwrap();

    let tw = serde_json::json!({
        "alpha": [0.4, 0.4, 0.2],
        "tw": [
            {"words": ["embedded"], "weights": [1]},
            {"words": ["payload"], "weights": [1]},
            {"words": ["page"], "weights": [1]}
        ]
    });
    let html = format!(
        r#"<html><body><script type="application/json" id="m__DATA__tw">{}</script></body></html>"#,
        serde_json::Value::String(tw.to_string())
    );
    let page = harness.data_dir.join("index.html");
    std::fs::write(&page, html).unwrap();

    let settings = harness.settings();
    let worker = bubbles_worker::WorkerHandle::spawn();
    let dataset =
        bubbles_cli::load_dataset(&settings, &worker, Some(page.to_string_lossy().as_ref()))
            .await
            .unwrap();
    assert_eq!(dataset.topics[0].words[0].word, "embedded");
    assert_eq!(dataset.topics.len(), 3);

    assert_eq!(EmbeddedData::from_html(&std::fs::read_to_string(&page).unwrap()).len(), 1);
}

#[tokio::test]
async fn test_ranking_order_and_aggregation_consistency() {
    let harness = TestHarness::new();
    let (dataset, worker) = harness.load().await;
    let model = TopicModel::new(dataset.topics, dataset.documents);

    for topic in 0..model.len() {
        let ranking = model.topic_documents(&worker, topic, 20).await.unwrap();
        let sum: f64 = ranking.docs.iter().map(|d| d.weight).sum();
        assert!((sum - ranking.weight).abs() < 1e-9, "topic {}", topic);
    }

    let ranking = model.topic_documents(&worker, 0, 20).await.unwrap();
    let order: Vec<usize> = ranking.docs.iter().map(|d| d.doc).collect();
    assert_eq!(order, vec![0, 3, 1]);
    assert!((ranking.docs[0].frac - 0.8).abs() < 1e-9);

    let sources = model.topic_sources(&worker, 0, 20).await.unwrap();
    let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Journal X", "Journal Y"]);
    assert!((sources[0].weight - 10.0).abs() < 1e-9);
    let ratios: Vec<f64> = sources[0].docs.iter().map(|d| d.ratio).collect();
    assert!((ratios[0] - 0.4).abs() < 1e-9);
    assert!((ratios[1] - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn test_rankings_are_memoized() {
    let harness = TestHarness::new();
    let (dataset, worker) = harness.load().await;
    let model = Arc::new(TopicModel::new(dataset.topics, dataset.documents));

    // Concurrent first requests share one ranking.
    let (a, b) = futures::join!(
        model.topic_documents(&worker, 2, 20),
        model.topic_documents(&worker, 2, 20)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b));

    let again = model.topic_documents(&worker, 2, 5).await.unwrap();
    assert!(Arc::ptr_eq(&a, &again));
    assert!(Arc::ptr_eq(&a, &model.cached_documents(2).unwrap()));
}

#[tokio::test]
async fn test_conjunctive_search() {
    let harness = TestHarness::new();
    let (dataset, _worker) = harness.load().await;

    let results = search(&dataset.topics, &SearchQuery::parse("science+art"));
    assert_eq!(results.match_count(), 1);
    assert!(results.matches(0).is_some());

    let results = search(&dataset.topics, &SearchQuery::parse("science+finance"));
    assert!(results.matches(0).is_none());
    assert!(results.matches(1).is_some());

    let results = search(&dataset.topics, &SearchQuery::parse("science"));
    let shares: Vec<f64> = results.matches(0).unwrap().iter().map(|m| m.share).collect();
    assert_eq!(shares, vec![0.5]);
}
