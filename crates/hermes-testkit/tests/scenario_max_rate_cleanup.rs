//! Scenario: cleaning the consumers max-rate runtime tree.
//!
//! # Invariant under test
//! Only max-rate nodes of non-active subscriptions and consumer entries of
//! unregistered consumers are removed. Nothing is removed unless saving,
//! and every delete while saving is followed by the configured pause.

use std::time::Duration;

use hermes_testkit::MemoryTree;
use hermes_tree::maxrate::{missing_max_rate, MaxRateCleaner};
use hermes_tree::{ensure_prefix, DeletePacing, TreeLayout};

const PREFIX: &str = "/run/hermes";

fn seeded() -> (MemoryTree, TreeLayout) {
    let layout = TreeLayout::new(PREFIX);
    let t = MemoryTree::new();
    t.put(&layout.subscription("g", "t", "active1"), r#"{"state":"ACTIVE"}"#);
    t.put(&layout.subscription("g", "t", "suspended"), r#"{"state":"SUSPENDED"}"#);
    t.put(&layout.subscription("g", "t", "broken"), "not json");
    t.put(&layout.subscription("g", "u", "fresh"), r#"{"state":"ACTIVE"}"#);

    t.put(&layout.max_rate_consumer("g.t$active1", "c1"), "");
    t.put(&layout.max_rate_consumer("g.t$active1", "c2"), "");
    t.put(&layout.max_rate_consumer("g.t$suspended", "c1"), "");
    t.put(&layout.max_rate_consumer("g.t$gone", "c1"), "");

    t.put(&format!("{}/c1", layout.registry_nodes("dc1")), "");
    t.put(&format!("{}/c3", layout.registry_nodes("dc2")), "");
    (t, layout)
}

#[tokio::test]
async fn scan_splits_subscriptions_by_state() {
    let (tree, layout) = seeded();
    let cleaner = MaxRateCleaner::new(&tree, &layout, DeletePacing::none(), false);

    let scan = cleaner.scan_subscriptions().await.unwrap();

    assert_eq!(scan.active, vec!["g.t$active1", "g.u$fresh"]);
    assert_eq!(
        scan.inactive,
        vec![("g.t$suspended".to_string(), "SUSPENDED".to_string())]
    );
    assert_eq!(scan.invalid, vec!["g.t$broken"]);
}

#[tokio::test]
async fn report_only_mode_touches_nothing() {
    let (tree, layout) = seeded();
    let cleaner = MaxRateCleaner::new(&tree, &layout, DeletePacing::none(), false);

    let scan = cleaner.scan_subscriptions().await.unwrap();
    let max_rate = cleaner.max_rate_subscriptions().await.unwrap();
    let report = cleaner.clean_subscriptions(&scan.active, &max_rate).await.unwrap();

    assert!(!report.saved);
    assert_eq!(
        report.paths,
        vec![
            layout.max_rate_subscription("g.t$gone"),
            layout.max_rate_subscription("g.t$suspended"),
        ]
    );
    assert!(tree.deleted().is_empty());
    assert!(tree.contains(&layout.max_rate_subscription("g.t$gone")));
}

#[tokio::test]
async fn saving_removes_stale_subscriptions_then_stale_consumers() {
    let (tree, layout) = seeded();
    let cleaner = MaxRateCleaner::new(&tree, &layout, DeletePacing::none(), true);

    let scan = cleaner.scan_subscriptions().await.unwrap();
    let max_rate = cleaner.max_rate_subscriptions().await.unwrap();
    cleaner.clean_subscriptions(&scan.active, &max_rate).await.unwrap();

    let remaining = cleaner.max_rate_subscriptions().await.unwrap();
    assert_eq!(remaining, vec!["g.t$active1"]);
    assert!(!tree.contains(&layout.max_rate_consumer("g.t$suspended", "c1")));

    let consumers = cleaner.consumers().await.unwrap();
    assert_eq!(consumers, vec!["c1", "c3"]);

    let report = cleaner.clean_consumers(&consumers, &remaining).await.unwrap();
    assert_eq!(report.paths, vec![layout.max_rate_consumer("g.t$active1", "c2")]);
    assert!(tree.contains(&layout.max_rate_consumer("g.t$active1", "c1")));
    assert!(!tree.contains(&layout.max_rate_consumer("g.t$active1", "c2")));
}

#[tokio::test]
async fn active_subscription_without_node_is_reported() {
    let (tree, layout) = seeded();
    let cleaner = MaxRateCleaner::new(&tree, &layout, DeletePacing::none(), false);

    let scan = cleaner.scan_subscriptions().await.unwrap();
    let max_rate = cleaner.max_rate_subscriptions().await.unwrap();

    let missing = missing_max_rate(&scan.active, &max_rate);
    assert_eq!(missing, vec!["g.u$fresh"]);
}

#[tokio::test(start_paused = true)]
async fn deletes_are_paced_only_when_saving() {
    let (tree, layout) = seeded();
    let pacing = DeletePacing::new(Duration::from_secs(1));
    let stale = vec!["g.t$gone".to_string(), "g.t$suspended".to_string()];

    let start = tokio::time::Instant::now();
    MaxRateCleaner::new(&tree, &layout, pacing, false)
        .clean_subscriptions(&[], &stale)
        .await
        .unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));

    let start = tokio::time::Instant::now();
    MaxRateCleaner::new(&tree, &layout, pacing, true)
        .clean_subscriptions(&[], &stale)
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert_eq!(tree.deleted().len(), 2);
}

#[tokio::test]
async fn missing_prefix_is_rejected() {
    let (tree, _) = seeded();
    let err = ensure_prefix(&tree, &TreeLayout::new("/nope")).await.unwrap_err();
    assert!(err.to_string().contains("invalid path: /nope"));

    ensure_prefix(&tree, &TreeLayout::new(PREFIX)).await.unwrap();
}
