//! Scenario: reassigning topic and subscription owners from a CSV file.
//!
//! # Invariant under test
//! Only nodes listed in the CSV whose owner differs are rewritten, every
//! other field of the node is preserved, and dry-run writes nothing.

use std::io::Write;

use hermes_testkit::MemoryTree;
use hermes_tree::owner::{migrate_owners, OwnershipPlan};
use hermes_tree::TreeLayout;
use serde_json::json;

const CSV: &str = "Topic,Subscription,Owner Source,Owner ID
g.orders,,Service Catalog,42
g.orders,billing,Plaintext,ops
g.payments,,Service Catalog,42
g.audit,,Service Catalog,7
g.broken,,Service Catalog,42
";

fn seeded() -> (MemoryTree, TreeLayout) {
    let layout = TreeLayout::new("/run/hermes");
    let t = MemoryTree::new();
    t.put(
        &layout.topic("g", "orders"),
        json!({"name": "g.orders", "owner": {"source": "Plaintext", "id": "old"}}).to_string(),
    );
    t.put(
        &layout.subscription("g", "orders", "billing"),
        json!({"name": "billing", "endpoint": "http://billing"}).to_string(),
    );
    t.put(
        &layout.subscription("g", "orders", "shipping"),
        json!({"name": "shipping"}).to_string(),
    );
    t.put(&layout.topic("g", "payments"), json!({"name": "g.payments"}).to_string());
    t.put(
        &layout.topic("g", "audit"),
        json!({"name": "g.audit", "owner": {"source": "Service Catalog", "id": "7"}}).to_string(),
    );
    t.put(&layout.topic("g", "broken"), "{{{");
    t.put(&layout.topic("g", "unlisted"), json!({"name": "g.unlisted"}).to_string());
    (t, layout)
}

fn plan() -> OwnershipPlan {
    OwnershipPlan::from_reader(CSV.as_bytes()).unwrap()
}

#[tokio::test]
async fn changes_only_listed_nodes_with_a_different_owner() {
    let (tree, layout) = seeded();

    let report = migrate_owners(&tree, &layout, &plan(), false).await.unwrap();

    assert_eq!(
        report.changed,
        vec!["g.orders", "g.orders$billing", "g.payments"]
    );
    assert_eq!(report.unreadable, vec!["g.broken"]);

    assert_eq!(
        tree.json(&layout.topic("g", "orders")).unwrap()["owner"],
        json!({"source": "Service Catalog", "id": "42"})
    );
    assert_eq!(
        tree.json(&layout.subscription("g", "orders", "billing")).unwrap(),
        json!({
            "name": "billing",
            "endpoint": "http://billing",
            "owner": {"source": "Plaintext", "id": "ops"}
        })
    );
    assert_eq!(
        tree.json(&layout.topic("g", "payments")).unwrap()["owner"]["id"],
        "42"
    );
    assert!(tree
        .json(&layout.subscription("g", "orders", "shipping"))
        .unwrap()
        .get("owner")
        .is_none());
    assert!(tree.json(&layout.topic("g", "unlisted")).unwrap().get("owner").is_none());
    assert_eq!(tree.sets().len(), 3);
}

#[tokio::test]
async fn dry_run_reports_without_writing() {
    let (tree, layout) = seeded();

    let report = migrate_owners(&tree, &layout, &plan(), true).await.unwrap();

    assert_eq!(report.changed.len(), 3);
    assert!(tree.sets().is_empty());
    assert_eq!(
        tree.json(&layout.topic("g", "orders")).unwrap()["owner"]["id"],
        "old"
    );
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let (tree, layout) = seeded();
    migrate_owners(&tree, &layout, &plan(), false).await.unwrap();

    let again = migrate_owners(&tree, &layout, &plan(), false).await.unwrap();

    assert!(again.changed.is_empty());
    assert_eq!(tree.sets().len(), 3);
}

#[test]
fn plan_loads_from_a_file() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(CSV.as_bytes()).unwrap();

    let plan = OwnershipPlan::from_path(f.path()).unwrap();

    assert_eq!(plan.len(), 4);
    assert!(OwnershipPlan::from_path("/definitely/not/here.csv").is_err());
}
