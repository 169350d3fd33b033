//! Scenario: destination entities that read 500 are purged and recreated.
//!
//! # Invariant under test
//! A corrupted group or topic always gets a delete followed by a create,
//! even when the delete itself is rejected. A topic recreated this way
//! counts as newly created, so its schema is seeded.

use hermes_model::EntityKind;
use hermes_reconcile::{Action, Migrator, Outcome, WriteOp};
use hermes_testkit::{legacy_group, legacy_topic, FakeManagement};

fn source() -> FakeManagement {
    FakeManagement::new("source")
        .with_group(&legacy_group("team1"))
        .with_topic(&legacy_topic("team1.orders"))
        .with_schema("team1.orders", b"{}")
}

fn ops_for(dst: &FakeManagement, kind: EntityKind) -> Vec<WriteOp> {
    dst.writes()
        .into_iter()
        .filter(|w| w.kind == kind)
        .map(|w| w.op)
        .collect()
}

#[test]
fn corrupted_group_create_runs_even_when_delete_fails() {
    let src = source();
    let dst = FakeManagement::new("destination");
    dst.corrupt(EntityKind::Group, "team1");
    dst.reject_write(WriteOp::Delete, EntityKind::Group, "team1", 500);

    let report = Migrator::new(&src, &dst, false).run().unwrap();

    assert_eq!(
        report.action_for(EntityKind::Group, "team1"),
        Some(&Action::DeleteThenCreate)
    );
    assert_eq!(ops_for(&dst, EntityKind::Group), vec![WriteOp::Delete, WriteOp::Create]);
    assert!(dst.group("team1").is_some());

    // The failed delete is visible as a step but the entity itself ended well.
    let delete = report
        .steps
        .iter()
        .find(|s| s.op == WriteOp::Delete)
        .unwrap();
    assert!(delete.outcome.is_failed());
    assert_eq!(report.counts.deleted, 0);
    assert_eq!(report.counts.failed, 0);
}

#[test]
fn corrupted_topic_is_recreated_and_gets_its_schema() {
    let src = source();
    let dst = FakeManagement::new("destination").with_group(&legacy_group("team1"));
    dst.corrupt(EntityKind::Topic, "team1.orders");

    let report = Migrator::new(&src, &dst, false).run().unwrap();

    assert_eq!(
        report.action_for(EntityKind::Topic, "team1.orders"),
        Some(&Action::DeleteThenCreate)
    );
    assert_eq!(
        ops_for(&dst, EntityKind::Topic),
        vec![WriteOp::Delete, WriteOp::Create]
    );
    assert_eq!(
        report.action_for(EntityKind::Schema, "team1.orders"),
        Some(&Action::Create)
    );
    assert_eq!(dst.schema("team1.orders").as_deref(), Some(&b"{}"[..]));
    assert_eq!(report.counts.deleted, 1);
    assert_eq!(report.counts.patched, 1, "existing group is patched");
    assert!(report
        .plan
        .iter()
        .all(|e| e.outcome == Outcome::Applied));
}
