//! Scenario: running the same migration repeatedly.
//!
//! # Invariant under test
//! The first run creates; every later run against the same source patches
//! with identical content, creates nothing and never touches the schema.

use hermes_model::EntityKind;
use hermes_reconcile::{Action, Migrator, WriteOp};
use hermes_testkit::{legacy_group, legacy_topic, FakeManagement};

#[test]
fn second_and_third_runs_only_patch() {
    let src = FakeManagement::new("source")
        .with_group(&legacy_group("team1"))
        .with_topic(&legacy_topic("team1.orders"))
        .with_topic(&legacy_topic("team1.payments"))
        .with_schema("team1.orders", b"{\"type\":\"string\"}");
    let dst = FakeManagement::new("destination");

    let first = Migrator::new(&src, &dst, false).run().unwrap();
    assert_eq!(first.counts.created, 4);

    let group_after_first = dst.group("team1");
    let topic_after_first = dst.topic("team1.orders");
    let schema_after_first = dst.schema("team1.orders");

    for _ in 0..2 {
        dst.clear_writes();
        let again = Migrator::new(&src, &dst, false).run().unwrap();

        assert_eq!(
            again.summary_line(),
            "created=0 patched=3 deleted=0 skipped=1 failed=0"
        );
        assert_eq!(again.action_for(EntityKind::Group, "team1"), Some(&Action::Patch));
        assert_eq!(
            again.action_for(EntityKind::Topic, "team1.orders"),
            Some(&Action::Patch)
        );
        assert!(again
            .action_for(EntityKind::Schema, "team1.orders")
            .unwrap()
            .is_skip());
        assert!(dst.writes().iter().all(|w| w.op == WriteOp::Replace));

        assert_eq!(dst.group("team1"), group_after_first);
        assert_eq!(dst.topic("team1.orders"), topic_after_first);
        assert_eq!(dst.schema("team1.orders"), schema_after_first);
    }
}

#[test]
fn run_ids_differ_between_runs() {
    let src = FakeManagement::new("source").with_group(&legacy_group("team1"));
    let dst = FakeManagement::new("destination");

    let a = Migrator::new(&src, &dst, false).run().unwrap();
    let b = Migrator::new(&src, &dst, false).run().unwrap();
    assert_ne!(a.run_id, b.run_id);
}
