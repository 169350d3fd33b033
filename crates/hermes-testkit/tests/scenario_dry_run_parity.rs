//! Scenario: dry-run against a mixed destination.
//!
//! # Invariant under test
//! A dry-run probes exactly like a live run and produces the same decision
//! for every entity, but issues zero mutating calls.

use hermes_model::EntityKind;
use hermes_reconcile::{Migrator, Outcome};
use hermes_testkit::{legacy_group, legacy_topic, FakeManagement};

fn source() -> FakeManagement {
    FakeManagement::new("source")
        .with_group(&legacy_group("fresh"))
        .with_group(&legacy_group("broken"))
        .with_group(&legacy_group("known"))
        .with_topic(&legacy_topic("fresh.t"))
        .with_topic(&legacy_topic("broken.t"))
        .with_topic(&legacy_topic("known.t"))
        .with_topic(&legacy_topic("known.odd"))
        .with_schema("fresh.t", b"{}")
        .with_schema("broken.t", b"{}")
        .with_schema("known.t", b"{}")
}

/// Absent, corrupted, present and unexpected entities side by side.
fn destination() -> FakeManagement {
    let dst = FakeManagement::new("destination")
        .with_group(&legacy_group("known"))
        .with_topic(&legacy_topic("known.t"));
    dst.corrupt(EntityKind::Group, "broken");
    dst.corrupt(EntityKind::Topic, "broken.t");
    dst.force_read(EntityKind::Topic, "known.odd", 409);
    dst
}

#[test]
fn dry_run_matches_live_decisions_without_writing() {
    let src = source();
    let live_dst = destination();
    let preview_dst = destination();

    let live = Migrator::new(&src, &live_dst, false).run().unwrap();
    let preview = Migrator::new(&src, &preview_dst, true).run().unwrap();

    assert_eq!(live.decisions(), preview.decisions());
    assert_eq!(preview_dst.write_count(), 0);
    assert!(live_dst.write_count() > 0);

    assert!(preview.dry_run);
    assert_eq!(live.counts.created, preview.counts.created);
    assert_eq!(live.counts.patched, preview.counts.patched);
    assert_eq!(live.counts.deleted, preview.counts.deleted);
    assert_eq!(live.counts.failed, preview.counts.failed);
}

#[test]
fn previewed_steps_are_marked_as_such() {
    let src = source();
    let dst = destination();

    let preview = Migrator::new(&src, &dst, true).run().unwrap();

    assert!(!preview.steps.is_empty());
    assert!(preview.steps.iter().all(|s| s.outcome == Outcome::Previewed));
    assert!(dst.group("fresh").is_none());
    assert!(dst.schema("known.t").is_none());
}
