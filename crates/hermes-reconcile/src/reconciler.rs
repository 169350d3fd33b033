//! Entity reconciler: probe → sanitize → decide → act → report.

use hermes_model::{EntityKind, Group, Sanitize, Schema, Topic};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    decide, decide_schema, probe, probe_schema, Action, ManagementApi, MigrationReport, Outcome,
    Payload, SchemaAction, SchemaProbe, WriteOp,
};

/// Decision and final outcome for one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityResult {
    pub action: Action,
    pub outcome: Outcome,
}

impl EntityResult {
    /// The destination entity was created (or would be, in dry-run) by this run.
    pub fn newly_created(&self) -> bool {
        self.action.creates() && self.outcome.is_ok()
    }
}

enum Write<'p> {
    Create(&'p Payload),
    Replace(&'p Payload),
    Delete,
}

impl Write<'_> {
    fn op(&self) -> WriteOp {
        match self {
            Write::Create(_) => WriteOp::Create,
            Write::Replace(_) => WriteOp::Replace,
            Write::Delete => WriteOp::Delete,
        }
    }
}

/// Brings one destination entity in line with its source definition.
pub struct Reconciler<'a, D: ManagementApi + ?Sized> {
    destination: &'a D,
    dry_run: bool,
}

impl<'a, D: ManagementApi + ?Sized> Reconciler<'a, D> {
    pub fn new(destination: &'a D, dry_run: bool) -> Self {
        Self {
            destination,
            dry_run,
        }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn reconcile_group(&self, group: Group, report: &mut MigrationReport) -> EntityResult {
        let group = group.sanitize();
        self.reconcile_entity(EntityKind::Group, &group.group_name, &group, report)
    }

    pub fn reconcile_topic(&self, topic: Topic, report: &mut MigrationReport) -> EntityResult {
        let topic = topic.sanitize();
        self.reconcile_entity(EntityKind::Topic, &topic.name, &topic, report)
    }

    /// Seed `schema` onto its topic. Never patches or deletes a schema.
    pub fn reconcile_schema(
        &self,
        schema: Schema,
        topic_newly_created: bool,
        report: &mut MigrationReport,
    ) -> Outcome {
        let schema = schema.sanitize();
        let name = schema.topic.as_str();
        let kind = EntityKind::Schema;

        let action = if topic_newly_created {
            let probed = match probe_schema(self.destination, name) {
                Ok(p) => p,
                Err(e) => return self.abort_on_transport(kind, name, &e.to_string(), report),
            };
            // A previewed create leaves no topic behind; its schema slot is empty by construction.
            let destination = if self.dry_run {
                debug!(topic = name, ?probed, "dry-run: treating schema slot as empty");
                SchemaProbe::NoContent
            } else {
                probed
            };
            decide_schema(true, true, &destination)
        } else {
            // The guard rejects pre-existing topics before the destination is consulted.
            decide_schema(false, true, &SchemaProbe::Absent)
        };

        let outcome = match &action {
            SchemaAction::Create => {
                let payload = Payload::raw(schema.content.clone(), schema.content_type.clone());
                self.execute(Write::Create(&payload), kind, name, report)
            }
            SchemaAction::Skip { reason } => {
                debug!(topic = name, reason = reason.as_str(), "schema not migrated");
                Outcome::Skipped
            }
            SchemaAction::Abort { code, detail } => self.abort(kind, name, *code, detail),
        };
        report.push_plan(kind, name, action.into(), outcome.clone());
        outcome
    }

    fn reconcile_entity<T: Serialize>(
        &self,
        kind: EntityKind,
        name: &str,
        definition: &T,
        report: &mut MigrationReport,
    ) -> EntityResult {
        let payload = match Payload::json(definition) {
            Ok(p) => p,
            Err(e) => {
                let action = Action::Abort {
                    code: None,
                    detail: e.to_string(),
                };
                let outcome = Outcome::failed(e.to_string());
                report.push_plan(kind, name, action.clone(), outcome.clone());
                return EntityResult { action, outcome };
            }
        };

        let probe = match probe(self.destination, kind, name) {
            Ok(p) => p,
            Err(e) => {
                let outcome = self.abort_on_transport(kind, name, &e.to_string(), report);
                return EntityResult {
                    action: Action::Abort {
                        code: None,
                        detail: e.to_string(),
                    },
                    outcome,
                };
            }
        };

        let action = decide(&probe);
        let outcome = match &action {
            Action::Create => self.execute(Write::Create(&payload), kind, name, report),
            Action::DeleteThenCreate => {
                let deleted = self.execute(Write::Delete, kind, name, report);
                if deleted.is_failed() {
                    warn!(%kind, name, "delete of corrupted entity failed, creating anyway");
                }
                self.execute(Write::Create(&payload), kind, name, report)
            }
            Action::Patch => self.execute(Write::Replace(&payload), kind, name, report),
            Action::Abort { code, detail } => self.abort(kind, name, *code, detail),
            Action::Skip { .. } => Outcome::Skipped,
        };

        report.push_plan(kind, name, action.clone(), outcome.clone());
        EntityResult { action, outcome }
    }

    fn execute(
        &self,
        write: Write<'_>,
        kind: EntityKind,
        name: &str,
        report: &mut MigrationReport,
    ) -> Outcome {
        let op = write.op();
        let message = describe(op, kind, name);

        if self.dry_run {
            info!(%kind, name, dry_run = true, "DRYRUN: {}", message);
            report.push_step(op, kind, name, Outcome::Previewed);
            return Outcome::Previewed;
        }

        info!(%kind, name, dry_run = false, "{}", message);
        let result = match write {
            Write::Create(p) => self.destination.create(kind, name, p),
            Write::Replace(p) => self.destination.replace(kind, name, p),
            Write::Delete => self.destination.delete(kind, name),
        };

        let outcome = match result {
            Ok(resp) if resp.is_success() => Outcome::Applied,
            Ok(resp) => {
                let body = resp.body_text();
                error!(%kind, name, status = resp.status, body = %body, "{:?} rejected", op);
                Outcome::failed(format!("status {}: {}", resp.status, body))
            }
            Err(e) => {
                error!(%kind, name, error = %e, "{:?} failed", op);
                Outcome::failed(e.to_string())
            }
        };
        report.push_step(op, kind, name, outcome.clone());
        outcome
    }

    fn abort(&self, kind: EntityKind, name: &str, code: Option<u16>, detail: &str) -> Outcome {
        match code {
            Some(code) => {
                error!(%kind, name, status = code, body = detail, "unexpected destination status, skipping entity");
                Outcome::failed(format!("unexpected status {code}: {detail}"))
            }
            None => {
                error!(%kind, name, error = detail, "skipping entity");
                Outcome::failed(detail)
            }
        }
    }

    fn abort_on_transport(
        &self,
        kind: EntityKind,
        name: &str,
        detail: &str,
        report: &mut MigrationReport,
    ) -> Outcome {
        let outcome = self.abort(kind, name, None, detail);
        report.push_plan(
            kind,
            name,
            Action::Abort {
                code: None,
                detail: detail.to_string(),
            },
            outcome.clone(),
        );
        outcome
    }
}

fn describe(op: WriteOp, kind: EntityKind, name: &str) -> String {
    match (op, kind) {
        (WriteOp::Create, EntityKind::Schema) => format!("Creating missing schema for topic: {name}"),
        (WriteOp::Create, _) => format!("Creating missing {kind}: {name}"),
        (WriteOp::Replace, _) => format!("Patching existing {kind}: {name}"),
        (WriteOp::Delete, _) => format!("Deleting corrupted {kind}: {name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiError, ApiResponse};
    use std::cell::RefCell;

    /// Destination stub: every read answers with a fixed status, every write with another.
    struct StubDestination {
        read_status: u16,
        write_status: u16,
        writes: RefCell<Vec<(WriteOp, EntityKind, String)>>,
    }

    impl StubDestination {
        fn new(read_status: u16) -> Self {
            Self {
                read_status,
                write_status: 201,
                writes: RefCell::new(Vec::new()),
            }
        }

        fn record(&self, op: WriteOp, kind: EntityKind, name: &str) -> Result<ApiResponse, ApiError> {
            self.writes.borrow_mut().push((op, kind, name.to_string()));
            Ok(ApiResponse::new(self.write_status, "{\"message\":\"nope\"}"))
        }
    }

    impl ManagementApi for StubDestination {
        fn endpoint(&self) -> &str {
            "stub"
        }
        fn list(&self, _kind: EntityKind) -> Result<Vec<String>, ApiError> {
            Ok(Vec::new())
        }
        fn read(&self, _kind: EntityKind, _name: &str) -> Result<ApiResponse, ApiError> {
            Ok(ApiResponse::new(self.read_status, "body"))
        }
        fn create(&self, kind: EntityKind, name: &str, _p: &Payload) -> Result<ApiResponse, ApiError> {
            self.record(WriteOp::Create, kind, name)
        }
        fn replace(&self, kind: EntityKind, name: &str, _p: &Payload) -> Result<ApiResponse, ApiError> {
            self.record(WriteOp::Replace, kind, name)
        }
        fn delete(&self, kind: EntityKind, name: &str) -> Result<ApiResponse, ApiError> {
            self.record(WriteOp::Delete, kind, name)
        }
    }

    fn ops(stub: &StubDestination) -> Vec<WriteOp> {
        stub.writes.borrow().iter().map(|(op, _, _)| *op).collect()
    }

    #[test]
    fn absent_creates() {
        let stub = StubDestination::new(404);
        let mut report = MigrationReport::start(false);
        let r = Reconciler::new(&stub, false).reconcile_group(Group::new("g"), &mut report);
        assert_eq!(r.action, Action::Create);
        assert_eq!(r.outcome, Outcome::Applied);
        assert_eq!(ops(&stub), vec![WriteOp::Create]);
    }

    #[test]
    fn corrupted_deletes_then_creates() {
        let stub = StubDestination::new(500);
        let mut report = MigrationReport::start(false);
        let r = Reconciler::new(&stub, false).reconcile_group(Group::new("g"), &mut report);
        assert_eq!(r.action, Action::DeleteThenCreate);
        assert_eq!(ops(&stub), vec![WriteOp::Delete, WriteOp::Create]);
        assert!(r.newly_created());
    }

    #[test]
    fn present_patches() {
        let stub = StubDestination::new(200);
        let mut report = MigrationReport::start(false);
        let r = Reconciler::new(&stub, false).reconcile_topic(Topic::new("g.t"), &mut report);
        assert_eq!(r.action, Action::Patch);
        assert_eq!(ops(&stub), vec![WriteOp::Replace]);
        assert!(!r.newly_created());
    }

    #[test]
    fn unexpected_aborts_without_writes() {
        let stub = StubDestination::new(409);
        let mut report = MigrationReport::start(false);
        let r = Reconciler::new(&stub, false).reconcile_topic(Topic::new("g.t"), &mut report);
        assert!(matches!(r.action, Action::Abort { code: Some(409), .. }));
        assert!(r.outcome.is_failed());
        assert!(ops(&stub).is_empty());
        assert_eq!(report.counts.failed, 1);
    }

    #[test]
    fn rejected_write_is_entity_failure() {
        let mut stub = StubDestination::new(404);
        stub.write_status = 400;
        let mut report = MigrationReport::start(false);
        let r = Reconciler::new(&stub, false).reconcile_group(Group::new("g"), &mut report);
        assert_eq!(
            r.outcome,
            Outcome::failed("status 400: {\"message\":\"nope\"}")
        );
        assert_eq!(report.counts.failed, 1);
        assert_eq!(report.counts.created, 0);
    }

    #[test]
    fn dry_run_decides_identically_and_writes_nothing() {
        for status in [404, 500, 200, 418] {
            let live = StubDestination::new(status);
            let preview = StubDestination::new(status);
            let mut live_report = MigrationReport::start(false);
            let mut preview_report = MigrationReport::start(true);

            Reconciler::new(&live, false).reconcile_group(Group::new("g"), &mut live_report);
            Reconciler::new(&preview, true).reconcile_group(Group::new("g"), &mut preview_report);

            assert_eq!(live_report.decisions(), preview_report.decisions());
            assert!(preview.writes.borrow().is_empty());
        }
    }

    #[test]
    fn schema_skipped_for_pre_existing_topic_without_probe() {
        let stub = StubDestination::new(204);
        let mut report = MigrationReport::start(false);
        let schema = Schema {
            topic: "g.t".to_string(),
            content: b"{}".to_vec(),
            content_type: None,
        };
        let outcome = Reconciler::new(&stub, false).reconcile_schema(schema, false, &mut report);
        assert_eq!(outcome, Outcome::Skipped);
        assert!(ops(&stub).is_empty());
    }
}
