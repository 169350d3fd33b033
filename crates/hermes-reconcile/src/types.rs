use chrono::{DateTime, Utc};
use hermes_model::EntityKind;
use serde::Serialize;
use uuid::Uuid;

/// What the reconciler decided for one entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Create,
    /// Purge a corrupted destination entity (best-effort), then create it.
    DeleteThenCreate,
    /// Full replace with the sanitized source definition.
    Patch,
    Skip { reason: String },
    /// No mutation. `code` is the offending HTTP status when there was one.
    Abort { code: Option<u16>, detail: String },
}

impl Action {
    pub fn skip(reason: impl Into<String>) -> Self {
        Action::Skip {
            reason: reason.into(),
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Action::Skip { .. })
    }

    /// `true` for the branches that leave a freshly created destination entity.
    pub fn creates(&self) -> bool {
        matches!(self, Action::Create | Action::DeleteThenCreate)
    }
}

/// The subset of [`Action`] the schema guard can produce. Schemas are never
/// patched or purged, so those branches do not exist here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaAction {
    Create,
    Skip { reason: String },
    Abort { code: Option<u16>, detail: String },
}

impl SchemaAction {
    pub fn skip(reason: impl Into<String>) -> Self {
        SchemaAction::Skip {
            reason: reason.into(),
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, SchemaAction::Skip { .. })
    }
}

impl From<SchemaAction> for Action {
    fn from(a: SchemaAction) -> Self {
        match a {
            SchemaAction::Create => Action::Create,
            SchemaAction::Skip { reason } => Action::Skip { reason },
            SchemaAction::Abort { code, detail } => Action::Abort { code, detail },
        }
    }
}

/// Mutating call kinds against a destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOp {
    Create,
    Replace,
    Delete,
}

/// How an entity (or a single mutating call) ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    /// Dry-run: the call was decided but not issued.
    Previewed,
    Skipped,
    Failed { reason: String },
}

impl Outcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Outcome::Failed {
            reason: reason.into(),
        }
    }

    /// Applied or previewed.
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Applied | Outcome::Previewed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

/// One row of the reconciliation plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub kind: EntityKind,
    pub name: String,
    pub action: Action,
    pub outcome: Outcome,
}

/// One mutating call, attempted or previewed, in issue order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MutationStep {
    pub op: WriteOp,
    pub kind: EntityKind,
    pub name: String,
    pub outcome: Outcome,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub created: usize,
    pub patched: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Aggregate result of one migration run. Append-only while the run is live.
#[derive(Clone, Debug, Serialize)]
pub struct MigrationReport {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub counts: ReportCounts,
    pub plan: Vec<PlanEntry>,
    pub steps: Vec<MutationStep>,
}

impl MigrationReport {
    pub fn start(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            counts: ReportCounts::default(),
            plan: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn push_plan(
        &mut self,
        kind: EntityKind,
        name: impl Into<String>,
        action: Action,
        outcome: Outcome,
    ) {
        match outcome {
            Outcome::Skipped => self.counts.skipped += 1,
            Outcome::Failed { .. } => self.counts.failed += 1,
            Outcome::Applied | Outcome::Previewed => {}
        }
        self.plan.push(PlanEntry {
            kind,
            name: name.into(),
            action,
            outcome,
        });
    }

    pub fn push_step(
        &mut self,
        op: WriteOp,
        kind: EntityKind,
        name: impl Into<String>,
        outcome: Outcome,
    ) {
        if outcome.is_ok() {
            match op {
                WriteOp::Create => self.counts.created += 1,
                WriteOp::Replace => self.counts.patched += 1,
                WriteOp::Delete => self.counts.deleted += 1,
            }
        }
        self.steps.push(MutationStep {
            op,
            kind,
            name: name.into(),
            outcome,
        });
    }

    /// Decided action for an entity, if it was planned.
    pub fn action_for(&self, kind: EntityKind, name: &str) -> Option<&Action> {
        self.plan
            .iter()
            .find(|e| e.kind == kind && e.name == name)
            .map(|e| &e.action)
    }

    /// Decisions only, in plan order. Equal across dry-run and live runs
    /// over the same destination state.
    pub fn decisions(&self) -> Vec<(EntityKind, &str, &Action)> {
        self.plan
            .iter()
            .map(|e| (e.kind, e.name.as_str(), &e.action))
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.counts.failed == 0
    }

    pub fn summary_line(&self) -> String {
        let c = &self.counts;
        format!(
            "created={} patched={} deleted={} skipped={} failed={}",
            c.created, c.patched, c.deleted, c.skipped, c.failed
        )
    }
}
