//! Migration orchestrator.
//!
//! Pulls the source listings once, then walks groups in listing order:
//! group → its topics in listing order → each new topic's schema.

use std::collections::BTreeMap;

use hermes_model::{group_of_topic, EntityKind, Group, Schema, Topic};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::{Action, ApiError, ManagementApi, MigrationReport, Outcome, Reconciler};

/// Topics whose qualified name minus its final `.segment` equals `group`.
pub fn topics_for_group<'t>(all_topics: &'t [String], group: &str) -> Vec<&'t str> {
    all_topics
        .iter()
        .filter(|t| group_of_topic(t) == Some(group))
        .map(String::as_str)
        .collect()
}

/// Topics per group for every listed group (groups without topics map to an empty list).
pub fn group_topics(groups: &[String], all_topics: &[String]) -> BTreeMap<String, Vec<String>> {
    groups
        .iter()
        .map(|g| {
            let topics = topics_for_group(all_topics, g)
                .into_iter()
                .map(str::to_string)
                .collect();
            (g.clone(), topics)
        })
        .collect()
}

/// Result of reading an authoritative definition from the source.
enum SourceRead<T> {
    Found(T),
    /// Non-200: source truth could not be established.
    Missing { status: u16 },
    Failed(String),
}

/// Drives reconciliation of every group, topic and schema from `source` onto `destination`.
pub struct Migrator<'a, S: ManagementApi + ?Sized, D: ManagementApi + ?Sized> {
    source: &'a S,
    destination: &'a D,
    dry_run: bool,
}

impl<'a, S: ManagementApi + ?Sized, D: ManagementApi + ?Sized> Migrator<'a, S, D> {
    pub fn new(source: &'a S, destination: &'a D, dry_run: bool) -> Self {
        Self {
            source,
            destination,
            dry_run,
        }
    }

    /// Run one full migration.
    ///
    /// Errors only when the initial source listings fail; every later
    /// failure is recorded in the report and the run continues.
    pub fn run(&self) -> Result<MigrationReport, ApiError> {
        let groups = self.source.list(EntityKind::Group)?;
        let topics = self.source.list(EntityKind::Topic)?;
        info!(
            source = self.source.endpoint(),
            destination = self.destination.endpoint(),
            groups = groups.len(),
            topics = topics.len(),
            dry_run = self.dry_run,
            "starting migration"
        );

        let reconciler = Reconciler::new(self.destination, self.dry_run);
        let mut report = MigrationReport::start(self.dry_run);

        for group in &groups {
            let group_topics = topics_for_group(&topics, group);
            self.migrate_group(&reconciler, group, &group_topics, &mut report);
        }

        report.finish();
        info!(run_id = %report.run_id, "migration finished: {}", report.summary_line());
        Ok(report)
    }

    fn migrate_group(
        &self,
        reconciler: &Reconciler<'_, D>,
        name: &str,
        topics: &[&str],
        report: &mut MigrationReport,
    ) {
        let group: Group = match self.read_source(EntityKind::Group, name) {
            SourceRead::Found(g) => g,
            SourceRead::Missing { status } => {
                warn!(group = name, status, "source group unreadable, skipping group and its topics");
                report.push_plan(
                    EntityKind::Group,
                    name,
                    Action::skip(format!("source returned status {status}")),
                    Outcome::Skipped,
                );
                for topic in topics {
                    report.push_plan(
                        EntityKind::Topic,
                        *topic,
                        Action::skip("owning group skipped"),
                        Outcome::Skipped,
                    );
                }
                return;
            }
            SourceRead::Failed(reason) => {
                report.push_plan(
                    EntityKind::Group,
                    name,
                    Action::Abort {
                        code: None,
                        detail: reason.clone(),
                    },
                    Outcome::failed(reason),
                );
                for topic in topics {
                    report.push_plan(
                        EntityKind::Topic,
                        *topic,
                        Action::skip("owning group skipped"),
                        Outcome::Skipped,
                    );
                }
                return;
            }
        };

        reconciler.reconcile_group(group, report);

        for topic in topics {
            self.migrate_topic(reconciler, topic, report);
        }
    }

    fn migrate_topic(&self, reconciler: &Reconciler<'_, D>, name: &str, report: &mut MigrationReport) {
        let topic: Topic = match self.read_source(EntityKind::Topic, name) {
            SourceRead::Found(t) => t,
            SourceRead::Missing { status } => {
                warn!(topic = name, status, "source topic unreadable, skipping");
                report.push_plan(
                    EntityKind::Topic,
                    name,
                    Action::skip(format!("source returned status {status}")),
                    Outcome::Skipped,
                );
                return;
            }
            SourceRead::Failed(reason) => {
                self.fail_source(EntityKind::Topic, name, reason, report);
                return;
            }
        };

        let schema = match self.read_source_schema(name) {
            Ok(s) => s,
            Err(e) => {
                self.fail_source(EntityKind::Topic, name, e.to_string(), report);
                return;
            }
        };

        let result = reconciler.reconcile_topic(topic, report);

        if let Some(schema) = schema {
            reconciler.reconcile_schema(schema, result.newly_created(), report);
        }
    }

    fn read_source<T: DeserializeOwned>(&self, kind: EntityKind, name: &str) -> SourceRead<T> {
        let resp = match self.source.read(kind, name) {
            Ok(r) => r,
            Err(e) => return SourceRead::Failed(format!("source read failed: {e}")),
        };
        if resp.status != 200 {
            return SourceRead::Missing {
                status: resp.status,
            };
        }
        match serde_json::from_slice(&resp.body) {
            Ok(v) => SourceRead::Found(v),
            Err(e) => SourceRead::Failed(format!("source {kind} body decode failed: {e}")),
        }
    }

    /// `Some` only when the source answers 200 for the topic's schema.
    fn read_source_schema(&self, topic: &str) -> Result<Option<Schema>, ApiError> {
        let resp = self.source.read(EntityKind::Schema, topic)?;
        if resp.status != 200 {
            return Ok(None);
        }
        Ok(Some(Schema {
            topic: topic.to_string(),
            content: resp.body,
            content_type: resp.content_type,
        }))
    }

    fn fail_source(&self, kind: EntityKind, name: &str, reason: String, report: &mut MigrationReport) {
        warn!(%kind, name, reason = reason.as_str(), "source read failed");
        report.push_plan(
            kind,
            name,
            Action::Abort {
                code: None,
                detail: reason.clone(),
            },
            Outcome::failed(reason),
        );
    }
}
