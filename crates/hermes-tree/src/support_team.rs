//! Backfill `supportTeam` on subscriptions created before the field existed.

use anyhow::Result;
use hermes_model::DEFAULT_SUPPORT_TEAM;
use serde_json::Value;
use tracing::{info, warn};

use crate::{walk_subscriptions, CoordinationTree, TreeLayout};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SupportTeamReport {
    /// `group.topic$subscription` names fixed (or, in dry-run, that lack the field).
    pub fixed: Vec<String>,
    pub unreadable: Vec<String>,
}

pub async fn fix_support_team<T: CoordinationTree + ?Sized>(
    tree: &T,
    layout: &TreeLayout,
    dry_run: bool,
) -> Result<SupportTeamReport> {
    let mut report = SupportTeamReport::default();
    for sub in walk_subscriptions(tree, layout).await? {
        let name = sub.node_name();
        let path = sub.path(layout);
        let data = tree.get(&path).await?;
        let mut node = match serde_json::from_slice::<Value>(&data) {
            Ok(Value::Object(map)) => map,
            _ => {
                warn!("Unable to read sub data: {}", name);
                report.unreadable.push(name);
                continue;
            }
        };
        if node.contains_key("supportTeam") {
            continue;
        }
        if dry_run {
            info!(dry_run, "DRYRUN: Subscription without supportTeam: {}", name);
        } else {
            info!("Fixing subscription without supportTeam: {}", name);
            node.insert(
                "supportTeam".to_string(),
                Value::String(DEFAULT_SUPPORT_TEAM.to_string()),
            );
            tree.set(&path, &serde_json::to_vec(&node)?).await?;
        }
        report.fixed.push(name);
    }
    Ok(report)
}
