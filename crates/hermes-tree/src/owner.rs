//! Ownership reassignment driven by a CSV file.
//!
//! CSV columns: `Topic,Subscription,Owner Source,Owner ID`. A row with an
//! empty `Subscription` assigns the topic itself; otherwise it assigns the
//! subscription `Topic$Subscription`.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use hermes_model::Owner;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::{walk_topics, CoordinationTree, TreeLayout};

#[derive(Debug, Deserialize)]
struct OwnershipRow {
    #[serde(rename = "Topic")]
    topic: String,
    #[serde(rename = "Subscription", default)]
    subscription: Option<String>,
    #[serde(rename = "Owner Source")]
    owner_source: String,
    #[serde(rename = "Owner ID")]
    owner_id: String,
}

/// Ownership targets of one qualified topic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TopicOwnership {
    /// New owner of the topic node. `None` when only subscriptions are listed.
    pub owner: Option<Owner>,
    /// Keyed by `group.topic$subscription`.
    pub subscriptions: BTreeMap<String, Owner>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnershipPlan {
    topics: BTreeMap<String, TopicOwnership>,
}

impl OwnershipPlan {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("open ownership csv failed: {}", path.display()))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut plan = Self::default();
        let mut rdr = csv::Reader::from_reader(reader);
        for (i, row) in rdr.deserialize::<OwnershipRow>().enumerate() {
            let row = row.with_context(|| format!("ownership csv row {}", i + 1))?;
            let owner = Owner::new(row.owner_source, row.owner_id);
            let entry = plan.topics.entry(row.topic.clone()).or_default();
            match row.subscription.filter(|s| !s.is_empty()) {
                Some(sub) => {
                    entry
                        .subscriptions
                        .insert(format!("{}${}", row.topic, sub), owner);
                }
                None => entry.owner = Some(owner),
            }
        }
        Ok(plan)
    }

    pub fn topic(&self, qualified: &str) -> Option<&TopicOwnership> {
        self.topics.get(qualified)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TopicOwnership)> {
        self.topics.iter()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnerReport {
    /// Topic and subscription names whose owner changed (or would change).
    pub changed: Vec<String>,
    /// Nodes whose data could not be parsed.
    pub unreadable: Vec<String>,
}

/// Apply `plan` to every topic in the tree. Nodes already owned by the
/// target are left untouched.
pub async fn migrate_owners<T: CoordinationTree + ?Sized>(
    tree: &T,
    layout: &TreeLayout,
    plan: &OwnershipPlan,
    dry_run: bool,
) -> Result<OwnerReport> {
    let mut report = OwnerReport::default();
    for t in walk_topics(tree, layout).await? {
        let qualified = t.qualified();
        let Some(target) = plan.topic(&qualified) else {
            continue;
        };
        info!("Found topic: {} in CSV data", qualified);

        if let Some(owner) = &target.owner {
            reassign(tree, &t.path(layout), &qualified, owner, dry_run, &mut report).await?;
        }

        if target.subscriptions.is_empty() {
            continue;
        }
        for sub in tree.children(&layout.subscriptions(&t.group, &t.topic)).await? {
            let name = format!("{qualified}${sub}");
            if let Some(owner) = target.subscriptions.get(&name) {
                let path = layout.subscription(&t.group, &t.topic, &sub);
                reassign(tree, &path, &name, owner, dry_run, &mut report).await?;
            }
        }
    }
    info!(
        "Changed owner for {} topics & subs",
        report.changed.len()
    );
    Ok(report)
}

async fn reassign<T: CoordinationTree + ?Sized>(
    tree: &T,
    path: &str,
    name: &str,
    owner: &Owner,
    dry_run: bool,
    report: &mut OwnerReport,
) -> Result<()> {
    let data = tree.get(path).await?;
    let mut node: Value = match serde_json::from_slice(&data) {
        Ok(v @ Value::Object(_)) => v,
        _ => {
            warn!("Unable to read data: {}", name);
            report.unreadable.push(name.to_string());
            return Ok(());
        }
    };

    let current = node
        .get("owner")
        .and_then(|o| serde_json::from_value::<Owner>(o.clone()).ok())
        .unwrap_or_else(Owner::unknown);
    if &current == owner {
        return Ok(());
    }

    info!(
        dry_run,
        "{}Changing owner of {} from: {} to: {}",
        if dry_run { "DRYRUN: " } else { "" },
        name,
        current,
        owner
    );
    node["owner"] = serde_json::to_value(owner)?;
    report.changed.push(name.to_string());
    if !dry_run {
        tree.set(path, &serde_json::to_vec(&node)?).await?;
    }
    Ok(())
}
