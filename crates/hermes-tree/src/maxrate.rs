//! Max-rate tree cleaner.
//!
//! The consumers max-rate runtime tree keeps one node per subscription
//! (`group.topic$subscription`) with one child per consumer node. Entries
//! for subscriptions that are no longer ACTIVE, or for consumers that left
//! the registry, are never removed by the broker itself.

use std::collections::BTreeSet;

use anyhow::Result;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{walk_subscriptions, CoordinationTree, DeletePacing, TreeLayout};

const ACTIVE: &str = "ACTIVE";

#[derive(Deserialize)]
struct SubscriptionState {
    state: String,
}

/// Subscriptions found in the tree, split by state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionScan {
    /// `group.topic$subscription` names in walk order.
    pub active: Vec<String>,
    /// `(name, state)` of every non-ACTIVE subscription.
    pub inactive: Vec<(String, String)>,
    /// Nodes whose data could not be parsed.
    pub invalid: Vec<String>,
}

/// Paths removed (or, when not saving, that would be removed).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub saved: bool,
    pub paths: Vec<String>,
}

impl CleanupReport {
    pub fn is_noop(&self) -> bool {
        self.paths.is_empty()
    }
}

pub struct MaxRateCleaner<'a, T: CoordinationTree + ?Sized> {
    tree: &'a T,
    layout: &'a TreeLayout,
    pacing: DeletePacing,
    save: bool,
}

impl<'a, T: CoordinationTree + ?Sized> MaxRateCleaner<'a, T> {
    pub fn new(tree: &'a T, layout: &'a TreeLayout, pacing: DeletePacing, save: bool) -> Self {
        Self {
            tree,
            layout,
            pacing,
            save,
        }
    }

    pub async fn scan_subscriptions(&self) -> Result<SubscriptionScan> {
        let mut scan = SubscriptionScan::default();
        for sub in walk_subscriptions(self.tree, self.layout).await? {
            let name = sub.node_name();
            let data = self.tree.get(&sub.path(self.layout)).await?;
            match serde_json::from_slice::<SubscriptionState>(&data) {
                Ok(s) if s.state == ACTIVE => {
                    info!("{}. {}", scan.active.len() + 1, name);
                    scan.active.push(name);
                }
                Ok(s) => {
                    info!("   {} is {}", name, s.state);
                    scan.inactive.push((name, s.state));
                }
                Err(_) => {
                    warn!("Unable to read sub data: {}", name);
                    scan.invalid.push(name);
                }
            }
        }
        info!("Found {} active subscriptions", scan.active.len());
        if !scan.inactive.is_empty() {
            info!(
                "Found {} not active subscriptions - will clean up if needed",
                scan.inactive.len()
            );
        }
        if !scan.invalid.is_empty() {
            info!(
                "Found {} invalid subscriptions - will clean up if needed",
                scan.invalid.len()
            );
        }
        Ok(scan)
    }

    pub async fn max_rate_subscriptions(&self) -> Result<Vec<String>> {
        let nodes = self.tree.children(&self.layout.max_rate_runtime()).await?;
        for (i, n) in nodes.iter().enumerate() {
            info!("{}. {}", i + 1, n);
        }
        Ok(nodes)
    }

    /// Remove max-rate nodes of subscriptions that are not active.
    pub async fn clean_subscriptions(
        &self,
        active: &[String],
        max_rate: &[String],
    ) -> Result<CleanupReport> {
        let active: BTreeSet<&str> = active.iter().map(String::as_str).collect();
        let mut report = CleanupReport {
            saved: self.save,
            paths: Vec::new(),
        };
        for node in max_rate.iter().filter(|n| !active.contains(n.as_str())) {
            let path = self.layout.max_rate_subscription(node);
            self.remove(&path).await?;
            report.paths.push(path);
        }
        self.summarize("subscription", &report);
        Ok(report)
    }

    /// Registered consumer node ids across all clusters.
    pub async fn consumers(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for cluster in self.tree.children(&self.layout.consumer_clusters()).await? {
            out.extend(self.tree.children(&self.layout.registry_nodes(&cluster)).await?);
        }
        info!("Active consumers ({}): {:?}", out.len(), out);
        Ok(out)
    }

    /// Remove consumer children of max-rate nodes that are not registered consumers.
    pub async fn clean_consumers(
        &self,
        consumers: &[String],
        max_rate: &[String],
    ) -> Result<CleanupReport> {
        let registered: BTreeSet<&str> = consumers.iter().map(String::as_str).collect();
        let mut report = CleanupReport {
            saved: self.save,
            paths: Vec::new(),
        };
        for (i, node) in max_rate.iter().enumerate() {
            info!("{}. Checking {}", i + 1, node);
            let children = self
                .tree
                .children(&self.layout.max_rate_subscription(node))
                .await?;
            for consumer in children.iter().filter(|c| !registered.contains(c.as_str())) {
                let path = self.layout.max_rate_consumer(node, consumer);
                self.remove(&path).await?;
                report.paths.push(path);
            }
        }
        self.summarize("consumer", &report);
        Ok(report)
    }

    async fn remove(&self, path: &str) -> Result<()> {
        if self.save {
            info!(" Removing {}", path);
            self.tree.delete_recursive(path).await?;
            self.pacing.pause().await;
        } else {
            info!(" Would remove {}", path);
        }
        Ok(())
    }

    fn summarize(&self, what: &str, report: &CleanupReport) {
        if report.is_noop() {
            info!("All OK");
        } else {
            info!(
                "{} {} {} nodes from max-rate tree",
                if self.save { "Removed" } else { "Would remove" },
                report.paths.len(),
                what
            );
        }
    }
}

/// Active subscriptions that have no max-rate node. Report only.
pub fn missing_max_rate(active: &[String], max_rate: &[String]) -> Vec<String> {
    let present: BTreeSet<&str> = max_rate.iter().map(String::as_str).collect();
    let missing: Vec<String> = active
        .iter()
        .filter(|s| !present.contains(s.as_str()))
        .cloned()
        .collect();
    for s in &missing {
        warn!("Subscription {} not found in max-rate tree", s);
    }
    missing
}
