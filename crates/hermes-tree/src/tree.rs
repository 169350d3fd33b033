use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::{SubscriptionRef, TopicRef, TreeLayout};

/// Hierarchical key/value store backing the management service.
#[async_trait]
pub trait CoordinationTree: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Child node names (not full paths).
    async fn children(&self, path: &str) -> Result<Vec<String>>;

    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// Overwrite data of an existing node, any version.
    async fn set(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Delete `path` and everything under it.
    async fn delete_recursive(&self, path: &str) -> Result<()>;
}

/// Fails when the layout prefix does not exist in the tree.
pub async fn ensure_prefix<T: CoordinationTree + ?Sized>(tree: &T, layout: &TreeLayout) -> Result<()> {
    if !tree.exists(layout.prefix()).await? {
        bail!("invalid path: {}", layout.prefix());
    }
    Ok(())
}

/// Every topic node, groups in tree order.
pub async fn walk_topics<T: CoordinationTree + ?Sized>(
    tree: &T,
    layout: &TreeLayout,
) -> Result<Vec<TopicRef>> {
    let mut out = Vec::new();
    for group in tree.children(&layout.groups()).await? {
        for topic in tree.children(&layout.topics(&group)).await? {
            out.push(TopicRef {
                group: group.clone(),
                topic,
            });
        }
    }
    Ok(out)
}

/// Every subscription node of every topic.
pub async fn walk_subscriptions<T: CoordinationTree + ?Sized>(
    tree: &T,
    layout: &TreeLayout,
) -> Result<Vec<SubscriptionRef>> {
    let mut out = Vec::new();
    for t in walk_topics(tree, layout).await? {
        for name in tree.children(&layout.subscriptions(&t.group, &t.topic)).await? {
            out.push(SubscriptionRef {
                group: t.group.clone(),
                topic: t.topic.clone(),
                name,
            });
        }
    }
    Ok(out)
}
