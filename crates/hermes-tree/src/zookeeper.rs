use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;
use zookeeper_client as zk;

use crate::CoordinationTree;

/// ZooKeeper-backed [`CoordinationTree`].
pub struct ZkTree {
    client: zk::Client,
}

impl ZkTree {
    /// `cluster` is a connection string such as `zk1:2181,zk2:2181`.
    pub async fn connect(cluster: &str) -> Result<Self> {
        let client = zk::Client::connect(cluster)
            .await
            .with_context(|| format!("zookeeper connect failed: {cluster}"))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CoordinationTree for ZkTree {
    async fn exists(&self, path: &str) -> Result<bool> {
        let stat = self
            .client
            .check_stat(path)
            .await
            .with_context(|| format!("exists {path}"))?;
        Ok(stat.is_some())
    }

    async fn children(&self, path: &str) -> Result<Vec<String>> {
        self.client
            .list_children(path)
            .await
            .with_context(|| format!("list children {path}"))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let (data, _stat) = self
            .client
            .get_data(path)
            .await
            .with_context(|| format!("get {path}"))?;
        Ok(data)
    }

    async fn set(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .set_data(path, data, None)
            .await
            .with_context(|| format!("set {path}"))?;
        Ok(())
    }

    async fn delete_recursive(&self, path: &str) -> Result<()> {
        for child in self.children(path).await? {
            self.delete_recursive(&format!("{path}/{child}")).await?;
        }
        debug!(path, "deleting node");
        self.client
            .delete(path, None)
            .await
            .with_context(|| format!("delete {path}"))
    }
}
