use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Result};
use async_trait::async_trait;
use hermes_tree::CoordinationTree;

/// In-memory coordination tree. Missing nodes are errors, like ZooKeeper's
/// NoNode; parents are created implicitly by [`MemoryTree::put`].
#[derive(Default)]
pub struct MemoryTree {
    nodes: Mutex<BTreeMap<String, Vec<u8>>>,
    deleted: Mutex<Vec<String>>,
    sets: Mutex<Vec<String>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn nodes(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.nodes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create or overwrite `path`, creating empty ancestors as needed.
    pub fn put(&self, path: &str, data: impl Into<Vec<u8>>) {
        let mut nodes = self.nodes();
        let mut at = 0;
        while let Some(i) = path[at + 1..].find('/') {
            let ancestor = &path[..at + 1 + i];
            nodes.entry(ancestor.to_string()).or_default();
            at += 1 + i;
        }
        nodes.insert(path.to_string(), data.into());
    }

    pub fn data(&self, path: &str) -> Option<Vec<u8>> {
        self.nodes().get(path).cloned()
    }

    pub fn json(&self, path: &str) -> Option<serde_json::Value> {
        self.data(path)
            .and_then(|d| serde_json::from_slice(&d).ok())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes().contains_key(path)
    }

    /// Roots of every `delete_recursive` call, in call order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Paths written by `set`, in call order.
    pub fn sets(&self) -> Vec<String> {
        self.sets.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl CoordinationTree for MemoryTree {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.contains(path))
    }

    async fn children(&self, path: &str) -> Result<Vec<String>> {
        let nodes = self.nodes();
        if !nodes.contains_key(path) {
            bail!("no node: {path}");
        }
        let base = format!("{}/", path.trim_end_matches('/'));
        Ok(nodes
            .range(base.clone()..)
            .take_while(|(k, _)| k.starts_with(&base))
            .filter_map(|(k, _)| {
                let rest = &k[base.len()..];
                (!rest.contains('/')).then(|| rest.to_string())
            })
            .collect())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        match self.nodes().get(path) {
            Some(d) => Ok(d.clone()),
            None => bail!("no node: {path}"),
        }
    }

    async fn set(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut nodes = self.nodes();
        match nodes.get_mut(path) {
            Some(slot) => *slot = data.to_vec(),
            None => bail!("no node: {path}"),
        }
        self.sets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
        Ok(())
    }

    async fn delete_recursive(&self, path: &str) -> Result<()> {
        let mut nodes = self.nodes();
        if nodes.remove(path).is_none() {
            bail!("no node: {path}");
        }
        let base = format!("{path}/");
        nodes.retain(|k, _| !k.starts_with(&base));
        self.deleted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
        Ok(())
    }
}
