//! Path layout of the coordination tree under a configurable prefix.
//!
//! ```text
//! {prefix}/groups/{group}/topics/{topic}/subscriptions/{subscription}
//! {prefix}/consumers-rate/runtime/{group.topic$subscription}/{consumer}
//! {prefix}/consumers-workload/{cluster}/registry/nodes/{consumer}
//! ```

use hermes_model::subscription_node_name;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeLayout {
    prefix: String,
}

impl TreeLayout {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            },
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn join(&self, rest: &str) -> String {
        if self.prefix == "/" {
            format!("/{rest}")
        } else {
            format!("{}/{rest}", self.prefix)
        }
    }

    pub fn groups(&self) -> String {
        self.join("groups")
    }

    pub fn topics(&self, group: &str) -> String {
        self.join(&format!("groups/{group}/topics"))
    }

    pub fn topic(&self, group: &str, topic: &str) -> String {
        self.join(&format!("groups/{group}/topics/{topic}"))
    }

    pub fn subscriptions(&self, group: &str, topic: &str) -> String {
        self.join(&format!("groups/{group}/topics/{topic}/subscriptions"))
    }

    pub fn subscription(&self, group: &str, topic: &str, subscription: &str) -> String {
        self.join(&format!(
            "groups/{group}/topics/{topic}/subscriptions/{subscription}"
        ))
    }

    pub fn max_rate_runtime(&self) -> String {
        self.join("consumers-rate/runtime")
    }

    /// `node` is the `group.topic$subscription` name.
    pub fn max_rate_subscription(&self, node: &str) -> String {
        self.join(&format!("consumers-rate/runtime/{node}"))
    }

    pub fn max_rate_consumer(&self, node: &str, consumer: &str) -> String {
        self.join(&format!("consumers-rate/runtime/{node}/{consumer}"))
    }

    pub fn consumer_clusters(&self) -> String {
        self.join("consumers-workload")
    }

    pub fn registry_nodes(&self, cluster: &str) -> String {
        self.join(&format!("consumers-workload/{cluster}/registry/nodes"))
    }
}

/// A topic node found while walking the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicRef {
    pub group: String,
    pub topic: String,
}

impl TopicRef {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.group, self.topic)
    }

    pub fn path(&self, layout: &TreeLayout) -> String {
        layout.topic(&self.group, &self.topic)
    }
}

/// A subscription node found while walking the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionRef {
    pub group: String,
    pub topic: String,
    pub name: String,
}

impl SubscriptionRef {
    /// `group.topic$subscription`
    pub fn node_name(&self) -> String {
        subscription_node_name(&self.group, &self.topic, &self.name)
    }

    pub fn path(&self, layout: &TreeLayout) -> String {
        layout.subscription(&self.group, &self.topic, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_under_default_prefix() {
        let l = TreeLayout::new("/run/hermes/");
        assert_eq!(l.prefix(), "/run/hermes");
        assert_eq!(l.groups(), "/run/hermes/groups");
        assert_eq!(
            l.subscription("g", "t", "s"),
            "/run/hermes/groups/g/topics/t/subscriptions/s"
        );
        assert_eq!(
            l.max_rate_consumer("g.t$s", "c1"),
            "/run/hermes/consumers-rate/runtime/g.t$s/c1"
        );
        assert_eq!(
            l.registry_nodes("dc1"),
            "/run/hermes/consumers-workload/dc1/registry/nodes"
        );
    }

    #[test]
    fn root_prefix_does_not_double_slash() {
        let l = TreeLayout::new("/");
        assert_eq!(l.groups(), "/groups");
    }

    #[test]
    fn subscription_ref_node_name() {
        let s = SubscriptionRef {
            group: "pl.allegro".to_string(),
            topic: "orders".to_string(),
            name: "billing".to_string(),
        };
        assert_eq!(s.node_name(), "pl.allegro.orders$billing");
    }
}
