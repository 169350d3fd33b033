//! Qualified-name helpers.
//!
//! Topics are addressed as `group.topic` where the group itself may contain
//! dots; the topic is always the final segment. Subscriptions are addressed
//! as `group.topic$subscription`.

/// A topic name split into its owning group and local name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualifiedTopicName<'a> {
    pub group: &'a str,
    pub topic: &'a str,
}

impl<'a> QualifiedTopicName<'a> {
    /// Split on the last `.`. Names without a dot have no owning group.
    pub fn parse(qualified: &'a str) -> Option<Self> {
        let (group, topic) = qualified.rsplit_once('.')?;
        Some(Self { group, topic })
    }
}

impl std::fmt::Display for QualifiedTopicName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.group, self.topic)
    }
}

/// Owning group of a qualified topic name, if it has one.
pub fn group_of_topic(qualified: &str) -> Option<&str> {
    QualifiedTopicName::parse(qualified).map(|q| q.group)
}

/// Node name used by the max-rate runtime tree for a subscription.
pub fn subscription_node_name(group: &str, topic: &str, subscription: &str) -> String {
    format!("{group}.{topic}${subscription}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_group_keeps_all_but_last_segment() {
        let q = QualifiedTopicName::parse("pl.allegro.orders").unwrap();
        assert_eq!(q.group, "pl.allegro");
        assert_eq!(q.topic, "orders");
        assert_eq!(q.to_string(), "pl.allegro.orders");
    }

    #[test]
    fn name_without_dot_has_no_group() {
        assert_eq!(group_of_topic("orphan"), None);
    }

    #[test]
    fn subscription_node_name_format() {
        assert_eq!(subscription_node_name("a", "t1", "s"), "a.t1$s");
    }
}
