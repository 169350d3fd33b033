use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Broker fields this crate does not interpret, kept verbatim.
pub type Passthrough = Map<String, Value>;

/// Which control-plane collection an entity lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Group,
    Topic,
    Schema,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Group => "group",
            EntityKind::Topic => "topic",
            EntityKind::Schema => "schema",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level namespace owning one or more topics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_team: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl Group {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            contact: None,
            support_team: None,
            extra: Passthrough::new(),
        }
    }
}

/// Retention window of a topic. `duration` is in the broker's unit; the
/// unit itself travels in the passthrough bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetentionTime {
    pub duration: i64,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl RetentionTime {
    pub fn new(duration: i64) -> Self {
        Self {
            duration,
            extra: Passthrough::new(),
        }
    }
}

/// A named message stream, identified by its qualified `group.topic` name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_time: Option<RetentionTime>,
    /// Outer `Option` is key presence; `Some(None)` is an explicit `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub migrated_from_json_type: Option<Option<bool>>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            retention_time: None,
            migrated_from_json_type: None,
            extra: Passthrough::new(),
        }
    }
}

/// Reads a field whose key is present, keeping an explicit `null` apart
/// from a missing key (which `default` leaves as `None`).
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Schema document attached to a topic.
///
/// The content is opaque (Avro JSON, binary, ...) and is re-posted byte for
/// byte with the content type the source reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    pub topic: String,
    pub content: Vec<u8>,
    pub content_type: Option<String>,
}

/// Owner reference stored on topics and subscriptions in the coordination tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub source: String,
    pub id: String,
}

impl Owner {
    pub fn new(source: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            id: id.into(),
        }
    }

    /// Placeholder read for nodes that carry no owner at all.
    pub fn unknown() -> Self {
        Self::new("unknown", "unknown")
    }
}

impl std::fmt::Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.source, self.id)
    }
}
