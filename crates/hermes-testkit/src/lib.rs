//! In-memory stand-ins for the management service and the coordination
//! tree. Used ONLY by tests.

mod management;
mod tree;

pub use management::{FakeManagement, RecordedWrite};
pub use tree::MemoryTree;

use hermes_model::{Group, RetentionTime, Topic};
use serde_json::json;

/// A source group the way legacy clusters return it: no contact, no support team.
pub fn legacy_group(name: &str) -> Group {
    Group::new(name)
}

/// A source topic with the legacy quirks the sanitizer must fix.
pub fn legacy_topic(name: &str) -> Topic {
    let mut t = Topic::new(name);
    t.retention_time = Some(RetentionTime::new(0));
    t.migrated_from_json_type = Some(Some(true));
    t.extra.insert("contentType".to_string(), json!("AVRO"));
    t
}
