//! hermes-model
//!
//! Control-plane entity records shared by the migration engine and the
//! coordination-tree tools.
//!
//! - Records keep every broker field they do not understand in a passthrough
//!   bag so a read-then-write cycle never drops data.
//! - `sanitize` is the only place definitions are normalized before a write.
//!
//! Pure data. No IO.

mod entity;
mod naming;
mod sanitize;

pub use entity::*;
pub use naming::{group_of_topic, subscription_node_name, QualifiedTopicName};
pub use sanitize::{
    Sanitize, DEFAULT_CONTACT, DEFAULT_DESCRIPTION, DEFAULT_SUPPORT_TEAM, MIN_RETENTION_DURATION,
};
