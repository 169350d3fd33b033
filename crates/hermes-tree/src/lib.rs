//! hermes-tree
//!
//! Maintenance tools that work directly on the coordination-service tree
//! behind the management service:
//!
//! - [`maxrate`]: drop max-rate runtime nodes for subscriptions and consumers that no longer exist
//! - [`owner`]: reassign topic / subscription ownership from a CSV file
//! - [`support_team`]: backfill `supportTeam` on subscriptions that lack it
//!
//! All tools walk the tree sequentially and support a report-only mode.
//! The tree itself sits behind [`CoordinationTree`]; [`ZkTree`] is the
//! ZooKeeper implementation.

pub mod layout;
pub mod maxrate;
pub mod owner;
pub mod pacing;
pub mod support_team;
mod tree;
mod zookeeper;

pub use layout::{SubscriptionRef, TopicRef, TreeLayout};
pub use pacing::DeletePacing;
pub use tree::{ensure_prefix, walk_subscriptions, walk_topics, CoordinationTree};
pub use zookeeper::ZkTree;
