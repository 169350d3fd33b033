//! hermes-reconcile
//!
//! Structural reconciliation of control-plane metadata between two
//! management endpoints.
//!
//! Architectural decisions:
//! - The destination is probed fresh for every entity; nothing is cached across runs
//! - Probe results are values (`Absent`, `Corrupted`, `Present`, `Unexpected`), never errors
//! - A pure decision function maps each probe result to exactly one action
//! - Source definitions are sanitized before every write
//! - Dry-run evaluates every branch, including destination probes, and skips only the writes
//! - Failures are per entity; a run always completes with a report
//!
//! Single-threaded and sequential. Concurrent runs against the same
//! destination need external mutual exclusion.
//!
//! HTTP lives behind [`ManagementApi`]; this crate never opens a socket.

mod api;
mod decision;
mod orchestrator;
mod probe;
mod reconciler;
mod types;

pub use api::{ApiError, ApiResponse, ManagementApi, Payload};
pub use decision::{decide, decide_schema};
pub use orchestrator::{group_topics, topics_for_group, Migrator};
pub use probe::{probe, probe_schema, ProbeResult, SchemaProbe};
pub use reconciler::{EntityResult, Reconciler};
pub use types::*;
