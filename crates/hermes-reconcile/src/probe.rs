//! Remote state prober.
//!
//! Read-only. Classifies a destination read into a decision-table input.
//! `Absent` and `Corrupted` are expected outcomes; only transport faults
//! surface as `Err`, and those abort the current entity only.

use hermes_model::EntityKind;
use serde::Serialize;
use tracing::debug;

use crate::{ApiError, ApiResponse, ManagementApi};

/// Destination state of a group or topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProbeResult {
    /// 404
    Absent,
    /// 500: stored data is malformed and must be purged.
    Corrupted,
    /// 200
    Present,
    /// Any other status.
    Unexpected { code: u16, body: String },
}

impl ProbeResult {
    pub fn classify(resp: &ApiResponse) -> Self {
        match resp.status {
            200 => ProbeResult::Present,
            404 => ProbeResult::Absent,
            500 => ProbeResult::Corrupted,
            code => ProbeResult::Unexpected {
                code,
                body: resp.body_text(),
            },
        }
    }
}

/// Destination state of a topic's schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchemaProbe {
    /// 204: topic exists and has no schema attached.
    NoContent,
    /// 200
    Attached,
    /// 404: the topic itself is missing.
    Absent,
    Unexpected { code: u16, body: String },
}

impl SchemaProbe {
    pub fn classify(resp: &ApiResponse) -> Self {
        match resp.status {
            204 => SchemaProbe::NoContent,
            200 => SchemaProbe::Attached,
            404 => SchemaProbe::Absent,
            code => SchemaProbe::Unexpected {
                code,
                body: resp.body_text(),
            },
        }
    }
}

/// Probe a group or topic on `api`.
pub fn probe<A: ManagementApi + ?Sized>(
    api: &A,
    kind: EntityKind,
    name: &str,
) -> Result<ProbeResult, ApiError> {
    let resp = api.read(kind, name)?;
    let result = ProbeResult::classify(&resp);
    debug!(endpoint = api.endpoint(), %kind, name, status = resp.status, ?result, "probed");
    Ok(result)
}

/// Probe the schema attached to `topic` on `api`.
pub fn probe_schema<A: ManagementApi + ?Sized>(
    api: &A,
    topic: &str,
) -> Result<SchemaProbe, ApiError> {
    let resp = api.read(EntityKind::Schema, topic)?;
    let result = SchemaProbe::classify(&resp);
    debug!(endpoint = api.endpoint(), topic, status = resp.status, ?result, "probed schema");
    Ok(result)
}
