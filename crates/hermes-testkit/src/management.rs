use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use hermes_model::{EntityKind, Group, Topic};
use hermes_reconcile::{ApiError, ApiResponse, ManagementApi, Payload, WriteOp};
use serde_json::Value;

/// One mutating call received by a [`FakeManagement`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedWrite {
    pub op: WriteOp,
    pub kind: EntityKind,
    pub name: String,
}

#[derive(Default)]
struct State {
    groups: Vec<(String, Value)>,
    topics: Vec<(String, Value)>,
    schemas: BTreeMap<String, (Vec<u8>, Option<String>)>,
    corrupted: BTreeSet<(EntityKind, String)>,
    forced_reads: BTreeMap<(EntityKind, String), u16>,
    forced_writes: BTreeMap<(WriteOp, EntityKind, String), u16>,
    unreachable: BTreeSet<(EntityKind, String)>,
    list_failure: Option<u16>,
    writes: Vec<RecordedWrite>,
}

impl State {
    fn collection(&mut self, kind: EntityKind) -> &mut Vec<(String, Value)> {
        match kind {
            EntityKind::Group => &mut self.groups,
            _ => &mut self.topics,
        }
    }

    fn find(&self, kind: EntityKind, name: &str) -> Option<&Value> {
        let items = match kind {
            EntityKind::Group => &self.groups,
            _ => &self.topics,
        };
        items.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    fn upsert(&mut self, kind: EntityKind, name: &str, value: Value) {
        let items = self.collection(kind);
        match items.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => items.push((name.to_string(), value)),
        }
    }

    fn remove(&mut self, kind: EntityKind, name: &str) -> bool {
        let items = self.collection(kind);
        let before = items.len();
        items.retain(|(n, _)| n != name);
        before != items.len()
    }
}

/// In-memory management endpoint.
///
/// Reads answer the way the real service does: 200 with the stored JSON,
/// 404 when missing, 500 for entities marked corrupted. A topic's schema
/// reads 200 when attached, 204 when the topic exists without one.
/// Every mutating call is recorded.
pub struct FakeManagement {
    label: String,
    state: RefCell<State>,
}

impl FakeManagement {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: RefCell::new(State::default()),
        }
    }

    // --- seeding ---------------------------------------------------------

    pub fn with_group(self, group: &Group) -> Self {
        self.put_raw(EntityKind::Group, &group.group_name, to_value(group));
        self
    }

    pub fn with_topic(self, topic: &Topic) -> Self {
        self.put_raw(EntityKind::Topic, &topic.name, to_value(topic));
        self
    }

    pub fn with_schema(self, topic: &str, content: &[u8]) -> Self {
        self.state
            .borrow_mut()
            .schemas
            .insert(topic.to_string(), (content.to_vec(), None));
        self
    }

    /// Store arbitrary JSON, bypassing the typed records.
    pub fn put_raw(&self, kind: EntityKind, name: &str, value: Value) {
        self.state.borrow_mut().upsert(kind, name, value);
    }

    /// Listed, but reads answer 500 until the entity is deleted or re-created.
    pub fn corrupt(&self, kind: EntityKind, name: &str) {
        let mut s = self.state.borrow_mut();
        if s.find(kind, name).is_none() {
            s.upsert(kind, name, Value::Null);
        }
        s.corrupted.insert((kind, name.to_string()));
    }

    /// Every read of the entity answers `status`.
    pub fn force_read(&self, kind: EntityKind, name: &str, status: u16) {
        self.state
            .borrow_mut()
            .forced_reads
            .insert((kind, name.to_string()), status);
    }

    /// The given write is recorded but rejected with `status`.
    pub fn reject_write(&self, op: WriteOp, kind: EntityKind, name: &str, status: u16) {
        self.state
            .borrow_mut()
            .forced_writes
            .insert((op, kind, name.to_string()), status);
    }

    /// Every call addressing the entity fails at the transport level.
    pub fn unreachable(&self, kind: EntityKind, name: &str) {
        self.state
            .borrow_mut()
            .unreachable
            .insert((kind, name.to_string()));
    }

    /// Listing calls answer `status`.
    pub fn fail_listing(&self, status: u16) {
        self.state.borrow_mut().list_failure = Some(status);
    }

    // --- inspection ------------------------------------------------------

    pub fn group(&self, name: &str) -> Option<Value> {
        self.state.borrow().find(EntityKind::Group, name).cloned()
    }

    pub fn topic(&self, name: &str) -> Option<Value> {
        self.state.borrow().find(EntityKind::Topic, name).cloned()
    }

    pub fn schema(&self, topic: &str) -> Option<Vec<u8>> {
        self.state.borrow().schemas.get(topic).map(|(c, _)| c.clone())
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.state.borrow().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.borrow().writes.len()
    }

    pub fn clear_writes(&self) {
        self.state.borrow_mut().writes.clear();
    }

    // --- internals -------------------------------------------------------

    fn check_reachable(&self, kind: EntityKind, name: &str) -> Result<(), ApiError> {
        if self
            .state
            .borrow()
            .unreachable
            .contains(&(kind, name.to_string()))
        {
            return Err(ApiError::Transport(format!(
                "{}: connection reset ({kind} {name})",
                self.label
            )));
        }
        Ok(())
    }

    /// Records the write; returns the forced rejection, if any.
    fn record(&self, op: WriteOp, kind: EntityKind, name: &str) -> Option<ApiResponse> {
        let mut s = self.state.borrow_mut();
        s.writes.push(RecordedWrite {
            op,
            kind,
            name: name.to_string(),
        });
        s.forced_writes
            .get(&(op, kind, name.to_string()))
            .map(|status| ApiResponse::new(*status, "{\"message\":\"rejected\"}"))
    }
}

fn to_value<T: serde::Serialize>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}

fn decode(payload: &Payload) -> Result<Value, ApiError> {
    serde_json::from_slice(&payload.body).map_err(|e| ApiError::Codec(e.to_string()))
}

impl ManagementApi for FakeManagement {
    fn endpoint(&self) -> &str {
        &self.label
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<String>, ApiError> {
        let s = self.state.borrow();
        if let Some(status) = s.list_failure {
            return Err(ApiError::Status {
                status,
                body: "listing unavailable".to_string(),
            });
        }
        let items = match kind {
            EntityKind::Group => &s.groups,
            EntityKind::Topic => &s.topics,
            EntityKind::Schema => {
                return Err(ApiError::Config("schemas are not listable".to_string()))
            }
        };
        Ok(items.iter().map(|(n, _)| n.clone()).collect())
    }

    fn read(&self, kind: EntityKind, name: &str) -> Result<ApiResponse, ApiError> {
        self.check_reachable(kind, name)?;
        let s = self.state.borrow();
        if let Some(status) = s.forced_reads.get(&(kind, name.to_string())) {
            return Ok(ApiResponse::new(*status, "forced"));
        }
        if kind == EntityKind::Schema {
            if s.find(EntityKind::Topic, name).is_none() {
                return Ok(ApiResponse::new(404, ""));
            }
            return Ok(match s.schemas.get(name) {
                Some((content, ct)) => ApiResponse {
                    status: 200,
                    body: content.clone(),
                    content_type: ct.clone(),
                },
                None => ApiResponse::new(204, ""),
            });
        }
        if s.corrupted.contains(&(kind, name.to_string())) {
            return Ok(ApiResponse::new(500, "{\"message\":\"internal error\"}"));
        }
        match s.find(kind, name) {
            Some(v) => Ok(ApiResponse::new(200, v.to_string())),
            None => Ok(ApiResponse::new(404, "")),
        }
    }

    fn create(&self, kind: EntityKind, name: &str, payload: &Payload) -> Result<ApiResponse, ApiError> {
        self.check_reachable(kind, name)?;
        if let Some(rejected) = self.record(WriteOp::Create, kind, name) {
            return Ok(rejected);
        }
        let mut s = self.state.borrow_mut();
        if kind == EntityKind::Schema {
            if s.find(EntityKind::Topic, name).is_none() {
                return Ok(ApiResponse::new(404, ""));
            }
            s.schemas.insert(
                name.to_string(),
                (payload.body.clone(), Some(payload.content_type.clone())),
            );
            return Ok(ApiResponse::new(201, ""));
        }
        let value = decode(payload)?;
        s.corrupted.remove(&(kind, name.to_string()));
        s.upsert(kind, name, value);
        Ok(ApiResponse::new(201, ""))
    }

    fn replace(&self, kind: EntityKind, name: &str, payload: &Payload) -> Result<ApiResponse, ApiError> {
        self.check_reachable(kind, name)?;
        if let Some(rejected) = self.record(WriteOp::Replace, kind, name) {
            return Ok(rejected);
        }
        let mut s = self.state.borrow_mut();
        if s.find(kind, name).is_none() {
            return Ok(ApiResponse::new(404, ""));
        }
        let value = decode(payload)?;
        s.upsert(kind, name, value);
        Ok(ApiResponse::new(200, ""))
    }

    fn delete(&self, kind: EntityKind, name: &str) -> Result<ApiResponse, ApiError> {
        self.check_reachable(kind, name)?;
        if let Some(rejected) = self.record(WriteOp::Delete, kind, name) {
            return Ok(rejected);
        }
        let mut s = self.state.borrow_mut();
        s.corrupted.remove(&(kind, name.to_string()));
        if s.remove(kind, name) {
            Ok(ApiResponse::new(200, ""))
        } else {
            Ok(ApiResponse::new(404, ""))
        }
    }
}
