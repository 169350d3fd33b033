//! Sanitizer: normalize a source definition before it is written to a
//! destination.
//!
//! String fields holding an explicit `null` count as missing and get the
//! sentinel, so a written definition always carries a string there.
//!
//! Every rule touches a disjoint field, so rule order does not matter and
//! `x.sanitize().sanitize() == x.sanitize()`.

use crate::{Group, RetentionTime, Schema, Topic};

pub const DEFAULT_CONTACT: &str = "undefined";
pub const DEFAULT_SUPPORT_TEAM: &str = "undefined";
pub const DEFAULT_DESCRIPTION: &str = "no description";
pub const MIN_RETENTION_DURATION: i64 = 1;

/// Total, pure normalization of an entity definition.
pub trait Sanitize: Sized {
    fn sanitize(self) -> Self;
}

impl Sanitize for Group {
    fn sanitize(mut self) -> Self {
        if self.contact.is_none() {
            self.contact = Some(DEFAULT_CONTACT.to_string());
        }
        if self.support_team.is_none() {
            self.support_team = Some(DEFAULT_SUPPORT_TEAM.to_string());
        }
        self
    }
}

impl Sanitize for Topic {
    fn sanitize(mut self) -> Self {
        // Legacy JSON-type topics are never created through migration.
        // A present key is forced even when it holds `null`.
        if self.migrated_from_json_type.is_some() {
            self.migrated_from_json_type = Some(Some(false));
        }
        if self.description.is_none() {
            self.description = Some(DEFAULT_DESCRIPTION.to_string());
        }
        match self.retention_time.as_mut() {
            Some(rt) if rt.duration < MIN_RETENTION_DURATION => {
                rt.duration = MIN_RETENTION_DURATION;
            }
            Some(_) => {}
            None => self.retention_time = Some(RetentionTime::new(MIN_RETENTION_DURATION)),
        }
        self
    }
}

impl Sanitize for Schema {
    fn sanitize(self) -> Self {
        self
    }
}
