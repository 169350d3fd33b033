use crate::{Action, ProbeResult, SchemaAction, SchemaProbe};

/// Decision table for groups and topics.
///
/// | destination | action |
/// |---|---|
/// | Absent | Create |
/// | Corrupted | DeleteThenCreate |
/// | Present | Patch |
/// | Unexpected(code) | Abort |
pub fn decide(probe: &ProbeResult) -> Action {
    match probe {
        ProbeResult::Absent => Action::Create,
        ProbeResult::Corrupted => Action::DeleteThenCreate,
        ProbeResult::Present => Action::Patch,
        ProbeResult::Unexpected { code, body } => Action::Abort {
            code: Some(*code),
            detail: body.clone(),
        },
    }
}

/// Schema migration guard.
///
/// Schemas are immutable once attached: they are only seeded onto topics the
/// current run created, and only when the destination reports no schema.
pub fn decide_schema(
    topic_newly_created: bool,
    source_has_schema: bool,
    destination: &SchemaProbe,
) -> SchemaAction {
    if !source_has_schema {
        return SchemaAction::skip("source topic has no schema");
    }
    if !topic_newly_created {
        return SchemaAction::skip("destination topic was not created by this run");
    }
    match destination {
        SchemaProbe::NoContent => SchemaAction::Create,
        SchemaProbe::Attached => SchemaAction::skip("destination already has a schema"),
        SchemaProbe::Absent => SchemaAction::skip("destination topic not found"),
        SchemaProbe::Unexpected { code, body } => SchemaAction::Abort {
            code: Some(*code),
            detail: body.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_probe_result_has_exactly_one_action() {
        assert_eq!(decide(&ProbeResult::Absent), Action::Create);
        assert_eq!(decide(&ProbeResult::Corrupted), Action::DeleteThenCreate);
        assert_eq!(decide(&ProbeResult::Present), Action::Patch);
        assert_eq!(
            decide(&ProbeResult::Unexpected {
                code: 418,
                body: "teapot".to_string()
            }),
            Action::Abort {
                code: Some(418),
                detail: "teapot".to_string()
            }
        );
    }

    #[test]
    fn schema_created_only_when_all_three_hold() {
        assert_eq!(
            decide_schema(true, true, &SchemaProbe::NoContent),
            SchemaAction::Create
        );
    }

    #[test]
    fn schema_suppressed_when_topic_existed() {
        assert!(decide_schema(false, true, &SchemaProbe::NoContent).is_skip());
    }

    #[test]
    fn schema_suppressed_when_destination_not_empty() {
        assert!(decide_schema(true, true, &SchemaProbe::Attached).is_skip());
        assert!(decide_schema(true, true, &SchemaProbe::Absent).is_skip());
    }

    #[test]
    fn schema_suppressed_when_source_has_none() {
        assert!(decide_schema(true, false, &SchemaProbe::NoContent).is_skip());
    }

    #[test]
    fn schema_unexpected_probe_aborts() {
        let a = decide_schema(
            true,
            true,
            &SchemaProbe::Unexpected {
                code: 502,
                body: String::new(),
            },
        );
        assert!(matches!(a, SchemaAction::Abort { code: Some(502), .. }));
    }
}
