//! Reasoning payload parser.
//!
//! The chat backend answers with an envelope whose `response` field is itself a JSON
//! document. [`parse_envelope`] unwraps the envelope, [`parse`] validates the embedded
//! document into a [`ReasoningRecord`]. Both fail closed.

use serde_json::Value;

use crate::{
    domain::ReasoningRecord,
    error::ParseError,
    protocol::{EmbeddedRecordPayload, StageIdValue},
};

const LIST_FIELDS: [&str; 4] = ["thoughts", "actions", "action_inputs", "observations"];

/// Decode a full response body (`{"response": "<embedded json>"}`).
pub fn parse_envelope(body: &[u8]) -> Result<ReasoningRecord, ParseError> {
    let Value::Object(mut fields) = serde_json::from_slice::<Value>(body)? else {
        return Err(ParseError::malformed("response body is not a JSON object"));
    };
    match fields.remove("response") {
        None | Some(Value::Null) => Err(ParseError::missing("response")),
        Some(Value::String(raw)) => parse(&raw),
        Some(other) => Err(ParseError::malformed(format!(
            "`response` must be a string carrying the embedded record, found {}",
            json_type_name(&other)
        ))),
    }
}

/// Validate the embedded reasoning document.
pub fn parse(raw: &str) -> Result<ReasoningRecord, ParseError> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(ParseError::malformed(format!(
            "embedded record must be a JSON object, found {}",
            json_type_name(&value)
        )));
    }
    for field in LIST_FIELDS {
        match value.get(field) {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
            Some(other) => {
                return Err(ParseError {
                    field: Some(field),
                    ..ParseError::malformed(format!(
                        "`{field}` must be a list of strings, found {}",
                        json_type_name(other)
                    ))
                });
            }
        }
    }
    let payload: EmbeddedRecordPayload = serde_json::from_value(value)?;

    let final_response = payload
        .final_response
        .ok_or_else(|| ParseError::missing("final_response"))?;
    let stage_id = payload
        .current_stage_id
        .map(StageIdValue::into_text)
        .ok_or_else(|| ParseError::missing("current_stage_id"))?;
    let stage_label = payload
        .current_conversation_stage
        .ok_or_else(|| ParseError::missing("current_conversation_stage"))?;

    Ok(ReasoningRecord::new(
        stage_id,
        stage_label,
        payload.customer_information,
        payload.thoughts.unwrap_or_default(),
        payload.actions.unwrap_or_default(),
        payload.action_inputs.unwrap_or_default(),
        payload.observations.unwrap_or_default(),
        payload.final_thought,
        final_response,
    ))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{domain::CUSTOMER_SUMMARY_NOT_AVAILABLE, error::ParseErrorKind};

    fn envelope(record: &Value) -> Vec<u8> {
        json!({ "response": record.to_string() }).to_string().into_bytes()
    }

    #[test]
    fn recovers_every_populated_field() {
        let raw = json!({
            "current_stage_id": "4",
            "current_conversation_stage": "Solution Recommendation",
            "customer_information": "Name: Lan, wants a linen shirt",
            "thoughts": ["Customer named a size", "Check stock"],
            "actions": ["ProductSearch"],
            "action_inputs": ["linen shirt M"],
            "observations": ["2 items in stock"],
            "final_thought": "Recommend the white one",
            "final_response": "We have two linen shirts in M."
        })
        .to_string();

        let record = parse(&raw).expect("valid record");
        assert_eq!(record.stage_id, "4");
        assert_eq!(record.stage_label, "Solution Recommendation");
        assert_eq!(
            record.customer_summary.as_deref(),
            Some("Name: Lan, wants a linen shirt")
        );
        assert_eq!(record.thoughts, vec!["Customer named a size", "Check stock"]);
        assert_eq!(record.actions, vec!["ProductSearch"]);
        assert_eq!(record.action_inputs, vec!["linen shirt M"]);
        assert_eq!(record.observations, vec!["2 items in stock"]);
        assert_eq!(record.final_thought.as_deref(), Some("Recommend the white one"));
        assert_eq!(record.final_response, "We have two linen shirts in M.");
    }

    #[test]
    fn absent_lists_become_empty_sequences() {
        let raw = r#"{"final_response":"Hi there","current_stage_id":"1","current_conversation_stage":"greeting"}"#;
        let record = parse(raw).expect("valid record");
        assert_eq!(record.stage_id, "1");
        assert!(record.thoughts.is_empty());
        assert!(record.actions.is_empty());
        assert!(record.action_inputs.is_empty());
        assert!(record.observations.is_empty());
        assert_eq!(record.final_thought, None);
    }

    #[test]
    fn absent_customer_information_differs_from_empty() {
        let absent = parse(
            r#"{"final_response":"a","current_stage_id":"1","current_conversation_stage":"g"}"#,
        )
        .expect("absent");
        let empty = parse(
            r#"{"final_response":"a","current_stage_id":"1","current_conversation_stage":"g","customer_information":""}"#,
        )
        .expect("empty");

        assert_eq!(absent.customer_summary, None);
        assert_eq!(absent.customer_summary_display(), CUSTOMER_SUMMARY_NOT_AVAILABLE);
        assert_eq!(empty.customer_summary.as_deref(), Some(""));
        assert_eq!(empty.customer_summary_display(), "");
    }

    #[test]
    fn accepts_backend_field_aliases_and_numeric_stage() {
        let raw = r#"{"final_response":"ok","current_conversation_stage_id":2,"current_conversation_stage":"Lead Qualification","customer_information_summary":"unknown name"}"#;
        let record = parse(raw).expect("aliased record");
        assert_eq!(record.stage_id, "2");
        assert_eq!(record.customer_summary.as_deref(), Some("unknown name"));
    }

    #[test]
    fn missing_final_response_is_missing_field() {
        let err = parse(r#"{"current_stage_id":"1","current_conversation_stage":"greeting"}"#)
            .expect_err("must fail");
        assert_eq!(err.kind, ParseErrorKind::MissingField);
        assert_eq!(err.field, Some("final_response"));
    }

    #[test]
    fn null_final_response_counts_as_missing() {
        let err = parse(
            r#"{"final_response":null,"current_stage_id":"1","current_conversation_stage":"g"}"#,
        )
        .expect_err("must fail");
        assert!(err.is_missing_field());
    }

    #[test]
    fn missing_stage_fields_are_rejected() {
        let err = parse(r#"{"final_response":"hi","current_conversation_stage":"g"}"#)
            .expect_err("must fail");
        assert_eq!(err.field, Some("current_stage_id"));

        let err =
            parse(r#"{"final_response":"hi","current_stage_id":"1"}"#).expect_err("must fail");
        assert_eq!(err.field, Some("current_conversation_stage"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = parse("DaisyBot: hello there").expect_err("must fail");
        assert_eq!(err.kind, ParseErrorKind::MalformedJson);
    }

    #[test]
    fn non_object_and_wrongly_typed_fields_are_malformed() {
        assert_eq!(
            parse(r#"["final_response"]"#).expect_err("array").kind,
            ParseErrorKind::MalformedJson
        );
        let err = parse(
            r#"{"final_response":"a","current_stage_id":"1","current_conversation_stage":"g","thoughts":"one"}"#,
        )
        .expect_err("thoughts not a list");
        assert_eq!(err.kind, ParseErrorKind::MalformedJson);
        assert_eq!(err.field, Some("thoughts"));

        let err = parse(
            r#"{"final_response":"a","current_stage_id":"1","current_conversation_stage":"g","observations":["ok",3]}"#,
        )
        .expect_err("non-string element");
        assert_eq!(err.field, Some("observations"));
        assert_eq!(
            parse(
                r#"{"final_response":"a","current_stage_id":true,"current_conversation_stage":"g"}"#
            )
            .expect_err("boolean stage id")
            .kind,
            ParseErrorKind::MalformedJson
        );
    }

    #[test]
    fn envelope_unwraps_string_within_string() {
        let body = envelope(&json!({
            "final_response": "Hi there",
            "current_stage_id": "1",
            "current_conversation_stage": "greeting"
        }));
        let record = parse_envelope(&body).expect("valid envelope");
        assert_eq!(record.final_response, "Hi there");
    }

    #[test]
    fn envelope_failures_are_classified() {
        assert_eq!(
            parse_envelope(b"<html>502</html>").expect_err("html").kind,
            ParseErrorKind::MalformedJson
        );
        assert_eq!(
            parse_envelope(br#"{"detail":"boom"}"#)
                .expect_err("no response")
                .field,
            Some("response")
        );
        assert_eq!(
            parse_envelope(br#"{"response":{"final_response":"x"}}"#)
                .expect_err("object instead of string")
                .kind,
            ParseErrorKind::MalformedJson
        );
        assert_eq!(
            parse_envelope(br#"{"response":"not json"}"#)
                .expect_err("embedded garbage")
                .kind,
            ParseErrorKind::MalformedJson
        );
    }

    #[test]
    fn sections_skip_empty_lists_but_keep_customer_sentinel() {
        let record = parse(
            r#"{"final_response":"a","current_stage_id":"1","current_conversation_stage":"Greeting","actions":["Lookup"]}"#,
        )
        .expect("record");
        let labels: Vec<_> = record.sections().iter().map(|s| s.label).collect();
        assert_eq!(
            labels,
            vec!["Conversation Stage", "Customer Information", "Actions"]
        );
        assert_eq!(record.sections()[1].items[0], CUSTOMER_SUMMARY_NOT_AVAILABLE);
        assert!(!record.sections()[1].numbered);
        assert!(record.sections()[2].numbered);
    }
}
