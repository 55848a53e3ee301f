//! Validation of structured JSON produced by an upstream vision model.

use serde_json::Value;

use crate::error::PipelineError;
use crate::model::StructuredRecord;

const REQUIRED_PATHS: &[&[&str]] = &[
    &["clean_hindi_text"],
    &["structured_data", "police_station"],
    &["structured_data", "incident_timing"],
    &["structured_data", "people_involved", "accused"],
    &["structured_data", "people_involved", "victim"],
];

/// Parses the model's reply into a record, refusing to fill in defaults for
/// required keys. Failures carry the offending text.
///
/// Required leaf values may be JSON null or the "Null" sentinel, but the keys
/// themselves must be present.
pub fn parse_upstream_record(raw: &str) -> Result<StructuredRecord, PipelineError> {
    let malformed = |reason: String| PipelineError::MalformedUpstream {
        reason,
        raw: raw.to_string(),
    };

    let body = strip_code_fence(raw);
    let mut value: Value =
        serde_json::from_str(body).map_err(|err| malformed(format!("invalid JSON: {err}")))?;

    if !value.is_object() {
        return Err(malformed("top-level value is not an object".to_string()));
    }
    for path in REQUIRED_PATHS {
        if lookup(&value, path).is_none() {
            return Err(malformed(format!("missing required key `{}`", path.join("."))));
        }
    }
    if !value["clean_hindi_text"].is_string() {
        return Err(malformed("`clean_hindi_text` is not a string".to_string()));
    }

    stringify_additional_fields(&mut value);
    serde_json::from_value(value).map_err(|err| malformed(format!("unexpected shape: {err}")))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

/// Models occasionally emit numbers, lists or nulls as additional field values.
fn stringify_additional_fields(value: &mut Value) {
    let Some(fields) = value
        .get_mut("structured_data")
        .and_then(|data| data.get_mut("additional_fields"))
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    fields.retain(|_, field| !field.is_null());
    for field in fields.values_mut() {
        if !field.is_string() {
            *field = Value::String(match &*field {
                Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string).unwrap_or_else(|| item.to_string()))
                    .collect::<Vec<String>>()
                    .join(", "),
                other => other.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "clean_hindi_text": "थाना: कोतवाली",
        "structured_data": {
            "police_station": "कोतवाली, दिल्ली",
            "incident_timing": "Null",
            "people_involved": { "accused": "राम कुमार", "victim": null },
            "additional_fields": { "FIR Number": "123/2024", "Pages": 3, "District": null }
        },
        "entities": { "persons": ["राम कुमार"], "locations": [], "dates": [] }
    }"#;

    #[test]
    fn accepts_fenced_json_and_normalizes_sentinels() {
        let fenced = format!("```json\n{VALID}\n```");
        let record = parse_upstream_record(&fenced).unwrap();

        let data = &record.structured_data;
        assert_eq!(data.police_station.as_deref(), Some("कोतवाली, दिल्ली"));
        assert_eq!(data.incident_timing, None);
        assert_eq!(data.people_involved.victim, None);
        assert_eq!(data.additional_fields.get("Pages"), Some("3"));
        assert_eq!(data.additional_fields.get("District"), None);
        assert!(record.entities.persons.contains("राम कुमार"));
    }

    #[test]
    fn additional_fields_keep_the_model_order() {
        let raw = r#"{
            "clean_hindi_text": "x",
            "structured_data": {
                "police_station": "A",
                "incident_timing": "B",
                "people_involved": { "accused": "C", "victim": "D" },
                "additional_fields": { "Location": "गांधी नगर", "FIR Number": "7/2024", "District": "दक्षिण" }
            }
        }"#;
        let record = parse_upstream_record(raw).unwrap();
        assert_eq!(
            record.structured_data.additional_fields.keys().collect::<Vec<_>>(),
            vec!["Location", "FIR Number", "District"]
        );
    }

    #[test]
    fn invalid_json_keeps_the_raw_text() {
        let error = parse_upstream_record("Sorry, I cannot read this image.").unwrap_err();
        match error {
            PipelineError::MalformedUpstream { reason, raw } => {
                assert!(reason.starts_with("invalid JSON"));
                assert_eq!(raw, "Sorry, I cannot read this image.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let raw = r#"{ "clean_hindi_text": "x", "structured_data": { "police_station": "A", "people_involved": { "accused": "B", "victim": "C" } } }"#;
        let error = parse_upstream_record(raw).unwrap_err();
        assert!(error.to_string().contains("structured_data.incident_timing"));
    }

    #[test]
    fn non_object_reply_is_rejected() {
        assert!(matches!(
            parse_upstream_record("[1, 2]"),
            Err(PipelineError::MalformedUpstream { .. })
        ));
    }
}
