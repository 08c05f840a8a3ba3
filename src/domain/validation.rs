//! Schema validation for persisted service requests.
//!
//! Stored data is untrusted: it may have been written by an older version, by
//! hand, or truncated by a failed write. Records are therefore checked field
//! by field from a raw JSON value rather than deserialised directly, so that
//! every violated invariant can be reported at once.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{Category, Description, ServiceRequest, Status};

/// A single broken invariant of a service request record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// The record is not a JSON object.
    #[error("record is not an object")]
    NotAnObject,

    /// A required field is absent.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A field is present but is not a string.
    #[error("field '{0}' must be a string")]
    NotAString(&'static str),

    /// The id is not a UUID.
    #[error("invalid id '{0}'")]
    InvalidId(String),

    /// The description is shorter than the minimum length.
    #[error("description must be at least 10 characters long (got {len})")]
    DescriptionTooShort {
        /// The length of the rejected description, in characters.
        len: usize,
    },

    /// The category is not one of the known categories.
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    /// The status is not one of the known statuses.
    #[error("unknown status '{0}'")]
    UnknownStatus(String),

    /// The submission date is not an RFC 3339 timestamp.
    #[error("invalid submission date '{0}'")]
    InvalidDate(String),
}

/// The outcome of validating a single record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The record satisfies every invariant.
    Valid(ServiceRequest),
    /// The record breaks at least one invariant.
    Invalid(Vec<Violation>),
}

impl Validation {
    /// Converts into a `Result`, for use with `?`.
    ///
    /// # Errors
    ///
    /// Returns the violations if the record was invalid.
    pub fn into_result(self) -> Result<ServiceRequest, Vec<Violation>> {
        match self {
            Self::Valid(request) => Ok(request),
            Self::Invalid(violations) => Err(violations),
        }
    }
}

/// Reasons a stored collection is rejected as a whole.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    /// The stored value is not a JSON array.
    #[error("stored value is not an array")]
    NotAnArray,

    /// An entry breaks the record schema.
    #[error("entry {index} is invalid: {}", join(.violations))]
    InvalidEntry {
        /// Position of the entry in the stored array.
        index: usize,
        /// Everything wrong with the entry.
        violations: Vec<Violation>,
    },

    /// Two entries share an id.
    #[error("entry {index} reuses id {id}")]
    DuplicateId {
        /// Position of the second entry with this id.
        index: usize,
        /// The repeated id.
        id: Uuid,
    },
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates one record against the service request schema.
///
/// Unknown keys are ignored.
///
/// `submissionDate` accepts anything RFC 3339 allows, not only the `Z` form
/// this crate writes: numeric offsets (converted to UTC), a space in place
/// of the `T` separator, and lowercase `t` and `z`.
#[must_use]
pub fn validate(value: &Value) -> Validation {
    let Some(record) = value.as_object() else {
        return Validation::Invalid(vec![Violation::NotAnObject]);
    };

    let mut violations = Vec::new();

    let id = string_field(record, "id", &mut violations).and_then(|raw| {
        Uuid::parse_str(raw)
            .map_err(|_| violations.push(Violation::InvalidId(raw.to_string())))
            .ok()
    });

    let description = string_field(record, "description", &mut violations).and_then(|raw| {
        Description::try_from(raw)
            .map_err(|violation| violations.push(violation))
            .ok()
    });

    let category = string_field(record, "category", &mut violations).and_then(|raw| {
        raw.parse::<Category>()
            .ok()
            .filter(|category| category.as_str() == raw)
            .or_else(|| {
                violations.push(Violation::UnknownCategory(raw.to_string()));
                None
            })
    });

    let submission_date =
        string_field(record, "submissionDate", &mut violations).and_then(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|date| date.with_timezone(&Utc))
                .map_err(|_| violations.push(Violation::InvalidDate(raw.to_string())))
                .ok()
        });

    let status = string_field(record, "status", &mut violations).and_then(|raw| {
        raw.parse::<Status>()
            .ok()
            .filter(|status| status.as_str() == raw)
            .or_else(|| {
                violations.push(Violation::UnknownStatus(raw.to_string()));
                None
            })
    });

    match (id, description, category, submission_date, status) {
        (Some(id), Some(description), Some(category), Some(submission_date), Some(status))
            if violations.is_empty() =>
        {
            Validation::Valid(ServiceRequest {
                id,
                description,
                category,
                submission_date,
                status,
            })
        }
        _ => Validation::Invalid(violations),
    }
}

/// Validates a whole stored collection.
///
/// The collection is accepted only if it is an array, every entry is valid,
/// and no two entries share an id.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate_collection(value: &Value) -> Result<Vec<ServiceRequest>, CollectionError> {
    let entries = value.as_array().ok_or(CollectionError::NotAnArray)?;

    let mut seen = HashSet::with_capacity(entries.len());
    let mut requests = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let request = validate(entry)
            .into_result()
            .map_err(|violations| CollectionError::InvalidEntry { index, violations })?;

        if !seen.insert(request.id) {
            return Err(CollectionError::DuplicateId {
                index,
                id: request.id,
            });
        }

        requests.push(request);
    }

    Ok(requests)
}

fn string_field<'a>(
    record: &'a Map<String, Value>,
    field: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<&'a str> {
    match record.get(field) {
        None | Some(Value::Null) => {
            violations.push(Violation::MissingField(field));
            None
        }
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            violations.push(Violation::NotAString(field));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid_record() -> Value {
        json!({
            "id": "8d7f4c1e-2b7a-4f0e-9a51-6f0d2c3b4a59",
            "description": "Pothole on Main St near 1st Ave",
            "category": "Pothole Repair",
            "submissionDate": "2024-05-01T09:30:00.000Z",
            "status": "Open",
        })
    }

    #[test]
    fn accepts_valid_record() {
        let Validation::Valid(request) = validate(&valid_record()) else {
            panic!("expected a valid record");
        };
        assert_eq!(request.category, Category::PotholeRepair);
        assert_eq!(request.status, Status::Open);
        assert_eq!(
            request.submission_date,
            "2024-05-01T09:30:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn accepts_any_rfc3339_date_form() {
        let expected = "2024-05-01T09:30:00Z".parse::<DateTime<Utc>>().unwrap();
        for date in [
            "2024-05-01T11:30:00+02:00",
            "2024-05-01 09:30:00Z",
            "2024-05-01t09:30:00z",
        ] {
            let mut record = valid_record();
            record["submissionDate"] = json!(date);
            let Validation::Valid(request) = validate(&record) else {
                panic!("expected {date} to be accepted");
            };
            assert_eq!(request.submission_date, expected);
        }
    }

    #[test]
    fn ignores_unknown_keys() {
        let mut record = valid_record();
        record["priority"] = json!("high");
        assert!(matches!(validate(&record), Validation::Valid(_)));
    }

    #[test]
    fn reports_all_violations() {
        let record = json!({
            "id": "not-a-uuid",
            "description": "short",
            "category": "Sinkhole",
            "submissionDate": "yesterday",
            "status": 3,
        });

        assert_eq!(
            validate(&record),
            Validation::Invalid(vec![
                Violation::InvalidId("not-a-uuid".to_string()),
                Violation::DescriptionTooShort { len: 5 },
                Violation::UnknownCategory("Sinkhole".to_string()),
                Violation::InvalidDate("yesterday".to_string()),
                Violation::NotAString("status"),
            ])
        );
    }

    #[test]
    fn stored_enums_must_use_canonical_names() {
        let mut record = valid_record();
        record["status"] = json!("in-progress");
        assert_eq!(
            validate(&record),
            Validation::Invalid(vec![Violation::UnknownStatus("in-progress".to_string())])
        );
    }

    #[test]
    fn missing_and_null_fields_are_reported() {
        let mut record = valid_record();
        record.as_object_mut().unwrap().remove("category");
        record["status"] = Value::Null;
        assert_eq!(
            validate(&record),
            Validation::Invalid(vec![
                Violation::MissingField("category"),
                Violation::MissingField("status"),
            ])
        );
    }

    #[test]
    fn non_object_record_is_rejected() {
        assert_eq!(
            validate(&json!("hello")),
            Validation::Invalid(vec![Violation::NotAnObject])
        );
    }

    #[test]
    fn collection_must_be_an_array() {
        assert_eq!(
            validate_collection(&valid_record()),
            Err(CollectionError::NotAnArray)
        );
    }

    #[test]
    fn one_bad_entry_rejects_the_collection() {
        let mut bad = valid_record();
        bad["id"] = json!("3f2b8a90-1c4d-4e5f-8a6b-7c8d9e0f1a2b");
        bad["description"] = json!("short");

        let error = validate_collection(&json!([valid_record(), bad])).unwrap_err();
        assert_eq!(
            error,
            CollectionError::InvalidEntry {
                index: 1,
                violations: vec![Violation::DescriptionTooShort { len: 5 }],
            }
        );
    }

    #[test]
    fn duplicate_ids_reject_the_collection() {
        let error = validate_collection(&json!([valid_record(), valid_record()])).unwrap_err();
        assert!(matches!(error, CollectionError::DuplicateId { index: 1, .. }));
    }

    #[test]
    fn empty_array_is_a_valid_collection() {
        assert_eq!(validate_collection(&json!([])), Ok(Vec::new()));
    }
}
