//! Prompt construction and response parsing
//!
//! Both halves are pure: the prompt is a function of the description and the
//! reference text, and the response is checked against the closed status set
//! without any coercion.

use serde_json::{json, Value};

use crate::{domain::Status, predict::PredictError};

/// The field the backend must fill in.
pub const SUGGESTION_FIELD: &str = "suggestedStatus";

/// Everything sent to the completion backend for one prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    /// The rendered instructions.
    pub prompt: String,
    /// JSON schema the structured output must conform to.
    pub output_schema: Value,
}

impl PredictionRequest {
    /// Builds a request for the given description and reference text.
    #[must_use]
    pub fn new(description: &str, historical_context: &str) -> Self {
        Self {
            prompt: build_prompt(description, historical_context),
            output_schema: output_schema(),
        }
    }
}

fn status_names() -> Vec<&'static str> {
    Status::ALL.iter().map(|status| status.as_str()).collect()
}

/// Renders the instructions for the backend.
#[must_use]
pub fn build_prompt(description: &str, historical_context: &str) -> String {
    let options = status_names().join(", ");
    format!(
        "You are an AI assistant helping residents understand the likely status of their \
         service request.\n\n\
         Based on the following service request description and historical city data, suggest \
         a likely status for the service request. The status must be one of the following \
         options: {options}.\n\n\
         Service Request Description: {description}\n\n\
         Historical City Data: {historical_context}\n\n\
         Consider the historical city data when predicting the status. For example, if the \
         historical data shows that most pothole repairs are completed within 3 days, and the \
         service request is for a pothole repair that was submitted 2 days ago, then the status \
         is likely to be In Progress.\n\
         The suggested status:\n"
    )
}

/// The declared shape of the structured output:
/// `{ "suggestedStatus": <one of the statuses> }`.
#[must_use]
pub fn output_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            SUGGESTION_FIELD: {
                "type": "STRING",
                "enum": status_names(),
                "description": "The suggested status for the service request.",
            },
        },
        "required": [SUGGESTION_FIELD],
    })
}

/// Extracts the suggested status from the backend's structured output.
///
/// Only an exact status name is accepted.
///
/// # Errors
///
/// Returns [`PredictError::MissingSuggestion`] if the field is absent or
/// null, and [`PredictError::InvalidSuggestion`] if it is anything other
/// than one of the status names.
pub fn parse_suggestion(output: &Value) -> Result<Status, PredictError> {
    let suggestion = match output.get(SUGGESTION_FIELD) {
        None | Some(Value::Null) => return Err(PredictError::MissingSuggestion),
        Some(value) => value,
    };

    suggestion
        .as_str()
        .and_then(|name| Status::ALL.into_iter().find(|status| status.as_str() == name))
        .ok_or_else(|| PredictError::InvalidSuggestion(suggestion.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_includes_inputs_and_options() {
        let prompt = build_prompt("Pothole on Main St", "Potholes take a week.");
        assert!(prompt.contains("Service Request Description: Pothole on Main St"));
        assert!(prompt.contains("Historical City Data: Potholes take a week."));
        assert!(prompt.contains("Open, In Progress, Closed, Rejected"));
    }

    #[test]
    fn schema_constrains_to_status_set() {
        let schema = output_schema();
        assert_eq!(
            schema["properties"]["suggestedStatus"]["enum"],
            json!(["Open", "In Progress", "Closed", "Rejected"])
        );
        assert_eq!(schema["required"], json!(["suggestedStatus"]));
        assert_eq!(schema["type"], json!("OBJECT"));
        assert_eq!(schema["properties"]["suggestedStatus"]["type"], json!("STRING"));
    }

    #[test]
    fn parses_each_status() {
        for status in Status::ALL {
            let output = json!({ "suggestedStatus": status.as_str() });
            assert_eq!(parse_suggestion(&output).unwrap(), status);
        }
    }

    #[test]
    fn missing_suggestion_is_an_error() {
        assert!(matches!(
            parse_suggestion(&json!({})),
            Err(PredictError::MissingSuggestion)
        ));
        assert!(matches!(
            parse_suggestion(&json!({ "suggestedStatus": null })),
            Err(PredictError::MissingSuggestion)
        ));
    }

    #[test]
    fn near_misses_are_not_coerced() {
        for output in [
            json!({ "suggestedStatus": "in progress" }),
            json!({ "suggestedStatus": "Pending" }),
            json!({ "suggestedStatus": 1 }),
        ] {
            assert!(matches!(
                parse_suggestion(&output),
                Err(PredictError::InvalidSuggestion(_))
            ));
        }
    }
}
