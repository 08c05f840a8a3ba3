//! HTTP completion backend for the Generative Language API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::predict::{CompletionBackend, PredictError, PredictionRequest};

/// Blocking client for a `generateContent` endpoint.
pub struct GeminiBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiBackend {
    /// Create a new backend.
    ///
    /// `endpoint` should be like
    /// `https://generativelanguage.googleapis.com/v1beta` (no trailing slash
    /// needed).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, PredictError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

/// Builds the `generateContent` request body.
fn request_body(request: &PredictionRequest) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }],
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.output_schema,
        },
    })
}

/// Pulls the structured output out of a `generateContent` response.
fn extract_output(response: GenerateResponse) -> Result<Value, PredictError> {
    let text = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.text)
        .ok_or(PredictError::MissingSuggestion)?;

    Ok(serde_json::from_str(&text)?)
}

/// Maps a non-2xx response to [`PredictError::Server`], keeping the body.
fn server_error(status: reqwest::StatusCode, body: String) -> PredictError {
    PredictError::Server {
        status: status.as_u16(),
        body,
    }
}

impl CompletionBackend for GeminiBackend {
    fn complete(&self, request: &PredictionRequest) -> Result<Value, PredictError> {
        let url = self.url();
        info!(url = %url, "requesting status suggestion");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(server_error(status, resp.text().unwrap_or_default()));
        }

        extract_output(resp.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_trims_trailing_slash() {
        let backend = GeminiBackend::new(
            "https://example.test/v1beta/",
            "gemini-2.0-flash".into(),
            "key".into(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            backend.url(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn body_carries_prompt_and_schema() {
        let request = PredictionRequest::new("Pothole on Main St", "context");
        let body = request_body(&request);

        assert_eq!(body["contents"][0]["parts"][0]["text"], json!(request.prompt));
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert_eq!(
            body["generationConfig"]["responseSchema"],
            request.output_schema
        );
    }

    #[test]
    fn extracts_json_from_first_text_part() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "{\"suggestedStatus\": \"In Progress\"}" }],
                },
                "finishReason": "STOP",
            }],
        }))
        .unwrap();

        assert_eq!(
            extract_output(response).unwrap(),
            json!({ "suggestedStatus": "In Progress" })
        );
    }

    #[test]
    fn empty_response_has_no_suggestion() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            extract_output(response),
            Err(PredictError::MissingSuggestion)
        ));
    }

    #[test]
    fn non_json_text_is_an_error() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "In Progress" }] } }],
        }))
        .unwrap();
        assert!(matches!(
            extract_output(response),
            Err(PredictError::Json(_))
        ));
    }

    #[test]
    fn error_status_keeps_code_and_body() {
        let error = server_error(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            "{\"error\": {\"message\": \"overloaded\"}}".into(),
        );

        assert!(matches!(
            &error,
            PredictError::Server { status: 503, body } if body.contains("overloaded")
        ));
        assert!(error.to_string().starts_with("server returned 503"));
    }

    #[test]
    fn error_status_with_empty_body() {
        let error = server_error(reqwest::StatusCode::UNAUTHORIZED, String::new());
        assert_eq!(error.to_string(), "server returned 401: ");
    }
}
