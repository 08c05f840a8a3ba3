//! AI-suggested status for new service requests.
//!
//! The predictor is advisory. It never touches the request store; new
//! requests always start [`Status::Open`] whatever it suggests.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::Status;

/// Generative Language API backend.
pub mod gemini;
/// Prompt rendering and response parsing.
pub mod prompt;

pub use gemini::GeminiBackend;
pub use prompt::{build_prompt, output_schema, parse_suggestion, PredictionRequest};

/// Reference text describing typical turnaround times per category.
pub const HISTORICAL_CITY_DATA: &str = "Pothole repairs are typically addressed within 5-7 \
     business days. Graffiti removal is faster, usually within 48 hours. Streetlight issues can \
     take up to 2 weeks if a part needs to be ordered. Noise complaints are logged and reviewed, \
     but immediate status changes are rare.";

/// Errors from a prediction.
#[derive(Error, Debug)]
pub enum PredictError {
    /// The request never got a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("server returned {status}: {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnosis.
        body: String,
    },

    /// The structured output was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend returned no suggestion.
    #[error("AI did not return a prediction")]
    MissingSuggestion,

    /// The backend returned something other than a known status.
    #[error("AI returned an unknown status: {0}")]
    InvalidSuggestion(String),

    /// The predictor is not configured.
    #[error("predictor is not configured: {0}")]
    NotConfigured(String),
}

/// A service that completes a prompt with structured output.
pub trait CompletionBackend {
    /// Sends one request and returns the structured output.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or its response
    /// cannot be decoded.
    fn complete(&self, request: &PredictionRequest) -> Result<Value, PredictError>;
}

/// Suggests a likely status for a request description.
pub struct StatusPredictor<C> {
    backend: C,
}

impl<C: CompletionBackend> StatusPredictor<C> {
    /// Creates a predictor over the given backend.
    #[must_use]
    pub const fn new(backend: C) -> Self {
        Self { backend }
    }

    /// Asks the backend for a suggested status.
    ///
    /// Makes exactly one backend call. Failures are returned as-is; there is
    /// no retry and no fallback status.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or does not return one of the
    /// four statuses.
    pub fn predict(
        &self,
        description: &str,
        historical_context: &str,
    ) -> Result<Status, PredictError> {
        let request = PredictionRequest::new(description, historical_context);

        let result = self
            .backend
            .complete(&request)
            .and_then(|output| parse_suggestion(&output));

        match &result {
            Ok(status) => info!(%status, "status suggested"),
            Err(e) => warn!("AI prediction failed: {e}"),
        }
        result
    }
}

impl StatusPredictor<GeminiBackend> {
    /// Builds a predictor from configuration, reading the API key from the
    /// configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`PredictError::NotConfigured`] if the API key is not set.
    pub fn from_config(config: &crate::domain::PredictorConfig) -> Result<Self, PredictError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            PredictError::NotConfigured(format!("{} is not set", config.api_key_env))
        })?;

        let backend = GeminiBackend::new(
            &config.endpoint,
            config.model.clone(),
            api_key,
            config.timeout(),
        )?;
        Ok(Self::new(backend))
    }
}
