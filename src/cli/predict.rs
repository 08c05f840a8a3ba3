use std::path::Path;

use civiclog::{
    domain::{PredictorConfig, MIN_DESCRIPTION_LEN},
    PredictError, Status, StatusPredictor,
};
use clap::Parser;
use tracing::instrument;

use super::{load_config, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Predict {
    /// The draft description to get a suggestion for.
    description: String,
}

impl Predict {
    #[instrument(skip(root))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        ensure_long_enough(&self.description)?;

        let config = load_config(root);
        match suggest(&config.predictor, &self.description) {
            Ok(status) => print_suggestion(status),
            Err(e) => {
                print_failure(&e);
                anyhow::bail!("AI prediction failed");
            }
        }
        Ok(())
    }
}

/// Refuses descriptions too short to give a useful prediction.
pub fn ensure_long_enough(description: &str) -> anyhow::Result<()> {
    if description.chars().count() < MIN_DESCRIPTION_LEN {
        anyhow::bail!(
            "Description too short: please enter a description of at least \
             {MIN_DESCRIPTION_LEN} characters for an AI prediction"
        );
    }
    Ok(())
}

/// Runs a single prediction with the configured backend.
pub fn suggest(config: &PredictorConfig, description: &str) -> Result<Status, PredictError> {
    StatusPredictor::from_config(config)?.predict(description, config.historical_context())
}

pub fn print_suggestion(status: Status) {
    println!(
        "{} Based on the description, the status is likely to be '{}'.",
        "Intelligent prediction:".info(),
        status
    );
    println!("{}", "New requests are always 'Open' initially.".dim());
}

pub fn print_failure(error: &PredictError) {
    eprintln!(
        "{}",
        format!("⚠️  Could not get an AI prediction at this time ({error})").warning()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_descriptions_are_refused_before_any_call() {
        assert!(ensure_long_enough("too short").is_err());
        assert!(ensure_long_enough("long enough!").is_ok());
    }

    #[test]
    fn missing_api_key_is_a_prediction_failure() {
        let config = PredictorConfig {
            api_key_env: "CIVICLOG_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..PredictorConfig::default()
        };
        let error = suggest(&config, "Pothole on Main St near 1st Ave").unwrap_err();
        assert!(matches!(error, PredictError::NotConfigured(_)));
    }
}
