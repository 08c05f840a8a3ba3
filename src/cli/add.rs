use std::path::Path;

use civiclog::{NewServiceRequest, Violation};
use clap::Parser;
use tracing::instrument;

use super::{flush_notices, load_config, open_store, predict, short_id, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Add {
    /// What is wrong, and where (at least 10 characters).
    description: String,

    /// The kind of issue (e.g. pothole-repair, streetlight-maintenance,
    /// graffiti-removal, trash-collection, noise-complaint, other).
    #[arg(long, short)]
    category: Option<String>,

    /// Ask the AI for a likely status before logging. The suggestion is
    /// advisory only.
    #[arg(long)]
    predict: bool,
}

impl Add {
    #[instrument(skip(root))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let request = match NewServiceRequest::parse(&self.description, self.category.as_deref()) {
            Ok(request) => request,
            Err(violations) => {
                for violation in &violations {
                    eprintln!("  {}: {}", field_of(violation), violation.to_string().warning());
                }
                anyhow::bail!("Invalid service request");
            }
        };

        if self.predict {
            let config = load_config(root);
            match predict::suggest(&config.predictor, &request.description) {
                Ok(status) => predict::print_suggestion(status),
                // The request is logged regardless.
                Err(e) => predict::print_failure(&e),
            }
        }

        let mut store = open_store(root)?;
        let request = store.create(request)?;
        flush_notices(&mut store)?;

        println!(
            "{}",
            format!(
                "✅ Request logged: {} {} ({})",
                short_id(&request),
                request.category,
                request.status
            )
            .success()
        );
        Ok(())
    }
}

/// The form field a violation belongs to.
const fn field_of(violation: &Violation) -> &'static str {
    match *violation {
        Violation::MissingField(field) | Violation::NotAString(field) => field,
        Violation::DescriptionTooShort { .. } => "description",
        Violation::UnknownCategory(_) => "category",
        Violation::UnknownStatus(_) => "status",
        Violation::InvalidId(_) => "id",
        Violation::InvalidDate(_) => "submissionDate",
        Violation::NotAnObject => "request",
    }
}
