use std::path::Path;

use clap::Parser;
use tracing::instrument;

use super::{
    list::OutputFormat,
    open_store, resolve_id,
    terminal::{status_badge, Colorize},
};

#[derive(Debug, Parser)]
pub struct Show {
    /// The request id (a full UUID or a unique prefix).
    id: String,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Show {
    #[instrument(skip(root))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let store = open_store(root)?;
        let id = resolve_id(&store, &self.id)?;
        let Some(request) = store.get(id) else {
            anyhow::bail!("Request {id} not found");
        };

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(request)?),
            OutputFormat::Table => {
                println!("{}", request.category.to_string().info());
                println!("{} {}", label("Id:"), request.id);
                println!("{} {}", label("Status:"), status_badge(request.status, 0));
                println!(
                    "{} {}",
                    label("Submitted:"),
                    request.submission_date.format("%b %-d, %Y %H:%M UTC")
                );
                println!();
                println!("{}", request.description);
            }
        }
        Ok(())
    }
}

/// A field label, padded before it is coloured so that escape codes do not
/// count towards the width.
fn label(text: &str) -> String {
    format!("{text:<10}").dim()
}
