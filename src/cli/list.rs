use std::path::Path;

use civiclog::{Category, ServiceRequest, Status};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::instrument;

use super::{
    open_store, short_id,
    terminal::{is_narrow, status_badge, Colorize},
};

/// Command arguments for `civiclog list`.
#[derive(Debug, Parser, Default)]
#[command(about = "List service requests, newest first")]
pub struct List {
    /// Filter by status (comma-separated, e.g. open,in-progress).
    #[arg(long, value_delimiter = ',', value_parser = str::parse::<Status>, value_name = "STATUS")]
    status: Vec<Status>,

    /// Filter by category (comma-separated, e.g. pothole-repair).
    #[arg(long, value_delimiter = ',', value_parser = str::parse::<Category>, value_name = "CATEGORY")]
    category: Vec<Category>,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress headers and format rows for scripting.
    #[arg(long)]
    quiet: bool,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct Listing<'a> {
    total: usize,
    requests: Vec<&'a ServiceRequest>,
}

impl List {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let store = open_store(root)?;
        let total = store.requests().len();
        let rows = self.filter(store.requests());

        match self.output {
            OutputFormat::Json => {
                let listing = Listing {
                    total,
                    requests: rows,
                };
                println!("{}", serde_json::to_string_pretty(&listing)?);
            }
            OutputFormat::Table if self.quiet => {
                for request in rows {
                    println!(
                        "{}\t{}\t{}\t{}",
                        request.id, request.status, request.category, request.description
                    );
                }
            }
            OutputFormat::Table => {
                if total == 0 {
                    println!("No requests yet. Log your first one with 'civiclog add'.");
                } else if rows.is_empty() {
                    println!("No requests match the given filters.");
                } else {
                    render_table(&rows, total);
                }
            }
        }

        Ok(())
    }

    fn filter<'a>(&self, requests: &'a [ServiceRequest]) -> Vec<&'a ServiceRequest> {
        requests
            .iter()
            .filter(|request| self.status.is_empty() || self.status.contains(&request.status))
            .filter(|request| {
                self.category.is_empty() || self.category.contains(&request.category)
            })
            .collect()
    }
}

/// `MMM d, yyyy`, e.g. `Mar 4, 2024`.
fn display_date(request: &ServiceRequest) -> String {
    request.submission_date.format("%b %-d, %Y").to_string()
}

fn render_table(rows: &[&ServiceRequest], total: usize) {
    const STATUS_WIDTH: usize = 11;

    if is_narrow() {
        // Stacked output for narrow terminals
        for request in rows {
            println!(
                "{} {} {}",
                short_id(request).dim(),
                status_badge(request.status, 0),
                request.category
            );
            println!("  {}", request.description);
            println!("  {}", display_date(request).dim());
        }
    } else {
        println!(
            "{:<8}  {:<STATUS_WIDTH$}  {:<23}  {:<12}  Description",
            "Id", "Status", "Category", "Submitted"
        );
        for request in rows {
            println!(
                "{:<8}  {}  {:<23}  {:<12}  {}",
                short_id(request),
                status_badge(request.status, STATUS_WIDTH),
                request.category.as_str(),
                display_date(request),
                request.description
            );
        }
    }

    println!();
    if rows.len() == total {
        println!("{}", format!("{total} request(s)").dim());
    } else {
        println!("{}", format!("{} of {total} request(s)", rows.len()).dim());
    }
}
