use std::path::Path;

use clap::Parser;
use dialoguer::Confirm;
use tracing::instrument;

use super::{flush_notices, open_store, resolve_id, short_id, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Delete {
    /// The request id (a full UUID or a unique prefix).
    id: String,

    /// Skip confirmation prompts
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument(skip(root))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut store = open_store(root)?;
        let id = resolve_id(&store, &self.id)?;

        let Some(request) = store.get(id) else {
            println!("{}", format!("No request with id {id}, nothing deleted").dim());
            return Ok(());
        };

        if !self.yes {
            println!(
                "Will delete {} {}: {}",
                short_id(request),
                request.category,
                request.description
            );
            let proceed = Confirm::new()
                .with_prompt("Proceed?")
                .default(false)
                .interact()?;
            if !proceed {
                println!("Cancelled");
                return Ok(());
            }
        }

        store.remove(id)?;
        flush_notices(&mut store)
    }
}
