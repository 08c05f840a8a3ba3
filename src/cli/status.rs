use std::path::Path;

use civiclog::Status;
use clap::Parser;
use tracing::instrument;

use super::{flush_notices, open_store, resolve_id, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct SetStatus {
    /// The request id (a full UUID or a unique prefix).
    id: String,

    /// The new status (open, in-progress, closed, rejected).
    #[arg(value_parser = str::parse::<Status>)]
    status: Status,
}

impl SetStatus {
    #[instrument(skip(root))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut store = open_store(root)?;
        let id = resolve_id(&store, &self.id)?;

        let found = store.update_status(id, self.status)?;
        flush_notices(&mut store)?;

        if found {
            println!(
                "{}",
                format!("✅ Request {id} is now '{}'", self.status).success()
            );
        } else {
            println!("{}", format!("No request with id {id}, nothing changed").dim());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use civiclog::NewServiceRequest;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn updates_status_by_prefix() {
        let tmp = tempdir().unwrap();
        let mut store = open_store(tmp.path()).unwrap();
        let request = store
            .create(
                NewServiceRequest::parse("Graffiti on the bus stop", Some("graffiti-removal"))
                    .unwrap(),
            )
            .unwrap();
        drop(store);

        SetStatus {
            id: request.id.to_string()[..8].to_string(),
            status: Status::InProgress,
        }
        .run(tmp.path())
        .unwrap();

        let store = open_store(tmp.path()).unwrap();
        let updated = store.get(request.id).unwrap();
        assert_eq!(updated.status, Status::InProgress);
        assert_eq!(updated.description, request.description);
    }
}
