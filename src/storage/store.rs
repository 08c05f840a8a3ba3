//! The request store
//!
//! [`RequestStore`] owns the list of service requests. It loads the list once
//! from a [`StorageBackend`], hands out read-only views, and rewrites the
//! whole list after every mutation.
//!
//! In-memory state is authoritative. A failed write does not roll anything
//! back; it queues a [`Notice`] for the caller to show, and the next
//! successful write brings storage back in line.

use std::cmp::Reverse;

use uuid::Uuid;

use crate::{
    domain::{validate_collection, CollectionError, NewServiceRequest, ServiceRequest, Status},
    storage::{StorageBackend, StorageError},
};

/// The fixed key the request list is stored under.
pub const STORAGE_KEY: &str = "civiclog_servicerequests";

/// Where the store is in its startup sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// The stored list has not been read yet.
    #[default]
    Loading,
    /// The list is loaded and can be read and mutated.
    Ready,
    /// Storage could not be read. The store stays empty and read-only so that
    /// the unreadable value is never overwritten.
    Failed(String),
}

/// A one-shot message for the user about something the store did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Changes could not be written to storage. They are kept in memory.
    SaveFailed(String),
    /// A request was deleted.
    Deleted(Uuid),
}

/// Errors returned by store mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store has not finished loading, or loading failed.
    #[error("request store is not ready ({0:?})")]
    NotReady(LoadState),
}

/// Why a stored value was thrown away during load.
#[derive(Debug, thiserror::Error)]
enum Corruption {
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] CollectionError),
}

/// The single source of truth for the list of service requests.
#[derive(Debug)]
pub struct RequestStore<B> {
    backend: B,
    state: LoadState,
    requests: Vec<ServiceRequest>,
    notices: Vec<Notice>,
}

impl<B: StorageBackend> RequestStore<B> {
    /// Creates a store over `backend`. Nothing is read until [`Self::load`].
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            state: LoadState::Loading,
            requests: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Reads the stored list and makes the store ready.
    ///
    /// - No stored value: the store starts empty.
    /// - A value that is not a valid list of requests (any single bad entry
    ///   counts): the value is deleted from storage, a warning is logged, and
    ///   the store starts empty.
    /// - A valid list: it is sorted newest first.
    /// - Storage cannot be read: the store moves to [`LoadState::Failed`].
    ///
    /// Loading happens once; later calls do nothing.
    pub fn load(&mut self) -> &LoadState {
        if self.state != LoadState::Loading {
            tracing::debug!("Request store already loaded, ignoring load");
            return &self.state;
        }

        let outcome = self.backend.get(STORAGE_KEY);
        self.transition(outcome);
        &self.state
    }

    fn transition(&mut self, outcome: Result<Option<Vec<u8>>, StorageError>) {
        match outcome {
            Ok(None) => {
                tracing::debug!("No stored requests, starting empty");
                self.requests.clear();
                self.state = LoadState::Ready;
            }
            Ok(Some(bytes)) => {
                match parse_snapshot(&bytes) {
                    Ok(mut requests) => {
                        requests.sort_by_key(|request| Reverse(request.submission_date));
                        tracing::debug!("Loaded {} stored requests", requests.len());
                        self.requests = requests;
                    }
                    Err(e) => {
                        tracing::warn!("Invalid data in storage, clearing: {e}");
                        if let Err(e) = self.backend.remove(STORAGE_KEY) {
                            tracing::error!("Failed to clear invalid stored requests: {e}");
                        }
                        self.requests.clear();
                    }
                }
                self.state = LoadState::Ready;
            }
            Err(e) => {
                tracing::error!("Failed to read stored requests: {e}");
                self.requests.clear();
                self.state = LoadState::Failed(e.to_string());
            }
        }
    }

    /// The current load state.
    #[must_use]
    pub const fn state(&self) -> &LoadState {
        &self.state
    }

    /// Whether the stored list is still being read.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    /// All requests, newest first.
    #[must_use]
    pub fn requests(&self) -> &[ServiceRequest] {
        &self.requests
    }

    /// Looks up a request by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&ServiceRequest> {
        self.requests.iter().find(|request| request.id == id)
    }

    /// Finds requests whose id starts with `prefix` (case-insensitive,
    /// hyphens included).
    #[must_use]
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&ServiceRequest> {
        let prefix = prefix.trim().to_ascii_lowercase();
        self.requests
            .iter()
            .filter(|request| request.id.hyphenated().to_string().starts_with(&prefix))
            .collect()
    }

    /// Logs a new request and puts it at the head of the list.
    ///
    /// The request gets a fresh id, the current time, and status
    /// [`Status::Open`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotReady`] if the store is not loaded.
    pub fn create(&mut self, request: NewServiceRequest) -> Result<ServiceRequest, StoreError> {
        self.ensure_ready()?;

        let request = ServiceRequest::new(request);
        tracing::debug!(id = %request.id, category = %request.category, "Logging request");
        self.requests.insert(0, request.clone());
        self.persist();
        Ok(request)
    }

    /// Changes the status of the request with the given id.
    ///
    /// Returns whether a request was found. An unknown id changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotReady`] if the store is not loaded.
    pub fn update_status(&mut self, id: Uuid, status: Status) -> Result<bool, StoreError> {
        self.ensure_ready()?;

        let found = self
            .requests
            .iter_mut()
            .find(|request| request.id == id)
            .map(|request| request.status = status)
            .is_some();
        if !found {
            tracing::debug!(%id, "No request to update");
        }
        self.persist();
        Ok(found)
    }

    /// Deletes the request with the given id.
    ///
    /// Returns whether a request was found. An unknown id changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotReady`] if the store is not loaded.
    pub fn remove(&mut self, id: Uuid) -> Result<bool, StoreError> {
        self.ensure_ready()?;

        let before = self.requests.len();
        self.requests.retain(|request| request.id != id);
        let found = self.requests.len() != before;
        self.persist();
        if found {
            self.notices.push(Notice::Deleted(id));
        } else {
            tracing::debug!(%id, "No request to delete");
        }
        Ok(found)
    }

    /// Drains the queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Consumes the store, returning its backend.
    #[must_use]
    pub fn into_backend(self) -> B {
        self.backend
    }

    fn ensure_ready(&self) -> Result<(), StoreError> {
        match self.state {
            LoadState::Ready => Ok(()),
            ref state => Err(StoreError::NotReady(state.clone())),
        }
    }

    /// Writes the full list, overwriting the previous value.
    fn persist(&mut self) {
        let result = serde_json::to_vec(&self.requests)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                self.backend
                    .set(STORAGE_KEY, &bytes)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => tracing::debug!("Saved {} requests", self.requests.len()),
            Err(reason) => {
                tracing::error!("Failed to save service requests: {reason}");
                self.notices.push(Notice::SaveFailed(reason));
            }
        }
    }
}

fn parse_snapshot(bytes: &[u8]) -> Result<Vec<ServiceRequest>, Corruption> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(validate_collection(&value)?)
}
