//! Local-first civic service request tracking
//!
//! Service requests (potholes, broken streetlights, ...) are kept in a small
//! key-value store owned by a single client, with an optional AI-suggested
//! status for new requests.

pub mod domain;
pub use domain::{Category, Config, NewServiceRequest, ServiceRequest, Status, Violation};

/// Key-value persistence and the request store built on top of it.
pub mod storage;
pub use storage::{FileBackend, LoadState, MemoryBackend, Notice, RequestStore, StorageBackend};

/// AI-assisted status suggestion.
pub mod predict;
pub use predict::{PredictError, StatusPredictor};
