//! Domain models for civic service requests.
//!
//! This module contains the core domain types: the service request itself,
//! its closed category and status sets, schema validation for persisted
//! records, and workspace configuration.

/// Service request domain model.
pub mod service_request;
pub use service_request::{
    Category, Description, NewServiceRequest, ServiceRequest, Status, UnknownCategory,
    UnknownStatus, MIN_DESCRIPTION_LEN,
};

/// Field-by-field validation of persisted records.
pub mod validation;
pub use validation::{validate, validate_collection, CollectionError, Validation, Violation};

mod config;
pub use config::{Config, ConfigError, PredictorConfig};
