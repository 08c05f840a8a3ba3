pub mod backend;
pub mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend, StorageError};
pub use store::{LoadState, Notice, RequestStore, StoreError, STORAGE_KEY};
