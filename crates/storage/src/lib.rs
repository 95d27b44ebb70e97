#![forbid(unsafe_code)]

pub mod catalog;
pub mod repository;
pub mod sqlite;

pub use catalog::{CatalogError, JsonCatalog};
pub use repository::{
    AppSettingsRepository, AttemptRepository, ContentRepository, InMemoryRepository, SaveAck,
    Storage, StorageError,
};
