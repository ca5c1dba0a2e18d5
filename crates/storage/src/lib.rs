#![forbid(unsafe_code)]

pub mod json_file;
pub mod repository;
pub mod sqlite;

pub use json_file::JsonFileProgressRepository;
pub use repository::{InMemoryProgressRepository, ProgressRepository, Storage, StorageError};
pub use sqlite::{SqliteInitError, SqliteProgressRepository};
