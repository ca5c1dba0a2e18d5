#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod model;
pub mod progress;
pub mod query;
pub mod time;

pub use catalog::{Catalog, CatalogError, LookupError};
pub use error::Error;
pub use progress::{
    Completion, ProgressError, ProgressMap, ProgressRecord, ProgressSnapshot, ProgressTracker,
};
pub use query::{CompletionRatio, ModuleProgress};
pub use time::Clock;
