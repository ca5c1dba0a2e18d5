#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_loader;
pub mod config;
pub mod error;
pub mod progress_service;

pub use learn_core::Clock;

pub use app_services::AppServices;
pub use catalog_loader::{CatalogFormat, load_catalog_file};
pub use config::{LearnConfig, ProgressBackend};
pub use error::{AppServicesError, CatalogLoadError, ConfigError, ProgressServiceError};
pub use progress_service::{ProgressOverview, ProgressService};
