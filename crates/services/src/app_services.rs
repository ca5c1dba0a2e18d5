use std::sync::Arc;

use learn_core::Catalog;
use storage::repository::Storage;

use crate::Clock;
use crate::catalog_loader::load_catalog_file;
use crate::config::{LearnConfig, ProgressBackend};
use crate::error::AppServicesError;
use crate::progress_service::ProgressService;

/// Assembles app-facing services from a `LearnConfig`.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<Catalog>,
    storage: Storage,
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services using configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if configuration is invalid or any step of
    /// [`AppServices::bootstrap`] fails.
    pub async fn from_env(clock: Clock) -> Result<Self, AppServicesError> {
        let config = LearnConfig::from_env()?;
        Self::bootstrap(&config, clock).await
    }

    /// Load the catalog, open the configured storage backend and restore the
    /// learner's progress.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the catalog cannot be loaded, storage
    /// cannot be initialized, or stored progress cannot be read.
    pub async fn bootstrap(config: &LearnConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let catalog = Arc::new(load_catalog_file(&config.catalog_path).await?);
        let storage = open_storage(&config.backend).await?;
        Self::with_storage(config, catalog, storage, clock).await
    }

    /// Build services over an already loaded catalog and storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Progress` if stored progress cannot be read.
    pub async fn with_storage(
        config: &LearnConfig,
        catalog: Arc<Catalog>,
        storage: Storage,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let progress = ProgressService::open(
            config.learner_id.clone(),
            Arc::clone(&catalog),
            clock,
            Arc::clone(&storage.progress),
        )
        .await?;

        Ok(Self {
            catalog,
            storage,
            progress: Arc::new(progress),
        })
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }
}

async fn open_storage(backend: &ProgressBackend) -> Result<Storage, AppServicesError> {
    let storage = match backend {
        ProgressBackend::Sqlite { database_url } => Storage::sqlite(database_url).await?,
        ProgressBackend::JsonFile { path } => Storage::json_file(path.clone()),
        ProgressBackend::InMemory => Storage::in_memory(),
    };
    tracing::info!(?backend, "progress storage ready");
    Ok(storage)
}
