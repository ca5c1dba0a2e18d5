use std::path::Path;

use learn_core::Catalog;

use crate::error::CatalogLoadError;

/// Document formats accepted for catalog files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Toml,
    Json,
}

impl CatalogFormat {
    /// Picks the format from the file extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Returns the catalog validation error for malformed documents.
    pub fn parse(self, source: &str) -> Result<Catalog, learn_core::CatalogError> {
        match self {
            Self::Toml => Catalog::from_toml_str(source),
            Self::Json => Catalog::from_json_str(source),
        }
    }
}

/// Reads and validates a catalog file.
///
/// # Errors
///
/// Returns `CatalogLoadError::UnsupportedFormat` for unknown extensions,
/// `CatalogLoadError::Io` if the file cannot be read, and
/// `CatalogLoadError::Catalog` if the definition is malformed.
pub async fn load_catalog_file(path: &Path) -> Result<Catalog, CatalogLoadError> {
    let format = CatalogFormat::from_path(path)
        .ok_or_else(|| CatalogLoadError::UnsupportedFormat(path.to_path_buf()))?;
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let catalog = format.parse(&source).inspect_err(|err| {
        tracing::warn!(path = %path.display(), error = %err, "rejected malformed catalog");
    })?;
    tracing::info!(
        path = %path.display(),
        modules = catalog.module_count(),
        exercises = catalog.exercise_count(),
        "loaded catalog"
    );
    Ok(catalog)
}
