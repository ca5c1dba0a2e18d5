use std::env;
use std::path::PathBuf;

use learn_core::model::LearnerId;

use crate::error::ConfigError;

pub const CATALOG_PATH_VAR: &str = "LEARN_CATALOG_PATH";
pub const LEARNER_ID_VAR: &str = "LEARN_LEARNER_ID";
pub const BACKEND_VAR: &str = "LEARN_PROGRESS_BACKEND";
pub const DB_URL_VAR: &str = "LEARN_DB_URL";
pub const PROGRESS_PATH_VAR: &str = "LEARN_PROGRESS_PATH";

const DEFAULT_CATALOG_PATH: &str = "catalog.toml";
const DEFAULT_LEARNER_ID: &str = "default";
const DEFAULT_DB_URL: &str = "sqlite:learn.sqlite3";
const DEFAULT_PROGRESS_PATH: &str = "progress.json";

/// Where learner progress is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressBackend {
    Sqlite { database_url: String },
    JsonFile { path: PathBuf },
    InMemory,
}

/// Runtime settings for assembling the progress services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnConfig {
    pub catalog_path: PathBuf,
    pub learner_id: LearnerId,
    pub backend: ProgressBackend,
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<String> {
    lookup(var).filter(|value| !value.trim().is_empty())
}

impl LearnConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Reads configuration through `lookup`; unset or blank variables fall
    /// back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an invalid learner id or an unknown backend.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let catalog_path = non_blank(&lookup, CATALOG_PATH_VAR)
            .unwrap_or_else(|| DEFAULT_CATALOG_PATH.into())
            .into();

        let raw_learner =
            non_blank(&lookup, LEARNER_ID_VAR).unwrap_or_else(|| DEFAULT_LEARNER_ID.into());
        let learner_id = LearnerId::new(&raw_learner).map_err(|e| ConfigError::Invalid {
            var: LEARNER_ID_VAR,
            value: raw_learner.clone(),
            reason: e.to_string(),
        })?;

        let raw_backend = non_blank(&lookup, BACKEND_VAR).unwrap_or_else(|| "sqlite".into());
        let backend = match raw_backend.trim().to_ascii_lowercase().as_str() {
            "sqlite" => ProgressBackend::Sqlite {
                database_url: non_blank(&lookup, DB_URL_VAR)
                    .unwrap_or_else(|| DEFAULT_DB_URL.into()),
            },
            "json" => ProgressBackend::JsonFile {
                path: non_blank(&lookup, PROGRESS_PATH_VAR)
                    .unwrap_or_else(|| DEFAULT_PROGRESS_PATH.into())
                    .into(),
            },
            "memory" => ProgressBackend::InMemory,
            _ => {
                return Err(ConfigError::Invalid {
                    var: BACKEND_VAR,
                    value: raw_backend,
                    reason: "expected sqlite, json or memory".into(),
                });
            }
        };

        Ok(Self {
            catalog_path,
            learner_id,
            backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn parse(pairs: &[(&str, &str)]) -> Result<LearnConfig, ConfigError> {
        let vars = vars(pairs);
        LearnConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("catalog.toml"));
        assert_eq!(config.learner_id.as_str(), "default");
        assert_eq!(
            config.backend,
            ProgressBackend::Sqlite {
                database_url: "sqlite:learn.sqlite3".into()
            }
        );
    }

    #[test]
    fn selects_json_backend_with_path() {
        let config = parse(&[
            (BACKEND_VAR, "JSON"),
            (PROGRESS_PATH_VAR, "/tmp/ada.json"),
            (LEARNER_ID_VAR, "ada"),
            (CATALOG_PATH_VAR, "swiftui.toml"),
        ])
        .unwrap();
        assert_eq!(
            config.backend,
            ProgressBackend::JsonFile {
                path: PathBuf::from("/tmp/ada.json")
            }
        );
        assert_eq!(config.learner_id.as_str(), "ada");
        assert_eq!(config.catalog_path, PathBuf::from("swiftui.toml"));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = parse(&[(BACKEND_VAR, "memory"), (LEARNER_ID_VAR, "  ")]).unwrap();
        assert_eq!(config.backend, ProgressBackend::InMemory);
        assert_eq!(config.learner_id.as_str(), "default");
    }

    #[test]
    fn rejects_unknown_backend_and_bad_learner() {
        let err = parse(&[(BACKEND_VAR, "redis")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: BACKEND_VAR, .. }));

        let err = parse(&[(LEARNER_ID_VAR, "ada lovelace")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: LEARNER_ID_VAR, .. }));
    }
}
