//! Serde shape of a catalog document.
//!
//! Every field is optional at this layer so that missing values surface as
//! `CatalogError::MissingField` naming the offending entry, instead of a
//! bare deserializer message.

use serde::{Deserialize, Serialize};

use crate::model::{
    Difficulty, Exercise, ExerciseError, ExerciseId, IdError, Module, ModuleError, ModuleId,
};

use super::CatalogError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    #[serde(default)]
    pub modules: Vec<ModuleDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub id: Option<String>,
    pub title: Option<String>,
    pub order: Option<u32>,
    #[serde(default)]
    pub exercises: Vec<ExerciseDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    pub id: Option<String>,
    pub title: Option<String>,
    pub difficulty: Option<String>,
}

fn required<'a>(
    value: Option<&'a String>,
    entity: impl FnOnce() -> String,
    field: &'static str,
) -> Result<&'a str, CatalogError> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CatalogError::MissingField {
            entity: entity(),
            field,
        }),
    }
}

fn invalid_id(entity: String) -> impl FnOnce(IdError) -> CatalogError {
    move |source| CatalogError::InvalidId { entity, source }
}

impl ModuleDefinition {
    /// Builds a validated module. `position` is the 1-based index of this
    /// entry in the document and only feeds error messages.
    pub(crate) fn into_module(self, position: usize) -> Result<Module, CatalogError> {
        let unnamed = || format!("module #{position}");
        let raw_id = required(self.id.as_ref(), unnamed, "id")?;
        let id = ModuleId::new(raw_id).map_err(invalid_id(unnamed()))?;
        let entity = || format!("module {id}");

        let title = required(self.title.as_ref(), entity, "title")?.to_owned();
        let order = self.order.ok_or_else(|| CatalogError::MissingField {
            entity: entity(),
            field: "order",
        })?;

        let exercises = self
            .exercises
            .into_iter()
            .enumerate()
            .map(|(idx, ex)| ex.into_exercise(&id, idx + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Module::new(id.clone(), title, order, exercises).map_err(|err| match err {
            ModuleError::NoExercises => CatalogError::EmptyModule(id.clone()),
            ModuleError::EmptyTitle => CatalogError::MissingField {
                entity: entity(),
                field: "title",
            },
        })
    }
}

impl ExerciseDefinition {
    fn into_exercise(self, module: &ModuleId, position: usize) -> Result<Exercise, CatalogError> {
        let unnamed = || format!("exercise #{position} of module {module}");
        let raw_id = required(self.id.as_ref(), unnamed, "id")?;
        let id = ExerciseId::new(raw_id).map_err(invalid_id(unnamed()))?;
        let entity = || format!("exercise {id}");

        let title = required(self.title.as_ref(), entity, "title")?.to_owned();
        let raw_difficulty = required(self.difficulty.as_ref(), entity, "difficulty")?;
        let difficulty: Difficulty =
            raw_difficulty
                .parse()
                .map_err(|_| CatalogError::UnknownDifficulty {
                    exercise: id.clone(),
                    value: raw_difficulty.to_owned(),
                })?;

        Exercise::new(id.clone(), title, difficulty).map_err(|err| match err {
            ExerciseError::UnknownDifficulty(value) => CatalogError::UnknownDifficulty {
                exercise: id.clone(),
                value,
            },
            _ => CatalogError::MissingField {
                entity: entity(),
                field: "title",
            },
        })
    }
}
