use serde::Serialize;
use thiserror::Error;

use crate::model::exercise::Exercise;
use crate::model::ids::{ExerciseId, ModuleId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,

    #[error("module must contain at least one exercise")]
    NoExercises,
}

/// A chapter of the catalog: a titled, ordered group of exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    id: ModuleId,
    title: String,
    order: u32,
    exercises: Vec<Exercise>,
}

impl Module {
    /// Creates a module. Exercise order is kept as given.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError` if the title is blank or no exercises are given.
    pub fn new(
        id: ModuleId,
        title: impl Into<String>,
        order: u32,
        exercises: Vec<Exercise>,
    ) -> Result<Self, ModuleError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(ModuleError::EmptyTitle);
        }
        if exercises.is_empty() {
            return Err(ModuleError::NoExercises);
        }
        Ok(Self {
            id,
            title,
            order,
            exercises,
        })
    }

    #[must_use]
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Position of this module in the progression.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    #[must_use]
    pub fn contains(&self, id: &ExerciseId) -> bool {
        self.exercises.iter().any(|e| e.id() == id)
    }

    pub(crate) fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }
}
