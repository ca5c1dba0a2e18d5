use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ExerciseId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise title cannot be empty")]
    EmptyTitle,

    #[error("unknown difficulty: {0:?} (expected beginner, intermediate or advanced)")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// How demanding an exercise is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ExerciseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(ExerciseError::UnknownDifficulty(s.to_owned())),
        }
    }
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// One practice item inside a module.
///
/// Exercises are created once while the catalog is loaded and never change
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exercise {
    id: ExerciseId,
    title: String,
    difficulty: Difficulty,
}

impl Exercise {
    /// # Errors
    ///
    /// Returns `ExerciseError::EmptyTitle` if the title is blank.
    pub fn new(
        id: ExerciseId,
        title: impl Into<String>,
        difficulty: Difficulty,
    ) -> Result<Self, ExerciseError> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(ExerciseError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            difficulty,
        })
    }

    #[must_use]
    pub fn id(&self) -> &ExerciseId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }
}
