mod exercise;
mod ids;
mod module;

pub use exercise::{Difficulty, Exercise, ExerciseError};
pub use ids::{ExerciseId, IdError, LearnerId, ModuleId};
pub use module::{Module, ModuleError};
