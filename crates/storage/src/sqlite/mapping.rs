use chrono::{DateTime, Utc};
use learn_core::model::ExerciseId;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Decodes one `progress_records` row into its map entry.
pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<(ExerciseId, DateTime<Utc>), StorageError> {
    let raw_id: String = row.try_get("exercise_id").map_err(ser)?;
    let exercise_id = ExerciseId::new(&raw_id)
        .map_err(|e| StorageError::Serialization(format!("invalid exercise_id {raw_id:?}: {e}")))?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;
    Ok((exercise_id, completed_at))
}
