use learn_core::ProgressMap;
use learn_core::model::LearnerId;

use super::SqliteProgressRepository;
use super::mapping::map_progress_row;
use crate::repository::{ProgressRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteProgressRepository {
    async fn load(&self, learner: &LearnerId) -> Result<ProgressMap, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT exercise_id, completed_at
            FROM progress_records
            WHERE learner_id = ?1
            ORDER BY exercise_id ASC
            ",
        )
        .bind(learner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut records = ProgressMap::new();
        for row in rows {
            let (exercise_id, completed_at) = map_progress_row(&row)?;
            records.insert(exercise_id, completed_at);
        }
        Ok(records)
    }

    async fn save(&self, learner: &LearnerId, records: &ProgressMap) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM progress_records WHERE learner_id = ?1")
            .bind(learner.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (exercise_id, completed_at) in records {
            sqlx::query(
                r"
                INSERT INTO progress_records (learner_id, exercise_id, completed_at)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(learner.as_str())
            .bind(exercise_id.as_str())
            .bind(*completed_at)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        tracing::debug!(learner = %learner, records = records.len(), "saved progress rows");
        Ok(())
    }
}
