use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Catalog;
use crate::model::ExerciseId;
use crate::time::Clock;

/// Persisted shape of one learner's progress: exercise id -> completion time.
pub type ProgressMap = BTreeMap<ExerciseId, DateTime<Utc>>;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("unknown exercise: {0}")]
    UnknownExercise(ExerciseId),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// A learner's completion marker for one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub exercise_id: ExerciseId,
    pub completed_at: DateTime<Utc>,
}

/// Result of `mark_complete`: the record now in effect, and whether this call
/// created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub record: ProgressRecord,
    pub newly_completed: bool,
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Point-in-time copy of a tracker's records. Queries run against a snapshot so
/// they never see a map that is being mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    records: ProgressMap,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn from_map(records: ProgressMap) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn is_complete(&self, id: &ExerciseId) -> bool {
        self.records.contains_key(id)
    }

    #[must_use]
    pub fn completed_at(&self, id: &ExerciseId) -> Option<DateTime<Utc>> {
        self.records.get(id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by exercise id.
    pub fn records(&self) -> impl Iterator<Item = ProgressRecord> + '_ {
        self.records.iter().map(|(id, at)| ProgressRecord {
            exercise_id: id.clone(),
            completed_at: *at,
        })
    }

    #[must_use]
    pub fn as_map(&self) -> &ProgressMap {
        &self.records
    }

    #[must_use]
    pub fn into_map(self) -> ProgressMap {
        self.records
    }
}

//
// ─── TRACKER ───────────────────────────────────────────────────────────────────
//

/// Completion state of a single learner.
///
/// Each exercise is either incomplete (no record) or complete (one record with
/// the time it was first completed). Mutations hold the write lock, reads hold
/// the read lock, so a tracker can be shared across threads.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    clock: Clock,
    records: RwLock<ProgressMap>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self::from_map(clock, ProgressMap::new())
    }

    /// Restores a tracker from persisted records. Records are taken as is;
    /// call [`ProgressTracker::retain_catalog`] to drop ids the catalog no
    /// longer defines.
    #[must_use]
    pub fn from_map(clock: Clock, records: ProgressMap) -> Self {
        Self {
            clock,
            records: RwLock::new(records),
        }
    }

    // Every write is a single insert or remove, so a panic elsewhere can never
    // leave the map half-updated; poisoning is safe to ignore.
    fn read(&self) -> RwLockReadGuard<'_, ProgressMap> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProgressMap> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks an exercise complete at the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownExercise` if the catalog does not define
    /// the exercise. The records are left untouched in that case.
    pub fn mark_complete(
        &self,
        id: &ExerciseId,
        catalog: &Catalog,
    ) -> Result<Completion, ProgressError> {
        self.mark_complete_at(id, catalog, self.clock.now())
    }

    /// Marks an exercise complete at `at`. If it is already complete the
    /// original timestamp is kept.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownExercise` if the catalog does not define
    /// the exercise.
    pub fn mark_complete_at(
        &self,
        id: &ExerciseId,
        catalog: &Catalog,
        at: DateTime<Utc>,
    ) -> Result<Completion, ProgressError> {
        if !catalog.contains_exercise(id) {
            return Err(ProgressError::UnknownExercise(id.clone()));
        }

        let mut newly_completed = false;
        let completed_at = *self.write().entry(id.clone()).or_insert_with(|| {
            newly_completed = true;
            at
        });

        Ok(Completion {
            record: ProgressRecord {
                exercise_id: id.clone(),
                completed_at,
            },
            newly_completed,
        })
    }

    /// Clears the completion record, returning it if there was one.
    pub fn mark_incomplete(&self, id: &ExerciseId) -> Option<ProgressRecord> {
        self.write()
            .remove(id)
            .map(|completed_at| ProgressRecord {
                exercise_id: id.clone(),
                completed_at,
            })
    }

    #[must_use]
    pub fn is_complete(&self, id: &ExerciseId) -> bool {
        self.read().contains_key(id)
    }

    #[must_use]
    pub fn completion_timestamp(&self, id: &ExerciseId) -> Option<DateTime<Utc>> {
        self.read().get(id).copied()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::from_map(self.read().clone())
    }

    #[must_use]
    pub fn records(&self) -> Vec<ProgressRecord> {
        self.snapshot().records().collect()
    }

    /// Drops records whose exercise is not in `catalog` and returns their ids,
    /// ordered by id.
    pub fn retain_catalog(&self, catalog: &Catalog) -> Vec<ExerciseId> {
        let mut records = self.write();
        let orphans: Vec<ExerciseId> = records
            .keys()
            .filter(|id| !catalog.contains_exercise(id))
            .cloned()
            .collect();
        for id in &orphans {
            records.remove(id);
        }
        orphans
    }

    /// Removes every record and hands the removed map back.
    pub fn clear(&self) -> ProgressMap {
        std::mem::take(&mut *self.write())
    }

    /// Puts back records taken out by [`ProgressTracker::clear`] or
    /// [`ProgressTracker::mark_incomplete`]. An exercise completed again in the
    /// meantime keeps its newer record.
    pub fn restore(&self, records: ProgressMap) {
        let mut current = self.write();
        for (id, completed_at) in records {
            current.entry(id).or_insert(completed_at);
        }
    }
}
