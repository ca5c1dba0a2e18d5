use std::sync::Arc;

use learn_core::model::{Exercise, ExerciseId, LearnerId, ModuleId};
use learn_core::query::{self, CompletionRatio, ModuleProgress};
use learn_core::{
    Catalog, Clock, Completion, ProgressMap, ProgressRecord, ProgressSnapshot, ProgressTracker,
};
use storage::repository::ProgressRepository;
use tokio::sync::Mutex;

use crate::error::ProgressServiceError;

/// Aggregated view of a learner's progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressOverview {
    pub overall: CompletionRatio,
    pub remaining: usize,
    pub modules: Vec<ModuleProgress>,
    pub next: Option<ExerciseId>,
    pub is_complete: bool,
}

/// Orchestrates one learner's progress: validates marks against the catalog,
/// keeps the tracker in memory and persists every effective change.
pub struct ProgressService {
    learner: LearnerId,
    catalog: Arc<Catalog>,
    tracker: ProgressTracker,
    progress: Arc<dyn ProgressRepository>,
    // held across mutate + save so saves reach the repository in mutation order
    persist: Mutex<()>,
}

impl ProgressService {
    /// Restores the learner's records from the repository. Records for
    /// exercises the catalog no longer defines are dropped, and the cleaned
    /// map is written back.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if loading or saving fails.
    pub async fn open(
        learner: LearnerId,
        catalog: Arc<Catalog>,
        clock: Clock,
        progress: Arc<dyn ProgressRepository>,
    ) -> Result<Self, ProgressServiceError> {
        let records = progress.load(&learner).await?;
        let tracker = ProgressTracker::from_map(clock, records);

        let orphans = tracker.retain_catalog(&catalog);
        if !orphans.is_empty() {
            tracing::warn!(
                learner = %learner,
                pruned = orphans.len(),
                "dropping progress for exercises missing from the catalog"
            );
            progress.save(&learner, tracker.snapshot().as_map()).await?;
        }

        tracing::info!(
            learner = %learner,
            completed = tracker.completed_count(),
            total = catalog.exercise_count(),
            "opened learner progress"
        );

        Ok(Self {
            learner,
            catalog,
            tracker,
            progress,
            persist: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn learner(&self) -> &LearnerId {
        &self.learner
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Mark an exercise complete and persist the change.
    ///
    /// Completing an already complete exercise keeps its timestamp and skips
    /// the save.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Progress` for exercises the catalog does
    /// not define, or `ProgressServiceError::Storage` if the save fails. A
    /// failed save takes the new record back out, so the tracker keeps
    /// matching what is stored and a retry saves again.
    pub async fn complete(&self, id: &ExerciseId) -> Result<Completion, ProgressServiceError> {
        let _guard = self.persist.lock().await;
        let completion = self.tracker.mark_complete(id, &self.catalog)?;
        if !completion.newly_completed {
            return Ok(completion);
        }

        if let Ok(module) = self.catalog.module_of(id) {
            tracing::debug!(
                learner = %self.learner,
                module = %module.id(),
                exercise = %id,
                "exercise completed"
            );
        }
        if let Err(err) = self.save().await {
            self.tracker.mark_incomplete(id);
            tracing::warn!(learner = %self.learner, exercise = %id, error = %err, "completion not saved");
            return Err(err);
        }
        Ok(completion)
    }

    /// Clear an exercise's completion and persist the change.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the save fails; the record
    /// is put back in that case.
    pub async fn reset(
        &self,
        id: &ExerciseId,
    ) -> Result<Option<ProgressRecord>, ProgressServiceError> {
        let _guard = self.persist.lock().await;
        let Some(removed) = self.tracker.mark_incomplete(id) else {
            return Ok(None);
        };

        tracing::debug!(learner = %self.learner, exercise = %id, "exercise reset");
        if let Err(err) = self.save().await {
            self.tracker
                .restore(ProgressMap::from([(id.clone(), removed.completed_at)]));
            tracing::warn!(learner = %self.learner, exercise = %id, error = %err, "reset not saved");
            return Err(err);
        }
        Ok(Some(removed))
    }

    /// Clear every record for this learner.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the save fails; the cleared
    /// records are put back in that case.
    pub async fn reset_all(&self) -> Result<(), ProgressServiceError> {
        let _guard = self.persist.lock().await;
        let cleared = self.tracker.clear();
        tracing::debug!(learner = %self.learner, cleared = cleared.len(), "progress cleared");
        if let Err(err) = self.save().await {
            self.tracker.restore(cleared);
            tracing::warn!(learner = %self.learner, error = %err, "clear not saved");
            return Err(err);
        }
        Ok(())
    }

    async fn save(&self) -> Result<(), ProgressServiceError> {
        let snapshot = self.tracker.snapshot();
        self.progress.save(&self.learner, snapshot.as_map()).await?;
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.tracker.snapshot()
    }

    #[must_use]
    pub fn is_complete(&self, id: &ExerciseId) -> bool {
        self.tracker.is_complete(id)
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::Lookup` if the module is unknown.
    pub fn module_ratio(&self, id: &ModuleId) -> Result<CompletionRatio, ProgressServiceError> {
        Ok(query::module_completion_ratio(
            id,
            &self.catalog,
            &self.snapshot(),
        )?)
    }

    #[must_use]
    pub fn overall_ratio(&self) -> CompletionRatio {
        query::overall_completion_ratio(&self.catalog, &self.snapshot())
    }

    #[must_use]
    pub fn next_exercise(&self) -> Option<Exercise> {
        query::next_incomplete_exercise(&self.catalog, &self.snapshot()).cloned()
    }

    #[must_use]
    pub fn completed_exercises(&self) -> Vec<Exercise> {
        let snapshot = self.snapshot();
        query::completed_exercises(&self.catalog, &snapshot)
            .cloned()
            .collect()
    }

    /// Everything a progress screen needs, computed from one snapshot.
    #[must_use]
    pub fn overview(&self) -> ProgressOverview {
        let snapshot = self.snapshot();
        let overall = query::overall_completion_ratio(&self.catalog, &snapshot);
        ProgressOverview {
            overall,
            remaining: overall.remaining(),
            modules: query::module_breakdown(&self.catalog, &snapshot),
            next: query::next_incomplete_exercise(&self.catalog, &snapshot)
                .map(|e| e.id().clone()),
            is_complete: overall.is_complete(),
        }
    }
}
