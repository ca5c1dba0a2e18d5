//! Read-only views derived from a catalog and a progress snapshot.

use std::fmt;

use crate::catalog::{Catalog, LookupError};
use crate::model::{Exercise, Module, ModuleId};
use crate::progress::ProgressSnapshot;

/// Exact `completed / total` ratio.
///
/// Equality is rational, so `1/2 == 2/4`.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRatio {
    completed: usize,
    total: usize,
}

impl CompletionRatio {
    /// `completed` is clamped to `total`.
    #[must_use]
    pub fn new(completed: usize, total: usize) -> Self {
        Self {
            completed: completed.min(total),
            total,
        }
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total - self.completed
    }

    /// Value in `[0, 1]`. An empty ratio reads as `0.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

impl PartialEq for CompletionRatio {
    fn eq(&self, other: &Self) -> bool {
        if self.total == 0 || other.total == 0 {
            return self.completed == 0 && other.completed == 0;
        }
        (self.completed as u128) * (other.total as u128)
            == (other.completed as u128) * (self.total as u128)
    }
}

impl Eq for CompletionRatio {}

impl fmt::Display for CompletionRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Completion of one module, for progress listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProgress {
    pub module_id: ModuleId,
    pub title: String,
    pub order: u32,
    pub ratio: CompletionRatio,
}

fn ratio_for(module: &Module, progress: &ProgressSnapshot) -> CompletionRatio {
    let done = module
        .exercises()
        .iter()
        .filter(|e| progress.is_complete(e.id()))
        .count();
    CompletionRatio::new(done, module.exercise_count())
}

/// Share of a module's exercises that are complete.
///
/// # Errors
///
/// Returns `LookupError::ModuleNotFound` if the module is not in the catalog.
pub fn module_completion_ratio(
    module_id: &ModuleId,
    catalog: &Catalog,
    progress: &ProgressSnapshot,
) -> Result<CompletionRatio, LookupError> {
    let module = catalog.get_module(module_id)?;
    Ok(ratio_for(module, progress))
}

/// Share of all catalog exercises that are complete. Records for ids the
/// catalog does not define are not counted.
#[must_use]
pub fn overall_completion_ratio(catalog: &Catalog, progress: &ProgressSnapshot) -> CompletionRatio {
    let done = catalog
        .exercises_in_order()
        .filter(|e| progress.is_complete(e.id()))
        .count();
    CompletionRatio::new(done, catalog.exercise_count())
}

/// First exercise in catalog order without a completion record.
#[must_use]
pub fn next_incomplete_exercise<'c>(
    catalog: &'c Catalog,
    progress: &ProgressSnapshot,
) -> Option<&'c Exercise> {
    catalog
        .exercises_in_order()
        .find(|e| !progress.is_complete(e.id()))
}

/// Completed exercises in catalog order.
///
/// The iterator is lazy and can be cloned to replay it from the start.
pub fn completed_exercises<'a>(
    catalog: &'a Catalog,
    progress: &'a ProgressSnapshot,
) -> impl Iterator<Item = &'a Exercise> + Clone + 'a {
    catalog
        .exercises_in_order()
        .filter(move |e| progress.is_complete(e.id()))
}

/// Per-module completion, in module order.
#[must_use]
pub fn module_breakdown(catalog: &Catalog, progress: &ProgressSnapshot) -> Vec<ModuleProgress> {
    catalog
        .modules_in_order()
        .map(|module| ModuleProgress {
            module_id: module.id().clone(),
            title: module.title().to_owned(),
            order: module.order(),
            ratio: ratio_for(module, progress),
        })
        .collect()
}
