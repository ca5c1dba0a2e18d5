use learn_core::model::{Difficulty, ExerciseId, ModuleId};
use learn_core::query::{
    completed_exercises, module_completion_ratio, next_incomplete_exercise,
    overall_completion_ratio,
};
use learn_core::time::fixed_clock;
use learn_core::{Catalog, CompletionRatio, ProgressTracker};

const SAMPLE: &str = include_str!("../../../catalog.toml");

#[test]
fn bundled_catalog_is_well_formed() {
    let catalog = Catalog::from_toml_str(SAMPLE).expect("bundled catalog loads");

    let orders: Vec<u32> = catalog.modules_in_order().map(|m| m.order()).collect();
    assert_eq!(orders, [1, 2, 3, 4, 5]);
    assert_eq!(catalog.exercise_count(), 10);
    assert!(catalog.modules_in_order().all(|m| m.exercise_count() > 0));

    let ring = catalog
        .get_exercise(&ExerciseId::new("gradients-angular").unwrap())
        .unwrap();
    assert_eq!(ring.difficulty(), Difficulty::Advanced);
}

#[test]
fn walking_the_bundled_catalog_in_order() {
    let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
    let tracker = ProgressTracker::new(fixed_clock());

    let mut visited = Vec::new();
    while let Some(next) = next_incomplete_exercise(&catalog, &tracker.snapshot()) {
        visited.push(next.id().clone());
        tracker.mark_complete(next.id(), &catalog).unwrap();

        let snapshot = tracker.snapshot();
        assert_eq!(
            overall_completion_ratio(&catalog, &snapshot),
            CompletionRatio::new(visited.len(), catalog.exercise_count())
        );
    }

    let in_order: Vec<ExerciseId> = catalog.exercises_in_order().map(|e| e.id().clone()).collect();
    assert_eq!(visited, in_order);

    let snapshot = tracker.snapshot();
    assert!(overall_completion_ratio(&catalog, &snapshot).is_complete());
    assert_eq!(completed_exercises(&catalog, &snapshot).count(), 10);
    assert!(
        module_completion_ratio(&ModuleId::new("state").unwrap(), &catalog, &snapshot)
            .unwrap()
            .is_complete()
    );
}
