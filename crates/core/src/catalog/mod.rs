use std::collections::HashMap;

use thiserror::Error;

use crate::model::{Exercise, ExerciseId, IdError, Module, ModuleId};

mod definition;

pub use definition::{CatalogDefinition, ExerciseDefinition, ModuleDefinition};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// The catalog definition is malformed and cannot be loaded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("failed to parse catalog document: {0}")]
    Parse(String),

    #[error("catalog defines no modules")]
    Empty,

    #[error("{entity} is missing required field `{field}`")]
    MissingField { entity: String, field: &'static str },

    #[error("{entity} has an invalid id: {source}")]
    InvalidId {
        entity: String,
        #[source]
        source: IdError,
    },

    #[error("exercise {exercise} has unknown difficulty {value:?}")]
    UnknownDifficulty { exercise: ExerciseId, value: String },

    #[error("module {0} has no exercises")]
    EmptyModule(ModuleId),

    #[error("module id {0} is declared more than once")]
    DuplicateModuleId(ModuleId),

    #[error("exercise id {exercise} appears in module {first} and again in module {second}")]
    DuplicateExerciseId {
        exercise: ExerciseId,
        first: ModuleId,
        second: ModuleId,
    },

    #[error("modules {first} and {second} both use order {order}")]
    DuplicateOrder {
        order: u32,
        first: ModuleId,
        second: ModuleId,
    },

    #[error("module order jumps from {after} to {next}; orders must be contiguous")]
    OrderGap { after: u32, next: u32 },
}

/// A module or exercise id that the catalog does not know.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LookupError {
    #[error("module not found: {0}")]
    ModuleNotFound(ModuleId),

    #[error("exercise not found: {0}")]
    ExerciseNotFound(ExerciseId),
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// The full, read-only set of modules and exercises.
///
/// Modules are stored sorted by `order`; exercise order inside a module is
/// the order of the source document. Once built the catalog never changes,
/// so it can be shared freely (typically behind an `Arc`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    modules: Vec<Module>,
    module_index: HashMap<ModuleId, usize>,
    // exercise id -> (module position, exercise position)
    exercise_index: HashMap<ExerciseId, (usize, usize)>,
}

impl Catalog {
    /// Builds a catalog from already constructed modules, checking the
    /// cross-module invariants.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if there are no modules, a module or exercise id
    /// is duplicated, or the module orders collide or are not contiguous.
    pub fn new(mut modules: Vec<Module>) -> Result<Self, CatalogError> {
        if modules.is_empty() {
            return Err(CatalogError::Empty);
        }

        // Stable sort keeps document order for equal keys, so the
        // duplicate-order error names modules in the order they were declared.
        modules.sort_by_key(Module::order);
        for pair in modules.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.order() == next.order() {
                return Err(CatalogError::DuplicateOrder {
                    order: prev.order(),
                    first: prev.id().clone(),
                    second: next.id().clone(),
                });
            }
            if next.order() != prev.order() + 1 {
                return Err(CatalogError::OrderGap {
                    after: prev.order(),
                    next: next.order(),
                });
            }
        }

        let mut module_index = HashMap::with_capacity(modules.len());
        let mut exercise_index = HashMap::new();
        for (m_pos, module) in modules.iter().enumerate() {
            if module.exercises().is_empty() {
                return Err(CatalogError::EmptyModule(module.id().clone()));
            }
            if module_index.insert(module.id().clone(), m_pos).is_some() {
                return Err(CatalogError::DuplicateModuleId(module.id().clone()));
            }
            for (e_pos, exercise) in module.exercises().iter().enumerate() {
                if let Some((first, _)) = exercise_index.insert(exercise.id().clone(), (m_pos, e_pos))
                {
                    return Err(CatalogError::DuplicateExerciseId {
                        exercise: exercise.id().clone(),
                        first: modules[first].id().clone(),
                        second: module.id().clone(),
                    });
                }
            }
        }

        Ok(Self {
            modules,
            module_index,
            exercise_index,
        })
    }

    /// Validates a deserialized catalog document.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for missing fields, bad ids or difficulties, and
    /// every check performed by [`Catalog::new`].
    pub fn from_definition(definition: CatalogDefinition) -> Result<Self, CatalogError> {
        let modules = definition
            .modules
            .into_iter()
            .enumerate()
            .map(|(idx, module)| module.into_module(idx + 1))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(modules)
    }

    /// Loads a catalog from a TOML document (`[[modules]]` tables with nested
    /// `[[modules.exercises]]`).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the document is not valid TOML, or any
    /// validation error from [`Catalog::from_definition`].
    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        let definition: CatalogDefinition =
            toml::from_str(source).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_definition(definition)
    }

    /// Loads a catalog from a JSON document of the same shape as the TOML one.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if the document is not valid JSON, or any
    /// validation error from [`Catalog::from_definition`].
    pub fn from_json_str(source: &str) -> Result<Self, CatalogError> {
        let definition: CatalogDefinition =
            serde_json::from_str(source).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_definition(definition)
    }

    /// # Errors
    ///
    /// Returns `LookupError::ModuleNotFound` if no module has this id.
    pub fn get_module(&self, id: &ModuleId) -> Result<&Module, LookupError> {
        self.module_index
            .get(id)
            .map(|&pos| &self.modules[pos])
            .ok_or_else(|| LookupError::ModuleNotFound(id.clone()))
    }

    /// # Errors
    ///
    /// Returns `LookupError::ExerciseNotFound` if no exercise has this id.
    pub fn get_exercise(&self, id: &ExerciseId) -> Result<&Exercise, LookupError> {
        self.exercise_index
            .get(id)
            .map(|&(m, e)| &self.modules[m].exercises()[e])
            .ok_or_else(|| LookupError::ExerciseNotFound(id.clone()))
    }

    /// Returns the module that owns the given exercise.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::ExerciseNotFound` if no exercise has this id.
    pub fn module_of(&self, id: &ExerciseId) -> Result<&Module, LookupError> {
        self.exercise_index
            .get(id)
            .map(|&(m, _)| &self.modules[m])
            .ok_or_else(|| LookupError::ExerciseNotFound(id.clone()))
    }

    #[must_use]
    pub fn contains_exercise(&self, id: &ExerciseId) -> bool {
        self.exercise_index.contains_key(id)
    }

    /// Modules sorted by `order`. Every call yields the same sequence.
    pub fn modules_in_order(&self) -> std::slice::Iter<'_, Module> {
        self.modules.iter()
    }

    /// Every exercise in catalog order: module order first, then position
    /// inside the module.
    pub fn exercises_in_order(&self) -> impl Iterator<Item = &Exercise> + Clone + '_ {
        self.modules.iter().flat_map(|m| m.exercises().iter())
    }

    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.exercise_index.len()
    }

    /// Returns a copy of this catalog with the module and all of its exercises
    /// removed. Modules after it move up one position so orders stay
    /// contiguous.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lookup` if the module is unknown and `Error::Catalog`
    /// with `CatalogError::Empty` if it is the last remaining module.
    pub fn without_module(&self, id: &ModuleId) -> Result<Self, crate::Error> {
        let removed = self.get_module(id)?.order();
        let modules = self
            .modules
            .iter()
            .filter(|m| m.id() != id)
            .cloned()
            .map(|m| {
                if m.order() > removed {
                    let order = m.order() - 1;
                    m.with_order(order)
                } else {
                    m
                }
            })
            .collect();
        Ok(Self::new(modules)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;

    const SAMPLE: &str = r#"
        [[modules]]
        id = "gradients"
        title = "Gradients"
        order = 2

        [[modules.exercises]]
        id = "linear-gradient"
        title = "Linear gradient"
        difficulty = "intermediate"

        [[modules]]
        id = "shapes"
        title = "Shapes"
        order = 1

        [[modules.exercises]]
        id = "circle"
        title = "Draw a circle"
        difficulty = "beginner"

        [[modules.exercises]]
        id = "capsule"
        title = "Capsule with stroke"
        difficulty = "beginner"

        [[modules]]
        id = "state"
        title = "State"
        order = 3

        [[modules.exercises]]
        id = "counter"
        title = "Counter with @State"
        difficulty = "advanced"
    "#;

    fn mid(s: &str) -> ModuleId {
        ModuleId::new(s).unwrap()
    }

    fn eid(s: &str) -> ExerciseId {
        ExerciseId::new(s).unwrap()
    }

    #[test]
    fn loads_and_sorts_modules_by_order() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        let orders: Vec<u32> = catalog.modules_in_order().map(Module::order).collect();
        assert_eq!(orders, [1, 2, 3]);

        let ids: Vec<&str> = catalog.modules_in_order().map(|m| m.id().as_str()).collect();
        assert_eq!(ids, ["shapes", "gradients", "state"]);
        assert_eq!(catalog.module_count(), 3);
        assert_eq!(catalog.exercise_count(), 4);
    }

    #[test]
    fn listing_is_restartable() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        let first: Vec<&Module> = catalog.modules_in_order().collect();
        let second: Vec<&Module> = catalog.modules_in_order().collect();
        assert_eq!(first, second);

        let exercises = catalog.exercises_in_order();
        let replay = exercises.clone();
        assert_eq!(exercises.count(), replay.count());
    }

    #[test]
    fn exercises_follow_catalog_order() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        let ids: Vec<&str> = catalog.exercises_in_order().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, ["circle", "capsule", "linear-gradient", "counter"]);
    }

    #[test]
    fn lookups_find_modules_and_exercises() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        assert_eq!(catalog.get_module(&mid("shapes")).unwrap().title(), "Shapes");

        let counter = catalog.get_exercise(&eid("counter")).unwrap();
        assert_eq!(counter.difficulty(), Difficulty::Advanced);
        assert_eq!(catalog.module_of(&eid("counter")).unwrap().id(), &mid("state"));
    }

    #[test]
    fn lookups_report_unknown_ids() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            catalog.get_module(&mid("animations")).unwrap_err(),
            LookupError::ModuleNotFound(mid("animations"))
        );
        assert_eq!(
            catalog.get_exercise(&eid("nope")).unwrap_err(),
            LookupError::ExerciseNotFound(eid("nope"))
        );
    }

    #[test]
    fn duplicate_order_is_malformed() {
        let doc = r#"
            [[modules]]
            id = "a"
            title = "A"
            order = 1
            [[modules.exercises]]
            id = "a1"
            title = "A1"
            difficulty = "beginner"

            [[modules]]
            id = "b"
            title = "B"
            order = 1
            [[modules.exercises]]
            id = "b1"
            title = "B1"
            difficulty = "beginner"
        "#;
        let err = Catalog::from_toml_str(doc).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateOrder {
                order: 1,
                first: mid("a"),
                second: mid("b"),
            }
        );
    }

    #[test]
    fn order_gap_is_malformed() {
        let doc = r#"
            [[modules]]
            id = "a"
            title = "A"
            order = 1
            [[modules.exercises]]
            id = "a1"
            title = "A1"
            difficulty = "beginner"

            [[modules]]
            id = "b"
            title = "B"
            order = 3
            [[modules.exercises]]
            id = "b1"
            title = "B1"
            difficulty = "beginner"
        "#;
        let err = Catalog::from_toml_str(doc).unwrap_err();
        assert_eq!(err, CatalogError::OrderGap { after: 1, next: 3 });
    }

    #[test]
    fn duplicate_exercise_across_modules_is_malformed() {
        let doc = r#"
            [[modules]]
            id = "a"
            title = "A"
            order = 1
            [[modules.exercises]]
            id = "shared"
            title = "Shared"
            difficulty = "beginner"

            [[modules]]
            id = "b"
            title = "B"
            order = 2
            [[modules.exercises]]
            id = "shared"
            title = "Shared again"
            difficulty = "advanced"
        "#;
        let err = Catalog::from_toml_str(doc).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateExerciseId {
                exercise: eid("shared"),
                first: mid("a"),
                second: mid("b"),
            }
        );
    }

    #[test]
    fn missing_fields_name_the_entry() {
        let doc = r#"
            [[modules]]
            id = "a"
            order = 1
            [[modules.exercises]]
            id = "a1"
            title = "A1"
            difficulty = "beginner"
        "#;
        let err = Catalog::from_toml_str(doc).unwrap_err();
        assert_eq!(
            err,
            CatalogError::MissingField {
                entity: "module a".into(),
                field: "title",
            }
        );

        let doc = r#"
            [[modules]]
            id = "a"
            title = "A"
            order = 1
            [[modules.exercises]]
            title = "No id"
            difficulty = "beginner"
        "#;
        let err = Catalog::from_toml_str(doc).unwrap_err();
        assert_eq!(
            err,
            CatalogError::MissingField {
                entity: "exercise #1 of module a".into(),
                field: "id",
            }
        );
    }

    #[test]
    fn module_without_exercises_is_malformed() {
        let doc = r#"
            [[modules]]
            id = "lonely"
            title = "Lonely"
            order = 1
        "#;
        let err = Catalog::from_toml_str(doc).unwrap_err();
        assert_eq!(err, CatalogError::EmptyModule(mid("lonely")));
    }

    #[test]
    fn unknown_difficulty_is_malformed() {
        let doc = r#"
            [[modules]]
            id = "a"
            title = "A"
            order = 1
            [[modules.exercises]]
            id = "a1"
            title = "A1"
            difficulty = "legendary"
        "#;
        let err = Catalog::from_toml_str(doc).unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnknownDifficulty {
                exercise: eid("a1"),
                value: "legendary".into(),
            }
        );
    }

    #[test]
    fn empty_and_unparseable_documents_fail() {
        assert_eq!(Catalog::from_toml_str("").unwrap_err(), CatalogError::Empty);
        assert!(matches!(
            Catalog::from_toml_str("modules = 3").unwrap_err(),
            CatalogError::Parse(_)
        ));
        assert!(matches!(
            Catalog::from_json_str("{not json").unwrap_err(),
            CatalogError::Parse(_)
        ));
    }

    #[test]
    fn json_documents_use_the_same_shape() {
        let doc = r#"{
            "modules": [
                {
                    "id": "text",
                    "title": "Text styling",
                    "order": 1,
                    "exercises": [
                        { "id": "bold", "title": "Bold text", "difficulty": "beginner" }
                    ]
                }
            ]
        }"#;
        let catalog = Catalog::from_json_str(doc).unwrap();
        assert_eq!(catalog.get_exercise(&eid("bold")).unwrap().title(), "Bold text");
    }

    #[test]
    fn removing_a_module_cascades_and_keeps_orders_contiguous() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        let trimmed = catalog.without_module(&mid("gradients")).unwrap();

        assert!(!trimmed.contains_exercise(&eid("linear-gradient")));
        assert_eq!(trimmed.exercise_count(), 3);
        let orders: Vec<(&str, u32)> = trimmed
            .modules_in_order()
            .map(|m| (m.id().as_str(), m.order()))
            .collect();
        assert_eq!(orders, [("shapes", 1), ("state", 2)]);

        // the source catalog is untouched
        assert!(catalog.contains_exercise(&eid("linear-gradient")));
    }

    #[test]
    fn removing_unknown_or_last_module_fails() {
        let catalog = Catalog::from_toml_str(SAMPLE).unwrap();
        assert!(matches!(
            catalog.without_module(&mid("missing")),
            Err(crate::Error::Lookup(LookupError::ModuleNotFound(_)))
        ));

        let single = catalog
            .without_module(&mid("gradients"))
            .and_then(|c| c.without_module(&mid("state")))
            .unwrap();
        assert!(matches!(
            single.without_module(&mid("shapes")),
            Err(crate::Error::Catalog(CatalogError::Empty))
        ));
    }
}
