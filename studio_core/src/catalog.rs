//! Movement catalog.
//!
//! The catalog is the movement repository. It starts from a bundled set of
//! reformer movements (flagged `is_catalog_seed`) and grows with
//! user-created entries. Deleting a movement never touches class or
//! template sequences that reference it.

use crate::store::{new_id, Entity, Repository};
use crate::types::*;
use crate::Result;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached seed catalog - built once and cloned into each new studio
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached seed catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds an owned copy of the bundled movements; read-only callers can
/// share `get_default_catalog()` instead
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

/// Movement store keyed by id
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    movements: HashMap<String, Movement>,
}

struct Seed {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    level: &'static str,
    precaution_level: PrecautionLevel,
    duration: &'static str,
    description: &'static str,
    instructions: &'static [&'static str],
    precautions: &'static [&'static str],
    muscle_groups: &'static [&'static str],
    tags: &'static [&'static str],
}

impl Seed {
    fn into_movement(self) -> Movement {
        Movement {
            id: self.id.into(),
            name: self.name.into(),
            category: self.category.into(),
            level: self.level.into(),
            description: self.description.into(),
            instructions: strings(self.instructions),
            precautions: strings(self.precautions),
            precaution_level: self.precaution_level,
            duration: Some(self.duration.into()),
            thumbnail_url: None,
            tags: self.tags.iter().map(|s| s.to_string()).collect(),
            benefits: Vec::new(),
            contraindications: Vec::new(),
            modifications: Vec::new(),
            equipment: ["reformer".to_string()].into_iter().collect(),
            muscle_groups: self.muscle_groups.iter().map(|s| s.to_string()).collect(),
            breathing_pattern: None,
            is_catalog_seed: true,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Internal function that actually builds the catalog
fn build_default_catalog_internal() -> Catalog {
    let seeds = vec![
        Seed {
            id: "the_hundred",
            name: "The Hundred",
            category: "Warm-up",
            level: "All Levels",
            precaution_level: PrecautionLevel::Low,
            duration: "2-3 minutes",
            description: "Breath-led warm-up that raises circulation and wakes up the core.",
            instructions: &[
                "Lie supine with knees drawn in",
                "Curl head and shoulders up, extend legs to 45 degrees",
                "Pump the arms, inhaling for five and exhaling for five",
            ],
            precautions: &["Keep the lower back down", "Rest the head if the neck strains"],
            muscle_groups: &["core", "hip flexors"],
            tags: &["warm-up", "breathing"],
        },
        Seed {
            id: "footwork_series",
            name: "Footwork Series",
            category: "Lower Body",
            level: "Beginner",
            precaution_level: PrecautionLevel::Low,
            duration: "5-8 minutes",
            description: "Leg strengthening with the feet on the footbar.",
            instructions: &[
                "Lie supine, feet on the footbar in parallel",
                "Press out to straight legs with a neutral pelvis",
                "Return with control; repeat in V and wide positions",
            ],
            precautions: &["Track knees over toes", "Avoid locking the knees"],
            muscle_groups: &["quadriceps", "hamstrings", "calves"],
            tags: &["legs", "alignment"],
        },
        Seed {
            id: "single_leg_stretch",
            name: "Single Leg Stretch",
            category: "Core",
            level: "Beginner",
            precaution_level: PrecautionLevel::Moderate,
            duration: "3-5 minutes",
            description: "Alternating leg extensions that challenge trunk stability.",
            instructions: &[
                "Curl up with both knees in",
                "Extend one leg while drawing the other knee in",
                "Switch smoothly",
            ],
            precautions: &["Skip with acute lower back pain"],
            muscle_groups: &["core"],
            tags: &["abdominals", "coordination"],
        },
        Seed {
            id: "double_leg_stretch",
            name: "Double Leg Stretch",
            category: "Core",
            level: "Intermediate",
            precaution_level: PrecautionLevel::Moderate,
            duration: "2-3 minutes",
            description: "Coordinated reach of arms and legs away from a stable centre.",
            instructions: &["Curl up, knees in", "Reach arms and legs long", "Circle arms and draw back in"],
            precautions: &["Keep the ribs knitted", "Raise the legs higher if the back arches"],
            muscle_groups: &["core", "shoulders"],
            tags: &["abdominals", "coordination"],
        },
        Seed {
            id: "rowing_series",
            name: "Rowing Series",
            category: "Upper Body",
            level: "Intermediate",
            precaution_level: PrecautionLevel::Low,
            duration: "5-7 minutes",
            description: "Seated arm work in several planes with the straps.",
            instructions: &["Sit tall facing the straps", "Move through each rowing pattern with control"],
            precautions: &["Keep the shoulders away from the ears"],
            muscle_groups: &["back", "shoulders", "arms"],
            tags: &["arms", "posture"],
        },
        Seed {
            id: "elephant",
            name: "Elephant",
            category: "Full Body",
            level: "Intermediate",
            precaution_level: PrecautionLevel::Moderate,
            duration: "2-3 minutes",
            description: "Standing carriage work that lengthens the posterior chain.",
            instructions: &["Stand on the carriage, hands on the footbar", "Push the carriage back from the abdominals"],
            precautions: &["Bend the knees with tight hamstrings"],
            muscle_groups: &["hamstrings", "core"],
            tags: &["hamstrings", "flexibility"],
        },
        Seed {
            id: "short_spine",
            name: "Short Spine",
            category: "Full Body",
            level: "Intermediate",
            precaution_level: PrecautionLevel::High,
            duration: "3-4 minutes",
            description: "Spinal articulation with the feet in the straps.",
            instructions: &["Extend legs to the ceiling", "Roll the hips overhead", "Articulate down bone by bone"],
            precautions: &["Not for osteoporosis", "Keep weight off the neck"],
            muscle_groups: &["core", "spine"],
            tags: &["articulation", "inversion"],
        },
        Seed {
            id: "long_stretch_series",
            name: "Long Stretch Series",
            category: "Full Body",
            level: "Advanced",
            precaution_level: PrecautionLevel::High,
            duration: "4-6 minutes",
            description: "Plank-based series demanding shoulder and trunk stability.",
            instructions: &["Set a long plank on the carriage", "Move the carriage without losing the line"],
            precautions: &["Avoid with wrist or shoulder injuries"],
            muscle_groups: &["shoulders", "core", "glutes"],
            tags: &["plank", "stability"],
        },
    ];

    Catalog::from_movements(seeds.into_iter().map(Seed::into_movement))
}

impl Catalog {
    /// Catalog containing exactly the given movements
    pub fn from_movements(movements: impl IntoIterator<Item = Movement>) -> Self {
        Self {
            movements: movements
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.movements.contains_key(id)
    }

    /// Borrowing lookup
    pub fn movement(&self, id: &str) -> Option<&Movement> {
        self.movements.get(id)
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .movements
            .values()
            .map(|m| m.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, movement) in &self.movements {
            if id.is_empty() || movement.id.is_empty() {
                errors.push("Movement has empty ID".to_string());
            }
            if id != &movement.id {
                errors.push(format!(
                    "Movement key '{}' doesn't match movement.id '{}'",
                    id, movement.id
                ));
            }
            if let Err(e) = movement.validate() {
                errors.push(format!("Movement '{}': {}", id, e));
            }
        }

        errors
    }
}

/// Library filter; every field that is set must match
#[derive(Clone, Debug, Default)]
pub struct MovementFilter {
    /// Case-insensitive substring of the name, the category or any tag
    pub search: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub precaution_level: Option<PrecautionLevel>,
    pub tag: Option<String>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &Movement) -> bool {
        let same = |wanted: &Option<String>, actual: &str| {
            wanted.as_deref().map_or(true, |w| w.eq_ignore_ascii_case(actual))
        };
        if !same(&self.category, &movement.category) || !same(&self.level, &movement.level) {
            return false;
        }
        if self.precaution_level.is_some_and(|p| p != movement.precaution_level) {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !movement.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }

        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                movement.name.to_lowercase().contains(&term)
                    || movement.category.to_lowercase().contains(&term)
                    || movement.tags.iter().any(|t| t.to_lowercase().contains(&term))
            }
        }
    }

    pub fn apply(&self, movements: impl IntoIterator<Item = Movement>) -> Vec<Movement> {
        movements.into_iter().filter(|m| self.matches(m)).collect()
    }
}

impl Repository<Movement> for Catalog {
    fn get(&self, id: &str) -> Option<Movement> {
        self.movements.get(id).cloned()
    }

    /// Movements sorted by name
    fn list(&self) -> Vec<Movement> {
        let mut movements: Vec<Movement> = self.movements.values().cloned().collect();
        movements.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        movements
    }

    fn create(&mut self, draft: MovementDraft) -> Result<Movement> {
        let movement = Movement::from_draft(new_id(), draft);
        movement.validate()?;
        self.movements.insert(movement.id.clone(), movement.clone());
        tracing::info!("Added movement '{}' ({})", movement.name, movement.id);
        Ok(movement)
    }

    fn update(&mut self, id: &str, patch: MovementPatch) -> Result<Option<Movement>> {
        let Some(existing) = self.movements.get(id) else {
            return Ok(None);
        };

        let mut updated = existing.clone();
        updated.apply(patch);
        updated.validate()?;
        self.movements.insert(id.to_string(), updated.clone());
        tracing::info!("Updated movement {}", id);
        Ok(Some(updated))
    }

    fn delete(&mut self, id: &str) -> bool {
        let removed = self.movements.remove(id).is_some();
        if removed {
            tracing::info!("Deleted movement {}; sequences referencing it are left as-is", id);
        }
        removed
    }
}
