//! Ordered movement sequences and the statistics derived from them.
//!
//! A sequence stores movement ids only. Ids are not required to exist in the
//! catalog: resolution yields a placeholder for each dangling id so the rest
//! of the sequence can still be shown.

use crate::store::Repository;
use crate::{Error, Movement, PrecautionLevel, Result};
use serde::{Deserialize, Serialize};

/// Minutes per movement used by [`FixedPerMovement::default`]
pub const DEFAULT_MINUTES_PER_MOVEMENT: f64 = 4.5;

/// Ordered list of unique movement ids
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Sequence(Vec<String>);

/// One entry of a resolved sequence
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedEntry {
    Movement(Movement),
    /// The id no longer exists in the catalog
    Unresolved(String),
}

impl ResolvedEntry {
    pub fn id(&self) -> &str {
        match self {
            ResolvedEntry::Movement(movement) => &movement.id,
            ResolvedEntry::Unresolved(id) => id,
        }
    }

    pub fn as_movement(&self) -> Option<&Movement> {
        match self {
            ResolvedEntry::Movement(movement) => Some(movement),
            ResolvedEntry::Unresolved(_) => None,
        }
    }
}

/// Planning numbers shown next to a sequence
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SequenceStats {
    pub movement_count: usize,
    pub estimated_minutes: u32,
    pub high_risk_count: usize,
}

/// Strategy for estimating how long a sequence takes to teach
pub trait DurationEstimator {
    fn estimate_minutes(&self, entries: &[ResolvedEntry]) -> u32;
}

/// Flat per-movement estimate, rounded up.
///
/// This is a planning approximation, not a scheduling guarantee: movement
/// duration labels are free text and are not parsed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedPerMovement {
    pub minutes_per_movement: f64,
}

impl Default for FixedPerMovement {
    fn default() -> Self {
        Self {
            minutes_per_movement: DEFAULT_MINUTES_PER_MOVEMENT,
        }
    }
}

impl DurationEstimator for FixedPerMovement {
    fn estimate_minutes(&self, entries: &[ResolvedEntry]) -> u32 {
        (entries.len() as f64 * self.minutes_per_movement).ceil() as u32
    }
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, movement_id: &str) -> bool {
        self.0.iter().any(|id| id == movement_id)
    }

    /// Append a movement id. Returns `false` and leaves the sequence
    /// unchanged if the id is already present.
    pub fn append(&mut self, movement_id: impl Into<String>) -> bool {
        let movement_id = movement_id.into();
        if self.contains(&movement_id) {
            return false;
        }
        self.0.push(movement_id);
        true
    }

    /// Remove the entry at `index`, shifting later entries left
    pub fn remove_at(&mut self, index: usize) -> Result<String> {
        if index >= self.0.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.0.len(),
            });
        }
        Ok(self.0.remove(index))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Move one entry to a new position, keeping the order of all others
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.0.len();
        if to >= len {
            return Err(Error::IndexOutOfRange { index: to, len });
        }
        let id = self.remove_at(from)?;
        self.0.insert(to, id);
        Ok(())
    }

    /// Map every id through the movement store, in order
    pub fn resolve<R>(&self, movements: &R) -> Vec<ResolvedEntry>
    where
        R: Repository<Movement> + ?Sized,
    {
        self.0
            .iter()
            .map(|id| match movements.get(id) {
                Some(movement) => ResolvedEntry::Movement(movement),
                None => {
                    tracing::warn!("Sequence references unknown movement '{}'", id);
                    ResolvedEntry::Unresolved(id.clone())
                }
            })
            .collect()
    }

    /// Compute statistics with the given duration strategy
    pub fn stats_with<R, E>(&self, movements: &R, estimator: &E) -> SequenceStats
    where
        R: Repository<Movement> + ?Sized,
        E: DurationEstimator + ?Sized,
    {
        let entries = self.resolve(movements);
        let high_risk_count = entries
            .iter()
            .filter_map(ResolvedEntry::as_movement)
            .filter(|m| m.precaution_level == PrecautionLevel::High)
            .count();

        SequenceStats {
            movement_count: entries.len(),
            estimated_minutes: estimator.estimate_minutes(&entries),
            high_risk_count,
        }
    }

    /// Compute statistics with the default 4.5 minutes per movement
    pub fn stats<R>(&self, movements: &R) -> SequenceStats
    where
        R: Repository<Movement> + ?Sized,
    {
        self.stats_with(movements, &FixedPerMovement::default())
    }
}

impl From<Vec<String>> for Sequence {
    fn from(ids: Vec<String>) -> Self {
        ids.into_iter().collect()
    }
}

impl From<Sequence> for Vec<String> {
    fn from(sequence: Sequence) -> Self {
        sequence.0
    }
}

impl<S: Into<String>> FromIterator<S> for Sequence {
    /// Collects ids in order, dropping repeats
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut sequence = Sequence::new();
        for id in iter {
            sequence.append(id);
        }
        sequence
    }
}
