//! The studio service: repositories plus the operations the calendar and
//! sequence screens need.

use crate::catalog::{get_default_catalog, Catalog};
use crate::composition;
use crate::config::{ScheduleConfig, SequenceConfig};
use crate::recurrence::{self, DateWindow};
use crate::sequence::{ResolvedEntry, Sequence, SequenceStats};
use crate::store::{Entity, MemoryRepository, Repository};
use crate::{
    ClassDefinition, ClassPatch, Config, Error, Movement, Occurrence, Result, Template,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Every occurrence of `definitions` between `start` and `end`, inclusive
pub fn resolve_occurrences(
    definitions: &[ClassDefinition],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<Occurrence>> {
    let window = DateWindow::new(start, end)?;
    Ok(recurrence::occurrences_in_range(definitions, window).collect())
}

/// Statistics for a sequence with the default per-movement heuristic
pub fn sequence_stats<R>(sequence: &Sequence, movements: &R) -> SequenceStats
where
    R: Repository<Movement> + ?Sized,
{
    sequence.stats(movements)
}

/// A window of days and what happens in it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub window: DateWindow,
    pub occurrences: Vec<Occurrence>,
}

impl CalendarView {
    pub fn on(&self, date: NaiveDate) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.iter().filter(move |o| o.date() == date)
    }
}

/// Which record holds a sequence entry
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SequenceOwner {
    Class,
    Template,
}

/// A sequence entry whose movement is no longer in the catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DanglingReference {
    pub owner: SequenceOwner,
    pub owner_id: String,
    pub movement_id: String,
}

/// Movements, classes and templates behind one facade
pub struct Studio<
    M = Catalog,
    C = MemoryRepository<ClassDefinition>,
    T = MemoryRepository<Template>,
> {
    movements: M,
    classes: C,
    templates: T,
    schedule: ScheduleConfig,
    sequence: SequenceConfig,
}

impl Studio {
    /// In-memory studio with the seed catalog and no classes
    pub fn new(config: &Config) -> Self {
        Studio::with_repositories(
            get_default_catalog().clone(),
            MemoryRepository::new(),
            MemoryRepository::new(),
            config,
        )
    }
}

impl<M, C, T> Studio<M, C, T>
where
    M: Repository<Movement>,
    C: Repository<ClassDefinition>,
    T: Repository<Template>,
{
    pub fn with_repositories(movements: M, classes: C, templates: T, config: &Config) -> Self {
        Self {
            movements,
            classes,
            templates,
            schedule: config.schedule.clone(),
            sequence: config.sequence.clone(),
        }
    }

    pub fn movements(&self) -> &M {
        &self.movements
    }

    pub fn movements_mut(&mut self) -> &mut M {
        &mut self.movements
    }

    pub fn classes(&self) -> &C {
        &self.classes
    }

    pub fn classes_mut(&mut self) -> &mut C {
        &mut self.classes
    }

    pub fn templates(&self) -> &T {
        &self.templates
    }

    pub fn templates_mut(&mut self) -> &mut T {
        &mut self.templates
    }

    /// A class that must exist for the caller to continue
    pub fn class(&self, id: &str) -> Result<ClassDefinition> {
        self.classes
            .get(id)
            .ok_or_else(|| Error::not_found(ClassDefinition::KIND, id))
    }

    /// A template that must exist for the caller to continue
    pub fn template(&self, id: &str) -> Result<Template> {
        self.templates
            .get(id)
            .ok_or_else(|| Error::not_found(Template::KIND, id))
    }

    // ------------------------------------------------------------------
    // Calendar
    // ------------------------------------------------------------------

    /// All occurrences between `start` and `end`, inclusive
    pub fn resolve_occurrences(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Occurrence>> {
        resolve_occurrences(&self.classes.list(), start, end)
    }

    /// Occurrences on a single day, recurring classes included
    pub fn classes_on(&self, date: NaiveDate) -> Vec<Occurrence> {
        recurrence::occurrences_in_range(&self.classes.list(), DateWindow::day(date)).collect()
    }

    /// The 42-day month grid
    pub fn month_view(&self, year: i32, month: u32) -> Result<CalendarView> {
        let window = recurrence::month_grid(year, month, self.schedule.week_start())?;
        Ok(self.view(window))
    }

    /// The 7-day week containing `date`
    pub fn week_view(&self, date: NaiveDate) -> Result<CalendarView> {
        let window = recurrence::week_window(date, self.schedule.week_start())?;
        Ok(self.view(window))
    }

    fn view(&self, window: DateWindow) -> CalendarView {
        let classes = self.classes.list();
        CalendarView {
            window,
            occurrences: recurrence::occurrences_in_range(&classes, window).collect(),
        }
    }

    // ------------------------------------------------------------------
    // Sequences
    // ------------------------------------------------------------------

    pub fn resolve_sequence(&self, class_id: &str) -> Result<Vec<ResolvedEntry>> {
        Ok(self.class(class_id)?.sequence.resolve(&self.movements))
    }

    /// Stats using the configured minutes-per-movement
    pub fn sequence_stats(&self, class_id: &str) -> Result<SequenceStats> {
        let class = self.class(class_id)?;
        Ok(class
            .sequence
            .stats_with(&self.movements, &self.sequence.estimator()))
    }

    /// Load a class's sequence, edit it, and store it back
    pub fn edit_sequence<F>(&mut self, class_id: &str, edit: F) -> Result<ClassDefinition>
    where
        F: FnOnce(&mut Sequence) -> Result<()>,
    {
        let mut sequence = self.class(class_id)?.sequence;
        edit(&mut sequence)?;

        let patch = ClassPatch {
            sequence: Some(sequence),
            ..Default::default()
        };
        self.classes
            .update(class_id, patch)?
            .ok_or_else(|| Error::not_found(ClassDefinition::KIND, class_id))
    }

    // ------------------------------------------------------------------
    // Composition
    // ------------------------------------------------------------------

    pub fn instantiate_template(&mut self, template_id: &str, today: NaiveDate) -> Result<ClassDefinition> {
        let template = self.template(template_id)?;
        let draft = composition::instantiate_from_template(&template, today, &self.schedule)?;
        let class = self.classes.create(draft)?;
        tracing::info!("Created class {} from template {}", class.id, template_id);
        Ok(class)
    }

    pub fn copy_class(&mut self, class_id: &str, today: NaiveDate) -> Result<ClassDefinition> {
        let source = self.class(class_id)?;
        let class = self.classes.create(composition::copy_class(&source, today))?;
        tracing::info!("Copied class {} to {}", class_id, class.id);
        Ok(class)
    }

    pub fn save_as_template(&mut self, class_id: &str, name: Option<String>) -> Result<Template> {
        let source = self.class(class_id)?;
        let template = self
            .templates
            .create(composition::template_from_class(&source, name))?;
        tracing::info!("Saved class {} as template {}", class_id, template.id);
        Ok(template)
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    /// Sequence entries that point at deleted movements
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let classes = self
            .classes
            .list()
            .into_iter()
            .map(|c| (SequenceOwner::Class, c.id, c.sequence));
        let templates = self
            .templates
            .list()
            .into_iter()
            .map(|t| (SequenceOwner::Template, t.id, t.sequence));

        classes
            .chain(templates)
            .flat_map(|(owner, owner_id, sequence)| {
                sequence
                    .resolve(&self.movements)
                    .into_iter()
                    .filter_map(move |entry| match entry {
                        ResolvedEntry::Unresolved(movement_id) => Some(DanglingReference {
                            owner,
                            owner_id: owner_id.clone(),
                            movement_id,
                        }),
                        ResolvedEntry::Movement(_) => None,
                    })
            })
            .collect()
    }
}
