//! Building new records from existing ones.
//!
//! - template → class: a single class today at the default start time
//! - class → class copy: a single class today, never recurring
//! - class → template: a snapshot of level, duration and sequence
//!
//! Sequences are always copied by value, so later edits on either side do
//! not leak into the other. The functions return drafts; the repository
//! assigns the new id on create.

use crate::config::ScheduleConfig;
use crate::{
    Anchor, ClassDefinition, ClassDraft, RecurrenceRule, Result, Schedule, Template,
    TemplateDraft,
};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// A fresh single class from a template, on `today` at the configured
/// default start time
pub fn instantiate_from_template(
    template: &Template,
    today: NaiveDate,
    defaults: &ScheduleConfig,
) -> Result<ClassDraft> {
    let start = today.and_time(defaults.start_time()?);

    Ok(ClassDraft {
        title: template.name.clone(),
        level: template.level.clone(),
        category: defaults.default_category.clone(),
        description: template.description.clone(),
        room_location: None,
        max_participants: None,
        equipment: BTreeSet::new(),
        notes: None,
        sequence: template.sequence.clone(),
        schedule: Schedule::single(Anchor::new(start, template.duration_minutes)),
    })
}

/// A copy of `existing` moved to `today`. Time of day and duration are kept;
/// recurrence is dropped.
pub fn copy_class(existing: &ClassDefinition, today: NaiveDate) -> ClassDraft {
    let anchor = &existing.schedule.anchor;

    ClassDraft {
        title: format!("{} (Copy)", existing.title),
        level: existing.level.clone(),
        category: existing.category.clone(),
        description: existing.description.clone(),
        room_location: existing.room_location.clone(),
        max_participants: existing.max_participants,
        equipment: existing.equipment.clone(),
        notes: existing.notes.clone(),
        sequence: existing.sequence.clone(),
        schedule: Schedule {
            anchor: Anchor::new(today.and_time(anchor.time()), anchor.duration_minutes),
            recurrence: RecurrenceRule::None,
        },
    }
}

/// A template snapshot of `existing`; `name` defaults to "<title> Template"
pub fn template_from_class(existing: &ClassDefinition, name: Option<String>) -> TemplateDraft {
    TemplateDraft {
        name: name.unwrap_or_else(|| format!("{} Template", existing.title)),
        description: Some(format!("Template based on {} class", existing.title)),
        level: existing.level.clone(),
        duration_minutes: existing.schedule.anchor.duration_minutes,
        sequence: existing.sequence.clone(),
        tags: BTreeSet::new(),
        created_at: None,
    }
}
