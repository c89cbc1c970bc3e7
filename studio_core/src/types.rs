//! Core domain types for the studio calendar.
//!
//! This module defines the fundamental types used throughout the system:
//! - Movements and their precaution levels
//! - Class definitions with their anchor and recurrence rule
//! - Templates
//! - Derived occurrences

use crate::sequence::Sequence;
use crate::store::Entity;
use crate::wire;
use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Movement Types
// ============================================================================

/// How careful an instructor needs to be with a movement
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrecautionLevel {
    #[default]
    Low,
    Moderate,
    High,
}

impl FromStr for PrecautionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(PrecautionLevel::Low),
            "moderate" => Ok(PrecautionLevel::Moderate),
            "high" => Ok(PrecautionLevel::High),
            other => Err(Error::Validation(format!(
                "unknown precaution level '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PrecautionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PrecautionLevel::Low => "Low",
            PrecautionLevel::Moderate => "Moderate",
            PrecautionLevel::High => "High",
        };
        f.write_str(label)
    }
}

/// A movement in the library (e.g., "The Hundred")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: String,
    pub name: String,
    pub category: String,
    pub level: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub precautions: Vec<String>,
    #[serde(default)]
    pub precaution_level: PrecautionLevel,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub contraindications: Vec<String>,
    #[serde(default)]
    pub modifications: Vec<String>,
    #[serde(default)]
    pub equipment: BTreeSet<String>,
    #[serde(default)]
    pub muscle_groups: BTreeSet<String>,
    #[serde(default)]
    pub breathing_pattern: Option<String>,
    #[serde(default)]
    pub is_catalog_seed: bool,
}

/// Input for a new movement; the catalog assigns the id
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementDraft {
    pub name: String,
    pub category: String,
    pub level: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub precautions: Vec<String>,
    #[serde(default)]
    pub precaution_level: PrecautionLevel,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub contraindications: Vec<String>,
    #[serde(default)]
    pub modifications: Vec<String>,
    #[serde(default)]
    pub equipment: BTreeSet<String>,
    #[serde(default)]
    pub muscle_groups: BTreeSet<String>,
    #[serde(default)]
    pub breathing_pattern: Option<String>,
}

/// Partial update for a movement; absent fields keep their value
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovementPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub level: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<Vec<String>>,
    pub precautions: Option<Vec<String>>,
    pub precaution_level: Option<PrecautionLevel>,
    pub duration: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub benefits: Option<Vec<String>>,
    pub contraindications: Option<Vec<String>>,
    pub modifications: Option<Vec<String>>,
    pub equipment: Option<BTreeSet<String>>,
    pub muscle_groups: Option<BTreeSet<String>>,
    pub breathing_pattern: Option<String>,
}

impl Entity for Movement {
    type Draft = MovementDraft;
    type Patch = MovementPatch;
    const KIND: &'static str = "Movement";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: MovementDraft) -> Self {
        Movement {
            id,
            name: draft.name,
            category: draft.category,
            level: draft.level,
            description: draft.description,
            instructions: draft.instructions,
            precautions: draft.precautions,
            precaution_level: draft.precaution_level,
            duration: draft.duration,
            thumbnail_url: draft.thumbnail_url,
            tags: draft.tags,
            benefits: draft.benefits,
            contraindications: draft.contraindications,
            modifications: draft.modifications,
            equipment: draft.equipment,
            muscle_groups: draft.muscle_groups,
            breathing_pattern: draft.breathing_pattern,
            is_catalog_seed: false,
        }
    }

    fn apply(&mut self, patch: MovementPatch) {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field { self.$field = value; })*
            };
        }
        merge!(
            name,
            category,
            level,
            description,
            instructions,
            precautions,
            precaution_level,
            tags,
            benefits,
            contraindications,
            modifications,
            equipment,
            muscle_groups,
        );
        if patch.duration.is_some() {
            self.duration = patch.duration;
        }
        if patch.thumbnail_url.is_some() {
            self.thumbnail_url = patch.thumbnail_url;
        }
        if patch.breathing_pattern.is_some() {
            self.breathing_pattern = patch.breathing_pattern;
        }
    }

    fn validate(&self) -> Result<()> {
        require_text("movement name", &self.name)?;
        require_text("movement category", &self.category)?;
        require_text("movement level", &self.level)
    }
}

// ============================================================================
// Schedule Types
// ============================================================================

/// Map a 0..=6 index (0 = Sunday) to a weekday
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Set of weekdays, serialized as an array of 0..=6 with 0 = Sunday
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct DaySet(u8);

impl DaySet {
    pub const fn empty() -> Self {
        DaySet(0)
    }

    pub fn from_weekdays(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut set = DaySet::empty();
        for day in days {
            set.insert(day);
        }
        set
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_sunday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Weekdays in Sunday-first order
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        (0..7u8)
            .filter(move |i| self.0 & (1 << i) != 0)
            .filter_map(weekday_from_index)
    }
}

impl TryFrom<Vec<u8>> for DaySet {
    type Error = String;

    fn try_from(indices: Vec<u8>) -> std::result::Result<Self, Self::Error> {
        let mut set = DaySet::empty();
        for index in indices {
            let day = weekday_from_index(index)
                .ok_or_else(|| format!("day of week {} is outside 0..=6", index))?;
            set.insert(day);
        }
        Ok(set)
    }
}

impl From<DaySet> for Vec<u8> {
    fn from(set: DaySet) -> Self {
        set.iter().map(|d| d.num_days_from_sunday() as u8).collect()
    }
}

impl FromStr for DaySet {
    type Err = Error;

    /// Parses comma-separated indices or names, e.g. `1,3` or `mon,wed`
    fn from_str(s: &str) -> Result<Self> {
        let mut set = DaySet::empty();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let day = match part.parse::<u8>() {
                Ok(index) => weekday_from_index(index),
                Err(_) => part.parse::<Weekday>().ok(),
            }
            .ok_or_else(|| Error::Validation(format!("unknown day of week '{}'", part)))?;
            set.insert(day);
        }
        Ok(set)
    }
}

/// Recurrence pattern label
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    #[default]
    Weekly,
    /// Accepted, but resolved through the day-of-week set exactly like `Weekly`
    Monthly,
}

/// Whether a class happens once or repeats
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RecurrenceRule {
    /// Single occurrence at the anchor
    #[default]
    None,
    Recurring {
        #[serde(default)]
        pattern: RecurrencePattern,
        days_of_week: DaySet,
        #[serde(default, deserialize_with = "wire::deserialize_optional_date")]
        end_date: Option<NaiveDate>,
    },
}

impl RecurrenceRule {
    pub fn weekly(days_of_week: DaySet, end_date: Option<NaiveDate>) -> Self {
        RecurrenceRule::Recurring {
            pattern: RecurrencePattern::Weekly,
            days_of_week,
            end_date,
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, RecurrenceRule::Recurring { .. })
    }
}

/// First occurrence start and the length of every occurrence
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", try_from = "AnchorInput")]
pub struct Anchor {
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
}

impl Anchor {
    pub fn new(start: NaiveDateTime, duration_minutes: u32) -> Self {
        Anchor {
            start,
            duration_minutes,
        }
    }

    /// Build from start and end instants; end must be after start
    pub fn from_start_end(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        let minutes = (end - start).num_minutes();
        if minutes <= 0 {
            return Err(Error::Validation(format!(
                "class end {} must be after start {}",
                end, start
            )));
        }
        let duration_minutes = u32::try_from(minutes)
            .map_err(|_| Error::Validation(format!("class duration {} minutes is too long", minutes)))?;
        Ok(Anchor::new(start, duration_minutes))
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.start.time()
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + self.duration()
    }
}

/// Wire shape for an anchor: either `end` or `durationMinutes` next to `start`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnchorInput {
    #[serde(deserialize_with = "wire::deserialize_instant")]
    start: NaiveDateTime,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    duration_minutes: Option<u32>,
}

impl TryFrom<AnchorInput> for Anchor {
    type Error = Error;

    fn try_from(input: AnchorInput) -> Result<Self> {
        match (input.duration_minutes, input.end) {
            (Some(minutes), _) => Ok(Anchor::new(input.start, minutes)),
            (None, Some(end)) => Anchor::from_start_end(input.start, wire::parse_instant(&end)?),
            (None, None) => Err(Error::Validation(
                "anchor needs either an end or durationMinutes".into(),
            )),
        }
    }
}

/// When a class happens
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub anchor: Anchor,
    #[serde(default)]
    pub recurrence: RecurrenceRule,
}

impl Schedule {
    pub fn single(anchor: Anchor) -> Self {
        Schedule {
            anchor,
            recurrence: RecurrenceRule::None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.anchor.duration_minutes == 0 {
            return Err(Error::Validation("class duration must be positive".into()));
        }

        if let RecurrenceRule::Recurring {
            days_of_week,
            end_date,
            ..
        } = &self.recurrence
        {
            if days_of_week.is_empty() {
                return Err(Error::Validation(
                    "recurring class needs at least one day of week".into(),
                ));
            }
            if let Some(end) = end_date {
                if *end < self.anchor.date() {
                    return Err(Error::Validation(format!(
                        "recurrence end date {} is before the first class on {}",
                        end,
                        self.anchor.date()
                    )));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Class Definition Types
// ============================================================================

pub(crate) fn default_category() -> String {
    "Regular".into()
}

/// A scheduled class, single or recurring
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassDefinition {
    pub id: String,
    pub title: String,
    pub level: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room_location: Option<String>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub equipment: BTreeSet<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sequence: Sequence,
    pub schedule: Schedule,
}

impl ClassDefinition {
    pub fn is_recurring(&self) -> bool {
        self.schedule.recurrence.is_recurring()
    }
}

/// Input for a new class definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassDraft {
    pub title: String,
    pub level: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub room_location: Option<String>,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub equipment: BTreeSet<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sequence: Sequence,
    pub schedule: Schedule,
}

impl ClassDraft {
    pub fn new(title: impl Into<String>, level: impl Into<String>, schedule: Schedule) -> Self {
        ClassDraft {
            title: title.into(),
            level: level.into(),
            category: default_category(),
            description: None,
            room_location: None,
            max_participants: None,
            equipment: BTreeSet::new(),
            notes: None,
            sequence: Sequence::default(),
            schedule,
        }
    }
}

/// Partial update for a class definition
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassPatch {
    pub title: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub room_location: Option<String>,
    pub max_participants: Option<u32>,
    pub equipment: Option<BTreeSet<String>>,
    pub notes: Option<String>,
    pub sequence: Option<Sequence>,
    pub schedule: Option<Schedule>,
}

impl Entity for ClassDefinition {
    type Draft = ClassDraft;
    type Patch = ClassPatch;
    const KIND: &'static str = "Class";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: ClassDraft) -> Self {
        ClassDefinition {
            id,
            title: draft.title,
            level: draft.level,
            category: draft.category,
            description: draft.description,
            room_location: draft.room_location,
            max_participants: draft.max_participants,
            equipment: draft.equipment,
            notes: draft.notes,
            sequence: draft.sequence,
            schedule: draft.schedule,
        }
    }

    fn apply(&mut self, patch: ClassPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if patch.room_location.is_some() {
            self.room_location = patch.room_location;
        }
        if patch.max_participants.is_some() {
            self.max_participants = patch.max_participants;
        }
        if let Some(equipment) = patch.equipment {
            self.equipment = equipment;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
        if let Some(sequence) = patch.sequence {
            self.sequence = sequence;
        }
        if let Some(schedule) = patch.schedule {
            self.schedule = schedule;
        }
    }

    fn validate(&self) -> Result<()> {
        require_text("class title", &self.title)?;
        require_text("class level", &self.level)?;
        require_text("class category", &self.category)?;
        self.schedule.validate()
    }
}

// ============================================================================
// Template Types
// ============================================================================

/// Reusable (level, duration, sequence) bundle
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub level: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub sequence: Sequence,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: NaiveDateTime,
}

/// Input for a new template; `created_at` defaults to now
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub level: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub sequence: Sequence,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Partial update for a template
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub level: Option<String>,
    pub duration_minutes: Option<u32>,
    pub sequence: Option<Sequence>,
    pub tags: Option<BTreeSet<String>>,
}

impl Entity for Template {
    type Draft = TemplateDraft;
    type Patch = TemplatePatch;
    const KIND: &'static str = "Template";

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: TemplateDraft) -> Self {
        Template {
            id,
            name: draft.name,
            description: draft.description,
            level: draft.level,
            duration_minutes: draft.duration_minutes,
            sequence: draft.sequence,
            tags: draft.tags,
            created_at: draft
                .created_at
                .unwrap_or_else(|| chrono::Local::now().naive_local()),
        }
    }

    fn apply(&mut self, patch: TemplatePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(minutes) = patch.duration_minutes {
            self.duration_minutes = minutes;
        }
        if let Some(sequence) = patch.sequence {
            self.sequence = sequence;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }

    fn validate(&self) -> Result<()> {
        require_text("template name", &self.name)?;
        require_text("template level", &self.level)?;
        if self.duration_minutes == 0 {
            return Err(Error::Validation("template duration must be positive".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Occurrence Type
// ============================================================================

/// One concrete dated instance of a class; derived, never stored
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub class_definition_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Occurrence {
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn weekday(&self) -> Weekday {
        self.start.weekday()
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_day_set_wire_format() {
        let set: DaySet = serde_json::from_str("[3, 1]").unwrap();
        assert!(set.contains(Weekday::Mon));
        assert!(set.contains(Weekday::Wed));
        assert_eq!(set.len(), 2);
        assert_eq!(serde_json::to_string(&set).unwrap(), "[1,3]");
    }

    #[test]
    fn test_day_set_rejects_out_of_range() {
        assert!(serde_json::from_str::<DaySet>("[7]").is_err());
    }

    #[test]
    fn test_day_set_from_str() {
        let by_index: DaySet = "1,3".parse().unwrap();
        let by_name: DaySet = "mon, Wed".parse().unwrap();
        assert_eq!(by_index, by_name);
        assert!("mon,funday".parse::<DaySet>().is_err());
    }

    #[test]
    fn test_anchor_from_end_or_duration() {
        let from_end: Anchor =
            serde_json::from_str(r#"{"start":"2024-03-04T09:00:00","end":"2024-03-04T10:15:00"}"#)
                .unwrap();
        assert_eq!(from_end.duration_minutes, 75);

        let from_minutes: Anchor =
            serde_json::from_str(r#"{"start":"2024-03-04T09:00","durationMinutes":45}"#).unwrap();
        assert_eq!(from_minutes.end(), at(2024, 3, 4, 9, 45));
    }

    #[test]
    fn test_anchor_rejects_end_before_start() {
        assert!(Anchor::from_start_end(at(2024, 3, 4, 10, 0), at(2024, 3, 4, 9, 0)).is_err());
        assert!(serde_json::from_str::<Anchor>(r#"{"start":"2024-03-04T09:00"}"#).is_err());
    }

    #[test]
    fn test_recurrence_rule_wire_format() {
        let rule: RecurrenceRule = serde_json::from_str(
            r#"{"kind":"recurring","pattern":"monthly","daysOfWeek":[2],"endDate":"2024-06-30T00:00:00.000Z"}"#,
        )
        .unwrap();
        match rule {
            RecurrenceRule::Recurring {
                pattern,
                days_of_week,
                end_date,
            } => {
                assert_eq!(pattern, RecurrencePattern::Monthly);
                assert!(days_of_week.contains(Weekday::Tue));
                assert_eq!(end_date, NaiveDate::from_ymd_opt(2024, 6, 30));
            }
            RecurrenceRule::None => panic!("expected recurring rule"),
        }

        let none: RecurrenceRule = serde_json::from_str(r#"{"kind":"none"}"#).unwrap();
        assert_eq!(none, RecurrenceRule::None);
    }

    #[test]
    fn test_schedule_validation() {
        let anchor = Anchor::new(at(2024, 3, 4, 9, 0), 60);

        let empty_days = Schedule {
            anchor,
            recurrence: RecurrenceRule::weekly(DaySet::empty(), None),
        };
        assert!(matches!(empty_days.validate(), Err(Error::Validation(_))));

        let ends_early = Schedule {
            anchor,
            recurrence: RecurrenceRule::weekly(
                DaySet::from_weekdays([Weekday::Mon]),
                NaiveDate::from_ymd_opt(2024, 3, 3),
            ),
        };
        assert!(matches!(ends_early.validate(), Err(Error::Validation(_))));

        let ends_same_day = Schedule {
            anchor,
            recurrence: RecurrenceRule::weekly(
                DaySet::from_weekdays([Weekday::Mon]),
                NaiveDate::from_ymd_opt(2024, 3, 4),
            ),
        };
        assert!(ends_same_day.validate().is_ok());
    }

    #[test]
    fn test_class_validation_requires_title() {
        let draft = ClassDraft::new("  ", "Beginner", Schedule::single(Anchor::new(at(2024, 3, 4, 9, 0), 60)));
        let class = ClassDefinition::from_draft("c1".into(), draft);
        assert!(matches!(class.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_class_draft_defaults_category() {
        let draft: ClassDraft = serde_json::from_str(
            r#"{"title":"Flow","level":"All Levels","schedule":{"anchor":{"start":"2024-03-04T09:00","durationMinutes":50}}}"#,
        )
        .unwrap();
        assert_eq!(draft.category, "Regular");
        assert_eq!(draft.schedule.recurrence, RecurrenceRule::None);
        assert!(draft.sequence.is_empty());
    }

    #[test]
    fn test_movement_patch_merges() {
        let mut movement = Movement::from_draft(
            "m1".into(),
            MovementDraft {
                name: "Teaser".into(),
                category: "Core".into(),
                level: "Advanced".into(),
                ..Default::default()
            },
        );
        movement.apply(MovementPatch {
            precaution_level: Some(PrecautionLevel::High),
            duration: Some("3 minutes".into()),
            ..Default::default()
        });
        assert_eq!(movement.name, "Teaser");
        assert_eq!(movement.precaution_level, PrecautionLevel::High);
        assert_eq!(movement.duration.as_deref(), Some("3 minutes"));
        assert!(!movement.is_catalog_seed);
    }
}
