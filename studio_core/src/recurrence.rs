//! Recurrence resolver.
//!
//! Turns class definitions into concrete occurrences for a window of
//! calendar days. Resolution is pure: it reads the definitions it is given,
//! keeps no cache, and can be repeated on every render.
//!
//! Rules, per candidate day `d`:
//! - single class: `d` is the anchor's calendar day
//! - recurring class: `d` is not after the end date, falls on one of the
//!   recurrence weekdays, and is not before the anchor day
//!
//! The `Monthly` pattern goes through the same weekday check as `Weekly`.
//! There is no day-of-month logic.

use crate::{ClassDefinition, Error, Occurrence, RecurrenceRule, Result};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// Days in a month grid: six full weeks
pub const MONTH_GRID_DAYS: u64 = 42;

/// Days in a week view
pub const WEEK_DAYS: u64 = 7;

/// Does `class` have an occurrence on `date`?
///
/// Comparison is by calendar day; the class's time of day is irrelevant.
/// Assumes the definition passed validation (non-empty weekday set).
pub fn matches(class: &ClassDefinition, date: NaiveDate) -> bool {
    let anchor_date = class.schedule.anchor.date();

    match &class.schedule.recurrence {
        RecurrenceRule::None => date == anchor_date,
        RecurrenceRule::Recurring {
            days_of_week,
            end_date,
            ..
        } => {
            if end_date.is_some_and(|end| date > end) {
                return false;
            }
            if !days_of_week.contains(date.weekday()) {
                return false;
            }
            date >= anchor_date
        }
    }
}

/// Like [`matches`], for a point in time
pub fn matches_instant(class: &ClassDefinition, instant: NaiveDateTime) -> bool {
    matches(class, instant.date())
}

/// The occurrence of `class` on `date`, if there is one
pub fn occurrence_on(class: &ClassDefinition, date: NaiveDate) -> Option<Occurrence> {
    if !matches(class, date) {
        return None;
    }
    let anchor = &class.schedule.anchor;
    let start = date.and_time(anchor.time());
    Some(Occurrence {
        class_definition_id: class.id.clone(),
        start,
        end: start + anchor.duration(),
    })
}

/// Inclusive range of calendar days
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::Validation(format!(
                "range end {} is before range start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Window covering just `date`
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Window of `days` days beginning at `start`
    pub fn starting_at(start: NaiveDate, days: u64) -> Result<Self> {
        let last = days
            .checked_sub(1)
            .and_then(|offset| start.checked_add_days(Days::new(offset)))
            .ok_or_else(|| Error::Validation(format!("cannot build a {}-day window", days)))?;
        Self::new(start, last)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn num_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Every day in the window, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + Clone {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Most recent `week_start` on or before `date`
pub fn start_of_week(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = (7 + date.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    date - Days::new(u64::from(back))
}

/// The 42-day grid shown for a month: starts on the week containing the
/// 1st and pads with days from the adjacent months.
pub fn month_grid(year: i32, month: u32, week_start: Weekday) -> Result<DateWindow> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidDate(format!("{}-{:02}", year, month)))?;
    DateWindow::starting_at(start_of_week(first, week_start), MONTH_GRID_DAYS)
}

/// The 7-day window containing `date`
pub fn week_window(date: NaiveDate, week_start: Weekday) -> Result<DateWindow> {
    DateWindow::starting_at(start_of_week(date, week_start), WEEK_DAYS)
}

/// Lazy, restartable stream of occurrences over a window.
///
/// Ordered by start instant, ties broken by class definition id. Cloning
/// restarts from the current position; calling [`occurrences_in_range`]
/// again restarts from the beginning.
#[derive(Clone, Debug)]
pub struct Occurrences<'a> {
    // Sorted by (time of day, id) so per-day output is already in order.
    classes: Vec<&'a ClassDefinition>,
    next_day: Option<NaiveDate>,
    end: NaiveDate,
    day_buffer: std::vec::IntoIter<Occurrence>,
}

impl Iterator for Occurrences<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        loop {
            if let Some(occurrence) = self.day_buffer.next() {
                return Some(occurrence);
            }

            let day = self.next_day.filter(|d| *d <= self.end)?;
            self.next_day = day.succ_opt();
            self.day_buffer = self
                .classes
                .iter()
                .filter_map(|class| occurrence_on(class, day))
                .collect::<Vec<_>>()
                .into_iter();
        }
    }
}

/// Enumerate every occurrence of `classes` inside `window`
pub fn occurrences_in_range<'a, I>(classes: I, window: DateWindow) -> Occurrences<'a>
where
    I: IntoIterator<Item = &'a ClassDefinition>,
{
    let mut classes: Vec<&ClassDefinition> = classes.into_iter().collect();
    classes.sort_by(|a, b| {
        a.schedule
            .anchor
            .time()
            .cmp(&b.schedule.anchor.time())
            .then_with(|| a.id.cmp(&b.id))
    });

    tracing::debug!(
        "Resolving {} classes over {} .. {} ({} days)",
        classes.len(),
        window.start(),
        window.end(),
        window.num_days()
    );

    Occurrences {
        classes,
        next_day: Some(window.start()),
        end: window.end(),
        day_buffer: Vec::new().into_iter(),
    }
}
