#![forbid(unsafe_code)]

//! Core domain model and business logic for the studio class calendar.
//!
//! This crate provides:
//! - Domain types (movements, class definitions, templates, occurrences)
//! - Movement catalog and generic repositories
//! - Sequence model with derived statistics
//! - Recurrence resolver for calendar windows
//! - Template/copy composition
//! - Persistence (locked JSON snapshot) and configuration

pub mod types;
pub mod error;
pub mod wire;
pub mod store;
pub mod catalog;
pub mod sequence;
pub mod recurrence;
pub mod composition;
pub mod config;
pub mod logging;
pub mod studio;
pub mod snapshot;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog, Catalog, MovementFilter};
pub use config::Config;
pub use sequence::{DurationEstimator, FixedPerMovement, ResolvedEntry, Sequence, SequenceStats};
pub use recurrence::{matches, occurrences_in_range, DateWindow};
pub use store::{Entity, MemoryRepository, Repository};
pub use studio::{resolve_occurrences, sequence_stats, CalendarView, DanglingReference, Studio};
pub use snapshot::StudioSnapshot;
pub use wire::{parse_date, parse_instant, parse_time};
