//! Studio persistence with file locking.
//!
//! The whole studio (movements, classes, templates) is stored as a single
//! JSON document. Writers replace it atomically; readers take a shared lock.

use crate::catalog::{get_default_catalog, Catalog};
use crate::store::{Entity, MemoryRepository, Repository};
use crate::studio::Studio;
use crate::{ClassDefinition, Config, Error, Movement, Result, Template};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Serialized form of a studio
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioSnapshot {
    #[serde(default)]
    pub movements: Vec<Movement>,
    #[serde(default)]
    pub classes: Vec<ClassDefinition>,
    #[serde(default)]
    pub templates: Vec<Template>,
}

impl StudioSnapshot {
    /// Seed movements, no classes or templates
    pub fn seeded() -> Self {
        Self {
            movements: get_default_catalog().list(),
            ..Default::default()
        }
    }

    /// Load a snapshot from a file with shared locking
    ///
    /// Returns the seeded snapshot if the file doesn't exist. If the file is
    /// corrupted, it is copied aside to `<name>.corrupt`, a warning is
    /// logged, and the seeded snapshot is returned. Records that fail
    /// validation are dropped; the file is then copied aside the same way so
    /// the next save does not lose them for good.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No studio file found, starting from the seed catalog");
            return Ok(Self::seeded());
        }

        let file = File::open(path)?;

        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;

        if let Err(e) = read {
            tracing::warn!("Failed to read studio file {:?}: {}. Using seed data.", path, e);
            preserve_corrupt(path);
            return Ok(Self::seeded());
        }

        match serde_json::from_str::<StudioSnapshot>(&contents) {
            Ok(mut snapshot) => {
                if snapshot.retain_valid() > 0 {
                    preserve_corrupt(path);
                }
                tracing::debug!(
                    "Loaded {} movements, {} classes, {} templates from {:?}",
                    snapshot.movements.len(),
                    snapshot.classes.len(),
                    snapshot.templates.len(),
                    path
                );
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!("Failed to parse studio file {:?}: {}. Using seed data.", path, e);
                preserve_corrupt(path);
                Ok(Self::seeded())
            }
        }
    }

    /// Drop records that fail validation, returning how many were dropped
    pub fn retain_valid(&mut self) -> usize {
        retain_valid(&mut self.movements)
            + retain_valid(&mut self.classes)
            + retain_valid(&mut self.templates)
    }

    /// Save the snapshot to a file with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::Other(format!("studio path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(parent)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old studio file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved studio to {:?}", path);
        Ok(())
    }
}

fn retain_valid<T: Entity>(records: &mut Vec<T>) -> usize {
    let before = records.len();
    records.retain(|record| match record.validate() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Dropping invalid {} '{}': {}", T::KIND, record.id(), e);
            false
        }
    });
    before - records.len()
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

fn preserve_corrupt(path: &Path) {
    let target = corrupt_path(path);
    if let Err(e) = std::fs::copy(path, &target) {
        tracing::warn!("Could not preserve corrupted studio file at {:?}: {}", target, e);
    }
}

impl Studio {
    /// Build a studio from stored records; invalid records are left out
    pub fn from_snapshot(mut snapshot: StudioSnapshot, config: &Config) -> Self {
        snapshot.retain_valid();
        Studio::with_repositories(
            Catalog::from_movements(snapshot.movements),
            MemoryRepository::from_items(snapshot.classes),
            MemoryRepository::from_items(snapshot.templates),
            config,
        )
    }

    pub fn snapshot(&self) -> StudioSnapshot {
        StudioSnapshot {
            movements: self.movements().list(),
            classes: self.classes().list(),
            templates: self.templates().list(),
        }
    }

    /// Load the studio stored at `path`
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        Ok(Self::from_snapshot(StudioSnapshot::load(path)?, config))
    }

    /// Store the studio at `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        self.snapshot().save(path)
    }

    /// Load, modify, and save back
    pub fn update<F, R>(path: &Path, config: &Config, f: F) -> Result<R>
    where
        F: FnOnce(&mut Studio) -> Result<R>,
    {
        let mut studio = Self::open(path, config)?;
        let result = f(&mut studio)?;
        studio.save(path)?;
        Ok(result)
    }
}
