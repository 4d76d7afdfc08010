//! Persistence of stitched outputs

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::dataset::Cube;
use crate::provenance::Provenance;

/// Errors that can occur while persisting an output
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Accepts finished outputs; responsible for serialization and cataloging.
pub trait Persistence: Send + Sync {
    fn save(&self, identifier: &str, provenance: &Provenance, cube: &Cube) -> Result<(), PersistError>;
}

/// Writes `<identifier>.json` and `<identifier>.provenance.json` into a
/// directory.
#[derive(Debug, Clone)]
pub struct JsonDirectoryStore {
    dir: PathBuf,
}

impl JsonDirectoryStore {
    /// Open a store, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cube_path(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{}.json", identifier))
    }

    pub fn provenance_path(&self, identifier: &str) -> PathBuf {
        self.dir.join(format!("{}.provenance.json", identifier))
    }
}

impl Persistence for JsonDirectoryStore {
    fn save(&self, identifier: &str, provenance: &Provenance, cube: &Cube) -> Result<(), PersistError> {
        std::fs::write(self.cube_path(identifier), serde_json::to_string(cube)?)?;
        std::fs::write(
            self.provenance_path(identifier),
            serde_json::to_string_pretty(provenance)?,
        )?;
        tracing::info!(identifier, dir = %self.dir.display(), "saved stitched output");
        Ok(())
    }
}

/// Keeps saved outputs in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Vec<(String, Provenance, Cube)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers saved so far, in save order
    pub fn identifiers(&self) -> Vec<String> {
        self.saved
            .lock()
            .map(|saved| saved.iter().map(|(id, _, _)| id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, identifier: &str) -> Option<(Provenance, Cube)> {
        let saved = self.saved.lock().ok()?;
        saved
            .iter()
            .find(|(id, _, _)| id == identifier)
            .map(|(_, p, c)| (p.clone(), c.clone()))
    }
}

impl Persistence for MemoryStore {
    fn save(&self, identifier: &str, provenance: &Provenance, cube: &Cube) -> Result<(), PersistError> {
        let mut saved = self.saved.lock().map_err(|_| PersistError::Poisoned)?;
        saved.push((identifier.to_string(), provenance.clone(), cube.clone()));
        Ok(())
    }
}
