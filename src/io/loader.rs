//! Cube loaders: resolve a file reference to a cube

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::dataset::{Cube, CubeError, FileReference};

/// Errors that can occur while loading a cube
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No cube for reference: {0}")]
    NotFound(FileReference),

    #[error("IO error reading {reference}: {source}")]
    Io {
        reference: FileReference,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {reference}: {message}")]
    Parse {
        reference: FileReference,
        message: String,
    },

    #[error("Invalid cube: {0}")]
    Invalid(#[from] CubeError),
}

/// Materializes the array behind a file reference.
///
/// Implementations must fail with a [`LoadError`] rather than return an
/// empty cube when the reference cannot be read.
pub trait CubeLoader: Send + Sync {
    fn load(&self, reference: &FileReference) -> Result<Cube, LoadError>;
}

/// Loader over cubes held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    cubes: HashMap<FileReference, Cube>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<FileReference>, cube: Cube) {
        self.cubes.insert(reference.into(), cube);
    }

    pub fn with_cube(mut self, reference: impl Into<FileReference>, cube: Cube) -> Self {
        self.insert(reference, cube);
        self
    }

    pub fn len(&self) -> usize {
        self.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cubes.is_empty()
    }
}

impl CubeLoader for MemoryLoader {
    fn load(&self, reference: &FileReference) -> Result<Cube, LoadError> {
        self.cubes
            .get(reference)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(reference.clone()))
    }
}

/// Loader reading cubes serialized as JSON files
///
/// Relative references resolve against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct JsonCubeLoader {
    root: Option<PathBuf>,
}

impl JsonCubeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn path_for(&self, reference: &FileReference) -> PathBuf {
        let path = PathBuf::from(reference.as_str());
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

impl CubeLoader for JsonCubeLoader {
    fn load(&self, reference: &FileReference) -> Result<Cube, LoadError> {
        let path = self.path_for(reference);
        let text = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(reference.clone())
            } else {
                LoadError::Io {
                    reference: reference.clone(),
                    source,
                }
            }
        })?;
        let cube: Cube = serde_json::from_str(&text).map_err(|e| LoadError::Parse {
            reference: reference.clone(),
            message: e.to_string(),
        })?;
        cube.validate()?;
        tracing::debug!(reference = %reference, steps = cube.time_len(), "loaded cube");
        Ok(cube)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TimeAxis;
    use crate::time::Calendar;
    use tempfile::TempDir;

    fn cube() -> Cube {
        let time = TimeAxis::new(
            vec![15.5, 45.0],
            "days since 2015-01-01".parse().unwrap(),
            Calendar::NoLeap,
        );
        Cube::new("tas", "K", time, vec![], vec![288.0, 289.0]).unwrap()
    }

    #[test]
    fn memory_loader_reports_missing_reference() {
        let loader = MemoryLoader::new().with_cube("a.json", cube());
        assert!(loader.load(&"a.json".into()).is_ok());
        assert!(matches!(loader.load(&"b.json".into()), Err(LoadError::NotFound(_))));
    }

    #[test]
    fn json_loader_reads_relative_to_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("tas.json"), serde_json::to_string(&cube()).unwrap()).unwrap();

        let loader = JsonCubeLoader::with_root(dir.path());
        let loaded = loader.load(&"tas.json".into()).unwrap();
        assert_eq!(loaded, cube());
    }

    #[test]
    fn json_loader_distinguishes_missing_and_corrupt() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let loader = JsonCubeLoader::with_root(dir.path());

        assert!(matches!(loader.load(&"gone.json".into()), Err(LoadError::NotFound(_))));
        assert!(matches!(loader.load(&"bad.json".into()), Err(LoadError::Parse { .. })));
    }

    #[test]
    fn json_loader_validates_shape() {
        let dir = TempDir::new().unwrap();
        let mut broken = cube();
        broken.data.pop();
        std::fs::write(dir.path().join("short.json"), serde_json::to_string(&broken).unwrap()).unwrap();
        let loader = JsonCubeLoader::with_root(dir.path());
        assert!(matches!(loader.load(&"short.json".into()), Err(LoadError::Invalid(_))));
    }
}
