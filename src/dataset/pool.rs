//! CandidatePool: the records visible to one stitching run

use serde::{Deserialize, Serialize};

use super::{DatasetRecord, FileReference};
use crate::facets::{FacetMap, FacetRegistry};
use crate::io::CubeLoader;

/// Read-only collection of records parents are resolved from
///
/// Record uniqueness is assumed, not re-checked.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    records: Vec<DatasetRecord>,
}

impl CandidatePool {
    pub fn new(records: Vec<DatasetRecord>) -> Self {
        Self { records }
    }

    /// Build a pool from a manifest, loading each file once to read its
    /// global attributes.
    ///
    /// Facets listed explicitly in the manifest override those mapped from
    /// the attributes. Entries that cannot be loaded or mapped are skipped
    /// with a warning and returned alongside the pool.
    pub fn from_manifest(
        manifest: &PoolManifest,
        loader: &dyn CubeLoader,
        registry: &FacetRegistry,
    ) -> (Self, Vec<(FileReference, String)>) {
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        for entry in &manifest.datasets {
            match entry.to_record(loader, registry) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    tracing::warn!(file = %entry.file, %reason, "skipping pool entry");
                    skipped.push((entry.file.clone(), reason));
                }
            }
        }

        (Self::new(records), skipped)
    }

    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records matching every given facet
    pub fn select(&self, facets: &FacetMap) -> Vec<&DatasetRecord> {
        self.records.iter().filter(|r| r.matches(facets)).collect()
    }
}

/// The datasets a run may draw on, as listed in a pool file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolManifest {
    pub datasets: Vec<ManifestEntry>,
}

/// One dataset of a [`PoolManifest`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: FileReference,
    pub project: String,
    /// Facets to use instead of those found in the file's attributes
    #[serde(default)]
    pub facets: FacetMap,
}

impl ManifestEntry {
    fn to_record(&self, loader: &dyn CubeLoader, registry: &FacetRegistry) -> Result<DatasetRecord, String> {
        let cube = loader.load(&self.file).map_err(|e| e.to_string())?;
        let mut facets = registry
            .to_canonical(&cube.attributes, &self.project)
            .map_err(|e| e.to_string())?;
        facets.extend(self.facets.iter().map(|(k, v)| (*k, v.clone())));
        DatasetRecord::from_facets(&self.project, &facets, self.file.clone(), cube.attributes)
            .map_err(|e| e.to_string())
    }
}
