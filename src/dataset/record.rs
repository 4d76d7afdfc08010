//! DatasetRecord: facets and file handle of one simulation output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::Attributes;
use crate::facets::{Facet, FacetError, FacetMap};

/// Opaque handle a loader resolves to a cube
///
/// Serializes as a plain string (usually a file path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileReference(String);

impl FileReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FileReference {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FileReference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&Path> for FileReference {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().to_string())
    }
}

/// Metadata of one simulation output file
///
/// The identity facets (activity, experiment, dataset, ensemble, mip,
/// short name, grid) name exactly one record within a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub project: String,
    pub activity: String,
    #[serde(rename = "exp")]
    pub experiment: String,
    pub dataset: String,
    pub ensemble: String,
    pub mip: String,
    pub short_name: String,
    pub grid: String,
    pub file: FileReference,
    /// Unmapped project-native metadata
    #[serde(default)]
    pub attributes: Attributes,
}

impl DatasetRecord {
    /// Build a record from canonical facets. All identity facets must be
    /// present.
    pub fn from_facets(
        project: impl Into<String>,
        facets: &FacetMap,
        file: FileReference,
        attributes: Attributes,
    ) -> Result<Self, FacetError> {
        let label = file.to_string();
        let get = |facet: Facet| {
            facets.get(&facet).cloned().ok_or_else(|| FacetError::MissingFacet {
                facet,
                file: label.clone(),
            })
        };
        Ok(Self {
            project: project.into(),
            activity: get(Facet::Activity)?,
            experiment: get(Facet::Experiment)?,
            dataset: get(Facet::Dataset)?,
            ensemble: get(Facet::Ensemble)?,
            mip: get(Facet::Mip)?,
            short_name: get(Facet::ShortName)?,
            grid: get(Facet::Grid)?,
            file,
            attributes,
        })
    }

    /// Value of a facet; `None` for facets a record does not carry
    pub fn facet(&self, facet: Facet) -> Option<&str> {
        match facet {
            Facet::Activity => Some(&self.activity),
            Facet::Experiment => Some(&self.experiment),
            Facet::Dataset => Some(&self.dataset),
            Facet::Ensemble => Some(&self.ensemble),
            Facet::Mip => Some(&self.mip),
            Facet::ShortName => Some(&self.short_name),
            Facet::Grid => Some(&self.grid),
            Facet::Project => Some(&self.project),
            Facet::Institute => None,
        }
    }

    /// The identity facets
    pub fn identity(&self) -> FacetMap {
        Facet::IDENTITY
            .iter()
            .filter_map(|f| self.facet(*f).map(|v| (*f, v.to_string())))
            .collect()
    }

    /// Whether every given facet has the given value
    pub fn matches(&self, facets: &FacetMap) -> bool {
        facets
            .iter()
            .all(|(facet, value)| self.facet(*facet) == Some(value.as_str()))
    }

    /// Short human-readable label for logs
    pub fn label(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.dataset, self.experiment, self.ensemble, self.mip, self.short_name, self.grid
        )
    }
}
