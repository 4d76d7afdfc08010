//! Facet vocabulary and per-project attribute mappings
//!
//! Every project names its global attributes differently. A
//! [`ProjectMapping`] is the pure-data description of one project's
//! vocabulary; the [`FacetRegistry`] keys those descriptions by project
//! name so adding a project never needs new code.

mod mapping;
mod registry;

pub use mapping::ProjectMapping;
pub use registry::FacetRegistry;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Canonical metadata dimension identifying a simulation output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Activity,
    #[serde(rename = "exp")]
    Experiment,
    Dataset,
    Ensemble,
    Mip,
    ShortName,
    Grid,
    Project,
    Institute,
}

impl Facet {
    /// Facets that together identify one record in a pool
    pub const IDENTITY: [Facet; 7] = [
        Facet::Activity,
        Facet::Experiment,
        Facet::Dataset,
        Facet::Ensemble,
        Facet::Mip,
        Facet::ShortName,
        Facet::Grid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Experiment => "exp",
            Self::Dataset => "dataset",
            Self::Ensemble => "ensemble",
            Self::Mip => "mip",
            Self::ShortName => "short_name",
            Self::Grid => "grid",
            Self::Project => "project",
            Self::Institute => "institute",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Facet values keyed by canonical facet
pub type FacetMap = BTreeMap<Facet, String>;

/// Render a facet map as `key=value` pairs for logs and errors.
pub fn describe(facets: &FacetMap) -> String {
    facets
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from facet mapping
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FacetError {
    #[error("Unsupported project: {0}")]
    UnsupportedProject(String),

    #[error("Attribute '{key}' required by project {project} is missing")]
    MissingAttribute { project: String, key: String },

    #[error("Attribute '{key}' has unusable value '{value}'")]
    InvalidAttribute { key: String, value: String },

    #[error("Project {project} has no attribute mapped to facet '{facet}'")]
    Unmapped { project: String, facet: Facet },

    #[error("Facet '{facet}' missing for {file}")]
    MissingFacet { facet: Facet, file: String },
}
