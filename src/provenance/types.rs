//! Provenance record attached to every stitched output.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::lineage::WalkState;

/// Where a stitched series came from
///
/// `ancestors` and `experiments` are in traversal order: the child first,
/// the most ancestral record last. Ancestors whose data was cut away
/// entirely still appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub caption: String,
    pub ancestors: Vec<String>,
    pub experiments: Vec<String>,
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub ensemble: String,
    #[serde(default)]
    pub variable: String,
    #[serde(default)]
    pub units: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<WalkState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_factor: Option<f64>,
}

impl Provenance {
    pub fn with_stop_reason(mut self, state: WalkState) -> Self {
        self.stop_reason = Some(state);
        self
    }

    pub fn with_dropped_attributes(mut self, dropped: &BTreeSet<String>) -> Self {
        self.dropped_attributes = dropped.iter().cloned().collect();
        self
    }

    pub fn with_conversion_factor(mut self, factor: Option<f64>) -> Self {
        self.conversion_factor = factor;
        self
    }

    /// The most ancestral experiment, if any
    pub fn earliest_experiment(&self) -> Option<&str> {
        self.experiments.last().map(String::as_str)
    }
}
