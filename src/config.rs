//! Recipe configuration for a stitching run
//!
//! Every field is optional. A minimal recipe is an empty YAML mapping.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::facets::{FacetRegistry, ProjectMapping};
use crate::lineage::{StopCriterion, DEFAULT_STOP_MARKER, MAX_WALK_DEPTH};
use crate::units::{molar_mass, parse_unit, ConversionOptions};

/// Errors from reading a recipe
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read recipe: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse recipe: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid recipe: {0}")]
    Invalid(String),
}

/// Options for a stitching run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Experiments containing this string end a walk
    pub stitch_stop_string: String,
    /// Unit to convert stitched outputs to
    pub target_unit: Option<String>,
    /// Inputs were multiplied by cell area upstream
    pub area_multiplied_preprocessor: bool,
    /// Species whose molar mass converts amounts to masses
    pub mass_kind: Option<String>,
    /// Experiments never stitched as top-level children
    pub skip_experiments: Vec<String>,
    pub max_depth: usize,
    /// Per-child deadline for the parallel runner
    pub child_timeout_secs: Option<u64>,
    /// Facet mappings for projects beyond the built-in ones
    pub projects: Vec<ProjectMapping>,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            stitch_stop_string: DEFAULT_STOP_MARKER.to_string(),
            target_unit: None,
            area_multiplied_preprocessor: false,
            mass_kind: None,
            skip_experiments: Vec::new(),
            max_depth: MAX_WALK_DEPTH,
            child_timeout_secs: None,
            projects: Vec::new(),
        }
    }
}

impl StitchConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "read recipe");
        Self::from_yaml_str(&yaml)
    }

    /// Reject settings that would fail every child alike.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stitch_stop_string.is_empty() {
            return Err(ConfigError::Invalid("stitch_stop_string is empty".into()));
        }
        if let Some(target) = &self.target_unit {
            parse_unit(target).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if let Some(species) = &self.mass_kind {
            molar_mass(species).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    pub fn stop_criterion(&self) -> StopCriterion {
        StopCriterion::new(self.stitch_stop_string.clone())
    }

    pub fn conversion_options(&self) -> ConversionOptions {
        ConversionOptions {
            mass_kind: self.mass_kind.clone(),
            area_multiplied: self.area_multiplied_preprocessor,
        }
    }

    /// Built-in projects plus the recipe's own; recipe entries win.
    pub fn registry(&self) -> FacetRegistry {
        let mut registry = FacetRegistry::new();
        for mapping in &self.projects {
            if registry.register(mapping.clone()).is_some() {
                tracing::info!(project = %mapping.project, "recipe overrides built-in facet mapping");
            }
        }
        registry
    }

    pub fn child_timeout(&self) -> Option<Duration> {
        self.child_timeout_secs.map(Duration::from_secs)
    }

    pub fn is_skipped(&self, experiment: &str) -> bool {
        self.skip_experiments.iter().any(|e| e == experiment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_recipe_uses_defaults() {
        let config = StitchConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, StitchConfig::default());
        assert_eq!(config.stitch_stop_string, "piControl");
        assert_eq!(config.max_depth, 10);
        assert!(config.child_timeout().is_none());
    }

    #[test]
    fn reads_all_fields() {
        let yaml = r#"
stitch_stop_string: spinup
target_unit: Pg yr-1
area_multiplied_preprocessor: true
mass_kind: C
skip_experiments: [historical]
max_depth: 4
child_timeout_secs: 30
"#;
        let config = StitchConfig::from_yaml_str(yaml).unwrap();
        assert!(config.stop_criterion().matches("esm-spinup"));
        assert_eq!(config.target_unit.as_deref(), Some("Pg yr-1"));
        assert_eq!(
            config.conversion_options(),
            ConversionOptions::default().with_mass_kind("C").with_area_multiplied(true)
        );
        assert!(config.is_skipped("historical"));
        assert!(!config.is_skipped("ssp585"));
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.child_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn rejects_unparseable_target_unit() {
        let err = StitchConfig::from_yaml_str("target_unit: furlong fortnight-1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_overflowing_target_unit() {
        let err = StitchConfig::from_yaml_str("target_unit: m^2147483647 m").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_species() {
        let err = StitchConfig::from_yaml_str("mass_kind: Xe").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = StitchConfig::from_yaml_str("max_depth: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn recipe_projects_join_the_registry() {
        let yaml = r#"
projects:
  - project: TOYMIP
    attributes:
      experiment: exp
      model: dataset
      member: ensemble
      realm: activity
    parent_facets: [activity, exp, dataset, ensemble]
"#;
        let config = StitchConfig::from_yaml_str(yaml).unwrap();
        let registry = config.registry();
        assert_eq!(registry.projects(), vec!["CMIP5", "CMIP6", "TOYMIP"]);
    }

    #[test]
    fn reads_recipe_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipe.yml");
        std::fs::write(&path, "stitch_stop_string: piControl\nmax_depth: 3\n").unwrap();
        let config = StitchConfig::from_path(&path).unwrap();
        assert_eq!(config.max_depth, 3);
    }
}
