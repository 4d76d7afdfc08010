//! FacetRegistry: project name -> ProjectMapping

use std::collections::{BTreeMap, HashMap};

use super::{FacetError, FacetMap, ProjectMapping};
use crate::dataset::Attributes;

/// Registry of known project vocabularies
#[derive(Debug, Clone)]
pub struct FacetRegistry {
    projects: HashMap<String, ProjectMapping>,
}

impl FacetRegistry {
    /// Registry with the built-in projects
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(ProjectMapping::cmip5());
        registry.register(ProjectMapping::cmip6());
        registry
    }

    pub fn empty() -> Self {
        Self {
            projects: HashMap::new(),
        }
    }

    /// Register a project mapping, returning the one it replaces.
    pub fn register(&mut self, mapping: ProjectMapping) -> Option<ProjectMapping> {
        self.projects.insert(mapping.project.clone(), mapping)
    }

    pub fn get(&self, project: &str) -> Result<&ProjectMapping, FacetError> {
        self.projects
            .get(project)
            .ok_or_else(|| FacetError::UnsupportedProject(project.to_string()))
    }

    /// Names of all registered projects, sorted
    pub fn projects(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.projects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn to_canonical(&self, raw: &Attributes, project: &str) -> Result<FacetMap, FacetError> {
        Ok(self.get(project)?.to_canonical(raw))
    }

    pub fn parent_facets(&self, raw: &Attributes, project: &str) -> Result<FacetMap, FacetError> {
        self.get(project)?.parent_facets(raw)
    }

    pub fn to_native(
        &self,
        facets: &FacetMap,
        project: &str,
    ) -> Result<BTreeMap<String, String>, FacetError> {
        Ok(self.get(project)?.to_native(facets))
    }
}

impl Default for FacetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::Facet;

    #[test]
    fn knows_cmip_projects_by_default() {
        let registry = FacetRegistry::new();
        assert_eq!(registry.projects(), vec!["CMIP5", "CMIP6"]);
        assert!(registry.get("CMIP6").is_ok());
    }

    #[test]
    fn unknown_project_is_unsupported() {
        let registry = FacetRegistry::new();
        let err = registry.parent_facets(&Attributes::new(), "CMIP7").unwrap_err();
        assert_eq!(err, FacetError::UnsupportedProject("CMIP7".into()));
    }

    #[test]
    fn registering_replaces_existing_mapping() {
        let mut registry = FacetRegistry::new();
        let mut custom = ProjectMapping::cmip6();
        custom.parent_prefix = "origin_".into();
        let replaced = registry.register(custom);
        assert!(replaced.is_some());
        let key = registry.get("CMIP6").unwrap().parent_key(Facet::Experiment);
        assert_eq!(key.as_deref(), Some("origin_experiment_id"));
    }
}
