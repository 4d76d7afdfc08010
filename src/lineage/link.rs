//! BranchLink: a child's pointer to its parent, as facets

use crate::dataset::DatasetRecord;
use crate::facets::{Facet, FacetError, FacetMap, FacetRegistry};

/// Facets identifying a record's parent
///
/// Read from the record's parent attributes and completed with the
/// record's own values for identity facets the project does not record
/// for parents (the parent holds the same variable on the same grid).
#[derive(Debug, Clone, PartialEq)]
pub struct BranchLink {
    facets: FacetMap,
}

impl BranchLink {
    pub fn from_child(child: &DatasetRecord, registry: &FacetRegistry) -> Result<Self, FacetError> {
        let mut facets = registry.parent_facets(&child.attributes, &child.project)?;
        for facet in Facet::IDENTITY {
            if let (false, Some(value)) = (facets.contains_key(&facet), child.facet(facet)) {
                facets.insert(facet, value.to_string());
            }
        }
        Ok(Self { facets })
    }

    pub fn facets(&self) -> &FacetMap {
        &self.facets
    }

    pub fn experiment(&self) -> &str {
        self.get(Facet::Experiment)
    }

    pub fn activity(&self) -> &str {
        self.get(Facet::Activity)
    }

    /// The lookup key with the activity facet dropped
    pub fn without_activity(&self) -> FacetMap {
        let mut facets = self.facets.clone();
        facets.remove(&Facet::Activity);
        facets
    }

    fn get(&self, facet: Facet) -> &str {
        self.facets.get(&facet).map(String::as_str).unwrap_or_default()
    }
}
