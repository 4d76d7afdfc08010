//! ProjectMapping: one project's attribute vocabulary as data

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Facet, FacetError, FacetMap};
use crate::dataset::{AttributeValue, Attributes};

fn default_parent_prefix() -> String {
    "parent_".to_string()
}

fn default_branch_time_key() -> String {
    "branch_time_in_parent".to_string()
}

fn default_parent_time_units_key() -> Option<String> {
    Some("parent_time_units".to_string())
}

/// How one project encodes facets in its global attributes
///
/// Loadable from a recipe, e.g.
///
/// ```yaml
/// project: TOYMIP
/// attributes: { experiment: exp, model: dataset, member: ensemble }
/// parent_facets: [exp, dataset, ensemble]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMapping {
    /// Project name as it appears in recipes (`CMIP6`)
    pub project: String,
    /// Native attribute key -> canonical facet. Several keys may map to
    /// one facet.
    pub attributes: BTreeMap<String, Facet>,
    /// Native key used for a facet when several map to it
    #[serde(default)]
    pub preferred: BTreeMap<Facet, String>,
    /// Prefix marking attributes that describe the parent run
    #[serde(default = "default_parent_prefix")]
    pub parent_prefix: String,
    /// Facets read from the parent attributes, in lookup order
    pub parent_facets: Vec<Facet>,
    /// Parent attribute keys that do not follow `<prefix><native key>`
    #[serde(default)]
    pub parent_keys: BTreeMap<Facet, String>,
    #[serde(default = "default_branch_time_key")]
    pub branch_time_key: String,
    /// Attribute holding the units `branch_time_key` is expressed in
    #[serde(default = "default_parent_time_units_key")]
    pub parent_time_units_key: Option<String>,
}

impl ProjectMapping {
    /// The CMIP6 data request vocabulary
    pub fn cmip6() -> Self {
        let attributes = [
            ("activity_drs", Facet::Activity),
            ("activity_id", Facet::Activity),
            ("experiment_id", Facet::Experiment),
            ("grid_label", Facet::Grid),
            ("institution_id", Facet::Institute),
            ("member_id", Facet::Ensemble),
            ("mip_era", Facet::Project),
            ("source_id", Facet::Dataset),
            ("table_id", Facet::Mip),
            ("variable", Facet::ShortName),
            ("variable_id", Facet::ShortName),
            ("variant_label", Facet::Ensemble),
        ]
        .into_iter()
        .map(|(k, f)| (k.to_string(), f))
        .collect();

        let preferred = [
            (Facet::Activity, "activity_id"),
            (Facet::Ensemble, "variant_label"),
            (Facet::ShortName, "variable_id"),
        ]
        .into_iter()
        .map(|(f, k)| (f, k.to_string()))
        .collect();

        Self {
            project: "CMIP6".to_string(),
            attributes,
            preferred,
            parent_prefix: default_parent_prefix(),
            parent_facets: vec![
                Facet::Activity,
                Facet::Experiment,
                Facet::Dataset,
                Facet::Ensemble,
            ],
            parent_keys: BTreeMap::new(),
            branch_time_key: default_branch_time_key(),
            parent_time_units_key: default_parent_time_units_key(),
        }
    }

    /// The CMIP5 vocabulary
    ///
    /// CMIP5 files carry no activity, table or grid attributes; those facets
    /// come from the pool manifest. Parents are named by experiment and
    /// `rip` member only, and the branch time is in the parent's own units.
    pub fn cmip5() -> Self {
        let attributes = [
            ("experiment_id", Facet::Experiment),
            ("institute_id", Facet::Institute),
            ("model_id", Facet::Dataset),
            ("project_id", Facet::Project),
        ]
        .into_iter()
        .map(|(k, f)| (k.to_string(), f))
        .collect();

        let parent_keys = [(Facet::Ensemble, "parent_experiment_rip".to_string())]
            .into_iter()
            .collect();

        Self {
            project: "CMIP5".to_string(),
            attributes,
            preferred: BTreeMap::new(),
            parent_prefix: default_parent_prefix(),
            parent_facets: vec![Facet::Experiment, Facet::Ensemble],
            parent_keys,
            branch_time_key: "branch_time".to_string(),
            parent_time_units_key: None,
        }
    }

    /// Native attribute key for a facet
    pub fn native_key(&self, facet: Facet) -> Option<&str> {
        if let Some(key) = self.preferred.get(&facet) {
            return Some(key.as_str());
        }
        self.attributes
            .iter()
            .find(|(_, f)| **f == facet)
            .map(|(k, _)| k.as_str())
    }

    /// Attribute key holding the parent's value for a facet
    pub fn parent_key(&self, facet: Facet) -> Option<String> {
        if let Some(key) = self.parent_keys.get(&facet) {
            return Some(key.clone());
        }
        self.native_key(facet)
            .map(|native| format!("{}{}", self.parent_prefix, native))
    }

    /// Translate native attributes into canonical facets.
    ///
    /// Attributes the mapping does not know are ignored. When two native
    /// keys map to the same facet the preferred key wins.
    pub fn to_canonical(&self, raw: &Attributes) -> FacetMap {
        let mut facets = FacetMap::new();
        for (native, facet) in &self.attributes {
            let Some(value) = raw.get(native) else {
                continue;
            };
            let preferred = self.native_key(*facet) == Some(native.as_str());
            if preferred || !facets.contains_key(facet) {
                facets.insert(*facet, value.to_string());
            }
        }
        facets
    }

    /// Translate canonical facets back to native attribute keys.
    pub fn to_native(&self, facets: &FacetMap) -> BTreeMap<String, String> {
        facets
            .iter()
            .filter_map(|(facet, value)| {
                self.native_key(*facet)
                    .map(|key| (key.to_string(), value.clone()))
            })
            .collect()
    }

    /// Read the parent's facets from a child's raw attributes.
    pub fn parent_facets(&self, raw: &Attributes) -> Result<FacetMap, FacetError> {
        let mut facets = FacetMap::new();
        for facet in &self.parent_facets {
            let key = self.parent_key(*facet).ok_or_else(|| FacetError::Unmapped {
                project: self.project.clone(),
                facet: *facet,
            })?;
            let value = raw.get(&key).ok_or_else(|| FacetError::MissingAttribute {
                project: self.project.clone(),
                key: key.clone(),
            })?;
            facets.insert(*facet, value.to_string());
        }
        Ok(facets)
    }

    /// The child's branch time, in the units named by
    /// [`ProjectMapping::parent_time_units`].
    pub fn branch_time(&self, raw: &Attributes) -> Result<f64, FacetError> {
        let value = raw
            .get(&self.branch_time_key)
            .ok_or_else(|| FacetError::MissingAttribute {
                project: self.project.clone(),
                key: self.branch_time_key.clone(),
            })?;
        value.as_f64().ok_or_else(|| FacetError::InvalidAttribute {
            key: self.branch_time_key.clone(),
            value: value.to_string(),
        })
    }

    pub fn parent_time_units<'a>(&self, raw: &'a Attributes) -> Option<&'a AttributeValue> {
        self.parent_time_units_key
            .as_ref()
            .and_then(|key| raw.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_attributes() -> Attributes {
        let mut raw = Attributes::new();
        raw.insert("activity_id".into(), "ScenarioMIP".into());
        raw.insert("activity_drs".into(), "ScenarioMIP-legacy".into());
        raw.insert("experiment_id".into(), "ssp585".into());
        raw.insert("source_id".into(), "MPI-ESM1-2-LR".into());
        raw.insert("variant_label".into(), "r1i1p1f1".into());
        raw.insert("table_id".into(), "Amon".into());
        raw.insert("variable_id".into(), "tas".into());
        raw.insert("grid_label".into(), "gn".into());
        raw.insert("parent_activity_id".into(), "CMIP".into());
        raw.insert("parent_experiment_id".into(), "historical".into());
        raw.insert("parent_source_id".into(), "MPI-ESM1-2-LR".into());
        raw.insert("parent_variant_label".into(), "r1i1p1f1".into());
        raw.insert("branch_time_in_parent".into(), AttributeValue::Number(60265.0));
        raw.insert("parent_time_units".into(), "days since 1850-1-1".into());
        raw
    }

    #[test]
    fn maps_cmip6_attributes_to_facets() {
        let facets = ProjectMapping::cmip6().to_canonical(&child_attributes());
        assert_eq!(facets[&Facet::Activity], "ScenarioMIP");
        assert_eq!(facets[&Facet::Experiment], "ssp585");
        assert_eq!(facets[&Facet::Dataset], "MPI-ESM1-2-LR");
        assert_eq!(facets[&Facet::Ensemble], "r1i1p1f1");
        assert_eq!(facets[&Facet::Mip], "Amon");
        assert_eq!(facets[&Facet::ShortName], "tas");
        assert_eq!(facets[&Facet::Grid], "gn");
    }

    #[test]
    fn reads_parent_facets_with_prefix() {
        let parent = ProjectMapping::cmip6().parent_facets(&child_attributes()).unwrap();
        assert_eq!(parent.len(), 4);
        assert_eq!(parent[&Facet::Activity], "CMIP");
        assert_eq!(parent[&Facet::Experiment], "historical");
        assert_eq!(parent[&Facet::Ensemble], "r1i1p1f1");
    }

    #[test]
    fn missing_parent_attribute_names_the_key() {
        let mut raw = child_attributes();
        raw.remove("parent_source_id");
        let err = ProjectMapping::cmip6().parent_facets(&raw).unwrap_err();
        assert_eq!(
            err,
            FacetError::MissingAttribute {
                project: "CMIP6".into(),
                key: "parent_source_id".into()
            }
        );
    }

    #[test]
    fn to_native_uses_preferred_keys() {
        let mapping = ProjectMapping::cmip6();
        let facets = mapping.to_canonical(&child_attributes());
        let native = mapping.to_native(&facets);
        assert_eq!(native["activity_id"], "ScenarioMIP");
        assert_eq!(native["variant_label"], "r1i1p1f1");
        assert!(!native.contains_key("activity_drs"));
    }

    #[test]
    fn branch_time_accepts_numeric_text() {
        let mapping = ProjectMapping::cmip6();
        let mut raw = child_attributes();
        assert_eq!(mapping.branch_time(&raw).unwrap(), 60265.0);
        raw.insert("branch_time_in_parent".into(), "60265.0".into());
        assert_eq!(mapping.branch_time(&raw).unwrap(), 60265.0);
        raw.insert("branch_time_in_parent".into(), "soon".into());
        assert!(matches!(mapping.branch_time(&raw), Err(FacetError::InvalidAttribute { .. })));
    }

    #[test]
    fn deserializes_custom_project_with_defaults() {
        let yaml = r#"
project: TOYMIP
attributes:
  experiment: exp
  model: dataset
  member: ensemble
parent_facets: [exp, ensemble]
parent_keys:
  ensemble: parent_member_label
"#;
        let mapping: ProjectMapping = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(mapping.parent_prefix, "parent_");
        assert_eq!(mapping.parent_key(Facet::Experiment).unwrap(), "parent_experiment");
        assert_eq!(mapping.parent_key(Facet::Ensemble).unwrap(), "parent_member_label");
        assert_eq!(mapping.parent_time_units_key.as_deref(), Some("parent_time_units"));
    }

    #[test]
    fn cmip5_reads_rip_and_branch_time() {
        let mapping = ProjectMapping::cmip5();
        let mut raw = Attributes::new();
        raw.insert("experiment_id".into(), "rcp85".into());
        raw.insert("model_id".into(), "MPI-ESM-LR".into());
        raw.insert("parent_experiment_id".into(), "historical".into());
        raw.insert("parent_experiment_rip".into(), "r1i1p1".into());
        raw.insert("branch_time".into(), 56978.0.into());

        let parent = mapping.parent_facets(&raw).unwrap();
        assert_eq!(parent[&Facet::Experiment], "historical");
        assert_eq!(parent[&Facet::Ensemble], "r1i1p1");
        assert_eq!(parent.len(), 2);
        assert_eq!(mapping.branch_time(&raw).unwrap(), 56978.0);
        assert!(mapping.parent_time_units(&raw).is_none());
        assert_eq!(mapping.to_canonical(&raw)[&Facet::Dataset], "MPI-ESM-LR");
    }
}
