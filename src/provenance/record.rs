//! Building a provenance record from a finished walk.

use crate::dataset::Cube;
use crate::lineage::LineageChain;

use super::Provenance;

/// Describe a stitched cube in terms of the chain it was built from.
pub fn record(chain: &LineageChain, cube: &Cube) -> Provenance {
    let child = &chain.child().record;
    let earliest = &chain.earliest().record;

    let caption = if chain.len() == 1 {
        format!(
            "{} ({}) of {} {}, {} without ancestors",
            cube.name, cube.units, child.dataset, child.ensemble, child.experiment
        )
    } else {
        format!(
            "{} ({}) of {} {}, {} stitched back to {}",
            cube.name, cube.units, child.dataset, child.ensemble, child.experiment, earliest.experiment
        )
    };

    // An unreadable axis only loses the date range, not the record.
    let start = cube.time.start().ok().flatten().map(|d| d.to_string());
    let end = cube.time.end().ok().flatten().map(|d| d.to_string());

    Provenance {
        caption,
        ancestors: chain.files().iter().map(|f| f.to_string()).collect(),
        experiments: chain.experiments().iter().map(|e| e.to_string()).collect(),
        dataset: child.dataset.clone(),
        ensemble: child.ensemble.clone(),
        variable: child.short_name.clone(),
        units: cube.units.clone(),
        start,
        end,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Attributes, DatasetRecord, TimeAxis};
    use crate::lineage::WalkState;
    use crate::time::{Calendar, TimeUnits};
    use std::collections::BTreeSet;

    fn record_for(experiment: &str) -> DatasetRecord {
        DatasetRecord {
            project: "CMIP6".into(),
            activity: "CMIP".into(),
            experiment: experiment.into(),
            dataset: "CanESM5".into(),
            ensemble: "r1i1p1f1".into(),
            mip: "Amon".into(),
            short_name: "tas".into(),
            grid: "gn".into(),
            file: format!("{}.json", experiment).as_str().into(),
            attributes: Attributes::new(),
        }
    }

    fn cube(points: Vec<f64>) -> Cube {
        let units: TimeUnits = "days since 1850-01-01".parse().unwrap();
        let n = points.len();
        Cube::new("tas", "K", TimeAxis::new(points, units, Calendar::NoLeap), vec![], vec![280.0; n]).unwrap()
    }

    #[test]
    fn caption_names_child_and_earliest_experiment() {
        let mut chain = LineageChain::new(record_for("ssp585"), cube(vec![60225.0]));
        chain.push(record_for("historical"), Some(cube(vec![0.0, 365.0])));
        chain.push(record_for("esm-hist"), None);

        let p = record(&chain, &cube(vec![0.0, 365.0, 60225.0]));
        assert!(p.caption.contains("ssp585"));
        assert!(p.caption.contains("esm-hist"));
        assert_eq!(p.experiments, vec!["ssp585", "historical", "esm-hist"]);
        assert_eq!(p.ancestors, vec!["ssp585.json", "historical.json", "esm-hist.json"]);
        assert_eq!(p.earliest_experiment(), Some("esm-hist"));
        assert_eq!(p.start.as_deref(), Some("1850-01-01 00:00:00"));
    }

    #[test]
    fn builders_fill_optional_fields() {
        let chain = LineageChain::new(record_for("ssp126"), cube(vec![0.0]));
        let dropped: BTreeSet<String> = ["history".to_string()].into();
        let p = record(&chain, &cube(vec![0.0]))
            .with_stop_reason(WalkState::StoppedByCriterion)
            .with_dropped_attributes(&dropped)
            .with_conversion_factor(Some(2.0));
        assert_eq!(p.stop_reason, Some(WalkState::StoppedByCriterion));
        assert_eq!(p.dropped_attributes, vec!["history"]);
        assert_eq!(p.conversion_factor, Some(2.0));
        assert!(p.caption.contains("without ancestors"));
    }

    #[test]
    fn serializes_to_json_and_back() {
        let chain = LineageChain::new(record_for("ssp245"), cube(vec![0.0]));
        let p = record(&chain, &cube(vec![0.0])).with_stop_reason(WalkState::StoppedByDepthGuard);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("stopped_by_depth_guard"));
        let back: Provenance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
