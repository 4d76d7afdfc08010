//! Stitcher: runs the walk, assembly, conversion and provenance for every
//! top-level child of a candidate pool.
//!
//! Children are independent. A failure is reported for its child only and
//! never stops the siblings. [`Stitcher::run`] works through the children
//! one after another; [`Stitcher::run_parallel`] gives each its own
//! blocking task.

use std::sync::Arc;

use uuid::Uuid;

use crate::assemble::assemble;
use crate::config::StitchConfig;
use crate::dataset::{CandidatePool, Cube, DatasetRecord, FileReference};
use crate::error::{StitchError, StitchResult};
use crate::facets::FacetRegistry;
use crate::io::{CubeLoader, Persistence};
use crate::lineage::{CancellationToken, LineageWalker, WalkState, WalkWarning};
use crate::provenance::{self, Provenance};
use crate::units::convert;

/// A finished stitched series, ready to persist
#[derive(Debug, Clone, PartialEq)]
pub struct StitchedOutput {
    /// Deterministic name derived from the child and the run options
    pub identifier: String,
    pub cube: Cube,
    pub provenance: Provenance,
    pub state: WalkState,
    pub steps: usize,
    pub warnings: Vec<WalkWarning>,
    pub conversion_factor: Option<f64>,
}

/// Outcome for one top-level child
#[derive(Debug)]
pub struct ChildReport {
    pub child: FileReference,
    pub experiment: String,
    pub result: StitchResult<StitchedOutput>,
}

impl ChildReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// What a persistence pass did
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PersistSummary {
    pub saved: Vec<String>,
    /// Identifier and error message of outputs the store rejected
    pub failed: Vec<(String, String)>,
    /// Children that failed before producing output
    pub skipped: usize,
}

/// Stitches the top-level children of a pool under one configuration
#[derive(Debug, Clone)]
pub struct Stitcher {
    config: StitchConfig,
    registry: FacetRegistry,
}

impl Stitcher {
    pub fn new(config: StitchConfig) -> Self {
        let registry = config.registry();
        Self { config, registry }
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    pub fn registry(&self) -> &FacetRegistry {
        &self.registry
    }

    /// Whether a record starts its own walk
    pub fn is_top_level(&self, record: &DatasetRecord) -> bool {
        !self.config.stop_criterion().matches(&record.experiment) && !self.config.is_skipped(&record.experiment)
    }

    pub fn top_level_children<'p>(&self, pool: &'p CandidatePool) -> Vec<&'p DatasetRecord> {
        pool.iter().filter(|r| self.is_top_level(r)).collect()
    }

    /// Walk, assemble, convert and describe one child.
    pub fn stitch_child(
        &self,
        pool: &CandidatePool,
        loader: &dyn CubeLoader,
        child: &DatasetRecord,
        cancel: Option<CancellationToken>,
    ) -> StitchResult<StitchedOutput> {
        let mut walker = LineageWalker::new(pool, &self.registry, loader)
            .stop_at(self.config.stop_criterion())
            .max_depth(self.config.max_depth);
        if let Some(token) = cancel {
            walker = walker.with_cancellation(token);
        }
        let outcome = walker.walk(child)?;
        let assembled = assemble(&outcome.chain)?;

        let (cube, conversion_factor) = match &self.config.target_unit {
            Some(target) => {
                let source = assembled.cube.units.clone();
                let (cube, factor) = convert(&assembled.cube, &source, target, &self.config.conversion_options())?;
                (cube, Some(factor))
            }
            None => (assembled.cube, None),
        };

        let provenance = provenance::record(&outcome.chain, &cube)
            .with_stop_reason(outcome.state)
            .with_dropped_attributes(&assembled.dropped_attributes)
            .with_conversion_factor(conversion_factor);

        Ok(StitchedOutput {
            identifier: self.output_identifier(child),
            cube,
            provenance,
            state: outcome.state,
            steps: outcome.steps,
            warnings: outcome.warnings,
            conversion_factor,
        })
    }

    /// Stitch every top-level child in pool order.
    pub fn run(&self, pool: &CandidatePool, loader: &dyn CubeLoader) -> Vec<ChildReport> {
        let children = self.top_level_children(pool);
        tracing::info!(children = children.len(), pool = pool.len(), "stitching");
        children
            .into_iter()
            .map(|child| {
                let result = self.stitch_child(pool, loader, child, None);
                report(child, result)
            })
            .collect()
    }

    /// Stitch every top-level child on the blocking pool.
    ///
    /// Reports come back in pool order. With `child_timeout_secs` set, a
    /// child whose walk overruns is cancelled and reported as timed out.
    pub async fn run_parallel(
        self: Arc<Self>,
        pool: Arc<CandidatePool>,
        loader: Arc<dyn CubeLoader>,
    ) -> Vec<ChildReport> {
        let children: Vec<DatasetRecord> = self.top_level_children(&pool).into_iter().cloned().collect();
        let timeout = self.config.child_timeout();
        tracing::info!(children = children.len(), pool = pool.len(), "stitching in parallel");

        let handles: Vec<_> = children
            .into_iter()
            .map(|child| {
                let stitcher = Arc::clone(&self);
                let pool = Arc::clone(&pool);
                let loader = Arc::clone(&loader);
                tokio::spawn(async move {
                    let token = CancellationToken::new();
                    let worker_token = token.clone();
                    let worker_child = child.clone();
                    let work = tokio::task::spawn_blocking(move || {
                        stitcher.stitch_child(&pool, loader.as_ref(), &worker_child, Some(worker_token))
                    });
                    let result = match timeout {
                        Some(limit) => match tokio::time::timeout(limit, work).await {
                            Ok(joined) => flatten(joined),
                            Err(_) => {
                                token.cancel();
                                Err(StitchError::Timeout(limit))
                            }
                        },
                        None => flatten(work.await),
                    };
                    report(&child, result)
                })
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!(error = %e, "stitching task panicked"),
            }
        }
        reports
    }

    /// Save every successful output. Store failures are reported per
    /// output and do not stop the others.
    pub fn persist(&self, reports: &[ChildReport], store: &dyn Persistence) -> PersistSummary {
        let mut summary = PersistSummary::default();
        for report in reports {
            let Ok(output) = &report.result else {
                summary.skipped += 1;
                continue;
            };
            match store.save(&output.identifier, &output.provenance, &output.cube) {
                Ok(()) => summary.saved.push(output.identifier.clone()),
                Err(e) => {
                    tracing::error!(identifier = %output.identifier, error = %e, "failed to persist output");
                    summary.failed.push((output.identifier.clone(), e.to_string()));
                }
            }
        }
        summary
    }

    /// `<short_name>_<dataset>_<ensemble>_<experiment>_<hash>`, where the
    /// hash covers the child file and the options that change the output.
    fn output_identifier(&self, child: &DatasetRecord) -> String {
        let key = format!(
            "{}|{}|{}|{}|{}",
            child.file,
            self.config.stitch_stop_string,
            self.config.target_unit.as_deref().unwrap_or(""),
            self.config.mass_kind.as_deref().unwrap_or(""),
            self.config.area_multiplied_preprocessor,
        );
        let hash = Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()).simple().to_string();
        format!(
            "{}_{}_{}_{}_{}",
            child.short_name,
            child.dataset,
            child.ensemble,
            child.experiment,
            &hash[..8]
        )
    }
}

fn flatten(joined: Result<StitchResult<StitchedOutput>, tokio::task::JoinError>) -> StitchResult<StitchedOutput> {
    joined.map_err(|e| StitchError::Worker(e.to_string()))?
}

fn report(child: &DatasetRecord, result: StitchResult<StitchedOutput>) -> ChildReport {
    match &result {
        Ok(output) => {
            for warning in &output.warnings {
                tracing::debug!(child = %child.file, "{}", warning);
            }
            tracing::info!(
                child = %child.file,
                identifier = %output.identifier,
                steps = output.steps,
                "stitched"
            );
        }
        Err(e) => tracing::error!(child = %child.file, error = %e, "stitching failed"),
    }
    ChildReport {
        child: child.file.clone(),
        experiment: child.experiment.clone(),
        result,
    }
}

/// Stitch every top-level child of `pool` with `config`.
pub fn run(pool: &CandidatePool, config: &StitchConfig, loader: &dyn CubeLoader) -> Vec<ChildReport> {
    Stitcher::new(config.clone()).run(pool, loader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Attributes;

    fn record(experiment: &str) -> DatasetRecord {
        DatasetRecord {
            project: "CMIP6".into(),
            activity: "ScenarioMIP".into(),
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

    #[test]
    fn control_and_skipped_experiments_are_not_top_level() {
        let config = StitchConfig {
            skip_experiments: vec!["historical".into()],
            ..Default::default()
        };
        let stitcher = Stitcher::new(config);
        let pool = CandidatePool::new(vec![
            record("ssp585"),
            record("historical"),
            record("piControl"),
            record("esm-piControl"),
        ]);
        let children: Vec<&str> = stitcher
            .top_level_children(&pool)
            .iter()
            .map(|r| r.experiment.as_str())
            .collect();
        assert_eq!(children, vec!["ssp585"]);
    }

    #[test]
    fn identifiers_are_deterministic_and_option_sensitive() {
        let child = record("ssp585");
        let plain = Stitcher::new(StitchConfig::default());
        let converted = Stitcher::new(StitchConfig {
            target_unit: Some("degC".into()),
            ..Default::default()
        });
        let id = plain.output_identifier(&child);
        assert!(id.starts_with("tas_CanESM5_r1i1p1f1_ssp585_"));
        assert_eq!(id.len(), "tas_CanESM5_r1i1p1f1_ssp585_".len() + 8);
        assert_eq!(id, plain.output_identifier(&child));
        assert_ne!(id, converted.output_identifier(&child));
    }
}
