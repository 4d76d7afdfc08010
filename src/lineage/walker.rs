//! The lineage walk: from a child back through its parents
//!
//! Each step reads the current record's branch link, finds the parent in
//! the candidate pool, converts the branch time to a date and keeps the
//! parent's data before that date. The walk ends when the next parent
//! would be a control experiment, or when the depth guard trips.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BranchLink, CancellationToken, LineageChain};
use crate::dataset::{CandidatePool, Cube, DatasetRecord, FileReference};
use crate::error::{StitchError, StitchResult};
use crate::facets::{describe, FacetRegistry};
use crate::io::CubeLoader;
use crate::time::{CalendarDateTime, TimeUnits};

/// Upper bound on ancestor steps in a single walk
pub const MAX_WALK_DEPTH: usize = 10;

/// Experiment marker the walk stops at by default
pub const DEFAULT_STOP_MARKER: &str = "piControl";

/// Decides whether an experiment is a terminal control run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopCriterion {
    marker: String,
}

impl StopCriterion {
    pub fn new(marker: impl Into<String>) -> Self {
        Self { marker: marker.into() }
    }

    /// True when the experiment name contains the marker.
    pub fn matches(&self, experiment: &str) -> bool {
        experiment.contains(&self.marker)
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Default for StopCriterion {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_MARKER)
    }
}

/// State of a walk
///
/// `Active` is the only non-terminal state. The two failure states are
/// surfaced as errors; see [`StitchError::walk_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkState {
    Active,
    StoppedByCriterion,
    StoppedByDepthGuard,
    FailedNoParent,
    FailedCalendarMismatch,
}

impl WalkState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FailedNoParent | Self::FailedCalendarMismatch)
    }
}

/// A non-fatal anomaly met during a walk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WalkWarning {
    /// The parent was found only after ignoring the declared activity
    ActivityMismatch {
        child: FileReference,
        parent: FileReference,
        declared: String,
        resolved: String,
    },
    /// The branch point precedes all of the parent's data
    EmptyCut {
        child: FileReference,
        parent: FileReference,
        branch_date: String,
    },
    /// The walk was stopped by the depth guard
    DepthGuard { record: FileReference, steps: usize },
}

impl fmt::Display for WalkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActivityMismatch {
                child,
                parent,
                declared,
                resolved,
            } => write!(
                f,
                "{} declares parent activity {} but {} has activity {}",
                child, declared, parent, resolved
            ),
            Self::EmptyCut {
                child,
                parent,
                branch_date,
            } => write!(
                f,
                "{} branches from {} at {}, before any of its data",
                child, parent, branch_date
            ),
            Self::DepthGuard { record, steps } => {
                write!(f, "walk stopped at {} after {} steps", record, steps)
            }
        }
    }
}

/// Result of a completed walk
#[derive(Debug, Clone, PartialEq)]
pub struct WalkOutcome {
    pub chain: LineageChain,
    pub state: WalkState,
    /// Ancestor steps taken
    pub steps: usize,
    pub warnings: Vec<WalkWarning>,
}

/// Walks a child's ancestry through a candidate pool
///
/// The pool and loader are only read. Each call to [`walk`](Self::walk)
/// builds its own chain, so one walker can serve many children.
pub struct LineageWalker<'a> {
    pool: &'a CandidatePool,
    registry: &'a FacetRegistry,
    loader: &'a dyn CubeLoader,
    stop: StopCriterion,
    max_depth: usize,
    cancel: Option<CancellationToken>,
}

impl<'a> LineageWalker<'a> {
    pub fn new(pool: &'a CandidatePool, registry: &'a FacetRegistry, loader: &'a dyn CubeLoader) -> Self {
        Self {
            pool,
            registry,
            loader,
            stop: StopCriterion::default(),
            max_depth: MAX_WALK_DEPTH,
            cancel: None,
        }
    }

    pub fn stop_at(mut self, stop: StopCriterion) -> Self {
        self.stop = stop;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Walk from `child` back to the stop criterion.
    pub fn walk(&self, child: &DatasetRecord) -> StitchResult<WalkOutcome> {
        let child_cube = self.loader.load(&child.file)?;
        let mut chain = LineageChain::new(child.clone(), child_cube.clone());
        let mut warnings = Vec::new();
        let mut steps = 0;

        if self.stop.matches(&child.experiment) {
            tracing::debug!(child = %child.file, "child is itself a control run");
            return Ok(WalkOutcome {
                chain,
                state: WalkState::StoppedByCriterion,
                steps,
                warnings,
            });
        }

        let mut current = child.clone();
        let mut current_cube = child_cube;
        let mut state = WalkState::Active;

        while !state.is_terminal() {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                tracing::debug!(at = %current.file, steps, "walk cancelled");
                return Err(StitchError::Cancelled(current.file.clone()));
            }

            let link = BranchLink::from_child(&current, self.registry)?;
            if self.stop.matches(link.experiment()) {
                state = WalkState::StoppedByCriterion;
                continue;
            }
            if steps >= self.max_depth {
                tracing::error!(
                    at = %current.file,
                    steps,
                    "lineage walk exceeded {} steps, stopping",
                    self.max_depth
                );
                warnings.push(WalkWarning::DepthGuard {
                    record: current.file.clone(),
                    steps,
                });
                state = WalkState::StoppedByDepthGuard;
                continue;
            }
            steps += 1;

            let parent = self.resolve_parent(&current, &link, &mut warnings)?;
            let parent_cube = self.loader.load(&parent.file)?;
            if parent_cube.time.calendar != current_cube.time.calendar {
                tracing::error!(
                    child = %current.file,
                    parent = %parent.file,
                    "calendars differ"
                );
                return Err(StitchError::CalendarMismatch {
                    child: current.file.clone(),
                    child_calendar: current_cube.time.calendar,
                    parent: parent.file.clone(),
                    parent_calendar: parent_cube.time.calendar,
                });
            }

            let branch = self.branch_date(&current, &parent_cube)?;
            let threshold = parent_cube
                .time
                .units
                .date2num(&branch, parent_cube.time.calendar)?;
            let segment = parent_cube.extract_before(threshold);

            if segment.is_empty() {
                let warning = WalkWarning::EmptyCut {
                    child: current.file.clone(),
                    parent: parent.file.clone(),
                    branch_date: branch.to_string(),
                };
                tracing::warn!("{}", warning);
                warnings.push(warning);
                chain.push(parent.clone(), None);
            } else {
                tracing::debug!(
                    parent = %parent.file,
                    branch = %branch,
                    kept = segment.time_len(),
                    "cut parent at branch point"
                );
                chain.push(parent.clone(), Some(segment));
            }

            current = parent.clone();
            current_cube = parent_cube;
        }

        tracing::info!(
            child = %child.file,
            steps,
            state = ?state,
            experiments = ?chain.experiments(),
            "lineage walk finished"
        );
        Ok(WalkOutcome {
            chain,
            state,
            steps,
            warnings,
        })
    }

    /// Find the unique parent, relaxing only the activity facet.
    fn resolve_parent(
        &self,
        current: &DatasetRecord,
        link: &BranchLink,
        warnings: &mut Vec<WalkWarning>,
    ) -> StitchResult<&'a DatasetRecord> {
        let pool: &'a CandidatePool = self.pool;
        let exact = pool.select(link.facets());
        match exact.as_slice() {
            [parent] => return Ok(*parent),
            [] => {}
            many => {
                tracing::error!(
                    child = %current.file,
                    facets = %describe(link.facets()),
                    candidates = many.len(),
                    "ambiguous parent"
                );
                return Err(StitchError::ParentResolution {
                    child: current.file.clone(),
                    facets: describe(link.facets()),
                    ambiguous: true,
                    candidates: many.len(),
                });
            }
        }

        let relaxed = pool.select(&link.without_activity());
        match relaxed.as_slice() {
            [parent] => {
                let warning = WalkWarning::ActivityMismatch {
                    child: current.file.clone(),
                    parent: parent.file.clone(),
                    declared: link.activity().to_string(),
                    resolved: parent.activity.clone(),
                };
                tracing::warn!("{}", warning);
                warnings.push(warning);
                Ok(*parent)
            }
            other => {
                tracing::error!(
                    child = %current.file,
                    facets = %describe(link.facets()),
                    candidates = other.len(),
                    "no parent found"
                );
                Err(StitchError::ParentResolution {
                    child: current.file.clone(),
                    facets: describe(link.facets()),
                    ambiguous: other.len() > 1,
                    candidates: other.len(),
                })
            }
        }
    }

    /// The date in the parent's calendar at which `current` branched off.
    fn branch_date(&self, current: &DatasetRecord, parent_cube: &Cube) -> StitchResult<CalendarDateTime> {
        let mapping = self.registry.get(&current.project)?;
        let value = mapping.branch_time(&current.attributes)?;
        let units = match mapping.parent_time_units(&current.attributes) {
            Some(raw) => raw.to_string().parse::<TimeUnits>()?,
            None => {
                tracing::debug!(
                    child = %current.file,
                    "no parent time units recorded, using the parent's axis"
                );
                parent_cube.time.units.clone()
            }
        };
        Ok(units.num2date(value, parent_cube.time.calendar)?)
    }
}
