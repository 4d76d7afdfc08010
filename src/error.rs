//! StitchError: everything that ends one child's stitching

use std::time::Duration;
use thiserror::Error;

use crate::dataset::FileReference;
use crate::facets::FacetError;
use crate::io::{LoadError, PersistError};
use crate::lineage::WalkState;
use crate::time::{Calendar, TimeError};
use crate::units::UnitError;

/// Errors that abort stitching of a single top-level child
///
/// None of these affect sibling children.
#[derive(Debug, Error)]
pub enum StitchError {
    #[error(transparent)]
    Facet(#[from] FacetError),

    #[error("No unique parent for {child}: {candidates} candidates match {facets}")]
    ParentResolution {
        child: FileReference,
        facets: String,
        ambiguous: bool,
        candidates: usize,
    },

    #[error("Calendar mismatch: {child} uses {child_calendar}, parent {parent} uses {parent_calendar}")]
    CalendarMismatch {
        child: FileReference,
        child_calendar: Calendar,
        parent: FileReference,
        parent_calendar: Calendar,
    },

    #[error("Cannot concatenate segments: {0}")]
    Concatenation(String),

    #[error(transparent)]
    Unit(#[from] UnitError),

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("Walk cancelled at {0}")]
    Cancelled(FileReference),

    #[error("Stitching timed out after {0:?}")]
    Timeout(Duration),

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl StitchError {
    /// The terminal walk state this error corresponds to, if any
    pub fn walk_state(&self) -> Option<WalkState> {
        match self {
            Self::ParentResolution { .. } => Some(WalkState::FailedNoParent),
            Self::CalendarMismatch { .. } => Some(WalkState::FailedCalendarMismatch),
            _ => None,
        }
    }
}

/// Result type for stitching operations
pub type StitchResult<T> = Result<T, StitchError>;
