//! Branchline: experiment-lineage stitching for climate model output
//!
//! Scenario and historical runs branch off a parent run at a recorded point
//! in time. Branchline follows those branch links back to a control run,
//! keeps each parent's data up to the branch point, and joins the pieces
//! into one continuous series with a provenance record.
//!
//! # Core Concepts
//!
//! - **Facets**: project-independent dataset identity (activity, experiment,
//!   dataset, ensemble, table, variable, grid)
//! - **Lineage**: the chain from a child back through its parents
//! - **Segments**: each ancestor's data before the branch point
//!
//! # Example
//!
//! ```
//! use branchline::{CandidatePool, MemoryLoader, StitchConfig};
//!
//! let pool = CandidatePool::new(Vec::new());
//! let reports = branchline::run(&pool, &StitchConfig::default(), &MemoryLoader::new());
//! assert!(reports.is_empty());
//! ```

pub mod assemble;
pub mod config;
pub mod dataset;
mod error;
pub mod facets;
pub mod io;
pub mod lineage;
pub mod provenance;
pub mod stitcher;
pub mod time;
pub mod units;

pub use assemble::{assemble, Assembled};
pub use config::{ConfigError, StitchConfig};
pub use dataset::{
    AttributeValue, Attributes, CandidatePool, Cube, DatasetRecord, FileReference, PoolManifest, TimeAxis,
};
pub use error::{StitchError, StitchResult};
pub use facets::{Facet, FacetError, FacetMap, FacetRegistry, ProjectMapping};
pub use io::{CubeLoader, JsonCubeLoader, JsonDirectoryStore, LoadError, MemoryLoader, PersistError, Persistence};
pub use lineage::{
    CancellationToken, LineageChain, LineageWalker, StopCriterion, WalkOutcome, WalkState, WalkWarning,
};
pub use provenance::Provenance;
pub use stitcher::{run, ChildReport, PersistSummary, StitchedOutput, Stitcher};
pub use time::{Calendar, CalendarDateTime, TimeError, TimeUnits};
pub use units::{convert, conversion_factor, ConversionOptions, UnitError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
