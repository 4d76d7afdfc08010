//! Provenance of stitched outputs: ancestor files and experiment labels.

mod record;
mod types;

pub use record::record;
pub use types::Provenance;
