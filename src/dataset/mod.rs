//! Dataset records, their arrays, and the pool parents are resolved from

mod attribute;
mod cube;
mod pool;
mod record;

pub use attribute::{AttributeValue, Attributes};
pub use cube::{Cube, CubeError, TimeAxis};
pub use pool::{CandidatePool, ManifestEntry, PoolManifest};
pub use record::{DatasetRecord, FileReference};
