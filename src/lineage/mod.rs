//! Lineage: following branch links from a child back to its control run

mod cancel;
mod chain;
mod link;
mod walker;

pub use cancel::CancellationToken;
pub use chain::{ChainLink, LineageChain};
pub use link::BranchLink;
pub use walker::{
    LineageWalker, StopCriterion, WalkOutcome, WalkState, WalkWarning, DEFAULT_STOP_MARKER, MAX_WALK_DEPTH,
};
