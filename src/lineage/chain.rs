//! LineageChain: the records and cut segments collected by a walk

use crate::dataset::{Cube, DatasetRecord, FileReference};

/// One record of a lineage and the part of its data that is kept
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink {
    pub record: DatasetRecord,
    /// `None` when the branch point preceded all of the record's data
    pub segment: Option<Cube>,
}

impl ChainLink {
    /// Whether this link adds time steps to the stitched series
    pub fn contributes(&self) -> bool {
        self.segment.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Records from the most recent child back to the most ancestral parent
///
/// Only grows during a walk; read-only once the walk has finished.
#[derive(Debug, Clone, PartialEq)]
pub struct LineageChain {
    links: Vec<ChainLink>,
}

impl LineageChain {
    /// Chain holding only the child and its full data
    pub fn new(child: DatasetRecord, cube: Cube) -> Self {
        Self {
            links: vec![ChainLink {
                record: child,
                segment: Some(cube),
            }],
        }
    }

    pub(crate) fn push(&mut self, record: DatasetRecord, segment: Option<Cube>) {
        self.links.push(ChainLink { record, segment });
    }

    /// Links in traversal order, child first
    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn child(&self) -> &ChainLink {
        &self.links[0]
    }

    /// The most ancestral record reached
    pub fn earliest(&self) -> &ChainLink {
        &self.links[self.links.len() - 1]
    }

    /// Experiments in traversal order, including ancestors without data
    pub fn experiments(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.record.experiment.as_str()).collect()
    }

    /// File references in traversal order
    pub fn files(&self) -> Vec<&FileReference> {
        self.links.iter().map(|l| &l.record.file).collect()
    }
}
