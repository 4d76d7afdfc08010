//! Segment assembly: harmonize attributes and join segments along time
//!
//! Segments are joined most-ancestral first. Every time axis is first
//! re-expressed in the child's time units, so the joined axis reads in
//! the units of the most recent experiment.

use std::collections::BTreeSet;

use crate::dataset::{Attributes, Cube, FileReference, TimeAxis};
use crate::error::{StitchError, StitchResult};
use crate::lineage::LineageChain;

/// A joined cube and the attribute keys removed to make the join possible
#[derive(Debug, Clone, PartialEq)]
pub struct Assembled {
    pub cube: Cube,
    pub dropped_attributes: BTreeSet<String>,
}

/// Join the contributing segments of a chain into one cube.
pub fn assemble(chain: &LineageChain) -> StitchResult<Assembled> {
    let segments: Vec<(&FileReference, &Cube)> = chain
        .links()
        .iter()
        .rev()
        .filter(|link| link.contributes())
        .filter_map(|link| link.segment.as_ref().map(|s| (&link.record.file, s)))
        .collect();

    // The child's axis sets units and calendar, even when it has no data.
    let reference = match chain.child().segment.as_ref() {
        Some(cube) => cube,
        None => match segments.last() {
            Some((_, cube)) => *cube,
            None => return Err(StitchError::Concatenation("no segment holds any data".into())),
        },
    };
    if segments.is_empty() {
        return Err(StitchError::Concatenation("no segment holds any data".into()));
    }

    let (attributes, dropped) = equalise_attributes(segments.iter().map(|(_, cube)| &cube.attributes));
    if !dropped.is_empty() {
        tracing::debug!(dropped = ?dropped, "dropping attributes that differ between segments");
    }

    let units = &reference.time.units;
    let calendar = reference.time.calendar;
    let mut points: Vec<f64> = Vec::new();
    let mut data: Vec<f64> = Vec::new();

    for (file, cube) in &segments {
        if cube.shape != reference.shape {
            return Err(StitchError::Concatenation(format!(
                "{} has shape {:?}, expected {:?}",
                file, cube.shape, reference.shape
            )));
        }
        if cube.units != reference.units {
            return Err(StitchError::Concatenation(format!(
                "{} is in {}, expected {}",
                file, cube.units, reference.units
            )));
        }
        if cube.time.calendar != calendar {
            return Err(StitchError::Concatenation(format!(
                "{} uses calendar {}, expected {}",
                file, cube.time.calendar, calendar
            )));
        }

        let rebased = cube.time.points_in(units)?;
        if let (Some(&last), Some(&first)) = (points.last(), rebased.first()) {
            if first <= last {
                return Err(StitchError::Concatenation(format!(
                    "{} starts at {} {}, not after the previous segment's {}",
                    file, first, units, last
                )));
            }
        }
        if let Some(pair) = rebased.windows(2).find(|w| w[1] <= w[0]) {
            return Err(StitchError::Concatenation(format!(
                "time in {} is not strictly increasing at {} {}",
                file, pair[1], units
            )));
        }
        points.extend(rebased);
        data.extend_from_slice(&cube.data);
    }

    let cube = Cube {
        name: reference.name.clone(),
        units: reference.units.clone(),
        time: TimeAxis::new(points, units.clone(), calendar),
        shape: reference.shape.clone(),
        data,
        attributes,
    };
    Ok(Assembled {
        cube,
        dropped_attributes: dropped,
    })
}

/// Keep the attributes every set shares with equal values; return the
/// kept attributes and the keys of the rest.
pub fn equalise_attributes<'a>(sets: impl IntoIterator<Item = &'a Attributes>) -> (Attributes, BTreeSet<String>) {
    let mut sets = sets.into_iter();
    let Some(first) = sets.next() else {
        return (Attributes::new(), BTreeSet::new());
    };
    let mut common = first.clone();
    let mut dropped = BTreeSet::new();
    for set in sets {
        common.retain(|key, value| {
            let keep = set.get(key) == Some(value);
            if !keep {
                dropped.insert(key.clone());
            }
            keep
        });
        dropped.extend(set.keys().filter(|k| !common.contains_key(*k)).cloned());
    }
    (common, dropped)
}
