//! Common test utilities for stitching scenarios
//!
//! Builds small CMIP6-like ensembles in memory: one yearly series per
//! experiment, with the global attributes a real file would carry.
#![allow(dead_code)]

pub mod ensemble;

pub use ensemble::{standard, years_of, Ensemble, Run};
