//! Physical unit algebra and scalar unit conversion
//!
//! Unit strings follow the udunits-style grammar used in CF metadata:
//! `kg m-2 s-1`, `W m^-2`, `Pg yr-1`, `mol/m2/s`. Every expression reduces
//! to a [`Quantity`]: a scale relative to SI and a vector of base-dimension
//! exponents. Conversion between two expressions is only defined when their
//! dimensions agree, and is always a single multiplicative factor.

mod convert;
mod expr;
mod species;

pub use convert::{convert, conversion_factor, ConversionFactor, ConversionOptions};
pub use expr::{parse_unit, Dimensions, Quantity};
pub use species::{molar_mass, SPECIES};

use thiserror::Error;

/// Errors from unit parsing and conversion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("Invalid unit expression '{expression}': {reason}")]
    InvalidUnit { expression: String, reason: String },

    #[error("Cannot convert '{source_unit}' to '{target_unit}': {reason}")]
    Incompatible {
        source_unit: String,
        target_unit: String,
        reason: String,
    },

    #[error("Unknown mass species '{0}'")]
    UnknownSpecies(String),
}

/// Result type for unit operations
pub type UnitResult<T> = Result<T, UnitError>;
