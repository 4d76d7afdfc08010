//! Scalar conversion between unit expressions

use serde::{Deserialize, Serialize};

use super::expr::{parse_unit, Dimensions, Quantity};
use super::species::{molar_mass, molar_mass_quantity};
use super::{UnitError, UnitResult};
use crate::dataset::Cube;

/// Attribute recording the unit the values had before conversion
pub const FULL_UNITS_ATTRIBUTE: &str = "full_units";

const SQUARE_METRE: Dimensions = Dimensions([0, 2, 0, 0, 0, 0, 0]);

/// How the source unit is to be read before converting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Species whose molar mass turns an amount into a mass, e.g. `CO2`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_kind: Option<String>,
    /// Values were multiplied by cell area upstream, so carry an extra m2
    #[serde(default)]
    pub area_multiplied: bool,
}

impl ConversionOptions {
    pub fn with_mass_kind(mut self, species: impl Into<String>) -> Self {
        self.mass_kind = Some(species.into());
        self
    }

    pub fn with_area_multiplied(mut self, area_multiplied: bool) -> Self {
        self.area_multiplied = area_multiplied;
        self
    }
}

/// The multiplier from source values to target values
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionFactor {
    pub factor: f64,
    /// Source expression with the mass and area terms spelled out
    pub effective_source: String,
}

fn overflow(expression: &str) -> UnitError {
    UnitError::InvalidUnit {
        expression: expression.to_string(),
        reason: "dimension exponent out of range".to_string(),
    }
}

/// Compute the factor that converts values in `source` to `target`.
///
/// The source is first extended by the molar mass of `mass_kind` and by
/// m2 when `area_multiplied` is set. The extended source and the target
/// must have the same dimensions. Units with an offset zero point only
/// convert to a unit with the same zero point.
pub fn conversion_factor(
    source: &str,
    target: &str,
    options: &ConversionOptions,
) -> UnitResult<ConversionFactor> {
    let mut effective = parse_unit(source)?;
    let mut effective_source = source.trim().to_string();
    let target_quantity = parse_unit(target)?;

    if let Some(species) = &options.mass_kind {
        effective_source = format!("{} {} g mol-1", effective_source, molar_mass(species)?);
        effective = effective
            .checked_mul(molar_mass_quantity(species)?)
            .ok_or_else(|| overflow(&effective_source))?;
    }
    if options.area_multiplied {
        effective_source.push_str(" m2");
        effective = effective
            .checked_mul(Quantity::new(1.0, SQUARE_METRE))
            .ok_or_else(|| overflow(&effective_source))?;
    }

    let incompatible = |reason: String| UnitError::Incompatible {
        source_unit: effective_source.clone(),
        target_unit: target.to_string(),
        reason,
    };

    if effective.affine_offset != target_quantity.affine_offset {
        return Err(incompatible(
            "units with an offset zero point only convert to the same zero point".to_string(),
        ));
    }
    if effective.dims != target_quantity.dims {
        return Err(incompatible(format!(
            "dimensions {} and {} differ",
            effective.dims, target_quantity.dims
        )));
    }

    Ok(ConversionFactor {
        factor: effective.scale / target_quantity.scale,
        effective_source,
    })
}

/// Convert a cube's values from `source` to `target`.
///
/// Returns a converted copy and the factor applied. The input is not
/// modified.
pub fn convert(
    cube: &Cube,
    source: &str,
    target: &str,
    options: &ConversionOptions,
) -> UnitResult<(Cube, f64)> {
    let ConversionFactor {
        factor,
        effective_source,
    } = conversion_factor(source, target, options)?;

    let mut converted = cube.clone();
    converted.data.iter_mut().for_each(|v| *v *= factor);
    converted.units = target.to_string();
    converted
        .attributes
        .insert(FULL_UNITS_ATTRIBUTE.to_string(), effective_source.into());

    tracing::debug!(source, target, factor, "converted units");
    Ok((converted, factor))
}
