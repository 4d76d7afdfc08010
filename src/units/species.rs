//! Molar masses of the mass species a flux can be expressed in

use super::{Dimensions, Quantity, UnitError, UnitResult};

/// Known species and their molar mass in g mol-1
pub const SPECIES: &[(&str, f64)] = &[
    ("C", 12.011),
    ("CO2", 44.0095),
    ("CH4", 16.043),
    ("N", 14.007),
    ("N2", 28.014),
    ("N2O", 44.013),
    ("S", 32.06),
    ("SO2", 64.066),
    ("H2O", 18.015),
];

/// Molar mass of a species in g mol-1.
pub fn molar_mass(species: &str) -> UnitResult<f64> {
    SPECIES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(species))
        .map(|(_, mass)| *mass)
        .ok_or_else(|| UnitError::UnknownSpecies(species.to_string()))
}

/// The molar mass as a unit factor (`<M> g mol-1`), so that an amount
/// flux multiplied by it becomes a mass flux of that species.
pub(crate) fn molar_mass_quantity(species: &str) -> UnitResult<Quantity> {
    let grams_per_mole = molar_mass(species)?;
    let per_mole = Dimensions([1, 0, 0, 0, -1, 0, 0]);
    Ok(Quantity::new(grams_per_mole * 1e-3, per_mole))
}
