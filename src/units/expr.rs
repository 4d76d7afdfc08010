//! Unit expression parsing

use std::fmt;

use super::{UnitError, UnitResult};

const BASE_SYMBOLS: [&str; 7] = ["kg", "m", "s", "K", "mol", "A", "cd"];

/// Largest exponent a single factor may carry, `m^64` and `m-64` included
pub const MAX_EXPONENT: i32 = 64;

/// Exponents of the SI base dimensions, in the order of [`BASE_SYMBOLS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensions(pub [i32; 7]);

impl Dimensions {
    pub const NONE: Self = Self([0; 7]);
    pub const MASS: Self = Self([1, 0, 0, 0, 0, 0, 0]);
    pub const LENGTH: Self = Self([0, 1, 0, 0, 0, 0, 0]);
    pub const TIME: Self = Self([0, 0, 1, 0, 0, 0, 0]);
    pub const AMOUNT: Self = Self([0, 0, 0, 0, 1, 0, 0]);

    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    fn checked_add(self, other: Self) -> Option<Self> {
        let mut out = self.0;
        for (o, e) in out.iter_mut().zip(other.0) {
            *o = o.checked_add(e)?;
        }
        Some(Self(out))
    }

    fn checked_scale(self, power: i32) -> Option<Self> {
        let mut out = self.0;
        for e in out.iter_mut() {
            *e = e.checked_mul(power)?;
        }
        Some(Self(out))
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let parts: Vec<String> = BASE_SYMBOLS
            .iter()
            .zip(self.0)
            .filter(|(_, e)| *e != 0)
            .map(|(sym, e)| if e == 1 { sym.to_string() } else { format!("{}{}", sym, e) })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// A parsed unit: `value_in_unit * scale` is the value in SI base units
///
/// Affine temperature units carry the offset of their zero point; such a
/// quantity only converts to another unit with the same zero point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    pub scale: f64,
    pub dims: Dimensions,
    pub affine_offset: Option<f64>,
}

impl Quantity {
    pub fn new(scale: f64, dims: Dimensions) -> Self {
        Self {
            scale,
            dims,
            affine_offset: None,
        }
    }

    pub fn dimensionless(scale: f64) -> Self {
        Self::new(scale, Dimensions::NONE)
    }

    /// Product of two quantities, `None` when a dimension exponent
    /// overflows. Affine offsets cannot be combined, so callers only
    /// multiply affine quantities by plain ones.
    pub fn checked_mul(self, other: Quantity) -> Option<Quantity> {
        Some(Quantity {
            scale: self.scale * other.scale,
            dims: self.dims.checked_add(other.dims)?,
            affine_offset: self.affine_offset.or(other.affine_offset),
        })
    }

    pub fn checked_powi(self, power: i32) -> Option<Quantity> {
        Some(Quantity {
            scale: self.scale.powi(power),
            dims: self.dims.checked_scale(power)?,
            affine_offset: self.affine_offset,
        })
    }

    pub fn is_affine(&self) -> bool {
        self.affine_offset.is_some()
    }
}

struct Symbol {
    name: &'static str,
    scale: f64,
    dims: [i32; 7],
    prefixable: bool,
    affine_offset: Option<f64>,
}

const fn sym(name: &'static str, scale: f64, dims: [i32; 7], prefixable: bool) -> Symbol {
    Symbol {
        name,
        scale,
        dims,
        prefixable,
        affine_offset: None,
    }
}

const fn affine(name: &'static str, scale: f64, offset: f64) -> Symbol {
    Symbol {
        name,
        scale,
        dims: [0, 0, 0, 1, 0, 0, 0],
        prefixable: false,
        affine_offset: Some(offset),
    }
}

/// udunits' year, 365.242198781 days
const YEAR_SECONDS: f64 = 3.155_692_597_47e7;

const NONE: [i32; 7] = [0; 7];

const SYMBOLS: &[Symbol] = &[
    sym("1", 1.0, NONE, false),
    sym("%", 1e-2, NONE, false),
    sym("percent", 1e-2, NONE, false),
    sym("ppm", 1e-6, NONE, false),
    sym("ppb", 1e-9, NONE, false),
    sym("g", 1e-3, [1, 0, 0, 0, 0, 0, 0], true),
    sym("t", 1e3, [1, 0, 0, 0, 0, 0, 0], true),
    sym("m", 1.0, [0, 1, 0, 0, 0, 0, 0], true),
    sym("s", 1.0, [0, 0, 1, 0, 0, 0, 0], true),
    sym("min", 60.0, [0, 0, 1, 0, 0, 0, 0], false),
    sym("h", 3600.0, [0, 0, 1, 0, 0, 0, 0], false),
    sym("hr", 3600.0, [0, 0, 1, 0, 0, 0, 0], false),
    sym("d", 86400.0, [0, 0, 1, 0, 0, 0, 0], false),
    sym("day", 86400.0, [0, 0, 1, 0, 0, 0, 0], false),
    sym("days", 86400.0, [0, 0, 1, 0, 0, 0, 0], false),
    sym("yr", YEAR_SECONDS, [0, 0, 1, 0, 0, 0, 0], true),
    sym("year", YEAR_SECONDS, [0, 0, 1, 0, 0, 0, 0], false),
    sym("years", YEAR_SECONDS, [0, 0, 1, 0, 0, 0, 0], false),
    sym("mol", 1.0, [0, 0, 0, 0, 1, 0, 0], true),
    sym("K", 1.0, [0, 0, 0, 1, 0, 0, 0], true),
    sym("A", 1.0, [0, 0, 0, 0, 0, 1, 0], true),
    sym("cd", 1.0, [0, 0, 0, 0, 0, 0, 1], true),
    sym("W", 1.0, [1, 2, -3, 0, 0, 0, 0], true),
    sym("J", 1.0, [1, 2, -2, 0, 0, 0, 0], true),
    sym("N", 1.0, [1, 1, -2, 0, 0, 0, 0], true),
    sym("Pa", 1.0, [1, -1, -2, 0, 0, 0, 0], true),
    sym("bar", 1e5, [1, -1, -2, 0, 0, 0, 0], true),
    sym("L", 1e-3, [0, 3, 0, 0, 0, 0, 0], true),
    sym("l", 1e-3, [0, 3, 0, 0, 0, 0, 0], true),
    sym("Hz", 1.0, [0, 0, -1, 0, 0, 0, 0], true),
    // Sverdrup, ocean volume transport
    sym("Sv", 1e6, [0, 3, -1, 0, 0, 0, 0], false),
    affine("degC", 1.0, 273.15),
    affine("degree_C", 1.0, 273.15),
    affine("celsius", 1.0, 273.15),
    affine("degF", 5.0 / 9.0, 459.67 * 5.0 / 9.0),
    affine("degree_F", 5.0 / 9.0, 459.67 * 5.0 / 9.0),
];

const PREFIXES: &[(&str, f64)] = &[
    ("da", 1e1),
    ("Y", 1e24),
    ("Z", 1e21),
    ("E", 1e18),
    ("P", 1e15),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
    ("a", 1e-18),
];

fn lookup_symbol(name: &str) -> Option<Quantity> {
    if let Some(s) = SYMBOLS.iter().find(|s| s.name == name) {
        return Some(Quantity {
            scale: s.scale,
            dims: Dimensions(s.dims),
            affine_offset: s.affine_offset,
        });
    }
    PREFIXES.iter().find_map(|(prefix, factor)| {
        let rest = name.strip_prefix(prefix)?;
        let s = SYMBOLS.iter().find(|s| s.name == rest && s.prefixable)?;
        Some(Quantity::new(s.scale * factor, Dimensions(s.dims)))
    })
}

/// Split `m-2`, `m2`, `m^-2` into symbol and exponent.
fn split_exponent(token: &str) -> Option<(&str, i32)> {
    if let Some((name, exp)) = token.split_once('^') {
        return Some((name, exp.parse().ok()?));
    }
    let idx = token
        .char_indices()
        .find(|&(i, c)| i > 0 && (c.is_ascii_digit() || c == '-' || c == '+'))
        .map(|(i, _)| i);
    match idx {
        Some(i) => Some((&token[..i], token[i..].parse().ok()?)),
        None => Some((token, 1)),
    }
}

/// Parse a unit expression into a [`Quantity`].
///
/// Factors are separated by whitespace, `.` or `*`. Exponents are written
/// `m2`, `m-2`, `m^2` or `m**2`. Every factor after a `/` is divided.
pub fn parse_unit(expression: &str) -> UnitResult<Quantity> {
    let invalid = |reason: String| UnitError::InvalidUnit {
        expression: expression.to_string(),
        reason,
    };

    let normalized = expression
        .replace("**", "^")
        .replace('/', " / ")
        .replace(['*', '·'], " ");
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(invalid("empty expression".into()));
    }

    let overflow = || invalid("dimension exponent out of range".into());

    let mut result = Quantity::dimensionless(1.0);
    let mut dividing = false;
    for token in tokens {
        if token == "/" {
            dividing = true;
            continue;
        }
        let sign = if dividing { -1 } else { 1 };

        if let Ok(number) = token.parse::<f64>() {
            result = result
                .checked_mul(Quantity::dimensionless(number.powi(sign)))
                .ok_or_else(overflow)?;
            continue;
        }

        for part in token.split('.').filter(|p| !p.is_empty()) {
            let (name, exponent) =
                split_exponent(part).ok_or_else(|| invalid(format!("bad exponent in '{}'", part)))?;
            if exponent.unsigned_abs() > MAX_EXPONENT.unsigned_abs() {
                return Err(invalid(format!("exponent {} in '{}' is out of range", exponent, part)));
            }
            let unit = lookup_symbol(name).ok_or_else(|| invalid(format!("unknown unit '{}'", name)))?;
            if unit.is_affine() {
                if result.is_affine() || exponent != 1 || dividing {
                    return Err(invalid(format!("'{}' cannot be combined or raised to a power", name)));
                }
            }
            result = unit
                .checked_powi(exponent * sign)
                .and_then(|factor| result.checked_mul(factor))
                .ok_or_else(overflow)?;
        }
    }
    Ok(result)
}
