//! Cube: one variable's values over time and space

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AttributeValue, Attributes};
use crate::time::{Calendar, CalendarDateTime, TimeResult, TimeUnits};

/// Shape problems in a cube's data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CubeError {
    #[error("Cube '{name}' holds {actual} values, shape requires {expected}")]
    DataLength {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Time coordinate of a cube
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAxis {
    pub points: Vec<f64>,
    pub units: TimeUnits,
    pub calendar: Calendar,
}

impl TimeAxis {
    pub fn new(points: Vec<f64>, units: TimeUnits, calendar: Calendar) -> Self {
        Self {
            points,
            units,
            calendar,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Date of the first point
    pub fn start(&self) -> TimeResult<Option<CalendarDateTime>> {
        self.points
            .first()
            .map(|p| self.units.num2date(*p, self.calendar))
            .transpose()
    }

    /// Date of the last point
    pub fn end(&self) -> TimeResult<Option<CalendarDateTime>> {
        self.points
            .last()
            .map(|p| self.units.num2date(*p, self.calendar))
            .transpose()
    }

    /// Points re-expressed in other time units of the same calendar
    pub fn points_in(&self, units: &TimeUnits) -> TimeResult<Vec<f64>> {
        if *units == self.units {
            return Ok(self.points.clone());
        }
        let (scale, offset) = self.units.rebase(units, self.calendar)?;
        Ok(self.points.iter().map(|p| p * scale + offset).collect())
    }
}

/// Values of one variable on a time axis and a fixed spatial grid
///
/// `data` is time-major: the values of time step `t` occupy
/// `data[t * spatial_size .. (t + 1) * spatial_size]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    /// Variable short name
    pub name: String,
    /// Physical unit of the values
    pub units: String,
    pub time: TimeAxis,
    /// Sizes of the non-time dimensions; empty for a global mean series
    #[serde(default)]
    pub shape: Vec<usize>,
    /// NaN marks a missing value; written as `null` in JSON
    #[serde(with = "missing_values")]
    pub data: Vec<f64>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Cube {
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        time: TimeAxis,
        shape: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self, CubeError> {
        let cube = Self {
            name: name.into(),
            units: units.into(),
            time,
            shape,
            data,
            attributes: Attributes::new(),
        };
        cube.validate()?;
        Ok(cube)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Check that the data length matches time length times spatial size.
    pub fn validate(&self) -> Result<(), CubeError> {
        let expected = self.time.len() * self.spatial_size();
        if self.data.len() != expected {
            return Err(CubeError::DataLength {
                name: self.name.clone(),
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Number of values per time step
    pub fn spatial_size(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn time_len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Values of one time step
    pub fn timestep(&self, index: usize) -> &[f64] {
        let size = self.spatial_size();
        &self.data[index * size..(index + 1) * size]
    }

    /// Copy holding only the time steps whose point satisfies `keep`.
    pub fn select_times(&self, keep: impl Fn(f64) -> bool) -> Cube {
        let size = self.spatial_size();
        let mut points = Vec::new();
        let mut data = Vec::new();
        for (i, &point) in self.time.points.iter().enumerate() {
            if keep(point) {
                points.push(point);
                data.extend_from_slice(&self.data[i * size..(i + 1) * size]);
            }
        }
        Cube {
            time: TimeAxis::new(points, self.time.units.clone(), self.time.calendar),
            data,
            ..self.clone()
        }
    }

    /// Copy holding the time steps strictly before `threshold`, a value
    /// in this cube's time units.
    pub fn extract_before(&self, threshold: f64) -> Cube {
        self.select_times(|t| t < threshold)
    }
}

/// `data` as a JSON array with `null` for missing values
mod missing_values {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(data.iter().map(|v| if v.is_nan() { None } else { Some(*v) }))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
