//! Typed parameter values and kind-tagged ranges
//!
//! Parameters come in three kinds: real scalars, integer scalars and 3D points.
//! [`Value`] carries a value of one of these kinds and [`ParamRange`] carries a
//! range of one of these kinds. Both are closed sum types, so every operation
//! matches all kinds exhaustively.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MarshalError, Result};
use crate::parameters::parse;
use crate::parameters::point::{Point3, Point3Range};
use crate::parameters::range::{ValueRange, CANONICAL_RANGE};

/// The kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Real,
    Integer,
    Point,
}

impl ValueKind {
    /// Number of entries a value of this kind occupies in the flat vector.
    pub fn dimensionality(self) -> usize {
        match self {
            ValueKind::Real | ValueKind::Integer => 1,
            ValueKind::Point => 3,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueKind::Real => "real",
            ValueKind::Integer => "integer",
            ValueKind::Point => "point",
        };
        f.write_str(label)
    }
}

/// A value of any parameter kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Real(f64),
    Integer(i64),
    Point(Point3),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Real(_) => ValueKind::Real,
            Value::Integer(_) => ValueKind::Integer,
            Value::Point(_) => ValueKind::Point,
        }
    }

    /// Flattened components, in flat-vector order.
    pub fn components(&self) -> Vec<f64> {
        match self {
            Value::Real(v) => vec![*v],
            Value::Integer(v) => vec![*v as f64],
            Value::Point(p) => p.components().to_vec(),
        }
    }

    /// Check that every component is finite.
    pub fn is_finite(&self) -> bool {
        self.components().iter().all(|c| c.is_finite())
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point3> {
        match self {
            Value::Point(p) => Some(*p),
            _ => None,
        }
    }

    /// Parse text into a value of the given kind.
    pub fn parse(kind: ValueKind, text: &str) -> Result<Self> {
        parse::parse_value(kind, text)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<Point3> for Value {
    fn from(value: Point3) -> Self {
        Value::Point(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Real(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Point(p) => write!(f, "({})", p),
        }
    }
}

/// A range of any parameter kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamRange {
    Real(ValueRange<f64>),
    Integer(ValueRange<i64>),
    Point(Point3Range),
}

impl ParamRange {
    pub fn real(min: f64, max: f64) -> Result<Self> {
        Ok(ParamRange::Real(ValueRange::new(min, max)?))
    }

    pub fn integer(min: i64, max: i64) -> Result<Self> {
        Ok(ParamRange::Integer(ValueRange::new(min, max)?))
    }

    pub fn point(min: Point3, max: Point3) -> Result<Self> {
        Ok(ParamRange::Point(Point3Range::new(min, max)?))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ParamRange::Real(_) => ValueKind::Real,
            ParamRange::Integer(_) => ValueKind::Integer,
            ParamRange::Point(_) => ValueKind::Point,
        }
    }

    pub fn dimensionality(&self) -> usize {
        self.kind().dimensionality()
    }

    /// Real view of the range, one entry per flat-vector component.
    pub fn axes(&self) -> Vec<ValueRange<f64>> {
        match self {
            ParamRange::Real(r) => vec![*r],
            ParamRange::Integer(r) => vec![ValueRange::from(*r)],
            ParamRange::Point(r) => r.axes().to_vec(),
        }
    }

    pub fn lower_bounds(&self) -> Vec<f64> {
        self.axes().iter().map(|axis| axis.min()).collect()
    }

    pub fn upper_bounds(&self) -> Vec<f64> {
        self.axes().iter().map(|axis| axis.max()).collect()
    }

    /// Per-component midpoint.
    pub fn midpoint(&self) -> Vec<f64> {
        self.axes().iter().map(|axis| axis.mid()).collect()
    }

    /// Check whether a value lies inside the range.
    ///
    /// Fails with `TypeMismatch` when the value is of another kind.
    pub fn contains(&self, value: &Value) -> Result<bool> {
        match (self, value) {
            (ParamRange::Real(r), Value::Real(v)) => Ok(r.contains(*v)),
            (ParamRange::Integer(r), Value::Integer(v)) => Ok(r.contains(*v)),
            (ParamRange::Point(r), Value::Point(p)) => Ok(r.contains(p)),
            _ => Err(self.mismatch(value.kind())),
        }
    }

    /// Per-component distance from a value to the range.
    pub fn distance_outside(&self, value: &Value) -> Result<Vec<f64>> {
        match (self, value) {
            (ParamRange::Real(r), Value::Real(v)) => Ok(vec![r.distance_outside(*v)?]),
            (ParamRange::Integer(r), Value::Integer(v)) => {
                Ok(vec![r.distance_outside(*v)? as f64])
            }
            (ParamRange::Point(r), Value::Point(p)) => {
                Ok(r.distance_outside(p)?.components().to_vec())
            }
            _ => Err(self.mismatch(value.kind())),
        }
    }

    /// Map a value of this range's kind into the canonical objective scale.
    pub fn scale_to_canonical(&self, value: &Value) -> Result<Vec<f64>> {
        if value.kind() != self.kind() {
            return Err(self.mismatch(value.kind()));
        }
        self.scale_components(&value.components())
    }

    /// Map raw flat components into the canonical objective scale, axis by axis.
    pub fn scale_components(&self, components: &[f64]) -> Result<Vec<f64>> {
        self.axes()
            .iter()
            .zip(components)
            .map(|(axis, &c)| axis.scale(c, &CANONICAL_RANGE))
            .collect()
    }

    /// Replace the lower bound with a value parsed from text.
    pub fn with_min_str(&self, text: &str) -> Result<Self> {
        Ok(match self {
            ParamRange::Real(r) => ParamRange::Real(r.with_min_str(text)?),
            ParamRange::Integer(r) => ParamRange::Integer(r.with_min_str(text)?),
            ParamRange::Point(r) => ParamRange::Point(r.with_min_str(text)?),
        })
    }

    /// Replace the upper bound with a value parsed from text.
    pub fn with_max_str(&self, text: &str) -> Result<Self> {
        Ok(match self {
            ParamRange::Real(r) => ParamRange::Real(r.with_max_str(text)?),
            ParamRange::Integer(r) => ParamRange::Integer(r.with_max_str(text)?),
            ParamRange::Point(r) => ParamRange::Point(r.with_max_str(text)?),
        })
    }

    /// Build a range of the given kind from two textual bounds.
    pub fn from_strs(kind: ValueKind, min: &str, max: &str) -> Result<Self> {
        Ok(match kind {
            ValueKind::Real => ParamRange::Real(ValueRange::from_strs(min, max)?),
            ValueKind::Integer => ParamRange::Integer(ValueRange::from_strs(min, max)?),
            ValueKind::Point => ParamRange::Point(Point3Range::from_strs(min, max)?),
        })
    }

    /// `TypeMismatch` without a parameter name; callers attach theirs.
    pub(crate) fn mismatch(&self, found: ValueKind) -> MarshalError {
        MarshalError::TypeMismatch {
            name: String::new(),
            expected: self.kind(),
            found,
        }
    }
}

impl fmt::Display for ParamRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamRange::Real(r) => fmt::Display::fmt(r, f),
            ParamRange::Integer(r) => fmt::Display::fmt(r, f),
            ParamRange::Point(r) => fmt::Display::fmt(r, f),
        }
    }
}
