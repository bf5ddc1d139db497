//! Closed value ranges
//!
//! This module provides [`ValueRange`], a closed interval over an ordered numeric
//! domain (integers or reals). Ranges are the building block for search ranges of
//! input parameters and for the scale and allowable ranges of output parameters.
//!
//! A range is never mutated into an invalid state: every change produces a new,
//! validated range through [`ValueRange::new`], [`ValueRange::with_min`] or
//! [`ValueRange::with_max`].

use std::fmt;
use std::ops::Sub;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{MarshalError, Result};
use crate::parameters::parse;
use crate::parameters::value::ValueKind;

/// The canonical objective scale.
///
/// Output quantities that declare a scale range are mapped into this range before
/// they are combined, so that quantities of unrelated units (lengths, angles, forces)
/// contribute comparably to a summed-square objective.
pub const CANONICAL_RANGE: ValueRange<f64> = ValueRange {
    min: 0.0,
    max: 100.0,
};

/// Numeric types a [`ValueRange`] can be built over.
pub trait RangeScalar:
    Copy + PartialOrd + Sub<Output = Self> + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// The value kind of a scalar parameter over this type.
    const KIND: ValueKind;

    /// The additive identity.
    fn zero() -> Self;

    /// Widen to a real number.
    fn to_f64(self) -> f64;

    /// Narrow a real number back into this type.
    fn from_f64(value: f64) -> Self;

    /// Parse textual input into this type.
    fn parse_text(text: &str) -> Result<Self>;

    /// Check that the value is neither infinite nor NaN.
    fn is_finite(self) -> bool;
}

impl RangeScalar for f64 {
    const KIND: ValueKind = ValueKind::Real;

    fn zero() -> Self {
        0.0
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }

    fn parse_text(text: &str) -> Result<Self> {
        parse::parse_real(text)
    }

    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

impl RangeScalar for i64 {
    const KIND: ValueKind = ValueKind::Integer;

    fn zero() -> Self {
        0
    }

    fn to_f64(self) -> f64 {
        self as f64
    }

    // Integer rescales land on the nearest integer.
    fn from_f64(value: f64) -> Self {
        value.round() as i64
    }

    fn parse_text(text: &str) -> Result<Self> {
        parse::parse_integer(text)
    }

    fn is_finite(self) -> bool {
        true
    }
}

/// A closed interval `[min, max]` with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange<T> {
    min: T,
    max: T,
}

impl<'de, T> Deserialize<'de> for ValueRange<T>
where
    T: RangeScalar + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RangeHelper<T> {
            min: T,
            max: T,
        }

        let helper = RangeHelper::<T>::deserialize(deserializer)?;
        ValueRange::new(helper.min, helper.max).map_err(serde::de::Error::custom)
    }
}

impl<T: RangeScalar> ValueRange<T> {
    /// Create a new range
    ///
    /// # Arguments
    ///
    /// * `min` - Lower end of the range (inclusive)
    /// * `max` - Upper end of the range (inclusive)
    ///
    /// # Returns
    ///
    /// A new `ValueRange` if both bounds are finite and `min <= max`, or
    /// `InvalidRange` otherwise. The bounds are never swapped.
    ///
    /// # Examples
    ///
    /// ```
    /// use optmarshal_rs::parameters::range::ValueRange;
    ///
    /// let range = ValueRange::new(0.0, 10.0).unwrap();
    /// assert_eq!(range.min(), 0.0);
    /// assert_eq!(range.max(), 10.0);
    ///
    /// assert!(ValueRange::new(5_i64, 2).is_err());
    /// assert!(ValueRange::new(0.0, f64::INFINITY).is_err());
    /// ```
    pub fn new(min: T, max: T) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(MarshalError::InvalidRange {
                min: min.to_f64(),
                max: max.to_f64(),
            });
        }

        Ok(Self { min, max })
    }

    /// Lower end of the range.
    pub fn min(&self) -> T {
        self.min
    }

    /// Upper end of the range.
    pub fn max(&self) -> T {
        self.max
    }

    /// Midpoint of the range, as a real number.
    pub fn mid(&self) -> f64 {
        (self.max.to_f64() - self.min.to_f64()) / 2.0 + self.min.to_f64()
    }

    /// Check whether the range has zero width.
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// Check if a value is within the range (boundaries included).
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Linearly map a value of this range into another range
    ///
    /// Computes `to.min + (value - min) * (to.max - to.min) / (max - min)`.
    /// No clamping is performed: values outside this range are extrapolated
    /// along the same linear map.
    ///
    /// # Arguments
    ///
    /// * `value` - Value to rescale
    /// * `to` - Destination range
    ///
    /// # Returns
    ///
    /// The rescaled value, or `DegenerateRange` if this range has zero width
    ///
    /// # Examples
    ///
    /// ```
    /// use optmarshal_rs::parameters::range::ValueRange;
    ///
    /// let percent = ValueRange::new(0.0, 100.0).unwrap();
    /// let unit = ValueRange::new(0.0, 1.0).unwrap();
    /// assert_eq!(percent.scale(50.0, &unit).unwrap(), 0.5);
    /// ```
    pub fn scale(&self, value: T, to: &ValueRange<T>) -> Result<T> {
        self.ensure_width()?;

        let (min, max) = (self.min.to_f64(), self.max.to_f64());
        let (to_min, to_max) = (to.min.to_f64(), to.max.to_f64());
        let scaled = to_min + (value.to_f64() - min) * (to_max - to_min) / (max - min);

        Ok(T::from_f64(scaled))
    }

    /// Distance from a value to the nearest boundary of the range
    ///
    /// # Returns
    ///
    /// Zero for any value inside or on the boundary, otherwise the (positive)
    /// magnitude of the violation on the side that was exceeded. Fails with
    /// `DegenerateRange` for a zero-width range.
    pub fn distance_outside(&self, value: T) -> Result<T> {
        self.ensure_width()?;

        if self.contains(value) {
            return Ok(T::zero());
        }

        // At most one side is violated for a valid range
        if value > self.max {
            Ok(value - self.max)
        } else {
            Ok(self.min - value)
        }
    }

    /// Replace the lower end, keeping the upper one.
    pub fn with_min(&self, min: T) -> Result<Self> {
        Self::new(min, self.max)
    }

    /// Replace the upper end, keeping the lower one.
    pub fn with_max(&self, max: T) -> Result<Self> {
        Self::new(self.min, max)
    }

    /// Replace the lower end with a value parsed from text.
    pub fn with_min_str(&self, text: &str) -> Result<Self> {
        self.with_min(T::parse_text(text)?)
    }

    /// Replace the upper end with a value parsed from text.
    pub fn with_max_str(&self, text: &str) -> Result<Self> {
        self.with_max(T::parse_text(text)?)
    }

    /// Build a range from two textual bounds.
    pub fn from_strs(min: &str, max: &str) -> Result<Self> {
        Self::new(T::parse_text(min)?, T::parse_text(max)?)
    }

    fn ensure_width(&self) -> Result<()> {
        if self.is_degenerate() {
            return Err(MarshalError::DegenerateRange {
                min: self.min.to_f64(),
                max: self.max.to_f64(),
            });
        }
        Ok(())
    }
}

impl From<ValueRange<i64>> for ValueRange<f64> {
    fn from(range: ValueRange<i64>) -> Self {
        Self {
            min: range.min as f64,
            max: range.max as f64,
        }
    }
}

impl<T: fmt::Display> fmt::Display for ValueRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
