//! Input parameter definitions
//!
//! An [`InputParameter`] is a design variable the optimizer may vary. It owns a
//! search range, an optional start value and, once packed, the offset of its slice
//! in the flat optimization vector. Scalars occupy one entry of that vector, points
//! occupy three (x, y, z).

use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MarshalError, Result};
use crate::parameters::parse;
use crate::parameters::point::{Point3, Point3Range};
use crate::parameters::value::{ParamRange, Value, ValueKind};

/// Strategy used to choose the initial guess of an input parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StartPosition {
    /// Midpoint of the search range
    #[default]
    CenterOfRange,

    /// Uniformly random inside the search range
    Random,

    /// Random shift of up to `percent * width` around the midpoint
    PercentRandomFromCenter,

    /// Random shift of up to `percent * width` around the given start
    PercentRandomFromGiven,
}

/// A design variable of the optimization problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "InputRepr")]
pub struct InputParameter {
    name: String,

    search_range: ParamRange,

    start: Option<Value>,

    /// Offset of the first component in the flat vector, assigned by packing
    #[serde(skip)]
    vector_offset: Option<usize>,
}

#[derive(Deserialize)]
struct InputRepr {
    name: String,
    search_range: ParamRange,
    #[serde(default)]
    start: Option<Value>,
}

impl TryFrom<InputRepr> for InputParameter {
    type Error = MarshalError;

    fn try_from(repr: InputRepr) -> Result<Self> {
        let mut param = InputParameter::new(&repr.name, repr.search_range);
        param.set_start(repr.start)?;
        Ok(param)
    }
}

impl InputParameter {
    /// Create an input parameter with the given search range and no start value
    ///
    /// The kind of the parameter is fixed by the kind of the range.
    ///
    /// # Examples
    ///
    /// ```
    /// use optmarshal_rs::parameters::input::InputParameter;
    /// use optmarshal_rs::parameters::value::ParamRange;
    ///
    /// let width = InputParameter::new("width", ParamRange::real(0.0, 10.0).unwrap());
    /// assert_eq!(width.dimensionality(), 1);
    /// assert_eq!(width.initial_guess(), vec![5.0]);
    /// ```
    pub fn new(name: &str, search_range: ParamRange) -> Self {
        Self {
            name: name.to_string(),
            search_range,
            start: None,
            vector_offset: None,
        }
    }

    /// Real scalar input over `[min, max]`.
    pub fn real(name: &str, min: f64, max: f64) -> Result<Self> {
        Ok(Self::new(name, ParamRange::real(min, max)?))
    }

    /// Integer scalar input over `[min, max]`.
    pub fn integer(name: &str, min: i64, max: i64) -> Result<Self> {
        Ok(Self::new(name, ParamRange::integer(min, max)?))
    }

    /// Point input inside the box spanned by `min` and `max`.
    pub fn point(name: &str, min: Point3, max: Point3) -> Result<Self> {
        Ok(Self::new(name, ParamRange::Point(Point3Range::new(min, max)?)))
    }

    /// Builder form of [`set_start`](Self::set_start).
    pub fn with_start(mut self, start: impl Into<Value>) -> Result<Self> {
        self.set_start(Some(start.into()))?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.search_range.kind()
    }

    /// Number of flat-vector entries this parameter occupies (1 or 3).
    pub fn dimensionality(&self) -> usize {
        self.search_range.dimensionality()
    }

    pub fn search_range(&self) -> &ParamRange {
        &self.search_range
    }

    pub fn start(&self) -> Option<&Value> {
        self.start.as_ref()
    }

    /// Offset assigned by the last packing, if any.
    pub fn vector_offset(&self) -> Option<usize> {
        self.vector_offset
    }

    pub(crate) fn set_vector_offset(&mut self, offset: usize) {
        self.vector_offset = Some(offset);
    }

    /// Replace the search range
    ///
    /// The range must be of the parameter's kind, and a start value that is
    /// already set must still lie inside the new range. On error the parameter is
    /// left unchanged.
    pub fn set_search_range(&mut self, range: ParamRange) -> Result<()> {
        if range.kind() != self.kind() {
            return Err(self.mismatch(range.kind()));
        }
        if let Some(start) = &self.start {
            self.check_inside(&range, start)?;
        }
        self.search_range = range;
        Ok(())
    }

    /// Set or clear the start value
    ///
    /// # Errors
    ///
    /// * `TypeMismatch` if the value is of another kind than the parameter
    /// * `OutOfRange` if the value lies outside the search range
    pub fn set_start(&mut self, start: Option<Value>) -> Result<()> {
        if let Some(value) = &start {
            self.check_inside(&self.search_range, value)?;
        }
        self.start = start;
        Ok(())
    }

    /// Replace the lower search bound with text input.
    pub fn set_min_str(&mut self, text: &str) -> Result<()> {
        let range = self.search_range.with_min_str(text)?;
        self.set_search_range(range)
    }

    /// Replace the upper search bound with text input.
    pub fn set_max_str(&mut self, text: &str) -> Result<()> {
        let range = self.search_range.with_max_str(text)?;
        self.set_search_range(range)
    }

    /// Update start and search range from text input
    ///
    /// Both bounds are required; a blank `start` clears the start value. Nothing is
    /// changed unless every field parses and validates.
    ///
    /// # Examples
    ///
    /// ```
    /// use optmarshal_rs::parameters::input::InputParameter;
    /// use optmarshal_rs::parameters::value::Value;
    ///
    /// let mut count = InputParameter::integer("count", 0, 1).unwrap();
    /// count.update_from_strings("4", "2", "8").unwrap();
    /// assert_eq!(count.start(), Some(&Value::Integer(4)));
    /// assert_eq!(count.lower_bounds(), vec![2.0]);
    ///
    /// assert!(count.update_from_strings("", "2", "").is_err());
    /// ```
    pub fn update_from_strings(&mut self, start: &str, min: &str, max: &str) -> Result<()> {
        if min.trim().is_empty() || max.trim().is_empty() {
            return Err(MarshalError::IncompleteRange {
                name: self.name.clone(),
                which: "search".to_string(),
            });
        }

        let range = ParamRange::from_strs(self.kind(), min, max)?;
        let start = parse::parse_optional(self.kind(), start)?;
        if let Some(value) = &start {
            self.check_inside(&range, value)?;
        }

        self.search_range = range;
        self.start = start;
        Ok(())
    }

    /// Lower bounds of every component, in x, y, z order for points.
    pub fn lower_bounds(&self) -> Vec<f64> {
        self.search_range.lower_bounds()
    }

    /// Upper bounds of every component, in x, y, z order for points.
    pub fn upper_bounds(&self) -> Vec<f64> {
        self.search_range.upper_bounds()
    }

    /// The flattened start value, or the per-axis midpoint of the search range.
    pub fn initial_guess(&self) -> Vec<f64> {
        match &self.start {
            Some(start) => start.components(),
            None => self.search_range.midpoint(),
        }
    }

    /// Initial guess under a start strategy
    ///
    /// # Arguments
    ///
    /// * `strategy` - How to pick components that are not fixed by a given start
    /// * `percent` - Shift half-width as a fraction of each axis width
    /// * `rng` - Source of randomness
    ///
    /// # Returns
    ///
    /// One value per component, always inside the search range. A start value set
    /// on the parameter is returned verbatim, except with
    /// [`StartPosition::PercentRandomFromGiven`] where it is the centre of the shift.
    pub fn initial_guess_with<R: Rng + ?Sized>(
        &self,
        strategy: StartPosition,
        percent: f64,
        rng: &mut R,
    ) -> Vec<f64> {
        if self.start.is_some() && strategy != StartPosition::PercentRandomFromGiven {
            return self.initial_guess();
        }

        let centres = match strategy {
            StartPosition::PercentRandomFromGiven => self.initial_guess(),
            _ => self.search_range.midpoint(),
        };

        self.search_range
            .axes()
            .iter()
            .zip(centres)
            .map(|(axis, centre)| {
                let (lo, hi) = (axis.min(), axis.max());
                if lo == hi {
                    return lo;
                }
                match strategy {
                    StartPosition::CenterOfRange => centre,
                    StartPosition::Random => rng.gen_range(lo..=hi),
                    StartPosition::PercentRandomFromCenter
                    | StartPosition::PercentRandomFromGiven => {
                        let half = percent.abs() * (hi - lo);
                        (centre + rng.gen_range(-half..=half)).clamp(lo, hi)
                    }
                }
            })
            .collect()
    }

    /// Check whether a value lies inside the search range.
    pub fn contains(&self, value: &Value) -> Result<bool> {
        self.search_range
            .contains(value)
            .map_err(|e| e.named(&self.name))
    }

    /// Rebuild a typed value from this parameter's slice of the flat vector
    ///
    /// Integer parameters truncate the real component toward zero.
    pub(crate) fn value_from_components(&self, components: &[f64]) -> Result<Value> {
        if components.len() != self.dimensionality() {
            return Err(MarshalError::VectorLengthMismatch {
                expected: self.dimensionality(),
                actual: components.len(),
            });
        }

        Ok(match self.kind() {
            ValueKind::Real => Value::Real(components[0]),
            ValueKind::Integer => Value::Integer(components[0].trunc() as i64),
            ValueKind::Point => {
                Value::Point(Point3::new(components[0], components[1], components[2]))
            }
        })
    }

    fn check_inside(&self, range: &ParamRange, value: &Value) -> Result<()> {
        if !range.contains(value).map_err(|e| e.named(&self.name))? {
            return Err(MarshalError::OutOfRange {
                name: self.name.clone(),
                value: value.to_string(),
                range: range.to_string(),
            });
        }
        Ok(())
    }

    fn mismatch(&self, found: ValueKind) -> MarshalError {
        MarshalError::TypeMismatch {
            name: self.name.clone(),
            expected: self.kind(),
            found,
        }
    }
}

// Identity is kind + name; ranges and start values do not take part.
impl PartialEq for InputParameter {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.name == other.name
    }
}

impl Eq for InputParameter {}

impl Hash for InputParameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.name.hash(state);
    }
}
