//! Inequality constraints on the flat vector
//!
//! Some gradient-based solvers have no native support for bounds. For those, every
//! scalar degree of freedom gets a `>= lower` and a `<= upper` constraint on its own
//! flat-vector entry, together with the analytic gradient of that constraint: the
//! indicator vector of the entry.
//!
//! Callers can add their own constraints with [`GeneralConstraint`]. A solver sees
//! both kinds through [`Constraint`].

use std::fmt;
use std::sync::Arc;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{MarshalError, Result};
use crate::packing::{check_inputs, dimension};
use crate::parameters::input::InputParameter;
use crate::parameters::point::Axis;
use crate::parameters::value::ValueKind;
use crate::utils::finite_difference;

/// Comparison of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,

    /// Less than or equal to (<=)
    LessThanOrEqual,
}

impl Comparator {
    /// Convert the comparator to a string operator
    pub fn as_operator(&self) -> &'static str {
        match self {
            Self::GreaterThanOrEqual => ">=",
            Self::LessThanOrEqual => "<=",
        }
    }

    /// Amount by which `value` is on the wrong side of `bound`, 0 when satisfied.
    pub fn violation(&self, value: f64, bound: f64) -> f64 {
        match self {
            Self::GreaterThanOrEqual => (bound - value).max(0.0),
            Self::LessThanOrEqual => (value - bound).max(0.0),
        }
    }
}

/// One side of the box bound of one flat-vector entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundConstraint {
    /// Name of the input parameter owning the entry
    pub parameter: String,

    /// Axis of the entry, for point parameters
    pub component: Option<Axis>,

    /// Index of the entry in the flat vector
    pub index: usize,

    pub comparator: Comparator,

    pub bound: f64,

    /// Length of the flat vector
    pub dimension: usize,
}

impl BoundConstraint {
    /// The constrained quantity: the entry itself
    ///
    /// # Errors
    ///
    /// `VectorLengthMismatch` if `flat` is not `dimension` entries long.
    pub fn value(&self, flat: &[f64]) -> Result<f64> {
        if flat.len() != self.dimension {
            return Err(MarshalError::VectorLengthMismatch {
                expected: self.dimension,
                actual: flat.len(),
            });
        }
        flat.get(self.index)
            .copied()
            .ok_or(MarshalError::VectorLengthMismatch {
                expected: self.index + 1,
                actual: flat.len(),
            })
    }

    /// Gradient of [`value`](Self::value): 1.0 at `index`, 0 elsewhere.
    pub fn gradient(&self) -> Array1<f64> {
        let mut grad = Array1::zeros(self.dimension);
        grad[self.index] = 1.0;
        grad
    }

    /// Check if the constraint is satisfied
    pub fn is_satisfied(&self, flat: &[f64]) -> Result<bool> {
        Ok(self.violation(flat)? == 0.0)
    }

    /// Amount by which the entry is beyond the bound, 0 when satisfied.
    pub fn violation(&self, flat: &[f64]) -> Result<f64> {
        Ok(self.comparator.violation(self.value(flat)?, self.bound))
    }
}

impl fmt::Display for BoundConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component {
            Some(axis) => write!(f, "{}.{}", self.parameter, axis)?,
            None => write!(f, "{}", self.parameter)?,
        }
        write!(
            f,
            " [x{}] {} {}",
            self.index,
            self.comparator.as_operator(),
            self.bound
        )
    }
}

type ConstraintFn = Arc<dyn Fn(&Array1<f64>) -> Result<f64> + Send + Sync>;
type ConstraintGradientFn = Arc<dyn Fn(&Array1<f64>) -> Result<Array1<f64>> + Send + Sync>;

/// A caller-defined constraint `value(x) <comparator> bound` on the flat vector
///
/// Without an analytic gradient, the gradient is approximated with central
/// finite differences.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use optmarshal_rs::packing::{Comparator, GeneralConstraint};
///
/// // Keep the sum of the first two entries below 10
/// let budget = GeneralConstraint::new("budget", Comparator::LessThanOrEqual, 10.0, |x| {
///     Ok(x[0] + x[1])
/// });
/// assert!(budget.is_satisfied(&array![4.0, 5.0]).unwrap());
/// assert_eq!(budget.violation(&array![8.0, 5.0]).unwrap(), 3.0);
/// ```
#[derive(Clone)]
pub struct GeneralConstraint {
    name: String,
    comparator: Comparator,
    bound: f64,
    value: ConstraintFn,
    gradient: Option<ConstraintGradientFn>,
}

impl GeneralConstraint {
    pub fn new<F>(name: &str, comparator: Comparator, bound: f64, value: F) -> Self
    where
        F: Fn(&Array1<f64>) -> Result<f64> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            comparator,
            bound,
            value: Arc::new(value),
            gradient: None,
        }
    }

    /// Supply the analytic gradient of the constrained quantity.
    pub fn with_gradient<G>(mut self, gradient: G) -> Self
    where
        G: Fn(&Array1<f64>) -> Result<Array1<f64>> + Send + Sync + 'static,
    {
        self.gradient = Some(Arc::new(gradient));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn bound(&self) -> f64 {
        self.bound
    }

    pub fn has_gradient(&self) -> bool {
        self.gradient.is_some()
    }

    /// The constrained quantity at `x`.
    pub fn value(&self, x: &Array1<f64>) -> Result<f64> {
        (self.value)(x)
    }

    /// Gradient of the constrained quantity at `x`.
    pub fn gradient(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        match &self.gradient {
            Some(gradient) => gradient(x),
            None => finite_difference::gradient(|p| (self.value)(p), x, None),
        }
    }

    pub fn is_satisfied(&self, x: &Array1<f64>) -> Result<bool> {
        Ok(self.violation(x)? == 0.0)
    }

    pub fn violation(&self, x: &Array1<f64>) -> Result<f64> {
        Ok(self.comparator.violation(self.value(x)?, self.bound))
    }
}

impl fmt::Debug for GeneralConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneralConstraint")
            .field("name", &self.name)
            .field("comparator", &self.comparator)
            .field("bound", &self.bound)
            .field("has_gradient", &self.has_gradient())
            .finish()
    }
}

impl fmt::Display for GeneralConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.name,
            self.comparator.as_operator(),
            self.bound
        )
    }
}

/// Any constraint handed to a solver.
#[derive(Debug, Clone)]
pub enum Constraint {
    Bound(BoundConstraint),
    General(GeneralConstraint),
}

impl Constraint {
    pub fn comparator(&self) -> Comparator {
        match self {
            Constraint::Bound(c) => c.comparator,
            Constraint::General(c) => c.comparator,
        }
    }

    pub fn bound(&self) -> f64 {
        match self {
            Constraint::Bound(c) => c.bound,
            Constraint::General(c) => c.bound,
        }
    }

    pub fn value(&self, x: &Array1<f64>) -> Result<f64> {
        match self {
            Constraint::Bound(c) => c.value(&x.to_vec()),
            Constraint::General(c) => c.value(x),
        }
    }

    pub fn gradient(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        match self {
            Constraint::Bound(c) => {
                if x.len() != c.dimension {
                    return Err(MarshalError::VectorLengthMismatch {
                        expected: c.dimension,
                        actual: x.len(),
                    });
                }
                Ok(c.gradient())
            }
            Constraint::General(c) => c.gradient(x),
        }
    }

    pub fn is_satisfied(&self, x: &Array1<f64>) -> Result<bool> {
        Ok(self.violation(x)? == 0.0)
    }

    pub fn violation(&self, x: &Array1<f64>) -> Result<f64> {
        Ok(self.comparator().violation(self.value(x)?, self.bound()))
    }
}

impl From<BoundConstraint> for Constraint {
    fn from(c: BoundConstraint) -> Self {
        Constraint::Bound(c)
    }
}

impl From<GeneralConstraint> for Constraint {
    fn from(c: GeneralConstraint) -> Self {
        Constraint::General(c)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Bound(c) => fmt::Display::fmt(c, f),
            Constraint::General(c) => fmt::Display::fmt(c, f),
        }
    }
}

/// Build the bound constraints of every scalar degree of freedom
///
/// Constraints come in `(>= lower, <= upper)` pairs, ordered by flat index.
///
/// # Errors
///
/// `EmptyInputSet` for an empty list, `DuplicateName` for repeated names.
pub fn bound_constraints(inputs: &[InputParameter]) -> Result<Vec<BoundConstraint>> {
    check_inputs(inputs)?;

    let n = dimension(inputs);
    let mut constraints = Vec::with_capacity(2 * n);
    let mut index = 0;

    for param in inputs {
        let lower = param.lower_bounds();
        let upper = param.upper_bounds();
        for (k, (lo, hi)) in lower.into_iter().zip(upper).enumerate() {
            let component = match param.kind() {
                ValueKind::Point => Some(Axis::ALL[k]),
                ValueKind::Real | ValueKind::Integer => None,
            };
            let constraint = |comparator, bound| BoundConstraint {
                parameter: param.name().to_string(),
                component,
                index,
                comparator,
                bound,
                dimension: n,
            };
            constraints.push(constraint(Comparator::GreaterThanOrEqual, lo));
            constraints.push(constraint(Comparator::LessThanOrEqual, hi));
            index += 1;
        }
    }

    Ok(constraints)
}
