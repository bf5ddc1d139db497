//! Packing of input parameters into the flat optimization vector
//!
//! Solvers work on a one-dimensional array of reals. Packing assigns every input
//! parameter a contiguous slice of that array, in list order, and derives the
//! lower-bound, upper-bound and initial-guess vectors from the parameters. Unpacking
//! is the inverse: it reads each slice back into a typed, named value.
//!
//! The order of the input list is significant and must be the same for packing and
//! unpacking.
//!
//! # Examples
//!
//! ```
//! use optmarshal_rs::packing;
//! use optmarshal_rs::parameters::input::InputParameter;
//! use optmarshal_rs::parameters::value::Value;
//!
//! let mut inputs = vec![
//!     InputParameter::real("width", 0.0, 10.0).unwrap(),
//!     InputParameter::real("offset", -5.0, 5.0).unwrap(),
//! ];
//! let packed = packing::pack(&mut inputs).unwrap();
//! assert_eq!(packed.lower().to_vec(), vec![0.0, -5.0]);
//! assert_eq!(packed.offsets(), &[0, 1]);
//!
//! let values = packing::unpack(&[2.5, 1.0], &inputs).unwrap();
//! assert_eq!(values["offset"], Value::Real(1.0));
//! ```

pub mod constraints;

use std::collections::{HashMap, HashSet};

use ndarray::Array1;
use rand::Rng;

use crate::error::{MarshalError, Result};
use crate::parameters::definition::Role;
use crate::parameters::input::{InputParameter, StartPosition};
use crate::parameters::value::Value;

pub use constraints::{bound_constraints, BoundConstraint, Comparator, Constraint, GeneralConstraint};

/// Named values, as passed to and returned from the evaluation callback.
pub type ValueMap = HashMap<String, Value>;

/// Bounds, initial guess and slice offsets of a packed input list.
#[derive(Debug, Clone, PartialEq)]
pub struct Packing {
    lower: Array1<f64>,
    upper: Array1<f64>,
    initial: Array1<f64>,
    offsets: Vec<usize>,
}

impl Packing {
    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    pub fn initial(&self) -> &Array1<f64> {
        &self.initial
    }

    /// Offset of each input's slice, in input order.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Length of the flat vector.
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// Check whether a flat vector lies inside the packed bounds.
    pub fn contains(&self, flat: &[f64]) -> bool {
        flat.len() == self.dimension()
            && flat
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(x, (lo, hi))| x >= lo && x <= hi)
    }

    /// Split into `(lower, upper, initial, offsets)`.
    pub fn into_parts(self) -> (Array1<f64>, Array1<f64>, Array1<f64>, Vec<usize>) {
        (self.lower, self.upper, self.initial, self.offsets)
    }
}

/// Total number of scalar degrees of freedom of the inputs.
pub fn dimension(inputs: &[InputParameter]) -> usize {
    inputs.iter().map(|p| p.dimensionality()).sum()
}

/// Compute the packing of the inputs without recording offsets on them
///
/// Initial guesses are the given start values, or the midpoints of the search
/// ranges.
pub fn layout(inputs: &[InputParameter]) -> Result<Packing> {
    build(inputs, |p| p.initial_guess())
}

/// Like [`layout`], with initial guesses chosen by a start strategy.
pub fn layout_with<R: Rng + ?Sized>(
    inputs: &[InputParameter],
    strategy: StartPosition,
    percent: f64,
    rng: &mut R,
) -> Result<Packing> {
    build(inputs, |p| p.initial_guess_with(strategy, percent, &mut *rng))
}

/// Pack the inputs and record each parameter's vector offset
///
/// # Arguments
///
/// * `inputs` - Ordered list of input parameters
///
/// # Returns
///
/// The packing, or `EmptyInputSet` for an empty list and `DuplicateName` if two
/// inputs share a name.
pub fn pack(inputs: &mut [InputParameter]) -> Result<Packing> {
    let packing = layout(inputs)?;
    assign_offsets(inputs, &packing);
    Ok(packing)
}

/// Like [`pack`], with initial guesses chosen by a start strategy.
pub fn pack_with<R: Rng + ?Sized>(
    inputs: &mut [InputParameter],
    strategy: StartPosition,
    percent: f64,
    rng: &mut R,
) -> Result<Packing> {
    let packing = layout_with(inputs, strategy, percent, rng)?;
    assign_offsets(inputs, &packing);
    Ok(packing)
}

/// Read a flat vector back into named, typed values
///
/// Each input reads the slice starting at the running sum of the dimensionalities
/// before it. Integer inputs truncate their real component toward zero.
///
/// # Errors
///
/// `VectorLengthMismatch` if `flat` is not exactly as long as the inputs span.
pub fn unpack(flat: &[f64], inputs: &[InputParameter]) -> Result<ValueMap> {
    let expected = dimension(inputs);
    if flat.len() != expected {
        return Err(MarshalError::VectorLengthMismatch {
            expected,
            actual: flat.len(),
        });
    }

    let mut values = ValueMap::with_capacity(inputs.len());
    let mut offset = 0;
    for param in inputs {
        let end = offset + param.dimensionality();
        let value = param.value_from_components(&flat[offset..end])?;
        values.insert(param.name().to_string(), value);
        offset = end;
    }

    Ok(values)
}

/// Flatten named values into a vector, in input order
///
/// # Errors
///
/// * `MissingValue` if an input has no entry in `values`
/// * `TypeMismatch` if an entry has the wrong kind
pub fn flatten(values: &ValueMap, inputs: &[InputParameter]) -> Result<Array1<f64>> {
    let mut flat = Vec::with_capacity(dimension(inputs));
    for param in inputs {
        let value = values
            .get(param.name())
            .ok_or_else(|| MarshalError::MissingValue {
                name: param.name().to_string(),
            })?;
        if value.kind() != param.kind() {
            return Err(MarshalError::TypeMismatch {
                name: param.name().to_string(),
                expected: param.kind(),
                found: value.kind(),
            });
        }
        flat.extend(value.components());
    }
    Ok(Array1::from(flat))
}

/// Reject empty input lists and repeated names.
pub(crate) fn check_inputs(inputs: &[InputParameter]) -> Result<()> {
    if inputs.is_empty() {
        return Err(MarshalError::EmptyInputSet);
    }

    let mut seen = HashSet::with_capacity(inputs.len());
    for param in inputs {
        if !seen.insert(param.name()) {
            return Err(MarshalError::DuplicateName {
                name: param.name().to_string(),
                role: Role::Input,
            });
        }
    }
    Ok(())
}

fn build<F>(inputs: &[InputParameter], mut guess: F) -> Result<Packing>
where
    F: FnMut(&InputParameter) -> Vec<f64>,
{
    check_inputs(inputs)?;

    let n = dimension(inputs);
    let mut lower = Vec::with_capacity(n);
    let mut upper = Vec::with_capacity(n);
    let mut initial = Vec::with_capacity(n);
    let mut offsets = Vec::with_capacity(inputs.len());

    for param in inputs {
        offsets.push(lower.len());
        lower.extend(param.lower_bounds());
        upper.extend(param.upper_bounds());
        initial.extend(guess(param));
    }

    log::debug!(
        "Packed {} input parameters into {} degrees of freedom",
        inputs.len(),
        n
    );

    Ok(Packing {
        lower: Array1::from(lower),
        upper: Array1::from(upper),
        initial: Array1::from(initial),
        offsets,
    })
}

fn assign_offsets(inputs: &mut [InputParameter], packing: &Packing) {
    for (param, &offset) in inputs.iter_mut().zip(packing.offsets()) {
        param.set_vector_offset(offset);
    }
}
