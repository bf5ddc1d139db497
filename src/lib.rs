//! # optmarshal-rs
//!
//! `optmarshal-rs` marshals typed, physically meaningful optimization variables to
//! and from the flat numeric vector a generic bound-constrained solver works on.
//!
//! The library provides:
//! - Typed input and output parameters over real, integer and 3D point values
//! - Packing of inputs into flat bound, initial-guess and constraint vectors
//! - Scaling of unrelated physical quantities into a common objective range
//! - Penalized, summed-square objectives built from a caller's evaluation function
//!
//! The optimization algorithm itself is not part of this crate; solvers plug in
//! through the [`Minimizer`] trait or the [`Problem`] residual view.
//!
//! ## Basic Usage
//!
//! ```
//! use optmarshal_rs::packing::ValueMap;
//! use optmarshal_rs::parameters::{InputParameter, OutputParameter, ParameterSet, Value};
//! use optmarshal_rs::Result;
//! use ndarray::Array1;
//!
//! let mut set = ParameterSet::new();
//! set.add(InputParameter::real("length", 0.0, 10.0).unwrap()).unwrap();
//! set.add(OutputParameter::real("area").with_target(12.0).unwrap()).unwrap();
//!
//! let objective = set
//!     .objective(|inputs: &ValueMap| -> Result<ValueMap> {
//!         let length = inputs["length"].as_real().unwrap_or_default();
//!         let mut outputs = ValueMap::new();
//!         outputs.insert("area".to_string(), Value::Real(2.0 * length));
//!         Ok(outputs)
//!     })
//!     .unwrap();
//!
//! // Length 5 gives area 10, two below the target
//! assert_eq!(objective.cost(&Array1::from(vec![5.0])).unwrap(), 4.0);
//! ```

// Public modules
pub mod config;
pub mod error;
pub mod objective;
pub mod packing;
pub mod parameters;
pub mod problem;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::{EvaluationFailure, MarshalConfig};
pub use error::{MarshalError, Result};
pub use objective::{assemble, residuals, Evaluation, EvaluationKind, Evaluator, Objective};
pub use packing::{pack, unpack, Constraint, GeneralConstraint, Packing, ValueMap};
pub use parameters::{
    InputParameter, OutputParameter, ParamRange, ParameterDefinition, ParameterSet, Point3,
    Point3Range, Value, ValueKind, ValueRange,
};
pub use problem::Problem;
pub use solver::{Minimizer, ObjectiveFunction, SolverProblem};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
