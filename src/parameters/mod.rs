//! # Parameter System
//!
//! This module provides the typed parameter definitions of an optimization problem.
//! Design variables (inputs) and computed quantities (outputs) are declared with
//! physically meaningful kinds: real scalars, integer scalars and 3D points.
//!
//! ## Key Features
//!
//! - **Typed Ranges**: Closed ranges over integers, reals and per-axis point boxes
//! - **Input Parameters**: Search ranges, optional start values and start strategies
//! - **Output Parameters**: Targets, scale ranges into a canonical objective scale,
//!   and allowable ranges whose violation is penalized
//! - **Text Input**: Bounds, starts and targets can be set from text
//! - **Serialization Support**: Save and load parameter sets with serde
//!
//! ## Core Components
//!
//! - [`ValueRange`] and [`Point3Range`]: Closed ranges with containment, rescaling and distance
//! - [`Value`] and [`ParamRange`]: Kind-tagged values and ranges
//! - [`InputParameter`] and [`OutputParameter`]: The two roles of a parameter
//! - [`ParameterDefinition`]: Either role, for describing a problem as one list
//! - [`ParameterSet`]: The ordered inputs and outputs of one problem
//!
//! ## Example Usage
//!
//! ```rust
//! use optmarshal_rs::packing::ValueMap;
//! use optmarshal_rs::parameters::{InputParameter, OutputParameter, ParamRange, ParameterSet, Value};
//!
//! let mut set = ParameterSet::new();
//! set.add(InputParameter::real("depth", 0.0, 2.0).unwrap()).unwrap();
//! set.add(
//!     OutputParameter::real("deflection")
//!         .with_target(0.01)
//!         .unwrap()
//!         .with_allowable_range(ParamRange::real(0.0, 0.05).unwrap())
//!         .unwrap(),
//! )
//! .unwrap();
//!
//! let packed = set.pack().unwrap();
//! assert_eq!(packed.initial().to_vec(), vec![1.0]);
//!
//! let mut raw = ValueMap::new();
//! raw.insert("deflection".to_string(), Value::Real(0.03));
//! assert!((set.assemble(&raw).unwrap() - 0.0004).abs() < 1e-12);
//! ```

pub mod definition;
pub mod input;
pub mod output;
pub mod parse;
pub mod point;
pub mod range;
pub mod set;
pub mod value;


pub use definition::{ParameterDefinition, Role};
pub use input::{InputParameter, StartPosition};
pub use output::{Contribution, OutputParameter, DEFAULT_PENALTY_WEIGHT};
pub use point::{Axis, Point3, Point3Range};
pub use range::{RangeScalar, ValueRange, CANONICAL_RANGE};
pub use set::ParameterSet;
pub use value::{ParamRange, Value, ValueKind};
