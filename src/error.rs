use thiserror::Error;

use crate::parameters::definition::Role;
use crate::parameters::value::ValueKind;

/// Error types for the optmarshal-rs library.
///
/// Every variant describes a configuration or usage mistake detected at the
/// operation that broke an invariant. Nothing is retried or auto-corrected;
/// the setup code is expected to fix its parameter definitions.
#[derive(Error, Debug)]
pub enum MarshalError {
    /// A range was built with `min > max` (or with a NaN bound).
    #[error("Invalid range: min ({min}) must not be greater than max ({max})")]
    InvalidRange { min: f64, max: f64 },

    /// A zero-width range was used as the source of a rescale or distance.
    #[error("Degenerate range [{min}, {max}]: zero width cannot be used as a scale source")]
    DegenerateRange { min: f64, max: f64 },

    /// A start or target value lies outside its declared range.
    #[error("Value {value} of parameter '{name}' is outside the range {range}")]
    OutOfRange {
        name: String,
        value: String,
        range: String,
    },

    /// A value or range of the wrong kind was given to a parameter.
    #[error("Parameter '{name}' expects a {expected} value, got a {found} value")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// Packing was requested for a set without any input parameter.
    #[error("At least one input parameter is required to build the optimization vector")]
    EmptyInputSet,

    /// The flat vector length differs from the total input dimensionality.
    #[error("Flat vector has {actual} entries, but the input parameters span {expected}")]
    VectorLengthMismatch { expected: usize, actual: usize },

    /// A declared parameter has no entry in a value mapping.
    #[error("No value was supplied for parameter '{name}'")]
    MissingValue { name: String },

    /// Two parameters of the same role share a name.
    #[error("Duplicate {role} parameter name '{name}'")]
    DuplicateName { name: String, role: Role },

    /// Textual input could not be parsed into a value of the expected kind.
    #[error("Could not parse '{text}' as a {kind} value")]
    Parse { text: String, kind: ValueKind },

    /// Only one bound of a min/max text pair was supplied.
    #[error("Parameter '{name}' needs both {which} bounds, or neither")]
    IncompleteRange { name: String, which: String },

    /// A configuration value is outside its permitted domain.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// The caller-supplied evaluation callback failed.
    #[error("Function evaluation error: {0}")]
    Evaluation(String),

    /// Evaluation was requested after cancellation.
    #[error("Evaluation cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MarshalError {
    /// Fill in the parameter name of errors raised by name-agnostic range helpers.
    pub(crate) fn named(self, parameter: &str) -> Self {
        match self {
            Self::TypeMismatch {
                name,
                expected,
                found,
            } if name.is_empty() => Self::TypeMismatch {
                name: parameter.to_string(),
                expected,
                found,
            },
            Self::OutOfRange { name, value, range } if name.is_empty() => Self::OutOfRange {
                name: parameter.to_string(),
                value,
                range,
            },
            other => other,
        }
    }
}

/// Result type alias for optmarshal-rs operations.
pub type Result<T> = std::result::Result<T, MarshalError>;
