//! The closed union of parameter definitions
//!
//! Every parameter is either an input or an output, and of one of the three value
//! kinds. [`ParameterDefinition`] joins both roles so a parameter set can be
//! described as a single list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parameters::input::InputParameter;
use crate::parameters::output::OutputParameter;
use crate::parameters::value::ValueKind;

/// Role of a parameter in the optimization problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Input,
    Output,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Input => f.write_str("input"),
            Role::Output => f.write_str("output"),
        }
    }
}

/// An input or output parameter.
///
/// Two definitions are equal when role, kind and name agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterDefinition {
    Input(InputParameter),
    Output(OutputParameter),
}

impl ParameterDefinition {
    pub fn name(&self) -> &str {
        match self {
            ParameterDefinition::Input(p) => p.name(),
            ParameterDefinition::Output(p) => p.name(),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ParameterDefinition::Input(p) => p.kind(),
            ParameterDefinition::Output(p) => p.kind(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            ParameterDefinition::Input(_) => Role::Input,
            ParameterDefinition::Output(_) => Role::Output,
        }
    }

    pub fn dimensionality(&self) -> usize {
        self.kind().dimensionality()
    }

    pub fn as_input(&self) -> Option<&InputParameter> {
        match self {
            ParameterDefinition::Input(p) => Some(p),
            ParameterDefinition::Output(_) => None,
        }
    }

    pub fn as_output(&self) -> Option<&OutputParameter> {
        match self {
            ParameterDefinition::Output(p) => Some(p),
            ParameterDefinition::Input(_) => None,
        }
    }
}

impl From<InputParameter> for ParameterDefinition {
    fn from(param: InputParameter) -> Self {
        ParameterDefinition::Input(param)
    }
}

impl From<OutputParameter> for ParameterDefinition {
    fn from(param: OutputParameter) -> Self {
        ParameterDefinition::Output(param)
    }
}
