//! Configuration options for building and evaluating an objective.
//!
//! This module defines how initial guesses are chosen, how the objective gradient
//! is approximated and what happens when the caller's evaluation fails.

use serde::{Deserialize, Serialize};

use crate::error::{MarshalError, Result};
use crate::parameters::input::StartPosition;

/// Reaction to a failed evaluation of the caller's callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvaluationFailure {
    /// Return the error to the solver
    #[default]
    Propagate,

    /// Report `f64::MAX` as the cost when the callback fails and keep going.
    /// Configuration errors and failures inside a gradient still propagate.
    MaxCost,
}

/// Configuration options of an [`Objective`](crate::objective::Objective).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarshalConfig {
    /// Strategy for initial guesses. Default: CenterOfRange
    pub start_position: StartPosition,

    /// Half-width of the random start shift, as a fraction of each range width.
    /// Must lie in (0.05, 1.0]. Default: 0.1
    pub start_percent: f64,

    /// Finite-difference step of the objective gradient. Default: 1e-3
    pub gradient_step: f64,

    /// What to do when the evaluation callback fails. Default: Propagate
    pub on_evaluation_error: EvaluationFailure,

    /// Keep every successful evaluation in the objective's history. Default: true
    pub record_history: bool,
}

impl Default for MarshalConfig {
    fn default() -> Self {
        Self {
            start_position: StartPosition::default(),
            start_percent: 0.1,
            gradient_step: 1e-3,
            on_evaluation_error: EvaluationFailure::default(),
            record_history: true,
        }
    }
}

impl MarshalConfig {
    pub fn with_start_position(mut self, start_position: StartPosition) -> Self {
        self.start_position = start_position;
        self
    }

    pub fn with_start_percent(mut self, start_percent: f64) -> Self {
        self.start_percent = start_percent;
        self
    }

    pub fn with_gradient_step(mut self, gradient_step: f64) -> Self {
        self.gradient_step = gradient_step;
        self
    }

    pub fn with_evaluation_failure(mut self, on_evaluation_error: EvaluationFailure) -> Self {
        self.on_evaluation_error = on_evaluation_error;
        self
    }

    pub fn with_record_history(mut self, record_history: bool) -> Self {
        self.record_history = record_history;
        self
    }

    /// Check that every option is inside its domain.
    pub fn validate(&self) -> Result<()> {
        if !(self.start_percent > 0.05 && self.start_percent <= 1.0) {
            return Err(MarshalError::InvalidSetting(format!(
                "start_percent must lie in (0.05, 1.0], got {}",
                self.start_percent
            )));
        }
        if !(self.gradient_step.is_finite() && self.gradient_step > 0.0) {
            return Err(MarshalError::InvalidSetting(format!(
                "gradient_step must be positive and finite, got {}",
                self.gradient_step
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MarshalConfig::default();
        assert_eq!(config.start_position, StartPosition::CenterOfRange);
        assert_eq!(config.start_percent, 0.1);
        assert_eq!(config.gradient_step, 1e-3);
        assert_eq!(config.on_evaluation_error, EvaluationFailure::Propagate);
        assert!(config.record_history);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_domain() {
        for percent in [0.05, 0.0, 1.5, f64::NAN] {
            let config = MarshalConfig::default().with_start_percent(percent);
            assert!(matches!(
                config.validate(),
                Err(MarshalError::InvalidSetting(_))
            ));
        }
        assert!(MarshalConfig::default().with_start_percent(1.0).validate().is_ok());
        assert!(MarshalConfig::default().with_gradient_step(0.0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MarshalConfig =
            serde_json::from_str(r#"{"start_position":"Random","on_evaluation_error":"MaxCost"}"#)
                .unwrap();
        assert_eq!(config.start_position, StartPosition::Random);
        assert_eq!(config.on_evaluation_error, EvaluationFailure::MaxCost);
        assert_eq!(config.start_percent, 0.1);
    }
}
