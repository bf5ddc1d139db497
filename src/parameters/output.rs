//! Output parameter definitions and their objective contributions
//!
//! An [`OutputParameter`] describes a computed quantity the objective is built from.
//! It may carry a target value, a scale range that maps raw values into the
//! canonical objective scale, and an allowable range whose violation is penalized.
//!
//! The contribution of a raw value `v` follows two branches:
//!
//! 1. `v` outside the allowable range: the distance to that range, rescaled through
//!    the scale range when one is set, times the penalty weight. The target is not
//!    used in this branch.
//! 2. Otherwise: the (scaled) value minus the (scaled) target, or minus zero when no
//!    target is set.
//!
//! Contributions are signed residuals; squaring and summing happens in
//! [`crate::objective`].

use serde::{Deserialize, Serialize};

use crate::error::{MarshalError, Result};
use crate::parameters::parse;
use crate::parameters::value::{ParamRange, Value, ValueKind};

/// Default multiplier of allowable-range violations.
pub const DEFAULT_PENALTY_WEIGHT: f64 = 100.0;

/// A computed quantity that contributes to the objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "OutputRepr")]
pub struct OutputParameter {
    name: String,
    kind: ValueKind,
    target: Option<Value>,
    scale_range: Option<ParamRange>,
    allowable_range: Option<ParamRange>,
    penalty_weight: f64,
}

#[derive(Deserialize)]
struct OutputRepr {
    name: String,
    kind: ValueKind,
    #[serde(default)]
    target: Option<Value>,
    #[serde(default)]
    scale_range: Option<ParamRange>,
    #[serde(default)]
    allowable_range: Option<ParamRange>,
    #[serde(default = "default_penalty_weight")]
    penalty_weight: f64,
}

fn default_penalty_weight() -> f64 {
    DEFAULT_PENALTY_WEIGHT
}

impl TryFrom<OutputRepr> for OutputParameter {
    type Error = MarshalError;

    fn try_from(repr: OutputRepr) -> Result<Self> {
        OutputParameter::with_options(
            &repr.name,
            repr.kind,
            repr.target,
            repr.scale_range,
            repr.allowable_range,
            repr.penalty_weight,
        )
    }
}

/// The objective contribution of one output value.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    components: Vec<f64>,
    penalty: bool,
}

impl Contribution {
    /// Signed contribution per component (1 for scalars, 3 for points).
    pub fn components(&self) -> &[f64] {
        &self.components
    }

    /// Whether the allowable range was violated.
    pub fn is_penalty(&self) -> bool {
        self.penalty
    }

    /// Sum of squared components.
    pub fn squared_norm(&self) -> f64 {
        self.components.iter().map(|c| c * c).sum()
    }

    /// The single component of a scalar contribution.
    pub fn as_scalar(&self) -> Option<f64> {
        match self.components.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }

    pub fn into_components(self) -> Vec<f64> {
        self.components
    }
}

impl OutputParameter {
    /// Create an output parameter of the given kind without target or ranges.
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            target: None,
            scale_range: None,
            allowable_range: None,
            penalty_weight: DEFAULT_PENALTY_WEIGHT,
        }
    }

    pub fn real(name: &str) -> Self {
        Self::new(name, ValueKind::Real)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ValueKind::Integer)
    }

    pub fn point(name: &str) -> Self {
        Self::new(name, ValueKind::Point)
    }

    /// Create a fully specified output parameter
    ///
    /// # Arguments
    ///
    /// * `name` - Identity of the parameter within the output set
    /// * `kind` - Kind of the raw values this parameter receives
    /// * `target` - Optional target value
    /// * `scale_range` - Optional range mapped onto the canonical objective scale
    /// * `allowable_range` - Optional range outside of which values are penalized
    /// * `penalty_weight` - Multiplier of allowable-range violations
    ///
    /// # Returns
    ///
    /// The parameter, or an error if a value or range has the wrong kind, the
    /// target lies outside the allowable range, or the weight is negative or not
    /// finite.
    pub fn with_options(
        name: &str,
        kind: ValueKind,
        target: Option<Value>,
        scale_range: Option<ParamRange>,
        allowable_range: Option<ParamRange>,
        penalty_weight: f64,
    ) -> Result<Self> {
        let mut param = Self::new(name, kind);
        param.set_penalty_weight(penalty_weight)?;
        param.set_scale_range(scale_range)?;
        param.set_allowable_range(allowable_range)?;
        param.set_target(target)?;
        Ok(param)
    }

    pub fn with_target(mut self, target: impl Into<Value>) -> Result<Self> {
        self.set_target(Some(target.into()))?;
        Ok(self)
    }

    pub fn with_scale_range(mut self, range: ParamRange) -> Result<Self> {
        self.set_scale_range(Some(range))?;
        Ok(self)
    }

    pub fn with_allowable_range(mut self, range: ParamRange) -> Result<Self> {
        self.set_allowable_range(Some(range))?;
        Ok(self)
    }

    pub fn with_penalty_weight(mut self, weight: f64) -> Result<Self> {
        self.set_penalty_weight(weight)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn dimensionality(&self) -> usize {
        self.kind.dimensionality()
    }

    pub fn target(&self) -> Option<&Value> {
        self.target.as_ref()
    }

    pub fn scale_range(&self) -> Option<&ParamRange> {
        self.scale_range.as_ref()
    }

    pub fn allowable_range(&self) -> Option<&ParamRange> {
        self.allowable_range.as_ref()
    }

    pub fn penalty_weight(&self) -> f64 {
        self.penalty_weight
    }

    /// Set or clear the target; it must lie inside the allowable range if one is set.
    pub fn set_target(&mut self, target: Option<Value>) -> Result<()> {
        if let Some(value) = &target {
            self.check_kind(value.kind())?;
        }
        self.check_target(target.as_ref(), self.allowable_range.as_ref())?;
        self.target = target;
        Ok(())
    }

    pub fn set_scale_range(&mut self, range: Option<ParamRange>) -> Result<()> {
        if let Some(range) = &range {
            self.check_kind(range.kind())?;
        }
        self.scale_range = range;
        Ok(())
    }

    /// Set or clear the allowable range; a target already set must lie inside it.
    pub fn set_allowable_range(&mut self, range: Option<ParamRange>) -> Result<()> {
        if let Some(range) = &range {
            self.check_kind(range.kind())?;
        }
        self.check_target(self.target.as_ref(), range.as_ref())?;
        self.allowable_range = range;
        Ok(())
    }

    pub fn set_penalty_weight(&mut self, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(MarshalError::InvalidSetting(format!(
                "penalty weight of '{}' must be finite and non-negative, got {}",
                self.name, weight
            )));
        }
        self.penalty_weight = weight;
        Ok(())
    }

    /// Update target, scale range and allowable range from text input
    ///
    /// A blank target clears it, and a pair of blank bounds clears that range.
    /// Supplying only one bound of a pair fails with `IncompleteRange`. Nothing is
    /// changed unless every field parses and validates.
    ///
    /// # Examples
    ///
    /// ```
    /// use optmarshal_rs::parameters::output::OutputParameter;
    ///
    /// let mut span = OutputParameter::real("span");
    /// span.update_from_strings("12", "0", "50", "10", "15").unwrap();
    /// assert_eq!(span.contribution_of(13.0).unwrap(), 2.0);
    ///
    /// assert!(span.update_from_strings("12", "0", "", "", "").is_err());
    /// ```
    pub fn update_from_strings(
        &mut self,
        target: &str,
        min_scale: &str,
        max_scale: &str,
        min_allowable: &str,
        max_allowable: &str,
    ) -> Result<()> {
        let target = parse::parse_optional(self.kind, target)?;
        let scale_range = self.range_from_strs("scale", min_scale, max_scale)?;
        let allowable_range = self.range_from_strs("allowable", min_allowable, max_allowable)?;
        self.check_target(target.as_ref(), allowable_range.as_ref())?;

        self.target = target;
        self.scale_range = scale_range;
        self.allowable_range = allowable_range;
        Ok(())
    }

    /// Compute the objective contribution of a raw value
    ///
    /// # Errors
    ///
    /// * `TypeMismatch` if the value is not of the parameter's kind
    /// * `DegenerateRange` if a zero-width scale range has to rescale a value, or a
    ///   zero-width allowable range is violated
    ///
    /// # Examples
    ///
    /// ```
    /// use optmarshal_rs::parameters::output::OutputParameter;
    /// use optmarshal_rs::parameters::value::{ParamRange, Value};
    ///
    /// let stress = OutputParameter::real("stress")
    ///     .with_allowable_range(ParamRange::real(0.0, 10.0).unwrap())
    ///     .unwrap();
    /// let c = stress.contribution(&Value::Real(15.0)).unwrap();
    /// assert!(c.is_penalty());
    /// assert_eq!(c.as_scalar(), Some(500.0));
    /// ```
    pub fn contribution(&self, value: &Value) -> Result<Contribution> {
        self.check_kind(value.kind())?;

        if let Some(allowable) = &self.allowable_range {
            if !allowable.contains(value).map_err(|e| e.named(&self.name))? {
                let distance = allowable
                    .distance_outside(value)
                    .map_err(|e| e.named(&self.name))?;
                let distance = match &self.scale_range {
                    Some(scale) => scale.scale_components(&distance)?,
                    None => distance,
                };
                return Ok(Contribution {
                    components: distance
                        .into_iter()
                        .map(|d| self.penalty_weight * d)
                        .collect(),
                    penalty: true,
                });
            }
        }

        let calc = self.scaled(value)?;
        let target = match &self.target {
            Some(target) => self.scaled(target)?,
            None => vec![0.0; self.dimensionality()],
        };

        Ok(Contribution {
            components: calc.iter().zip(&target).map(|(c, t)| c - t).collect(),
            penalty: false,
        })
    }

    /// Scalar shortcut of [`contribution`](Self::contribution) for real outputs.
    pub fn contribution_of(&self, value: f64) -> Result<f64> {
        let contribution = self.contribution(&Value::Real(value))?;
        Ok(contribution.components[0])
    }

    fn scaled(&self, value: &Value) -> Result<Vec<f64>> {
        match &self.scale_range {
            Some(scale) => scale.scale_to_canonical(value),
            None => Ok(value.components()),
        }
    }

    fn range_from_strs(&self, which: &str, min: &str, max: &str) -> Result<Option<ParamRange>> {
        match (min.trim().is_empty(), max.trim().is_empty()) {
            (true, true) => Ok(None),
            (false, false) => Ok(Some(ParamRange::from_strs(self.kind, min, max)?)),
            _ => Err(MarshalError::IncompleteRange {
                name: self.name.clone(),
                which: which.to_string(),
            }),
        }
    }

    fn check_kind(&self, found: ValueKind) -> Result<()> {
        if found != self.kind {
            return Err(MarshalError::TypeMismatch {
                name: self.name.clone(),
                expected: self.kind,
                found,
            });
        }
        Ok(())
    }

    fn check_target(&self, target: Option<&Value>, allowable: Option<&ParamRange>) -> Result<()> {
        if let Some(target) = target {
            if !target.is_finite() {
                return Err(MarshalError::InvalidSetting(format!(
                    "target of '{}' must be finite, got {}",
                    self.name, target
                )));
            }
        }
        if let (Some(target), Some(allowable)) = (target, allowable) {
            if !allowable.contains(target).map_err(|e| e.named(&self.name))? {
                return Err(MarshalError::OutOfRange {
                    name: self.name.clone(),
                    value: target.to_string(),
                    range: allowable.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl PartialEq for OutputParameter {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl Eq for OutputParameter {}

impl std::hash::Hash for OutputParameter {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.name.hash(state);
    }
}
