//! Parameter sets
//!
//! A [`ParameterSet`] holds the ordered input and output parameters of one
//! optimization problem. Names are unique per role. The order of the inputs
//! determines the layout of the flat vector; the order of the outputs determines
//! the order of residuals.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::MarshalConfig;
use crate::error::{MarshalError, Result};
use crate::objective::{self, Evaluator, Objective};
use crate::packing::{self, BoundConstraint, Packing, ValueMap};
use crate::parameters::definition::{ParameterDefinition, Role};
use crate::parameters::input::InputParameter;
use crate::parameters::output::{Contribution, OutputParameter};

/// The input and output parameters of an optimization problem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "SetRepr")]
pub struct ParameterSet {
    inputs: Vec<InputParameter>,
    outputs: Vec<OutputParameter>,
}

#[derive(Deserialize)]
struct SetRepr {
    #[serde(default)]
    inputs: Vec<InputParameter>,
    #[serde(default)]
    outputs: Vec<OutputParameter>,
}

impl TryFrom<SetRepr> for ParameterSet {
    type Error = MarshalError;

    fn try_from(repr: SetRepr) -> Result<Self> {
        let mut set = ParameterSet::new();
        for input in repr.inputs {
            set.add_input(input)?;
        }
        for output in repr.outputs {
            set.add_output(output)?;
        }
        Ok(set)
    }
}

impl ParameterSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter of either role
    ///
    /// # Examples
    ///
    /// ```
    /// use optmarshal_rs::parameters::input::InputParameter;
    /// use optmarshal_rs::parameters::output::OutputParameter;
    /// use optmarshal_rs::parameters::set::ParameterSet;
    ///
    /// let mut set = ParameterSet::new();
    /// set.add(InputParameter::real("height", 0.0, 5.0).unwrap()).unwrap();
    /// // The same name is fine in the other role
    /// set.add(OutputParameter::real("height")).unwrap();
    /// // but not twice in one role
    /// assert!(set.add(OutputParameter::integer("height")).is_err());
    /// ```
    pub fn add(&mut self, param: impl Into<ParameterDefinition>) -> Result<()> {
        match param.into() {
            ParameterDefinition::Input(p) => self.add_input(p),
            ParameterDefinition::Output(p) => self.add_output(p),
        }
    }

    /// Append an input parameter; fails with `DuplicateName` on a repeated name.
    pub fn add_input(&mut self, param: InputParameter) -> Result<()> {
        if self.input(param.name()).is_some() {
            return Err(MarshalError::DuplicateName {
                name: param.name().to_string(),
                role: Role::Input,
            });
        }
        self.inputs.push(param);
        Ok(())
    }

    /// Append an output parameter; fails with `DuplicateName` on a repeated name.
    pub fn add_output(&mut self, param: OutputParameter) -> Result<()> {
        if self.output(param.name()).is_some() {
            return Err(MarshalError::DuplicateName {
                name: param.name().to_string(),
                role: Role::Output,
            });
        }
        self.outputs.push(param);
        Ok(())
    }

    pub fn with_input(mut self, param: InputParameter) -> Result<Self> {
        self.add_input(param)?;
        Ok(self)
    }

    pub fn with_output(mut self, param: OutputParameter) -> Result<Self> {
        self.add_output(param)?;
        Ok(self)
    }

    pub fn inputs(&self) -> &[InputParameter] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputParameter] {
        &self.outputs
    }

    pub fn input(&self, name: &str) -> Option<&InputParameter> {
        self.inputs.iter().find(|p| p.name() == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputParameter> {
        self.outputs.iter().find(|p| p.name() == name)
    }

    /// Mutable access for the validating setters of an input.
    pub fn input_mut(&mut self, name: &str) -> Option<&mut InputParameter> {
        self.inputs.iter_mut().find(|p| p.name() == name)
    }

    /// Mutable access for the validating setters of an output.
    pub fn output_mut(&mut self, name: &str) -> Option<&mut OutputParameter> {
        self.outputs.iter_mut().find(|p| p.name() == name)
    }

    /// All parameters, inputs first.
    pub fn definitions(&self) -> Vec<ParameterDefinition> {
        self.inputs
            .iter()
            .cloned()
            .map(ParameterDefinition::from)
            .chain(self.outputs.iter().cloned().map(ParameterDefinition::from))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    /// Length of the flat vector.
    pub fn dimension(&self) -> usize {
        packing::dimension(&self.inputs)
    }

    /// Pack the inputs and record their vector offsets.
    pub fn pack(&mut self) -> Result<Packing> {
        packing::pack(&mut self.inputs)
    }

    /// Pack the inputs with the start strategy of `config`.
    pub fn pack_with<R: Rng + ?Sized>(
        &mut self,
        config: &MarshalConfig,
        rng: &mut R,
    ) -> Result<Packing> {
        config.validate()?;
        packing::pack_with(
            &mut self.inputs,
            config.start_position,
            config.start_percent,
            rng,
        )
    }

    pub fn unpack(&self, flat: &[f64]) -> Result<ValueMap> {
        packing::unpack(flat, &self.inputs)
    }

    pub fn flatten(&self, values: &ValueMap) -> Result<ndarray::Array1<f64>> {
        packing::flatten(values, &self.inputs)
    }

    pub fn bound_constraints(&self) -> Result<Vec<BoundConstraint>> {
        packing::bound_constraints(&self.inputs)
    }

    pub fn contributions(&self, raw: &ValueMap) -> Result<Vec<Contribution>> {
        objective::contributions(&self.outputs, raw)
    }

    pub fn residuals(&self, raw: &ValueMap) -> Result<ndarray::Array1<f64>> {
        objective::residuals(&self.outputs, raw)
    }

    /// Sum of squared output contributions for the given raw output values.
    pub fn assemble(&self, raw: &ValueMap) -> Result<f64> {
        objective::assemble(&self.outputs, raw)
    }

    /// Build a solver-facing objective around an evaluator.
    pub fn objective<E: Evaluator>(&self, evaluator: E) -> Result<Objective<'_, E>> {
        Objective::new(self, evaluator)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON, re-validating ranges, kinds, targets and names.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::point::Point3;
    use crate::parameters::value::{ParamRange, Value};

    fn frame() -> ParameterSet {
        ParameterSet::new()
            .with_input(InputParameter::real("width", 0.0, 10.0).unwrap())
            .unwrap()
            .with_input(
                InputParameter::point("apex", Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
                    .unwrap(),
            )
            .unwrap()
            .with_output(
                OutputParameter::real("stress")
                    .with_allowable_range(ParamRange::real(0.0, 250.0).unwrap())
                    .unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_duplicate_names_per_role() {
        let mut set = frame();
        assert!(matches!(
            set.add_input(InputParameter::integer("width", 0, 3).unwrap()),
            Err(MarshalError::DuplicateName { role: Role::Input, .. })
        ));
        set.add_output(OutputParameter::real("width")).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.definitions().len(), 4);
    }

    #[test]
    fn test_pack_and_unpack_through_set() {
        let mut set = frame();
        let packed = set.pack().unwrap();
        assert_eq!(packed.dimension(), 4);
        assert_eq!(set.input("apex").unwrap().vector_offset(), Some(1));

        let values = set.unpack(&[1.0, 0.1, 0.2, 0.3]).unwrap();
        assert_eq!(values["width"], Value::Real(1.0));
        assert_eq!(set.flatten(&values).unwrap().to_vec(), vec![1.0, 0.1, 0.2, 0.3]);
        assert_eq!(set.bound_constraints().unwrap().len(), 8);
    }

    #[test]
    fn test_setters_through_set() {
        let mut set = frame();
        set.input_mut("width").unwrap().set_max_str("20").unwrap();
        assert_eq!(set.input("width").unwrap().upper_bounds(), vec![20.0]);

        set.output_mut("stress").unwrap().set_target(Some(Value::Real(100.0))).unwrap();
        let mut raw = ValueMap::new();
        raw.insert("stress".to_string(), Value::Real(110.0));
        assert_eq!(set.assemble(&raw).unwrap(), 100.0);
    }

    #[test]
    fn test_json_round_trip_validates() {
        let set = frame();
        let json = set.to_json().unwrap();
        let back = ParameterSet::from_json(&json).unwrap();
        assert_eq!(back.inputs(), set.inputs());
        assert_eq!(back.outputs(), set.outputs());

        let duplicated = r#"{
            "inputs": [
                {"name": "a", "search_range": {"Real": {"min": 0.0, "max": 1.0}}},
                {"name": "a", "search_range": {"Real": {"min": 0.0, "max": 2.0}}}
            ]
        }"#;
        assert!(ParameterSet::from_json(duplicated).is_err());

        let inverted = r#"{"inputs": [{"name": "a", "search_range": {"Real": {"min": 3.0, "max": 1.0}}}]}"#;
        assert!(matches!(
            ParameterSet::from_json(inverted),
            Err(MarshalError::Json(_))
        ));
    }
}
