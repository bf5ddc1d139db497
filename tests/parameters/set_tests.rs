//! Integration tests for the ParameterSet collection

use crate::test_helpers::{approx_eq, values};
use optmarshal_rs::parameters::{
    InputParameter, OutputParameter, ParamRange, ParameterDefinition, ParameterSet, Point3, Role,
    Value,
};
use optmarshal_rs::MarshalError;

fn truss() -> ParameterSet {
    let mut set = ParameterSet::new();
    set.add(InputParameter::real("chord_depth", 0.5, 3.0).unwrap()).unwrap();
    set.add(
        InputParameter::point("ridge", Point3::new(-5.0, 0.0, 8.0), Point3::new(5.0, 0.0, 12.0))
            .unwrap(),
    )
    .unwrap();
    set.add(InputParameter::integer("panels", 4, 16).unwrap()).unwrap();

    set.add(
        OutputParameter::real("mass")
            .with_scale_range(ParamRange::real(0.0, 20_000.0).unwrap())
            .unwrap(),
    )
    .unwrap();
    set.add(
        OutputParameter::real("utilization")
            .with_allowable_range(ParamRange::real(0.0, 1.0).unwrap())
            .unwrap(),
    )
    .unwrap();
    set
}

#[test]
fn test_set_layout() {
    let mut set = truss();
    assert_eq!(set.dimension(), 5);

    let packed = set.pack().unwrap();
    assert_eq!(packed.offsets(), &[0, 1, 4]);
    assert_eq!(packed.lower().to_vec(), vec![0.5, -5.0, 0.0, 8.0, 4.0]);
    assert_eq!(packed.upper().to_vec(), vec![3.0, 5.0, 0.0, 12.0, 16.0]);

    let definitions = set.definitions();
    assert_eq!(definitions.len(), 5);
    assert_eq!(definitions[3].role(), Role::Output);
    assert!(matches!(definitions[2], ParameterDefinition::Input(_)));
}

#[test]
fn test_assemble_over_outputs() {
    let set = truss();
    let raw = values(&[
        ("mass", Value::Real(2_000.0)),
        ("utilization", Value::Real(1.2)),
    ]);
    // mass: 10 on the canonical scale; utilization: 100 * 0.2 penalty
    let cost = set.assemble(&raw).unwrap();
    assert!(approx_eq(cost, 100.0 + 400.0, 1e-9));

    let partial = values(&[("mass", Value::Real(2_000.0))]);
    assert!(matches!(
        set.assemble(&partial),
        Err(MarshalError::MissingValue { name }) if name == "utilization"
    ));
}

#[test]
fn test_json_round_trip() {
    let mut set = truss();
    set.input_mut("panels")
        .unwrap()
        .set_start(Some(Value::Integer(8)))
        .unwrap();

    let json = set.to_json().unwrap();
    let back = ParameterSet::from_json(&json).unwrap();
    assert_eq!(back.len(), set.len());
    assert_eq!(
        back.input("panels").unwrap().start(),
        Some(&Value::Integer(8))
    );
    assert_eq!(
        back.output("mass").unwrap().scale_range(),
        set.output("mass").unwrap().scale_range()
    );
}

#[test]
fn test_duplicates_rejected_on_load() {
    let json = r#"{
        "outputs": [
            {"name": "mass", "kind": "Real"},
            {"name": "mass", "kind": "Real"}
        ]
    }"#;
    let err = ParameterSet::from_json(json).unwrap_err();
    assert!(err.to_string().contains("Duplicate output parameter name 'mass'"));
}
