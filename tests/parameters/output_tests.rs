//! Integration tests for output parameters
//!
//! These tests cover the residual and penalty branches of output contributions.

use approx::assert_relative_eq;
use optmarshal_rs::parameters::{OutputParameter, ParamRange, Point3, Point3Range, Value, ValueKind};
use optmarshal_rs::MarshalError;

#[test]
fn test_target_residual() {
    let span = OutputParameter::real("span").with_target(5.0).unwrap();
    let c = span.contribution(&Value::Real(7.0)).unwrap();
    assert_relative_eq!(c.as_scalar().unwrap(), 2.0);
}

#[test]
fn test_allowable_penalty() {
    let span = OutputParameter::real("span")
        .with_allowable_range(ParamRange::real(0.0, 10.0).unwrap())
        .unwrap();
    assert_eq!(span.penalty_weight(), 100.0);
    let c = span.contribution(&Value::Real(15.0)).unwrap();
    assert!(c.is_penalty());
    assert_relative_eq!(c.as_scalar().unwrap(), 500.0);
}

#[test]
fn test_scale_range_equalizes_units() {
    // A length in millimetres and an angle in radians, both 10% off their targets
    let length = OutputParameter::real("length")
        .with_scale_range(ParamRange::real(0.0, 5000.0).unwrap())
        .unwrap()
        .with_target(2500.0)
        .unwrap();
    let angle = OutputParameter::real("angle")
        .with_scale_range(ParamRange::real(0.0, std::f64::consts::PI).unwrap())
        .unwrap()
        .with_target(std::f64::consts::FRAC_PI_2)
        .unwrap();

    let dl = length.contribution_of(3000.0).unwrap();
    let da = angle
        .contribution_of(std::f64::consts::FRAC_PI_2 + 0.1 * std::f64::consts::PI)
        .unwrap();
    assert_relative_eq!(dl, 10.0, epsilon = 1e-9);
    assert_relative_eq!(da, 10.0, epsilon = 1e-9);
}

#[test]
fn test_point_output_with_scale_and_allowable() {
    let apex = OutputParameter::with_options(
        "apex",
        ValueKind::Point,
        Some(Value::Point(Point3::new(1.0, 1.0, 1.0))),
        Some(ParamRange::Point(Point3Range::uniform(0.0, 2.0).unwrap())),
        Some(ParamRange::Point(Point3Range::uniform(0.0, 1.5).unwrap())),
        2.0,
    )
    .unwrap();

    let inside = apex
        .contribution(&Value::Point(Point3::new(1.5, 1.0, 0.5)))
        .unwrap();
    assert_eq!(inside.components(), &[25.0, 0.0, -25.0]);

    // One axis out: distance is rescaled and weighted on every axis
    let outside = apex
        .contribution(&Value::Point(Point3::new(1.0, 1.75, 1.0)))
        .unwrap();
    assert!(outside.is_penalty());
    assert_eq!(outside.components(), &[0.0, 25.0, 0.0]);
}

#[test]
fn test_target_outside_allowable_is_rejected() {
    let result = OutputParameter::with_options(
        "span",
        ValueKind::Real,
        Some(Value::Real(20.0)),
        None,
        Some(ParamRange::real(0.0, 10.0).unwrap()),
        100.0,
    );
    match result {
        Err(MarshalError::OutOfRange { name, value, range }) => {
            assert_eq!(name, "span");
            assert_eq!(value, "20");
            assert_eq!(range, "[0, 10]");
        }
        _ => panic!("Expected OutOfRange variant"),
    }
}
