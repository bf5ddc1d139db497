//! Integration tests for ranges
//!
//! These tests verify construction, rescaling and distance of ranges.

use approx::assert_relative_eq;
use optmarshal_rs::parameters::{ParamRange, Point3, Point3Range, ValueKind, ValueRange};
use optmarshal_rs::MarshalError;

#[test]
fn test_scale_into_unit_range() {
    let range = ValueRange::new(0.0, 100.0).unwrap();
    let unit = ValueRange::new(0.0, 1.0).unwrap();
    assert_relative_eq!(range.scale(50.0, &unit).unwrap(), 0.5);
}

#[test]
fn test_inverted_bounds_are_rejected_for_every_kind() {
    assert!(matches!(
        ValueRange::new(5.0, 2.0),
        Err(MarshalError::InvalidRange { .. })
    ));
    assert!(matches!(
        ValueRange::new(5_i64, 2),
        Err(MarshalError::InvalidRange { .. })
    ));
    assert!(matches!(
        Point3Range::uniform(5.0, 2.0),
        Err(MarshalError::InvalidRange { .. })
    ));
    assert!(matches!(
        ParamRange::from_strs(ValueKind::Integer, "5", "2"),
        Err(MarshalError::InvalidRange { .. })
    ));
}

#[test]
fn test_degenerate_range() {
    let range = ValueRange::new(4.0, 4.0).unwrap();
    assert!(range.contains(4.0));
    assert!(matches!(
        range.scale(4.0, &ValueRange::new(0.0, 1.0).unwrap()),
        Err(MarshalError::DegenerateRange { .. })
    ));
}

#[test]
fn test_point_range_never_mixes_axes() {
    let range = Point3Range::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 1.0, 0.1)).unwrap();
    let to = Point3Range::uniform(0.0, 100.0).unwrap();

    let scaled = range.scale(&Point3::new(5.0, 0.5, 0.05), &to).unwrap();
    assert_relative_eq!(scaled.x, 50.0);
    assert_relative_eq!(scaled.y, 50.0);
    assert_relative_eq!(scaled.z, 50.0, epsilon = 1e-9);

    let distance = range.distance_outside(&Point3::new(11.0, 0.5, -0.4)).unwrap();
    assert_relative_eq!(distance.x, 1.0);
    assert_eq!(distance.y, 0.0);
    assert_relative_eq!(distance.z, 0.4);
}

#[test]
fn test_bounds_from_text() {
    let range = ValueRange::<f64>::from_strs(" -2.5 ", "1e2").unwrap();
    assert_eq!((range.min(), range.max()), (-2.5, 100.0));

    let err = ValueRange::<f64>::from_strs("low", "1").unwrap_err();
    match err {
        MarshalError::Parse { text, kind } => {
            assert_eq!(text, "low");
            assert_eq!(kind, ValueKind::Real);
        }
        _ => panic!("Expected Parse variant"),
    }
}
