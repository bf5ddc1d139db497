//! Integration tests for input parameters

use optmarshal_rs::parameters::{InputParameter, ParamRange, Point3, StartPosition, Value};
use optmarshal_rs::MarshalError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn test_point_initial_guess_is_centre() {
    let apex =
        InputParameter::point("apex", Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)).unwrap();
    assert!(apex.start().is_none());
    assert_eq!(apex.initial_guess(), vec![0.5, 0.5, 0.5]);
}

#[test]
fn test_input_lifecycle() {
    let mut depth = InputParameter::real("depth", 0.2, 1.2).unwrap();
    assert_eq!(depth.vector_offset(), None);

    depth.set_start(Some(Value::Real(0.8))).unwrap();
    assert_eq!(depth.initial_guess(), vec![0.8]);

    // Start must follow the kind of the parameter
    assert!(matches!(
        depth.set_start(Some(Value::Integer(1))),
        Err(MarshalError::TypeMismatch { .. })
    ));

    // Ranges are replaced whole and re-validated against the start
    assert!(depth.set_search_range(ParamRange::real(0.9, 2.0).unwrap()).is_err());
    depth.set_search_range(ParamRange::real(0.5, 2.0).unwrap()).unwrap();
    assert_eq!(depth.lower_bounds(), vec![0.5]);

    depth.set_min_str("0.1").unwrap();
    assert!(matches!(
        depth.set_min_str("zero"),
        Err(MarshalError::Parse { .. })
    ));
    assert_eq!(depth.lower_bounds(), vec![0.1]);
}

#[test]
fn test_start_strategies_are_reproducible() {
    let bays = InputParameter::integer("bays", 2, 12).unwrap();

    let mut a = ChaCha8Rng::seed_from_u64(99);
    let mut b = ChaCha8Rng::seed_from_u64(99);
    let first: Vec<_> = (0..10)
        .map(|_| bays.initial_guess_with(StartPosition::Random, 0.1, &mut a))
        .collect();
    let second: Vec<_> = (0..10)
        .map(|_| bays.initial_guess_with(StartPosition::Random, 0.1, &mut b))
        .collect();
    assert_eq!(first, second);

    for guess in first {
        assert!(guess[0] >= 2.0 && guess[0] <= 12.0);
    }
}

#[test]
fn test_degenerate_search_range_starts_at_its_only_value() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let fixed = InputParameter::real("fixed", 3.0, 3.0).unwrap();
    for strategy in [StartPosition::Random, StartPosition::PercentRandomFromCenter] {
        assert_eq!(fixed.initial_guess_with(strategy, 0.5, &mut rng), vec![3.0]);
    }
}
