//! Tests for the measurement records.

use super::*;

#[test]
fn test_name_symbol_classification() {
    assert_eq!(Name::parse("l").symbol(), Some("l"));
    assert_eq!(Name::parse("T_1").symbol(), Some("T_1"));
    assert_eq!(Name::parse("θ").symbol(), Some("θ"));
    assert_eq!(Name::parse("E").symbol(), Some("E"));
    assert_eq!(Name::parse("pi").symbol(), Some("pi"));
    assert_eq!(Name::parse("a + b").symbol(), None);
    assert_eq!(Name::parse("2").symbol(), None);
    assert_eq!(Name::parse("").symbol(), None);
}

#[test]
fn test_formula_empty_vs_unparsable() {
    let empty = Formula::parse("  ");
    assert!(empty.is_empty());
    assert!(empty.tree().is_none());
    assert!(empty.parse_error().is_none());

    let broken = Formula::parse("a + * b");
    assert!(!broken.is_empty());
    assert!(broken.tree().is_none());
    assert!(broken.parse_error().is_some());

    let good = Formula::parse("4 pi^2 l / T^2");
    assert!(good.tree().is_some());
}

#[test]
fn test_commit_values_skips_invalid_inputs() {
    let mut m = DirectMeasurement::new("t", "s");
    m.commit_values(&["1.20", "", "abc", " 1.30 ", "1.25"], None);

    assert_eq!(m.values, vec![1.20, 1.30, 1.25]);
    assert_eq!(m.inputs(), &["1.20", "1.30", "1.25"]);
    assert_eq!(m.min_digits, 3);
    assert!((m.mean_value().unwrap() - 1.25).abs() < 1e-12);
}

#[test]
fn test_commit_values_applies_zero_offset_to_lengths() {
    let mut length = DirectMeasurement::new("l", "cm");
    assert!(length.supports_zero_correction());
    length.commit_values(&["10.5", "10.7"], Some(0.2));
    assert!((length.values[0] - 10.3).abs() < 1e-12);
    assert!((length.values[1] - 10.5).abs() < 1e-12);

    let mut time = DirectMeasurement::new("t", "s");
    assert!(!time.supports_zero_correction());
    time.commit_values(&["2.0"], Some(0.2));
    assert_eq!(time.values, vec![2.0]);

    // Changing the unit re-derives values from the raw inputs
    length.set_unit("s");
    assert_eq!(length.values, vec![10.5, 10.7]);
}

#[test]
fn test_remove_value() {
    let mut m = DirectMeasurement::new("x", "").with_values(&["1.000", "2"]);
    assert_eq!(m.min_digits, 1);
    m.remove_value(1).unwrap();
    assert_eq!(m.values, vec![1.0]);
    assert_eq!(m.min_digits, 4);
    assert_eq!(m.remove_value(5), Err(MeasurementError::ValueIndex(5)));
}

#[test]
fn test_type_a_variance() {
    let single = DirectMeasurement::new("x", "").with_values(&["4.2"]);
    assert_eq!(single.type_a_variance(), Some(0.0));

    let empty = DirectMeasurement::new("x", "");
    assert_eq!(empty.type_a_variance(), None);
    assert_eq!(empty.mean_value(), None);

    // Sample variance 1, n = 3
    let m = DirectMeasurement::new("x", "").with_values(&["1", "2", "3"]);
    assert!((m.type_a_variance().unwrap() - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_uncertainty_b_parse_rules() {
    let plain = UncertaintyB::new("0.3", Distribution::Normal);
    assert_eq!(plain.parse_value("cm"), Some(0.3));

    let with_unit = UncertaintyB::new("2 mm", Distribution::Normal);
    assert!((with_unit.parse_value("cm").unwrap() - 0.2).abs() < 1e-12);
    // No measurement unit to convert into
    assert_eq!(with_unit.parse_value(""), None);
    // Incompatible
    assert_eq!(with_unit.parse_value("s"), None);

    assert_eq!(UncertaintyB::new("", Distribution::Normal).parse_value("cm"), None);
    assert_eq!(UncertaintyB::new("0", Distribution::Normal).parse_value("cm"), None);
    assert_eq!(UncertaintyB::new("zz", Distribution::Normal).parse_value("cm"), None);

    assert!(UncertaintyB::default().is_valid("cm"));
    assert!(!UncertaintyB::new("zz", Distribution::Normal).is_valid("cm"));
}

#[test]
fn test_type_b_variance_uses_coefficients() {
    let mut m = DirectMeasurement::new("l", "cm");
    m.set_uncertainty_b(0, "0.3", Distribution::Normal).unwrap();
    m.set_uncertainty_b(1, "0.6", Distribution::Uniform).unwrap();

    // (0.3 / 3)^2 + (0.6 / sqrt 3)^2
    let expected = 0.01 + 0.12;
    assert!((m.type_b_variance() - expected).abs() < 1e-12);

    m.remove_uncertainty_b(1).unwrap();
    assert!((m.type_b_variance() - 0.01).abs() < 1e-12);
    assert_eq!(m.uncertainty_b.len(), MAX_UNCERTAINTY_B);

    assert_eq!(
        m.set_uncertainty_b(2, "1", Distribution::None),
        Err(MeasurementError::UncertaintyBSlot(2))
    );
}

#[test]
fn test_rename_suggests_unit_only_when_empty() {
    let mut m = DirectMeasurement::new("", "");
    m.rename("length");
    assert_eq!(m.unit, "cm");

    m.rename("time");
    assert_eq!(m.unit, "cm");

    let mut f = DirectMeasurement::new("", "");
    f.rename("F");
    assert_eq!(f.unit, "N");

    assert_eq!(suggested_unit("x"), None);
    assert_eq!(suggested_unit("Mass"), Some("g"));
    assert_eq!(suggested_unit(""), None);
}

#[test]
fn test_measurement_serde_tagging() {
    let m: Measurement = CompositeMeasurement::new("v", "l / t").into();
    let json = serde_json::to_value(&m).unwrap();
    assert_eq!(json["type"], "composite");
    assert_eq!(json["name"], "v");
    assert_eq!(json["formula"], "l / t");

    let back: Measurement = serde_json::from_value(json).unwrap();
    assert_eq!(back.symbol(), Some("v"));
    match back {
        Measurement::Composite(c) => assert!(c.formula.tree().is_some()),
        Measurement::Direct(_) => panic!("expected composite"),
    }
}

#[test]
fn test_output_blank_display_unit_is_none() {
    assert_eq!(Output::new("v", Some("  ")).display_unit, None);
    assert_eq!(Output::new("v", Some("m/s")).display_unit.as_deref(), Some("m/s"));
}
