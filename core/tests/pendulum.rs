use std::f64::consts::PI;
use uncalc_core::document::Document;
use uncalc_core::measurement::{
    CompositeMeasurement, DirectMeasurement, Distribution, Measurement, Output, UncertaintyTypes,
};
use uncalc_core::propagation::{PropagationError, Propagator};
use uncalc_core::report::evaluate_output;

fn pendulum() -> Document {
    let mut doc = Document::new();

    let mut l = DirectMeasurement::new("", "");
    l.rename("l");
    l.commit_values(&["99.8", "100.0", "100.2"], None);
    doc.add_measurement(l.into()).unwrap();

    let mut t = DirectMeasurement::new("T", "s");
    t.commit_values(&["2.01", "2.00", "1.99", "2.02"], None);
    t.set_uncertainty_b(0, "0.01", Distribution::Uniform).unwrap();
    doc.add_measurement(t.into()).unwrap();

    doc.add_measurement(CompositeMeasurement::new("g_m", "4 pi^2 l / T^2").into())
        .unwrap();
    doc.add_measurement(CompositeMeasurement::new("T_p", "2 pi sqrt(l / g)").into())
        .unwrap();
    doc
}

#[test]
fn test_measured_gravity() {
    let doc = pendulum();
    let mut propagator = Propagator::new(doc.constants());
    let report = evaluate_output(&Output::new("g_m", Some("m/s^2")), &doc, &mut propagator)
        .unwrap()
        .unwrap();

    let (l, t) = (100.0, 2.005);
    let g = 4.0 * PI * PI * l / (t * t) / 100.0;
    assert!((report.mean - g).abs() < 1e-9);

    // Var(l) = 0.04 / 3 cm^2; Var(T) = 5e-4 / 12 + (0.01 / sqrt 3)^2 s^2
    let var_l = 0.04 / 3.0;
    let var_t = 5e-4 / 12.0 + 0.0001 / 3.0;
    let relative = (var_l / (l * l) + 4.0 * var_t / (t * t)).sqrt();
    let u = report.uncertainty.unwrap();
    assert!((u - g * relative).abs() < 1e-9, "u = {}, expected {}", u, g * relative);
    assert!((report.relative_uncertainty.unwrap() - relative).abs() < 1e-9);
    assert_eq!(report.min_digits, 3);
    assert_eq!(report.unit, "m/s^2");
}

#[test]
fn test_predicted_period_uses_gravity_constant() {
    let mut doc = pendulum();
    doc.settings.gravity = 9.8;
    let mut propagator = Propagator::new(doc.constants());

    let period = doc.find_by_symbol("T_p").unwrap();
    let mean = propagator.mean(period, &doc.measurements).unwrap().unwrap();
    assert_eq!(mean.format_units(), "s");
    assert!((mean.value_in_unit() - 2.0 * PI * (1.0f64 / 9.8).sqrt()).abs() < 1e-9);

    // Only l contributes: dT/dl = T / 2l
    let u = propagator
        .uncertainty(period, &doc.measurements, UncertaintyTypes::TYPE_A_ONLY)
        .unwrap()
        .unwrap();
    let expected = mean.value_in_unit() / 2.0 * (0.04f64 / 3.0).sqrt() / 100.0;
    assert!((u.value_in_unit() - expected).abs() < 1e-9);
}

#[test]
fn test_editing_breaks_and_restores_the_chain() {
    let mut doc = pendulum();
    let mut propagator = Propagator::new(doc.constants());
    let output = Output::new("g_m", None);

    let id = doc.find_by_symbol("T").unwrap().id();
    doc.rename_measurement(id, "tau").unwrap();
    assert_eq!(
        evaluate_output(&output, &doc, &mut propagator),
        Err(PropagationError::UndefinedMeasurement("T".to_string()))
    );

    doc.rename_measurement(id, "T").unwrap();
    assert!(evaluate_output(&output, &doc, &mut propagator)
        .unwrap()
        .is_some());

    let g_id = doc.find_by_symbol("g_m").unwrap().id();
    if let Measurement::Composite(c) = doc.measurement_mut(g_id).unwrap() {
        c.set_formula("4 pi^2 l / T^2 + g_m");
    }
    assert!(matches!(
        evaluate_output(&output, &doc, &mut propagator),
        Err(PropagationError::CyclicReference(_))
    ));
}

#[test]
fn test_export_import_preserves_results() {
    let mut doc = pendulum();
    doc.add_output(Output::new("g_m", Some("m/s^2")));
    let query = doc.to_query();

    let mut restored = Document::from_query(&query).unwrap();
    assert_eq!(restored.measurements.len(), 4);
    assert_eq!(restored.outputs.len(), 1);
    assert_eq!(restored.to_query(), query);

    // Samples and distributions are not part of the record encoding
    for m in &mut restored.measurements {
        if let Measurement::Direct(d) = m {
            let source = match doc.find_by_symbol(d.name.text.as_str()) {
                Some(Measurement::Direct(o)) => o.clone(),
                _ => panic!("missing direct measurement"),
            };
            d.commit_values(source.inputs(), None);
            d.uncertainty_b = source.uncertainty_b;
        }
    }

    let mut a = Propagator::new(doc.constants());
    let mut b = Propagator::new(restored.constants());
    let before = evaluate_output(&doc.outputs[0], &doc, &mut a).unwrap();
    let after = evaluate_output(&restored.outputs[0], &restored, &mut b).unwrap();
    assert_eq!(before, after);
}
