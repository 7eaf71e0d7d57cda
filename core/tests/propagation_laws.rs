use proptest::prelude::*;
use uncalc_core::document::Document;
use uncalc_core::expr::Bindings;
use uncalc_core::measurement::{
    CompositeMeasurement, DirectMeasurement, Measurement, Output, UncertaintyTypes,
};
use uncalc_core::propagation::Propagator;
use uncalc_core::units::Quantity;

fn samples() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1000.0_f64..1000.0, 1..12)
}

fn direct(name: &str, unit: &str, values: &[f64]) -> Measurement {
    let raw: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    DirectMeasurement::new(name, unit).with_values(&raw).into()
}

fn variance(p: &mut Propagator, m: &Measurement, all: &[Measurement]) -> f64 {
    p.combined_variance(m, all, UncertaintyTypes::TYPE_A_ONLY)
        .unwrap()
        .unwrap()
        .value_in_unit()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn direct_mean_is_average(values in samples()) {
        let all = vec![direct("x", "cm", &values)];
        let mut p = Propagator::default();
        let mean = p.mean(&all[0], &all).unwrap().unwrap();
        let expected = values.iter().sum::<f64>() / values.len() as f64;
        prop_assert!(close(mean.value_in_unit(), expected));
        prop_assert_eq!(mean.format_units(), "cm");
    }

    #[test]
    fn sum_variance_is_additive(xs in samples(), ys in samples()) {
        let all = vec![
            direct("x", "cm", &xs),
            direct("y", "mm", &ys),
            CompositeMeasurement::new("z", "x + y").into(),
        ];
        let mut p = Propagator::default();
        let vx = variance(&mut p, &all[0], &all);
        let vy = variance(&mut p, &all[1], &all) / 100.0;
        let vz = variance(&mut p, &all[2], &all);
        prop_assert!(close(vz, vx + vy), "{} vs {} + {}", vz, vx, vy);
    }

    #[test]
    fn scaling_multiplies_variance(xs in samples(), k in -50.0_f64..50.0) {
        let mut constants = Bindings::new();
        constants.insert("k".to_string(), Quantity::number(k));
        let all = vec![
            direct("x", "", &xs),
            CompositeMeasurement::new("z", "k * x").into(),
        ];
        let mut p = Propagator::new(constants);
        let vx = variance(&mut p, &all[0], &all);
        let vz = variance(&mut p, &all[1], &all);
        prop_assert!(close(vz, k * k * vx), "{} vs {}", vz, k * k * vx);
    }

    #[test]
    fn disabled_types_give_zero(xs in samples(), ys in samples()) {
        let all = vec![
            direct("x", "s", &xs),
            direct("y", "s", &ys),
            CompositeMeasurement::new("z", "x y + x^2").into(),
        ];
        let mut p = Propagator::default();
        for m in &all {
            let v = p.combined_variance(m, &all, UncertaintyTypes::NONE).unwrap().unwrap();
            prop_assert_eq!(v.base_value(), 0.0);
        }
    }

    #[test]
    fn mean_is_deterministic(xs in samples(), ys in samples()) {
        let all = vec![
            direct("x", "", &xs),
            direct("y", "", &ys),
            CompositeMeasurement::new("z", "x^2 - 3 y").into(),
        ];
        let mut p = Propagator::default();
        let first = p.mean(&all[2], &all).unwrap();
        let second = p.mean(&all[2], &all).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn records_round_trip(
        name in "[a-zA-Z][a-zA-Z0-9]{0,6}",
        unit in prop::sample::select(vec!["", "cm", "s", "kg m / s^2", "g cm^-3"]),
        type_b in prop::option::of(0.001_f64..10.0),
        display in prop::option::of(prop::sample::select(vec!["m", "mm/s", "N"])),
    ) {
        let b = type_b.map(|v| v.to_string()).unwrap_or_default();
        let mut doc = Document::new();
        doc.add_measurement(
            DirectMeasurement::with_uncertainty_b(&name, unit, &[b.as_str()]).into(),
        ).unwrap();
        doc.add_measurement(CompositeMeasurement::new("q_1", &format!("2 {}", name)).into())
            .unwrap();
        doc.add_output(Output::new(&name, display));

        let back = Document::from_query(&doc.to_query()).unwrap();
        prop_assert_eq!(back.to_records(), doc.to_records());
        prop_assert_eq!(back.outputs[0].display_unit.as_deref(), display);
    }
}
