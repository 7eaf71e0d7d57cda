//! Sample statistics for direct measurements.
//!
//! - **Mean**: Kahan compensated summation.
//! - **Variance**: Welford's online algorithm, Bessel-corrected.

/// Compensated (Neumaier) summation.
fn kahan_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for &x in data {
        let t = sum + x;
        if sum.abs() >= x.abs() {
            c += (sum - t) + x;
        } else {
            c += (x - t) + sum;
        }
        sum = t;
    }
    sum + c
}

/// Arithmetic mean, `None` for no samples.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(kahan_sum(data) / data.len() as f64)
}

/// Unbiased sample variance (n − 1 denominator).
///
/// A single sample has no dispersion, so its variance is 0 rather than undefined.
pub fn sample_variance(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        1 => Some(0.0),
        n => {
            let mut mean_acc = 0.0_f64;
            let mut m2 = 0.0_f64;
            for (i, &x) in data.iter().enumerate() {
                let delta = x - mean_acc;
                mean_acc += delta / (i + 1) as f64;
                m2 += delta * (x - mean_acc);
            }
            Some(m2 / (n - 1) as f64)
        }
    }
}

/// Type-A variance of the mean: sample variance divided by the sample count.
pub fn variance_of_mean(data: &[f64]) -> Option<f64> {
    sample_variance(data).map(|v| v / data.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]).unwrap() - 2.5).abs() < 1e-15);
    }

    #[test]
    fn test_sample_variance() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_variance(&v).unwrap() - 4.571428571428571).abs() < 1e-10);
        assert_eq!(sample_variance(&[3.0]), Some(0.0));
        assert_eq!(sample_variance(&[]), None);
    }

    #[test]
    fn test_variance_of_mean() {
        let v = [1.0, 2.0, 3.0];
        // s² = 1, n = 3
        assert!((variance_of_mean(&v).unwrap() - 1.0 / 3.0).abs() < 1e-15);
    }

    proptest! {
        #[test]
        fn variance_is_non_negative(data in proptest::collection::vec(-1e6_f64..1e6, 1..50)) {
            prop_assert!(sample_variance(&data).unwrap() >= 0.0);
        }

        #[test]
        fn variance_is_shift_invariant(
            data in proptest::collection::vec(-1e3_f64..1e3, 2..30),
            shift in -1e3_f64..1e3,
        ) {
            let shifted: Vec<f64> = data.iter().map(|x| x + shift).collect();
            let a = sample_variance(&data).unwrap();
            let b = sample_variance(&shifted).unwrap();
            prop_assert!((a - b).abs() < 1e-6 * a.max(1.0));
        }
    }
}
