//! Small statistics helpers used by the scoring formula.

/// Sample standard deviation (n-1 denominator).
///
/// Returns `None` for fewer than two values, where the sample form is
/// undefined.
pub fn sample_stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_stdev() {
        // Sample stdev of [100, 110, 120, 90]: mean 105, squared deviations
        // 25 + 25 + 225 + 225 = 500, variance 500/3.
        let stdev = sample_stdev(&[100.0, 110.0, 120.0, 90.0]).unwrap();
        assert_relative_eq!(stdev, (500.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_constant_values_have_zero_stdev() {
        let stdev = sample_stdev(&[100.0, 100.0, 100.0, 100.0]).unwrap();
        assert_eq!(stdev, 0.0);
    }

    #[test]
    fn test_undefined_below_two_values() {
        assert!(sample_stdev(&[]).is_none());
        assert!(sample_stdev(&[42.0]).is_none());
    }
}
