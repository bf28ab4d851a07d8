//! Descriptive statistics over plain slices

/// Calculate the mean of a slice
///
/// Returns 0.0 for empty slices.
///
/// # Examples
///
/// ```rust
/// use insight_core::math::mean;
///
/// assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
/// ```
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample variance with Bessel's correction
///
/// Returns 0.0 for slices with less than 2 elements.
pub fn variance(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    data.iter()
        .map(|&x| {
            let diff = x - m;
            diff * diff
        })
        .sum::<f64>()
        / (data.len() - 1) as f64
}

/// Sample standard deviation
///
/// # Examples
///
/// ```rust
/// use insight_core::math::std_dev;
///
/// let sd = std_dev(&[1.0, 2.0, 3.0, 4.0, 5.0]);
/// assert!((sd - 1.58113883).abs() < 1e-6);
/// ```
pub fn std_dev(data: &[f64]) -> f64 {
    variance(data).sqrt()
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Percent change from `previous` to `current`; 0 when `previous` is exactly 0
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_variance_small_inputs() {
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(variance(&[3.0]), 0.0);
        assert_relative_eq!(variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 32.0 / 7.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.75 + 0.10 + 0.05, 2), 0.9);
        assert_eq!(round_to(0.75 - 0.15, 2), 0.6);
        assert_eq!(round_to(1.23456, 4), 1.2346);
    }

    #[test]
    fn test_percent_change_zero_baseline() {
        assert_eq!(percent_change(5.0, 0.0), 0.0);
        assert_relative_eq!(percent_change(2.0, 4.0), -50.0);
    }
}
