//! Correlation coefficients, significance tests and shape statistics

use polyfit_rs::polyfit_rs;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Coefficient and two-sided p-value for one correlation measure
#[derive(Debug, Clone, Copy)]
pub struct CorrelationResult {
    /// Correlation coefficient in [-1, 1], NaN when undefined
    pub r: f64,
    /// Two-sided p-value for H0: no correlation, NaN when undefined
    pub p_value: f64,
    /// Number of observations used
    pub n: usize,
}

impl CorrelationResult {
    fn undefined(n: usize) -> Self {
        Self {
            r: f64::NAN,
            p_value: f64::NAN,
            n,
        }
    }

    /// True when the coefficient could not be computed for this subset
    pub fn is_degenerate(&self) -> bool {
        self.r.is_nan()
    }
}

/// Pearson product-moment correlation with a t-test p-value.
///
/// Inputs are expected to be finite and of equal length. Fewer than two
/// observations, or zero variance in either input, yield NaN for both the
/// coefficient and the p-value.
pub fn pearson(x: &[f64], y: &[f64]) -> CorrelationResult {
    let n = x.len().min(y.len());
    if n < 2 {
        return CorrelationResult::undefined(n);
    }

    // Correlation is scale invariant; normalizing keeps extreme magnitudes
    // from overflowing or underflowing in the sums of products
    let (Some(dx), Some(dy)) = (scaled_deviations(&x[..n]), scaled_deviations(&y[..n])) else {
        return CorrelationResult::undefined(n);
    };

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (&a, &b) in dx.iter().zip(&dy) {
        sxx += a * a;
        syy += b * b;
        sxy += a * b;
    }

    if sxx == 0.0 || syy == 0.0 {
        return CorrelationResult::undefined(n);
    }

    let r = (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0);

    CorrelationResult {
        r,
        p_value: correlation_p_value(r, n),
        n,
    }
}

/// Spearman rank correlation: Pearson over average ranks.
///
/// With two observations the coefficient is ±1 but the p-value is NaN,
/// since the rank test has no degrees of freedom.
pub fn spearman(x: &[f64], y: &[f64]) -> CorrelationResult {
    let n = x.len().min(y.len());
    if n < 2 {
        return CorrelationResult::undefined(n);
    }

    let mut result = pearson(&rank_data(&x[..n]), &rank_data(&y[..n]));
    // Two ranked points always correlate perfectly; the rank test is undefined
    if n == 2 {
        result.p_value = f64::NAN;
    }
    result
}

/// Two-sided p-value for a correlation coefficient from `n` observations.
///
/// Uses t = r·√((n-2)/(1-r²)) against Student's t with n-2 degrees of
/// freedom. With two observations there are no degrees of freedom left and
/// the p-value is 1.
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if r.is_nan() || n < 2 {
        return f64::NAN;
    }
    if n == 2 {
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();

    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.sf(t.abs())).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// 1-based ranks with ties assigned their average rank.
pub fn rank_data(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && values[order[j]] == values[order[i]] {
            j += 1;
        }
        // Positions i..j share the average of ranks i+1..=j
        let avg = (i + j + 1) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }

    ranks
}

/// Excess kurtosis (Fisher definition, biased moments).
///
/// Normal data scores close to 0; heavy-tailed data scores high.
/// Returns NaN for fewer than two values or zero variance.
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }

    let m = mean(values);
    let n = values.len() as f64;
    let (m2, m4) = values.iter().fold((0.0, 0.0), |(m2, m4), &v| {
        let d2 = (v - m) * (v - m);
        (m2 + d2, m4 + d2 * d2)
    });
    let m2 = m2 / n;
    let m4 = m4 / n;

    if m2 == 0.0 {
        return f64::NAN;
    }

    m4 / (m2 * m2) - 3.0
}

/// Least-squares straight line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a first-degree polynomial to the points.
///
/// Returns `None` when fewer than two points are given or `x` is constant,
/// since no unique line exists.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<LineFit> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let (x, y) = (&x[..n], &y[..n]);
    if x.iter().all(|&v| v == x[0]) {
        return None;
    }

    let coefficients = polyfit_rs::polyfit(x, y, 1).ok()?;
    match coefficients.as_slice() {
        [intercept, slope] if intercept.is_finite() && slope.is_finite() => Some(LineFit {
            slope: *slope,
            intercept: *intercept,
        }),
        _ => None,
    }
}

/// Deviations from the mean, divided by their largest magnitude.
///
/// Values are first divided by their largest magnitude so the mean cannot
/// overflow. Returns `None` when the input is constant.
fn scaled_deviations(values: &[f64]) -> Option<Vec<f64>> {
    let scale = max_abs(values.iter().copied());
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }

    let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
    let m = mean(&scaled);
    let deviations: Vec<f64> = scaled.iter().map(|v| v - m).collect();

    let spread = max_abs(deviations.iter().copied());
    if spread == 0.0 {
        return None;
    }
    Some(deviations.into_iter().map(|d| d / spread).collect())
}

fn max_abs(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_pearson_perfect_positive() {
        let result = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 10.0]);
        assert!((result.r - 1.0).abs() < EPS);
        assert!(result.p_value < 1e-6);
        assert_eq!(result.n, 5);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let result = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert!((result.r + 1.0).abs() < EPS);
    }

    #[test]
    fn test_pearson_known_value() {
        // r = 6 / sqrt(60), t = 2.1213 with df = 3
        let result = pearson(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]);
        assert!((result.r - 0.7745966692414834).abs() < 1e-9, "r = {}", result.r);
        assert!(result.p_value > 0.1 && result.p_value < 0.15, "p = {}", result.p_value);
    }

    #[test]
    fn test_pearson_constant_is_nan() {
        let result = pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]);
        assert!(result.r.is_nan());
        assert!(result.p_value.is_nan());
        assert!(result.is_degenerate());
    }

    #[test]
    fn test_pearson_too_short_is_nan() {
        let result = pearson(&[1.0], &[2.0]);
        assert!(result.r.is_nan());
        assert_eq!(result.n, 1);

        let empty = pearson(&[], &[]);
        assert!(empty.r.is_nan());
        assert_eq!(empty.n, 0);
    }

    #[test]
    fn test_pearson_huge_magnitude() {
        let result = pearson(&[1e200, 2e200, 3e200, 4e200], &[1.0, 2.0, 3.0, 4.0]);
        assert!((result.r - 1.0).abs() < EPS, "r = {}", result.r);
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn test_pearson_tiny_magnitude() {
        let reference = pearson(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0, 5.0]);
        let result = pearson(&[1e-200, 2e-200, 3e-200, 4e-200], &[1.0, 2.0, 3.0, 5.0]);
        assert!((result.r - reference.r).abs() < 1e-12, "r = {}", result.r);
        assert!((result.p_value - reference.p_value).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_near_float_max() {
        let result = pearson(&[-1.5e308, 0.0, 1.5e308], &[3.0, 2.0, 1.0]);
        assert!((result.r + 1.0).abs() < EPS, "r = {}", result.r);
    }

    #[test]
    fn test_spearman_two_points_p_value_undefined() {
        let result = spearman(&[1.0, 2.0], &[3.0, 7.0]);
        assert!((result.r - 1.0).abs() < EPS);
        assert!(result.p_value.is_nan());
    }

    #[test]
    fn test_two_points_p_value_is_one() {
        let result = pearson(&[1.0, 2.0], &[3.0, 7.0]);
        assert!((result.r - 1.0).abs() < EPS);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_spearman_monotonic_nonlinear() {
        let result = spearman(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 8.0, 27.0, 64.0, 125.0]);
        assert!((result.r - 1.0).abs() < EPS);
    }

    #[test]
    fn test_spearman_unrelated() {
        // Ranks of y: 5,3,1,4,2 -> sum d^2 = 16 + 1 + 4 + 0 + 9 = 30, rho = 1 - 180/120 = -0.5
        let result = spearman(&[1.0, 2.0, 3.0, 4.0, 5.0], &[5.0, 3.0, 1.0, 4.0, 2.0]);
        assert!((result.r + 0.5).abs() < EPS, "rho = {}", result.r);
        assert!(result.p_value > 0.3);
    }

    #[test]
    fn test_rank_data_ties_get_average() {
        let ranks = rank_data(&[10.0, 20.0, 20.0, 5.0]);
        assert_eq!(ranks, vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn test_p_value_symmetric_in_sign() {
        let p_pos = correlation_p_value(0.4, 20);
        let p_neg = correlation_p_value(-0.4, 20);
        assert!((p_pos - p_neg).abs() < EPS);
        assert!(p_pos > 0.0 && p_pos < 1.0);
    }

    #[test]
    fn test_p_value_zero_correlation_is_one() {
        assert!((correlation_p_value(0.0, 10) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_kurtosis_uniform_is_negative() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let k = excess_kurtosis(&values);
        assert!((k + 1.2).abs() < 0.01, "kurtosis = {}", k);
    }

    #[test]
    fn test_kurtosis_heavy_tail_exceeds_threshold() {
        let mut values = vec![1.0; 999];
        values.push(1000.0);
        assert!(excess_kurtosis(&values) > 40.0);
    }

    #[test]
    fn test_kurtosis_constant_is_nan() {
        assert!(excess_kurtosis(&[3.0, 3.0, 3.0]).is_nan());
        assert!(excess_kurtosis(&[3.0]).is_nan());
    }

    #[test]
    fn test_linear_fit_recovers_line() {
        let fit = linear_fit(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-6);
        assert!((fit.intercept - 1.0).abs() < 1e-6);
        assert!((fit.predict(10.0) - 21.0).abs() < 1e-5);
    }

    #[test]
    fn test_linear_fit_constant_x_is_none() {
        assert!(linear_fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(linear_fit(&[1.0], &[1.0]).is_none());
    }
}
