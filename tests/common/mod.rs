//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;

/// Create a DataFrame with known correlation patterns
///
/// - `x`, `y`: perfectly linear (y = 2x)
/// - `x`, `z`: weak negative relation
/// - `cube`: monotonic but non-linear in `x`
/// - `constant`: zero variance
pub fn create_correlation_test_dataframe() -> DataFrame {
    df! {
        "x" => [1.0f64, 2.0, 3.0, 4.0, 5.0],
        "y" => [2.0f64, 4.0, 6.0, 8.0, 10.0],
        "z" => [5.0f64, 3.0, 1.0, 4.0, 2.0],
        "cube" => [1.0f64, 8.0, 27.0, 64.0, 125.0],
        "constant" => [7.0f64; 5],
    }
    .unwrap()
}

/// Create a DataFrame with missing and infinite entries
pub fn create_dirty_test_dataframe() -> DataFrame {
    df! {
        "a" => [Some(1.0f64), None, Some(3.0), Some(4.0), Some(5.0), Some(6.0)],
        "b" => [Some(2.0f64), Some(4.0), None, Some(8.0), Some(9.0), Some(13.0)],
        "with_inf" => [Some(1.0f64), Some(2.0), Some(3.0), Some(f64::INFINITY), Some(5.0), Some(f64::NEG_INFINITY)],
        "with_nan" => [1.0f64, f64::NAN, 3.0, 4.0, 5.0, 6.0],
        "all_missing" => [None::<f64>, None, None, None, None, None],
    }
    .unwrap()
}

/// Create a DataFrame of random features for larger tests
pub fn create_large_test_dataframe(rows: usize, cols: usize) -> DataFrame {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    let columns: Vec<Column> = (0..cols)
        .map(|i| {
            let values: Vec<f64> = (0..rows).map(|_| rng.gen::<f64>()).collect();
            Column::new(format!("feature_{}", i).into(), values)
        })
        .collect();

    DataFrame::new(columns).unwrap()
}

/// Pairs of owned feature names from string literals
pub fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
    list.iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

/// Assert two floats are equal, treating NaN as equal to NaN
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    if expected.is_nan() {
        assert!(actual.is_nan(), "Expected NaN, got {}", actual);
        return;
    }
    assert!(
        (actual - expected).abs() < tol,
        "Expected {} (±{}), got {}",
        expected,
        tol,
        actual
    );
}
