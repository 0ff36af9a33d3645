//! Feature access and complete-case selection for pairs of columns

use polars::prelude::*;

use crate::error::{CorrelationError, Result};

/// A table of named numeric features whose rows align by position.
///
/// `None` marks a missing value. Implementations must return every feature
/// with the same length so that row `i` of one feature lines up with row
/// `i` of another.
pub trait FeatureTable {
    /// Values of the named feature, one entry per row.
    fn feature_values(&self, name: &str) -> Result<Vec<Option<f64>>>;

    /// Names of all features, in table order.
    fn feature_names(&self) -> Vec<String>;

    /// Number of rows.
    fn height(&self) -> usize;
}

impl FeatureTable for DataFrame {
    fn feature_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        if !self.get_column_names().iter().any(|c| c.as_str() == name) {
            return Err(CorrelationError::FeatureNotFound {
                name: name.to_string(),
            });
        }

        let column = self.column(name)?;
        if !column.dtype().is_primitive_numeric() {
            return Err(CorrelationError::NonNumericFeature {
                name: name.to_string(),
                dtype: column.dtype().to_string(),
            });
        }

        // NaN counts as missing, same as a null
        let floats = column.cast(&DataType::Float64)?;
        let values = floats
            .f64()?
            .iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();

        Ok(values)
    }

    fn feature_names(&self) -> Vec<String> {
        self.get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn height(&self) -> usize {
        DataFrame::height(self)
    }
}

/// Two aligned columns restricted to a subset of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl PairData {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterate the retained rows as `(x, y)` points.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Rows where both features are present. Infinite values are kept.
pub fn complete_case_pair<T: FeatureTable + ?Sized>(
    table: &T,
    feature1: &str,
    feature2: &str,
) -> Result<PairData> {
    select_pair(table, feature1, feature2, |_, _| true)
}

/// Rows where both features are present and finite.
///
/// This is the subset every correlation statistic is computed over.
pub fn finite_pair<T: FeatureTable + ?Sized>(
    table: &T,
    feature1: &str,
    feature2: &str,
) -> Result<PairData> {
    select_pair(table, feature1, feature2, |x, y| x.is_finite() && y.is_finite())
}

/// Present values of a single feature, missing entries dropped.
pub fn present_values<T: FeatureTable + ?Sized>(table: &T, feature: &str) -> Result<Vec<f64>> {
    Ok(table.feature_values(feature)?.into_iter().flatten().collect())
}

fn select_pair<T, F>(table: &T, feature1: &str, feature2: &str, keep: F) -> Result<PairData>
where
    T: FeatureTable + ?Sized,
    F: Fn(f64, f64) -> bool,
{
    let col1 = table.feature_values(feature1)?;
    let col2 = table.feature_values(feature2)?;

    let mut pair = PairData::default();
    for (a, b) in col1.into_iter().zip(col2) {
        if let (Some(a), Some(b)) = (a, b) {
            if keep(a, b) {
                pair.x.push(a);
                pair.y.push(b);
            }
        }
    }

    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_feature_is_lookup_failure() {
        let df = df! { "a" => [1.0f64, 2.0] }.unwrap();
        let err = df.feature_values("b").unwrap_err();
        assert!(matches!(err, CorrelationError::FeatureNotFound { ref name } if name == "b"));
    }

    #[test]
    fn test_string_feature_rejected() {
        let df = df! { "city" => ["a", "b"] }.unwrap();
        let err = df.feature_values("city").unwrap_err();
        assert!(matches!(err, CorrelationError::NonNumericFeature { .. }));
    }

    #[test]
    fn test_integer_feature_cast_to_float() {
        let df = df! { "n" => [1i32, 2, 3] }.unwrap();
        let values = df.feature_values("n").unwrap();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_nan_treated_as_missing() {
        let df = df! { "a" => [1.0f64, f64::NAN, 3.0] }.unwrap();
        let values = df.feature_values("a").unwrap();
        assert_eq!(values, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_complete_case_keeps_infinite() {
        let df = df! {
            "a" => [Some(1.0f64), Some(f64::INFINITY), None],
            "b" => [Some(2.0f64), Some(4.0), Some(6.0)],
        }
        .unwrap();

        let pair = complete_case_pair(&df, "a", "b").unwrap();
        assert_eq!(pair.len(), 2);

        let finite = finite_pair(&df, "a", "b").unwrap();
        assert_eq!(finite.x, vec![1.0]);
        assert_eq!(finite.y, vec![2.0]);
    }
}
