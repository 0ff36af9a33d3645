//! Error types for correlation computation and plotting.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors that can occur while computing or plotting feature correlations.
///
/// Degenerate pairs (too few rows, zero variance) are not errors: they
/// produce NaN statistics and processing continues.
#[derive(Debug, Error)]
pub enum CorrelationError {
    /// A requested feature is not a column of the dataset.
    #[error("Feature '{name}' not found in dataset")]
    FeatureNotFound {
        /// Name that failed to resolve
        name: String,
    },

    /// The column exists but cannot be read as real numbers.
    #[error("Feature '{name}' is not numeric (dtype {dtype})")]
    NonNumericFeature { name: String, dtype: String },

    /// Error raised by polars while selecting or casting a column.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// A deserialized table whose columns differ in length.
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    RaggedTable {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// The drawing backend failed while rendering a figure.
    #[error("Plotting failed: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, CorrelationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_not_found_display() {
        let err = CorrelationError::FeatureNotFound {
            name: "age".to_string(),
        };
        assert_eq!(err.to_string(), "Feature 'age' not found in dataset");
    }

    #[test]
    fn test_non_numeric_display() {
        let err = CorrelationError::NonNumericFeature {
            name: "city".to_string(),
            dtype: "str".to_string(),
        };
        assert_eq!(err.to_string(), "Feature 'city' is not numeric (dtype str)");
    }

    #[test]
    fn test_ragged_table_display() {
        let err = CorrelationError::RaggedTable {
            column: "Pearson".to_string(),
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Column 'Pearson' has 2 rows, expected 3");
    }

    #[test]
    fn test_plot_display() {
        let err = CorrelationError::Plot("backend closed".to_string());
        assert!(err.to_string().contains("backend closed"));
    }
}
