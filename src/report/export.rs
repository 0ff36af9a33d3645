//! Conversion of correlation tables to DataFrames and JSON

use anyhow::{Context, Result};
use chrono::Utc;
use polars::prelude::*;
use serde::Serialize;

use crate::pipeline::{
    CorrelationTable, ABSOLUTE_PEARSON, ABSOLUTE_SPEARMAN, FEATURE_1, FEATURE_2, PEARSON,
    PEARSON_P_VALUE, PEARSON_R_SQUARED, SPEARMAN, SPEARMAN_P_VALUE,
};

/// Metadata attached to an exported correlation table
#[derive(Serialize)]
pub struct ExportMetadata {
    /// Timestamp of the export (ISO 8601 format)
    pub timestamp: String,
    /// Crate version that produced the table
    pub version: String,
    /// Number of feature pairs in the table
    pub pairs: usize,
    /// Pairs whose Pearson coefficient is undefined
    pub undefined_pairs: usize,
}

/// Correlation table with metadata, as written by [`correlations_to_json`]
#[derive(Serialize)]
pub struct CorrelationExport<'a> {
    pub metadata: ExportMetadata,
    /// Column-oriented results, keyed by column name
    pub correlations: &'a CorrelationTable,
}

/// Build a polars DataFrame with one column per table column.
///
/// Column names are the table's exact column names; undefined statistics
/// stay NaN.
pub fn correlations_to_dataframe(correlations: &CorrelationTable) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(9);

    for name in [FEATURE_1, FEATURE_2] {
        let values = correlations
            .feature_column(name)
            .context("Correlation table is missing a feature column")?;
        columns.push(Column::new(name.into(), values));
    }

    for name in [
        ABSOLUTE_SPEARMAN,
        SPEARMAN,
        SPEARMAN_P_VALUE,
        ABSOLUTE_PEARSON,
        PEARSON,
        PEARSON_P_VALUE,
        PEARSON_R_SQUARED,
    ] {
        let values = correlations
            .statistic(name)
            .with_context(|| format!("Correlation table is missing column '{}'", name))?;
        columns.push(Column::new(name.into(), values));
    }

    DataFrame::new(columns).context("Failed to build correlation DataFrame")
}

/// Serialize the table with export metadata as pretty JSON.
///
/// NaN statistics are written as `null`.
pub fn correlations_to_json(correlations: &CorrelationTable) -> Result<String> {
    let undefined_pairs = correlations
        .statistic(PEARSON)
        .map(|values| values.iter().filter(|v| v.is_nan()).count())
        .unwrap_or(0);

    let export = CorrelationExport {
        metadata: ExportMetadata {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            pairs: correlations.len(),
            undefined_pairs,
        },
        correlations,
    };

    serde_json::to_string_pretty(&export).context("Failed to serialize correlation table")
}
