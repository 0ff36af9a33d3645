//! Pairwise Pearson and Spearman correlation accumulation

use indicatif::ProgressBar;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::dataset::{finite_pair, FeatureTable};
use super::stats::{pearson, spearman, CorrelationResult};
use crate::error::{CorrelationError, Result};
use crate::utils::{create_progress_bar, finish_with_success};

pub const FEATURE_1: &str = "Feature 1";
pub const FEATURE_2: &str = "Feature 2";
pub const ABSOLUTE_SPEARMAN: &str = "Absolute Spearman";
pub const SPEARMAN: &str = "Spearman";
pub const SPEARMAN_P_VALUE: &str = "Spearman p-value";
pub const ABSOLUTE_PEARSON: &str = "Absolute Pearson";
pub const PEARSON: &str = "Pearson";
pub const PEARSON_P_VALUE: &str = "Pearson p-value";
pub const PEARSON_R_SQUARED: &str = "Pearson r-squared";

/// Column names of a [`CorrelationTable`], in table order
pub const COLUMN_NAMES: [&str; 9] = [
    FEATURE_1,
    FEATURE_2,
    ABSOLUTE_SPEARMAN,
    SPEARMAN,
    SPEARMAN_P_VALUE,
    ABSOLUTE_PEARSON,
    PEARSON,
    PEARSON_P_VALUE,
    PEARSON_R_SQUARED,
];

/// Correlation statistics for one feature pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    #[serde(rename = "Feature 1")]
    pub feature1: String,
    #[serde(rename = "Feature 2")]
    pub feature2: String,
    #[serde(rename = "Absolute Spearman", deserialize_with = "nan_from_null")]
    pub absolute_spearman: f64,
    #[serde(rename = "Spearman", deserialize_with = "nan_from_null")]
    pub spearman: f64,
    #[serde(rename = "Spearman p-value", deserialize_with = "nan_from_null")]
    pub spearman_p_value: f64,
    #[serde(rename = "Absolute Pearson", deserialize_with = "nan_from_null")]
    pub absolute_pearson: f64,
    #[serde(rename = "Pearson", deserialize_with = "nan_from_null")]
    pub pearson: f64,
    #[serde(rename = "Pearson p-value", deserialize_with = "nan_from_null")]
    pub pearson_p_value: f64,
    #[serde(rename = "Pearson r-squared", deserialize_with = "nan_from_null")]
    pub pearson_r_squared: f64,
}

impl CorrelationRecord {
    /// Build a record, deriving the absolute values and r-squared
    pub fn from_results(
        feature1: &str,
        feature2: &str,
        pearson: CorrelationResult,
        spearman: CorrelationResult,
    ) -> Self {
        Self {
            feature1: feature1.to_string(),
            feature2: feature2.to_string(),
            absolute_spearman: spearman.r.abs(),
            spearman: spearman.r,
            spearman_p_value: spearman.p_value,
            absolute_pearson: pearson.r.abs(),
            pearson: pearson.r,
            pearson_p_value: pearson.p_value,
            pearson_r_squared: pearson.r * pearson.r,
        }
    }

    /// Value of a numeric column by its table name
    pub fn statistic(&self, column: &str) -> Option<f64> {
        let value = match column {
            ABSOLUTE_SPEARMAN => self.absolute_spearman,
            SPEARMAN => self.spearman,
            SPEARMAN_P_VALUE => self.spearman_p_value,
            ABSOLUTE_PEARSON => self.absolute_pearson,
            PEARSON => self.pearson,
            PEARSON_P_VALUE => self.pearson_p_value,
            PEARSON_R_SQUARED => self.pearson_r_squared,
            _ => return None,
        };
        Some(value)
    }
}

/// Column-oriented accumulator of correlation records.
///
/// Row `i` of every column describes the same feature pair. Columns are
/// private so they can only grow together, one row per processed pair, in
/// submission order. Pairs are never deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCorrelationTable")]
pub struct CorrelationTable {
    #[serde(rename = "Feature 1")]
    feature1: Vec<String>,
    #[serde(rename = "Feature 2")]
    feature2: Vec<String>,
    #[serde(rename = "Absolute Spearman")]
    absolute_spearman: Vec<f64>,
    #[serde(rename = "Spearman")]
    spearman: Vec<f64>,
    #[serde(rename = "Spearman p-value")]
    spearman_p_value: Vec<f64>,
    #[serde(rename = "Absolute Pearson")]
    absolute_pearson: Vec<f64>,
    #[serde(rename = "Pearson")]
    pearson: Vec<f64>,
    #[serde(rename = "Pearson p-value")]
    pearson_p_value: Vec<f64>,
    #[serde(rename = "Pearson r-squared")]
    pearson_r_squared: Vec<f64>,
}

impl CorrelationTable {
    /// Empty table with all nine columns present
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.feature1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature1.is_empty()
    }

    pub fn column_names(&self) -> &'static [&'static str] {
        &COLUMN_NAMES
    }

    /// Append one row
    pub fn push(&mut self, record: CorrelationRecord) {
        self.feature1.push(record.feature1);
        self.feature2.push(record.feature2);
        self.absolute_spearman.push(record.absolute_spearman);
        self.spearman.push(record.spearman);
        self.spearman_p_value.push(record.spearman_p_value);
        self.absolute_pearson.push(record.absolute_pearson);
        self.pearson.push(record.pearson);
        self.pearson_p_value.push(record.pearson_p_value);
        self.pearson_r_squared.push(record.pearson_r_squared);
    }

    /// Row `index` as a record
    pub fn record(&self, index: usize) -> Option<CorrelationRecord> {
        if index >= self.len() {
            return None;
        }

        Some(CorrelationRecord {
            feature1: self.feature1[index].clone(),
            feature2: self.feature2[index].clone(),
            absolute_spearman: self.absolute_spearman[index],
            spearman: self.spearman[index],
            spearman_p_value: self.spearman_p_value[index],
            absolute_pearson: self.absolute_pearson[index],
            pearson: self.pearson[index],
            pearson_p_value: self.pearson_p_value[index],
            pearson_r_squared: self.pearson_r_squared[index],
        })
    }

    /// All rows in insertion order
    pub fn records(&self) -> impl Iterator<Item = CorrelationRecord> + '_ {
        (0..self.len()).filter_map(move |i| self.record(i))
    }

    /// "Feature 1" or "Feature 2" column by name
    pub fn feature_column(&self, column: &str) -> Option<&[String]> {
        match column {
            FEATURE_1 => Some(&self.feature1),
            FEATURE_2 => Some(&self.feature2),
            _ => None,
        }
    }

    /// One of the seven numeric columns by name
    pub fn statistic(&self, column: &str) -> Option<&[f64]> {
        let values = match column {
            ABSOLUTE_SPEARMAN => &self.absolute_spearman,
            SPEARMAN => &self.spearman,
            SPEARMAN_P_VALUE => &self.spearman_p_value,
            ABSOLUTE_PEARSON => &self.absolute_pearson,
            PEARSON => &self.pearson,
            PEARSON_P_VALUE => &self.pearson_p_value,
            PEARSON_R_SQUARED => &self.pearson_r_squared,
            _ => return None,
        };
        Some(values)
    }

    /// Compute and append one row per non-self pair, in input order.
    ///
    /// Every row of the batch is computed before any is appended, so a
    /// lookup failure leaves the table as it was.
    pub fn extend_from_pairs<T, S>(&mut self, pairs: &[(S, S)], dataset: &T) -> Result<()>
    where
        T: FeatureTable + ?Sized,
        S: AsRef<str>,
    {
        let records = compute_records(pairs, dataset, None)?;
        for record in records {
            self.push(record);
        }
        Ok(())
    }

    /// Copy of the table sorted by a numeric column, largest first.
    ///
    /// NaN values sort last; ties keep insertion order. Returns `None` for
    /// an unknown column.
    pub fn sorted_by(&self, column: &str) -> Option<CorrelationTable> {
        let values = self.statistic(column)?;

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            let (va, vb) = (values[a], values[b]);
            match (va.is_nan(), vb.is_nan()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Greater,
                (false, true) => std::cmp::Ordering::Less,
                (false, false) => vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal),
            }
        });

        let mut sorted = CorrelationTable::new();
        for record in order.into_iter().filter_map(|i| self.record(i)) {
            sorted.push(record);
        }
        Some(sorted)
    }

    /// Copy of the first `n` rows
    pub fn head(&self, n: usize) -> CorrelationTable {
        let mut table = CorrelationTable::new();
        for record in self.records().take(n) {
            table.push(record);
        }
        table
    }
}

/// Deserialized form of a [`CorrelationTable`] before its columns are checked.
///
/// Undefined statistics are exported as `null` and read back as NaN.
#[derive(Deserialize)]
struct RawCorrelationTable {
    #[serde(rename = "Feature 1")]
    feature1: Vec<String>,
    #[serde(rename = "Feature 2")]
    feature2: Vec<String>,
    #[serde(rename = "Absolute Spearman")]
    absolute_spearman: Vec<Option<f64>>,
    #[serde(rename = "Spearman")]
    spearman: Vec<Option<f64>>,
    #[serde(rename = "Spearman p-value")]
    spearman_p_value: Vec<Option<f64>>,
    #[serde(rename = "Absolute Pearson")]
    absolute_pearson: Vec<Option<f64>>,
    #[serde(rename = "Pearson")]
    pearson: Vec<Option<f64>>,
    #[serde(rename = "Pearson p-value")]
    pearson_p_value: Vec<Option<f64>>,
    #[serde(rename = "Pearson r-squared")]
    pearson_r_squared: Vec<Option<f64>>,
}

impl TryFrom<RawCorrelationTable> for CorrelationTable {
    type Error = CorrelationError;

    fn try_from(raw: RawCorrelationTable) -> Result<Self> {
        let expected = raw.feature1.len();
        let lengths = [
            (FEATURE_2, raw.feature2.len()),
            (ABSOLUTE_SPEARMAN, raw.absolute_spearman.len()),
            (SPEARMAN, raw.spearman.len()),
            (SPEARMAN_P_VALUE, raw.spearman_p_value.len()),
            (ABSOLUTE_PEARSON, raw.absolute_pearson.len()),
            (PEARSON, raw.pearson.len()),
            (PEARSON_P_VALUE, raw.pearson_p_value.len()),
            (PEARSON_R_SQUARED, raw.pearson_r_squared.len()),
        ];
        if let Some((column, actual)) = lengths.into_iter().find(|(_, len)| *len != expected) {
            return Err(CorrelationError::RaggedTable {
                column: column.to_string(),
                expected,
                actual,
            });
        }

        let nan_filled =
            |values: Vec<Option<f64>>| values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();

        Ok(Self {
            feature1: raw.feature1,
            feature2: raw.feature2,
            absolute_spearman: nan_filled(raw.absolute_spearman),
            spearman: nan_filled(raw.spearman),
            spearman_p_value: nan_filled(raw.spearman_p_value),
            absolute_pearson: nan_filled(raw.absolute_pearson),
            pearson: nan_filled(raw.pearson),
            pearson_p_value: nan_filled(raw.pearson_p_value),
            pearson_r_squared: nan_filled(raw.pearson_r_squared),
        })
    }
}

/// Read a statistic written as `null` back as NaN
fn nan_from_null<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl FromIterator<CorrelationRecord> for CorrelationTable {
    fn from_iter<I: IntoIterator<Item = CorrelationRecord>>(iter: I) -> Self {
        let mut table = CorrelationTable::new();
        for record in iter {
            table.push(record);
        }
        table
    }
}

/// Compute Pearson and Spearman statistics for each feature pair.
///
/// Pass the table returned by an earlier call as `correlations` to keep
/// accumulating; the same table is moved back out with the new rows
/// appended. Self-pairs are skipped without a row. Each pair uses its own
/// subset of rows where both values are present and finite.
///
/// A feature missing from `dataset` fails the whole batch. A pair with too
/// few rows or zero variance still gets a row, with NaN statistics.
///
/// # Arguments
/// * `feature_pairs` - Pairs of feature names, processed in order
/// * `dataset` - Table holding the features
/// * `correlations` - Result of a previous call to append to, or `None`
pub fn get_correlations<T, S>(
    feature_pairs: &[(S, S)],
    dataset: &T,
    correlations: Option<CorrelationTable>,
) -> Result<CorrelationTable>
where
    T: FeatureTable + ?Sized,
    S: AsRef<str>,
{
    let mut correlations = correlations.unwrap_or_default();
    correlations.extend_from_pairs(feature_pairs, dataset)?;
    Ok(correlations)
}

/// [`get_correlations`] with a progress bar over the pairs
pub fn get_correlations_with_progress<T, S>(
    feature_pairs: &[(S, S)],
    dataset: &T,
    correlations: Option<CorrelationTable>,
) -> Result<CorrelationTable>
where
    T: FeatureTable + ?Sized,
    S: AsRef<str>,
{
    let pb = create_progress_bar(feature_pairs.len() as u64, "   Calculating correlations");

    let records = match compute_records(feature_pairs, dataset, Some(&pb)) {
        Ok(records) => records,
        Err(e) => {
            pb.abandon();
            return Err(e);
        }
    };

    finish_with_success(&pb, &progress_summary(records.len(), feature_pairs.len()));

    let mut correlations = correlations.unwrap_or_default();
    for record in records {
        correlations.push(record);
    }
    Ok(correlations)
}

/// All unordered pairs of distinct features, in input order.
///
/// `["a", "b", "c"]` gives `(a, b), (a, c), (b, c)`.
pub fn feature_pairs<S: AsRef<str>>(features: &[S]) -> Vec<(String, String)> {
    let n = features.len();
    (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .map(|(i, j)| {
            (
                features[i].as_ref().to_string(),
                features[j].as_ref().to_string(),
            )
        })
        .collect()
}

/// Correlation record for a single pair over its finite complete cases
pub fn correlate_pair<T: FeatureTable + ?Sized>(
    dataset: &T,
    feature1: &str,
    feature2: &str,
) -> Result<CorrelationRecord> {
    let data = finite_pair(dataset, feature1, feature2)?;

    let pcc = pearson(&data.x, &data.y);
    let src = spearman(&data.x, &data.y);

    if pcc.is_degenerate() || src.is_degenerate() {
        warn!(
            feature1,
            feature2,
            rows = data.len(),
            "Correlation undefined for pair (fewer than 2 rows or zero variance)"
        );
    } else {
        debug!(
            feature1,
            feature2,
            rows = data.len(),
            pearson = pcc.r,
            spearman = src.r,
            "Computed pair correlation"
        );
    }

    Ok(CorrelationRecord::from_results(feature1, feature2, pcc, src))
}

/// Completion message for a batch; self pairs advance the bar without a row
fn progress_summary(computed: usize, submitted: usize) -> String {
    let skipped = submitted - computed;
    if skipped == 0 {
        format!("Analyzed {} feature pairs", computed)
    } else {
        format!(
            "Analyzed {} of {} feature pairs ({} self pairs skipped)",
            computed, submitted, skipped
        )
    }
}

fn compute_records<T, S>(
    pairs: &[(S, S)],
    dataset: &T,
    pb: Option<&ProgressBar>,
) -> Result<Vec<CorrelationRecord>>
where
    T: FeatureTable + ?Sized,
    S: AsRef<str>,
{
    let mut records = Vec::with_capacity(pairs.len());

    for (feature1, feature2) in pairs {
        let (feature1, feature2) = (feature1.as_ref(), feature2.as_ref());

        // Self pairs never produce a row
        if feature1 != feature2 {
            records.push(correlate_pair(dataset, feature1, feature2)?);
        }

        if let Some(pb) = pb {
            pb.inc(1);
        }
    }

    Ok(records)
}
