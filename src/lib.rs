//! eda-corr: pairwise feature correlations for exploratory data analysis
//!
//! Computes Pearson and Spearman statistics over feature pairs of a
//! tabular dataset, accumulates them in a column-oriented table and renders
//! scatter grids of the pairs.

pub mod error;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use error::{CorrelationError, Result};
pub use pipeline::{get_correlations, plot_correlations, CorrelationTable, PlotConfig};
