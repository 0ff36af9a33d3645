//! Pipeline module - feature access, statistics, correlation and plotting

pub mod correlation;
pub mod dataset;
pub mod plot;
pub mod stats;

pub use correlation::*;
pub use dataset::*;
pub use plot::*;
pub use stats::{CorrelationResult, LineFit};
