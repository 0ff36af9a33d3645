//! Report module - presenting and exporting correlation results

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
