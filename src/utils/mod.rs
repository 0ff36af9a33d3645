//! Utility helpers for terminal progress

pub mod progress;

pub use progress::*;
