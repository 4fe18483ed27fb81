//! Output writers.
//!
//! # Submodules
//!
//! - [`json`]: writes a run's records and summary to one JSON file

pub mod json;
