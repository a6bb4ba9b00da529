//! Output module for reporting on the harvested dataset

pub mod stats;

pub use stats::{load_statistics, print_statistics, DatasetStatistics};
