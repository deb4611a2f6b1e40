//! Driving and ancillary data, and unit comparison.
pub mod dataset;
pub mod units;

pub use dataset::{DataSet, Variable};
