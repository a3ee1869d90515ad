mod datapoint;
mod dataset;
pub mod idx;

pub use datapoint::{DataPoint, argmax};
pub use dataset::Dataset;
