mod backprop;
mod gradients;
mod metrics;
mod scratch;
mod trainer;

pub use backprop::compute_deltas;
pub use gradients::Gradients;
pub use metrics::TrainerMetrics;
pub use scratch::Scratch;
pub use trainer::{Trainer, batch_ranges};
