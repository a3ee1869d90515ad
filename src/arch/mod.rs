pub mod activation;
pub mod loss;

mod layer;
mod network;

pub use layer::Layer;
pub use network::{Network, bias_augmented};
