pub mod arch;
pub mod config;
pub mod data;
pub mod error;
pub mod initialization;
pub mod optimization;
pub mod pool;
pub mod topology;
pub mod training;

pub use arch::{Layer, Network};
pub use config::TrainConfig;
pub use data::{DataPoint, Dataset};
pub use error::{Result, TrainErr};
pub use pool::WorkerPool;
pub use topology::{MnistTopology, ReferenceTopology, Topology};
pub use training::{Gradients, Scratch, Trainer};
