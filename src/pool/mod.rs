//! A fixed-size pool of long-lived worker threads with per-worker queues.

mod partition;
mod task;
mod thread_pool;
mod worker;

pub use partition::partition;
pub use task::{TaskHandle, TaskStatus};
pub use thread_pool::WorkerPool;
