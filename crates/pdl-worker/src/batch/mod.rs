//! Batch partitioning and fan-out/fan-in execution.

mod coordinator;
mod partition;

pub use coordinator::{BatchHandler, Coordinator};
pub use partition::{Batch, partition};
