//! Persistence of harvest output

pub mod checkpoint;

pub use checkpoint::{load_results, CheckpointStore};
