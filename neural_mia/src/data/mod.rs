//! Batch records, loaders and synthetic data for training.

mod batch;
mod loader;
mod synthetic;

pub use batch::{EmgBatch, EmgSample};
pub use loader::{BatchLoader, DataLoaders, InMemoryLoader};
pub use synthetic::{SyntheticEmgDataset, SYNTHETIC_SESSIONS};
