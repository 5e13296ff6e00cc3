//! Configuration types for neural_mia.
//!
//! Burn-style configuration structs for the projection pipeline, models,
//! losses, datasets and training runs. Every struct round-trips through JSON
//! with burn's `Config::save` / `Config::load`, and the whole set is stored in
//! each checkpoint.

mod data;
mod network;
mod pipeline;
mod training;

pub use data::DatasetConfig;
pub use network::{ConvEmgConfig, ModelConfig, ModelKind, TransformerEmgConfig};
pub use pipeline::{LossConfig, MaskOverride, PipelineConfig};
pub use training::{OptimizerConfig, TrainingConfig};
