//! Training configuration types.

use burn::config::Config;

use super::{DatasetConfig, LossConfig, ModelConfig, PipelineConfig};

/// Optimizer and learning-rate schedule settings.
#[derive(Config, Debug)]
pub struct OptimizerConfig {
    /// Initial learning rate.
    #[config(default = 1e-4)]
    pub learning_rate: f64,

    /// AdamW decoupled weight decay.
    #[config(default = 1e-2)]
    pub weight_decay: f32,

    /// Multiplicative decay applied at each schedule milestone.
    #[config(default = 0.3)]
    pub lr_decay: f64,

    /// Gradient norm clipping threshold (0 = no clipping).
    #[config(default = 1.0)]
    pub gradient_clip: f32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a full training run.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Forward pass configuration.
    pub pipeline: PipelineConfig,

    /// Loss weights.
    pub loss: LossConfig,

    /// Optimizer settings.
    pub optimizer: OptimizerConfig,

    /// Model construction settings.
    pub model: ModelConfig,

    /// Dataset shape.
    pub data: DatasetConfig,

    /// Run name. Names containing `dbg` shorten phases; `dbg` itself skips checkpoints.
    #[config(default = "String::from(\"mia\")")]
    pub name: String,

    /// Total number of epochs.
    #[config(default = 20)]
    pub num_epochs: usize,

    /// Seed for the backend RNG.
    #[config(default = 900)]
    pub seed: u64,

    /// Root directory for checkpoints and run metadata.
    #[config(default = "String::from(\"checkpoints\")")]
    pub checkpoint_root: String,

    /// Checkpoint directory to resume from.
    #[config(default = "None")]
    pub resume: Option<String>,

    /// Batch failures tolerated per phase before the run aborts.
    #[config(default = 7)]
    pub max_failures: usize,

    /// Last step of a phase when running a debug run.
    #[config(default = 256)]
    pub debug_step_limit: usize,

    /// Session identifier whose examples are excluded from the batch loss.
    #[config(default = "None")]
    pub exclude: Option<String>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let data = DatasetConfig::default();
        let model = ModelConfig::new(data.keypoint_features(), data.num_channels, data.num_frames);
        Self::new(
            PipelineConfig::default().with_sequence_length(data.num_frames),
            LossConfig::default(),
            OptimizerConfig::default(),
            model,
            data,
        )
    }
}

impl TrainingConfig {
    /// Whether this is a debug run (phases truncated after `debug_step_limit`).
    pub fn is_debug(&self) -> bool {
        self.name.contains("dbg")
    }

    /// Whether per-epoch checkpoints are written.
    pub fn writes_checkpoints(&self) -> bool {
        self.name != "dbg"
    }

    /// Experiment tracking group for this run.
    pub fn tracking_group(&self) -> &'static str {
        if self.is_debug() {
            "train_debug"
        } else {
            "train"
        }
    }

    /// Epochs at which the learning rate decays: 2/5, 3/5 and 4/5 of the run.
    pub fn lr_milestones(&self) -> Vec<usize> {
        let n = self.num_epochs;
        vec![n * 2 / 5, n * 3 / 5, n * 4 / 5]
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.pipeline.validate()?;
        self.model.validate()?;
        self.data.validate()?;

        if self.name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.optimizer.learning_rate <= 0.0 {
            return Err("learning_rate must be positive".to_string());
        }
        if self.max_failures == 0 {
            return Err("max_failures must be positive".to_string());
        }
        if self.pipeline.sequence_length != self.data.num_frames
            || self.model.num_frames != self.data.num_frames
        {
            return Err("pipeline, model and data frame counts must agree".to_string());
        }
        if self.model.input_features != self.data.keypoint_features() {
            return Err("model input_features must equal joints * 2".to_string());
        }
        if self.model.num_channels != self.data.num_channels {
            return Err("model and data channel counts must agree".to_string());
        }
        Ok(())
    }
}
