//! End-to-end run setup.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use burn::tensor::backend::AutodiffBackend;
use instant::Instant;

use super::checkpoint::CheckpointManager;
use super::logger::{RunLogger, TrainLogger};
use super::metrics::PhaseSummary;
use super::optimizer::adamw_config;
use super::trainer::Trainer;
use crate::config::TrainingConfig;
use crate::data::DataLoaders;
use crate::error::{MiaError, Result};
use crate::nn::EmgNet;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome<B: AutodiffBackend> {
    /// Trained model.
    pub model: EmgNet<B>,
    /// One summary per phase, in execution order.
    pub summaries: Vec<PhaseSummary>,
    /// Epoch the loop started at.
    pub start_epoch: usize,
    /// Directory holding checkpoints and run metadata.
    pub run_dir: PathBuf,
}

/// Build everything a run needs and train it.
///
/// Validates the configuration, seeds the backend, builds the model and
/// AdamW optimizer, restores `config.resume` when set, starts tracking in
/// `<checkpoint_root>/<name>` and runs the epoch loop.
pub fn run_training<B: AutodiffBackend>(
    config: TrainingConfig,
    loaders: &mut DataLoaders<B>,
    device: &B::Device,
) -> Result<RunOutcome<B>> {
    config.validate().map_err(MiaError::invalid_config)?;
    check_dataset(&config, loaders)?;

    B::seed(config.seed);

    let start = Instant::now();
    log::info!("Initializing model ({})...", config.model.kind.as_str());
    let model: EmgNet<B> = config.model.init(device);
    let optimizer = adamw_config(&config.optimizer).init::<B, EmgNet<B>>();
    let trainer = Trainer::new(config.clone(), model, optimizer);

    let (mut trainer, start_epoch) = match &config.resume {
        Some(dir) => trainer.resume(Path::new(dir), device)?,
        None => (trainer, 0),
    };
    log::info!("Took {:.3}s", start.elapsed().as_secs_f64());

    let mut checkpoints = CheckpointManager::for_run(&config);
    fs::create_dir_all(checkpoints.run_dir())?;

    let mut logger = RunLogger::with_run_dir(checkpoints.run_dir());
    logger.init_tracking(config.tracking_group(), &config)?;
    logger.info(&format!("Final config: {}", serde_json::to_string(&config)?));

    let summaries = trainer.train_all_epochs(start_epoch, loaders, &mut checkpoints, &mut logger)?;

    Ok(RunOutcome {
        model: trainer.into_model(),
        summaries,
        start_epoch,
        run_dir: checkpoints.run_dir().to_path_buf(),
    })
}

fn check_dataset<B: AutodiffBackend>(
    config: &TrainingConfig,
    loaders: &DataLoaders<B>,
) -> Result<()> {
    let (expected, got) = (&config.data, &loaders.dataset);
    if expected.num_frames != got.num_frames
        || expected.num_joints != got.num_joints
        || expected.num_channels != got.num_channels
    {
        return Err(MiaError::invalid_config(format!(
            "loaders yield {}x{} joints / {} channels, run expects {}x{} / {}",
            got.num_frames,
            got.num_joints,
            got.num_channels,
            expected.num_frames,
            expected.num_joints,
            expected.num_channels
        )));
    }
    Ok(())
}
