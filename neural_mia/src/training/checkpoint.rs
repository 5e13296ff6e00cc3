//! Checkpoint save/load functionality for training state.
//!
//! A checkpoint is a directory holding:
//! - `metadata.json`: format version, epoch, scheduler state and every config
//! - `model.mpk`: model record
//! - `optimizer.mpk`: optimizer record
//!
//! Each epoch is written to `checkpoint_{epoch}/` and mirrored to `latest/`
//! under the run directory `<checkpoint_root>/<name>/`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use burn::module::{AutodiffModule, Module};
use burn::optim::Optimizer;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use super::optimizer::MultiStepLr;
use crate::config::{DatasetConfig, ModelConfig, TrainingConfig};
use crate::error::{MiaError, Result};

/// Current checkpoint format version.
pub const CHECKPOINT_VERSION: u32 = 1;

const METADATA_FILE: &str = "metadata.json";
const MODEL_FILE: &str = "model.mpk";
const OPTIMIZER_FILE: &str = "optimizer.mpk";

/// Everything in a checkpoint except the tensor records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Checkpoint version for compatibility.
    pub version: u32,
    /// Epoch that just finished.
    pub epoch: usize,
    /// Learning-rate scheduler state.
    pub scheduler: MultiStepLr,
    /// Full training configuration.
    pub training: TrainingConfig,
    /// Dataset configuration.
    pub dataset: DatasetConfig,
    /// Model construction configuration.
    pub model: ModelConfig,
}

impl CheckpointMetadata {
    /// Metadata for the end of `epoch`.
    pub fn new(epoch: usize, scheduler: &MultiStepLr, config: &TrainingConfig) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            epoch,
            scheduler: scheduler.clone(),
            training: config.clone(),
            dataset: config.data.clone(),
            model: config.model.clone(),
        }
    }

    /// Epoch training resumes at.
    pub fn resume_epoch(&self) -> usize {
        self.epoch + 1
    }
}

/// Receives the training state at the end of every epoch.
pub trait CheckpointSink<B: AutodiffBackend, M, O> {
    /// Persist the state after `epoch`.
    fn save_epoch(
        &mut self,
        epoch: usize,
        model: &M,
        optimizer: &O,
        scheduler: &MultiStepLr,
        config: &TrainingConfig,
    ) -> Result<()>;
}

/// Writes epoch checkpoints under one run directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    run_dir: PathBuf,
}

impl CheckpointManager {
    /// Manage checkpoints in `run_dir`.
    pub fn new(run_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_dir: run_dir.into(),
        }
    }

    /// Manager for `<checkpoint_root>/<name>`.
    pub fn for_run(config: &TrainingConfig) -> Self {
        Self::new(Path::new(&config.checkpoint_root).join(&config.name))
    }

    /// The run directory.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Directory of the checkpoint written after `epoch`.
    pub fn epoch_dir(&self, epoch: usize) -> PathBuf {
        self.run_dir.join(format!("checkpoint_{}", epoch))
    }

    /// Directory mirroring the most recent checkpoint.
    pub fn latest_dir(&self) -> PathBuf {
        self.run_dir.join("latest")
    }
}

impl<B, M, O> CheckpointSink<B, M, O> for CheckpointManager
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    fn save_epoch(
        &mut self,
        epoch: usize,
        model: &M,
        optimizer: &O,
        scheduler: &MultiStepLr,
        config: &TrainingConfig,
    ) -> Result<()> {
        let metadata = CheckpointMetadata::new(epoch, scheduler, config);
        save_checkpoint::<B, M, O>(&self.epoch_dir(epoch), &metadata, model, optimizer)?;
        save_checkpoint::<B, M, O>(&self.latest_dir(), &metadata, model, optimizer)
    }
}

/// Save a checkpoint to a directory.
pub fn save_checkpoint<B, M, O>(
    dir: &Path,
    metadata: &CheckpointMetadata,
    model: &M,
    optimizer: &O,
) -> Result<()>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    fs::create_dir_all(dir)?;

    let writer = BufWriter::new(File::create(dir.join(METADATA_FILE))?);
    serde_json::to_writer_pretty(writer, metadata)?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(dir.join(MODEL_FILE), &recorder)
        .map_err(|e| MiaError::checkpoint(format!("saving model to {:?}: {:?}", dir, e)))?;
    Recorder::<B>::record(&recorder, optimizer.to_record(), dir.join(OPTIMIZER_FILE))
        .map_err(|e| MiaError::checkpoint(format!("saving optimizer to {:?}: {:?}", dir, e)))?;

    log::info!("Saved checkpoint to {:?} (epoch {})", dir, metadata.epoch);
    Ok(())
}

/// Read only the metadata of a checkpoint.
pub fn read_metadata(dir: &Path) -> Result<CheckpointMetadata> {
    let reader = BufReader::new(File::open(dir.join(METADATA_FILE))?);
    let metadata: CheckpointMetadata = serde_json::from_reader(reader)?;

    if metadata.version != CHECKPOINT_VERSION {
        return Err(MiaError::checkpoint(format!(
            "unsupported checkpoint version {} in {:?}",
            metadata.version, dir
        )));
    }
    Ok(metadata)
}

/// Restore model and optimizer state from a checkpoint directory.
///
/// `model` and `optimizer` must have the architecture stored in the
/// checkpoint; their current state is replaced.
pub fn load_checkpoint<B, M, O>(
    dir: &Path,
    model: M,
    optimizer: O,
    device: &B::Device,
) -> Result<(M, O, CheckpointMetadata)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    let metadata = read_metadata(dir)?;
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

    let model = model
        .load_file(dir.join(MODEL_FILE), &recorder, device)
        .map_err(|e| MiaError::checkpoint(format!("loading model from {:?}: {:?}", dir, e)))?;
    let record = Recorder::<B>::load(&recorder, dir.join(OPTIMIZER_FILE), device)
        .map_err(|e| MiaError::checkpoint(format!("loading optimizer from {:?}: {:?}", dir, e)))?;
    let optimizer = optimizer.load_record(record);

    log::info!("Loaded checkpoint from {:?} (epoch {})", dir, metadata.epoch);
    Ok((model, optimizer, metadata))
}

/// Check if a complete checkpoint exists at the given path.
pub fn checkpoint_exists(dir: &Path) -> bool {
    dir.join(METADATA_FILE).exists()
        && dir.join(MODEL_FILE).exists()
        && dir.join(OPTIMIZER_FILE).exists()
}

/// Get the latest checkpoint from a series of numbered checkpoints.
///
/// Looks for directories named `checkpoint_N` where N is an epoch number.
pub fn find_latest_checkpoint(run_dir: &Path) -> Option<PathBuf> {
    let mut latest: Option<(usize, PathBuf)> = None;

    for entry in fs::read_dir(run_dir).ok()?.flatten() {
        let path = entry.path();
        let epoch = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("checkpoint_"))
            .and_then(|e| e.parse::<usize>().ok());

        if let Some(epoch) = epoch {
            let newer = latest.as_ref().map_or(true, |(best, _)| epoch > *best);
            if newer && checkpoint_exists(&path) {
                latest = Some((epoch, path));
            }
        }
    }

    latest.map(|(_, path)| path)
}
