//! Epoch driver and training loop.

use std::marker::PhantomData;
use std::path::Path;

use burn::module::AutodiffModule;
use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use instant::Instant;

use super::checkpoint::{load_checkpoint, CheckpointSink};
use super::clip::clip_grad_norm;
use super::failure::{FailureAction, FailurePolicy};
use super::logger::TrainLogger;
use super::metrics::{PhaseSummary, PhaseTracker};
use super::optimizer::MultiStepLr;
use super::phase::Phase;
use super::pipeline::TrainPipeline;
use crate::config::TrainingConfig;
use crate::data::{BatchLoader, DataLoaders, EmgBatch};
use crate::error::{MiaError, Result};
use crate::loss::LossRecord;
use crate::nn::EmgRegressor;

/// Owns the model, optimizer and schedule, and drives phases and epochs.
///
/// Training phases run `M` on the autodiff backend and step the optimizer;
/// eval phases run `M::valid()` on the inner backend and never touch
/// parameters.
pub struct Trainer<B, M, O>
where
    B: AutodiffBackend,
{
    config: TrainingConfig,
    pipeline: TrainPipeline,
    model: M,
    optimizer: O,
    scheduler: MultiStepLr,
    failures: FailurePolicy,
    _backend: PhantomData<B>,
}

impl<B, M, O> Trainer<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + EmgRegressor<B>,
    M::InnerModule: EmgRegressor<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    /// Create a trainer starting from scratch.
    pub fn new(config: TrainingConfig, model: M, optimizer: O) -> Self {
        let pipeline = TrainPipeline::new(config.pipeline.clone(), config.loss.clone());
        let scheduler = MultiStepLr::from_config(&config);
        let failures = FailurePolicy::new(config.max_failures);

        Self {
            config,
            pipeline,
            model,
            optimizer,
            scheduler,
            failures,
            _backend: PhantomData,
        }
    }

    /// Restore model, optimizer and scheduler from a checkpoint directory.
    ///
    /// Returns the trainer and the epoch to continue from (stored epoch + 1).
    pub fn resume(self, dir: &Path, device: &B::Device) -> Result<(Self, usize)> {
        let (model, optimizer, metadata) =
            load_checkpoint::<B, M, O>(dir, self.model, self.optimizer, device)?;
        let start_epoch = metadata.resume_epoch();
        log::info!("Resuming from {:?} at epoch {}", dir, start_epoch);

        let trainer = Self {
            config: self.config,
            pipeline: self.pipeline,
            model,
            optimizer,
            scheduler: metadata.scheduler,
            failures: self.failures,
            _backend: PhantomData,
        };
        Ok((trainer, start_epoch))
    }

    /// Training configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// The model being trained.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Consume the trainer and return the model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Optimizer state.
    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    /// Learning-rate schedule.
    pub fn scheduler(&self) -> &MultiStepLr {
        &self.scheduler
    }

    /// Run every epoch from `start_epoch` to `num_epochs`.
    ///
    /// Each epoch trains on the shuffled loader, evaluates on the
    /// non-shuffled training loader, then checkpoints (except for runs named
    /// `dbg`).
    pub fn train_all_epochs(
        &mut self,
        start_epoch: usize,
        loaders: &mut DataLoaders<B>,
        checkpoints: &mut dyn CheckpointSink<B, M, O>,
        logger: &mut dyn TrainLogger,
    ) -> Result<Vec<PhaseSummary>> {
        logger.info("Start training loop...");
        let start = Instant::now();
        let mut summaries = Vec::new();

        for epoch in start_epoch..self.config.num_epochs {
            let reference = loaders.val_aug.len();
            summaries.push(self.run_phase(
                Phase::Train,
                epoch,
                loaders.train.as_mut(),
                reference,
                logger,
            )?);

            let reference = loaders.train_noshuffle.len();
            summaries.push(self.run_phase(
                Phase::Eval,
                epoch,
                loaders.train_noshuffle.as_mut(),
                reference,
                logger,
            )?);

            if self.config.writes_checkpoints() {
                checkpoints.save_epoch(
                    epoch,
                    &self.model,
                    &self.optimizer,
                    &self.scheduler,
                    &self.config,
                )?;
            }

            let improved = logger.epoch_finished(epoch);
            log::debug!("Epoch {} finished (improved: {})", epoch + 1, improved);
        }

        logger.info(&format!(
            "Total time: {:.3} hours",
            start.elapsed().as_secs_f64() / 3600.0
        ));
        Ok(summaries)
    }

    /// Drive one pass over `loader` for `phase`.
    ///
    /// `reference_len` is the length of the loader paired with this one in
    /// the epoch; it only feeds the global step numbering.
    pub fn run_phase(
        &mut self,
        phase: Phase,
        epoch: usize,
        loader: &mut dyn BatchLoader<B>,
        reference_len: usize,
        logger: &mut dyn TrainLogger,
    ) -> Result<PhaseSummary> {
        let header = format!("Epoch (1-based): {} / {}", epoch + 1, self.config.num_epochs);
        logger.info(&"=".repeat(header.len()));
        logger.info(&header);
        if phase.is_train() {
            logger.info(&format!("===> Train ({})", phase));
            logger.report_scalar("train/learn_rate", self.scheduler.current_lr(), epoch);
        } else {
            logger.info(&format!("===> Validation ({})", phase));
        }

        self.pipeline.set_phase(phase);
        self.failures.reset();

        let loader_len = loader.len();
        let mut total_step_base = (loader_len + reference_len) * epoch;
        if !phase.is_train() {
            total_step_base += loader_len;
        }

        let eval_model = (!phase.is_train()).then(|| self.model.valid());
        let mut tracker = PhaseTracker::new(phase, epoch);
        let mut truncated = false;
        let start = Instant::now();

        for (cur_step, item) in loader.iter().enumerate() {
            if cur_step == 0 {
                logger.info(&format!(
                    "Enter first data loader iteration took {:.3}s",
                    start.elapsed().as_secs_f64()
                ));
            }
            let total_step = total_step_base + cur_step;

            let result = match (item, &eval_model) {
                (Err(e), _) => Err(e),
                (Ok(batch), Some(model)) => {
                    self.eval_step(model, batch.inner(), cur_step, total_step, logger)
                }
                (Ok(batch), None) => self.train_step(batch, cur_step, total_step, logger),
            };

            match result {
                Ok(total) => {
                    tracker.add(total);
                    log::debug!(
                        "[{}] step {}: total {:.6} (smoothed {:.6})",
                        phase,
                        total_step,
                        total,
                        tracker.smoothed()
                    );
                }
                Err(error) => match self.failures.record(error) {
                    FailureAction::Skip(error) => {
                        logger.exception(
                            &error,
                            &format!("[{}] step {} (global {})", phase, cur_step, total_step),
                        );
                        continue;
                    }
                    FailureAction::Abort(error) => {
                        logger.exception(
                            &error,
                            &format!(
                                "[{}] {} batch failures, aborting",
                                phase,
                                self.failures.failures()
                            ),
                        );
                        return Err(error);
                    }
                },
            }

            if self.config.is_debug() && cur_step >= self.config.debug_step_limit {
                logger.warning("Cutting epoch short for debugging...");
                truncated = true;
                break;
            }
        }

        if phase.is_train() {
            self.scheduler.step();
        }

        let summary = tracker.finish(self.failures.failures(), truncated);
        logger.info(&format!(
            "[{}] epoch {}: {} batches, {} failures, mean total {:.6}",
            phase,
            epoch + 1,
            summary.batches,
            summary.failures,
            summary.mean_loss
        ));
        Ok(summary)
    }

    fn train_step(
        &mut self,
        batch: EmgBatch<B>,
        step: usize,
        total_step: usize,
        logger: &mut dyn TrainLogger,
    ) -> Result<f32> {
        let (total, value) = batch_loss(
            &self.pipeline,
            &self.model,
            &batch,
            self.config.exclude.as_deref(),
            step,
            total_step,
            logger,
        )?;

        let grads = total.backward();
        let mut grads = GradientsParams::from_grads(grads, &self.model);
        let max_norm = self.config.optimizer.gradient_clip;
        if max_norm > 0.0 {
            let (clipped, norm) = clip_grad_norm::<B, M>(&self.model, grads, max_norm);
            if norm > max_norm {
                log::debug!("step {}: grad norm {:.4} clipped to {}", step, norm, max_norm);
            }
            grads = clipped;
        }
        self.model = self
            .optimizer
            .step(self.scheduler.current_lr(), self.model.clone(), grads);

        Ok(value)
    }

    fn eval_step(
        &self,
        model: &M::InnerModule,
        batch: EmgBatch<B::InnerBackend>,
        step: usize,
        total_step: usize,
        logger: &mut dyn TrainLogger,
    ) -> Result<f32> {
        let (_, value) = batch_loss(
            &self.pipeline,
            model,
            &batch,
            self.config.exclude.as_deref(),
            step,
            total_step,
            logger,
        )?;
        Ok(value)
    }
}

/// Forward, finalize and report one batch; returns the total and its value.
fn batch_loss<B: Backend, M: EmgRegressor<B>>(
    pipeline: &TrainPipeline,
    model: &M,
    batch: &EmgBatch<B>,
    exclude: Option<&str>,
    step: usize,
    total_step: usize,
    logger: &mut dyn TrainLogger,
) -> Result<(Tensor<B, 1>, f32)> {
    let (output, preliminary) = pipeline.forward(model, batch, step, total_step)?;
    let record =
        pipeline.finalize_batch_loss(batch, &output, preliminary, exclude, step, total_step)?;

    let total = record
        .total()
        .cloned()
        .ok_or_else(|| MiaError::TrainingError {
            message: format!("loss record has no '{}' component", LossRecord::<B>::TOTAL),
        })?;
    let value: f32 = total.clone().into_scalar().elem();
    if !value.is_finite() {
        return Err(MiaError::NonFiniteLoss {
            value,
            step: total_step,
        });
    }

    let phase = pipeline.phase();
    for (name, scalar) in record.scalars() {
        logger.report_scalar(&format!("{}/{}", phase, name), scalar as f64, total_step);
    }

    Ok((total, value))
}
