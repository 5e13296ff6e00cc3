//! Run logging and metric tracking.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use crate::config::TrainingConfig;
use crate::error::{MiaError, Result};

/// Sink for training logs and scalar metrics.
pub trait TrainLogger {
    /// Informational message.
    fn info(&mut self, message: &str);

    /// Recoverable problem.
    fn warning(&mut self, message: &str);

    /// An error, with what was being done when it happened.
    fn exception(&mut self, error: &MiaError, context: &str);

    /// Record a scalar metric such as `train/mse`.
    fn report_scalar(&mut self, key: &str, value: f64, step: usize);

    /// Called once per finished epoch. The return value is informational.
    fn epoch_finished(&mut self, epoch: usize) -> bool;

    /// Start tracking a run.
    fn init_tracking(&mut self, group: &str, config: &TrainingConfig) -> Result<()>;
}

/// [`TrainLogger`] backed by the `log` facade.
///
/// Keeps running sums for the current epoch, logs per-epoch means, and writes
/// a `run.json` description into the run directory when tracking starts.
/// Per-step history is only retained after [`with_history`](Self::with_history).
#[derive(Debug, Default)]
pub struct RunLogger {
    run_dir: Option<PathBuf>,
    epoch_sums: BTreeMap<String, (f64, usize)>,
    history: Option<BTreeMap<String, Vec<(usize, f64)>>>,
    best_eval: Option<f64>,
    epochs: usize,
}

impl RunLogger {
    /// Metric whose per-epoch mean decides whether an epoch improved.
    pub const MONITORED: &'static str = "eval/total";

    /// Logger with no run directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger that writes run metadata into `run_dir`.
    pub fn with_run_dir(run_dir: impl Into<PathBuf>) -> Self {
        Self {
            run_dir: Some(run_dir.into()),
            ..Self::default()
        }
    }

    /// Also retain every reported `(step, value)` pair.
    pub fn with_history(mut self) -> Self {
        self.history.get_or_insert_with(BTreeMap::new);
        self
    }

    /// Every `(step, value)` reported for `key`, empty unless history is kept.
    pub fn history(&self, key: &str) -> &[(usize, f64)] {
        self.history
            .as_ref()
            .and_then(|history| history.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of epochs reported finished.
    pub fn epochs_finished(&self) -> usize {
        self.epochs
    }

    fn epoch_means(&self) -> Vec<(String, f64)> {
        self.epoch_sums
            .iter()
            .map(|(key, (sum, count))| (key.clone(), sum / *count as f64))
            .collect()
    }
}

impl TrainLogger for RunLogger {
    fn info(&mut self, message: &str) {
        log::info!("{}", message);
    }

    fn warning(&mut self, message: &str) {
        log::warn!("{}", message);
    }

    fn exception(&mut self, error: &MiaError, context: &str) {
        log::error!("{}: {}", context, error);
    }

    fn report_scalar(&mut self, key: &str, value: f64, step: usize) {
        log::debug!("{} = {:.6} @ {}", key, value, step);
        let entry = self.epoch_sums.entry(key.to_string()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
        if let Some(history) = &mut self.history {
            history.entry(key.to_string()).or_default().push((step, value));
        }
    }

    fn epoch_finished(&mut self, epoch: usize) -> bool {
        let means = self.epoch_means();
        for (key, mean) in &means {
            log::info!("Epoch {} {}: {:.6}", epoch + 1, key, mean);
        }

        let improved = match means.iter().find(|(k, _)| k == Self::MONITORED) {
            Some(&(_, mean)) if self.best_eval.map_or(true, |best| mean < best) => {
                self.best_eval = Some(mean);
                true
            }
            _ => false,
        };

        self.epoch_sums.clear();
        self.epochs += 1;
        improved
    }

    fn init_tracking(&mut self, group: &str, config: &TrainingConfig) -> Result<()> {
        log::info!("Tracking run '{}' in group '{}'", config.name, group);

        if let Some(dir) = &self.run_dir {
            fs::create_dir_all(dir)?;
            let writer = BufWriter::new(File::create(dir.join("run.json"))?);
            let run = serde_json::json!({
                "name": config.name,
                "group": group,
                "config": config,
            });
            serde_json::to_writer_pretty(writer, &run)?;
        }
        Ok(())
    }
}
