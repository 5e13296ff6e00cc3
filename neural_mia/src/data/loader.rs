//! Batch loaders.

use std::sync::Arc;

use burn::prelude::*;

use super::batch::{EmgBatch, EmgSample};
use crate::config::DatasetConfig;
use crate::error::Result;

/// Source of batches for one pass over a split.
///
/// `len` is known before iteration so step numbers stay continuous across
/// phases. A batch that fails to load is yielded as an `Err` and counts as a
/// batch failure.
pub trait BatchLoader<B: Backend> {
    /// Number of batches a pass yields.
    fn len(&self) -> usize;

    /// Whether a pass yields no batches.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a new pass.
    fn iter(&mut self) -> Box<dyn Iterator<Item = Result<EmgBatch<B>>> + '_>;
}

/// Loader over samples held in memory.
///
/// With shuffling enabled every pass draws a new permutation from a seeded
/// LCG, so runs are reproducible.
pub struct InMemoryLoader<B: Backend> {
    samples: Arc<Vec<EmgSample>>,
    config: DatasetConfig,
    device: B::Device,
    batch_size: usize,
    shuffle: bool,
    seed: u64,
    pass: u64,
}

impl<B: Backend> InMemoryLoader<B> {
    /// Create a loader over shared samples.
    pub fn new(
        samples: Arc<Vec<EmgSample>>,
        config: DatasetConfig,
        shuffle: bool,
        device: &B::Device,
    ) -> Self {
        Self {
            samples,
            batch_size: config.batch_size.max(1),
            seed: config.seed,
            config,
            device: device.clone(),
            shuffle,
            pass: 0,
        }
    }

    /// Number of samples.
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    fn next_order(&mut self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.samples.len()).collect();
        if self.shuffle {
            let mut state = self
                .seed
                .wrapping_add(self.pass.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            for i in (1..order.len()).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                let j = ((state >> 33) as usize) % (i + 1);
                order.swap(i, j);
            }
        }
        self.pass += 1;
        order
    }
}

impl<B: Backend> BatchLoader<B> for InMemoryLoader<B> {
    fn len(&self) -> usize {
        self.samples.len().div_ceil(self.batch_size)
    }

    fn iter(&mut self) -> Box<dyn Iterator<Item = Result<EmgBatch<B>>> + '_> {
        let order = self.next_order();
        let num_batches = self.len();
        let batch_size = self.batch_size;
        let samples = &self.samples;
        let config = &self.config;
        let device = &self.device;

        Box::new((0..num_batches).map(move |i| {
            let start = i * batch_size;
            let end = (start + batch_size).min(order.len());
            let chunk: Vec<&EmgSample> = order[start..end].iter().map(|&k| &samples[k]).collect();
            EmgBatch::collate(&chunk, config, device)
        }))
    }
}

/// The four loaders a training run consumes.
pub struct DataLoaders<B: Backend> {
    /// Shuffled training split.
    pub train: Box<dyn BatchLoader<B>>,
    /// Training split in stable order, used for eval-mode monitoring.
    pub train_noshuffle: Box<dyn BatchLoader<B>>,
    /// Augmented validation split, paired with the training phase.
    pub val_aug: Box<dyn BatchLoader<B>>,
    /// Unaugmented validation split.
    pub val_noaug: Box<dyn BatchLoader<B>>,
    /// Shape of the records every loader yields.
    pub dataset: DatasetConfig,
}

impl<B: Backend> DataLoaders<B> {
    /// Build in-memory loaders over pre-split samples.
    pub fn in_memory(
        train: Vec<EmgSample>,
        val: Vec<EmgSample>,
        dataset: DatasetConfig,
        device: &B::Device,
    ) -> Self {
        let train = Arc::new(train);
        let val = Arc::new(val);
        log::info!(
            "Loaders: {} train / {} val sequences, batch size {}",
            train.len(),
            val.len(),
            dataset.batch_size
        );

        Self {
            train: Box::new(InMemoryLoader::new(train.clone(), dataset.clone(), true, device)),
            train_noshuffle: Box::new(InMemoryLoader::new(train, dataset.clone(), false, device)),
            val_aug: Box::new(InMemoryLoader::new(val.clone(), dataset.clone(), true, device)),
            val_noaug: Box::new(InMemoryLoader::new(val, dataset.clone(), false, device)),
            dataset,
        }
    }
}
