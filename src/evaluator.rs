//! Leave-one-out kNN evaluation
//!
//! Classifies every row using all other rows as references and reduces the
//! predictions to an accuracy in `[0, 1]`.

use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::KnnCvConfig;
use crate::dataset::Dataset;
use crate::distance::MixedDistance;
use crate::error::{KnnCvError, Result, TOO_MANY_TIES_SENTINEL};
use crate::mask::FeatureMask;
use crate::neighbors::{collect_neighbors, NeighborBuffer};
use crate::vote::{UniformSource, VoteTally};

/// Leave-one-out prediction for every row under the given feature mask.
///
/// When k is at least the number of rows it is clamped to `n - 1`, so every
/// other row becomes a neighbor.
pub fn leave_one_out_predictions<S: UniformSource + ?Sized>(
    dataset: &Dataset,
    mask: &FeatureMask,
    config: &KnnCvConfig,
    source: &mut S,
) -> Result<Vec<usize>> {
    mask.check_len(dataset.n_cols())?;
    config.validate()?;

    let n_rows = dataset.n_rows();
    let k = config.n_neighbors.min(n_rows - 1);
    debug!(
        n_rows,
        k,
        n_selected = mask.count_selected(),
        "Evaluating feature mask"
    );

    let distance = MixedDistance::new(dataset, mask, config.fuzz);
    let mut buffer = NeighborBuffer::new(k, config.max_ties, config.distance_ceiling, config.fuzz);
    let mut tally = VoteTally::new(dataset.n_classes());
    let mut predictions = Vec::with_capacity(n_rows);

    for query in 0..n_rows {
        if let Err(e) = collect_neighbors(&distance, query, n_rows, &mut buffer) {
            warn!(query, mask = %mask, error = %e, "Leave-one-out evaluation aborted");
            return Err(e);
        }

        tally.reset();
        for row in buffer.voters() {
            tally.add(dataset.label(row));
        }
        predictions.push(tally.resolve(source));
    }

    Ok(predictions)
}

/// Leave-one-out accuracy: the fraction of rows whose prediction matches
/// their own label.
pub fn leave_one_out_accuracy<S: UniformSource + ?Sized>(
    dataset: &Dataset,
    mask: &FeatureMask,
    config: &KnnCvConfig,
    source: &mut S,
) -> Result<f64> {
    let predictions = leave_one_out_predictions(dataset, mask, config, source)?;
    let correct = predictions
        .iter()
        .zip(dataset.labels())
        .filter(|(p, y)| p == y)
        .count();
    Ok(correct as f64 / dataset.n_rows() as f64)
}

/// Evaluate many masks concurrently.
///
/// The dataset is shared read-only; each mask gets its own buffers and its
/// own ChaCha8 stream seeded with `base_seed + index`, so results do not
/// depend on scheduling. Results come back in mask order.
pub fn evaluate_masks_parallel(
    dataset: &Dataset,
    config: &KnnCvConfig,
    masks: &[FeatureMask],
    base_seed: u64,
) -> Vec<Result<f64>> {
    masks
        .par_iter()
        .enumerate()
        .map(|(i, mask)| {
            let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(i as u64));
            leave_one_out_accuracy(dataset, mask, config, &mut rng)
        })
        .collect()
}

/// Leave-one-out kNN classifier used as a feature-mask fitness function
#[derive(Debug, Clone)]
pub struct KnnCv<R = ChaCha8Rng> {
    dataset: Arc<Dataset>,
    config: KnnCvConfig,
    source: R,
}

impl KnnCv<ChaCha8Rng> {
    /// Create a classifier with a ChaCha8 source, seeded from
    /// `config.random_state` or from entropy when no seed is set.
    pub fn new(dataset: impl Into<Arc<Dataset>>, config: KnnCvConfig) -> Result<Self> {
        let rng = match config.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_source(dataset, config, rng)
    }
}

impl<R: UniformSource> KnnCv<R> {
    /// Create a classifier drawing tie-breaks from `source`
    pub fn with_source(
        dataset: impl Into<Arc<Dataset>>,
        config: KnnCvConfig,
        source: R,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dataset: dataset.into(),
            config,
            source,
        })
    }

    /// Build the dataset and classifier in one step
    pub fn construct(
        instances: Array2<f64>,
        labels: Vec<usize>,
        numeric: Vec<bool>,
        k: usize,
        source: R,
    ) -> Result<Self> {
        let dataset = Dataset::new(instances, labels, numeric)?;
        Self::with_source(dataset, KnnCvConfig::with_k(k), source)
    }

    /// Leave-one-out accuracy for a feature mask
    pub fn fitness_for(&mut self, mask: &FeatureMask) -> Result<f64> {
        leave_one_out_accuracy(&self.dataset, mask, &self.config, &mut self.source)
    }

    /// Like [`fitness_for`](Self::fitness_for), but a mask with too many ties
    /// scores [`TOO_MANY_TIES_SENTINEL`] instead of failing.
    pub fn fitness_or_sentinel(&mut self, mask: &FeatureMask) -> Result<f64> {
        match self.fitness_for(mask) {
            Err(KnnCvError::TooManyTies { .. }) => Ok(TOO_MANY_TIES_SENTINEL),
            other => other,
        }
    }

    /// Leave-one-out prediction for every row
    pub fn predict_all(&mut self, mask: &FeatureMask) -> Result<Vec<usize>> {
        leave_one_out_predictions(&self.dataset, mask, &self.config, &mut self.source)
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn config(&self) -> &KnnCvConfig {
        &self.config
    }
}
