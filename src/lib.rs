//! knn_cv - Leave-one-out kNN accuracy as a feature-selection fitness
//!
//! Given a labeled dataset and a boolean mask over its columns, computes the
//! leave-one-out classification accuracy of a k-nearest-neighbor classifier.
//! Meant to be called many times with different masks from a feature
//! selection or hyperparameter search loop.
//!
//! # Modules
//!
//! - [`dataset`] - Read-only dataset view (matrix, labels, numeric flags)
//! - [`mask`] - Feature masks
//! - [`distance`] - Mixed numeric/nominal distance
//! - [`neighbors`] - Bounded nearest-neighbor buffer with tie extension
//! - [`vote`] - Majority vote with reservoir-sampled tie breaking
//! - [`evaluator`] - Leave-one-out evaluation
//! - [`loader`] - CSV loading
//! - [`config`] - Evaluator configuration
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```
//! use knn_cv::prelude::*;
//! use ndarray::array;
//!
//! let dataset = Dataset::new(
//!     array![[0.0], [0.1], [5.0], [5.1]],
//!     vec![0, 0, 1, 1],
//!     vec![true],
//! ).unwrap();
//!
//! let mut knn = KnnCv::new(dataset, KnnCvConfig::with_k(1).with_random_state(42)).unwrap();
//! assert_eq!(knn.fitness_for(&FeatureMask::all(1)).unwrap(), 1.0);
//! ```

pub mod error;
pub mod config;

// Core
pub mod dataset;
pub mod mask;
pub mod distance;
pub mod neighbors;
pub mod vote;
pub mod evaluator;

// Data and tooling
pub mod loader;
pub mod cli;

pub use error::{KnnCvError, Result, TOO_MANY_TIES_SENTINEL};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::KnnCvConfig;
    pub use crate::dataset::Dataset;
    pub use crate::error::{KnnCvError, Result, TOO_MANY_TIES_SENTINEL};
    pub use crate::evaluator::{
        evaluate_masks_parallel, leave_one_out_accuracy, leave_one_out_predictions, KnnCv,
    };
    pub use crate::loader::{DatasetLoader, LoadedDataset};
    pub use crate::mask::FeatureMask;
    pub use crate::vote::UniformSource;
}
