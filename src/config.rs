//! Evaluator configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{KnnCvError, Result};

/// Relative tolerance used when comparing distances and nominal values
pub const DEFAULT_FUZZ: f64 = 1e-4;

/// Hard ceiling on neighbor buffer slots (k + ties + fence)
pub const DEFAULT_MAX_TIES: usize = 1000;

/// Sentinel distance larger than any real distance, kept finite so that
/// the fuzz multiplication cannot overflow to infinity
pub const DEFAULT_DISTANCE_CEILING: f64 = 0.99 * f64::MAX;

/// Configuration for leave-one-out kNN evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnnCvConfig {
    /// Number of neighbors (k)
    pub n_neighbors: usize,

    /// Relative tolerance for distance ties and nominal equality
    pub fuzz: f64,

    /// Neighbor buffer capacity; exceeding it fails the evaluation
    pub max_ties: usize,

    /// Initial value of empty neighbor slots
    pub distance_ceiling: f64,

    /// Seed for the default random source
    pub random_state: Option<u64>,
}

impl Default for KnnCvConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            fuzz: DEFAULT_FUZZ,
            max_ties: DEFAULT_MAX_TIES,
            distance_ceiling: DEFAULT_DISTANCE_CEILING,
            random_state: None,
        }
    }
}

impl KnnCvConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with default config and specified k
    pub fn with_k(k: usize) -> Self {
        Self {
            n_neighbors: k,
            ..Default::default()
        }
    }

    /// Set number of neighbors
    pub fn with_n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = k;
        self
    }

    /// Set the tie tolerance
    pub fn with_fuzz(mut self, fuzz: f64) -> Self {
        self.fuzz = fuzz;
        self
    }

    /// Set the neighbor buffer capacity
    pub fn with_max_ties(mut self, max_ties: usize) -> Self {
        self.max_ties = max_ties;
        self
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Check that the configuration can drive an evaluation
    pub fn validate(&self) -> Result<()> {
        if self.n_neighbors == 0 {
            return Err(KnnCvError::invalid_parameter(
                "n_neighbors",
                self.n_neighbors,
                "must be at least 1",
            ));
        }
        if !self.fuzz.is_finite() || self.fuzz < 0.0 {
            return Err(KnnCvError::invalid_parameter(
                "fuzz",
                self.fuzz,
                "must be a finite non-negative number",
            ));
        }
        // k slots, the fence, and at least one slot of headroom before failure
        if self.n_neighbors + 2 > self.max_ties {
            return Err(KnnCvError::invalid_parameter(
                "max_ties",
                self.max_ties,
                &format!("must be at least n_neighbors + 2 ({})", self.n_neighbors + 2),
            ));
        }
        if self.distance_ceiling.is_nan() || self.distance_ceiling <= 0.0 {
            return Err(KnnCvError::invalid_parameter(
                "distance_ceiling",
                self.distance_ceiling,
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Parse a configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
