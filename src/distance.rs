//! Mixed numeric/nominal distance
//!
//! Numeric columns contribute their squared difference, nominal columns
//! contribute 1 on a mismatch. Columns outside the feature mask are ignored.

use crate::dataset::Dataset;
use crate::mask::FeatureMask;

/// Whether two encoded nominal values are the same category.
///
/// The tolerance is `fuzz` relative to the larger magnitude, with the scale
/// floored at 1. Codes of magnitude below 1 are therefore compared with an
/// absolute tolerance of `fuzz`: `0.0` and `0.00005` are the same category
/// at the default fuzz. Without the floor a zero code would only ever match
/// an exact zero.
#[inline]
pub fn approx_eq(a: f64, b: f64, fuzz: f64) -> bool {
    (a - b).abs() <= fuzz * a.abs().max(b.abs()).max(1.0)
}

/// Distance function bound to one dataset and one feature mask
#[derive(Debug, Clone)]
pub struct MixedDistance<'a> {
    dataset: &'a Dataset,
    /// Selected columns with their numeric flag
    columns: Vec<(usize, bool)>,
    fuzz: f64,
}

impl<'a> MixedDistance<'a> {
    /// Bind the distance to a dataset and mask.
    ///
    /// The mask length must already have been checked against the dataset.
    pub fn new(dataset: &'a Dataset, mask: &FeatureMask, fuzz: f64) -> Self {
        let columns = mask
            .selected_indices()
            .into_iter()
            .map(|c| (c, dataset.is_numeric(c)))
            .collect();
        Self {
            dataset,
            columns,
            fuzz,
        }
    }

    /// Dissimilarity between rows `query` and `candidate`
    pub fn between(&self, query: usize, candidate: usize) -> f64 {
        let a = self.dataset.row(query);
        let b = self.dataset.row(candidate);
        self.columns
            .iter()
            .map(|&(c, numeric)| {
                let (x, y) = (a[c], b[c]);
                if numeric {
                    let d = x - y;
                    d * d
                } else if approx_eq(x, y, self.fuzz) {
                    0.0
                } else {
                    1.0
                }
            })
            .sum()
    }

    /// Number of columns taking part in the distance
    pub fn n_active(&self) -> usize {
        self.columns.len()
    }
}
