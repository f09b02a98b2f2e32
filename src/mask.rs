//! Feature masks
//!
//! A boolean selector over dataset columns, supplied per evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{KnnCvError, Result};

/// Boolean selector over dataset columns
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureMask(Vec<bool>);

impl FeatureMask {
    pub fn from_bools(selected: Vec<bool>) -> Self {
        Self(selected)
    }

    /// Mask selecting every column
    pub fn all(n_cols: usize) -> Self {
        Self(vec![true; n_cols])
    }

    /// Mask selecting no column
    pub fn none(n_cols: usize) -> Self {
        Self(vec![false; n_cols])
    }

    /// Mask selecting only the given column indices
    pub fn from_indices(n_cols: usize, indices: &[usize]) -> Result<Self> {
        let mut selected = vec![false; n_cols];
        for &idx in indices {
            let slot = selected.get_mut(idx).ok_or_else(|| {
                KnnCvError::invalid_parameter("feature index", idx, &format!("must be below {}", n_cols))
            })?;
            *slot = true;
        }
        Ok(Self(selected))
    }

    /// Mask from integer flags, where any non-zero value selects the column
    pub fn from_flags(flags: &[i64]) -> Self {
        Self(flags.iter().map(|&f| f != 0).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn is_selected(&self, column: usize) -> bool {
        self.0[column]
    }

    /// Number of selected columns
    pub fn count_selected(&self) -> usize {
        self.0.iter().filter(|&&s| s).count()
    }

    /// Indices of the selected columns, ascending
    pub fn selected_indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &s)| s.then_some(i))
            .collect()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Reject a mask whose length differs from the column count
    pub fn check_len(&self, n_cols: usize) -> Result<()> {
        if self.0.len() != n_cols {
            return Err(KnnCvError::InvalidMask {
                expected: n_cols,
                actual: self.0.len(),
            });
        }
        Ok(())
    }
}

impl From<Vec<bool>> for FeatureMask {
    fn from(selected: Vec<bool>) -> Self {
        Self(selected)
    }
}

impl FromStr for FeatureMask {
    type Err = KnnCvError;

    /// Parse a bit string such as `"1011"`
    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .chars()
            .map(|c| match c {
                '1' => Ok(true),
                '0' => Ok(false),
                other => Err(KnnCvError::invalid_parameter(
                    "mask",
                    other,
                    "bit strings may only contain '0' and '1'",
                )),
            })
            .collect::<Result<Vec<bool>>>()
            .map(Self)
    }
}

impl fmt::Display for FeatureMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &s in &self.0 {
            f.write_str(if s { "1" } else { "0" })?;
        }
        Ok(())
    }
}
