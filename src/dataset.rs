//! Read-only dataset view
//!
//! Owns the instance matrix, the class label of every row and the
//! numeric/nominal flag of every column. Built once and shared by every
//! evaluation; there is no mutation API.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{KnnCvError, Result};

/// Immutable labeled dataset with per-column numeric/nominal flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    instances: Array2<f64>,
    labels: Vec<usize>,
    numeric: Vec<bool>,
    n_classes: usize,
}

impl Dataset {
    /// Build a dataset from a row-major matrix.
    ///
    /// Fails if the matrix has no cells or fewer than two rows, if any value
    /// is not a finite number, if `labels`/`numeric` do not match the matrix
    /// dimensions, or if a label falls outside `0..C` where `C` is the
    /// number of distinct labels.
    pub fn new(instances: Array2<f64>, labels: Vec<usize>, numeric: Vec<bool>) -> Result<Self> {
        let (n_rows, n_cols) = instances.dim();
        if n_rows == 0 || n_cols == 0 {
            return Err(KnnCvError::EmptyDataset);
        }
        if n_rows < 2 {
            return Err(KnnCvError::TooFewRows { rows: n_rows });
        }
        if labels.len() != n_rows {
            return Err(KnnCvError::LabelCountMismatch {
                expected: n_rows,
                actual: labels.len(),
            });
        }
        if numeric.len() != n_cols {
            return Err(KnnCvError::NumericMaskMismatch {
                expected: n_cols,
                actual: numeric.len(),
            });
        }

        for ((row, column), &value) in instances.indexed_iter() {
            if !value.is_finite() {
                return Err(KnnCvError::NonNumeric {
                    row,
                    column,
                    value: value.to_string(),
                });
            }
        }

        let n_classes = labels.iter().collect::<BTreeSet<_>>().len();
        if let Some((row, &label)) = labels.iter().enumerate().find(|(_, &l)| l >= n_classes) {
            return Err(KnnCvError::LabelOutOfRange {
                row,
                label,
                n_classes,
            });
        }

        Ok(Self {
            instances,
            labels,
            numeric,
            n_classes,
        })
    }

    /// Build a dataset from nested rows, rejecting ragged input
    pub fn from_rows(rows: &[Vec<f64>], labels: Vec<usize>, numeric: Vec<bool>) -> Result<Self> {
        let n_cols = check_rectangular(rows)?;
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let instances = Array2::from_shape_vec((rows.len(), n_cols), flat)?;
        Self::new(instances, labels, numeric)
    }

    /// Build a dataset from raw text cells.
    ///
    /// Every cell must parse as a finite real number; the first one that
    /// does not is reported with its position.
    pub fn from_str_rows<S: AsRef<str>>(
        rows: &[Vec<S>],
        labels: Vec<usize>,
        numeric: Vec<bool>,
    ) -> Result<Self> {
        let n_cols = check_rectangular(rows)?;
        let mut flat = Vec::with_capacity(rows.len() * n_cols);
        for (row, cells) in rows.iter().enumerate() {
            for (column, cell) in cells.iter().enumerate() {
                let raw = cell.as_ref().trim();
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| KnnCvError::NonNumeric {
                        row,
                        column,
                        value: raw.to_string(),
                    })?;
                flat.push(value);
            }
        }
        let instances = Array2::from_shape_vec((rows.len(), n_cols), flat)?;
        Self::new(instances, labels, numeric)
    }

    /// Number of rows (n)
    pub fn n_rows(&self) -> usize {
        self.instances.nrows()
    }

    /// Number of columns (p)
    pub fn n_cols(&self) -> usize {
        self.instances.ncols()
    }

    /// Number of distinct classes (C)
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Value at `(row, column)`
    #[inline]
    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.instances[[row, column]]
    }

    /// View of a single row
    pub fn row(&self, row: usize) -> ArrayView1<'_, f64> {
        self.instances.row(row)
    }

    /// Class label of a row
    #[inline]
    pub fn label(&self, row: usize) -> usize {
        self.labels[row]
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Whether a column is numeric (true) or nominal (false)
    #[inline]
    pub fn is_numeric(&self, column: usize) -> bool {
        self.numeric[column]
    }

    pub fn numeric_flags(&self) -> &[bool] {
        &self.numeric
    }

    pub fn instances(&self) -> &Array2<f64> {
        &self.instances
    }
}

fn check_rectangular<T>(rows: &[Vec<T>]) -> Result<usize> {
    let n_cols = match rows.first() {
        Some(first) if !first.is_empty() => first.len(),
        _ => return Err(KnnCvError::EmptyDataset),
    };
    if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
        return Err(KnnCvError::RaggedRow {
            row,
            expected: n_cols,
            actual: cells.len(),
        });
    }
    Ok(n_cols)
}
