//! CSV loading into a [`Dataset`]

use ndarray::Array2;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::dataset::Dataset;
use crate::error::{KnnCvError, Result};

/// A dataset together with the names it was loaded under
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    /// Feature column names, in matrix column order
    pub feature_names: Vec<String>,
    /// Original target value of each class index
    pub class_names: Vec<String>,
}

/// Builds a [`Dataset`] from tabular files
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    target_column: String,
    nominal_columns: Vec<String>,
    feature_columns: Option<Vec<String>>,
}

impl DatasetLoader {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            nominal_columns: Vec::new(),
            feature_columns: None,
        }
    }

    /// Columns compared by category instead of numeric difference
    pub fn with_nominal_columns(mut self, columns: Vec<String>) -> Self {
        self.nominal_columns = columns;
        self
    }

    /// Restrict features to these columns (default: every non-target column)
    pub fn with_feature_columns(mut self, columns: Vec<String>) -> Self {
        self.feature_columns = Some(columns);
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<LoadedDataset> {
        let path = path.as_ref();
        let start = Instant::now();
        let file = File::open(path)?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file)
            .finish()?;

        let loaded = self.load_dataframe(&df)?;
        info!(
            path = %path.display(),
            rows = loaded.dataset.n_rows(),
            features = loaded.dataset.n_cols(),
            classes = loaded.dataset.n_classes(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );
        Ok(loaded)
    }

    /// Convert a DataFrame, rejecting text and missing feature cells
    pub fn load_dataframe(&self, df: &DataFrame) -> Result<LoadedDataset> {
        let feature_names: Vec<String> = match &self.feature_columns {
            Some(cols) => cols.clone(),
            None => df
                .get_column_names()
                .into_iter()
                .filter(|name| name.as_str() != self.target_column)
                .map(|s| s.to_string())
                .collect(),
        };

        if let Some(unknown) = self
            .nominal_columns
            .iter()
            .find(|c| !feature_names.contains(*c))
        {
            return Err(KnnCvError::DataError(format!(
                "nominal column '{}' is not a feature column",
                unknown
            )));
        }

        let target = df
            .column(&self.target_column)
            .map_err(|_| KnnCvError::DataError(format!("target column '{}' not found", self.target_column)))?;
        let (labels, class_names) = encode_target(target)?;

        let instances = columns_to_array2(df, &feature_names)?;
        let numeric = feature_names
            .iter()
            .map(|name| !self.nominal_columns.contains(name))
            .collect();

        Ok(LoadedDataset {
            dataset: Dataset::new(instances, labels, numeric)?,
            feature_names,
            class_names,
        })
    }
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
    )
}

/// Extract feature columns into a row-major matrix.
///
/// Any text column or missing cell fails with [`KnnCvError::NonNumeric`].
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .enumerate()
        .map(|(column, name)| {
            let series = df
                .column(name)
                .map_err(|_| KnnCvError::DataError(format!("feature column '{}' not found", name)))?;

            if matches!(series.dtype(), DataType::String) {
                return parse_text_column(series.str()?, column);
            }
            if !is_numeric_dtype(series.dtype()) {
                return Err(KnnCvError::NonNumeric {
                    row: 0,
                    column,
                    value: series.dtype().to_string(),
                });
            }

            let series_f64 = series.cast(&DataType::Float64)?;
            series_f64
                .f64()?
                .into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.ok_or_else(|| KnnCvError::NonNumeric {
                        row,
                        column,
                        value: "null".to_string(),
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, col_names.len()), |(r, c)| col_refs[c][r]))
}

/// A text column is accepted only if every cell still reads as a number
fn parse_text_column(ca: &StringChunked, column: usize) -> Result<Vec<f64>> {
    ca.into_iter()
        .enumerate()
        .map(|(row, cell)| {
            let raw = cell.unwrap_or("null").trim();
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| KnnCvError::NonNumeric {
                    row,
                    column,
                    value: raw.to_string(),
                })
        })
        .collect()
}

/// Map target values to class indices `0..C` in sorted order of the
/// distinct values.
fn encode_target(column: &Column) -> Result<(Vec<usize>, Vec<String>)> {
    if column.null_count() > 0 {
        return Err(KnnCvError::DataError(format!(
            "target column '{}' contains missing values",
            column.name()
        )));
    }

    if matches!(column.dtype(), DataType::String) {
        let values: Vec<String> = column
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();
        let mut index: BTreeMap<String, usize> = values.iter().map(|v| (v.clone(), 0)).collect();
        for (i, slot) in index.values_mut().enumerate() {
            *slot = i;
        }
        let labels = values.iter().map(|v| index[v]).collect();
        let class_names = index.into_keys().collect();
        return Ok((labels, class_names));
    }

    let cast = column.cast(&DataType::Float64)?;
    let values: Vec<f64> = cast.f64()?.into_iter().flatten().collect();
    let mut classes = values.clone();
    classes.sort_by(f64::total_cmp);
    classes.dedup();

    let labels = values
        .iter()
        .map(|v| classes.partition_point(|c| c < v))
        .collect();
    let class_names = classes.iter().map(|c| c.to_string()).collect();
    Ok((labels, class_names))
}
