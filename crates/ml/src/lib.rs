mod fallback;
mod preprocessor;
mod regressor;

#[cfg(feature = "burn-ml")]
mod burn_impl;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use expense_core::ModelInputRow;
use thiserror::Error;
use tracing::{info, warn};

pub use fallback::UnavailableModel;
pub use preprocessor::{CategoricalColumn, ColumnPreprocessor, HandleUnknown, NumericColumn};
pub use regressor::{RegressionTree, RegressorArtifact, TreeNode};

#[cfg(feature = "burn-ml")]
pub use burn_impl::BurnLinearRegressor;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("column `{0}` is not part of the input row")]
    UnknownColumn(String),
    #[error("column `{column}` expects a number, got `{value}`")]
    ExpectedNumber { column: String, value: String },
    #[error("found unknown category `{value}` in column `{column}`")]
    UnseenCategory { column: String, value: String },
    #[error("expected {expected} features, got {found}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error("model unavailable: {0}")]
    Unavailable(String),
    #[error("inference backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("transform failed: {0}")]
    Transform(#[source] InferenceError),
    #[error("predict failed: {0}")]
    Predict(#[source] InferenceError),
    #[error("model returned no output")]
    EmptyOutput,
    #[error("model returned a non-finite estimate ({0})")]
    NonFinite(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, InferenceError> {
        if values.len() != rows * cols {
            return Err(InferenceError::ShapeMismatch {
                expected: rows * cols,
                found: values.len(),
            });
        }
        Ok(Self { rows, cols, values })
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, InferenceError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let count = rows.len();
        let mut values = Vec::with_capacity(count * cols);
        for row in rows {
            if row.len() != cols {
                return Err(InferenceError::ShapeMismatch {
                    expected: cols,
                    found: row.len(),
                });
            }
            values.extend(row);
        }
        Self::new(count, cols, values)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        (index < self.rows).then(|| &self.values[index * self.cols..(index + 1) * self.cols])
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).filter_map(move |index| self.row(index))
    }
}

pub trait Preprocessor: Send + Sync {
    fn transform(&self, rows: &[ModelInputRow]) -> Result<FeatureMatrix, InferenceError>;
}

pub trait Regressor: Send + Sync {
    fn backend_name(&self) -> &'static str;
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, InferenceError>;
}

pub fn predict(
    row: &ModelInputRow,
    preprocessor: &dyn Preprocessor,
    regressor: &dyn Regressor,
) -> Result<f64, PredictionError> {
    let encoded = preprocessor
        .transform(std::slice::from_ref(row))
        .map_err(PredictionError::Transform)?;
    let output = regressor
        .predict(&encoded)
        .map_err(PredictionError::Predict)?;

    let estimate = output.first().copied().ok_or(PredictionError::EmptyOutput)?;
    if !estimate.is_finite() {
        return Err(PredictionError::NonFinite(estimate));
    }
    Ok(estimate)
}

#[derive(Clone)]
pub struct InferenceStack {
    pub preprocessor: Arc<dyn Preprocessor>,
    pub regressor: Arc<dyn Regressor>,
    pub load_error: Option<String>,
}

impl InferenceStack {
    pub fn new(preprocessor: Arc<dyn Preprocessor>, regressor: Arc<dyn Regressor>) -> Self {
        Self {
            preprocessor,
            regressor,
            load_error: None,
        }
    }

    pub fn load(preprocessor_path: impl AsRef<Path>, model_path: impl AsRef<Path>) -> Result<Self> {
        let preprocessor = ColumnPreprocessor::from_path(preprocessor_path)?;
        let artifact = RegressorArtifact::from_path(model_path)?;

        #[cfg(feature = "burn-ml")]
        {
            if let RegressorArtifact::Linear {
                intercept,
                coefficients,
            } = &artifact
            {
                let regressor = BurnLinearRegressor::new(*intercept, coefficients);
                return Ok(Self::new(Arc::new(preprocessor), Arc::new(regressor)));
            }
        }

        Ok(Self::new(Arc::new(preprocessor), Arc::new(artifact)))
    }

    pub fn load_or_unavailable(
        preprocessor_path: impl AsRef<Path>,
        model_path: impl AsRef<Path>,
    ) -> Self {
        match Self::load(preprocessor_path, model_path) {
            Ok(stack) => {
                info!(backend = stack.backend(), "model artifacts loaded");
                stack
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "model artifacts unavailable");
                Self::unavailable(format!("{err:#}"))
            }
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        let model = Arc::new(UnavailableModel::new(reason));
        Self {
            load_error: Some(model.reason().to_string()),
            preprocessor: model.clone(),
            regressor: model,
        }
    }

    pub fn is_available(&self) -> bool {
        self.load_error.is_none()
    }

    pub fn backend(&self) -> &'static str {
        self.regressor.backend_name()
    }

    pub fn predict(&self, row: &ModelInputRow) -> Result<f64, PredictionError> {
        predict(row, self.preprocessor.as_ref(), self.regressor.as_ref())
    }
}
