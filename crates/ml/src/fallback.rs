use expense_core::ModelInputRow;

use crate::{FeatureMatrix, InferenceError, Preprocessor, Regressor};

#[derive(Debug, Clone)]
pub struct UnavailableModel {
    reason: String,
}

impl UnavailableModel {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Preprocessor for UnavailableModel {
    fn transform(&self, _rows: &[ModelInputRow]) -> Result<FeatureMatrix, InferenceError> {
        Err(InferenceError::Unavailable(self.reason.clone()))
    }
}

impl Regressor for UnavailableModel {
    fn backend_name(&self) -> &'static str {
        "unavailable"
    }

    fn predict(&self, _features: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        Err(InferenceError::Unavailable(self.reason.clone()))
    }
}
