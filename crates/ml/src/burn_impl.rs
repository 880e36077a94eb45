use burn::tensor::{Tensor, TensorData};
use burn_ndarray::{NdArray, NdArrayDevice};

use crate::{FeatureMatrix, InferenceError, Regressor};

type Backend = NdArray<f32>;

#[derive(Debug, Clone)]
pub struct BurnLinearRegressor {
    intercept: f32,
    coefficients: Vec<f32>,
    device: NdArrayDevice,
}

impl BurnLinearRegressor {
    pub fn new(intercept: f64, coefficients: &[f64]) -> Self {
        Self {
            intercept: intercept as f32,
            coefficients: coefficients.iter().map(|value| *value as f32).collect(),
            device: NdArrayDevice::default(),
        }
    }
}

impl Regressor for BurnLinearRegressor {
    fn backend_name(&self) -> &'static str {
        "burn-ndarray-linear"
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        if features.cols() != self.coefficients.len() {
            return Err(InferenceError::ShapeMismatch {
                expected: self.coefficients.len(),
                found: features.cols(),
            });
        }

        let inputs = features
            .values()
            .iter()
            .map(|value| *value as f32)
            .collect::<Vec<_>>();
        let x = Tensor::<Backend, 2>::from_data(
            TensorData::new(inputs, [features.rows(), features.cols()]),
            &self.device,
        );
        let weights = Tensor::<Backend, 2>::from_data(
            TensorData::new(self.coefficients.clone(), [self.coefficients.len(), 1]),
            &self.device,
        );

        x.matmul(weights)
            .add_scalar(self.intercept)
            .into_data()
            .to_vec::<f32>()
            .map(|values| values.into_iter().map(f64::from).collect())
            .map_err(|err| InferenceError::Backend(format!("{err:?}")))
    }
}
