use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{FeatureMatrix, InferenceError, Regressor};

// Leaves have no children. Samples go left when x[feature] <= threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub feature: usize,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub left: Option<usize>,
    #[serde(default)]
    pub right: Option<usize>,
    #[serde(default)]
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn check(&self) -> Result<(), InferenceError> {
        if self.nodes.is_empty() {
            return Err(InferenceError::InvalidArtifact("empty tree".to_string()));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match (node.left, node.right) {
                (None, None) => {}
                (Some(left), Some(right)) => {
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(InferenceError::InvalidArtifact(format!(
                                "node {idx} points at invalid child {child}"
                            )));
                        }
                    }
                }
                _ => {
                    return Err(InferenceError::InvalidArtifact(format!(
                        "node {idx} has a single child"
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, features: &[f64]) -> Result<f64, InferenceError> {
        let mut idx = 0;
        loop {
            let node = self.nodes.get(idx).ok_or_else(|| {
                InferenceError::InvalidArtifact(format!("missing tree node {idx}"))
            })?;

            let (Some(left), Some(right)) = (node.left, node.right) else {
                return Ok(node.value);
            };

            let value = features.get(node.feature).copied().ok_or(
                InferenceError::ShapeMismatch {
                    expected: node.feature + 1,
                    found: features.len(),
                },
            )?;
            idx = if value <= node.threshold { left } else { right };
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressorArtifact {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Forest { trees: Vec<RegressionTree> },
    Boosted {
        base_score: f64,
        learning_rate: f64,
        trees: Vec<RegressionTree>,
    },
}

impl RegressorArtifact {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed reading model at {}", path.as_ref().display()))?;
        let artifact: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid model artifact {}", path.as_ref().display()))?;
        artifact.check()?;
        Ok(artifact)
    }

    pub fn check(&self) -> Result<(), InferenceError> {
        match self {
            Self::Linear { coefficients, .. } if coefficients.is_empty() => Err(
                InferenceError::InvalidArtifact("linear model has no coefficients".to_string()),
            ),
            Self::Linear { .. } => Ok(()),
            Self::Forest { trees } | Self::Boosted { trees, .. } => {
                if trees.is_empty() {
                    return Err(InferenceError::InvalidArtifact(
                        "ensemble has no trees".to_string(),
                    ));
                }
                trees.iter().try_for_each(RegressionTree::check)
            }
        }
    }

    fn predict_one(&self, features: &[f64]) -> Result<f64, InferenceError> {
        match self {
            Self::Linear {
                intercept,
                coefficients,
            } => {
                if features.len() != coefficients.len() {
                    return Err(InferenceError::ShapeMismatch {
                        expected: coefficients.len(),
                        found: features.len(),
                    });
                }
                Ok(intercept
                    + coefficients
                        .iter()
                        .zip(features)
                        .map(|(weight, value)| weight * value)
                        .sum::<f64>())
            }
            Self::Forest { trees } => {
                let mut total = 0.0;
                for tree in trees {
                    total += tree.evaluate(features)?;
                }
                Ok(total / trees.len() as f64)
            }
            Self::Boosted {
                base_score,
                learning_rate,
                trees,
            } => {
                let mut total = *base_score;
                for tree in trees {
                    total += learning_rate * tree.evaluate(features)?;
                }
                Ok(total)
            }
        }
    }
}

impl Regressor for RegressorArtifact {
    fn backend_name(&self) -> &'static str {
        match self {
            Self::Linear { .. } => "linear",
            Self::Forest { .. } => "forest",
            Self::Boosted { .. } => "boosted-trees",
        }
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        features
            .iter_rows()
            .map(|row| self.predict_one(row))
            .collect()
    }
}
