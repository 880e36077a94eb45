use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use expense_core::{FeatureValue, ModelInputRow, MODEL_INPUT_COLUMNS};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{FeatureMatrix, InferenceError, Preprocessor};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub column: String,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "unit_scale")]
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub column: String,
    #[serde(deserialize_with = "categories_as_text")]
    pub categories: Vec<String>,
}

fn unit_scale() -> f64 {
    1.0
}

fn categories_as_text<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer)?
        .into_iter()
        .map(|value| match value {
            Value::String(text) => Ok(text),
            Value::Number(number) => number
                .as_f64()
                .map(|number| FeatureValue::Number(number).to_string())
                .ok_or_else(|| D::Error::custom("category is not a finite number")),
            other => Err(D::Error::custom(format!("unsupported category {other}"))),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnPreprocessor {
    #[serde(default)]
    pub numeric: Vec<NumericColumn>,
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

impl ColumnPreprocessor {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("failed reading preprocessor at {}", path.as_ref().display())
        })?;
        let preprocessor: Self = serde_json::from_str(&raw).with_context(|| {
            format!("invalid preprocessor artifact {}", path.as_ref().display())
        })?;
        preprocessor.check()?;
        Ok(preprocessor)
    }

    pub fn check(&self) -> Result<(), InferenceError> {
        let columns = self
            .numeric
            .iter()
            .map(|spec| spec.column.as_str())
            .chain(self.categorical.iter().map(|spec| spec.column.as_str()));

        for column in columns {
            if !MODEL_INPUT_COLUMNS.contains(&column) {
                return Err(InferenceError::UnknownColumn(column.to_string()));
            }
        }

        if self.width() == 0 {
            return Err(InferenceError::InvalidArtifact(
                "preprocessor produces no features".to_string(),
            ));
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|spec| spec.categories.len())
                .sum::<usize>()
    }

    fn encode(&self, row: &ModelInputRow, out: &mut Vec<f64>) -> Result<(), InferenceError> {
        for spec in &self.numeric {
            let value = match lookup(row, &spec.column)? {
                FeatureValue::Number(number) => number,
                text @ FeatureValue::Text(_) => {
                    return Err(InferenceError::ExpectedNumber {
                        column: spec.column.clone(),
                        value: text.to_string(),
                    })
                }
            };
            let scale = if spec.scale == 0.0 { 1.0 } else { spec.scale };
            out.push((value - spec.mean) / scale);
        }

        for spec in &self.categorical {
            let value = lookup(row, &spec.column)?.to_string();
            let hit = spec.categories.iter().position(|category| *category == value);
            if hit.is_none() && self.handle_unknown == HandleUnknown::Error {
                return Err(InferenceError::UnseenCategory {
                    column: spec.column.clone(),
                    value,
                });
            }
            out.extend((0..spec.categories.len()).map(|idx| {
                if Some(idx) == hit {
                    1.0
                } else {
                    0.0
                }
            }));
        }

        Ok(())
    }
}

fn lookup<'a>(row: &'a ModelInputRow, column: &str) -> Result<FeatureValue<'a>, InferenceError> {
    row.value(column)
        .ok_or_else(|| InferenceError::UnknownColumn(column.to_string()))
}

impl Preprocessor for ColumnPreprocessor {
    fn transform(&self, rows: &[ModelInputRow]) -> Result<FeatureMatrix, InferenceError> {
        let width = self.width();
        let mut values = Vec::with_capacity(rows.len() * width);
        for row in rows {
            self.encode(row, &mut values)?;
        }
        FeatureMatrix::new(rows.len(), width, values)
    }
}
