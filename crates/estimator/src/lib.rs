pub mod config;

use std::sync::Arc;
use std::time::Instant;

use expense_core::{
    build_input_row, load_catalog, validate, CatalogLoad, EstimateResponse, FormBounds,
    FormSchema, RawSelection, ReferenceCatalog, RowBuildError, ValidationError,
};
use expense_ml::{InferenceStack, PredictionError};
use expense_observability::AppMetrics;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub use config::EstimatorConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmissionFailure {
    #[error(transparent)]
    RowBuild(#[from] RowBuildError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EstimateOutcome {
    Rejected(ValidationError),
    Failed(SubmissionFailure),
    Succeeded { estimate: f64, clamped: bool },
}

impl EstimateOutcome {
    pub fn into_response(self) -> EstimateResponse {
        match self {
            Self::Rejected(err) => EstimateResponse::Incomplete {
                incomplete_fields: err.fields(),
                message: err.user_message(),
            },
            Self::Failed(err) => EstimateResponse::error(format!("Prediction failed: {err}")),
            Self::Succeeded { estimate, .. } => EstimateResponse::estimate(estimate),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    #[serde(flatten)]
    pub schema: FormSchema,
    pub warnings: Vec<String>,
}

#[derive(Clone)]
pub struct ExpenseEstimator {
    catalog: ReferenceCatalog,
    catalog_warnings: Vec<String>,
    inference: InferenceStack,
    bounds: FormBounds,
    enforce_bounds: bool,
    metrics: Arc<AppMetrics>,
}

impl ExpenseEstimator {
    pub fn new(
        catalog_load: CatalogLoad,
        inference: InferenceStack,
        bounds: FormBounds,
        enforce_bounds: bool,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            catalog_warnings: catalog_load.warnings(),
            catalog: catalog_load.catalog,
            inference,
            bounds,
            enforce_bounds,
            metrics,
        }
    }

    pub fn load(config: &EstimatorConfig, metrics: Arc<AppMetrics>) -> Self {
        let catalog_load = load_catalog(&config.flights_csv, &config.hotels_csv);
        let inference =
            InferenceStack::load_or_unavailable(&config.preprocessor_path, &config.model_path);

        info!(
            flights = %config.flights_csv.display(),
            hotels = %config.hotels_csv.display(),
            backend = inference.backend(),
            enforce_bounds = config.enforce_bounds,
            "expense estimator ready"
        );

        Self::new(
            catalog_load,
            inference,
            config.bounds,
            config.enforce_bounds,
            metrics,
        )
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn catalog_warnings(&self) -> &[String] {
        &self.catalog_warnings
    }

    pub fn model_available(&self) -> bool {
        self.inference.is_available()
    }

    pub fn model_error(&self) -> Option<&str> {
        self.inference.load_error.as_deref()
    }

    pub fn backend(&self) -> &'static str {
        self.inference.backend()
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    pub fn form(&self) -> FormView {
        FormView {
            schema: FormSchema::new(&self.catalog, self.bounds),
            warnings: self.catalog_warnings.clone(),
        }
    }

    #[instrument(skip(self, raw), fields(submission_id = %Uuid::new_v4()))]
    pub fn submit(&self, raw: RawSelection) -> EstimateOutcome {
        let started = Instant::now();
        self.metrics.inc_submission();

        let outcome = self.run(raw);
        match &outcome {
            EstimateOutcome::Rejected(err) => {
                self.metrics.inc_rejected();
                warn!(error = %err, "submission rejected");
            }
            EstimateOutcome::Failed(err) => {
                self.metrics.inc_failed();
                error!(error = %err, "prediction failed");
            }
            EstimateOutcome::Succeeded { estimate, clamped } => {
                self.metrics.inc_succeeded();
                if *clamped {
                    self.metrics.inc_clamped();
                }
                info!(estimate = *estimate, clamped = *clamped, "estimate produced");
            }
        }

        self.metrics.observe_latency(started.elapsed());
        outcome
    }

    fn run(&self, raw: RawSelection) -> EstimateOutcome {
        let selection = match validate(raw) {
            Ok(selection) => selection,
            Err(err) => return EstimateOutcome::Rejected(err),
        };
        if self.enforce_bounds {
            if let Err(err) = self.bounds.check(&selection) {
                return EstimateOutcome::Rejected(err);
            }
        }

        let row = match build_input_row(&selection) {
            Ok(row) => row,
            Err(err) => return EstimateOutcome::Failed(err.into()),
        };

        match self.inference.predict(&row) {
            Ok(estimate) if estimate < 0.0 => {
                warn!(raw_estimate = estimate, "negative estimate clamped to zero");
                EstimateOutcome::Succeeded {
                    estimate: 0.0,
                    clamped: true,
                }
            }
            Ok(estimate) => EstimateOutcome::Succeeded {
                estimate,
                clamped: false,
            },
            Err(err) => EstimateOutcome::Failed(err.into()),
        }
    }
}
