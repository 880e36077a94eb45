use std::env;

use anyhow::{Context, Result};
use expense_api::build_app;
use expense_estimator::EstimatorConfig;
use expense_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("expense_api");

    let config = EstimatorConfig::from_env();
    let bind = env::var("EXPENSE_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_app(&config);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(bind = %bind, "travel expense api started");

    axum::serve(listener, app).await?;
    Ok(())
}
