use axum::extract::State;
use axum::Json;
use harness_core::usage::UsageReport;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/usage: usage snapshot, stale-item cleanup candidates and top-N
/// rankings. No snapshot yields `available: false` with a message.
pub async fn get_usage(State(app): State<AppState>) -> Result<Json<UsageReport>, AppError> {
    let report = tokio::task::spawn_blocking(move || {
        let analyzer = app.analyzer()?;
        Ok::<_, harness_core::HarnessError>(analyzer.usage(chrono::Utc::now()))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(report))
}
