use axum::extract::State;
use axum::Json;
use harness_core::config::HarnessConfig;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config: the effective `.claude/harness.yaml` (defaults filled
/// in) alongside its validation warnings. Read-only.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let config = HarnessConfig::load(&root)?;
        let warnings = config.validate();
        let json = serde_json::json!({
            "config": serde_json::to_value(&config)?,
            "warnings": serde_json::to_value(&warnings)?,
        });
        Ok::<_, harness_core::HarnessError>(json)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
