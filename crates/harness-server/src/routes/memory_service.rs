use axum::extract::{Query, State};
use axum::Json;
use harness_core::config::HarnessConfig;
use harness_core::memory_service::{service_status, ServiceStatus};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ObservationsQuery {
    #[serde(default)]
    limit: Option<usize>,
}

/// GET /api/memory-service?limit=N: whether the memory service is enabled
/// and reachable, plus its recent observations when it is.
pub async fn get_memory_service(
    State(app): State<AppState>,
    Query(query): Query<ObservationsQuery>,
) -> Result<Json<ServiceStatus>, AppError> {
    let root = app.root.clone();
    let config = tokio::task::spawn_blocking(move || HarnessConfig::load(&root))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(service_status(&config.memory_service, query.limit).await))
}
