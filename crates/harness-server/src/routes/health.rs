use axum::extract::State;
use axum::Json;
use harness_core::health::HealthReport;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/health: score, status, breakdown and suggestions.
///
/// A failing component shows up in `degraded` rather than as an error
/// response.
pub async fn get_health(State(app): State<AppState>) -> Result<Json<HealthReport>, AppError> {
    let analyzer = app.load_analyzer().await?;
    Ok(Json(analyzer.analyze_health(chrono::Utc::now()).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::fixture;
    use harness_core::types::HealthStatus;

    #[tokio::test]
    async fn empty_project_scores_seventy() {
        let (_dir, app) = fixture::project();
        let Json(report) = get_health(State(app)).await.unwrap();
        assert_eq!(report.score, 70);
        assert_eq!(report.status, HealthStatus::Warning);
        assert!(report.degraded.is_empty());
    }

    #[tokio::test]
    async fn malformed_config_is_an_error() {
        let (dir, app) = fixture::project();
        fixture::write(dir.path(), ".claude/harness.yaml", "usage: [1, 2]\n");
        assert!(get_health(State(app)).await.is_err());
    }
}
