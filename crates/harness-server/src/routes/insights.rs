use axum::extract::{Query, State};
use axum::Json;
use harness_core::insights::InsightsReport;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/insights: static insights only.
pub async fn get_insights(State(app): State<AppState>) -> Result<Json<InsightsReport>, AppError> {
    let analyzer = app.load_analyzer().await?;
    Ok(Json(analyzer.insights(chrono::Utc::now(), false).await))
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    #[serde(default = "default_narrative")]
    narrative: bool,
}

fn default_narrative() -> bool {
    true
}

impl Default for GenerateQuery {
    fn default() -> Self {
        Self {
            narrative: default_narrative(),
        }
    }
}

/// POST /api/insights[?narrative=false]: regenerate insights and, unless
/// disabled, ask the configured narrative command for a summary.
pub async fn generate_insights(
    State(app): State<AppState>,
    Query(query): Query<GenerateQuery>,
) -> Result<Json<InsightsReport>, AppError> {
    let analyzer = app.load_analyzer().await?;
    let report = analyzer
        .insights(chrono::Utc::now(), query.narrative)
        .await;
    if query.narrative && !report.narrative.available {
        tracing::info!(
            reason = report.narrative.message.as_deref().unwrap_or(""),
            "narrative unavailable"
        );
    }
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::fixture;

    #[tokio::test]
    async fn get_never_narrates() {
        let (_dir, app) = fixture::project();
        let Json(report) = get_insights(State(app)).await.unwrap();
        assert!(!report.narrative.available);
        assert_eq!(report.narrative.message.as_deref(), Some("narrative not requested"));
    }

    #[tokio::test]
    async fn post_without_narrative_command_is_unavailable() {
        let (_dir, app) = fixture::project();
        let Json(report) = generate_insights(State(app), Query(GenerateQuery::default()))
            .await
            .unwrap();
        assert!(!report.narrative.available);
        assert!(report.narrative.message.is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn post_with_narrative_command_returns_text() {
        let (dir, app) = fixture::project();
        fixture::write(
            dir.path(),
            ".claude/harness.yaml",
            "memory_service:\n  enabled: false\nnarrative:\n  command: cat\n",
        );

        let Json(report) = generate_insights(State(app), Query(GenerateQuery::default()))
            .await
            .unwrap();
        assert!(report.narrative.available);
        assert!(report.narrative.text.unwrap().contains("Health score"));
    }
}
