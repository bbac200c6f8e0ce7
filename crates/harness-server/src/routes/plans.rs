use axum::extract::{Query, State};
use axum::Json;
use harness_core::plans::KanbanBoard;
use harness_core::types::WorkflowMode;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PlansQuery {
    #[serde(default)]
    mode: Option<String>,
}

/// GET /api/plans?mode=solo|2agent: the task board.
///
/// An unrecognized mode falls back to solo; an absent one uses the
/// configured default. Format problems travel in the board's `error` field.
pub async fn get_plans(
    State(app): State<AppState>,
    Query(query): Query<PlansQuery>,
) -> Result<Json<KanbanBoard>, AppError> {
    let mode = query
        .mode
        .as_deref()
        .map(|m| WorkflowMode::from_param(Some(m)));
    let board = tokio::task::spawn_blocking(move || {
        let analyzer = app.analyzer()?;
        analyzer.plans(mode)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(board))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::fixture;
    use harness_core::types::TaskStatus;

    fn query(mode: Option<&str>) -> Query<PlansQuery> {
        Query(PlansQuery {
            mode: mode.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn missing_plans_file_reports_not_found() {
        let (_dir, app) = fixture::project();
        let Json(board) = get_plans(State(app), query(None)).await.unwrap();
        assert_eq!(board.task_count(), 0);
        assert!(board.error.is_some());
    }

    #[tokio::test]
    async fn two_agent_mode_buckets_requested_as_plan() {
        let (dir, app) = fixture::project();
        fixture::write(
            dir.path(),
            "Plans.md",
            "## Tasks\n- [ ] Ship login `pm:requested`\n- [ ] Fix bug `cc:WIP`\n",
        );

        let Json(board) = get_plans(State(app), query(Some("2agent"))).await.unwrap();
        assert_eq!(board.mode, WorkflowMode::TwoAgent);
        assert_eq!(board.bucket(TaskStatus::Plan).len(), 1);
        assert_eq!(board.bucket(TaskStatus::Work).len(), 1);
    }

    #[tokio::test]
    async fn unknown_mode_falls_back_to_solo() {
        let (_dir, app) = fixture::project();
        let Json(board) = get_plans(State(app), query(Some("trio"))).await.unwrap();
        assert_eq!(board.mode, WorkflowMode::Solo);
    }
}
