//! Per-component analysis reports. Unlike `/api/health` these surface a
//! component failure as an error response.

use axum::extract::State;
use axum::Json;
use harness_core::analyzer::{HooksReport, NotesReport, RulesReport, SkillsReport};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/skills
pub async fn get_skills(State(app): State<AppState>) -> Result<Json<SkillsReport>, AppError> {
    let analyzer = app.load_analyzer().await?;
    Ok(Json(analyzer.skills(chrono::Utc::now()).await?))
}

/// GET /api/memory: notes under `.claude/memory`.
pub async fn get_memory(State(app): State<AppState>) -> Result<Json<NotesReport>, AppError> {
    let analyzer = app.load_analyzer().await?;
    Ok(Json(analyzer.notes().await?))
}

/// GET /api/rules
pub async fn get_rules(State(app): State<AppState>) -> Result<Json<RulesReport>, AppError> {
    let analyzer = app.load_analyzer().await?;
    Ok(Json(analyzer.rules().await?))
}

/// GET /api/hooks
pub async fn get_hooks(State(app): State<AppState>) -> Result<Json<HooksReport>, AppError> {
    let analyzer = app.load_analyzer().await?;
    Ok(Json(analyzer.hooks().await?))
}
