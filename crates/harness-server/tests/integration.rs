use axum::http::StatusCode;
use http_body_util::BodyExt;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A project with one of each artifact and the memory service disabled.
fn init_project(dir: &TempDir) {
    let root = dir.path();
    write(root, ".claude/harness.yaml", "memory_service:\n  enabled: false\n");
    write(
        root,
        "skills/impl/SKILL.md",
        "---\nname: impl\ndescription: Implement the next task\n---\nSteps...\n",
    );
    write(root, ".claude/memory/decisions.md", "# Decisions\nKeep the API JSON only.\n");
    write(root, ".claude/rules/style.md", "Prefer small functions.\n");
    write(
        root,
        "hooks/hooks.json",
        r#"{"hooks": {"Stop": [{"hooks": [{"type": "command", "command": "./notify.sh"}]}]}}"#,
    );
    write(
        root,
        "Plans.md",
        "# Sprint\n\n## Plan\n- [ ] Draft schema 🔴\n\n## Work\n- [ ] Wire routes `cc:WIP`\n\n## Done\n- [x] Scaffold\n",
    );
}

fn app(dir: &TempDir) -> axum::Router {
    harness_server::build_router(dir.path().to_path_buf())
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri).await
}

async fn send(app: axum::Router, method: &str, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_of_complete_project_is_perfect() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let (status, body) = get(app(&dir), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 100);
    assert_eq!(body["status"], "good");
    assert_eq!(body["breakdown"]["hooks"]["count"], 1);
    assert!(body["totalInitialLoadTokens"].as_u64().unwrap() > 0);
    assert_eq!(body["degraded"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn health_of_empty_project_suggests_fixes() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/harness.yaml", "memory_service:\n  enabled: false\n");

    let (status, body) = get(app(&dir), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 70);
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn malformed_config_is_unprocessable() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/harness.yaml", "thresholds: nope\n");

    let (status, body) = get(app(&dir), "/api/health").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[tokio::test]
async fn plans_board_is_bucketed() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let (status, body) = get(app(&dir), "/api/plans").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "solo");
    assert_eq!(body["plan"][0]["title"], "Draft schema");
    assert_eq!(body["plan"][0]["priority"], "high");
    assert_eq!(body["work"].as_array().unwrap().len(), 1);
    assert_eq!(body["done"].as_array().unwrap().len(), 1);
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn plans_with_garbage_mode_still_answers() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let (status, body) = get(app(&dir), "/api/plans?mode=committee").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "solo");
}

#[tokio::test]
async fn plans_without_board_carries_error_message() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), ".claude/harness.yaml", "memory_service:\n  enabled: false\n");

    let (status, body) = get(app(&dir), "/api/plans?mode=2agent").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "2agent");
    assert!(body["error"].is_string());
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[tokio::test]
async fn component_endpoints_report_each_artifact() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let (status, skills) = get(app(&dir), "/api/skills").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(skills["skills"][0]["name"], "impl/SKILL");

    let (_, memory) = get(app(&dir), "/api/memory").await;
    assert_eq!(memory["files"].as_array().unwrap().len(), 1);
    assert_eq!(memory["initialLoadTokens"], 0);

    let (_, rules) = get(app(&dir), "/api/rules").await;
    assert_eq!(rules["rules"][0]["name"], "style");

    let (_, hooks) = get(app(&dir), "/api/hooks").await;
    assert_eq!(hooks["hooks"][0]["type"], "Stop");
    assert_eq!(hooks["count"], 1);
}

// ---------------------------------------------------------------------------
// Usage, insights, config
// ---------------------------------------------------------------------------

#[tokio::test]
async fn usage_without_snapshot_is_unavailable() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let (status, body) = get(app(&dir), "/api/usage").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn insights_get_and_post() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let (status, body) = get(app(&dir), "/api/insights").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["insights"].is_array());
    assert!(body["generatedAt"].is_string());
    assert_eq!(body["narrative"]["available"], false);

    let (status, body) = send(app(&dir), "POST", "/api/insights?narrative=false").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["narrative"]["available"], false);
}

#[tokio::test]
async fn config_shows_effective_values() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let (status, body) = get(app(&dir), "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["usage"]["staleness_days"], 30);
    assert_eq!(body["config"]["plans"]["mode"], "solo");
}

#[tokio::test]
async fn memory_service_status_when_disabled() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let (status, body) = get(app(&dir), "/api/memory-service?limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], false);
    assert_eq!(body["available"], false);
    assert_eq!(body["url"], "http://127.0.0.1:37777");
    assert!(body["message"].is_string());
    assert!(body.get("observations").is_none());
}

#[tokio::test]
async fn unknown_route_is_404() {
    let dir = TempDir::new().unwrap();
    let (status, _) = get(app(&dir), "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
