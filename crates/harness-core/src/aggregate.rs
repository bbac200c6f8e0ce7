//! The analysis orchestrator.
//!
//! [`Analyzer`] owns the collaborators (artifact source, tokenizer, memory
//! service) and is the only place that fans work out to them. The four
//! artifact analyses run concurrently; one failing never sinks the others.

use crate::analyzer::{
    analyze_hooks, analyze_notes, analyze_rules, analyze_skills, HooksReport, NotesReport,
    RulesReport, SkillsReport,
};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::health::{evaluate, HealthMetrics, HealthReport, HealthThresholds};
use crate::insights::{
    generate_narrative, narrative_prompt, static_insights, InsightInputs, InsightsReport, Narrative,
};
use crate::memory_service::{MemoryServiceClient, Observation};
use crate::plans::{locate_and_parse, KanbanBoard};
use crate::source::{ArtifactSource, FsSource};
use crate::tokens::{BpeTokenizer, Tokenizer};
use crate::types::{Component, WorkflowMode};
use crate::usage::{usage_report, UsageReport};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The four reports of one analysis pass. A degraded component holds its
/// default report.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub skills: SkillsReport,
    pub notes: NotesReport,
    pub rules: RulesReport,
    pub hooks: HooksReport,
    pub degraded: Vec<Component>,
}

impl Snapshot {
    pub fn is_degraded(&self, component: Component) -> bool {
        self.degraded.contains(&component)
    }

    /// Fold into metrics and score. If the fold itself fails the whole report
    /// is degraded.
    pub fn health(&self, thresholds: &HealthThresholds) -> HealthReport {
        let metrics = match HealthMetrics::fold(
            self.skills.metrics(),
            self.notes.metrics(),
            self.rules.metrics(),
            self.hooks.metrics(),
        ) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "could not fold health metrics");
                return HealthReport::degraded_global(&e.to_string());
            }
        };
        let mut report = evaluate(&metrics, thresholds);
        report.degraded = self.degraded.clone();
        report
    }
}

fn recover<T: Default>(component: Component, result: Result<T>, degraded: &mut Vec<Component>) -> T {
    match result {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(%component, error = %e, "analysis failed; scoring from defaults");
            degraded.push(component);
            T::default()
        }
    }
}

/// Run a synchronous analysis on the blocking pool. A panic inside `f` comes
/// back as a component failure.
async fn blocking<T, F>(component: Component, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| HarnessError::ComponentFailed {
            component: component.to_string(),
            reason: format!("task join error: {e}"),
        })?
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Analyzer {
    source: Arc<dyn ArtifactSource>,
    tokenizer: Arc<dyn Tokenizer>,
    config: HarnessConfig,
    memory: Option<MemoryServiceClient>,
}

impl Analyzer {
    /// The memory service client is built from `config`.
    pub fn new(
        source: Arc<dyn ArtifactSource>,
        tokenizer: Arc<dyn Tokenizer>,
        config: HarnessConfig,
    ) -> Self {
        let memory = MemoryServiceClient::from_config(&config.memory_service);
        Self {
            source,
            tokenizer,
            config,
            memory,
        }
    }

    /// Analyzer over a project directory: its config file, the file system
    /// and the default tokenizer.
    pub fn for_root(root: &Path) -> Result<Self> {
        let config = HarnessConfig::load(root)?;
        let tokenizer = BpeTokenizer::cl100k()?;
        Ok(Self::new(
            Arc::new(FsSource::new(root)),
            Arc::new(tokenizer),
            config,
        ))
    }

    pub fn with_memory_service(mut self, memory: Option<MemoryServiceClient>) -> Self {
        self.memory = memory;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Component analyses
    // -----------------------------------------------------------------------

    async fn observations(&self) -> Option<Vec<Observation>> {
        let client = self.memory.as_ref()?;
        client
            .recent_observations(self.config.memory_service.observation_limit)
            .await
            .ok()
    }

    pub async fn skills(&self, now: DateTime<Utc>) -> Result<SkillsReport> {
        let observations = self.observations().await;
        let source = Arc::clone(&self.source);
        let tokenizer = Arc::clone(&self.tokenizer);
        blocking(Component::Skills, move || {
            analyze_skills(&*source, &*tokenizer, observations.as_deref(), now)
        })
        .await
    }

    pub async fn notes(&self) -> Result<NotesReport> {
        let source = Arc::clone(&self.source);
        let tokenizer = Arc::clone(&self.tokenizer);
        blocking(Component::Notes, move || analyze_notes(&*source, &*tokenizer)).await
    }

    pub async fn rules(&self) -> Result<RulesReport> {
        let source = Arc::clone(&self.source);
        let tokenizer = Arc::clone(&self.tokenizer);
        blocking(Component::Rules, move || analyze_rules(&*source, &*tokenizer)).await
    }

    pub async fn hooks(&self) -> Result<HooksReport> {
        let source = Arc::clone(&self.source);
        blocking(Component::Hooks, move || analyze_hooks(&*source)).await
    }

    // -----------------------------------------------------------------------
    // Aggregates
    // -----------------------------------------------------------------------

    /// Run all four analyses concurrently, substituting defaults for any that
    /// fail.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        let (skills, notes, rules, hooks) =
            tokio::join!(self.skills(now), self.notes(), self.rules(), self.hooks());

        let mut degraded = Vec::new();
        Snapshot {
            skills: recover(Component::Skills, skills, &mut degraded),
            notes: recover(Component::Notes, notes, &mut degraded),
            rules: recover(Component::Rules, rules, &mut degraded),
            hooks: recover(Component::Hooks, hooks, &mut degraded),
            degraded,
        }
    }

    pub async fn analyze_health(&self, now: DateTime<Utc>) -> HealthReport {
        self.snapshot(now).await.health(&self.config.thresholds)
    }

    /// Parse the task board. `None` uses the configured default mode.
    pub fn plans(&self, mode: Option<WorkflowMode>) -> Result<KanbanBoard> {
        locate_and_parse(&*self.source, mode.unwrap_or(self.config.plans.mode))
    }

    pub fn usage(&self, now: DateTime<Utc>) -> UsageReport {
        usage_report(
            &*self.source,
            now,
            self.config.usage.window(),
            self.config.usage.top_n,
        )
    }

    /// Static insights, plus a narrative when `narrate` is set and a
    /// narrative command is configured.
    pub async fn insights(&self, now: DateTime<Utc>, narrate: bool) -> InsightsReport {
        let snapshot = self.snapshot(now).await;
        let health = snapshot.health(&self.config.thresholds);

        let available = |c: Component| !snapshot.is_degraded(c);
        let insights = static_insights(InsightInputs {
            health: Some(&health),
            skills: available(Component::Skills).then_some(&snapshot.skills),
            notes: available(Component::Notes).then_some(&snapshot.notes),
            rules: available(Component::Rules).then_some(&snapshot.rules),
        });

        let narrative = if narrate {
            let prompt = narrative_prompt(&insights, Some(&health));
            generate_narrative(&self.config.narrative, &prompt).await
        } else {
            Narrative::unavailable("narrative not requested")
        };

        InsightsReport {
            insights,
            generated_at: now,
            narrative,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths;
    use crate::test_support::WordTokenizer;
    use crate::types::HealthStatus;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, body: &str) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn offline_config() -> HarnessConfig {
        let mut cfg = HarnessConfig::default();
        cfg.memory_service.enabled = false;
        cfg
    }

    fn analyzer(source: Arc<dyn ArtifactSource>) -> Analyzer {
        Analyzer::new(source, Arc::new(WordTokenizer), offline_config())
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(&dir, "skills/impl.md", "---\ndescription: implement features\n---\nbody\n");
        write(&dir, ".claude/memory/decisions.md", "Use tabs");
        write(&dir, ".claude/rules/style.md", "keep functions short");
        write(
            &dir,
            "hooks/hooks.json",
            r#"{"hooks": {"Stop": [{"hooks": [{"type": "command", "command": "./notify.sh"}]}]}}"#,
        );
        write(&dir, "Plans.md", "## Plan\n- [ ] A\n## Work\n- [ ] B `cc:WIP`\n");
        dir
    }

    /// Delegates to the file system but fails (or panics) on one directory.
    struct BrokenSource {
        inner: FsSource,
        broken_dir: &'static str,
        panic: bool,
    }

    impl ArtifactSource for BrokenSource {
        fn list_artifacts(&self, dir: &str, extensions: &[&str], recursive: bool) -> Result<Vec<PathBuf>> {
            if dir == self.broken_dir {
                if self.panic {
                    panic!("source exploded");
                }
                return Err(std::io::Error::other("permission denied").into());
            }
            self.inner.list_artifacts(dir, extensions, recursive)
        }

        fn read_artifact(&self, path: &Path) -> Result<String> {
            self.inner.read_artifact(path)
        }

        fn modified(&self, path: &Path) -> Option<DateTime<Utc>> {
            self.inner.modified(path)
        }
    }

    #[tokio::test]
    async fn healthy_project_scores_full() {
        let dir = project();
        let report = analyzer(Arc::new(FsSource::new(dir.path())))
            .analyze_health(Utc::now())
            .await;
        assert_eq!(report.score, 100);
        assert_eq!(report.status, HealthStatus::Good);
        assert!(report.degraded.is_empty());
        // "implement features " → 2 words, plus 3 words of active rules
        assert_eq!(report.total_initial_load_tokens, 5);
    }

    #[tokio::test]
    async fn failing_component_is_degraded_not_fatal() {
        let dir = project();
        let source = BrokenSource {
            inner: FsSource::new(dir.path()),
            broken_dir: paths::ACTIVE_RULES_DIR,
            panic: false,
        };
        let report = analyzer(Arc::new(source)).analyze_health(Utc::now()).await;
        assert_eq!(report.degraded, vec![Component::Rules]);
        // rules fall back to an empty report: "no rules" costs 10
        assert_eq!(report.score, 90);
        assert_eq!(report.breakdown.rules.count, 0);
        assert_eq!(report.breakdown.skills.count, 1);
    }

    #[tokio::test]
    async fn panicking_component_is_degraded() {
        let dir = project();
        let source = BrokenSource {
            inner: FsSource::new(dir.path()),
            broken_dir: paths::MEMORY_DIR,
            panic: true,
        };
        let report = analyzer(Arc::new(source)).analyze_health(Utc::now()).await;
        assert_eq!(report.degraded, vec![Component::Notes]);
        assert_eq!(report.breakdown.notes.storage_tokens, 0);
    }

    #[tokio::test]
    async fn invalid_utf8_note_does_not_degrade_notes() {
        let dir = project();
        std::fs::write(dir.path().join(".claude/memory/bad.md"), b"caf\xE9 notes").unwrap();
        let report = analyzer(Arc::new(FsSource::new(dir.path())))
            .analyze_health(Utc::now())
            .await;
        assert!(report.degraded.is_empty());
        assert_eq!(report.score, 100);
        assert_eq!(report.breakdown.notes.storage_tokens, 2 + 2);
        assert!(!report.suggestions.iter().any(|s| s.contains("Notes are empty")));
    }

    #[tokio::test]
    async fn empty_project_is_scored_not_failed() {
        let dir = TempDir::new().unwrap();
        let report = analyzer(Arc::new(FsSource::new(dir.path())))
            .analyze_health(Utc::now())
            .await;
        // no skills, no notes, no rules
        assert_eq!(report.score, 70);
        assert_eq!(report.status, HealthStatus::Warning);
        assert_eq!(report.suggestions.len(), 3);
    }

    #[test]
    fn plans_use_configured_mode_by_default() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".claude/Plans.md", "- [x] X `cc:完了`\n");
        let mut cfg = offline_config();
        cfg.plans.mode = WorkflowMode::TwoAgent;
        let a = Analyzer::new(Arc::new(FsSource::new(dir.path())), Arc::new(WordTokenizer), cfg);

        let board = a.plans(None).unwrap();
        assert_eq!(board.review.len(), 1);
        let board = a.plans(Some(WorkflowMode::Solo)).unwrap();
        assert_eq!(board.done.len(), 1);
    }

    #[test]
    fn missing_plans_is_reported_on_the_board() {
        let dir = TempDir::new().unwrap();
        let board = analyzer(Arc::new(FsSource::new(dir.path()))).plans(None).unwrap();
        assert_eq!(board.error.as_deref(), Some(crate::plans::NOT_FOUND_ERROR));
    }

    #[test]
    fn usage_without_snapshot_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let report = analyzer(Arc::new(FsSource::new(dir.path()))).usage(Utc::now());
        assert!(!report.available);
    }

    #[test]
    fn extreme_staleness_days_use_the_default_window() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();
        let recent = (now - chrono::Duration::hours(1)).to_rfc3339();
        write(
            &dir,
            paths::USAGE_FILE,
            &format!(r#"{{"skills": {{"impl": {{"count": 3, "lastUsed": "{recent}"}}}}}}"#),
        );

        for days in [100_000_000, -5] {
            let mut cfg = offline_config();
            cfg.usage.staleness_days = days;
            let a = Analyzer::new(Arc::new(FsSource::new(dir.path())), Arc::new(WordTokenizer), cfg);
            let report = a.usage(now);
            assert!(report.available);
            assert_eq!(report.cleanup.unwrap().summary.unused_skills_count, 0, "days = {days}");
        }
    }

    #[tokio::test]
    async fn insights_skip_degraded_reports() {
        let dir = project();
        let source = BrokenSource {
            inner: FsSource::new(dir.path()),
            broken_dir: paths::SKILLS_DIR,
            panic: false,
        };
        let report = analyzer(Arc::new(source)).insights(Utc::now(), false).await;
        assert!(!report.insights.is_empty());
        assert!(!report.narrative.available);
        // the only penalty is "no skills", carried as a health suggestion
        assert!(report.insights.iter().any(|i| i.title.contains("No skills")));
    }
}
