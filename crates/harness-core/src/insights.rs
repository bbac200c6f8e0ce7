//! Optimization insights derived from the analysis reports, plus an optional
//! prose narrative produced by an external command.

use crate::analyzer::{NotesReport, RulesReport, SkillsReport};
use crate::health::HealthReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const NOTES_WARNING_TOKENS: usize = 50_000;
const NOTES_SUGGESTION_TOKENS: usize = 30_000;
const UNUSED_SKILLS_LIMIT: usize = 3;
const SKILL_TOKENS_WARNING: usize = 20_000;
const RULES_INITIAL_LOAD_LIMIT: usize = 5_000;
const HEALTH_SCORE_FLOOR: u32 = 60;
const HEALTH_SUGGESTIONS_CARRIED: usize = 2;

// ---------------------------------------------------------------------------
// Insight
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Optimization,
    Warning,
    Suggestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub impact: Level,
    pub effort: Level,
    /// Command the user can run to act on the insight.
    pub command: String,
}

impl Insight {
    fn new(
        kind: InsightKind,
        title: impl Into<String>,
        description: impl Into<String>,
        impact: Level,
        effort: Level,
        command: &str,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            impact,
            effort,
            command: command.to_string(),
        }
    }
}

/// Reports the insights are derived from. A `None` report was unavailable
/// and contributes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsightInputs<'a> {
    pub health: Option<&'a HealthReport>,
    pub skills: Option<&'a SkillsReport>,
    pub notes: Option<&'a NotesReport>,
    pub rules: Option<&'a RulesReport>,
}

pub fn static_insights(inputs: InsightInputs<'_>) -> Vec<Insight> {
    let mut insights = Vec::new();

    if let Some(notes) = inputs.notes {
        let tokens = notes.total_tokens;
        if tokens > NOTES_WARNING_TOKENS {
            insights.push(Insight::new(
                InsightKind::Warning,
                "Stored notes are too large",
                format!(
                    "Notes take {tokens} tokens of storage. Consider archiving session-log.md. \
                     Notes load on demand and are not part of the initial context."
                ),
                Level::Medium,
                Level::Low,
                "/harness-mem cleanup",
            ));
        } else if tokens > NOTES_SUGGESTION_TOKENS {
            insights.push(Insight::new(
                InsightKind::Suggestion,
                "Tidy up notes regularly",
                format!("Notes take {tokens} tokens of storage. Consider pruning old session-log entries."),
                Level::Low,
                Level::Low,
                "/harness-mem status",
            ));
        }

        if !notes.duplicates.is_empty() {
            insights.push(Insight::new(
                InsightKind::Optimization,
                "Duplicated notes can be merged",
                format!(
                    "{} probable duplicates detected. Merging them reduces stored tokens.",
                    notes.duplicates.len()
                ),
                Level::Medium,
                Level::Medium,
                "/harness-mem merge",
            ));
        }
    }

    if let Some(skills) = inputs.skills {
        let unused = &skills.unused_skills;
        if unused.len() > UNUSED_SKILLS_LIMIT {
            let shown = unused.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
            insights.push(Insight::new(
                InsightKind::Suggestion,
                "Consider removing unused skills",
                format!("{} skills have not been used recently: {shown}...", unused.len()),
                Level::Low,
                Level::Low,
                "/skills-update remove",
            ));
        }

        if skills.total_tokens > SKILL_TOKENS_WARNING {
            insights.push(Insight::new(
                InsightKind::Warning,
                "Skill descriptions are token heavy",
                format!(
                    "Skills total {} tokens. Remove skills you do not need or compress their descriptions.",
                    skills.total_tokens
                ),
                Level::Medium,
                Level::Medium,
                "/skills-update list",
            ));
        }
    }

    if let Some(rules) = inputs.rules {
        if !rules.conflicts.is_empty() {
            insights.push(Insight::new(
                InsightKind::Warning,
                "Resolve rule conflicts",
                format!(
                    "{} rule conflicts found. Review the contradicting rules.",
                    rules.conflicts.len()
                ),
                Level::High,
                Level::Medium,
                "claude \"review the rule conflicts\"",
            ));
        }

        if rules.initial_load_tokens > RULES_INITIAL_LOAD_LIMIT {
            insights.push(Insight::new(
                InsightKind::Suggestion,
                "Consider tightening rules",
                format!(
                    "Rules load {} tokens at session start. Consider trimming redundant wording.",
                    rules.initial_load_tokens
                ),
                Level::Medium,
                Level::High,
                "claude \"make the rules more concise\"",
            ));
        }
    }

    if let Some(health) = inputs.health {
        if health.score < HEALTH_SCORE_FLOOR {
            insights.push(Insight::new(
                InsightKind::Warning,
                "Improve project health",
                format!(
                    "Health score {} leaves room for improvement. Consider setting up the core project files.",
                    health.score
                ),
                Level::High,
                Level::High,
                "/harness-init",
            ));
        }

        for suggestion in health.suggestions.iter().take(HEALTH_SUGGESTIONS_CARRIED) {
            insights.push(Insight::new(
                InsightKind::Suggestion,
                suggestion.clone(),
                "From the health analysis.",
                Level::Medium,
                Level::Low,
                "/sync-status",
            ));
        }
    }

    if insights.is_empty() {
        insights.push(Insight::new(
            InsightKind::Suggestion,
            "Project is in good shape",
            "No important optimizations right now. Check in with /sync-status from time to time.",
            Level::Low,
            Level::Low,
            "/sync-status",
        ));
    }

    insights
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// Executable that reads a prompt on stdin and writes prose to stdout.
    /// Unset disables narratives.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_narrative_timeout")]
    pub timeout_secs: u64,
}

fn default_narrative_timeout() -> u64 {
    20
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: default_narrative_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Narrative {
    pub fn available(text: String) -> Self {
        Self {
            available: true,
            text: Some(text),
            message: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            text: None,
            message: Some(message.into()),
        }
    }
}

/// Prompt handed to the narrative command.
pub fn narrative_prompt(insights: &[Insight], health: Option<&HealthReport>) -> String {
    let mut prompt = String::from(
        "Summarize the state of this assistant project configuration in a short paragraph \
         and name the single most valuable next step.\n\n",
    );
    if let Some(h) = health {
        prompt.push_str(&format!(
            "Health score: {} ({}), initial load {} tokens.\n",
            h.score, h.status, h.total_initial_load_tokens
        ));
    }
    prompt.push_str("Findings:\n");
    for i in insights {
        prompt.push_str(&format!("- [{:?}] {}: {}\n", i.kind, i.title, i.description));
    }
    prompt
}

async fn run_narrative(command: &str, args: &[String], prompt: &str) -> Result<String, String> {
    let mut child = Command::new(command)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("failed to start '{command}': {e}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(prompt.as_bytes())
            .await
            .map_err(|e| format!("failed to send prompt: {e}"))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| format!("'{command}' did not finish: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("'{command}' exited with {}: {}", output.status, stderr.trim()));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
        return Err(format!("'{command}' produced no output"));
    }
    Ok(text)
}

/// Run the configured narrative command. Never fails: a missing command, a
/// spawn failure, a non-zero exit or a timeout all yield an unavailable
/// narrative with the reason.
pub async fn generate_narrative(cfg: &NarrativeConfig, prompt: &str) -> Narrative {
    let Some(command) = cfg.command.as_deref().filter(|c| !c.trim().is_empty()) else {
        return Narrative::unavailable("no narrative command configured");
    };

    let limit = Duration::from_secs(cfg.timeout_secs);
    match tokio::time::timeout(limit, run_narrative(command, &cfg.args, prompt)).await {
        Ok(Ok(text)) => Narrative::available(text),
        Ok(Err(reason)) => {
            tracing::warn!(%reason, "narrative command failed");
            Narrative::unavailable(reason)
        }
        Err(_) => {
            tracing::warn!(command, timeout_secs = cfg.timeout_secs, "narrative command timed out");
            Narrative::unavailable(format!(
                "narrative command timed out after {}s",
                cfg.timeout_secs
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsReport {
    pub insights: Vec<Insight>,
    pub generated_at: DateTime<Utc>,
    pub narrative: Narrative,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{evaluate, HealthMetrics, HealthThresholds};

    #[test]
    fn empty_inputs_give_the_all_good_insight() {
        let insights = static_insights(InsightInputs::default());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].title, "Project is in good shape");
    }

    #[test]
    fn note_storage_tiers() {
        let mut notes = NotesReport {
            total_tokens: 60_000,
            ..Default::default()
        };
        let warning = static_insights(InsightInputs {
            notes: Some(&notes),
            ..Default::default()
        });
        assert_eq!(warning[0].kind, InsightKind::Warning);

        notes.total_tokens = 40_000;
        let suggestion = static_insights(InsightInputs {
            notes: Some(&notes),
            ..Default::default()
        });
        assert_eq!(suggestion[0].kind, InsightKind::Suggestion);
        assert_eq!(suggestion[0].command, "/harness-mem status");
    }

    #[test]
    fn duplicates_are_an_optimization() {
        let notes = NotesReport {
            total_tokens: 100,
            duplicates: vec!["a.md".into()],
            ..Default::default()
        };
        let insights = static_insights(InsightInputs {
            notes: Some(&notes),
            ..Default::default()
        });
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Optimization);
    }

    #[test]
    fn unused_skills_list_first_three() {
        let skills = SkillsReport {
            unused_skills: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            ..Default::default()
        };
        let insights = static_insights(InsightInputs {
            skills: Some(&skills),
            ..Default::default()
        });
        assert!(insights[0].description.contains("a, b, c..."));
        assert!(!insights[0].description.contains(", d"));
    }

    #[test]
    fn low_health_and_carried_suggestions() {
        let mut metrics = HealthMetrics::default();
        metrics.rules.conflict_count = 1;
        let report = evaluate(&metrics, &HealthThresholds::default());
        assert!(report.score < 60);
        let insights = static_insights(InsightInputs {
            health: Some(&report),
            ..Default::default()
        });
        // score warning plus the first two health suggestions
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0].command, "/harness-init");
        assert_eq!(insights[1].title, report.suggestions[0]);
    }

    #[test]
    fn heavy_rules_suggest_tightening() {
        let rules = RulesReport {
            initial_load_tokens: 6_000,
            ..Default::default()
        };
        let insights = static_insights(InsightInputs {
            rules: Some(&rules),
            ..Default::default()
        });
        assert_eq!(insights[0].effort, Level::High);
    }

    #[test]
    fn prompt_lists_findings() {
        let insights = static_insights(InsightInputs::default());
        let prompt = narrative_prompt(&insights, None);
        assert!(prompt.contains("Project is in good shape"));
    }

    #[tokio::test]
    async fn unconfigured_narrative_is_unavailable() {
        let n = generate_narrative(&NarrativeConfig::default(), "hi").await;
        assert!(!n.available);
        assert!(n.message.unwrap().contains("no narrative command"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn narrative_reads_command_stdout() {
        let cfg = NarrativeConfig {
            command: Some("cat".into()),
            ..Default::default()
        };
        let n = generate_narrative(&cfg, "  all is well \n").await;
        assert!(n.available);
        assert_eq!(n.text.as_deref(), Some("all is well"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_narrative_times_out() {
        let cfg = NarrativeConfig {
            command: Some("sleep".into()),
            args: vec!["5".into()],
            timeout_secs: 1,
        };
        let n = generate_narrative(&cfg, "").await;
        assert!(!n.available);
        assert!(n.message.unwrap().contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_narrative_reports_reason() {
        let cfg = NarrativeConfig {
            command: Some("false".into()),
            ..Default::default()
        };
        let n = generate_narrative(&cfg, "").await;
        assert!(!n.available);
        assert!(n.message.unwrap().contains("exited with"));
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let cfg = NarrativeConfig {
            command: Some("harness-no-such-binary-xyz".into()),
            ..Default::default()
        };
        let n = generate_narrative(&cfg, "").await;
        assert!(!n.available);
        assert!(n.message.unwrap().contains("failed to start"));
    }
}
