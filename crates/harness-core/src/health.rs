use crate::error::{HarnessError, Result};
use crate::types::{Component, HealthStatus};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillMetrics {
    pub count: usize,
    /// Description tokens only; these load at session start.
    pub token_count: usize,
    pub unused_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetrics {
    /// Stored size; notes load on demand.
    pub storage_tokens: usize,
    pub duplicate_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMetrics {
    /// Templates excluded.
    pub count: usize,
    pub initial_load_tokens: usize,
    pub conflict_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookMetrics {
    pub count: usize,
}

/// Snapshot the scoring engine works on. Build it with [`HealthMetrics::fold`]
/// so the initial-load total always matches its parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub skills: SkillMetrics,
    pub notes: NoteMetrics,
    pub rules: RuleMetrics,
    pub hooks: HookMetrics,
    pub total_initial_load_tokens: usize,
}

impl HealthMetrics {
    pub fn fold(
        skills: SkillMetrics,
        notes: NoteMetrics,
        rules: RuleMetrics,
        hooks: HookMetrics,
    ) -> Result<Self> {
        let total_initial_load_tokens = skills
            .token_count
            .checked_add(rules.initial_load_tokens)
            .ok_or(HarnessError::Overflow("initial load tokens"))?;
        Ok(Self {
            skills,
            notes,
            rules,
            hooks,
            total_initial_load_tokens,
        })
    }
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthThresholds {
    #[serde(default = "default_skill_tokens")]
    pub skill_tokens: usize,
    #[serde(default = "default_unused_skills")]
    pub unused_skills: usize,
    #[serde(default = "default_note_storage_tokens")]
    pub note_storage_tokens: usize,
    #[serde(default = "default_hooks")]
    pub hooks: usize,
}

fn default_skill_tokens() -> usize {
    10_000
}

fn default_unused_skills() -> usize {
    3
}

fn default_note_storage_tokens() -> usize {
    30_000
}

fn default_hooks() -> usize {
    10
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            skill_tokens: default_skill_tokens(),
            unused_skills: default_unused_skills(),
            note_storage_tokens: default_note_storage_tokens(),
            hooks: default_hooks(),
        }
    }
}

// ---------------------------------------------------------------------------
// Check table
// ---------------------------------------------------------------------------

type Predicate = fn(&HealthMetrics, &HealthThresholds) -> bool;
type Message = fn(&HealthMetrics, &HealthThresholds) -> String;

/// One penalty. `score` and `suggestions` both read [`CHECKS`], so a check's
/// deduction and its advice cannot drift apart.
pub struct Check {
    pub id: &'static str,
    pub component: Component,
    pub penalty: u32,
    pub applies: Predicate,
    pub message: Message,
}

fn skill_tokens_over(m: &HealthMetrics, t: &HealthThresholds) -> bool {
    m.skills.token_count > t.skill_tokens
}

fn skill_tokens_over_msg(_: &HealthMetrics, t: &HealthThresholds) -> String {
    format!(
        "Skill descriptions exceed {} tokens. Remove or shorten skills you no longer need.",
        t.skill_tokens
    )
}

fn unused_skills_over(m: &HealthMetrics, t: &HealthThresholds) -> bool {
    m.skills.unused_count > t.unused_skills
}

fn unused_skills_over_msg(m: &HealthMetrics, _: &HealthThresholds) -> String {
    format!(
        "{} skills show no usage. Delete the ones you do not use.",
        m.skills.unused_count
    )
}

fn no_skills(m: &HealthMetrics, _: &HealthThresholds) -> bool {
    m.skills.count == 0
}

fn no_skills_msg(_: &HealthMetrics, _: &HealthThresholds) -> String {
    "No skills are configured. Run /skill-list to see what is available.".to_string()
}

fn note_storage_over(m: &HealthMetrics, t: &HealthThresholds) -> bool {
    m.notes.storage_tokens > t.note_storage_tokens
}

fn note_storage_over_msg(_: &HealthMetrics, t: &HealthThresholds) -> String {
    format!(
        "Stored notes exceed {} tokens. Consider archiving the session log.",
        t.note_storage_tokens
    )
}

fn note_duplicates(m: &HealthMetrics, _: &HealthThresholds) -> bool {
    m.notes.duplicate_count > 0
}

fn note_duplicates_msg(m: &HealthMetrics, _: &HealthThresholds) -> String {
    format!(
        "{} duplicated notes detected. Consider merging them.",
        m.notes.duplicate_count
    )
}

fn no_notes(m: &HealthMetrics, _: &HealthThresholds) -> bool {
    m.notes.storage_tokens == 0
}

fn no_notes_msg(_: &HealthMetrics, _: &HealthThresholds) -> String {
    "Notes are empty. Record what you learn in decisions.md or patterns.md.".to_string()
}

fn rule_conflicts(m: &HealthMetrics, _: &HealthThresholds) -> bool {
    m.rules.conflict_count > 0
}

fn rule_conflicts_msg(m: &HealthMetrics, _: &HealthThresholds) -> String {
    format!(
        "{} rule conflicts found. Resolve the contradicting rules.",
        m.rules.conflict_count
    )
}

fn no_rules(m: &HealthMetrics, _: &HealthThresholds) -> bool {
    m.rules.count == 0
}

fn no_rules_msg(_: &HealthMetrics, _: &HealthThresholds) -> String {
    "No rules are configured. Add project rules under .claude/rules/.".to_string()
}

fn hooks_over(m: &HealthMetrics, t: &HealthThresholds) -> bool {
    m.hooks.count > t.hooks
}

fn hooks_over_msg(m: &HealthMetrics, t: &HealthThresholds) -> String {
    format!(
        "{} hooks are configured. Keeping it at {} or fewer is recommended.",
        m.hooks.count, t.hooks
    )
}

pub static CHECKS: &[Check] = &[
    Check {
        id: "skills-token-overflow",
        component: Component::Skills,
        penalty: 10,
        applies: skill_tokens_over,
        message: skill_tokens_over_msg,
    },
    Check {
        id: "skills-unused",
        component: Component::Skills,
        penalty: 10,
        applies: unused_skills_over,
        message: unused_skills_over_msg,
    },
    Check {
        id: "skills-none",
        component: Component::Skills,
        penalty: 10,
        applies: no_skills,
        message: no_skills_msg,
    },
    Check {
        id: "notes-storage-overflow",
        component: Component::Notes,
        penalty: 10,
        applies: note_storage_over,
        message: note_storage_over_msg,
    },
    Check {
        id: "notes-duplicates",
        component: Component::Notes,
        penalty: 10,
        applies: note_duplicates,
        message: note_duplicates_msg,
    },
    Check {
        id: "notes-empty",
        component: Component::Notes,
        penalty: 10,
        applies: no_notes,
        message: no_notes_msg,
    },
    Check {
        id: "rules-conflicts",
        component: Component::Rules,
        penalty: 20,
        applies: rule_conflicts,
        message: rule_conflicts_msg,
    },
    Check {
        id: "rules-none",
        component: Component::Rules,
        penalty: 10,
        applies: no_rules,
        message: no_rules_msg,
    },
    Check {
        id: "hooks-too-many",
        component: Component::Hooks,
        penalty: 10,
        applies: hooks_over,
        message: hooks_over_msg,
    },
];

/// Checks that fire for `metrics`, in table order.
pub fn failed_checks<'a>(
    metrics: &'a HealthMetrics,
    thresholds: &'a HealthThresholds,
) -> impl Iterator<Item = &'static Check> + 'a {
    CHECKS
        .iter()
        .filter(move |check| (check.applies)(metrics, thresholds))
}

/// 100 minus every applicable penalty, clamped to `0..=100`.
pub fn score(metrics: &HealthMetrics, thresholds: &HealthThresholds) -> u32 {
    let penalty: u32 = failed_checks(metrics, thresholds).map(|c| c.penalty).sum();
    100u32.saturating_sub(penalty)
}

pub fn suggestions(metrics: &HealthMetrics, thresholds: &HealthThresholds) -> Vec<String> {
    failed_checks(metrics, thresholds)
        .map(|c| (c.message)(metrics, thresholds))
        .collect()
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillBreakdown {
    pub count: usize,
    pub token_count: usize,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBreakdown {
    pub storage_tokens: usize,
    pub duplicate_count: usize,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBreakdown {
    pub count: usize,
    pub initial_load_tokens: usize,
    pub conflict_count: usize,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookBreakdown {
    pub count: usize,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub skills: SkillBreakdown,
    pub notes: NoteBreakdown,
    pub rules: RuleBreakdown,
    pub hooks: HookBreakdown,
}

impl Breakdown {
    pub fn from_metrics(m: &HealthMetrics, t: &HealthThresholds) -> Self {
        let skills_score = if m.skills.count == 0 {
            50
        } else if m.skills.token_count > t.skill_tokens {
            60
        } else {
            100
        };
        let notes_score = if m.notes.storage_tokens == 0 {
            50
        } else if m.notes.duplicate_count > 0 {
            60
        } else {
            100
        };
        let rules_score = if m.rules.conflict_count > 0 {
            40
        } else if m.rules.count == 0 {
            60
        } else {
            100
        };
        let hooks_score = if m.hooks.count > t.hooks { 60 } else { 100 };

        Self {
            skills: SkillBreakdown {
                count: m.skills.count,
                token_count: m.skills.token_count,
                status: HealthStatus::from_score(skills_score),
            },
            notes: NoteBreakdown {
                storage_tokens: m.notes.storage_tokens,
                duplicate_count: m.notes.duplicate_count,
                status: HealthStatus::from_score(notes_score),
            },
            rules: RuleBreakdown {
                count: m.rules.count,
                initial_load_tokens: m.rules.initial_load_tokens,
                conflict_count: m.rules.conflict_count,
                status: HealthStatus::from_score(rules_score),
            },
            hooks: HookBreakdown {
                count: m.hooks.count,
                status: HealthStatus::from_score(hooks_score),
            },
        }
    }

    fn all_errored() -> Self {
        Self {
            skills: SkillBreakdown {
                count: 0,
                token_count: 0,
                status: HealthStatus::Error,
            },
            notes: NoteBreakdown {
                storage_tokens: 0,
                duplicate_count: 0,
                status: HealthStatus::Error,
            },
            rules: RuleBreakdown {
                count: 0,
                initial_load_tokens: 0,
                conflict_count: 0,
                status: HealthStatus::Error,
            },
            hooks: HookBreakdown {
                count: 0,
                status: HealthStatus::Error,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub score: u32,
    pub status: HealthStatus,
    pub total_initial_load_tokens: usize,
    pub breakdown: Breakdown,
    pub suggestions: Vec<String>,
    /// Components whose analysis failed and were scored from defaults.
    #[serde(default)]
    pub degraded: Vec<Component>,
}

impl HealthReport {
    /// The report for when no snapshot could be built at all.
    pub fn degraded_global(reason: &str) -> Self {
        Self {
            score: 0,
            status: HealthStatus::Error,
            total_initial_load_tokens: 0,
            breakdown: Breakdown::all_errored(),
            suggestions: vec![format!(
                "Health could not be computed ({reason}). Check the project configuration."
            )],
            degraded: vec![
                Component::Skills,
                Component::Notes,
                Component::Rules,
                Component::Hooks,
            ],
        }
    }
}

pub fn evaluate(metrics: &HealthMetrics, thresholds: &HealthThresholds) -> HealthReport {
    let score = score(metrics, thresholds);
    HealthReport {
        score,
        status: HealthStatus::from_score(score),
        total_initial_load_tokens: metrics.total_initial_load_tokens,
        breakdown: Breakdown::from_metrics(metrics, thresholds),
        suggestions: suggestions(metrics, thresholds),
        degraded: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
