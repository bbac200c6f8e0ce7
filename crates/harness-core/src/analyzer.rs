//! The four artifact analyses: skills, notes, rules and hooks.
//!
//! Each analysis reads through an [`ArtifactSource`] and returns a report that
//! both the HTTP surface and the health snapshot consume.

use crate::error::Result;
use crate::fingerprint::{duplicate_names, group_duplicates, DuplicateGroup};
use crate::frontmatter::SkillHeader;
use crate::health::{HookMetrics, NoteMetrics, RuleMetrics, SkillMetrics};
use crate::memory_service::Observation;
use crate::paths;
use crate::source::ArtifactSource;
use crate::tokens::{count_artifact_tokens, count_tokens, Tokenizer};
use crate::types::RuleCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Skills modified within this many days earn a recency bonus.
pub const RECENCY_WINDOW_DAYS: i64 = 30;
/// Weight of one memory-service mention.
pub const OBSERVATION_WEIGHT: u64 = 5;
/// Weight of one session-log path mention.
pub const SESSION_LOG_WEIGHT: u64 = 2;
/// At most this many unused skills are reported.
pub const UNUSED_SKILLS_REPORTED: usize = 5;

fn path_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Read one artifact. A file that cannot be read is logged and skipped so the
/// rest of its component is still analyzed.
fn read_or_skip(source: &dyn ArtifactSource, path: &Path) -> Option<String> {
    match source.read_artifact(path) {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable artifact");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    pub path: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_en: Option<String>,
    /// Description tokens only.
    pub token_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    pub usage_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsReport {
    pub skills: Vec<Skill>,
    pub total_tokens: usize,
    pub unused_skills: Vec<String>,
    pub usage_tracking_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_tracking_message: Option<String>,
}

impl SkillsReport {
    pub fn metrics(&self) -> SkillMetrics {
        SkillMetrics {
            count: self.skills.len(),
            token_count: self.total_tokens,
            unused_count: self.unused_skills.len(),
        }
    }
}

fn mentions_skill(search_text: &str, base: &str) -> bool {
    search_text.contains(&format!("skill({base})"))
        || search_text.contains(&format!("skills/{base}"))
        || (search_text.contains(&format!("/{base}")) && search_text.contains("skill"))
}

/// Usage evidence for one skill from the three signals.
fn usage_evidence(
    name: &str,
    observations: Option<&[String]>,
    modified: Option<DateTime<Utc>>,
    session_log: &str,
    now: DateTime<Utc>,
) -> u64 {
    let mut usage = 0u64;

    if let Some(texts) = observations {
        let base = name.split('/').next().unwrap_or(name).to_lowercase();
        let hits = texts.iter().filter(|t| mentions_skill(t, &base)).count() as u64;
        usage += hits * OBSERVATION_WEIGHT;
    }

    if let Some(modified) = modified {
        let days_ago = (now - modified).num_days();
        if days_ago < RECENCY_WINDOW_DAYS {
            usage += (RECENCY_WINDOW_DAYS - days_ago.max(0)).max(1) as u64;
        }
    }

    if !session_log.is_empty() {
        let needle = format!("skills/{}", name.to_lowercase());
        usage += session_log.matches(needle.as_str()).count() as u64 * SESSION_LOG_WEIGHT;
    }

    usage
}

/// Analyze `skills/**/*.md`. `observations` is `None` when the memory service
/// was not consulted.
pub fn analyze_skills(
    source: &dyn ArtifactSource,
    tokenizer: &dyn Tokenizer,
    observations: Option<&[Observation]>,
    now: DateTime<Utc>,
) -> Result<SkillsReport> {
    let files = source.list_artifacts(paths::SKILLS_DIR, &["md"], true)?;
    let session_log = read_or_skip(source, Path::new(paths::SESSION_LOG_FILE))
        .unwrap_or_default()
        .to_lowercase();
    let search_texts: Option<Vec<String>> = observations
        .filter(|o| !o.is_empty())
        .map(|o| o.iter().map(Observation::search_text).collect());

    let mut skills = Vec::with_capacity(files.len());
    let mut total_tokens = 0usize;

    for file in &files {
        let Some(content) = read_or_skip(source, file) else {
            continue;
        };
        let header = SkillHeader::parse(&content);
        let description = header.description.unwrap_or_default().trim().to_string();
        let description_en = header
            .description_en
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let loaded = format!("{} {}", description, description_en.as_deref().unwrap_or(""));
        let token_count = count_tokens(tokenizer, &loaded);
        total_tokens += token_count;

        let name = paths::artifact_name(paths::SKILLS_DIR, file);
        let last_modified = source.modified(file);
        let usage_count = usage_evidence(
            &name,
            search_texts.as_deref(),
            last_modified,
            &session_log,
            now,
        );

        skills.push(Skill {
            name,
            path: path_string(file),
            description,
            description_en,
            token_count,
            last_modified,
            usage_count,
        });
    }

    let unused_skills = skills
        .iter()
        .filter(|s| s.usage_count == 0)
        .map(|s| s.name.clone())
        .take(UNUSED_SKILLS_REPORTED)
        .collect();

    let mut signals = Vec::new();
    if search_texts.is_some() {
        signals.push("memory service");
    }
    signals.push("file modification times");
    if !session_log.is_empty() {
        signals.push("session log");
    }

    Ok(SkillsReport {
        skills,
        total_tokens,
        unused_skills,
        usage_tracking_available: true,
        usage_tracking_message: Some(format!("usage based on {}", signals.join(" + "))),
    })
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteFile {
    pub name: String,
    pub path: String,
    /// Storage size; notes are not loaded at session start.
    pub token_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesReport {
    pub files: Vec<NoteFile>,
    pub total_tokens: usize,
    /// Always zero; kept so clients can show both load semantics side by side.
    pub initial_load_tokens: usize,
    pub duplicates: Vec<String>,
    pub duplicate_groups: Vec<DuplicateGroup>,
}

impl NotesReport {
    pub fn metrics(&self) -> NoteMetrics {
        NoteMetrics {
            storage_tokens: self.total_tokens,
            duplicate_count: self.duplicates.len(),
        }
    }
}

pub fn analyze_notes(source: &dyn ArtifactSource, tokenizer: &dyn Tokenizer) -> Result<NotesReport> {
    let paths_found = source.list_artifacts(paths::MEMORY_DIR, &["md"], false)?;

    let mut files = Vec::with_capacity(paths_found.len());
    let mut contents = Vec::with_capacity(paths_found.len());
    let mut total_tokens = 0usize;

    for path in &paths_found {
        let Some(content) = read_or_skip(source, path) else {
            continue;
        };
        let token_count = count_artifact_tokens(tokenizer, &content);
        total_tokens += token_count;

        let rel = path_string(path);
        let name = rel
            .strip_prefix(&format!("{}/", paths::MEMORY_DIR))
            .unwrap_or(&rel)
            .to_string();
        files.push(NoteFile {
            name,
            path: rel.clone(),
            token_count,
            last_modified: source.modified(path),
        });
        contents.push((rel, content));
    }

    let duplicate_groups =
        group_duplicates(contents.iter().map(|(p, c)| (p.as_str(), c.as_str())));
    let duplicates = duplicate_names(&duplicate_groups);

    Ok(NotesReport {
        files,
        total_tokens,
        initial_load_tokens: 0,
        duplicates,
        duplicate_groups,
    })
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub name: String,
    pub path: String,
    pub content: String,
    pub token_count: usize,
    pub category: RuleCategory,
    pub initial_load: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesReport {
    pub rules: Vec<Rule>,
    pub total_tokens: usize,
    /// Active and cursor rules only.
    pub initial_load_tokens: usize,
    /// No detector exists yet, so this stays empty.
    pub conflicts: Vec<String>,
}

impl RulesReport {
    pub fn metrics(&self) -> RuleMetrics {
        RuleMetrics {
            count: self
                .rules
                .iter()
                .filter(|r| r.category != RuleCategory::Template)
                .count(),
            initial_load_tokens: self.initial_load_tokens,
            conflict_count: self.conflicts.len(),
        }
    }
}

const RULE_DIRS: &[(&str, RuleCategory)] = &[
    (paths::ACTIVE_RULES_DIR, RuleCategory::Active),
    (paths::CURSOR_RULES_DIR, RuleCategory::Cursor),
    (paths::TEMPLATE_RULES_DIR, RuleCategory::Template),
];

fn rule_display_name(dir: &str, path: &Path, category: RuleCategory) -> String {
    let name = paths::artifact_name(dir, path);
    match category {
        RuleCategory::Active => name,
        RuleCategory::Cursor => format!("[cursor] {name}"),
        RuleCategory::Template => format!("[template] {name}"),
    }
}

pub fn analyze_rules(source: &dyn ArtifactSource, tokenizer: &dyn Tokenizer) -> Result<RulesReport> {
    let mut report = RulesReport::default();

    for &(dir, category) in RULE_DIRS {
        let mut found = source.list_artifacts(dir, &["md"], false)?;
        found.extend(source.list_artifacts(dir, &["template"], false)?);

        for path in found {
            let Some(content) = read_or_skip(source, &path) else {
                continue;
            };
            if content.is_empty() {
                continue;
            }
            let token_count = count_artifact_tokens(tokenizer, &content);
            let initial_load = category.loads_initially();
            report.total_tokens += token_count;
            if initial_load {
                report.initial_load_tokens += token_count;
            }
            report.rules.push(Rule {
                name: rule_display_name(dir, &path, category),
                path: path_string(&path),
                content,
                token_count,
                category,
                initial_load,
            });
        }
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    pub name: String,
    /// Lifecycle event, e.g. `PreToolUse` or `SessionStart`.
    #[serde(rename = "type", default)]
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    #[serde(default)]
    pub command: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HooksReport {
    pub hooks: Vec<Hook>,
    pub count: usize,
}

impl HooksReport {
    fn from_hooks(hooks: Vec<Hook>) -> Self {
        Self {
            count: hooks.len(),
            hooks,
        }
    }

    pub fn metrics(&self) -> HookMetrics {
        HookMetrics { count: self.count }
    }
}

#[derive(Debug, Deserialize)]
struct HookGroup {
    #[serde(default)]
    matcher: Option<String>,
    #[serde(default)]
    hooks: Vec<HookSpec>,
}

#[derive(Debug, Deserialize)]
struct HookSpec {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

fn hook_name(spec: &HookSpec) -> String {
    match &spec.command {
        Some(cmd) => cmd
            .rsplit('/')
            .next()
            .map(|last| last.replacen(".sh", "", 1))
            .unwrap_or_else(|| "unknown".to_string()),
        None if spec.kind == "prompt" => "prompt-hook".to_string(),
        None => "unknown".to_string(),
    }
}

/// Parse a hooks file in either the event-keyed or the legacy list layout.
/// Anything unreadable is zero hooks.
pub fn parse_hooks_file(content: &str) -> Vec<Hook> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    let value: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "hooks file is not valid JSON");
            return Vec::new();
        }
    };

    match value.get("hooks") {
        Some(serde_json::Value::Object(events)) => {
            let mut hooks = Vec::new();
            for (event, groups) in events {
                let Ok(groups) = serde_json::from_value::<Vec<HookGroup>>(groups.clone()) else {
                    continue;
                };
                for group in groups {
                    for spec in &group.hooks {
                        hooks.push(Hook {
                            name: hook_name(spec),
                            event: event.clone(),
                            matcher: group.matcher.clone(),
                            command: spec
                                .command
                                .clone()
                                .or_else(|| spec.prompt.clone())
                                .unwrap_or_default(),
                        });
                    }
                }
            }
            hooks
        }
        Some(list @ serde_json::Value::Array(_)) => {
            serde_json::from_value::<Vec<Hook>>(list.clone()).unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

pub fn analyze_hooks(source: &dyn ArtifactSource) -> Result<HooksReport> {
    let primary = source.read_artifact(Path::new(paths::HOOKS_FILE))?;
    let content = if primary.is_empty() {
        source.read_artifact(Path::new(paths::ALT_HOOKS_FILE))?
    } else {
        primary
    };
    Ok(HooksReport::from_hooks(parse_hooks_file(&content)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
