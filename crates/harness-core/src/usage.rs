//! Usage telemetry snapshot and cleanup advice.
//!
//! The snapshot lives at `.claude/state/harness-usage.json` and is written by
//! the assistant's hooks; this module only reads it.

use crate::error::Result;
use crate::paths;
use crate::source::ArtifactSource;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_STALENESS_DAYS: i64 = 30;
pub const DEFAULT_TOP_N: usize = 10;

pub const NO_SNAPSHOT_MESSAGE: &str =
    "No usage data yet. Skills, commands and agents are recorded automatically as they are used.";

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEntry {
    #[serde(default)]
    pub count: u64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_used: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookUsageEntry {
    #[serde(default)]
    pub triggered: u64,
    #[serde(default)]
    pub blocked: u64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_triggered: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageData {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub skills: BTreeMap<String, UsageEntry>,
    #[serde(default)]
    pub commands: BTreeMap<String, UsageEntry>,
    #[serde(default)]
    pub agents: BTreeMap<String, UsageEntry>,
    #[serde(default)]
    pub hooks: BTreeMap<String, HookUsageEntry>,
}

/// Parse a snapshot timestamp: RFC 3339, a naive date-time or a bare date
/// (both taken as UTC). Anything else is unknown.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
    }
    None
}

/// A timestamp that cannot be read becomes `None` for its entry alone.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match &raw {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) => parse_timestamp(s),
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Some(_) => None,
    };
    if parsed.is_none() {
        tracing::warn!(value = ?raw, "unreadable usage timestamp; treating as unknown");
    }
    Ok(parsed)
}

/// Read the snapshot. A missing file is `Ok(None)`; malformed JSON is an
/// error.
pub fn read_usage_snapshot(source: &dyn ArtifactSource) -> Result<Option<UsageData>> {
    let text = source.read_artifact(Path::new(paths::USAGE_FILE))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&text)?))
}

// ---------------------------------------------------------------------------
// Staleness
// ---------------------------------------------------------------------------

/// An item is stale when it was never used, or when its last use is known and
/// older than `window`. A used item with no timestamp is not stale, and
/// nothing is stale by age when the window reaches past the calendar.
pub fn is_stale(
    count: u64,
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    if count == 0 {
        return true;
    }
    match now.checked_sub_signed(window) {
        Some(cutoff) => last.is_some_and(|t| t < cutoff),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedUsage {
    pub name: String,
    #[serde(flatten)]
    pub entry: UsageEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedHookUsage {
    pub name: String,
    #[serde(flatten)]
    pub entry: HookUsageEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSummary {
    pub total_skills: usize,
    pub total_commands: usize,
    pub total_agents: usize,
    pub total_hooks: usize,
    pub unused_skills_count: usize,
    pub unused_commands_count: usize,
    pub unused_agents_count: usize,
    pub inactive_hooks_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub unused_skills: Vec<NamedUsage>,
    pub unused_commands: Vec<NamedUsage>,
    pub unused_agents: Vec<NamedUsage>,
    pub inactive_hooks: Vec<NamedHookUsage>,
    pub summary: CleanupSummary,
}

fn stale_entries(
    map: &BTreeMap<String, UsageEntry>,
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<NamedUsage> {
    map.iter()
        .filter(|(_, e)| is_stale(e.count, e.last_used, now, window))
        .map(|(name, e)| NamedUsage {
            name: name.clone(),
            entry: e.clone(),
        })
        .collect()
}

pub fn cleanup(data: &UsageData, now: DateTime<Utc>, window: Duration) -> CleanupReport {
    let unused_skills = stale_entries(&data.skills, now, window);
    let unused_commands = stale_entries(&data.commands, now, window);
    let unused_agents = stale_entries(&data.agents, now, window);
    let inactive_hooks: Vec<NamedHookUsage> = data
        .hooks
        .iter()
        .filter(|(_, e)| is_stale(e.triggered, e.last_triggered, now, window))
        .map(|(name, e)| NamedHookUsage {
            name: name.clone(),
            entry: e.clone(),
        })
        .collect();

    let summary = CleanupSummary {
        total_skills: data.skills.len(),
        total_commands: data.commands.len(),
        total_agents: data.agents.len(),
        total_hooks: data.hooks.len(),
        unused_skills_count: unused_skills.len(),
        unused_commands_count: unused_commands.len(),
        unused_agents_count: unused_agents.len(),
        inactive_hooks_count: inactive_hooks.len(),
    };

    CleanupReport {
        unused_skills,
        unused_commands,
        unused_agents,
        inactive_hooks,
        summary,
    }
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

/// The `n` entries with the highest `key`, descending. The sort is stable over
/// the map's key order, so ties come out alphabetically.
pub fn top_n<V, F>(map: &BTreeMap<String, V>, n: usize, key: F) -> Vec<(String, V)>
where
    V: Clone,
    F: Fn(&V) -> u64,
{
    let mut ranked: Vec<(String, V)> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    ranked.sort_by(|a, b| key(&b.1).cmp(&key(&a.1)));
    ranked.truncate(n);
    ranked
}

// ---------------------------------------------------------------------------
// Report envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub available: bool,
    pub data: Option<UsageData>,
    pub cleanup: Option<CleanupReport>,
    pub top_skills: Vec<(String, UsageEntry)>,
    pub top_commands: Vec<(String, UsageEntry)>,
    pub top_agents: Vec<(String, UsageEntry)>,
    pub top_hooks: Vec<(String, HookUsageEntry)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UsageReport {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            data: None,
            cleanup: None,
            top_skills: Vec::new(),
            top_commands: Vec::new(),
            top_agents: Vec::new(),
            top_hooks: Vec::new(),
            message: Some(message.into()),
        }
    }
}

pub fn build_report(
    data: Option<UsageData>,
    now: DateTime<Utc>,
    window: Duration,
    top: usize,
) -> UsageReport {
    let Some(data) = data else {
        return UsageReport::unavailable(NO_SNAPSHOT_MESSAGE);
    };

    UsageReport {
        available: true,
        cleanup: Some(cleanup(&data, now, window)),
        top_skills: top_n(&data.skills, top, |e| e.count),
        top_commands: top_n(&data.commands, top, |e| e.count),
        top_agents: top_n(&data.agents, top, |e| e.count),
        top_hooks: top_n(&data.hooks, top, |e| e.triggered),
        data: Some(data),
        message: None,
    }
}

/// Read the snapshot from `source` and build its report. Never fails: a
/// snapshot that cannot be read comes back unavailable with the reason.
pub fn usage_report(
    source: &dyn ArtifactSource,
    now: DateTime<Utc>,
    window: Duration,
    top: usize,
) -> UsageReport {
    match read_usage_snapshot(source) {
        Ok(data) => build_report(data, now, window, top),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read usage snapshot");
            UsageReport::unavailable(format!("Failed to read usage data: {e}"))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
