//! Task board (`Plans.md`) parsing.
//!
//! Two strategies run in sequence:
//!
//! 1. **Sections**: `## Plan` / `## Work` / `## Review` / `## Done` headers
//!    (plus their Japanese and long-form spellings) open buckets, and every
//!    checkbox line below a header becomes a task in that bucket.
//! 2. **Markers**, only when the section pass found no task at all: every
//!    checkbox line carrying a `` `cc:…` `` / `` `pm:…` `` / `` `cursor:…` ``
//!    marker, anywhere in the document, is bucketed by its marker.
//!
//! A recognized marker always beats the section a line sits under, so a task
//! marked `cc:WIP` inside `## Done` lands in work.

use crate::error::Result;
use crate::paths;
use crate::source::ArtifactSource;
use crate::types::{Priority, TaskStatus, WorkflowMode};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

pub const EMPTY_BOARD_ERROR: &str = "task board is empty";
pub const FORMAT_ERROR: &str = "task board format not recognized: add a '## Plan' or '## Work' \
     section, or status markers such as `cc:TODO`";
pub const NOT_FOUND_ERROR: &str =
    "task board not found (looked for .claude/Plans.md, Plans.md, .claude/plans.md)";

// ---------------------------------------------------------------------------
// Task / KanbanBoard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Only unique within one parse.
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanbanBoard {
    pub plan: Vec<Task>,
    pub work: Vec<Task>,
    pub review: Vec<Task>,
    pub done: Vec<Task>,
    pub mode: WorkflowMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KanbanBoard {
    pub fn empty(mode: WorkflowMode) -> Self {
        Self {
            plan: Vec::new(),
            work: Vec::new(),
            review: Vec::new(),
            done: Vec::new(),
            mode,
            error: None,
        }
    }

    pub fn with_error(mode: WorkflowMode, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(mode)
        }
    }

    pub fn bucket(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Plan => &self.plan,
            TaskStatus::Work => &self.work,
            TaskStatus::Review => &self.review,
            TaskStatus::Done => &self.done,
        }
    }

    fn bucket_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::Plan => &mut self.plan,
            TaskStatus::Work => &mut self.work,
            TaskStatus::Review => &mut self.review,
            TaskStatus::Done => &mut self.done,
        }
    }

    pub fn push(&mut self, task: Task) {
        self.bucket_mut(task.status).push(task);
    }

    pub fn task_count(&self) -> usize {
        self.plan.len() + self.work.len() + self.review.len() + self.done.len()
    }
}

// ---------------------------------------------------------------------------
// Task ids
// ---------------------------------------------------------------------------

/// Mints `task-1`, `task-2`, … for a single parse.
#[derive(Debug, Default)]
pub struct TaskIdSequence {
    last: u64,
}

impl TaskIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&mut self) -> String {
        self.last += 1;
        format!("task-{}", self.last)
    }
}

// ---------------------------------------------------------------------------
// Marker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerActor {
    /// `cc:`
    Implementer,
    /// `pm:`
    Approver,
    /// `cursor:`: older spelling of the approver.
    Legacy,
}

impl MarkerActor {
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "cc" => Some(MarkerActor::Implementer),
            "pm" => Some(MarkerActor::Approver),
            "cursor" => Some(MarkerActor::Legacy),
            _ => None,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            MarkerActor::Implementer => "cc",
            MarkerActor::Approver => "pm",
            MarkerActor::Legacy => "cursor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    NotStarted,
    Requested,
    InProgress,
    ImplementerDone,
    Approved,
    Other(String),
}

/// Keyword table, checked in order. A state matches when the keyword occurs
/// anywhere in the marker's state text (ASCII case-insensitive).
const STATE_KEYWORDS: &[(&str, fn() -> MarkerState)] = &[
    ("todo", || MarkerState::NotStarted),
    ("依頼中", || MarkerState::Requested),
    ("requested", || MarkerState::Requested),
    ("wip", || MarkerState::InProgress),
    ("作業中", || MarkerState::InProgress),
    ("in-progress", || MarkerState::InProgress),
    ("完了", || MarkerState::ImplementerDone),
    ("done", || MarkerState::ImplementerDone),
    ("確認済", || MarkerState::Approved),
    ("承認", || MarkerState::Approved),
    ("approved", || MarkerState::Approved),
    ("confirmed", || MarkerState::Approved),
];

impl MarkerState {
    pub fn from_keyword(keyword: &str) -> Self {
        let lower = keyword.to_lowercase();
        STATE_KEYWORDS
            .iter()
            .find(|(needle, _)| lower.contains(needle))
            .map(|(_, state)| state())
            .unwrap_or_else(|| MarkerState::Other(keyword.to_string()))
    }

    /// Target bucket, or `None` when the keyword is not recognized. Only
    /// `ImplementerDone` depends on the workflow mode.
    pub fn bucket(&self, mode: WorkflowMode) -> Option<TaskStatus> {
        match self {
            MarkerState::NotStarted | MarkerState::Requested => Some(TaskStatus::Plan),
            MarkerState::InProgress => Some(TaskStatus::Work),
            MarkerState::ImplementerDone => Some(match mode {
                WorkflowMode::Solo => TaskStatus::Done,
                WorkflowMode::TwoAgent => TaskStatus::Review,
            }),
            MarkerState::Approved => Some(TaskStatus::Done),
            MarkerState::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub actor: MarkerActor,
    pub state: MarkerState,
}

static MARKER_RE: OnceLock<Regex> = OnceLock::new();

fn marker_re() -> &'static Regex {
    MARKER_RE.get_or_init(|| Regex::new(r"`(cc|pm|cursor):([^`\s]+)`").unwrap())
}

impl Marker {
    /// Parse a bare `actor:state` token. Never fails loudly: anything that is
    /// not a known actor followed by a non-empty state is `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let (actor, state) = token.trim().trim_matches('`').split_once(':')?;
        let actor = MarkerActor::from_prefix(actor)?;
        let state = state.trim();
        if state.is_empty() || state.contains(char::is_whitespace) {
            return None;
        }
        Some(Self {
            actor,
            state: MarkerState::from_keyword(state),
        })
    }

    /// First back-quoted marker in `text`.
    pub fn find(text: &str) -> Option<Self> {
        let caps = marker_re().captures(text)?;
        Some(Self {
            actor: MarkerActor::from_prefix(&caps[1])?,
            state: MarkerState::from_keyword(&caps[2]),
        })
    }

    pub fn bucket(&self, mode: WorkflowMode) -> Option<TaskStatus> {
        self.state.bucket(mode)
    }
}

// ---------------------------------------------------------------------------
// Task line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine {
    pub title: String,
    pub completed: bool,
    pub priority: Option<Priority>,
    pub marker: Option<Marker>,
}

impl TaskLine {
    /// Checkbox fallback used when no marker decides the bucket.
    pub fn checkbox_status(&self) -> TaskStatus {
        if self.completed {
            TaskStatus::Done
        } else {
            TaskStatus::Plan
        }
    }

    fn marker_bucket(&self, mode: WorkflowMode) -> Option<TaskStatus> {
        self.marker.as_ref().and_then(|m| m.bucket(mode))
    }
}

static CHECKBOX_RE: OnceLock<Regex> = OnceLock::new();

fn checkbox_re() -> &'static Regex {
    CHECKBOX_RE.get_or_init(|| Regex::new(r"^\s*-\s*\[([ xX])\]\s*(.+)$").unwrap())
}

/// Parse one `- [ ] …` / `- [x] …` line. Any other line is `None`.
pub fn parse_task_line(line: &str) -> Option<TaskLine> {
    let caps = checkbox_re().captures(line.trim_end_matches('\r'))?;
    let completed = caps[1].eq_ignore_ascii_case("x");
    let mut title = caps[2].trim().to_string();

    let mut priority = None;
    for &(glyph, level) in Priority::glyphs() {
        if title.contains(glyph) {
            priority = Some(level);
            title = title.replacen(glyph, "", 1).trim().to_string();
            break;
        }
    }

    let marker = Marker::find(&title);
    if marker.is_some() {
        title = marker_re().replace_all(&title, "").trim().to_string();
    }

    Some(TaskLine {
        title,
        completed,
        priority,
        marker,
    })
}

// ---------------------------------------------------------------------------
// Section headers
// ---------------------------------------------------------------------------

const SECTION_HEADERS: &[(TaskStatus, &str)] = &[
    (TaskStatus::Plan, r"^##\s*Plan"),
    (TaskStatus::Plan, r"^##\s*計画"),
    (TaskStatus::Work, r"^##\s*Work"),
    (TaskStatus::Work, r"^##\s*作業中"),
    (TaskStatus::Work, r"^##\s*In\s*Progress"),
    (TaskStatus::Review, r"^##\s*Review"),
    (TaskStatus::Review, r"^##\s*レビュー"),
    (TaskStatus::Done, r"^##\s*Done"),
    (TaskStatus::Done, r"^##\s*完了"),
    (TaskStatus::Done, r"^##\s*Completed"),
];

static SECTION_RES: OnceLock<Vec<(TaskStatus, Regex)>> = OnceLock::new();

fn section_res() -> &'static [(TaskStatus, Regex)] {
    SECTION_RES.get_or_init(|| {
        SECTION_HEADERS
            .iter()
            .map(|(status, pattern)| (*status, Regex::new(&format!("(?i){pattern}")).unwrap()))
            .collect()
    })
}

/// The bucket a header line opens, if it is a section header.
pub fn section_for(line: &str) -> Option<TaskStatus> {
    section_res()
        .iter()
        .find(|(_, re)| re.is_match(line))
        .map(|(status, _)| *status)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Outcome of the section pass: the board plus whether any header matched.
struct SectionPass {
    board: KanbanBoard,
    saw_header: bool,
}

fn parse_sections(markdown: &str, mode: WorkflowMode, ids: &mut TaskIdSequence) -> SectionPass {
    let mut board = KanbanBoard::empty(mode);
    let mut current: Option<TaskStatus> = None;
    let mut saw_header = false;

    for line in markdown.lines() {
        if let Some(section) = section_for(line) {
            current = Some(section);
            saw_header = true;
            continue;
        }
        let Some(section) = current else { continue };
        let Some(parsed) = parse_task_line(line) else { continue };

        let status = parsed.marker_bucket(mode).unwrap_or(section);
        board.push(Task {
            id: ids.mint(),
            title: parsed.title,
            status,
            priority: parsed.priority,
        });
    }

    SectionPass { board, saw_header }
}

fn parse_markers(markdown: &str, mode: WorkflowMode, ids: &mut TaskIdSequence) -> KanbanBoard {
    let mut board = KanbanBoard::empty(mode);
    for line in markdown.lines() {
        let Some(parsed) = parse_task_line(line) else { continue };
        if parsed.marker.is_none() {
            continue;
        }
        let status = parsed
            .marker_bucket(mode)
            .unwrap_or_else(|| parsed.checkbox_status());
        board.push(Task {
            id: ids.mint(),
            title: parsed.title,
            status,
            priority: parsed.priority,
        });
    }
    board
}

/// Parse a whole task board document.
///
/// Never fails: an unusable document comes back as an empty board with
/// `error` set. A document that has section headers but no tasks is a valid
/// empty board.
pub fn parse_plans(markdown: &str, mode: WorkflowMode) -> KanbanBoard {
    if markdown.trim().is_empty() {
        return KanbanBoard::with_error(mode, EMPTY_BOARD_ERROR);
    }

    let mut ids = TaskIdSequence::new();
    let sections = parse_sections(markdown, mode, &mut ids);
    if sections.board.task_count() > 0 {
        return sections.board;
    }

    tracing::debug!(
        saw_header = sections.saw_header,
        "no tasks under section headers; scanning for status markers"
    );
    let markers = parse_markers(markdown, mode, &mut ids);
    if markers.task_count() > 0 {
        return markers;
    }

    if sections.saw_header {
        sections.board
    } else {
        KanbanBoard::with_error(mode, FORMAT_ERROR)
    }
}

/// Find the project's task board and parse it. The first candidate location
/// with non-empty content wins.
pub fn locate_and_parse(source: &dyn ArtifactSource, mode: WorkflowMode) -> Result<KanbanBoard> {
    for candidate in paths::PLANS_CANDIDATES {
        let content = source.read_artifact(Path::new(candidate))?;
        if !content.is_empty() {
            tracing::debug!(path = candidate, "parsing task board");
            return Ok(parse_plans(&content, mode));
        }
    }
    Ok(KanbanBoard::with_error(mode, NOT_FOUND_ERROR))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
