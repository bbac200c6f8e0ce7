use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// The four board buckets, in board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Plan,
    Work,
    Review,
    Done,
}

impl TaskStatus {
    pub fn all() -> &'static [TaskStatus] {
        &[
            TaskStatus::Plan,
            TaskStatus::Work,
            TaskStatus::Review,
            TaskStatus::Done,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Plan => "plan",
            TaskStatus::Work => "work",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = crate::error::HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" => Ok(TaskStatus::Plan),
            "work" => Ok(TaskStatus::Work),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            _ => Err(crate::error::HarnessError::InvalidTaskStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Glyph table in lookup order. The first glyph found on a line wins.
    pub fn glyphs() -> &'static [(char, Priority)] {
        &[
            ('🔴', Priority::High),
            ('🟡', Priority::Medium),
            ('🟢', Priority::Low),
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::error::HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(crate::error::HarnessError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowMode
// ---------------------------------------------------------------------------

/// Solo: one implementer, `cc:完了` means done.
/// TwoAgent: implementer plus approver, `cc:完了` waits in review until the
/// approver confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkflowMode {
    #[default]
    #[serde(rename = "solo")]
    Solo,
    #[serde(rename = "2agent", alias = "two_agent", alias = "two-agent")]
    TwoAgent,
}

impl WorkflowMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowMode::Solo => "solo",
            WorkflowMode::TwoAgent => "2agent",
        }
    }

    /// Lenient parse used by request surfaces: anything that is not a
    /// recognized two-agent spelling is solo.
    pub fn from_param(param: Option<&str>) -> Self {
        param
            .and_then(|p| p.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowMode {
    type Err = crate::error::HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solo" => Ok(WorkflowMode::Solo),
            "2agent" | "two_agent" | "two-agent" => Ok(WorkflowMode::TwoAgent),
            _ => Err(crate::error::HarnessError::InvalidWorkflowMode(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// HealthStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Good,
    Warning,
    Error,
}

impl HealthStatus {
    pub const GOOD_FLOOR: u32 = 80;
    pub const WARNING_FLOOR: u32 = 60;

    pub fn from_score(score: u32) -> Self {
        if score >= Self::GOOD_FLOOR {
            HealthStatus::Good
        } else if score >= Self::WARNING_FLOOR {
            HealthStatus::Warning
        } else {
            HealthStatus::Error
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Good => "good",
            HealthStatus::Warning => "warning",
            HealthStatus::Error => "error",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RuleCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// `.claude/rules`: loaded at session start.
    Active,
    /// `.cursor/rules`: the integration rules of two-agent setups, loaded at
    /// session start.
    Cursor,
    /// `templates/rules`: available but never loaded.
    Template,
}

impl RuleCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleCategory::Active => "active",
            RuleCategory::Cursor => "cursor",
            RuleCategory::Template => "template",
        }
    }

    pub fn loads_initially(self) -> bool {
        !matches!(self, RuleCategory::Template)
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = crate::error::HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RuleCategory::Active),
            "cursor" | "integration" => Ok(RuleCategory::Cursor),
            "template" => Ok(RuleCategory::Template),
            _ => Err(crate::error::HarnessError::InvalidRuleCategory(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// The four artifact kinds folded into a health snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Skills,
    Notes,
    Rules,
    Hooks,
}

impl Component {
    pub fn as_str(self) -> &'static str {
        match self {
            Component::Skills => "skills",
            Component::Notes => "notes",
            Component::Rules => "rules",
            Component::Hooks => "hooks",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
