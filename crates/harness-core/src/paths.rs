use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants (relative to the project root)
// ---------------------------------------------------------------------------

pub const CLAUDE_DIR: &str = ".claude";
pub const SKILLS_DIR: &str = "skills";
pub const MEMORY_DIR: &str = ".claude/memory";
pub const ACTIVE_RULES_DIR: &str = ".claude/rules";
pub const CURSOR_RULES_DIR: &str = ".cursor/rules";
pub const TEMPLATE_RULES_DIR: &str = "templates/rules";

pub const HOOKS_FILE: &str = "hooks/hooks.json";
pub const ALT_HOOKS_FILE: &str = ".claude/hooks.json";
pub const SESSION_LOG_FILE: &str = ".claude/memory/session-log.md";
pub const USAGE_FILE: &str = ".claude/state/harness-usage.json";
pub const CONFIG_FILE: &str = ".claude/harness.yaml";

/// Task board locations, tried in order.
pub const PLANS_CANDIDATES: &[&str] = &[".claude/Plans.md", "Plans.md", ".claude/plans.md"];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn usage_path(root: &Path) -> PathBuf {
    root.join(USAGE_FILE)
}

/// Display name of an artifact: its path below `dir`, without the extension.
///
/// `skills/impl/work.md` under `skills` becomes `impl/work`.
pub fn artifact_name(dir: &str, path: &Path) -> String {
    let rel = path.strip_prefix(dir).unwrap_or(path);
    let mut name = rel.to_string_lossy().replace('\\', "/");
    for suffix in [".md.template", ".md", ".template"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.to_string();
            break;
        }
    }
    name
}
