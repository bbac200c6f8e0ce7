use crate::error::{HarnessError, Result};
use crate::health::HealthThresholds;
use crate::insights::NarrativeConfig;
use crate::paths;
use crate::types::WorkflowMode;
use crate::usage::{DEFAULT_STALENESS_DAYS, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// UsageConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageConfig {
    #[serde(default = "default_staleness_days")]
    pub staleness_days: i64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_staleness_days() -> i64 {
    DEFAULT_STALENESS_DAYS
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            staleness_days: default_staleness_days(),
            top_n: default_top_n(),
        }
    }
}

impl UsageConfig {
    /// The staleness window. A non-positive or out-of-range day count falls
    /// back to the default window.
    pub fn window(&self) -> chrono::Duration {
        let days = if self.staleness_days > 0 {
            chrono::Duration::try_days(self.staleness_days)
        } else {
            None
        };
        days.unwrap_or_else(|| {
            tracing::warn!(
                staleness_days = self.staleness_days,
                "unusable usage.staleness_days; using {DEFAULT_STALENESS_DAYS}"
            );
            chrono::Duration::days(DEFAULT_STALENESS_DAYS)
        })
    }
}

// ---------------------------------------------------------------------------
// PlansConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlansConfig {
    /// Used when a request does not name a mode.
    #[serde(default)]
    pub mode: WorkflowMode,
}

// ---------------------------------------------------------------------------
// MemoryServiceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryServiceConfig {
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,
    #[serde(default = "default_memory_url")]
    pub url: String,
    #[serde(default = "default_health_timeout_ms")]
    pub health_timeout_ms: u64,
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default = "default_observation_limit")]
    pub observation_limit: usize,
}

fn default_memory_enabled() -> bool {
    true
}

fn default_memory_url() -> String {
    "http://127.0.0.1:37777".to_string()
}

fn default_health_timeout_ms() -> u64 {
    2_000
}

fn default_fetch_timeout_ms() -> u64 {
    5_000
}

fn default_observation_limit() -> usize {
    300
}

impl Default for MemoryServiceConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            url: default_memory_url(),
            health_timeout_ms: default_health_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            observation_limit: default_observation_limit(),
        }
    }
}

// ---------------------------------------------------------------------------
// HarnessConfig
// ---------------------------------------------------------------------------

/// Project settings from `.claude/harness.yaml`. Every field has a default, so
/// a partial or missing file is fine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub thresholds: HealthThresholds,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default)]
    pub plans: PlansConfig,
    #[serde(default)]
    pub memory_service: MemoryServiceConfig,
    #[serde(default)]
    pub narrative: NarrativeConfig,
}

impl HarnessConfig {
    /// Missing file → defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: HarnessConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Write the defaults unless a config already exists. Returns whether a
    /// file was written.
    pub fn init(root: &Path) -> Result<bool> {
        let data = serde_yaml::to_string(&Self::default())?;
        crate::io::write_if_missing(&paths::config_path(root), data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.usage.staleness_days <= 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "usage.staleness_days must be positive (got {})",
                    self.usage.staleness_days
                ),
            });
        } else if chrono::Duration::try_days(self.usage.staleness_days).is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "usage.staleness_days is out of range (got {})",
                    self.usage.staleness_days
                ),
            });
        }
        if self.usage.top_n == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "usage.top_n is 0; rankings will be empty".to_string(),
            });
        }

        if self.thresholds.skill_tokens == 0 || self.thresholds.note_storage_tokens == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "a zero token threshold penalizes every non-empty project".to_string(),
            });
        }

        if self.memory_service.enabled {
            let url = self.memory_service.url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("memory_service.url '{url}' is not an http(s) URL"),
                });
            }
            if self.memory_service.health_timeout_ms == 0 || self.memory_service.fetch_timeout_ms == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "memory_service timeouts of 0 ms make the service always unavailable"
                        .to_string(),
                });
            }
        }

        if let Some(command) = &self.narrative.command {
            if command.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "narrative.command is empty; narratives are disabled".to_string(),
                });
            }
        }
        if self.narrative.timeout_secs > 300 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "narrative.timeout_secs={} (>300 is unusual)",
                    self.narrative.timeout_secs
                ),
            });
        }

        warnings
    }

    /// Fail on the first error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(HarnessError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
