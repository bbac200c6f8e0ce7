//! Client for the local memory service, an optional telemetry source that
//! records observations about past sessions.
//!
//! Every call is bounded by a timeout and every failure collapses into
//! [`ServiceOutcome::Unavailable`]; callers never see transport errors.

use crate::config::MemoryServiceConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const UNAVAILABLE_MESSAGE: &str =
    "The memory service is not running; recent session history is not included.";
pub const DISABLED_MESSAGE: &str =
    "The memory service is disabled in .claude/harness.yaml (memory_service.enabled).";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome<T> {
    Available(T),
    Unavailable(String),
}

impl<T> ServiceOutcome<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, ServiceOutcome::Available(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            ServiceOutcome::Available(v) => Some(v),
            ServiceOutcome::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Observation {
    /// Title, narrative and text joined and lowercased.
    pub fn search_text(&self) -> String {
        [&self.title, &self.narrative, &self.text]
            .iter()
            .map(|s| s.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

#[derive(Debug, Deserialize)]
struct ObservationPage {
    #[serde(default)]
    items: Vec<Observation>,
}

#[derive(Debug, Clone)]
pub struct MemoryServiceClient {
    client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
    fetch_timeout: Duration,
}

impl MemoryServiceClient {
    pub fn new(base_url: impl Into<String>, health_timeout: Duration, fetch_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_timeout,
            fetch_timeout,
        }
    }

    /// `None` when the service is disabled in config.
    pub fn from_config(cfg: &MemoryServiceConfig) -> Option<Self> {
        if !cfg.enabled {
            return None;
        }
        Some(Self::new(
            cfg.url.clone(),
            Duration::from_millis(cfg.health_timeout_ms),
            Duration::from_millis(cfg.fetch_timeout_ms),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/health", self.base_url);
        match self.client.get(&url).timeout(self.health_timeout).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "memory service health check failed");
                false
            }
        }
    }

    pub async fn observations(&self, limit: usize) -> ServiceOutcome<Vec<Observation>> {
        let url = format!("{}/api/observations", self.base_url);
        let resp = match self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .timeout(self.fetch_timeout)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(error = %e, "memory service request failed");
                return ServiceOutcome::Unavailable(UNAVAILABLE_MESSAGE.to_string());
            }
        };

        if !resp.status().is_success() {
            return ServiceOutcome::Unavailable(format!(
                "memory service answered {}",
                resp.status()
            ));
        }

        match resp.json::<ObservationPage>().await {
            Ok(page) => ServiceOutcome::Available(page.items),
            Err(e) => {
                tracing::warn!(error = %e, "memory service returned an unreadable page");
                ServiceOutcome::Unavailable(format!("memory service response unreadable: {e}"))
            }
        }
    }

    /// Health check, then fetch.
    pub async fn recent_observations(&self, limit: usize) -> ServiceOutcome<Vec<Observation>> {
        if !self.is_available().await {
            return ServiceOutcome::Unavailable(UNAVAILABLE_MESSAGE.to_string());
        }
        self.observations(limit).await
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Whether the memory service is configured and reachable, with its most
/// recent observations when it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub enabled: bool,
    pub url: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observations: Option<Vec<Observation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Check the configured service and fetch up to `limit` observations
/// (`observation_limit` when `None`). Never fails.
pub async fn service_status(cfg: &MemoryServiceConfig, limit: Option<usize>) -> ServiceStatus {
    let Some(client) = MemoryServiceClient::from_config(cfg) else {
        return ServiceStatus {
            enabled: false,
            url: cfg.url.clone(),
            available: false,
            observations: None,
            message: Some(DISABLED_MESSAGE.to_string()),
        };
    };

    let limit = limit.unwrap_or(cfg.observation_limit);
    let (available, observations, message) = match client.recent_observations(limit).await {
        ServiceOutcome::Available(items) => (true, Some(items), None),
        ServiceOutcome::Unavailable(reason) => (false, None, Some(reason)),
    };
    ServiceStatus {
        enabled: true,
        url: client.base_url().to_string(),
        available,
        observations,
        message,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
