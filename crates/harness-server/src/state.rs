use harness_core::{Analyzer, Result};
use std::path::PathBuf;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Fresh analyzer per request so config edits are picked up without a
    /// restart. Blocking: reads the config file.
    pub fn analyzer(&self) -> Result<Analyzer> {
        Analyzer::for_root(&self.root)
    }

    /// [`AppState::analyzer`] on the blocking pool.
    pub async fn load_analyzer(&self) -> anyhow::Result<Analyzer> {
        let state = self.clone();
        let analyzer = tokio::task::spawn_blocking(move || state.analyzer())
            .await
            .map_err(|e| anyhow::anyhow!("task join error: {e}"))??;
        Ok(analyzer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_stores_root() {
        let state = AppState::new(PathBuf::from("/tmp/test"));
        assert_eq!(state.root, PathBuf::from("/tmp/test"));
    }

    #[test]
    fn malformed_config_fails_analyzer() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        std::fs::write(dir.path().join(".claude/harness.yaml"), "usage: [1, 2]\n").unwrap();
        let state = AppState::new(dir.path().to_path_buf());
        assert!(state.analyzer().is_err());
    }
}
