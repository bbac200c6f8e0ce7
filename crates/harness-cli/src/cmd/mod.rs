pub mod artifacts;
pub mod config;
pub mod health;
pub mod insights;
pub mod plans;
pub mod serve;
pub mod usage;

use anyhow::Context;
use harness_core::Analyzer;
use std::future::Future;
use std::path::Path;

pub(crate) fn load_analyzer(root: &Path) -> anyhow::Result<Analyzer> {
    Analyzer::for_root(root).with_context(|| format!("failed to load project at {}", root.display()))
}

/// Drive one async analysis to completion on a fresh runtime.
pub(crate) fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(fut))
}
