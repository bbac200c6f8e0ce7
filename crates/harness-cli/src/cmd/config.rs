use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use harness_core::config::{HarnessConfig, WarnLevel};
use harness_core::paths;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration (defaults filled in)
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write a default .claude/harness.yaml if none exists
    Init,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Init => init(root, json),
    }
}

fn load(root: &Path) -> anyhow::Result<HarnessConfig> {
    HarnessConfig::load(root).context("failed to load config")
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load(root)?;
    if json {
        return print_json(&config);
    }

    println!("Config: {}", paths::config_path(root).display());
    let t = &config.thresholds;
    println!(
        "Thresholds:      skill tokens {}, unused skills {}, note tokens {}, hooks {}",
        t.skill_tokens, t.unused_skills, t.note_storage_tokens, t.hooks
    );
    println!(
        "Usage:           stale after {} days, top {}",
        config.usage.staleness_days, config.usage.top_n
    );
    println!("Plans mode:      {}", config.plans.mode);
    if config.memory_service.enabled {
        println!("Memory service:  {}", config.memory_service.url);
    } else {
        println!("Memory service:  disabled");
    }
    match &config.narrative.command {
        Some(cmd) => println!(
            "Narrative:       {} (timeout {}s)",
            cmd, config.narrative.timeout_secs
        ),
        None => println!("Narrative:       not configured"),
    }
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load(root)?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    config
        .ensure_valid()
        .context("config validation found errors")?;
    Ok(())
}

fn init(root: &Path, json: bool) -> anyhow::Result<()> {
    let written = HarnessConfig::init(root).context("failed to write config")?;
    let path = paths::config_path(root);

    if json {
        return print_json(&serde_json::json!({
            "path": path,
            "written": written,
        }));
    }
    if written {
        println!("Wrote {}", path.display());
    } else {
        println!("{} already exists; left unchanged.", path.display());
    }
    Ok(())
}
