use crate::output::{print_json, print_table};
use harness_core::usage::{UsageEntry, UsageReport};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let analyzer = super::load_analyzer(root)?;
    let report = analyzer.usage(chrono::Utc::now());

    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn last_used(entry: &UsageEntry) -> String {
    entry
        .last_used
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "never".into())
}

fn print_ranking(label: &str, items: &[(String, UsageEntry)]) {
    if items.is_empty() {
        return;
    }
    println!("Top {label}:");
    let rows = items
        .iter()
        .map(|(name, e)| vec![name.clone(), e.count.to_string(), last_used(e)])
        .collect();
    print_table(&["NAME", "COUNT", "LAST USED"], rows);
    println!();
}

fn print_report(report: &UsageReport) {
    if !report.available {
        println!(
            "{}",
            report.message.as_deref().unwrap_or("Usage data unavailable.")
        );
        return;
    }

    print_ranking("skills", &report.top_skills);
    print_ranking("commands", &report.top_commands);
    print_ranking("agents", &report.top_agents);

    if !report.top_hooks.is_empty() {
        println!("Top hooks:");
        let rows = report
            .top_hooks
            .iter()
            .map(|(name, h)| vec![name.clone(), h.triggered.to_string(), h.blocked.to_string()])
            .collect();
        print_table(&["NAME", "TRIGGERED", "BLOCKED"], rows);
        println!();
    }

    if let Some(cleanup) = &report.cleanup {
        let s = &cleanup.summary;
        println!(
            "Cleanup candidates: {} skills, {} commands, {} agents, {} hooks",
            s.unused_skills_count,
            s.unused_commands_count,
            s.unused_agents_count,
            s.inactive_hooks_count
        );
        for item in &cleanup.unused_skills {
            println!("  - skill {} (used {} times)", item.name, item.entry.count);
        }
    }
}
