use crate::output::{print_json, print_table};
use harness_core::health::HealthReport;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let analyzer = super::load_analyzer(root)?;
    let report = super::block_on(analyzer.analyze_health(chrono::Utc::now()))?;

    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &HealthReport) {
    println!("Health: {}/100 ({})", report.score, report.status);
    println!("Initial load: {} tokens", report.total_initial_load_tokens);
    println!();

    let b = &report.breakdown;
    print_table(
        &["COMPONENT", "STATUS", "DETAIL"],
        vec![
            vec![
                "skills".into(),
                b.skills.status.to_string(),
                format!("{} skills, {} tokens", b.skills.count, b.skills.token_count),
            ],
            vec![
                "memory".into(),
                b.notes.status.to_string(),
                format!(
                    "{} tokens stored, {} duplicates",
                    b.notes.storage_tokens, b.notes.duplicate_count
                ),
            ],
            vec![
                "rules".into(),
                b.rules.status.to_string(),
                format!(
                    "{} rules, {} tokens at start, {} conflicts",
                    b.rules.count, b.rules.initial_load_tokens, b.rules.conflict_count
                ),
            ],
            vec![
                "hooks".into(),
                b.hooks.status.to_string(),
                format!("{} hooks", b.hooks.count),
            ],
        ],
    );

    if !report.suggestions.is_empty() {
        println!();
        println!("Suggestions:");
        for s in &report.suggestions {
            println!("  - {s}");
        }
    }

    if !report.degraded.is_empty() {
        let names: Vec<String> = report.degraded.iter().map(|c| c.to_string()).collect();
        println!();
        println!("Degraded (scored from defaults): {}", names.join(", "));
    }
}
