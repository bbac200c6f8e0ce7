use crate::output::{print_json, truncate};
use harness_core::insights::InsightsReport;
use std::path::Path;

pub fn run(root: &Path, narrative: bool, json: bool) -> anyhow::Result<()> {
    let analyzer = super::load_analyzer(root)?;
    let report = super::block_on(analyzer.insights(chrono::Utc::now(), narrative))?;

    if json {
        return print_json(&report);
    }
    print_report(&report, narrative);
    Ok(())
}

fn lower<T: std::fmt::Debug>(value: T) -> String {
    format!("{value:?}").to_lowercase()
}

fn print_report(report: &InsightsReport, narrative: bool) {
    if report.insights.is_empty() {
        println!("No insights. Configuration looks lean.");
    }
    for (i, insight) in report.insights.iter().enumerate() {
        println!(
            "{}. [{}] {} (impact {}, effort {})",
            i + 1,
            lower(insight.kind),
            insight.title,
            lower(insight.impact),
            lower(insight.effort)
        );
        println!("   {}", truncate(&insight.description, 120));
        println!("   -> {}", insight.command);
    }

    if !narrative {
        return;
    }
    println!();
    match (&report.narrative.text, &report.narrative.message) {
        (Some(text), _) if report.narrative.available => println!("{}", text.trim()),
        (_, Some(message)) => println!("Narrative unavailable: {message}"),
        _ => println!("Narrative unavailable."),
    }
}
