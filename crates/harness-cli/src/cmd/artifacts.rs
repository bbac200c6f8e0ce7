//! Per-component listings: skills, notes, rules and hooks.

use crate::output::{print_json, print_table, truncate};
use std::path::Path;

pub fn skills(root: &Path, json: bool) -> anyhow::Result<()> {
    let analyzer = super::load_analyzer(root)?;
    let report = super::block_on(analyzer.skills(chrono::Utc::now()))??;

    if json {
        return print_json(&report);
    }
    let rows = report
        .skills
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                s.token_count.to_string(),
                s.usage_count.to_string(),
                truncate(&s.description, 60),
            ]
        })
        .collect();
    print_table(&["NAME", "TOKENS", "USAGE", "DESCRIPTION"], rows);
    println!();
    println!("{} skills, {} tokens", report.skills.len(), report.total_tokens);
    if !report.unused_skills.is_empty() {
        println!("Unused: {}", report.unused_skills.join(", "));
    }
    if let Some(message) = &report.usage_tracking_message {
        println!("({message})");
    }
    Ok(())
}

pub fn notes(root: &Path, json: bool) -> anyhow::Result<()> {
    let analyzer = super::load_analyzer(root)?;
    let report = super::block_on(analyzer.notes())??;

    if json {
        return print_json(&report);
    }
    let rows = report
        .files
        .iter()
        .map(|f| vec![f.name.clone(), f.token_count.to_string()])
        .collect();
    print_table(&["NAME", "TOKENS"], rows);
    println!();
    println!(
        "{} notes, {} tokens stored (not loaded at session start)",
        report.files.len(),
        report.total_tokens
    );
    for group in &report.duplicate_groups {
        println!("Possible duplicates: {}", group.members.join(", "));
    }
    Ok(())
}

pub fn rules(root: &Path, json: bool) -> anyhow::Result<()> {
    let analyzer = super::load_analyzer(root)?;
    let report = super::block_on(analyzer.rules())??;

    if json {
        return print_json(&report);
    }
    let rows = report
        .rules
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.category.to_string(),
                r.token_count.to_string(),
                if r.initial_load { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "CATEGORY", "TOKENS", "LOADED"], rows);
    println!();
    println!(
        "{} rules, {} tokens, {} at session start",
        report.rules.len(),
        report.total_tokens,
        report.initial_load_tokens
    );
    Ok(())
}

pub fn hooks(root: &Path, json: bool) -> anyhow::Result<()> {
    let analyzer = super::load_analyzer(root)?;
    let report = super::block_on(analyzer.hooks())??;

    if json {
        return print_json(&report);
    }
    let rows = report
        .hooks
        .iter()
        .map(|h| {
            vec![
                h.name.clone(),
                h.event.clone(),
                h.matcher.clone().unwrap_or_default(),
                truncate(&h.command, 50),
            ]
        })
        .collect();
    print_table(&["NAME", "EVENT", "MATCHER", "COMMAND"], rows);
    println!();
    println!("{} hooks", report.count);
    Ok(())
}
