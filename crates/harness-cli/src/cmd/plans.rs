use crate::output::{print_json, print_table};
use harness_core::plans::KanbanBoard;
use harness_core::types::{TaskStatus, WorkflowMode};
use std::path::Path;

pub fn run(root: &Path, mode: Option<&str>, json: bool) -> anyhow::Result<()> {
    let analyzer = super::load_analyzer(root)?;
    let mode = mode.map(|m| WorkflowMode::from_param(Some(m)));
    let board = analyzer.plans(mode)?;

    if json {
        return print_json(&board);
    }
    print_board(&board);
    Ok(())
}

fn print_board(board: &KanbanBoard) {
    if let Some(error) = &board.error {
        println!("{error}");
        return;
    }
    if board.task_count() == 0 {
        println!("No tasks. ({} mode)", board.mode);
        return;
    }

    let rows = TaskStatus::all()
        .iter()
        .flat_map(|&status| board.bucket(status))
        .map(|t| {
            vec![
                t.status.to_string(),
                t.priority.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                t.title.clone(),
            ]
        })
        .collect();
    print_table(&["STATUS", "PRIORITY", "TITLE"], rows);
    println!();
    println!(
        "{} plan, {} work, {} review, {} done ({} mode)",
        board.plan.len(),
        board.work.len(),
        board.review.len(),
        board.done.len(),
        board.mode
    );
}
