//! `creatorflow report` command: per-channel progress and schedule totals.

use chrono::NaiveDate;

use creatorflow_core::report::{channel_progress, summarize, tasks_on};
use creatorflow_core::state::AppState;
use creatorflow_store::models::Task;

/// Run the report command.
pub fn run_report(state: &AppState, date: Option<NaiveDate>) {
    let tasks: Vec<Task> = match date {
        Some(day) => tasks_on(state.tasks(), day).into_iter().cloned().collect(),
        None => state.tasks().to_vec(),
    };

    match date {
        Some(day) => println!("Report for {day}"),
        None => println!("Report for all days"),
    }
    println!();

    println!(
        "{:<20} {:>8} {:>8} {:>10} {:>9}",
        "CHANNEL", "TARGET", "TASKS", "COMPLETED", "PROGRESS"
    );
    println!("{}", "-".repeat(59));
    for row in channel_progress(&tasks, state.channels()) {
        println!(
            "{:<20} {:>8} {:>8} {:>10} {:>8}%",
            row.name.as_str(),
            row.target,
            row.actual,
            row.completed,
            row.progress_pct
        );
    }
    println!();

    let summary = summarize(&tasks);
    println!("Tasks:");
    println!("  Total:      {}", summary.total);
    println!("  Completed:  {}", summary.completed);
    println!("  Remaining:  {}", summary.remaining);
    println!(
        "  Minutes:    {} scheduled, {} done",
        summary.total_minutes, summary.completed_minutes
    );
    println!(
        "Completion rate: {}/{} ({}%)",
        summary.completed, summary.total, summary.completion_pct
    );
}
