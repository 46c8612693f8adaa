//! CLI handlers for `creatorflow task` subcommands.
//!
//! Implements:
//! - `creatorflow task list [--date]`  -- list tasks, earliest first
//! - `creatorflow task add ...`        -- add (or replace by --id) a task
//! - `creatorflow task delete <id>`    -- delete a task
//! - `creatorflow task toggle <id>`    -- flip the completion flag

use anyhow::Result;
use chrono::NaiveDate;

use creatorflow_core::report::tasks_on;
use creatorflow_core::state::AppState;
use creatorflow_store::models::{ChannelName, Task};

use crate::TaskCommands;

/// Dispatch a `TaskCommands` variant to the appropriate handler.
pub fn run_task_command(command: TaskCommands, state: &mut AppState, today: NaiveDate) -> Result<()> {
    match command {
        TaskCommands::List { date } => {
            cmd_list(state, date);
            Ok(())
        }
        TaskCommands::Add {
            title,
            channel,
            date,
            start,
            duration,
            priority,
            notes,
            product,
            id,
        } => {
            let previous = id.as_deref().and_then(|id| state.task(id)).cloned();
            let task = Task {
                id: id.unwrap_or_default(),
                title,
                channel: ChannelName::parse(&channel)?,
                date: date.unwrap_or(today),
                start_time: start,
                duration,
                is_completed: previous.as_ref().is_some_and(|t| t.is_completed),
                priority,
                notes,
                notion_synced: previous.as_ref().and_then(|t| t.notion_synced),
                product_id: product,
            };
            let saved = state.save_task(task)?;
            let verb = if previous.is_some() { "Updated" } else { "Added" };
            println!(
                "{verb} task {} on {} at {}: {}",
                saved.id, saved.date, saved.start_time, saved.title
            );
            Ok(())
        }
        TaskCommands::Delete { task_id } => {
            let removed = state.delete_task(&task_id)?;
            println!("Deleted task {}: {}", removed.id, removed.title);
            Ok(())
        }
        TaskCommands::Toggle { task_id } => {
            let completed = state.toggle_completion(&task_id)?;
            let label = if completed { "done" } else { "pending" };
            println!("Task {task_id} is now {label}.");
            Ok(())
        }
    }
}

fn cmd_list(state: &AppState, date: Option<NaiveDate>) {
    let mut tasks: Vec<&Task> = match date {
        Some(day) => tasks_on(state.tasks(), day),
        None => state.tasks().iter().collect(),
    };
    tasks.sort_by_key(|t| (t.date, t.start_time));

    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    println!(
        "{:<36} {:<10} {:<6} {:>5} {:<6} {:<8} {:<16} TITLE",
        "ID", "DATE", "START", "MIN", "DONE", "PRIO", "CHANNEL"
    );
    println!("{}", "-".repeat(110));
    for task in tasks {
        println!(
            "{:<36} {:<10} {:<6} {:>5} {:<6} {:<8} {:<16} {}",
            task.id,
            task.date.to_string(),
            task.start_time.to_string(),
            task.duration,
            if task.is_completed { "x" } else { "" },
            task.priority.to_string(),
            task.channel.as_str(),
            task.title
        );
    }
}
