//! `creatorflow plan generate`: run the AI planner for one day.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use creatorflow_core::clock::Clock;
use creatorflow_core::generate::{GeminiBackend, GenerationError, ScheduleGenerator};
use creatorflow_core::orchestrator::{FailureReason, PlanOutcome, SchedulerOrchestrator};
use creatorflow_core::state::AppState;

use crate::PlanCommands;
use crate::config::{API_KEY_ENV, CreatorFlowConfig};

pub async fn run_plan_command(
    command: PlanCommands,
    state: AppState,
    resolved: &CreatorFlowConfig,
    clock: Arc<dyn Clock>,
    today: NaiveDate,
) -> Result<()> {
    match command {
        PlanCommands::Generate { date, shift, focus } => {
            let backend = GeminiBackend::new(resolved.gemini.clone())?;
            let generator = ScheduleGenerator::new(Arc::new(backend));
            let planner =
                SchedulerOrchestrator::new(generator, Arc::new(Mutex::new(state)), clock);

            let date = date.unwrap_or(today);
            println!("Planning {date} ({shift})...");
            let outcome = planner.request_generation(&focus, shift, date).await;
            print_outcome(&outcome);
            Ok(())
        }
    }
}

fn print_outcome(outcome: &PlanOutcome) {
    match outcome {
        PlanOutcome::Applied { date, added } => {
            println!("Added {} task(s) to {date}:", added.len());
            println!();
            println!(
                "{:<6} {:>5} {:<8} {:<16} TITLE",
                "START", "MIN", "PRIO", "CHANNEL"
            );
            println!("{}", "-".repeat(60));
            let mut sorted: Vec<_> = added.iter().collect();
            sorted.sort_by_key(|t| t.start_time);
            for task in sorted {
                println!(
                    "{:<6} {:>5} {:<8} {:<16} {}",
                    task.start_time.to_string(),
                    task.duration,
                    task.priority.to_string(),
                    task.channel.as_str(),
                    task.title
                );
            }
        }
        PlanOutcome::Failed { reason, notice } => {
            println!("{notice}");
            if let FailureReason::Generation(GenerationError::MissingApiKey { .. }) = reason {
                println!("hint: set {API_KEY_ENV} or run `creatorflow init --api-key <KEY>`");
            }
        }
        PlanOutcome::Busy => {
            println!("A plan is already being generated.");
        }
    }
}
