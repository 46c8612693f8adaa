//! AI planner workflow: request a day plan, reconcile the candidates against
//! live state, and commit them as one batch.
//!
//! At most one generation is in flight per orchestrator. A request that
//! arrives while one is running is dropped with [`PlanOutcome::Busy`].

mod status;

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use creatorflow_store::models::{ChannelMap, Product, Task};

use crate::clock::Clock;
use crate::generate::{GenerationError, ScheduleGenerator, ScheduleRequest, Shift};
use crate::state::{AppState, StateError};

use self::status::StatusCell;
pub use self::status::{PlannerStateMachine, PlannerStatus, PlannerStatusParseError};

/// The one notice shown whenever generation yields nothing to apply.
pub const GENERATION_FAILED_NOTICE: &str =
    "AI không thể tạo lịch. Vui lòng kiểm tra lại kho sản phẩm hoặc thử lại sau.";

/// Why a cycle applied nothing. Every reason maps to the same user notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The generation call failed.
    Generation(GenerationError),
    /// The model answered with an empty list.
    NoSuggestions,
    /// Every candidate referenced a channel that is not live.
    NoUsableCandidates,
    /// The state refused the batch.
    Commit(StateError),
}

/// Result of one planner request.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// Candidates were appended and the calendar moved to `date`.
    Applied { date: NaiveDate, added: Vec<Task> },
    /// Nothing was applied; `notice` is what the user sees.
    Failed {
        reason: FailureReason,
        notice: &'static str,
    },
    /// Another generation was already running.
    Busy,
}

impl PlanOutcome {
    fn failed(reason: FailureReason) -> Self {
        Self::Failed {
            reason,
            notice: GENERATION_FAILED_NOTICE,
        }
    }
}

/// Keep candidates whose channel is live.
///
/// A candidate on an unknown channel is moved to its product's channel when
/// it references a product on a live channel; otherwise it is dropped.
///
/// Dropping is per candidate. The all-or-nothing commit applies to the
/// batch this returns: `append_tasks` inserts every reconciled task or none.
pub fn reconcile(candidates: Vec<Task>, channels: &ChannelMap, products: &[Product]) -> Vec<Task> {
    candidates
        .into_iter()
        .filter_map(|mut task| {
            if channels.contains_key(&task.channel) {
                return Some(task);
            }
            let home = task
                .product_id
                .as_deref()
                .and_then(|id| products.iter().find(|p| p.id == id))
                .map(|p| p.channel.clone())
                .filter(|channel| channels.contains_key(channel));
            match home {
                Some(channel) => {
                    warn!(
                        title = %task.title,
                        from = %task.channel,
                        to = %channel,
                        "moving generated task to its product's channel"
                    );
                    task.channel = channel;
                    Some(task)
                }
                None => {
                    warn!(
                        title = %task.title,
                        channel = %task.channel,
                        "dropping generated task on unknown channel"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Runs planner requests against shared application state.
pub struct SchedulerOrchestrator {
    generator: ScheduleGenerator,
    state: Arc<Mutex<AppState>>,
    clock: Arc<dyn Clock>,
    status: StatusCell,
}

impl SchedulerOrchestrator {
    pub fn new(
        generator: ScheduleGenerator,
        state: Arc<Mutex<AppState>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            generator,
            state,
            clock,
            status: StatusCell::default(),
        }
    }

    pub fn status(&self) -> PlannerStatus {
        self.status.get()
    }

    pub fn state(&self) -> &Arc<Mutex<AppState>> {
        &self.state
    }

    /// Generate a plan for `date` and apply it.
    ///
    /// The state lock is not held while the model is working; the commit
    /// re-reads live channels and products. Application is all-or-nothing.
    pub async fn request_generation(&self, focus: &str, shift: Shift, date: NaiveDate) -> PlanOutcome {
        let Some(cycle) = self.status.try_begin() else {
            info!(%date, "planner busy, request dropped");
            return PlanOutcome::Busy;
        };

        let request = ScheduleRequest {
            date,
            shift,
            focus: focus.to_owned(),
        };
        let (tasks, products) = {
            let state = self.state.lock().await;
            (state.tasks().to_vec(), state.products().to_vec())
        };

        let candidates = match self
            .generator
            .try_generate(&request, &tasks, &products, self.clock.now())
            .await
        {
            Ok(candidates) if candidates.is_empty() => {
                info!(%date, "model suggested nothing");
                cycle.settle(PlannerStatus::Failed);
                return PlanOutcome::failed(FailureReason::NoSuggestions);
            }
            Ok(candidates) => candidates,
            Err(e) => {
                error!(%date, error = %e, "schedule generation failed");
                cycle.settle(PlannerStatus::Failed);
                return PlanOutcome::failed(FailureReason::Generation(e));
            }
        };

        let mut state = self.state.lock().await;
        let accepted = reconcile(candidates, state.channels(), state.products());
        if accepted.is_empty() {
            cycle.settle(PlannerStatus::Failed);
            return PlanOutcome::failed(FailureReason::NoUsableCandidates);
        }

        match state.append_tasks(accepted) {
            Ok(added) => {
                state.show_calendar(date);
                cycle.settle(PlannerStatus::Applied);
                info!(%date, count = added.len(), "generated plan applied");
                PlanOutcome::Applied { date, added }
            }
            Err(e) => {
                error!(%date, error = %e, "generated plan rejected");
                cycle.settle(PlannerStatus::Failed);
                PlanOutcome::failed(FailureReason::Commit(e))
            }
        }
    }
}
