//! Planner status and the single-flight guard around it.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

/// Where the planner is in a generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlannerStatus {
    #[default]
    Idle,
    Generating,
    Applied,
    Failed,
}

impl fmt::Display for PlannerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::Applied => "applied",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for PlannerStatus {
    type Err = PlannerStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "generating" => Ok(Self::Generating),
            "applied" => Ok(Self::Applied),
            "failed" => Ok(Self::Failed),
            other => Err(PlannerStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlannerStatus`] string.
#[derive(Debug, Clone)]
pub struct PlannerStatusParseError(pub String);

impl fmt::Display for PlannerStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid planner status: {:?}", self.0)
    }
}

impl std::error::Error for PlannerStatusParseError {}

/// The planner state machine.
///
/// ```text
/// idle       -> generating
/// generating -> applied
/// generating -> failed
/// applied    -> idle
/// failed     -> idle
/// ```
pub struct PlannerStateMachine;

impl PlannerStateMachine {
    pub fn is_valid_transition(from: PlannerStatus, to: PlannerStatus) -> bool {
        matches!(
            (from, to),
            (PlannerStatus::Idle, PlannerStatus::Generating)
                | (PlannerStatus::Generating, PlannerStatus::Applied)
                | (PlannerStatus::Generating, PlannerStatus::Failed)
                | (PlannerStatus::Applied, PlannerStatus::Idle)
                | (PlannerStatus::Failed, PlannerStatus::Idle)
        )
    }
}

// ---------------------------------------------------------------------------
// Single-flight cell
// ---------------------------------------------------------------------------

/// Planner status shared between concurrent callers.
#[derive(Debug, Default)]
pub(crate) struct StatusCell(Mutex<PlannerStatus>);

impl StatusCell {
    fn lock(&self) -> MutexGuard<'_, PlannerStatus> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn get(&self) -> PlannerStatus {
        *self.lock()
    }

    /// Move `Idle -> Generating` atomically. `None` when a cycle is already
    /// running.
    pub(crate) fn try_begin(&self) -> Option<CycleGuard<'_>> {
        let mut status = self.lock();
        if *status != PlannerStatus::Idle {
            return None;
        }
        *status = PlannerStatus::Generating;
        Some(CycleGuard { cell: self })
    }

    fn advance(&self, to: PlannerStatus) {
        let mut status = self.lock();
        let from = *status;
        if PlannerStateMachine::is_valid_transition(from, to) {
            *status = to;
        } else {
            tracing::warn!(%from, %to, "ignoring invalid planner transition");
        }
    }
}

/// One in-flight generation cycle. Dropping it always returns the planner
/// to `Idle`, settled or not.
pub(crate) struct CycleGuard<'a> {
    cell: &'a StatusCell,
}

impl CycleGuard<'_> {
    /// Record the terminal state of this cycle.
    pub(crate) fn settle(&self, outcome: PlannerStatus) {
        self.cell.advance(outcome);
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        *self.cell.lock() = PlannerStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_graph() {
        use PlannerStatus::*;
        let valid = [
            (Idle, Generating),
            (Generating, Applied),
            (Generating, Failed),
            (Applied, Idle),
            (Failed, Idle),
        ];
        for from in [Idle, Generating, Applied, Failed] {
            for to in [Idle, Generating, Applied, Failed] {
                assert_eq!(
                    PlannerStateMachine::is_valid_transition(from, to),
                    valid.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn display_roundtrip() {
        for status in [
            PlannerStatus::Idle,
            PlannerStatus::Generating,
            PlannerStatus::Applied,
            PlannerStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<PlannerStatus>().unwrap(), status);
        }
        assert!("busy".parse::<PlannerStatus>().is_err());
    }

    #[test]
    fn second_begin_is_rejected_until_guard_drops() {
        let cell = StatusCell::default();
        let guard = cell.try_begin().unwrap();
        assert_eq!(cell.get(), PlannerStatus::Generating);
        assert!(cell.try_begin().is_none());

        guard.settle(PlannerStatus::Applied);
        assert_eq!(cell.get(), PlannerStatus::Applied);
        assert!(cell.try_begin().is_none());

        drop(guard);
        assert_eq!(cell.get(), PlannerStatus::Idle);
        assert!(cell.try_begin().is_some());
    }

    #[test]
    fn unsettled_guard_still_returns_to_idle() {
        let cell = StatusCell::default();
        drop(cell.try_begin().unwrap());
        assert_eq!(cell.get(), PlannerStatus::Idle);
    }
}
