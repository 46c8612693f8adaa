//! Scheduling core for CreatorFlow: inventory aging, AI schedule generation,
//! the planner workflow, and the application-state container it commits to.

pub mod aging;
pub mod clock;
pub mod generate;
pub mod orchestrator;
pub mod report;
pub mod state;
