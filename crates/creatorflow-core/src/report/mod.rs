//! Aggregates behind the dashboard and reports screens.

use chrono::NaiveDate;

use creatorflow_store::models::{ChannelMap, ChannelName, Task};

/// Progress of one channel toward its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelProgress {
    pub name: ChannelName,
    pub target: u32,
    /// Tasks scheduled on the channel.
    pub actual: usize,
    pub completed: usize,
    /// `completed / target` as a rounded percentage; 0 when the target is 0.
    pub progress_pct: u32,
}

/// Totals across a set of tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleSummary {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    pub completion_pct: u32,
    pub total_minutes: u64,
    pub completed_minutes: u64,
}

fn rounded_pct(part: usize, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

/// One entry per channel, in channel order. Tasks on channels that are not
/// in `channels` are ignored.
pub fn channel_progress(tasks: &[Task], channels: &ChannelMap) -> Vec<ChannelProgress> {
    channels
        .values()
        .map(|channel| {
            let on_channel = tasks.iter().filter(|t| t.channel == channel.name);
            let (actual, completed) = on_channel.fold((0, 0), |(all, done), t| {
                (all + 1, done + usize::from(t.is_completed))
            });
            ChannelProgress {
                name: channel.name.clone(),
                target: channel.target,
                actual,
                completed,
                progress_pct: rounded_pct(completed, u64::from(channel.target)),
            }
        })
        .collect()
}

pub fn summarize(tasks: &[Task]) -> ScheduleSummary {
    let mut summary = ScheduleSummary::default();
    for task in tasks {
        summary.total += 1;
        summary.total_minutes += u64::from(task.duration);
        if task.is_completed {
            summary.completed += 1;
            summary.completed_minutes += u64::from(task.duration);
        }
    }
    summary.remaining = summary.total - summary.completed;
    summary.completion_pct = rounded_pct(summary.completed, summary.total as u64);
    summary
}

/// Tasks placed on `date`, earliest first.
pub fn tasks_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    let mut day: Vec<&Task> = tasks.iter().filter(|t| t.date == date).collect();
    day.sort_by_key(|t| t.start_time);
    day
}
