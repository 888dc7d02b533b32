//! Task progress reporting for plans being executed.

use std::fmt::Write as _;

use serde::Serialize;

use crate::core::plan::{PlanTask, TaskStatus};

/// Number of cells in the progress bar.
const BAR_WIDTH: usize = 10;

/// Tasks shown after the current one.
const LOOKAHEAD: usize = 3;

/// Summary of a task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    /// Completed share, rounded to whole percent.
    pub percentage: u8,
    pub progress_bar: String,
    pub current_task: Option<PlanTask>,
    pub next_tasks: Vec<PlanTask>,
}

fn count(tasks: &[PlanTask], status: TaskStatus) -> usize {
    tasks.iter().filter(|t| t.status == status).count()
}

fn current_index(tasks: &[PlanTask]) -> Option<usize> {
    tasks.iter().position(|t| t.status == TaskStatus::InProgress)
}

fn pending(tasks: &[PlanTask]) -> impl Iterator<Item = &PlanTask> {
    tasks.iter().filter(|t| t.status == TaskStatus::Pending)
}

/// Rounded percentage of `part` in `total`.
#[allow(clippy::cast_possible_truncation)]
fn percentage(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((part * 100 + total / 2) / total).min(100) as u8
}

/// Ten-cell bar for a percentage.
#[must_use]
pub fn progress_bar(percentage: u8) -> String {
    let filled = ((usize::from(percentage) + 5) / 10).min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Summarise a task list.
#[must_use]
pub fn progress(tasks: &[PlanTask]) -> ProgressReport {
    let completed = count(tasks, TaskStatus::Completed);
    let percentage = percentage(completed, tasks.len());

    let report = ProgressReport {
        total: tasks.len(),
        completed,
        in_progress: count(tasks, TaskStatus::InProgress),
        pending: count(tasks, TaskStatus::Pending),
        percentage,
        progress_bar: progress_bar(percentage),
        current_task: current_index(tasks).map(|i| tasks[i].clone()),
        next_tasks: next_tasks(tasks),
    };

    tracing::debug!(
        total = report.total,
        completed = report.completed,
        percentage = report.percentage,
        "progress calculated"
    );
    report
}

/// Pending tasks following the current one (or the first pending ones).
fn next_tasks(tasks: &[PlanTask]) -> Vec<PlanTask> {
    match current_index(tasks) {
        Some(i) => tasks
            .iter()
            .skip(i + 1)
            .take(LOOKAHEAD)
            .filter(|t| t.status == TaskStatus::Pending)
            .cloned()
            .collect(),
        None => pending(tasks).take(LOOKAHEAD).cloned().collect(),
    }
}

/// The current task and the three after it, or the first four pending tasks.
#[must_use]
pub fn focus_chain(tasks: &[PlanTask]) -> Vec<PlanTask> {
    match current_index(tasks) {
        Some(i) => tasks.iter().skip(i).take(LOOKAHEAD + 1).cloned().collect(),
        None => pending(tasks).take(LOOKAHEAD + 1).cloned().collect(),
    }
}

/// Copy of `tasks` with the status of `task_id` replaced.
#[must_use]
pub fn update_task_status(tasks: &[PlanTask], task_id: &str, status: TaskStatus) -> Vec<PlanTask> {
    tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            if task.id == task_id {
                task.status = status;
            }
            task
        })
        .collect()
}

const fn icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "✅",
        TaskStatus::InProgress => "🔄",
        TaskStatus::Pending => "⏸️",
    }
}

/// One-line progress summary.
#[must_use]
pub fn format_progress(report: &ProgressReport) -> String {
    format!(
        "Progress: {} {}% ({}/{} tasks)",
        report.progress_bar, report.percentage, report.completed, report.total
    )
}

/// Numbered task list with status icons.
#[must_use]
pub fn format_task_list(tasks: &[PlanTask]) -> String {
    let mut out = String::from("Tasks:");
    for (i, task) in tasks.iter().enumerate() {
        let current = if task.status == TaskStatus::InProgress {
            " (current)"
        } else {
            ""
        };
        let _ = write!(out, "\n{} {}. {}{current}", icon(task.status), i + 1, task.title);
    }
    out
}

/// Current task followed by up to three pending ones.
#[must_use]
pub fn format_focus_chain(tasks: &[PlanTask]) -> String {
    let mut lines = vec!["🎯 Focus Chain:".to_string(), String::new()];

    if let Some(i) = current_index(tasks) {
        lines.push("Current task:".to_string());
        lines.push(format!("→ {}", tasks[i].title));
        lines.push(String::new());
    }

    let next: Vec<_> = pending(tasks).take(LOOKAHEAD).collect();
    if !next.is_empty() {
        lines.push("Up next:".to_string());
        for (i, task) in next.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, task.title));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::plan::{Operation, RiskLevel};

    fn task(id: &str, status: TaskStatus) -> PlanTask {
        PlanTask {
            id: id.to_string(),
            title: format!("Task {id}"),
            operation: Operation::Update,
            target: String::new(),
            description: String::new(),
            verification: String::new(),
            risk_level: RiskLevel::Low,
            status,
            estimated_time: None,
        }
    }

    fn ids(tasks: &[PlanTask]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn sample() -> Vec<PlanTask> {
        vec![
            task("1", TaskStatus::Completed),
            task("2", TaskStatus::InProgress),
            task("3", TaskStatus::Pending),
            task("4", TaskStatus::Pending),
            task("5", TaskStatus::Pending),
            task("6", TaskStatus::Pending),
        ]
    }

    #[test]
    fn report_counts_and_bar() {
        let report = progress(&sample());

        assert_eq!(report.total, 6);
        assert_eq!(report.completed, 1);
        assert_eq!(report.in_progress, 1);
        assert_eq!(report.pending, 4);
        assert_eq!(report.percentage, 17);
        assert_eq!(report.progress_bar, "██░░░░░░░░");
        assert_eq!(report.current_task.map(|t| t.id), Some("2".to_string()));
        assert_eq!(ids(&report.next_tasks), vec!["3", "4", "5"]);
    }

    #[test]
    fn empty_task_list() {
        let report = progress(&[]);
        assert_eq!(report.percentage, 0);
        assert_eq!(report.progress_bar, "░░░░░░░░░░");
        assert!(report.current_task.is_none());
    }

    #[test]
    fn bar_extremes() {
        assert_eq!(progress_bar(100), "██████████");
        assert_eq!(progress_bar(4), "░░░░░░░░░░");
        assert_eq!(progress_bar(50), "█████░░░░░");
    }

    #[test]
    fn focus_chain_starts_at_current() {
        assert_eq!(ids(&focus_chain(&sample())), vec!["2", "3", "4", "5"]);

        let idle = vec![
            task("1", TaskStatus::Completed),
            task("2", TaskStatus::Pending),
            task("3", TaskStatus::Pending),
        ];
        assert_eq!(ids(&focus_chain(&idle)), vec!["2", "3"]);
    }

    #[test]
    fn update_status_only_touches_target() {
        let updated = update_task_status(&sample(), "3", TaskStatus::Completed);
        assert_eq!(updated[2].status, TaskStatus::Completed);
        assert_eq!(updated[3].status, TaskStatus::Pending);
        assert_eq!(progress(&updated).completed, 2);
    }

    #[test]
    fn formatting() {
        let tasks = sample();
        assert_eq!(
            format_progress(&progress(&tasks)),
            "Progress: ██░░░░░░░░ 17% (1/6 tasks)"
        );

        let list = format_task_list(&tasks[..2]);
        assert_eq!(list, "Tasks:\n✅ 1. Task 1\n🔄 2. Task 2 (current)");

        let chain = format_focus_chain(&tasks);
        assert!(chain.contains("→ Task 2"));
        assert!(chain.contains("  3. Task 5"));
        assert!(!chain.contains("Task 6"));
    }
}
