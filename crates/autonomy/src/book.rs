//! Insertion-ordered task storage keyed by id.
//!
//! Nothing is evicted: finished tasks stay listed for the life of the
//! process, as the status view counts them.

use aria_core::{AutonomousTask, TaskError, TaskStatus};
use chrono::{DateTime, Local};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TaskBook {
    tasks: Vec<AutonomousTask>,
    /// id -> position in `tasks`
    index: HashMap<String, usize>,
}

impl TaskBook {
    /// Insert, replacing any task with the same id in place.
    pub fn insert(&mut self, task: AutonomousTask) {
        if let Some(slot) = self.index.get(&task.id).and_then(|&i| self.tasks.get_mut(i)) {
            *slot = task;
            return;
        }
        self.index.insert(task.id.clone(), self.tasks.len());
        self.tasks.push(task);
    }

    pub fn get(&self, id: &str) -> Option<&AutonomousTask> {
        self.index.get(id).and_then(|&i| self.tasks.get(i))
    }

    pub fn all(&self) -> &[AutonomousTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Apply one lifecycle transition.
    pub fn transition(&mut self, id: &str, next: TaskStatus) -> Result<(), TaskError> {
        self.index
            .get(id)
            .and_then(|&i| self.tasks.get_mut(i))
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?
            .transition(next)
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status() == status).count()
    }

    pub fn ids_with_status(&self, status: TaskStatus) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.status() == status)
            .map(|t| t.id.clone())
            .collect()
    }

    /// Pending tasks whose schedule has elapsed, in insertion order.
    pub fn due(&self, now: &DateTime<Local>) -> Vec<String> {
        self.tasks
            .iter()
            .filter(|t| t.is_due(now))
            .map(|t| t.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::{Context, Priority, TaskKind, UserPreferences};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap()
    }

    fn task(id: &str, status: TaskStatus, scheduled: Option<DateTime<Local>>) -> AutonomousTask {
        AutonomousTask::new(
            id,
            TaskKind::Reminder,
            id,
            "",
            scheduled,
            Context::bare(UserPreferences::default(), now()),
            status,
            Priority::Medium,
            now(),
        )
    }

    #[test]
    fn keeps_insertion_order() {
        let mut book = TaskBook::default();
        for id in ["c", "a", "b"] {
            book.insert(task(id, TaskStatus::Pending, None));
        }
        let ids: Vec<_> = book.all().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);

        book.insert(task("a", TaskStatus::Active, None));
        assert_eq!(book.len(), 3);
        assert_eq!(book.get("a").unwrap().status(), TaskStatus::Active);
    }

    #[test]
    fn lookups_follow_the_index() {
        let mut book = TaskBook::default();
        for i in 0..200 {
            book.insert(task(&format!("t{i}"), TaskStatus::Pending, None));
        }
        book.insert(task("t150", TaskStatus::Active, None));
        book.transition("t150", TaskStatus::Completed).unwrap();
        book.transition("t7", TaskStatus::Cancelled).unwrap();

        assert_eq!(book.len(), 200);
        assert_eq!(book.get("t150").unwrap().status(), TaskStatus::Completed);
        assert_eq!(book.get("t7").unwrap().status(), TaskStatus::Cancelled);
        assert_eq!(book.all()[150].id, "t150");
        assert!(book.get("t200").is_none());
    }

    #[test]
    fn transition_unknown_task() {
        let mut book = TaskBook::default();
        assert!(matches!(
            book.transition("nope", TaskStatus::Active),
            Err(TaskError::NotFound(_))
        ));
    }

    #[test]
    fn due_and_counts() {
        let mut book = TaskBook::default();
        book.insert(task("past", TaskStatus::Pending, Some(now() - Duration::minutes(5))));
        book.insert(task("future", TaskStatus::Pending, Some(now() + Duration::minutes(5))));
        book.insert(task("unscheduled", TaskStatus::Pending, None));
        book.insert(task("running", TaskStatus::Active, Some(now() - Duration::minutes(5))));

        assert_eq!(book.due(&now()), vec!["past"]);
        assert_eq!(book.count(TaskStatus::Pending), 3);
        assert_eq!(book.count(TaskStatus::Active), 1);
        assert_eq!(
            book.ids_with_status(TaskStatus::Pending),
            vec!["past", "future", "unscheduled"]
        );
    }
}
