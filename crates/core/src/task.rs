//! Autonomous tasks and their lifecycle.
//!
//! ```text
//! pending ──► active ──► completed
//!    │           └─────► failed
//!    └──────► cancelled
//! ```
//!
//! completed, failed and cancelled are terminal.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::Context;
use crate::error::TaskError;
use crate::insight::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Observation,
    Analysis,
    Reminder,
    Action,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskKind::Observation => "observation",
            TaskKind::Analysis => "analysis",
            TaskKind::Reminder => "reminder",
            TaskKind::Action => "action",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Active)
                | (TaskStatus::Pending, TaskStatus::Cancelled)
                | (TaskStatus::Active, TaskStatus::Completed)
                | (TaskStatus::Active, TaskStatus::Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutonomousTask {
    pub id: String,
    pub kind: TaskKind,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Local>>,
    /// Snapshot of the context when the task was created.
    pub context: Context,
    status: TaskStatus,
    pub priority: Priority,
    pub created_at: DateTime<Local>,
}

impl AutonomousTask {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        kind: TaskKind,
        title: impl Into<String>,
        description: impl Into<String>,
        scheduled_for: Option<DateTime<Local>>,
        context: Context,
        status: TaskStatus,
        priority: Priority,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            description: description.into(),
            scheduled_for,
            context,
            status,
            priority,
            created_at,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Move along one lifecycle edge; anything else is rejected untouched.
    pub fn transition(&mut self, next: TaskStatus) -> Result<(), TaskError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Pending with a schedule that has elapsed.
    pub fn is_due(&self, now: &DateTime<Local>) -> bool {
        self.status == TaskStatus::Pending && self.scheduled_for.is_some_and(|at| at <= *now)
    }
}
