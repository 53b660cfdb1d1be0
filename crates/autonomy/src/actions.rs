//! The whitelist of things the orchestrator may do without asking.
//!
//! Suggested action text is free-form model or rule output. It is matched
//! against a fixed set of keywords; anything else is ignored.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeAction {
    /// Schedule a reminder notification.
    Reminder,
    /// Send a notification right away.
    Notify,
    /// Schedule a later analysis task.
    Analyze,
}

impl SafeAction {
    /// First matching keyword wins, in the order reminder, notification, analyze.
    pub fn classify(action: &str) -> Option<Self> {
        let lower = action.to_lowercase();
        if lower.contains("reminder") {
            Some(SafeAction::Reminder)
        } else if lower.contains("notification") {
            Some(SafeAction::Notify)
        } else if lower.contains("analyze") {
            Some(SafeAction::Analyze)
        } else {
            None
        }
    }
}

impl fmt::Display for SafeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SafeAction::Reminder => "reminder",
            SafeAction::Notify => "notify",
            SafeAction::Analyze => "analyze",
        })
    }
}
