//! The notification sink trait, over whatever the platform uses to notify.
//!
//! `send` delivers immediately. `schedule_after` is only used for explicit
//! reminders.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::NotificationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

/// A button shown on the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAction {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<NotificationPriority>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<QuickAction>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: None,
            priority: None,
            actions: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_actions(mut self, actions: Vec<QuickAction>) -> Self {
        self.actions = actions;
        self
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError>;

    async fn schedule_after(
        &self,
        delay: Duration,
        notification: Notification,
    ) -> Result<(), NotificationError>;
}
