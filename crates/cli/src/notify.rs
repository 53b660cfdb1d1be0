//! A notification sink that writes to the log.
//!
//! Stands in for a platform notifier on hosts without one.

use aria_core::{Notification, NotificationError, NotificationSink};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Default)]
pub struct LogNotificationSink;

fn emit(notification: &Notification, scheduled: bool) {
    let priority = notification
        .priority
        .map(|p| format!("{p:?}").to_lowercase())
        .unwrap_or_else(|| "default".into());
    let actions: Vec<&str> = notification.actions.iter().map(|a| a.title.as_str()).collect();
    info!(
        title = %notification.title,
        body = %notification.body,
        priority = %priority,
        actions = ?actions,
        scheduled,
        "Notification"
    );
}

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        emit(&notification, false);
        Ok(())
    }

    async fn schedule_after(
        &self,
        delay: Duration,
        notification: Notification,
    ) -> Result<(), NotificationError> {
        info!(title = %notification.title, delay_secs = delay.as_secs(), "Notification scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            emit(&notification, true);
        });
        Ok(())
    }
}
