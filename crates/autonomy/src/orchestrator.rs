//! The autonomous orchestrator.
//!
//! Two optional background loops, both spawned tasks stopped through a
//! [`CancellationToken`]:
//! - the analysis loop, running while autonomous mode is on
//! - the background pass, a lighter sweep registered once by the host
//!
//! Shutdown is eventual. A cycle already past its tick finishes its backend
//! calls; results arriving after deactivation are dropped. Every stop bumps
//! a stop epoch, and a cycle only files follow-up pending tasks while the
//! epoch it started under is still current.
//!
//! The loops hold only a weak reference, so dropping the last
//! `Arc<Orchestrator>` cancels them.

use aria_config::AutonomyConfig;
use aria_context::ContextEngine;
use aria_core::{
    AutonomousTask, Clock, Context, Insight, Notification, NotificationError,
    NotificationPriority, NotificationSink, Priority, QuickAction, TaskError, TaskKind,
    TaskStatus,
};
use aria_reasoning::{ReasoningEngine, ReasoningInput};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::actions::SafeAction;
use crate::book::TaskBook;
use crate::schedule::next_daily_at;

const DAILY_SUMMARY_TITLE: &str = "Daily Summary";

/// Counts the host can show in a status view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemStatus {
    pub is_active: bool,
    pub active_tasks: usize,
    pub pending_tasks: usize,
    pub completed_tasks: usize,
    pub background_task_registered: bool,
}

/// What one analysis cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub insights: usize,
    pub escalated: usize,
    pub recommendations: usize,
    pub tasks_run: usize,
}

/// A cancellable spawned loop.
struct LoopHandle {
    token: CancellationToken,
    _handle: tokio::task::JoinHandle<()>,
}

pub struct Orchestrator {
    context: Arc<ContextEngine>,
    reasoning: Arc<ReasoningEngine>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    config: AutonomyConfig,
    tasks: RwLock<TaskBook>,
    active: AtomicBool,
    /// Bumped under the task lock by every stop.
    stop_epoch: AtomicU64,
    analysis_loop: Mutex<Option<LoopHandle>>,
    background_loop: Mutex<Option<LoopHandle>>,
}

impl Orchestrator {
    pub fn new(
        context: Arc<ContextEngine>,
        reasoning: Arc<ReasoningEngine>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        config: AutonomyConfig,
    ) -> Self {
        Self {
            context,
            reasoning,
            notifier,
            clock,
            config,
            tasks: RwLock::new(TaskBook::default()),
            active: AtomicBool::new(false),
            stop_epoch: AtomicU64::new(0),
            analysis_loop: Mutex::new(None),
            background_loop: Mutex::new(None),
        }
    }

    pub fn is_autonomous_mode_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Seed the standing tasks and start the analysis loop. A no-op when
    /// already active.
    pub async fn start_autonomous_mode(self: &Arc<Self>) {
        if self.active.swap(true, Ordering::SeqCst) {
            info!("Autonomous mode already active");
            return;
        }
        info!("Starting autonomous mode");

        self.seed_tasks();

        let period = Duration::from_secs(self.config.analysis_interval_secs);
        let handle = spawn_loop(period, "analysis", Arc::downgrade(self), |this: Arc<Self>| async move {
            if this.is_autonomous_mode_active() {
                this.run_analysis_cycle().await;
            }
        });
        if let Some(old) = self.lock_loop(&self.analysis_loop).replace(handle) {
            old.token.cancel();
        }

        let _ = self
            .notify(
                Notification::new(
                    "ARIA Activated",
                    "Autonomous reasoning and assistance is now active",
                )
                .with_priority(NotificationPriority::Normal),
            )
            .await;
    }

    /// Stop the loop and cancel every pending task. A no-op when inactive.
    pub async fn stop_autonomous_mode(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("Stopping autonomous mode");

        if let Some(handle) = self.lock_loop(&self.analysis_loop).take() {
            handle.token.cancel();
        }

        let cancelled = {
            let mut book = self.book_mut();
            self.stop_epoch.fetch_add(1, Ordering::SeqCst);
            let pending = book.ids_with_status(TaskStatus::Pending);
            for id in &pending {
                // pending -> cancelled is always a legal edge
                let _ = book.transition(id, TaskStatus::Cancelled);
            }
            pending.len()
        };
        debug!(cancelled, "Pending tasks cancelled");

        let _ = self
            .notify(
                Notification::new("ARIA Deactivated", "Autonomous mode has been stopped")
                    .with_priority(NotificationPriority::Normal),
            )
            .await;
    }

    fn seed_tasks(&self) {
        let now = self.clock.now();
        let context = self.context.update_context(None, None, None);

        let monitor = AutonomousTask::new(
            task_id("context_monitor"),
            TaskKind::Observation,
            "Context Monitoring",
            "Continuously monitor user context and environment for insights",
            None,
            context.clone(),
            TaskStatus::Active,
            Priority::Medium,
            now,
        );
        let summary = self.daily_summary_task(now, context.clone());
        let wellness = AutonomousTask::new(
            task_id("wellness_check"),
            TaskKind::Reminder,
            "Wellness Check",
            "Proactive wellness and activity recommendations",
            None,
            context,
            TaskStatus::Pending,
            Priority::Medium,
            now,
        );

        let mut book = self.book_mut();
        book.insert(monitor);
        book.insert(summary);
        book.insert(wellness);
        info!(tasks = book.len(), "Standing tasks created");
    }

    fn daily_summary_task(&self, now: chrono::DateTime<chrono::Local>, context: Context) -> AutonomousTask {
        AutonomousTask::new(
            task_id("daily_summary"),
            TaskKind::Analysis,
            DAILY_SUMMARY_TITLE,
            "Generate daily activity and insights summary",
            Some(next_daily_at(now, self.config.daily_summary_hour)),
            context,
            TaskStatus::Pending,
            Priority::Low,
            now,
        )
    }

    /// One pass of the analysis loop: escalate elevated insights, ask for
    /// recommendations, then run whatever scheduled tasks have come due.
    pub async fn run_analysis_cycle(&self) -> CycleReport {
        info!("Executing autonomous analysis");
        let epoch = self.stop_epoch.load(Ordering::SeqCst);
        let mut report = CycleReport::default();

        let insights = self.context.analyze_current_context();
        report.insights = insights.len();
        for insight in insights.iter().filter(|i| i.priority.is_elevated()) {
            self.handle_urgent_insight(insight, epoch).await;
            report.escalated += 1;
        }

        if let Some(context) = self.context.latest_context() {
            let snapshot = self.context.sensors().get_current_data();
            let recommendations = self
                .context
                .generate_proactive_recommendations(&context, &snapshot)
                .await;

            if self.stopped_since(epoch) {
                debug!("Autonomous mode stopped mid-cycle, discarding recommendations");
                return report;
            }
            if !recommendations.is_empty()
                && self.create_recommendation_task(&recommendations, context, epoch).await
            {
                report.recommendations = recommendations.len();
            }
        }

        report.tasks_run = self.process_scheduled_tasks(epoch).await;
        report
    }

    async fn handle_urgent_insight(&self, insight: &Insight, epoch: u64) {
        info!(title = %insight.title, priority = %insight.priority, "Handling urgent insight");
        let limit = self.config.max_actions_per_insight;

        let quick_actions = insight
            .actions
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, action)| QuickAction {
                id: format!("action_{i}"),
                title: action.clone(),
            })
            .collect();
        let mut notification = Notification::new(&insight.title, &insight.description)
            .with_priority(NotificationPriority::High)
            .with_actions(quick_actions);
        notification.data = serde_json::to_value(insight).ok();
        let _ = self.notify(notification).await;

        let task = AutonomousTask::new(
            format!("urgent_{}", insight.id),
            TaskKind::Action,
            format!("Handle: {}", insight.title),
            format!("Autonomous response to urgent insight: {}", insight.description),
            None,
            self.current_context(),
            TaskStatus::Active,
            Priority::Urgent,
            self.clock.now(),
        );
        self.book_mut().insert(task);

        let actions: Vec<&str> = insight.actions.iter().take(limit).map(String::as_str).collect();
        self.execute_autonomous_actions(&actions, insight, epoch).await;
    }

    /// Run the whitelisted subset of `actions`. Unrecognised text does nothing.
    async fn execute_autonomous_actions(&self, actions: &[&str], insight: &Insight, epoch: u64) {
        for action in actions {
            let Some(kind) = SafeAction::classify(action) else {
                debug!(action, "Not a safe autonomous action, skipping");
                continue;
            };
            info!(action, kind = %kind, "Executing autonomous action");

            match kind {
                SafeAction::Reminder => {
                    let mut reminder = Notification::new("ARIA Reminder", *action);
                    reminder.data = Some(serde_json::json!({
                        "type": "autonomous_reminder",
                        "context": insight,
                    }));
                    let delay = Duration::from_secs(self.config.reminder_delay_secs);
                    if let Err(e) = self.notifier.schedule_after(delay, reminder).await {
                        warn!(error = %e, "Failed to schedule reminder");
                    }
                }
                SafeAction::Notify => {
                    let mut alert = Notification::new("ARIA Alert", *action)
                        .with_priority(NotificationPriority::Normal);
                    alert.data = serde_json::to_value(insight).ok();
                    let _ = self.notify(alert).await;
                }
                SafeAction::Analyze => {
                    let now = self.clock.now();
                    let delay = chrono::Duration::seconds(
                        i64::try_from(self.config.scheduled_analysis_delay_secs).unwrap_or(i64::MAX),
                    );
                    self.file_follow_up(
                        AutonomousTask::new(
                            task_id("scheduled_analysis"),
                            TaskKind::Analysis,
                            "Scheduled Analysis",
                            *action,
                            Some(now + delay),
                            self.current_context(),
                            TaskStatus::Pending,
                            Priority::Medium,
                            now,
                        ),
                        epoch,
                    );
                }
            }
        }
    }

    /// False if autonomous mode was stopped and the task was not filed.
    async fn create_recommendation_task(
        &self,
        recommendations: &[String],
        context: Context,
        epoch: u64,
    ) -> bool {
        let count = recommendations.len();
        let task = AutonomousTask::new(
            task_id("recommendations"),
            TaskKind::Reminder,
            "AI Recommendations",
            format!("Based on your current context, I have {count} suggestions for you."),
            None,
            context,
            TaskStatus::Pending,
            Priority::Low,
            self.clock.now(),
        );
        let task_id = task.id.clone();
        if !self.file_follow_up(task, epoch) {
            return false;
        }

        let mut notification = Notification::new(
            "ARIA Recommendations",
            format!("I have {count} personalized suggestions based on your current context."),
        )
        .with_priority(NotificationPriority::Normal);
        notification.data = Some(serde_json::json!({
            "recommendations": recommendations,
            "taskId": task_id,
        }));
        let _ = self.notify(notification).await;
        true
    }

    /// Run every pending task whose schedule has elapsed. Returns how many ran.
    async fn process_scheduled_tasks(&self, epoch: u64) -> usize {
        let due = self.book().due(&self.clock.now());
        let mut ran = 0;
        for id in due {
            if self.execute_task(&id, epoch).await {
                ran += 1;
            }
        }
        ran
    }

    /// Wrap a task body in active -> completed/failed. False if the task was
    /// no longer pending when its turn came.
    async fn execute_task(&self, id: &str, epoch: u64) -> bool {
        let task = {
            let mut book = self.book_mut();
            if book.transition(id, TaskStatus::Active).is_err() {
                return false;
            }
            match book.get(id) {
                Some(task) => task.clone(),
                None => return false,
            }
        };
        info!(task_id = %id, title = %task.title, kind = %task.kind, "Processing scheduled task");

        let outcome = match task.kind {
            TaskKind::Analysis => self.run_analysis_task(&task, epoch).await,
            TaskKind::Reminder => self.run_reminder_task(&task).await,
            TaskKind::Action => self.run_action_task(&task).await,
            TaskKind::Observation => {
                debug!(title = %task.title, "Observation task is continuous");
                Ok(())
            }
        };

        let next = match &outcome {
            Ok(()) => TaskStatus::Completed,
            Err(e) => {
                error!(task_id = %id, error = %e, "Task execution failed");
                TaskStatus::Failed
            }
        };
        if let Err(e) = self.book_mut().transition(id, next) {
            warn!(task_id = %id, error = %e, "Could not record task outcome");
        }
        true
    }

    async fn run_analysis_task(&self, task: &AutonomousTask, epoch: u64) -> Result<(), TaskError> {
        if !task.title.contains(DAILY_SUMMARY_TITLE) {
            let fresh = self.context.analyze_current_context();
            debug!(generated = fresh.len(), "Scheduled analysis ran");
            return Ok(());
        }

        let summary = self.generate_daily_summary().await.ok_or_else(|| {
            TaskError::ExecutionFailed {
                task_id: task.id.clone(),
                reason: "daily summary generation failed".into(),
            }
        })?;

        let next = self.daily_summary_task(self.clock.now(), self.current_context());
        self.file_follow_up(next, epoch);

        let mut notification = Notification::new(
            "Daily Summary Ready",
            "Your personalized daily analysis and insights are ready.",
        )
        .with_priority(NotificationPriority::Normal);
        notification.data = Some(serde_json::json!({
            "summary": summary,
            "type": "daily_summary",
        }));
        self.notify(notification).await.map_err(|e| failed(task, e))
    }

    async fn run_reminder_task(&self, task: &AutonomousTask) -> Result<(), TaskError> {
        let mut notification = Notification::new(&task.title, &task.description)
            .with_priority(NotificationPriority::Normal);
        notification.data = serde_json::to_value(task).ok();
        self.notify(notification).await.map_err(|e| failed(task, e))
    }

    async fn run_action_task(&self, task: &AutonomousTask) -> Result<(), TaskError> {
        let notification = Notification::new(
            &task.title,
            format!("Autonomous action completed: {}", task.description),
        )
        .with_priority(NotificationPriority::Normal);
        self.notify(notification).await.map_err(|e| failed(task, e))
    }

    /// Summary text from the reasoning engine, or `None` if it failed.
    async fn generate_daily_summary(&self) -> Option<String> {
        let history = self.context.get_context_history();
        let insights = self.context.get_current_insights();
        let high = insights.iter().filter(|i| i.priority == Priority::High).count();

        let query = format!(
            "Generate a comprehensive daily summary based on the user's context and activity patterns:\n\
             \n\
             Context Data:\n\
             - Total context changes: {}\n\
             - Insights generated: {}\n\
             - High priority insights: {high}\n\
             \n\
             Recent patterns from context history and provide a meaningful daily summary with:\n\
             1. Activity patterns observed\n\
             2. Notable insights and observations\n\
             3. Recommendations for tomorrow\n\
             4. Any areas of concern or positive trends\n\
             \n\
             Keep the summary concise but informative.",
            history.len(),
            insights.len(),
        );

        let response = self
            .reasoning
            .process_query(&ReasoningInput::new(query, self.current_context()))
            .await;
        if response.is_error() {
            warn!("Daily summary generation failed");
            return None;
        }
        Some(response.content)
    }

    /// The lighter pass run on background opportunities: only urgent
    /// insights are notified and nothing else is created.
    pub async fn run_background_pass(&self) -> usize {
        debug!("Background analysis executing");
        let insights = self.context.analyze_current_context();
        let mut sent = 0;
        for insight in insights.iter().filter(|i| i.priority == Priority::Urgent) {
            let mut notification = Notification::new(&insight.title, &insight.description)
                .with_priority(NotificationPriority::High);
            notification.data = serde_json::to_value(insight).ok();
            if self.notify(notification).await.is_ok() {
                sent += 1;
            }
        }
        sent
    }

    /// Run [`run_background_pass`](Self::run_background_pass) on the
    /// configured interval. Returns false if already registered.
    pub fn register_background(self: &Arc<Self>) -> bool {
        let mut slot = self.lock_loop(&self.background_loop);
        if slot.is_some() {
            return false;
        }
        let period = Duration::from_secs(self.config.background_interval_secs);
        *slot = Some(spawn_loop(period, "background", Arc::downgrade(self), |this: Arc<Self>| async move {
            this.run_background_pass().await;
        }));
        info!(period_secs = period.as_secs(), "Background task registered");
        true
    }

    pub fn unregister_background(&self) {
        if let Some(handle) = self.lock_loop(&self.background_loop).take() {
            handle.token.cancel();
            info!("Background task unregistered");
        }
    }

    /// Create a pending task and announce it. Returns the new id.
    pub async fn create_custom_task(
        &self,
        kind: TaskKind,
        title: &str,
        description: &str,
        scheduled_for: Option<chrono::DateTime<chrono::Local>>,
        priority: Priority,
    ) -> String {
        let task = AutonomousTask::new(
            task_id("custom"),
            kind,
            title,
            description,
            scheduled_for,
            self.current_context(),
            TaskStatus::Pending,
            priority,
            self.clock.now(),
        );
        let id = task.id.clone();
        let data = serde_json::to_value(&task).ok();
        self.book_mut().insert(task);

        let mut notification = Notification::new("New Task Created", format!("{title} has been scheduled"))
            .with_priority(NotificationPriority::Normal);
        notification.data = data;
        let _ = self.notify(notification).await;
        id
    }

    /// Cancel a pending task. False for any other status or an unknown id.
    pub fn cancel_task(&self, id: &str) -> bool {
        self.update_task_status(id, TaskStatus::Cancelled).is_ok()
    }

    /// The one way to move a task along its lifecycle.
    pub fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<(), TaskError> {
        self.book_mut().transition(id, status)?;
        info!(task_id = %id, status = %status, "Task status updated");
        Ok(())
    }

    /// Every tracked task, oldest first.
    pub fn get_active_tasks(&self) -> Vec<AutonomousTask> {
        self.book().all().to_vec()
    }

    pub fn get_task(&self, id: &str) -> Option<AutonomousTask> {
        self.book().get(id).cloned()
    }

    pub fn get_system_status(&self) -> SystemStatus {
        let book = self.book();
        SystemStatus {
            is_active: self.is_autonomous_mode_active(),
            active_tasks: book.count(TaskStatus::Active),
            pending_tasks: book.count(TaskStatus::Pending),
            completed_tasks: book.count(TaskStatus::Completed),
            background_task_registered: self.lock_loop(&self.background_loop).is_some(),
        }
    }

    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        let title = notification.title.clone();
        match self.notifier.send(notification).await {
            Ok(()) => {
                debug!(%title, "Notification sent");
                Ok(())
            }
            Err(e) => {
                warn!(%title, error = %e, "Notification failed");
                Err(e)
            }
        }
    }

    fn stopped_since(&self, epoch: u64) -> bool {
        self.stop_epoch.load(Ordering::SeqCst) != epoch
    }

    /// Insert a task created by a cycle, unless a stop has happened since
    /// `epoch`. Checked under the task lock so a concurrent stop either sees
    /// the task and cancels it or the task is never filed.
    fn file_follow_up(&self, task: AutonomousTask, epoch: u64) -> bool {
        let mut book = self.book_mut();
        if self.stopped_since(epoch) {
            debug!(title = %task.title, "Autonomous mode stopped, follow-up task dropped");
            return false;
        }
        book.insert(task);
        true
    }

    fn current_context(&self) -> Context {
        self.context
            .latest_context()
            .unwrap_or_else(|| Context::bare(Default::default(), self.clock.now()))
    }

    fn book(&self) -> std::sync::RwLockReadGuard<'_, TaskBook> {
        self.tasks.read().unwrap_or_else(|e| e.into_inner())
    }

    fn book_mut(&self) -> std::sync::RwLockWriteGuard<'_, TaskBook> {
        self.tasks.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_loop<'a>(
        &self,
        slot: &'a Mutex<Option<LoopHandle>>,
    ) -> std::sync::MutexGuard<'a, Option<LoopHandle>> {
        slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        for slot in [&self.analysis_loop, &self.background_loop] {
            if let Some(handle) = slot.lock().unwrap_or_else(|e| e.into_inner()).take() {
                handle.token.cancel();
            }
        }
    }
}

fn task_id(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

fn failed(task: &AutonomousTask, e: NotificationError) -> TaskError {
    TaskError::ExecutionFailed {
        task_id: task.id.clone(),
        reason: e.to_string(),
    }
}

/// Tick `body` every `period`, first tick one period after spawn. Each tick
/// upgrades `target`; the loop ends once it is gone.
fn spawn_loop<T, F, Fut>(period: Duration, name: &'static str, target: Weak<T>, body: F) -> LoopHandle
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancel = token.clone();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some(target) = target.upgrade() else {
                        debug!(loop_name = name, "Owner dropped, loop exiting");
                        break;
                    };
                    body(target).await;
                }
                _ = cancel.cancelled() => {
                    info!(loop_name = name, "Loop shutting down");
                    break;
                }
            }
        }
    });
    LoopHandle {
        token,
        _handle: handle,
    }
}
