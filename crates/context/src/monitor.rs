//! Periodic background analysis for a [`ContextEngine`].

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::ContextEngine;

/// Re-runs [`ContextEngine::analyze_current_context`] on a fixed period
/// until stopped or dropped.
pub struct ContextMonitor {
    engine: Arc<ContextEngine>,
    period: Duration,
    cancel_token: Mutex<Option<CancellationToken>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ContextMonitor {
    pub fn new(engine: Arc<ContextEngine>, period: Duration) -> Self {
        Self {
            engine,
            period,
            cancel_token: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel_token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Spawn the loop. Returns false if it is already running.
    pub fn start(&self) -> bool {
        let mut slot = self.cancel_token.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return false;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(monitor_loop(
            self.engine.clone(),
            self.period,
            token.clone(),
        ));
        *slot = Some(token);
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);

        info!(period_secs = self.period.as_secs(), "Context monitor started");
        true
    }

    /// Cancel the loop and wait for it to exit. Safe to call when stopped.
    pub async fn stop(&self) {
        let token = self
            .cancel_token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(token) = token else {
            return;
        };
        token.cancel();

        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Context monitor task failed to join");
        }
    }
}

impl Drop for ContextMonitor {
    fn drop(&mut self) {
        if let Some(token) = self
            .cancel_token
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            token.cancel();
        }
    }
}

async fn monitor_loop(engine: Arc<ContextEngine>, period: Duration, cancel_token: CancellationToken) {
    // first pass one period after start
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fresh = engine.analyze_current_context();
                debug!(generated = fresh.len(), "Periodic context analysis");
            }
            _ = cancel_token.cancelled() => {
                info!("Context monitor shutting down");
                break;
            }
        }
    }
}
