//! The composition root: one instance of every engine, wired together.

use aria_autonomy::Orchestrator;
use aria_config::AppConfig;
use aria_context::ContextEngine;
use aria_core::{Clock, SystemClock};
use aria_reasoning::{ReasoningEngine, build_from_config};
use aria_sensors::{ScriptedSensorSource, SensorManager};
use std::sync::Arc;

use crate::notify::LogNotificationSink;

pub struct Runtime {
    pub config: AppConfig,
    /// Host without platform sensors: samples are pushed in by the caller.
    pub source: Arc<ScriptedSensorSource>,
    pub sensors: Arc<SensorManager>,
    pub reasoning: Arc<ReasoningEngine>,
    pub context: Arc<ContextEngine>,
    pub orchestrator: Arc<Orchestrator>,
}

impl Runtime {
    pub fn build(config: AppConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let source = Arc::new(ScriptedSensorSource::new());
        let sensors = Arc::new(SensorManager::new(source.clone(), config.sensors.clone()));
        let reasoning = Arc::new(build_from_config(&config, clock.clone()));
        let context = Arc::new(ContextEngine::new(
            sensors.clone(),
            reasoning.clone(),
            clock.clone(),
            config.context.clone(),
            config.user.preferences(),
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            context.clone(),
            reasoning.clone(),
            Arc::new(LogNotificationSink),
            clock,
            config.autonomy.clone(),
        ));

        Self {
            config,
            source,
            sensors,
            reasoning,
            context,
            orchestrator,
        }
    }
}
