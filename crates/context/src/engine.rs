//! The context engine.
//!
//! Owns the context history and the retained insight set. Both sit behind
//! std locks that are never held across an await; analysis passes are
//! single-flight through an atomic flag.

use aria_config::ContextConfig;
use aria_core::{
    AudioData, Clock, Context, ContextLocation, DeviceState, Insight, MotionPattern,
    SensorSnapshot, TimeOfDay, UserPreferences, VisionAnalysis,
};
use aria_reasoning::{ReasoningEngine, ReasoningInput};
use aria_sensors::SensorManager;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::prompts;
use crate::rules::{self, PATTERN_WINDOW};

const PREDICTION_FAILED: &str = "Prediction failed due to error";
const SUMMARY_RECENT_ACTIVITY: usize = 3;

/// The parts of a future context the engine is willing to guess.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedContext {
    pub device_state: DeviceState,
    pub time_of_day: TimeOfDay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextPrediction {
    /// `None` when there was nothing to predict from.
    pub predicted: Option<PredictedContext>,
    pub confidence: f64,
    pub reasoning: String,
}

impl ContextPrediction {
    fn failed() -> Self {
        Self {
            predicted: None,
            confidence: aria_core::response::MIN_CONFIDENCE,
            reasoning: PREDICTION_FAILED.into(),
        }
    }
}

/// Clears the analysis flag when a pass ends, however it ends.
struct AnalysisGuard<'a>(&'a AtomicBool);

impl<'a> AnalysisGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for AnalysisGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ContextEngine {
    sensors: Arc<SensorManager>,
    reasoning: Arc<ReasoningEngine>,
    clock: Arc<dyn Clock>,
    config: ContextConfig,
    preferences: UserPreferences,
    history: RwLock<VecDeque<Context>>,
    insights: RwLock<Vec<Insight>>,
    analyzing: AtomicBool,
}

impl ContextEngine {
    pub fn new(
        sensors: Arc<SensorManager>,
        reasoning: Arc<ReasoningEngine>,
        clock: Arc<dyn Clock>,
        config: ContextConfig,
        preferences: UserPreferences,
    ) -> Self {
        Self {
            sensors,
            reasoning,
            clock,
            history: RwLock::new(VecDeque::with_capacity(config.history_limit)),
            insights: RwLock::new(Vec::new()),
            config,
            preferences,
            analyzing: AtomicBool::new(false),
        }
    }

    pub fn sensors(&self) -> &Arc<SensorManager> {
        &self.sensors
    }

    /// Derive a context from whatever inputs are present and append it to
    /// the history, evicting the oldest entry past the limit.
    pub fn update_context(
        &self,
        sensor: Option<&SensorSnapshot>,
        vision: Option<&VisionAnalysis>,
        audio: Option<&AudioData>,
    ) -> Context {
        let mut context = Context::bare(self.preferences.clone(), self.clock.now());

        if let Some(snapshot) = sensor {
            context.current_location = snapshot.location.as_ref().map(|l| ContextLocation {
                latitude: l.latitude,
                longitude: l.longitude,
                address: l.address.clone(),
            });
            if let Some(device) = &snapshot.device_info {
                context.device_state = DeviceState {
                    battery_pct: device.battery_pct,
                    connectivity: device.connectivity,
                    brightness_pct: device.brightness_pct,
                };
            }
        }
        context.recent_activity = self.recent_activity(sensor, vision, audio);

        {
            let mut history = self.history.write().unwrap_or_else(|e| e.into_inner());
            history.push_back(context.clone());
            while history.len() > self.config.history_limit {
                history.pop_front();
            }
        }

        debug!(
            time_of_day = %context.time_of_day,
            activities = context.recent_activity.len(),
            "Context updated"
        );
        context
    }

    fn recent_activity(
        &self,
        sensor: Option<&SensorSnapshot>,
        vision: Option<&VisionAnalysis>,
        audio: Option<&AudioData>,
    ) -> Vec<String> {
        let mut activity = Vec::new();

        if let Some(snapshot) = sensor
            && snapshot.accelerometer.is_some()
        {
            let motion = self.sensors.motion_of(snapshot);
            if motion != MotionPattern::Unknown {
                activity.push(format!("user_{motion}"));
            }
            activity.push(format!("device_{}", self.sensors.orientation_of(snapshot)));
        }

        if let Some(vision) = vision {
            activity.push("camera_used".to_string());
            if let Some(first) = vision.objects.first() {
                activity.push(format!("observed_{first}"));
            }
        }

        if let Some(audio) = audio {
            activity.push("voice_interaction".to_string());
            if !audio.transcription.is_empty() {
                activity.push("speech_detected".to_string());
            }
        }

        if sensor.is_some_and(|s| s.location.is_some()) {
            activity.push("location_tracked".to_string());
        }

        let excess = activity.len().saturating_sub(self.config.recent_activity_limit);
        activity.drain(..excess);
        activity
    }

    /// Run one analysis pass over the live sensor snapshot.
    ///
    /// Returns only the insights this pass generated. If another pass is in
    /// flight, returns the retained set untouched instead.
    pub fn analyze_current_context(&self) -> Vec<Insight> {
        let Some(_guard) = AnalysisGuard::acquire(&self.analyzing) else {
            debug!("Analysis already running, returning retained insights");
            return self.get_current_insights();
        };

        let snapshot = self.sensors.get_current_data();
        let context = self.update_context(Some(&snapshot), None, None);
        let now = self.clock.now();

        let mut fresh =
            rules::context_insights(&context, &snapshot, self.sensors.motion_of(&snapshot), now);
        let window = self.history_tail(PATTERN_WINDOW);
        fresh.extend(rules::history_insights(&window, now));

        self.retain(&fresh);

        if !fresh.is_empty() {
            info!(generated = fresh.len(), "Context analysis produced insights");
        }
        fresh
    }

    /// Append new insights, drop expired ones, keep the newest up to the limit.
    fn retain(&self, fresh: &[Insight]) {
        let max_age = chrono::Duration::seconds(
            i64::try_from(self.config.insight_max_age_secs).unwrap_or(i64::MAX),
        );
        let cutoff = self.clock.now() - max_age;

        let mut insights = self.insights.write().unwrap_or_else(|e| e.into_inner());
        insights.extend(fresh.iter().cloned());
        insights.retain(|insight| insight.timestamp > cutoff);
        // stable: equal timestamps keep insertion order
        insights.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        insights.truncate(self.config.insight_limit);
    }

    /// Ask the reasoning engine for suggestions. Empty on any failure.
    pub async fn generate_proactive_recommendations(
        &self,
        context: &Context,
        snapshot: &SensorSnapshot,
    ) -> Vec<String> {
        let query = prompts::recommendation_prompt(
            context,
            self.sensors.motion_of(snapshot),
            self.sensors.orientation_of(snapshot),
        );
        let input = ReasoningInput::new(query, context.clone()).with_sensor(snapshot.clone());

        let response = self.reasoning.process_query(&input).await;
        if response.is_error() {
            warn!("Proactive recommendations unavailable");
        }
        response.actions
    }

    /// Guess the context `minutes_ahead` from now.
    ///
    /// Battery follows a linear drain estimate and the time bucket is read
    /// off the clock; the reasoning engine supplies the commentary.
    pub async fn predict_next_context(&self, minutes_ahead: u32) -> ContextPrediction {
        let recent = self.history_tail(prompts::PREDICTION_WINDOW);
        let Some(current) = recent.last().cloned() else {
            warn!("Context prediction requested with no history");
            return ContextPrediction::failed();
        };

        let query = prompts::prediction_prompt(minutes_ahead, &recent);
        let response = self
            .reasoning
            .process_query(&ReasoningInput::new(query, current.clone()))
            .await;

        let hours = f64::from(minutes_ahead) / 60.0;
        let battery =
            (current.device_state.battery_pct - hours * self.config.battery_drain_per_hour).max(0.0);
        let future = self.clock.now() + chrono::Duration::minutes(i64::from(minutes_ahead));

        ContextPrediction {
            predicted: Some(PredictedContext {
                device_state: DeviceState {
                    battery_pct: battery,
                    ..current.device_state
                },
                time_of_day: TimeOfDay::at(&future),
            }),
            confidence: response.confidence,
            reasoning: response.reasoning,
        }
    }

    /// Retained insights, newest first.
    pub fn get_current_insights(&self) -> Vec<Insight> {
        self.insights
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Oldest first.
    pub fn get_context_history(&self) -> Vec<Context> {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn get_high_priority_insights(&self) -> Vec<Insight> {
        self.insights
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|insight| insight.priority.is_elevated())
            .cloned()
            .collect()
    }

    pub fn latest_context(&self) -> Option<Context> {
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .back()
            .cloned()
    }

    /// True if a context recorded in the last `minutes_back` minutes carries `tag`.
    pub fn has_recent_activity(&self, tag: &str, minutes_back: u32) -> bool {
        let cutoff = self.clock.now() - chrono::Duration::minutes(i64::from(minutes_back));
        self.history
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|context| context.created_at >= cutoff)
            .any(|context| context.recent_activity.iter().any(|a| a == tag))
    }

    pub fn get_context_summary(&self) -> String {
        let Some(current) = self.latest_context() else {
            return "No context available".into();
        };
        let alerts = self.get_high_priority_insights();
        let start = current
            .recent_activity
            .len()
            .saturating_sub(SUMMARY_RECENT_ACTIVITY);

        let mut summary = format!(
            "Current Context Summary:\n\
             - Time: {}\n\
             - Motion: {}\n\
             - Battery: {}%\n\
             - Connectivity: {}\n\
             - Recent Activity: {}\n\
             - High Priority Alerts: {}",
            current.time_of_day,
            self.sensors.analyze_motion_pattern(),
            current.device_state.battery_pct,
            current.device_state.connectivity,
            current.recent_activity[start..].join(", "),
            alerts.len(),
        );
        if let Some(top) = alerts.first() {
            summary.push_str(&format!("\n- Alert: {}", top.title));
        }
        summary
    }

    /// Clone of the newest `n` history entries, oldest first.
    fn history_tail(&self, n: usize) -> Vec<Context> {
        let history = self.history.read().unwrap_or_else(|e| e.into_inner());
        let start = history.len().saturating_sub(n);
        history.iter().skip(start).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_config::SensorConfig;
    use aria_core::{
        AxisReading, BackendCapabilities, BackendError, BackendRequest, Connectivity, DeviceInfo,
        InsightKind, LocationReading, ManualClock, ModelBackend, Orientation, Priority,
    };
    use aria_sensors::ScriptedSensorSource;
    use async_trait::async_trait;
    use chrono::{DateTime, Local, TimeZone};
    use std::sync::Mutex;

    struct CannedBackend {
        reply: Result<String, BackendError>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ModelBackend for CannedBackend {
        fn id(&self) -> &str {
            "canned"
        }

        async fn invoke(&self, request: BackendRequest) -> Result<String, BackendError> {
            self.queries.lock().unwrap().push(request.query);
            self.reply.clone()
        }
    }

    const CAPS: BackendCapabilities = BackendCapabilities {
        reasoning: 8,
        vision: false,
        code_generation: 5,
        real_time_data: false,
        context_window: 8000,
    };

    struct Harness {
        engine: ContextEngine,
        clock: Arc<ManualClock>,
        backend: Arc<CannedBackend>,
    }

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 20, hour, 0, 0).unwrap()
    }

    fn harness_with(hour: u32, reply: Result<String, BackendError>, config: ContextConfig) -> Harness {
        let clock = Arc::new(ManualClock::new(at(hour)));
        let backend = Arc::new(CannedBackend {
            reply,
            queries: Mutex::new(Vec::new()),
        });
        let reasoning = ReasoningEngine::new(clock.clone()).with_backend(backend.clone(), CAPS);
        let sensors = SensorManager::new(
            Arc::new(ScriptedSensorSource::new()),
            SensorConfig::default(),
        );
        let engine = ContextEngine::new(
            Arc::new(sensors),
            Arc::new(reasoning),
            clock.clone(),
            config,
            UserPreferences::default(),
        );
        Harness {
            engine,
            clock,
            backend,
        }
    }

    fn harness(hour: u32) -> Harness {
        harness_with(
            hour,
            Ok("Reasoning: you tend to walk now.\n\nRecommendations:\n1. Stretch\n2. Hydrate".into()),
            ContextConfig::default(),
        )
    }

    fn device(battery: f64, connectivity: Connectivity) -> DeviceInfo {
        DeviceInfo {
            battery_pct: battery,
            brightness_pct: Some(0.6),
            orientation: Orientation::Unknown,
            connectivity,
        }
    }

    fn full_snapshot(now: DateTime<Local>) -> SensorSnapshot {
        SensorSnapshot {
            accelerometer: Some(AxisReading::new(0.01, 0.02, 9.81, now)),
            location: Some(LocationReading {
                latitude: 37.7749,
                longitude: -122.4194,
                accuracy: 5.0,
                timestamp: now,
                address: Some("Market St".into()),
            }),
            device_info: Some(device(64.0, Connectivity::Cellular)),
            ..SensorSnapshot::default()
        }
    }

    #[test]
    fn update_derives_context_fields() {
        let h = harness(9);
        let context = h.engine.update_context(Some(&full_snapshot(at(9))), None, None);

        assert_eq!(context.time_of_day, TimeOfDay::Morning);
        assert_eq!(context.device_state.battery_pct, 64.0);
        assert_eq!(context.device_state.connectivity, Connectivity::Cellular);
        assert_eq!(context.device_state.brightness_pct, Some(0.6));
        let location = context.current_location.unwrap();
        assert_eq!(location.address.as_deref(), Some("Market St"));
        assert_eq!(
            context.recent_activity,
            vec!["user_stationary", "device_face_up", "location_tracked"]
        );
        assert_eq!(context.created_at, at(9));
    }

    #[test]
    fn update_without_sensor_uses_defaults() {
        let h = harness(23);
        let context = h.engine.update_context(None, None, None);
        assert_eq!(context.time_of_day, TimeOfDay::Night);
        assert_eq!(context.device_state.battery_pct, 100.0);
        assert_eq!(context.device_state.connectivity, Connectivity::Unknown);
        assert!(context.current_location.is_none());
        assert!(context.recent_activity.is_empty());
    }

    #[test]
    fn zero_battery_is_kept() {
        let h = harness(9);
        let snapshot = SensorSnapshot {
            device_info: Some(device(0.0, Connectivity::Wifi)),
            ..SensorSnapshot::default()
        };
        let context = h.engine.update_context(Some(&snapshot), None, None);
        assert_eq!(context.device_state.battery_pct, 0.0);
    }

    #[test]
    fn vision_and_audio_tags() {
        let h = harness(9);
        let vision = VisionAnalysis {
            description: "a desk".into(),
            objects: vec!["laptop".into(), "mug".into()],
            text: None,
            emotions: None,
            scene: "office".into(),
            confidence: 0.9,
            timestamp: at(9),
        };
        let audio = AudioData {
            transcription: "remind me later".into(),
            confidence: 0.8,
            duration: 1.5,
            timestamp: at(9),
            language: Some("en".into()),
        };
        let context = h.engine.update_context(None, Some(&vision), Some(&audio));
        assert_eq!(
            context.recent_activity,
            vec!["camera_used", "observed_laptop", "voice_interaction", "speech_detected"]
        );

        let silent = AudioData {
            transcription: String::new(),
            ..audio
        };
        let context = h.engine.update_context(None, None, Some(&silent));
        assert_eq!(context.recent_activity, vec!["voice_interaction"]);
    }

    #[test]
    fn recent_activity_keeps_newest_tags() {
        let h = harness_with(
            9,
            Ok(String::new()),
            ContextConfig {
                recent_activity_limit: 2,
                ..ContextConfig::default()
            },
        );
        let context = h.engine.update_context(Some(&full_snapshot(at(9))), None, None);
        assert_eq!(context.recent_activity, vec!["device_face_up", "location_tracked"]);
    }

    #[test]
    fn history_is_bounded_fifo() {
        let h = harness(9);
        for i in 0..150 {
            let snapshot = SensorSnapshot {
                device_info: Some(device(f64::from(i % 100), Connectivity::Wifi)),
                ..SensorSnapshot::default()
            };
            h.engine.update_context(Some(&snapshot), None, None);
        }
        let history = h.engine.get_context_history();
        assert_eq!(history.len(), 100);
        // entries 50..150 survive, oldest first
        assert_eq!(history[0].device_state.battery_pct, 50.0);
        assert_eq!(history[99].device_state.battery_pct, 49.0);
    }

    #[test]
    fn analysis_returns_only_new_insights() {
        let h = harness(14);
        h.engine.sensors().replace_snapshot(SensorSnapshot {
            accelerometer: Some(AxisReading::new(0.01, 0.02, 9.81, at(14))),
            device_info: Some(device(12.0, Connectivity::Wifi)),
            ..SensorSnapshot::default()
        });

        let first = h.engine.analyze_current_context();
        let titles: Vec<_> = first.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Low Battery Detected", "Afternoon Activity Suggestion"]);

        h.clock.advance(chrono::Duration::minutes(1));
        let second = h.engine.analyze_current_context();
        assert_eq!(second.len(), 2);
        assert_eq!(h.engine.get_current_insights().len(), 4);
        assert_eq!(h.engine.get_high_priority_insights().len(), 2);
        assert_eq!(h.engine.get_context_history().len(), 2);

        // newest first
        let retained = h.engine.get_current_insights();
        assert_eq!(retained[0].timestamp, at(14) + chrono::Duration::minutes(1));
    }

    #[test]
    fn expired_insights_are_evicted() {
        let h = harness(9);
        h.engine.sensors().replace_snapshot(SensorSnapshot {
            device_info: Some(device(10.0, Connectivity::Wifi)),
            ..SensorSnapshot::default()
        });
        assert_eq!(h.engine.analyze_current_context().len(), 1);

        h.engine.sensors().replace_snapshot(SensorSnapshot {
            device_info: Some(device(90.0, Connectivity::Wifi)),
            ..SensorSnapshot::default()
        });
        h.clock.advance(chrono::Duration::minutes(61));
        assert!(h.engine.analyze_current_context().is_empty());
        assert!(h.engine.get_current_insights().is_empty());
    }

    #[test]
    fn insight_set_is_capped() {
        let h = harness_with(
            9,
            Ok(String::new()),
            ContextConfig {
                insight_limit: 3,
                ..ContextConfig::default()
            },
        );
        h.engine.sensors().replace_snapshot(SensorSnapshot {
            device_info: Some(device(5.0, Connectivity::Offline)),
            ..SensorSnapshot::default()
        });
        for _ in 0..4 {
            h.engine.analyze_current_context();
            h.clock.advance(chrono::Duration::seconds(30));
        }
        let retained = h.engine.get_current_insights();
        assert_eq!(retained.len(), 3);
        assert!(retained.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn busy_analysis_returns_retained_set() {
        let h = harness(9);
        h.engine.sensors().replace_snapshot(SensorSnapshot {
            device_info: Some(device(10.0, Connectivity::Wifi)),
            ..SensorSnapshot::default()
        });
        h.engine.analyze_current_context();

        h.engine.analyzing.store(true, Ordering::SeqCst);
        let returned = h.engine.analyze_current_context();
        assert_eq!(returned, h.engine.get_current_insights());
        assert_eq!(h.engine.get_context_history().len(), 1);
        h.engine.analyzing.store(false, Ordering::SeqCst);

        h.engine.analyze_current_context();
        assert_eq!(h.engine.get_context_history().len(), 2);
    }

    #[tokio::test]
    async fn recommendations_come_from_actions() {
        let h = harness(9);
        let snapshot = full_snapshot(at(9));
        let context = h.engine.update_context(Some(&snapshot), None, None);

        let actions = h
            .engine
            .generate_proactive_recommendations(&context, &snapshot)
            .await;
        assert_eq!(actions, vec!["Stretch", "Hydrate"]);

        let query = h.backend.queries.lock().unwrap()[0].clone();
        assert!(query.contains("- Motion: stationary\n"));
        assert!(query.contains("- Device Orientation: face_up\n"));
    }

    #[tokio::test]
    async fn recommendations_empty_on_failure() {
        let h = harness_with(
            9,
            Err(BackendError::Network("down".into())),
            ContextConfig::default(),
        );
        let snapshot = full_snapshot(at(9));
        let context = h.engine.update_context(Some(&snapshot), None, None);
        assert!(h
            .engine
            .generate_proactive_recommendations(&context, &snapshot)
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn prediction_projects_battery_and_time() {
        let h = harness(16);
        h.engine.update_context(Some(&full_snapshot(at(16))), None, None);

        let prediction = h.engine.predict_next_context(90).await;
        let predicted = prediction.predicted.unwrap();
        assert_eq!(predicted.device_state.battery_pct, 64.0 - 7.5);
        assert_eq!(predicted.device_state.connectivity, Connectivity::Cellular);
        assert_eq!(predicted.time_of_day, TimeOfDay::Evening);
        assert_eq!(prediction.reasoning, "you tend to walk now.");

        let query = h.backend.queries.lock().unwrap()[0].clone();
        assert!(query.contains("might be in 90 minutes"));
    }

    #[tokio::test]
    async fn prediction_battery_floors_at_zero() {
        let h = harness(9);
        h.engine.update_context(
            Some(&SensorSnapshot {
                device_info: Some(device(3.0, Connectivity::Wifi)),
                ..SensorSnapshot::default()
            }),
            None,
            None,
        );
        let prediction = h.engine.predict_next_context(120).await;
        assert_eq!(prediction.predicted.unwrap().device_state.battery_pct, 0.0);
    }

    #[tokio::test]
    async fn prediction_without_history_fails_softly() {
        let h = harness(9);
        let prediction = h.engine.predict_next_context(30).await;
        assert!(prediction.predicted.is_none());
        assert_eq!(prediction.confidence, 0.1);
        assert_eq!(prediction.reasoning, "Prediction failed due to error");
        assert!(h.backend.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn recent_activity_lookup_respects_window() {
        let h = harness(9);
        h.engine.update_context(Some(&full_snapshot(at(9))), None, None);

        assert!(h.engine.has_recent_activity("location_tracked", 30));
        assert!(!h.engine.has_recent_activity("camera_used", 30));

        h.clock.advance(chrono::Duration::minutes(45));
        assert!(!h.engine.has_recent_activity("location_tracked", 30));
        assert!(h.engine.has_recent_activity("location_tracked", 60));
    }

    #[test]
    fn summary_digest() {
        let h = harness(9);
        assert_eq!(h.engine.get_context_summary(), "No context available");

        h.engine.sensors().replace_snapshot(SensorSnapshot {
            device_info: Some(device(15.0, Connectivity::Wifi)),
            ..SensorSnapshot::default()
        });
        h.engine.analyze_current_context();

        let summary = h.engine.get_context_summary();
        assert_eq!(
            summary,
            "Current Context Summary:\n\
             - Time: morning\n\
             - Motion: unknown\n\
             - Battery: 15%\n\
             - Connectivity: wifi\n\
             - Recent Activity: \n\
             - High Priority Alerts: 1\n\
             - Alert: Low Battery Detected"
        );
    }

    #[test]
    fn rules_see_engine_history() {
        let h = harness(9);
        for i in 0..10 {
            h.engine.sensors().replace_snapshot(SensorSnapshot {
                device_info: Some(device(95.0 - f64::from(i) * 5.0, Connectivity::Wifi)),
                ..SensorSnapshot::default()
            });
            h.engine.analyze_current_context();
        }
        let kinds: Vec<_> = h
            .engine
            .get_current_insights()
            .into_iter()
            .filter(|i| i.title == "High Battery Drain Detected")
            .map(|i| (i.kind, i.priority))
            .collect();
        assert_eq!(kinds, vec![(InsightKind::Observation, Priority::Medium)]);
    }
}
