//! The sensor manager: one snapshot, many producers.
//!
//! Each subscribed stream gets its own pump task that writes exactly one
//! snapshot field. Readers always get a copy.

use aria_config::SensorConfig;
use aria_core::{
    DeviceInfo, MotionPattern, Orientation, Permission, PermissionStatus, SensorSample,
    SensorSnapshot, SensorSource, SensorStream,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::classify;

const LOW_BATTERY_BELOW: f64 = 20.0;
const WELL_CHARGED_ABOVE: f64 = 80.0;

/// Situations [`SensorManager::is_user_in_context`] can test for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserState {
    Moving,
    Stationary,
    LowBattery,
    /// Always false: there is no notion of a home location yet.
    Home,
}

pub struct SensorManager {
    source: Arc<dyn SensorSource>,
    config: SensorConfig,
    snapshot: Arc<RwLock<SensorSnapshot>>,
    collecting: AtomicBool,
    pumps: Mutex<Vec<JoinHandle<()>>>,
    updates: watch::Sender<u64>,
}

impl SensorManager {
    pub fn new(source: Arc<dyn SensorSource>, config: SensorConfig) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            source,
            config,
            snapshot: Arc::new(RwLock::new(SensorSnapshot::default())),
            collecting: AtomicBool::new(false),
            pumps: Mutex::new(Vec::new()),
            updates,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting.load(Ordering::SeqCst)
    }

    /// Bumped after every snapshot write.
    pub fn watch_updates(&self) -> watch::Receiver<u64> {
        self.updates.subscribe()
    }

    /// Subscribe to every stream the platform will give us.
    ///
    /// Idempotent. A stream that fails (permission denied, hardware missing)
    /// is logged and skipped; the rest keep working.
    pub async fn start_collection(&self) {
        if self.collecting.swap(true, Ordering::SeqCst) {
            debug!("Sensor collection already running");
            return;
        }

        info!(source = %self.source.name(), "Starting sensor collection");

        let motion_allowed =
            self.source.request_permission(Permission::Motion).await == PermissionStatus::Granted;
        if motion_allowed {
            self.subscribe_axis(SensorStream::Accelerometer {
                interval: Duration::from_millis(self.config.accelerometer_interval_ms),
            })
            .await;
        } else {
            warn!("Motion permission not granted, accelerometer disabled");
        }

        self.subscribe_axis(SensorStream::Gyroscope {
            interval: Duration::from_millis(self.config.gyroscope_interval_ms),
        })
        .await;
        self.subscribe_axis(SensorStream::Magnetometer {
            interval: Duration::from_millis(self.config.magnetometer_interval_ms),
        })
        .await;

        self.start_location().await;
        self.start_device_monitoring().await;

        info!(active_streams = self.pump_count(), "Sensor collection started");
    }

    /// Drop every subscription. Safe to call at any time.
    pub fn stop_collection(&self) {
        if !self.collecting.swap(false, Ordering::SeqCst) {
            return;
        }

        let pumps: Vec<_> = {
            let mut guard = self.pumps.lock().unwrap_or_else(|e| e.into_inner());
            guard.drain(..).collect()
        };
        for pump in &pumps {
            pump.abort();
        }
        info!(stopped = pumps.len(), "Sensor collection stopped");
    }

    /// A deep copy of the current snapshot.
    pub fn get_current_data(&self) -> SensorSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn analyze_motion_pattern(&self) -> MotionPattern {
        let snapshot = self.get_current_data();
        classify::motion_pattern(snapshot.accelerometer.as_ref(), self.config.gravity)
    }

    pub fn get_device_orientation(&self) -> Orientation {
        let snapshot = self.get_current_data();
        classify::orientation(snapshot.accelerometer.as_ref())
    }

    /// Classify a snapshot other than the live one, with this manager's settings.
    pub fn motion_of(&self, snapshot: &SensorSnapshot) -> MotionPattern {
        classify::motion_pattern(snapshot.accelerometer.as_ref(), self.config.gravity)
    }

    pub fn orientation_of(&self, snapshot: &SensorSnapshot) -> Orientation {
        classify::orientation(snapshot.accelerometer.as_ref())
    }

    /// Human-readable observations about the current snapshot.
    pub fn get_contextual_insights(&self) -> Vec<String> {
        let snapshot = self.get_current_data();
        let mut insights = vec![
            format!(
                "User appears to be {}",
                classify::motion_pattern(snapshot.accelerometer.as_ref(), self.config.gravity)
            ),
            format!(
                "Device is {}",
                classify::orientation(snapshot.accelerometer.as_ref())
            ),
        ];

        if let Some(device) = &snapshot.device_info {
            if device.battery_pct < LOW_BATTERY_BELOW {
                insights.push("Device battery is low".into());
            } else if device.battery_pct > WELL_CHARGED_ABOVE {
                insights.push("Device battery is well charged".into());
            }
            insights.push(format!("Connected via {}", device.connectivity));
        }

        if let Some(location) = &snapshot.location {
            insights.push(format!("Location accuracy: ±{}m", location.accuracy));
            if let Some(address) = &location.address {
                insights.push(format!("Currently at: {address}"));
            }
        }

        insights
    }

    pub fn is_user_in_context(&self, state: UserState) -> bool {
        match state {
            UserState::Moving => matches!(
                self.analyze_motion_pattern(),
                MotionPattern::Walking | MotionPattern::Jogging | MotionPattern::IntenseMovement
            ),
            UserState::Stationary => self.analyze_motion_pattern() == MotionPattern::Stationary,
            UserState::LowBattery => {
                let battery = self
                    .get_current_data()
                    .device_info
                    .map(|d| d.battery_pct)
                    .unwrap_or(100.0);
                battery < LOW_BATTERY_BELOW
            }
            UserState::Home => false,
        }
    }

    /// Overwrite the snapshot wholesale. Used to seed state in tests and demos.
    pub fn replace_snapshot(&self, snapshot: SensorSnapshot) {
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
        self.updates.send_modify(|v| *v += 1);
    }

    fn pump_count(&self) -> usize {
        self.pumps.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    async fn subscribe_axis(&self, stream: SensorStream) {
        let label = stream.label();
        match self.source.subscribe(stream).await {
            Ok(rx) => self.spawn_pump(label, rx, move |snapshot, sample| {
                if let SensorSample::Axis(reading) = sample {
                    match stream {
                        SensorStream::Accelerometer { .. } => snapshot.accelerometer = Some(reading),
                        SensorStream::Gyroscope { .. } => snapshot.gyroscope = Some(reading),
                        SensorStream::Magnetometer { .. } => snapshot.magnetometer = Some(reading),
                        _ => {}
                    }
                }
            }),
            Err(e) => warn!(stream = label, error = %e, "Sensor subscription failed"),
        }
    }

    async fn start_location(&self) {
        if self.source.request_permission(Permission::Location).await != PermissionStatus::Granted {
            warn!("Location permission not granted, location disabled");
            return;
        }

        match self.source.current_location().await {
            Ok(mut fix) => {
                match self.source.reverse_geocode(fix.latitude, fix.longitude).await {
                    Ok(address) => fix.address = address.filter(|a| !a.trim().is_empty()),
                    Err(e) => debug!(error = %e, "Address lookup failed"),
                }
                self.write(|snapshot| snapshot.location = Some(fix));
            }
            Err(e) => warn!(error = %e, "Initial location fix failed"),
        }

        let stream = SensorStream::Location {
            min_interval: Duration::from_secs(self.config.location_interval_secs),
            min_distance_m: self.config.location_distance_m,
        };
        match self.source.subscribe(stream).await {
            Ok(rx) => self.spawn_pump("location", rx, |snapshot, sample| {
                if let SensorSample::Location(fix) = sample {
                    snapshot.location = Some(fix);
                }
            }),
            Err(e) => warn!(error = %e, "Location watch failed"),
        }
    }

    async fn start_device_monitoring(&self) {
        match self.source.probe_device().await {
            Ok(probe) => self.write(|snapshot| {
                snapshot.device_info = Some(DeviceInfo {
                    battery_pct: probe.battery_pct,
                    brightness_pct: probe.brightness_pct,
                    orientation: Orientation::Unknown,
                    connectivity: probe.connectivity,
                });
            }),
            Err(e) => {
                warn!(error = %e, "Device probe failed");
                return;
            }
        }

        match self.source.subscribe(SensorStream::Battery).await {
            Ok(rx) => self.spawn_pump("battery", rx, |snapshot, sample| {
                if let (SensorSample::Battery { pct, .. }, Some(device)) =
                    (sample, snapshot.device_info.as_mut())
                {
                    device.battery_pct = pct;
                }
            }),
            Err(e) => warn!(error = %e, "Battery subscription failed"),
        }
    }

    fn write(&self, apply: impl FnOnce(&mut SensorSnapshot)) {
        apply(&mut self.snapshot.write().unwrap_or_else(|e| e.into_inner()));
        self.updates.send_modify(|v| *v += 1);
    }

    fn spawn_pump<F>(&self, label: &'static str, mut rx: mpsc::Receiver<SensorSample>, apply: F)
    where
        F: Fn(&mut SensorSnapshot, SensorSample) + Send + 'static,
    {
        // Stopped while we were awaiting the subscription.
        if !self.is_collecting() {
            return;
        }

        let snapshot = self.snapshot.clone();
        let updates = self.updates.clone();
        let handle = tokio::spawn(async move {
            while let Some(sample) = rx.recv().await {
                apply(
                    &mut snapshot.write().unwrap_or_else(|e| e.into_inner()),
                    sample,
                );
                updates.send_modify(|v| *v += 1);
            }
            debug!(stream = label, "Sensor stream ended");
        });

        self.pumps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
    }
}

impl Drop for SensorManager {
    fn drop(&mut self) {
        self.stop_collection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedSensorSource;
    use aria_core::{AxisReading, Connectivity, DeviceProbe, LocationReading};
    use chrono::Local;

    fn manager(source: Arc<ScriptedSensorSource>) -> SensorManager {
        SensorManager::new(source, SensorConfig::default())
    }

    fn with_accel(x: f64, y: f64, z: f64) -> SensorSnapshot {
        SensorSnapshot {
            accelerometer: Some(AxisReading::new(x, y, z, Local::now())),
            ..SensorSnapshot::default()
        }
    }

    fn full_snapshot(battery: f64) -> SensorSnapshot {
        SensorSnapshot {
            accelerometer: Some(AxisReading::new(0.1, 0.2, 9.8, Local::now())),
            location: Some(LocationReading {
                latitude: 37.7749,
                longitude: -122.4194,
                accuracy: 10.0,
                timestamp: Local::now(),
                address: Some("San Francisco, CA".into()),
            }),
            device_info: Some(DeviceInfo {
                battery_pct: battery,
                brightness_pct: None,
                orientation: Orientation::Portrait,
                connectivity: Connectivity::Wifi,
            }),
            ..SensorSnapshot::default()
        }
    }

    async fn wait_for(rx: &mut watch::Receiver<u64>, version: u64) {
        while *rx.borrow_and_update() < version {
            rx.changed().await.unwrap();
        }
    }

    #[test]
    fn empty_snapshot_readers_never_fail() {
        let m = manager(Arc::new(ScriptedSensorSource::new()));
        assert_eq!(m.analyze_motion_pattern(), MotionPattern::Unknown);
        assert_eq!(m.get_device_orientation(), Orientation::Unknown);
        let insights = m.get_contextual_insights();
        assert!(!insights.is_empty());
        assert!(insights[0].contains("unknown"));
        assert!(!m.is_user_in_context(UserState::Moving));
        assert!(!m.is_user_in_context(UserState::Stationary));
        assert!(!m.is_user_in_context(UserState::LowBattery));
        assert!(!m.is_user_in_context(UserState::Home));
    }

    #[test]
    fn classification_reads_latest_accelerometer() {
        let m = manager(Arc::new(ScriptedSensorSource::new()));
        m.replace_snapshot(with_accel(1.5, 0.8, 9.5));
        assert_eq!(m.analyze_motion_pattern(), MotionPattern::Walking);
        assert!(m.is_user_in_context(UserState::Moving));

        m.replace_snapshot(with_accel(0.1, 9.8, 0.1));
        assert_eq!(m.get_device_orientation(), Orientation::Portrait);
    }

    #[test]
    fn contextual_insights_cover_every_populated_field() {
        let m = manager(Arc::new(ScriptedSensorSource::new()));
        m.replace_snapshot(full_snapshot(85.0));
        let insights = m.get_contextual_insights();
        assert!(insights.iter().any(|i| i.contains("stationary")));
        assert!(insights.iter().any(|i| i.contains("well charged")));
        assert!(insights.iter().any(|i| i.contains("wifi")));
        assert!(insights.iter().any(|i| i.contains("±10m")));
        assert!(insights.iter().any(|i| i.contains("San Francisco")));
    }

    #[test]
    fn user_context_predicates() {
        let m = manager(Arc::new(ScriptedSensorSource::new()));
        m.replace_snapshot(full_snapshot(85.0));
        assert!(m.is_user_in_context(UserState::Stationary));
        assert!(!m.is_user_in_context(UserState::Moving));
        assert!(!m.is_user_in_context(UserState::LowBattery));

        m.replace_snapshot(full_snapshot(15.0));
        assert!(m.is_user_in_context(UserState::LowBattery));
        assert!(!m.is_user_in_context(UserState::Home));
    }

    #[test]
    fn current_data_is_an_isolated_copy() {
        let m = manager(Arc::new(ScriptedSensorSource::new()));
        let seeded = full_snapshot(50.0);
        m.replace_snapshot(seeded.clone());

        let mut copy = m.get_current_data();
        assert_eq!(copy, seeded);
        copy.location = None;
        assert!(m.get_current_data().location.is_some());
    }

    #[tokio::test]
    async fn collection_routes_each_stream_to_its_field() {
        let source = Arc::new(
            ScriptedSensorSource::new()
                .with_location(37.7749, -122.4194, 10.0)
                .with_address("Market St San Francisco CA")
                .with_device(DeviceProbe {
                    battery_pct: 85.0,
                    brightness_pct: Some(40.0),
                    connectivity: Connectivity::Wifi,
                }),
        );
        let m = manager(source.clone());
        let mut updates = m.watch_updates();

        m.start_collection().await;
        assert!(m.is_collecting());

        let seeded = m.get_current_data();
        assert_eq!(
            seeded.location.as_ref().unwrap().address.as_deref(),
            Some("Market St San Francisco CA")
        );
        assert_eq!(seeded.device_info.as_ref().unwrap().battery_pct, 85.0);

        let before = *updates.borrow_and_update();
        assert!(source.emit_accelerometer(0.01, 0.02, 9.81));
        assert!(source.emit_battery(60.0));
        wait_for(&mut updates, before + 2).await;

        let data = m.get_current_data();
        assert_eq!(data.accelerometer.unwrap().z, 9.81);
        assert_eq!(data.device_info.unwrap().battery_pct, 60.0);
        assert!(data.gyroscope.is_none());
        assert_eq!(m.analyze_motion_pattern(), MotionPattern::Stationary);
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let source = Arc::new(ScriptedSensorSource::new());
        let m = manager(source.clone());
        m.start_collection().await;
        m.start_collection().await;
        assert_eq!(source.subscription_count("accelerometer"), 1);
    }

    #[tokio::test]
    async fn denied_permissions_degrade_without_failing() {
        let source = Arc::new(
            ScriptedSensorSource::new()
                .with_permission(Permission::Motion, PermissionStatus::Denied)
                .with_permission(Permission::Location, PermissionStatus::Denied)
                .failing("magnetometer"),
        );
        let m = manager(source.clone());
        m.start_collection().await;

        assert!(m.is_collecting());
        assert_eq!(source.subscription_count("accelerometer"), 0);
        assert_eq!(source.subscription_count("location"), 0);
        assert_eq!(source.subscription_count("magnetometer"), 0);
        assert_eq!(source.subscription_count("gyroscope"), 1);
    }

    #[tokio::test]
    async fn stop_unsubscribes_and_is_idempotent() {
        let source = Arc::new(ScriptedSensorSource::new());
        let m = manager(source.clone());
        m.stop_collection();

        m.start_collection().await;
        m.stop_collection();
        m.stop_collection();
        assert!(!m.is_collecting());

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!source.emit_accelerometer(1.0, 1.0, 1.0));
        assert!(m.get_current_data().accelerometer.is_none());
    }
}
