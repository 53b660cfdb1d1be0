//! An in-process sensor source driven by the caller.
//!
//! Used by tests and by the CLI's demo daemon. Samples are injected with the
//! `emit_*` methods and land on whichever subscription is open for that stream.

use async_trait::async_trait;
use aria_core::{
    AxisReading, Connectivity, DeviceProbe, LocationReading, Permission, PermissionStatus,
    SensorError, SensorSample, SensorSource, SensorStream,
};
use chrono::Local;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 64;

pub struct ScriptedSensorSource {
    permissions: HashMap<Permission, PermissionStatus>,
    failing: HashSet<&'static str>,
    location: Option<(f64, f64, f64)>,
    address: Option<String>,
    device: Option<DeviceProbe>,
    inject_tx: Mutex<HashMap<&'static str, mpsc::Sender<SensorSample>>>,
    subscriptions: Mutex<HashMap<&'static str, usize>>,
}

impl Default for ScriptedSensorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSensorSource {
    /// All permissions granted, a fully charged device on wifi, no location fix.
    pub fn new() -> Self {
        Self {
            permissions: HashMap::new(),
            failing: HashSet::new(),
            location: None,
            address: None,
            device: Some(DeviceProbe {
                battery_pct: 100.0,
                brightness_pct: None,
                connectivity: Connectivity::Wifi,
            }),
            inject_tx: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_permission(mut self, permission: Permission, status: PermissionStatus) -> Self {
        self.permissions.insert(permission, status);
        self
    }

    /// Make subscriptions to the stream with this label fail.
    pub fn failing(mut self, label: &'static str) -> Self {
        self.failing.insert(label);
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64, accuracy: f64) -> Self {
        self.location = Some((latitude, longitude, accuracy));
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_device(mut self, probe: DeviceProbe) -> Self {
        self.device = Some(probe);
        self
    }

    /// Make the device probe fail.
    pub fn without_device(mut self) -> Self {
        self.device = None;
        self
    }

    /// How many times the stream with this label has been subscribed.
    pub fn subscription_count(&self, label: &str) -> usize {
        self.subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(label)
            .copied()
            .unwrap_or(0)
    }

    pub fn emit_accelerometer(&self, x: f64, y: f64, z: f64) -> bool {
        self.emit_axis("accelerometer", x, y, z)
    }

    pub fn emit_gyroscope(&self, x: f64, y: f64, z: f64) -> bool {
        self.emit_axis("gyroscope", x, y, z)
    }

    pub fn emit_magnetometer(&self, x: f64, y: f64, z: f64) -> bool {
        self.emit_axis("magnetometer", x, y, z)
    }

    pub fn emit_location(&self, latitude: f64, longitude: f64, accuracy: f64) -> bool {
        self.emit(
            "location",
            SensorSample::Location(LocationReading {
                latitude,
                longitude,
                accuracy,
                timestamp: Local::now(),
                address: None,
            }),
        )
    }

    pub fn emit_battery(&self, pct: f64) -> bool {
        self.emit(
            "battery",
            SensorSample::Battery {
                pct,
                timestamp: Local::now(),
            },
        )
    }

    fn emit_axis(&self, label: &'static str, x: f64, y: f64, z: f64) -> bool {
        self.emit(label, SensorSample::Axis(AxisReading::new(x, y, z, Local::now())))
    }

    /// False when nobody is listening on that stream.
    fn emit(&self, label: &'static str, sample: SensorSample) -> bool {
        let guard = self.inject_tx.lock().unwrap_or_else(|e| e.into_inner());
        match guard.get(label) {
            Some(tx) => tx.try_send(sample).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl SensorSource for ScriptedSensorSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn request_permission(&self, permission: Permission) -> PermissionStatus {
        self.permissions
            .get(&permission)
            .copied()
            .unwrap_or(PermissionStatus::Granted)
    }

    async fn subscribe(&self, stream: SensorStream) -> Result<mpsc::Receiver<SensorSample>, SensorError> {
        let label = stream.label();
        if self.failing.contains(label) {
            return Err(SensorError::SubscriptionFailed {
                stream: label.into(),
                reason: "sensor not available on this device".into(),
            });
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.inject_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(label, tx);
        *self
            .subscriptions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(label)
            .or_default() += 1;

        debug!(stream = label, "Scripted subscription opened");
        Ok(rx)
    }

    async fn current_location(&self) -> Result<LocationReading, SensorError> {
        let (latitude, longitude, accuracy) = self
            .location
            .ok_or_else(|| SensorError::Unavailable("no location fix scripted".into()))?;
        Ok(LocationReading {
            latitude,
            longitude,
            accuracy,
            timestamp: Local::now(),
            address: None,
        })
    }

    async fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> Result<Option<String>, SensorError> {
        Ok(self.address.clone())
    }

    async fn probe_device(&self) -> Result<DeviceProbe, SensorError> {
        self.device
            .clone()
            .ok_or_else(|| SensorError::Unavailable("device probe not scripted".into()))
    }
}
