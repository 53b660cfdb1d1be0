//! The sensor source trait, over platform sensor plumbing.
//!
//! A SensorSource hands out one channel of samples per subscribed stream.
//! Dropping the receiver unsubscribes. Permission requests report
//! granted/denied and never fail on denial.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::SensorError;
use crate::sensor::{AxisReading, Connectivity, LocationReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Motion,
    Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// A stream the manager can subscribe to, with its delivery cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorStream {
    Accelerometer { interval: Duration },
    Gyroscope { interval: Duration },
    Magnetometer { interval: Duration },
    /// Periodic fixes: at most one per `min_interval` or per `min_distance_m` moved.
    Location { min_interval: Duration, min_distance_m: f64 },
    /// Battery level changes, in percent.
    Battery,
}

impl SensorStream {
    pub fn label(&self) -> &'static str {
        match self {
            SensorStream::Accelerometer { .. } => "accelerometer",
            SensorStream::Gyroscope { .. } => "gyroscope",
            SensorStream::Magnetometer { .. } => "magnetometer",
            SensorStream::Location { .. } => "location",
            SensorStream::Battery => "battery",
        }
    }
}

/// One sample delivered on a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorSample {
    Axis(AxisReading),
    Location(LocationReading),
    Battery { pct: f64, timestamp: DateTime<Local> },
}

/// Result of the one-shot device probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProbe {
    pub battery_pct: f64,
    /// Not every platform exposes screen brightness.
    pub brightness_pct: Option<f64>,
    pub connectivity: Connectivity,
}

#[async_trait]
pub trait SensorSource: Send + Sync {
    /// A human-readable name for this source (e.g. "scripted", "android").
    fn name(&self) -> &str;

    async fn request_permission(&self, permission: Permission) -> PermissionStatus;

    /// Start delivering samples for `stream`.
    async fn subscribe(&self, stream: SensorStream) -> Result<mpsc::Receiver<SensorSample>, SensorError>;

    /// A single high-accuracy location fix.
    async fn current_location(&self) -> Result<LocationReading, SensorError>;

    /// Best-effort street address for a coordinate.
    async fn reverse_geocode(&self, _latitude: f64, _longitude: f64) -> Result<Option<String>, SensorError> {
        Ok(None)
    }

    async fn probe_device(&self) -> Result<DeviceProbe, SensorError>;
}
