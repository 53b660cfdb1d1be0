//! The normalized sensor snapshot.
//!
//! Every sub-reading is optional: `None` means the sensor has not reported
//! yet, never "zero".

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A three-axis reading (accelerometer, gyroscope, magnetometer).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisReading {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp: DateTime<Local>,
}

impl AxisReading {
    pub fn new(x: f64, y: f64, z: f64, timestamp: DateTime<Local>) -> Self {
        Self { x, y, z, timestamp }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy in meters.
    pub accuracy: f64,
    pub timestamp: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Wifi,
    Cellular,
    Offline,
    #[default]
    Unknown,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Connectivity::Wifi => "wifi",
            Connectivity::Cellular => "cellular",
            Connectivity::Offline => "offline",
            Connectivity::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub battery_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness_pct: Option<f64>,
    pub orientation: Orientation,
    pub connectivity: Connectivity,
}

/// The one mutable record the sensor manager maintains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerometer: Option<AxisReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gyroscope: Option<AxisReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetometer: Option<AxisReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
}

impl SensorSnapshot {
    /// True when no sensor has reported anything.
    pub fn is_empty(&self) -> bool {
        self.accelerometer.is_none()
            && self.gyroscope.is_none()
            && self.magnetometer.is_none()
            && self.location.is_none()
            && self.device_info.is_none()
    }
}

/// Coarse activity classification from accelerometer magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionPattern {
    Stationary,
    Walking,
    Jogging,
    IntenseMovement,
    Unknown,
}

impl fmt::Display for MotionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MotionPattern::Stationary => "stationary",
            MotionPattern::Walking => "walking",
            MotionPattern::Jogging => "jogging",
            MotionPattern::IntenseMovement => "intense_movement",
            MotionPattern::Unknown => "unknown",
        })
    }
}

/// Which way the device faces, from the dominant gravity axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    FaceUp,
    FaceDown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    #[default]
    Unknown,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::FaceUp => "face_up",
            Orientation::FaceDown => "face_down",
            Orientation::Portrait => "portrait",
            Orientation::PortraitUpsideDown => "portrait_upside_down",
            Orientation::LandscapeLeft => "landscape_left",
            Orientation::LandscapeRight => "landscape_right",
            Orientation::Unknown => "unknown",
        })
    }
}
