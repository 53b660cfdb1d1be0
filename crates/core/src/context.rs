//! The derived, point-in-time situational record.

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::sensor::Connectivity;

/// Hour-of-day bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    LateNight,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    /// late_night < 6, morning < 12, afternoon < 17, evening < 21, night otherwise.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => TimeOfDay::LateNight,
            6..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn at(time: &DateTime<Local>) -> Self {
        Self::from_hour(time.hour())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeOfDay::LateNight => "late_night",
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub battery_pct: f64,
    pub connectivity: Connectivity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness_pct: Option<f64>,
}

impl Default for DeviceState {
    /// What a context records before the device probe has reported.
    fn default() -> Self {
        Self {
            battery_pct: 100.0,
            connectivity: Connectivity::Unknown,
            brightness_pct: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Backend id the user prefers; seeds model selection.
    pub preferred_backend: String,
    pub voice_enabled: bool,
    pub camera_enabled: bool,
    pub location_enabled: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            preferred_backend: "openai".into(),
            voice_enabled: true,
            camera_enabled: true,
            location_enabled: true,
        }
    }
}

/// Immutable once created; the context engine builds one per update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_location: Option<ContextLocation>,
    pub time_of_day: TimeOfDay,
    /// Newest last.
    pub recent_activity: Vec<String>,
    pub device_state: DeviceState,
    pub user_preferences: UserPreferences,
    pub created_at: DateTime<Local>,
}

impl Context {
    /// A context with nothing but the time bucket filled in.
    pub fn bare(preferences: UserPreferences, now: DateTime<Local>) -> Self {
        Self {
            current_location: None,
            time_of_day: TimeOfDay::at(&now),
            recent_activity: Vec::new(),
            device_state: DeviceState::default(),
            user_preferences: preferences,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_buckets() {
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::LateNight);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::LateNight);
        assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(21), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Night);
    }

    #[test]
    fn device_state_defaults_to_full_battery() {
        let state = DeviceState::default();
        assert_eq!(state.battery_pct, 100.0);
        assert_eq!(state.connectivity, Connectivity::Unknown);
    }
}
