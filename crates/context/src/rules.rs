//! Insight rules.
//!
//! Pure functions over a context, the snapshot it came from, and the recent
//! history. Each rule yields at most one insight.

use aria_core::{
    Connectivity, Context, Insight, InsightKind, MotionPattern, Priority, SensorSnapshot,
    TimeOfDay,
};
use chrono::{DateTime, Local};

const LOW_BATTERY_BELOW: f64 = 20.0;
const DRAIN_ALERT_ABOVE: f64 = 20.0;
/// History entries the pattern rules look back over.
pub const PATTERN_WINDOW: usize = 10;
const STABLE_LOCATION_MIN_FIXES: usize = 5;

/// The fixed part of an insight; only the description varies per firing.
struct Rule {
    prefix: &'static str,
    kind: InsightKind,
    priority: Priority,
    title: &'static str,
    confidence: f64,
    actions: &'static [&'static str],
    sources: &'static [&'static str],
}

impl Rule {
    fn fire(&self, description: String, now: DateTime<Local>) -> Insight {
        Insight {
            id: format!("{}_{}", self.prefix, uuid::Uuid::new_v4().simple()),
            kind: self.kind,
            priority: self.priority,
            title: self.title.into(),
            description,
            confidence: self.confidence,
            timestamp: now,
            actions: self.actions.iter().map(|a| a.to_string()).collect(),
            context_sources: self.sources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const LOW_BATTERY: Rule = Rule {
    prefix: "battery_low",
    kind: InsightKind::Alert,
    priority: Priority::High,
    title: "Low Battery Detected",
    confidence: 0.95,
    actions: &["Find nearest charging location", "Enable battery saver mode"],
    sources: &["device_state"],
};

const STATIONARY_AFTERNOON: Rule = Rule {
    prefix: "stationary_afternoon",
    kind: InsightKind::Recommendation,
    priority: Priority::Medium,
    title: "Afternoon Activity Suggestion",
    confidence: 0.7,
    actions: &["Take a 5-minute walk", "Do desk stretches", "Set movement reminder"],
    sources: &["motion", "time"],
};

const EVENING_LOCATION: Rule = Rule {
    prefix: "location_evening",
    kind: InsightKind::Observation,
    priority: Priority::Low,
    title: "Evening Location Check",
    confidence: 0.9,
    actions: &[],
    sources: &["location", "time"],
};

const OFFLINE: Rule = Rule {
    prefix: "offline",
    kind: InsightKind::Alert,
    priority: Priority::Medium,
    title: "Device Offline",
    confidence: 0.95,
    actions: &["Check WiFi settings", "Enable mobile data", "Find network"],
    sources: &["connectivity"],
};

const BATTERY_DRAIN: Rule = Rule {
    prefix: "battery_drain_pattern",
    kind: InsightKind::Observation,
    priority: Priority::Medium,
    title: "High Battery Drain Detected",
    confidence: 0.8,
    actions: &["Check battery usage", "Close background apps", "Enable power saving"],
    sources: &["battery_history"],
};

const STABLE_LOCATION: Rule = Rule {
    prefix: "location_stable",
    kind: InsightKind::Observation,
    priority: Priority::Low,
    title: "Stable Location Detected",
    confidence: 0.9,
    actions: &[],
    sources: &["location_history"],
};

/// Rules over the current context alone.
pub fn context_insights(
    context: &Context,
    snapshot: &SensorSnapshot,
    motion: MotionPattern,
    now: DateTime<Local>,
) -> Vec<Insight> {
    let mut insights = Vec::new();
    let battery = context.device_state.battery_pct;

    if battery < LOW_BATTERY_BELOW {
        insights.push(LOW_BATTERY.fire(
            format!("Device battery is at {battery}%. Consider charging soon."),
            now,
        ));
    }

    if motion == MotionPattern::Stationary && context.time_of_day == TimeOfDay::Afternoon {
        insights.push(STATIONARY_AFTERNOON.fire(
            "You have been stationary for a while during the afternoon. Consider taking a short walk or stretch break.".into(),
            now,
        ));
    }

    if let Some(location) = &snapshot.location
        && context.time_of_day == TimeOfDay::Evening
    {
        insights.push(EVENING_LOCATION.fire(
            format!(
                "Currently located at coordinates {:.4}, {:.4} in the evening.",
                location.latitude, location.longitude
            ),
            now,
        ));
    }

    if context.device_state.connectivity == Connectivity::Offline {
        insights.push(OFFLINE.fire(
            "No network connectivity detected. Some features may be limited.".into(),
            now,
        ));
    }

    insights
}

/// Rules over the last [`PATTERN_WINDOW`] history entries. Silent until the
/// history holds that many.
pub fn history_insights(history: &[Context], now: DateTime<Local>) -> Vec<Insight> {
    let mut insights = Vec::new();
    if history.len() < PATTERN_WINDOW {
        return insights;
    }
    let window = &history[history.len() - PATTERN_WINDOW..];

    let drain = window[0].device_state.battery_pct
        - window[PATTERN_WINDOW - 1].device_state.battery_pct;
    if drain > DRAIN_ALERT_ABOVE {
        insights.push(BATTERY_DRAIN.fire(
            format!("Battery drained {drain}% in recent activity. Consider checking for power-hungry apps."),
            now,
        ));
    }

    let fixes: Vec<(f64, f64)> = window
        .iter()
        .filter_map(|c| c.current_location.as_ref())
        .map(|l| (l.latitude, l.longitude))
        .collect();
    if fixes.len() >= STABLE_LOCATION_MIN_FIXES && fixes.windows(2).all(|pair| pair[0] == pair[1]) {
        insights.push(STABLE_LOCATION.fire(
            "You have been in the same location for an extended period.".into(),
            now,
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::{ContextLocation, LocationReading, UserPreferences};
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 20, hour, 30, 0).unwrap()
    }

    fn context(hour: u32, battery: f64, connectivity: Connectivity) -> Context {
        let mut c = Context::bare(UserPreferences::default(), at(hour));
        c.device_state.battery_pct = battery;
        c.device_state.connectivity = connectivity;
        c
    }

    fn located(mut c: Context, lat: f64, lon: f64) -> Context {
        c.current_location = Some(ContextLocation {
            latitude: lat,
            longitude: lon,
            address: None,
        });
        c
    }

    fn titles(insights: &[Insight]) -> Vec<&str> {
        insights.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn quiet_morning_yields_nothing() {
        let c = context(9, 80.0, Connectivity::Wifi);
        let out = context_insights(&c, &SensorSnapshot::default(), MotionPattern::Walking, at(9));
        assert!(out.is_empty());
    }

    #[test]
    fn low_battery_alert() {
        let c = context(9, 15.0, Connectivity::Wifi);
        let out = context_insights(&c, &SensorSnapshot::default(), MotionPattern::Unknown, at(9));
        assert_eq!(titles(&out), vec!["Low Battery Detected"]);
        let alert = &out[0];
        assert_eq!(alert.kind, InsightKind::Alert);
        assert_eq!(alert.priority, Priority::High);
        assert_eq!(alert.description, "Device battery is at 15%. Consider charging soon.");
        assert_eq!(alert.confidence, 0.95);
        assert_eq!(alert.context_sources, vec!["device_state"]);
        assert!(alert.id.starts_with("battery_low_"));
    }

    #[test]
    fn stationary_afternoon_and_offline() {
        let c = context(14, 60.0, Connectivity::Offline);
        let out = context_insights(&c, &SensorSnapshot::default(), MotionPattern::Stationary, at(14));
        assert_eq!(titles(&out), vec!["Afternoon Activity Suggestion", "Device Offline"]);
        assert_eq!(out[0].actions.len(), 3);
        assert_eq!(out[1].priority, Priority::Medium);
    }

    #[test]
    fn evening_location_uses_four_decimals() {
        let c = context(19, 60.0, Connectivity::Wifi);
        let snapshot = SensorSnapshot {
            location: Some(LocationReading {
                latitude: 37.774912,
                longitude: -122.419415,
                accuracy: 5.0,
                timestamp: at(19),
                address: None,
            }),
            ..SensorSnapshot::default()
        };
        let out = context_insights(&c, &snapshot, MotionPattern::Unknown, at(19));
        assert_eq!(titles(&out), vec!["Evening Location Check"]);
        assert_eq!(
            out[0].description,
            "Currently located at coordinates 37.7749, -122.4194 in the evening."
        );
        assert!(out[0].actions.is_empty());
    }

    #[test]
    fn history_rules_need_a_full_window() {
        let history: Vec<Context> = (0..9)
            .map(|i| context(9, 100.0 - i as f64 * 10.0, Connectivity::Wifi))
            .collect();
        assert!(history_insights(&history, at(9)).is_empty());
    }

    #[test]
    fn drain_over_window() {
        let history: Vec<Context> = (0..12)
            .map(|i| context(9, 100.0 - i as f64 * 3.0, Connectivity::Wifi))
            .collect();
        // window is entries 2..12: 94 down to 67
        let out = history_insights(&history, at(9));
        assert_eq!(titles(&out), vec!["High Battery Drain Detected"]);
        assert_eq!(
            out[0].description,
            "Battery drained 27% in recent activity. Consider checking for power-hungry apps."
        );
    }

    #[test]
    fn stable_location_needs_identical_fixes() {
        let still: Vec<Context> = (0..10)
            .map(|_| located(context(9, 80.0, Connectivity::Wifi), 1.0, 2.0))
            .collect();
        assert_eq!(titles(&history_insights(&still, at(9))), vec!["Stable Location Detected"]);

        let mut moved = still.clone();
        moved[9] = located(context(9, 80.0, Connectivity::Wifi), 1.5, 2.0);
        assert!(history_insights(&moved, at(9)).is_empty());

        let sparse: Vec<Context> = (0..10)
            .map(|i| {
                let c = context(9, 80.0, Connectivity::Wifi);
                if i < 4 { located(c, 1.0, 2.0) } else { c }
            })
            .collect();
        assert!(history_insights(&sparse, at(9)).is_empty());
    }
}
