//! System prompt construction.
//!
//! Every backend receives the same prompt for the same input, so consensus
//! answers stay comparable.

use aria_core::{Context, SensorSnapshot, TimeOfDay};
use chrono::{DateTime, Local};
use std::fmt::Write;

const PERSONA: &str = "You are ARIA (Advanced Reasoning Intelligence Assistant), an autonomous AI assistant with access to real-time device sensors, vision, and contextual data. You have advanced reasoning capabilities and can take autonomous actions.";

const CAPABILITIES: &str = "CAPABILITIES:
- Advanced logical reasoning and problem solving
- Real-time sensor data analysis
- Computer vision and image understanding
- Voice processing and natural language understanding
- Contextual awareness and memory
- Autonomous task execution
- Multi-modal data synthesis";

const RULES: &str = "RULES:
1. Always provide reasoning for your responses
2. Use available sensor and contextual data to inform decisions
3. Be proactive in suggesting actions or observations
4. Consider user's safety and privacy
5. Adapt your communication style to the context
6. When possible, predict user needs based on patterns
7. Provide confidence levels for your assessments";

const RESPONSE_FORMAT: &str = "RESPONSE FORMAT:
Always structure responses with:
- Main response content
- Reasoning explanation
- Suggested actions (if any)
- Confidence assessment";

pub fn build_system_prompt(
    context: &Context,
    sensor: Option<&SensorSnapshot>,
    now: DateTime<Local>,
) -> String {
    let location = context
        .current_location
        .as_ref()
        .map(|l| format!("{}, {}", l.latitude, l.longitude))
        .unwrap_or_else(|| "Unknown".into());
    let activity = if context.recent_activity.is_empty() {
        "None".to_string()
    } else {
        context.recent_activity.join(", ")
    };

    let mut prompt = String::with_capacity(2048);
    prompt.push_str(PERSONA);
    prompt.push_str("\n\nCURRENT CONTEXT:\n");
    let _ = writeln!(
        prompt,
        "- Time: {} ({})",
        now.format("%Y-%m-%d %H:%M:%S"),
        TimeOfDay::at(&now)
    );
    let _ = writeln!(prompt, "- Location: {location}");
    let _ = writeln!(prompt, "- Device Battery: {}%", context.device_state.battery_pct);
    let _ = writeln!(prompt, "- Connectivity: {}", context.device_state.connectivity);
    let _ = writeln!(prompt, "- Recent Activity: {activity}");
    prompt.push('\n');
    prompt.push_str(CAPABILITIES);
    prompt.push_str("\n\nSENSOR DATA AVAILABLE:");

    if let Some(sensor) = sensor {
        if let Some(a) = &sensor.accelerometer {
            let _ = write!(prompt, "\n- Motion: X:{:.2}, Y:{:.2}, Z:{:.2}", a.x, a.y, a.z);
        }
        if let Some(l) = &sensor.location {
            let _ = write!(
                prompt,
                "\n- Precise Location: {}, {} (±{}m)",
                l.latitude, l.longitude, l.accuracy
            );
        }
        if let Some(d) = &sensor.device_info {
            let _ = write!(
                prompt,
                "\n- Device State: Battery {}%, Orientation: {}",
                d.battery_pct, d.orientation
            );
        }
    }

    prompt.push_str("\n\n");
    prompt.push_str(RULES);
    prompt.push_str("\n\n");
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}
