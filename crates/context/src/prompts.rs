//! Query templates the context engine sends to the reasoning engine.

use aria_core::{Context, MotionPattern, Orientation};
use std::fmt::Write;

/// Contexts quoted in a prediction prompt.
pub const PREDICTION_WINDOW: usize = 5;

pub fn recommendation_prompt(
    context: &Context,
    motion: MotionPattern,
    orientation: Orientation,
) -> String {
    let location = if context.current_location.is_some() {
        "Available"
    } else {
        "Unknown"
    };
    format!(
        "Based on the current context and sensor data, provide 3 proactive recommendations for the user:\n\
         \n\
         Context:\n\
         - Time: {time}\n\
         - Location: {location}\n\
         - Recent Activity: {activity}\n\
         - Battery: {battery}%\n\
         - Motion: {motion}\n\
         - Device Orientation: {orientation}\n\
         \n\
         Provide practical, actionable recommendations based on this context.",
        time = context.time_of_day,
        activity = context.recent_activity.join(", "),
        battery = context.device_state.battery_pct,
    )
}

/// Quotes the last [`PREDICTION_WINDOW`] entries of `history`, oldest first.
pub fn prediction_prompt(minutes_ahead: u32, history: &[Context]) -> String {
    let mut prompt = format!(
        "Based on the context history and current patterns, predict what the user's context might be in {minutes_ahead} minutes:\n\nRecent patterns:\n"
    );
    let start = history.len().saturating_sub(PREDICTION_WINDOW);
    for (i, context) in history[start..].iter().enumerate() {
        let _ = write!(
            prompt,
            "\n{}. Time: {}, Activity: {}, Battery: {}%\n",
            i + 1,
            context.time_of_day,
            context.recent_activity.join(", "),
            context.device_state.battery_pct,
        );
    }
    prompt.push_str("\n\nProvide a prediction with reasoning.");
    prompt
}
