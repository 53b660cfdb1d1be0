//! Heuristic post-processing of free-text model output.
//!
//! These are shallow pattern matches. Each has a fixed default
//! so parsing never fails.

use aria_core::clamp_confidence;
use regex_lite::Regex;
use std::sync::LazyLock;

use crate::input::ReasoningInput;

pub const DEFAULT_REASONING: &str = "Direct response based on available context";

const BASE_CONFIDENCE: f64 = 0.7;
const CONFIDENCE_STEP: f64 = 0.05;
const CONFIDENT_WORDS: [&str; 5] = ["definitely", "certainly", "clearly", "obviously", "confirmed"];
const UNCERTAIN_WORDS: [&str; 6] = ["might", "could", "possibly", "perhaps", "maybe", "uncertain"];

static REASONING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(?:reasoning|because|due to|analysis):?\s*(.+)").ok());
static ACTIONS_HEADING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:actions?|suggestions?|recommendations?):?\s*").ok()
});
static ACTION_SEPARATOR: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\n|,|\d+\.").ok());
static BULLET: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[-•*]\s*").ok());

/// The rest of the first line after a reasoning cue.
pub fn extract_reasoning(content: &str) -> String {
    LazyLock::force(&REASONING)
        .as_ref()
        .and_then(|re| re.captures(content))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_REASONING.to_string())
}

/// Items listed after an actions/suggestions/recommendations heading, up to
/// the next blank line.
pub fn extract_actions(content: &str) -> Vec<String> {
    let (Some(heading), Some(separator), Some(bullet)) = (
        LazyLock::force(&ACTIONS_HEADING).as_ref(),
        LazyLock::force(&ACTION_SEPARATOR).as_ref(),
        LazyLock::force(&BULLET).as_ref(),
    ) else {
        return Vec::new();
    };

    let Some(found) = heading.find(content) else {
        return Vec::new();
    };
    let rest = &content[found.end()..];
    let section = rest.find("\n\n").map_or(rest, |end| &rest[..end]);

    separator
        .split(section)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| bullet.replace(item, "").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// 0.7, nudged by hedging and certainty words, clamped to [0.1, 1.0].
pub fn assess_confidence(content: &str) -> f64 {
    let lower = content.to_lowercase();
    let count = |words: &[&str]| -> usize { words.iter().map(|w| lower.matches(w).count()).sum() };

    let confident = count(&CONFIDENT_WORDS) as f64;
    let uncertain = count(&UNCERTAIN_WORDS) as f64;
    clamp_confidence(BASE_CONFIDENCE + confident * CONFIDENCE_STEP - uncertain * CONFIDENCE_STEP)
}

/// Tags naming the optional inputs that were present.
pub fn context_used(input: &ReasoningInput) -> Vec<String> {
    let mut used = Vec::new();
    if let Some(sensor) = &input.sensor {
        if sensor.accelerometer.is_some() {
            used.push("motion".to_string());
        }
        if sensor.location.is_some() {
            used.push("location".to_string());
        }
        if sensor.device_info.is_some() {
            used.push("device_state".to_string());
        }
    }
    if input.vision.is_some() {
        used.push("vision".to_string());
    }
    if input.audio.is_some() {
        used.push("audio".to_string());
    }
    if !input.history.is_empty() {
        used.push("conversation_history".to_string());
    }
    used
}
