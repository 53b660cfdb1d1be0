//! Finished records handed over by the vision and audio producers.
//!
//! Capture and transcription happen elsewhere; the core only reads these.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionAnalysis {
    pub description: String,
    pub objects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotions: Option<Vec<String>>,
    pub scene: String,
    pub confidence: f64,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioData {
    pub transcription: String,
    pub confidence: f64,
    /// Seconds of audio.
    pub duration: f64,
    pub timestamp: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}
