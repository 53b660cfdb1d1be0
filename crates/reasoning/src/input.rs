use aria_core::{AudioData, ChatTurn, Context, ImagePayload, SensorSnapshot, VisionAnalysis};
use serde::Serialize;

/// Everything one reasoning call may look at.
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningInput {
    pub query: String,
    pub context: Context,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor: Option<SensorSnapshot>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision: Option<VisionAnalysis>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioData>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatTurn>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePayload>,
}

impl ReasoningInput {
    pub fn new(query: impl Into<String>, context: Context) -> Self {
        Self {
            query: query.into(),
            context,
            sensor: None,
            vision: None,
            audio: None,
            history: Vec::new(),
            image: None,
        }
    }

    pub fn with_sensor(mut self, sensor: SensorSnapshot) -> Self {
        self.sensor = Some(sensor);
        self
    }

    pub fn with_vision(mut self, vision: VisionAnalysis) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_audio(mut self, audio: AudioData) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }

    /// Length of the JSON-serialized input, used by the large-input heuristic.
    pub fn serialized_len(&self) -> usize {
        serde_json::to_string(self).map(|s| s.len()).unwrap_or(0)
    }
}
