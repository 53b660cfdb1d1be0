//! The reasoning engine: select, prompt, invoke, parse.
//!
//! `process_query` and `get_consensus` never return an error. Any failure
//! along the way is logged and turned into [`AiResponse::fallback`].

use aria_core::{
    AiResponse, BackendCapabilities, BackendError, BackendRequest, Clock, ModelBackend,
    CONSENSUS_MODEL, clamp_confidence,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::input::ReasoningInput;
use crate::parse;
use crate::prompt::build_system_prompt;
use crate::selection::{QueryTraits, ScoreTable, score_backends};

const CONSENSUS_REASONING: &str = "Combined reasoning from multiple AI models for enhanced accuracy";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A backend plus what the scorer needs to know about it.
struct RegisteredBackend {
    backend: Arc<dyn ModelBackend>,
    capabilities: BackendCapabilities,
    timeout: Duration,
}

pub struct ReasoningEngine {
    backends: Vec<RegisteredBackend>,
    clock: Arc<dyn Clock>,
}

impl ReasoningEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            backends: Vec::new(),
            clock,
        }
    }

    /// Register a backend. Declaration order breaks scoring ties.
    pub fn register(
        &mut self,
        backend: Arc<dyn ModelBackend>,
        capabilities: BackendCapabilities,
        timeout: Duration,
    ) {
        self.backends.push(RegisteredBackend {
            backend,
            capabilities,
            timeout,
        });
    }

    /// Builder form of [`register`](Self::register) with the default timeout.
    pub fn with_backend(
        mut self,
        backend: Arc<dyn ModelBackend>,
        capabilities: BackendCapabilities,
    ) -> Self {
        self.register(backend, capabilities, DEFAULT_TIMEOUT);
        self
    }

    pub fn backend_ids(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.backend.id()).collect()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// The full score table for an input, in declaration order.
    pub fn score(&self, input: &ReasoningInput) -> ScoreTable {
        let profiles: Vec<(&str, BackendCapabilities)> = self
            .backends
            .iter()
            .map(|b| (b.backend.id(), b.capabilities))
            .collect();
        score_backends(
            &profiles,
            QueryTraits::detect(input),
            &input.context.user_preferences.preferred_backend,
        )
    }

    /// Id of the backend `process_query` would call.
    pub fn select_backend(&self, input: &ReasoningInput) -> Option<String> {
        self.score(input).winner().map(str::to_string)
    }

    /// Answer with the best-scoring backend.
    pub async fn process_query(&self, input: &ReasoningInput) -> AiResponse {
        let Some(selected) = self.select_backend(input) else {
            warn!("No backends registered");
            return AiResponse::fallback(self.clock.now());
        };
        let Some(entry) = self.backends.iter().find(|b| b.backend.id() == selected) else {
            return AiResponse::fallback(self.clock.now());
        };

        info!(backend = %selected, "Selected backend for query");

        match self.call(entry, input).await {
            Ok(response) => response,
            Err(e) => {
                error!(backend = %selected, error = %e, "Reasoning failed");
                AiResponse::fallback(self.clock.now())
            }
        }
    }

    /// Ask every backend at once and merge whatever comes back.
    ///
    /// Falls back to [`process_query`](Self::process_query) when no backend
    /// answers.
    pub async fn get_consensus(&self, input: &ReasoningInput) -> AiResponse {
        info!(backends = self.backends.len(), "Requesting multi-backend consensus");

        let outcomes =
            futures::future::join_all(self.backends.iter().map(|entry| self.call(entry, input)))
                .await;

        let mut survivors = Vec::with_capacity(outcomes.len());
        for (entry, outcome) in self.backends.iter().zip(outcomes) {
            match outcome {
                Ok(response) => survivors.push(response),
                Err(e) => warn!(backend = %entry.backend.id(), error = %e, "Consensus member failed"),
            }
        }

        if survivors.is_empty() {
            warn!("All backends failed, falling back to single-backend query");
            return self.process_query(input).await;
        }

        merge_consensus(&survivors, parse::context_used(input), self.clock.now())
    }

    /// One backend round trip, bounded by the backend's timeout.
    async fn call(
        &self,
        entry: &RegisteredBackend,
        input: &ReasoningInput,
    ) -> Result<AiResponse, BackendError> {
        let id = entry.backend.id();
        let request = BackendRequest {
            system_prompt: build_system_prompt(&input.context, input.sensor.as_ref(), self.clock.now()),
            history: input.history.clone(),
            query: input.query.clone(),
            image: input.image.clone().filter(|_| entry.capabilities.vision),
        };

        let content = match tokio::time::timeout(entry.timeout, entry.backend.invoke(request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(BackendError::Timeout(format!(
                    "Backend '{}' timed out after {}s",
                    id,
                    entry.timeout.as_secs()
                )));
            }
        };

        debug!(backend = %id, chars = content.len(), "Backend answered");

        Ok(AiResponse {
            reasoning: parse::extract_reasoning(&content),
            actions: parse::extract_actions(&content),
            confidence: parse::assess_confidence(&content),
            content,
            model: id.to_string(),
            timestamp: self.clock.now(),
            context_used: parse::context_used(input),
        })
    }
}

fn merge_consensus(
    survivors: &[AiResponse],
    context_used: Vec<String>,
    timestamp: chrono::DateTime<chrono::Local>,
) -> AiResponse {
    let combined = survivors
        .iter()
        .enumerate()
        .map(|(i, r)| format!("Model {} ({}): {}", i + 1, r.model, r.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    let confidence =
        survivors.iter().map(|r| r.confidence).sum::<f64>() / survivors.len() as f64;

    let mut actions: Vec<String> = Vec::new();
    for action in survivors.iter().flat_map(|r| r.actions.iter()) {
        if !actions.contains(action) {
            actions.push(action.clone());
        }
    }

    AiResponse {
        content: format!("Multi-model consensus analysis:\n\n{combined}"),
        reasoning: CONSENSUS_REASONING.into(),
        actions,
        confidence: clamp_confidence(confidence),
        model: CONSENSUS_MODEL.into(),
        timestamp,
        context_used,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::{
        AxisReading, Context, ImagePayload, ManualClock, SensorSnapshot, UserPreferences,
    };
    use async_trait::async_trait;
    use chrono::{Local, TimeZone};
    use std::sync::Mutex;

    /// Returns a canned answer and records what it was asked.
    struct ScriptedBackend {
        id: String,
        reply: Result<String, BackendError>,
        requests: Mutex<Vec<BackendRequest>>,
    }

    impl ScriptedBackend {
        fn ok(id: &str, reply: &str) -> Arc<Self> {
            Arc::new(Self {
                id: id.into(),
                reply: Ok(reply.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(id: &str, error: BackendError) -> Arc<Self> {
            Arc::new(Self {
                id: id.into(),
                reply: Err(error),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> BackendRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        fn id(&self) -> &str {
            &self.id
        }

        async fn invoke(&self, request: BackendRequest) -> Result<String, BackendError> {
            self.requests.lock().unwrap().push(request);
            self.reply.clone()
        }
    }

    /// Never answers.
    struct HangingBackend;

    #[async_trait]
    impl ModelBackend for HangingBackend {
        fn id(&self) -> &str {
            "hanging"
        }

        async fn invoke(&self, _request: BackendRequest) -> Result<String, BackendError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(BackendError::Network("unreachable".into()))
        }
    }

    fn caps(reasoning: u8, real_time: bool, vision: bool) -> BackendCapabilities {
        BackendCapabilities {
            reasoning,
            vision,
            code_generation: reasoning,
            real_time_data: real_time,
            context_window: 128_000,
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap(),
        ))
    }

    fn input(query: &str) -> ReasoningInput {
        let clock = clock();
        ReasoningInput::new(query, Context::bare(UserPreferences::default(), clock.now()))
    }

    fn three(
        openai: Arc<dyn ModelBackend>,
        anthropic: Arc<dyn ModelBackend>,
        grok: Arc<dyn ModelBackend>,
    ) -> ReasoningEngine {
        ReasoningEngine::new(clock())
            .with_backend(openai, caps(9, false, true))
            .with_backend(anthropic, caps(10, false, true))
            .with_backend(grok, caps(8, true, false))
    }

    const ANSWER: &str = "You should definitely charge now.\nReasoning: battery is at 12%\n\nActions:\n1. Plug in\n2. Dim the screen";

    #[tokio::test]
    async fn process_query_parses_selected_backend_output() {
        let openai = ScriptedBackend::ok("openai", ANSWER);
        let anthropic = ScriptedBackend::ok("anthropic", "unused");
        let grok = ScriptedBackend::ok("grok", "unused");
        let engine = three(openai.clone(), anthropic.clone(), grok.clone());

        let sensor = SensorSnapshot {
            accelerometer: Some(AxisReading::new(0.0, 0.0, 9.8, Local::now())),
            ..SensorSnapshot::default()
        };
        let response = engine
            .process_query(&input("hello there").with_sensor(sensor))
            .await;

        assert_eq!(response.model, "openai");
        assert_eq!(response.content, ANSWER);
        assert_eq!(response.reasoning, "battery is at 12%");
        assert_eq!(response.actions, vec!["Plug in", "Dim the screen"]);
        assert!((response.confidence - 0.75).abs() < 1e-9);
        assert_eq!(response.context_used, vec!["motion"]);
        assert_eq!(openai.calls(), 1);
        assert_eq!(anthropic.calls() + grok.calls(), 0);

        let sent = openai.last_request();
        assert!(sent.system_prompt.contains("- Motion: X:0.00, Y:0.00, Z:9.80"));
        assert_eq!(sent.query, "hello there");
    }

    #[tokio::test]
    async fn real_time_query_goes_to_real_time_backend() {
        let grok = ScriptedBackend::ok("grok", "Live scores are 2-1.");
        let engine = three(
            ScriptedBackend::ok("openai", "x"),
            ScriptedBackend::ok("anthropic", "x"),
            grok.clone(),
        );
        let response = engine.process_query(&input("score in real time")).await;
        assert_eq!(response.model, "grok");
        assert_eq!(grok.calls(), 1);
    }

    #[tokio::test]
    async fn failing_backend_yields_fallback() {
        let engine = three(
            ScriptedBackend::failing("openai", BackendError::Authentication("bad key".into())),
            ScriptedBackend::ok("anthropic", "x"),
            ScriptedBackend::ok("grok", "x"),
        );
        let response = engine.process_query(&input("hello")).await;
        assert_eq!(response.model, "error");
        assert_eq!(response.confidence, 0.1);
        assert!(response.context_used.is_empty());
    }

    #[tokio::test]
    async fn no_backends_yields_fallback() {
        let engine = ReasoningEngine::new(clock());
        assert!(engine.process_query(&input("hello")).await.is_error());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let mut engine = ReasoningEngine::new(clock());
        engine.register(Arc::new(HangingBackend), caps(5, false, false), Duration::from_secs(2));
        let response = engine.process_query(&input("hello")).await;
        assert!(response.is_error());
    }

    #[tokio::test]
    async fn consensus_survives_partial_failure() {
        let engine = three(
            ScriptedBackend::ok("openai", "Clearly fine.\nSuggestions: rest, hydrate"),
            ScriptedBackend::failing("anthropic", BackendError::RateLimited { retry_after_secs: 5 }),
            ScriptedBackend::ok("grok", "It might rain.\nSuggestions: hydrate, umbrella"),
        );
        let response = engine.get_consensus(&input("how am I doing")).await;

        assert_eq!(response.model, "consensus");
        assert!(response.content.starts_with("Multi-model consensus analysis:\n\n"));
        assert!(response.content.contains("Model 1 (openai): Clearly fine."));
        assert!(response.content.contains("Model 2 (grok): It might rain."));
        assert!((response.confidence - 0.7).abs() < 1e-9);
        assert_eq!(response.actions, vec!["rest", "hydrate", "umbrella"]);
        assert_eq!(
            response.reasoning,
            "Combined reasoning from multiple AI models for enhanced accuracy"
        );
    }

    #[tokio::test]
    async fn consensus_with_total_failure_falls_back() {
        let engine = three(
            ScriptedBackend::failing("openai", BackendError::Network("down".into())),
            ScriptedBackend::failing("anthropic", BackendError::Network("down".into())),
            ScriptedBackend::failing("grok", BackendError::Network("down".into())),
        );
        let response = engine.get_consensus(&input("anything")).await;
        assert_eq!(response.model, "error");
        assert_eq!(response.confidence, 0.1);
    }

    #[tokio::test]
    async fn image_only_reaches_vision_backends() {
        let grok = ScriptedBackend::ok("grok", "x");
        let openai = ScriptedBackend::ok("openai", "x");
        let engine = three(openai.clone(), ScriptedBackend::ok("anthropic", "x"), grok.clone());
        let with_image = input("look at this").with_image(ImagePayload {
            media_type: "image/jpeg".into(),
            base64_data: "AAAA".into(),
        });
        engine.get_consensus(&with_image).await;
        assert!(openai.last_request().image.is_some());
        assert!(grok.last_request().image.is_none());
    }

    #[test]
    fn score_table_is_exposed() {
        let engine = three(
            ScriptedBackend::ok("openai", "x"),
            ScriptedBackend::ok("anthropic", "x"),
            ScriptedBackend::ok("grok", "x"),
        );
        assert_eq!(engine.backend_ids(), vec!["openai", "anthropic", "grok"]);
        let table = engine.score(&input("hello"));
        assert_eq!(table.score("openai"), Some(2));
        assert_eq!(engine.select_backend(&input("latest news")), Some("grok".into()));
    }
}
