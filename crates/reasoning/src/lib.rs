//! The reasoning engine for ARIA.
//!
//! Every backend implements `aria_core::ModelBackend`. The engine scores the
//! registered backends against the query, builds one system prompt, and turns
//! the free-text answer into an `AiResponse`.

pub mod anthropic;
pub mod engine;
mod http;
pub mod input;
pub mod openai_compat;
pub mod parse;
pub mod prompt;
pub mod registry;
pub mod selection;

pub use anthropic::AnthropicBackend;
pub use engine::ReasoningEngine;
pub use input::ReasoningInput;
pub use openai_compat::OpenAiCompatBackend;
pub use registry::build_from_config;
pub use selection::{QueryTraits, ScoreTable};
