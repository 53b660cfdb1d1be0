//! The context engine for ARIA.
//!
//! Turns sensor snapshots (plus optional vision and audio records) into
//! `Context` records, keeps a bounded history of them, and mines both for
//! insights.

pub mod engine;
pub mod monitor;
pub mod prompts;
pub mod rules;

pub use engine::{ContextEngine, ContextPrediction, PredictedContext};
pub use monitor::ContextMonitor;
