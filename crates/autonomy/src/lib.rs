//! Autonomous task orchestration for ARIA.
//!
//! The [`Orchestrator`] tracks tasks through their lifecycle, runs a
//! periodic analysis loop while autonomous mode is on, escalates urgent
//! insights, and sweeps scheduled tasks once they come due.

pub mod actions;
pub mod book;
pub mod orchestrator;
pub mod schedule;

pub use actions::SafeAction;
pub use orchestrator::{CycleReport, Orchestrator, SystemStatus};
