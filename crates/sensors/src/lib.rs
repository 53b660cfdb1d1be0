//! Sensor normalization for ARIA.
//!
//! The [`SensorManager`] folds independent platform streams into one
//! [`aria_core::SensorSnapshot`] and classifies motion and orientation from it.

pub mod classify;
pub mod manager;
pub mod scripted;

pub use classify::{motion_pattern, orientation};
pub use manager::{SensorManager, UserState};
pub use scripted::ScriptedSensorSource;
