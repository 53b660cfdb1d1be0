//! # ARIA Core
//!
//! Domain types, capability traits, and error definitions for the ARIA
//! personal assistant. Every other crate depends inward on this one.
//!
//! ## Design Philosophy
//!
//! Collaborators the assistant does not own (language-model backends,
//! platform sensors, the notification service) are defined here as traits.
//! Implementations live in their respective crates or in the binary. This
//! enables:
//! - Swapping backends and sensor platforms via configuration
//! - Testing every engine against scripted stand-ins
//! - A clean dependency graph with no process-wide singletons

pub mod backend;
pub mod clock;
pub mod context;
pub mod error;
pub mod insight;
pub mod media;
pub mod message;
pub mod notification;
pub mod response;
pub mod sensor;
pub mod source;
pub mod task;

// Re-export key types at crate root for ergonomics
pub use backend::{BackendCapabilities, BackendRequest, ImagePayload, ModelBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{Context, ContextLocation, DeviceState, TimeOfDay, UserPreferences};
pub use error::{BackendError, Error, NotificationError, Result, SensorError, TaskError};
pub use insight::{Insight, InsightKind, Priority};
pub use media::{AudioData, VisionAnalysis};
pub use message::{ChatTurn, TurnRole};
pub use notification::{Notification, NotificationPriority, NotificationSink, QuickAction};
pub use response::{AiResponse, CONSENSUS_MODEL, ERROR_MODEL, clamp_confidence};
pub use sensor::{
    AxisReading, Connectivity, DeviceInfo, LocationReading, MotionPattern, Orientation,
    SensorSnapshot,
};
pub use source::{DeviceProbe, Permission, PermissionStatus, SensorSample, SensorSource, SensorStream};
pub use task::{AutonomousTask, TaskKind, TaskStatus};
