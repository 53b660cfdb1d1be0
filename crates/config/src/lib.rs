//! Configuration loading, validation, and management for ARIA.
//!
//! Loads configuration from `~/.aria/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use aria_core::{BackendCapabilities, UserPreferences};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.aria/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shared API key, used by any backend without its own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// User preferences copied into every context
    #[serde(default)]
    pub user: UserConfig,

    /// Model backends, in declaration order (also the selection tie-break order)
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendConfig>,

    /// Context engine retention and cadence
    #[serde(default)]
    pub context: ContextConfig,

    /// Autonomous orchestrator cadence and limits
    #[serde(default)]
    pub autonomy: AutonomyConfig,

    /// Sensor subscription rates
    #[serde(default)]
    pub sensors: SensorConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("user", &self.user)
            .field("backends", &self.backends)
            .field("context", &self.context)
            .field("autonomy", &self.autonomy)
            .field("sensors", &self.sensors)
            .finish()
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_preferred_backend")]
    pub preferred_backend: String,

    #[serde(default = "default_true")]
    pub voice_enabled: bool,

    #[serde(default = "default_true")]
    pub camera_enabled: bool,

    #[serde(default = "default_true")]
    pub location_enabled: bool,
}

fn default_preferred_backend() -> String {
    "openai".into()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            preferred_backend: default_preferred_backend(),
            voice_enabled: true,
            camera_enabled: true,
            location_enabled: true,
        }
    }
}

impl UserConfig {
    pub fn preferences(&self) -> UserPreferences {
        UserPreferences {
            preferred_backend: self.preferred_backend.clone(),
            voice_enabled: self.voice_enabled,
            camera_enabled: self.camera_enabled,
            location_enabled: self.location_enabled,
        }
    }
}

/// Which wire protocol a backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// `/chat/completions` (OpenAI, xAI Grok, OpenRouter, Ollama, ...)
    OpenaiCompat,
    /// Native Anthropic Messages API
    Anthropic,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Identifier used in scoring, preferences and responses
    pub id: String,

    pub kind: BackendKind,

    /// Model name sent on the wire
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(flatten)]
    pub capabilities: BackendCapabilities,
}

fn default_timeout_secs() -> u64 {
    60
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}

fn default_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig {
            id: "openai".into(),
            kind: BackendKind::OpenaiCompat,
            model: "gpt-4o".into(),
            api_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            capabilities: BackendCapabilities {
                reasoning: 9,
                vision: true,
                code_generation: 8,
                real_time_data: false,
                context_window: 128_000,
            },
        },
        BackendConfig {
            id: "anthropic".into(),
            kind: BackendKind::Anthropic,
            model: "claude-3-5-sonnet-20241022".into(),
            api_url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            capabilities: BackendCapabilities {
                reasoning: 10,
                vision: true,
                code_generation: 9,
                real_time_data: false,
                context_window: 200_000,
            },
        },
        BackendConfig {
            id: "grok".into(),
            kind: BackendKind::OpenaiCompat,
            model: "grok-beta".into(),
            api_url: Some("https://api.x.ai/v1".into()),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            capabilities: BackendCapabilities {
                reasoning: 8,
                vision: true,
                code_generation: 7,
                real_time_data: true,
                context_window: 131_072,
            },
        },
    ]
}

/// Retention bounds and cadence for the context engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: usize,

    #[serde(default = "default_insight_limit")]
    pub insight_limit: usize,

    #[serde(default = "default_insight_max_age_secs")]
    pub insight_max_age_secs: u64,

    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,

    /// Linear drain estimate used by context prediction, percent per hour
    #[serde(default = "default_battery_drain_per_hour")]
    pub battery_drain_per_hour: f64,
}

fn default_history_limit() -> usize {
    100
}
fn default_recent_activity_limit() -> usize {
    10
}
fn default_insight_limit() -> usize {
    50
}
fn default_insight_max_age_secs() -> u64 {
    3600
}
fn default_monitor_interval_secs() -> u64 {
    30
}
fn default_battery_drain_per_hour() -> f64 {
    5.0
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            recent_activity_limit: default_recent_activity_limit(),
            insight_limit: default_insight_limit(),
            insight_max_age_secs: default_insight_max_age_secs(),
            monitor_interval_secs: default_monitor_interval_secs(),
            battery_drain_per_hour: default_battery_drain_per_hour(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutonomyConfig {
    #[serde(default = "default_analysis_interval_secs")]
    pub analysis_interval_secs: u64,

    /// Local hour the daily summary is scheduled for
    #[serde(default = "default_daily_summary_hour")]
    pub daily_summary_hour: u32,

    /// How many of an urgent insight's actions may run autonomously
    #[serde(default = "default_max_actions_per_insight")]
    pub max_actions_per_insight: usize,

    #[serde(default = "default_reminder_delay_secs")]
    pub reminder_delay_secs: u64,

    #[serde(default = "default_scheduled_analysis_delay_secs")]
    pub scheduled_analysis_delay_secs: u64,

    /// Minimum spacing of background-triggered passes
    #[serde(default = "default_background_interval_secs")]
    pub background_interval_secs: u64,
}

fn default_analysis_interval_secs() -> u64 {
    300
}
fn default_daily_summary_hour() -> u32 {
    20
}
fn default_max_actions_per_insight() -> usize {
    2
}
fn default_reminder_delay_secs() -> u64 {
    1800
}
fn default_scheduled_analysis_delay_secs() -> u64 {
    3600
}
fn default_background_interval_secs() -> u64 {
    900
}

impl Default for AutonomyConfig {
    fn default() -> Self {
        Self {
            analysis_interval_secs: default_analysis_interval_secs(),
            daily_summary_hour: default_daily_summary_hour(),
            max_actions_per_insight: default_max_actions_per_insight(),
            reminder_delay_secs: default_reminder_delay_secs(),
            scheduled_analysis_delay_secs: default_scheduled_analysis_delay_secs(),
            background_interval_secs: default_background_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    #[serde(default = "default_axis_interval_ms")]
    pub accelerometer_interval_ms: u64,

    #[serde(default = "default_axis_interval_ms")]
    pub gyroscope_interval_ms: u64,

    #[serde(default = "default_magnetometer_interval_ms")]
    pub magnetometer_interval_ms: u64,

    #[serde(default = "default_location_interval_secs")]
    pub location_interval_secs: u64,

    #[serde(default = "default_location_distance_m")]
    pub location_distance_m: f64,

    /// Gravity removed along the dominant axis before motion classification.
    /// Set to 0 for platforms that already report linear acceleration.
    #[serde(default = "default_gravity")]
    pub gravity: f64,
}

fn default_axis_interval_ms() -> u64 {
    1000
}
fn default_magnetometer_interval_ms() -> u64 {
    2000
}
fn default_location_interval_secs() -> u64 {
    30
}
fn default_location_distance_m() -> f64 {
    100.0
}
fn default_gravity() -> f64 {
    9.81
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            accelerometer_interval_ms: default_axis_interval_ms(),
            gyroscope_interval_ms: default_axis_interval_ms(),
            magnetometer_interval_ms: default_magnetometer_interval_ms(),
            location_interval_secs: default_location_interval_secs(),
            location_distance_m: default_location_distance_m(),
            gravity: default_gravity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.aria/config.toml).
    ///
    /// Environment overrides:
    /// - `ARIA_API_KEY`: shared key when none is configured
    /// - `OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `XAI_API_KEY`: per backend
    /// - `ARIA_PREFERRED_BACKEND`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load a specific file and apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("ARIA_API_KEY");
        }

        for backend in &mut self.backends {
            if backend.api_key.is_some() {
                continue;
            }
            backend.api_key = match backend.id.as_str() {
                "openai" => lookup("OPENAI_API_KEY"),
                "anthropic" => lookup("ANTHROPIC_API_KEY"),
                "grok" => lookup("XAI_API_KEY"),
                other => lookup(&format!("ARIA_{}_API_KEY", other.to_uppercase())),
            };
        }

        if let Some(preferred) = lookup("ARIA_PREFERRED_BACKEND") {
            self.user.preferred_backend = preferred;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".aria")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backends.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one backend must be configured".into(),
            ));
        }

        let mut seen = HashSet::new();
        for backend in &self.backends {
            if !seen.insert(backend.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate backend id '{}'",
                    backend.id
                )));
            }
            if backend.temperature < 0.0 || backend.temperature > 2.0 {
                return Err(ConfigError::ValidationError(format!(
                    "backend '{}': temperature must be between 0.0 and 2.0",
                    backend.id
                )));
            }
            if backend.capabilities.reasoning > 10 || backend.capabilities.code_generation > 10 {
                return Err(ConfigError::ValidationError(format!(
                    "backend '{}': capability scores must be 0-10",
                    backend.id
                )));
            }
            if backend.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "backend '{}': timeout_secs must be > 0",
                    backend.id
                )));
            }
        }

        if !seen.contains(self.user.preferred_backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "preferred_backend '{}' is not a configured backend",
                self.user.preferred_backend
            )));
        }

        if self.context.history_limit == 0
            || self.context.insight_limit == 0
            || self.context.recent_activity_limit == 0
        {
            return Err(ConfigError::ValidationError(
                "context limits must be > 0".into(),
            ));
        }

        if self.context.monitor_interval_secs == 0 || self.autonomy.analysis_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "monitor and analysis intervals must be > 0".into(),
            ));
        }

        if self.autonomy.daily_summary_hour > 23 {
            return Err(ConfigError::ValidationError(
                "daily_summary_hour must be 0-23".into(),
            ));
        }

        Ok(())
    }

    /// The key a backend should authenticate with, if any.
    pub fn api_key_for(&self, backend: &BackendConfig) -> Option<String> {
        backend.api_key.clone().or_else(|| self.api_key.clone())
    }

    /// Look up a backend by id.
    pub fn backend(&self, id: &str) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.id == id)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user: UserConfig::default(),
            backends: default_backends(),
            context: ContextConfig::default(),
            autonomy: AutonomyConfig::default(),
            sensors: SensorConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
