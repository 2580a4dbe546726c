//! Automation settings
//!
//! All tunables the loop needs: matching threshold, capture region,
//! retry counts, and the various pacing delays. The vision and detection
//! layers never read these themselves; values are handed to them
//! explicitly, so the settings object stays a plain data carrier.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::vision::{Region, DEFAULT_THRESHOLD};

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Confidence threshold for template matches (0.0 to 1.0)
    pub confidence_threshold: f32,
    /// Directory containing template images
    pub templates_dir: PathBuf,
    /// Optional screen region to restrict capture and search to
    pub search_region: Option<Region>,
    /// Maximum click retry attempts
    pub max_retries: u32,
    /// Pacing delays
    pub timings: TimingSettings,
    /// TP recovery behavior
    pub tp_recovery: TpRecoverySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_THRESHOLD,
            templates_dir: PathBuf::from("templates"),
            search_region: None,
            max_retries: 5,
            timings: TimingSettings::default(),
            tp_recovery: TpRecoverySettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize settings to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Delays that pace the perception/action loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Settle time after each click (ms)
    pub action_delay_ms: u64,
    /// Delay between click retries (ms)
    pub retry_delay_ms: u64,
    /// Wait after a handled screen before re-classifying (ms)
    pub screen_change_delay_ms: u64,
    /// Minimum time before acting on the same screen again (ms)
    pub cooldown_ms: u64,
    /// Backoff while the screen is unrecognized (ms)
    pub unknown_screen_delay_ms: u64,
    /// Poll interval for waits (ms)
    pub poll_interval_ms: u64,
    /// Default timeout when waiting for a screen (ms)
    pub wait_timeout_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            action_delay_ms: 1000,
            retry_delay_ms: 2000,
            screen_change_delay_ms: 1500,
            cooldown_ms: 2000,
            unknown_screen_delay_ms: 500,
            poll_interval_ms: 500,
            wait_timeout_ms: 10_000,
        }
    }
}

impl TimingSettings {
    /// Settle time after each click
    pub fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay_ms)
    }

    /// Delay between click retries
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Wait after a handled screen before re-classifying
    pub fn screen_change_delay(&self) -> Duration {
        Duration::from_millis(self.screen_change_delay_ms)
    }

    /// Minimum time before acting on the same screen again
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Backoff while the screen is unrecognized
    pub fn unknown_screen_delay(&self) -> Duration {
        Duration::from_millis(self.unknown_screen_delay_ms)
    }

    /// Poll interval for waits
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Default timeout when waiting for a screen
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }
}

/// TP recovery behavior and the item-row click position
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TpRecoverySettings {
    /// Whether to recover TP automatically when prompted
    pub auto_recover: bool,
    /// X offset of the item "use" button, relative to the search region
    pub button_x: i32,
    /// Y offset of the second item row, relative to the search region
    pub second_row_y: i32,
}

impl Default for TpRecoverySettings {
    fn default() -> Self {
        Self {
            auto_recover: false,
            button_x: 350,
            second_row_y: 195,
        }
    }
}
