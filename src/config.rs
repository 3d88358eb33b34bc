//! Configuration file support.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! {
//!   "coordinates_file": "coordinates.json",
//!   "default_interval": "1s",
//!   "click_pause": "100ms",
//!   "fail_safe": true,
//!   "record_cancel_key": "esc",
//!   "hotkeys": { "start": "f1", "pause": "f2", "stop": "f3", "cancel": "esc" }
//! }
//! ```

use crate::clicker::{ClickerOptions, DEFAULT_CLICK_PAUSE};
use crate::coordinates::DEFAULT_COORDINATES_FILE;
use crate::error::{ClickerError, Result};
use crate::global_hotkey::{parse_hotkey, HotkeyAction};
use crate::input::{is_known_key, normalize_key_name};
use crate::recorder::DEFAULT_CANCEL_KEY;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_coordinates_file")]
    pub coordinates_file: PathBuf,

    /// Used when the interval prompt is left empty or cannot be parsed.
    #[serde(default = "default_interval", with = "duration_format")]
    pub default_interval: Duration,

    #[serde(default = "default_click_pause", with = "duration_format")]
    pub click_pause: Duration,

    #[serde(default = "default_true")]
    pub fail_safe: bool,

    #[serde(default = "default_cancel_key")]
    pub record_cancel_key: String,

    #[serde(default)]
    pub hotkeys: HotkeyBindings,
}

/// Keys that drive a replay session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyBindings {
    #[serde(default = "default_start_key")]
    pub start: String,
    #[serde(default = "default_pause_key")]
    pub pause: String,
    #[serde(default = "default_stop_key")]
    pub stop: String,
    #[serde(default = "default_cancel_key")]
    pub cancel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coordinates_file: default_coordinates_file(),
            default_interval: default_interval(),
            click_pause: default_click_pause(),
            fail_safe: true,
            record_cancel_key: default_cancel_key(),
            hotkeys: HotkeyBindings::default(),
        }
    }
}

impl Default for HotkeyBindings {
    fn default() -> Self {
        Self {
            start: default_start_key(),
            pause: default_pause_key(),
            stop: default_stop_key(),
            cancel: default_cancel_key(),
        }
    }
}

impl HotkeyBindings {
    /// Each binding with the action it triggers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, HotkeyAction)> {
        [
            (self.start.as_str(), HotkeyAction::StartResume),
            (self.pause.as_str(), HotkeyAction::Pause),
            (self.stop.as_str(), HotkeyAction::Stop),
            (self.cancel.as_str(), HotkeyAction::Cancel),
        ]
        .into_iter()
    }
}

fn default_coordinates_file() -> PathBuf {
    PathBuf::from(DEFAULT_COORDINATES_FILE)
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_click_pause() -> Duration {
    DEFAULT_CLICK_PAUSE
}

fn default_true() -> bool {
    true
}

fn default_cancel_key() -> String {
    DEFAULT_CANCEL_KEY.to_string()
}

fn default_start_key() -> String {
    "f1".to_string()
}

fn default_pause_key() -> String {
    "f2".to_string()
}

fn default_stop_key() -> String {
    "f3".to_string()
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_error =
            |reason: String| ClickerError::config_load(path.display().to_string(), reason);

        let content = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let save_error =
            |reason: String| ClickerError::config_save(path.display().to_string(), reason);

        let content = serde_json::to_string_pretty(self).map_err(|e| save_error(e.to_string()))?;
        fs::write(path, content).map_err(|e| save_error(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.coordinates_file.as_os_str().is_empty() {
            return Err(ClickerError::config_validation(
                "coordinates_file cannot be empty",
            ));
        }

        if !is_known_key(&self.record_cancel_key) {
            return Err(ClickerError::config_validation(format!(
                "record_cancel_key '{}' is not a supported key",
                self.record_cancel_key
            )));
        }

        let mut seen = HashSet::new();
        for (key, action) in self.hotkeys.iter() {
            parse_hotkey(key).map_err(|e| {
                ClickerError::config_validation(format!("hotkey for {action}: {e}"))
            })?;
            if !seen.insert(normalize_key_name(key)) {
                return Err(ClickerError::config_validation(format!(
                    "hotkey '{key}' is bound more than once"
                )));
            }
        }

        Ok(())
    }

    pub fn clicker_options(&self) -> ClickerOptions {
        ClickerOptions {
            click_pause: self.click_pause,
            fail_safe: self.fail_safe,
        }
    }
}

/// Parse `500ms`, `2s`, `1.5s`, `2m`, or a bare number of milliseconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let value = input.trim().to_lowercase();
    if value.is_empty() {
        return Err(ClickerError::invalid_duration(input, "empty value"));
    }

    let (number, unit_ms) = if let Some(n) = value.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix('s') {
        (n, 1_000.0)
    } else if let Some(n) = value.strip_suffix('m') {
        (n, 60_000.0)
    } else {
        (value.as_str(), 1.0)
    };

    let amount: f64 = number
        .trim()
        .parse()
        .map_err(|_| ClickerError::invalid_duration(input, "not a number"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(ClickerError::invalid_duration(
            input,
            "must be a non-negative number",
        ));
    }

    Ok(Duration::from_nanos((amount * unit_ms * 1_000_000.0).round() as u64))
}

/// Render a duration the way [`parse_duration`] reads it back.
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms % 1_000 == 0 && ms > 0 {
        format!("{}s", ms / 1_000)
    } else if Duration::from_millis(ms as u64) == duration {
        format!("{ms}ms")
    } else {
        format!("{}s", duration.as_secs_f64())
    }
}

mod duration_format {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse_duration(&value).map_err(serde::de::Error::custom)
    }
}
