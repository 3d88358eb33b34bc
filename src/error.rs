//! Custom error types for coordinate-clicker.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative error messages.

use std::io;
use thiserror::Error;

/// Main error type for coordinate-clicker operations.
#[derive(Error, Debug)]
pub enum ClickerError {
    /// The global mouse/keyboard event source could not be used.
    #[error("input event source unavailable: {0}")]
    EventSource(String),

    /// A synthetic click could not be issued.
    #[error("failed to click at ({x}, {y}): {reason}")]
    ClickFailed { x: i32, y: i32, reason: String },

    /// The synthetic click backend could not be created.
    #[error("click injector unavailable: {0}")]
    Injector(String),

    /// The pointer was parked in a screen corner, so clicking was refused.
    #[error("fail-safe triggered: pointer at screen corner ({x}, {y})")]
    FailSafe { x: i32, y: i32 },

    /// A coordinate pair could not be parsed.
    #[error("invalid point '{input}': {reason}")]
    InvalidPoint { input: String, reason: String },

    /// The specified key is invalid or unsupported.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing configuration file.
    #[error("failed to load config from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing configuration file.
    #[error("failed to save config to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// Error parsing duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// Error registering or handling hotkey.
    #[error("hotkey error: {0}")]
    Hotkey(String),

    /// The background replay task panicked or was cancelled.
    #[error("click loop task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for coordinate-clicker operations.
pub type Result<T> = std::result::Result<T, ClickerError>;

impl ClickerError {
    /// Create a new EventSource error.
    pub fn event_source(message: impl Into<String>) -> Self {
        Self::EventSource(message.into())
    }

    /// Create a new ClickFailed error.
    pub fn click_failed(x: i32, y: i32, reason: impl Into<String>) -> Self {
        Self::ClickFailed {
            x,
            y,
            reason: reason.into(),
        }
    }

    /// Create a new Injector error.
    pub fn injector(message: impl Into<String>) -> Self {
        Self::Injector(message.into())
    }

    /// Create a new InvalidPoint error.
    pub fn invalid_point(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPoint {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidKey error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigValidation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new ConfigLoad error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigSave error.
    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidDuration error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Hotkey error.
    pub fn hotkey(message: impl Into<String>) -> Self {
        Self::Hotkey(message.into())
    }
}
