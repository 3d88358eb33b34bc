//! # Coordinate Clicker
//!
//! Record where you click, then replay left clicks at those positions on a
//! timed loop controlled by global hotkeys.
//!
//! ## Features
//!
//! - Record click positions from the global mouse hook until a cancel key
//! - Save and load positions as a JSON list of `[x, y]` pairs
//! - Replay positions in order, forever, with a fixed interval between clicks
//! - Global hotkeys to start/resume, pause, stop and cancel the replay
//! - Corner fail-safe: parking the pointer in a screen corner stops clicking
//!
//! ## Example
//!
//! ```no_run
//! use coordinate_clicker::{ClickLoop, ClickerOptions, CoordinateStore, EnigoClicker};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> coordinate_clicker::Result<()> {
//! let coordinates = CoordinateStore::load("coordinates.json")?;
//! let clicker = Arc::new(EnigoClicker::new(ClickerOptions::default())?);
//! let click_loop = ClickLoop::new(&coordinates, Duration::from_secs(1), clicker);
//!
//! click_loop.start();
//! tokio::time::sleep(Duration::from_secs(10)).await;
//! click_loop.stop();
//! let report = click_loop.wait().await?;
//! println!("clicked {} times", report.clicks);
//! # Ok(())
//! # }
//! ```

pub mod click_loop;
pub mod clicker;
pub mod config;
pub mod controller;
pub mod coordinates;
pub mod error;
pub mod global_hotkey;
pub mod input;
pub mod menu;
pub mod recorder;

pub use click_loop::{ClickLoop, LoopReport, LoopState};
pub use clicker::{ClickSink, ClickerOptions, EnigoClicker};
pub use config::{Config, HotkeyBindings};
pub use controller::{HotkeyController, ListenOutcome};
pub use coordinates::{CoordinateStore, Point};
pub use error::{ClickerError, Result};
pub use crate::global_hotkey::{HotkeyAction, HotkeyManager};
pub use input::{EventSource, InputEvent, MouseButton, RdevEventSource, Subscription};
pub use recorder::CoordinateRecorder;
