//! Synthetic mouse clicks.

use crate::coordinates::Point;
use crate::error::{ClickerError, Result};
use enigo::{Button, Coordinate, Direction, Enigo, Mouse, Settings};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Pause the original automation backend inserted after every click.
pub const DEFAULT_CLICK_PAUSE: Duration = Duration::from_millis(100);

/// Issues left clicks at screen positions.
pub trait ClickSink: Send + Sync {
    /// Move the pointer to `point` and click the left button there.
    fn click(&self, point: Point) -> Result<()>;

    /// Extra delay the backend needs after each click.
    fn pause_after_click(&self) -> Duration {
        Duration::ZERO
    }
}

/// Options for [`EnigoClicker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickerOptions {
    pub click_pause: Duration,
    /// Refuse to click while the pointer sits in a corner of the main display.
    pub fail_safe: bool,
}

impl Default for ClickerOptions {
    fn default() -> Self {
        Self {
            click_pause: DEFAULT_CLICK_PAUSE,
            fail_safe: true,
        }
    }
}

/// Click sink backed by `enigo`.
pub struct EnigoClicker {
    enigo: Mutex<Enigo>,
    options: ClickerOptions,
}

impl EnigoClicker {
    pub fn new(options: ClickerOptions) -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| ClickerError::injector(format!("failed to create Enigo: {e}")))?;

        Ok(Self {
            enigo: Mutex::new(enigo),
            options,
        })
    }

    fn check_fail_safe(&self, enigo: &Enigo) -> Result<()> {
        let (x, y) = match enigo.location() {
            Ok(location) => location,
            Err(e) => {
                warn!(error = %e, "Cannot read pointer location, skipping fail-safe check");
                return Ok(());
            }
        };
        let display = match enigo.main_display() {
            Ok(display) => display,
            Err(e) => {
                warn!(error = %e, "Cannot read display size, skipping fail-safe check");
                return Ok(());
            }
        };

        if is_corner(Point::new(x, y), display) {
            return Err(ClickerError::FailSafe { x, y });
        }
        Ok(())
    }
}

impl ClickSink for EnigoClicker {
    fn click(&self, point: Point) -> Result<()> {
        let mut enigo = self.enigo.lock().unwrap_or_else(PoisonError::into_inner);

        if self.options.fail_safe {
            self.check_fail_safe(&enigo)?;
        }

        debug!(x = point.x, y = point.y, "injecting click");
        enigo
            .move_mouse(point.x, point.y, Coordinate::Abs)
            .map_err(|e| ClickerError::click_failed(point.x, point.y, e.to_string()))?;
        enigo
            .button(Button::Left, Direction::Click)
            .map_err(|e| ClickerError::click_failed(point.x, point.y, e.to_string()))?;

        Ok(())
    }

    fn pause_after_click(&self) -> Duration {
        self.options.click_pause
    }
}

/// Only the four exact corner pixels of the main display count. Points on
/// other monitors, including negative coordinates, never trip the check.
fn is_corner(point: Point, (width, height): (i32, i32)) -> bool {
    let right = width - 1;
    let bottom = height - 1;
    [(0, 0), (right, 0), (0, bottom), (right, bottom)].contains(&(point.x, point.y))
}
