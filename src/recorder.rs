//! Capture click positions from the global event stream.

use crate::coordinates::{CoordinateStore, Point};
use crate::error::Result;
use crate::input::{normalize_key_name, EventSource, InputEvent, MouseButton};
use tracing::info;

/// Key that ends a recording session unless configured otherwise.
pub const DEFAULT_CANCEL_KEY: &str = "esc";

/// Records the position of every left-button press until the cancel key.
pub struct CoordinateRecorder<S> {
    source: S,
    cancel_key: String,
    coordinates: CoordinateStore,
}

impl<S: EventSource> CoordinateRecorder<S> {
    pub fn new(source: S) -> Self {
        Self::with_cancel_key(source, DEFAULT_CANCEL_KEY)
    }

    pub fn with_cancel_key(source: S, cancel_key: &str) -> Self {
        Self {
            source,
            cancel_key: normalize_key_name(cancel_key),
            coordinates: CoordinateStore::new(),
        }
    }

    /// Block until the cancel key is pressed, recording left clicks.
    ///
    /// Previously recorded points are discarded first. Returns the number of
    /// points captured.
    pub fn start_recording(&mut self) -> Result<usize> {
        self.coordinates.clear();
        let subscription = self.source.subscribe()?;
        info!(cancel_key = %self.cancel_key, "Recording clicks");

        loop {
            match subscription.recv()? {
                InputEvent::ButtonPress {
                    button: MouseButton::Left,
                    position,
                } => self.record(position),
                InputEvent::KeyPress { key } if key == self.cancel_key => break,
                _ => {}
            }
        }

        subscription.unsubscribe();
        info!(count = self.coordinates.len(), "Recording stopped");
        Ok(self.coordinates.len())
    }

    fn record(&mut self, position: Point) {
        self.coordinates.push(position);
        info!(
            "Recorded point {} - {} total",
            position,
            self.coordinates.len()
        );
    }

    pub fn coordinates(&self) -> &CoordinateStore {
        &self.coordinates
    }

    pub fn into_coordinates(self) -> CoordinateStore {
        self.coordinates
    }
}
