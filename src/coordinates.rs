//! Screen points and their on-disk storage.
//!
//! A [`CoordinateStore`] is the ordered list of points the click loop replays.
//! It is persisted as a JSON array of `[x, y]` pairs, for example:
//!
//! ```json
//! [
//!   [100, 200],
//!   [300, 400]
//! ]
//! ```

use crate::error::{ClickerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Default file name used to persist recorded coordinates.
pub const DEFAULT_COORDINATES_FILE: &str = "coordinates.json";

/// An (x, y) pixel position on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (i32, i32) {
    fn from(point: Point) -> Self {
        (point.x, point.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Parses the `x,y` form used for manual entry. Whitespace around either
/// number is ignored.
impl FromStr for Point {
    type Err = ClickerError;

    fn from_str(s: &str) -> Result<Self> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| ClickerError::invalid_point(s, "expected format x,y"))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|e| ClickerError::invalid_point(s, e.to_string()))
        };

        Ok(Self::new(parse(x)?, parse(y)?))
    }
}

/// Ordered sequence of points. Order is replay order and duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateStore {
    points: Vec<Point>,
}

impl CoordinateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Write the points to `path` as pretty-printed JSON, replacing any
    /// existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        info!(?path, count = self.len(), "Saved coordinates");
        Ok(())
    }

    /// Read points previously written by [`save`](Self::save).
    ///
    /// A missing file is not an error: it yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(?path, "No saved coordinates");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let store: Self = serde_json::from_str(&json)?;
        debug!(?path, count = store.len(), "Loaded coordinates");
        Ok(store)
    }
}

impl From<Vec<Point>> for CoordinateStore {
    fn from(points: Vec<Point>) -> Self {
        Self { points }
    }
}

impl FromIterator<Point> for CoordinateStore {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CoordinateStore {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
