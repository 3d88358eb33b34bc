//! The replay loop and its start/pause/resume/stop state machine.
//!
//! State lives in a `watch` channel owned by [`ClickLoop`]. The replay task
//! only reads it, except when a click fails and the task stops itself.

use crate::clicker::ClickSink;
use crate::coordinates::{CoordinateStore, Point};
use crate::error::{ClickerError, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle of a [`ClickLoop`].
///
/// Transitions only move forward: `Idle -> Running <-> Paused -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Totals reported when the replay task ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub clicks: u64,
    /// Full passes over the point list.
    pub cycles: u64,
}

/// Clicks each point in order, forever, until stopped.
pub struct ClickLoop {
    points: Arc<[Point]>,
    interval: Duration,
    clicker: Arc<dyn ClickSink>,
    state: Arc<watch::Sender<LoopState>>,
    task: Mutex<Option<JoinHandle<Result<LoopReport>>>>,
}

impl ClickLoop {
    pub fn new(
        coordinates: &CoordinateStore,
        interval: Duration,
        clicker: Arc<dyn ClickSink>,
    ) -> Self {
        let (state, _) = watch::channel(LoopState::Idle);

        Self {
            points: coordinates.points().into(),
            interval,
            clicker,
            state: Arc::new(state),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// Spawn the replay task. Must be called from within a Tokio runtime.
    ///
    /// Only the first call from `Idle` does anything; returns whether the
    /// loop was started.
    pub fn start(&self) -> bool {
        let started = self.state.send_if_modified(|state| {
            if *state == LoopState::Idle {
                *state = LoopState::Running;
                true
            } else {
                false
            }
        });

        if !started {
            match self.state() {
                LoopState::Stopped => warn!("Click loop was stopped and cannot be restarted"),
                _ => warn!("Click loop is already running"),
            }
            return false;
        }

        let handle = tokio::spawn(replay(
            Arc::clone(&self.points),
            self.interval,
            Arc::clone(&self.clicker),
            Arc::clone(&self.state),
        ));
        *self.lock_task() = Some(handle);

        info!(
            points = self.points.len(),
            interval = ?self.interval,
            "Click loop started"
        );
        true
    }

    /// Running -> Paused.
    pub fn pause(&self) -> bool {
        let paused = self.transition(LoopState::Running, LoopState::Paused);
        if paused {
            info!("Click loop paused");
        }
        paused
    }

    /// Paused -> Running.
    pub fn resume(&self) -> bool {
        let resumed = self.transition(LoopState::Paused, LoopState::Running);
        if resumed {
            info!("Click loop resumed");
        }
        resumed
    }

    /// Move to `Stopped` from any state. Calling it again has no effect.
    ///
    /// The replay task notices at its next check point, including while it
    /// is sleeping between clicks.
    pub fn stop(&self) -> bool {
        let stopped = self.state.send_if_modified(|state| {
            if *state == LoopState::Stopped {
                false
            } else {
                *state = LoopState::Stopped;
                true
            }
        });
        if stopped {
            info!("Click loop stopped");
        }
        stopped
    }

    /// Resolves once the loop reaches `Stopped`, whoever stopped it.
    pub async fn stopped(&self) {
        let mut state = self.state.subscribe();
        wait_until_stopped(&mut state).await;
    }

    /// Wait for the replay task to finish and collect its report.
    ///
    /// A loop that was never started reports zero clicks. Errors from a
    /// failed click are returned here.
    pub async fn wait(&self) -> Result<LoopReport> {
        let handle = self.lock_task().take();
        match handle {
            Some(handle) => handle
                .await
                .map_err(|e| ClickerError::Task(e.to_string()))?,
            None => Ok(LoopReport::default()),
        }
    }

    fn transition(&self, from: LoopState, to: LoopState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<Result<LoopReport>>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ClickLoop {
    fn drop(&mut self) {
        self.state.send_replace(LoopState::Stopped);
    }
}

async fn replay(
    points: Arc<[Point]>,
    interval: Duration,
    clicker: Arc<dyn ClickSink>,
    state: Arc<watch::Sender<LoopState>>,
) -> Result<LoopReport> {
    let mut rx = state.subscribe();
    let mut report = LoopReport::default();
    let mut index = 0;
    let delay = interval.saturating_add(clicker.pause_after_click());

    while wait_until_runnable(&mut rx).await {
        let Some(&point) = points.get(index) else {
            // Nothing to click; stay Running until told to stop.
            wait_until_stopped(&mut rx).await;
            break;
        };

        // Injection blocks on the display server; keep it off the async workers.
        let sink = Arc::clone(&clicker);
        let clicked = tokio::task::spawn_blocking(move || sink.click(point))
            .await
            .map_err(|e| ClickerError::Task(e.to_string()))
            .and_then(|result| result);

        if let Err(e) = clicked {
            error!(error = %e, "Click failed, stopping loop");
            state.send_replace(LoopState::Stopped);
            return Err(e);
        }

        report.clicks += 1;
        debug!(
            "Clicked point {}/{}: {} - click #{}",
            index + 1,
            points.len(),
            point,
            report.clicks
        );

        index += 1;
        if index == points.len() {
            index = 0;
            report.cycles += 1;
        }

        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = wait_until_stopped(&mut rx) => {}
            }
        }
    }

    debug!(clicks = report.clicks, cycles = report.cycles, "Replay task exiting");
    Ok(report)
}

/// Waits while paused. Returns `false` once the loop is stopped.
async fn wait_until_runnable(rx: &mut watch::Receiver<LoopState>) -> bool {
    match rx
        .wait_for(|state| matches!(state, LoopState::Running | LoopState::Stopped))
        .await
    {
        Ok(state) => *state == LoopState::Running,
        Err(_) => false,
    }
}

async fn wait_until_stopped(rx: &mut watch::Receiver<LoopState>) {
    let _ = rx.wait_for(|state| *state == LoopState::Stopped).await;
}
