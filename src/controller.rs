//! Drive a [`ClickLoop`] from hotkey presses.

use crate::click_loop::{ClickLoop, LoopState};
use crate::global_hotkey::HotkeyAction;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Why [`HotkeyController::listen`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenOutcome {
    /// The stop hotkey was pressed.
    Stopped,
    /// The cancel hotkey was pressed.
    Cancelled,
    /// The loop stopped on its own, e.g. after a failed click.
    LoopEnded,
    /// The hotkey listener went away.
    Disconnected,
}

pub struct HotkeyController {
    click_loop: Arc<ClickLoop>,
}

impl HotkeyController {
    pub fn new(click_loop: Arc<ClickLoop>) -> Self {
        Self { click_loop }
    }

    /// Apply one hotkey to the loop. Returns `Some` when listening should end.
    pub fn handle(&self, action: HotkeyAction) -> Option<ListenOutcome> {
        debug!(%action, state = ?self.click_loop.state(), "Handling hotkey");

        match action {
            HotkeyAction::StartResume => {
                match self.click_loop.state() {
                    LoopState::Paused => {
                        self.click_loop.resume();
                    }
                    _ => {
                        self.click_loop.start();
                    }
                }
                None
            }
            HotkeyAction::Pause => {
                self.click_loop.pause();
                None
            }
            HotkeyAction::Stop => {
                self.click_loop.stop();
                Some(ListenOutcome::Stopped)
            }
            HotkeyAction::Cancel => {
                self.click_loop.stop();
                info!("Session cancelled");
                Some(ListenOutcome::Cancelled)
            }
        }
    }

    /// Handle hotkeys until the session ends.
    ///
    /// The loop is always stopped by the time this returns.
    pub async fn listen(
        &self,
        mut actions: mpsc::UnboundedReceiver<HotkeyAction>,
    ) -> ListenOutcome {
        loop {
            tokio::select! {
                action = actions.recv() => match action {
                    Some(action) => {
                        if let Some(outcome) = self.handle(action) {
                            return outcome;
                        }
                    }
                    None => {
                        warn!("Hotkey listener disconnected");
                        self.click_loop.stop();
                        return ListenOutcome::Disconnected;
                    }
                },
                _ = self.click_loop.stopped() => return ListenOutcome::LoopEnded,
            }
        }
    }
}
