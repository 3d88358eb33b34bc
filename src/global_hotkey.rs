//! Session hotkeys.
//!
//! Key presses come from the same [`EventSource`] the recorder uses. `rdev`
//! pumps its own OS event loop on every platform, so presses arrive no
//! matter which thread owns the Tokio runtime.

use crate::config::HotkeyBindings;
use crate::error::{ClickerError, Result};
use crate::input::{is_known_key, normalize_key_name, EventSource, InputEvent};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What a bound hotkey asks the click loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    /// Start the loop, or resume it when paused.
    StartResume,
    Pause,
    /// Stop clicking and leave the session.
    Stop,
    /// Abort the session.
    Cancel,
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HotkeyAction::StartResume => "start/resume clicking",
            HotkeyAction::Pause => "pause clicking",
            HotkeyAction::Stop => "stop clicking and return to menu",
            HotkeyAction::Cancel => "cancel and return to menu",
        };
        f.write_str(label)
    }
}

/// Maps key presses to [`HotkeyAction`]s and forwards them to the session.
#[derive(Debug, Clone, Default)]
pub struct HotkeyManager {
    actions: HashMap<String, HotkeyAction>,
}

impl HotkeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &str, action: HotkeyAction) -> Result<()> {
        let name = parse_hotkey(key)?;

        if let Some(existing) = self.actions.get(&name) {
            return Err(ClickerError::hotkey(format!(
                "'{key}' is already bound to {existing}"
            )));
        }
        self.actions.insert(name, action);

        info!(key, %action, "Hotkey registered");
        Ok(())
    }

    pub fn register_bindings(&mut self, bindings: &HotkeyBindings) -> Result<()> {
        for (key, action) in bindings.iter() {
            self.register(key, action)?;
        }
        Ok(())
    }

    /// Action bound to a key name as reported by the event source.
    pub fn action_for(&self, key: &str) -> Option<HotkeyAction> {
        self.actions.get(&normalize_key_name(key)).copied()
    }

    /// Start forwarding hotkey presses from `source` on a blocking task.
    ///
    /// Only presses after this call are seen. The task ends once the
    /// returned receiver is dropped; if the source fails the receiver is
    /// closed. Must be called from within a Tokio runtime.
    pub fn start_listener<S: EventSource>(
        &self,
        source: &S,
    ) -> Result<mpsc::UnboundedReceiver<HotkeyAction>> {
        let subscription = source.subscribe()?;
        let hotkeys = self.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::task::spawn_blocking(move || {
            while !tx.is_closed() {
                let key = match subscription.recv_timeout(POLL_INTERVAL) {
                    Ok(Some(InputEvent::KeyPress { key })) => key,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(error = %e, "Hotkey listener lost its event source");
                        break;
                    }
                };

                match hotkeys.action_for(&key) {
                    Some(action) => {
                        debug!(%action, "Hotkey pressed");
                        if tx.send(action).is_err() {
                            break;
                        }
                    }
                    None => debug!(key, "Ignoring unbound key"),
                }
            }
            debug!("Hotkey listener exiting");
        });

        Ok(rx)
    }
}

/// Parse a single-key hotkey such as `f1` or `esc` into its normalized name.
///
/// Modifier combinations are rejected: every binding is one plain key.
pub fn parse_hotkey(key: &str) -> Result<String> {
    if key.contains('+') {
        return Err(ClickerError::invalid_key(
            key,
            "modifier combinations are not supported",
        ));
    }
    if !is_known_key(key) {
        return Err(ClickerError::invalid_key(key, "unsupported hotkey"));
    }
    Ok(normalize_key_name(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Subscription;
    use crossbeam_channel::{unbounded, Receiver, Sender};
    use std::sync::Mutex;

    struct KeySource {
        events: Mutex<Option<Receiver<InputEvent>>>,
    }

    fn key_source() -> (KeySource, Sender<InputEvent>) {
        let (tx, rx) = unbounded();
        let source = KeySource {
            events: Mutex::new(Some(rx)),
        };
        (source, tx)
    }

    impl EventSource for KeySource {
        fn subscribe(&self) -> Result<Subscription> {
            let rx = self
                .events
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| ClickerError::event_source("already subscribed"))?;
            Ok(Subscription::new(rx, || {}))
        }
    }

    fn key(name: &str) -> InputEvent {
        InputEvent::KeyPress { key: name.into() }
    }

    #[test]
    fn test_parse_hotkey_aliases() {
        assert_eq!(parse_hotkey("ESC").unwrap(), "escape");
        assert_eq!(parse_hotkey("F3").unwrap(), "f3");
        assert_eq!(parse_hotkey("q").unwrap(), "q");
    }

    #[test]
    fn test_parse_hotkey_rejects_combinations() {
        assert!(matches!(
            parse_hotkey("ctrl+f1"),
            Err(ClickerError::InvalidKey { .. })
        ));
        assert!(parse_hotkey("hyper").is_err());
        assert!(parse_hotkey("f13").is_err());
    }

    #[test]
    fn test_register_bindings() {
        let mut hotkeys = HotkeyManager::new();
        hotkeys.register_bindings(&HotkeyBindings::default()).unwrap();

        assert_eq!(hotkeys.action_for("f1"), Some(HotkeyAction::StartResume));
        assert_eq!(hotkeys.action_for("F2"), Some(HotkeyAction::Pause));
        assert_eq!(hotkeys.action_for("f3"), Some(HotkeyAction::Stop));
        assert_eq!(hotkeys.action_for("escape"), Some(HotkeyAction::Cancel));
        assert_eq!(hotkeys.action_for("a"), None);

        assert!(hotkeys.register("Esc", HotkeyAction::Stop).is_err());
    }

    #[tokio::test]
    async fn test_listener_forwards_bound_key_presses() {
        let mut hotkeys = HotkeyManager::new();
        hotkeys.register_bindings(&HotkeyBindings::default()).unwrap();
        let (source, tx) = key_source();

        let mut actions = hotkeys.start_listener(&source).unwrap();
        tx.send(key("a")).unwrap();
        tx.send(InputEvent::KeyRelease { key: "f1".into() }).unwrap();
        tx.send(key("f1")).unwrap();
        tx.send(key("f2")).unwrap();
        tx.send(key("escape")).unwrap();

        assert_eq!(actions.recv().await, Some(HotkeyAction::StartResume));
        assert_eq!(actions.recv().await, Some(HotkeyAction::Pause));
        assert_eq!(actions.recv().await, Some(HotkeyAction::Cancel));

        drop(tx);
        assert_eq!(actions.recv().await, None);
    }
}
