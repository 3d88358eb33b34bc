//! Global mouse and keyboard event capture.
//!
//! [`EventSource`] is the seam between the OS and its two consumers, the
//! recorder and the hotkey listener. The
//! production source, [`RdevEventSource`], runs a single process-wide
//! `rdev::listen` thread and fans its events out to every live
//! [`Subscription`]. `rdev` has no way to stop a listener, so the thread is
//! started on first use and shared by later subscriptions.

use crate::coordinates::Point;
use crate::error::{ClickerError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use enigo::{Enigo, Mouse, Settings};
use rdev::{Event, EventType, Key};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const SUBSCRIBER_BUFFER: usize = 1024;

/// Mouse buttons reported by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Unknown,
}

impl From<rdev::Button> for MouseButton {
    fn from(button: rdev::Button) -> Self {
        match button {
            rdev::Button::Left => MouseButton::Left,
            rdev::Button::Right => MouseButton::Right,
            rdev::Button::Middle => MouseButton::Middle,
            _ => MouseButton::Unknown,
        }
    }
}

/// An input event delivered to subscribers.
///
/// Key names are normalized, see [`normalize_key_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    ButtonPress { button: MouseButton, position: Point },
    ButtonRelease { button: MouseButton, position: Point },
    KeyPress { key: String },
    KeyRelease { key: String },
}

/// A source of global input events.
pub trait EventSource {
    /// Start receiving events. Events that happened before this call are
    /// not delivered.
    fn subscribe(&self) -> Result<Subscription>;
}

/// Handle to a live event stream.
///
/// Dropping the handle detaches it from its source, as does
/// [`unsubscribe`](Self::unsubscribe).
pub struct Subscription {
    events: Receiver<InputEvent>,
    detach: Option<Box<dyn FnOnce() + Send>>,
    failure: Option<Arc<OnceLock<String>>>,
}

impl Subscription {
    /// Wrap a receiver. `detach` runs once, when the subscription ends.
    pub fn new(events: Receiver<InputEvent>, detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            events,
            detach: Some(Box::new(detach)),
            failure: None,
        }
    }

    fn with_failure(mut self, failure: Arc<OnceLock<String>>) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Block until the next event arrives.
    ///
    /// Fails once the source has shut down.
    pub fn recv(&self) -> Result<InputEvent> {
        self.events.recv().map_err(|_| self.closed())
    }

    /// Wait up to `timeout` for the next event. `Ok(None)` means the wait
    /// timed out.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<InputEvent>> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(self.closed()),
        }
    }

    /// Stop receiving events.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    fn closed(&self) -> ClickerError {
        let reason = self
            .failure
            .as_ref()
            .and_then(|failure| failure.get().cloned())
            .unwrap_or_else(|| "event stream closed".to_string());
        ClickerError::event_source(reason)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Global event source backed by `rdev`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RdevEventSource;

impl RdevEventSource {
    pub fn new() -> Self {
        Self
    }
}

impl EventSource for RdevEventSource {
    fn subscribe(&self) -> Result<Subscription> {
        ListenerHub::global().subscribe()
    }
}

struct HubState {
    senders: Vec<(u64, Sender<InputEvent>)>,
    /// Set once the listener thread has exited. No new subscribers after that.
    closed: bool,
}

struct ListenerHub {
    state: Mutex<HubState>,
    next_id: AtomicU64,
    failure: Arc<OnceLock<String>>,
}

impl ListenerHub {
    fn new() -> Arc<Self> {
        Arc::new(ListenerHub {
            state: Mutex::new(HubState {
                senders: Vec::new(),
                closed: false,
            }),
            next_id: AtomicU64::new(0),
            failure: Arc::new(OnceLock::new()),
        })
    }

    fn global() -> &'static Arc<ListenerHub> {
        static HUB: OnceLock<Arc<ListenerHub>> = OnceLock::new();

        HUB.get_or_init(|| {
            let hub = ListenerHub::new();
            let listener_hub = Arc::clone(&hub);
            thread::spawn(move || listener_hub.run());
            hub
        })
    }

    fn lock_state(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe(self: &Arc<Self>) -> Result<Subscription> {
        let (tx, rx) = bounded(SUBSCRIBER_BUFFER);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut state = self.lock_state();
            if state.closed {
                return Err(self.closed_error());
            }
            state.senders.push((id, tx));
        }
        debug!(id, "Input subscription attached");

        let hub = Arc::clone(self);
        let subscription = Subscription::new(rx, move || {
            hub.lock_state()
                .senders
                .retain(|(subscriber, _)| *subscriber != id);
            debug!(id, "Input subscription detached");
        });

        Ok(subscription.with_failure(Arc::clone(&self.failure)))
    }

    fn closed_error(&self) -> ClickerError {
        let reason = self
            .failure
            .get()
            .cloned()
            .unwrap_or_else(|| "input listener stopped".to_string());
        ClickerError::event_source(reason)
    }

    fn run(self: Arc<Self>) {
        info!("Input listener thread started (rdev)");

        let mut tracker = PointerTracker::new(current_pointer_location());
        let hub = Arc::clone(&self);

        let callback = move |event: Event| {
            if let Some(input_event) = tracker.translate(event.event_type) {
                hub.dispatch(input_event);
            }
        };

        let failure = match rdev::listen(callback) {
            Ok(()) => None,
            Err(e) => {
                error!(error = ?e, "Input listener failed");
                Some(format!("{e:?}"))
            }
        };

        self.close(failure);
        info!("Input listener thread exiting");
    }

    /// Record why the listener ended and disconnect every subscriber.
    ///
    /// Both happen under the state lock, so a concurrent `subscribe` either
    /// sees the hub closed or has its sender dropped here.
    fn close(&self, failure: Option<String>) {
        let mut state = self.lock_state();
        if let Some(reason) = failure {
            let _ = self.failure.set(reason);
        }
        state.closed = true;
        state.senders.clear();
    }

    fn dispatch(&self, event: InputEvent) {
        self.lock_state()
            .senders
            .retain(|(id, tx)| match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(id, "Input subscriber is not keeping up, dropping event");
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            });
    }
}

/// Turns raw `rdev` events into [`InputEvent`]s.
///
/// `rdev` reports button events without a position, so the pointer is
/// tracked from move events. Button events are dropped while the position
/// is still unknown.
struct PointerTracker {
    position: Option<Point>,
}

impl PointerTracker {
    fn new(position: Option<Point>) -> Self {
        Self { position }
    }

    fn translate(&mut self, event: EventType) -> Option<InputEvent> {
        match event {
            EventType::MouseMove { x, y } => {
                self.position = Some(Point::new(x.round() as i32, y.round() as i32));
                None
            }
            EventType::ButtonPress(button) => Some(InputEvent::ButtonPress {
                button: button.into(),
                position: self.known_position()?,
            }),
            EventType::ButtonRelease(button) => Some(InputEvent::ButtonRelease {
                button: button.into(),
                position: self.known_position()?,
            }),
            EventType::KeyPress(key) => Some(InputEvent::KeyPress { key: key_name(key) }),
            EventType::KeyRelease(key) => Some(InputEvent::KeyRelease { key: key_name(key) }),
            EventType::Wheel { .. } => None,
        }
    }

    fn known_position(&self) -> Option<Point> {
        if self.position.is_none() {
            warn!("Pointer position not known yet, dropping button event");
        }
        self.position
    }
}

/// Where the pointer is right now, read through `enigo`.
fn current_pointer_location() -> Option<Point> {
    let enigo = match Enigo::new(&Settings::default()) {
        Ok(enigo) => enigo,
        Err(e) => {
            warn!(error = %e, "Cannot read initial pointer position");
            return None;
        }
    };

    match enigo.location() {
        Ok((x, y)) => Some(Point::new(x, y)),
        Err(e) => {
            warn!(error = %e, "Cannot read initial pointer position");
            None
        }
    }
}

const KEY_NAMES: &[(Key, &str)] = &[
    (Key::Escape, "escape"),
    (Key::Return, "enter"),
    (Key::Space, "space"),
    (Key::Tab, "tab"),
    (Key::Backspace, "backspace"),
    (Key::Delete, "delete"),
    (Key::Insert, "insert"),
    (Key::Home, "home"),
    (Key::End, "end"),
    (Key::PageUp, "pageup"),
    (Key::PageDown, "pagedown"),
    (Key::UpArrow, "up"),
    (Key::DownArrow, "down"),
    (Key::LeftArrow, "left"),
    (Key::RightArrow, "right"),
    (Key::Pause, "pause"),
    (Key::F1, "f1"),
    (Key::F2, "f2"),
    (Key::F3, "f3"),
    (Key::F4, "f4"),
    (Key::F5, "f5"),
    (Key::F6, "f6"),
    (Key::F7, "f7"),
    (Key::F8, "f8"),
    (Key::F9, "f9"),
    (Key::F10, "f10"),
    (Key::F11, "f11"),
    (Key::F12, "f12"),
    (Key::Num0, "0"),
    (Key::Num1, "1"),
    (Key::Num2, "2"),
    (Key::Num3, "3"),
    (Key::Num4, "4"),
    (Key::Num5, "5"),
    (Key::Num6, "6"),
    (Key::Num7, "7"),
    (Key::Num8, "8"),
    (Key::Num9, "9"),
    (Key::KeyA, "a"),
    (Key::KeyB, "b"),
    (Key::KeyC, "c"),
    (Key::KeyD, "d"),
    (Key::KeyE, "e"),
    (Key::KeyF, "f"),
    (Key::KeyG, "g"),
    (Key::KeyH, "h"),
    (Key::KeyI, "i"),
    (Key::KeyJ, "j"),
    (Key::KeyK, "k"),
    (Key::KeyL, "l"),
    (Key::KeyM, "m"),
    (Key::KeyN, "n"),
    (Key::KeyO, "o"),
    (Key::KeyP, "p"),
    (Key::KeyQ, "q"),
    (Key::KeyR, "r"),
    (Key::KeyS, "s"),
    (Key::KeyT, "t"),
    (Key::KeyU, "u"),
    (Key::KeyV, "v"),
    (Key::KeyW, "w"),
    (Key::KeyX, "x"),
    (Key::KeyY, "y"),
    (Key::KeyZ, "z"),
];

fn key_name(key: Key) -> String {
    KEY_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| format!("{key:?}").to_lowercase())
}

/// Canonical spelling of a key name: lowercase, with the usual aliases
/// folded (`esc` is `escape`, `return` is `enter`).
pub fn normalize_key_name(key: &str) -> String {
    let key = key.trim().to_lowercase();
    match key.as_str() {
        "esc" => "escape".to_string(),
        "return" => "enter".to_string(),
        "arrowup" => "up".to_string(),
        "arrowdown" => "down".to_string(),
        "arrowleft" => "left".to_string(),
        "arrowright" => "right".to_string(),
        _ => key,
    }
}

/// Whether `key` names a key the event source can report.
pub fn is_known_key(key: &str) -> bool {
    let key = normalize_key_name(key);
    KEY_NAMES.iter().any(|(_, name)| *name == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_normalize_key_name() {
        assert_eq!(normalize_key_name("ESC"), "escape");
        assert_eq!(normalize_key_name(" Return "), "enter");
        assert_eq!(normalize_key_name("F1"), "f1");
    }

    #[test]
    fn test_known_keys() {
        assert!(is_known_key("esc"));
        assert!(is_known_key("F12"));
        assert!(is_known_key("q"));
        assert!(!is_known_key("hyper"));
        assert!(!is_known_key(""));
    }

    #[test]
    fn test_key_name_matches_normalized_form() {
        assert_eq!(key_name(Key::Escape), normalize_key_name("esc"));
        assert_eq!(key_name(Key::Return), normalize_key_name("return"));
        assert_eq!(key_name(Key::KeyA), "a");
    }

    #[test]
    fn test_subscription_detaches_once() {
        let detached = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&detached);
        let (_tx, rx) = bounded(1);

        let subscription = Subscription::new(rx, move || {
            assert!(!flag.swap(true, Ordering::SeqCst), "detached twice");
        });
        subscription.unsubscribe();

        assert!(detached.load(Ordering::SeqCst));
    }

    #[test]
    fn test_subscription_reports_closed_stream() {
        let (tx, rx) = bounded(1);
        let subscription = Subscription::new(rx, || {});
        drop(tx);

        assert!(matches!(
            subscription.recv(),
            Err(ClickerError::EventSource(_))
        ));
    }

    #[test]
    fn test_subscription_timeout() {
        let (tx, rx) = bounded(1);
        let subscription = Subscription::new(rx, || {});

        assert_eq!(
            subscription.recv_timeout(Duration::from_millis(5)).unwrap(),
            None
        );

        tx.send(InputEvent::KeyPress { key: "f1".into() }).unwrap();
        assert_eq!(
            subscription.recv_timeout(Duration::from_millis(5)).unwrap(),
            Some(InputEvent::KeyPress { key: "f1".into() })
        );
    }

    fn key(name: &str) -> InputEvent {
        InputEvent::KeyPress { key: name.into() }
    }

    fn recv_now(subscription: &Subscription) -> Option<InputEvent> {
        subscription.recv_timeout(Duration::from_millis(5)).unwrap()
    }

    #[test]
    fn test_hub_fans_out_to_every_subscriber() {
        let hub = ListenerHub::new();
        let first = hub.subscribe().unwrap();
        let second = hub.subscribe().unwrap();

        hub.dispatch(key("f1"));

        assert_eq!(recv_now(&first), Some(key("f1")));
        assert_eq!(recv_now(&second), Some(key("f1")));
    }

    #[test]
    fn test_hub_detaches_unsubscribed() {
        let hub = ListenerHub::new();
        let first = hub.subscribe().unwrap();
        let second = hub.subscribe().unwrap();

        first.unsubscribe();
        assert_eq!(hub.lock_state().senders.len(), 1);

        hub.dispatch(key("f2"));
        assert_eq!(recv_now(&second), Some(key("f2")));

        drop(second);
        assert!(hub.lock_state().senders.is_empty());
    }

    #[test]
    fn test_hub_keeps_slow_subscriber() {
        let hub = ListenerHub::new();
        let subscription = hub.subscribe().unwrap();

        for _ in 0..SUBSCRIBER_BUFFER + 10 {
            hub.dispatch(key("a"));
        }

        assert_eq!(hub.lock_state().senders.len(), 1);
        let mut received = 0;
        while recv_now(&subscription).is_some() {
            received += 1;
        }
        assert_eq!(received, SUBSCRIBER_BUFFER);
    }

    #[test]
    fn test_hub_prunes_disconnected_receivers() {
        let hub = ListenerHub::new();
        let (tx, rx) = bounded(1);
        hub.lock_state().senders.push((99, tx));
        drop(rx);

        hub.dispatch(key("a"));
        assert!(hub.lock_state().senders.is_empty());
    }

    #[test]
    fn test_hub_failure_reaches_subscribers() {
        let hub = ListenerHub::new();
        let subscription = hub.subscribe().unwrap();

        hub.close(Some("accessibility permission denied".to_string()));

        assert!(matches!(
            subscription.recv(),
            Err(ClickerError::EventSource(reason)) if reason.contains("permission denied")
        ));
        assert!(matches!(
            hub.subscribe(),
            Err(ClickerError::EventSource(reason)) if reason.contains("permission denied")
        ));
    }

    #[test]
    fn test_hub_rejects_subscribers_after_clean_exit() {
        let hub = ListenerHub::new();
        hub.close(None);

        assert!(matches!(
            hub.subscribe(),
            Err(ClickerError::EventSource(_))
        ));
        assert!(hub.lock_state().senders.is_empty());
    }

    #[test]
    fn test_tracker_uses_seeded_position() {
        let mut tracker = PointerTracker::new(Some(Point::new(640, 480)));

        assert_eq!(
            tracker.translate(EventType::ButtonPress(rdev::Button::Left)),
            Some(InputEvent::ButtonPress {
                button: MouseButton::Left,
                position: Point::new(640, 480),
            })
        );
    }

    #[test]
    fn test_tracker_drops_buttons_until_position_known() {
        let mut tracker = PointerTracker::new(None);

        assert_eq!(
            tracker.translate(EventType::ButtonPress(rdev::Button::Left)),
            None
        );
        assert_eq!(
            tracker.translate(EventType::MouseMove { x: 10.4, y: 19.6 }),
            None
        );
        assert_eq!(
            tracker.translate(EventType::ButtonRelease(rdev::Button::Right)),
            Some(InputEvent::ButtonRelease {
                button: MouseButton::Right,
                position: Point::new(10, 20),
            })
        );
    }

    #[test]
    fn test_tracker_names_keys_and_skips_wheel() {
        let mut tracker = PointerTracker::new(None);

        assert_eq!(
            tracker.translate(EventType::KeyPress(Key::Escape)),
            Some(key("escape"))
        );
        assert_eq!(
            tracker.translate(EventType::Wheel {
                delta_x: 0,
                delta_y: 1
            }),
            None
        );
    }
}
