//! Change notification for the filter synchronizer.
//!
//! Two directions are covered here:
//! - same tab: [`LocalBus`], an in-process publish/subscribe list, optionally
//!   mirrored onto `window` as a `CustomEvent` by [`dispatch_window_event`];
//! - other tabs: [`CrossTabChannel`], fed in the browser by the `storage`
//!   event ([`StorageEventChannel`]), which never fires in the writer's tab.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use contracts::shared::filters::FilterState;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::error::{js_reason, SyncError};

/// Same-tab listener.
pub type Listener = Rc<dyn Fn(&FilterState)>;

/// Receives `(key, new_value)` for every storage change made by another tab.
/// `key == None` means the whole storage area was cleared.
pub type CrossTabCallback = Rc<dyn Fn(Option<String>, Option<String>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub struct LocalBus {
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_id: Cell<u64>,
    dispatching: Cell<bool>,
    pending: RefCell<VecDeque<FilterState>>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Returns `false` when the listener was already gone.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every listener registered when the round starts.
    ///
    /// An emit from inside a listener is queued until the running round
    /// stops; the running round stops as soon as a newer state is queued,
    /// so no listener receives a superseded value. No borrow is held while
    /// listeners run.
    pub fn emit(&self, state: &FilterState) {
        self.pending.borrow_mut().push_back(state.clone());
        if self.dispatching.replace(true) {
            return;
        }

        loop {
            let Some(state) = self.pending.borrow_mut().pop_front() else {
                break;
            };
            let snapshot: Vec<Listener> = self
                .listeners
                .borrow()
                .iter()
                .map(|(_, listener)| Rc::clone(listener))
                .collect();
            for listener in snapshot {
                if !self.pending.borrow().is_empty() {
                    break;
                }
                listener(&state);
            }
        }

        self.dispatching.set(false);
    }
}

/// Detaches a cross-tab subscription when dropped.
pub struct WatchGuard {
    detach: Option<Box<dyn FnOnce()>>,
}

impl WatchGuard {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    pub fn detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.detach.is_some()
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.detach();
    }
}

pub trait CrossTabChannel {
    fn watch(&self, callback: CrossTabCallback) -> Result<WatchGuard, SyncError>;
}

const STORAGE_EVENT: &str = "storage";

/// Browser channel over `window`'s `storage` event.
pub struct StorageEventChannel {
    window: web_sys::Window,
}

impl StorageEventChannel {
    pub fn open() -> Result<Self, SyncError> {
        let window = web_sys::window().ok_or_else(|| SyncError::Event {
            event: STORAGE_EVENT.to_string(),
            reason: "no window".to_string(),
        })?;
        Ok(Self { window })
    }
}

impl CrossTabChannel for StorageEventChannel {
    fn watch(&self, callback: CrossTabCallback) -> Result<WatchGuard, SyncError> {
        let closure = Closure::<dyn FnMut(web_sys::StorageEvent)>::new(
            move |event: web_sys::StorageEvent| {
                callback(event.key(), event.new_value());
            },
        );

        self.window
            .add_event_listener_with_callback(STORAGE_EVENT, closure.as_ref().unchecked_ref())
            .map_err(|e| SyncError::Event {
                event: STORAGE_EVENT.to_string(),
                reason: js_reason(&e),
            })?;
        log::debug!("Listening for cross-tab '{}' events", STORAGE_EVENT);

        let window = self.window.clone();
        Ok(WatchGuard::new(move || {
            let _ = window
                .remove_event_listener_with_callback(STORAGE_EVENT, closure.as_ref().unchecked_ref());
            log::debug!("Stopped listening for cross-tab '{}' events", STORAGE_EVENT);
        }))
    }
}

/// Fires `event_name` on `window` with the serialized state as `detail`.
pub fn dispatch_window_event(event_name: &str, state: &FilterState) -> Result<(), SyncError> {
    let event_error = |reason: String| SyncError::Event {
        event: event_name.to_string(),
        reason,
    };

    let window = web_sys::window().ok_or_else(|| event_error("no window".to_string()))?;
    let raw = serde_json::to_string(state).map_err(SyncError::Serialize)?;
    let detail = js_sys::JSON::parse(&raw).map_err(|e| event_error(js_reason(&e)))?;

    let init = web_sys::CustomEventInit::new();
    init.set_detail(&detail);
    let event = web_sys::CustomEvent::new_with_event_init_dict(event_name, &init)
        .map_err(|e| event_error(js_reason(&e)))?;

    window
        .dispatch_event(&event)
        .map_err(|e| event_error(js_reason(&e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<FilterState>>>, Listener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let listener: Listener = Rc::new(move |state: &FilterState| {
            sink.borrow_mut().push(state.clone());
        });
        (seen, listener)
    }

    #[test]
    fn test_emit_reaches_every_listener() {
        let bus = LocalBus::new();
        let (first, a) = recorder();
        let (second, b) = recorder();
        bus.subscribe(a);
        bus.subscribe(b);

        let state = FilterState {
            sector: "5".into(),
            ..FilterState::default()
        };
        bus.emit(&state);

        assert_eq!(first.borrow().as_slice(), &[state.clone()]);
        assert_eq!(second.borrow().as_slice(), &[state]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = LocalBus::new();
        let (seen, listener) = recorder();
        let id = bus.subscribe(listener);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(bus.is_empty());

        bus.emit(&FilterState::default());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_listener_added_during_emit_waits_for_next_round() {
        let bus = Rc::new(LocalBus::new());
        let (late_seen, late) = recorder();
        let late = RefCell::new(Some(late));

        let bus_handle = Rc::clone(&bus);
        bus.subscribe(Rc::new(move |_: &FilterState| {
            if let Some(listener) = late.borrow_mut().take() {
                bus_handle.subscribe(listener);
            }
        }));

        bus.emit(&FilterState::default());
        assert!(late_seen.borrow().is_empty());
        assert_eq!(bus.len(), 2);

        bus.emit(&FilterState::default());
        assert_eq!(late_seen.borrow().len(), 1);
    }

    #[test]
    fn test_nested_emit_supersedes_running_round() {
        let bus = Rc::new(LocalBus::new());
        let first_state = FilterState {
            sector: "all".into(),
            ..FilterState::default()
        };
        let second_state = FilterState::default();

        let bus_handle = Rc::clone(&bus);
        let nested = second_state.clone();
        bus.subscribe(Rc::new(move |state: &FilterState| {
            if state.sector == "all" {
                bus_handle.emit(&nested);
            }
        }));
        let (seen, tail) = recorder();
        bus.subscribe(tail);

        bus.emit(&first_state);

        assert_eq!(seen.borrow().as_slice(), &[second_state]);
    }

    #[test]
    fn test_watch_guard_detaches_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut guard = WatchGuard::new(move || counter.set(counter.get() + 1));

        assert!(guard.is_attached());
        guard.detach();
        guard.detach();
        assert!(!guard.is_attached());
        drop(guard);
        assert_eq!(calls.get(), 1);
    }
}
