//! Shared filter state for the incident views.
//!
//! One [`FilterSync`] per tab owns the current [`FilterState`]. Every
//! change is persisted to a [`SnapshotStore`] and announced to same-tab
//! listeners; changes persisted by other tabs arrive through a
//! [`CrossTabChannel`] and replace the in-memory value. Concurrent writers
//! in different tabs resolve as last write wins.

pub mod channel;
pub mod components;
pub mod context;
pub mod error;
pub mod store;

use std::cell::RefCell;
use std::rc::Rc;

pub use contracts::shared::filters::{FilterPatch, FilterState};

pub use channel::{CrossTabChannel, ListenerId, LocalBus, WatchGuard};
pub use context::{use_filters, FilterContext, FilterProvider};
pub use error::SyncError;
pub use store::{BrowserStore, MemoryOrigin, MemoryTab, SnapshotStore};

pub struct FilterSync {
    key: String,
    current: RefCell<FilterState>,
    store: Option<Box<dyn SnapshotStore>>,
    bus: LocalBus,
}

impl FilterSync {
    /// Restores the snapshot stored under `key`, or starts empty.
    pub fn with_store(key: impl Into<String>, store: impl SnapshotStore + 'static) -> Self {
        Self::open(key.into(), Some(Box::new(store)))
    }

    /// No persistence: changes live as long as this tab.
    pub fn in_memory(key: impl Into<String>) -> Self {
        Self::open(key.into(), None)
    }

    fn open(key: String, store: Option<Box<dyn SnapshotStore>>) -> Self {
        let initial = match store.as_deref() {
            Some(store) => match read_snapshot(store, &key) {
                Ok(Some(state)) => {
                    log::debug!("Restored filters from '{}': {:?}", key, state);
                    state
                }
                Ok(None) => FilterState::empty(),
                Err(e) => {
                    log::warn!("Ignoring persisted filters: {}", e);
                    FilterState::empty()
                }
            },
            None => {
                log::debug!("Filters for '{}' are kept in memory only", key);
                FilterState::empty()
            }
        };

        Self {
            key,
            current: RefCell::new(initial),
            store,
            bus: LocalBus::new(),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    pub fn get_current(&self) -> FilterState {
        self.current.borrow().clone()
    }

    pub fn active_count(&self) -> usize {
        self.current.borrow().active_count()
    }

    /// A patch carrying no field leaves everything untouched: nothing is
    /// persisted and no listener runs.
    pub fn update(&self, patch: FilterPatch) {
        if patch.is_noop() {
            return;
        }
        let next = {
            let mut current = self.current.borrow_mut();
            current.merge(patch);
            current.clone()
        };
        self.commit(next);
    }

    pub fn reset(&self) {
        let next = FilterState::empty();
        *self.current.borrow_mut() = next.clone();
        self.commit(next);
    }

    pub fn subscribe(&self, listener: impl Fn(&FilterState) + 'static) -> ListenerId {
        self.bus.subscribe(Rc::new(listener))
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.bus.len()
    }

    /// Handles one storage change made by another tab.
    ///
    /// `key == None` is a cleared storage area, `new_value == None` a
    /// removed key; both bring this tab back to empty filters.
    pub fn apply_external(&self, key: Option<&str>, new_value: Option<&str>) {
        if key.is_some_and(|k| k != self.key) {
            return;
        }

        let next = match new_value {
            Some(raw) => match serde_json::from_str::<FilterState>(raw) {
                Ok(state) => state,
                Err(e) => {
                    log::warn!(
                        "Dropping cross-tab change of '{}': {}",
                        self.key,
                        SyncError::MalformedCrossTabPayload(e)
                    );
                    return;
                }
            },
            None => FilterState::empty(),
        };

        if *self.current.borrow() == next {
            return;
        }
        log::debug!("Filters changed in another tab: {:?}", next);
        *self.current.borrow_mut() = next.clone();
        self.bus.emit(&next);
    }

    /// Routes cross-tab changes from `channel` into this instance until the
    /// returned guard is dropped.
    pub fn watch_cross_tab(
        self: &Rc<Self>,
        channel: &dyn CrossTabChannel,
    ) -> Result<WatchGuard, SyncError> {
        let this = Rc::downgrade(self);
        channel.watch(Rc::new(
            move |key: Option<String>, new_value: Option<String>| {
                if let Some(sync) = this.upgrade() {
                    sync.apply_external(key.as_deref(), new_value.as_deref());
                }
            },
        ))
    }

    fn commit(&self, next: FilterState) {
        if let Err(e) = self.persist(&next) {
            log::warn!("Filters not persisted, keeping them for this tab: {}", e);
        }
        self.bus.emit(&next);
    }

    fn persist(&self, state: &FilterState) -> Result<(), SyncError> {
        let Some(store) = self.store.as_deref() else {
            return Ok(());
        };
        let raw = serde_json::to_string(state).map_err(SyncError::Serialize)?;
        store.write(&self.key, &raw)
    }
}

fn read_snapshot(store: &dyn SnapshotStore, key: &str) -> Result<Option<FilterState>, SyncError> {
    let Some(raw) = store.read(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(SyncError::MalformedSnapshot)
}
