use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::channel::{CrossTabCallback, CrossTabChannel, WatchGuard};
use super::error::{js_reason, SyncError};

/// Key-value storage holding the persisted snapshot.
pub trait SnapshotStore {
    fn read(&self, key: &str) -> Result<Option<String>, SyncError>;
    fn write(&self, key: &str, value: &str) -> Result<(), SyncError>;
}

/// `window.localStorage`
pub struct BrowserStore {
    storage: web_sys::Storage,
}

impl BrowserStore {
    pub fn open() -> Result<Self, SyncError> {
        let window = web_sys::window()
            .ok_or_else(|| SyncError::StorageUnavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| SyncError::StorageUnavailable(js_reason(&e)))?
            .ok_or_else(|| SyncError::StorageUnavailable("localStorage is disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl SnapshotStore for BrowserStore {
    fn read(&self, key: &str) -> Result<Option<String>, SyncError> {
        self.storage
            .get_item(key)
            .map_err(|e| SyncError::StorageAccess {
                key: key.to_string(),
                reason: js_reason(&e),
            })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SyncError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| SyncError::StorageAccess {
                key: key.to_string(),
                reason: js_reason(&e),
            })
    }
}

struct Watcher {
    id: u64,
    tab: u64,
    callback: CrossTabCallback,
}

struct OriginInner {
    items: HashMap<String, String>,
    watchers: Vec<Watcher>,
    writable: bool,
    next_tab: u64,
    next_watcher: u64,
}

/// In-process model of one browser origin's storage, shared by any number
/// of tabs. Mirrors the browser rule that a change is announced to every
/// tab except the one that made it.
#[derive(Clone)]
pub struct MemoryOrigin {
    inner: Rc<RefCell<OriginInner>>,
}

impl Default for MemoryOrigin {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryOrigin {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(OriginInner {
                items: HashMap::new(),
                watchers: Vec::new(),
                writable: true,
                next_tab: 0,
                next_watcher: 0,
            })),
        }
    }

    pub fn open_tab(&self) -> MemoryTab {
        let mut inner = self.inner.borrow_mut();
        let tab = inner.next_tab;
        inner.next_tab += 1;
        MemoryTab {
            origin: self.clone(),
            tab,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().items.get(key).cloned()
    }

    /// Simulates quota errors and the like: writes fail while `false`.
    pub fn set_writable(&self, writable: bool) {
        self.inner.borrow_mut().writable = writable;
    }

    /// A write from a tab outside this process. Every watcher is notified.
    pub fn external_write(&self, key: &str, raw: &str) {
        self.inner
            .borrow_mut()
            .items
            .insert(key.to_string(), raw.to_string());
        self.announce(None, Some(key.to_string()), Some(raw.to_string()));
    }

    pub fn external_remove(&self, key: &str) {
        self.inner.borrow_mut().items.remove(key);
        self.announce(None, Some(key.to_string()), None);
    }

    pub fn external_clear(&self) {
        self.inner.borrow_mut().items.clear();
        self.announce(None, None, None);
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.borrow().watchers.len()
    }

    fn announce(&self, writer: Option<u64>, key: Option<String>, new_value: Option<String>) {
        let callbacks: Vec<CrossTabCallback> = self
            .inner
            .borrow()
            .watchers
            .iter()
            .filter(|w| Some(w.tab) != writer)
            .map(|w| Rc::clone(&w.callback))
            .collect();
        for callback in callbacks {
            callback(key.clone(), new_value.clone());
        }
    }
}

/// One tab's view of a [`MemoryOrigin`].
#[derive(Clone)]
pub struct MemoryTab {
    origin: MemoryOrigin,
    tab: u64,
}

impl SnapshotStore for MemoryTab {
    fn read(&self, key: &str) -> Result<Option<String>, SyncError> {
        Ok(self.origin.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SyncError> {
        {
            let mut inner = self.origin.inner.borrow_mut();
            if !inner.writable {
                return Err(SyncError::StorageAccess {
                    key: key.to_string(),
                    reason: "storage is read-only".to_string(),
                });
            }
            inner.items.insert(key.to_string(), value.to_string());
        }
        self.origin
            .announce(Some(self.tab), Some(key.to_string()), Some(value.to_string()));
        Ok(())
    }
}

impl CrossTabChannel for MemoryTab {
    fn watch(&self, callback: CrossTabCallback) -> Result<WatchGuard, SyncError> {
        let id = {
            let mut inner = self.origin.inner.borrow_mut();
            let id = inner.next_watcher;
            inner.next_watcher += 1;
            inner.watchers.push(Watcher {
                id,
                tab: self.tab,
                callback,
            });
            id
        };

        let origin = Rc::downgrade(&self.origin.inner);
        Ok(WatchGuard::new(move || {
            if let Some(inner) = origin.upgrade() {
                inner.borrow_mut().watchers.retain(|w| w.id != id);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_write_is_visible_to_every_tab() {
        let origin = MemoryOrigin::new();
        let a = origin.open_tab();
        let b = origin.open_tab();

        a.write("k", "v1").unwrap();
        assert_eq!(b.read("k").unwrap().as_deref(), Some("v1"));
        assert_eq!(b.read("missing").unwrap(), None);
    }

    #[test]
    fn test_writer_tab_is_not_notified() {
        let origin = MemoryOrigin::new();
        let a = origin.open_tab();
        let b = origin.open_tab();

        let a_calls = Rc::new(Cell::new(0));
        let b_calls = Rc::new(Cell::new(0));
        let a_counter = Rc::clone(&a_calls);
        let b_counter = Rc::clone(&b_calls);
        let _ga = a
            .watch(Rc::new(move |_: Option<String>, _: Option<String>| a_counter.set(a_counter.get() + 1)))
            .unwrap();
        let _gb = b
            .watch(Rc::new(move |_: Option<String>, _: Option<String>| b_counter.set(b_counter.get() + 1)))
            .unwrap();

        a.write("k", "v").unwrap();
        assert_eq!(a_calls.get(), 0);
        assert_eq!(b_calls.get(), 1);

        origin.external_write("k", "w");
        assert_eq!(a_calls.get(), 1);
        assert_eq!(b_calls.get(), 2);
    }

    #[test]
    fn test_dropping_guard_removes_watcher() {
        let origin = MemoryOrigin::new();
        let tab = origin.open_tab();
        let guard = tab.watch(Rc::new(|_: Option<String>, _: Option<String>| {})).unwrap();
        assert_eq!(origin.watcher_count(), 1);
        drop(guard);
        assert_eq!(origin.watcher_count(), 0);
    }

    #[test]
    fn test_read_only_origin_rejects_writes() {
        let origin = MemoryOrigin::new();
        let tab = origin.open_tab();
        origin.set_writable(false);

        let err = tab.write("k", "v").unwrap_err();
        assert!(matches!(err, SyncError::StorageAccess { .. }));
        assert_eq!(origin.get("k"), None);
    }
}
