use std::rc::Rc;

use leptos::prelude::*;
use leptos::reactive::owner::LocalStorage;

use super::channel::{dispatch_window_event, StorageEventChannel};
use super::store::BrowserStore;
use super::{FilterPatch, FilterState, FilterSync};
use crate::shared::config::load_config;

/// Filter context shared by every filterable view.
#[derive(Clone, Copy)]
pub struct FilterContext {
    sync: StoredValue<Rc<FilterSync>, LocalStorage>,
    state: RwSignal<FilterState>,
}

impl FilterContext {
    fn sync(&self) -> Rc<FilterSync> {
        self.sync.get_value()
    }

    /// Reactive view of the current filters.
    pub fn state(&self) -> ReadSignal<FilterState> {
        self.state.read_only()
    }

    /// Current filters, read without tracking.
    pub fn current(&self) -> FilterState {
        self.sync().get_current()
    }

    pub fn update(&self, patch: FilterPatch) {
        self.sync().update(patch);
    }

    pub fn reset(&self) {
        self.sync().reset();
    }

    /// Reactive count of active filters.
    pub fn active_count(&self) -> usize {
        self.state.with(|st| st.active_count())
    }
}

fn open_browser_sync(key: &str) -> FilterSync {
    match BrowserStore::open() {
        Ok(store) => FilterSync::with_store(key, store),
        Err(e) => {
            log::warn!("{}; filters stay in memory for this tab", e);
            FilterSync::in_memory(key)
        }
    }
}

/// Provides the shared filters to children components.
#[component]
pub fn FilterProvider(children: Children) -> impl IntoView {
    let config = load_config().filters;
    let sync = Rc::new(open_browser_sync(&config.storage_key));
    let state = RwSignal::new(sync.get_current());

    // Same-tab consumers: the signal, plus a window event for plain scripts
    let event_name = config.local_event.clone();
    let broadcast = config.broadcast_window_event;
    let listener_id = sync.subscribe(move |next: &FilterState| {
        state.set(next.clone());
        if broadcast {
            if let Err(e) = dispatch_window_event(&event_name, next) {
                log::warn!("{}", e);
            }
        }
    });

    let guard = match StorageEventChannel::open().and_then(|channel| sync.watch_cross_tab(&channel))
    {
        Ok(guard) => Some(guard),
        Err(e) => {
            log::warn!("Cross-tab filter sync disabled: {}", e);
            None
        }
    };

    let sync = StoredValue::new_local(sync);
    let guard = StoredValue::new_local(guard);

    on_cleanup(move || {
        sync.try_with_value(|sync| sync.unsubscribe(listener_id));
        guard.try_update_value(|guard| {
            guard.take();
        });
        log::debug!("FilterProvider detached");
    });

    provide_context(FilterContext { sync, state });

    children()
}

/// Hook to use the shared filters.
pub fn use_filters() -> FilterContext {
    use_context::<FilterContext>()
        .expect("FilterContext not found. Wrap your app with FilterProvider.")
}
