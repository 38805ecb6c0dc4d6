use crate::shared::filter_sync::components::{FilterBar, FilterSummary};
use crate::shared::filter_sync::FilterProvider;
use leptos::prelude::*;

#[component]
pub fn App() -> impl IntoView {
    view! {
        <FilterProvider>
            <header class="page__header">
                <FilterBar />
            </header>
            <main class="page__content">
                <FilterSummary />
            </main>
        </FilterProvider>
    }
}
