use contracts::enums::{IncidentStatus, Province};
use leptos::prelude::*;
use thaw::{Badge, BadgeAppearance, BadgeColor, Button, ButtonAppearance, Flex, FlexGap, Input, Select};

use super::context::use_filters;
use super::{FilterPatch, FilterState};

/// Human readable parts of the active filters, in display order.
pub fn describe(state: &FilterState) -> Vec<String> {
    let mut parts = Vec::new();
    if !state.sector.is_empty() {
        parts.push(format!("Secteur {}", state.sector));
    }
    if !state.province.is_empty() {
        parts.push(format!("Province {}", state.province));
    }
    if !state.status.is_empty() {
        let label = IncidentStatus::from_code(&state.status)
            .map(|s| s.display_name().to_string())
            .unwrap_or_else(|| state.status.clone());
        parts.push(format!("Statut {}", label));
    }
    parts
}

/// Sector, province and status controls bound to the shared filters.
#[component]
pub fn FilterBar() -> impl IntoView {
    let filters = use_filters();
    let initial = filters.current();
    let sector = RwSignal::new(initial.sector);
    let province = RwSignal::new(initial.province);
    let status = RwSignal::new(initial.status);

    // Changes from other consumers or other tabs flow into the controls
    Effect::new(move |_| {
        let st = filters.state().get();
        if sector.get_untracked() != st.sector {
            sector.set(st.sector.clone());
        }
        if province.get_untracked() != st.province {
            province.set(st.province.clone());
        }
        if status.get_untracked() != st.status {
            status.set(st.status.clone());
        }
    });

    Effect::new(move |_| {
        let value = sector.get();
        if value != filters.current().sector {
            filters.update(FilterPatch::new().with_sector(value));
        }
    });
    Effect::new(move |_| {
        let value = province.get();
        if value != filters.current().province {
            filters.update(FilterPatch::new().with_province(value));
        }
    });
    Effect::new(move |_| {
        let value = status.get();
        if value != filters.current().status {
            filters.update(FilterPatch::new().with_status(value));
        }
    });

    view! {
        <div class="filter-bar">
            <Flex gap=FlexGap::Small>
                <Input value=sector placeholder="Secteur" />
                <Select value=province>
                    <option value="">"Toutes les provinces"</option>
                    {Province::all()
                        .iter()
                        .map(|name| view! { <option value=*name>{*name}</option> })
                        .collect_view()}
                </Select>
                <Select value=status>
                    <option value="">"Tous les statuts"</option>
                    {IncidentStatus::all()
                        .into_iter()
                        .map(|s| view! { <option value=s.code()>{s.display_name()}</option> })
                        .collect_view()}
                </Select>
                <Badge appearance=BadgeAppearance::Tint color=BadgeColor::Informative>
                    {move || filters.active_count()}
                </Badge>
                <Button
                    appearance=ButtonAppearance::Secondary
                    on_click=move |_| filters.reset()
                    disabled=move || filters.active_count() == 0
                >
                    "Réinitialiser"
                </Button>
            </Flex>
        </div>
    }
}

/// Read-only line describing the active filters.
#[component]
pub fn FilterSummary() -> impl IntoView {
    let filters = use_filters();

    view! {
        <div class="filter-summary">
            {move || {
                let st = filters.state().get();
                if st.is_empty() {
                    "Aucun filtre actif".to_string()
                } else {
                    describe(&st).join(" · ")
                }
            }}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_empty() {
        assert!(describe(&FilterState::empty()).is_empty());
    }

    #[test]
    fn test_describe_uses_status_names() {
        let state = FilterState {
            sector: "5".into(),
            province: String::new(),
            status: "OPEN".into(),
        };
        assert_eq!(describe(&state), vec!["Secteur 5", "Statut Ouvert"]);
    }

    #[test]
    fn test_describe_keeps_unknown_status_label() {
        let state = FilterState {
            status: "ARCHIVED".into(),
            ..FilterState::default()
        };
        assert_eq!(describe(&state), vec!["Statut ARCHIVED"]);
    }
}
