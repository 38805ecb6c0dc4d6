use serde::{Deserialize, Deserializer, Serialize};

/// Filter selections shared by every filterable incident view.
///
/// An empty string means "no constraint" for that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sector: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub province: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
}

impl FilterState {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Shallow overwrite of every field the patch carries.
    pub fn merge(&mut self, patch: FilterPatch) {
        if let Some(sector) = patch.sector {
            self.sector = sector;
        }
        if let Some(province) = patch.province {
            self.province = province;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    /// Number of dimensions that constrain the result set (0..=3).
    pub fn active_count(&self) -> usize {
        [&self.sector, &self.province, &self.status]
            .iter()
            .filter(|v| !v.is_empty())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }
}

/// Partial update of a [`FilterState`]. `None` leaves the field untouched,
/// `Some("")` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl FilterPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_province(mut self, province: impl Into<String>) -> Self {
        self.province = Some(province.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn is_noop(&self) -> bool {
        self.sector.is_none() && self.province.is_none() && self.status.is_none()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overwrites_only_present_fields() {
        let mut state = FilterState {
            sector: "5".into(),
            province: "Rabat".into(),
            status: String::new(),
        };
        state.merge(FilterPatch::new().with_status("OPEN"));
        assert_eq!(state.sector, "5");
        assert_eq!(state.province, "Rabat");
        assert_eq!(state.status, "OPEN");

        state.merge(FilterPatch::new().with_province(""));
        assert_eq!(state.province, "");
        assert_eq!(state.active_count(), 2);
    }

    #[test]
    fn test_active_count_bounds() {
        assert_eq!(FilterState::empty().active_count(), 0);
        assert!(FilterState::empty().is_empty());
        let mut full = FilterState::empty();
        full.merge(
            FilterPatch::new()
                .with_sector("1")
                .with_province("Casablanca")
                .with_status("RESOLVED"),
        );
        assert_eq!(full.active_count(), 3);
    }

    #[test]
    fn test_deserialize_tolerates_missing_null_and_unknown_keys() {
        let state: FilterState =
            serde_json::from_str(r#"{"sector":null,"province":"Rabat","extra":42}"#).unwrap();
        assert_eq!(
            state,
            FilterState {
                sector: String::new(),
                province: "Rabat".into(),
                status: String::new(),
            }
        );
    }

    #[test]
    fn test_patch_ignores_unknown_keys() {
        let patch: FilterPatch = serde_json::from_str(r#"{"status":"OPEN","colour":"red"}"#).unwrap();
        assert_eq!(patch, FilterPatch::new().with_status("OPEN"));
        assert!(!patch.is_noop());
        assert!(FilterPatch::new().is_noop());
    }
}
