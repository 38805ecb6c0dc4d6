use serde::{Deserialize, Serialize};

/// Lifecycle labels of a reported incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Open,
    InProgress,
    Resolved,
    Rejected,
}

impl IncidentStatus {
    /// Label stored in filters and sent to the API
    pub fn code(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "OPEN",
            IncidentStatus::InProgress => "IN_PROGRESS",
            IncidentStatus::Resolved => "RESOLVED",
            IncidentStatus::Rejected => "REJECTED",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "Ouvert",
            IncidentStatus::InProgress => "En cours",
            IncidentStatus::Resolved => "Résolu",
            IncidentStatus::Rejected => "Rejeté",
        }
    }

    pub fn all() -> Vec<IncidentStatus> {
        vec![
            IncidentStatus::Open,
            IncidentStatus::InProgress,
            IncidentStatus::Resolved,
            IncidentStatus::Rejected,
        ]
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "OPEN" => Some(IncidentStatus::Open),
            "IN_PROGRESS" => Some(IncidentStatus::InProgress),
            "RESOLVED" => Some(IncidentStatus::Resolved),
            "REJECTED" => Some(IncidentStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        for status in IncidentStatus::all() {
            assert_eq!(IncidentStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(IncidentStatus::from_code("open"), None);
    }

    #[test]
    fn test_serde_uses_codes() {
        let raw = serde_json::to_string(&IncidentStatus::InProgress).unwrap();
        assert_eq!(raw, r#""IN_PROGRESS""#);
    }
}
