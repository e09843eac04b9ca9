use serde::{Deserialize, Serialize};

/// Scanning product a host record was observed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceSystem {
    /// Qualys vulnerability management
    Qualys,
    /// Crowdstrike Falcon
    Crowdstrike,
    /// Any other source, by display name
    Other(String),
}

impl SourceSystem {
    /// Display name used in output documents and upsert keys
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Qualys => "Qualys",
            Self::Crowdstrike => "Crowdstrike",
            Self::Other(name) => name,
        }
    }

    /// Returns true for an unnamed source (`Other("")`)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl Default for SourceSystem {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl std::fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SourceSystem {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("qualys") {
            Self::Qualys
        } else if s.eq_ignore_ascii_case("crowdstrike") {
            Self::Crowdstrike
        } else {
            Self::Other(s)
        }
    }
}

impl From<&str> for SourceSystem {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<SourceSystem> for String {
    fn from(source: SourceSystem) -> Self {
        match source {
            SourceSystem::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// Origin of one raw observation: the `(source_system, source_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Scanning product
    pub source_system: SourceSystem,
    /// Identifier within that product
    pub source_id: String,
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source_system, self.source_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sources_parse_case_insensitively() {
        assert_eq!(SourceSystem::from("qualys"), SourceSystem::Qualys);
        assert_eq!(SourceSystem::from("CrowdStrike"), SourceSystem::Crowdstrike);
        assert_eq!(
            SourceSystem::from("Tenable"),
            SourceSystem::Other("Tenable".into())
        );
    }

    #[test]
    fn serializes_as_display_name() {
        let json = serde_json::to_string(&SourceSystem::Crowdstrike).unwrap();
        assert_eq!(json, "\"Crowdstrike\"");
        let parsed: SourceSystem = serde_json::from_str("\"Qualys\"").unwrap();
        assert_eq!(parsed, SourceSystem::Qualys);
    }

    #[test]
    fn default_source_is_empty() {
        assert!(SourceSystem::default().is_empty());
        assert!(!SourceSystem::Qualys.is_empty());
    }
}
