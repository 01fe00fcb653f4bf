use serde::{Deserialize, Serialize};

/// Fact category a sync change belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCategory {
    Types,
    Methods,
    Notifications,
    Enums,
    ErrorCodes,
    Capabilities,
    Deprecated,
}

impl SyncCategory {
    pub fn label(self) -> &'static str {
        match self {
            SyncCategory::Types => "Types",
            SyncCategory::Methods => "Methods",
            SyncCategory::Notifications => "Notifications",
            SyncCategory::Enums => "Enums",
            SyncCategory::ErrorCodes => "Error codes",
            SyncCategory::Capabilities => "Capabilities",
            SyncCategory::Deprecated => "Deprecated",
        }
    }

    /// Stable display order for sync output.
    pub const ALL: [SyncCategory; 7] = [
        SyncCategory::Types,
        SyncCategory::Methods,
        SyncCategory::Notifications,
        SyncCategory::Enums,
        SyncCategory::ErrorCodes,
        SyncCategory::Capabilities,
        SyncCategory::Deprecated,
    ];
}

/// One additive manifest change (an entry, a field, a case, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncChange {
    pub category: SyncCategory,
    pub detail: String,
}

/// Warnings raised while deriving names during sync (ambiguous candidates).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWarning {
    pub category: SyncCategory,
    pub detail: String,
}

/// Result of one synchronizer run over the whole manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub changes: Vec<SyncChange>,
    pub warnings: Vec<SyncWarning>,

    /// Unified diff of the manifest, before vs after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl SyncOutcome {
    pub fn total(&self) -> usize {
        self.changes.len()
    }

    pub fn count_for(&self, category: SyncCategory) -> usize {
        self.changes.iter().filter(|c| c.category == category).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_for_filters_by_category() {
        let outcome = SyncOutcome {
            changes: vec![
                SyncChange {
                    category: SyncCategory::Types,
                    detail: "Foo".to_string(),
                },
                SyncChange {
                    category: SyncCategory::Enums,
                    detail: "Role".to_string(),
                },
                SyncChange {
                    category: SyncCategory::Types,
                    detail: "Bar".to_string(),
                },
            ],
            warnings: vec![],
            diff: None,
        };
        assert_eq!(outcome.total(), 3);
        assert_eq!(outcome.count_for(SyncCategory::Types), 2);
        assert_eq!(outcome.count_for(SyncCategory::Deprecated), 0);
    }
}
