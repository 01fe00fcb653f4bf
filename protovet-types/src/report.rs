use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Result lines for one check, classified by outcome.
///
/// The engine fills these with plain text; color and glyphs are applied at
/// the presentation boundary only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCheck {
    /// Items confirmed present (counted as found).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub found: Vec<String>,

    /// Items absent or mismatched (counted as gaps).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,

    /// Classification warnings; never affect the exit code.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Informational lines (accepted generic handling, skips).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<String>,
}

impl CategoryCheck {
    pub fn ok(&mut self, msg: impl Into<String>) {
        self.found.push(msg.into());
    }

    pub fn gap(&mut self, msg: impl Into<String>) {
        self.missing.push(msg.into());
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn note(&mut self, msg: impl Into<String>) {
        self.info.push(msg.into());
    }

    pub fn found_count(&self) -> usize {
        self.found.len()
    }

    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }
}

/// One value per fact category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCategory<T> {
    pub types: T,
    pub methods: T,
    pub notifications: T,
    pub enums: T,
    pub error_codes: T,
    pub capabilities: T,
}

impl<T> PerCategory<T> {
    /// Stable display order for summaries.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &T)> {
        [
            ("Types", &self.types),
            ("Methods", &self.methods),
            ("Notifications", &self.notifications),
            ("Enums", &self.enums),
            ("Error codes", &self.error_codes),
            ("Capabilities", &self.capabilities),
        ]
        .into_iter()
    }
}

/// Deprecated-in-spec inventory entry, shown for awareness only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecatedInfo {
    pub name: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default)]
    pub notes: String,
}

/// Full structured result of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub protocol_version: String,

    /// Number of symbols in the implementation index.
    pub indexed_symbols: usize,

    /// Implementation file path validation.
    pub files: CategoryCheck,

    /// Spec -> Manifest: facts absent from the manifest.
    pub spec_manifest: PerCategory<CategoryCheck>,

    /// Manifest -> Implementation: declared names resolved against sources.
    pub manifest_impl: PerCategory<CategoryCheck>,

    pub not_implemented_files: BTreeSet<String>,
    pub not_implemented_types: BTreeSet<String>,
    pub builtin_count: usize,

    pub deprecated: Vec<DeprecatedInfo>,
}

impl VerifyOutcome {
    pub fn spec_manifest_gaps(&self) -> usize {
        self.spec_manifest.iter().map(|(_, c)| c.missing_count()).sum()
    }

    pub fn manifest_impl_missing(&self) -> usize {
        self.manifest_impl.iter().map(|(_, c)| c.missing_count()).sum()
    }

    pub fn warning_count(&self) -> usize {
        let per_cat: usize = self
            .spec_manifest
            .iter()
            .chain(self.manifest_impl.iter())
            .map(|(_, c)| c.warnings.len())
            .sum();
        per_cat + self.files.warnings.len()
    }

    pub fn file_errors(&self) -> usize {
        self.files.missing_count()
    }

    /// Aggregate gap count across all categories; drives the exit code.
    pub fn gap_total(&self) -> usize {
        self.file_errors() + self.spec_manifest_gaps() + self.manifest_impl_missing()
    }

    pub fn passed(&self) -> bool {
        self.gap_total() == 0
    }

    pub fn summary(&self) -> SummaryCounts {
        SummaryCounts {
            file_errors: self.file_errors(),
            spec_manifest_gaps: self.spec_manifest_gaps(),
            manifest_impl_missing: self.manifest_impl_missing(),
            warnings: self.warning_count(),
            gap_total: self.gap_total(),
            passed: self.passed(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub file_errors: usize,
    pub spec_manifest_gaps: usize,
    pub manifest_impl_missing: usize,
    pub warnings: usize,
    pub gap_total: usize,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// The persisted JSON report artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    /// Schema identifier, e.g. "protovet.report.v1".
    pub schema: String,

    pub tool: ToolInfo,

    #[serde(default)]
    pub run: RunInfo,

    pub summary: SummaryCounts,

    pub outcome: VerifyOutcome,
}
