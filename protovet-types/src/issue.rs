use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verification status carried by every fact-bearing manifest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Not yet reviewed.
    Pending,
    /// A correction was made.
    Fixed,
    /// Minor observation.
    Info,
    /// Potential issue, should review.
    Warning,
    /// Definite problem, must fix.
    Critical,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Fixed => "fixed",
            VerificationStatus::Info => "info",
            VerificationStatus::Warning => "warning",
            VerificationStatus::Critical => "critical",
        }
    }

    /// Statuses worth surfacing in the issue listing.
    pub fn is_noteworthy(self) -> bool {
        !matches!(self, VerificationStatus::Pending)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "fixed" => Ok(VerificationStatus::Fixed),
            "info" => Ok(VerificationStatus::Info),
            "warning" => Ok(VerificationStatus::Warning),
            "critical" => Ok(VerificationStatus::Critical),
            other => Err(format!("unknown verification status '{other}'")),
        }
    }
}

/// One noteworthy verification entry extracted from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Human-readable location, e.g. `tools > callTool` or `type: Resource`.
    pub location: String,
    pub status: VerificationStatus,
    pub notes: String,
    /// Module id the entry belongs to (`types`, `enums`, ... for the
    /// sections outside `modules`).
    pub module_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for s in ["pending", "fixed", "info", "warning", "critical"] {
            let parsed: VerificationStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), s);
        }
        assert!("bogus".parse::<VerificationStatus>().is_err());
    }

    #[test]
    fn pending_is_not_noteworthy() {
        assert!(!VerificationStatus::Pending.is_noteworthy());
        assert!(VerificationStatus::Critical.is_noteworthy());
        assert!(VerificationStatus::Fixed.is_noteworthy());
    }
}
