//! The coverage manifest: an ordered, comment-preserving TOML document.
//!
//! The manifest is the single shared mutable resource of a run. It is read
//! fully into memory, mutated in place (additively, by the synchronizer, or
//! by the verification reset), and written back as a whole document via an
//! atomic temp-file-and-rename. Nodes that are not touched round-trip
//! byte-identically, comments and key order included; that property is what
//! makes the manifest reviewable under version control.

mod entries;
mod error;
mod issues;
mod mutate;
mod reset;

pub use entries::{
    CapabilityEntry, CapabilitySide, DeprecatedEntry, EnumEntry, ErrorCodeEntry, MethodEntry,
    ModuleEntry, NotificationEntry, TypeEntry, Verification,
};
pub use error::ManifestError;
pub use issues::{NotImplemented, extract_issues, not_implemented};
pub use mutate::{
    NewErrorCode, NewMethod, NewNotification, NewType, append_capability_nested, append_enum_case,
    fill_missing_field,
};
pub use reset::{ResetItem, reset_verification};

use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::fmt;
use toml_edit::DocumentMut;
use tracing::debug;

/// Fallback protocol version when the manifest does not pin one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-11-25";

/// An in-memory manifest document bound to its file path.
#[derive(Debug, Clone)]
pub struct ManifestDoc {
    path: Utf8PathBuf,
    doc: DocumentMut,
}

impl ManifestDoc {
    /// Load the manifest from disk. A missing or unparsable file is fatal;
    /// the error names the attempted path.
    pub fn load(path: &Utf8Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = fs::read_to_string(path)?;
        let doc = contents
            .parse::<DocumentMut>()
            .map_err(|e| ManifestError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Build a manifest from a string, for embedding and tests.
    pub fn from_str_at(path: &Utf8Path, contents: &str) -> Result<Self, ManifestError> {
        let doc = contents
            .parse::<DocumentMut>()
            .map_err(|e| ManifestError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn doc(&self) -> &DocumentMut {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut DocumentMut {
        &mut self.doc
    }

    pub fn target_protocol_version(&self) -> &str {
        self.doc
            .get("target_protocol_version")
            .and_then(|i| i.as_str())
            .unwrap_or(DEFAULT_PROTOCOL_VERSION)
    }

    /// Write the whole document back, atomically: serialize to a sibling
    /// temp file, then rename over the original. A reader that starts
    /// after the rename never observes a partial write.
    pub fn save(&self) -> Result<(), ManifestError> {
        let tmp = Utf8PathBuf::from(format!("{}.tmp", self.path));
        fs::write(&tmp, self.doc.to_string())?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path, "manifest written");
        Ok(())
    }
}

impl fmt::Display for ManifestDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.doc.fmt(f)
    }
}
