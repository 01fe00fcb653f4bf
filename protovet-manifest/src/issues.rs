//! Issue extraction and not-yet-implemented inventory, both read-only.

use crate::ManifestDoc;
use crate::entries::CapabilitySide;
use protovet_types::issue::{Issue, VerificationStatus};
use std::collections::BTreeSet;

/// Collect every noteworthy verification entry (anything not pending).
pub fn extract_issues(manifest: &ManifestDoc) -> Vec<Issue> {
    let mut out = Vec::new();

    for module in manifest.modules() {
        let id = module.id();
        push_issue(&mut out, &module.verification(), format!("module: {id}"), id);

        for method in module.methods() {
            push_issue(
                &mut out,
                &method.verification(),
                format!("{id} > {}", method.display_name()),
                id,
            );
        }
        for notification in module.notifications() {
            push_issue(
                &mut out,
                &notification.verification(),
                format!("{id} > {}", notification.display_name()),
                id,
            );
        }
    }

    for entry in manifest.types() {
        push_issue(
            &mut out,
            &entry.verification(),
            format!("type: {}", entry.name),
            "types",
        );
    }

    for entry in manifest.enums() {
        push_issue(
            &mut out,
            &entry.verification(),
            format!("enum: {}", entry.name()),
            "enums",
        );
    }

    for entry in manifest.error_codes() {
        push_issue(
            &mut out,
            &entry.verification(),
            format!("error_code: {}", entry.name()),
            "error_codes",
        );
    }

    for side in [CapabilitySide::Client, CapabilitySide::Server] {
        for entry in manifest.capabilities(side) {
            push_issue(
                &mut out,
                &entry.verification(),
                format!("capability: {}.{}", side.key(), entry.property()),
                "capabilities",
            );
        }
    }

    out
}

fn push_issue(
    out: &mut Vec<Issue>,
    verification: &crate::entries::Verification,
    location: String,
    module_id: &str,
) {
    let Some(raw) = &verification.status else {
        return;
    };
    let Ok(status) = raw.parse::<VerificationStatus>() else {
        return;
    };
    if !status.is_noteworthy() {
        return;
    }
    out.push(Issue {
        location,
        status,
        notes: verification.notes.trim().to_string(),
        module_id: module_id.to_string(),
    });
}

/// Entries explicitly excluded from gap counting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotImplemented {
    /// Module implementation files planned for the future.
    pub files: BTreeSet<String>,
    /// Implementation type names planned for the future.
    pub types: BTreeSet<String>,
    /// Builtin-kind type names, skipped rather than resolved.
    pub builtins: BTreeSet<String>,
}

/// Gather todo-flagged and builtin entries from every section that
/// supports them.
pub fn not_implemented(manifest: &ManifestDoc) -> NotImplemented {
    let mut out = NotImplemented::default();

    for module in manifest.modules() {
        if module.is_todo() {
            if let Some(file) = module.impl_file() {
                out.files.insert(file.to_string());
            }
        }
        for method in module.methods() {
            if method.is_todo() {
                if let Some(name) = method.impl_name() {
                    out.types.insert(name.to_string());
                }
            }
        }
        for notification in module.notifications() {
            if notification.is_todo() {
                if let Some(name) = notification.impl_name() {
                    out.types.insert(name.to_string());
                }
            }
        }
    }

    for entry in manifest.types() {
        if entry.is_todo() {
            out.types.extend(entry.impl_names());
        }
        if entry.is_builtin() {
            out.builtins
                .extend(entry.impl_names().into_iter().map(|n| n.trim().to_string()));
        }
    }

    out
}
