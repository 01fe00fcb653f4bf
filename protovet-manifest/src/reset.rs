//! Reset every verification block to `{ status = "pending", notes = "" }`.
//!
//! Only the verification blocks are touched; structural fields and
//! formatting stay exactly as loaded.

use crate::ManifestDoc;
use crate::entries::CapabilitySide;
use toml_edit::{Item, TableLike, Value, value};

/// One verification block that was (or would be) reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetItem {
    pub location: String,
    /// Status before the reset, when it was not already `pending`.
    pub previous_status: Option<String>,
    /// True when non-empty notes were cleared.
    pub cleared_notes: bool,
}

/// Reset all verification blocks in the document. With `dry_run` the
/// document is left untouched and the returned list describes what a real
/// run would change.
pub fn reset_verification(manifest: &mut ManifestDoc, dry_run: bool) -> Vec<ResetItem> {
    let mut out = Vec::new();

    // Types.
    let type_names: Vec<String> = manifest.types().iter().map(|t| t.name.to_string()).collect();
    for name in &type_names {
        if let Some(entry) = manifest
            .doc_mut()
            .get_mut("types")
            .and_then(Item::as_table_like_mut)
            .and_then(|t| t.get_mut(name))
            .and_then(Item::as_table_like_mut)
        {
            reset_block(entry, format!("type: {name}"), dry_run, &mut out);
        }
    }

    // Modules, their methods and notifications.
    let module_count = manifest.modules().len();
    for idx in 0..module_count {
        let Some(modules) = manifest
            .doc_mut()
            .get_mut("modules")
            .and_then(Item::as_array_of_tables_mut)
        else {
            break;
        };
        let Some(module) = modules.get_mut(idx) else {
            continue;
        };
        let module_id = module
            .get("id")
            .and_then(Item::as_str)
            .unwrap_or("unknown")
            .to_string();

        reset_block(module, format!("module: {module_id}"), dry_run, &mut out);

        for key in ["methods", "notifications"] {
            let Some(module) = manifest
                .doc_mut()
                .get_mut("modules")
                .and_then(Item::as_array_of_tables_mut)
                .and_then(|m| m.get_mut(idx))
            else {
                continue;
            };
            let Some(entries) = module.get_mut(key).and_then(Item::as_array_of_tables_mut) else {
                continue;
            };
            for entry in entries.iter_mut() {
                let name = entry
                    .get("impl")
                    .and_then(Item::as_str)
                    .or_else(|| entry.get("name").and_then(Item::as_str))
                    .unwrap_or("unknown")
                    .to_string();
                reset_block(entry, format!("{module_id} > {name}"), dry_run, &mut out);
            }
        }
    }

    // Flat entry lists.
    for (section, label) in [("enums", "enum"), ("error_codes", "error_code")] {
        if let Some(entries) = manifest
            .doc_mut()
            .get_mut(section)
            .and_then(Item::as_array_of_tables_mut)
        {
            for entry in entries.iter_mut() {
                let name = entry
                    .get("name")
                    .and_then(Item::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                reset_block(entry, format!("{label}: {name}"), dry_run, &mut out);
            }
        }
    }

    for side in [CapabilitySide::Client, CapabilitySide::Server] {
        if let Some(entries) = manifest
            .doc_mut()
            .get_mut("capabilities")
            .and_then(Item::as_table_like_mut)
            .and_then(|t| t.get_mut(side.key()))
            .and_then(Item::as_array_of_tables_mut)
        {
            for entry in entries.iter_mut() {
                let property = entry
                    .get("property")
                    .and_then(Item::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                reset_block(
                    entry,
                    format!("capability: {}.{property}", side.key()),
                    dry_run,
                    &mut out,
                );
            }
        }
    }

    out
}

fn reset_block(
    owner: &mut dyn TableLike,
    location: String,
    dry_run: bool,
    out: &mut Vec<ResetItem>,
) {
    let Some(verification) = owner.get_mut("verification") else {
        return;
    };

    let (status, notes_empty) = match verification.as_table_like() {
        Some(v) => (
            v.get("status").and_then(Item::as_str).map(str::to_string),
            v.get("notes").and_then(Item::as_str).unwrap_or("").is_empty(),
        ),
        None => return,
    };

    let status_stale = status.as_deref() != Some("pending");
    let notes_stale = !notes_empty;
    if !status_stale && !notes_stale {
        return;
    }

    if !dry_run {
        match verification {
            Item::Value(Value::InlineTable(t)) => {
                t.insert("status", "pending".into());
                t.insert("notes", "".into());
            }
            Item::Table(t) => {
                t.insert("status", value("pending"));
                t.insert("notes", value(""));
            }
            _ => return,
        }
    }

    out.push(ResetItem {
        location,
        previous_status: if status_stale { status } else { None },
        cleared_notes: notes_stale,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
[types.Resource]
impl = "Resource"
verification = { status = "fixed", notes = "renamed field" }

[types.Cursor]
impl = "String"
verification = { status = "pending", notes = "" }

[[modules]]
id = "tools"
verification = { status = "warning", notes = "review pagination" }

  [[modules.methods]]
  name = "tools/call"
  impl = "CallTool"
  verification = { status = "critical", notes = "wrong result shape" }

  [[modules.notifications]]
  name = "notifications/tools/list_changed"
  impl = "ToolListChangedNotification"
  verification = { status = "pending", notes = "leftover" }

[[enums]]
name = "Role"
verification = { status = "info", notes = "ok" }

[[error_codes]]
name = "PARSE_ERROR"
code = -32700
verification = { status = "pending", notes = "" }

[[capabilities.client]]
property = "roots"
verification = { status = "fixed", notes = "added" }
"#;

    fn manifest() -> ManifestDoc {
        ManifestDoc::from_str_at(&Utf8PathBuf::from("m.toml"), SAMPLE).expect("parse")
    }

    #[test]
    fn reset_touches_every_stale_block() {
        let mut m = manifest();
        let items = reset_verification(&mut m, false);

        let locations: Vec<&str> = items.iter().map(|i| i.location.as_str()).collect();
        assert_eq!(
            locations,
            vec![
                "type: Resource",
                "module: tools",
                "tools > CallTool",
                "tools > ToolListChangedNotification",
                "enum: Role",
                "capability: client.roots",
            ]
        );

        // Everything is pending/empty afterwards.
        assert!(reset_verification(&mut m, false).is_empty());

        let rendered = m.to_string();
        assert!(!rendered.contains("renamed field"));
        assert!(!rendered.contains("critical"));
        assert!(!rendered.contains("leftover"));
    }

    #[test]
    fn dry_run_reports_without_mutating() {
        let mut m = manifest();
        let before = m.to_string();
        let items = reset_verification(&mut m, true);
        assert_eq!(items.len(), 6);
        assert_eq!(m.to_string(), before);
    }

    #[test]
    fn reset_records_previous_status_and_notes() {
        let mut m = manifest();
        let items = reset_verification(&mut m, true);
        let resource = items.iter().find(|i| i.location == "type: Resource").unwrap();
        assert_eq!(resource.previous_status.as_deref(), Some("fixed"));
        assert!(resource.cleared_notes);

        // Pending with leftover notes still counts, but only for the notes.
        let notif = items
            .iter()
            .find(|i| i.location == "tools > ToolListChangedNotification")
            .unwrap();
        assert_eq!(notif.previous_status, None);
        assert!(notif.cleared_notes);
    }
}
