//! The manifest synchronizer: absorb schema additions into the manifest.
//!
//! Sync is additive-only and idempotent. New entries are appended with
//! pending verification blocks; fields already populated are never
//! rewritten. Each fact category has its own [`Syncer`]; the runner
//! executes them in a fixed order over the in-memory document and reports
//! every change, plus a unified diff of the manifest. Persisting (or not,
//! for a dry run) is the caller's decision.

use diffy::PatchFormatter;
use protovet_manifest::{
    CapabilitySide, ManifestDoc, NewErrorCode, NewMethod, NewNotification, NewType,
    append_capability_nested, append_enum_case, fill_missing_field,
};
use protovet_naming as naming;
use protovet_scan::ImplIndex;
use protovet_types::facts::{Direction, SchemaFacts};
use protovet_types::sync::{SyncCategory, SyncChange, SyncOutcome, SyncWarning};
use std::collections::BTreeSet;
use tracing::debug;

/// Inputs shared by every syncer.
pub struct SyncContext<'a> {
    pub facts: &'a SchemaFacts,
    pub index: &'a ImplIndex,
}

/// What one syncer did: one detail line per addition.
#[derive(Debug, Default)]
pub struct SyncerOutput {
    pub changes: Vec<String>,
    pub warnings: Vec<String>,
}

impl SyncerOutput {
    fn change(&mut self, detail: impl Into<String>) {
        self.changes.push(detail.into());
    }

    fn warn(&mut self, detail: impl Into<String>) {
        self.warnings.push(detail.into());
    }
}

pub trait Syncer {
    fn category(&self) -> SyncCategory;

    fn sync(&self, manifest: &mut ManifestDoc, ctx: &SyncContext) -> anyhow::Result<SyncerOutput>;
}

pub fn builtin_syncers() -> Vec<Box<dyn Syncer>> {
    vec![
        Box::new(TypeSyncer),
        Box::new(MethodSyncer),
        Box::new(NotificationSyncer),
        Box::new(EnumSyncer),
        Box::new(ErrorCodeSyncer),
        Box::new(CapabilitySyncer),
        Box::new(DeprecatedSyncer),
    ]
}

/// Run every syncer over the manifest and assemble the outcome.
pub fn sync_manifest(manifest: &mut ManifestDoc, ctx: &SyncContext) -> anyhow::Result<SyncOutcome> {
    let before = manifest.to_string();
    let mut outcome = SyncOutcome::default();

    for syncer in builtin_syncers() {
        let category = syncer.category();
        let run = syncer.sync(manifest, ctx)?;
        debug!(
            category = category.label(),
            changes = run.changes.len(),
            "syncer finished"
        );
        outcome.changes.extend(
            run.changes
                .into_iter()
                .map(|detail| SyncChange { category, detail }),
        );
        outcome.warnings.extend(
            run.warnings
                .into_iter()
                .map(|detail| SyncWarning { category, detail }),
        );
    }

    let after = manifest.to_string();
    if before != after {
        let patch = diffy::create_patch(&before, &after);
        outcome.diff = Some(PatchFormatter::new().fmt_patch(&patch).to_string());
    }

    Ok(outcome)
}

/// New spec types get a discovered implementation name when exactly one
/// derivation candidate resolves in the index; anything else gets a loud
/// placeholder. The synchronizer never guesses silently.
struct TypeSyncer;

impl Syncer for TypeSyncer {
    fn category(&self) -> SyncCategory {
        SyncCategory::Types
    }

    fn sync(&self, manifest: &mut ManifestDoc, ctx: &SyncContext) -> anyhow::Result<SyncerOutput> {
        let mut out = SyncerOutput::default();
        let known = manifest.type_names_with_aliases();

        for spec_type in &ctx.facts.types {
            if known.contains(spec_type) {
                continue;
            }

            let candidates = naming::impl_type_candidates(spec_type);
            let mut seen = BTreeSet::new();
            let hits: Vec<&naming::TypeCandidate> = candidates
                .iter()
                .filter(|c| ctx.index.contains(&c.name))
                .filter(|c| seen.insert(c.name.clone()))
                .collect();

            match hits.as_slice() {
                [hit] => {
                    let file = ctx
                        .index
                        .get(&hit.name)
                        .map(|s| s.file.clone())
                        .unwrap_or_default();
                    manifest.insert_type(
                        spec_type,
                        &NewType {
                            impl_name: hit.name.clone(),
                            file,
                            notes: "auto-discovered from implementation index".to_string(),
                        },
                    );
                    out.change(format!(
                        "{spec_type} → {} ({})",
                        hit.name,
                        hit.rule.describe()
                    ));
                }
                [] => {
                    manifest.insert_type(
                        spec_type,
                        &NewType {
                            impl_name: format!("TODO_{spec_type}"),
                            file: String::new(),
                            notes: "no match found in implementation index".to_string(),
                        },
                    );
                    out.change(format!("{spec_type} → TODO (no match found)"));
                }
                many => {
                    let names: Vec<&str> = many.iter().map(|c| c.name.as_str()).collect();
                    manifest.insert_type(
                        spec_type,
                        &NewType {
                            impl_name: format!("TODO_{spec_type}"),
                            file: String::new(),
                            notes: "no match found in implementation index".to_string(),
                        },
                    );
                    out.change(format!("{spec_type} → TODO (ambiguous)"));
                    out.warn(format!(
                        "{spec_type}: ambiguous implementation candidates: {names:?}"
                    ));
                }
            }
        }

        Ok(out)
    }
}

/// Methods bucket into modules by category; only the fields their
/// direction requires are populated, on new and existing entries alike.
struct MethodSyncer;

impl Syncer for MethodSyncer {
    fn category(&self) -> SyncCategory {
        SyncCategory::Methods
    }

    fn sync(&self, manifest: &mut ManifestDoc, ctx: &SyncContext) -> anyhow::Result<SyncerOutput> {
        let mut out = SyncerOutput::default();
        let known = manifest.method_names();

        for (method, fact) in &ctx.facts.methods {
            let derived = naming::method_impl_name(method);
            let handler = naming::client_handler_name(method);
            let direction = fact.direction;

            if !known.contains(method) {
                let module_id = naming::module_id_for_method(method);
                let impl_name = fact
                    .request_type
                    .strip_suffix("Request")
                    .unwrap_or(&fact.request_type)
                    .to_string();

                manifest.append_method(
                    &module_id,
                    &NewMethod {
                        name: method.clone(),
                        impl_name,
                        client_method: direction
                            .requires_client_method()
                            .then(|| derived.clone()),
                        server_method: direction
                            .requires_server_method()
                            .then(|| derived.clone()),
                        client_handler: direction
                            .requires_client_handler()
                            .then(|| handler.clone()),
                    },
                );
                out.change(format!("{method} → module '{module_id}'"));
                if direction == Direction::Unknown {
                    out.warn(format!(
                        "{method}: direction unknown; no implementation hooks added"
                    ));
                }
                continue;
            }

            let Some(entry) = manifest.method_entry_mut(method) else {
                continue;
            };
            if direction.requires_client_method()
                && fill_missing_field(entry, "client_method", &derived)
            {
                out.change(format!("{method}: client_method: {derived}"));
            }
            if direction.requires_server_method()
                && fill_missing_field(entry, "server_method", &derived)
            {
                out.change(format!("{method}: server_method: {derived}"));
            }
            if direction.requires_client_handler()
                && fill_missing_field(entry, "client_handler", &handler)
            {
                out.change(format!("{method}: client_handler: {handler}"));
            }
        }

        Ok(out)
    }
}

struct NotificationSyncer;

fn sender_label(direction: Direction) -> &'static str {
    match direction {
        Direction::ClientToServer => "client",
        Direction::ServerToClient => "server",
        Direction::Bidirectional | Direction::Unknown => "both",
    }
}

impl Syncer for NotificationSyncer {
    fn category(&self) -> SyncCategory {
        SyncCategory::Notifications
    }

    fn sync(&self, manifest: &mut ManifestDoc, ctx: &SyncContext) -> anyhow::Result<SyncerOutput> {
        let mut out = SyncerOutput::default();
        let known = manifest.notification_names();

        for (name, fact) in &ctx.facts.notifications {
            let send_method = naming::send_method_name(&fact.notification_type);
            let direction = fact.direction;
            let server_sends = matches!(
                direction,
                Direction::ServerToClient | Direction::Bidirectional
            );
            let client_sends = matches!(
                direction,
                Direction::ClientToServer | Direction::Bidirectional
            );

            if !known.contains(name) {
                let module_id = naming::module_id_for_notification(name);
                manifest.append_notification(
                    &module_id,
                    &NewNotification {
                        name: name.clone(),
                        impl_name: fact.notification_type.clone(),
                        sender: sender_label(direction).to_string(),
                        server_send: server_sends.then(|| send_method.clone()),
                        client_send: client_sends.then(|| "notify".to_string()),
                    },
                );
                out.change(format!("{name} → module '{module_id}'"));
                continue;
            }

            let Some(entry) = manifest.notification_entry_mut(name) else {
                continue;
            };
            if fill_missing_field(entry, "sender", sender_label(direction)) {
                out.change(format!("{name}: sender: {}", sender_label(direction)));
            }
            if server_sends && fill_missing_field(entry, "server_send", &send_method) {
                out.change(format!("{name}: server_send: {send_method}"));
            }
            if client_sends && fill_missing_field(entry, "client_send", "notify") {
                out.change(format!("{name}: client_send: notify"));
            }
        }

        Ok(out)
    }
}

/// New enums arrive with every spec case pre-populated and no file; the
/// file is a human decision. Existing enums only gain missing cases.
struct EnumSyncer;

impl Syncer for EnumSyncer {
    fn category(&self) -> SyncCategory {
        SyncCategory::Enums
    }

    fn sync(&self, manifest: &mut ManifestDoc, ctx: &SyncContext) -> anyhow::Result<SyncerOutput> {
        let mut out = SyncerOutput::default();
        let known: BTreeSet<String> = manifest.enums().iter().map(|e| e.name().to_string()).collect();

        for (enum_name, spec_cases) in &ctx.facts.enums {
            if !known.contains(enum_name) {
                manifest.append_enum(enum_name, spec_cases);
                out.change(format!(
                    "{enum_name}: new enum with {} cases",
                    spec_cases.len()
                ));
                continue;
            }

            let existing: BTreeSet<String> = manifest
                .enums()
                .iter()
                .find(|e| e.name() == enum_name)
                .map(|e| e.spec_cases().into_iter().collect())
                .unwrap_or_default();

            for case in spec_cases {
                if existing.contains(case) {
                    continue;
                }
                if let Some(entry) = manifest.enum_entry_mut(enum_name) {
                    append_enum_case(entry, case);
                    out.change(format!("{enum_name}: missing case '{case}'"));
                }
            }
        }

        Ok(out)
    }
}

/// Reserved JSON-RPC codes get their dedicated case from the naming table;
/// everything else gets the documented generic-handling template.
struct ErrorCodeSyncer;

impl Syncer for ErrorCodeSyncer {
    fn category(&self) -> SyncCategory {
        SyncCategory::ErrorCodes
    }

    fn sync(&self, manifest: &mut ManifestDoc, ctx: &SyncContext) -> anyhow::Result<SyncerOutput> {
        let mut out = SyncerOutput::default();
        let known: BTreeSet<String> = manifest
            .error_codes()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        for (name, code) in &ctx.facts.error_codes {
            if known.contains(name) {
                continue;
            }

            let impl_case = naming::jsonrpc_error_case(name);
            manifest.append_error_code(&NewErrorCode {
                name: name.clone(),
                code: *code,
                category: if impl_case.is_some() {
                    "jsonrpc".to_string()
                } else {
                    "protocol".to_string()
                },
                impl_case: impl_case.map(str::to_string),
                generic_handling: impl_case
                    .is_none()
                    .then(|| "serverError(code:message:)".to_string()),
            });
            out.change(format!("{name} ({code}): new error code"));
        }

        Ok(out)
    }
}

/// New capability properties default to identical spec/impl names with all
/// nested sub-properties listed; existing properties only gain missing
/// nested entries.
struct CapabilitySyncer;

impl Syncer for CapabilitySyncer {
    fn category(&self) -> SyncCategory {
        SyncCategory::Capabilities
    }

    fn sync(&self, manifest: &mut ManifestDoc, ctx: &SyncContext) -> anyhow::Result<SyncerOutput> {
        let mut out = SyncerOutput::default();

        for (side, spec_caps) in [
            (CapabilitySide::Client, &ctx.facts.capabilities.client),
            (CapabilitySide::Server, &ctx.facts.capabilities.server),
        ] {
            let known: BTreeSet<String> = manifest
                .capabilities(side)
                .iter()
                .map(|c| c.property().to_string())
                .collect();

            for (property, nested) in spec_caps {
                let nested_names: Vec<String> = nested.keys().cloned().collect();

                if !known.contains(property) {
                    manifest.append_capability(side, property, &nested_names);
                    out.change(format!("{}.{property}: new capability", side.key()));
                    continue;
                }

                let existing: BTreeSet<String> = manifest
                    .capabilities(side)
                    .iter()
                    .find(|c| c.property() == property)
                    .map(|c| c.nested().into_iter().map(|(name, _)| name).collect())
                    .unwrap_or_default();

                for name in &nested_names {
                    if existing.contains(name) {
                        continue;
                    }
                    if let Some(entry) = manifest.capability_entry_mut(side, property) {
                        append_capability_nested(entry, name);
                        out.change(format!(
                            "{}.{property}: missing nested '{name}'",
                            side.key()
                        ));
                    }
                }
            }
        }

        Ok(out)
    }
}

/// Deprecated types are informational inventory; the replacement is never
/// auto-filled.
struct DeprecatedSyncer;

impl Syncer for DeprecatedSyncer {
    fn category(&self) -> SyncCategory {
        SyncCategory::Deprecated
    }

    fn sync(&self, manifest: &mut ManifestDoc, ctx: &SyncContext) -> anyhow::Result<SyncerOutput> {
        let mut out = SyncerOutput::default();
        let known = manifest.deprecated_names();

        for (name, description) in &ctx.facts.deprecated {
            if known.contains(name) {
                continue;
            }
            let notes: String = description.chars().take(100).collect();
            manifest.append_deprecated(name, &notes);
            out.change(format!("{name}: newly deprecated"));
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;
    use protovet_scan::Symbol;
    use protovet_types::facts::{CapabilityFacts, MethodFact, NotificationFact};
    use std::collections::BTreeMap;

    fn empty_manifest() -> ManifestDoc {
        ManifestDoc::from_str_at(
            &Utf8PathBuf::from("m.toml"),
            "target_protocol_version = \"2025-11-25\"\n",
        )
        .expect("parse")
    }

    fn symbol(file: &str) -> Symbol {
        Symbol {
            kind: "struct".to_string(),
            file: file.to_string(),
            line: Some(1),
        }
    }

    fn facts() -> SchemaFacts {
        let mut facts = SchemaFacts::default();
        facts.types = ["Foo", "PromptArgument", "Mystery"]
            .into_iter()
            .map(str::to_string)
            .collect();
        facts.enums = BTreeMap::from([(
            "Role".to_string(),
            vec!["assistant".to_string(), "user".to_string()],
        )]);
        facts.error_codes = BTreeMap::from([
            ("PARSE_ERROR".to_string(), -32700),
            ("REQUEST_TIMEOUT".to_string(), -32001),
        ]);
        facts.capabilities = CapabilityFacts {
            client: BTreeMap::from([(
                "roots".to_string(),
                BTreeMap::from([("listChanged".to_string(), "boolean".to_string())]),
            )]),
            server: BTreeMap::new(),
        };
        facts.methods = BTreeMap::from([
            (
                "resources/list".to_string(),
                MethodFact {
                    request_type: "ListResourcesRequest".to_string(),
                    direction: Direction::ClientToServer,
                },
            ),
            (
                "sampling/createMessage".to_string(),
                MethodFact {
                    request_type: "CreateMessageRequest".to_string(),
                    direction: Direction::ServerToClient,
                },
            ),
        ]);
        facts.notifications = BTreeMap::from([
            (
                "notifications/initialized".to_string(),
                NotificationFact {
                    notification_type: "InitializedNotification".to_string(),
                    direction: Direction::ClientToServer,
                },
            ),
            (
                "notifications/resources/list_changed".to_string(),
                NotificationFact {
                    notification_type: "ResourceListChangedNotification".to_string(),
                    direction: Direction::ServerToClient,
                },
            ),
        ]);
        facts.deprecated = BTreeMap::from([(
            "LegacyThing".to_string(),
            "Deprecated: will be removed. ".repeat(10),
        )]);
        facts
    }

    fn index() -> ImplIndex {
        ImplIndex::from_symbols(vec![
            ("Foo".to_string(), symbol("Sources/Foo.swift")),
            (
                "Prompt.Argument".to_string(),
                symbol("Sources/Server/Prompts.swift"),
            ),
        ])
    }

    #[test]
    fn sync_fills_an_empty_manifest() {
        let mut m = empty_manifest();
        let facts = facts();
        let index = index();
        let ctx = SyncContext {
            facts: &facts,
            index: &index,
        };

        let outcome = sync_manifest(&mut m, &ctx).expect("sync");

        // Types: Foo exact, PromptArgument nested split, Mystery placeholder.
        assert_eq!(outcome.count_for(SyncCategory::Types), 3);
        let types = m.types();
        let foo = types.iter().find(|t| t.name == "Foo").unwrap();
        assert_eq!(foo.impl_names(), vec!["Foo"]);
        assert_eq!(foo.files(), vec!["Sources/Foo.swift"]);
        assert!(foo.verification().notes.contains("auto-discovered"));

        let prompt_arg = types.iter().find(|t| t.name == "PromptArgument").unwrap();
        assert_eq!(prompt_arg.impl_names(), vec!["Prompt.Argument"]);

        let mystery = types.iter().find(|t| t.name == "Mystery").unwrap();
        assert_eq!(mystery.impl_names(), vec!["TODO_Mystery"]);
        assert!(mystery.verification().notes.contains("no match found"));

        // Methods land in their modules with direction-appropriate hooks.
        let modules = m.modules();
        let resources = modules.iter().find(|x| x.id() == "resources").unwrap();
        let list = &resources.methods()[0];
        assert_eq!(list.client_method(), Some("listResources"));
        assert_eq!(list.server_method(), None);
        assert_eq!(list.impl_name(), Some("ListResources"));

        let sampling = modules.iter().find(|x| x.id() == "sampling").unwrap();
        let create = &sampling.methods()[0];
        assert_eq!(create.client_method(), None);
        assert_eq!(create.server_method(), Some("requestSampling"));
        assert_eq!(create.client_handler(), Some("withSamplingHandler"));

        // Notifications: the initialized notification buckets to lifecycle.
        let lifecycle = modules.iter().find(|x| x.id() == "lifecycle").unwrap();
        let initialized = &lifecycle.notifications()[0];
        assert_eq!(initialized.sender(), Some("client"));
        assert_eq!(initialized.client_send(), Some("notify"));
        assert_eq!(initialized.server_send(), None);

        let resources_notifs = resources.notifications();
        assert_eq!(
            resources_notifs[0].server_send(),
            Some("sendResourceListChanged")
        );

        // Enums, error codes, capabilities, deprecated.
        assert_eq!(m.enums()[0].spec_cases(), vec!["assistant", "user"]);
        let codes = m.error_codes();
        let parse = codes.iter().find(|c| c.name() == "PARSE_ERROR").unwrap();
        assert_eq!(parse.code(), Some(-32700));
        assert_eq!(parse.category(), Some("jsonrpc"));
        assert_eq!(parse.impl_case(), Some("parseError"));
        let timeout = codes.iter().find(|c| c.name() == "REQUEST_TIMEOUT").unwrap();
        assert_eq!(timeout.category(), Some("protocol"));
        assert_eq!(timeout.impl_case(), None);
        assert!(timeout.generic_handling().is_some());

        let caps = m.capabilities(CapabilitySide::Client);
        assert_eq!(caps[0].property(), "roots");
        assert_eq!(caps[0].nested().len(), 1);

        let deprecated = m.deprecated();
        assert_eq!(deprecated[0].name(), "LegacyThing");
        assert!(deprecated[0].notes().chars().count() <= 100);
        assert_eq!(deprecated[0].replacement(), "");

        assert!(outcome.diff.is_some());
    }

    #[test]
    fn sync_is_idempotent() {
        let mut m = empty_manifest();
        let facts = facts();
        let index = index();
        let ctx = SyncContext {
            facts: &facts,
            index: &index,
        };

        let first = sync_manifest(&mut m, &ctx).expect("first sync");
        assert!(first.total() > 0);

        let second = sync_manifest(&mut m, &ctx).expect("second sync");
        assert_eq!(second.total(), 0);
        assert!(second.diff.is_none());
    }

    #[test]
    fn sync_is_additive_only() {
        let mut m = ManifestDoc::from_str_at(
            &Utf8PathBuf::from("m.toml"),
            r#"
# hand-written header comment
target_protocol_version = "2025-11-25"

[types.Foo]
impl = "CustomFoo"  # deliberate override
file = "Sources/Custom.swift"
verification = { status = "fixed", notes = "manually verified" }
"#,
        )
        .expect("parse");

        let facts = facts();
        let index = index();
        let ctx = SyncContext {
            facts: &facts,
            index: &index,
        };
        let outcome = sync_manifest(&mut m, &ctx).expect("sync");

        // The populated entry is untouched.
        let types = m.types();
        let foo = types.iter().find(|t| t.name == "Foo").unwrap();
        assert_eq!(foo.impl_names(), vec!["CustomFoo"]);
        assert_eq!(foo.verification().status.as_deref(), Some("fixed"));

        // The diff only adds lines.
        let diff = outcome.diff.expect("diff");
        for line in diff.lines() {
            if line.starts_with('-') && !line.starts_with("---") {
                panic!("sync produced a removal: {line}");
            }
        }
        assert!(m.to_string().contains("# hand-written header comment"));
    }

    #[test]
    fn existing_method_entries_gain_missing_direction_fields() {
        let mut m = ManifestDoc::from_str_at(
            &Utf8PathBuf::from("m.toml"),
            r#"
[[modules]]
id = "sampling"
impl_file = "Sources/Client/Client.swift"

  [[modules.methods]]
  name = "sampling/createMessage"
  impl = "CreateMessage"
  verification = { status = "pending", notes = "" }
"#,
        )
        .expect("parse");

        let facts = facts();
        let index = index();
        let ctx = SyncContext {
            facts: &facts,
            index: &index,
        };
        let outcome = sync_manifest(&mut m, &ctx).expect("sync");

        let changes: Vec<&str> = outcome
            .changes
            .iter()
            .filter(|c| c.category == SyncCategory::Methods)
            .map(|c| c.detail.as_str())
            .collect();
        assert!(changes.contains(&"sampling/createMessage: server_method: requestSampling"));
        assert!(
            changes.contains(&"sampling/createMessage: client_handler: withSamplingHandler")
        );

        let modules = m.modules();
        let sampling = modules.iter().find(|x| x.id() == "sampling").unwrap();
        assert_eq!(sampling.methods()[0].server_method(), Some("requestSampling"));
    }

    #[test]
    fn ambiguous_type_candidates_get_placeholder_and_warning() {
        let mut m = empty_manifest();
        let mut facts = SchemaFacts::default();
        facts.types.insert("Message".to_string());

        // Both the exact name and the outer-prefixed name exist.
        let index = ImplIndex::from_symbols(vec![
            ("Message".to_string(), symbol("Sources/A.swift")),
            ("JSONRPCMessage".to_string(), symbol("Sources/B.swift")),
        ]);
        let ctx = SyncContext {
            facts: &facts,
            index: &index,
        };
        let outcome = sync_manifest(&mut m, &ctx).expect("sync");

        let types = m.types();
        assert_eq!(types[0].impl_names(), vec!["TODO_Message"]);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].detail.contains("ambiguous"));
    }

    #[test]
    fn enum_case_additions_only_append_missing() {
        let mut m = ManifestDoc::from_str_at(
            &Utf8PathBuf::from("m.toml"),
            r#"
[[enums]]
name = "Role"
impl = "Role"
file = "Sources/Base/Role.swift"
cases = [ { spec = "user", impl = "user" } ]
verification = { status = "pending", notes = "" }
"#,
        )
        .expect("parse");

        let facts = facts();
        let index = index();
        let ctx = SyncContext {
            facts: &facts,
            index: &index,
        };
        let outcome = sync_manifest(&mut m, &ctx).expect("sync");

        assert_eq!(outcome.count_for(SyncCategory::Enums), 1);
        assert_eq!(m.enums()[0].spec_cases(), vec!["user", "assistant"]);
    }

    #[test]
    fn capability_sync_appends_only_missing_nested() {
        let mut m = ManifestDoc::from_str_at(
            &Utf8PathBuf::from("m.toml"),
            r#"
[[capabilities.client]]
property = "roots"
impl = "rootCapabilities"
nested = [ { name = "listChanged", impl = "listChanged" } ]
verification = { status = "fixed", notes = "renamed" }
"#,
        )
        .expect("parse");

        let mut facts = facts();
        facts
            .capabilities
            .client
            .get_mut("roots")
            .unwrap()
            .insert("watch".to_string(), "boolean".to_string());

        let index = index();
        let ctx = SyncContext {
            facts: &facts,
            index: &index,
        };
        let outcome = sync_manifest(&mut m, &ctx).expect("sync");

        let cap_changes: Vec<&str> = outcome
            .changes
            .iter()
            .filter(|c| c.category == SyncCategory::Capabilities)
            .map(|c| c.detail.as_str())
            .collect();
        assert_eq!(cap_changes, vec!["client.roots: missing nested 'watch'"]);

        let caps = m.capabilities(CapabilitySide::Client);
        assert_eq!(caps[0].impl_name(), "rootCapabilities");
        assert_eq!(caps[0].nested().len(), 2);
    }
}
