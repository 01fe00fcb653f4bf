//! The reconciliation engine: schema facts vs manifest vs implementation.
//!
//! Every check accumulates into structured [`VerifyOutcome`] sections and
//! nothing short-circuits on a gap; a missing schema or manifest is the
//! caller's fatal error, long before this engine runs. The engine never
//! prints and never colors.

use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use protovet_manifest::{CapabilitySide, ManifestDoc, NotImplemented, not_implemented};
use protovet_scan::{ImplIndex, query};
use protovet_types::facts::{Direction, SchemaFacts};
use protovet_types::report::{CategoryCheck, DeprecatedInfo, VerifyOutcome};
use tracing::debug;

/// Everything one reconciliation pass needs, already materialized.
pub struct VerifyContext<'a> {
    pub repo_root: &'a Utf8Path,

    /// Root of the implementation tree (for enum case discovery).
    pub sources_dir: &'a Utf8Path,

    /// Client-side API surface file.
    pub client_source: &'a Utf8Path,

    /// Server-side API surface file.
    pub server_source: &'a Utf8Path,

    /// File declaring the error type with its code mapping.
    pub error_source: &'a Utf8Path,

    pub facts: &'a SchemaFacts,
    pub manifest: &'a ManifestDoc,
    pub index: &'a ImplIndex,
}

/// Run the full three-way reconciliation.
pub fn verify(ctx: &VerifyContext) -> VerifyOutcome {
    let inventory = not_implemented(ctx.manifest);
    let client = read_or_empty(ctx.client_source);
    let server = read_or_empty(ctx.server_source);

    let mut outcome = VerifyOutcome {
        protocol_version: ctx.manifest.target_protocol_version().to_string(),
        indexed_symbols: ctx.index.len(),
        ..VerifyOutcome::default()
    };

    check_impl_files(ctx, &inventory, &mut outcome.files);

    check_types_spec_manifest(ctx, &mut outcome.spec_manifest.types);
    check_types_impl(ctx, &mut outcome);

    check_methods_spec_manifest(ctx, &mut outcome.spec_manifest.methods);
    check_notifications_spec_manifest(ctx, &mut outcome.spec_manifest.notifications);
    check_method_impls(ctx, &client, &server, &mut outcome.manifest_impl.methods);
    check_notification_impls(ctx, &client, &server, &mut outcome.manifest_impl.notifications);

    check_enums(ctx, &mut outcome);
    check_error_codes(ctx, &mut outcome);
    check_capabilities(ctx, &client, &server, &mut outcome);

    outcome.deprecated = ctx
        .manifest
        .deprecated()
        .iter()
        .map(|d| DeprecatedInfo {
            name: d.name().to_string(),
            replacement: d.replacement().to_string(),
            notes: d.notes().to_string(),
        })
        .collect();

    outcome.not_implemented_files = inventory.files;
    outcome.not_implemented_types = inventory.types;

    debug!(
        gaps = outcome.gap_total(),
        warnings = outcome.warning_count(),
        "reconciliation finished"
    );
    outcome
}

fn read_or_empty(path: &Utf8Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

fn source_file(name: &str) -> bool {
    name.ends_with(".swift")
}

/// Validate that every implementation file the manifest points at exists.
/// Todo-flagged owners are inventory, not file errors.
fn check_impl_files(ctx: &VerifyContext, inventory: &NotImplemented, check: &mut CategoryCheck) {
    let mut seen = std::collections::BTreeSet::new();

    for module in ctx.manifest.modules() {
        let Some(file) = module.impl_file() else {
            continue;
        };
        if !seen.insert(file.to_string()) {
            continue;
        }
        if ctx.repo_root.join(file).exists() {
            check.ok(file);
        } else if module.is_todo() {
            // Shown in the not-implemented section instead.
        } else {
            check.gap(file);
        }
    }

    for entry in ctx.manifest.types() {
        let todo = entry.is_todo();
        for file in entry.files() {
            if file.is_empty() || !source_file(&file) || !seen.insert(file.clone()) {
                continue;
            }
            if ctx.repo_root.join(&file).exists() {
                check.ok(&file);
            } else if todo || inventory.files.contains(&file) {
                // Inventory, not a gap.
            } else {
                check.gap(&file);
            }
        }
    }
}

fn check_types_spec_manifest(ctx: &VerifyContext, check: &mut CategoryCheck) {
    let manifest_names = ctx.manifest.type_names_with_aliases();
    for spec_type in &ctx.facts.types {
        if manifest_names.contains(spec_type) {
            check.ok(spec_type);
        } else {
            check.gap(spec_type);
        }
    }
}

fn check_types_impl(ctx: &VerifyContext, outcome: &mut VerifyOutcome) {
    let check = &mut outcome.manifest_impl.types;

    for entry in ctx.manifest.types() {
        if entry.is_todo() {
            continue;
        }
        if entry.is_builtin() {
            outcome.builtin_count += 1;
            continue;
        }

        for impl_name in entry.impl_names() {
            let impl_name = impl_name.trim();
            if impl_name.is_empty() || impl_name == "null" {
                continue;
            }
            if ctx.index.contains(impl_name) {
                check.ok(format!("{} → {impl_name}", entry.name));
            } else {
                check.gap(format!("{} (expected: {impl_name})", entry.name));
            }
        }
    }
}

fn check_methods_spec_manifest(ctx: &VerifyContext, check: &mut CategoryCheck) {
    let manifest_methods = ctx.manifest.method_names();
    for (method, fact) in &ctx.facts.methods {
        if manifest_methods.contains(method) {
            check.ok(method);
        } else {
            check.gap(method);
        }
        if fact.direction == Direction::Unknown {
            check.warn(format!(
                "{method}: direction unknown ({} is in neither request union)",
                fact.request_type
            ));
        }
    }
}

fn check_notifications_spec_manifest(ctx: &VerifyContext, check: &mut CategoryCheck) {
    let manifest_notifications = ctx.manifest.notification_names();
    for (name, fact) in &ctx.facts.notifications {
        if manifest_notifications.contains(name) {
            check.ok(name);
        } else {
            check.gap(name);
        }
        if fact.direction == Direction::Unknown {
            check.warn(format!(
                "{name}: direction unknown ({} is in neither notification union)",
                fact.notification_type
            ));
        }
    }
}

/// Resolve every declared method hook against the implementation sources.
fn check_method_impls(
    ctx: &VerifyContext,
    client: &str,
    server: &str,
    check: &mut CategoryCheck,
) {
    for module in ctx.manifest.modules() {
        for method in module.methods() {
            let name = method.name().unwrap_or("unknown");
            if method.is_todo() {
                check.note(format!("{name}: not yet implemented"));
                continue;
            }

            if let Some(client_method) = method.client_method() {
                if query::function_exists(client_method, client) {
                    check.ok(format!("{name}: client_method '{client_method}'"));
                } else {
                    check.gap(format!("{name}: client_method '{client_method}' not found"));
                }
            }

            if let Some(server_method) = method.server_method() {
                if query::function_exists(server_method, server) {
                    check.ok(format!("{name}: server_method '{server_method}'"));
                } else {
                    check.gap(format!("{name}: server_method '{server_method}' not found"));
                }
            }

            if let Some(client_handler) = method.client_handler() {
                if query::function_exists(client_handler, client) {
                    check.ok(format!("{name}: client_handler '{client_handler}'"));
                } else {
                    check.gap(format!(
                        "{name}: client_handler '{client_handler}' not found"
                    ));
                }
            }

            if let Some((file, pattern)) = method.handler_registration() {
                let path = ctx.repo_root.join(file);
                match fs::read_to_string(&path) {
                    Ok(contents) if contents.contains(pattern) => {
                        check.ok(format!("{name}: handler_registration '{pattern}'"));
                    }
                    Ok(_) => {
                        check.gap(format!(
                            "{name}: handler_registration pattern '{pattern}' not found in {file}"
                        ));
                    }
                    Err(_) => {
                        check.gap(format!(
                            "{name}: handler_registration file '{file}' not found"
                        ));
                    }
                }
            }
        }
    }
}

fn check_notification_impls(
    ctx: &VerifyContext,
    client: &str,
    server: &str,
    check: &mut CategoryCheck,
) {
    for module in ctx.manifest.modules() {
        for notification in module.notifications() {
            let name = notification.name().unwrap_or("unknown");
            if notification.is_todo() {
                check.note(format!("{name}: not yet implemented"));
                continue;
            }

            if let Some(server_send) = notification.server_send() {
                if query::function_exists(server_send, server) {
                    check.ok(format!("{name}: server_send '{server_send}'"));
                } else {
                    check.gap(format!("{name}: server_send '{server_send}' not found"));
                }
            }

            if let Some(client_send) = notification.client_send() {
                if client_send == "notify" {
                    // The generic sender always exists.
                    check.ok(format!("{name}: client_send 'notify' (generic)"));
                } else if query::function_exists(client_send, client) {
                    check.ok(format!("{name}: client_send '{client_send}'"));
                } else {
                    check.gap(format!("{name}: client_send '{client_send}' not found"));
                }
            }
        }
    }
}

/// Enums compare the full case-value set, not just presence. Cases the spec
/// has and the implementation lacks are gaps; extra implementation cases
/// are warnings only.
fn check_enums(ctx: &VerifyContext, outcome: &mut VerifyOutcome) {
    let manifest_enums = ctx.manifest.enums();
    let manifest_names: std::collections::BTreeSet<&str> =
        manifest_enums.iter().map(|e| e.name()).collect();

    for enum_name in ctx.facts.enums.keys() {
        if manifest_names.contains(enum_name.as_str()) {
            outcome.spec_manifest.enums.ok(enum_name);
        } else {
            outcome.spec_manifest.enums.gap(format!("{enum_name}: not in manifest"));
        }
    }

    let check = &mut outcome.manifest_impl.enums;
    for entry in manifest_enums {
        let name = entry.name();
        let impl_name = entry.impl_name();

        if impl_name.is_empty() || impl_name == "null" {
            check.gap(format!("{name}: no implementation mapping in manifest"));
            continue;
        }

        let Some(spec_values) = ctx.facts.enums.get(name) else {
            check.warn(format!("{name}: not found in spec schema"));
            continue;
        };

        let Some(impl_cases) = query::find_enum_cases(ctx.sources_dir, impl_name) else {
            check.gap(format!("{name}: enum '{impl_name}' not found"));
            continue;
        };

        let spec_set: std::collections::BTreeSet<&str> =
            spec_values.iter().map(String::as_str).collect();
        let impl_set: std::collections::BTreeSet<&str> =
            impl_cases.iter().map(String::as_str).collect();

        let missing: Vec<&str> = spec_set.difference(&impl_set).copied().collect();
        let extra: Vec<&str> = impl_set.difference(&spec_set).copied().collect();

        if !missing.is_empty() {
            check.gap(format!("{name}: missing cases: {missing:?}"));
        } else if extra.is_empty() {
            check.ok(format!("{name}: {} cases match", spec_values.len()));
        } else {
            check.ok(format!("{name}: all {} spec cases present", spec_values.len()));
        }
        if !extra.is_empty() {
            check.warn(format!("{name}: extra cases: {extra:?}"));
        }
    }
}

/// Error codes with a dedicated implementation case must match the exact
/// integer; codes with documented generic handling are accepted as-is.
fn check_error_codes(ctx: &VerifyContext, outcome: &mut VerifyOutcome) {
    let manifest_codes = ctx.manifest.error_codes();
    let manifest_names: std::collections::BTreeSet<&str> =
        manifest_codes.iter().map(|c| c.name()).collect();

    for (name, code) in &ctx.facts.error_codes {
        if manifest_names.contains(name.as_str()) {
            outcome.spec_manifest.error_codes.ok(format!("{name} ({code})"));
        } else {
            outcome
                .spec_manifest
                .error_codes
                .gap(format!("{name} ({code}): not in manifest"));
        }
    }

    let check = &mut outcome.manifest_impl.error_codes;
    let error_contents = match fs::read_to_string(ctx.error_source) {
        Ok(contents) => contents,
        Err(_) => {
            check.gap(format!("error source not found at {}", ctx.error_source));
            return;
        }
    };
    let impl_codes = query::error_case_codes(&error_contents);

    for entry in manifest_codes {
        let name = entry.name();
        let Some(expected) = entry.code() else {
            check.warn(format!("{name}: no numeric code in manifest"));
            continue;
        };

        match entry.impl_case() {
            Some(case) => match impl_codes.get(case) {
                Some(actual) if *actual == expected => {
                    check.ok(format!("{name} ({expected}): {case}"));
                }
                Some(actual) => {
                    check.gap(format!("{name}: expected {expected}, got {actual}"));
                }
                None => {
                    check.gap(format!("{name} ({expected}): case '{case}' not found"));
                }
            },
            None => {
                let handling = entry
                    .generic_handling()
                    .unwrap_or("serverError(code:message:)");
                check.note(format!("{name} ({expected}): {handling}"));
            }
        }
    }
}

/// Two-level capability check: the property itself, then every nested
/// sub-property. Any missing nested property fails the whole property.
fn check_capabilities(
    ctx: &VerifyContext,
    client: &str,
    server: &str,
    outcome: &mut VerifyOutcome,
) {
    for (side, spec_caps, contents) in [
        (CapabilitySide::Client, &ctx.facts.capabilities.client, client),
        (CapabilitySide::Server, &ctx.facts.capabilities.server, server),
    ] {
        let entries = ctx.manifest.capabilities(side);
        let manifest_props: std::collections::BTreeSet<&str> =
            entries.iter().map(|c| c.property()).collect();

        for prop in spec_caps.keys() {
            if manifest_props.contains(prop.as_str()) {
                outcome
                    .spec_manifest
                    .capabilities
                    .ok(format!("{}.{prop}", side.key()));
            } else {
                outcome
                    .spec_manifest
                    .capabilities
                    .gap(format!("{}.{prop}: not in manifest", side.key()));
            }
        }

        let check = &mut outcome.manifest_impl.capabilities;
        for entry in entries {
            let prop = entry.property();
            let impl_name = entry.impl_name();

            if impl_name.is_empty() || impl_name == "null" {
                check.gap(format!("{}.{prop}: missing in implementation", side.key()));
                continue;
            }

            if !query::property_exists(impl_name, contents) {
                check.gap(format!(
                    "{}.{prop}: property '{impl_name}' not found",
                    side.key()
                ));
                continue;
            }

            let nested = entry.nested();
            let missing: Vec<String> = nested
                .iter()
                .filter(|(_, impl_name)| !query::property_exists(impl_name, contents))
                .map(|(name, _)| name.clone())
                .collect();

            if missing.is_empty() {
                let nested_info = if nested.is_empty() {
                    String::new()
                } else {
                    format!(" ({} nested)", nested.len())
                };
                check.ok(format!("{}.{prop}{nested_info}", side.key()));
            } else {
                check.gap(format!(
                    "{}.{prop}: missing nested: {missing:?}",
                    side.key()
                ));
            }
        }
    }
}
