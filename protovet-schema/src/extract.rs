use camino::Utf8Path;
use fs_err as fs;
use protovet_types::facts::{
    CapabilityFacts, CapabilityMap, Direction, MethodFact, NotificationFact, SchemaFacts,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::debug;

/// Suffixes that mark a definition as method-shaped rather than a public
/// data type.
const METHOD_SUFFIXES: [&str; 6] = [
    "Request",
    "RequestParams",
    "Response",
    "Result",
    "Notification",
    "NotificationParams",
];

static ERROR_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:export\s+)?const\s+([A-Z_]+)\s*=\s*(-\d+);").expect("static regex")
});

fn defs(schema: &Value) -> Option<&Map<String, Value>> {
    schema.get("$defs")?.as_object()
}

fn description(defn: &Value) -> &str {
    defn.get("description").and_then(Value::as_str).unwrap_or("")
}

fn marked_deprecated(defn: &Value) -> bool {
    let desc = description(defn).to_lowercase();
    desc.contains("deprecated") || desc.contains("will be removed")
}

/// Public type names: `$defs` minus method-shaped names, internal request
/// parameter variants, and anything the schema marks deprecated.
pub fn extract_types(schema: &Value) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let Some(defs) = defs(schema) else {
        return out;
    };

    for (name, defn) in defs {
        if METHOD_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            continue;
        }
        // Internal request parameter variants, e.g. ElicitRequestFormParams.
        if name.contains("Request") && name.ends_with("Params") {
            continue;
        }
        if marked_deprecated(defn) {
            continue;
        }
        out.insert(name.clone());
    }
    out
}

/// Enum definitions with case values sorted for stable diffing.
pub fn extract_enums(schema: &Value) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    let Some(defs) = defs(schema) else {
        return out;
    };

    for (name, defn) in defs {
        let Some(values) = defn.get("enum").and_then(Value::as_array) else {
            continue;
        };
        let mut cases: Vec<String> = values
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        cases.sort();
        out.insert(name.clone(), cases);
    }
    out
}

/// Error-code constants from the companion constants file.
///
/// A missing file yields an empty map (tolerated); lines that do not match
/// the declaration shape contribute nothing.
pub fn extract_error_codes(spec_root: &Utf8Path, version: &str) -> BTreeMap<String, i64> {
    let path = spec_root.join("schema").join(version).join("schema.ts");
    let Ok(contents) = fs::read_to_string(&path) else {
        debug!(path = %path, "no constants file; error code set is empty");
        return BTreeMap::new();
    };

    let mut out = BTreeMap::new();
    for cap in ERROR_CODE_RE.captures_iter(&contents) {
        let name = cap[1].to_string();
        if let Ok(code) = cap[2].parse::<i64>() {
            out.insert(name, code);
        }
    }
    out
}

/// Capability properties for one side (`ClientCapabilities` or
/// `ServerCapabilities`): property -> nested properties, keeping only
/// nested properties with scalar types.
pub fn extract_capabilities(schema: &Value, cap_type: &str) -> CapabilityMap {
    let mut out = CapabilityMap::new();
    let Some(props) = defs(schema)
        .and_then(|d| d.get(cap_type))
        .and_then(|defn| defn.get("properties"))
        .and_then(Value::as_object)
    else {
        return out;
    };

    for (prop_name, prop_def) in props {
        let mut nested = BTreeMap::new();
        if let Some(nested_props) = prop_def.get("properties").and_then(Value::as_object) {
            for (nested_name, nested_def) in nested_props {
                let Some(ty) = nested_def.get("type").and_then(Value::as_str) else {
                    continue;
                };
                if matches!(ty, "boolean" | "string" | "integer") {
                    nested.insert(nested_name.clone(), ty.to_string());
                }
            }
        }
        out.insert(prop_name.clone(), nested);
    }
    out
}

/// Deprecated definitions: type name -> schema description.
pub fn extract_deprecated(schema: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let Some(defs) = defs(schema) else {
        return out;
    };
    for (name, defn) in defs {
        if marked_deprecated(defn) {
            out.insert(name.clone(), description(defn).to_string());
        }
    }
    out
}

/// Type names referenced by a union definition's `anyOf` list.
pub fn union_members(schema: &Value, union_type: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let Some(refs) = defs(schema)
        .and_then(|d| d.get(union_type))
        .and_then(|defn| defn.get("anyOf"))
        .and_then(Value::as_array)
    else {
        return out;
    };

    for entry in refs {
        if let Some(reference) = entry.get("$ref").and_then(Value::as_str) {
            if let Some(name) = reference.rsplit('/').next() {
                out.insert(name.to_string());
            }
        }
    }
    out
}

/// The `method` constant of a request/notification definition, if any.
pub fn method_const(schema: &Value, type_name: &str) -> Option<String> {
    defs(schema)?
        .get(type_name)?
        .get("properties")?
        .get("method")?
        .get("const")?
        .as_str()
        .map(str::to_string)
}

/// Request methods keyed by method name, with direction from the two
/// request-union membership tests.
///
/// A method-shaped definition carrying a `method` constant but absent from
/// both unions is kept with `Direction::Unknown` rather than dropped.
pub fn extract_methods(schema: &Value) -> BTreeMap<String, MethodFact> {
    extract_with_direction(schema, "ClientRequest", "ServerRequest", "Request")
        .into_iter()
        .map(|(method, (request_type, direction))| {
            (
                method,
                MethodFact {
                    request_type,
                    direction,
                },
            )
        })
        .collect()
}

/// Notifications keyed by method name. `ClientNotification` members are
/// sent *by* the client, so client-union membership maps to
/// client-to-server.
pub fn extract_notifications(schema: &Value) -> BTreeMap<String, NotificationFact> {
    extract_with_direction(schema, "ClientNotification", "ServerNotification", "Notification")
        .into_iter()
        .map(|(method, (notification_type, direction))| {
            (
                method,
                NotificationFact {
                    notification_type,
                    direction,
                },
            )
        })
        .collect()
}

fn extract_with_direction(
    schema: &Value,
    client_union: &str,
    server_union: &str,
    shape_suffix: &str,
) -> BTreeMap<String, (String, Direction)> {
    let client = union_members(schema, client_union);
    let server = union_members(schema, server_union);

    let mut out = BTreeMap::new();
    for type_name in client.union(&server) {
        let Some(method) = method_const(schema, type_name) else {
            continue;
        };
        let direction =
            Direction::from_membership(client.contains(type_name), server.contains(type_name));
        out.insert(method, (type_name.clone(), direction));
    }

    // Method-shaped definitions outside both unions must not silently
    // disappear; they surface as Unknown.
    if let Some(defs) = defs(schema) {
        for (name, _) in defs {
            if !name.ends_with(shape_suffix)
                || name.as_str() == client_union
                || name.as_str() == server_union
                || client.contains(name)
                || server.contains(name)
            {
                continue;
            }
            let Some(method) = method_const(schema, name) else {
                continue;
            };
            out.entry(method)
                .or_insert_with(|| (name.clone(), Direction::Unknown));
        }
    }

    out
}

/// Assemble all fact categories from one schema version.
pub fn extract_facts(schema: &Value, spec_root: &Utf8Path, version: &str) -> SchemaFacts {
    SchemaFacts {
        types: extract_types(schema),
        enums: extract_enums(schema),
        error_codes: extract_error_codes(spec_root, version),
        capabilities: CapabilityFacts {
            client: extract_capabilities(schema, "ClientCapabilities"),
            server: extract_capabilities(schema, "ServerCapabilities"),
        },
        methods: extract_methods(schema),
        notifications: extract_notifications(schema),
        deprecated: extract_deprecated(schema),
    }
}
