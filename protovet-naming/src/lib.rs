//! Name derivation between spec-level protocol names and the names expected
//! in the SDK implementation.
//!
//! Every function here is pure and total: no filesystem, no network, no
//! global state. Where a name deviates from the structural pattern and
//! cannot be derived, it lives in an explicit override table that is
//! consulted strictly before the structural rule. The tables are the
//! auditable escape hatch, never a silent default; a test asserts that no
//! table entry is also structurally derivable.

/// Outer message-envelope prefix used by the implementation for wire-level
/// types (`Message` <-> `JSONRPCMessage`).
pub const OUTER_MESSAGE_PREFIX: &str = "JSONRPC";

/// Product prefix the implementation adds to names that would collide with
/// platform types (`Error` -> `MCPError`, `Task` -> `MCPTask`).
pub const PRODUCT_PREFIX: &str = "MCP";

/// Method names whose implementation-side name deviates from the structural
/// `category/action` pattern.
///
/// Keep this table minimal: anything derivable by [`method_impl_name`]'s
/// structural rule must not appear here.
pub const METHOD_NAME_OVERRIDES: &[(&str, &str)] = &[
    ("completion/complete", "complete"),
    ("elicitation/create", "requestElicitation"),
    ("logging/setLevel", "setLoggingLevel"),
    ("resources/templates/list", "listResourceTemplates"),
    ("sampling/createMessage", "requestSampling"),
    ("tasks/result", "getTaskResult"),
];

/// Reserved JSON-RPC error constants and their dedicated implementation
/// case names. Codes outside this table get generic fallback handling.
pub const JSONRPC_ERROR_CASES: &[(&str, &str)] = &[
    ("INTERNAL_ERROR", "internalError"),
    ("INVALID_PARAMS", "invalidParams"),
    ("INVALID_REQUEST", "invalidRequest"),
    ("METHOD_NOT_FOUND", "methodNotFound"),
    ("PARSE_ERROR", "parseError"),
];

/// Dedicated case name for a reserved JSON-RPC error constant, if any.
pub fn jsonrpc_error_case(name: &str) -> Option<&'static str> {
    JSONRPC_ERROR_CASES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, case)| *case)
}

/// Rule that produced a type-name candidate, reported so callers can show
/// which derivation matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivationRule {
    Exact,
    OuterPrefixStripped,
    OuterPrefixAdded,
    NestedSplit,
    ProductPrefixStripped,
    ProductPrefixAdded,
}

impl DerivationRule {
    pub fn describe(self) -> &'static str {
        match self {
            DerivationRule::Exact => "exact name",
            DerivationRule::OuterPrefixStripped => "outer message prefix stripped",
            DerivationRule::OuterPrefixAdded => "outer message prefix added",
            DerivationRule::NestedSplit => "nested type split",
            DerivationRule::ProductPrefixStripped => "product prefix stripped",
            DerivationRule::ProductPrefixAdded => "product prefix added",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCandidate {
    pub name: String,
    pub rule: DerivationRule,
}

/// Full ordered candidate list of implementation names for a spec type.
///
/// Tried in order: exact; outer-message prefix removed or added; dotted
/// nesting splits (rightmost camel boundary first, so the longest owner
/// prefix wins); product prefix removed or added. Callers resolve the list
/// against the implementation index and must treat multiple distinct hits
/// as ambiguous rather than picking one.
pub fn impl_type_candidates(spec_name: &str) -> Vec<TypeCandidate> {
    let mut out = vec![TypeCandidate {
        name: spec_name.to_string(),
        rule: DerivationRule::Exact,
    }];

    match spec_name.strip_prefix(OUTER_MESSAGE_PREFIX) {
        Some(rest) if !rest.is_empty() => out.push(TypeCandidate {
            name: rest.to_string(),
            rule: DerivationRule::OuterPrefixStripped,
        }),
        _ => {
            if !spec_name.contains('.') {
                out.push(TypeCandidate {
                    name: format!("{OUTER_MESSAGE_PREFIX}{spec_name}"),
                    rule: DerivationRule::OuterPrefixAdded,
                });
            }
        }
    }

    // PromptArgument -> Prompt.Argument; every interior uppercase boundary
    // is a potential nesting point, rightmost first.
    let bytes = spec_name.as_bytes();
    for i in (1..bytes.len()).rev() {
        if bytes[i].is_ascii_uppercase() {
            out.push(TypeCandidate {
                name: format!("{}.{}", &spec_name[..i], &spec_name[i..]),
                rule: DerivationRule::NestedSplit,
            });
        }
    }

    match spec_name.strip_prefix(PRODUCT_PREFIX) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => {
            out.push(TypeCandidate {
                name: rest.to_string(),
                rule: DerivationRule::ProductPrefixStripped,
            })
        }
        _ => out.push(TypeCandidate {
            name: format!("{PRODUCT_PREFIX}{spec_name}"),
            rule: DerivationRule::ProductPrefixAdded,
        }),
    }

    out
}

/// Implementation-side method name for a spec method.
///
/// The override table is consulted first; otherwise the method splits into
/// `category/action`, the category is singularized, and the action verb
/// selects the name pattern.
pub fn method_impl_name(method: &str) -> String {
    if let Some((_, name)) = METHOD_NAME_OVERRIDES.iter().find(|(m, _)| *m == method) {
        return (*name).to_string();
    }
    structural_method_name(method)
}

/// The structural `category/action` rule, without the override table.
/// Methods that do not split into exactly two segments are returned as-is.
pub fn structural_method_name(method: &str) -> String {
    let mut parts = method.split('/');
    let (Some(category), Some(action), None) = (parts.next(), parts.next(), parts.next()) else {
        return method.to_string();
    };

    let singular = singularize(category);
    match action {
        "list" => format!("list{}", upper_first(category)),
        "get" | "read" | "call" => format!("{action}{}", upper_first(singular)),
        "subscribe" => format!("subscribeTo{}", upper_first(singular)),
        "unsubscribe" => format!("unsubscribeFrom{}", upper_first(singular)),
        _ => format!("{action}{}", upper_first(singular)),
    }
}

/// Send-method name for a notification type:
/// strip one trailing `Notification`, prefix with `send`.
pub fn send_method_name(notification_type: &str) -> String {
    let base = notification_type
        .strip_suffix("Notification")
        .unwrap_or(notification_type);
    if base.is_empty() {
        return "send".to_string();
    }
    format!("send{}", upper_first(base))
}

/// Client handler-registration name for a server-to-client method:
/// `with{Category}Handler`.
pub fn client_handler_name(method: &str) -> String {
    let category = method.split('/').next().unwrap_or(method);
    format!("with{}Handler", upper_first(category))
}

/// Module bucket for a method, from its category segment.
pub fn module_id_for_method(method: &str) -> String {
    match method.split('/').next() {
        // Normalized to plural for consistency with the other buckets.
        Some("completion") => "completions".to_string(),
        Some(category) if !category.is_empty() => category.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Module bucket for a notification, from its second path segment.
///
/// Fixed overrides: `initialized` belongs to lifecycle regardless of its
/// literal segment, and `message` notifications belong to logging.
pub fn module_id_for_notification(name: &str) -> String {
    let mut parts = name.split('/');
    let _ = parts.next();
    match parts.next() {
        Some("initialized") => "lifecycle".to_string(),
        Some("message") => "logging".to_string(),
        Some(category) if !category.is_empty() => category.to_string(),
        _ => "unknown".to_string(),
    }
}

/// Trim at most one trailing `s`. Irregular plurals belong in the method
/// override table, not here.
fn singularize(category: &str) -> &str {
    category.strip_suffix('s').unwrap_or(category)
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn method_names_follow_action_patterns() {
        assert_eq!(method_impl_name("resources/list"), "listResources");
        assert_eq!(method_impl_name("resources/read"), "readResource");
        assert_eq!(method_impl_name("resources/subscribe"), "subscribeToResource");
        assert_eq!(
            method_impl_name("resources/unsubscribe"),
            "unsubscribeFromResource"
        );
        assert_eq!(method_impl_name("prompts/get"), "getPrompt");
        assert_eq!(method_impl_name("tools/call"), "callTool");
        assert_eq!(method_impl_name("tools/list"), "listTools");
        // Default pattern: {action}{Singular}.
        assert_eq!(method_impl_name("tasks/cancel"), "cancelTask");
        assert_eq!(method_impl_name("roots/list"), "listRoots");
    }

    #[test]
    fn method_names_use_override_table() {
        assert_eq!(method_impl_name("sampling/createMessage"), "requestSampling");
        assert_eq!(method_impl_name("elicitation/create"), "requestElicitation");
        assert_eq!(method_impl_name("logging/setLevel"), "setLoggingLevel");
        assert_eq!(method_impl_name("completion/complete"), "complete");
        assert_eq!(
            method_impl_name("resources/templates/list"),
            "listResourceTemplates"
        );
        assert_eq!(method_impl_name("tasks/result"), "getTaskResult");
    }

    #[test]
    fn override_table_is_load_bearing() {
        // Every override must differ from what the structural rule would
        // produce; a derivable entry is dead weight.
        for (method, expected) in METHOD_NAME_OVERRIDES {
            assert_ne!(
                structural_method_name(method),
                *expected,
                "override for {method} is structurally derivable"
            );
        }
    }

    #[test]
    fn non_two_segment_methods_pass_through_structurally() {
        assert_eq!(structural_method_name("ping"), "ping");
        assert_eq!(
            structural_method_name("resources/templates/list"),
            "resources/templates/list"
        );
    }

    #[test]
    fn send_names_strip_trailing_notification() {
        assert_eq!(send_method_name("ProgressNotification"), "sendProgress");
        assert_eq!(send_method_name("CancelledNotification"), "sendCancelled");
        assert_eq!(
            send_method_name("ResourceListChangedNotification"),
            "sendResourceListChanged"
        );
        assert_eq!(
            send_method_name("LoggingMessageNotification"),
            "sendLoggingMessage"
        );
        // Only a trailing suffix is stripped.
        assert_eq!(send_method_name("NotificationFilter"), "sendNotificationFilter");
        assert_eq!(send_method_name("Notification"), "send");
    }

    #[test]
    fn handler_names_use_the_category_segment() {
        assert_eq!(
            client_handler_name("sampling/createMessage"),
            "withSamplingHandler"
        );
        assert_eq!(client_handler_name("elicitation/create"), "withElicitationHandler");
        assert_eq!(client_handler_name("roots/list"), "withRootsHandler");
    }

    #[test]
    fn module_ids_for_methods() {
        assert_eq!(module_id_for_method("resources/list"), "resources");
        assert_eq!(module_id_for_method("prompts/get"), "prompts");
        assert_eq!(module_id_for_method("completion/complete"), "completions");
        assert_eq!(module_id_for_method("logging/setLevel"), "logging");
    }

    #[test]
    fn module_ids_for_notifications() {
        assert_eq!(
            module_id_for_notification("notifications/initialized"),
            "lifecycle"
        );
        assert_eq!(module_id_for_notification("notifications/progress"), "progress");
        assert_eq!(
            module_id_for_notification("notifications/resources/list_changed"),
            "resources"
        );
        assert_eq!(module_id_for_notification("notifications/message"), "logging");
        assert_eq!(
            module_id_for_notification("notifications/tools/list_changed"),
            "tools"
        );
    }

    #[test]
    fn type_candidates_start_exact_and_tag_rules() {
        let candidates = impl_type_candidates("Resource");
        assert_eq!(candidates[0].name, "Resource");
        assert_eq!(candidates[0].rule, DerivationRule::Exact);
        assert!(candidates.contains(&TypeCandidate {
            name: "JSONRPCResource".to_string(),
            rule: DerivationRule::OuterPrefixAdded,
        }));
        assert!(candidates.contains(&TypeCandidate {
            name: "MCPResource".to_string(),
            rule: DerivationRule::ProductPrefixAdded,
        }));
    }

    #[test]
    fn type_candidates_strip_outer_prefix() {
        let candidates = impl_type_candidates("JSONRPCMessage");
        assert!(candidates.contains(&TypeCandidate {
            name: "Message".to_string(),
            rule: DerivationRule::OuterPrefixStripped,
        }));
    }

    #[test]
    fn type_candidates_split_nested_names_rightmost_first() {
        let candidates = impl_type_candidates("PromptArgument");
        let splits: Vec<&str> = candidates
            .iter()
            .filter(|c| c.rule == DerivationRule::NestedSplit)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(splits, vec!["Prompt.Argument"]);

        let candidates = impl_type_candidates("ResourceTemplateReference");
        let splits: Vec<&str> = candidates
            .iter()
            .filter(|c| c.rule == DerivationRule::NestedSplit)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            splits,
            vec!["ResourceTemplate.Reference", "Resource.TemplateReference"]
        );
    }

    #[test]
    fn type_candidates_handle_product_prefix_both_ways() {
        let candidates = impl_type_candidates("Error");
        assert!(candidates.contains(&TypeCandidate {
            name: "MCPError".to_string(),
            rule: DerivationRule::ProductPrefixAdded,
        }));

        let candidates = impl_type_candidates("MCPTask");
        assert!(candidates.contains(&TypeCandidate {
            name: "Task".to_string(),
            rule: DerivationRule::ProductPrefixStripped,
        }));
    }

    #[test]
    fn jsonrpc_error_case_lookup() {
        assert_eq!(jsonrpc_error_case("PARSE_ERROR"), Some("parseError"));
        assert_eq!(jsonrpc_error_case("METHOD_NOT_FOUND"), Some("methodNotFound"));
        assert_eq!(jsonrpc_error_case("REQUEST_TIMEOUT"), None);
    }

    proptest! {
        // Derivation is total and deterministic over simple method shapes.
        #[test]
        fn method_derivation_is_total(
            category in "[a-z]{1,12}",
            action in "[a-z]{1,12}",
        ) {
            let method = format!("{category}/{action}");
            let first = method_impl_name(&method);
            let second = method_impl_name(&method);
            prop_assert_eq!(&first, &second);
            prop_assert!(!first.is_empty());
            prop_assert!(first.starts_with(&action) || METHOD_NAME_OVERRIDES.iter().any(|(m, _)| *m == method)
                || action == "list" || action == "subscribe" || action == "unsubscribe");
        }

        #[test]
        fn type_candidates_always_lead_with_exact(name in "[A-Z][A-Za-z0-9]{0,20}") {
            let candidates = impl_type_candidates(&name);
            prop_assert_eq!(&candidates[0].name, &name);
            prop_assert_eq!(candidates[0].rule, DerivationRule::Exact);
        }
    }
}
