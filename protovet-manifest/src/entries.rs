//! Typed read-only views over the manifest document.
//!
//! The document stays a `toml_edit` tree so untouched nodes keep their
//! formatting; these views give the engines a stable, defaulted surface
//! without copying the tree into a parallel model.

use crate::ManifestDoc;
use toml_edit::{Item, TableLike};

/// Which side of a client/server capability list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilitySide {
    Client,
    Server,
}

impl CapabilitySide {
    pub fn key(self) -> &'static str {
        match self {
            CapabilitySide::Client => "client",
            CapabilitySide::Server => "server",
        }
    }

    /// Schema definition name for this side.
    pub fn cap_type(self) -> &'static str {
        match self {
            CapabilitySide::Client => "ClientCapabilities",
            CapabilitySide::Server => "ServerCapabilities",
        }
    }
}

/// A `verification = { status, notes }` block as read from the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    pub status: Option<String>,
    pub notes: String,
}

fn get_str<'a>(table: &'a dyn TableLike, key: &str) -> Option<&'a str> {
    table.get(key).and_then(Item::as_str)
}

/// A field that may be a single string or an array of strings.
fn get_strings(table: &dyn TableLike, key: &str) -> Vec<String> {
    match table.get(key) {
        Some(item) => {
            if let Some(s) = item.as_str() {
                vec![s.to_string()]
            } else if let Some(arr) = item.as_array() {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_string)
                    .collect()
            } else {
                vec![]
            }
        }
        None => vec![],
    }
}

fn get_verification(table: &dyn TableLike) -> Verification {
    let Some(v) = table.get("verification").and_then(Item::as_table_like) else {
        return Verification::default();
    };
    Verification {
        status: get_str(v, "status").map(str::to_string),
        notes: get_str(v, "notes").unwrap_or("").to_string(),
    }
}

fn is_todo(table: &dyn TableLike) -> bool {
    get_str(table, "implementation") == Some("todo")
}

/// One `[types.<SpecName>]` entry.
#[derive(Clone, Copy)]
pub struct TypeEntry<'a> {
    pub name: &'a str,
    table: &'a dyn TableLike,
}

impl<'a> TypeEntry<'a> {
    /// Declared implementation names; defaults to the spec name itself.
    pub fn impl_names(&self) -> Vec<String> {
        let names = get_strings(self.table, "impl");
        if names.is_empty() {
            vec![self.name.to_string()]
        } else {
            names
        }
    }

    pub fn files(&self) -> Vec<String> {
        get_strings(self.table, "file")
    }

    /// Alias under which the spec knows this type.
    pub fn spec_name(&self) -> Option<&'a str> {
        get_str(self.table, "spec_name")
    }

    pub fn is_todo(&self) -> bool {
        is_todo(self.table)
    }

    pub fn is_builtin(&self) -> bool {
        get_str(self.table, "kind") == Some("builtin")
    }

    pub fn verification(&self) -> Verification {
        get_verification(self.table)
    }
}

/// One `[[modules]]` entry.
#[derive(Clone, Copy)]
pub struct ModuleEntry<'a> {
    table: &'a dyn TableLike,
}

impl<'a> ModuleEntry<'a> {
    pub fn id(&self) -> &'a str {
        get_str(self.table, "id").unwrap_or("unknown")
    }

    pub fn impl_file(&self) -> Option<&'a str> {
        get_str(self.table, "impl_file")
    }

    pub fn is_todo(&self) -> bool {
        is_todo(self.table)
    }

    pub fn verification(&self) -> Verification {
        get_verification(self.table)
    }

    pub fn methods(&self) -> Vec<MethodEntry<'a>> {
        entry_tables(self.table, "methods")
            .into_iter()
            .map(|table| MethodEntry { table })
            .collect()
    }

    pub fn notifications(&self) -> Vec<NotificationEntry<'a>> {
        entry_tables(self.table, "notifications")
            .into_iter()
            .map(|table| NotificationEntry { table })
            .collect()
    }
}

fn entry_tables<'a>(table: &'a dyn TableLike, key: &str) -> Vec<&'a dyn TableLike> {
    match table.get(key) {
        Some(Item::ArrayOfTables(tables)) => {
            tables.iter().map(|t| t as &dyn TableLike).collect()
        }
        _ => vec![],
    }
}

/// One method entry inside a module.
#[derive(Clone, Copy)]
pub struct MethodEntry<'a> {
    table: &'a dyn TableLike,
}

impl<'a> MethodEntry<'a> {
    pub fn name(&self) -> Option<&'a str> {
        get_str(self.table, "name")
    }

    pub fn impl_name(&self) -> Option<&'a str> {
        get_str(self.table, "impl")
    }

    /// Display name for locations: the implementation name, else the
    /// method name.
    pub fn display_name(&self) -> &'a str {
        self.impl_name().or_else(|| self.name()).unwrap_or("unknown")
    }

    pub fn client_method(&self) -> Option<&'a str> {
        get_str(self.table, "client_method")
    }

    pub fn server_method(&self) -> Option<&'a str> {
        get_str(self.table, "server_method")
    }

    pub fn client_handler(&self) -> Option<&'a str> {
        get_str(self.table, "client_handler")
    }

    /// `handler_registration = { file, pattern }`.
    pub fn handler_registration(&self) -> Option<(&'a str, &'a str)> {
        let reg = self
            .table
            .get("handler_registration")
            .and_then(Item::as_table_like)?;
        Some((get_str(reg, "file")?, get_str(reg, "pattern")?))
    }

    pub fn is_todo(&self) -> bool {
        is_todo(self.table)
    }

    pub fn verification(&self) -> Verification {
        get_verification(self.table)
    }
}

/// One notification entry inside a module.
#[derive(Clone, Copy)]
pub struct NotificationEntry<'a> {
    table: &'a dyn TableLike,
}

impl<'a> NotificationEntry<'a> {
    pub fn name(&self) -> Option<&'a str> {
        get_str(self.table, "name")
    }

    pub fn impl_name(&self) -> Option<&'a str> {
        get_str(self.table, "impl")
    }

    pub fn display_name(&self) -> &'a str {
        self.impl_name().or_else(|| self.name()).unwrap_or("unknown")
    }

    pub fn sender(&self) -> Option<&'a str> {
        get_str(self.table, "sender")
    }

    pub fn server_send(&self) -> Option<&'a str> {
        get_str(self.table, "server_send")
    }

    pub fn client_send(&self) -> Option<&'a str> {
        get_str(self.table, "client_send")
    }

    pub fn is_todo(&self) -> bool {
        is_todo(self.table)
    }

    pub fn verification(&self) -> Verification {
        get_verification(self.table)
    }
}

/// One `[[enums]]` entry.
#[derive(Clone, Copy)]
pub struct EnumEntry<'a> {
    table: &'a dyn TableLike,
}

impl<'a> EnumEntry<'a> {
    pub fn name(&self) -> &'a str {
        get_str(self.table, "name").unwrap_or("unknown")
    }

    /// Declared implementation enum name; defaults to the spec name.
    pub fn impl_name(&self) -> &'a str {
        get_str(self.table, "impl").unwrap_or_else(|| self.name())
    }

    pub fn file(&self) -> Option<&'a str> {
        get_str(self.table, "file")
    }

    /// Spec-side case values tracked by this entry.
    pub fn spec_cases(&self) -> Vec<String> {
        let Some(cases) = self.table.get("cases").and_then(Item::as_array) else {
            return vec![];
        };
        cases
            .iter()
            .filter_map(|v| v.as_inline_table())
            .filter_map(|t| {
                t.get("spec")
                    .or_else(|| t.get("name"))
                    .and_then(|v| v.as_str())
            })
            .map(str::to_string)
            .collect()
    }

    pub fn verification(&self) -> Verification {
        get_verification(self.table)
    }
}

/// One `[[error_codes]]` entry.
#[derive(Clone, Copy)]
pub struct ErrorCodeEntry<'a> {
    table: &'a dyn TableLike,
}

impl<'a> ErrorCodeEntry<'a> {
    pub fn name(&self) -> &'a str {
        get_str(self.table, "name").unwrap_or("unknown")
    }

    pub fn code(&self) -> Option<i64> {
        self.table.get("code").and_then(Item::as_integer)
    }

    pub fn category(&self) -> Option<&'a str> {
        get_str(self.table, "category")
    }

    /// Dedicated implementation case, when the code has one.
    pub fn impl_case(&self) -> Option<&'a str> {
        get_str(self.table, "impl_case")
    }

    /// Documented generic fallback-handling strategy.
    pub fn generic_handling(&self) -> Option<&'a str> {
        get_str(self.table, "generic_handling")
    }

    pub fn verification(&self) -> Verification {
        get_verification(self.table)
    }
}

/// One `[[capabilities.client]]` / `[[capabilities.server]]` entry.
#[derive(Clone, Copy)]
pub struct CapabilityEntry<'a> {
    table: &'a dyn TableLike,
}

impl<'a> CapabilityEntry<'a> {
    pub fn property(&self) -> &'a str {
        get_str(self.table, "property").unwrap_or("unknown")
    }

    /// Declared implementation property; defaults to the spec property.
    pub fn impl_name(&self) -> &'a str {
        get_str(self.table, "impl").unwrap_or_else(|| self.property())
    }

    /// Nested sub-properties as (spec name, implementation name).
    pub fn nested(&self) -> Vec<(String, String)> {
        let Some(nested) = self.table.get("nested").and_then(Item::as_array) else {
            return vec![];
        };
        nested
            .iter()
            .filter_map(|v| v.as_inline_table())
            .filter_map(|t| {
                let name = t.get("name").and_then(|v| v.as_str())?;
                let impl_name = t
                    .get("impl")
                    .and_then(|v| v.as_str())
                    .unwrap_or(name);
                Some((name.to_string(), impl_name.to_string()))
            })
            .collect()
    }

    pub fn verification(&self) -> Verification {
        get_verification(self.table)
    }
}

/// One `[[deprecated]]` entry.
#[derive(Clone, Copy)]
pub struct DeprecatedEntry<'a> {
    table: &'a dyn TableLike,
}

impl<'a> DeprecatedEntry<'a> {
    pub fn name(&self) -> &'a str {
        get_str(self.table, "name").unwrap_or("unknown")
    }

    pub fn replacement(&self) -> &'a str {
        get_str(self.table, "replacement").unwrap_or("")
    }

    pub fn notes(&self) -> &'a str {
        get_str(self.table, "notes").unwrap_or("")
    }
}

impl ManifestDoc {
    pub fn types(&self) -> Vec<TypeEntry<'_>> {
        let Some(table) = self.doc().get("types").and_then(Item::as_table_like) else {
            return vec![];
        };
        table
            .iter()
            .filter_map(|(name, item)| {
                item.as_table_like().map(|t| TypeEntry { name, table: t })
            })
            .collect()
    }

    /// Every name a type entry answers to: its key plus any `spec_name`
    /// alias.
    pub fn type_names_with_aliases(&self) -> std::collections::BTreeSet<String> {
        let mut out = std::collections::BTreeSet::new();
        for entry in self.types() {
            out.insert(entry.name.to_string());
            if let Some(alias) = entry.spec_name() {
                out.insert(alias.to_string());
            }
        }
        out
    }

    pub fn modules(&self) -> Vec<ModuleEntry<'_>> {
        let Some(modules) = self.doc().get("modules").and_then(Item::as_array_of_tables) else {
            return vec![];
        };
        modules
            .iter()
            .map(|t| ModuleEntry {
                table: t as &dyn TableLike,
            })
            .collect()
    }

    pub fn method_names(&self) -> std::collections::BTreeSet<String> {
        self.modules()
            .iter()
            .flat_map(|m| m.methods())
            .filter_map(|m| m.name().map(str::to_string))
            .collect()
    }

    pub fn notification_names(&self) -> std::collections::BTreeSet<String> {
        self.modules()
            .iter()
            .flat_map(|m| m.notifications())
            .filter_map(|n| n.name().map(str::to_string))
            .collect()
    }

    pub fn enums(&self) -> Vec<EnumEntry<'_>> {
        let Some(enums) = self.doc().get("enums").and_then(Item::as_array_of_tables) else {
            return vec![];
        };
        enums
            .iter()
            .map(|t| EnumEntry {
                table: t as &dyn TableLike,
            })
            .collect()
    }

    pub fn error_codes(&self) -> Vec<ErrorCodeEntry<'_>> {
        let Some(codes) = self
            .doc()
            .get("error_codes")
            .and_then(Item::as_array_of_tables)
        else {
            return vec![];
        };
        codes
            .iter()
            .map(|t| ErrorCodeEntry {
                table: t as &dyn TableLike,
            })
            .collect()
    }

    pub fn capabilities(&self, side: CapabilitySide) -> Vec<CapabilityEntry<'_>> {
        let Some(caps) = self
            .doc()
            .get("capabilities")
            .and_then(Item::as_table_like)
            .and_then(|t| t.get(side.key()))
            .and_then(Item::as_array_of_tables)
        else {
            return vec![];
        };
        caps.iter()
            .map(|t| CapabilityEntry {
                table: t as &dyn TableLike,
            })
            .collect()
    }

    pub fn deprecated(&self) -> Vec<DeprecatedEntry<'_>> {
        let Some(entries) = self
            .doc()
            .get("deprecated")
            .and_then(Item::as_array_of_tables)
        else {
            return vec![];
        };
        entries
            .iter()
            .map(|t| DeprecatedEntry {
                table: t as &dyn TableLike,
            })
            .collect()
    }

    pub fn deprecated_names(&self) -> std::collections::BTreeSet<String> {
        self.deprecated()
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }
}
