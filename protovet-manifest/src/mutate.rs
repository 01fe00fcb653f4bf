//! Additive mutators for the manifest document.
//!
//! Sync never rewrites a populated field: new entries are appended, missing
//! fields are filled in, and everything else keeps its exact formatting.

use crate::ManifestDoc;
use crate::entries::CapabilitySide;
use toml_edit::{Array, ArrayOfTables, InlineTable, Item, Table, Value, value};

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct NewType {
    pub impl_name: String,
    pub file: String,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct NewMethod {
    pub name: String,
    pub impl_name: String,
    pub client_method: Option<String>,
    pub server_method: Option<String>,
    pub client_handler: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub name: String,
    pub impl_name: String,
    pub sender: String,
    pub server_send: Option<String>,
    pub client_send: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewErrorCode {
    pub name: String,
    pub code: i64,
    pub category: String,
    pub impl_case: Option<String>,
    pub generic_handling: Option<String>,
}

fn verification_item(notes: &str) -> Item {
    let mut t = InlineTable::new();
    t.insert("status", "pending".into());
    t.insert("notes", notes.into());
    value(t)
}

fn case_pair(spec: &str) -> InlineTable {
    let mut t = InlineTable::new();
    t.insert("spec", spec.into());
    t.insert("impl", spec.into());
    t
}

fn nested_pair(name: &str) -> InlineTable {
    let mut t = InlineTable::new();
    t.insert("name", name.into());
    t.insert("impl", name.into());
    t
}

fn ensure_array_of_tables<'a>(table: &'a mut Table, key: &str) -> &'a mut ArrayOfTables {
    if !matches!(table.get(key), Some(Item::ArrayOfTables(_))) {
        table.insert(key, Item::ArrayOfTables(ArrayOfTables::new()));
    }
    match table.get_mut(key) {
        Some(Item::ArrayOfTables(tables)) => tables,
        _ => unreachable!("just ensured an array of tables at {key}"),
    }
}

fn ensure_child_table<'a>(table: &'a mut Table, key: &str) -> &'a mut Table {
    if !matches!(table.get(key), Some(Item::Table(_))) {
        let mut child = Table::new();
        child.set_implicit(true);
        table.insert(key, Item::Table(child));
    }
    match table.get_mut(key) {
        Some(Item::Table(child)) => child,
        _ => unreachable!("just ensured a table at {key}"),
    }
}

/// Fill one scalar field if and only if it is currently absent.
/// Returns true when the field was added.
pub fn fill_missing_field(entry: &mut Table, key: &str, val: &str) -> bool {
    if entry.contains_key(key) {
        return false;
    }
    entry.insert(key, value(val));
    true
}

impl ManifestDoc {
    /// Append a `[types.<SpecName>]` entry.
    pub fn insert_type(&mut self, spec_name: &str, new: &NewType) {
        let types = ensure_child_table(self.doc_mut().as_table_mut(), "types");
        let mut entry = Table::new();
        entry.insert("impl", value(new.impl_name.as_str()));
        entry.insert("file", value(new.file.as_str()));
        entry.insert("verification", verification_item(&new.notes));
        types.insert(spec_name, Item::Table(entry));
    }

    /// Find a module by id, creating a placeholder module when absent.
    /// The placeholder's `impl_file` points at a TODO path a human has to
    /// fill in, which keeps the gap loud in the next verification run.
    pub fn find_or_create_module(&mut self, id: &str) -> &mut Table {
        let modules = ensure_array_of_tables(self.doc_mut().as_table_mut(), "modules");
        let found = modules
            .iter()
            .position(|t| t.get("id").and_then(Item::as_str) == Some(id));
        if let Some(idx) = found {
            return modules.get_mut(idx).expect("position is in range");
        }

        let mut module = Table::new();
        module.insert("id", value(id));
        module.insert("category", value("feature"));
        module.insert("description", value(format!("Auto-generated module for {id}")));
        module.insert(
            "impl_file",
            value(format!("Sources/TODO/{}.swift", upper_first(id))),
        );
        module.insert("verification", verification_item("Auto-added by sync"));
        modules.push(module);

        let last = modules.len() - 1;
        modules.get_mut(last).expect("just pushed")
    }

    pub fn append_method(&mut self, module_id: &str, new: &NewMethod) {
        let module = self.find_or_create_module(module_id);
        let methods = ensure_array_of_tables(module, "methods");

        let mut entry = Table::new();
        entry.insert("name", value(new.name.as_str()));
        entry.insert("impl", value(new.impl_name.as_str()));
        if let Some(m) = &new.client_method {
            entry.insert("client_method", value(m.as_str()));
        }
        if let Some(m) = &new.server_method {
            entry.insert("server_method", value(m.as_str()));
        }
        if let Some(h) = &new.client_handler {
            entry.insert("client_handler", value(h.as_str()));
        }
        entry.insert("verification", verification_item("Auto-added by sync"));
        methods.push(entry);
    }

    pub fn append_notification(&mut self, module_id: &str, new: &NewNotification) {
        let module = self.find_or_create_module(module_id);
        let notifications = ensure_array_of_tables(module, "notifications");

        let mut entry = Table::new();
        entry.insert("name", value(new.name.as_str()));
        entry.insert("impl", value(new.impl_name.as_str()));
        entry.insert("sender", value(new.sender.as_str()));
        if let Some(m) = &new.server_send {
            entry.insert("server_send", value(m.as_str()));
        }
        if let Some(m) = &new.client_send {
            entry.insert("client_send", value(m.as_str()));
        }
        entry.insert("verification", verification_item("Auto-added by sync"));
        notifications.push(entry);
    }

    pub fn method_entry_mut(&mut self, name: &str) -> Option<&mut Table> {
        let modules = self.doc_mut().get_mut("modules")?.as_array_of_tables_mut()?;
        for module in modules.iter_mut() {
            if let Some(methods) = module
                .get_mut("methods")
                .and_then(Item::as_array_of_tables_mut)
            {
                for entry in methods.iter_mut() {
                    if entry.get("name").and_then(Item::as_str) == Some(name) {
                        return Some(entry);
                    }
                }
            }
        }
        None
    }

    pub fn notification_entry_mut(&mut self, name: &str) -> Option<&mut Table> {
        let modules = self.doc_mut().get_mut("modules")?.as_array_of_tables_mut()?;
        for module in modules.iter_mut() {
            if let Some(notifications) = module
                .get_mut("notifications")
                .and_then(Item::as_array_of_tables_mut)
            {
                for entry in notifications.iter_mut() {
                    if entry.get("name").and_then(Item::as_str) == Some(name) {
                        return Some(entry);
                    }
                }
            }
        }
        None
    }

    /// Append a `[[enums]]` entry with every spec case pre-populated and
    /// the file left blank for human fill-in.
    pub fn append_enum(&mut self, name: &str, cases: &[String]) {
        let enums = ensure_array_of_tables(self.doc_mut().as_table_mut(), "enums");
        let mut entry = Table::new();
        entry.insert("name", value(name));
        entry.insert("impl", value(name));
        entry.insert("file", value(""));
        let mut arr = Array::new();
        for case in cases {
            arr.push(case_pair(case));
        }
        entry.insert("cases", value(arr));
        entry.insert("verification", verification_item(""));
        enums.push(entry);
    }

    pub fn enum_entry_mut(&mut self, name: &str) -> Option<&mut Table> {
        let enums = self
            .doc_mut()
            .get_mut("enums")?
            .as_array_of_tables_mut()?;
        enums
            .iter_mut()
            .find(|t| t.get("name").and_then(Item::as_str) == Some(name))
    }

    pub fn append_error_code(&mut self, new: &NewErrorCode) {
        let codes = ensure_array_of_tables(self.doc_mut().as_table_mut(), "error_codes");
        let mut entry = Table::new();
        entry.insert("name", value(new.name.as_str()));
        entry.insert("code", value(new.code));
        entry.insert("category", value(new.category.as_str()));
        if let Some(case) = &new.impl_case {
            entry.insert("impl_case", value(case.as_str()));
        }
        if let Some(handling) = &new.generic_handling {
            entry.insert("generic_handling", value(handling.as_str()));
        }
        entry.insert("verification", verification_item(""));
        codes.push(entry);
    }

    /// Append a capability entry with identical spec/impl names and every
    /// nested sub-property listed.
    pub fn append_capability(&mut self, side: CapabilitySide, property: &str, nested: &[String]) {
        let capabilities = ensure_child_table(self.doc_mut().as_table_mut(), "capabilities");
        let list = ensure_array_of_tables(capabilities, side.key());

        let mut entry = Table::new();
        entry.insert("property", value(property));
        entry.insert("impl", value(property));
        let mut arr = Array::new();
        for name in nested {
            arr.push(nested_pair(name));
        }
        entry.insert("nested", value(arr));
        entry.insert("verification", verification_item(""));
        list.push(entry);
    }

    pub fn capability_entry_mut(
        &mut self,
        side: CapabilitySide,
        property: &str,
    ) -> Option<&mut Table> {
        let list = self
            .doc_mut()
            .get_mut("capabilities")?
            .as_table_like_mut()?
            .get_mut(side.key())?
            .as_array_of_tables_mut()?;
        list.iter_mut()
            .find(|t| t.get("property").and_then(Item::as_str) == Some(property))
    }

    pub fn append_deprecated(&mut self, name: &str, notes: &str) {
        let entries = ensure_array_of_tables(self.doc_mut().as_table_mut(), "deprecated");
        let mut entry = Table::new();
        entry.insert("name", value(name));
        // Replacement is a human decision; never auto-filled.
        entry.insert("replacement", value(""));
        entry.insert("notes", value(notes));
        entries.push(entry);
    }
}

/// Append a `{ spec, impl }` pair to an enum entry's case list.
pub fn append_enum_case(entry: &mut Table, case: &str) {
    if !matches!(entry.get("cases"), Some(Item::Value(Value::Array(_)))) {
        entry.insert("cases", value(Array::new()));
    }
    if let Some(arr) = entry.get_mut("cases").and_then(Item::as_array_mut) {
        arr.push(case_pair(case));
    }
}

/// Append a `{ name, impl }` pair to a capability entry's nested list.
pub fn append_capability_nested(entry: &mut Table, name: &str) {
    if !matches!(entry.get("nested"), Some(Item::Value(Value::Array(_)))) {
        entry.insert("nested", value(Array::new()));
    }
    if let Some(arr) = entry.get_mut("nested").and_then(Item::as_array_mut) {
        arr.push(nested_pair(name));
    }
}
