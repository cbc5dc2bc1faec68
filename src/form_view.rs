//! The rendered form as seen by the binding layer.
//!
//! A host (browser shell, TUI, test) implements [`FormView`] over its own
//! widgets. [`VirtualForm`] is a complete in-memory implementation used by
//! the CLI and the tests.

use std::collections::BTreeMap;

use crate::record::{AddressPart, ListName, ScalarField};
use crate::session::DocumentType;

/// Identity of one rendered entry inside a list container. Stable across
/// reorders; never reused within a form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(pub u64);

/// The value an input event carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlValue {
    Text(String),
    /// Checkbox state.
    Checked(bool),
    /// Multi-select state.
    Selected(Vec<String>),
}

impl ControlValue {
    pub fn text(value: impl Into<String>) -> Self {
        ControlValue::Text(value.into())
    }
}

/// Standard control ids for a document type, e.g. `cv-name`,
/// `resume-address-city`, `cv-skill-rust`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlIds {
    prefix: &'static str,
}

impl ControlIds {
    pub fn new(doc_type: DocumentType) -> Self {
        Self {
            prefix: doc_type.control_prefix(),
        }
    }

    pub fn scalar(&self, field: ScalarField) -> String {
        format!("{}-{}", self.prefix, field.key())
    }

    pub fn address(&self, part: AddressPart) -> String {
        format!("{}-address-{}", self.prefix, part.key())
    }

    pub fn skills(&self) -> String {
        format!("{}-skills", self.prefix)
    }

    pub fn skill_tag(&self, tag: &str) -> String {
        let slug: String = tag
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
            .collect();
        format!("{}-skill-{}", self.prefix, slug)
    }

    pub fn container(&self, list: ListName) -> String {
        format!("{}-{}-container", self.prefix, list.key())
    }
}

pub trait FormView {
    fn has_control(&self, id: &str) -> bool;

    fn value(&self, id: &str) -> Option<ControlValue>;

    /// Write a control's value. Returns false when the control is missing.
    fn set_value(&mut self, id: &str, value: ControlValue) -> bool;

    fn has_container(&self, list: ListName) -> bool;

    /// Render a new, empty entry at the end of a container.
    fn append_entry(&mut self, list: ListName) -> Option<EntryKey>;

    fn remove_entry(&mut self, list: ListName, key: EntryKey) -> bool;

    /// Entry keys in on-screen order.
    fn entry_keys(&self, list: ListName) -> Vec<EntryKey>;

    fn entry_value(&self, list: ListName, key: EntryKey, field: &str) -> Option<String>;

    fn set_entry_value(&mut self, list: ListName, key: EntryKey, field: &str, value: &str) -> bool;

    /// Move a rendered entry so it ends up at position `to`.
    fn move_entry(&mut self, list: ListName, key: EntryKey, to: usize) -> bool;

    /// Position of an entry in on-screen order.
    fn entry_index(&self, list: ListName, key: EntryKey) -> Option<usize> {
        self.entry_keys(list).iter().position(|k| *k == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct VirtualEntry {
    key: EntryKey,
    fields: BTreeMap<String, String>,
}

/// In-memory form.
#[derive(Debug, Clone, Default)]
pub struct VirtualForm {
    controls: BTreeMap<String, ControlValue>,
    containers: BTreeMap<ListName, Vec<VirtualEntry>>,
    next_key: u64,
}

impl VirtualForm {
    /// An empty form without any controls.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard form for a document type: scalar, address and skills
    /// controls plus a container for every list that type shows.
    pub fn for_document(doc_type: DocumentType) -> Self {
        let ids = ControlIds::new(doc_type);
        let mut form = Self::new();
        for field in ScalarField::ALL {
            form.add_control(&ids.scalar(field), ControlValue::text(""));
        }
        for part in AddressPart::ALL {
            form.add_control(&ids.address(part), ControlValue::text(""));
        }
        form.add_control(&ids.skills(), ControlValue::text(""));
        for list in lists_for(doc_type) {
            form.add_container(*list);
        }
        form
    }

    pub fn add_control(&mut self, id: &str, initial: ControlValue) {
        self.controls.insert(id.to_string(), initial);
    }

    pub fn remove_control(&mut self, id: &str) {
        self.controls.remove(id);
    }

    pub fn add_container(&mut self, list: ListName) {
        self.containers.entry(list).or_default();
    }

    pub fn control_ids(&self) -> impl Iterator<Item = &str> {
        self.controls.keys().map(String::as_str)
    }

    fn entries_mut(&mut self, list: ListName, key: EntryKey) -> Option<&mut VirtualEntry> {
        self.containers.get_mut(&list)?.iter_mut().find(|e| e.key == key)
    }
}

/// Lists that have an editor on a document type's form.
pub fn lists_for(doc_type: DocumentType) -> &'static [ListName] {
    match doc_type {
        DocumentType::Cv => &ListName::ALL,
        DocumentType::Resume => &[
            ListName::Work,
            ListName::Projects,
            ListName::Education,
            ListName::Certifications,
            ListName::References,
        ],
    }
}

impl FormView for VirtualForm {
    fn has_control(&self, id: &str) -> bool {
        self.controls.contains_key(id)
    }

    fn value(&self, id: &str) -> Option<ControlValue> {
        self.controls.get(id).cloned()
    }

    fn set_value(&mut self, id: &str, value: ControlValue) -> bool {
        match self.controls.get_mut(id) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn has_container(&self, list: ListName) -> bool {
        self.containers.contains_key(&list)
    }

    fn append_entry(&mut self, list: ListName) -> Option<EntryKey> {
        let key = EntryKey(self.next_key);
        let container = self.containers.get_mut(&list)?;
        self.next_key += 1;
        container.push(VirtualEntry {
            key,
            fields: list.fields().iter().map(|f| (f.to_string(), String::new())).collect(),
        });
        Some(key)
    }

    fn remove_entry(&mut self, list: ListName, key: EntryKey) -> bool {
        let Some(container) = self.containers.get_mut(&list) else {
            return false;
        };
        let before = container.len();
        container.retain(|e| e.key != key);
        container.len() != before
    }

    fn entry_keys(&self, list: ListName) -> Vec<EntryKey> {
        self.containers
            .get(&list)
            .map(|c| c.iter().map(|e| e.key).collect())
            .unwrap_or_default()
    }

    fn entry_value(&self, list: ListName, key: EntryKey, field: &str) -> Option<String> {
        self.containers
            .get(&list)?
            .iter()
            .find(|e| e.key == key)?
            .fields
            .get(field)
            .cloned()
    }

    fn set_entry_value(&mut self, list: ListName, key: EntryKey, field: &str, value: &str) -> bool {
        match self.entries_mut(list, key).and_then(|e| e.fields.get_mut(field)) {
            Some(slot) => {
                *slot = value.to_string();
                true
            }
            None => false,
        }
    }

    fn move_entry(&mut self, list: ListName, key: EntryKey, to: usize) -> bool {
        let Some(container) = self.containers.get_mut(&list) else {
            return false;
        };
        let Some(from) = container.iter().position(|e| e.key == key) else {
            return false;
        };
        if to >= container.len() {
            return false;
        }
        let entry = container.remove(from);
        container.insert(to, entry);
        true
    }
}
