//! Form binding – keeps the [`FieldStore`] and a [`FormView`] in step.
//!
//! Scalar, address and skills controls are bound by id. Entry controls are
//! addressed by their container and [`EntryKey`]; the entry's index in the
//! store is its current on-screen position, so reorders never leave stale
//! index bindings behind.

use std::collections::BTreeMap;

use crate::form_view::{ControlIds, ControlValue, EntryKey, FormView};
use crate::record::*;
use crate::services::ConfirmationDialog;
use crate::session::DocumentType;
use crate::store::{Change, FieldStore};

/// Where a bound control's value lives in the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    Scalar(ScalarField),
    Address(AddressPart),
    Skills,
    /// A checkbox that selects one skill tag.
    SkillTag(String),
}

/// The control an input event came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    Control(String),
    Entry {
        list: ListName,
        key: EntryKey,
        field: String,
    },
}

pub const REMOVE_ENTRY_TITLE: &str = "Remove Entry";
pub const REMOVE_ENTRY_MESSAGE: &str = "Are you sure you want to remove this entry?";

#[derive(Debug, Clone)]
pub struct FormBinding {
    ids: ControlIds,
    bindings: BTreeMap<String, FieldPath>,
}

impl FormBinding {
    pub fn new(doc_type: DocumentType) -> Self {
        Self {
            ids: ControlIds::new(doc_type),
            bindings: BTreeMap::new(),
        }
    }

    pub fn ids(&self) -> ControlIds {
        self.ids
    }

    /// Register `control_id` for `path`. A missing control is skipped.
    pub fn bind(&mut self, path: FieldPath, control_id: &str, view: &dyn FormView) -> bool {
        if !view.has_control(control_id) {
            log::debug!("no control '{control_id}' for {path:?}; skipping");
            return false;
        }
        self.bindings.insert(control_id.to_string(), path);
        true
    }

    /// Bind every standard control the view has, plus one checkbox per
    /// entry in `skill_tags`. Returns the number of bound controls.
    pub fn bind_standard(&mut self, view: &dyn FormView, skill_tags: &[String]) -> usize {
        let mut paths: Vec<(String, FieldPath)> = Vec::new();
        for field in ScalarField::ALL {
            paths.push((self.ids.scalar(field), FieldPath::Scalar(field)));
        }
        for part in AddressPart::ALL {
            paths.push((self.ids.address(part), FieldPath::Address(part)));
        }
        paths.push((self.ids.skills(), FieldPath::Skills));
        for tag in skill_tags {
            paths.push((self.ids.skill_tag(tag), FieldPath::SkillTag(tag.clone())));
        }
        paths
            .into_iter()
            .filter(|(id, path)| self.bind(path.clone(), id, view))
            .count()
    }

    pub fn path_for(&self, control_id: &str) -> Option<&FieldPath> {
        self.bindings.get(control_id)
    }

    pub fn bound_count(&self) -> usize {
        self.bindings.len()
    }

    /// Apply an input event to the store.
    pub fn handle_input(
        &self,
        target: &InputTarget,
        value: ControlValue,
        store: &mut FieldStore,
        view: &dyn FormView,
    ) -> Option<Change> {
        match target {
            InputTarget::Control(id) => {
                let Some(path) = self.bindings.get(id) else {
                    log::debug!("input on unbound control '{id}' ignored");
                    return None;
                };
                apply_control(path, value, store)
            }
            InputTarget::Entry { list, key, field } => {
                let Some(index) = view.entry_index(*list, *key) else {
                    log::debug!("input on stale {list} entry {key:?} ignored");
                    return None;
                };
                match value {
                    ControlValue::Text(text) => store.set_entry_field(*list, index, field, text),
                    other => {
                        log::debug!("unexpected value {other:?} for {list}.{field}");
                        None
                    }
                }
            }
        }
    }

    /// Append an entry to the store and render its controls. `None`, with
    /// nothing changed, when the view has no container for `list`.
    pub fn add_entry(
        &self,
        list: ListName,
        initial: Option<&BTreeMap<String, String>>,
        store: &mut FieldStore,
        view: &mut dyn FormView,
    ) -> Option<Change> {
        if !view.has_container(list) {
            log::warn!("no container for {list}; entry not added");
            return None;
        }
        let key = view.append_entry(list)?;
        let change = store.add_entry(list, initial);
        if let Change::EntryAdded { index, .. } = change {
            fill_entry(view, store.record(), list, index, key);
        }
        Some(change)
    }

    /// Remove (or, for the last entry, clear) the entry at `index`, after
    /// asking `dialog` when one is given.
    pub fn remove_entry(
        &self,
        list: ListName,
        index: usize,
        store: &mut FieldStore,
        view: &mut dyn FormView,
        dialog: Option<&dyn ConfirmationDialog>,
    ) -> Option<Change> {
        if index >= store.record().list_len(list) {
            return None;
        }
        if let Some(dialog) = dialog {
            if !dialog.confirm(REMOVE_ENTRY_MESSAGE, REMOVE_ENTRY_TITLE) {
                log::debug!("removal of {list}[{index}] cancelled");
                return None;
            }
        }
        let change = store.remove_entry(list, index)?;
        let key = view.entry_keys(list).get(index).copied();
        if let (Change::EntryRemoved { removal, .. }, Some(key)) = (&change, key) {
            match removal {
                Removal::Removed => {
                    view.remove_entry(list, key);
                }
                Removal::Cleared => fill_entry(view, store.record(), list, index, key),
            }
        }
        Some(change)
    }

    /// Move an entry in both the store and the view.
    pub fn reorder(
        &self,
        list: ListName,
        from: usize,
        to: usize,
        store: &mut FieldStore,
        view: &mut dyn FormView,
    ) -> Option<Change> {
        let change = store.move_entry(list, from, to)?;
        if let Some(key) = view.entry_keys(list).get(from).copied() {
            view.move_entry(list, key, to);
        }
        Some(change)
    }

    /// "Clear all": a single blank entry remains.
    pub fn clear_list(&self, list: ListName, store: &mut FieldStore, view: &mut dyn FormView) -> Change {
        let change = store.clear_list(list);
        rebuild_container(view, store.record(), list);
        change
    }

    /// Write the whole record into the view and rebuild every container.
    pub fn populate(&self, view: &mut dyn FormView, record: &FieldRecord) {
        for (id, path) in &self.bindings {
            let value = match path {
                FieldPath::Scalar(field) => ControlValue::text(record.scalar(*field)),
                FieldPath::Address(part) => ControlValue::text(record.address.part(*part)),
                FieldPath::Skills => skills_value(&record.skills, view.value(id)),
                FieldPath::SkillTag(tag) => ControlValue::Checked(record.skills.contains(tag)),
            };
            view.set_value(id, value);
        }
        for list in ListName::ALL {
            rebuild_container(view, record, list);
        }
    }
}

fn apply_control(path: &FieldPath, value: ControlValue, store: &mut FieldStore) -> Option<Change> {
    match (path, value) {
        (FieldPath::Scalar(field), ControlValue::Text(text)) => Some(store.set_scalar(*field, text)),
        (FieldPath::Address(part), ControlValue::Text(text)) => Some(store.set_address_part(*part, text)),
        (FieldPath::Skills, ControlValue::Text(text)) => Some(store.set_skills_text(text)),
        (FieldPath::Skills, ControlValue::Selected(tags)) => Some(store.set_skill_tags(tags)),
        (FieldPath::SkillTag(tag), ControlValue::Checked(on)) => Some(store.toggle_skill(tag, on)),
        (path, value) => {
            log::debug!("value {value:?} does not fit {path:?}");
            None
        }
    }
}

/// Free-text controls get a comma list; multi-selects get the tags.
fn skills_value(skills: &Skills, current: Option<ControlValue>) -> ControlValue {
    match (skills, current) {
        (Skills::Text(text), _) => ControlValue::text(text.clone()),
        (Skills::Tags(tags), Some(ControlValue::Selected(_))) => ControlValue::Selected(tags.clone()),
        (Skills::Tags(tags), _) => ControlValue::text(tags.join(", ")),
    }
}

fn fill_entry(view: &mut dyn FormView, record: &FieldRecord, list: ListName, index: usize, key: EntryKey) {
    if let Some(values) = record.entry_values(list, index) {
        for (field, value) in values {
            view.set_entry_value(list, key, field, &value);
        }
    }
}

fn rebuild_container(view: &mut dyn FormView, record: &FieldRecord, list: ListName) {
    if !view.has_container(list) {
        return;
    }
    for key in view.entry_keys(list) {
        view.remove_entry(list, key);
    }
    for index in 0..record.list_len(list) {
        if let Some(key) = view.append_entry(list) {
            fill_entry(view, record, list, index, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form_view::VirtualForm;
    use crate::services::FixedAnswer;

    fn setup() -> (FormBinding, FieldStore, VirtualForm) {
        let mut view = VirtualForm::for_document(DocumentType::Cv);
        let mut binding = FormBinding::new(DocumentType::Cv);
        binding.bind_standard(&view, &[]);
        let store = FieldStore::default();
        binding.populate(&mut view, store.record());
        (binding, store, view)
    }

    fn titles(store: &FieldStore) -> Vec<String> {
        store.record().work.iter().map(|w| w.title.clone()).collect()
    }

    fn view_titles(view: &VirtualForm) -> Vec<String> {
        view.entry_keys(ListName::Work)
            .into_iter()
            .map(|k| view.entry_value(ListName::Work, k, "title").unwrap_or_default())
            .collect()
    }

    #[test]
    fn binding_missing_control_is_noop() {
        let view = VirtualForm::new();
        let mut binding = FormBinding::new(DocumentType::Cv);
        assert!(!binding.bind(FieldPath::Scalar(ScalarField::Name), "cv-name", &view));
        assert_eq!(binding.bind_standard(&view, &["Rust".into()]), 0);
    }

    #[test]
    fn input_updates_store() {
        let (binding, mut store, view) = setup();
        let target = InputTarget::Control("cv-name".into());
        let change = binding.handle_input(&target, ControlValue::text("Ada"), &mut store, &view);
        assert_eq!(change, Some(Change::Scalar(ScalarField::Name)));
        assert_eq!(store.record().name, "Ada");

        let unbound = InputTarget::Control("cv-nickname".into());
        assert!(binding.handle_input(&unbound, ControlValue::text("x"), &mut store, &view).is_none());
    }

    #[test]
    fn entry_input_follows_screen_position() {
        let (binding, mut store, mut view) = setup();
        binding.add_entry(ListName::Work, None, &mut store, &mut view);
        let keys = view.entry_keys(ListName::Work);
        let target = InputTarget::Entry {
            list: ListName::Work,
            key: keys[1],
            field: "title".into(),
        };
        binding.handle_input(&target, ControlValue::text("Second"), &mut store, &view);
        assert_eq!(titles(&store), vec!["", "Second"]);
    }

    #[test]
    fn add_entry_renders_initial_values() {
        let (binding, mut store, mut view) = setup();
        let mut initial = BTreeMap::new();
        initial.insert("title".to_string(), "Imported".to_string());
        binding.add_entry(ListName::Work, Some(&initial), &mut store, &mut view);
        assert_eq!(view_titles(&view), vec!["", "Imported"]);
    }

    #[test]
    fn refused_removal_changes_nothing() {
        let (binding, mut store, mut view) = setup();
        binding.add_entry(ListName::Work, None, &mut store, &mut view);
        let before = store.revision();
        let out = binding.remove_entry(ListName::Work, 0, &mut store, &mut view, Some(&FixedAnswer(false)));
        assert!(out.is_none());
        assert_eq!(store.revision(), before);
        assert_eq!(view.entry_keys(ListName::Work).len(), 2);
    }

    #[test]
    fn removing_sole_entry_clears_view_too() {
        let (binding, mut store, mut view) = setup();
        let key = view.entry_keys(ListName::Work)[0];
        view.set_entry_value(ListName::Work, key, "title", "Dev");
        store.set_entry_field(ListName::Work, 0, "title", "Dev");
        binding.remove_entry(ListName::Work, 0, &mut store, &mut view, None);
        assert_eq!(view.entry_keys(ListName::Work), vec![key]);
        assert_eq!(view.entry_value(ListName::Work, key, "title").as_deref(), Some(""));
        assert!(store.record().work.is_blank());
    }

    #[test]
    fn reorder_keeps_store_and_view_aligned() {
        let (binding, mut store, mut view) = setup();
        for title in ["B", "C"] {
            let mut initial = BTreeMap::new();
            initial.insert("title".to_string(), title.to_string());
            binding.add_entry(ListName::Work, Some(&initial), &mut store, &mut view);
        }
        store.set_entry_field(ListName::Work, 0, "title", "A");
        let k0 = view.entry_keys(ListName::Work)[0];
        view.set_entry_value(ListName::Work, k0, "title", "A");

        binding.reorder(ListName::Work, 0, 2, &mut store, &mut view).unwrap();
        assert_eq!(titles(&store), vec!["B", "C", "A"]);
        assert_eq!(view_titles(&view), titles(&store));
        assert!(binding.reorder(ListName::Work, 0, 9, &mut store, &mut view).is_none());
    }

    #[test]
    fn populate_writes_skills_by_control_kind() {
        let mut view = VirtualForm::for_document(DocumentType::Cv);
        view.add_control("cv-skill-rust", ControlValue::Checked(false));
        let mut binding = FormBinding::new(DocumentType::Cv);
        binding.bind_standard(&view, &["Rust".into()]);
        let mut record = FieldRecord::default();
        record.skills = Skills::Tags(vec!["Rust".into(), "Go".into()]);
        binding.populate(&mut view, &record);
        assert_eq!(view.value("cv-skills"), Some(ControlValue::text("Rust, Go")));
        assert_eq!(view.value("cv-skill-rust"), Some(ControlValue::Checked(true)));
    }

    #[test]
    fn add_entry_without_container_changes_nothing() {
        let mut view = VirtualForm::new();
        let binding = FormBinding::new(DocumentType::Cv);
        let mut store = FieldStore::default();
        let before = store.record().clone();
        assert_eq!(binding.add_entry(ListName::Work, None, &mut store, &mut view), None);
        assert_eq!(store.record(), &before);
        assert!(view.entry_keys(ListName::Work).is_empty());
    }

    #[test]
    fn clear_list_leaves_one_blank_entry() {
        let (binding, mut store, mut view) = setup();
        binding.add_entry(ListName::Projects, None, &mut store, &mut view);
        store.set_entry_field(ListName::Projects, 1, "name", "X");
        binding.clear_list(ListName::Projects, &mut store, &mut view);
        assert_eq!(store.record().projects.len(), 1);
        assert!(store.record().projects.is_blank());
        assert_eq!(view.entry_keys(ListName::Projects).len(), 1);
    }
}
