//! Field Data Store – owns the canonical [`FieldRecord`] and applies every
//! mutation to it. Each successful mutation returns a [`Change`] so the
//! caller can re-render and arm the autosave.

use std::collections::BTreeMap;

use crate::record::*;

/// What a mutation did.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Scalar(ScalarField),
    Address(AddressPart),
    Skills,
    EntryField {
        list: ListName,
        index: usize,
        field: &'static str,
    },
    EntryAdded {
        list: ListName,
        index: usize,
    },
    EntryRemoved {
        list: ListName,
        index: usize,
        removal: Removal,
    },
    Reordered {
        list: ListName,
        from: usize,
        to: usize,
    },
    ListCleared(ListName),
    Replaced,
}

#[derive(Debug, Clone, Default)]
pub struct FieldStore {
    record: FieldRecord,
    revision: u64,
}

impl FieldStore {
    pub fn new(record: FieldRecord) -> Self {
        Self { record, revision: 0 }
    }

    pub fn record(&self) -> &FieldRecord {
        &self.record
    }

    /// Incremented by every applied mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> FieldRecord {
        self.record.clone()
    }

    fn applied(&mut self, change: Change) -> Change {
        self.revision += 1;
        change
    }

    pub fn set_scalar(&mut self, field: ScalarField, value: impl Into<String>) -> Change {
        self.record.set_scalar(field, value.into());
        self.applied(Change::Scalar(field))
    }

    pub fn set_address_part(&mut self, part: AddressPart, value: impl Into<String>) -> Change {
        self.record.address.set_part(part, value.into());
        self.applied(Change::Address(part))
    }

    /// Free-text skills input.
    pub fn set_skills_text(&mut self, text: impl Into<String>) -> Change {
        self.record.skills = Skills::Text(text.into());
        self.applied(Change::Skills)
    }

    /// Multi-select skills input.
    pub fn set_skill_tags(&mut self, tags: Vec<String>) -> Change {
        self.record.skills = Skills::Tags(tags);
        self.applied(Change::Skills)
    }

    /// Checkbox skills input.
    pub fn toggle_skill(&mut self, tag: &str, selected: bool) -> Change {
        self.record.skills.toggle(tag, selected);
        self.applied(Change::Skills)
    }

    pub fn set_entry_field(
        &mut self,
        list: ListName,
        index: usize,
        field: &str,
        value: impl Into<String>,
    ) -> Option<Change> {
        let field = list.fields().iter().copied().find(|f| *f == field)?;
        if !self.record.set_entry_field(list, index, field, value.into()) {
            return None;
        }
        Some(self.applied(Change::EntryField { list, index, field }))
    }

    pub fn add_entry(&mut self, list: ListName, initial: Option<&BTreeMap<String, String>>) -> Change {
        let index = self.record.push_entry(list, initial);
        self.applied(Change::EntryAdded { list, index })
    }

    /// Remove an entry, or clear it when it is the last one.
    pub fn remove_entry(&mut self, list: ListName, index: usize) -> Option<Change> {
        let removal = self.record.remove_entry(list, index)?;
        Some(self.applied(Change::EntryRemoved { list, index, removal }))
    }

    pub fn move_entry(&mut self, list: ListName, from: usize, to: usize) -> Option<Change> {
        if !self.record.move_entry(list, from, to) {
            return None;
        }
        Some(self.applied(Change::Reordered { list, from, to }))
    }

    pub fn clear_list(&mut self, list: ListName) -> Change {
        self.record.clear_list(list);
        self.applied(Change::ListCleared(list))
    }

    /// Replace the whole record, e.g. after loading a draft.
    pub fn replace(&mut self, record: FieldRecord) -> Change {
        self.record = record;
        self.applied(Change::Replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_bump_revision() {
        let mut store = FieldStore::default();
        store.set_scalar(ScalarField::Name, "Ada");
        store.set_address_part(AddressPart::City, "London");
        assert_eq!(store.revision(), 2);
        assert_eq!(store.record().address.display(), "London");
    }

    #[test]
    fn unknown_entry_field_is_ignored() {
        let mut store = FieldStore::default();
        assert!(store.set_entry_field(ListName::Work, 0, "salary", "1").is_none());
        assert!(store.set_entry_field(ListName::Work, 3, "title", "x").is_none());
        assert_eq!(store.revision(), 0);
        let change = store.set_entry_field(ListName::Work, 0, "title", "Dev");
        assert_eq!(
            change,
            Some(Change::EntryField {
                list: ListName::Work,
                index: 0,
                field: "title"
            })
        );
    }

    #[test]
    fn removing_sole_entry_reports_clear() {
        let mut store = FieldStore::default();
        store.set_entry_field(ListName::References, 0, "name", "Bo");
        let change = store.remove_entry(ListName::References, 0).unwrap();
        assert_eq!(
            change,
            Change::EntryRemoved {
                list: ListName::References,
                index: 0,
                removal: Removal::Cleared
            }
        );
        assert!(store.record().references.is_blank());
    }

    #[test]
    fn skill_inputs() {
        let mut store = FieldStore::default();
        store.set_skills_text("Rust, Go");
        store.toggle_skill("SQL", true);
        assert_eq!(store.record().skills.items(), vec!["Rust", "Go", "SQL"]);
        store.set_skill_tags(vec!["C".into()]);
        assert!(store.record().skills.contains("C"));
    }
}
