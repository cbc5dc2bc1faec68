//! The Field Data Store's data model.
//!
//! [`FieldRecord`] is the canonical form state: a handful of scalar fields,
//! an address, skills, and nine repeated-entry lists. Every list is an
//! [`EntryList`], which can never become empty.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// A fixed-schema record inside a repeated-entry list.
pub trait Entry: Default + Clone + PartialEq + Serialize + DeserializeOwned {
    /// Field names in display order.
    const FIELDS: &'static [&'static str];

    fn field(&self, name: &str) -> Option<&str>;

    fn field_mut(&mut self, name: &str) -> Option<&mut String>;

    /// True when every field is empty or whitespace.
    fn is_blank(&self) -> bool {
        Self::FIELDS
            .iter()
            .all(|f| self.field(f).map_or(true, |v| v.trim().is_empty()))
    }

    /// `(field, value)` pairs in schema order.
    fn values(&self) -> Vec<(&'static str, String)> {
        Self::FIELDS
            .iter()
            .map(|f| (*f, self.field(f).unwrap_or_default().to_string()))
            .collect()
    }
}

macro_rules! entry_record {
    ($(#[$meta:meta])* $name:ident { $($field:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $(pub $field: String,)+
        }

        impl Entry for $name {
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn field(&self, name: &str) -> Option<&str> {
                match name {
                    $(stringify!($field) => Some(self.$field.as_str()),)+
                    _ => None,
                }
            }

            fn field_mut(&mut self, name: &str) -> Option<&mut String> {
                match name {
                    $(stringify!($field) => Some(&mut self.$field),)+
                    _ => None,
                }
            }
        }
    };
}

entry_record!(
    /// One row of the academic qualifications table.
    EducationEntry { year, level, school, qualification }
);
entry_record!(WorkEntry { title, company, period, description });
entry_record!(ResearchEntry { title, institution, period, description });
entry_record!(PublicationEntry { title, venue, year });
entry_record!(CertificationEntry { name, issuer, year });
entry_record!(ConferenceEntry { name, location, year });
entry_record!(AchievementEntry { description });
entry_record!(ProjectEntry { name, tech, description });
entry_record!(
    /// A referee: name, position and how to reach them.
    ReferenceEntry { name, position, phone, email }
);

/// Outcome of removing an entry from an [`EntryList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The entry was deleted and the list shrank.
    Removed,
    /// The entry was the last one; its fields were cleared instead.
    Cleared,
}

/// An ordered list of entries that always holds at least one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryList<T: Entry>(Vec<T>);

impl<T: Entry> EntryList<T> {
    pub fn new() -> Self {
        Self(vec![T::default()])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept so the type reads like a collection.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.0.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Entries with at least one non-blank field, in list order.
    pub fn non_blank(&self) -> impl Iterator<Item = &T> {
        self.0.iter().filter(|e| !e.is_blank())
    }

    pub fn is_blank(&self) -> bool {
        self.0.iter().all(Entry::is_blank)
    }

    /// Append an entry and return its index.
    pub fn push(&mut self, entry: T) -> usize {
        self.0.push(entry);
        self.0.len() - 1
    }

    /// Remove the entry at `index`, or clear it if it is the only one.
    pub fn remove(&mut self, index: usize) -> Option<Removal> {
        if index >= self.0.len() {
            return None;
        }
        if self.0.len() == 1 {
            self.0[0] = T::default();
            Some(Removal::Cleared)
        } else {
            self.0.remove(index);
            Some(Removal::Removed)
        }
    }

    /// Move the entry at `from` so that it ends up at `to`.
    pub fn move_entry(&mut self, from: usize, to: usize) -> bool {
        let len = self.0.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let entry = self.0.remove(from);
            self.0.insert(to, entry);
        }
        true
    }

    /// Drop every entry but one and clear it.
    pub fn clear_all(&mut self) {
        self.0.clear();
        self.0.push(T::default());
    }
}

impl<T: Entry> Default for EntryList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entry> From<Vec<T>> for EntryList<T> {
    fn from(mut entries: Vec<T>) -> Self {
        if entries.is_empty() {
            entries.push(T::default());
        }
        Self(entries)
    }
}

impl<'a, T: Entry> IntoIterator for &'a EntryList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: Entry> Serialize for EntryList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Entry> Deserialize<'de> for EntryList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}

fn entry_from<T: Entry>(initial: Option<&BTreeMap<String, String>>) -> T {
    let mut entry = T::default();
    if let Some(values) = initial {
        for (field, value) in values {
            if let Some(slot) = entry.field_mut(field) {
                *slot = value.clone();
            }
        }
    }
    entry
}

// ---------------------------------------------------------------------------
// Address and skills
// ---------------------------------------------------------------------------

/// Street-level address parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressPart {
    Street,
    City,
    State,
    Country,
}

impl AddressPart {
    pub const ALL: [AddressPart; 4] = [
        AddressPart::Street,
        AddressPart::City,
        AddressPart::State,
        AddressPart::Country,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AddressPart::Street => "street",
            AddressPart::City => "city",
            AddressPart::State => "state",
            AddressPart::Country => "country",
        }
    }
}

/// Either a structured address or a single free-text line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Address {
    Structured(PostalAddress),
    Flat(String),
}

impl Default for Address {
    fn default() -> Self {
        Address::Structured(PostalAddress::default())
    }
}

impl Address {
    pub fn part(&self, part: AddressPart) -> &str {
        match self {
            Address::Structured(a) => match part {
                AddressPart::Street => &a.street,
                AddressPart::City => &a.city,
                AddressPart::State => &a.state,
                AddressPart::Country => &a.country,
            },
            Address::Flat(_) => "",
        }
    }

    /// Set one part, converting a flat address into a structured one whose
    /// street holds the old text.
    pub fn set_part(&mut self, part: AddressPart, value: String) {
        if let Address::Flat(text) = self {
            *self = Address::Structured(PostalAddress {
                street: std::mem::take(text),
                ..PostalAddress::default()
            });
        }
        if let Address::Structured(a) = self {
            let slot = match part {
                AddressPart::Street => &mut a.street,
                AddressPart::City => &mut a.city,
                AddressPart::State => &mut a.state,
                AddressPart::Country => &mut a.country,
            };
            *slot = value;
        }
    }

    /// Single-line rendering: non-blank parts joined by ", ".
    pub fn display(&self) -> String {
        match self {
            Address::Flat(text) => text.trim().to_string(),
            Address::Structured(a) => [&a.street, &a.city, &a.state, &a.country]
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.display().is_empty()
    }
}

/// Skills as selected tags or as free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Skills {
    Tags(Vec<String>),
    Text(String),
}

impl Default for Skills {
    fn default() -> Self {
        Skills::Tags(Vec::new())
    }
}

impl Skills {
    /// Individual skills, trimmed, blanks dropped. Free text is split on
    /// commas and newlines.
    pub fn items(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Skills::Tags(tags) => tags.iter().map(String::as_str).collect(),
            Skills::Text(text) => text.split([',', '\n']).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.items().is_empty()
    }

    /// Checkbox semantics: select or deselect one tag, keeping order.
    pub fn toggle(&mut self, tag: &str, selected: bool) {
        let mut tags = self.items();
        let pos = tags.iter().position(|t| t == tag);
        match (selected, pos) {
            (true, None) => tags.push(tag.to_string()),
            (false, Some(i)) => {
                tags.remove(i);
            }
            _ => {}
        }
        *self = Skills::Tags(tags);
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.items().iter().any(|t| t == tag)
    }
}

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    Name,
    Email,
    Phone,
    Summary,
    Website,
}

impl ScalarField {
    pub const ALL: [ScalarField; 5] = [
        ScalarField::Name,
        ScalarField::Email,
        ScalarField::Phone,
        ScalarField::Summary,
        ScalarField::Website,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ScalarField::Name => "name",
            ScalarField::Email => "email",
            ScalarField::Phone => "phone",
            ScalarField::Summary => "summary",
            ScalarField::Website => "website",
        }
    }
}

/// The nine repeated-entry lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ListName {
    Education,
    Work,
    Research,
    Publications,
    Certifications,
    Conferences,
    Achievements,
    Projects,
    References,
}

impl ListName {
    pub const ALL: [ListName; 9] = [
        ListName::Education,
        ListName::Work,
        ListName::Research,
        ListName::Publications,
        ListName::Certifications,
        ListName::Conferences,
        ListName::Achievements,
        ListName::Projects,
        ListName::References,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ListName::Education => "education",
            ListName::Work => "work",
            ListName::Research => "research",
            ListName::Publications => "publications",
            ListName::Certifications => "certifications",
            ListName::Conferences => "conferences",
            ListName::Achievements => "achievements",
            ListName::Projects => "projects",
            ListName::References => "references",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.key() == key)
    }

    /// Field names of this list's entry schema.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            ListName::Education => EducationEntry::FIELDS,
            ListName::Work => WorkEntry::FIELDS,
            ListName::Research => ResearchEntry::FIELDS,
            ListName::Publications => PublicationEntry::FIELDS,
            ListName::Certifications => CertificationEntry::FIELDS,
            ListName::Conferences => ConferenceEntry::FIELDS,
            ListName::Achievements => AchievementEntry::FIELDS,
            ListName::Projects => ProjectEntry::FIELDS,
            ListName::References => ReferenceEntry::FIELDS,
        }
    }
}

impl fmt::Display for ListName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// FieldRecord
// ---------------------------------------------------------------------------

/// All user-entered form data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub summary: String,
    pub website: String,
    pub address: Address,
    pub education: EntryList<EducationEntry>,
    pub work: EntryList<WorkEntry>,
    pub research: EntryList<ResearchEntry>,
    pub publications: EntryList<PublicationEntry>,
    pub certifications: EntryList<CertificationEntry>,
    pub conferences: EntryList<ConferenceEntry>,
    pub achievements: EntryList<AchievementEntry>,
    pub projects: EntryList<ProjectEntry>,
    pub references: EntryList<ReferenceEntry>,
    pub skills: Skills,
}

/// Run `$body` with `$l` bound to the list selected by `$list`.
macro_rules! with_list {
    ($record:expr, $list:expr, |$l:ident| $body:expr) => {
        match $list {
            ListName::Education => { let $l = &$record.education; $body }
            ListName::Work => { let $l = &$record.work; $body }
            ListName::Research => { let $l = &$record.research; $body }
            ListName::Publications => { let $l = &$record.publications; $body }
            ListName::Certifications => { let $l = &$record.certifications; $body }
            ListName::Conferences => { let $l = &$record.conferences; $body }
            ListName::Achievements => { let $l = &$record.achievements; $body }
            ListName::Projects => { let $l = &$record.projects; $body }
            ListName::References => { let $l = &$record.references; $body }
        }
    };
    (mut $record:expr, $list:expr, |$l:ident| $body:expr) => {
        match $list {
            ListName::Education => { let $l = &mut $record.education; $body }
            ListName::Work => { let $l = &mut $record.work; $body }
            ListName::Research => { let $l = &mut $record.research; $body }
            ListName::Publications => { let $l = &mut $record.publications; $body }
            ListName::Certifications => { let $l = &mut $record.certifications; $body }
            ListName::Conferences => { let $l = &mut $record.conferences; $body }
            ListName::Achievements => { let $l = &mut $record.achievements; $body }
            ListName::Projects => { let $l = &mut $record.projects; $body }
            ListName::References => { let $l = &mut $record.references; $body }
        }
    };
}

impl FieldRecord {
    pub fn scalar(&self, field: ScalarField) -> &str {
        match field {
            ScalarField::Name => &self.name,
            ScalarField::Email => &self.email,
            ScalarField::Phone => &self.phone,
            ScalarField::Summary => &self.summary,
            ScalarField::Website => &self.website,
        }
    }

    pub fn set_scalar(&mut self, field: ScalarField, value: String) {
        let slot = match field {
            ScalarField::Name => &mut self.name,
            ScalarField::Email => &mut self.email,
            ScalarField::Phone => &mut self.phone,
            ScalarField::Summary => &mut self.summary,
            ScalarField::Website => &mut self.website,
        };
        *slot = value;
    }

    pub fn list_len(&self, list: ListName) -> usize {
        with_list!(self, list, |l| l.len())
    }

    pub fn list_is_blank(&self, list: ListName) -> bool {
        with_list!(self, list, |l| l.is_blank())
    }

    /// Number of entries with content.
    pub fn non_blank_count(&self, list: ListName) -> usize {
        with_list!(self, list, |l| l.non_blank().count())
    }

    pub fn entry_values(&self, list: ListName, index: usize) -> Option<Vec<(&'static str, String)>> {
        with_list!(self, list, |l| l.get(index).map(Entry::values))
    }

    pub fn entry_field(&self, list: ListName, index: usize, field: &str) -> Option<&str> {
        with_list!(self, list, |l| l.get(index).and_then(|e| e.field(field)))
    }

    /// Write one entry field. Returns false for an unknown index or field.
    pub fn set_entry_field(&mut self, list: ListName, index: usize, field: &str, value: String) -> bool {
        with_list!(mut self, list, |l| {
            match l.get_mut(index).and_then(|e| e.field_mut(field)) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            }
        })
    }

    /// Append an entry built from `initial` (unknown fields ignored).
    pub fn push_entry(&mut self, list: ListName, initial: Option<&BTreeMap<String, String>>) -> usize {
        with_list!(mut self, list, |l| l.push(entry_from(initial)))
    }

    pub fn remove_entry(&mut self, list: ListName, index: usize) -> Option<Removal> {
        with_list!(mut self, list, |l| l.remove(index))
    }

    pub fn move_entry(&mut self, list: ListName, from: usize, to: usize) -> bool {
        with_list!(mut self, list, |l| l.move_entry(from, to))
    }

    pub fn clear_list(&mut self, list: ListName) {
        with_list!(mut self, list, |l| l.clear_all())
    }

    /// True when the header block (name and contact details) has no content.
    pub fn header_is_blank(&self) -> bool {
        [&self.name, &self.email, &self.phone, &self.website]
            .iter()
            .all(|s| s.trim().is_empty())
            && self.address.is_blank()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}
