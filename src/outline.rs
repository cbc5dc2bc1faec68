//! Outline – the filtered, ordered content model built from a
//! [`FieldRecord`].
//!
//! The preview renderer, the DOCX builder and the text PDF path all consume
//! an [`Outline`], so every output agrees on which sections exist, in which
//! order, and which entries were dropped as blank.

use serde::Serialize;

use crate::record::*;
use crate::session::DocumentType;

/// Separator between the parts of an entry subtitle and of the contact line.
pub const BULLET_SEP: &str = " • ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionKind {
    Summary,
    Education,
    Work,
    Research,
    Publications,
    Certifications,
    Conferences,
    Achievements,
    Projects,
    Skills,
    References,
}

impl SectionKind {
    /// Sections in the order they appear for a document type.
    pub fn order(doc_type: DocumentType) -> &'static [SectionKind] {
        use SectionKind::*;
        match doc_type {
            DocumentType::Cv => &[
                Summary,
                Education,
                Work,
                Research,
                Publications,
                Certifications,
                Conferences,
                Achievements,
                Projects,
                Skills,
                References,
            ],
            DocumentType::Resume => &[
                Summary,
                Skills,
                Work,
                Projects,
                Education,
                Certifications,
                References,
            ],
        }
    }

    pub fn title(self, doc_type: DocumentType) -> &'static str {
        match self {
            SectionKind::Summary => "Professional Summary",
            SectionKind::Education => "Academic Qualifications",
            SectionKind::Work => "Work Experience",
            SectionKind::Research => "Research Experience",
            SectionKind::Publications => "Publications",
            SectionKind::Certifications => "Certifications",
            SectionKind::Conferences => "Conferences / Workshops",
            SectionKind::Achievements => "Achievements",
            SectionKind::Projects => "Projects",
            SectionKind::Skills => match doc_type {
                DocumentType::Cv => "Skills",
                DocumentType::Resume => "Key Skills",
            },
            SectionKind::References => "References",
        }
    }

    /// CSS class suffix used by the preview markup.
    pub fn slug(self) -> &'static str {
        match self {
            SectionKind::Summary => "summary",
            SectionKind::Education => "education",
            SectionKind::Work => "work",
            SectionKind::Research => "research",
            SectionKind::Publications => "publications",
            SectionKind::Certifications => "certifications",
            SectionKind::Conferences => "conferences",
            SectionKind::Achievements => "achievements",
            SectionKind::Projects => "projects",
            SectionKind::Skills => "skills",
            SectionKind::References => "references",
        }
    }
}

/// Name and contact line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Header {
    pub name: String,
    /// Non-blank contact parts: email, phone, address, website.
    pub contact: Vec<String>,
}

impl Header {
    pub fn from_record(record: &FieldRecord) -> Self {
        let contact = [
            record.email.trim().to_string(),
            record.phone.trim().to_string(),
            record.address.display(),
            record.website.trim().to_string(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
        Self {
            name: record.name.trim().to_string(),
            contact,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.contact.is_empty()
    }

    pub fn contact_line(&self, sep: &str) -> String {
        self.contact.join(sep)
    }
}

/// One entry of a list section. Empty strings mean "absent".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryBlock {
    pub title: String,
    pub subtitle: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBlock {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableBlock {
    /// Body rows alternate plain / shaded, starting plain.
    pub fn is_striped(row: usize) -> bool {
        row % 2 == 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Block {
    Paragraph(String),
    Entries(Vec<EntryBlock>),
    Table(TableBlock),
    Tags(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: &'static str,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outline {
    pub doc_type: DocumentType,
    pub header: Header,
    /// Only sections with content, in document order.
    pub sections: Vec<Section>,
}

impl Outline {
    pub fn from_record(record: &FieldRecord, doc_type: DocumentType) -> Self {
        let sections = SectionKind::order(doc_type)
            .iter()
            .filter_map(|&kind| {
                section_body(record, kind).map(|body| Section {
                    kind,
                    title: kind.title(doc_type),
                    body,
                })
            })
            .collect();
        Self {
            doc_type,
            header: Header::from_record(record),
            sections,
        }
    }

    /// True when nothing at all would be rendered.
    pub fn is_empty(&self) -> bool {
        self.header.is_blank() && self.sections.is_empty()
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}

/// Join the non-blank parts with `sep`.
pub fn join_present(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn entry(title: &str, subtitle: &[&str], details: &str) -> EntryBlock {
    EntryBlock {
        title: title.trim().to_string(),
        subtitle: join_present(subtitle, BULLET_SEP),
        details: details.trim().to_string(),
    }
}

fn entries<T: Entry>(list: &EntryList<T>, map: impl Fn(&T) -> EntryBlock) -> Option<Block> {
    let blocks: Vec<EntryBlock> = list.non_blank().map(map).collect();
    (!blocks.is_empty()).then_some(Block::Entries(blocks))
}

fn section_body(record: &FieldRecord, kind: SectionKind) -> Option<Block> {
    match kind {
        SectionKind::Summary => {
            let text = record.summary.trim();
            (!text.is_empty()).then(|| Block::Paragraph(text.to_string()))
        }
        SectionKind::Education => {
            let rows: Vec<Vec<String>> = record
                .education
                .non_blank()
                .map(|e| {
                    e.values()
                        .into_iter()
                        .map(|(_, v)| v.trim().to_string())
                        .collect()
                })
                .collect();
            (!rows.is_empty()).then(|| {
                Block::Table(TableBlock {
                    headers: ["Year", "Level", "School", "Qualification"]
                        .iter()
                        .map(|h| h.to_string())
                        .collect(),
                    rows,
                })
            })
        }
        SectionKind::Work => entries(&record.work, |w| {
            entry(&w.title, &[&w.company, &w.period], &w.description)
        }),
        SectionKind::Research => entries(&record.research, |r| {
            entry(&r.title, &[&r.institution, &r.period], &r.description)
        }),
        SectionKind::Publications => {
            entries(&record.publications, |p| entry(&p.title, &[&p.venue, &p.year], ""))
        }
        SectionKind::Certifications => {
            entries(&record.certifications, |c| entry(&c.name, &[&c.issuer, &c.year], ""))
        }
        SectionKind::Conferences => {
            entries(&record.conferences, |c| entry(&c.name, &[&c.location, &c.year], ""))
        }
        SectionKind::Achievements => {
            entries(&record.achievements, |a| entry("", &[], &a.description))
        }
        SectionKind::Projects => {
            entries(&record.projects, |p| entry(&p.name, &[&p.tech], &p.description))
        }
        SectionKind::References => entries(&record.references, |r| EntryBlock {
            title: join_present(&[&r.name, &r.position], ", "),
            subtitle: join_present(&[&r.phone, &r.email], BULLET_SEP),
            details: String::new(),
        }),
        SectionKind::Skills => {
            let items = record.skills.items();
            (!items.is_empty()).then_some(Block::Tags(items))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_record_has_no_sections() {
        let outline = Outline::from_record(&FieldRecord::default(), DocumentType::Cv);
        assert!(outline.sections.is_empty());
        assert!(outline.is_empty());
    }

    #[test]
    fn blank_entries_are_filtered() {
        let mut record = FieldRecord::default();
        record.set_entry_field(ListName::Work, 0, "title", "Engineer".into());
        record.push_entry(ListName::Work, None);
        let outline = Outline::from_record(&record, DocumentType::Cv);
        match &outline.section(SectionKind::Work).unwrap().body {
            Block::Entries(e) => assert_eq!(e.len(), 1),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn resume_order_and_titles() {
        let mut record = FieldRecord::default();
        record.summary = "Hi".into();
        record.skills = Skills::Text("Rust".into());
        record.set_entry_field(ListName::Education, 0, "school", "Uni".into());
        record.set_entry_field(ListName::Work, 0, "title", "Dev".into());
        let outline = Outline::from_record(&record, DocumentType::Resume);
        let titles: Vec<_> = outline.sections.iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            vec!["Professional Summary", "Key Skills", "Work Experience", "Academic Qualifications"]
        );
    }

    #[test]
    fn subtitles_skip_missing_parts() {
        let mut record = FieldRecord::default();
        record.set_entry_field(ListName::Work, 0, "title", "Dev".into());
        record.set_entry_field(ListName::Work, 0, "period", "2020".into());
        record.set_entry_field(ListName::References, 0, "name", "Ann".into());
        record.set_entry_field(ListName::References, 0, "email", "a@b.c".into());
        let outline = Outline::from_record(&record, DocumentType::Cv);
        let Block::Entries(work) = &outline.section(SectionKind::Work).unwrap().body else {
            panic!("work should be entries");
        };
        assert_eq!(work[0].subtitle, "2020");
        let Block::Entries(refs) = &outline.section(SectionKind::References).unwrap().body else {
            panic!("references should be entries");
        };
        assert_eq!(refs[0].title, "Ann");
        assert_eq!(refs[0].subtitle, "a@b.c");
    }

    #[test]
    fn header_contact_order() {
        let mut record = FieldRecord::default();
        record.website = "x.dev".into();
        record.email = "me@x.dev".into();
        record.address = Address::Flat("Town".into());
        let header = Header::from_record(&record);
        assert_eq!(header.contact_line(BULLET_SEP), "me@x.dev • Town • x.dev");
    }
}
