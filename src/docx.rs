//! Word-processor document tree and its WordprocessingML serialisation.
//!
//! [`build_document`] turns an [`Outline`] into a [`Document`] with the
//! template rules applied; [`Document::to_xml`] produces `word/document.xml`.
//! Sizes follow OOXML units: run sizes in half-points, spacing and widths in
//! twips, border widths in eighths of a point.

use crate::outline::{Block, EntryBlock, Outline, SectionKind, TableBlock};
use crate::pipeline::PaperSize;
use crate::style::{Color, StyleSettings, Template};

/// One inch.
pub const MARGIN_TWIPS: u32 = 1440;

const CONTACT_SEP: &str = " | ";

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Default font for every run without an explicit font.
    pub font: String,
    /// Default run size in half-points.
    pub font_size: u32,
    /// Line spacing in 240ths of a line.
    pub line_spacing: u32,
    pub page: PageSetup,
    pub body: Vec<BodyItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSetup {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
}

impl PageSetup {
    pub fn for_paper(paper: PaperSize) -> Self {
        let (width, height) = paper.twips();
        Self {
            width,
            height,
            margin: MARGIN_TWIPS,
        }
    }

    pub fn content_width(&self) -> u32 {
        self.width.saturating_sub(2 * self.margin)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BodyItem {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    /// Eighths of a point.
    pub size: u32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub alignment: Alignment,
    pub spacing_before: u32,
    pub spacing_after: u32,
    pub bottom_border: Option<Border>,
    pub keep_next: bool,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    pub fn spacing(mut self, before: u32, after: u32) -> Self {
        self.spacing_before = before;
        self.spacing_after = after;
        self
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    /// Newlines become line breaks.
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Half-points; `None` uses the document default.
    pub size: Option<u32>,
    pub color: Option<Color>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn bold(mut self, on: bool) -> Self {
        self.bold = on;
        self
    }

    pub fn italic(mut self, on: bool) -> Self {
        self.italic = on;
        self
    }

    pub fn size(mut self, half_points: u32) -> Self {
        self.size = Some(half_points);
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingPattern {
    /// Fill colour behind a clear pattern.
    Clear,
    /// Fully painted with the pattern colour.
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shading {
    pub pattern: ShadingPattern,
    pub fill: Color,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
    pub shading: Option<Shading>,
    /// Inner margin on every side, in twips.
    pub margin: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Repeats at the top of each page.
    pub is_header: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub column_widths: Vec<u32>,
    pub rows: Vec<Row>,
    pub borders: Option<Border>,
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

fn hex(h: &str) -> Color {
    Color::from_hex(h).unwrap_or(Color::BLACK)
}

/// Build the document for an outline with the template rules applied.
/// Blank sections are absent from the outline and so from the document.
pub fn build_document(outline: &Outline, style: &StyleSettings, paper: PaperSize) -> Document {
    let page = PageSetup::for_paper(paper);
    let mut body = Vec::new();
    header_items(outline, style, page, &mut body);

    let classic = style.template == Template::Classic;
    for section in &outline.sections {
        body.push(BodyItem::Paragraph(section_heading(section.title, style)));
        match &section.body {
            Block::Paragraph(text) => {
                let italic = classic && section.kind == SectionKind::Summary;
                body.push(BodyItem::Paragraph(
                    Paragraph::new(vec![Run::new(text.as_str()).size(24).italic(italic)]).spacing(0, 200),
                ));
            }
            Block::Entries(entries) => {
                for e in entries {
                    entry_paragraphs(e, classic, &mut body);
                }
            }
            Block::Table(table) => body.push(BodyItem::Table(education_table(table, style, page))),
            Block::Tags(tags) => {
                body.push(BodyItem::Paragraph(
                    Paragraph::new(vec![Run::new(tags.join(", ")).size(20)]).spacing(0, 200),
                ));
            }
        }
    }

    Document {
        font: style.font_key.document_font().to_string(),
        font_size: 24,
        line_spacing: 360,
        page,
        body,
    }
}

fn header_items(outline: &Outline, style: &StyleSettings, page: PageSetup, body: &mut Vec<BodyItem>) {
    let header = &outline.header;
    if header.is_blank() {
        return;
    }
    let contact = header.contact_line(CONTACT_SEP);

    match style.template {
        Template::Bold => {
            let mut paragraphs = Vec::new();
            if !header.name.is_empty() {
                paragraphs.push(
                    Paragraph::new(vec![Run::new(header.name.as_str()).bold(true).size(48).color(Color::WHITE)])
                        .spacing(0, 100),
                );
            }
            if !contact.is_empty() {
                paragraphs.push(Paragraph::new(vec![Run::new(contact).size(20).color(Color::WHITE)]));
            }
            body.push(BodyItem::Table(Table {
                column_widths: vec![page.content_width()],
                rows: vec![Row {
                    cells: vec![Cell {
                        paragraphs,
                        shading: Some(Shading {
                            pattern: ShadingPattern::Solid,
                            fill: style.accent(),
                        }),
                        margin: Some(400),
                    }],
                    is_header: false,
                }],
                borders: None,
            }));
            body.push(BodyItem::Paragraph(Paragraph::default().spacing(0, 400)));
        }
        Template::Modern | Template::Classic => {
            let classic = style.template == Template::Classic;
            let alignment = if classic { Alignment::Left } else { Alignment::Center };
            if !header.name.is_empty() {
                let (name, size) = if classic {
                    (header.name.to_uppercase(), 36)
                } else {
                    (header.name.clone(), 44)
                };
                body.push(BodyItem::Paragraph(
                    Paragraph::new(vec![Run::new(name).bold(true).size(size).color(Color::BLACK)])
                        .align(alignment)
                        .spacing(0, 100),
                ));
            }
            if !contact.is_empty() {
                body.push(BodyItem::Paragraph(
                    Paragraph::new(vec![Run::new(contact).size(20).color(hex("#475569"))]).align(alignment),
                ));
            }
            body.push(BodyItem::Paragraph(Paragraph {
                bottom_border: Some(Border {
                    size: if classic { 16 } else { 24 },
                    color: style.accent(),
                }),
                spacing_after: 200,
                ..Paragraph::default()
            }));
        }
    }
}

fn section_heading(title: &str, style: &StyleSettings) -> Paragraph {
    let (size, border) = match style.template {
        Template::Bold => (32, 16),
        Template::Classic => (24, 8),
        Template::Modern => (28, 16),
    };
    let text = if style.template == Template::Classic {
        title.to_uppercase()
    } else {
        title.to_string()
    };
    Paragraph {
        runs: vec![Run::new(text).bold(true).size(size).color(style.accent())],
        spacing_before: 400,
        spacing_after: 200,
        bottom_border: Some(Border {
            size: border,
            color: style.accent(),
        }),
        keep_next: true,
        ..Paragraph::default()
    }
}

fn entry_paragraphs(e: &EntryBlock, classic: bool, body: &mut Vec<BodyItem>) {
    if !e.title.is_empty() {
        let mut p = Paragraph::new(vec![Run::new(e.title.as_str()).bold(true).size(24)]).spacing(200, 100);
        p.keep_next = !e.subtitle.is_empty() || !e.details.is_empty();
        body.push(BodyItem::Paragraph(p));
    }
    if !e.subtitle.is_empty() {
        let run = Run::new(e.subtitle.as_str()).size(20).color(hex("#666666")).italic(classic);
        let mut p = Paragraph::new(vec![run]).spacing(0, 100);
        p.keep_next = !e.details.is_empty();
        body.push(BodyItem::Paragraph(p));
    }
    if !e.details.is_empty() {
        body.push(BodyItem::Paragraph(
            Paragraph::new(vec![Run::new(e.details.as_str()).size(20)]).spacing(0, 200),
        ));
    }
}

fn education_table(table: &TableBlock, style: &StyleSettings, page: PageSetup) -> Table {
    let columns = table.headers.len().max(1) as u32;
    let width = page.content_width() / columns;
    let cell = |text: &str, run: Run, shading: Option<Shading>| Cell {
        paragraphs: vec![Paragraph::new(vec![Run { text: text.to_string(), ..run }])],
        shading,
        margin: Some(100),
    };

    let mut rows = vec![Row {
        cells: table
            .headers
            .iter()
            .map(|h| {
                let fill = Shading {
                    pattern: ShadingPattern::Clear,
                    fill: style.accent(),
                };
                cell(h, Run::default().bold(true).size(22).color(Color::WHITE), Some(fill))
            })
            .collect(),
        is_header: true,
    }];
    for (i, row) in table.rows.iter().enumerate() {
        let stripe = TableBlock::is_striped(i).then(|| Shading {
            pattern: ShadingPattern::Clear,
            fill: hex("#F8FAFC"),
        });
        rows.push(Row {
            cells: row.iter().map(|v| cell(v, Run::default().size(20), stripe)).collect(),
            is_header: false,
        });
    }

    Table {
        column_widths: vec![width; columns as usize],
        rows,
        borders: Some(Border {
            size: 4,
            color: hex("#E2E8F0"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Serialisation
// ---------------------------------------------------------------------------

pub(crate) const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub(crate) fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if (c as u32) < 0x20 && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

impl Document {
    /// `word/document.xml`.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push_str(&format!(r#"<w:document xmlns:w="{W_NS}"><w:body>"#));
        for item in &self.body {
            match item {
                BodyItem::Paragraph(p) => write_paragraph(&mut out, p),
                BodyItem::Table(t) => write_table(&mut out, t),
            }
        }
        let PageSetup { width, height, margin } = self.page;
        out.push_str(&format!(
            r#"<w:sectPr><w:pgSz w:w="{width}" w:h="{height}"/><w:pgMar w:top="{margin}" w:right="{margin}" w:bottom="{margin}" w:left="{margin}" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#
        ));
        out.push_str("</w:body></w:document>");
        out
    }

    /// `word/styles.xml` carrying the document defaults.
    pub fn styles_xml(&self) -> String {
        let font = xml_escape(&self.font);
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{W_NS}"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:line="{line}" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults></w:styles>"#,
            size = self.font_size,
            line = self.line_spacing,
        )
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|item| match item {
            BodyItem::Paragraph(p) => Some(p),
            BodyItem::Table(_) => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|item| match item {
            BodyItem::Table(t) => Some(t),
            BodyItem::Paragraph(_) => None,
        })
    }
}

fn border_xml(side: &str, border: &Border) -> String {
    format!(
        r#"<w:{side} w:val="single" w:sz="{}" w:space="1" w:color="{}"/>"#,
        border.size,
        border.color.to_hex()
    )
}

fn shading_xml(shading: &Shading) -> String {
    let fill = shading.fill.to_hex();
    match shading.pattern {
        ShadingPattern::Solid => format!(r#"<w:shd w:val="solid" w:color="{fill}" w:fill="{fill}"/>"#),
        ShadingPattern::Clear => format!(r#"<w:shd w:val="clear" w:color="auto" w:fill="{fill}"/>"#),
    }
}

fn write_paragraph(out: &mut String, p: &Paragraph) {
    out.push_str("<w:p><w:pPr>");
    if p.keep_next {
        out.push_str("<w:keepNext/>");
    }
    if let Some(border) = &p.bottom_border {
        out.push_str(&format!("<w:pBdr>{}</w:pBdr>", border_xml("bottom", border)));
    }
    out.push_str(&format!(
        r#"<w:spacing w:before="{}" w:after="{}"/>"#,
        p.spacing_before, p.spacing_after
    ));
    match p.alignment {
        Alignment::Left => {}
        Alignment::Center => out.push_str(r#"<w:jc w:val="center"/>"#),
        Alignment::Right => out.push_str(r#"<w:jc w:val="right"/>"#),
    }
    out.push_str("</w:pPr>");
    for run in &p.runs {
        write_run(out, run);
    }
    out.push_str("</w:p>");
}

fn write_run(out: &mut String, run: &Run) {
    out.push_str("<w:r><w:rPr>");
    if run.bold {
        out.push_str("<w:b/>");
    }
    if run.italic {
        out.push_str("<w:i/>");
    }
    if let Some(color) = run.color {
        out.push_str(&format!(r#"<w:color w:val="{}"/>"#, color.to_hex()));
    }
    if let Some(size) = run.size {
        out.push_str(&format!(r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#));
    }
    out.push_str("</w:rPr>");
    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<w:br/>");
        }
        out.push_str(&format!(r#"<w:t xml:space="preserve">{}</w:t>"#, xml_escape(line)));
    }
    out.push_str("</w:r>");
}

fn write_table(out: &mut String, table: &Table) {
    let total: u32 = table.column_widths.iter().sum();
    out.push_str(&format!(r#"<w:tbl><w:tblPr><w:tblW w:w="{total}" w:type="dxa"/>"#));
    if let Some(border) = &table.borders {
        out.push_str("<w:tblBorders>");
        for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
            out.push_str(&border_xml(side, border));
        }
        out.push_str("</w:tblBorders>");
    }
    out.push_str(r#"<w:tblLayout w:type="fixed"/></w:tblPr><w:tblGrid>"#);
    for w in &table.column_widths {
        out.push_str(&format!(r#"<w:gridCol w:w="{w}"/>"#));
    }
    out.push_str("</w:tblGrid>");

    for row in &table.rows {
        out.push_str("<w:tr>");
        if row.is_header {
            out.push_str("<w:trPr><w:tblHeader/></w:trPr>");
        }
        for (i, cell) in row.cells.iter().enumerate() {
            let width = table.column_widths.get(i).copied().unwrap_or(0);
            out.push_str(&format!(r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/>"#));
            if let Some(shading) = &cell.shading {
                out.push_str(&shading_xml(shading));
            }
            if let Some(m) = cell.margin {
                out.push_str("<w:tcMar>");
                for side in ["top", "left", "bottom", "right"] {
                    out.push_str(&format!(r#"<w:{side} w:w="{m}" w:type="dxa"/>"#));
                }
                out.push_str("</w:tcMar>");
            }
            out.push_str("</w:tcPr>");
            if cell.paragraphs.is_empty() {
                write_paragraph(out, &Paragraph::default());
            }
            for p in &cell.paragraphs {
                write_paragraph(out, p);
            }
            out.push_str("</w:tc>");
        }
        out.push_str("</w:tr>");
    }
    out.push_str("</w:tbl>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldRecord;
    use crate::samples::example_record;
    use crate::session::DocumentType;

    fn doc(style: &str, color: &str, font: &str) -> Document {
        let outline = Outline::from_record(&example_record(DocumentType::Cv), DocumentType::Cv);
        build_document(&outline, &StyleSettings::from_keys(style, color, font), PaperSize::A4)
    }

    #[test]
    fn bold_header_is_solid_accent_cell() {
        let d = doc("bold", "navy", "serif");
        let BodyItem::Table(header) = &d.body[0] else {
            panic!("bold header should be a table");
        };
        let cell = &header.rows[0].cells[0];
        let shading = cell.shading.unwrap();
        assert_eq!(shading.pattern, ShadingPattern::Solid);
        assert_eq!(shading.fill.to_hex(), "1E3A8A");
        assert_eq!(cell.margin, Some(400));
        assert_eq!(cell.paragraphs[0].runs[0].color, Some(Color::WHITE));
        assert_eq!(d.font, "Times New Roman");
    }

    #[test]
    fn classic_headings_are_uppercase_and_small() {
        let d = doc("classic", "burgundy", "system");
        let heading = d
            .paragraphs()
            .find(|p| p.keep_next && p.bottom_border.is_some())
            .unwrap();
        assert_eq!(heading.text(), "PROFESSIONAL SUMMARY");
        assert_eq!(heading.runs[0].size, Some(24));
        assert_eq!(heading.bottom_border.unwrap().size, 8);
    }

    #[test]
    fn education_rows_are_striped_from_the_second() {
        let d = doc("modern", "optimism-blue", "system");
        let table = d.tables().next().unwrap();
        assert!(table.rows[0].is_header);
        assert!(table.rows[1].cells[0].shading.is_none());
        assert_eq!(table.rows[2].cells[0].shading.unwrap().fill.to_hex(), "F8FAFC");
    }

    #[test]
    fn page_size_and_margin() {
        let outline = Outline::from_record(&FieldRecord::default(), DocumentType::Cv);
        let d = build_document(&outline, &StyleSettings::default(), PaperSize::Letter);
        assert!(d.body.is_empty());
        let xml = d.to_xml();
        assert!(xml.contains(r#"<w:pgSz w:w="12240" w:h="15840"/>"#));
        assert!(xml.contains(r#"w:left="1440""#));
    }

    #[test]
    fn xml_escapes_and_breaks_lines() {
        let mut out = String::new();
        write_run(&mut out, &Run::new("a & b\nc"));
        assert!(out.contains("a &amp; b</w:t><w:br/>"));
    }

    #[test]
    fn solid_shading_xml() {
        let d = doc("bold", "navy", "serif");
        assert!(d.to_xml().contains(r#"<w:shd w:val="solid" w:color="1E3A8A" w:fill="1E3A8A"/>"#));
    }
}
