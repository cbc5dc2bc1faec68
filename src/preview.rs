//! Preview renderer – regenerates the whole preview markup from the current
//! [`FieldRecord`] and [`StyleSettings`].
//!
//! Output is an HTML fragment rooted at a `preview-content` element. Only
//! sections with content get a block; all user text is escaped.

use std::fmt::Write as _;

use crate::outline::*;
use crate::record::FieldRecord;
use crate::samples;
use crate::session::DocumentType;
use crate::style::{StyleSettings, Template};

/// Shown in the header when the name field is blank.
pub const NAME_FALLBACK: &str = "Your Name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Fill a blank header with example values (display only).
    pub placeholders: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self { placeholders: true }
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape user text and turn newlines into `<br>`.
pub fn format_text(text: &str) -> String {
    escape_html(text.trim()).replace("\r\n", "\n").replace('\n', "<br>")
}

/// Render the preview markup for `record`.
pub fn render(
    record: &FieldRecord,
    style: &StyleSettings,
    doc_type: DocumentType,
    options: PreviewOptions,
) -> String {
    let outline = Outline::from_record(record, doc_type);
    render_outline(&outline, style, options)
}

pub fn render_outline(outline: &Outline, style: &StyleSettings, options: PreviewOptions) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div class="preview-content template-{} color-{} font-{}" style="--accent-color: {}; font-family: {};">"#,
        style.template.key(),
        style.color_key.key(),
        style.font_key.key(),
        style.accent().to_css(),
        escape_html(style.font_key.css_stack()),
    );
    render_header(&mut html, outline, options);
    for section in &outline.sections {
        render_section(&mut html, section);
    }
    html.push_str("</div>");
    html
}

fn render_header(html: &mut String, outline: &Outline, options: PreviewOptions) {
    let example = options
        .placeholders
        .then(|| Header::from_record(&samples::example_record(outline.doc_type)));

    let (name, name_placeholder) = match (&outline.header.name, &example) {
        (n, _) if !n.is_empty() => (n.clone(), false),
        (_, Some(ex)) => (ex.name.clone(), true),
        _ => (NAME_FALLBACK.to_string(), true),
    };
    let (contact, contact_placeholder) = match &example {
        Some(ex) if outline.header.contact.is_empty() => (ex.contact_line(BULLET_SEP), true),
        _ => (outline.header.contact_line(BULLET_SEP), false),
    };

    html.push_str(r#"<div class="preview-header-section">"#);
    let _ = write!(
        html,
        r#"<div class="preview-name{}">{}</div>"#,
        if name_placeholder { " placeholder" } else { "" },
        escape_html(&name)
    );
    if !contact.is_empty() {
        let _ = write!(
            html,
            r#"<div class="preview-contact{}">{}</div>"#,
            if contact_placeholder { " placeholder" } else { "" },
            escape_html(&contact)
        );
    }
    html.push_str("</div>");
}

fn render_section(html: &mut String, section: &Section) {
    if let (SectionKind::Summary, Block::Paragraph(text)) = (section.kind, &section.body) {
        let _ = write!(html, r#"<div class="preview-summary">{}</div>"#, format_text(text));
        return;
    }

    let _ = write!(
        html,
        r#"<div class="preview-section-wrapper preview-{}-section"><div class="preview-section-title">{}</div>"#,
        section.kind.slug(),
        escape_html(section.title)
    );
    match &section.body {
        Block::Paragraph(text) => {
            let _ = write!(html, r#"<div class="preview-entry-details">{}</div>"#, format_text(text));
        }
        Block::Entries(entries) => {
            for entry in entries {
                html.push_str(r#"<div class="preview-entry">"#);
                if !entry.title.is_empty() {
                    let _ = write!(html, r#"<div class="preview-entry-title">{}</div>"#, escape_html(&entry.title));
                }
                if !entry.subtitle.is_empty() {
                    let _ = write!(
                        html,
                        r#"<div class="preview-entry-subtitle">{}</div>"#,
                        escape_html(&entry.subtitle)
                    );
                }
                if !entry.details.is_empty() {
                    let _ = write!(
                        html,
                        r#"<div class="preview-entry-details">{}</div>"#,
                        format_text(&entry.details)
                    );
                }
                html.push_str("</div>");
            }
        }
        Block::Table(table) => render_table(html, table),
        Block::Tags(tags) => {
            html.push_str(r#"<div class="preview-skills">"#);
            for tag in tags {
                let _ = write!(html, r#"<span class="preview-skill-item">{}</span>"#, escape_html(tag));
            }
            html.push_str("</div>");
        }
    }
    html.push_str("</div>");
}

fn render_table(html: &mut String, table: &TableBlock) {
    html.push_str(r#"<table class="preview-education-table"><thead><tr>"#);
    for h in &table.headers {
        let _ = write!(html, "<th>{}</th>", escape_html(h));
    }
    html.push_str("</tr></thead><tbody>");
    for (i, row) in table.rows.iter().enumerate() {
        if TableBlock::is_striped(i) {
            html.push_str(r#"<tr class="striped">"#);
        } else {
            html.push_str("<tr>");
        }
        for cell in row {
            let _ = write!(html, "<td>{}</td>", format_text(cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
}

/// Template-specific stylesheet for the preview and the HTML Word fallback.
pub fn stylesheet(style: &StyleSettings) -> String {
    let accent = style.accent().to_css();
    let border = style.accent().darken().to_css();
    let mut css = format!(
        r#".preview-content {{ font-family: {font}; font-size: 12pt; line-height: 1.6; color: #1e293b; }}
.preview-header-section {{ margin-bottom: 15pt; }}
.preview-name {{ font-size: 20pt; font-weight: bold; margin-bottom: 10pt; }}
.preview-contact {{ font-size: 10pt; color: #475569; margin-bottom: 15pt; }}
.placeholder {{ opacity: 0.5; }}
.preview-summary {{ font-style: italic; margin-bottom: 15pt; }}
.preview-section-title {{ font-size: 14pt; font-weight: bold; margin-top: 15pt; margin-bottom: 10pt; color: {accent}; border-bottom: 1px solid {accent}; padding-bottom: 3pt; page-break-after: avoid; }}
.preview-entry {{ page-break-inside: avoid; margin-bottom: 8pt; }}
.preview-entry-title {{ font-size: 12pt; font-weight: bold; }}
.preview-entry-subtitle {{ font-size: 10pt; color: #666; }}
.preview-entry-details {{ font-size: 10pt; margin-top: 5pt; }}
.preview-skills {{ display: flex; flex-wrap: wrap; gap: 4pt 8pt; }}
.preview-skill-item {{ color: #334155; }}
.preview-education-table {{ width: 100%; border-collapse: collapse; margin: 10pt 0; table-layout: fixed; }}
.preview-education-table th {{ background: {accent}; color: white; padding: 6pt; text-align: left; border: 1px solid {border}; }}
.preview-education-table td {{ padding: 6pt; border: 1px solid #E2E8F0; overflow-wrap: break-word; }}
.preview-education-table tr.striped {{ background: #F8FAFC; }}
"#,
        font = style.font_key.css_stack(),
    );

    let template_css = match style.template {
        Template::Modern => format!(
            r#".template-modern .preview-header-section {{ text-align: center; padding-bottom: 15pt; border-bottom: 3pt solid {accent}; margin-bottom: 20pt; }}
.template-modern .preview-name {{ font-size: 22pt; font-weight: 700; }}
.template-modern .preview-section-title {{ border-bottom: 2pt solid {accent}; padding-bottom: 6pt; }}
"#
        ),
        Template::Classic => format!(
            r#".template-classic .preview-header-section {{ text-align: left; padding-bottom: 12pt; border-bottom: 2pt solid {accent}; margin-bottom: 15pt; }}
.template-classic .preview-name {{ text-transform: uppercase; letter-spacing: 1pt; font-size: 18pt; }}
.template-classic .preview-section-title {{ text-transform: uppercase; letter-spacing: 1pt; font-size: 12pt; border-bottom: 1pt solid {accent}; padding-bottom: 2pt; }}
.template-classic .preview-entry-subtitle {{ font-style: italic; }}
"#
        ),
        Template::Bold => format!(
            r#".template-bold .preview-header-section {{ background: {accent}; color: white; padding: 20pt; border-radius: 6pt; margin-bottom: 20pt; }}
.template-bold .preview-name {{ font-size: 24pt; font-weight: 800; color: white; }}
.template-bold .preview-contact {{ color: white; }}
.template-bold .preview-section-title {{ font-size: 16pt; font-weight: 800; }}
"#
        ),
    };
    css.push_str(&template_css);
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ListName, Skills};

    fn plain() -> PreviewOptions {
        PreviewOptions { placeholders: false }
    }

    #[test]
    fn blank_record_renders_header_only() {
        let html = render(&FieldRecord::default(), &StyleSettings::default(), DocumentType::Cv, plain());
        assert!(html.contains(NAME_FALLBACK));
        assert!(!html.contains("preview-section-title"));
    }

    #[test]
    fn placeholders_fill_header_but_not_sections() {
        let html = render(
            &FieldRecord::default(),
            &StyleSettings::default(),
            DocumentType::Cv,
            PreviewOptions::default(),
        );
        assert!(html.contains("John Banda"));
        assert!(html.contains("preview-name placeholder"));
        assert!(!html.contains("preview-section-title"));
    }

    #[test]
    fn user_text_is_escaped() {
        let mut record = FieldRecord::default();
        record.name = "<script>alert(1)</script>".into();
        record.summary = "line one\nline & two".into();
        let html = render(&record, &StyleSettings::default(), DocumentType::Cv, plain());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("line one<br>line &amp; two"));
    }

    #[test]
    fn education_renders_as_striped_table() {
        let mut record = FieldRecord::default();
        record.set_entry_field(ListName::Education, 0, "school", "A".into());
        let i = record.push_entry(ListName::Education, None);
        record.set_entry_field(ListName::Education, i, "school", "B".into());
        let html = render(&record, &StyleSettings::default(), DocumentType::Cv, plain());
        assert!(html.contains("<th>Year</th><th>Level</th><th>School</th><th>Qualification</th>"));
        assert_eq!(html.matches("<tr").count(), 3);
        assert_eq!(html.matches(r#"class="striped""#).count(), 1);
    }

    #[test]
    fn skills_render_as_tags() {
        let mut record = FieldRecord::default();
        record.skills = Skills::Text("Rust,\nSQL".into());
        let html = render(&record, &StyleSettings::default(), DocumentType::Cv, plain());
        assert!(html.contains(r#"<span class="preview-skill-item">Rust</span><span class="preview-skill-item">SQL</span>"#));
    }

    #[test]
    fn stylesheet_follows_template_and_accent() {
        let css = stylesheet(&StyleSettings::from_keys("bold", "navy", "serif"));
        assert!(css.contains(".template-bold .preview-header-section { background: #1e3a8a;"));
        assert!(css.contains("\"Times New Roman\", Times, serif"));
        let classic = stylesheet(&StyleSettings::from_keys("classic", "", ""));
        assert!(classic.contains("text-transform: uppercase"));
    }
}
