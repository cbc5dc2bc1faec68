//! Word-processor packaging.
//!
//! [`OoxmlPackager`] zips a [`Document`] into a minimal `.docx`. When the
//! structured path fails, [`html_word_document`] wraps the preview markup
//! in an HTML page Word opens as a `.doc`.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::docx::{xml_escape, Document};
use crate::error::ExportError;
use crate::pipeline::PaperSize;
use crate::preview::{escape_html, stylesheet};
use crate::services::DocumentBuilder;
use crate::style::StyleSettings;

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const DOC_MIME: &str = "application/msword";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Zips the document parts. Entry timestamps are fixed, so the same tree
/// always yields the same bytes.
#[derive(Debug, Clone, Default)]
pub struct OoxmlPackager {
    /// `dc:title` in the core properties.
    pub title: Option<String>,
}

impl OoxmlPackager {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }

    fn core_xml(&self) -> String {
        let title = self.title.as_deref().map(xml_escape).unwrap_or_default();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{title}</dc:title><dc:creator>cv-forge</dc:creator></cp:coreProperties>"#
        )
    }
}

impl DocumentBuilder for OoxmlPackager {
    fn build(&self, document: &Document) -> Result<Vec<u8>, ExportError> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let parts: [(&str, String); 6] = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            ("docProps/core.xml", self.core_xml()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
            ("word/document.xml", document.to_xml()),
            ("word/styles.xml", document.styles_xml()),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            zip.start_file(name, options)?;
            zip.write_all(body.as_bytes())?;
        }
        let bytes = zip.finish()?.into_inner();
        log::debug!("Packaged .docx: {} bytes", bytes.len());
        Ok(bytes)
    }
}

/// An HTML page Word opens as a document: the preview markup, its
/// stylesheet and `@page` rules for the paper size with a one-inch margin.
pub fn html_word_document(markup: &str, style: &StyleSettings, paper: PaperSize, title: &str) -> String {
    format!(
        r#"<html xmlns:o="urn:schemas-microsoft-com:office:office" xmlns:w="urn:schemas-microsoft-com:office:word" xmlns="http://www.w3.org/TR/REC-html40">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
@page {{ size: {page}; margin: 1in; }}
body {{ font-family: {font}; font-size: 12pt; line-height: 1.6; margin: 0; }}
.content-wrapper {{ width: 100%; }}
{css}</style>
</head>
<body>
<div class="content-wrapper">{markup}</div>
</body>
</html>
"#,
        title = escape_html(title),
        page = paper.css_name(),
        font = style.font_key.css_stack(),
        css = stylesheet(style),
    )
}
