//! Export pipeline – ties together the outline, the preview markup and the
//! injected collaborators into a single call per output format.
//!
//! Each format has a preferred and a secondary method:
//!
//! | Format | Preferred | Secondary |
//! |---|---|---|
//! | PDF | rasterised preview, tiled | text layout from the outline |
//! | Word | structured tree → `.docx` | preview HTML → `.doc` |
//!
//! A recoverable failure of the preferred method is logged at `warn` and the
//! secondary method runs. An empty outline aborts with
//! [`ExportError::NoContent`] before either is tried.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::docx::build_document;
use crate::docx_export::{html_word_document, OoxmlPackager, DOCX_MIME, DOC_MIME};
use crate::error::ExportError;
use crate::outline::Outline;
use crate::pdf_export::{export_raster, export_text};
use crate::preview::{render_outline, stylesheet, PreviewOptions};
use crate::record::FieldRecord;
use crate::services::{DocumentBuilder, Rasterizer, UnavailableRasterizer};
use crate::session::DocumentType;
use crate::style::StyleSettings;

pub const PDF_MIME: &str = "application/pdf";

/// Paper sizes offered for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PaperSize {
    pub const ALL: [PaperSize; 3] = [PaperSize::A4, PaperSize::Letter, PaperSize::Legal];

    pub fn key(self) -> &'static str {
        match self {
            PaperSize::A4 => "a4",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Width and height in PDF points.
    pub fn points(self) -> (f32, f32) {
        match self {
            PaperSize::A4 => (595.28, 841.89),
            PaperSize::Letter => (612.0, 792.0),
            PaperSize::Legal => (612.0, 1008.0),
        }
    }

    /// Width and height in twips (1/1440 inch).
    pub fn twips(self) -> (u32, u32) {
        match self {
            PaperSize::A4 => (11906, 16838),
            PaperSize::Letter => (12240, 15840),
            PaperSize::Legal => (12240, 20160),
        }
    }

    /// Value for a CSS `@page { size: … }` rule.
    pub fn css_name(self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    High,
}

impl Quality {
    pub fn key(self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::High => "high",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(Quality::Standard),
            "high" => Some(Quality::High),
            _ => None,
        }
    }

    /// Device pixels per CSS pixel for the raster path.
    pub fn scale(self) -> f32 {
        match self {
            Quality::Standard => 2.0,
            Quality::High => 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "PDF")]
    Pdf,
    #[serde(rename = "DOCX")]
    Docx,
    /// HTML-based Word document.
    #[serde(rename = "DOC")]
    Doc,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Doc => "doc",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Pdf => PDF_MIME,
            ExportFormat::Docx => DOCX_MIME,
            ExportFormat::Doc => DOC_MIME,
        }
    }
}

/// Per-export options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    pub paper: PaperSize,
    pub quality: Quality,
    /// Overrides the default `CV.pdf` / `Resume.docx` style name.
    pub file_name: Option<String>,
}

impl ExportRequest {
    pub fn new(paper: PaperSize, quality: Quality) -> Self {
        Self {
            paper,
            quality,
            file_name: None,
        }
    }

    pub fn file_name(&self, doc_type: DocumentType, format: ExportFormat) -> String {
        let stem = self
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| {
                ["pdf", "docx", "doc"]
                    .iter()
                    .find_map(|ext| n.strip_suffix(&format!(".{ext}")))
                    .unwrap_or(n)
            })
            .unwrap_or(doc_type.file_stem());
        format!("{stem}.{}", format.extension())
    }
}

/// A finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    /// The secondary method produced this artifact.
    pub used_fallback: bool,
}

impl Artifact {
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    /// `data:` URL a host can hand to a download link.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime(), BASE64_STD.encode(&self.bytes))
    }

    /// Write into `dir` under the final component of the artifact's file
    /// name; directory parts are ignored.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let name = Path::new(&self.file_name).file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("no file name in {:?}", self.file_name))
        })?;
        let path = dir.join(name);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Owns the injected rasteriser and document builder.
pub struct ExportPipeline {
    rasterizer: Box<dyn Rasterizer>,
    builder: Box<dyn DocumentBuilder>,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new(Box::new(UnavailableRasterizer), Box::new(OoxmlPackager::default()))
    }
}

impl ExportPipeline {
    pub fn new(rasterizer: Box<dyn Rasterizer>, builder: Box<dyn DocumentBuilder>) -> Self {
        Self { rasterizer, builder }
    }

    pub fn set_rasterizer(&mut self, rasterizer: Box<dyn Rasterizer>) {
        self.rasterizer = rasterizer;
    }

    pub fn set_builder(&mut self, builder: Box<dyn DocumentBuilder>) {
        self.builder = builder;
    }

    fn outline(record: &FieldRecord, doc_type: DocumentType) -> Result<Outline, ExportError> {
        let outline = Outline::from_record(record, doc_type);
        if outline.is_empty() {
            log::error!("Export aborted: no preview content");
            return Err(ExportError::NoContent);
        }
        Ok(outline)
    }

    fn title(outline: &Outline) -> String {
        if outline.header.name.is_empty() {
            outline.doc_type.file_stem().to_string()
        } else {
            outline.header.name.clone()
        }
    }

    /// Exported markup never carries placeholders.
    fn markup(outline: &Outline, style: &StyleSettings) -> String {
        render_outline(outline, style, PreviewOptions { placeholders: false })
    }

    pub fn export_pdf(
        &self,
        record: &FieldRecord,
        doc_type: DocumentType,
        style: &StyleSettings,
        request: &ExportRequest,
    ) -> Result<Artifact, ExportError> {
        let outline = Self::outline(record, doc_type)?;
        let title = Self::title(&outline);
        let markup = Self::markup(&outline, style);

        let raster = export_raster(
            self.rasterizer.as_ref(),
            &markup,
            &stylesheet(style),
            request.paper,
            request.quality,
            &title,
        );
        let (bytes, used_fallback) = match raster {
            Ok(bytes) => (bytes, false),
            Err(e) if e.is_recoverable() => {
                log::warn!("Raster PDF unavailable ({e}); using text layout");
                (export_text(&outline, style, request.paper, &title)?, true)
            }
            Err(e) => return Err(e),
        };

        let artifact = Artifact {
            file_name: request.file_name(doc_type, ExportFormat::Pdf),
            format: ExportFormat::Pdf,
            bytes,
            used_fallback,
        };
        log::info!("Exported {} ({} bytes)", artifact.file_name, artifact.bytes.len());
        Ok(artifact)
    }

    pub fn export_word(
        &self,
        record: &FieldRecord,
        doc_type: DocumentType,
        style: &StyleSettings,
        request: &ExportRequest,
    ) -> Result<Artifact, ExportError> {
        let outline = Self::outline(record, doc_type)?;
        let document = build_document(&outline, style, request.paper);

        let artifact = match self.builder.build(&document) {
            Ok(bytes) => Artifact {
                file_name: request.file_name(doc_type, ExportFormat::Docx),
                format: ExportFormat::Docx,
                bytes,
                used_fallback: false,
            },
            Err(e) if e.is_recoverable() => {
                log::warn!("Structured DOCX failed ({e}); exporting HTML Word document");
                let html = html_word_document(&Self::markup(&outline, style), style, request.paper, &Self::title(&outline));
                Artifact {
                    file_name: request.file_name(doc_type, ExportFormat::Doc),
                    format: ExportFormat::Doc,
                    bytes: html.into_bytes(),
                    used_fallback: true,
                }
            }
            Err(e) => return Err(e),
        };
        log::info!("Exported {} ({} bytes)", artifact.file_name, artifact.bytes.len());
        Ok(artifact)
    }

    /// Export in `format`. `Doc` goes straight to the HTML document.
    pub fn export(
        &self,
        format: ExportFormat,
        record: &FieldRecord,
        doc_type: DocumentType,
        style: &StyleSettings,
        request: &ExportRequest,
    ) -> Result<Artifact, ExportError> {
        match format {
            ExportFormat::Pdf => self.export_pdf(record, doc_type, style, request),
            ExportFormat::Docx => self.export_word(record, doc_type, style, request),
            ExportFormat::Doc => {
                let outline = Self::outline(record, doc_type)?;
                let html = html_word_document(&Self::markup(&outline, style), style, request.paper, &Self::title(&outline));
                Ok(Artifact {
                    file_name: request.file_name(doc_type, ExportFormat::Doc),
                    format: ExportFormat::Doc,
                    bytes: html.into_bytes(),
                    used_fallback: false,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::Document;
    use crate::samples::example_record;
    use crate::services::{RasterCanvas, RasterOptions};
    use image::{Rgba, RgbaImage};

    struct FailingBuilder;

    impl DocumentBuilder for FailingBuilder {
        fn build(&self, _: &Document) -> Result<Vec<u8>, ExportError> {
            Err(ExportError::Library {
                library: "docx",
                message: "boom".into(),
            })
        }
    }

    struct WhiteRasterizer;

    impl Rasterizer for WhiteRasterizer {
        fn rasterize(&self, _: &str, _: &str, options: &RasterOptions) -> Result<RasterCanvas, ExportError> {
            let width = (options.width_px as f32 * options.scale) as u32;
            Ok(RasterCanvas {
                image: RgbaImage::from_pixel(width, 400, Rgba([255, 255, 255, 255])),
                safe_breaks: vec![200],
            })
        }
    }

    fn cv() -> FieldRecord {
        example_record(DocumentType::Cv)
    }

    #[test]
    fn paper_dimensions() {
        assert_eq!(PaperSize::parse("Letter"), Some(PaperSize::Letter));
        assert_eq!(PaperSize::Legal.points(), (612.0, 1008.0));
        assert_eq!(PaperSize::A4.twips(), (11906, 16838));
        assert_eq!(Quality::High.scale(), 3.0);
    }

    #[test]
    fn file_names() {
        let mut req = ExportRequest::default();
        assert_eq!(req.file_name(DocumentType::Resume, ExportFormat::Docx), "Resume.docx");
        req.file_name = Some("jane.pdf".into());
        assert_eq!(req.file_name(DocumentType::Cv, ExportFormat::Doc), "jane.doc");
    }

    #[test]
    fn empty_record_is_no_content() {
        let err = ExportPipeline::default()
            .export_pdf(&FieldRecord::default(), DocumentType::Cv, &StyleSettings::default(), &ExportRequest::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::NoContent));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn pdf_falls_back_to_text_layout() {
        let art = ExportPipeline::default()
            .export_pdf(&cv(), DocumentType::Cv, &StyleSettings::default(), &ExportRequest::default())
            .unwrap();
        assert!(art.used_fallback);
        assert_eq!(art.file_name, "CV.pdf");
        assert_eq!(&art.bytes[0..5], b"%PDF-");
    }

    #[test]
    fn pdf_uses_rasterizer_when_available() {
        let pipeline = ExportPipeline::new(Box::new(WhiteRasterizer), Box::new(OoxmlPackager::default()));
        let art = pipeline
            .export_pdf(&cv(), DocumentType::Cv, &StyleSettings::default(), &ExportRequest::default())
            .unwrap();
        assert!(!art.used_fallback);
        assert_eq!(&art.bytes[0..5], b"%PDF-");
    }

    #[test]
    fn word_falls_back_to_html_doc() {
        let pipeline = ExportPipeline::new(Box::new(UnavailableRasterizer), Box::new(FailingBuilder));
        let art = pipeline
            .export_word(&cv(), DocumentType::Cv, &StyleSettings::default(), &ExportRequest::default())
            .unwrap();
        assert_eq!(art.format, ExportFormat::Doc);
        assert_eq!(art.file_name, "CV.doc");
        assert_eq!(art.mime(), "application/msword");
        assert!(String::from_utf8(art.bytes).unwrap().contains("John Banda"));
    }

    #[test]
    fn data_url_has_mime() {
        let art = Artifact {
            file_name: "CV.pdf".into(),
            format: ExportFormat::Pdf,
            bytes: vec![1, 2, 3],
            used_fallback: false,
        };
        assert_eq!(art.data_url(), "data:application/pdf;base64,AQID");
    }

    #[test]
    fn save_to_stays_inside_the_directory() {
        let dir = std::env::temp_dir().join(format!("cv-forge-save-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let artifact = |name: &str| Artifact {
            file_name: name.to_string(),
            format: ExportFormat::Pdf,
            bytes: b"%PDF-".to_vec(),
            used_fallback: false,
        };

        let path = artifact("../../escape.pdf").save_to(&dir).unwrap();
        assert_eq!(path, dir.join("escape.pdf"));
        assert!(path.exists());
        assert_eq!(artifact("/tmp/abs.pdf").save_to(&dir).unwrap(), dir.join("abs.pdf"));
        assert!(matches!(artifact("..").save_to(&dir), Err(ExportError::Io(_))));

        let _ = fs::remove_dir_all(&dir);
    }
}
