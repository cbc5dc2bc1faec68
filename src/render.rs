//! Writes a [`LayoutConfig`] out as a PDF with `printpdf`'s op list API.
//!
//! Text uses the base-14 faces, so strings are narrowed to WinAnsi before
//! they are handed over.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::error::ExportError;
use crate::layout_config::{LayoutBox, LayoutConfig, Stroke, TextContent};
use crate::style::PdfFamily;

const MM_PER_PT: f32 = 25.4 / 72.0;

/// Share of the font size between the top of a line and its baseline.
const ASCENT: f32 = 0.75;

/// An embedded picture and the pixel size it was decoded at.
struct Embedded {
    id: XObjectId,
    px: (u32, u32),
}

/// Data URI to embedded XObject. A URI appearing on many pages is embedded once.
#[derive(Default)]
struct ImageTable {
    entries: HashMap<String, Embedded>,
}

impl ImageTable {
    fn collect(doc: &mut PdfDocument, config: &LayoutConfig) -> Self {
        let mut table = Self::default();
        let mut warnings = Vec::new();
        for lbox in config.boxes() {
            let Some(img) = &lbox.image else { continue };
            if table.entries.contains_key(&img.src) {
                continue;
            }
            match embed(doc, &img.src, &mut warnings) {
                Ok(embedded) => {
                    table.entries.insert(img.src.clone(), embedded);
                }
                Err(reason) => log::warn!("Skipping image: {reason}"),
            }
        }
        table
    }

    fn get(&self, src: &str) -> Option<&Embedded> {
        self.entries.get(src)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn embed(doc: &mut PdfDocument, src: &str, warnings: &mut Vec<PdfWarnMsg>) -> Result<Embedded, String> {
    let bytes = parse_data_uri(src)?;
    let decoded = ::image::load_from_memory(&bytes).map_err(|e| format!("decode error: {e}"))?;
    let raw = RawImage::decode_from_bytes(&bytes, warnings).map_err(|e| format!("embed error: {e}"))?;
    Ok(Embedded {
        id: doc.add_image(&raw),
        px: (decoded.width(), decoded.height()),
    })
}

/// Render every page of `config` and return the finished file.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>, ExportError> {
    let size = (Mm(config.page_width_pt * MM_PER_PT), Mm(config.page_height_pt * MM_PER_PT));
    let mut doc = PdfDocument::new(&config.title);
    let images = ImageTable::collect(&mut doc, config);

    let mut pages: Vec<PdfPage> = config
        .pages
        .iter()
        .map(|page| {
            let mut painter = Painter::new(config.page_height_pt, &images);
            for lbox in &page.boxes {
                painter.paint(lbox);
            }
            PdfPage::new(size.0, size.1, painter.ops)
        })
        .collect();
    if pages.is_empty() {
        pages.push(PdfPage::new(size.0, size.1, Vec::new()));
    }
    log::debug!("writing {} page(s) with {} embedded image(s)", pages.len(), images.len());

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    if bytes.is_empty() {
        return Err(ExportError::Pdf("printpdf returned an empty document".to_string()));
    }
    Ok(bytes)
}

/// Accumulates the ops for one page. PDF space has its origin at the bottom
/// left, so every y coordinate is flipped against the page height.
struct Painter<'a> {
    page_height: f32,
    images: &'a ImageTable,
    ops: Vec<Op>,
}

impl<'a> Painter<'a> {
    fn new(page_height: f32, images: &'a ImageTable) -> Self {
        Self {
            page_height,
            images,
            ops: Vec::new(),
        }
    }

    fn paint(&mut self, lbox: &LayoutBox) {
        let top = self.page_height - lbox.y;
        let rect = (lbox.x, top - lbox.height, lbox.x + lbox.width, top);

        if let Some(fill) = &lbox.fill {
            self.fill_rect(rect, fill);
        }
        if let Some(stroke) = &lbox.stroke {
            self.stroke_rect(rect, stroke);
        }
        if let Some(text) = &lbox.text {
            self.text(lbox.x, top, text);
        }
        if let Some(img) = &lbox.image {
            match self.images.get(&img.src) {
                Some(embedded) => self.image(embedded, lbox.x, top - img.height, img.width, img.height),
                None => log::debug!("image at ({}, {}) was not embedded", lbox.x, lbox.y),
            }
        }
        for child in &lbox.children {
            self.paint(child);
        }
    }

    fn fill_rect(&mut self, rect: (f32, f32, f32, f32), color: &[f32; 4]) {
        self.ops.push(Op::SetFillColor { col: rgb(color) });
        self.ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing { points: corners(rect) }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    fn stroke_rect(&mut self, rect: (f32, f32, f32, f32), stroke: &Stroke) {
        self.ops.push(Op::SetOutlineColor { col: rgb(&stroke.color) });
        self.ops.push(Op::SetOutlineThickness { pt: Pt(stroke.width) });
        self.ops.push(Op::DrawLine {
            line: Line {
                points: corners(rect),
                is_closed: true,
            },
        });
    }

    fn text(&mut self, left: f32, top: f32, text: &TextContent) {
        let font = builtin_font(text.font_family, text.bold, text.italic);
        for line in text.lines.iter().filter(|l| !l.text.is_empty()) {
            let baseline = top - line.y_offset - text.font_size * ASCENT;
            self.ops.extend([
                Op::StartTextSection,
                Op::SetTextCursor {
                    pos: Point {
                        x: Pt(left + line.x_offset),
                        y: Pt(baseline),
                    },
                },
                Op::SetFontSizeBuiltinFont {
                    size: Pt(text.font_size),
                    font,
                },
                Op::SetLineHeight {
                    lh: Pt(text.line_height),
                },
                Op::SetFillColor { col: rgb(&text.color) },
                Op::WriteTextBuiltinFont {
                    items: vec![TextItem::Text(to_winlatin(&line.text))],
                    font,
                },
                Op::EndTextSection,
            ]);
        }
    }

    /// Place an image so its pixels stretch over `width` by `height` points.
    fn image(&mut self, embedded: &Embedded, x: f32, bottom: f32, width: f32, height: f32) {
        // At 72 dpi one pixel is one point.
        let scale = |pt: f32, px: u32| if px == 0 { 1.0 } else { pt / px as f32 };
        self.ops.push(Op::UseXobject {
            id: embedded.id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(x)),
                translate_y: Some(Pt(bottom)),
                dpi: Some(72.0),
                scale_x: Some(scale(width, embedded.px.0)),
                scale_y: Some(scale(height, embedded.px.1)),
                rotate: None,
            },
        });
    }
}

fn builtin_font(family: PdfFamily, bold: bool, italic: bool) -> BuiltinFont {
    use BuiltinFont::*;
    let faces = match family {
        PdfFamily::Helvetica => [Helvetica, HelveticaBold, HelveticaOblique, HelveticaBoldOblique],
        PdfFamily::Times => [TimesRoman, TimesBold, TimesItalic, TimesBoldItalic],
        PdfFamily::Courier => [Courier, CourierBold, CourierOblique, CourierBoldOblique],
    };
    faces[usize::from(bold) + 2 * usize::from(italic)]
}

fn rgb(c: &[f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn corners((x1, y1, x2, y2): (f32, f32, f32, f32)) -> Vec<LinePoint> {
    [(x1, y2), (x2, y2), (x2, y1), (x1, y1)]
        .into_iter()
        .map(|(x, y)| LinePoint {
            p: Point { x: Pt(x), y: Pt(y) },
            bezier: false,
        })
        .collect()
}

/// WinAnsi codes above Latin-1 for punctuation that turns up in CV text.
const WINANSI_PUNCTUATION: [(char, u8); 10] = [
    ('\u{20AC}', 0x80),
    ('\u{2026}', 0x85),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{2122}', 0x99),
];

fn winansi_byte(c: char) -> u8 {
    match c {
        '\u{00A0}' => b' ',
        c => u8::try_from(c).unwrap_or_else(|_| {
            WINANSI_PUNCTUATION
                .iter()
                .find(|(p, _)| *p == c)
                .map_or(b'?', |&(_, b)| b)
        }),
    }
}

/// Narrow text to single-byte WinAnsi codes; anything outside it becomes `?`.
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s.chars().map(winansi_byte).collect();
    // SAFETY: the base-14 faces take one WinAnsi byte per glyph, and printpdf
    // copies builtin-font strings into the content stream without decoding
    // them, so bytes above 0x7F are never read back as UTF-8.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Decode the payload of a `data:<mime>;base64,<payload>` URI.
pub(crate) fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let Some(rest) = src.strip_prefix("data:") else {
        let head: String = src.chars().take(40).collect();
        return Err(format!("not a data URI: {head:?}"));
    };
    match rest.split_once(',') {
        Some((meta, payload)) if meta.ends_with(";base64") => BASE64_STD
            .decode(payload.trim())
            .map_err(|e| format!("bad base64 payload: {e}")),
        Some(_) => Err("data URI is not base64 encoded".to_string()),
        None => Err("data URI has no payload".to_string()),
    }
}
