//! PDF export, in two flavours.
//!
//! - **Raster**: the injected [`Rasterizer`] renders the preview markup; the
//!   canvas is cut into page-height tiles, preferring the block boundaries it
//!   reports, and each tile is placed inside the page margin.
//! - **Text**: the [`Outline`] becomes a list of [`FlowItem`]s that
//!   [`paginate`] lays out with base-14 fonts.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::{DynamicImage, ImageFormat};

use crate::error::ExportError;
use crate::layout_config::*;
use crate::outline::{Block, Outline, SectionKind};
use crate::pagination::{paginate, FlowItem, TableFlow, TextStyle, PAGE_MARGIN_PT};
use crate::pipeline::{PaperSize, Quality};
use crate::render::render_pdf;
use crate::services::{RasterCanvas, RasterOptions, Rasterizer};
use crate::style::{Color, StyleSettings, Template};

/// CSS pixels per point.
const PX_PER_PT: f32 = 96.0 / 72.0;

const CONTACT_SEP: &str = " | ";

fn hex(h: &str) -> Color {
    Color::from_hex(h).unwrap_or(Color::BLACK)
}

// ---------------------------------------------------------------------------
// Text path
// ---------------------------------------------------------------------------

/// Turn an outline into flow items styled for the selected template.
pub fn build_flow(outline: &Outline, style: &StyleSettings) -> Vec<FlowItem> {
    let family = style.font_key.pdf_family();
    let accent = style.accent();
    let template = style.template;
    let text = |size: f32| TextStyle::new(family, size);
    let mut items = Vec::new();

    // ── Header ────────────────────────────────────────────────────────────
    let header = &outline.header;
    if !header.is_blank() {
        let contact = header.contact_line(CONTACT_SEP);
        match template {
            Template::Bold => {
                let mut lines = Vec::new();
                if !header.name.is_empty() {
                    lines.push((header.name.clone(), text(24.0).bold(true).color(Color::WHITE)));
                }
                if !contact.is_empty() {
                    lines.push((contact, text(10.0).color(Color::WHITE)));
                }
                items.push(FlowItem::band(lines, accent, 18.0).spaced(0.0, 18.0));
            }
            Template::Modern | Template::Classic => {
                let (name_size, align, name) = if template == Template::Classic {
                    (18.0, TextAlign::Left, header.name.to_uppercase())
                } else {
                    (22.0, TextAlign::Center, header.name.clone())
                };
                if !name.is_empty() {
                    items.push(FlowItem::text(name, text(name_size).bold(true).align(align)).spaced(0.0, 4.0));
                }
                if !contact.is_empty() {
                    items.push(FlowItem::text(contact, text(10.0).color(hex("#475569")).align(align)));
                }
                let rule = if template == Template::Classic { 2.0 } else { 3.0 };
                items.push(FlowItem::rule(rule, accent).spaced(8.0, 12.0));
            }
        }
    }

    // ── Sections ──────────────────────────────────────────────────────────
    let (heading_size, heading_rule) = match template {
        Template::Modern => (14.0, 2.0),
        Template::Classic => (12.0, 1.0),
        Template::Bold => (16.0, 2.0),
    };
    let classic = template == Template::Classic;

    for section in &outline.sections {
        let title = if classic {
            section.title.to_uppercase()
        } else {
            section.title.to_string()
        };
        items.push(
            FlowItem::text(title, text(heading_size).bold(true).color(accent))
                .spaced(14.0, 2.0)
                .keep_with_next(),
        );
        items.push(FlowItem::rule(heading_rule, accent).spaced(0.0, 6.0).keep_with_next());

        match &section.body {
            Block::Paragraph(p) => {
                let style = text(12.0).italic(classic && section.kind == SectionKind::Summary);
                items.push(FlowItem::text(p.clone(), style).spaced(0.0, 4.0));
            }
            Block::Entries(entries) => {
                for e in entries {
                    let has_subtitle = !e.subtitle.is_empty();
                    let has_details = !e.details.is_empty();
                    if !e.title.is_empty() {
                        let mut item = FlowItem::text(e.title.clone(), text(12.0).bold(true)).spaced(8.0, 2.0);
                        if has_subtitle || has_details {
                            item = item.keep_with_next();
                        }
                        items.push(item);
                    }
                    if has_subtitle {
                        let style = text(10.0).color(hex("#666666")).italic(classic);
                        let mut item = FlowItem::text(e.subtitle.clone(), style).spaced(2.0, 2.0);
                        if has_details {
                            item = item.keep_with_next();
                        }
                        items.push(item);
                    }
                    if has_details {
                        items.push(FlowItem::text(e.details.clone(), text(10.0)).spaced(2.0, 4.0));
                    }
                }
            }
            Block::Table(table) => {
                items.push(
                    FlowItem::table(TableFlow {
                        headers: table.headers.clone(),
                        rows: table.rows.clone(),
                        header_style: text(11.0).bold(true).color(Color::WHITE),
                        body_style: text(10.0),
                        header_fill: accent,
                        header_border: accent.darken(),
                        stripe_fill: hex("#F8FAFC"),
                        border: hex("#E2E8F0"),
                        cell_padding: 5.0,
                    })
                    .spaced(4.0, 6.0),
                );
            }
            Block::Tags(tags) => {
                items.push(FlowItem::text(tags.join(", "), text(10.0)).spaced(2.0, 4.0));
            }
        }
    }
    items
}

/// Lay out the outline on pages of `paper`, inside a one-inch margin.
pub fn layout_text(outline: &Outline, style: &StyleSettings, paper: PaperSize, title: &str) -> LayoutConfig {
    let (w, h) = paper.points();
    let config = paginate(&build_flow(outline, style), title, w, h, PAGE_MARGIN_PT);
    log::debug!("Text layout: {} page(s) on {}", config.pages.len(), paper.key());
    config
}

pub fn export_text(outline: &Outline, style: &StyleSettings, paper: PaperSize, title: &str) -> Result<Vec<u8>, ExportError> {
    render_pdf(&layout_text(outline, style, paper, title))
}

// ---------------------------------------------------------------------------
// Raster path
// ---------------------------------------------------------------------------

/// Options for a raster of the printable width of `paper`.
pub fn raster_options(paper: PaperSize, quality: Quality) -> RasterOptions {
    let (w, _) = paper.points();
    RasterOptions {
        scale: quality.scale(),
        width_px: ((w - 2.0 * PAGE_MARGIN_PT) * PX_PER_PT).round() as u32,
        background: Color::WHITE,
    }
}

/// Cut a canvas into page tiles, one per page.
///
/// Each tile is as tall as the page allows, shortened to the last safe break
/// that fits. Without a usable break the tile is cut at full height.
pub fn tile_canvas(canvas: &RasterCanvas, paper: PaperSize, title: &str) -> Result<LayoutConfig, ExportError> {
    let (page_w, page_h) = paper.points();
    let mut config = LayoutConfig::new(title, page_w, page_h, PAGE_MARGIN_PT);
    let (img_w, img_h) = canvas.image.dimensions();
    if img_w == 0 || img_h == 0 {
        return Err(ExportError::Library {
            library: "rasterizer",
            message: "empty canvas".to_string(),
        });
    }

    let content_w = config.content_width();
    let px_per_pt = img_w as f32 / content_w;
    let capacity = ((config.content_height() * px_per_pt).floor() as u32).max(1);

    let mut top = 0u32;
    while top < img_h {
        let limit = top + capacity;
        let bottom = if limit >= img_h {
            img_h
        } else {
            canvas
                .safe_breaks
                .iter()
                .copied()
                .filter(|&b| b > top && b <= limit)
                .max()
                .unwrap_or(limit)
        };

        let tile = image::imageops::crop_imm(&canvas.image, 0, top, img_w, bottom - top).to_image();
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(tile).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let height = (bottom - top) as f32 / px_per_pt;
        let mut lbox = LayoutBox::new(PAGE_MARGIN_PT, PAGE_MARGIN_PT, content_w, height);
        lbox.image = Some(ImageContent {
            src: format!("data:image/png;base64,{}", BASE64_STD.encode(&png)),
            width: content_w,
            height,
        });
        config.pages.push(PageLayout {
            page_index: config.pages.len(),
            boxes: vec![lbox],
        });
        top = bottom;
    }
    log::debug!("Raster {}x{} px cut into {} page(s)", img_w, img_h, config.pages.len());
    Ok(config)
}

pub fn export_raster(
    rasterizer: &dyn Rasterizer,
    markup: &str,
    stylesheet: &str,
    paper: PaperSize,
    quality: Quality,
    title: &str,
) -> Result<Vec<u8>, ExportError> {
    let canvas = rasterizer.rasterize(markup, stylesheet, &raster_options(paper, quality))?;
    render_pdf(&tile_canvas(&canvas, paper, title)?)
}
