//! Positioned page content shared by the text paginator, the raster tiler
//! and the PDF writer. Coordinates are points from the page's top-left.

use serde::{Deserialize, Serialize};

use crate::style::PdfFamily;

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Written to the PDF document info.
    pub title: String,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    /// Blank border kept on every side.
    pub margin_pt: f32,
    pub pages: Vec<PageLayout>,
}

#[derive(Debug, Clone)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A rectangle painted in order: fill, stroke, text, image, then children.
#[derive(Debug, Clone)]
pub struct LayoutBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: Option<[f32; 4]>,
    pub stroke: Option<Stroke>,
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,
    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Copy)]
pub struct Stroke {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Already wrapped and aligned; the writer only places glyphs.
#[derive(Debug, Clone)]
pub struct TextContent {
    pub lines: Vec<TextLine>,
    pub font_family: PdfFamily,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: [f32; 4],
    pub line_height: f32,
}

#[derive(Debug, Clone)]
pub struct TextLine {
    pub text: String,
    pub x_offset: f32,
    /// Top of the line, measured from the top of the box.
    pub y_offset: f32,
}

#[derive(Debug, Clone)]
pub struct ImageContent {
    /// A base64 `data:` URI.
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    pub fn new(title: impl Into<String>, page_width_pt: f32, page_height_pt: f32, margin_pt: f32) -> Self {
        Self {
            title: title.into(),
            page_width_pt,
            page_height_pt,
            margin_pt,
            pages: Vec::new(),
        }
    }

    pub fn content_width(&self) -> f32 {
        self.page_width_pt - 2.0 * self.margin_pt
    }

    pub fn content_height(&self) -> f32 {
        self.page_height_pt - 2.0 * self.margin_pt
    }

    /// Every box on every page, parents before children.
    pub fn boxes(&self) -> impl Iterator<Item = &LayoutBox> {
        self.pages.iter().flat_map(|p| p.boxes.iter()).flat_map(|b| {
            let mut all = Vec::new();
            b.walk(&mut |d| all.push(d));
            all
        })
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            fill: None,
            stroke: None,
            text: None,
            image: None,
            children: Vec::new(),
        }
    }

    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a LayoutBox)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_area_excludes_margins() {
        let config = LayoutConfig::new("t", 612.0, 792.0, 72.0);
        assert_eq!(config.content_width(), 468.0);
        assert_eq!(config.content_height(), 648.0);
    }

    #[test]
    fn boxes_flattens_nested_children() {
        let mut config = LayoutConfig::new("t", 612.0, 792.0, 72.0);
        let mut row = LayoutBox::new(72.0, 72.0, 468.0, 20.0);
        row.children.push(LayoutBox::new(72.0, 72.0, 234.0, 20.0));
        row.children.push(LayoutBox::new(306.0, 72.0, 234.0, 20.0));
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![row, LayoutBox::new(72.0, 100.0, 468.0, 2.0)],
        });
        assert_eq!(config.boxes().count(), 4);
        assert_eq!(config.boxes().map(|b| b.bottom()).fold(0.0, f32::max), 102.0);
    }
}
