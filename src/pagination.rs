//! Pagination – flows a list of blocks down fixed-size pages.
//!
//! Handles:
//! - page boundaries inside a uniform margin
//! - text blocks split between lines
//! - tables broken between rows, with the header row repeated on every page;
//!   a row taller than a page is broken between its lines
//! - keep-with-next chains (a heading never ends a page)
//! - bands (coloured header blocks), kept whole unless taller than a page

use crate::fonts::{wrap_text, FontMetrics};
use crate::layout_config::*;
use crate::outline::TableBlock;
use crate::style::{Color, PdfFamily};

/// One inch, in points.
pub const PAGE_MARGIN_PT: f32 = 72.0;

const EPS: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub family: PdfFamily,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: Color,
    pub align: TextAlign,
    /// Line height as a multiple of `size`.
    pub line_height: f32,
}

impl TextStyle {
    pub fn new(family: PdfFamily, size: f32) -> Self {
        Self {
            family,
            size,
            bold: false,
            italic: false,
            color: Color::BLACK,
            align: TextAlign::Left,
            line_height: 1.35,
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

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    fn metrics(&self) -> FontMetrics {
        FontMetrics::new(self.family)
    }

    fn line_px(&self) -> f32 {
        self.metrics().line_height(self.size, self.line_height)
    }

    fn wrap(&self, text: &str, width: f32) -> Vec<String> {
        wrap_text(text, self.size, self.bold, width, &self.metrics())
    }
}

#[derive(Debug, Clone)]
pub struct TableFlow {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub header_style: TextStyle,
    pub body_style: TextStyle,
    pub header_fill: Color,
    pub header_border: Color,
    pub stripe_fill: Color,
    pub border: Color,
    pub cell_padding: f32,
}

#[derive(Debug, Clone)]
pub enum FlowKind {
    Text { text: String, style: TextStyle },
    Rule { thickness: f32, color: Color },
    Table(TableFlow),
    /// Filled block holding a few text lines.
    Band {
        lines: Vec<(String, TextStyle)>,
        fill: Color,
        padding: f32,
    },
}

#[derive(Debug, Clone)]
pub struct FlowItem {
    pub kind: FlowKind,
    pub space_before: f32,
    pub space_after: f32,
    /// Must share a page with the start of the following item.
    pub keep_with_next: bool,
}

impl FlowItem {
    fn of(kind: FlowKind) -> Self {
        Self {
            kind,
            space_before: 0.0,
            space_after: 0.0,
            keep_with_next: false,
        }
    }

    pub fn text(text: impl Into<String>, style: TextStyle) -> Self {
        Self::of(FlowKind::Text {
            text: text.into(),
            style,
        })
    }

    pub fn rule(thickness: f32, color: Color) -> Self {
        Self::of(FlowKind::Rule { thickness, color })
    }

    pub fn table(table: TableFlow) -> Self {
        Self::of(FlowKind::Table(table))
    }

    pub fn band(lines: Vec<(String, TextStyle)>, fill: Color, padding: f32) -> Self {
        Self::of(FlowKind::Band { lines, fill, padding })
    }

    pub fn spaced(mut self, before: f32, after: f32) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }

    pub fn keep_with_next(mut self) -> Self {
        self.keep_with_next = true;
        self
    }
}

/// Lay `items` out on pages of the given size.
pub fn paginate(items: &[FlowItem], title: &str, page_width: f32, page_height: f32, margin: f32) -> LayoutConfig {
    let mut p = Paginator::new(LayoutConfig::new(title, page_width, page_height, margin));
    for (i, item) in items.iter().enumerate() {
        let keep = if item.keep_with_next {
            min_chain(&items[i + 1..], p.width)
        } else {
            0.0
        };
        p.place(item, keep);
    }
    p.finish()
}

/// Smallest height that must follow on the same page: the first piece of
/// the next item, plus whatever that item itself keeps with.
fn min_chain(items: &[FlowItem], width: f32) -> f32 {
    match items.first() {
        None => 0.0,
        Some(item) => {
            let own = item.space_before + min_height(item, width);
            if item.keep_with_next {
                own + min_chain(&items[1..], width)
            } else {
                own
            }
        }
    }
}

fn min_height(item: &FlowItem, width: f32) -> f32 {
    match &item.kind {
        FlowKind::Text { style, .. } => style.line_px(),
        FlowKind::Rule { thickness, .. } => *thickness,
        FlowKind::Table(t) => {
            let cw = width / t.headers.len().max(1) as f32;
            let first = t.rows.first().map_or(0.0, |r| row_height(r, &t.body_style, cw, t.cell_padding));
            row_height(&t.headers, &t.header_style, cw, t.cell_padding) + first
        }
        FlowKind::Band { lines, padding, .. } => band_height(lines, *padding, width),
    }
}

fn wrap_cells(cells: &[String], style: &TextStyle, col_width: f32, pad: f32) -> Vec<Vec<String>> {
    cells.iter().map(|c| style.wrap(c, col_width - 2.0 * pad)).collect()
}

/// Lines in the tallest cell; an empty row still takes one line.
fn line_count(cells: &[Vec<String>]) -> usize {
    cells.iter().map(Vec::len).max().unwrap_or(0).max(1)
}

fn row_height(cells: &[String], style: &TextStyle, col_width: f32, pad: f32) -> f32 {
    line_count(&wrap_cells(cells, style, col_width, pad)) as f32 * style.line_px() + 2.0 * pad
}

fn band_height(lines: &[(String, TextStyle)], padding: f32, width: f32) -> f32 {
    let inner = width - 2.0 * padding;
    let text: f32 = lines
        .iter()
        .map(|(t, s)| s.wrap(t, inner).len() as f32 * s.line_px())
        .sum();
    text + 2.0 * padding
}

/// A text box whose lines are offset for alignment.
fn text_box(x: f32, y: f32, width: f32, lines: &[String], style: &TextStyle, inset: f32) -> LayoutBox {
    let lh = style.line_px();
    let metrics = style.metrics();
    let inner = width - 2.0 * inset;
    let text_lines = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let w = metrics.measure_text_width(line, style.size, style.bold);
            let slack = (inner - w).max(0.0);
            let x_offset = inset
                + match style.align {
                    TextAlign::Left => 0.0,
                    TextAlign::Center => slack / 2.0,
                    TextAlign::Right => slack,
                };
            TextLine {
                text: line.clone(),
                x_offset,
                y_offset: inset + i as f32 * lh,
            }
        })
        .collect();
    let mut lb = LayoutBox::new(x, y, width, lines.len() as f32 * lh + 2.0 * inset);
    lb.text = Some(TextContent {
        lines: text_lines,
        font_family: style.family,
        font_size: style.size,
        bold: style.bold,
        italic: style.italic,
        color: style.color.to_array(),
        line_height: lh,
    });
    lb
}

struct Paginator {
    config: LayoutConfig,
    boxes: Vec<LayoutBox>,
    y: f32,
    top: f32,
    bottom: f32,
    left: f32,
    width: f32,
}

impl Paginator {
    fn new(config: LayoutConfig) -> Self {
        let margin = config.margin_pt;
        Self {
            top: margin,
            bottom: config.page_height_pt - margin,
            left: margin,
            width: config.content_width(),
            y: margin,
            boxes: Vec::new(),
            config,
        }
    }

    fn page_is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    fn remaining(&self) -> f32 {
        self.bottom - self.y
    }

    /// Height available on an empty page.
    fn page_room(&self) -> f32 {
        self.bottom - self.top
    }

    fn new_page(&mut self) {
        self.config.pages.push(PageLayout {
            page_index: self.config.pages.len(),
            boxes: std::mem::take(&mut self.boxes),
        });
        self.y = self.top;
    }

    /// Start a new page unless `needed` fits in what is left.
    fn ensure(&mut self, needed: f32) {
        if !self.page_is_empty() && needed > self.remaining() + EPS {
            self.new_page();
        }
    }

    fn leading(&self, space: f32) -> f32 {
        if self.page_is_empty() {
            0.0
        } else {
            space
        }
    }

    fn place(&mut self, item: &FlowItem, keep: f32) {
        match &item.kind {
            FlowKind::Text { text, style } => self.place_text(item, text, style, keep),
            FlowKind::Rule { thickness, color } => {
                self.ensure(self.leading(item.space_before) + thickness + keep);
                self.y += self.leading(item.space_before);
                let mut lb = LayoutBox::new(self.left, self.y, self.width, *thickness);
                lb.fill = Some(color.to_array());
                self.boxes.push(lb);
                self.y += thickness;
            }
            FlowKind::Table(table) => self.place_table(item, table),
            FlowKind::Band { lines, fill, padding } => {
                let inner = self.width - 2.0 * padding;
                let wrapped: Vec<(String, &TextStyle)> = lines
                    .iter()
                    .flat_map(|(text, style)| style.wrap(text, inner).into_iter().map(move |l| (l, style)))
                    .collect();
                let height = band_height(lines, *padding, self.width);
                let first = if height <= self.page_room() + EPS {
                    height
                } else {
                    2.0 * padding + wrapped.first().map_or(0.0, |(_, s)| s.line_px())
                };
                self.ensure(self.leading(item.space_before) + first + keep);
                self.y += self.leading(item.space_before);
                self.place_band(&wrapped, *fill, *padding);
            }
        }
        self.y = (self.y + item.space_after).min(self.bottom);
    }

    fn place_text(&mut self, item: &FlowItem, text: &str, style: &TextStyle, keep: f32) {
        let lines = style.wrap(text, self.width);
        let lh = style.line_px();
        let first = if keep > 0.0 { lines.len() as f32 * lh } else { lh };
        self.ensure(self.leading(item.space_before) + first + keep);
        self.y += self.leading(item.space_before);

        let mut rest: &[String] = &lines;
        while !rest.is_empty() {
            let fit = ((self.remaining() + EPS) / lh).floor() as usize;
            let take = if fit == 0 && self.page_is_empty() { 1 } else { fit.min(rest.len()) };
            if take == 0 {
                self.new_page();
                continue;
            }
            let lb = text_box(self.left, self.y, self.width, &rest[..take], style, 0.0);
            self.y += lb.height;
            self.boxes.push(lb);
            rest = &rest[take..];
            if !rest.is_empty() {
                self.new_page();
            }
        }
    }

    /// Lay out band lines, breaking between lines only where a page runs out.
    fn place_band(&mut self, lines: &[(String, &TextStyle)], fill: Color, padding: f32) {
        let inner = self.width - 2.0 * padding;
        let mut rest = lines;
        while !rest.is_empty() {
            let mut room = self.remaining() - 2.0 * padding;
            let mut take = 0;
            for (_, style) in rest {
                let lh = style.line_px();
                if lh > room + EPS {
                    break;
                }
                room -= lh;
                take += 1;
            }
            if take == 0 {
                if !self.page_is_empty() {
                    self.new_page();
                    continue;
                }
                take = 1;
            }

            let top = self.y;
            let mut cursor = top + padding;
            let mut band = LayoutBox::new(self.left, top, self.width, 0.0);
            band.fill = Some(fill.to_array());
            for (text, style) in &rest[..take] {
                let child = text_box(self.left + padding, cursor, inner, std::slice::from_ref(text), style, 0.0);
                cursor += child.height;
                band.children.push(child);
            }
            band.height = cursor + padding - top;
            self.y = band.bottom();
            self.boxes.push(band);

            rest = &rest[take..];
            if !rest.is_empty() {
                self.new_page();
            }
        }
    }

    fn place_table(&mut self, item: &FlowItem, table: &TableFlow) {
        let cols = table.headers.len().max(1);
        let cw = self.width / cols as f32;
        let pad = table.cell_padding;
        let header = wrap_cells(&table.headers, &table.header_style, cw, pad);
        let header_h = line_count(&header) as f32 * table.header_style.line_px() + 2.0 * pad;
        let body_room = self.page_room() - header_h;
        let first_h = table
            .rows
            .first()
            .map_or(0.0, |r| row_height(r, &table.body_style, cw, pad).min(body_room));

        self.ensure(self.leading(item.space_before) + header_h + first_h);
        self.y += self.leading(item.space_before);
        self.place_header(&header, table, cw);

        for (i, row) in table.rows.iter().enumerate() {
            let cells = wrap_cells(row, &table.body_style, cw, pad);
            let h = line_count(&cells) as f32 * table.body_style.line_px() + 2.0 * pad;
            // Rows that fit on a page move whole; taller ones start here and break.
            if h > self.remaining() + EPS && h <= body_room + EPS {
                self.new_page();
                self.place_header(&header, table, cw);
            }
            let fill = TableBlock::is_striped(i).then_some(table.stripe_fill);
            self.place_body_row(&cells, fill, &header, table, cw);
        }
    }

    fn place_header(&mut self, header: &[Vec<String>], table: &TableFlow, cw: f32) {
        let lines = line_count(header);
        self.place_cells(header, lines, &table.header_style, Some(table.header_fill), table.header_border, cw, table.cell_padding);
    }

    /// Place a body row, continuing it below a repeated header on the next
    /// page for as long as its lines do not fit.
    fn place_body_row(&mut self, cells: &[Vec<String>], fill: Option<Color>, header: &[Vec<String>], table: &TableFlow, cw: f32) {
        let style = &table.body_style;
        let pad = table.cell_padding;
        let lh = style.line_px();
        let total = line_count(cells);
        let mut start = 0;
        let mut fresh = false;
        while start < total {
            let fit = ((self.remaining() - 2.0 * pad + EPS) / lh).floor().max(0.0) as usize;
            let fit = if fit == 0 && fresh { 1 } else { fit };
            if fit == 0 {
                self.new_page();
                self.place_header(header, table, cw);
                fresh = true;
                continue;
            }
            let end = (start + fit).min(total);
            let chunk: Vec<Vec<String>> = cells
                .iter()
                .map(|c| c[start.min(c.len())..end.min(c.len())].to_vec())
                .collect();
            self.place_cells(&chunk, end - start, style, fill, table.border, cw, pad);
            start = end;
            fresh = false;
            if start < total {
                self.new_page();
                self.place_header(header, table, cw);
                fresh = true;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn place_cells(
        &mut self,
        cells: &[Vec<String>],
        lines: usize,
        style: &TextStyle,
        fill: Option<Color>,
        border: Color,
        cw: f32,
        pad: f32,
    ) {
        let h = lines as f32 * style.line_px() + 2.0 * pad;
        let mut row = LayoutBox::new(self.left, self.y, self.width, h);
        row.fill = fill.map(|c| c.to_array());
        for (j, cell) in cells.iter().enumerate() {
            let mut cell_box = text_box(self.left + j as f32 * cw, self.y, cw, cell, style, pad);
            cell_box.height = h;
            cell_box.stroke = Some(Stroke {
                width: 0.75,
                color: border.to_array(),
            });
            row.children.push(cell_box);
        }
        self.boxes.push(row);
        self.y += h;
    }

    fn finish(mut self) -> LayoutConfig {
        if !self.boxes.is_empty() || self.config.pages.is_empty() {
            self.new_page();
        }
        self.config
    }
}
