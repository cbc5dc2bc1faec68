//! Text measurement for the PDF base-14 fonts.
//!
//! Nothing is embedded, so widths come from per-character-class estimates
//! close to the Helvetica/Times AFM advances. Courier is exact.

use crate::style::PdfFamily;

/// Metrics for one base-14 family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    pub family: PdfFamily,
}

impl FontMetrics {
    pub fn new(family: PdfFamily) -> Self {
        Self { family }
    }

    /// Advance of `c` in em units.
    pub fn char_width(&self, c: char, bold: bool) -> f32 {
        if self.family == PdfFamily::Courier {
            return 0.6;
        }
        let base = match c {
            ' ' | 'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' => 0.28,
            'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | '/' => 0.34,
            'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.86,
            '0'..='9' => 0.556,
            'A'..='Z' => 0.68,
            '•' => 0.35,
            _ => 0.53,
        };
        let family = match self.family {
            PdfFamily::Times => 0.92,
            _ => 1.0,
        };
        base * family * if bold { 1.07 } else { 1.0 }
    }

    /// Width of `text` in points at `font_size`.
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        text.chars().map(|c| self.char_width(c, bold)).sum::<f32>() * font_size
    }

    pub fn line_height(&self, font_size: f32, factor: f32) -> f32 {
        font_size * factor
    }

    /// Distance from the top of a line box to the baseline.
    pub fn ascender(&self, font_size: f32) -> f32 {
        font_size * 0.75
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::new(PdfFamily::Helvetica)
    }
}

/// Word-wrap text to fit within `max_width` points. Existing newlines are
/// kept; a word wider than the line is broken across lines.
pub fn wrap_text(text: &str, font_size: f32, bold: bool, max_width: f32, fonts: &FontMetrics) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let fits = |s: &str| fonts.measure_text_width(s, font_size, bold) <= max_width;
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{current_line} {word}")
            };
            if fits(&candidate) {
                current_line = candidate;
                continue;
            }
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            if fits(word) {
                current_line = word.to_string();
                continue;
            }
            // Hard-break an over-long word.
            for c in word.chars() {
                current_line.push(c);
                if !fits(&current_line) && current_line.chars().count() > 1 {
                    current_line.pop();
                    lines.push(std::mem::take(&mut current_line));
                    current_line.push(c);
                }
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn courier_is_monospaced() {
        let mono = FontMetrics::new(PdfFamily::Courier);
        let w = mono.measure_text_width("Hello", 10.0, false);
        assert!((w - 30.0).abs() < 0.01);
    }

    #[test]
    fn bold_and_wide_glyphs_measure_wider() {
        let fonts = FontMetrics::default();
        assert!(fonts.measure_text_width("MW", 12.0, false) > fonts.measure_text_width("il", 12.0, false));
        assert!(fonts.measure_text_width("abc", 12.0, true) > fonts.measure_text_width("abc", 12.0, false));
    }

    #[test]
    fn word_wrap_basic() {
        let fonts = FontMetrics::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, 60.0, &fonts);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
        for line in &lines {
            assert!(fonts.measure_text_width(line, 16.0, false) <= 60.0 || !line.contains(' '));
        }
    }

    #[test]
    fn long_words_are_broken() {
        let fonts = FontMetrics::default();
        let lines = wrap_text(&"x".repeat(200), 10.0, false, 100.0, &fonts);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(fonts.measure_text_width(line, 10.0, false) <= 100.0);
        }
        assert_eq!(lines.concat().len(), 200);
    }

    #[test]
    fn newlines_are_preserved() {
        let fonts = FontMetrics::default();
        let lines = wrap_text("a\n\nb", 10.0, false, 500.0, &fonts);
        assert_eq!(lines, vec!["a", "", "b"]);
    }
}
