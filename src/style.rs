//! Style settings – template, accent colour and font choices that affect
//! presentation only, plus the [`Color`] type shared by every renderer.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Colour
// ---------------------------------------------------------------------------

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
            Some(Self::rgb(r, g, b))
        } else if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()? as f32 / 255.0;
            Some(Self::rgb(r, g, b))
        } else {
            None
        }
    }

    fn channel(v: f32) -> u8 {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// Upper-case `RRGGBB` without `#`, the form word processors expect.
    pub fn to_hex(&self) -> String {
        format!(
            "{:02X}{:02X}{:02X}",
            Self::channel(self.r),
            Self::channel(self.g),
            Self::channel(self.b)
        )
    }

    /// Lower-case `#rrggbb` for CSS.
    pub fn to_css(&self) -> String {
        format!("#{}", self.to_hex().to_ascii_lowercase())
    }

    /// Scale every channel to 70 %, used for table header borders.
    pub fn darken(&self) -> Self {
        let f = |v: f32| (Self::channel(v) as f32 * 0.7).floor() / 255.0;
        Self::rgb(f(self.r), f(self.g), f(self.b))
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    #[default]
    Modern,
    Classic,
    Bold,
}

impl Template {
    pub const ALL: [Template; 3] = [Template::Modern, Template::Classic, Template::Bold];

    pub fn key(self) -> &'static str {
        match self {
            Template::Modern => "modern",
            Template::Classic => "classic",
            Template::Bold => "bold",
        }
    }

    /// Unknown keys select the default template.
    pub fn parse(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.key() == key.trim())
            .unwrap_or_default()
    }
}

/// The fixed accent palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorKey {
    #[default]
    OptimismBlue,
    BlueAlgae,
    FlatGrey,
    ClassicBlue,
    ForestGreen,
    Burgundy,
    Charcoal,
    Navy,
}

impl ColorKey {
    pub const ALL: [ColorKey; 8] = [
        ColorKey::OptimismBlue,
        ColorKey::BlueAlgae,
        ColorKey::FlatGrey,
        ColorKey::ClassicBlue,
        ColorKey::ForestGreen,
        ColorKey::Burgundy,
        ColorKey::Charcoal,
        ColorKey::Navy,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ColorKey::OptimismBlue => "optimism-blue",
            ColorKey::BlueAlgae => "blue-algae",
            ColorKey::FlatGrey => "flat-grey",
            ColorKey::ClassicBlue => "classic-blue",
            ColorKey::ForestGreen => "forest-green",
            ColorKey::Burgundy => "burgundy",
            ColorKey::Charcoal => "charcoal",
            ColorKey::Navy => "navy",
        }
    }

    pub fn parse(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.key() == key.trim())
            .unwrap_or_default()
    }

    /// Accent hex (WCAG AA against white).
    pub fn hex(self) -> &'static str {
        match self {
            ColorKey::OptimismBlue => "#1a7fa3",
            ColorKey::BlueAlgae => "#6bb3a0",
            ColorKey::FlatGrey => "#5a5a5a",
            ColorKey::ClassicBlue => "#1e40af",
            ColorKey::ForestGreen => "#047857",
            ColorKey::Burgundy => "#7f1d1d",
            ColorKey::Charcoal => "#1f2937",
            ColorKey::Navy => "#1e3a8a",
        }
    }

    pub fn color(self) -> Color {
        Color::from_hex(self.hex()).unwrap_or(Color::BLACK)
    }
}

/// PDF base-14 families available without embedding font files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PdfFamily {
    Helvetica,
    Times,
    Courier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontKey {
    #[default]
    System,
    Serif,
    SansSerif,
    Modern,
    Classic,
    Monospace,
}

impl FontKey {
    pub const ALL: [FontKey; 6] = [
        FontKey::System,
        FontKey::Serif,
        FontKey::SansSerif,
        FontKey::Modern,
        FontKey::Classic,
        FontKey::Monospace,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FontKey::System => "system",
            FontKey::Serif => "serif",
            FontKey::SansSerif => "sans-serif",
            FontKey::Modern => "modern",
            FontKey::Classic => "classic",
            FontKey::Monospace => "monospace",
        }
    }

    pub fn parse(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|f| f.key() == key.trim())
            .unwrap_or_default()
    }

    /// CSS `font-family` stack for the preview.
    pub fn css_stack(self) -> &'static str {
        match self {
            FontKey::System => {
                r#"-apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Oxygen, Ubuntu, Cantarell, sans-serif"#
            }
            FontKey::Serif => r#""Times New Roman", Times, serif"#,
            FontKey::SansSerif => "Arial, Helvetica, sans-serif",
            FontKey::Modern => r#""Roboto", -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif"#,
            FontKey::Classic => r#"Georgia, "Times New Roman", serif"#,
            FontKey::Monospace => r#""Courier New", Courier, monospace"#,
        }
    }

    /// Concrete font name for word-processor output.
    pub fn document_font(self) -> &'static str {
        match self {
            FontKey::System | FontKey::Modern => "Calibri",
            FontKey::Serif | FontKey::Classic => "Times New Roman",
            FontKey::SansSerif => "Arial",
            FontKey::Monospace => "Courier New",
        }
    }

    pub fn pdf_family(self) -> PdfFamily {
        match self {
            FontKey::Serif | FontKey::Classic => PdfFamily::Times,
            FontKey::Monospace => PdfFamily::Courier,
            _ => PdfFamily::Helvetica,
        }
    }
}

/// Template, colour and font selection for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleSettings {
    pub template: Template,
    pub color_key: ColorKey,
    pub font_key: FontKey,
}

impl StyleSettings {
    pub fn new(template: Template, color_key: ColorKey, font_key: FontKey) -> Self {
        Self {
            template,
            color_key,
            font_key,
        }
    }

    /// Build from raw selector values; unknown values use the defaults.
    pub fn from_keys(template: &str, color: &str, font: &str) -> Self {
        Self::new(Template::parse(template), ColorKey::parse(color), FontKey::parse(font))
    }

    pub fn accent(&self) -> Color {
        self.color_key.color()
    }
}
