//! Document-type selection for the current editing session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which form configuration is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Cv,
    Resume,
}

impl DocumentType {
    /// Parse a `type` value; anything unrecognised selects the default.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "resume" | "résumé" => DocumentType::Resume,
            _ => DocumentType::Cv,
        }
    }

    /// Resolve the document type from a URL query string such as
    /// `?type=resume&lang=en`.
    pub fn from_query(query: &str) -> Self {
        query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "type")
            .map(|(_, value)| Self::parse(value))
            .unwrap_or_default()
    }

    pub fn key(self) -> &'static str {
        match self {
            DocumentType::Cv => "cv",
            DocumentType::Resume => "resume",
        }
    }

    /// Prefix of every control id on this document type's form.
    pub fn control_prefix(self) -> &'static str {
        self.key()
    }

    /// Local-storage key holding this type's draft.
    pub fn draft_key(self) -> String {
        format!("cv-builder-draft-{}", self.key())
    }

    /// Base name of exported files.
    pub fn file_stem(self) -> &'static str {
        match self {
            DocumentType::Cv => "CV",
            DocumentType::Resume => "Resume",
        }
    }

    pub fn default_file_name(self, extension: &str) -> String {
        format!("{}.{extension}", self.file_stem())
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
