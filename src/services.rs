//! Collaborator contracts the host may inject, each with a default.
//!
//! | Trait | Default |
//! |---|---|
//! | [`ConfirmationDialog`] | [`AutoConfirm`] |
//! | [`Notifier`] | [`LogNotifier`] |
//! | [`Rasterizer`] | [`UnavailableRasterizer`] |
//! | [`DocumentBuilder`] | [`crate::docx_export::OoxmlPackager`] |
//! | [`Clock`] | [`SystemClock`] |

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use image::RgbaImage;

use crate::docx::Document;
use crate::error::ExportError;
use crate::style::Color;

// ---------------------------------------------------------------------------
// Confirmation
// ---------------------------------------------------------------------------

pub trait ConfirmationDialog {
    /// Ask the user; `false` cancels the pending operation.
    fn confirm(&self, message: &str, title: &str) -> bool;
}

/// Confirms everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl ConfirmationDialog for AutoConfirm {
    fn confirm(&self, message: &str, _title: &str) -> bool {
        log::debug!("auto-confirming: {message}");
        true
    }
}

/// Always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl ConfirmationDialog for FixedAnswer {
    fn confirm(&self, _message: &str, _title: &str) -> bool {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

pub trait Notifier {
    fn notify(&self, message: &str, kind: NoticeKind);
}

/// Writes notices to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        match kind {
            NoticeKind::Error => log::error!("{message}"),
            NoticeKind::Warning => log::warn!("{message}"),
            NoticeKind::Info | NoticeKind::Success => log::info!("{message}"),
        }
    }
}

/// Keeps every notice; clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notices: Rc<RefCell<Vec<(NoticeKind, String)>>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<(NoticeKind, String)> {
        self.notices.borrow().clone()
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices.borrow().iter().filter(|(k, _)| *k == kind).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NoticeKind) {
        self.notices.borrow_mut().push((kind, message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Rasterisation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Device pixels per CSS pixel.
    pub scale: f32,
    /// Layout width of the printable area in CSS pixels.
    pub width_px: u32,
    pub background: Color,
}

/// A rendered preview.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    pub image: RgbaImage,
    /// Pixel rows (ascending) between blocks where a page may be cut
    /// without splitting content.
    pub safe_breaks: Vec<u32>,
}

pub trait Rasterizer {
    fn rasterize(
        &self,
        markup: &str,
        stylesheet: &str,
        options: &RasterOptions,
    ) -> Result<RasterCanvas, ExportError>;
}

/// Reports that no rasteriser is available, forcing the text PDF path.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRasterizer;

impl Rasterizer for UnavailableRasterizer {
    fn rasterize(&self, _: &str, _: &str, _: &RasterOptions) -> Result<RasterCanvas, ExportError> {
        Err(ExportError::LibraryUnavailable("rasterizer"))
    }
}

// ---------------------------------------------------------------------------
// Document building
// ---------------------------------------------------------------------------

pub trait DocumentBuilder {
    /// Package a document tree into `.docx` bytes.
    fn build(&self, document: &Document) -> Result<Vec<u8>, ExportError>;
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to; clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
