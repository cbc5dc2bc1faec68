//! # cv-forge – CV / résumé builder core
//!
//! A form model kept in step with a live preview, local drafts, and DOCX/PDF
//! export. Editing flows one way and export another:
//!
//! 1. **Edit** – input event → [`binding`] → [`store`] → [`preview`]
//! 2. **Persist** – debounced snapshots via [`draft`] into a [`storage`] backend
//! 3. **Outline** – record → filtered, ordered sections ([`outline`])
//! 4. **Export** – outline → [`docx`] tree or paginated PDF ([`pagination`],
//!    [`render`]), orchestrated by [`pipeline`]
//!
//! Host-specific pieces (the rendered form, confirmation dialogs, a
//! rasteriser) plug in through [`form_view::FormView`] and the traits in
//! [`services`]. [`app::AppContext`] owns one session.

pub mod app;
pub mod binding;
pub mod config;
pub mod docx;
pub mod docx_export;
pub mod draft;
pub mod error;
pub mod fonts;
pub mod form_view;
pub mod history;
pub mod layout_config;
pub mod outline;
pub mod pagination;
pub mod pdf_export;
pub mod pipeline;
pub mod preview;
pub mod record;
pub mod render;
pub mod samples;
pub mod services;
pub mod session;
pub mod storage;
pub mod store;
pub mod style;
pub mod validation;

// Re-exports for convenience
pub use app::{AppContext, AppContextBuilder};
pub use error::{ExportError, StorageError};
pub use pipeline::{Artifact, ExportFormat, ExportPipeline, ExportRequest, PaperSize, Quality};
pub use record::FieldRecord;
pub use session::DocumentType;
pub use style::StyleSettings;
