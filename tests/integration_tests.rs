//! Integration tests for the cv-forge core.
//!
//! These tests validate:
//! - Blank sections never reach any output
//! - Entry removal, reordering and draft round trips through the context
//! - DOCX header styling for the bold template
//! - Multi-page PDF layout stays inside the margin on every paper size
//! - Export history and fallbacks

use std::io::{Cursor, Read};
use std::path::PathBuf;

use chrono::{Duration, TimeZone, Utc};
use sha2::{Digest, Sha256};

use cv_forge::app::AppContext;
use cv_forge::config::AppConfig;
use cv_forge::docx::{build_document, BodyItem};
use cv_forge::draft::{Draft, DraftManager, LoadOutcome};
use cv_forge::layout_config::LayoutConfig;
use cv_forge::outline::{Block, Outline, SectionKind};
use cv_forge::pdf_export::{export_text, layout_text};
use cv_forge::pipeline::{ExportFormat, ExportPipeline, ExportRequest, PaperSize};
use cv_forge::preview::{render, PreviewOptions};
use cv_forge::record::{FieldRecord, ListName, Removal, ScalarField};
use cv_forge::samples::example_record;
use cv_forge::services::{Clock, ManualClock, NoticeKind, RecordingNotifier};
use cv_forge::session::DocumentType;
use cv_forge::storage::{KeyValueStore, MemoryStorage};
use cv_forge::store::Change;
use cv_forge::style::StyleSettings;

// =====================================================================
// Helpers
// =====================================================================

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
}

fn blank_context() -> AppContext {
    AppContext::builder(DocumentType::Cv)
        .initial_record(FieldRecord::default())
        .storage(Box::new(MemoryStorage::new()))
        .build()
        .unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cv-forge-it-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn work_titles(ctx: &AppContext) -> Vec<String> {
    ctx.record().work.iter().map(|w| w.title.clone()).collect()
}

fn view_work_titles(ctx: &AppContext) -> Vec<String> {
    let view = ctx.view();
    view.entry_keys(ListName::Work)
        .into_iter()
        .map(|k| view.entry_value(ListName::Work, k, "title").unwrap_or_default())
        .collect()
}

fn docx_xml(bytes: Vec<u8>) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

fn assert_inside_margin(config: &LayoutConfig) {
    let m = config.margin_pt;
    let eps = 0.01;
    for b in config.boxes() {
        assert!(b.x >= m - eps && b.y >= m - eps, "box at ({}, {}) inside the margin", b.x, b.y);
        assert!(b.x + b.width <= config.page_width_pt - m + eps, "box at x={} too wide", b.x);
        assert!(b.bottom() <= config.page_height_pt - m + eps, "box at y={} runs past the margin", b.y);
    }
}

// =====================================================================
// Section filtering
// =====================================================================

#[test]
fn blank_sections_never_get_headings() {
    let mut record = FieldRecord::default();
    record.name = "Ada Lovelace".into();
    record.set_entry_field(ListName::Work, 0, "title", "Analyst".into());
    let style = StyleSettings::default();

    let html = render(&record, &style, DocumentType::Cv, PreviewOptions::default());
    assert!(html.contains("Work Experience"));
    for missing in ["Academic Qualifications", "Research Experience", "References", "Skills"] {
        assert!(!html.contains(missing), "preview has heading {missing}");
    }

    let outline = Outline::from_record(&record, DocumentType::Cv);
    let doc = build_document(&outline, &style, PaperSize::A4);
    let texts: Vec<String> = doc.paragraphs().map(|p| p.text()).collect();
    assert!(texts.iter().any(|t| t == "Work Experience"));
    assert!(!texts.iter().any(|t| t == "Academic Qualifications"));
    assert!(!texts.iter().any(|t| t == "Professional Summary"));
}

#[test]
fn two_education_rows_and_blank_work_entry() {
    let mut record = FieldRecord::default();
    record.set_entry_field(ListName::Education, 0, "school", "Rockview".into());
    let i = record.push_entry(ListName::Education, None);
    record.set_entry_field(ListName::Education, i, "school", "Central High".into());
    assert_eq!(record.work.len(), 1);

    let outline = Outline::from_record(&record, DocumentType::Cv);
    assert!(outline.section(SectionKind::Work).is_none());
    let Some(Block::Table(table)) = outline.section(SectionKind::Education).map(|s| &s.body) else {
        panic!("education should be a table");
    };
    assert_eq!(table.rows.len(), 2);

    let html = render(&record, &StyleSettings::default(), DocumentType::Cv, PreviewOptions::default());
    assert!(!html.contains("Work Experience"));
    assert_eq!(html.matches("<tr").count(), 3);

    let doc = build_document(&outline, &StyleSettings::default(), PaperSize::A4);
    let table = doc.tables().next().unwrap();
    assert_eq!(table.rows.len(), 3);
    assert!(table.rows[0].is_header);
}

// =====================================================================
// Entry lists through the context
// =====================================================================

#[test]
fn removing_the_sole_entry_clears_it() {
    let mut ctx = blank_context();
    ctx.type_entry(ListName::Work, 0, "title", "Developer");
    ctx.type_entry(ListName::Work, 0, "company", "Acme");

    let change = ctx.remove_entry(ListName::Work, 0).unwrap();
    assert_eq!(
        change,
        Change::EntryRemoved {
            list: ListName::Work,
            index: 0,
            removal: Removal::Cleared
        }
    );
    assert_eq!(ctx.record().work.len(), 1);
    assert!(ctx.record().work.is_blank());
    assert_eq!(view_work_titles(&ctx), vec![""]);
    assert!(!ctx.preview().contains("Work Experience"));
}

#[test]
fn reorder_keeps_store_order_equal_to_view_order() {
    let mut ctx = blank_context();
    ctx.type_entry(ListName::Work, 0, "title", "A");
    for title in ["B", "C", "D"] {
        ctx.add_entry(ListName::Work, None);
        let last = ctx.record().work.len() - 1;
        ctx.type_entry(ListName::Work, last, "title", title);
    }

    ctx.reorder(ListName::Work, 3, 0).unwrap();
    ctx.reorder(ListName::Work, 1, 2).unwrap();
    assert_eq!(work_titles(&ctx), vec!["D", "B", "A", "C"]);
    assert_eq!(view_work_titles(&ctx), work_titles(&ctx));

    // Typing into the entry now shown first edits store index 0.
    ctx.type_entry(ListName::Work, 0, "title", "D2");
    assert_eq!(work_titles(&ctx)[0], "D2");

    let pos = |t: &str| {
        ctx.preview()
            .find(&format!(r#"<div class="preview-entry-title">{t}</div>"#))
            .unwrap()
    };
    assert!(pos("D2") < pos("B") && pos("B") < pos("A") && pos("A") < pos("C"));
}

// =====================================================================
// Drafts
// =====================================================================

#[test]
fn draft_save_then_load_returns_the_record() {
    let record = example_record(DocumentType::Cv);
    let mut storage = MemoryStorage::new();
    let mut drafts = DraftManager::new(DocumentType::Cv, Duration::seconds(2));
    drafts.save_now(&mut storage, &record, clock().now()).unwrap();
    match drafts.load(&storage) {
        LoadOutcome::Loaded(draft) => assert_eq!(draft.data, record),
        other => panic!("expected a draft, got {other:?}"),
    }
}

#[test]
fn draft_round_trip_through_file_storage() {
    let dir = scratch_dir("drafts");
    let config = AppConfig {
        storage_dir: Some(dir.clone()),
        ..AppConfig::default()
    };

    let mut first = AppContext::builder(DocumentType::Resume)
        .config(config.clone())
        .load_draft(false)
        .build()
        .unwrap();
    first.type_field(ScalarField::Summary, "Edited summary");
    first.save_draft().unwrap();
    let saved = first.record().clone();

    let second = AppContext::builder(DocumentType::Resume)
        .config(config)
        .initial_record(FieldRecord::default())
        .build()
        .unwrap();
    assert_eq!(second.record(), &saved);
    assert_eq!(second.render_count(), 1);
    assert!(second.preview().contains("Edited summary"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn mismatched_draft_type_leaves_store_unchanged() {
    let mut storage = MemoryStorage::new();
    let draft = Draft {
        data: example_record(DocumentType::Resume),
        timestamp: clock().now(),
        document_type: DocumentType::Resume,
    };
    storage
        .set(&DocumentType::Cv.draft_key(), &serde_json::to_string(&draft).unwrap())
        .unwrap();

    let mut ctx = AppContext::builder(DocumentType::Cv)
        .initial_record(FieldRecord::default())
        .storage(Box::new(storage))
        .load_draft(false)
        .build()
        .unwrap();
    ctx.type_field(ScalarField::Name, "Kept");
    let before = ctx.record().clone();
    let renders = ctx.render_count();

    assert_eq!(ctx.load_draft(), LoadOutcome::TypeMismatch(DocumentType::Resume));
    assert_eq!(ctx.record(), &before);
    assert_eq!(ctx.render_count(), renders);
}

#[test]
fn corrupt_draft_is_ignored() {
    let mut storage = MemoryStorage::new();
    storage.set("cv-builder-draft-cv", "{not json").unwrap();
    let ctx = AppContext::builder(DocumentType::Cv)
        .initial_record(FieldRecord::default())
        .storage(Box::new(storage))
        .build()
        .unwrap();
    assert_eq!(ctx.record(), &FieldRecord::default());
}

// =====================================================================
// DOCX
// =====================================================================

#[test]
fn bold_navy_serif_header_has_solid_accent_fill() {
    let style = StyleSettings::from_keys("bold", "navy", "serif");
    let record = example_record(DocumentType::Cv);

    let outline = Outline::from_record(&record, DocumentType::Cv);
    let doc = build_document(&outline, &style, PaperSize::A4);
    let BodyItem::Table(header) = &doc.body[0] else {
        panic!("bold header should be a one-cell table");
    };
    assert_eq!(header.rows.len(), 1);
    assert_eq!(header.rows[0].cells.len(), 1);
    assert_eq!(header.rows[0].cells[0].shading.unwrap().fill.to_hex(), "1E3A8A");

    let art = ExportPipeline::default()
        .export_word(&record, DocumentType::Cv, &style, &ExportRequest::default())
        .unwrap();
    assert_eq!(art.format, ExportFormat::Docx);
    let xml = docx_xml(art.bytes);
    let first_table = &xml[xml.find("<w:tbl>").unwrap()..xml.find("</w:tbl>").unwrap()];
    assert!(first_table.contains(r#"<w:shd w:val="solid" w:color="1E3A8A" w:fill="1E3A8A"/>"#));
    assert!(first_table.contains("John Banda"));
}

#[test]
fn docx_export_is_deterministic() {
    let record = example_record(DocumentType::Resume);
    let style = StyleSettings::from_keys("classic", "forest-green", "sans-serif");
    let export = || {
        ExportPipeline::default()
            .export_word(&record, DocumentType::Resume, &style, &ExportRequest::default())
            .unwrap()
            .bytes
    };
    assert_eq!(Sha256::digest(export()), Sha256::digest(export()));
}

// =====================================================================
// PDF
// =====================================================================

#[test]
fn tall_content_paginates_inside_the_margin() {
    let mut record = example_record(DocumentType::Cv);
    for i in 0..40 {
        let idx = record.push_entry(ListName::Work, None);
        record.set_entry_field(ListName::Work, idx, "title", format!("Role {i}"));
        record.set_entry_field(ListName::Work, idx, "company", "Company".into());
        record.set_entry_field(
            ListName::Work,
            idx,
            "description",
            "Built and maintained services used by many teams across the organisation. ".repeat(3),
        );
    }
    for _ in 0..30 {
        let idx = record.push_entry(ListName::Education, None);
        record.set_entry_field(ListName::Education, idx, "school", "A school with a rather long name".into());
    }
    let outline = Outline::from_record(&record, DocumentType::Cv);

    for paper in PaperSize::ALL {
        for template in ["modern", "classic", "bold"] {
            let style = StyleSettings::from_keys(template, "charcoal", "system");
            let layout = layout_text(&outline, &style, paper, "CV");
            assert!(layout.pages.len() > 1, "{template} on {paper:?} should span pages");
            assert_eq!(layout.margin_pt, 72.0);
            assert_inside_margin(&layout);
        }
    }

    let bytes = export_text(&outline, &StyleSettings::default(), PaperSize::Letter, "CV").unwrap();
    assert_eq!(&bytes[0..5], b"%PDF-");
}

#[test]
fn single_element_taller_than_a_page_stays_inside_the_margin() {
    let mut record = FieldRecord::default();
    record.name = "Ada Augusta King Countess of Lovelace ".repeat(60);
    record.email = "ada@example.com".into();
    record.set_entry_field(ListName::Education, 0, "year", "1835".into());
    record.set_entry_field(ListName::Education, 0, "school", "Home tuition".into());
    let qualification: Vec<String> = (0..90).map(|i| format!("Module {i}")).collect();
    record.set_entry_field(ListName::Education, 0, "qualification", qualification.join("\n"));
    let outline = Outline::from_record(&record, DocumentType::Cv);

    for paper in PaperSize::ALL {
        for template in ["modern", "classic", "bold"] {
            let style = StyleSettings::from_keys(template, "navy", "serif");
            let layout = layout_text(&outline, &style, paper, "CV");
            assert!(layout.pages.len() > 1, "{template} on {paper:?} should span pages");
            assert_inside_margin(&layout);

            let placed = layout
                .boxes()
                .filter_map(|b| b.text.as_ref())
                .flat_map(|t| &t.lines)
                .filter(|l| l.text.starts_with("Module "))
                .count();
            assert_eq!(placed, 90, "{template} on {paper:?} lost qualification lines");
        }
    }

    let style = StyleSettings::from_keys("bold", "navy", "serif");
    let bytes = export_text(&outline, &style, PaperSize::A4, "CV").unwrap();
    assert_eq!(&bytes[0..5], b"%PDF-");
}

#[test]
fn pdf_export_without_rasterizer_uses_text_layout() {
    let mut ctx = AppContext::builder(DocumentType::Cv)
        .storage(Box::new(MemoryStorage::new()))
        .build()
        .unwrap();
    let art = ctx.export_pdf().unwrap();
    assert!(art.used_fallback);
    assert_eq!(art.file_name, "CV.pdf");
    assert!(art.data_url().starts_with("data:application/pdf;base64,"));
}

// =====================================================================
// Export contract
// =====================================================================

#[test]
fn exports_never_carry_placeholders() {
    let mut ctx = blank_context();
    ctx.type_field(ScalarField::Summary, "Only a summary");
    assert!(ctx.preview().contains("John Banda"));

    let request = ExportRequest::default();
    let art = ctx.export(ExportFormat::Doc, &request).unwrap();
    let html = String::from_utf8(art.bytes).unwrap();
    assert!(html.contains("Only a summary"));
    assert!(!html.contains("John Banda"));
}

#[test]
fn history_keeps_ten_newest_first() {
    let clock = clock();
    let notifier = RecordingNotifier::default();
    let mut ctx = AppContext::builder(DocumentType::Cv)
        .storage(Box::new(MemoryStorage::new()))
        .clock(Box::new(clock.clone()))
        .notifier(Box::new(notifier.clone()))
        .build()
        .unwrap();

    for i in 0..12 {
        clock.advance(Duration::minutes(1));
        let request = ExportRequest {
            file_name: Some(format!("cv-{i}")),
            ..ExportRequest::default()
        };
        ctx.export(ExportFormat::Docx, &request).unwrap();
    }
    let records = ctx.history().records();
    assert_eq!(records.len(), 10);
    assert_eq!(records[0].file_name, "cv-11.docx");
    assert_eq!(records[9].file_name, "cv-2.docx");
    assert!(records[0].timestamp > records[1].timestamp);
    assert_eq!(notifier.count(NoticeKind::Success), 12);

    let stored = ctx.storage().get("exportHistory").unwrap().unwrap();
    assert!(stored.contains(r#""type":"DOCX""#));

    ctx.clear_history().unwrap();
    assert!(ctx.history().is_empty());
}
