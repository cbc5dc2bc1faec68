//! cvforge – command-line CV / résumé exporter.
//!
//! Usage:
//!   cvforge [input.json] [--type cv|resume] [--format pdf|docx|doc|html]
//!           [--template T] [--color C] [--font F] [--paper P] [--quality Q]
//!           [--out PATH] [--sample] [--draft-dir DIR] [--save-draft]
//!           [--config FILE]
//!
//! `input.json` holds a record or a saved draft. Without one, the draft
//! stored under `--draft-dir` is used, or the example data with `--sample`.

use std::{env, fs, path::PathBuf, process};

use cv_forge::app::AppContext;
use cv_forge::config::AppConfig;
use cv_forge::draft::Draft;
use cv_forge::pipeline::{ExportFormat, PaperSize, Quality};
use cv_forge::record::FieldRecord;
use cv_forge::samples::example_record;
use cv_forge::session::DocumentType;
use cv_forge::style::{ColorKey, FontKey, Template};

enum OutputKind {
    Export(ExportFormat),
    Html,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut draft_dir: Option<PathBuf> = None;
    let mut doc_type: Option<DocumentType> = None;
    let mut kind = OutputKind::Export(ExportFormat::Pdf);
    let mut template: Option<String> = None;
    let mut color: Option<String> = None;
    let mut font: Option<String> = None;
    let mut paper: Option<PaperSize> = None;
    let mut quality: Option<Quality> = None;
    let mut sample = false;
    let mut save_draft = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| match iter.next() {
            Some(v) => v.clone(),
            None => {
                eprintln!("Missing value for {flag}");
                print_usage(&args[0]);
                process::exit(1);
            }
        };
        match arg.as_str() {
            "--type" => doc_type = Some(DocumentType::parse(&value(arg))),
            "--format" | "-f" => {
                kind = match value(arg).to_ascii_lowercase().as_str() {
                    "pdf" => OutputKind::Export(ExportFormat::Pdf),
                    "docx" => OutputKind::Export(ExportFormat::Docx),
                    "doc" => OutputKind::Export(ExportFormat::Doc),
                    "html" => OutputKind::Html,
                    other => {
                        eprintln!("Unknown format: {other}");
                        process::exit(1);
                    }
                }
            }
            "--template" => template = Some(value(arg)),
            "--color" => color = Some(value(arg)),
            "--font" => font = Some(value(arg)),
            "--paper" => {
                let v = value(arg);
                paper = Some(PaperSize::parse(&v).unwrap_or_else(|| {
                    eprintln!("Unknown paper size: {v}");
                    process::exit(1);
                }));
            }
            "--quality" => {
                let v = value(arg);
                quality = Some(Quality::parse(&v).unwrap_or_else(|| {
                    eprintln!("Unknown quality: {v}");
                    process::exit(1);
                }));
            }
            "--out" | "-o" => output_path = Some(PathBuf::from(value(arg))),
            "--config" => config_path = Some(PathBuf::from(value(arg))),
            "--draft-dir" => draft_dir = Some(PathBuf::from(value(arg))),
            "--sample" => sample = true,
            "--save-draft" => save_draft = true,
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if input_path.is_some() {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                input_path = Some(PathBuf::from(path));
            }
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────
    let mut config = match &config_path {
        Some(path) => AppConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Error loading config '{}': {e}", path.display());
            process::exit(1);
        }),
        None => AppConfig::default(),
    };
    if let Some(t) = &template {
        config.style.template = Template::parse(t);
    }
    if let Some(c) = &color {
        config.style.color_key = ColorKey::parse(c);
    }
    if let Some(f) = &font {
        config.style.font_key = FontKey::parse(f);
    }
    if let Some(p) = paper {
        config.paper_size = p;
    }
    if let Some(q) = quality {
        config.quality = q;
    }
    if draft_dir.is_some() {
        config.storage_dir = draft_dir.clone();
    }
    config.placeholders = false;

    // ── Input ─────────────────────────────────────────────────────────────
    let mut initial: Option<FieldRecord> = None;
    if let Some(path) = &input_path {
        let raw = fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Error reading '{}': {e}", path.display());
            process::exit(1);
        });
        match serde_json::from_str::<Draft>(&raw) {
            Ok(draft) => {
                doc_type.get_or_insert(draft.document_type);
                initial = Some(draft.data);
            }
            Err(_) => match FieldRecord::from_json(&raw) {
                Ok(record) => initial = Some(record),
                Err(e) => {
                    eprintln!("Error parsing '{}': {e}", path.display());
                    process::exit(1);
                }
            },
        }
    }
    let doc_type = doc_type.unwrap_or_default();
    if initial.is_none() && sample {
        initial = Some(example_record(doc_type));
    }
    if initial.is_none() && config.storage_dir.is_none() {
        eprintln!("Error: no input. Pass a JSON file, --sample, or --draft-dir.");
        print_usage(&args[0]);
        process::exit(1);
    }
    let from_draft = initial.is_none();

    let mut ctx = match AppContext::builder(doc_type)
        .config(config)
        .initial_record(initial.unwrap_or_default())
        .load_draft(from_draft)
        .build()
    {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error opening storage: {e}");
            process::exit(1);
        }
    };

    for issue in ctx.issues() {
        log::warn!("{}: {}", issue.path, issue.message);
    }
    eprintln!("Form {}% complete", ctx.completion());

    // ── Output ────────────────────────────────────────────────────────────
    let (file_name, bytes) = match kind {
        OutputKind::Html => {
            let html = format!(
                "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
                ctx.stylesheet(),
                ctx.preview()
            );
            (doc_type.default_file_name("html"), html.into_bytes())
        }
        OutputKind::Export(format) => {
            let request = ctx.export_request();
            match ctx.export(format, &request) {
                Ok(artifact) => {
                    if artifact.used_fallback {
                        eprintln!("Note: exported with the secondary method");
                    }
                    (artifact.file_name, artifact.bytes)
                }
                Err(e) => {
                    eprintln!("Error exporting: {e}");
                    process::exit(1);
                }
            }
        }
    };

    let output = match output_path {
        Some(p) if p.is_dir() => p.join(&file_name),
        Some(p) => p,
        None => PathBuf::from(&file_name),
    };
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(&output, &bytes) {
        eprintln!("Error writing '{}': {e}", output.display());
        process::exit(1);
    }
    eprintln!("Wrote '{}' ({} bytes)", output.display(), bytes.len());

    if save_draft {
        if let Err(e) = ctx.save_draft() {
            eprintln!("Error saving draft: {e}");
            process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("cvforge – CV / résumé exporter (cv-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} [input.json] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [input.json]     Record or saved draft (default: stored draft or --sample)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --type           cv | resume (default: from the draft, else cv)");
    eprintln!("  --format, -f     pdf | docx | doc | html (default: pdf)");
    eprintln!("  --template       modern | classic | bold");
    eprintln!("  --color          optimism-blue | blue-algae | flat-grey | classic-blue |");
    eprintln!("                   forest-green | burgundy | charcoal | navy");
    eprintln!("  --font           system | serif | sans-serif | modern | classic | monospace");
    eprintln!("  --paper          a4 | letter | legal");
    eprintln!("  --quality        standard | high");
    eprintln!("  --out, -o        Output file or directory (default: CV.pdf etc. in cwd)");
    eprintln!("  --sample         Use the example data");
    eprintln!("  --draft-dir      Directory for stored drafts and export history");
    eprintln!("  --save-draft     Store the record as a draft after exporting");
    eprintln!("  --config         JSON config file");
    eprintln!("  --help           Print this message");
}
