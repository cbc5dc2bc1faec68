//! Application context – owns every component of one editing session and
//! routes edits, re-renders, autosaves and exports between them.
//!
//! [`AppContextBuilder::build`] initialises in a fixed order: store, binding,
//! view population, draft load, first render.

use std::collections::BTreeMap;

use crate::binding::{FormBinding, InputTarget};
use crate::config::AppConfig;
use crate::draft::{DraftManager, LoadOutcome};
use crate::error::{ExportError, StorageError};
use crate::form_view::{ControlValue, FormView, VirtualForm};
use crate::history::{ExportHistory, HistoryRecord};
use crate::outline::Outline;
use crate::pipeline::{Artifact, ExportFormat, ExportPipeline, ExportRequest};
use crate::preview::{self, PreviewOptions};
use crate::record::{FieldRecord, ListName, ScalarField};
use crate::samples::example_record;
use crate::services::*;
use crate::session::DocumentType;
use crate::storage::KeyValueStore;
use crate::store::{Change, FieldStore};
use crate::style::StyleSettings;
use crate::validation::{self, FieldIssue};

pub const NO_CONTENT_MESSAGE: &str = "No preview content found. Please fill in the form first.";

pub struct AppContextBuilder {
    doc_type: DocumentType,
    config: AppConfig,
    initial: Option<FieldRecord>,
    view: Option<Box<dyn FormView>>,
    storage: Option<Box<dyn KeyValueStore>>,
    dialog: Box<dyn ConfirmationDialog>,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn Clock>,
    rasterizer: Box<dyn Rasterizer>,
    builder: Option<Box<dyn DocumentBuilder>>,
    skill_tags: Vec<String>,
    load_draft: bool,
}

impl AppContextBuilder {
    pub fn new(doc_type: DocumentType) -> Self {
        Self {
            doc_type,
            config: AppConfig::default(),
            initial: None,
            view: None,
            storage: None,
            dialog: Box::new(AutoConfirm),
            notifier: Box::new(LogNotifier),
            clock: Box::new(SystemClock),
            rasterizer: Box::new(UnavailableRasterizer),
            builder: None,
            skill_tags: Vec::new(),
            load_draft: true,
        }
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Starting record; the document type's example data when unset.
    pub fn initial_record(mut self, record: FieldRecord) -> Self {
        self.initial = Some(record);
        self
    }

    /// Form view; the standard [`VirtualForm`] when unset.
    pub fn view(mut self, view: Box<dyn FormView>) -> Self {
        self.view = Some(view);
        self
    }

    /// Key/value store; opened from the config when unset.
    pub fn storage(mut self, storage: Box<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn dialog(mut self, dialog: Box<dyn ConfirmationDialog>) -> Self {
        self.dialog = dialog;
        self
    }

    pub fn notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn document_builder(mut self, builder: Box<dyn DocumentBuilder>) -> Self {
        self.builder = Some(builder);
        self
    }

    /// Skill checkboxes the view offers.
    pub fn skill_tags(mut self, tags: Vec<String>) -> Self {
        self.skill_tags = tags;
        self
    }

    /// Restore the stored draft during initialisation (default on).
    pub fn load_draft(mut self, on: bool) -> Self {
        self.load_draft = on;
        self
    }

    pub fn build(self) -> Result<AppContext, StorageError> {
        let doc_type = self.doc_type;
        let storage = match self.storage {
            Some(storage) => storage,
            None => self.config.open_storage()?,
        };

        // 1. store
        let store = FieldStore::new(self.initial.unwrap_or_else(|| example_record(doc_type)));

        // 2. binding
        let mut view = self
            .view
            .unwrap_or_else(|| Box::new(VirtualForm::for_document(doc_type)));
        let mut binding = FormBinding::new(doc_type);
        let bound = binding.bind_standard(view.as_ref(), &self.skill_tags);
        log::debug!("bound {bound} control(s) for {doc_type}");

        // 3. view population
        binding.populate(view.as_mut(), store.record());

        let mut pipeline = ExportPipeline::default();
        pipeline.set_rasterizer(self.rasterizer);
        if let Some(builder) = self.builder {
            pipeline.set_builder(builder);
        }

        let mut ctx = AppContext {
            doc_type,
            style: self.config.style,
            drafts: DraftManager::new(doc_type, self.config.autosave_delay()),
            history: ExportHistory::load(storage.as_ref(), self.config.history_limit),
            config: self.config,
            store,
            binding,
            view,
            storage,
            pipeline,
            dialog: self.dialog,
            notifier: self.notifier,
            clock: self.clock,
            preview: String::new(),
            renders: 0,
        };

        // 4. draft load (renders on success)
        if !(self.load_draft && matches!(ctx.load_draft(), LoadOutcome::Loaded(_))) {
            // 5. first render
            ctx.render();
        }
        Ok(ctx)
    }
}

pub struct AppContext {
    doc_type: DocumentType,
    style: StyleSettings,
    config: AppConfig,
    store: FieldStore,
    binding: FormBinding,
    view: Box<dyn FormView>,
    storage: Box<dyn KeyValueStore>,
    drafts: DraftManager,
    history: ExportHistory,
    pipeline: ExportPipeline,
    dialog: Box<dyn ConfirmationDialog>,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn Clock>,
    preview: String,
    renders: u64,
}

impl AppContext {
    pub fn builder(doc_type: DocumentType) -> AppContextBuilder {
        AppContextBuilder::new(doc_type)
    }

    pub fn doc_type(&self) -> DocumentType {
        self.doc_type
    }

    pub fn record(&self) -> &FieldRecord {
        self.store.record()
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn view(&self) -> &dyn FormView {
        self.view.as_ref()
    }

    pub fn style(&self) -> StyleSettings {
        self.style
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The current preview markup.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Number of full preview renders so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn stylesheet(&self) -> String {
        preview::stylesheet(&self.style)
    }

    pub fn outline(&self) -> Outline {
        Outline::from_record(self.store.record(), self.doc_type)
    }

    pub fn history(&self) -> &ExportHistory {
        &self.history
    }

    pub fn storage(&self) -> &dyn KeyValueStore {
        self.storage.as_ref()
    }

    pub fn drafts(&self) -> &DraftManager {
        &self.drafts
    }

    fn render(&mut self) {
        let options = PreviewOptions {
            placeholders: self.config.placeholders,
        };
        self.preview = preview::render(self.store.record(), &self.style, self.doc_type, options);
        self.renders += 1;
    }

    fn changed(&mut self, change: Option<Change>) -> Option<Change> {
        if change.is_some() {
            self.render();
            self.drafts.schedule(self.clock.now());
        }
        change
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// An input event from the view.
    pub fn input(&mut self, target: &InputTarget, value: ControlValue) -> Option<Change> {
        let change = self
            .binding
            .handle_input(target, value, &mut self.store, self.view.as_ref());
        self.changed(change)
    }

    /// Type into a scalar control.
    pub fn type_field(&mut self, field: ScalarField, text: &str) -> Option<Change> {
        let id = self.binding.ids().scalar(field);
        if !self.view.set_value(&id, ControlValue::text(text)) {
            log::debug!("no control '{id}' to type into");
            return None;
        }
        self.input(&InputTarget::Control(id), ControlValue::text(text))
    }

    /// Type into a field of the entry shown at `index`.
    pub fn type_entry(&mut self, list: ListName, index: usize, field: &str, text: &str) -> Option<Change> {
        let key = self.view.entry_keys(list).get(index).copied()?;
        self.view.set_entry_value(list, key, field, text);
        let target = InputTarget::Entry {
            list,
            key,
            field: field.to_string(),
        };
        self.input(&target, ControlValue::text(text))
    }

    pub fn add_entry(&mut self, list: ListName, initial: Option<&BTreeMap<String, String>>) -> Option<Change> {
        let change = self
            .binding
            .add_entry(list, initial, &mut self.store, self.view.as_mut())?;
        self.render();
        self.drafts.schedule(self.clock.now());
        Some(change)
    }

    /// Remove after confirmation; the last entry is cleared instead.
    pub fn remove_entry(&mut self, list: ListName, index: usize) -> Option<Change> {
        let change = self.binding.remove_entry(
            list,
            index,
            &mut self.store,
            self.view.as_mut(),
            Some(self.dialog.as_ref()),
        );
        self.changed(change)
    }

    pub fn reorder(&mut self, list: ListName, from: usize, to: usize) -> Option<Change> {
        let change = self
            .binding
            .reorder(list, from, to, &mut self.store, self.view.as_mut());
        self.changed(change)
    }

    pub fn clear_list(&mut self, list: ListName) -> Change {
        let change = self.binding.clear_list(list, &mut self.store, self.view.as_mut());
        self.render();
        self.drafts.schedule(self.clock.now());
        change
    }

    /// Presentation only: re-renders, does not touch the record or drafts.
    pub fn set_style(&mut self, style: StyleSettings) {
        if style != self.style {
            self.style = style;
            self.render();
        }
    }

    // -----------------------------------------------------------------------
    // Drafts
    // -----------------------------------------------------------------------

    /// Call from the host's event loop; flushes a due autosave.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        match self.drafts.tick(self.storage.as_mut(), self.store.record(), now) {
            None => false,
            Some(Ok(())) => true,
            Some(Err(e)) => {
                log::error!("autosave failed: {e}");
                self.notifier.notify(&format!("Could not save draft: {e}"), NoticeKind::Warning);
                false
            }
        }
    }

    /// Save immediately.
    pub fn save_draft(&mut self) -> Result<(), StorageError> {
        let now = self.clock.now();
        match self.drafts.save_now(self.storage.as_mut(), self.store.record(), now) {
            Ok(()) => {
                self.notifier.notify("Draft saved", NoticeKind::Success);
                Ok(())
            }
            Err(e) => {
                log::error!("draft save failed: {e}");
                self.notifier.notify(&format!("Could not save draft: {e}"), NoticeKind::Error);
                Err(e)
            }
        }
    }

    /// Restore the stored draft. Anything but a matching draft leaves the
    /// store as it is.
    pub fn load_draft(&mut self) -> LoadOutcome {
        let outcome = self.drafts.load(self.storage.as_ref());
        if let LoadOutcome::Loaded(draft) = &outcome {
            self.store.replace(draft.data.clone());
            self.binding.populate(self.view.as_mut(), self.store.record());
            self.render();
            log::info!("draft from {} restored", draft.timestamp.to_rfc3339());
        }
        outcome
    }

    pub fn discard_draft(&mut self) -> Result<(), StorageError> {
        self.drafts.discard(self.storage.as_mut())
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    pub fn export_request(&self) -> ExportRequest {
        ExportRequest::new(self.config.paper_size, self.config.quality)
    }

    pub fn export_pdf(&mut self) -> Result<Artifact, ExportError> {
        let request = self.export_request();
        self.export(ExportFormat::Pdf, &request)
    }

    pub fn export_docx(&mut self) -> Result<Artifact, ExportError> {
        let request = self.export_request();
        self.export(ExportFormat::Docx, &request)
    }

    /// Export and record the result. No content is reported to the user
    /// and leaves the context unchanged.
    pub fn export(&mut self, format: ExportFormat, request: &ExportRequest) -> Result<Artifact, ExportError> {
        let result = self
            .pipeline
            .export(format, self.store.record(), self.doc_type, &self.style, request);
        match &result {
            Ok(artifact) => {
                let record = HistoryRecord::new(
                    artifact.format,
                    artifact.file_name.clone(),
                    request.quality,
                    request.paper,
                    self.clock.now(),
                );
                if let Err(e) = self.history.push(self.storage.as_mut(), record) {
                    log::error!("could not store export history: {e}");
                }
                self.notifier
                    .notify(&format!("Exported {}", artifact.file_name), NoticeKind::Success);
            }
            Err(ExportError::NoContent) => self.notifier.notify(NO_CONTENT_MESSAGE, NoticeKind::Error),
            Err(e) => {
                log::error!("export failed: {e}");
                self.notifier.notify(&format!("Export failed: {e}"), NoticeKind::Error);
            }
        }
        result
    }

    pub fn clear_history(&mut self) -> Result<(), StorageError> {
        self.history.clear(self.storage.as_mut())
    }

    // -----------------------------------------------------------------------
    // Checks
    // -----------------------------------------------------------------------

    pub fn issues(&self) -> Vec<FieldIssue> {
        validation::validate(self.store.record())
    }

    pub fn completion(&self) -> u8 {
        validation::completion(self.store.record())
    }
}
