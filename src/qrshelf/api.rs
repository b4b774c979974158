//! # API Facade
//!
//! The single entry point for every qrshelf operation, whatever the UI.
//!
//! The facade:
//! - **Owns** both collection stores, the renderer and the scan intake
//! - **Normalizes inputs**: display positions become item ids
//! - **Returns structured types** (`Result<CmdResult>`), never strings for a terminal
//!
//! Store-level behavior (reveal window, de-duplication, fail-open persistence) lives in
//! the core modules and is tested there. Tests here cover the wiring and the messages.
//!
//! `ShelfApi` is generic over the key-value backend, the image store and the renderer:
//! production uses `FsBackend`, `FsImageStore` and `QrRenderer`; tests swap in the
//! in-memory doubles.

use crate::collection::CollectionStore;
use crate::error::{QrError, Result};
use crate::images::{Bitmap, ImageStore};
use crate::index::{self, DisplayItem};
use crate::model::{Collection, Item};
use crate::photos::{self, PhotoLibrary, SaveOutcome};
use crate::render::Renderer;
use crate::scan::{ScanIntake, ScanOutcome};
use crate::store::adapter::PersistenceAdapter;
use crate::store::KvBackend;
use crate::transfer;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_items: Vec<Item>,
    pub listed_items: Vec<DisplayItem>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_items(mut self, items: Vec<Item>) -> Self {
        self.affected_items = items;
        self
    }

    pub fn with_listed_items(mut self, items: Vec<DisplayItem>) -> Self {
        self.listed_items = items;
        self
    }
}

/// The main API facade.
pub struct ShelfApi<B: KvBackend, S: ImageStore, R: Renderer> {
    generated: CollectionStore<B, S>,
    scanned: CollectionStore<B, S>,
    renderer: R,
    intake: ScanIntake,
}

impl<B, S, R> ShelfApi<B, S, R>
where
    B: KvBackend + Clone,
    S: ImageStore + Clone,
    R: Renderer,
{
    /// Builds and loads both stores over one backend and one image store.
    pub fn open(backend: B, images: S, renderer: R, batch_size: usize) -> Self {
        let store = |collection: Collection| {
            CollectionStore::new(
                collection,
                PersistenceAdapter::new(backend.clone()),
                images.clone(),
            )
            .with_batch_size(batch_size)
        };
        Self::new(store(Collection::Generated), store(Collection::Scanned), renderer)
    }
}

impl<B: KvBackend, S: ImageStore, R: Renderer> ShelfApi<B, S, R> {
    /// Wraps two stores, loading whichever is not loaded yet.
    pub fn new(
        mut generated: CollectionStore<B, S>,
        mut scanned: CollectionStore<B, S>,
        renderer: R,
    ) -> Self {
        for store in [&mut generated, &mut scanned] {
            if !store.is_loaded() {
                store.initialize();
            }
        }
        Self {
            generated,
            scanned,
            renderer,
            intake: ScanIntake::new(),
        }
    }

    pub fn store(&self, collection: Collection) -> &CollectionStore<B, S> {
        match collection {
            Collection::Generated => &self.generated,
            Collection::Scanned => &self.scanned,
        }
    }

    pub fn store_mut(&mut self, collection: Collection) -> &mut CollectionStore<B, S> {
        match collection {
            Collection::Generated => &mut self.generated,
            Collection::Scanned => &mut self.scanned,
        }
    }

    /// Renders `text` and adds it to the generated collection.
    pub fn generate(&mut self, text: &str) -> Result<CmdResult> {
        if text.trim().is_empty() {
            return Err(QrError::Api("Nothing to encode: text is empty".to_string()));
        }
        let mut result = CmdResult::default();
        let Some(bitmap) = self.renderer.render(text) else {
            result.add_message(CmdMessage::error(format!(
                "Could not render a QR code for \"{}\"",
                text
            )));
            return Ok(result);
        };
        if let Some(id) = self.generated.add(text, Some(&bitmap)) {
            result.add_message(CmdMessage::success(format!("Generated \"{}\"", text)));
            result.affected_items = self.generated.get(id).cloned().into_iter().collect();
        }
        Ok(result)
    }

    /// Feeds decoded payloads through the scan intake, in order.
    pub fn scan<P: AsRef<str>>(&mut self, payloads: &[P]) -> Result<CmdResult> {
        let mut result = CmdResult::default();
        for payload in payloads {
            let payload = payload.as_ref();
            match self.intake.accept(&mut self.scanned, payload, &self.renderer) {
                ScanOutcome::Added(id) => {
                    if let Some(item) = self.scanned.get(id) {
                        result.affected_items.push(item.clone());
                    }
                    result.add_message(CmdMessage::success(format!("Scanned \"{}\"", payload)));
                }
                ScanOutcome::Duplicate => result.add_message(CmdMessage::warning(format!(
                    "Already scanned \"{}\"",
                    payload
                ))),
                ScanOutcome::Repeated | ScanOutcome::Empty => {}
            }
        }
        Ok(result)
    }

    /// Forgets the last scanned payload, as when the camera restarts.
    pub fn reset_scanner(&mut self) {
        self.intake.reset();
    }

    /// Reveals `pages` more batches.
    pub fn reveal(&mut self, collection: Collection, pages: usize) {
        let store = self.store_mut(collection);
        for _ in 0..pages {
            if store.is_fully_revealed() {
                break;
            }
            store.reveal_more();
        }
    }

    pub fn list(&self, collection: Collection) -> Result<CmdResult> {
        let store = self.store(collection);
        let mut result = CmdResult::default().with_listed_items(index::index_items(store.visible()));
        if !store.is_fully_revealed() {
            result.add_message(CmdMessage::info(format!(
                "Showing {} of {}",
                store.reveal_count(),
                store.len()
            )));
        }
        Ok(result)
    }

    pub fn select<I: AsRef<str>>(&mut self, collection: Collection, indexes: &[I]) -> Result<CmdResult> {
        self.set_selection(collection, indexes, true)
    }

    pub fn deselect<I: AsRef<str>>(
        &mut self,
        collection: Collection,
        indexes: &[I],
    ) -> Result<CmdResult> {
        self.set_selection(collection, indexes, false)
    }

    fn set_selection<I: AsRef<str>>(
        &mut self,
        collection: Collection,
        indexes: &[I],
        selected: bool,
    ) -> Result<CmdResult> {
        let (ids, mut result) = self.resolve(collection, indexes)?;
        let store = self.store_mut(collection);
        for &id in &ids {
            store.set_selected(id, selected);
        }
        result.affected_items = collect_items(store, &ids);
        let verb = if selected { "Selected" } else { "Deselected" };
        result.add_message(CmdMessage::success(format!("{} {} item(s)", verb, ids.len())));
        Ok(result)
    }

    pub fn select_all(&mut self, collection: Collection) -> Result<CmdResult> {
        let store = self.store_mut(collection);
        store.select_all();
        let ids = store.selected_ids();
        let mut result = CmdResult::default().with_affected_items(collect_items(store, &ids));
        result.add_message(CmdMessage::success(format!("Selected {} item(s)", ids.len())));
        Ok(result)
    }

    pub fn deselect_all(&mut self, collection: Collection) -> Result<CmdResult> {
        self.store_mut(collection).deselect_all();
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::success("Selection cleared"));
        Ok(result)
    }

    /// The item at a single display position.
    pub fn item_at(&self, collection: Collection, index: &str) -> Result<Item> {
        let positions = index::parse_positions(&[index])?;
        let &[position] = positions.as_slice() else {
            return Err(QrError::Api(format!("Expected a single position, got {}", index)));
        };
        self.store(collection)
            .visible()
            .get(position - 1)
            .cloned()
            .ok_or_else(|| QrError::Api(format!("No item at position {}", position)))
    }

    pub fn update(&mut self, collection: Collection, index: &str, text: &str) -> Result<CmdResult> {
        let item = self.item_at(collection, index)?;
        let mut result = CmdResult::default();
        if text.trim().is_empty() {
            result.add_message(CmdMessage::warning("Text is empty, nothing changed"));
            return Ok(result);
        }
        if text == item.text {
            result.add_message(CmdMessage::info("Text unchanged"));
            return Ok(result);
        }
        let store = self.store_mut(collection);
        store.update(item.id, text);
        result.affected_items = collect_items(store, &[item.id]);
        result.add_message(CmdMessage::success(format!("Updated \"{}\"", text)));
        Ok(result)
    }

    pub fn delete<I: AsRef<str>>(&mut self, collection: Collection, indexes: &[I]) -> Result<CmdResult> {
        let (ids, mut result) = self.resolve(collection, indexes)?;
        let store = self.store_mut(collection);
        let removed = collect_items(store, &ids);
        store.delete_many(&ids);
        result.add_message(CmdMessage::success(format!("Deleted {} item(s)", removed.len())));
        Ok(result.with_affected_items(removed))
    }

    pub fn delete_selected(&mut self, collection: Collection) -> Result<CmdResult> {
        let store = self.store_mut(collection);
        let ids = store.selected_ids();
        let removed = collect_items(store, &ids);
        store.delete_selected();
        let mut result = CmdResult::default();
        if removed.is_empty() {
            result.add_message(CmdMessage::info("Nothing selected"));
        } else {
            result.add_message(CmdMessage::success(format!("Deleted {} item(s)", removed.len())));
        }
        Ok(result.with_affected_items(removed))
    }

    /// Copies the selected scans into the generated collection.
    pub fn move_selected(&mut self) -> Result<CmdResult> {
        let report = transfer::move_selected(&mut self.scanned, &mut self.generated, &self.renderer);
        let mut result =
            CmdResult::default().with_affected_items(collect_items(&self.generated, &report.added));

        if report.is_empty() {
            result.add_message(CmdMessage::info("Nothing selected"));
            return Ok(result);
        }
        if !report.added.is_empty() {
            result.add_message(CmdMessage::success(format!(
                "Moved {} item(s) to generated",
                report.added.len()
            )));
        }
        for text in &report.duplicates {
            result.add_message(CmdMessage::warning(format!("Already generated \"{}\"", text)));
        }
        for text in &report.render_failures {
            result.add_message(CmdMessage::error(format!(
                "Could not render a QR code for \"{}\"",
                text
            )));
        }
        Ok(result)
    }

    pub fn selected_images(&self, collection: Collection) -> Vec<Bitmap> {
        self.store(collection).selected_images()
    }

    /// Saves the selected images to `library`; clears the selection once written.
    pub async fn export_selected<L: PhotoLibrary>(
        &mut self,
        collection: Collection,
        library: Arc<L>,
    ) -> Result<CmdResult> {
        let images = self.selected_images(collection);
        let mut result = CmdResult::default();
        match photos::save_images(library, images).await {
            SaveOutcome::Nothing => result.add_message(CmdMessage::info("Nothing to export")),
            SaveOutcome::Denied(status) => result.add_message(CmdMessage::error(status.message)),
            SaveOutcome::Completed(report) => {
                self.store_mut(collection).deselect_all();
                let message = report.message();
                result.add_message(if report.failed == 0 {
                    CmdMessage::success(message)
                } else {
                    CmdMessage::warning(message)
                });
            }
        }
        Ok(result)
    }

    /// Resolves positions to ids, with a warning for each one outside the window.
    fn resolve<I: AsRef<str>>(
        &self,
        collection: Collection,
        indexes: &[I],
    ) -> Result<(Vec<Uuid>, CmdResult)> {
        let positions = index::parse_positions(indexes)?;
        let store = self.store(collection);
        let resolved = index::resolve(store.visible(), &positions);
        let mut result = CmdResult::default();
        for position in resolved.missing {
            result.add_message(CmdMessage::warning(format!(
                "No item at position {} (showing {})",
                position,
                store.reveal_count()
            )));
        }
        Ok((resolved.ids, result))
    }
}

fn collect_items<B: KvBackend, S: ImageStore>(
    store: &CollectionStore<B, S>,
    ids: &[Uuid],
) -> Vec<Item> {
    ids.iter().filter_map(|&id| store.get(id).cloned()).collect()
}
