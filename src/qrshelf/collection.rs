//! # Collection Store
//!
//! One [`CollectionStore`] exists per [`Collection`]. Both are the same type; they
//! differ only in their persistence key and in how they order items on load.
//!
//! ## State
//!
//! - `all`: the full ordered sequence, the source of truth.
//! - `reveal_count`: length of the prefix of `all` exposed to consumers.
//!
//! Consumers see [`CollectionStore::visible`], always `all[..min(reveal_count, len)]`.
//!
//! ## Reveal Window Rules
//!
//! - `initialize()` resets the window and reveals one batch.
//! - `reveal_more()` grows the window by one batch, capped at `len`; a no-op once
//!   everything is revealed.
//! - `add()` inserts at index 0 and grows the window by one only while it has not
//!   reached a full batch. Past the first page a new item pushes the oldest visible
//!   one out of the prefix and stays hidden behind further pagination.
//! - `delete()` never shrinks the stored window; readers clamp it to `len`.
//!
//! ## Persistence
//!
//! Every mutating operation (add, update, delete, selection) re-serializes the whole
//! sequence before returning. Failures are logged and otherwise ignored.

use crate::images::{Bitmap, ImageStore};
use crate::model::{Collection, ImageRef, Item, LoadOrder};
use crate::store::adapter::PersistenceAdapter;
use crate::store::KvBackend;
use std::collections::HashSet;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_BATCH_SIZE: usize = 15;

/// Edits an item's text by id, whatever store holds it.
pub trait Updatable {
    fn update(&mut self, id: Uuid, new_text: &str);
}

/// Snapshot published to subscribers whenever `visible` or a selection may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreRevision {
    pub collection: Collection,
    pub generation: u64,
    pub visible: usize,
    pub selected: usize,
}

pub struct CollectionStore<B: KvBackend, S: ImageStore> {
    collection: Collection,
    adapter: PersistenceAdapter<B>,
    images: S,
    all: Vec<Item>,
    reveal_count: usize,
    batch_size: usize,
    loaded: bool,
    revision: watch::Sender<StoreRevision>,
}

impl<B: KvBackend, S: ImageStore> CollectionStore<B, S> {
    /// Creates an empty, unloaded store. Call [`initialize`](Self::initialize) next.
    pub fn new(collection: Collection, adapter: PersistenceAdapter<B>, images: S) -> Self {
        let (revision, _) = watch::channel(StoreRevision {
            collection,
            generation: 0,
            visible: 0,
            selected: 0,
        });
        Self {
            collection,
            adapter,
            images,
            all: Vec::new(),
            reveal_count: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            loaded: false,
            revision,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn images(&self) -> &S {
        &self.images
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Loads the collection, migrating legacy data, and reveals the first batch.
    pub fn initialize(&mut self) {
        let key = self.collection.key();
        let legacy_key = self.collection.legacy_key();

        let (mut items, from_legacy) =
            if !self.adapter.contains(key) && self.adapter.contains(legacy_key) {
                info!(collection = %self.collection, legacy_key, "reading legacy collection");
                (self.adapter.load(legacy_key), true)
            } else {
                (self.adapter.load(key), false)
            };

        let migrated = self.migrate_inline_images(&mut items);

        if self.collection.load_order() == LoadOrder::ByText {
            items.sort_by(|a, b| a.text.cmp(&b.text));
        }

        self.apply_loaded(items);

        if from_legacy || migrated > 0 {
            self.persist();
        }
    }

    /// Publishes a loaded sequence in one step and reveals the first batch.
    ///
    /// Lets a caller load on another thread and hand the result over; until then the
    /// store stays empty.
    pub fn apply_loaded(&mut self, items: Vec<Item>) {
        self.all = items;
        self.reveal_count = 0;
        self.loaded = true;
        self.reveal_more();
        self.notify();
    }

    fn migrate_inline_images(&self, items: &mut [Item]) -> usize {
        let mut migrated = 0;
        for item in items.iter_mut() {
            let Some(ImageRef::Inline(bytes)) = &item.image else {
                continue;
            };
            let bitmap = match Bitmap::decode(bytes) {
                Ok(bitmap) => bitmap,
                Err(e) => {
                    warn!(id = %item.id, "legacy inline image undecodable, keeping as is: {}", e);
                    continue;
                }
            };
            match self.images.persist(&bitmap) {
                Ok(image) => {
                    item.image = Some(image);
                    migrated += 1;
                }
                Err(e) => warn!(id = %item.id, "legacy image migration failed: {}", e),
            }
        }
        if migrated > 0 {
            info!(collection = %self.collection, migrated, "migrated inline images to files");
        }
        migrated
    }

    // --- Reading ---

    /// The revealed prefix of the collection.
    pub fn visible(&self) -> &[Item] {
        &self.all[..self.reveal_count()]
    }

    /// Size of the revealed prefix, clamped to the collection length.
    pub fn reveal_count(&self) -> usize {
        self.reveal_count.min(self.all.len())
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.reveal_count >= self.all.len()
    }

    #[cfg(test)]
    pub(crate) fn all(&self) -> &[Item] {
        &self.all
    }

    pub fn contains_text(&self, text: &str) -> bool {
        self.all.iter().any(|item| item.text == text)
    }

    pub fn get(&self, id: Uuid) -> Option<&Item> {
        self.all.iter().find(|item| item.id == id)
    }

    pub fn has_selection(&self) -> bool {
        self.visible().iter().any(|item| item.is_selected)
    }

    /// Ids of visible, selected items in visible order.
    pub fn selected_ids(&self) -> Vec<Uuid> {
        self.visible()
            .iter()
            .filter(|item| item.is_selected)
            .map(|item| item.id)
            .collect()
    }

    /// Decoded bitmaps of visible, selected items. Undecodable images are skipped.
    pub fn selected_images(&self) -> Vec<Bitmap> {
        self.visible()
            .iter()
            .filter(|item| item.is_selected)
            .filter_map(|item| item.image.as_ref())
            .filter_map(|image| self.images.decode(image))
            .collect()
    }

    pub fn image_of(&self, id: Uuid) -> Option<Bitmap> {
        self.get(id)
            .and_then(|item| item.image.as_ref())
            .and_then(|image| self.images.decode(image))
    }

    // --- Pagination ---

    /// Grows the window by one batch. Safe to call repeatedly once exhausted.
    pub fn reveal_more(&mut self) {
        if self.reveal_count >= self.all.len() {
            return;
        }
        self.reveal_count = (self.reveal_count + self.batch_size).min(self.all.len());
        debug!(collection = %self.collection, revealed = self.reveal_count, "revealed more");
        self.notify();
    }

    // --- Mutation ---

    /// Adds an item at the front. Returns its id, or `None` for blank text.
    ///
    /// A bitmap that cannot be stored leaves the item without an image.
    pub fn add(&mut self, text: &str, image: Option<&Bitmap>) -> Option<Uuid> {
        if text.trim().is_empty() {
            return None;
        }
        let image = image.and_then(|bitmap| match self.images.persist(bitmap) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(collection = %self.collection, "failed to store image: {}", e);
                None
            }
        });

        let item = Item::new(text.to_string(), image);
        let id = item.id;
        self.all.insert(0, item);
        if self.reveal_count < self.batch_size {
            self.reveal_count += 1;
        }
        self.persist();
        self.notify();
        Some(id)
    }

    /// Attaches a bitmap that finished rendering after the item was added.
    ///
    /// Resolves by id, so it is safe after other mutations moved things around.
    /// Returns false if the item is gone or the bitmap could not be stored.
    pub fn attach_image(&mut self, id: Uuid, bitmap: &Bitmap) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let image = match self.images.persist(bitmap) {
            Ok(image) => image,
            Err(e) => {
                warn!(%id, "failed to store late image: {}", e);
                return false;
            }
        };
        if let Some(old) = self.all[index].image.replace(image) {
            self.images.discard(&old);
        }
        self.persist();
        self.notify();
        true
    }

    /// Replaces the text of an item in place. Blank text and unknown ids are no-ops.
    pub fn update(&mut self, id: Uuid, new_text: &str) {
        if new_text.trim().is_empty() {
            return;
        }
        if let Some(index) = self.position(id) {
            self.all[index].text = new_text.to_string();
            self.persist();
            self.notify();
        }
    }

    pub fn delete(&mut self, id: Uuid) {
        self.delete_many(&[id]);
    }

    /// Removes every listed id that exists. Order of `ids` is irrelevant.
    pub fn delete_many(&mut self, ids: &[Uuid]) {
        let doomed: HashSet<Uuid> = ids.iter().copied().collect();
        let before = self.all.len();
        let mut removed_images = Vec::new();
        self.all.retain(|item| {
            if doomed.contains(&item.id) {
                if let Some(image) = &item.image {
                    removed_images.push(image.clone());
                }
                false
            } else {
                true
            }
        });
        if self.all.len() == before {
            return;
        }
        for image in &removed_images {
            self.images.discard(image);
        }
        debug!(collection = %self.collection, removed = before - self.all.len(), "deleted items");
        self.persist();
        self.notify();
    }

    /// Deletes the selected items within the visible window only.
    pub fn delete_selected(&mut self) {
        let ids = self.selected_ids();
        self.delete_many(&ids);
    }

    pub fn set_selected(&mut self, id: Uuid, selected: bool) {
        let Some(index) = self.position(id) else {
            return;
        };
        if self.all[index].is_selected == selected {
            return;
        }
        self.all[index].is_selected = selected;
        self.persist();
        self.notify();
    }

    /// Selects every visible item. Items beyond the window keep their flag.
    pub fn select_all(&mut self) {
        self.set_visible_selection(true);
    }

    /// Deselects every visible item. Items beyond the window keep their flag.
    pub fn deselect_all(&mut self) {
        self.set_visible_selection(false);
    }

    fn set_visible_selection(&mut self, selected: bool) {
        let end = self.reveal_count();
        let mut changed = false;
        for item in &mut self.all[..end] {
            if item.is_selected != selected {
                item.is_selected = selected;
                changed = true;
            }
        }
        if changed {
            self.persist();
            self.notify();
        }
    }

    // --- Notifications ---

    pub fn subscribe(&self) -> watch::Receiver<StoreRevision> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> StoreRevision {
        *self.revision.borrow()
    }

    fn notify(&self) {
        let visible = self.reveal_count();
        let selected = self.all[..visible]
            .iter()
            .filter(|item| item.is_selected)
            .count();
        self.revision.send_modify(|rev| {
            rev.generation += 1;
            rev.visible = visible;
            rev.selected = selected;
        });
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.all.iter().position(|item| item.id == id)
    }

    fn persist(&self) {
        if !self.adapter.save(self.collection.key(), &self.all) {
            warn!(collection = %self.collection, "changes not persisted");
        }
    }
}

impl<B: KvBackend, S: ImageStore> Updatable for CollectionStore<B, S> {
    fn update(&mut self, id: Uuid, new_text: &str) {
        CollectionStore::update(self, id, new_text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_bitmap, TestEnv};

    fn texts(items: &[Item]) -> Vec<&str> {
        items.iter().map(|item| item.text.as_str()).collect()
    }

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item-{:02}", i)).collect()
    }

    fn seeded(env: &TestEnv, collection: Collection, n: usize) -> crate::test_utils::MemStore {
        let owned = numbered(n);
        let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
        env.seeded(collection, &refs)
    }

    fn assert_window_invariants(store: &crate::test_utils::MemStore) {
        assert!(store.reveal_count() <= store.len());
        assert_eq!(store.visible().len(), store.reveal_count());
        assert_eq!(store.visible(), &store.all()[..store.reveal_count()]);
    }

    // --- Initialization ---

    #[test]
    fn test_unloaded_store_shows_nothing() {
        let env = TestEnv::new();
        seeded(&env, Collection::Scanned, 3);
        let store = env.store(Collection::Scanned);
        assert!(!store.is_loaded());
        assert!(store.visible().is_empty());
    }

    #[test]
    fn test_initialize_reveals_one_batch_then_pages() {
        let env = TestEnv::new();
        let mut store = seeded(&env, Collection::Scanned, 20);

        assert_eq!(store.visible().len(), 15);
        store.reveal_more();
        assert_eq!(store.visible().len(), 20);
        store.reveal_more();
        assert_eq!(store.visible().len(), 20);
        assert!(store.is_fully_revealed());
        assert_window_invariants(&store);
    }

    #[test]
    fn test_reveal_more_after_exhaustion_is_idempotent() {
        let env = TestEnv::new();
        let mut store = seeded(&env, Collection::Scanned, 4);
        let before = store.revision();
        store.reveal_more();
        store.reveal_more();
        assert_eq!(store.reveal_count(), 4);
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn test_generated_store_sorts_by_text_on_load() {
        let env = TestEnv::new();
        let store = env.seeded(Collection::Generated, &["pear", "apple", "fig"]);
        assert_eq!(texts(store.visible()), vec!["apple", "fig", "pear"]);
    }

    #[test]
    fn test_scanned_store_keeps_stored_order() {
        let env = TestEnv::new();
        let store = env.seeded(Collection::Scanned, &["pear", "apple", "fig"]);
        assert_eq!(texts(store.visible()), vec!["pear", "apple", "fig"]);
    }

    #[test]
    fn test_new_items_go_first_even_when_sorted_on_load() {
        let env = TestEnv::new();
        let mut store = env.seeded(Collection::Generated, &["b", "c"]);
        store.add("z", None);
        assert_eq!(texts(store.visible()), vec!["z", "b", "c"]);
    }

    #[test]
    fn test_custom_batch_size_applies() {
        let env = TestEnv::new();
        seeded(&env, Collection::Scanned, 10);
        let mut store = env.store(Collection::Scanned).with_batch_size(4);
        store.initialize();
        assert_eq!(store.visible().len(), 4);
        store.reveal_more();
        assert_eq!(store.visible().len(), 8);
    }

    // --- Add ---

    #[test]
    fn test_add_to_empty_store() {
        let env = TestEnv::new();
        let mut store = env.loaded(Collection::Generated);
        let id = store.add("hello", Some(&sample_bitmap(3))).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.visible().len(), 1);
        assert_eq!(store.visible()[0].id, id);
        assert_eq!(store.visible()[0].text, "hello");
        assert!(matches!(store.visible()[0].image, Some(ImageRef::Path(_))));
        assert_eq!(store.image_of(id), Some(sample_bitmap(3)));
    }

    #[test]
    fn test_add_persists_immediately() {
        let env = TestEnv::new();
        let mut store = env.loaded(Collection::Scanned);
        store.add("persisted", None);

        let reloaded = env.loaded(Collection::Scanned);
        assert_eq!(texts(reloaded.visible()), vec!["persisted"]);
    }

    #[test]
    fn test_add_rejects_blank_text() {
        let env = TestEnv::new();
        let mut store = env.loaded(Collection::Generated);
        assert!(store.add("   ", None).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_reveals_only_while_first_page_fills() {
        let env = TestEnv::new();
        let mut store = seeded(&env, Collection::Scanned, 14);
        assert_eq!(store.reveal_count(), 14);

        store.add("fifteenth", None);
        assert_eq!(store.reveal_count(), 15);

        store.add("sixteenth", None);
        assert_eq!(store.reveal_count(), 15);
        assert_eq!(store.len(), 16);
        assert_eq!(store.visible()[0].text, "sixteenth");
        assert_window_invariants(&store);
    }

    #[test]
    fn test_add_after_scrolling_does_not_grow_window() {
        let env = TestEnv::new();
        let mut store = seeded(&env, Collection::Scanned, 20);
        store.reveal_more();
        assert_eq!(store.reveal_count(), 20);

        store.add("new", None);
        assert_eq!(store.reveal_count(), 20);
        assert_eq!(store.len(), 21);
        store.reveal_more();
        assert_eq!(store.reveal_count(), 21);
    }

    #[test]
    fn test_add_without_storable_image_keeps_item() {
        let env = TestEnv::new();
        env.images.set_simulate_write_error(true);
        let mut store = env.loaded(Collection::Generated);
        let id = store.add("no image", Some(&sample_bitmap(3))).unwrap();
        assert!(store.get(id).unwrap().image.is_none());
    }

    #[test]
    fn test_persistence_failure_is_not_fatal() {
        let env = TestEnv::new();
        let mut store = env.loaded(Collection::Generated);
        env.backend.set_simulate_write_error(true);
        store.add("memory only", None);
        assert_eq!(store.len(), 1);

        env.backend.set_simulate_write_error(false);
        assert!(env.loaded(Collection::Generated).is_empty());
    }

    // --- Attach ---

    #[test]
    fn test_late_image_resolves_by_id() {
        let env = TestEnv::new();
        let mut store = env.loaded(Collection::Scanned);
        let id = store.add("slow render", None).unwrap();
        store.add("inserted meanwhile", None);

        assert!(store.attach_image(id, &sample_bitmap(6)));
        assert_eq!(store.image_of(id), Some(sample_bitmap(6)));
        assert_eq!(store.visible()[1].id, id);
    }

    #[test]
    fn test_late_image_for_deleted_item_is_dropped() {
        let env = TestEnv::new();
        let mut store = env.loaded(Collection::Scanned);
        let id = store.add("gone", None).unwrap();
        store.delete(id);
        assert!(!store.attach_image(id, &sample_bitmap(6)));
        assert!(env.images.is_empty());
    }

    // --- Update ---

    #[test]
    fn test_update_changes_text_in_place() {
        let env = TestEnv::new();
        let mut store = env.seeded(Collection::Scanned, &["a", "b", "c"]);
        let id = store.visible()[1].id;
        let revealed = store.reveal_count();

        store.update(id, "bee");
        assert_eq!(texts(store.visible()), vec!["a", "bee", "c"]);
        assert_eq!(store.reveal_count(), revealed);
        assert_eq!(
            env.loaded(Collection::Scanned).get(id).unwrap().text,
            "bee"
        );
    }

    #[test]
    fn test_update_unknown_id_or_blank_text_is_noop() {
        let env = TestEnv::new();
        let mut store = env.seeded(Collection::Scanned, &["a"]);
        let id = store.visible()[0].id;

        store.update(Uuid::new_v4(), "x");
        store.update(id, "  ");
        assert_eq!(texts(store.visible()), vec!["a"]);
    }

    #[test]
    fn test_updatable_trait_dispatches_to_store() {
        fn rename(target: &mut impl Updatable, id: Uuid) {
            target.update(id, "renamed");
        }
        let env = TestEnv::new();
        let mut store = env.seeded(Collection::Generated, &["old"]);
        let id = store.visible()[0].id;
        rename(&mut store, id);
        assert_eq!(store.get(id).unwrap().text, "renamed");
    }

    // --- Delete ---

    #[test]
    fn test_delete_absent_id_changes_nothing() {
        let env = TestEnv::new();
        let mut store = env.seeded(Collection::Scanned, &["a", "b"]);
        let before = store.revision();
        store.delete(Uuid::new_v4());
        assert_eq!(texts(store.visible()), vec!["a", "b"]);
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn test_delete_keeps_window_but_readers_clamp() {
        let env = TestEnv::new();
        let mut store = seeded(&env, Collection::Scanned, 3);
        let id = store.visible()[0].id;
        store.delete(id);

        assert_eq!(store.len(), 2);
        assert_eq!(store.reveal_count(), 2);
        assert_eq!(store.visible().len(), 2);
        assert_window_invariants(&store);
    }

    #[test]
    fn test_delete_many_is_order_insensitive() {
        let env = TestEnv::new();
        let mut forward = env.seeded(Collection::Scanned, &["a", "b", "c", "d"]);
        let ids: Vec<Uuid> = vec![forward.visible()[1].id, forward.visible()[3].id];
        forward.delete_many(&ids);
        assert_eq!(texts(forward.visible()), vec!["a", "c"]);

        let other = TestEnv::new();
        let mut backward = other.seeded(Collection::Scanned, &["a", "b", "c", "d"]);
        let ids: Vec<Uuid> = vec![backward.visible()[3].id, backward.visible()[1].id];
        backward.delete_many(&ids);
        assert_eq!(texts(backward.visible()), vec!["a", "c"]);
    }

    #[test]
    fn test_delete_discards_stored_image() {
        let env = TestEnv::new();
        let mut store = env.loaded(Collection::Generated);
        let id = store.add("with image", Some(&sample_bitmap(2))).unwrap();
        assert_eq!(env.images.len(), 1);
        store.delete(id);
        assert!(env.images.is_empty());
    }

    #[test]
    fn test_delete_selected_removes_exactly_the_selection() {
        let env = TestEnv::new();
        let mut store = env.seeded(Collection::Scanned, &["a", "b", "c", "d", "e"]);
        let b = store.visible()[1].id;
        let d = store.visible()[3].id;
        store.set_selected(b, true);
        store.set_selected(d, true);

        store.delete_selected();
        assert_eq!(store.len(), 3);
        assert_eq!(texts(store.visible()), vec!["a", "c", "e"]);
    }

    #[test]
    fn test_delete_selected_ignores_items_beyond_window() {
        let env = TestEnv::new();
        let mut store = seeded(&env, Collection::Scanned, 20);
        store.reveal_more();
        let hidden = store.visible()[18].id;
        store.set_selected(hidden, true);

        let mut reloaded = env.loaded(Collection::Scanned);
        assert_eq!(reloaded.reveal_count(), 15);
        assert!(reloaded.get(hidden).unwrap().is_selected);

        reloaded.delete_selected();
        assert_eq!(reloaded.len(), 20);
    }

    // --- Selection ---

    #[test]
    fn test_selection_survives_reload() {
        let env = TestEnv::new();
        let mut store = env.seeded(Collection::Generated, &["a", "b"]);
        let id = store.visible()[0].id;
        store.set_selected(id, true);

        let reloaded = env.loaded(Collection::Generated);
        assert!(reloaded.get(id).unwrap().is_selected);
    }

    #[test]
    fn test_set_selected_unknown_id_is_noop() {
        let env = TestEnv::new();
        let mut store = env.seeded(Collection::Generated, &["a"]);
        store.set_selected(Uuid::new_v4(), true);
        assert!(!store.has_selection());
    }

    #[test]
    fn test_select_all_covers_visible_only() {
        let env = TestEnv::new();
        let mut store = seeded(&env, Collection::Scanned, 20);
        store.select_all();

        assert_eq!(store.selected_ids().len(), 15);
        assert!(store.all()[15..].iter().all(|item| !item.is_selected));

        store.reveal_more();
        assert_eq!(store.selected_ids().len(), 15);
        store.deselect_all();
        assert!(!store.has_selection());
    }

    #[test]
    fn test_selected_images_skip_undecodable_and_missing() {
        let env = TestEnv::new();
        let mut store = env.loaded(Collection::Generated);
        let plain = store.add("no image", None).unwrap();
        let broken = store.add("broken", Some(&sample_bitmap(2))).unwrap();
        let good = store.add("good", Some(&sample_bitmap(5))).unwrap();
        for id in [plain, broken, good] {
            store.set_selected(id, true);
        }
        if let Some(ImageRef::Path(path)) = &store.get(broken).unwrap().image {
            env.images.overwrite(path, b"garbage");
        }

        assert_eq!(store.selected_images(), vec![sample_bitmap(5)]);
    }

    // --- Legacy data ---

    #[test]
    fn test_legacy_key_is_read_and_rewritten_under_current_key() {
        let env = TestEnv::new();
        let raw = r#"[{"id":"E621E1F8-C36C-495A-93FC-0C247A3E6E5F","text":"old","isSelected":false}]"#;
        env.backend.put_raw("qrscans", raw.as_bytes());

        let store = env.loaded(Collection::Scanned);
        assert_eq!(texts(store.visible()), vec!["old"]);
        assert!(env.backend.raw("scanned").is_some());
    }

    #[test]
    fn test_current_key_wins_over_legacy_key() {
        let env = TestEnv::new();
        env.backend.put_raw(
            "qrcodes",
            br#"[{"id":"E621E1F8-C36C-495A-93FC-0C247A3E6E5F","text":"old"}]"#,
        );
        env.seeded(Collection::Generated, &["new"]);
        let store = env.loaded(Collection::Generated);
        assert_eq!(texts(store.visible()), vec!["new"]);
    }

    #[test]
    fn test_inline_images_migrate_to_references() {
        let env = TestEnv::new();
        let legacy = Item::new(
            "inline".into(),
            Some(ImageRef::Inline(sample_bitmap(4).into_png_bytes())),
        );
        PersistenceAdapter::new(env.backend.clone()).save("generated", &[legacy.clone()]);

        let store = env.loaded(Collection::Generated);
        let image = store.get(legacy.id).unwrap().image.clone().unwrap();
        assert!(!image.is_inline());
        assert!(env.images.contains(&image));
        assert_eq!(store.image_of(legacy.id), Some(sample_bitmap(4)));

        let persisted = PersistenceAdapter::new(env.backend.clone()).load("generated");
        assert_eq!(persisted[0].image, Some(image));
    }

    #[test]
    fn test_failed_migration_keeps_inline_bytes() {
        let env = TestEnv::new();
        let bytes = sample_bitmap(4).into_png_bytes();
        let legacy = Item::new("inline".into(), Some(ImageRef::Inline(bytes.clone())));
        PersistenceAdapter::new(env.backend.clone()).save("generated", &[legacy.clone()]);
        env.images.set_simulate_write_error(true);

        let store = env.loaded(Collection::Generated);
        assert_eq!(
            store.get(legacy.id).unwrap().image,
            Some(ImageRef::Inline(bytes))
        );
        assert_eq!(store.image_of(legacy.id), Some(sample_bitmap(4)));
    }

    #[test]
    fn test_corrupt_blob_starts_empty_and_recovers_on_next_save() {
        let env = TestEnv::new();
        env.backend.put_raw("generated", b"\xff\xfe garbage");
        let mut store = env.loaded(Collection::Generated);
        assert!(store.is_empty());

        store.add("fresh", None);
        assert_eq!(texts(env.loaded(Collection::Generated).visible()), vec!["fresh"]);
    }

    // --- Notifications ---

    #[test]
    fn test_subscribers_see_visible_and_selection_changes() {
        let env = TestEnv::new();
        let mut store = env.loaded(Collection::Generated);
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        let id = store.add("watched", None).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().visible, 1);

        store.set_selected(id, true);
        assert!(rx.has_changed().unwrap());
        let rev = *rx.borrow_and_update();
        assert_eq!(rev.selected, 1);
        assert_eq!(rev.collection, Collection::Generated);

        store.update(id, "renamed");
        assert!(rx.has_changed().unwrap());
    }

    #[test]
    fn test_edits_and_late_images_notify_subscribers() {
        let env = TestEnv::new();
        let mut store = env.seeded(Collection::Generated, &["a"]);
        let id = store.visible()[0].id;
        let mut rx = store.subscribe();

        store.update(id, "renamed");
        assert_eq!(store.visible()[0].text, "renamed");
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        store.update(id, "  ");
        store.update(Uuid::new_v4(), "ghost");
        assert!(!rx.has_changed().unwrap());

        assert!(store.attach_image(id, &sample_bitmap(3)));
        assert!(rx.has_changed().unwrap());
    }
}
