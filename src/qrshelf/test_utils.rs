use crate::collection::CollectionStore;
use crate::images::{Bitmap, MemImageStore};
use crate::model::Collection;
use crate::render::Renderer;
use crate::store::adapter::PersistenceAdapter;
use crate::store::mem_backend::MemBackend;
use image::{DynamicImage, GrayImage, Luma};
use std::cell::RefCell;
use std::collections::HashSet;

pub type MemStore = CollectionStore<MemBackend, MemImageStore>;

/// A small square PNG whose size doubles as an identity in assertions.
pub fn sample_bitmap(size: u32) -> Bitmap {
    let image = GrayImage::from_pixel(size, size, Luma([200u8]));
    Bitmap::from_image(&DynamicImage::ImageLuma8(image)).expect("encode sample bitmap")
}

/// An in-memory store plus handles on its backend and image store.
pub struct TestEnv {
    pub backend: MemBackend,
    pub images: MemImageStore,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            backend: MemBackend::new(),
            images: MemImageStore::new(),
        }
    }

    /// A fresh, not yet initialized store over this environment's storage.
    pub fn store(&self, collection: Collection) -> MemStore {
        CollectionStore::new(
            collection,
            PersistenceAdapter::new(self.backend.clone()),
            self.images.clone(),
        )
    }

    /// A store that already went through `initialize()`.
    pub fn loaded(&self, collection: Collection) -> MemStore {
        let mut store = self.store(collection);
        store.initialize();
        store
    }

    /// A loaded store holding `texts`, persisted in the given order.
    pub fn seeded(&self, collection: Collection, texts: &[&str]) -> MemStore {
        let mut store = self.loaded(collection);
        // add() inserts at the front, so walk backwards to keep `texts` order
        for text in texts.iter().rev() {
            store.add(text, None);
        }
        let mut reloaded = self.store(collection);
        reloaded.initialize();
        reloaded
    }
}

/// Renders every text except the ones it is told to fail on.
#[derive(Default)]
pub struct FakeRenderer {
    failing: RefCell<HashSet<String>>,
}

impl FakeRenderer {
    pub fn failing_on(texts: &[&str]) -> Self {
        Self {
            failing: RefCell::new(texts.iter().map(|t| t.to_string()).collect()),
        }
    }
}

impl Renderer for FakeRenderer {
    fn render(&self, text: &str) -> Option<Bitmap> {
        if text.trim().is_empty() || self.failing.borrow().contains(text) {
            return None;
        }
        Some(sample_bitmap(text.len() as u32 + 1))
    }
}
