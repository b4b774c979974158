use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Which of the two collections a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Generated,
    Scanned,
}

/// How a collection orders its items right after loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrder {
    /// Ascending by text. Later inserts still go to the front.
    ByText,
    /// As persisted, which is newest first.
    AsStored,
}

impl Collection {
    /// Persistence key of the collection.
    pub fn key(self) -> &'static str {
        match self {
            Collection::Generated => "generated",
            Collection::Scanned => "scanned",
        }
    }

    /// Key used by earlier releases, read once when `key()` holds nothing.
    pub fn legacy_key(self) -> &'static str {
        match self {
            Collection::Generated => "qrcodes",
            Collection::Scanned => "qrscans",
        }
    }

    pub fn load_order(self) -> LoadOrder {
        match self {
            Collection::Generated => LoadOrder::ByText,
            Collection::Scanned => LoadOrder::AsStored,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where the rendered bitmap of an item lives.
///
/// Current stores only write `Path`. `Inline` exists for records written by older
/// releases and is migrated to `Path` when the collection loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Path(PathBuf),
    Inline(Vec<u8>),
}

impl ImageRef {
    pub fn is_inline(&self) -> bool {
        matches!(self, ImageRef::Inline(_))
    }
}

/// A single QR code entry.
///
/// Equality is by `id` only.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: Uuid,
    pub text: String,
    pub image: Option<ImageRef>,
    pub is_selected: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(text: String, image: Option<ImageRef>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            image,
            is_selected: false,
            created_at: Some(Utc::now()),
        }
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}
