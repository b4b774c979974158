use super::KvBackend;
use crate::model::{ImageRef, Item};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

/// On-disk shape of one item.
#[derive(Debug, Serialize, Deserialize)]
struct ItemRecord {
    id: Uuid,
    text: String,
    #[serde(default, alias = "imagePath", skip_serializing_if = "Option::is_none")]
    image_path: Option<PathBuf>,
    #[serde(default, alias = "imageData", skip_serializing_if = "Option::is_none")]
    image_data: Option<String>,
    #[serde(default, alias = "isSelected")]
    is_selected: bool,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        let (image_path, image_data) = match &item.image {
            Some(ImageRef::Path(path)) => (Some(path.clone()), None),
            Some(ImageRef::Inline(bytes)) => (None, Some(STANDARD.encode(bytes))),
            None => (None, None),
        };
        Self {
            id: item.id,
            text: item.text.clone(),
            image_path,
            image_data,
            is_selected: item.is_selected,
            created_at: item.created_at,
        }
    }
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        let image = match (record.image_path, record.image_data) {
            (Some(path), _) => Some(ImageRef::Path(path)),
            (None, Some(data)) => match STANDARD.decode(data.as_bytes()) {
                Ok(bytes) => Some(ImageRef::Inline(bytes)),
                Err(e) => {
                    warn!(id = %record.id, "dropping undecodable inline image: {}", e);
                    None
                }
            },
            (None, None) => None,
        };
        Item {
            id: record.id,
            text: record.text,
            image,
            is_selected: record.is_selected,
            created_at: record.created_at,
        }
    }
}

/// Serializes item sequences to and from a [`KvBackend`].
///
/// Nothing here returns an error: decode failures load as empty and write failures
/// report `false`.
pub struct PersistenceAdapter<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> PersistenceAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether anything at all is stored under `key`, readable or not.
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.backend.get(key), Ok(Some(_)))
    }

    /// Loads the sequence stored under `key`, or an empty one if it is absent or corrupt.
    pub fn load(&self, key: &str) -> Vec<Item> {
        let bytes = match self.backend.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key, "failed to read collection, starting empty: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<ItemRecord>>(&bytes) {
            Ok(records) => {
                debug!(key, count = records.len(), "loaded collection");
                records.into_iter().map(Item::from).collect()
            }
            Err(e) => {
                warn!(key, "corrupt collection blob, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Writes the full sequence under `key`. Returns whether it was stored.
    pub fn save(&self, key: &str, items: &[Item]) -> bool {
        let records: Vec<ItemRecord> = items.iter().map(ItemRecord::from).collect();
        let bytes = match serde_json::to_vec(&records) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, "failed to encode collection: {}", e);
                return false;
            }
        };

        match self.backend.set(key, &bytes) {
            Ok(()) => {
                debug!(key, count = items.len(), "saved collection");
                true
            }
            Err(e) => {
                warn!(key, "failed to save collection: {}", e);
                false
            }
        }
    }
}
