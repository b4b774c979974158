//! # Storage Layer
//!
//! Persistence is split in two pieces so the core never touches a global
//! key-value store directly:
//!
//! 1. [`KvBackend`]: the raw capability, get/set bytes by key. Each store receives
//!    its own instance at construction.
//! 2. [`adapter::PersistenceAdapter`]: turns a sequence of [`Item`](crate::model::Item)
//!    into a blob and back.
//!
//! ## Fail-open
//!
//! A missing, unreadable or corrupt blob loads as an empty collection. A failed
//! write returns `false`. Neither ever reaches the caller as an error: a broken
//! blob may lose history but must never take the application down.
//!
//! ## Blob Format
//!
//! A JSON array of records:
//!
//! ```text
//! [
//!   {
//!     "id": "6f1c…",
//!     "text": "https://example.com",
//!     "image_path": "/…/images/0b7e….png",
//!     "is_selected": false,
//!     "created_at": "2026-10-19T12:00:00Z"
//!   }
//! ]
//! ```
//!
//! Records from earlier releases use camelCase keys and may carry base64
//! `imageData` instead of a path. Both are accepted on read.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: one `<key>.json` file per key, atomic writes.
//! - [`mem_backend::MemBackend`]: in-memory map for tests.

use crate::error::Result;

pub mod adapter;
pub mod fs_backend;
pub mod mem_backend;

/// Raw byte storage addressed by key.
pub trait KvBackend {
    /// Returns `Ok(None)` when nothing was ever stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replaces whatever is stored under `key`.
    fn set(&self, key: &str, bytes: &[u8]) -> Result<()>;
}
