//! # QRShelf Architecture
//!
//! QRShelf keeps two collections of QR codes side by side: the codes a user
//! **generated** from text and the codes a user **scanned** with a camera. It is a
//! UI-agnostic library with a small CLI client on top.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Owns both collection stores, renderer and scan intake    │
//! │  - Normalizes inputs (positions → ids)                      │
//! │  - Returns structured CmdResult values                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Core (collection.rs, transfer.rs, scan.rs, photos.rs)      │
//! │  - Reveal window, CRUD, selection, de-duplication           │
//! │  - Every operation is a safe no-op on unknown ids           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/, images.rs)                          │
//! │  - KvBackend: get/set bytes by key (fs or memory)           │
//! │  - PersistenceAdapter: items ⇄ blob, fail-open on decode    │
//! │  - ImageStore: rendered bitmaps ⇄ file references           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Reveal Window
//!
//! Each store exposes only a prefix of its backing sequence, grown in fixed batches
//! as the user scrolls. See [`collection`] for the exact rules, in particular the
//! policy for newly added items once the first page is full.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never writes to stdout/stderr and never exits the
//! process. Collaborators that do real I/O (key-value backend, image store, QR
//! renderer, photo library) are injected, so every layer can be tested with
//! in-memory doubles.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade and structured results
//! - [`collection`]: The collection store (reveal window, CRUD, selection)
//! - [`transfer`]: Moving selected scans into the generated collection
//! - [`scan`]: Accepting decoded camera payloads into the scan collection
//! - [`photos`]: Exporting selected images to a photo library
//! - [`permissions`]: Authorization states and user-facing status text
//! - [`store`]: Key-value backends and the persistence adapter
//! - [`images`]: Bitmaps and the image store
//! - [`render`]: Text → QR bitmap rendering
//! - [`model`]: Core data types (`Item`, `ImageRef`, `Collection`)
//! - [`index`]: Display position parsing (`3`, `2-5`)
//! - [`editor`]: External editor integration
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod api;
pub mod collection;
pub mod config;
pub mod editor;
pub mod error;
pub mod images;
pub mod index;
pub mod model;
pub mod permissions;
pub mod photos;
pub mod render;
pub mod scan;
pub mod store;
pub mod transfer;

#[cfg(test)]
pub(crate) mod test_utils;
