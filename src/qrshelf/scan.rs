//! Turning a stream of decoded camera payloads into scanned items.
//!
//! A camera keeps decoding the same code for as long as it is in frame, so the intake
//! remembers the last payload it saw and drops identical follow-ups before they ever
//! reach the store. Beyond that, a payload whose text is already in the scan
//! collection is rejected.

use crate::collection::CollectionStore;
use crate::images::ImageStore;
use crate::render::Renderer;
use crate::store::KvBackend;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A new scanned item was created.
    Added(Uuid),
    /// The text already exists in the scan collection.
    Duplicate,
    /// Same payload as the previous frame.
    Repeated,
    /// Nothing decodable in the payload.
    Empty,
}

#[derive(Debug, Default)]
pub struct ScanIntake {
    last_payload: Option<String>,
}

impl ScanIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept<B, S, R>(
        &mut self,
        store: &mut CollectionStore<B, S>,
        payload: &str,
        renderer: &R,
    ) -> ScanOutcome
    where
        B: KvBackend,
        S: ImageStore,
        R: Renderer + ?Sized,
    {
        if payload.trim().is_empty() {
            return ScanOutcome::Empty;
        }
        if self.last_payload.as_deref() == Some(payload) {
            return ScanOutcome::Repeated;
        }
        self.last_payload = Some(payload.to_string());

        if store.contains_text(payload) {
            debug!(payload, "already scanned");
            return ScanOutcome::Duplicate;
        }

        let bitmap = renderer.render(payload);
        match store.add(payload, bitmap.as_ref()) {
            Some(id) => ScanOutcome::Added(id),
            None => ScanOutcome::Empty,
        }
    }

    /// Forgets the last payload, e.g. when the camera session restarts.
    pub fn reset(&mut self) {
        self.last_payload = None;
    }
}
