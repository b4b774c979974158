//! Moving selected scans into the generated collection.
//!
//! Only text crosses over. The destination always renders a fresh image and never
//! reuses the scan's stored one. A text already present anywhere in the destination
//! (not just its visible window) is skipped, so repeating a transfer never creates
//! duplicates.
//!
//! There is no rollback: a render failure skips that one item and the loop goes on.

use crate::collection::CollectionStore;
use crate::images::ImageStore;
use crate::render::Renderer;
use crate::store::KvBackend;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Ids of the items created in the destination, in transfer order.
    pub added: Vec<Uuid>,
    /// Texts skipped because the destination already had them.
    pub duplicates: Vec<String>,
    /// Texts skipped because rendering failed.
    pub render_failures: Vec<String>,
}

impl TransferReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.duplicates.is_empty() && self.render_failures.is_empty()
    }
}

/// Copies the visible, selected items of `from` into `to`.
///
/// Afterwards `to` reveals one more batch and `from` is deselected.
pub fn move_selected<B1, S1, B2, S2, R>(
    from: &mut CollectionStore<B1, S1>,
    to: &mut CollectionStore<B2, S2>,
    renderer: &R,
) -> TransferReport
where
    B1: KvBackend,
    S1: ImageStore,
    B2: KvBackend,
    S2: ImageStore,
    R: Renderer + ?Sized,
{
    let selected: Vec<String> = from
        .visible()
        .iter()
        .filter(|item| item.is_selected)
        .map(|item| item.text.clone())
        .collect();

    let mut report = TransferReport::default();

    for text in selected {
        if to.contains_text(&text) {
            debug!(%text, "already in destination, skipping");
            report.duplicates.push(text);
            continue;
        }
        let Some(bitmap) = renderer.render(&text) else {
            warn!(%text, "render failed, skipping");
            report.render_failures.push(text);
            continue;
        };
        if let Some(id) = to.add(&text, Some(&bitmap)) {
            report.added.push(id);
        }
    }

    to.reveal_more();
    from.deselect_all();
    report
}
