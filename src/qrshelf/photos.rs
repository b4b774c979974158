//! Saving selected images to a photo library.
//!
//! A save is a fan-out of independent writes with a single join: every image gets its
//! own task, and the caller receives one [`SaveReport`] after all of them finished,
//! in whatever order they completed. There is no cancellation.
//!
//! Authorization is checked first and covers all five states:
//!
//! - authorized / limited: save right away
//! - not determined: ask once, then save if access was granted
//! - denied / restricted: nothing is written, the caller gets a status message

use crate::error::{QrError, Result};
use crate::images::Bitmap;
use crate::permissions::{status_message, Authorization, Device, Status};
use chrono::Utc;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};
use uuid::Uuid;

pub trait PhotoLibrary: Send + Sync + 'static {
    fn authorization(&self) -> Authorization;

    /// Asks for add-only access. Resolves to the state after the prompt.
    fn request_authorization(&self) -> impl Future<Output = Authorization> + Send;

    fn write(&self, bitmap: Bitmap) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub total: usize,
    pub saved: usize,
    pub failed: usize,
}

impl SaveReport {
    pub fn message(&self) -> String {
        format!(
            "Saved {} of {}. Errors: {}",
            self.saved, self.total, self.failed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No images were handed in.
    Nothing,
    Completed(SaveReport),
    /// Access was refused; nothing was written.
    Denied(Status),
}

/// Writes every image to `library` once access is granted.
pub async fn save_images<L: PhotoLibrary>(library: Arc<L>, images: Vec<Bitmap>) -> SaveOutcome {
    if images.is_empty() {
        return SaveOutcome::Nothing;
    }

    let mut status = library.authorization();
    if status == Authorization::NotDetermined {
        status = library.request_authorization().await;
        debug!(%status, "photo library authorization requested");
    }
    if !status.allows_access() {
        return SaveOutcome::Denied(status_message(Device::PhotoLibrary, status));
    }

    let total = images.len();
    let mut writes = JoinSet::new();
    for bitmap in images {
        let library = Arc::clone(&library);
        writes.spawn(async move { library.write(bitmap).await });
    }

    let mut saved = 0;
    let mut failed = 0;
    while let Some(joined) = writes.join_next().await {
        match joined {
            Ok(Ok(())) => saved += 1,
            Ok(Err(e)) => {
                warn!("photo write failed: {}", e);
                failed += 1;
            }
            Err(e) => {
                warn!("photo write task aborted: {}", e);
                failed += 1;
            }
        }
    }

    SaveOutcome::Completed(SaveReport {
        total,
        saved,
        failed,
    })
}

/// A photo library backed by a plain directory.
///
/// A missing directory counts as "not determined"; requesting access creates it.
pub struct DirPhotoLibrary {
    dir: PathBuf,
}

impl DirPhotoLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PhotoLibrary for DirPhotoLibrary {
    fn authorization(&self) -> Authorization {
        match std::fs::metadata(&self.dir) {
            Ok(meta) if !meta.is_dir() => Authorization::Restricted,
            Ok(meta) if meta.permissions().readonly() => Authorization::Denied,
            Ok(_) => Authorization::Authorized,
            Err(_) => Authorization::NotDetermined,
        }
    }

    fn request_authorization(&self) -> impl Future<Output = Authorization> + Send {
        let dir = self.dir.clone();
        async move {
            match tokio::fs::create_dir_all(&dir).await {
                Ok(()) => Authorization::Authorized,
                Err(e) => {
                    warn!(dir = %dir.display(), "cannot create photo directory: {}", e);
                    Authorization::Denied
                }
            }
        }
    }

    fn write(&self, bitmap: Bitmap) -> impl Future<Output = Result<()>> + Send {
        let name = format!(
            "QR_{}_{}.png",
            Utc::now().format("%Y%m%d-%H%M%S"),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let target = self.dir.join(name);
        async move {
            tokio::fs::write(&target, bitmap.png_bytes())
                .await
                .map_err(QrError::Io)?;
            debug!(path = %target.display(), "saved photo");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::StatusLevel;
    use crate::test_utils::sample_bitmap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fails writes for bitmaps of the listed widths.
    struct FakeLibrary {
        status: Mutex<Authorization>,
        on_request: Authorization,
        failing_widths: Vec<u32>,
        requests: AtomicUsize,
        writes: AtomicUsize,
    }

    impl FakeLibrary {
        fn new(status: Authorization) -> Self {
            Self {
                status: Mutex::new(status),
                on_request: Authorization::Authorized,
                failing_widths: Vec::new(),
                requests: AtomicUsize::new(0),
                writes: AtomicUsize::new(0),
            }
        }
    }

    impl PhotoLibrary for FakeLibrary {
        fn authorization(&self) -> Authorization {
            *self.status.lock().unwrap()
        }

        fn request_authorization(&self) -> impl Future<Output = Authorization> + Send {
            self.requests.fetch_add(1, Ordering::SeqCst);
            *self.status.lock().unwrap() = self.on_request;
            let granted = self.on_request;
            async move { granted }
        }

        fn write(&self, bitmap: Bitmap) -> impl Future<Output = Result<()>> + Send {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let fail = self.failing_widths.contains(&bitmap.width());
            async move {
                tokio::task::yield_now().await;
                if fail {
                    Err(QrError::Store("disk full".into()))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn bitmaps(sizes: &[u32]) -> Vec<Bitmap> {
        sizes.iter().map(|&s| sample_bitmap(s)).collect()
    }

    #[tokio::test]
    async fn test_empty_input_does_nothing() {
        let library = Arc::new(FakeLibrary::new(Authorization::NotDetermined));
        let outcome = save_images(Arc::clone(&library), Vec::new()).await;
        assert_eq!(outcome, SaveOutcome::Nothing);
        assert_eq!(library.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authorized_saves_everything_once() {
        let library = Arc::new(FakeLibrary::new(Authorization::Authorized));
        let outcome = save_images(Arc::clone(&library), bitmaps(&[2, 3, 4])).await;
        let SaveOutcome::Completed(report) = outcome else {
            panic!("expected a completed save");
        };
        assert_eq!(report, SaveReport { total: 3, saved: 3, failed: 0 });
        assert_eq!(library.writes.load(Ordering::SeqCst), 3);
        assert_eq!(report.message(), "Saved 3 of 3. Errors: 0");
    }

    #[tokio::test]
    async fn test_partial_failures_are_counted() {
        let mut fake = FakeLibrary::new(Authorization::Limited);
        fake.failing_widths = vec![3];
        let outcome = save_images(Arc::new(fake), bitmaps(&[2, 3, 4, 3])).await;
        assert_eq!(
            outcome,
            SaveOutcome::Completed(SaveReport { total: 4, saved: 2, failed: 2 })
        );
    }

    #[tokio::test]
    async fn test_undetermined_asks_then_saves() {
        let library = Arc::new(FakeLibrary::new(Authorization::NotDetermined));
        let outcome = save_images(Arc::clone(&library), bitmaps(&[2])).await;
        assert!(matches!(outcome, SaveOutcome::Completed(r) if r.saved == 1));
        assert_eq!(library.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refused_request_writes_nothing() {
        let mut fake = FakeLibrary::new(Authorization::NotDetermined);
        fake.on_request = Authorization::Denied;
        let library = Arc::new(fake);

        let outcome = save_images(Arc::clone(&library), bitmaps(&[2])).await;
        let SaveOutcome::Denied(status) = outcome else {
            panic!("expected a denial");
        };
        assert_eq!(status.level, StatusLevel::Blocked);
        assert_eq!(library.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_restricted_never_prompts() {
        let library = Arc::new(FakeLibrary::new(Authorization::Restricted));
        let outcome = save_images(Arc::clone(&library), bitmaps(&[2])).await;
        assert!(matches!(outcome, SaveOutcome::Denied(_)));
        assert_eq!(library.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dir_library_creates_directory_on_request() {
        let tmp = tempfile::tempdir().unwrap();
        let library = Arc::new(DirPhotoLibrary::new(tmp.path().join("photos")));
        assert_eq!(library.authorization(), Authorization::NotDetermined);

        let outcome = save_images(Arc::clone(&library), bitmaps(&[2, 5])).await;
        assert!(matches!(outcome, SaveOutcome::Completed(r) if r.saved == 2));
        assert_eq!(library.authorization(), Authorization::Authorized);

        let mut sizes: Vec<u32> = std::fs::read_dir(library.dir())
            .unwrap()
            .map(|entry| {
                let bytes = std::fs::read(entry.unwrap().path()).unwrap();
                Bitmap::decode(&bytes).unwrap().width()
            })
            .collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![2, 5]);
    }

    #[test]
    fn test_dir_library_on_a_file_is_restricted() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        assert_eq!(
            DirPhotoLibrary::new(file).authorization(),
            Authorization::Restricted
        );
    }
}
