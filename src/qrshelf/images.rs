//! Rendered bitmaps and where they are kept.
//!
//! Items never hold pixels themselves, only an [`ImageRef`]. An [`ImageStore`] turns a
//! [`Bitmap`] into a reference when an item is created and back into a bitmap when
//! a consumer needs to display, share or export it.

use crate::error::{QrError, Result};
use crate::model::ImageRef;
use image::{DynamicImage, ImageFormat};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::warn;
use uuid::Uuid;

/// A decodable image, always held as PNG bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    png: Vec<u8>,
}

impl Bitmap {
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            png,
        })
    }

    /// Validates raw image bytes. Non-PNG input is re-encoded as PNG.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?;
        if matches!(image::guess_format(bytes), Ok(ImageFormat::Png)) {
            return Ok(Self {
                width: image.width(),
                height: image.height(),
                png: bytes.to_vec(),
            });
        }
        Self::from_image(&image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn into_png_bytes(self) -> Vec<u8> {
        self.png
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_len", &self.png.len())
            .finish()
    }
}

/// Keeps rendered bitmaps outside the serialized collection.
pub trait ImageStore {
    /// Stores the bitmap and returns the reference to record on the item.
    fn persist(&self, bitmap: &Bitmap) -> Result<ImageRef>;

    /// Returns the bitmap behind a reference, or `None` if it is gone or undecodable.
    fn decode(&self, image: &ImageRef) -> Option<Bitmap>;

    /// Best-effort removal of an image nobody references anymore.
    fn discard(&self, image: &ImageRef);
}

/// Writes `<uuid>.png` files into a directory.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    dir: PathBuf,
}

impl FsImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageStore for FsImageStore {
    fn persist(&self, bitmap: &Bitmap) -> Result<ImageRef> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(QrError::Io)?;
        }
        let id = Uuid::new_v4();
        let target = self.dir.join(format!("{}.png", id));

        // Atomic write
        let tmp = self.dir.join(format!(".{}.tmp", id));
        fs::write(&tmp, bitmap.png_bytes()).map_err(QrError::Io)?;
        fs::rename(&tmp, &target).map_err(QrError::Io)?;

        Ok(ImageRef::Path(target))
    }

    fn decode(&self, image: &ImageRef) -> Option<Bitmap> {
        let bytes = match image {
            ImageRef::Path(path) => match fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), "image unreadable: {}", e);
                    return None;
                }
            },
            ImageRef::Inline(bytes) => bytes.clone(),
        };
        Bitmap::decode(&bytes)
            .map_err(|e| warn!("image undecodable: {}", e))
            .ok()
    }

    fn discard(&self, image: &ImageRef) {
        // Only files this store created; anything else is not ours to delete.
        if let ImageRef::Path(path) = image {
            if path.parent() == Some(self.dir.as_path()) {
                if let Err(e) = fs::remove_file(path) {
                    warn!(path = %path.display(), "failed to remove image: {}", e);
                }
            }
        }
    }
}

/// In-memory image store for testing. Clones share storage.
#[derive(Clone, Default)]
pub struct MemImageStore {
    files: Rc<RefCell<HashMap<PathBuf, Vec<u8>>>>,
    simulate_write_error: Rc<Cell<bool>>,
}

impl MemImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    pub fn len(&self) -> usize {
        self.files.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.borrow().is_empty()
    }

    pub fn contains(&self, image: &ImageRef) -> bool {
        match image {
            ImageRef::Path(path) => self.files.borrow().contains_key(path),
            ImageRef::Inline(_) => false,
        }
    }

    /// Replace stored bytes, e.g. to simulate a damaged file.
    pub fn overwrite(&self, path: &Path, bytes: &[u8]) {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), bytes.to_vec());
    }
}

impl ImageStore for MemImageStore {
    fn persist(&self, bitmap: &Bitmap) -> Result<ImageRef> {
        if self.simulate_write_error.get() {
            return Err(QrError::Store("Simulated image write error".to_string()));
        }
        let path = PathBuf::from(format!("memory://images/{}.png", Uuid::new_v4()));
        self.files
            .borrow_mut()
            .insert(path.clone(), bitmap.png_bytes().to_vec());
        Ok(ImageRef::Path(path))
    }

    fn decode(&self, image: &ImageRef) -> Option<Bitmap> {
        let bytes = match image {
            ImageRef::Path(path) => self.files.borrow().get(path).cloned()?,
            ImageRef::Inline(bytes) => bytes.clone(),
        };
        Bitmap::decode(&bytes).ok()
    }

    fn discard(&self, image: &ImageRef) {
        if let ImageRef::Path(path) = image {
            self.files.borrow_mut().remove(path);
        }
    }
}
