use crate::images::Bitmap;
use image::{DynamicImage, Luma};
use qrcode::QrCode;
use tracing::warn;

/// Turns text into a QR bitmap.
///
/// Rendering is deterministic and may only fail on empty or unencodable input.
pub trait Renderer {
    fn render(&self, text: &str) -> Option<Bitmap>;
}

pub const DEFAULT_SCALE: u32 = 10;

/// Renders with the `qrcode` crate, `scale` pixels per module.
#[derive(Debug, Clone, Copy)]
pub struct QrRenderer {
    scale: u32,
}

impl Default for QrRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE)
    }
}

impl QrRenderer {
    pub fn new(scale: u32) -> Self {
        Self {
            scale: scale.max(1),
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }
}

impl Renderer for QrRenderer {
    fn render(&self, text: &str) -> Option<Bitmap> {
        if text.is_empty() {
            return None;
        }
        let code = match QrCode::new(text.as_bytes()) {
            Ok(code) => code,
            Err(e) => {
                warn!("cannot encode {} bytes as QR: {}", text.len(), e);
                return None;
            }
        };
        let pixels = code
            .render::<Luma<u8>>()
            .module_dimensions(self.scale, self.scale)
            .build();
        Bitmap::from_image(&DynamicImage::ImageLuma8(pixels))
            .map_err(|e| warn!("failed to encode QR bitmap: {}", e))
            .ok()
    }
}
