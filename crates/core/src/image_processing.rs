//! Image payloads and pixel conversions.
//!
//! Images travel through the studio as encoded bytes ([`ImageData`]): the
//! presenter photo on its way to Gemini, generated backgrounds on their way
//! back, and finished composites on their way to disk. Decoding only happens
//! right before compositing.
//!
//! The raster surface works on premultiplied RGBA while `image` works on
//! straight alpha, so [`ImageProcessor`] converts in both directions.

use crate::error::{AppError, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, ImageFormat, RgbaImage};
use resvg::tiny_skia::{IntSize, Pixmap};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// Encoded image bytes plus their mime type.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Arc<Vec<u8>>,
}

impl ImageData {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Wraps PNG bytes.
    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new("image/png", bytes)
    }

    /// Reads an image file, sniffing the mime type from its content.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the file cannot be read and
    /// [`AppError::Decode`] if the content is not a recognised image format.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Wraps raw bytes, sniffing the mime type from the content.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let format = image::guess_format(&bytes)
            .map_err(|e| AppError::decode(format!("unrecognised image format: {e}")))?;
        Ok(Self::new(format.to_mime_type(), bytes))
    }

    /// Parses a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| AppError::decode("data URI must start with 'data:'"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AppError::decode("data URI has no payload"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| AppError::decode("only base64 data URIs are supported"))?;
        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| AppError::decode(format!("invalid base64 payload: {e}")))?;
        Ok(Self::new(mime_type, bytes))
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.bytes.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the bytes into straight-alpha RGBA pixels.
    pub fn decode(&self) -> Result<RgbaImage> {
        if self.bytes.is_empty() {
            return Err(AppError::decode("image payload is empty"));
        }
        let img = image::load_from_memory(&self.bytes)
            .map_err(|e| AppError::decode(format!("{} ({})", e, self.mime_type)))?;
        Ok(img.to_rgba8())
    }
}

/// Pixel conversion helpers between `image` buffers and the raster surface.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Copies straight-alpha RGBA pixels into a premultiplied pixmap.
    pub fn to_pixmap(image: &RgbaImage) -> Result<Pixmap> {
        let (width, height) = image.dimensions();
        let size = IntSize::from_wh(width, height)
            .ok_or_else(|| AppError::image("image has zero width or height"))?;

        let mut data = image.as_raw().clone();
        premultiply_rgba8_in_place(&mut data);

        Pixmap::from_vec(data, size)
            .ok_or_else(|| AppError::image("failed to build pixmap from image buffer"))
    }

    /// Converts a premultiplied pixmap back into straight-alpha RGBA pixels.
    pub fn from_pixmap(pixmap: &Pixmap) -> Result<RgbaImage> {
        let mut data = Vec::with_capacity(pixmap.data().len());
        for px in pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RgbaImage::from_raw(pixmap.width(), pixmap.height(), data)
            .ok_or_else(|| AppError::image("pixmap size does not match its pixel data"))
    }

    /// Encodes pixels losslessly as PNG.
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
        let mut buffer: Vec<u8> = Vec::new();
        DynamicImage::ImageRgba8(image.clone())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| AppError::image(format!("Failed to encode PNG: {}", e)))?;
        Ok(buffer)
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}
