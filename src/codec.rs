//! Image sources, data URIs and raster encoding.
//!
//! Image objects carry their source as a `data:` URI so that a serialized
//! scene is self-contained. The decoded pixels ride along in memory and are
//! rebuilt from the URI whenever a snapshot is restored.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EditorError, EditorResult};
use crate::util::time;

/// Raster formats supported by export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Where an imported image comes from
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// A `data:` URI, a `file://` URL or a local path. Remote URLs are
    /// rejected, and so are local files on the web.
    Url(String),
    /// Raw bytes of an encoded image file
    File(Vec<u8>),
}

impl ImageInput {
    /// Normalizes the input to a data URI. File bytes are sniffed for their
    /// format to pick the MIME type.
    pub fn into_data_uri(self) -> EditorResult<String> {
        match self {
            Self::Url(url) if url.starts_with("data:") => Ok(url),
            Self::Url(url) => match local_path(&url) {
                Some(path) => {
                    let bytes = std::fs::read(path)?;
                    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
                    Self::File(bytes).into_data_uri()
                }
                None => Err(EditorError::UnsupportedSource(url)),
            },
            Self::File(bytes) => {
                let format = image::guess_format(&bytes)?;
                Ok(to_data_uri(&bytes, format.to_mime_type()))
            }
        }
    }
}

/// Filesystem path named by a `file://` URL or a bare path. Any other
/// scheme yields `None`.
fn local_path(url: &str) -> Option<&Path> {
    if cfg!(target_arch = "wasm32") {
        return None;
    }
    if let Some(path) = url.strip_prefix("file://") {
        return Some(Path::new(path));
    }
    if url.contains("://") || url.is_empty() {
        return None;
    }
    Some(Path::new(url))
}

/// Encodes bytes as a base64 `data:` URI
pub fn to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// Extracts the payload of a base64 `data:` URI
pub fn parse_data_uri(uri: &str) -> EditorResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| EditorError::InvalidDataUri("missing data: scheme".to_owned()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| EditorError::InvalidDataUri("missing payload separator".to_owned()))?;
    if !header.ends_with(";base64") {
        return Err(EditorError::InvalidDataUri(format!(
            "unsupported encoding in header '{}'",
            header
        )));
    }
    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| EditorError::InvalidDataUri(err.to_string()))
}

/// Pixel source of an image object.
///
/// Only the URI and the natural size are serialized. `key` identifies the
/// pixel content for texture caching and survives snapshot round trips.
#[derive(Clone, Serialize, Deserialize)]
pub struct ImageSource {
    key: Uuid,
    src: String,
    natural_width: u32,
    natural_height: u32,
    #[serde(skip)]
    pixels: Option<Arc<RgbaImage>>,
}

impl ImageSource {
    /// Wraps already decoded pixels, encoding them as a PNG data URI
    pub fn from_pixels(pixels: RgbaImage) -> EditorResult<Self> {
        let bytes = encode_raster(&pixels, RasterFormat::Png)?;
        Ok(Self {
            key: Uuid::new_v4(),
            src: to_data_uri(&bytes, RasterFormat::Png.mime_type()),
            natural_width: pixels.width(),
            natural_height: pixels.height(),
            pixels: Some(Arc::new(pixels)),
        })
    }

    pub fn key(&self) -> Uuid {
        self.key
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// Intrinsic pixel size, independent of any scaling on the scene
    pub fn natural_size(&self) -> [u32; 2] {
        [self.natural_width, self.natural_height]
    }

    /// Decoded pixels, `None` until [`Self::ensure_decoded`] ran
    pub fn pixels(&self) -> Option<&Arc<RgbaImage>> {
        self.pixels.as_ref()
    }

    pub fn is_decoded(&self) -> bool {
        self.pixels.is_some()
    }

    /// Decodes the URI if the pixels are not in memory yet
    pub fn ensure_decoded(&mut self) -> EditorResult<()> {
        if self.pixels.is_none() {
            let pixels = decode_pixels(&self.src)?;
            self.natural_width = pixels.width();
            self.natural_height = pixels.height();
            self.pixels = Some(Arc::new(pixels));
        }
        Ok(())
    }
}

impl PartialEq for ImageSource {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.src == other.src
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("key", &self.key)
            .field("natural_width", &self.natural_width)
            .field("natural_height", &self.natural_height)
            .field("decoded", &self.pixels.is_some())
            .finish_non_exhaustive()
    }
}

fn decode_pixels(uri: &str) -> EditorResult<RgbaImage> {
    let bytes = parse_data_uri(uri)?;
    let decoded = image::load_from_memory(&bytes)?;
    log::debug!("Decoded image: {}x{}", decoded.width(), decoded.height());
    Ok(decoded.to_rgba8())
}

/// Decodes an image input into a ready-to-place source.
pub async fn load_image(input: ImageInput) -> EditorResult<ImageSource> {
    let src = input.into_data_uri()?;
    let pixels = decode_pixels(&src)?;
    Ok(ImageSource {
        key: Uuid::new_v4(),
        natural_width: pixels.width(),
        natural_height: pixels.height(),
        src,
        pixels: Some(Arc::new(pixels)),
    })
}

/// Encodes pixels at maximum quality. JPEG has no alpha channel, so the
/// pixels are flattened onto white first.
pub fn encode_raster(pixels: &RgbaImage, format: RasterFormat) -> EditorResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let (width, height) = pixels.dimensions();
    let result = match format {
        RasterFormat::Png => PngEncoder::new(&mut buffer).write_image(
            pixels.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
        RasterFormat::Jpeg => {
            let flattened = flatten_on_white(pixels);
            JpegEncoder::new_with_quality(&mut buffer, 100).write_image(
                flattened.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
    };
    result.map_err(|err| EditorError::Encode(err.to_string()))?;
    Ok(buffer.into_inner())
}

fn flatten_on_white(pixels: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let [r, g, b, a] = pixels.get_pixel(x, y).0;
        let alpha = a as u32;
        let over_white = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
        image::Rgb([over_white(r), over_white(g), over_white(b)])
    })
}

/// A generated raster, ready to be handed to the host for download
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub format: RasterFormat,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Names the file `<kind>-<unix-timestamp-ms>.<format>`
    pub fn new(kind: &str, format: RasterFormat, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{}-{}.{}", kind, time::timestamp_millis(), format.extension()),
            format,
            bytes,
        }
    }

    pub fn data_uri(&self) -> String {
        to_data_uri(&self.bytes, self.format.mime_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn test_data_uri_parsing() {
        let uri = to_data_uri(b"hello", "text/plain");
        assert!(uri.starts_with("data:text/plain;base64,"));
        assert_eq!(parse_data_uri(&uri).unwrap(), b"hello");

        assert!(parse_data_uri("https://example.com/cat.png").is_err());
        assert!(parse_data_uri("data:text/plain,hello").is_err());
        assert!(parse_data_uri("data:image/png;base64").is_err());
    }

    #[test]
    fn test_remote_urls_are_rejected() {
        let result = ImageInput::Url("https://example.com/cat.png".to_owned()).into_data_uri();
        assert!(matches!(result, Err(EditorError::UnsupportedSource(_))));
    }

    #[test]
    fn test_local_paths_and_file_urls_are_read() {
        let bytes = encode_raster(&checker(6, 2), RasterFormat::Png).unwrap();
        let path = std::env::temp_dir().join(format!("canvas-editor-{}.png", Uuid::new_v4()));
        std::fs::write(&path, &bytes).unwrap();
        let location = path.to_string_lossy().into_owned();

        let from_path = ImageInput::Url(location.clone()).into_data_uri();
        let from_url = ImageInput::Url(format!("file://{}", location)).into_data_uri();
        std::fs::remove_file(&path).unwrap();

        let expected = to_data_uri(&bytes, "image/png");
        assert_eq!(from_path.unwrap(), expected);
        assert_eq!(from_url.unwrap(), expected);
    }

    #[test]
    fn test_missing_local_file_fails() {
        let path = std::env::temp_dir().join(format!("canvas-editor-{}.png", Uuid::new_v4()));
        let result = ImageInput::Url(path.to_string_lossy().into_owned()).into_data_uri();
        assert!(matches!(result, Err(EditorError::Io(_))));
        assert!(matches!(
            ImageInput::Url("ftp://example.com/cat.png".to_owned()).into_data_uri(),
            Err(EditorError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn test_file_bytes_become_png_data_uri() {
        let bytes = encode_raster(&checker(4, 3), RasterFormat::Png).unwrap();
        let uri = ImageInput::File(bytes).into_data_uri().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_load_image_keeps_natural_size() {
        let bytes = encode_raster(&checker(7, 5), RasterFormat::Png).unwrap();
        let source = futures::executor::block_on(load_image(ImageInput::File(bytes))).unwrap();
        assert_eq!(source.natural_size(), [7, 5]);
        assert!(source.is_decoded());
        assert_eq!(source.pixels().unwrap().get_pixel(1, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_undecodable_file_fails() {
        let result = futures::executor::block_on(load_image(ImageInput::File(vec![1, 2, 3, 4])));
        assert!(matches!(result, Err(EditorError::Decode(_))));
    }

    #[test]
    fn test_source_redecodes_after_deserialize() {
        let source = ImageSource::from_pixels(checker(3, 2)).unwrap();
        let json = serde_json::to_string(&source).unwrap();
        let mut restored: ImageSource = serde_json::from_str(&json).unwrap();
        assert!(!restored.is_decoded());
        assert_eq!(restored, source);

        restored.ensure_decoded().unwrap();
        assert_eq!(restored.pixels().unwrap().as_raw(), source.pixels().unwrap().as_raw());
    }

    #[test]
    fn test_jpeg_flattens_transparency() {
        let transparent = RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 0]));
        let bytes = encode_raster(&transparent, RasterFormat::Jpeg).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert!(decoded.pixels().all(|p| p.0.iter().all(|c| *c > 240)));
    }

    #[test]
    fn test_exported_file_name() {
        let file = ExportedFile::new("drawing", RasterFormat::Jpeg, vec![1, 2]);
        assert!(file.file_name.starts_with("drawing-"));
        assert!(file.file_name.ends_with(".jpeg"));
        assert!(file.data_uri().starts_with("data:image/jpeg;base64,"));
    }
}
