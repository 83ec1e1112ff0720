use thiserror::Error;

/// Errors surfaced by editor operations.
///
/// Missing preconditions (no scene, no selection, no crop session) are not
/// errors: those operations return without effect. Only failures that abort an
/// operation which could otherwise have run end up here.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to read scene snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Failed to read image file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),

    #[error("Unable to create a {width}x{height} drawing surface")]
    RenderContext { width: u32, height: u32 },

    #[error("Crop region is empty")]
    EmptyRegion,

    #[error("Failed to encode raster: {0}")]
    Encode(String),
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
