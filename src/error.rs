//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, codec, resize and inference errors, and provides
//! semantic variants for argument validation and pipeline failures.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unreadable image {path:?}: {reason}")]
    UnreadableImage { path: PathBuf, reason: String },

    #[error("Unknown output format: {extension}")]
    UnknownOutputFormat { extension: String },

    #[error("No valid image frames found in {path:?}")]
    EmptyInput { path: PathBuf },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Resize buffer error: {0}")]
    ResizeBuffer(#[from] fast_image_resize::ImageBufferError),

    #[error("Resize error: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("JPEG encoding error: {0}")]
    Jpeg(#[from] jpeg_encoder::EncodingError),

    #[error("TIFF encoding error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "detector")]
    #[error("Inference error: {0}")]
    Inference(#[from] ort::Error),

    #[error("Detector error: {0}")]
    Detector(String),

    #[error("Processing cancelled after {segments_written} segments")]
    Cancelled { segments_written: usize },

    #[error("{stage} failed for {path:?}: {source}")]
    Stage {
        stage: &'static str,
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Processing error: {0}")]
    Processing(String),
}

impl Error {
    /// Attach pipeline stage and path context to an error.
    pub fn at_stage(self, stage: &'static str, path: impl Into<PathBuf>) -> Self {
        Error::Stage {
            stage,
            path: path.into(),
            source: Box::new(self),
        }
    }
}

/// Extension for tagging fatal errors with the stage and folder they came from.
pub trait StageContext<T> {
    fn stage(self, stage: &'static str, path: &std::path::Path) -> Result<T>;
}

impl<T, E: Into<Error>> StageContext<T> for std::result::Result<T, E> {
    fn stage(self, stage: &'static str, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| e.into().at_stage(stage, path))
    }
}
