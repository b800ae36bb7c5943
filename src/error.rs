//! Error types and handling for smallify

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for smallify operations
pub type Result<T> = std::result::Result<T, SmallifyError>;

/// Main error type for smallify operations
#[derive(Debug, Error)]
pub enum SmallifyError {
    /// Filesystem errors: resolve, stat, open, create
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory listing failed
    #[error("Directory listing error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Bytes are not a recognised or valid image
    #[error("Failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Image decoded fine but there is no output codec for it
    #[error("Unsupported image format: {format} (file: {file:?})")]
    UnsupportedFormat {
        format: String,
        file: Option<PathBuf>,
    },

    /// Codec write failed
    #[error("Failed to encode {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Image has a zero-sized side
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Worker pool could not be built
    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// A task panicked while handling this path
    #[error("Panicked while processing {path:?}: {message}")]
    Panicked { path: PathBuf, message: String },
}

/// Coarse classification used in run reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Filesystem,
    Decode,
    Unsupported,
    Encode,
    Panic,
    Setup,
}

impl SmallifyError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S, file: Option<PathBuf>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
            file,
        }
    }

    /// Create a new I/O error bound to a path
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode<P: Into<PathBuf>>(path: P, source: image::ImageError) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }

    pub fn encode<P: Into<PathBuf>>(path: P, source: image::ImageError) -> Self {
        Self::Encode {
            path: path.into(),
            source,
        }
    }

    /// Which part of the taxonomy this error falls into
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::Walk(_) => ErrorKind::Filesystem,
            Self::Decode { .. } | Self::InvalidDimensions { .. } => ErrorKind::Decode,
            Self::UnsupportedFormat { .. } => ErrorKind::Unsupported,
            Self::Encode { .. } => ErrorKind::Encode,
            Self::Panicked { .. } => ErrorKind::Panic,
            Self::Config { .. } | Self::Pool(_) => ErrorKind::Setup,
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. }
            | Self::Decode { path, .. }
            | Self::Encode { path, .. }
            | Self::Panicked { path, .. } => Some(path),
            Self::UnsupportedFormat { file, .. } => file.as_deref(),
            Self::Walk(e) => e.path(),
            _ => None,
        }
    }
}

/// Error context extension for attaching the path an operation touched
pub trait ErrorContext<T> {
    fn with_path<P: AsRef<Path>>(self, path: P) -> Result<T>;
}

impl<T> ErrorContext<T> for std::result::Result<T, std::io::Error> {
    fn with_path<P: AsRef<Path>>(self, path: P) -> Result<T> {
        self.map_err(|e| SmallifyError::io(path.as_ref(), e))
    }
}
