// error.rs - Error types for the compression panel

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the user by the orchestrator and the download dispatcher.
#[derive(Debug, Error)]
pub enum Error {
    /// The selection contained no file with an `image/` media type.
    #[error("no valid images: please select image files only (JPG, PNG, WebP)")]
    NoValidImages,

    /// A run was requested with nothing selected.
    #[error("no images selected")]
    EmptyBatch,

    /// A run was requested while another one is still going.
    #[error("a compression run is already in progress")]
    Busy,

    /// A numeric setting was outside its accepted range.
    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Bulk download was requested with no successful results.
    #[error("no compressed files available to download")]
    NothingToDownload,

    /// A download index did not point at a compressed result.
    #[error("no compressed result at position {0}")]
    NoSuchResult(usize),

    #[error("I/O error for '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure reported by a [`crate::compression::Compressor`] for a single file.
///
/// Its `Display` text is what ends up in the failure row.
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("{0}")]
    Image(#[from] image::ImageError),

    #[error("compression worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// Free-form rejection, used by capabilities that only carry a message.
    #[error("{0}")]
    Rejected(String),
}

impl CompressionError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_is_shown_verbatim() {
        let err = CompressionError::rejected("unsupported format");
        assert_eq!(err.to_string(), "unsupported format");
    }

    #[test]
    fn io_error_names_the_path() {
        let err = Error::io(
            "out/compressed_a.jpg",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let text = err.to_string();
        assert!(text.contains("out/compressed_a.jpg"));
        assert!(text.contains("denied"));
    }
}
