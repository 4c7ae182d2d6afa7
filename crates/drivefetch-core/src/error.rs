//! Error types for the mapping and for single-file fetches.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Invalid resource mapping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManifestError {
    #[error("duplicate output filename: {0}")]
    DuplicateFilename(String),
    #[error("invalid output filename: {0:?}")]
    InvalidFilename(String),
    #[error("empty remote id for {0}")]
    EmptyRemoteId(String),
}

/// Failure of a single download. The runner treats every variant as fatal.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure reported by libcurl (timeout, DNS, TLS, ...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Final response had a non-2xx status.
    #[error("HTTP {status} from {url}")]
    Http { status: u32, url: String },
    /// Writing the output file failed.
    #[error("writing {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The provider served an HTML page with no usable download link.
    #[error("cannot retrieve the public link of the file; it may not be shared publicly ({reason})")]
    NoPublicLink { reason: String },
    /// Confirmation pages kept coming.
    #[error("gave up after {0} confirmation page(s)")]
    TooManyConfirmations(u32),
    /// A URL could not be built or resolved.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl FetchError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FetchError::Storage {
            path: path.into(),
            source,
        }
    }
}
