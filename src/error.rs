use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a whole run. Problems with a single fixture are reported
/// as test failures instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to walk {}: {source}", .root.display())]
    Discovery { root: PathBuf, source: walkdir::Error },
    #[error("invalid file pattern `{pattern}`: {source}")]
    InvalidPattern { pattern: String, source: glob::PatternError },
    #[error("failed to read fixture {}: {source}", .path.display())]
    ReadFixture { path: PathBuf, source: io::Error },
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
