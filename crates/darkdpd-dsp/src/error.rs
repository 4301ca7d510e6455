//! Error types for the DPD library.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for DPD operations.
pub type Result<T> = std::result::Result<T, DpdError>;

/// Errors raised by table construction and sample I/O.
///
/// Bisection non-convergence is deliberately not here: it is reported through
/// [`crate::lut::Unconverged`] alongside a usable table.
#[derive(Error, Debug)]
pub enum DpdError {
    /// LUT parameters that cannot produce a table.
    #[error("invalid LUT config: {0}")]
    InvalidLutConfig(String),

    /// Reading or writing a sample file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// WAV encoding failed.
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl DpdError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
