//! Error taxonomy shared by the parser, formatter, and checker.

use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of a formatting or checking run.
///
/// Grammar violations are unrecoverable: the run that produced one is
/// abandoned with no partial-output guarantee. Errors carry no input
/// position.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The input violates the supported grammar.
    #[error("grammar error: {0}")]
    Grammar(String),

    /// The input uses a construct deliberately outside the supported subset.
    ///
    /// Signaled separately from [`Error::Grammar`] so a batch caller can
    /// choose to skip the file instead of failing the batch.
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    /// An I/O failure on the underlying output sink.
    #[error("i/o error: {0}")]
    Resource(#[from] io::Error),

    /// The formatted stream diverged from the input stream.
    ///
    /// Produced only while checking; [`crate::check`] maps it to
    /// `Ok(false)` before returning, so public callers never observe it.
    #[error("formatted output diverged from input")]
    Mismatch,
}

impl Error {
    pub(crate) fn grammar(message: impl Into<String>) -> Self {
        Error::Grammar(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Error::Unsupported(message.into())
    }
}
