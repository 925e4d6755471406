use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by sink operations.
///
/// Every variant is returned synchronously to the caller of
/// [`accept`](crate::FileSink::accept); nothing is retried internally and no
/// failure is downgraded to a logged warning — the upstream pipeline decides
/// whether to redeliver the batch.
#[derive(Debug, Error)]
pub enum Error {
    /// The target directory could not be created or is not usable.
    #[error("target directory {path} unavailable: {source}")]
    DirectoryUnavailable { path: PathBuf, source: io::Error },

    /// More than one staging file was found in the target directory.
    ///
    /// The engine never guesses which one to keep writing to — picking one
    /// would interleave unrelated batches. Non-recoverable for the directory
    /// until an operator removes the extra file.
    #[error("{count} staging files found in {dir}, expected at most one")]
    InvariantViolation { dir: PathBuf, count: usize },

    /// Creating, opening, or appending to the staging file failed.
    ///
    /// In-memory counters are untouched when this is returned — a failed
    /// append never advances the event count.
    #[error("failed to write batch to {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    /// Renaming the staging file to its finalized name failed.
    ///
    /// The staging file is left in place so the next `accept` call retries
    /// the rotation decision.
    #[error("failed to finalize {staging} as {finalized}: {source}")]
    FinalizeFailed {
        staging: PathBuf,
        finalized: PathBuf,
        source: io::Error,
    },

    /// The format label is neither `json` nor `protobuf`.
    #[error("invalid format \"{0}\", valid values are json or protobuf")]
    InvalidFormat(String),

    /// The sink configuration failed validation.
    #[error("invalid sink configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
