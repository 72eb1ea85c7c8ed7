//! Typed error taxonomy for the alignment engine.
//!
//! Kinds 1-4 of the error design (input-format, reference, configuration,
//! resource) are fatal and map to a non-zero process exit. Kind 5
//! (numeric-degeneracy) never reaches this type: it is recovered locally
//! and logged via `log::warn!`.

use thiserror::Error;

/// Fatal errors produced anywhere in the pipeline.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed CSV, unparsable number, or a duplicate `(level, replicate, entity)` row.
    #[error("input format error: {0}")]
    InputFormat(String),

    /// A vertex-similarity row references a level or entity absent from the data input.
    #[error("reference error: {0}")]
    Reference(String),

    /// An out-of-range flag or unknown method name.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O failure or an allocation too large to proceed with safely.
    #[error("resource error: {0}")]
    Resource(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
