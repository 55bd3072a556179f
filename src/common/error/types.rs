//! Unified error type for liturgy-deck operations.
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for liturgy-deck operations.
///
/// Soft failures (a missing source deck, a shape that cannot be copied) are
/// logged where they happen and never reach this type. Only errors that end
/// an operation are represented here.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Presentation or package level error
    #[error(transparent)]
    Ooxml(#[from] crate::ooxml::error::OoxmlError),

    /// Liturgy or settings JSON could not be read or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings YAML could not be parsed
    #[error("YAML error: {0}")]
    Yaml(String),

    /// Native automation failed
    #[error("Automation failed: {0}")]
    Automation(#[from] crate::merge::automation::AutomationError),

    /// A source deck is missing or cannot be opened
    #[error("Source deck unavailable: {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// The liturgy document is malformed
    #[error("Invalid liturgy: {0}")]
    InvalidLiturgy(String),

    /// Every merge strategy failed
    #[error("Merge failed: {library}")]
    MergeFailed {
        /// Reason the automation tier was abandoned, if it was attempted
        automation: Option<String>,
        /// Error raised by the library tier
        library: Box<Error>,
    },

    /// The finished output could not be placed at its destination
    #[error("Cannot write output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// ZIP archive error outside the package layer (exports)
    #[error("ZIP error: {0}")]
    Zip(String),
}

/// Result type for liturgy-deck operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Zip(err.to_string())
    }
}

impl From<crate::ooxml::opc::error::OpcError> for Error {
    fn from(err: crate::ooxml::opc::error::OpcError) -> Self {
        Error::Ooxml(err.into())
    }
}
