//! Errors of the package layer.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpcError {
    /// The package file does not exist
    #[error("Package not found: {}", .0.display())]
    PackageNotFound(PathBuf),

    #[error("Invalid pack URI: {0}")]
    InvalidPackUri(String),

    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// No relationship with this id or type on the source part
    #[error("Relationship not found: {0}")]
    RelationshipNotFound(String),

    /// `[Content_Types].xml` has neither an override nor a default for the part
    #[error("No content type for part {0}")]
    ContentTypeNotFound(String),

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    /// Malformed `.rels` or content types XML
    #[error("XML error: {0}")]
    Xml(String),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::common::xml::DomError> for OpcError {
    fn from(err: crate::common::xml::DomError) -> Self {
        OpcError::Xml(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpcError>;
