/// Open Packaging Conventions (OPC) layer.
///
/// A presentation file is a zip archive of parts (XML and binary) linked by
/// relationships. This module reads such archives into an editable
/// [`OpcPackage`], and writes them back out.
///
/// - `quick-xml` parses parts into ordered element trees
/// - `zip` provides the physical container
/// - `atoi_simd` parses relationship ids
pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::{BlobPart, Part, PartFactory, XmlPart};
pub use rel::{Relationship, Relationships};
