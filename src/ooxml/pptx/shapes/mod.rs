/// Shapes on slides.
///
/// Shapes are read through borrowed views over the slide's element tree:
/// - [`Shape`] classifies a shape tree child into a [`ShapeKind`]
/// - placeholders and their field names
/// - text frames, tables and pictures, read into specs that the writer can
///   re-create on another slide
pub mod base;
pub mod picture;
pub mod placeholder;
pub mod table;
pub mod textframe;

pub use base::{Geometry, Shape, ShapeKind};
pub use picture::PictureSpec;
pub use placeholder::{PlaceholderRef, PlaceholderType};
pub use table::{CellSpec, RowSpec, TableSpec};
pub use textframe::{ParagraphSpec, RunSpec};
