/// Parts for PowerPoint presentation documents.
///
/// Slides, layouts and masters are handled as element trees by
/// [`Presentation`](crate::ooxml::pptx::Presentation); the theme is the one
/// part with a typed model, for color resolution.
pub mod theme;

pub use theme::{ColorContext, ColorMap, ColorScheme, Theme};
