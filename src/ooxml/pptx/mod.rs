//! PowerPoint (.pptx) presentation support.
//!
//! This module reads presentations and assembles new ones out of slides from
//! several source decks:
//!
//! - `Package`: the .pptx file package
//! - `Presentation`: slides, layouts, masters, media and sections
//! - `Slide`: one slide's element tree, with typed shape views
//! - `SlideBackground`: background fills with theme colors resolved
//! - `template`: a blank 16:9 deck to start from
//!
//! # Example
//!
//! ```rust,no_run
//! use liturgy_deck::ooxml::pptx::Presentation;
//!
//! let pres = Presentation::open("Liederen/psalm-23.pptx")?;
//! for i in 0..pres.slide_count()? {
//!     let slide = pres.slide(i)?;
//!     println!("{}: {} shapes", pres.slide_title(i)?, slide.shapes().len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod backgrounds;
pub mod format;
pub mod package;
pub mod parts;
pub mod presentation;
pub mod sections;
pub mod shapes;
pub mod slide;
pub mod template;
pub mod writer;

pub use backgrounds::{GradientStop, GradientType, PictureStyle, SlideBackground};
pub use format::{ImageFormat, TextFormat};
pub use package::Package;
pub use presentation::{ALL_SLIDES_SECTION, LayoutInfo, Presentation, clean_title};
pub use sections::{Section, SectionList};
pub use shapes::{Geometry, PlaceholderRef, PlaceholderType, Shape, ShapeKind};
pub use slide::Slide;
