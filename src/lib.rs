//! liturgy-deck - assemble church service presentations from a liturgy
//!
//! A liturgy is an ordered list of sections (songs, announcements, the
//! offering, prayers), each pointing at slides in ordinary PowerPoint
//! decks. This crate merges those slides into one presentation, filling
//! in per-service text such as the date or the name of the leader.
//!
//! # Features
//!
//! - **Liturgy documents**: JSON liturgies in the section schema, with a
//!   migration from the older flat item schema
//! - **Field grammar**: `{NAME}` tokens in slide text and named native
//!   placeholders, both fillable from a liturgy slide's field map
//! - **Two merge strategies**: native insertion by PowerPoint on Windows,
//!   and an in-process slide cloner that works everywhere
//! - **Atomic output**: merged decks are written to a scratch file and
//!   moved into place only when complete
//! - **Themes and exports**: importing a theme deck as a liturgy, link
//!   lists and sheet music archives
//!
//! # Example - Merging a liturgy
//!
//! ```no_run
//! use liturgy_deck::liturgy::{LiturgyDocument, migrate};
//! use liturgy_deck::merge::Merger;
//! use liturgy_deck::settings::Settings;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load("settings.json")?;
//! let liturgy = migrate(LiturgyDocument::load("viering.json")?, None);
//!
//! let decks = settings.decks();
//! let report = Merger::new(&decks, settings.merge_options())
//!     .merge(&liturgy, Path::new("Vieringen/viering.pptx"))?;
//! println!("{} slides", report.slides);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Listing the fields of a deck
//!
//! ```no_run
//! use liturgy_deck::fields::extract_fields;
//! use liturgy_deck::ooxml::pptx::Presentation;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pres = Presentation::open("Themas/Herfst.pptx")?;
//! for index in 0..pres.slide_count()? {
//!     for field in extract_fields(&pres.slide(index)?) {
//!         println!("{}: {} = {:?}", index + 1, field.name, field.current_value);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod export;
pub mod fields;
pub mod liturgy;
pub mod merge;
pub mod ooxml;
pub mod settings;
pub mod theme;

pub use common::{Error, Result};
