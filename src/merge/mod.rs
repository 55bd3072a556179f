//! The merge engine.
//!
//! A liturgy is first turned into a [`MergePlan`]: an ordered list of
//! source decks with the slide indices to take from each. The [`Merger`]
//! then realises the plan in one of two ways:
//!
//! - **automation**: a presentation application inserts every slide
//!   natively ([`automation`]); field values are filled in afterwards,
//! - **library**: the first deck is trimmed down to its planned slides and
//!   everything else is cloned into it ([`SlideCloner`]).
//!
//! Automation is tried first where it is supported; any failure there
//! falls back to the library merge.
//!
//! # Examples
//!
//! ```rust,no_run
//! use liturgy_deck::liturgy::{LiturgyDocument, migrate};
//! use liturgy_deck::merge::{FileDecks, MergeOptions, Merger};
//! use std::path::Path;
//!
//! let liturgy = migrate(LiturgyDocument::load("viering.json")?, None);
//! let decks = FileDecks::new();
//! let report = Merger::new(&decks, MergeOptions::default())
//!     .merge(&liturgy, Path::new("Vieringen/viering.pptx"))?;
//! println!("{} slides via {:?}", report.slides, report.tier);
//! # Ok::<(), liturgy_deck::Error>(())
//! ```

pub mod applicator;
pub mod automation;
pub mod clone;
pub mod executor;
pub mod library;
pub mod plan;
pub mod source;
pub mod stub;

pub use applicator::apply_fields;
pub use automation::{AutomationError, SlideAutomation, VbScriptSession};
pub use clone::{ClonedSlide, SlideCloner};
pub use executor::{MergeOptions, MergeReport, MergeTier, Merger};
pub use library::merge_with_library;
pub use plan::{MergePlan, PlanEntry, PlanSource, plan_merge};
pub use source::{DeckProvider, FileDecks};
pub use stub::{StubFactory, generated_stub};
