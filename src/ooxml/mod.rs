//! Office Open XML (OOXML) format implementation.
//!
//! Two layers:
//!
//! 1. **OPC Layer** (`opc`): low-level package handling (ZIP, parts, relationships)
//! 2. **PresentationML** (`pptx`): presentations, slides, shapes and themes
//!
//! # Example
//!
//! ```rust,no_run
//! use liturgy_deck::ooxml::pptx::Package;
//!
//! let pkg = Package::open("Algemeen/Collecte.pptx")?;
//! let pres = pkg.into_presentation();
//! println!("Deck contains {} slides", pres.slide_count()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod error;
pub mod opc;
pub mod pptx;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};

// Re-export error types
pub use error::{OoxmlError, Result};
