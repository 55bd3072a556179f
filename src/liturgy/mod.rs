//! The liturgy: an ordered service of sections and slides.

mod migrate;
mod model;

pub use migrate::{migrate, migrate_legacy};
pub use model::{
    CURRENT_FORMAT_VERSION, LegacyGeneric, LegacyItem, LegacyLiturgy, LegacyOffering, LegacySong,
    Liturgy, LiturgyDocument, Section, SectionKind, Slide,
};
