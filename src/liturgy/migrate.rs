//! Version 1 to version 2 migration.
//!
//! Each legacy item becomes exactly one section:
//!
//! | item     | section | slide                                   |
//! |----------|---------|-----------------------------------------|
//! | song     | song    | index 0 of the song deck (whole deck)   |
//! | offering | regular | its recorded slide index                |
//! | generic  | regular | index 0                                 |
//!
//! The migration is a pure function of its input. Ids are derived from the
//! item position (`legacy-3`, `legacy-3-0`) so migrating the same file
//! twice gives the same document.

use super::model::{
    CURRENT_FORMAT_VERSION, LegacyItem, LegacyLiturgy, Liturgy, LiturgyDocument, Section, SectionKind,
    Slide,
};
use crate::fields::FieldValues;
use std::path::Path;

fn legacy_section(index: usize, name: &str, kind: SectionKind) -> Section {
    Section {
        id: format!("legacy-{}", index),
        ..Section::new(name, kind)
    }
}

fn legacy_slide(index: usize, title: &str) -> Slide {
    Slide {
        id: format!("legacy-{}-0", index),
        title: title.to_string(),
        slide_index: 0,
        source_path: None,
        fields: FieldValues::new(),
        is_stub: false,
    }
}

fn item_to_section(index: usize, item: &LegacyItem, default_offering: Option<&Path>) -> Section {
    match item {
        LegacyItem::Song(song) => {
            let mut section = legacy_section(index, &song.title, SectionKind::Song);
            section.pdf_path = song.pdf_path.clone();
            section.youtube_links = song.youtube_links.clone();
            section.song_source_path = song.source_path.clone();
            section.slides.push(Slide {
                source_path: song.pptx_path.clone(),
                is_stub: song.is_stub,
                ..legacy_slide(index, &song.title)
            });
            section
        },
        LegacyItem::Offering(offering) => {
            let title = if offering.slide_title.is_empty() {
                &offering.title
            } else {
                &offering.slide_title
            };
            let source_path = offering
                .pptx_path
                .clone()
                .or_else(|| default_offering.map(Path::to_path_buf));
            let mut section = legacy_section(index, title, SectionKind::Regular);
            section.slides.push(Slide {
                slide_index: offering.slide_index,
                source_path,
                is_stub: offering.is_stub,
                ..legacy_slide(index, title)
            });
            section
        },
        LegacyItem::Generic(generic) => {
            let mut section = legacy_section(index, &generic.title, SectionKind::Regular);
            section.slides.push(Slide {
                source_path: generic.pptx_path.clone(),
                is_stub: generic.is_stub,
                ..legacy_slide(index, &generic.title)
            });
            section
        },
    }
}

/// Migrate a version 1 liturgy.
///
/// `default_offering` is used for offering items saved without a deck.
pub fn migrate_legacy(legacy: &LegacyLiturgy, default_offering: Option<&Path>) -> Liturgy {
    Liturgy {
        format_version: CURRENT_FORMAT_VERSION,
        name: legacy.name.clone(),
        created_date: legacy.created_date,
        theme_source_path: None,
        sections: legacy
            .elements
            .iter()
            .enumerate()
            .map(|(i, item)| item_to_section(i, item, default_offering))
            .collect(),
        service_date: legacy.service_date,
        leader: legacy.leader.clone(),
    }
}

/// Bring any liturgy document to the section schema. A document already
/// in that schema is returned unchanged.
pub fn migrate(document: LiturgyDocument, default_offering: Option<&Path>) -> Liturgy {
    match document {
        LiturgyDocument::Current(liturgy) => liturgy,
        LiturgyDocument::Legacy(legacy) => migrate_legacy(&legacy, default_offering),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liturgy::model::{LegacyGeneric, LegacyOffering, LegacySong};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn legacy() -> LegacyLiturgy {
        LegacyLiturgy {
            name: "Viering".into(),
            created_date: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            elements: vec![
                LegacyItem::Song(LegacySong {
                    title: "Psalm 23".into(),
                    source_path: Some("Liederen/Psalm 23".into()),
                    pptx_path: Some("Liederen/Psalm 23/psalm23.pptx".into()),
                    pdf_path: Some("Liederen/Psalm 23/psalm23.pdf".into()),
                    youtube_links: vec!["https://youtu.be/x".into()],
                    is_stub: false,
                }),
                LegacyItem::Offering(LegacyOffering {
                    title: "Collecte".into(),
                    slide_index: 3,
                    slide_title: "Diaconie".into(),
                    ..Default::default()
                }),
                LegacyItem::Generic(LegacyGeneric {
                    title: "Mededelingen".into(),
                    pptx_path: Some("Algemeen/Mededelingen.pptx".into()),
                    ..Default::default()
                }),
            ],
            service_date: NaiveDate::from_ymd_opt(2024, 3, 10),
            leader: Some("Ds. Jansen".into()),
        }
    }

    #[test]
    fn test_song_offering_generic() {
        let migrated = migrate_legacy(&legacy(), None);
        let kinds: Vec<_> = migrated.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            [SectionKind::Song, SectionKind::Regular, SectionKind::Regular]
        );
        assert!(migrated.sections.iter().all(|s| s.slides.len() == 1));

        let song = &migrated.sections[0];
        assert_eq!(song.name, "Psalm 23");
        assert_eq!(song.youtube_links, ["https://youtu.be/x"]);
        assert_eq!(song.song_source_path, Some(PathBuf::from("Liederen/Psalm 23")));
        assert_eq!(
            song.slides[0].source_path,
            Some(PathBuf::from("Liederen/Psalm 23/psalm23.pptx"))
        );
        assert_eq!(song.slides[0].slide_index, 0);

        let offering = &migrated.sections[1];
        assert_eq!(offering.name, "Diaconie");
        assert_eq!(offering.slides[0].slide_index, 3);
        assert_eq!(offering.slides[0].source_path, None);

        assert_eq!(migrated.sections[2].slides[0].slide_index, 0);
        assert_eq!(migrated.service_date, NaiveDate::from_ymd_opt(2024, 3, 10));
        assert_eq!(migrated.format_version, CURRENT_FORMAT_VERSION);
    }

    #[test]
    fn test_default_offering_deck() {
        let default = Path::new("Algemeen/Collecte.pptx");
        let migrated = migrate_legacy(&legacy(), Some(default));
        assert_eq!(
            migrated.sections[1].slides[0].source_path.as_deref(),
            Some(default)
        );
        // decks recorded on the item win over the default
        assert_eq!(
            migrated.sections[2].slides[0].source_path,
            Some(PathBuf::from("Algemeen/Mededelingen.pptx"))
        );
    }

    #[test]
    fn test_migration_is_pure_and_idempotent() {
        let once = migrate(LiturgyDocument::Legacy(legacy()), None);
        assert_eq!(once, migrate(LiturgyDocument::Legacy(legacy()), None));
        assert_eq!(migrate(LiturgyDocument::Current(once.clone()), None), once);
        assert_eq!(once.sections[1].id, "legacy-1");
        assert_eq!(once.sections[1].slides[0].id, "legacy-1-0");
    }
}
