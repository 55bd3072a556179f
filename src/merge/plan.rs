//! Turning a liturgy into an ordered list of slides to copy.

use crate::fields::FieldValues;
use crate::liturgy::{Section, SectionKind};
use crate::merge::source::DeckProvider;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where the slides of a plan entry come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSource {
    /// A deck on disk, as recorded in the liturgy.
    Deck(PathBuf),
    /// A one-slide deck generated at merge time.
    Stub { title: String },
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanSource::Deck(path) => write!(f, "{}", path.display()),
            PlanSource::Stub { title } => write!(f, "stub \"{}\"", title),
        }
    }
}

/// Slides to take from one source, in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub source: PlanSource,
    /// 0-based slide indices in the source.
    pub slide_indices: Vec<usize>,
    /// Field values keyed by source slide index.
    pub fields_by_index: BTreeMap<usize, FieldValues>,
}

impl PlanEntry {
    fn single(source: PlanSource, index: usize, fields: &FieldValues) -> Self {
        Self {
            source,
            slide_indices: vec![index],
            fields_by_index: BTreeMap::from([(index, fields.clone())]),
        }
    }

    /// Values for source slide `index`, empty when there are none.
    pub fn fields_for(&self, index: usize) -> Option<&FieldValues> {
        self.fields_by_index.get(&index).filter(|f| !f.is_empty())
    }

    pub fn deck_path(&self) -> Option<&Path> {
        match &self.source {
            PlanSource::Deck(path) => Some(path),
            PlanSource::Stub { .. } => None,
        }
    }
}

/// An ordered merge plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub entries: Vec<PlanEntry>,
}

impl MergePlan {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of slides the merged deck is expected to have.
    pub fn total_slides(&self) -> usize {
        self.entries.iter().map(|e| e.slide_indices.len()).sum()
    }

    /// Field values by output slide position, walking entries and their
    /// indices in insertion order. Positions without values are absent.
    pub fn fields_by_position(&self) -> BTreeMap<usize, FieldValues> {
        self.entries
            .iter()
            .flat_map(|entry| entry.slide_indices.iter().map(move |&index| entry.fields_for(index)))
            .enumerate()
            .filter_map(|(position, fields)| Some((position, fields?.clone())))
            .collect()
    }
}

/// Build the merge plan for `sections`.
///
/// Song sections contribute each distinct song deck once, whole. Regular
/// sections contribute one slide per liturgy slide. Stubs always become a
/// generated deck. A slide whose deck does not exist is left out.
pub fn plan_merge(sections: &[Section], decks: &dyn DeckProvider) -> MergePlan {
    let mut plan = MergePlan::default();

    for section in sections {
        let mut seen_decks: HashSet<&Path> = HashSet::new();
        for slide in &section.slides {
            if slide.is_stub {
                let title = if slide.title.is_empty() {
                    &section.name
                } else {
                    &slide.title
                };
                plan.entries.push(PlanEntry::single(
                    PlanSource::Stub {
                        title: title.clone(),
                    },
                    0,
                    &slide.fields,
                ));
                continue;
            }

            let Some(path) = slide.source_path.as_deref() else {
                continue;
            };
            if !decks.exists(path) {
                warn!(section = %section.name, path = %path.display(), "source deck not found, slide skipped");
                continue;
            }

            match section.kind {
                SectionKind::Song => {
                    if !seen_decks.insert(path) {
                        continue;
                    }
                    let count = match decks.slide_count(path) {
                        Ok(count) => count,
                        Err(e) => {
                            warn!(section = %section.name, error = %e, "song deck unreadable, skipped");
                            continue;
                        },
                    };
                    if count == 0 {
                        warn!(section = %section.name, path = %path.display(), "song deck has no slides");
                        continue;
                    }
                    plan.entries.push(PlanEntry {
                        source: PlanSource::Deck(path.to_path_buf()),
                        slide_indices: (0..count).collect(),
                        fields_by_index: (0..count).map(|i| (i, slide.fields.clone())).collect(),
                    });
                },
                SectionKind::Regular => {
                    plan.entries.push(PlanEntry::single(
                        PlanSource::Deck(path.to_path_buf()),
                        slide.slide_index,
                        &slide.fields,
                    ));
                },
            }
        }
    }

    debug!(
        entries = plan.entries.len(),
        slides = plan.total_slides(),
        "planned merge"
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::{Error, Result};
    use crate::liturgy::Slide;
    use crate::ooxml::pptx::Presentation;
    use std::collections::HashMap;

    /// Decks that exist only by name, with a slide count.
    struct FakeDecks(HashMap<PathBuf, usize>);

    impl FakeDecks {
        fn new(decks: &[(&str, usize)]) -> Self {
            Self(decks.iter().map(|(p, n)| (PathBuf::from(p), *n)).collect())
        }
    }

    impl DeckProvider for FakeDecks {
        fn resolve(&self, path: &Path) -> PathBuf {
            path.to_path_buf()
        }

        fn exists(&self, path: &Path) -> bool {
            self.0.contains_key(path)
        }

        fn open(&self, path: &Path) -> Result<Presentation> {
            Err(Error::SourceUnavailable {
                path: path.to_path_buf(),
                reason: "fake".into(),
            })
        }

        fn slide_count(&self, path: &Path) -> Result<usize> {
            Ok(self.0[path])
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_song_deck_expanded_once() {
        let decks = FakeDecks::new(&[("Liederen/psalm23.pptx", 3)]);
        let song = Section::new("Psalm 23", SectionKind::Song)
            .with_slide(Slide::from_source("Couplet 1", "Liederen/psalm23.pptx", 0))
            .with_slide(Slide::from_source("Couplet 2", "Liederen/psalm23.pptx", 1));

        let plan = plan_merge(&[song], &decks);
        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].slide_indices, [0, 1, 2]);
        assert_eq!(plan.total_slides(), 3);
    }

    #[test]
    fn test_regular_slides_each_planned() {
        let decks = FakeDecks::new(&[("Algemeen/Mededelingen.pptx", 5)]);
        let section = Section::new("Mededelingen", SectionKind::Regular)
            .with_slide(Slide::from_source("a", "Algemeen/Mededelingen.pptx", 4))
            .with_slide(Slide::from_source("b", "Algemeen/Mededelingen.pptx", 4));

        let plan = plan_merge(&[section], &decks);
        assert_eq!(plan.entries.len(), 2);
        assert!(plan.entries.iter().all(|e| e.slide_indices == [4]));
    }

    #[test]
    fn test_missing_deck_contributes_nothing() {
        let decks = FakeDecks::new(&[]);
        let sections = [
            Section::new("Lied", SectionKind::Song).with_slide(Slide::from_source("x", "weg.pptx", 0)),
            Section::new("Welkom", SectionKind::Regular).with_slide(Slide::from_source("y", "weg.pptx", 2)),
            Section::new("Leeg", SectionKind::Regular).with_slide(Slide::new("geen deck")),
        ];
        let plan = plan_merge(&sections, &decks);
        assert!(plan.is_empty());
        assert_eq!(plan.total_slides(), 0);
    }

    #[test]
    fn test_stub_ignores_source_and_takes_section_name() {
        let decks = FakeDecks::new(&[("echt.pptx", 2)]);
        let mut stub = Slide::stub("");
        stub.source_path = Some("echt.pptx".into());
        let section = Section::new("Gebed", SectionKind::Song).with_slide(stub);

        let plan = plan_merge(&[section], &decks);
        assert_eq!(
            plan.entries[0].source,
            PlanSource::Stub {
                title: "Gebed".into()
            }
        );
        assert_eq!(plan.entries[0].slide_indices, [0]);
    }

    #[test]
    fn test_fields_by_position() {
        let decks = FakeDecks::new(&[("lied.pptx", 2), ("welkom.pptx", 1)]);
        let sections = [
            Section::new("Welkom", SectionKind::Regular).with_slide(
                Slide::from_source("w", "welkom.pptx", 0).with_fields(fields(&[("TITLE", "Goede morgen")])),
            ),
            Section::new("Lied", SectionKind::Song)
                .with_slide(Slide::from_source("l", "lied.pptx", 0).with_fields(fields(&[("Nr", "23")]))),
            Section::new("Stub", SectionKind::Regular).with_slide(Slide::stub("Zegen")),
        ];
        let plan = plan_merge(&sections, &decks);
        let by_position = plan.fields_by_position();
        assert_eq!(by_position.keys().copied().collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(by_position[&2]["Nr"], "23");
        // stub without values is absent
        assert!(!by_position.contains_key(&3));
    }
}
